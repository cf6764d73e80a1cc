//! トークン列をパースし、パイプラインに変換
//!
//! 文法は以下のとおり。`<`と`>`はそれぞれ最初と最後のコマンドの後ろにのみ置ける。
//!
//! ```text
//! pipeline := command [redirect_in] ('|' command)* [redirect_out]
//! command  := word+
//! ```
use crate::token::Tokens;
use std::{
    error::Error,
    fmt::{self, Display},
};

/// パースエラーを表すための型
#[derive(Debug, PartialEq, Eq)]
pub enum ParseError {
    EmptyCommand(usize),           // コマンドが空。usizeはトークンの位置
    MissingFilename(char),         // リダイレクト先のファイル名が無い
    TrailingTokens(usize, String), // 解釈されずに残ったトークン
}

impl Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::EmptyCommand(pos) => {
                write!(f, "ParseError: 空のコマンド: pos = {pos}")
            }
            ParseError::MissingFilename(c) => {
                write!(f, "ParseError: '{c}'の後にファイル名がありません")
            }
            ParseError::TrailingTokens(pos, token) => {
                write!(f, "ParseError: 不正なトークン: pos = {pos}, token = '{token}'")
            }
        }
    }
}

impl Error for ParseError {}

/// パイプの1段分。wordsの先頭がプログラム名で、残りが引数
///
/// 空のコマンドは作られない。
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Command<'a> {
    words: Vec<&'a str>,
}

impl<'a> Command<'a> {
    /// プログラム名
    pub fn name(&self) -> &'a str {
        self.words[0]
    }

    /// 引数。プログラム名は含まない
    pub fn args(&self) -> &[&'a str] {
        &self.words[1..]
    }

    /// プログラム名を含む引数リスト（argv）
    pub fn words(&self) -> &[&'a str] {
        &self.words
    }
}

/// パイプでつながれたコマンド列と、全体の入出力のリダイレクト先
///
/// - redirect_inputは最初のコマンドの標準入力にのみ適用
/// - redirect_outputは最後のコマンドの標準出力にのみ適用
#[derive(Debug, PartialEq, Eq, Default)]
pub struct Pipeline<'a> {
    pub commands: Vec<Command<'a>>,
    pub redirect_input: Option<&'a str>,
    pub redirect_output: Option<&'a str>,
}

impl<'a> Pipeline<'a> {
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// トークン列をパイプラインに変換
///
/// トークンが一つも無い場合は空のパイプラインを返す。
///
/// # 例
///
/// 入力`["cat", "<in.txt", "|", "wc", "-l", ">", "out.txt"]`に対して、
/// コマンド`[cat]`と`[wc, -l]`、入力`in.txt`、出力`out.txt`のパイプラインを返す。
pub fn parse<'a>(tokens: &Tokens<'a>) -> Result<Pipeline<'a>, ParseError> {
    if tokens.is_empty() {
        return Ok(Pipeline::default());
    }

    let mut commands = Vec::new();

    let (cmd, pos) = parse_command(tokens, 0)?;
    commands.push(cmd);

    // 入力のリダイレクトは最初のコマンドの直後にのみ置ける
    let (redirect_input, mut pos) = parse_redirect(tokens, pos, '<')?;

    while let Some(&"|") = tokens.get(pos) {
        let (cmd, next) = parse_command(tokens, pos + 1)?;
        commands.push(cmd);
        pos = next;
    }

    // 出力のリダイレクトは最後のコマンドの直後にのみ置ける
    let (redirect_output, pos) = parse_redirect(tokens, pos, '>')?;

    // "a > out | b"や"a | b < in"のように残りがある場合はエラー
    if let Some(token) = tokens.get(pos) {
        return Err(ParseError::TrailingTokens(pos, token.to_string()));
    }

    Ok(Pipeline {
        commands,
        redirect_input,
        redirect_output,
    })
}

/// posから1つのコマンドを読み込み、コマンドと次の位置を返す
fn parse_command<'a>(
    tokens: &Tokens<'a>,
    pos: usize,
) -> Result<(Command<'a>, usize), ParseError> {
    let len = tokens[pos..]
        .iter()
        .take_while(|token| is_ordinary(token))
        .count();

    if len == 0 {
        // "a | | b"や"a |"、"| a"などの場合
        return Err(ParseError::EmptyCommand(pos));
    }

    let words = tokens[pos..pos + len].to_vec();
    Ok((Command { words }, pos + len))
}

/// posにdirectで始まるトークンがあればリダイレクトとして読み込む
///
/// `< file`のように分かれた形と、`<file`のようにつながった形の両方を受け付ける。
/// ファイル名（無ければNone）と次の位置を返す。
fn parse_redirect<'a>(
    tokens: &Tokens<'a>,
    pos: usize,
    direct: char,
) -> Result<(Option<&'a str>, usize), ParseError> {
    let token = match tokens.get(pos) {
        Some(t) if t.starts_with(direct) => *t,
        _ => return Ok((None, pos)),
    };

    if token.len() == direct.len_utf8() {
        // 記号の後に空白がある場合、次のトークンがファイル名
        match tokens.get(pos + 1) {
            Some(filename) => Ok((Some(*filename), pos + 2)),
            None => Err(ParseError::MissingFilename(direct)),
        }
    } else {
        // 空白無しでファイル名が続く場合
        Ok((Some(&token[direct.len_utf8()..]), pos + 1))
    }
}

/// コマンドの一部となる単語なら真。パイプやリダイレクトの記号で始まる場合は偽
fn is_ordinary(word: &str) -> bool {
    !word.starts_with(['|', '<', '>'])
}
