//! 入力行を空白で区切ったトークン列

/// パーサが消費するトークン列。各トークンは空でなく、空白を含まない
pub type Tokens<'a> = [&'a str];

/// 行を空白文字で分割する。空白のみの行は空のVecになる
///
/// # 例
///
/// 入力"wc -l  <in.txt"に対して、`vec!["wc", "-l", "<in.txt"]`を返す。
pub fn split_words(line: &str) -> Vec<&str> {
    line.split_whitespace().collect()
}
