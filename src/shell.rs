use crate::{
    config::Config, helper::DynError, parser::parse, pipeline::execute, token::split_words,
};
use rustyline::{error::ReadlineError, Editor};
use signal_hook::consts::SIGINT;
use std::{
    io::BufRead,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};
use tracing::{debug, warn};

/// 1行ずつコマンドを読み込む入力元
pub enum Input {
    Editor(Editor<()>),       // 端末からの対話的な入力。プロンプトとヒストリあり
    Reader(Box<dyn BufRead>), // スクリプトファイルやパイプからの入力
    Line(Option<String>),     // -cで指定された1行
}

impl Input {
    fn is_interactive(&self) -> bool {
        matches!(self, Input::Editor(_))
    }
}

pub struct Shell {
    config: Config,
    input: Input,
    interrupted: Arc<AtomicBool>, // SIGINTを受信したら真
}

impl Shell {
    pub fn new(config: Config, input: Input) -> Self {
        Shell {
            config,
            input,
            interrupted: Arc::new(AtomicBool::new(false)),
        }
    }

    /// 入力が終わるか、exitが実行されるまでコマンドを実行
    pub fn run(mut self) -> Result<(), DynError> {
        // Ctrl+Cで終了するのは子プロセスのみ。exec後はデフォルトの動作に戻る
        signal_hook::flag::register(SIGINT, Arc::clone(&self.interrupted))?;

        self.load_history();

        while let Some(line) = self.read_line()? {
            if eval_line(&line) {
                break; // exit
            }

            // 非対話的な実行中に割り込まれた場合は残りを実行しない
            if self.interrupted.swap(false, Ordering::Relaxed) && !self.input.is_interactive() {
                debug!("interrupted");
                break;
            }
        }

        self.save_history();
        Ok(())
    }

    /// 1行読み込む。入力の終わりに達した場合はNoneを返す
    fn read_line(&mut self) -> Result<Option<String>, DynError> {
        match &mut self.input {
            Input::Editor(rl) => match rl.readline(&self.config.prompt) {
                Ok(line) => {
                    let line_trimed = line.trim();
                    if !line_trimed.is_empty() {
                        rl.add_history_entry(line_trimed); // ヒストリに追加
                    }
                    Ok(Some(line))
                }
                Err(ReadlineError::Interrupted) => {
                    eprintln!("PipeSh: 終了はCtrl+D");
                    Ok(Some(String::new()))
                }
                Err(ReadlineError::Eof) => {
                    println!();
                    Ok(None)
                }
                Err(e) => Err(format!("読み込みエラー: {e}").into()),
            },
            Input::Reader(reader) => {
                let mut line = String::new();
                if reader.read_line(&mut line)? == 0 {
                    Ok(None)
                } else {
                    Ok(Some(line))
                }
            }
            Input::Line(line) => Ok(line.take()),
        }
    }

    fn load_history(&mut self) {
        let history = &self.config.history;
        if let Input::Editor(rl) = &mut self.input {
            if history.enabled && history.file.exists() {
                if let Err(e) = rl.load_history(&history.file) {
                    warn!("ヒストリファイルの読み込みに失敗: {e}");
                }
            }
        }
    }

    fn save_history(&mut self) {
        let history = &self.config.history;
        if let Input::Editor(rl) = &mut self.input {
            if history.enabled {
                if let Err(e) = rl.save_history(&history.file) {
                    warn!("ヒストリファイルの書き込みに失敗: {e}");
                }
            }
        }
    }
}

/// 1行をパースして実行。シェルを終了すべき場合は真を返す
///
/// パースや実行のエラーは表示するのみで、シェルは続行する。
pub fn eval_line(line: &str) -> bool {
    let tokens = split_words(line);
    let pipeline = match parse(&tokens) {
        Ok(pipeline) => pipeline,
        Err(e) => {
            eprintln!("PipeSh: {e}");
            return false;
        }
    };
    debug!(?pipeline, "parsed");

    match execute(pipeline) {
        Ok(quit) => quit,
        Err(e) => {
            eprintln!("PipeSh: {e}");
            false
        }
    }
}
