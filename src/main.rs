use clap::Parser;
use pipesh::{
    config::{Config, LogLevel},
    helper::DynError,
    logging,
    shell::{Input, Shell},
};
use rustyline::Editor;
use std::{
    fs::File,
    io::{self, BufReader, IsTerminal},
    path::PathBuf,
};
use tracing::warn;

/// パイプとリダイレクトをサポートする小さなシェル
#[derive(Parser)]
#[command(name = "pipesh", version, about)]
struct Args {
    /// 実行するスクリプトファイル。省略した場合は標準入力から読み込む
    script: Option<PathBuf>,

    /// 1行のコマンドを実行して終了
    #[arg(short = 'c', value_name = "COMMAND", conflicts_with = "script")]
    command: Option<String>,

    /// 設定ファイル
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// ログの出力レベル。設定ファイルの値より優先
    #[arg(long, value_enum, value_name = "LEVEL")]
    log_level: Option<LogLevel>,

    /// ヒストリファイルを読み書きしない
    #[arg(long)]
    no_history: bool,
}

fn main() -> Result<(), DynError> {
    let args = Args::parse();

    let (mut config, warning) = Config::load(args.config.as_deref())?;
    if let Some(level) = args.log_level {
        config.log_level = level;
    }
    if args.no_history {
        config.history.enabled = false;
    }
    logging::init(config.log_level);
    if let Some(msg) = warning {
        warn!("{msg}");
    }

    let input = if let Some(line) = args.command {
        Input::Line(Some(line))
    } else if let Some(path) = &args.script {
        // スクリプトファイルをオープンできない場合のみシェルは失敗で終了
        let f = File::open(path).map_err(|e| format!("{}: {e}", path.display()))?;
        Input::Reader(Box::new(BufReader::new(f)))
    } else if io::stdin().is_terminal() {
        Input::Editor(Editor::<()>::new()?)
    } else {
        Input::Reader(Box::new(io::stdin().lock()))
    };

    let sh = Shell::new(config, input);
    sh.run()?;

    Ok(())
}
