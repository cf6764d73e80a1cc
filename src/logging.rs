//! tracingによるログ出力の初期化
use tracing::level_filters::LevelFilter;

/// 標準エラー出力へのロガーを初期化
///
/// ログは子プロセスの出力と混ざるため、時刻とターゲットは出力しない。
pub fn init(level: impl Into<LevelFilter>) {
    let result = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .without_time()
        .with_target(false)
        .try_init();

    if let Err(e) = result {
        // ロガーが無くても動作に支障はないので続行
        eprintln!("PipeSh: ロガーの初期化に失敗: {e}");
    }
}
