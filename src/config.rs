//! 設定ファイルの読み込み
//!
//! 設定ファイルはTOML形式。省略した項目はデフォルト値になる。
//!
//! ```toml
//! prompt = "pipesh %> "
//! log_level = "warn"
//!
//! [history]
//! enabled = true
//! file = "/home/me/.pipesh_history"
//! ```
use crate::helper::DynError;
use clap::ValueEnum;
use serde::Deserialize;
use std::{
    fs, io,
    path::{Path, PathBuf},
};
use tracing::level_filters::LevelFilter;

/// ホームディレクトリ直下の設定ファイル
const CONFIG_FILE: &str = ".pipeshrc.toml";

/// ホームディレクトリ直下のヒストリファイル
const HISTORY_FILE: &str = ".pipesh_history";

const DEFAULT_PROMPT: &str = "pipesh %> ";

#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub prompt: String,
    pub log_level: LogLevel,
    pub history: History,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            prompt: DEFAULT_PROMPT.to_string(),
            log_level: LogLevel::default(),
            history: History::default(),
        }
    }
}

#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct History {
    pub enabled: bool,
    pub file: PathBuf,
}

impl Default for History {
    fn default() -> Self {
        // ホームディレクトリが分からない場合はカレントディレクトリに保存
        let file = match dirs::home_dir() {
            Some(mut h) => {
                h.push(HISTORY_FILE);
                h
            }
            None => PathBuf::from(HISTORY_FILE),
        };
        History { enabled: true, file }
    }
}

/// ログの出力レベル
#[derive(Debug, Deserialize, PartialEq, Eq, Clone, Copy, Default, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Off,
    Error,
    #[default]
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::OFF,
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

impl Config {
    /// TOML文字列から設定を生成
    pub fn from_toml(s: &str) -> Result<Config, DynError> {
        Ok(toml::from_str(s)?)
    }

    /// 指定されたファイルから設定を読み込む
    pub fn from_file(path: &Path) -> Result<Config, DynError> {
        let s = fs::read_to_string(path)
            .map_err(|e| format!("{}を読み込めません: {e}", path.display()))?;
        Config::from_toml(&s).map_err(|e| format!("{}: {e}", path.display()).into())
    }

    /// 設定を読み込む
    ///
    /// pathが指定された場合はそのファイルを読み込み、失敗した場合はエラー。
    /// 指定されない場合はホームディレクトリの設定ファイルを読み込み、
    /// 存在しない場合や不正な場合はデフォルト値を用いる。
    ///
    /// 不正な設定ファイルを無視した場合は、その警告文も返す。
    /// ロガーの初期化前に呼ばれるため、警告の出力は呼び出し側で行う。
    pub fn load(path: Option<&Path>) -> Result<(Config, Option<String>), DynError> {
        if let Some(path) = path {
            return Ok((Config::from_file(path)?, None));
        }

        match dirs::home_dir() {
            Some(mut h) => {
                h.push(CONFIG_FILE);
                Ok(Config::load_or_default(&h))
            }
            None => Ok((Config::default(), None)),
        }
    }

    /// pathを読み込む。存在しない場合や不正な場合はデフォルト値
    fn load_or_default(path: &Path) -> (Config, Option<String>) {
        match fs::read_to_string(path) {
            Ok(s) => match Config::from_toml(&s) {
                Ok(config) => (config, None),
                Err(e) => (
                    Config::default(),
                    Some(format!("{}を無視します: {e}", path.display())),
                ),
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => (Config::default(), None),
            Err(e) => (
                Config::default(),
                Some(format!("{}を読み込めません: {e}", path.display())),
            ),
        }
    }
}
