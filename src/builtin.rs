//! シェルの組み込みコマンド
use crate::parser::Command;
use std::path::PathBuf;
use tracing::debug;

/// 組み込みコマンドの種類
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Builtin {
    Cd,
    Exit,
}

/// コマンド名から組み込みコマンドへの対応表
const BUILTINS: &[(&str, Builtin)] = &[("cd", Builtin::Cd), ("exit", Builtin::Exit)];

impl Builtin {
    /// コマンド名に対応する組み込みコマンドを返す
    pub fn lookup(name: &str) -> Option<Builtin> {
        BUILTINS
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, builtin)| *builtin)
    }

    /// 組み込みコマンドを実行。シェルを終了すべき場合は真を返す
    pub fn run(self, cmd: &Command) -> bool {
        debug!(builtin = ?self, args = ?cmd.args(), "run builtin");
        match self {
            Builtin::Cd => run_cd(cmd.args()),
            Builtin::Exit => true,
        }
    }
}

/// 組み込みコマンドなら真
pub fn is_builtin(name: &str) -> bool {
    Builtin::lookup(name).is_some()
}

/// 組み込みコマンドを実行。組み込みコマンドでない場合は何もせず偽を返す
pub fn run_builtin(cmd: &Command) -> bool {
    match Builtin::lookup(cmd.name()) {
        Some(builtin) => builtin.run(cmd),
        None => false,
    }
}

/// カレントディレクトリを変更。引数がない場合は、ホームディレクトリに移動。第2引数以降は無視
fn run_cd(args: &[&str]) -> bool {
    let path = match args.first() {
        Some(dir) => PathBuf::from(dir),
        None => match dirs::home_dir() {
            Some(home) => home,
            None => {
                eprintln!("cd: ディレクトリ名が必要です");
                return false;
            }
        },
    };

    // カレントディレクトリはシェルのプロセス全体で共有される
    if let Err(e) = std::env::set_current_dir(&path) {
        eprintln!("cd: {}: {e}", path.display());
    }

    false
}
