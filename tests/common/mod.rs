//! 結合テスト共通の補助関数
#![allow(dead_code)]

use assert_cmd::Command;
use std::{path::Path, process::Output, time::Duration};

/// 設定ファイルの影響を受けないよう、HOMEも作業ディレクトリにして起動
pub fn pipesh(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("pipesh").unwrap();
    cmd.current_dir(dir)
        .env("HOME", dir)
        .arg("--no-history")
        .timeout(Duration::from_secs(30));
    cmd
}

pub fn stdout_of(output: &Output) -> String {
    String::from_utf8(output.stdout.clone()).unwrap()
}

pub fn stderr_of(output: &Output) -> String {
    String::from_utf8(output.stderr.clone()).unwrap()
}
