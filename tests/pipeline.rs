//! パイプラインの実行結果をシェルのバイナリ経由で検査
mod common;

use common::{pipesh, stderr_of, stdout_of};
use std::fs;

#[test]
fn redirect_output() {
    let dir = tempfile::tempdir().unwrap();
    pipesh(dir.path())
        .args(["-c", "echo hi > out.txt"])
        .assert()
        .success();
    assert_eq!(fs::read_to_string(dir.path().join("out.txt")).unwrap(), "hi\n");

    // 既存のファイルは切り詰められる
    fs::write(dir.path().join("out.txt"), "a much longer old line\n").unwrap();
    pipesh(dir.path())
        .args(["-c", "echo new >out.txt"])
        .assert()
        .success();
    assert_eq!(fs::read_to_string(dir.path().join("out.txt")).unwrap(), "new\n");
}

#[test]
fn redirect_input() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("in.txt"), "a\nb\nc\n").unwrap();

    for line in ["wc -l < in.txt", "wc -l <in.txt"] {
        let output = pipesh(dir.path()).args(["-c", line]).output().unwrap();
        assert!(output.status.success());
        assert_eq!(stdout_of(&output).trim(), "3");
    }
}

#[test]
fn redirect_both_ends() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("in.txt"), "b\na\nc\na\n").unwrap();
    pipesh(dir.path())
        .args(["-c", "sort <in.txt | uniq > out.txt"])
        .assert()
        .success()
        .stdout("");
    assert_eq!(
        fs::read_to_string(dir.path().join("out.txt")).unwrap(),
        "a\nb\nc\n"
    );
}

#[test]
fn pipe_two_stages() {
    let dir = tempfile::tempdir().unwrap();
    pipesh(dir.path())
        .args(["-c", "seq 1 5 | sort -r"])
        .assert()
        .success()
        .stdout("5\n4\n3\n2\n1\n");
}

#[test]
fn pipe_three_stages_large_input() {
    // パイプのバッファを大きく超える量を流しても、最後まで読み切って終了する
    const N: usize = 200_000;
    let m = (1..=N).filter(|n| n.to_string().contains('7')).count();

    let dir = tempfile::tempdir().unwrap();
    let line = format!("seq 1 {N} | grep 7 | wc -l");
    let output = pipesh(dir.path()).args(["-c", &line]).output().unwrap();
    assert!(output.status.success());
    assert_eq!(stdout_of(&output).trim(), m.to_string());
}

#[test]
fn pipe_many_stages() {
    let dir = tempfile::tempdir().unwrap();
    pipesh(dir.path())
        .args(["-c", "seq 1 1000 | cat | cat | cat | cat | cat | tail -n 1"])
        .assert()
        .success()
        .stdout("1000\n");
}

#[test]
fn command_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let output = pipesh(dir.path())
        .write_stdin("no_such_command_pipesh arg\necho ok\n")
        .output()
        .unwrap();
    assert!(output.status.success());
    assert_eq!(stdout_of(&output), "ok\n");
    let stderr = stderr_of(&output);
    assert!(stderr.contains("no_such_command_pipesh"));
}

#[test]
fn missing_input_file() {
    // 入力ファイルが無い場合は何も起動せず、出力ファイルも作らない
    let dir = tempfile::tempdir().unwrap();
    let output = pipesh(dir.path())
        .write_stdin("cat < missing.txt > out.txt\necho ok\n")
        .output()
        .unwrap();
    assert!(output.status.success());
    assert_eq!(stdout_of(&output), "ok\n");
    assert!(stderr_of(&output).contains("missing.txt"));
    assert!(!dir.path().join("out.txt").exists());
}

#[test]
fn signaled_child_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("kill.sh"), "kill -TERM $$\n").unwrap();
    let output = pipesh(dir.path())
        .write_stdin("sh kill.sh\necho ok\n")
        .output()
        .unwrap();
    assert!(output.status.success());
    assert_eq!(stdout_of(&output), "ok\n");
    assert!(stderr_of(&output).contains("SIGTERM"));
}

#[test]
fn stopped_child_is_not_terminal() {
    // 最後のコマンドが停止しても待ち続け、再開後の終了を待つ
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("stop.sh"),
        "(sleep 1; kill -CONT $$) &\nkill -STOP $$\necho resumed\n",
    )
    .unwrap();
    let output = pipesh(dir.path())
        .write_stdin("sh stop.sh\necho next\n")
        .output()
        .unwrap();
    assert!(output.status.success());
    assert_eq!(stdout_of(&output), "resumed\nnext\n");
}
