//! パイプラインの実行
//!
//! 各コマンドをfork & execし、パイプとリダイレクト先のファイルで標準入出力をつなぐ。
//! 親プロセスが持つファイルディスクリプタはすべてOwnedFdで管理し、
//! 子プロセスに渡した直後にクローズする。
use crate::{
    builtin::{is_builtin, run_builtin},
    helper::syscall,
    parser::{Command, Pipeline},
};
use nix::{
    errno::Errno,
    fcntl::{fcntl, FcntlArg, FdFlag},
    libc,
    sys::{
        signal::Signal,
        wait::{waitpid, WaitPidFlag, WaitStatus},
    },
    unistd::{close, dup2, execvp, fork, pipe, write, ForkResult, Pid},
};
use std::{
    error::Error,
    ffi::CString,
    fmt::{self, Display},
    fs::{File, OpenOptions},
    io,
    os::unix::{
        fs::OpenOptionsExt,
        io::{AsRawFd, FromRawFd, OwnedFd, RawFd},
    },
};
use tracing::debug;

/// 子プロセス内でexecに失敗した場合の終了コード
const EXIT_NOT_FOUND: i32 = 127;
const EXIT_CANNOT_EXEC: i32 = 126;

/// パイプライン実行時のエラー
#[derive(Debug)]
pub enum ExecError {
    Io(String, io::Error),    // ファイルのオープンやパイプの生成に失敗。Stringは失敗した操作
    Spawn(String, io::Error), // 子プロセスの生成に失敗。Stringはコマンド名
}

impl Display for ExecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecError::Io(what, e) => write!(f, "ExecError: {what}: {e}"),
            ExecError::Spawn(name, e) => {
                write!(f, "ExecError: プロセス生成エラー: {name}: {e}")
            }
        }
    }
}

impl Error for ExecError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ExecError::Io(_, e) | ExecError::Spawn(_, e) => Some(e),
        }
    }
}

/// パイプラインを実行。シェルを終了すべき場合はOk(true)を返す
///
/// 組み込みコマンドが単独で指定された場合はシェル内で実行し、リダイレクトは無視する。
/// それ以外の場合は全コマンドを子プロセスとして起動し、最後のコマンドの終了のみを待つ。
pub fn execute(pipeline: Pipeline) -> Result<bool, ExecError> {
    // 空のパイプラインは何もしない
    let Some((last, init)) = pipeline.commands.split_last() else {
        return Ok(false);
    };

    // 組み込みコマンドは単独の場合のみ。パイプ中の場合は外部コマンドとして実行
    if init.is_empty() && is_builtin(last.name()) {
        if pipeline.redirect_input.is_some() || pipeline.redirect_output.is_some() {
            debug!(name = last.name(), "redirect is ignored for builtin");
        }
        return Ok(run_builtin(last));
    }

    // 子プロセスを生成する前に、リダイレクト先のオープンと引数の変換を済ませる
    let input = match pipeline.redirect_input {
        Some(path) => Some(open_input(path)?),
        None => None,
    };
    let output = match pipeline.redirect_output {
        Some(path) => Some(open_output(path)?),
        None => None,
    };
    let init_argvs = init.iter().map(to_argv).collect::<Result<Vec<_>, _>>()?;
    let last_argv = to_argv(last)?;

    let pid = spawn_children(
        init,
        &init_argvs,
        (last, last_argv.as_slice()),
        input,
        output,
    )?;
    match wait_last(pid)? {
        WaitStatus::Exited(pid, status) => debug!(%pid, status, "exited"),
        WaitStatus::Signaled(pid, sig, core) => report_signal(pid, sig, core),
        status => debug!(?status, "unexpected wait status"),
    }

    Ok(false)
}

/// 入力のリダイレクト先を読み込み専用でオープン
fn open_input(path: &str) -> Result<OwnedFd, ExecError> {
    File::open(path)
        .map(OwnedFd::from)
        .map_err(|e| ExecError::Io(format!("{path}をオープンできません"), e))
}

/// 出力のリダイレクト先を書き込み専用でオープン。存在しない場合は作成し、存在する場合は切り詰める
fn open_output(path: &str) -> Result<OwnedFd, ExecError> {
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o644)
        .open(path)
        .map(OwnedFd::from)
        .map_err(|e| ExecError::Io(format!("{path}をオープンできません"), e))
}

/// コマンドをexecvpに渡す引数リストに変換
fn to_argv(cmd: &Command) -> Result<Vec<CString>, ExecError> {
    cmd.words()
        .iter()
        .map(|s| CString::new(*s))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| ExecError::Spawn(cmd.name().to_string(), e.into()))
}

/// パイプを生成し、(読み込み側, 書き込み側)を返す
///
/// 両端ともclose-on-execに設定するため、exec後の子プロセスには
/// dup2で標準入出力に複製したもの以外は残らない。
fn make_pipe() -> Result<(OwnedFd, OwnedFd), ExecError> {
    let (r, w) = pipe().map_err(|e| ExecError::Io("pipe".to_string(), e.into()))?;

    // SAFETY: pipeが返した直後の記述子であり、他に所有者はいない
    let (r, w) = unsafe { (OwnedFd::from_raw_fd(r), OwnedFd::from_raw_fd(w)) };

    for fd in [&r, &w] {
        fcntl(fd.as_raw_fd(), FcntlArg::F_SETFD(FdFlag::FD_CLOEXEC))
            .map_err(|e| ExecError::Io("fcntl".to_string(), e.into()))?;
    }

    Ok((r, w))
}

/// 全コマンドを左から順に起動し、最後のコマンドのPIDを返す
///
/// - initは最後以外のコマンドで、それぞれ標準出力を次のコマンドへのパイプに設定
/// - inputがSome(fd)の場合は、最初のコマンドの標準入力をfdに設定
/// - outputがSome(fd)の場合は、最後のコマンドの標準出力をfdに設定
///
/// 途中で失敗した場合は残りのコマンドは起動せず、親の持つ記述子はすべてクローズされる。
fn spawn_children(
    init: &[Command],
    init_argvs: &[Vec<CString>],
    (last, last_argv): (&Command, &[CString]),
    input: Option<OwnedFd>,
    output: Option<OwnedFd>,
) -> Result<Pid, ExecError> {
    let mut stdin_fd = input; // 次に起動するコマンドの標準入力

    for (cmd, argv) in init.iter().zip(init_argvs) {
        let (r, w) = make_pipe()?;
        spawn_one(cmd, argv, stdin_fd.as_ref(), Some(&w))?;

        // 子プロセスに渡した記述子を親側でクローズ
        drop(w);
        stdin_fd = Some(r);
    }

    spawn_one(last, last_argv, stdin_fd.as_ref(), output.as_ref())
}

/// 1つのコマンドを起動してPIDを返す
fn spawn_one(
    cmd: &Command,
    argv: &[CString],
    input: Option<&OwnedFd>,
    output: Option<&OwnedFd>,
) -> Result<Pid, ExecError> {
    let child = fork_exec(
        argv,
        input.map(AsRawFd::as_raw_fd),
        output.map(AsRawFd::as_raw_fd),
    )
    .map_err(|e| ExecError::Spawn(cmd.name().to_string(), e.into()))?;
    debug!(%child, name = cmd.name(), "spawned");
    Ok(child)
}

/// fork & exec
///
/// - inputがSome(fd)の場合は、標準入力をfdと設定
/// - outputがSome(fd)の場合は、標準出力をfdと設定
///
/// 子プロセスはこの関数から戻らない。
fn fork_exec(
    argv: &[CString],
    input: Option<RawFd>,
    output: Option<RawFd>,
) -> Result<Pid, nix::Error> {
    match syscall(|| unsafe { fork() })? {
        ForkResult::Parent { child, .. } => Ok(child),
        ForkResult::Child => exec_child(argv, input, output),
    }
}

/// 子プロセス側の処理。標準入出力を設定して実行ファイルをメモリに読み込む
fn exec_child(argv: &[CString], input: Option<RawFd>, output: Option<RawFd>) -> ! {
    // 標準入出力を設定
    if let Err(e) = replace_fd(input, libc::STDIN_FILENO)
        .and_then(|_| replace_fd(output, libc::STDOUT_FILENO))
    {
        child_error(b"dup2", e);
        unsafe { libc::_exit(1) };
    }

    let e = match execvp(&argv[0], argv) {
        Err(e) => e,
        Ok(_) => unreachable!(),
    };

    child_error(argv[0].as_bytes(), e);
    let code = if e == Errno::ENOENT {
        EXIT_NOT_FOUND
    } else {
        EXIT_CANNOT_EXEC
    };

    // 親プロセスから引き継いだバッファをフラッシュしないよう_exitで終了
    unsafe { libc::_exit(code) }
}

/// fdがSomeでtargetと異なる場合に、fdをtargetに複製して元の記述子をクローズ
fn replace_fd(fd: Option<RawFd>, target: RawFd) -> Result<(), nix::Error> {
    match fd {
        Some(fd) if fd != target => {
            syscall(|| dup2(fd, target))?;
            syscall(|| close(fd))
        }
        _ => Ok(()),
    }
}

/// 子プロセス内でのエラー表示。fork後なのでヒープを確保せずに書き込む
fn child_error(what: &[u8], e: Errno) {
    let msgs: [&[u8]; 5] = [b"PipeSh: ", what, b": ", e.desc().as_bytes(), b"\n"];
    for msg in msgs {
        let _ = write(libc::STDERR_FILENO, msg);
    }
}

/// 最後のコマンドが終了するまで待つ。停止は終了とみなさない
fn wait_last(pid: Pid) -> Result<WaitStatus, ExecError> {
    loop {
        match syscall(|| waitpid(pid, Some(WaitPidFlag::WUNTRACED))) {
            Ok(status @ (WaitStatus::Exited(..) | WaitStatus::Signaled(..))) => {
                return Ok(status)
            }
            Ok(status) => debug!(?status, "still waiting"),
            Err(e) => return Err(ExecError::Io("waitpid".to_string(), e.into())),
        }
    }
}

/// シグナルによる終了を表示。SIGINTの場合は改行のみ
fn report_signal(pid: Pid, sig: Signal, core: bool) {
    debug!(%pid, %sig, core, "signaled");
    if sig == Signal::SIGINT {
        eprintln!();
    } else {
        eprintln!(
            "PipeSh: 子プロセスがシグナルにより終了{}: pid = {pid}, signal = {sig}",
            if core { "（コアダンプ）" } else { "" }
        );
    }
}
