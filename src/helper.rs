use nix::errno::Errno;

pub type DynError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// システムコール呼び出しのラッパ。EINTRならリトライ
pub fn syscall<F, T>(f: F) -> Result<T, nix::Error>
where
    F: Fn() -> Result<T, nix::Error>,
{
    loop {
        match f() {
            Err(Errno::EINTR) => (), // リトライ
            result => return result,
        }
    }
}
