use std::io::{self, Read};
use std::process::{Command, ExitStatus, Stdio};

/// Exit status and everything a subprocess wrote, stdout and stderr interleaved.
#[derive(Debug)]
pub struct CombinedOutput {
    pub status: ExitStatus,
    pub text: String,
}

/// Run a subprocess to completion, collecting stdout and stderr into a single buffer
/// in the order they were written.
///
/// Both streams share one pipe, so the child's own write order is preserved.
/// `cmd` is consumed: it holds the parent's copies of the pipe's write end,
/// which have to be closed before the read end can reach EOF.
pub fn run_cmd(mut cmd: Command) -> io::Result<CombinedOutput> {
    let (mut reader, writer) = io::pipe()?;
    cmd.stdin(Stdio::null())
        .stdout(writer.try_clone()?)
        .stderr(writer);

    let mut child = cmd.spawn()?;
    let program = cmd.get_program().to_owned();
    drop(cmd);

    let mut buf = Vec::with_capacity(256);
    let read = reader.read_to_end(&mut buf);
    let status = child.wait()?;
    read?;

    let text = String::from_utf8_lossy(&buf).into_owned();
    log::trace!("{program:?} exited with {status}; output: {text:?}");

    Ok(CombinedOutput { status, text })
}
