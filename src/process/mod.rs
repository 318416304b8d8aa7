//! Process supervision: spawning, exit monitoring, signals, stdin feeding.
//!
//! A launched child yields four independently owned pieces: the `Child`
//! itself (owned by the exit-wait task for its whole lifetime), an optional
//! [`InputHandle`] feeding its stdin, and one [`stream::OutputReader`] per
//! output pipe. Nothing here blocks the UI loop; each piece is driven by its
//! own task and reports back through the event channel.

pub mod stream;

use std::io;
use std::process::{ExitStatus, Stdio};

use log::{debug, warn};
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::mpsc;

use crate::command::CommandSpec;
use self::stream::{OutputReader, StreamSource};

/// Why a spawn attempt never produced a running process.
#[derive(Debug, thiserror::Error)]
pub enum SpawnError {
    #[error("executable not found: {program}")]
    NotFound { program: String },
    #[error("permission denied running {program}")]
    PermissionDenied { program: String },
    #[error("failed to start {program}: {source}")]
    Io {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to capture {channel} pipe of {program}")]
    Pipe {
        program: String,
        channel: &'static str,
    },
}

impl SpawnError {
    fn from_io(program: &str, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::NotFound {
                program: program.to_string(),
            },
            io::ErrorKind::PermissionDenied => Self::PermissionDenied {
                program: program.to_string(),
            },
            _ => Self::Io {
                program: program.to_string(),
                source: err,
            },
        }
    }

    fn pipe(program: &str, channel: &'static str) -> Self {
        Self::Pipe {
            program: program.to_string(),
            channel,
        }
    }
}

/// Why a finished session counts as failed.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("{0}")]
    Spawn(#[from] SpawnError),
    #[error("{0}")]
    Unsuccessful(ExitStatus),
    #[error("wait for exit failed: {0}")]
    Wait(io::Error),
}

/// A freshly spawned child, split into its independently owned pieces.
#[derive(Debug)]
pub struct SpawnedProcess {
    pub child: Child,
    pub pid: Option<u32>,
    /// Present only when the command attaches stdin.
    pub input: Option<InputHandle>,
    pub stdout: OutputReader,
    pub stderr: OutputReader,
}

/// Spawns the command with the ambient environment plus the spec's overrides,
/// piping stdout and stderr, and piping stdin only when requested (otherwise
/// the child reads the null device).
///
/// Any failure returns with no live process left behind: `kill_on_drop` reaps
/// a child whose pipes could not be captured.
pub fn launch(spec: &CommandSpec) -> Result<SpawnedProcess, SpawnError> {
    let mut command = Command::new(&spec.program);
    command
        .args(&spec.args)
        .current_dir(&spec.cwd)
        .stdin(if spec.attach_stdin {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    for (key, value) in &spec.env {
        command.env(key, value);
    }

    let mut child = command
        .spawn()
        .map_err(|e| SpawnError::from_io(&spec.program, e))?;
    let pid = child.id();

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| SpawnError::pipe(&spec.program, "stdout"))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| SpawnError::pipe(&spec.program, "stderr"))?;
    let input = if spec.attach_stdin {
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| SpawnError::pipe(&spec.program, "stdin"))?;
        Some(InputHandle::attach(stdin))
    } else {
        None
    };

    debug!("Spawned `{}` (pid {:?})", spec.display, pid);
    Ok(SpawnedProcess {
        child,
        pid,
        input,
        stdout: OutputReader::new(StreamSource::Stdout, stdout),
        stderr: OutputReader::new(StreamSource::Stderr, stderr),
    })
}

/// Waits for the child to terminate and maps its status onto the session
/// outcome. The calling task owns the child until it is reaped.
pub async fn wait_for_exit(mut child: Child) -> Result<(), RunError> {
    match child.wait().await {
        Ok(status) if status.success() => Ok(()),
        Ok(status) => Err(RunError::Unsuccessful(status)),
        Err(e) => Err(RunError::Wait(e)),
    }
}

/// Delivers SIGINT to the process, as if the user pressed Ctrl+C in its
/// terminal. Failures are logged and swallowed; the process may already be
/// gone.
#[cfg(unix)]
pub fn interrupt(pid: u32) {
    use nix::sys::signal::{self, Signal};
    use nix::unistd::Pid;

    let pid = Pid::from_raw(i32::try_from(pid).unwrap_or(i32::MAX));
    if let Err(e) = signal::kill(pid, Signal::SIGINT) {
        warn!("Failed to deliver SIGINT to {pid}: {e}");
    }
}

#[cfg(not(unix))]
pub fn interrupt(pid: u32) {
    warn!("Cancel is unsupported on this platform (pid {pid})");
}

/// Write half of the child's stdin: an ordered line queue drained by a task
/// that owns the pipe. Sending never blocks; once the child stops reading,
/// queued lines are dropped silently.
#[derive(Debug, Clone)]
pub struct InputHandle {
    tx: mpsc::UnboundedSender<String>,
}

impl InputHandle {
    /// Creates a handle whose queued lines are written to `stdin` in order.
    pub fn attach(stdin: ChildStdin) -> Self {
        let (handle, rx) = Self::channel();
        tokio::spawn(forward_input(stdin, rx));
        handle
    }

    /// Raw channel pair without a writer task, so tests can observe exactly
    /// the bytes that would reach the child.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Queues one line for the child. A closed queue means the child went
    /// away; the line is dropped without error.
    pub fn send_line(&self, line: String) {
        if self.tx.send(line).is_err() {
            debug!("Dropped input line; child stdin is gone");
        }
    }
}

async fn forward_input(mut stdin: ChildStdin, mut rx: mpsc::UnboundedReceiver<String>) {
    while let Some(line) = rx.recv().await {
        if let Err(e) = stdin.write_all(line.as_bytes()).await {
            debug!("Stopping input forwarding: {e}");
            break;
        }
    }
}
