//! Spawning external tools with merged, line-oriented output.

use serde::{Deserialize, Serialize};
use std::ffi::{OsStr, OsString};
use std::io;
use std::path::PathBuf;
use std::process::Stdio;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::mpsc;
use tracing::debug;

/// Capacity of the merged output channel.
///
/// Reader tasks wait once this many lines are queued, so a slow consumer
/// slows the child down instead of buffering without bound.
const OUTPUT_CHANNEL_CAPACITY: usize = 64;

/// One line of output from a subprocess.
///
/// Lines end at `\n`, `\r\n` or a bare `\r`, and are cut after
/// 8 KiB. Lines from stdout and stderr arrive on a single stream;
/// `is_error` tells them apart. Ordering between the two pipes is
/// best-effort.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputMessage {
    /// The line, without its line break. Invalid UTF-8 is replaced.
    pub text: String,
    /// `true` if the line came from stderr.
    pub is_error: bool,
}

impl OutputMessage {
    /// A line read from stdout.
    pub fn stdout(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: false,
        }
    }

    /// A line read from stderr.
    pub fn stderr(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: true,
        }
    }
}

/// A subprocess could not be started.
///
/// This is distinct from a process that started and exited non-zero; the
/// exit code is a result the caller interprets, not a launch failure.
#[derive(Debug, Error)]
#[error("failed to launch {program}: {source}")]
pub struct LaunchError {
    /// The program that was being launched.
    pub program: String,
    /// Why it could not be launched.
    #[source]
    pub source: io::Error,
}

impl LaunchError {
    /// Whether the program could not be found at all.
    pub fn is_not_found(&self) -> bool {
        self.source.kind() == io::ErrorKind::NotFound
    }
}

/// How a subprocess is wired up.
///
/// # Example
///
/// ```rust
/// use sdk_cmdline_installer::process::SpawnOptions;
///
/// let opts = SpawnOptions {
///     attach_input: true,
///     ..Default::default()
/// };
/// assert!(!opts.inherit_stdio);
/// ```
#[derive(Debug, Clone, Default)]
pub struct SpawnOptions {
    /// Working directory for the child. Defaults to the parent's.
    pub working_dir: Option<PathBuf>,

    /// Give the child the parent's stdin, stdout and stderr.
    ///
    /// No output is captured and `attach_input` is ignored.
    pub inherit_stdio: bool,

    /// Pipe the child's stdin so it can be taken with [`Subprocess::take_input`].
    pub attach_input: bool,

    /// Extra environment variables (key, value pairs).
    pub envs: Vec<(String, String)>,
}

/// A running child process.
///
/// Owns the child, its merged output stream (if captured) and its stdin
/// (if attached). The child is killed if this handle is dropped before
/// [`Subprocess::wait`] completes.
#[derive(Debug)]
pub struct Subprocess {
    program: String,
    child: Child,
    output: Option<mpsc::Receiver<OutputMessage>>,
    input: Option<ChildStdin>,
}

/// Launch `program` with `args`.
///
/// The program is resolved through `PATH` (or taken as-is if it is a path),
/// so a tool that is not installed fails here with
/// [`LaunchError::is_not_found`] rather than at wait time.
///
/// Unless `inherit_stdio` is set, stdout and stderr are read by two
/// background tasks that feed one channel; the stream ends once both pipes
/// have closed.
pub fn spawn<I, S>(
    program: impl AsRef<OsStr>,
    args: I,
    options: &SpawnOptions,
) -> Result<Subprocess, LaunchError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let program_name = program.as_ref().to_string_lossy().into_owned();
    let resolved = resolve_program(program.as_ref(), &program_name)?;

    let mut command = Command::new(&resolved);
    command
        .args(args)
        .envs(options.envs.iter().cloned())
        .kill_on_drop(true);
    if let Some(dir) = &options.working_dir {
        command.current_dir(dir);
    }

    if options.inherit_stdio {
        command
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());
    } else {
        command
            .stdin(if options.attach_input {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
    }

    let mut child = command.spawn().map_err(|source| LaunchError {
        program: program_name.clone(),
        source,
    })?;
    debug!(program = %program_name, pid = ?child.id(), "spawned subprocess");

    let output = if options.inherit_stdio {
        None
    } else {
        let (tx, rx) = mpsc::channel(OUTPUT_CHANNEL_CAPACITY);
        if let Some(stdout) = child.stdout.take() {
            spawn_reader(stdout, false, tx.clone());
        }
        if let Some(stderr) = child.stderr.take() {
            spawn_reader(stderr, true, tx);
        }
        Some(rx)
    };
    let input = child.stdin.take();

    Ok(Subprocess {
        program: program_name,
        child,
        output,
        input,
    })
}

/// Launch `program` without waiting for it or capturing anything.
///
/// Used for opening OS settings UIs, where the process outlives the call.
pub fn spawn_detached<I, S>(program: impl AsRef<OsStr>, args: I) -> Result<(), LaunchError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let program_name = program.as_ref().to_string_lossy().into_owned();
    let resolved = resolve_program(program.as_ref(), &program_name)?;

    Command::new(&resolved)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map(|_child| ())
        .map_err(|source| LaunchError {
            program: program_name,
            source,
        })
}

fn resolve_program(program: &OsStr, program_name: &str) -> Result<OsString, LaunchError> {
    which::which(program)
        .map(PathBuf::into_os_string)
        .map_err(|e| LaunchError {
            program: program_name.to_string(),
            source: io::Error::new(io::ErrorKind::NotFound, e.to_string()),
        })
}

fn spawn_reader<R>(stream: R, is_error: bool, tx: mpsc::Sender<OutputMessage>)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut reader = BufReader::new(stream);
        let mut splitter = LineSplitter::default();
        let mut ready = Vec::new();
        // Keep draining after the receiver is gone so the child never
        // blocks on a full pipe.
        let mut forwarding = true;
        loop {
            let consumed = match reader.fill_buf().await {
                Ok([]) => break,
                Ok(chunk) => {
                    ready.extend(chunk.iter().filter_map(|&byte| splitter.push(byte)));
                    chunk.len()
                }
                Err(e) => {
                    debug!(error = %e, is_error, "subprocess pipe read failed");
                    break;
                }
            };
            reader.consume(consumed);

            for text in ready.drain(..) {
                if forwarding && tx.send(OutputMessage { text, is_error }).await.is_err() {
                    forwarding = false;
                }
            }
        }
        if let Some(text) = splitter.finish() {
            if forwarding {
                let _ = tx.send(OutputMessage { text, is_error }).await;
            }
        }
    });
}

/// Longest line forwarded in one piece; longer runs are cut at this length.
const MAX_LINE_LEN: usize = 8 * 1024;

/// Cuts a byte stream into lines at `\n`, `\r` or `\r\n`.
///
/// Progress bars redraw themselves with a bare `\r`, so each frame becomes
/// its own message as soon as it is written.
#[derive(Debug, Default)]
struct LineSplitter {
    line: Vec<u8>,
    swallow_newline: bool,
}

impl LineSplitter {
    fn push(&mut self, byte: u8) -> Option<String> {
        let swallow_newline = std::mem::take(&mut self.swallow_newline);
        match byte {
            b'\n' if swallow_newline && self.line.is_empty() => None,
            b'\n' => Some(self.take_line()),
            b'\r' => {
                self.swallow_newline = true;
                Some(self.take_line())
            }
            _ => {
                self.line.push(byte);
                if self.line.len() >= MAX_LINE_LEN {
                    self.swallow_newline = true;
                    Some(self.take_line())
                } else {
                    None
                }
            }
        }
    }

    /// Whatever is left when the pipe closes without a final line break.
    fn finish(mut self) -> Option<String> {
        (!self.line.is_empty()).then(|| self.take_line())
    }

    fn take_line(&mut self) -> String {
        let text = String::from_utf8_lossy(&self.line).into_owned();
        self.line.clear();
        text
    }
}

impl Subprocess {
    /// The program name this process was launched as.
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Next line of merged output, or `None` once both pipes have closed.
    ///
    /// Always `None` for processes spawned with `inherit_stdio`.
    pub async fn next_output(&mut self) -> Option<OutputMessage> {
        match self.output.as_mut() {
            Some(rx) => rx.recv().await,
            None => None,
        }
    }

    /// Take the child's stdin, if it was attached.
    pub fn take_input(&mut self) -> Option<ChildStdin> {
        self.input.take()
    }

    /// Wait for the child to exit and return its exit code.
    ///
    /// `None` means the child was terminated by a signal. Any output not yet
    /// consumed is discarded.
    pub async fn wait(mut self) -> io::Result<Option<i32>> {
        self.input.take();
        self.output.take();
        let status = self.child.wait().await?;
        debug!(program = %self.program, status = %status, "subprocess exited");
        Ok(status.code())
    }
}
