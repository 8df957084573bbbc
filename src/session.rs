//! Target process session
//!
//! Owns the child process and its three pipes. Blocking pipe I/O is moved
//! onto small adapter threads so the interpreter can select on it together
//! with the stderr watchdog:
//! - stdin: a writer thread takes one line at a time and acknowledges each write
//! - stdout: a reader thread hands over one line at a time (rendezvous channel)
//! - stderr: drained by the [`Watchdog`]

use std::fmt;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::thread;

use crossbeam_channel::{bounded, Receiver, Sender};
use tracing::debug;

use crate::engine::{Guarded, Target};
use crate::error::{ErrorKind, ScriptError};
use crate::watchdog::Watchdog;

/// The program to run and its arguments
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// A running target process
pub struct Session {
    child: Child,
    input: Option<Sender<String>>,
    written: Receiver<io::Result<()>>,
    output: Receiver<io::Result<String>>,
    watchdog: Watchdog,
}

impl Session {
    /// Spawn the target with all three standard streams piped.
    pub fn start(invocation: &Invocation) -> Result<Self, ScriptError> {
        let program = invocation.program.as_str();
        let mut child = Command::new(program)
            .args(&invocation.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| ScriptError::spawn(program, e))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| ScriptError::spawn(program, "stdin unavailable"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ScriptError::spawn(program, "stdout unavailable"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| ScriptError::spawn(program, "stderr unavailable"))?;

        let watchdog = Watchdog::spawn(stderr).map_err(|e| ScriptError::spawn(program, e))?;
        let (input, written) = spawn_writer(stdin).map_err(|e| ScriptError::spawn(program, e))?;
        let output = spawn_reader(stdout).map_err(|e| ScriptError::spawn(program, e))?;

        debug!("started {} (pid {})", program, child.id());

        Ok(Self {
            child,
            input: Some(input),
            written,
            output,
            watchdog,
        })
    }
}

impl Target for Session {
    fn send(&mut self, text: &str) -> Result<Guarded<()>, ScriptError> {
        let input = self
            .input
            .as_ref()
            .ok_or_else(|| ScriptError::new(ErrorKind::Io, "stdin is closed"))?;
        let mut line = String::with_capacity(text.len() + 1);
        line.push_str(text);
        line.push('\n');
        input
            .send(line)
            .map_err(|_| {
                ScriptError::new(ErrorKind::Io, "error passing command: stdin is closed")
            })?;

        match self.watchdog.guard(&self.written) {
            Guarded::Stderr(line) => Ok(Guarded::Stderr(line)),
            Guarded::Ready(Ok(Ok(()))) => Ok(Guarded::Ready(())),
            Guarded::Ready(Ok(Err(e))) => Err(ScriptError::new(
                ErrorKind::Io,
                format!("error passing command: {}", e),
            )),
            Guarded::Ready(Err(_)) => Err(ScriptError::new(
                ErrorKind::Io,
                "error passing command: stdin is closed",
            )),
        }
    }

    fn receive(&mut self) -> Result<Guarded<Option<String>>, ScriptError> {
        match self.watchdog.guard(&self.output) {
            Guarded::Stderr(line) => Ok(Guarded::Stderr(line)),
            Guarded::Ready(Ok(Ok(line))) => Ok(Guarded::Ready(Some(line))),
            Guarded::Ready(Ok(Err(e))) => Err(ScriptError::new(
                ErrorKind::Io,
                format!("error reading response: {}", e),
            )),
            // stdout closed
            Guarded::Ready(Err(_)) => Ok(Guarded::Ready(None)),
        }
    }

    fn interrupted(&mut self) -> Option<String> {
        self.watchdog.check()
    }

    fn close_input(&mut self) {
        // Dropping the sender ends the writer thread, which closes the pipe.
        self.input = None;
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.close_input();
        // Reap the target if it is already gone; a live target is left running.
        match self.child.try_wait() {
            Ok(Some(status)) => debug!("target exited: {}", status),
            Ok(None) => debug!("target still running (pid {})", self.child.id()),
            Err(e) => debug!("failed to query target status: {}", e),
        }
    }
}

fn spawn_writer(mut stdin: ChildStdin) -> io::Result<(Sender<String>, Receiver<io::Result<()>>)> {
    let (input_tx, input_rx) = bounded::<String>(1);
    let (ack_tx, ack_rx) = bounded(1);
    thread::Builder::new()
        .name("target-stdin".into())
        .spawn(move || {
            for line in input_rx {
                let result = stdin.write_all(line.as_bytes()).and_then(|()| stdin.flush());
                let failed = result.is_err();
                if ack_tx.send(result).is_err() || failed {
                    break;
                }
            }
        })?;
    Ok((input_tx, ack_rx))
}

fn spawn_reader(stdout: ChildStdout) -> io::Result<Receiver<io::Result<String>>> {
    // Rendezvous: the reader holds at most one line ahead of the interpreter.
    let (tx, rx) = bounded(0);
    thread::Builder::new()
        .name("target-stdout".into())
        .spawn(move || {
            for line in LineReader::new(stdout) {
                let failed = line.is_err();
                if tx.send(line).is_err() || failed {
                    break;
                }
            }
        })?;
    Ok(rx)
}

/// Line iterator over a byte stream.
///
/// Strips `\n` and one preceding `\r`; invalid UTF-8 is replaced rather than
/// rejected. A final line without a terminator is still yielded.
pub(crate) struct LineReader<R> {
    inner: BufReader<R>,
    buf: Vec<u8>,
}

impl<R: Read> LineReader<R> {
    pub(crate) fn new(inner: R) -> Self {
        Self {
            inner: BufReader::new(inner),
            buf: Vec::new(),
        }
    }
}

impl<R: Read> Iterator for LineReader<R> {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        self.buf.clear();
        match self.inner.read_until(b'\n', &mut self.buf) {
            Ok(0) => None,
            Ok(_) => {
                if self.buf.last() == Some(&b'\n') {
                    self.buf.pop();
                }
                if self.buf.last() == Some(&b'\r') {
                    self.buf.pop();
                }
                Some(Ok(String::from_utf8_lossy(&self.buf).into_owned()))
            }
            Err(e) => Some(Err(e)),
        }
    }
}
