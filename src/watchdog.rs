//! Stderr watchdog
//!
//! Any line the target writes to stderr fails the run. A background thread
//! drains the stream and forwards the first line; the interpreter selects on
//! that channel alongside every blocking read or write, so a stderr line
//! pre-empts whatever the script was waiting for.

use std::io::{self, Read};
use std::thread;

use crossbeam_channel::{bounded, never, select, Receiver, RecvError, TryRecvError};
use tracing::debug;

use crate::engine::Guarded;
use crate::session::LineReader;

/// Handle on the stderr-draining thread
pub struct Watchdog {
    rx: Receiver<String>,
    quiet: bool,
}

impl Watchdog {
    /// Start draining `stream` on a background thread.
    pub fn spawn<R: Read + Send + 'static>(stream: R) -> io::Result<Self> {
        let (tx, rx) = bounded(1);
        thread::Builder::new()
            .name("stderr-watchdog".into())
            .spawn(move || {
                let mut lines = LineReader::new(stream);
                match lines.next() {
                    Some(Ok(line)) => {
                        let _ = tx.send(line);
                    }
                    Some(Err(e)) => {
                        debug!("stderr read failed: {}", e);
                        return;
                    }
                    None => return,
                }
                // Keep the pipe drained so the target never blocks or gets
                // EPIPE on stderr after the run has already failed.
                for line in lines {
                    match line {
                        Ok(line) => debug!("stderr: {}", line),
                        Err(_) => break,
                    }
                }
            })?;
        Ok(Self { rx, quiet: false })
    }

    /// Non-blocking check for a pending stderr line.
    pub fn check(&mut self) -> Option<String> {
        match self.rx.try_recv() {
            Ok(line) => Some(line),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.silence();
                None
            }
        }
    }

    /// Block on `rx` until it yields, unless stderr output shows up first.
    ///
    /// A stderr line that is already pending, or that arrives together with
    /// the awaited value, wins. When `rx` disconnects the target is going
    /// away, so stderr is read to EOF before the closed channel is reported.
    pub fn guard<T>(&mut self, rx: &Receiver<T>) -> Guarded<Result<T, RecvError>> {
        if let Some(line) = self.check() {
            return Guarded::Stderr(line);
        }
        loop {
            let stderr = self.rx.clone();
            select! {
                recv(stderr) -> msg => match msg {
                    Ok(line) => return Guarded::Stderr(line),
                    Err(_) => self.silence(),
                },
                recv(rx) -> msg => {
                    if let Some(line) = self.check() {
                        return Guarded::Stderr(line);
                    }
                    if msg.is_err() {
                        if let Some(line) = self.wait_closed() {
                            return Guarded::Stderr(line);
                        }
                    }
                    return Guarded::Ready(msg);
                }
            }
        }
    }

    /// Block until stderr yields its first line or closes.
    fn wait_closed(&mut self) -> Option<String> {
        if self.quiet {
            return None;
        }
        match self.rx.recv() {
            Ok(line) => Some(line),
            Err(_) => {
                self.silence();
                None
            }
        }
    }

    /// Stderr closed without output: never fire again.
    fn silence(&mut self) {
        self.rx = never();
        self.quiet = true;
    }
}
