//! Script engine
//!
//! The Engine holds the prefix configuration. It is stateless config: one
//! engine can run many scripts, one at a time.

use tracing::debug;

use crate::error::{ErrorKind, ScriptError};
use crate::matcher;
use crate::parser::{classify, script_lines, Directive, PrefixConfig, ScriptLine};
use crate::report::{Failure, Verdict};
use crate::session::{Invocation, Session};

/// Result of a blocking operation that the stderr watchdog may cut short
#[derive(Debug, PartialEq, Eq)]
pub enum Guarded<T> {
    /// The operation completed
    Ready(T),
    /// The target wrote this line to stderr first
    Stderr(String),
}

/// The conversation partner a script is replayed against.
///
/// [`Session`] is the real implementation; anything that can take a line
/// of input and hand back lines of output will do.
pub trait Target {
    /// Write `text` plus a newline to the target's input.
    fn send(&mut self, text: &str) -> Result<Guarded<()>, ScriptError>;

    /// Wait for the next output line; `None` once output has closed.
    fn receive(&mut self) -> Result<Guarded<Option<String>>, ScriptError>;

    /// Non-blocking check for pending stderr output.
    fn interrupted(&mut self) -> Option<String>;

    /// Close the target's input stream.
    fn close_input(&mut self);
}

/// A classified script, ready to replay
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Script {
    /// Arguments from a leading args line, appended to the invocation
    pub extra_args: Vec<String>,
    /// Numbered lines with their directives, args line excluded
    pub lines: Vec<(ScriptLine, Directive)>,
}

/// The script engine
#[derive(Debug, Clone, Default)]
pub struct Engine {
    pub prefixes: PrefixConfig,
}

impl Engine {
    /// Create an engine with the given prefixes
    pub fn new(prefixes: PrefixConfig) -> Self {
        Self { prefixes }
    }

    /// Classify every line of a script.
    ///
    /// Only the first line may be an args line. When it is, it is dropped and
    /// numbering starts with the line after it.
    pub fn parse(&self, text: &str) -> Result<Script, ScriptError> {
        let mut raw = script_lines(text);
        let first = raw
            .next()
            .ok_or_else(|| ScriptError::new(ErrorKind::EmptyScript, "empty script"))?;

        let mut extra_args = Vec::new();
        let mut pending = Vec::new();
        match classify(first, true, &self.prefixes) {
            Directive::Args(args) => extra_args = args,
            directive => pending.push((first, directive)),
        }
        for line in raw {
            pending.push((line, classify(line, false, &self.prefixes)));
        }

        let lines = pending
            .into_iter()
            .enumerate()
            .map(|(i, (text, directive))| {
                let line = ScriptLine {
                    number: i + 1,
                    text: text.to_string(),
                };
                (line, directive)
            })
            .collect();

        Ok(Script { extra_args, lines })
    }

    /// Parse `text`, start the target and replay the script against it.
    ///
    /// Script arguments go after the invocation's own arguments.
    pub fn execute(&self, text: &str, invocation: &Invocation) -> Result<Verdict, ScriptError> {
        let script = self.parse(text)?;
        let invocation = invocation.clone().args(script.extra_args.iter().cloned());
        debug!("Executing: {}", invocation);

        let mut session = Session::start(&invocation)?;
        self.replay(&script, &mut session)
    }

    /// Replay a parsed script line by line. Stops at the first failure.
    pub fn replay<T: Target + ?Sized>(
        &self,
        script: &Script,
        target: &mut T,
    ) -> Result<Verdict, ScriptError> {
        for (line, directive) in &script.lines {
            let number = line.number;
            if let Some(output) = target.interrupted() {
                return Ok(stderr_failure(Some(number), output));
            }

            debug!("Reading line: {}", line.text);

            match directive {
                Directive::Comment | Directive::Args(_) => {}
                Directive::Command(text) => {
                    debug!("Passing command: {}", text);
                    if let Guarded::Stderr(output) =
                        target.send(text).map_err(|e| e.with_line(number))?
                    {
                        return Ok(stderr_failure(Some(number), output));
                    }
                }
                Directive::Expect(expected) => {
                    debug!("Trying to read response from stdout...");
                    let actual = match target.receive().map_err(|e| e.with_line(number))? {
                        Guarded::Stderr(output) => {
                            return Ok(stderr_failure(Some(number), output))
                        }
                        Guarded::Ready(None) => return Err(ScriptError::no_response(number)),
                        Guarded::Ready(Some(actual)) => actual,
                    };
                    debug!("Reading response: {}", actual);

                    if !matcher::matches(expected, &actual).map_err(|e| e.with_line(number))? {
                        return Ok(Verdict::Fail(Failure::Mismatch {
                            line: number,
                            expected: expected.clone(),
                            actual,
                        }));
                    }
                }
            }
        }

        target.close_input();
        if let Some(output) = target.interrupted() {
            return Ok(stderr_failure(None, output));
        }
        Ok(Verdict::Pass)
    }
}

fn stderr_failure(line: Option<usize>, output: String) -> Verdict {
    Verdict::Fail(Failure::Stderr { line, output })
}
