//! emx-stdiospec: a conformance checker for line-oriented CLI programs
//!
//! # Overview
//!
//! A test script describes a conversation with a target process. Command
//! lines are written to the target's stdin; every other line is an
//! expectation about the next line the target writes to stdout. The run stops
//! at the first mismatch, and any output on the target's stderr fails it.
//!
//! # Script Syntax
//!
//! ```text
//! $$ --no-color
//! # a comment
//! >greet
//! hello there
//! >add 1 2
//! $^sum: \d+$
//! ```
//!
//! | Prefix | Meaning |
//! |--------|---------|
//! | `$$` | First line only: extra arguments for the target |
//! | `#` | Comment, ignored (still counts as a line) |
//! | `>` | Send the rest of the line, trimmed, to stdin |
//! | `$` | The next stdout line must contain a match for this regex |
//! | *(none)* | The next stdout line must equal this line exactly |
//!
//! All prefixes are configurable through [`PrefixConfig`].

mod engine;
mod error;
mod matcher;
mod parser;
mod report;
mod runner;
mod session;
mod watchdog;

pub use engine::{Engine, Guarded, Script, Target};
pub use error::{ErrorKind, ScriptError};
pub use matcher::matches;
pub use parser::{classify, split_args, Directive, Expectation, PrefixConfig, ScriptLine};
pub use report::{diff, render, Failure, Verdict};
pub use runner::{RunConfig, TestRunner, TestRunnerBuilder};
pub use session::{Invocation, Session};
pub use watchdog::Watchdog;

// Convenience functions for cargo test integration
pub use runner::{run, run_and_assert};
