//! Test runner
//!
//! Reads a script file, replays it against the configured target and turns
//! the outcome into a [`Verdict`] or a [`ScriptError`].

use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::engine::Engine;
use crate::error::{ErrorKind, ScriptError};
use crate::parser::PrefixConfig;
use crate::report::{self, Verdict};
use crate::session::Invocation;

/// Configuration for one run
#[derive(Debug, Clone, Default)]
pub struct RunConfig {
    /// Script file to replay
    pub test_file: PathBuf,
    /// Line prefixes
    pub prefixes: PrefixConfig,
    /// Target command and its base arguments
    pub invocation: Invocation,
}

/// The test runner
pub struct TestRunner {
    engine: Engine,
    config: RunConfig,
}

impl TestRunner {
    /// Create a new runner with the given config
    pub fn new(config: RunConfig) -> Self {
        Self {
            engine: Engine::new(config.prefixes.clone()),
            config,
        }
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Read the script and replay it.
    ///
    /// Errors carry the script path so they can be printed as-is.
    pub fn run(&self) -> Result<Verdict, ScriptError> {
        let path = &self.config.test_file;
        info!("Testing file: {}", display_name(path));

        let file = path.display().to_string();
        let script = read_script(path).map_err(|e| e.with_file(&file))?;
        let verdict = self
            .engine
            .execute(&script, &self.config.invocation)
            .map_err(|e| e.with_file(&file))?;

        if let Verdict::Fail(ref failure) = verdict {
            if let Some(diff) = report::diff(failure) {
                debug!("diff: {}", diff);
            }
        }
        Ok(verdict)
    }
}

/// Read a script, tolerating invalid UTF-8.
fn read_script(path: &Path) -> Result<String, ScriptError> {
    let data = std::fs::read(path).map_err(|e| {
        ScriptError::new(ErrorKind::FileNotFound, format!("error reading file: {}", e))
    })?;
    Ok(String::from_utf8_lossy(&data).into_owned())
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Builder API for convenient test runner construction
pub struct TestRunnerBuilder {
    config: RunConfig,
}

impl TestRunnerBuilder {
    /// Start building a runner for the given script file
    pub fn new(test_file: impl Into<PathBuf>) -> Self {
        Self {
            config: RunConfig {
                test_file: test_file.into(),
                ..Default::default()
            },
        }
    }

    /// Set the target program
    pub fn command(mut self, program: impl Into<String>) -> Self {
        self.config.invocation.program = program.into();
        self
    }

    /// Append one base argument for the target
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.config.invocation.args.push(arg.into());
        self
    }

    /// Append base arguments for the target
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.invocation.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Replace the line prefixes
    pub fn prefixes(mut self, prefixes: PrefixConfig) -> Self {
        self.config.prefixes = prefixes;
        self
    }

    /// Build and return the runner
    pub fn build(self) -> TestRunner {
        TestRunner::new(self.config)
    }

    /// Build and run
    pub fn run(self) -> Result<Verdict, ScriptError> {
        self.build().run()
    }
}

/// Convenience function: create a runner builder for a script file
pub fn run(test_file: impl Into<PathBuf>) -> TestRunnerBuilder {
    TestRunnerBuilder::new(test_file)
}

/// Replay a script and integrate with `#[test]` by panicking on failure.
///
/// Usage in cargo tests:
/// ```rust,ignore
/// #[test]
/// fn greeting() {
///     emx_stdiospec::run_and_assert("tests/testdata/greet.script", "my-repl", &["--plain"]);
/// }
/// ```
pub fn run_and_assert(test_file: impl Into<PathBuf>, program: &str, args: &[&str]) {
    let runner = run(test_file).command(program).args(args.iter().copied()).build();
    let name = runner.config().test_file.display().to_string();

    match runner.run() {
        Ok(Verdict::Pass) => eprintln!("PASS  {}", name),
        Ok(verdict) => panic!("FAIL  {}\n  {}", name, report::render(&verdict)),
        Err(e) => panic!("FAIL  {}\n  {}", name, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file() {
        let err = run("does/not/exist.script").command("cat").run().unwrap_err();
        assert_eq!(err.kind, ErrorKind::FileNotFound);
        assert!(err.to_string().starts_with("does/not/exist.script: error reading file:"));
    }

    #[test]
    fn test_builder_collects_invocation() {
        let runner = run("a.script")
            .command("target")
            .arg("-q")
            .args(["--mode", "plain"])
            .build();
        let inv = &runner.config().invocation;
        assert_eq!(inv.program, "target");
        assert_eq!(inv.args, vec!["-q", "--mode", "plain"]);
        assert_eq!(runner.config().prefixes, PrefixConfig::default());
    }

    #[test]
    fn test_display_name_is_basename() {
        assert_eq!(display_name(Path::new("tests/testdata/echo.script")), "echo.script");
    }
}
