//! Verdicts and their rendering

use crate::parser::Expectation;
use similar::{ChangeTag, TextDiff};

const PASS_MARK: &str = "\u{2714}";
const FAIL_MARK: &str = "\u{2755}";

/// Outcome of one script run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Pass,
    Fail(Failure),
}

impl Verdict {
    pub fn passed(&self) -> bool {
        matches!(self, Verdict::Pass)
    }
}

/// Why a run failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    /// An expectation was not met by the next output line
    Mismatch {
        line: usize,
        expected: Expectation,
        actual: String,
    },
    /// The target wrote to stderr. `line` is the script line in flight, or
    /// `None` when the output was noticed after the last line.
    Stderr {
        line: Option<usize>,
        output: String,
    },
}

/// Render a verdict as a single user-facing line.
pub fn render(verdict: &Verdict) -> String {
    match verdict {
        Verdict::Pass => format!("{} All tests passed", PASS_MARK),
        Verdict::Fail(Failure::Mismatch { line, expected, actual }) => format!(
            "{} Error on line {} expected: {} got: {}",
            FAIL_MARK,
            line,
            expected.as_str(),
            actual
        ),
        Verdict::Fail(Failure::Stderr { line: Some(line), output }) => {
            format!("{} Error output on line {}: {}", FAIL_MARK, line, output)
        }
        Verdict::Fail(Failure::Stderr { line: None, output }) => {
            format!("{} Error output: {}", FAIL_MARK, output)
        }
    }
}

/// Inline character diff for a literal mismatch: `[-removed-]{+added+}`.
///
/// Regex mismatches and stderr failures have nothing to diff.
pub fn diff(failure: &Failure) -> Option<String> {
    let (expected, actual) = match failure {
        Failure::Mismatch {
            expected: Expectation::Literal(expected),
            actual,
            ..
        } => (expected.as_str(), actual.as_str()),
        _ => return None,
    };

    let diff = TextDiff::from_chars(expected, actual);
    let mut out = String::new();
    let mut current: Option<ChangeTag> = None;
    for change in diff.iter_all_changes() {
        let tag = change.tag();
        if current != Some(tag) {
            close_run(&mut out, current);
            match tag {
                ChangeTag::Delete => out.push_str("[-"),
                ChangeTag::Insert => out.push_str("{+"),
                ChangeTag::Equal => {}
            }
            current = Some(tag);
        }
        out.push_str(change.value());
    }
    close_run(&mut out, current);
    Some(out)
}

fn close_run(out: &mut String, tag: Option<ChangeTag>) {
    match tag {
        Some(ChangeTag::Delete) => out.push_str("-]"),
        Some(ChangeTag::Insert) => out.push_str("+}"),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mismatch(expected: Expectation, actual: &str) -> Failure {
        Failure::Mismatch {
            line: 3,
            expected,
            actual: actual.into(),
        }
    }

    #[test]
    fn test_render_pass() {
        assert_eq!(render(&Verdict::Pass), "\u{2714} All tests passed");
    }

    #[test]
    fn test_render_literal_mismatch() {
        let v = Verdict::Fail(mismatch(Expectation::Literal("hi".into()), "ho"));
        assert_eq!(render(&v), "\u{2755} Error on line 3 expected: hi got: ho");
    }

    #[test]
    fn test_render_regex_mismatch_shows_raw_pattern() {
        let v = Verdict::Fail(mismatch(Expectation::Regex("foo.*bar".into()), "foobaz"));
        assert_eq!(render(&v), "\u{2755} Error on line 3 expected: foo.*bar got: foobaz");
    }

    #[test]
    fn test_render_stderr() {
        let v = Verdict::Fail(Failure::Stderr {
            line: Some(2),
            output: "panic: boom".into(),
        });
        assert_eq!(render(&v), "\u{2755} Error output on line 2: panic: boom");

        let v = Verdict::Fail(Failure::Stderr {
            line: None,
            output: "late".into(),
        });
        assert_eq!(render(&v), "\u{2755} Error output: late");
        assert!(!v.passed());
    }

    #[test]
    fn test_diff_literal() {
        let f = mismatch(Expectation::Literal("abc".into()), "abd");
        assert_eq!(diff(&f).as_deref(), Some("ab[-c-]{+d+}"));
    }

    #[test]
    fn test_diff_trailing_space() {
        let f = mismatch(Expectation::Literal("ok".into()), "ok ");
        assert_eq!(diff(&f).as_deref(), Some("ok{+ +}"));
    }

    #[test]
    fn test_no_diff_for_regex() {
        let f = mismatch(Expectation::Regex("a+".into()), "b");
        assert!(diff(&f).is_none());
    }
}
