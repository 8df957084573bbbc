//! Line matching
//!
//! Literal expectations compare the whole line byte for byte. Regex
//! expectations use unanchored search: the pattern may match anywhere in the
//! line, so `foo` matches `xxfooyy`. Anchor with `^...$` for a full-line match.

use crate::error::ScriptError;
use crate::parser::Expectation;

/// Compare one output line against one expectation.
///
/// Fails only when a regex pattern does not compile; a non-matching line is
/// `Ok(false)`.
pub fn matches(expected: &Expectation, actual: &str) -> Result<bool, ScriptError> {
    match expected {
        Expectation::Literal(text) => Ok(actual == text),
        Expectation::Regex(pattern) => Ok(compile_regex(pattern)?.is_match(actual)),
    }
}

/// Compile a pattern with a size limit to mitigate ReDoS (CWE-1333).
fn compile_regex(pattern: &str) -> Result<regex::Regex, ScriptError> {
    regex::RegexBuilder::new(pattern)
        .size_limit(1 << 20) // 1 MB DFA limit
        .build()
        .map_err(|e| ScriptError::invalid_pattern(pattern, e))
}
