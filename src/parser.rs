//! Script line classifier
//!
//! Every script line maps to exactly one [`Directive`], decided by its prefix:
//! - comment prefix (`#`): ignored
//! - command prefix (`>`): sent to the target's stdin
//! - args prefix (`$$`): extra invocation arguments, first line only
//! - regex prefix (`$`): the next stdout line must match
//! - anything else: the next stdout line must equal the whole line
//!
//! Prefixes are tested in that order, so the args prefix wins over the regex
//! prefix on line 1 even though `$$` starts with `$`.

/// Configurable line prefixes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixConfig {
    pub command: String,
    pub regex: String,
    pub comment: String,
    pub args: String,
}

impl Default for PrefixConfig {
    fn default() -> Self {
        Self {
            command: ">".into(),
            regex: "$".into(),
            comment: "#".into(),
            args: "$$".into(),
        }
    }
}

/// What the next line of target output must look like
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expectation {
    /// Exact string equality, no trimming
    Literal(String),
    /// Unanchored regex search; compiled at match time
    Regex(String),
}

impl Expectation {
    /// The text shown to the user: literal text or raw pattern
    pub fn as_str(&self) -> &str {
        match self {
            Expectation::Literal(s) | Expectation::Regex(s) => s,
        }
    }
}

/// A classified script line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    Comment,
    /// Text to write to stdin (a newline is appended on send)
    Command(String),
    /// Extra arguments for the target, only recognized on line 1
    Args(Vec<String>),
    Expect(Expectation),
}

/// A numbered script line.
///
/// Numbering starts at 1 after the optional args line has been removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptLine {
    pub number: usize,
    pub text: String,
}

/// Classify one raw script line.
pub fn classify(line: &str, is_first_line: bool, config: &PrefixConfig) -> Directive {
    if line.starts_with(config.comment.as_str()) {
        return Directive::Comment;
    }
    if let Some(rest) = line.strip_prefix(config.command.as_str()) {
        return Directive::Command(rest.trim().to_string());
    }
    if is_first_line {
        if let Some(rest) = line.strip_prefix(config.args.as_str()) {
            return Directive::Args(split_args(rest));
        }
    }
    if let Some(rest) = line.strip_prefix(config.regex.as_str()) {
        return Directive::Expect(Expectation::Regex(rest.to_string()));
    }
    Directive::Expect(Expectation::Literal(line.to_string()))
}

/// Split an args directive into tokens. Runs of whitespace never produce
/// empty tokens.
pub fn split_args(s: &str) -> Vec<String> {
    s.split_whitespace().map(str::to_string).collect()
}

/// Split script text into lines the way a line scanner does: `\n`
/// terminated, with at most one trailing `\r` dropped per line.
pub fn script_lines(script: &str) -> impl Iterator<Item = &str> {
    script
        .split_terminator('\n')
        .map(|l| l.strip_suffix('\r').unwrap_or(l))
}
