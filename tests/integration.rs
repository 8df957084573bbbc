//! Integration tests: replay scripts against real processes
//!
//! Targets are `cat` and small `sh -c` programs, so these run on Unix only.
//!
//! Usage:
//!   cargo test --package emx-stdiospec --test integration

#![cfg(unix)]

use std::io::Write;
use std::path::PathBuf;

use emx_stdiospec::{run, ErrorKind, Expectation, Failure, PrefixConfig, Verdict};
use tempfile::NamedTempFile;

fn testdata(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/testdata").join(name)
}

fn script(text: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(text.as_bytes()).unwrap();
    file
}

#[test]
fn testdata_echo() {
    emx_stdiospec::run_and_assert(testdata("echo.script"), "cat", &[]);
}

#[test]
fn testdata_args() {
    emx_stdiospec::run_and_assert(testdata("args.script"), "sh", &["-c", "echo \"$@\"", "sh"]);
}

#[test]
fn greet_passes() {
    let file = script(">greet\nhi\n");
    let target = "read cmd; [ \"$cmd\" = greet ] && echo hi";
    let verdict = run(file.path()).command("sh").args(["-c", target]).run().unwrap();
    assert_eq!(verdict, Verdict::Pass);
}

#[test]
fn greet_with_wrong_reply_fails() {
    let file = script(">greet\nhi\n");
    let target = "read cmd; echo hello";
    let verdict = run(file.path()).command("sh").args(["-c", target]).run().unwrap();
    assert_eq!(
        verdict,
        Verdict::Fail(Failure::Mismatch {
            line: 2,
            expected: Expectation::Literal("hi".into()),
            actual: "hello".into(),
        })
    );
}

#[test]
fn mismatch_line_counts_comments() {
    let file = script("# first\n>one\none\n# second\n>two\nTWO\n");
    let verdict = run(file.path()).command("cat").run().unwrap();
    match verdict {
        Verdict::Fail(Failure::Mismatch { line, actual, .. }) => {
            assert_eq!(line, 6);
            assert_eq!(actual, "two");
        }
        other => panic!("unexpected verdict: {:?}", other),
    }
}

#[test]
fn regex_is_substring_search() {
    let file = script("$foo.*bar\n$foo.*bar\n");
    let target = "echo xxfooyybar; echo foobaz";
    let verdict = run(file.path()).command("sh").args(["-c", target]).run().unwrap();
    assert!(matches!(
        verdict,
        Verdict::Fail(Failure::Mismatch { line: 2, .. })
    ));
}

#[test]
fn stderr_output_fails_the_run() {
    let file = script("never printed\n");
    let target = "echo 'fatal: broken' >&2; sleep 2";
    let verdict = run(file.path()).command("sh").args(["-c", target]).run().unwrap();
    assert_eq!(
        verdict,
        Verdict::Fail(Failure::Stderr {
            line: Some(1),
            output: "fatal: broken".into(),
        })
    );
}

#[test]
fn stderr_wins_over_matching_stdout() {
    // The stderr line is written and flushed before stdout is.
    let file = script("ok\nok\n");
    let target = "echo warn >&2; sleep 1; echo ok; echo ok; sleep 1";
    let verdict = run(file.path()).command("sh").args(["-c", target]).run().unwrap();
    assert!(matches!(verdict, Verdict::Fail(Failure::Stderr { .. })));
}

#[test]
fn stderr_before_exit_beats_closed_stdout() {
    let file = script("hi\n");
    let target = "echo fatal >&2; exit 1";
    for _ in 0..20 {
        let verdict = run(file.path()).command("sh").args(["-c", target]).run().unwrap();
        assert_eq!(
            verdict,
            Verdict::Fail(Failure::Stderr {
                line: Some(1),
                output: "fatal".into(),
            })
        );
    }
}

#[test]
fn no_response_when_stdout_closes() {
    let file = script("one\ntwo\n");
    let err = run(file.path()).command("sh").args(["-c", "echo one"]).run().unwrap_err();
    assert_eq!(err.kind, ErrorKind::NoResponse);
    assert_eq!(err.line, Some(2));
}

#[test]
fn invalid_regex_is_an_error() {
    let file = script(">x\n$x(\n");
    let err = run(file.path()).command("cat").run().unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidPattern);
    assert_eq!(err.line, Some(2));
}

#[test]
fn empty_script_is_rejected_before_spawn() {
    let file = script("");
    let err = run(file.path())
        .command("emx-stdiospec-no-such-program")
        .run()
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::EmptyScript);
}

#[test]
fn missing_program_is_a_spawn_error() {
    let file = script("hello\n");
    let err = run(file.path())
        .command("emx-stdiospec-no-such-program")
        .run()
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Spawn);
}

#[test]
fn args_line_extends_invocation() {
    let file = script("$$ --verbose\n--verbose\n");
    let verdict = run(file.path())
        .command("sh")
        .args(["-c", "echo \"$1\"", "sh"])
        .run()
        .unwrap();
    assert_eq!(verdict, Verdict::Pass);
}

#[test]
fn custom_prefixes() {
    let file = script("// talk to cat\n<< ping\n~^p.ng$\n");
    let prefixes = PrefixConfig {
        command: "<<".into(),
        regex: "~".into(),
        comment: "//".into(),
        args: "@@".into(),
    };
    let verdict = run(file.path()).command("cat").prefixes(prefixes).run().unwrap();
    assert_eq!(verdict, Verdict::Pass);
}
