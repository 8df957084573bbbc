//! emx-stdiospec CLI
//!
//! Replay a conversation script against a line-oriented program.

use anyhow::Context;
use clap::Parser;
use emx_stdiospec::{render, Invocation, PrefixConfig, RunConfig, TestRunner, Verdict};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "emx-stdiospec")]
#[command(author = "nzinfo <li.monan@gmail.com>")]
#[command(version)]
#[command(about = "Replay a conversation script against a line-oriented program")]
struct Cli {
    /// Script file to replay
    #[arg(long = "testFile")]
    test_file: PathBuf,

    /// Log level (debug, info)
    #[arg(long = "logLevel", default_value = "info")]
    log_level: String,

    /// Line prefix for commands passed to the program
    #[arg(long = "cmdPrefix", default_value = ">")]
    cmd_prefix: String,

    /// Line prefix for lines interpreted as a regex
    #[arg(long = "regexPrefix", default_value = "$")]
    regex_prefix: String,

    /// Line prefix for comments
    #[arg(long = "commentPrefix", default_value = "#")]
    comment_prefix: String,

    /// First-line prefix for extra program arguments
    #[arg(long = "argsPrefix", default_value = "$$")]
    args_prefix: String,

    /// Program to test, followed by its arguments
    #[arg(
        required = true,
        trailing_var_arg = true,
        allow_hyphen_values = true,
        value_name = "COMMAND"
    )]
    command: Vec<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    match run(cli) {
        Ok(Verdict::Pass) => {
            println!("{}", render(&Verdict::Pass));
            ExitCode::SUCCESS
        }
        Ok(verdict) => {
            eprintln!("{}", render(&verdict));
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<Verdict> {
    let (program, args) = cli
        .command
        .split_first()
        .context("missing program to test")?;

    let config = RunConfig {
        test_file: cli.test_file,
        prefixes: PrefixConfig {
            command: cli.cmd_prefix,
            regex: cli.regex_prefix,
            comment: cli.comment_prefix,
            args: cli.args_prefix,
        },
        invocation: Invocation::new(program.as_str()).args(args.iter().cloned()),
    };

    let verdict = TestRunner::new(config)
        .run()
        .with_context(|| format!("testing with {}", program))?;
    Ok(verdict)
}

/// Anything other than `debug` means `info`. `RUST_LOG` wins when set.
fn init_logging(level: &str) {
    let level = if level == "debug" { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
}
