use braid::interpreter::DEFAULT_MAX_DEPTH;
use braid::{Error, Options, augmenter, lexer, stdlib};

use anyhow::Context as _;
use ariadne::Source;
use clap::{ArgAction, Parser, ValueEnum};
use tracing::debug;
use tracing_subscriber::{EnvFilter, Registry, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use yansi::Paint;

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(version, about = "Runs a braid program")]
struct Args {
    /// Source file to run.
    path: PathBuf,

    /// Skip the type checker.
    #[arg(long)]
    no_check: bool,

    /// How deeply evaluation may nest before it is aborted.
    #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
    max_depth: usize,

    /// Print an intermediate stage instead of running the program.
    #[arg(long, value_enum)]
    dump: Option<Dump>,

    /// Log more. Repeat for even more; `RUST_LOG` takes precedence.
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Dump {
    Augmented,
    Tokens,
    Ast,
}

fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();
    init_logging(args.verbose);

    let file = args.path.display().to_string();
    let source =
        fs::read_to_string(&args.path).with_context(|| format!("failed to read `{file}`"))?;

    let result = match args.dump {
        Some(dump) => dump_stage(dump, &source),
        None => {
            let options = Options {
                check_types: !args.no_check,
                max_depth: args.max_depth,
            };
            braid::run(&source, &options, stdlib::io::stdout()).map(|value| {
                debug!(%value, "main returned");
            })
        }
    };

    match result {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(err) => {
            print_error(&err, &source, &file)?;
            Ok(ExitCode::FAILURE)
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    Registry::default()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn dump_stage(dump: Dump, source: &str) -> Result<(), Error> {
    let augmented = augmenter::augment(source)?;
    match dump {
        Dump::Augmented => println!("{augmented}"),
        Dump::Tokens => {
            for (token, span) in lexer::lex(&augmented)? {
                println!("{span:?}\t{token:?}");
            }
        }
        Dump::Ast => println!("{:#?}", braid::compile(source)?),
    }
    Ok(())
}

fn print_error(err: &Error, source: &str, file: &str) -> anyhow::Result<()> {
    if let Some(report) = err.report(file) {
        // Spans point into the augmented text, which keeps the original lines.
        let augmented = augmenter::augment(source)?;
        report
            .eprint((file.to_string(), Source::from(augmented)))
            .context("failed to print the error report")?;
    } else {
        eprintln!("{} {err}", "error:".red().bold());
    }
    Ok(())
}
