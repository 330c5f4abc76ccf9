use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use clap::Parser;
use clap::Subcommand;
use miette::IntoDiagnostic;
use miette::NamedSource;
use miette::Report;
use miette::WrapErr;
use nishimia::{Interpreter, Lexer, SyntaxError, parse};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(version, about = "The nishimia scripting language")]
struct Args {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print the tokens of a file, one per line
    Tokenize { filename: PathBuf },
    /// Print a file's syntax tree in canonical form
    Parse { filename: PathBuf },
    /// Evaluate a file and print its result
    Run { filename: PathBuf },
    /// Start the interactive prompt (the default)
    Repl {
        #[arg(long, default_value = ">>> ")]
        prompt: String,
    },
}

fn main() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("NISHIMIA_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    match args.command.unwrap_or(Commands::Repl {
        prompt: ">>> ".to_string(),
    }) {
        Commands::Tokenize { filename } => {
            let source = read_source(&filename)?;
            for token in Lexer::new(&source) {
                match token {
                    Ok(token) => println!("{token}"),
                    Err(e) => {
                        eprintln!("{:?}", with_source(e.into(), &filename, &source));
                        std::process::exit(65);
                    }
                }
            }
            println!("EOF");
        }
        Commands::Parse { filename } => {
            let source = read_source(&filename)?;
            let program = parse_or_exit(&filename, &source);
            println!("{program}");
        }
        Commands::Run { filename } => {
            let source = read_source(&filename)?;
            let program = parse_or_exit(&filename, &source);
            match Interpreter::new().eval(&program) {
                Ok(value) if value.is_null() => {}
                Ok(value) => println!("{value}"),
                Err(e) => {
                    let report = Report::new(e)
                        .with_source_code(NamedSource::new(filename.display().to_string(), source));
                    eprintln!("{report:?}");
                    std::process::exit(70);
                }
            }
        }
        Commands::Repl { prompt } => {
            println!("nishimia {}, type `exit` to leave", env!("CARGO_PKG_VERSION"));
            nishimia::repl::start(io::stdin().lock(), io::stdout(), &prompt)
                .into_diagnostic()
                .wrap_err("interactive session failed")?;
        }
    }

    Ok(())
}

fn read_source(filename: &Path) -> miette::Result<String> {
    fs::read_to_string(filename)
        .into_diagnostic()
        .wrap_err_with(|| format!("reading `{}` failed", filename.display()))
}

fn with_source(error: SyntaxError, filename: &Path, source: &str) -> Report {
    Report::new(error).with_source_code(NamedSource::new(
        filename.display().to_string(),
        source.to_string(),
    ))
}

/// Prints every syntax error and exits when the file does not parse cleanly.
fn parse_or_exit(filename: &Path, source: &str) -> nishimia::ast::Program {
    let (program, errors) = parse(source);
    if errors.is_empty() {
        return program;
    }
    for error in errors {
        eprintln!("{:?}", with_source(error, filename, source));
    }
    std::process::exit(65);
}
