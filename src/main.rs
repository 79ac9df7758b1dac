use std::fs::{self, File};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};

use jasper::error::JasperError;
use jasper::scanner::Scanner;
use jasper::session::Session;

/// Exit code for command-line misuse.
const EXIT_USAGE: i32 = 64;
/// Exit code for static (scan/parse/resolve) errors.
const EXIT_STATIC: i32 = 65;
/// Exit code for runtime errors.
const EXIT_RUNTIME: i32 = 70;

#[derive(ClapParser, Debug)]
#[command(version, about = "Jasper language interpreter", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Option<Commands>,

    /// Enable logging to jasper.log
    #[arg(long, global = true)]
    log: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes a file, printing each token
    Tokenize {
        filename: PathBuf,

        /// Print the tokens as a JSON array
        #[arg(long)]
        json: bool,
    },

    /// Runs a file as a Jasper program
    Run { filename: PathBuf },

    /// Starts an interactive prompt (the default)
    Repl,
}

/// Reads a source file into a String.
fn read_file(filename: &PathBuf) -> Result<String> {
    info!("Reading file: {:?}", filename);

    let source: String =
        fs::read_to_string(filename).context(format!("Failed to read file {:?}", filename))?;

    info!("Read {} bytes from {:?}", source.len(), filename);

    Ok(source)
}

fn init_logger() -> Result<()> {
    let log_file = File::create("jasper.log").context("Failed to create jasper.log")?;

    Builder::new()
        .format(|buf, record| {
            // Strip 'jasper::' from module path
            let module = record
                .module_path()
                .unwrap_or("<unnamed>")
                .strip_prefix("jasper::")
                .unwrap_or(record.module_path().unwrap_or("<unnamed>"));
            writeln!(
                buf,
                "[{}:{}] - {}",
                module,
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter(None, log::LevelFilter::Debug) // Default to Debug, override with RUST_LOG
        .parse_default_env()
        .init();

    info!("Logger initialized, writing to jasper.log");
    Ok(())
}

/// Print a diagnostic and pick the exit code for it.
fn report(error: &JasperError) -> i32 {
    debug!("Reporting error: {:?}", error);
    eprintln!("{}", error);

    if error.is_static() {
        EXIT_STATIC
    } else {
        EXIT_RUNTIME
    }
}

fn tokenize(filename: &PathBuf, json: bool) -> Result<i32> {
    info!("Running Tokenize subcommand");

    let source: String = read_file(filename)?;
    let (tokens, errors) = Scanner::new(&source).scan_all();

    for e in &errors {
        eprintln!("{}", e);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&tokens)?);
    } else {
        for token in &tokens {
            println!("{}", token);
        }
    }

    Ok(if errors.is_empty() { 0 } else { EXIT_STATIC })
}

fn run_file(filename: &PathBuf) -> Result<i32> {
    info!("Running Run subcommand");

    let source: String = read_file(filename)?;
    let mut session = Session::new();

    match session.run(&source) {
        Ok(()) => {
            info!("Program executed successfully");
            Ok(0)
        }
        Err(e) => Ok(report(&e)),
    }
}

fn repl() -> Result<i32> {
    info!("Starting REPL");

    let mut session = Session::new();
    let mut line = String::new();

    loop {
        print!("> ");
        io::stdout().flush()?;

        // Read without holding the stdin lock, `input()` shares the stream.
        line.clear();
        let read: usize = io::stdin()
            .read_line(&mut line)
            .context("Failed to read from stdin")?;

        if read == 0 {
            println!();
            break;
        }

        // Errors end the line, not the session.
        if let Err(e) = session.run(&line) {
            report(&e);
        }
    }

    Ok(0)
}

fn main() -> Result<()> {
    let args: Cli = match Cli::try_parse() {
        Ok(args) => args,
        Err(e) => {
            // Help and version requests print to stdout and are not failures.
            let misuse: bool = e.use_stderr();
            e.print()?;
            process::exit(if misuse { EXIT_USAGE } else { 0 });
        }
    };

    // Initialize logger only if --log flag is provided
    if args.log {
        init_logger()?;
    } else {
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Off)
            .init();
    }

    info!("CLI arguments: {:?}", args);

    let code: i32 = match &args.commands {
        Some(Commands::Tokenize { filename, json }) => tokenize(filename, *json)?,
        Some(Commands::Run { filename }) => run_file(filename)?,
        Some(Commands::Repl) | None => repl()?,
    };

    if code != 0 {
        debug!("Exiting with code {}", code);
        process::exit(code);
    }

    Ok(())
}
