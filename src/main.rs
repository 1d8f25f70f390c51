use std::fs::File;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};
use memmap2::Mmap;

use treelox as lox;

use lox::ast_printer::AstPrinter;
use lox::diagnostics::Diagnostics;
use lox::interpreter::DEFAULT_MAX_CALL_DEPTH;
use lox::lox::{Lox, LoxConfig, RunStatus};
use lox::parser::Parser;
use lox::scanner::Scanner;

/// Exit status for malformed input.
const EXIT_DATA_ERR: i32 = 65;

#[derive(ClapParser, Debug)]
#[command(version, about = "Tree-walking Lox interpreter", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Commands,

    /// Enable logging to a file
    #[arg(long, global = true)]
    log: bool,

    /// Log file written when --log is set
    #[arg(long, global = true, default_value = "app.log")]
    log_file: PathBuf,

    /// Nested calls allowed before a stack overflow error
    #[arg(long, global = true, default_value_t = DEFAULT_MAX_CALL_DEPTH)]
    max_call_depth: usize,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes a file, printing each token
    Tokenize {
        filename: PathBuf,

        /// Print the token stream as JSON
        #[arg(long)]
        json: bool,
    },

    /// Parses a file and prints its AST
    Parse { filename: PathBuf },

    /// Runs a file as a Lox program
    Run { filename: PathBuf },

    /// Starts an interactive session
    Repl,
}

/// Maps `filename` and decodes it as UTF‑8.
fn read_source(filename: &Path) -> Result<String> {
    info!("Reading file: {:?}", filename);

    let source =
        map_source(filename).with_context(|| format!("Failed to read file {:?}", filename))?;

    info!("Read {} bytes from {:?}", source.len(), filename);

    Ok(source)
}

fn map_source(filename: &Path) -> lox::error::Result<String> {
    let file = File::open(filename)?;

    // Zero-length files cannot be mapped.
    if file.metadata()?.len() == 0 {
        return Ok(String::new());
    }

    // SAFETY: the map is read once and dropped before returning; the file is
    // not modified by this process while mapped.
    let mmap = unsafe { Mmap::map(&file)? };

    Ok(std::str::from_utf8(&mmap)?.to_owned())
}

fn init_logger(path: &Path) -> Result<()> {
    let log_file = File::create(path).with_context(|| format!("Failed to create {:?}", path))?;

    Builder::new()
        .format(|buf, record| {
            let module = record.module_path().unwrap_or("<unnamed>");
            let module = module.strip_prefix("treelox::").unwrap_or(module);
            writeln!(
                buf,
                "{} [{}:{}] {} - {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                module,
                record.line().unwrap_or(0),
                record.level(),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter(None, log::LevelFilter::Debug) // Default to Debug, override with RUST_LOG
        .parse_env("RUST_LOG")
        .init();

    info!("Logger initialized, writing to {:?}", path);
    Ok(())
}

fn tokenize(filename: &Path, json: bool) -> Result<i32> {
    let source = read_source(filename)?;
    let mut diagnostics = Diagnostics::echoing();
    let mut scanner = Scanner::new();

    scanner.scan_source(&source, &mut diagnostics);

    if json {
        let rendered =
            serde_json::to_string_pretty(scanner.tokens()).context("Failed to serialize tokens")?;
        println!("{}", rendered);
    } else {
        for token in scanner.tokens() {
            println!("{}", token);
        }
    }

    if diagnostics.has_lexical_errors() {
        debug!("Tokenization failed, exiting with code {}", EXIT_DATA_ERR);
        return Ok(EXIT_DATA_ERR);
    }

    info!("Tokenization completed successfully");
    Ok(0)
}

fn parse(filename: &Path) -> Result<i32> {
    let source = read_source(filename)?;
    let mut diagnostics = Diagnostics::echoing();
    let mut scanner = Scanner::new();

    scanner.scan_source(&source, &mut diagnostics);

    let statements = Parser::new(scanner.tokens(), &mut diagnostics).parse();
    println!("{}", AstPrinter::print_program(&statements));

    if diagnostics.has_lexical_errors() || !diagnostics.syntax_errors().is_empty() {
        return Ok(EXIT_DATA_ERR);
    }

    info!("Parse subcommand completed");
    Ok(0)
}

/// Exit status only reflects lexical errors.  Everything else is reported on
/// stderr and the run still exits 0.
fn run(filename: &Path, config: LoxConfig) -> Result<i32> {
    let source = read_source(filename)?;
    let mut session = Lox::with_config(config);

    match session.run_source(&source) {
        RunStatus::Completed => Ok(0),
        RunStatus::LexicalFailure => Ok(EXIT_DATA_ERR),
    }
}

fn repl(config: LoxConfig) -> Result<i32> {
    let mut session = Lox::with_config(config);
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut line = String::new();

    loop {
        print!("> ");
        stdout.flush().context("Failed to flush stdout")?;

        line.clear();
        let read = stdin
            .lock()
            .read_line(&mut line)
            .context("Failed to read from stdin")?;

        if read == 0 {
            println!();
            break;
        }

        if let Some(value) = session.run_repl_line(line.trim_end_matches(['\n', '\r'])) {
            println!("= {}", value);
        }
    }

    info!("REPL session ended");
    Ok(0)
}

fn main() -> Result<()> {
    let args: Cli = Cli::parse();

    if args.log {
        init_logger(&args.log_file)?;
    } else {
        Builder::new().filter_level(log::LevelFilter::Off).init();
    }

    info!("CLI arguments: {:?}", args);

    let config = LoxConfig {
        max_call_depth: args.max_call_depth,
        ..LoxConfig::default()
    };

    let code = match &args.commands {
        Commands::Tokenize { filename, json } => tokenize(filename, *json)?,
        Commands::Parse { filename } => parse(filename)?,
        Commands::Run { filename } => run(filename, config)?,
        Commands::Repl => repl(config)?,
    };

    if code != 0 {
        std::process::exit(code);
    }

    Ok(())
}
