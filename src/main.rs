use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser as ClapParser, ValueEnum};
use env_logger::Builder;
use log::{debug, info};

use olox::ast::Stmt;
use olox::ast_printer::AstPrinter;
use olox::token::Token;
use olox::{RunMode, Session};

#[derive(ClapParser, Debug)]
#[command(name = "olox", version, about = "Olox language interpreter", long_about = None)]
pub struct Cli {
    /// Script to run. Starts an interactive prompt when omitted
    paths: Vec<PathBuf>,

    /// Enable logging to olox.log
    #[arg(long)]
    log: bool,

    /// Print an intermediate form instead of running the program
    #[arg(long, value_enum)]
    emit: Option<Emit>,
}

#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
enum Emit {
    /// One `TYPE lexeme literal` line per token
    Tokens,

    /// One JSON object per token
    TokensJson,

    /// Parenthesised AST, one line per top-level statement
    Ast,
}

/// Process exit statuses, sysexits style.
#[derive(Copy, Clone, Debug)]
enum ExitCode {
    Usage = 64,
    DataError = 65,
    Software = 70,
}

fn exit(code: ExitCode) -> ! {
    debug!("Exiting with {:?}", code);

    std::process::exit(code as i32)
}

/// Reads the contents of a file into a String
fn read_file(filename: &Path) -> Result<String> {
    info!("Reading file: {:?}", filename);
    let file = File::open(filename).context(format!("Failed to open file {:?}", filename))?;
    let mut reader = BufReader::new(file);
    let mut buf = String::new();

    let bytes = reader
        .read_to_string(&mut buf)
        .context(format!("Failed to read file {:?}", filename))?;

    info!("Read {} bytes from {:?}", bytes, filename);

    Ok(buf)
}

fn init_logger() -> Result<()> {
    let log_file = File::create("olox.log").context("Failed to create olox.log")?;

    // `[module:line] - message`, crate prefix stripped
    Builder::new()
        .format(|buf, record| {
            let module = record
                .module_path()
                .unwrap_or("<unnamed>")
                .strip_prefix("olox::")
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
        .filter(None, log::LevelFilter::Debug)
        .parse_default_env()
        .init();

    info!("Logger initialized, writing to olox.log");
    Ok(())
}

/// Diagnostics go to stderr, oldest first.
fn print_diagnostics<W: Write>(session: &mut Session<W>) {
    for diagnostic in session.take_diagnostics() {
        eprintln!("{}", diagnostic);
    }
}

fn emit<W: Write>(session: &mut Session<W>, source: &str, form: Emit, mode: RunMode) -> Result<()> {
    match form {
        Emit::Tokens => {
            let tokens: Vec<Token> = session.tokenize(source);
            for token in &tokens {
                println!("{}", token);
            }
        }

        Emit::TokensJson => {
            let tokens: Vec<Token> = session.tokenize(source);
            for token in &tokens {
                let json: String =
                    serde_json::to_string(token).context("Failed to serialise token")?;
                println!("{}", json);
            }
        }

        Emit::Ast => {
            let statements: Vec<Stmt> = session.parse(source, mode);
            if !statements.is_empty() {
                println!("{}", AstPrinter::print_program(&statements));
            }
        }
    }

    Ok(())
}

fn run_file(path: &Path, form: Option<Emit>) -> Result<()> {
    info!("Running file {:?}", path);

    let source: String = read_file(path)?;
    let mut session = Session::new(io::stdout());

    match form {
        Some(form) => emit(&mut session, &source, form, RunMode::File)?,
        None => session.run(&source, RunMode::File),
    }

    print_diagnostics(&mut session);

    if session.reporter().had_build_error() {
        exit(ExitCode::DataError);
    }
    if session.reporter().had_runtime_error() {
        exit(ExitCode::Software);
    }

    info!("Program executed successfully");
    Ok(())
}

fn run_prompt(form: Option<Emit>) -> Result<()> {
    info!("Starting interactive prompt");

    let mut session = Session::new(io::stdout());
    let stdin = io::stdin();
    let mut line = String::new();

    loop {
        print!(">> ");
        io::stdout().flush().context("Failed to flush prompt")?;

        line.clear();
        let read: usize = stdin
            .lock()
            .read_line(&mut line)
            .context("Failed to read from stdin")?;
        if read == 0 {
            debug!("End of input, leaving prompt");
            println!();
            break;
        }

        match form {
            Some(form) => {
                session.reporter_mut().clear_build_error();
                emit(&mut session, &line, form, RunMode::Repl)?;
            }
            None => session.run(&line, RunMode::Repl),
        }

        print_diagnostics(&mut session);
    }

    Ok(())
}

fn main() -> Result<()> {
    let args: Cli = match Cli::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let usage_error: bool = e.use_stderr();
            e.print().context("Failed to print usage")?;
            if usage_error {
                exit(ExitCode::Usage);
            }
            return Ok(());
        }
    };

    if args.log {
        init_logger()?;
    } else {
        Builder::from_env(env_logger::Env::default().default_filter_or("off")).init();
    }

    info!("CLI arguments: {:?}", args);

    match args.paths.as_slice() {
        [] => run_prompt(args.emit),
        [path] => run_file(path, args.emit),
        _ => {
            println!("Usage: olox [script]");
            exit(ExitCode::Usage);
        }
    }
}
