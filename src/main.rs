use std::fs;
use std::io::{self, BufRead, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser as CliParser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use pseudocod::config::{Config, DEFAULT_MAX_ITERATIONS};
use pseudocod::debugger::{Debugger, StepReport};
use pseudocod::interpreter::{self, Environment, OutputSink};
use pseudocod::{lexer, parser, transpiler};

/// Runs, steps through and translates Romanian exam pseudocode.
#[derive(CliParser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a program to completion; `citeste` reads one line of stdin per value
    Run {
        /// Program file (`-` or nothing reads the program from stdin)
        file: Option<PathBuf>,
        /// Loop passes allowed before a loop counts as infinite
        #[arg(long, default_value_t = DEFAULT_MAX_ITERATIONS)]
        max_iterations: usize,
    },
    /// Step through a program one statement at a time
    Debug {
        file: PathBuf,
        #[arg(long, default_value_t = DEFAULT_MAX_ITERATIONS)]
        max_iterations: usize,
    },
    /// Translate a program to C++
    Transpile {
        file: Option<PathBuf>,
        /// Write the C++ source here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the token stream
    Tokens { file: Option<PathBuf> },
}

/// Program output written straight to stdout.
struct Console;

impl OutputSink for Console {
    fn text(&mut self, text: &str) {
        print!("{text}");
    }

    fn line_break(&mut self) {
        println!();
    }
}

fn read_source(file: Option<&Path>) -> Result<(String, bool)> {
    match file {
        Some(path) if path != Path::new("-") => {
            let source = fs::read_to_string(path)
                .with_context(|| format!("Reading {}", path.display()))?;
            Ok((source, false))
        }
        _ => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("Reading stdin")?;
            Ok((buffer, true))
        }
    }
}

fn run(file: Option<&Path>, config: Config) -> Result<()> {
    let (source, from_stdin) = read_source(file)?;
    let program = parser::parse(&source)?;

    let mut lines = io::stdin().lock().lines();
    let mut input = |name: &str| -> Option<String> {
        if from_stdin {
            return None;
        }
        io::stdout().flush().ok()?;
        eprint!("Citeste {name}: ");
        io::stderr().flush().ok()?;
        lines.next()?.ok()
    };
    let mut environment = Environment::new();
    interpreter::evaluate(
        &program,
        &mut environment,
        &mut Console,
        &mut input,
        config.max_iterations,
    )?;
    Ok(())
}

fn show(report: &StepReport, shown: &mut usize) {
    if let Some(fresh) = report.output.get(*shown..) {
        print!("{fresh}");
    }
    *shown = report.output.len();
    if let Some(error) = &report.error {
        println!("\n[eroare] {error}");
    } else if report.finished {
        println!("\n[terminat]");
    } else if report.pending_input.is_none() {
        println!("\n[linia {}]", report.line);
    }
}

fn debug(file: &Path, config: Config) -> Result<()> {
    let source =
        fs::read_to_string(file).with_context(|| format!("Reading {}", file.display()))?;
    let program = parser::parse(&source)?;
    let mut debugger = Debugger::with_config(&program, config);
    let mut shown = 0;

    println!("Comenzi: s (pas), c (continua), v (variabile), r (reset), q (iesire)");
    for line in io::stdin().lock().lines() {
        let line = line.context("Reading stdin")?;
        if let Some(name) = debugger.pending_input().map(str::to_string) {
            show(&debugger.provide_input(&name, line.trim()), &mut shown);
            continue;
        }
        match line.trim() {
            "" | "s" | "pas" => show(&debugger.step(), &mut shown),
            "c" | "continua" => {
                let mut report = debugger.step();
                while !report.finished && report.pending_input.is_none() {
                    report = debugger.step();
                }
                show(&report, &mut shown);
            }
            "v" | "variabile" => {
                for variable in debugger.variables() {
                    println!("{} ({}) = {}", variable.name, variable.kind, variable.value);
                }
            }
            "r" | "reset" => {
                debugger.reset();
                shown = 0;
                println!("[reset]");
            }
            "q" | "iesire" => break,
            other => eprintln!("Comanda necunoscuta: {other}"),
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    info!(command = ?cli.command, "starting");

    match cli.command {
        Command::Run {
            file,
            max_iterations,
        } => run(file.as_deref(), Config::with_max_iterations(max_iterations)),
        Command::Debug {
            file,
            max_iterations,
        } => {
            if file == Path::new("-") {
                bail!("debug needs a program file; stdin is used for commands");
            }
            debug(&file, Config::with_max_iterations(max_iterations))
        }
        Command::Transpile { file, output } => {
            let (source, _) = read_source(file.as_deref())?;
            let cpp = transpiler::transpile_source(&source)?;
            match output {
                Some(path) => {
                    fs::write(&path, cpp).with_context(|| format!("Writing {}", path.display()))
                }
                None => {
                    print!("{cpp}");
                    Ok(())
                }
            }
        }
        Command::Tokens { file } => {
            let (source, _) = read_source(file.as_deref())?;
            for token in lexer::tokenize(&source)? {
                println!(
                    "{:>4}:{:<3} {:?} {:?}",
                    token.span.line, token.span.column, token.kind, token.text
                );
            }
            Ok(())
        }
    }
}
