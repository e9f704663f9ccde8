use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use console::style;
use walle::{
    compile, execute, image, read_program, CancellationToken, ExecutionMode, ExecutionOptions,
    ExecutionStatus, UpdateKind, DEFAULT_CANVAS_SIZE, DEFAULT_MAX_STATEMENTS,
};
use walle_parser::lexer::lex;
use walle_runtime::progress::DrawingUpdate;
use walle_source::{Error, Source};

#[derive(Parser)]
#[command(name = "walle")]
#[command(about = "Interpreter for the Wall-E pixel drawing language", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a program and optionally save the canvas as PNG
    Run(RunArgs),
    /// Report lexical, syntax and semantic errors without running
    Check { file: PathBuf },
    /// Print the tokens of a program
    Tokens { file: PathBuf },
    /// Print the syntax tree of a program
    Ast { file: PathBuf },
}

#[derive(Args)]
struct RunArgs {
    file: PathBuf,

    #[arg(long, default_value_t = DEFAULT_CANVAS_SIZE)]
    width: usize,

    #[arg(long, default_value_t = DEFAULT_CANVAS_SIZE)]
    height: usize,

    /// instant, step or pixel
    #[arg(long, default_value = "instant")]
    mode: ExecutionMode,

    /// Pause after every progress update, in milliseconds
    #[arg(long, default_value_t = 0)]
    delay: u64,

    #[arg(long, default_value_t = DEFAULT_MAX_STATEMENTS)]
    max_statements: usize,

    /// PNG image drawn on before the program starts
    #[arg(long)]
    background: Option<PathBuf>,

    /// Where to write the final canvas as PNG
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let result = match cli.command {
        Command::Run(args) => run(args),
        Command::Check { file } => check(&file),
        Command::Tokens { file } => tokens(&file),
        Command::Ast { file } => ast(&file),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(errors) => {
            report_errors(&errors);
            ExitCode::FAILURE
        }
    }
}

fn report_errors(errors: &[Error]) {
    for err in errors {
        eprintln!("{}", style(err).red());
    }
}

fn run(args: RunArgs) -> Result<(), Vec<Error>> {
    let source = read_program(&args.file).map_err(|err| vec![err])?;
    let program = compile(&source)?;
    let background = match &args.background {
        Some(path) => Some(
            fs::read(path).map_err(|err| {
                vec![Error::import(format!("Cannot read '{}': {}.", path.display(), err))]
            })?,
        ),
        None => None,
    };

    let options = ExecutionOptions {
        width: args.width,
        height: args.height,
        mode: args.mode,
        step_delay: Duration::from_millis(args.delay),
        max_statements: args.max_statements,
        ..ExecutionOptions::default()
    };
    let mut sink = |update: DrawingUpdate| {
        if let (UpdateKind::Step, Some(message)) = (update.kind, &update.message) {
            eprintln!("{}", style(message).dim());
        }
    };
    let report = execute(
        &program,
        &options,
        background.as_deref(),
        &mut sink,
        CancellationToken::new(),
    );

    if let Some(path) = &args.output {
        let bytes = image::encode_png(&report.canvas).map_err(|err| vec![err])?;
        fs::write(path, bytes).map_err(|err| {
            vec![Error::import(format!("Cannot write '{}': {}.", path.display(), err))]
        })?;
        eprintln!("{} {}", style("Canvas written to").green(), path.display());
    }

    match report.status {
        ExecutionStatus::Completed => Ok(()),
        _ => Err(report.errors),
    }
}

fn check(file: &Path) -> Result<(), Vec<Error>> {
    let source = read_program(file).map_err(|err| vec![err])?;
    compile(&source)?;
    eprintln!("{}", style("No errors found.").green());
    Ok(())
}

fn tokens(file: &Path) -> Result<(), Vec<Error>> {
    let content = read_program(file).map_err(|err| vec![err])?;
    let source = Source::new(&content);
    for token in lex(&source) {
        println!("{:<8} {}", token.loc.to_string(), token.token);
    }
    into_result(&source)
}

fn ast(file: &Path) -> Result<(), Vec<Error>> {
    let content = read_program(file).map_err(|err| vec![err])?;
    let source = Source::new(&content);
    let tokens = lex(&source);
    into_result(&source)?;
    let program = walle_parser::parser::Parser::with_tokens(&source, tokens).parse_program();
    println!("{}", program);
    into_result(&source)
}

fn into_result(source: &Source) -> Result<(), Vec<Error>> {
    if source.has_no_errors() {
        Ok(())
    } else {
        Err(source.errors.take())
    }
}
