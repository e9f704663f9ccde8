//! Compile and run Wall-E drawing programs.

pub mod image;

use std::fs;
use std::path::Path;

use walle_parser::lexer::lex;
use walle_parser::parser::Parser;
use walle_passes::check::check_program;
use walle_source::Source;

pub use walle_parser::ast::Program;
pub use walle_runtime::{
    CancellationToken, Canvas, DrawingUpdate, ExecutionMode, ExecutionOptions, InterpretResult, Interpreter,
    ProgressSink, UpdateKind, DEFAULT_CANVAS_SIZE, DEFAULT_MAX_STATEMENTS, MAX_CANVAS_SIZE,
};
pub use walle_source::Error;
pub use walle_value::Color;

/// File extension of Wall-E programs.
pub const EXTENSION: &str = "pw";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionStatus {
    Completed,
    Cancelled,
    /// A runtime or import error stopped the run.
    Failed,
}

/// Outcome of [`execute`]. The canvas is always present, even when the run failed.
#[derive(Debug, Clone)]
pub struct ExecutionReport {
    pub canvas: Canvas,
    pub errors: Vec<Error>,
    pub status: ExecutionStatus,
}

/// Lexes, parses and checks `source`.
/// Stops after the first stage that reports errors and returns all of that stage's errors.
pub fn compile(source: &str) -> Result<Program, Vec<Error>> {
    let source = Source::new(source);
    let tokens = lex(&source);
    if !source.has_no_errors() {
        return Err(source.errors.take());
    }

    let program = Parser::with_tokens(&source, tokens).parse_program();
    if !source.has_no_errors() {
        return Err(source.errors.take());
    }

    check_program(&program, &source);
    if !source.has_no_errors() {
        return Err(source.errors.take());
    }
    Ok(program)
}

/// Runs a compiled `program` on a fresh canvas, or on `background` (PNG bytes) scaled to the
/// canvas size. Progress is reported to `sink` according to `options.mode`.
pub fn execute(
    program: &Program,
    options: &ExecutionOptions,
    background: Option<&[u8]>,
    sink: &mut dyn ProgressSink,
    token: CancellationToken,
) -> ExecutionReport {
    let canvas = match prepare_canvas(options, background) {
        Ok(canvas) => canvas,
        Err(err) => {
            let canvas = Canvas::new(
                options.width.min(MAX_CANVAS_SIZE),
                options.height.min(MAX_CANVAS_SIZE),
            );
            sink.report(DrawingUpdate {
                canvas: canvas.clone(),
                kind: UpdateKind::Error,
                message: Some(err.to_string()),
                errors: vec![err.clone()],
            });
            return ExecutionReport {
                canvas,
                errors: vec![err],
                status: ExecutionStatus::Failed,
            };
        }
    };

    let mut interpreter = Interpreter::new(program, canvas, options, sink, token);
    let (errors, status) = match interpreter.run() {
        InterpretResult::Completed => (Vec::new(), ExecutionStatus::Completed),
        InterpretResult::Cancelled => (Vec::new(), ExecutionStatus::Cancelled),
        InterpretResult::RuntimeError(err) => (vec![err], ExecutionStatus::Failed),
    };
    ExecutionReport {
        canvas: interpreter.into_canvas(),
        errors,
        status,
    }
}

fn prepare_canvas(options: &ExecutionOptions, background: Option<&[u8]>) -> Result<Canvas, Error> {
    let valid = 1..=MAX_CANVAS_SIZE;
    if !valid.contains(&options.width) || !valid.contains(&options.height) {
        return Err(Error::import(format!(
            "Invalid canvas size {}x{}, both sides must be between 1 and {}.",
            options.width, options.height, MAX_CANVAS_SIZE
        )));
    }
    match background {
        Some(bytes) => image::decode_background(bytes, options.width, options.height),
        None => Ok(Canvas::new(options.width, options.height)),
    }
}

/// Reads a program file. Only `.pw` files are accepted.
pub fn read_program(path: &Path) -> Result<String, Error> {
    if path.extension().and_then(|ext| ext.to_str()) != Some(EXTENSION) {
        return Err(Error::import(format!(
            "'{}' is not a Wall-E program, expected a '.{}' file.",
            path.display(),
            EXTENSION
        )));
    }
    fs::read_to_string(path)
        .map_err(|err| Error::import(format!("Cannot read '{}': {}.", path.display(), err)))
}
