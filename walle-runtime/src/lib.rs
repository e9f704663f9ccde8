//! Canvas, drawing engine and interpreter for Wall-E programs.

pub mod canvas;
pub mod controller;
pub mod draw;
pub mod functions;
pub mod interpreter;
pub mod progress;
pub mod state;

use std::time::Duration;

pub use canvas::Canvas;
pub use interpreter::{InterpretResult, Interpreter};
pub use progress::{CancellationToken, DrawingUpdate, ExecutionMode, ProgressSink, UpdateKind};
pub use state::WallEState;

pub const DEFAULT_CANVAS_SIZE: usize = 64;
/// Largest accepted canvas side.
pub const MAX_CANVAS_SIZE: usize = 4096;
pub const DEFAULT_MAX_STATEMENTS: usize = 10_000;

/// Settings of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionOptions {
    pub width: usize,
    pub height: usize,
    pub mode: ExecutionMode,
    /// Pause after every progress update. Ignored in [`ExecutionMode::Instant`].
    pub step_delay: Duration,
    /// Statements a run may execute before it fails.
    pub max_statements: usize,
    /// Pixels per update in [`ExecutionMode::PixelByPixel`].
    pub pixel_batch: usize,
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        Self {
            width: DEFAULT_CANVAS_SIZE,
            height: DEFAULT_CANVAS_SIZE,
            mode: ExecutionMode::Instant,
            step_delay: Duration::ZERO,
            max_statements: DEFAULT_MAX_STATEMENTS,
            pixel_batch: 1,
        }
    }
}
