//! Progress reporting and cooperative cancellation of a run.

use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use walle_source::Error;

use crate::canvas::Canvas;

/// How often a run reports progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    /// No intermediate updates and no delays.
    Instant,
    /// One update after every drawing statement.
    StepByStep,
    /// One update after every pixel (or batch of pixels).
    PixelByPixel,
}

impl Default for ExecutionMode {
    fn default() -> Self {
        ExecutionMode::Instant
    }
}

impl FromStr for ExecutionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "instant" => Ok(ExecutionMode::Instant),
            "step" => Ok(ExecutionMode::StepByStep),
            "pixel" => Ok(ExecutionMode::PixelByPixel),
            _ => Err(format!(
                "unknown execution mode '{}', expected one of: instant, step, pixel",
                s
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateKind {
    Pixel,
    Step,
    Complete,
    Error,
}

/// A progress event. Carries a snapshot of the canvas, never a live handle.
#[derive(Debug, Clone)]
pub struct DrawingUpdate {
    pub canvas: Canvas,
    pub kind: UpdateKind,
    pub message: Option<String>,
    pub errors: Vec<Error>,
}

/// Receives the progress events of a run.
pub trait ProgressSink {
    fn report(&mut self, update: DrawingUpdate);
}

impl<F: FnMut(DrawingUpdate)> ProgressSink for F {
    fn report(&mut self, update: DrawingUpdate) {
        self(update)
    }
}

/// Updates are dropped once the receiver hangs up.
impl ProgressSink for Sender<DrawingUpdate> {
    fn report(&mut self, update: DrawingUpdate) {
        let _ = self.send(update);
    }
}

/// Shared flag used to stop a run from another thread.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Granularity of cancellation checks while sleeping.
const SLEEP_SLICE: Duration = Duration::from_millis(10);

/// Emits the updates of one run according to its [`ExecutionMode`].
pub struct ProgressReporter<'s> {
    sink: &'s mut dyn ProgressSink,
    mode: ExecutionMode,
    delay: Duration,
    /// Pixels per [`UpdateKind::Pixel`] update.
    pixel_batch: usize,
    /// Pixels written since the last pixel update.
    pending_pixels: usize,
    token: CancellationToken,
}

impl<'s> ProgressReporter<'s> {
    pub fn new(
        sink: &'s mut dyn ProgressSink,
        mode: ExecutionMode,
        delay: Duration,
        pixel_batch: usize,
        token: CancellationToken,
    ) -> Self {
        Self {
            sink,
            mode,
            delay,
            pixel_batch: pixel_batch.max(1),
            pending_pixels: 0,
            token,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    fn emit(&mut self, canvas: &Canvas, kind: UpdateKind, message: Option<String>, errors: Vec<Error>) {
        self.sink.report(DrawingUpdate {
            canvas: canvas.clone(),
            kind,
            message,
            errors,
        });
    }

    /// Called after every pixel write.
    pub fn pixel(&mut self, canvas: &Canvas) {
        if self.mode != ExecutionMode::PixelByPixel {
            return;
        }
        self.pending_pixels += 1;
        if self.pending_pixels >= self.pixel_batch {
            self.flush_pixels(canvas);
        }
    }

    /// Reports the pixels written since the last pixel update, if any.
    pub fn flush_pixels(&mut self, canvas: &Canvas) {
        if self.pending_pixels == 0 {
            return;
        }
        self.pending_pixels = 0;
        self.emit(canvas, UpdateKind::Pixel, None, Vec::new());
        self.sleep();
    }

    /// Called after every drawing statement.
    pub fn step(&mut self, canvas: &Canvas, message: String) {
        match self.mode {
            ExecutionMode::Instant => {}
            ExecutionMode::StepByStep => {
                self.emit(canvas, UpdateKind::Step, Some(message), Vec::new());
                self.sleep();
            }
            ExecutionMode::PixelByPixel => self.flush_pixels(canvas),
        }
    }

    pub fn complete(&mut self, canvas: &Canvas, message: &str) {
        self.emit(canvas, UpdateKind::Complete, Some(message.to_string()), Vec::new());
    }

    pub fn error(&mut self, canvas: &Canvas, errors: Vec<Error>) {
        let message = errors.first().map(|err| err.to_string());
        self.emit(canvas, UpdateKind::Error, message, errors);
    }

    /// Sleeps for the configured delay in short slices, returning early on cancellation.
    /// A delay too long to represent waits until the run is cancelled.
    fn sleep(&self) {
        let deadline = Instant::now().checked_add(self.delay);
        loop {
            if self.token.is_cancelled() {
                return;
            }
            let slice = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return;
                    }
                    SLEEP_SLICE.min(deadline - now)
                }
                None => SLEEP_SLICE,
            };
            thread::sleep(slice);
        }
    }
}
