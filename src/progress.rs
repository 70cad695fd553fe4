//! Build progress reporting.
//!
//! The builder never logs through global state; it reports structured
//! [`ProgressEvent`]s to an injected [`ProgressReporter`]. Reporters exist for
//! the console (with colors), JSON lines, `tracing`, and in-memory recording.
//!
//! # Example
//!
//! ```
//! use mcpaint::progress::{ProgressEvent, ProgressReporter, RecordingProgress};
//!
//! let reporter = RecordingProgress::new();
//! reporter.report(ProgressEvent::RowCompleted { row: 0, total_rows: 4, blocks_placed: 16 });
//! assert_eq!(reporter.events().len(), 1);
//! ```

use serde::Serialize;
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Lifecycle of a single build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildPhase {
    Idle,
    Preprocessing,
    Scanning,
    Done,
    Failed,
    Cancelled,
}

impl std::fmt::Display for BuildPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            BuildPhase::Idle => "idle",
            BuildPhase::Preprocessing => "preprocessing",
            BuildPhase::Scanning => "scanning",
            BuildPhase::Done => "done",
            BuildPhase::Failed => "failed",
            BuildPhase::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

/// Events that can be reported during a build.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ProgressEvent {
    /// The build moved to a new phase
    Phase {
        phase: BuildPhase,
    },
    /// The image was quantized and scanning is about to start
    Preprocessed {
        palette: String,
        source_width: u32,
        source_height: u32,
        width: u32,
        height: u32,
    },
    /// The anchor position was read from the world
    Anchor {
        x: i32,
        y: i32,
        z: i32,
    },
    /// A full row of blocks was placed
    RowCompleted {
        row: u32,
        total_rows: u32,
        blocks_placed: u64,
    },
    /// Build finished
    BuildCompleted {
        rows: u32,
        blocks_placed: u64,
        duration_ms: u64,
    },
    /// Build stopped on an error
    BuildFailed {
        rows_completed: u32,
        blocks_placed: u64,
        message: String,
    },
}

/// Trait for progress reporters.
pub trait ProgressReporter: Send + Sync {
    /// Report a progress event.
    fn report(&self, event: ProgressEvent);

    /// Check if this reporter wants verbose output.
    fn is_verbose(&self) -> bool {
        false
    }
}

/// A progress reporter that discards all events.
#[derive(Debug, Default)]
pub struct NullProgress;

impl NullProgress {
    pub fn new() -> Self {
        Self
    }
}

impl ProgressReporter for NullProgress {
    fn report(&self, _event: ProgressEvent) {}
}

/// Console progress reporter with optional colors.
pub struct ConsoleProgress {
    use_colors: bool,
    verbose: bool,
    /// Last reported tenth of the scan, to print at most ten progress lines
    last_decile: AtomicUsize,
    output: Mutex<Box<dyn Write + Send>>,
}

impl std::fmt::Debug for ConsoleProgress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsoleProgress")
            .field("use_colors", &self.use_colors)
            .field("verbose", &self.verbose)
            .field("last_decile", &self.last_decile)
            .finish()
    }
}

impl ConsoleProgress {
    /// Create a console reporter on stderr; colors only when stderr is a tty.
    pub fn new() -> Self {
        Self {
            use_colors: atty::is(atty::Stream::Stderr),
            verbose: false,
            last_decile: AtomicUsize::new(0),
            output: Mutex::new(Box::new(std::io::stderr())),
        }
    }

    /// Create a console progress reporter that writes to a custom output.
    pub fn with_output<W: Write + Send + 'static>(output: W) -> Self {
        Self {
            use_colors: false,
            verbose: false,
            last_decile: AtomicUsize::new(0),
            output: Mutex::new(Box::new(output)),
        }
    }

    /// Print every row instead of every tenth of the scan.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    fn color(&self, text: &str, color: &str) -> String {
        if self.use_colors {
            format!("{}{}\x1b[0m", color, text)
        } else {
            text.to_string()
        }
    }

    fn green(&self, text: &str) -> String {
        self.color(text, "\x1b[32m")
    }

    fn red(&self, text: &str) -> String {
        self.color(text, "\x1b[31m")
    }

    fn cyan(&self, text: &str) -> String {
        self.color(text, "\x1b[36m")
    }

    fn writeln(&self, line: &str) {
        if let Ok(mut output) = self.output.lock() {
            let _ = writeln!(output, "{}", line);
        }
    }
}

impl Default for ConsoleProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for ConsoleProgress {
    fn report(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::Phase { phase } => {
                if self.verbose {
                    self.writeln(&format!("{} {}", self.cyan("[phase]"), phase));
                }
            }
            ProgressEvent::Preprocessed { palette, source_width, source_height, width, height } => {
                self.last_decile.store(0, Ordering::SeqCst);
                self.writeln(&format!(
                    "{} {}x{} -> {}x{} blocks with palette {}",
                    self.cyan("[build]"),
                    source_width,
                    source_height,
                    width,
                    height,
                    palette
                ));
            }
            ProgressEvent::Anchor { x, y, z } => {
                if self.verbose {
                    self.writeln(&format!("{} anchor at ({}, {}, {})", self.cyan("[build]"), x, y, z));
                }
            }
            ProgressEvent::RowCompleted { row, total_rows, blocks_placed } => {
                let done = row as usize + 1;
                let decile = done * 10 / (total_rows.max(1) as usize);
                let previous = self.last_decile.fetch_max(decile, Ordering::SeqCst);
                if self.verbose || decile > previous {
                    self.writeln(&format!(
                        "{} [{}/{}] {} blocks placed",
                        self.cyan("[build]"),
                        done,
                        total_rows,
                        blocks_placed
                    ));
                }
            }
            ProgressEvent::BuildCompleted { rows, blocks_placed, duration_ms } => {
                self.writeln(&format!(
                    "{} {} blocks in {} {} ({})",
                    self.green("[done]"),
                    blocks_placed,
                    rows,
                    if rows == 1 { "row" } else { "rows" },
                    format_duration(duration_ms)
                ));
            }
            ProgressEvent::BuildFailed { rows_completed, blocks_placed, message } => {
                self.writeln(&format!(
                    "{} {} after {} rows ({} blocks placed)",
                    self.red("[error]"),
                    message,
                    rows_completed,
                    blocks_placed
                ));
            }
        }
    }

    fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// JSON progress reporter for machine-readable output.
pub struct JsonProgress {
    output: Mutex<Box<dyn Write + Send>>,
}

impl std::fmt::Debug for JsonProgress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonProgress").finish()
    }
}

impl JsonProgress {
    /// Create a new JSON progress reporter writing to stderr.
    pub fn new() -> Self {
        Self { output: Mutex::new(Box::new(std::io::stderr())) }
    }

    /// Create a JSON progress reporter that writes to a custom output.
    pub fn with_output<W: Write + Send + 'static>(output: W) -> Self {
        Self { output: Mutex::new(Box::new(output)) }
    }
}

impl Default for JsonProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for JsonProgress {
    fn report(&self, event: ProgressEvent) {
        let Ok(json) = serde_json::to_string(&event) else {
            return;
        };
        if let Ok(mut output) = self.output.lock() {
            let _ = writeln!(output, "{}", json);
        }
    }
}

/// Forwards events to the `tracing` subscriber.
#[derive(Debug, Default)]
pub struct TracingProgress;

impl ProgressReporter for TracingProgress {
    fn report(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::Phase { phase } => tracing::debug!(%phase, "phase changed"),
            ProgressEvent::Preprocessed { palette, width, height, .. } => {
                tracing::info!(%palette, width, height, "image preprocessed")
            }
            ProgressEvent::Anchor { x, y, z } => tracing::info!(x, y, z, "anchor position"),
            ProgressEvent::RowCompleted { row, total_rows, blocks_placed } => {
                tracing::debug!(row, total_rows, blocks_placed, "row completed")
            }
            ProgressEvent::BuildCompleted { rows, blocks_placed, duration_ms } => {
                tracing::info!(rows, blocks_placed, duration_ms, "build completed")
            }
            ProgressEvent::BuildFailed { rows_completed, blocks_placed, message } => {
                tracing::error!(rows_completed, blocks_placed, "build failed: {}", message)
            }
        }
    }

    fn is_verbose(&self) -> bool {
        tracing::enabled!(tracing::Level::DEBUG)
    }
}

/// Sends every event to several reporters.
#[derive(Default)]
pub struct FanOutProgress<'a> {
    reporters: Vec<&'a dyn ProgressReporter>,
}

impl<'a> FanOutProgress<'a> {
    pub fn new(reporters: Vec<&'a dyn ProgressReporter>) -> Self {
        Self { reporters }
    }
}

impl ProgressReporter for FanOutProgress<'_> {
    fn report(&self, event: ProgressEvent) {
        for reporter in &self.reporters {
            reporter.report(event.clone());
        }
    }

    fn is_verbose(&self) -> bool {
        self.reporters.iter().any(|r| r.is_verbose())
    }
}

/// Keeps every event in memory.
#[derive(Debug, Default)]
pub struct RecordingProgress {
    events: Mutex<Vec<ProgressEvent>>,
}

impl RecordingProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events reported so far.
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().map(|events| events.clone()).unwrap_or_default()
    }

    /// Phases in the order they were entered.
    pub fn phases(&self) -> Vec<BuildPhase> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ProgressEvent::Phase { phase } => Some(phase),
                _ => None,
            })
            .collect()
    }
}

impl ProgressReporter for RecordingProgress {
    fn report(&self, event: ProgressEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

/// Format a duration in milliseconds for display.
pub fn format_duration(ms: u64) -> String {
    if ms < 1000 {
        format!("{}ms", ms)
    } else if ms < 60_000 {
        format!("{:.2}s", ms as f64 / 1000.0)
    } else {
        let mins = ms / 60_000;
        let secs = (ms % 60_000) / 1000;
        format!("{}m {}s", mins, secs)
    }
}
