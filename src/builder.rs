//! Image building: scanning a quantized grid into block placements
//!
//! Rows of the grid map to world Z and columns to world X, starting at the
//! player's tile. Every block of a build sits at the configured height.
//!
//! # Examples
//!
//! ```
//! use mcpaint::builder::ImageBuilder;
//! use mcpaint::preprocess::QuantizedImage;
//! use mcpaint::registry::PaletteRegistry;
//! use mcpaint::validate::{validate, RenderParams};
//! use mcpaint::world::{RecordingWorld, TilePos};
//!
//! let registry = PaletteRegistry::from_toml(r#"
//! [image]
//! height = 100
//! default_colormap = "one_value.bw"
//! building_time_delay = 0.0
//!
//! [image.size]
//! min = 8
//! max = 512
//! default = 64
//!
//! [image.blocks]
//! "one_value.bw" = [[35, 15], [35, 0]]
//! "#).unwrap();
//! let config = validate(&registry, RenderParams { height: Some(64), ..Default::default() }).unwrap();
//!
//! let grid = QuantizedImage::from_rows(&[vec![0, 1]]).unwrap();
//! let mut world = RecordingWorld::new(TilePos::new(0, 0, 0));
//! let report = ImageBuilder::new(&registry, config).build_grid(&mut world, &grid).unwrap();
//! assert_eq!(report.blocks_placed, 2);
//! ```

use image::DynamicImage;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::preprocess::{self, ChannelMode, PreprocessError, QuantizedImage};
use crate::progress::{BuildPhase, NullProgress, ProgressEvent, ProgressReporter};
use crate::registry::{LookupError, Palette, PaletteRegistry};
use crate::validate::RenderConfig;
use crate::world::{TilePos, World, WorldError};

static NULL_PROGRESS: NullProgress = NullProgress;

/// Error returned when a build cannot finish
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BuildError {
    /// Configured palette is not in the registry
    #[error(transparent)]
    Lookup(#[from] LookupError),
    /// The image could not be loaded or quantized
    #[error(transparent)]
    Preprocess(#[from] PreprocessError),
    /// A world call failed; blocks already placed stay in place
    #[error("{source} (after {rows_completed} rows, {blocks_placed} blocks)")]
    World {
        #[source]
        source: WorldError,
        rows_completed: u32,
        blocks_placed: u64,
    },
    /// A grid value does not index into the palette
    #[error("Index {index} is out of range for palette '{palette}' with {len} blocks")]
    IndexOutOfRange { index: u32, palette: String, len: usize },
    /// The cancel token was set between rows
    #[error("Build cancelled after {rows_completed} rows")]
    Cancelled { rows_completed: u32 },
    /// A block position does not fit in world coordinates
    #[error("Block at row {row}, column {col} is out of world bounds from anchor {anchor}")]
    OutOfBounds { anchor: TilePos, row: u32, col: u32 },
}

/// Summary of a finished build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildReport {
    pub anchor: TilePos,
    pub rows: u32,
    pub columns: u32,
    pub blocks_placed: u64,
}

/// Shared flag for stopping a build between rows.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
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

/// Renders images into a [`World`] with a validated [`RenderConfig`].
pub struct ImageBuilder<'a> {
    registry: &'a PaletteRegistry,
    config: RenderConfig,
    reporter: &'a dyn ProgressReporter,
    cancel: Option<CancelToken>,
    delay: Option<Duration>,
}

impl<'a> ImageBuilder<'a> {
    pub fn new(registry: &'a PaletteRegistry, config: RenderConfig) -> Self {
        Self { registry, config, reporter: &NULL_PROGRESS, cancel: None, delay: None }
    }

    /// Report build events to `reporter`.
    pub fn with_reporter(mut self, reporter: &'a dyn ProgressReporter) -> Self {
        self.reporter = reporter;
        self
    }

    /// Check `token` before every row.
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Pause between rows instead of the registry's `building_time_delay`.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Load the image at `path` and build it.
    pub fn build<W: World>(&self, world: W, path: &Path) -> Result<BuildReport, BuildError> {
        self.phase(BuildPhase::Idle);
        let image = preprocess::load_image(path).map_err(|e| self.fail(e.into(), 0, 0))?;
        self.build_image(world, &image)
    }

    /// Quantize a decoded image and build it.
    pub fn build_image<W: World>(
        &self,
        world: W,
        image: &DynamicImage,
    ) -> Result<BuildReport, BuildError> {
        self.phase(BuildPhase::Preprocessing);
        let grid = self.quantize(image).map_err(|e| self.fail(e, 0, 0))?;
        self.build_grid(world, &grid)
    }

    /// Quantize an image with this builder's palette and size limit.
    pub fn quantize(&self, image: &DynamicImage) -> Result<QuantizedImage, BuildError> {
        let palette = self.palette()?;
        let grid = preprocess::preprocess(
            image,
            self.config.max_size,
            palette.len(),
            ChannelMode::from(palette.kind()),
        )?;
        Ok(grid)
    }

    /// Place an already quantized grid.
    pub fn build_grid<W: World>(
        &self,
        mut world: W,
        grid: &QuantizedImage,
    ) -> Result<BuildReport, BuildError> {
        let started = Instant::now();
        let palette = self.palette().map_err(|e| self.fail(e, 0, 0))?;
        let (source_width, source_height) = grid.source_dimensions();
        self.reporter.report(ProgressEvent::Preprocessed {
            palette: palette.name().to_string(),
            source_width,
            source_height,
            width: grid.width(),
            height: grid.height(),
        });

        let anchor = world.tile_pos().map_err(|source| {
            self.fail(BuildError::World { source, rows_completed: 0, blocks_placed: 0 }, 0, 0)
        })?;
        self.reporter.report(ProgressEvent::Anchor { x: anchor.x, y: anchor.y, z: anchor.z });

        self.phase(BuildPhase::Scanning);
        let report = self.scan(&mut world, grid, palette, anchor)?;

        self.reporter.report(ProgressEvent::BuildCompleted {
            rows: report.rows,
            blocks_placed: report.blocks_placed,
            duration_ms: started.elapsed().as_millis() as u64,
        });
        self.phase(BuildPhase::Done);
        Ok(report)
    }

    fn scan<W: World>(
        &self,
        world: &mut W,
        grid: &QuantizedImage,
        palette: &Palette,
        anchor: TilePos,
    ) -> Result<BuildReport, BuildError> {
        let delay = self.delay.unwrap_or(self.registry.bounds().placement_delay);
        let total_rows = grid.height();
        let mut placed = 0u64;

        for (row, indices) in grid.rows().enumerate() {
            let row = row as u32;

            if self.cancel.as_ref().is_some_and(CancelToken::is_cancelled) {
                tracing::warn!(rows_completed = row, "build cancelled");
                self.phase(BuildPhase::Cancelled);
                return Err(BuildError::Cancelled { rows_completed: row });
            }

            if row > 0 && !delay.is_zero() {
                std::thread::sleep(delay);
            }

            for (col, &index) in indices.iter().enumerate() {
                let col = col as u32;
                let block = palette.resolve(index, self.config.flip_palette).ok_or_else(|| {
                    self.fail(
                        BuildError::IndexOutOfRange {
                            index,
                            palette: palette.name().to_string(),
                            len: palette.len(),
                        },
                        row,
                        placed,
                    )
                })?;
                let pos = offset(anchor, row, col)
                    .map(|(x, z)| TilePos::new(x, self.config.height, z))
                    .ok_or_else(|| {
                        self.fail(BuildError::OutOfBounds { anchor, row, col }, row, placed)
                    })?;
                world.set_block(pos, block).map_err(|source| {
                    self.fail(
                        BuildError::World { source, rows_completed: row, blocks_placed: placed },
                        row,
                        placed,
                    )
                })?;
                placed += 1;
            }

            self.reporter.report(ProgressEvent::RowCompleted {
                row,
                total_rows,
                blocks_placed: placed,
            });
        }

        Ok(BuildReport { anchor, rows: total_rows, columns: grid.width(), blocks_placed: placed })
    }

    fn palette(&self) -> Result<&'a Palette, BuildError> {
        Ok(self.registry.palette(&self.config.palette_name)?)
    }

    fn phase(&self, phase: BuildPhase) {
        self.reporter.report(ProgressEvent::Phase { phase });
    }

    /// Report a failure and hand the error back.
    fn fail(&self, err: BuildError, rows_completed: u32, blocks_placed: u64) -> BuildError {
        self.reporter.report(ProgressEvent::BuildFailed {
            rows_completed,
            blocks_placed,
            message: err.to_string(),
        });
        self.phase(BuildPhase::Failed);
        err
    }
}

/// World `(x, z)` of grid cell `(row, col)`, or `None` past `i32` range.
fn offset(anchor: TilePos, row: u32, col: u32) -> Option<(i32, i32)> {
    let x = anchor.x.checked_add(i32::try_from(col).ok()?)?;
    let z = anchor.z.checked_add(i32::try_from(row).ok()?)?;
    Some((x, z))
}
