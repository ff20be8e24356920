//! The render run: discover tiles, order and batch them, rasterize each batch
//! on the worker pool, composite, then write the labelled image.

use image::RgbaImage;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use voxmap_common::{Bounds, MapError, Result};
use voxmap_logger::time::iso_now;
use voxmap_logger::{log, LogSeverity};
use voxmap_world::index::{
    list_level_dirs, partition, scan_partition, Partition, SCAN_PARTITIONS,
};
use voxmap_world::Tile;

use super::batch::{batches, MAX_BATCH};
use super::canvas::Canvas;
use super::footer::footer_lines;
use super::orientation::Orientation;
use super::output::{open_in_viewer, save_png};
use super::pool::WorkerPool;
use super::shading::Rasterizer;
use crate::config::RenderConfig;

/// Receives human-readable progress messages.
pub trait StatusSink: Send + Sync {
    fn status(&self, message: &str);
}

impl<F> StatusSink for F
where
    F: Fn(&str) + Send + Sync,
{
    fn status(&self, message: &str) {
        self(message)
    }
}

/// Forwards status messages to the logger.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl StatusSink for LogSink {
    fn status(&self, message: &str) {
        log(message.to_string(), LogSeverity::Info);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Discovering,
    Sorting,
    Rendering,
    Finalizing,
    Done,
    Failed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Summary of a finished run.
#[derive(Debug, Clone)]
pub struct RenderReport {
    pub output: PathBuf,
    pub bounds: Bounds,
    pub width: u32,
    pub height: u32,
    pub tiles_rendered: usize,
    pub tiles_dropped: usize,
    pub viewer_opened: bool,
}

struct RenderedTile {
    x: i32,
    z: i32,
    image: RgbaImage,
}

/// Loads, rasterizes and unloads one tile.
fn render_tile(
    mut tile: Tile,
    rasterizer: &dyn Rasterizer,
    orientation: Orientation,
) -> Result<RenderedTile> {
    tile.load()?;
    let image = rasterizer.rasterize(&tile, orientation);
    tile.unload();
    Ok(RenderedTile {
        x: tile.x(),
        z: tile.z(),
        image,
    })
}

pub struct Pipeline {
    config: RenderConfig,
    pool: WorkerPool,
    rasterizer: Arc<dyn Rasterizer>,
    phase: Phase,
}

impl Pipeline {
    pub fn new(config: RenderConfig) -> Self {
        let rasterizer = config.shading.rasterizer();
        Pipeline {
            config,
            pool: WorkerPool::default(),
            rasterizer,
            phase: Phase::Idle,
        }
    }

    pub fn with_pool(mut self, pool: WorkerPool) -> Self {
        self.pool = pool;
        self
    }

    pub fn with_rasterizer(mut self, rasterizer: Arc<dyn Rasterizer>) -> Self {
        self.rasterizer = rasterizer;
        self
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    fn enter(&mut self, phase: Phase) {
        log(format!("Phase {} -> {}", self.phase, phase), LogSeverity::Debug);
        self.phase = phase;
    }

    /// Renders the configured world. Progress and the final outcome are
    /// reported through `sink`; a failure is reported exactly once.
    pub async fn run(&mut self, sink: &dyn StatusSink) -> Result<RenderReport> {
        match self.execute(sink).await {
            Ok(report) => {
                self.enter(Phase::Done);
                if report.viewer_opened || !self.config.open_viewer {
                    sink.status("OK");
                } else {
                    let shown = std::fs::canonicalize(&report.output)
                        .unwrap_or_else(|_| report.output.clone());
                    sink.status(&format!("OK - please open {}", shown.display()));
                }
                Ok(report)
            }
            Err(err) => {
                self.enter(Phase::Failed);
                log(format!("Render failed: {}", err), LogSeverity::Error);
                sink.status(&format!("Failed: {}", err));
                Err(err)
            }
        }
    }

    async fn execute(&mut self, sink: &dyn StatusSink) -> Result<RenderReport> {
        let orientation = self.config.orientation;
        let root = self.config.world_root();

        self.enter(Phase::Discovering);
        sink.status("Discovering tiles...");
        let (mut tiles, bounds) = self.discover(&root).await?;
        log(
            format!(
                "Found {} tiles spanning x {}..={} and z {}..={}",
                tiles.len(),
                bounds.x,
                bounds.max_x(),
                bounds.z,
                bounds.max_z()
            ),
            LogSeverity::Info,
        );

        self.enter(Phase::Sorting);
        sink.status(&format!("Sorting {} tiles...", tiles.len()));
        tiles.sort_by_key(|tile| orientation.sort_key(tile.x(), tile.z()));
        let ranges = batches(
            &tiles,
            |tile| orientation.sort_key(tile.x(), tile.z()).0,
            MAX_BATCH,
        );

        self.enter(Phase::Rendering);
        let mut canvas = Canvas::new(bounds, orientation)?;
        let total = tiles.len();
        let mut processed = 0;
        let mut rendered = 0;
        let mut dropped = 0;
        let mut remaining = tiles.into_iter();

        for range in ranges {
            sink.status(&format!("Rendering... {}/{}", processed, total));
            let jobs: Vec<_> = remaining
                .by_ref()
                .take(range.len())
                .map(|tile| {
                    let rasterizer = Arc::clone(&self.rasterizer);
                    move || render_tile(tile, rasterizer.as_ref(), orientation)
                })
                .collect();
            processed += jobs.len();

            for result in self.pool.run_all(jobs).await? {
                match result {
                    Ok(tile) => {
                        canvas.composite(tile.x, tile.z, &tile.image);
                        rendered += 1;
                    }
                    Err(err) if err.is_tile_local() => {
                        log(format!("Dropping tile: {}", err), LogSeverity::Warning);
                        dropped += 1;
                    }
                    Err(err) => return Err(err),
                }
            }
        }

        self.enter(Phase::Finalizing);
        sink.status("Writing image...");
        let lines = footer_lines(&self.config.world_name(), &iso_now(), orientation);
        canvas.draw_footer(&lines);
        let image = canvas.into_image();
        let (width, height) = image.dimensions();

        let output = self.config.output_path();
        let target = output.clone();
        self.pool
            .run_all(vec![move || save_png(&image, &target)])
            .await?
            .into_iter()
            .collect::<Result<Vec<()>>>()?;
        log(format!("Wrote {}", output.display()), LogSeverity::Info);

        let viewer_opened = self.config.open_viewer && open_in_viewer(&output);
        Ok(RenderReport {
            output,
            bounds,
            width,
            height,
            tiles_rendered: rendered,
            tiles_dropped: dropped,
            viewer_opened,
        })
    }

    /// Walks the shard directories on the pool, creating a tile record per
    /// file and the world bounds along the way.
    async fn discover(&self, root: &Path) -> Result<(Vec<Tile>, Bounds)> {
        let dirs = list_level_dirs(root)?;
        let jobs: Vec<_> = partition(&dirs, SCAN_PARTITIONS)
            .into_iter()
            .map(|share| move || scan_partition(&share, true))
            .collect();

        let found = self
            .pool
            .run_all(jobs)
            .await?
            .into_iter()
            .fold(Partition::default(), Partition::merge);

        match found.extent {
            Some(extent) => Ok((found.tiles, extent.bounds()?)),
            None => Err(MapError::format(format!(
                "no tiles found under {}",
                root.display()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::sync::Mutex;
    use tempfile::TempDir;
    use voxmap_world::synth::{write_tile, TileContents};

    fn config_for(root: &Path) -> RenderConfig {
        let mut config = RenderConfig::new(root);
        config.open_viewer = false;
        config
    }

    fn recorder() -> (Arc<Mutex<Vec<String>>>, impl StatusSink) {
        let messages = Arc::new(Mutex::new(Vec::new()));
        let sink_messages = Arc::clone(&messages);
        let sink = move |msg: &str| sink_messages.lock().unwrap().push(msg.to_string());
        (messages, sink)
    }

    #[tokio::test]
    async fn test_status_sequence() {
        let dir = TempDir::new().unwrap();
        for x in 0..12 {
            let mut contents = TileContents::new(x, 0);
            contents.fill_to(30, 1);
            write_tile(dir.path(), &contents).unwrap();
        }

        let (messages, sink) = recorder();
        let mut pipeline = Pipeline::new(config_for(dir.path())).with_pool(WorkerPool::new(1));
        assert_eq!(pipeline.phase(), Phase::Idle);
        assert!(!pipeline.config().open_viewer);
        let report = pipeline.run(&sink).await.unwrap();
        assert_eq!(pipeline.phase(), Phase::Done);

        assert_eq!(report.tiles_rendered, 12);
        assert_eq!((report.width, report.height), (12 * 16, 16 + 150));
        assert!(report.output.ends_with("level.png"));
        assert!(report.output.exists());

        let messages = messages.lock().unwrap();
        assert_eq!(
            *messages,
            vec![
                "Discovering tiles...",
                "Sorting 12 tiles...",
                "Rendering... 0/12",
                "Rendering... 10/12",
                "Writing image...",
                "OK",
            ]
        );
    }

    #[tokio::test]
    async fn test_empty_world_fails_once() {
        let dir = TempDir::new().unwrap();
        let (messages, sink) = recorder();
        let mut pipeline = Pipeline::new(config_for(dir.path()));

        assert_matches!(pipeline.run(&sink).await, Err(MapError::FormatError(_)));
        assert_eq!(pipeline.phase(), Phase::Failed);

        let messages = messages.lock().unwrap();
        let failures: Vec<_> = messages.iter().filter(|m| m.starts_with("Failed: ")).collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(messages.last(), failures.last().copied());
    }

    #[tokio::test]
    async fn test_tiles_at_grid_extremes_fail_once() {
        let dir = TempDir::new().unwrap();
        write_tile(dir.path(), &TileContents::new(i32::MIN, 0)).unwrap();
        write_tile(dir.path(), &TileContents::new(i32::MAX, 0)).unwrap();

        let (messages, sink) = recorder();
        let mut pipeline = Pipeline::new(config_for(dir.path()));
        assert_matches!(pipeline.run(&sink).await, Err(MapError::FormatError(_)));
        assert_eq!(pipeline.phase(), Phase::Failed);

        let messages = messages.lock().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0], "Discovering tiles...");
        assert!(messages[1].starts_with("Failed: "), "{}", messages[1]);
        assert!(messages[1].contains("too wide"), "{}", messages[1]);
        assert!(!dir.path().join("level.png").exists());
    }

    #[tokio::test]
    async fn test_far_apart_tiles_exceed_the_canvas() {
        let dir = TempDir::new().unwrap();
        write_tile(dir.path(), &TileContents::new(0, 0)).unwrap();
        write_tile(dir.path(), &TileContents::new(0, 1 << 24)).unwrap();

        let (_messages, sink) = recorder();
        let mut pipeline = Pipeline::new(config_for(dir.path()));
        assert_matches!(pipeline.run(&sink).await, Err(MapError::ImageError(_)));
        assert!(!dir.path().join("level.png").exists());
    }

    #[tokio::test]
    async fn test_missing_world_is_an_io_error() {
        let dir = TempDir::new().unwrap();
        let mut pipeline = Pipeline::new(config_for(&dir.path().join("gone")));
        assert_matches!(pipeline.run(&LogSink).await, Err(MapError::IoError(_)));
    }

    #[tokio::test]
    async fn test_panicking_rasterizer_fails_the_run() {
        struct Exploding;
        impl Rasterizer for Exploding {
            fn rasterize(&self, _tile: &Tile, _orientation: Orientation) -> RgbaImage {
                panic!("rasterizer bug");
            }
        }

        let dir = TempDir::new().unwrap();
        write_tile(dir.path(), &TileContents::new(0, 0)).unwrap();
        let (_messages, sink) = recorder();
        let mut pipeline =
            Pipeline::new(config_for(dir.path())).with_rasterizer(Arc::new(Exploding));

        assert_matches!(
            pipeline.run(&sink).await,
            Err(MapError::InvariantViolation(_))
        );
        assert!(!dir.path().join("level.png").exists());
    }
}
