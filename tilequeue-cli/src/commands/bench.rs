//! Synthetic render benchmark.
//!
//! Builds an in-memory pool, starts one worker per software context, and
//! renders a checkerboard viewport through the full queue. With
//! `--bump-after` the viewport is panned once that many tiles have been
//! committed, which makes the remaining work of the first request stale.

use clap::Args;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tilequeue::config::{ConfigFile, MIN_TILE_SIZE};
use tilequeue::coordinator::RenderQueue;
use tilequeue::geometry::{GeoRect, PixelRect, ScreenTransform};
use tilequeue::log::NoOpLogger;
use tilequeue::pool::{MemoryTarget, RenderTarget, RenderTargetPool};
use tilequeue::render::{PaintContext, RenderContext, Rgba, SoftwareContext, TileRenderer};
use tilequeue::tile::Tiler;
use tracing::info;

use crate::error::CliError;
use crate::runner::CliRunner;

const POLL_INTERVAL: Duration = Duration::from_millis(5);
const CHECKER_COLOR: Rgba = Rgba::opaque(0x9c, 0xb4, 0xcc);

/// Arguments for `tilequeue bench`.
#[derive(Debug, Args)]
pub struct BenchArgs {
    /// Worker threads (default: [render] threads)
    #[arg(long)]
    pub threads: Option<usize>,

    /// Render targets in the pool (default: [pool] render_targets)
    #[arg(long)]
    pub targets: Option<usize>,

    /// Tile edge in pixels (default: [pool] tile_size)
    #[arg(long)]
    pub tile_size: Option<u32>,

    /// On-screen viewport width in pixels
    #[arg(long, default_value = "1024")]
    pub viewport_px: u32,

    /// Simulated drawing time per tile
    #[arg(long, default_value = "2")]
    pub render_delay_ms: u64,

    /// Pan the viewport after this many committed tiles
    #[arg(long)]
    pub bump_after: Option<u64>,

    /// Cache capacity cap (default: [cache] max_tiles, else pool size)
    #[arg(long)]
    pub cache_tiles: Option<usize>,

    /// Drop per-command worker log messages while timing
    #[arg(long)]
    pub quiet_workers: bool,
}

/// Bench parameters after merging arguments with the config file.
#[derive(Debug, Clone, PartialEq)]
struct BenchSettings {
    threads: usize,
    targets: usize,
    tile_size: u32,
    viewport_px: u32,
    render_delay: Duration,
    bump_after: Option<u64>,
    cache_tiles: Option<usize>,
    visual_scale: f64,
}

impl BenchSettings {
    fn resolve(args: &BenchArgs, config: &ConfigFile) -> Result<Self, CliError> {
        let settings = Self {
            threads: args.threads.unwrap_or(config.render.threads),
            targets: args.targets.unwrap_or(config.pool.render_targets),
            tile_size: args.tile_size.unwrap_or(config.pool.tile_size),
            viewport_px: args.viewport_px,
            render_delay: Duration::from_millis(args.render_delay_ms),
            bump_after: args.bump_after,
            cache_tiles: args.cache_tiles.or(config.cache.max_tiles),
            visual_scale: config.render.visual_scale,
        };

        if settings.threads == 0 {
            return Err(invalid("--threads must be > 0"));
        }
        if settings.targets == 0 {
            return Err(invalid("--targets must be > 0"));
        }
        if settings.tile_size < MIN_TILE_SIZE {
            return Err(invalid(&format!("--tile-size must be >= {}", MIN_TILE_SIZE)));
        }
        if settings.viewport_px == 0 {
            return Err(invalid("--viewport-px must be > 0"));
        }
        if settings.cache_tiles == Some(0) {
            return Err(invalid("--cache-tiles must be > 0"));
        }
        Ok(settings)
    }
}

fn invalid(msg: &str) -> CliError {
    CliError::InvalidArgument(msg.to_string())
}

/// Draws a checkerboard after a fixed delay, polling for cancellation while
/// it waits.
struct CheckerboardRenderer {
    delay: Duration,
    cell_px: f64,
}

impl TileRenderer for CheckerboardRenderer {
    fn render(
        &self,
        paint: &mut PaintContext<'_>,
        transform: &ScreenTransform,
        _visible: &GeoRect,
        draw_scale: u8,
    ) {
        let deadline = Instant::now() + self.delay;
        loop {
            if paint.is_cancelled() {
                return;
            }
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            thread::sleep((deadline - now).min(Duration::from_millis(1)));
        }

        let bounds = *transform.pixel_rect();
        let cell = (self.cell_px * paint.visual_scale()).max(1.0) as i32;
        if let Some(target) = paint.memory_target() {
            for (row, y) in (bounds.min_y..bounds.max_y).step_by(cell as usize).enumerate() {
                for (col, x) in (bounds.min_x..bounds.max_x).step_by(cell as usize).enumerate() {
                    if (row + col) % 2 == 0 {
                        let square = PixelRect::new(
                            x,
                            y,
                            (x + cell).min(bounds.max_x),
                            (y + cell).min(bounds.max_y),
                        );
                        target.fill_rect(&square, CHECKER_COLOR);
                    }
                }
            }
        }

        let (cx, cy) = transform.geo_rect().center();
        paint
            .info_layer()
            .add(format!("z{}", draw_scale), cx, cy, i32::from(draw_scale));
    }
}

/// Run the benchmark.
pub fn run(args: BenchArgs, runner: &CliRunner) -> Result<(), CliError> {
    runner.log_startup("bench");
    let settings = BenchSettings::resolve(&args, runner.config())?;

    let mut queue_config = runner.config().render_queue_config();
    if let Some(tiles) = settings.cache_tiles {
        queue_config = queue_config.with_cache_capacity(tiles);
    }
    let queue = if args.quiet_workers {
        RenderQueue::with_logger(queue_config, Arc::new(NoOpLogger))
    } else {
        RenderQueue::new(queue_config)
    };

    let invalidations = Arc::new(AtomicU64::new(0));
    {
        let invalidations = Arc::clone(&invalidations);
        queue.add_listener(move || {
            invalidations.fetch_add(1, Ordering::Relaxed);
        });
    }

    let pool = RenderTargetPool::new(
        (0..settings.targets)
            .map(|i| {
                Box::new(MemoryTarget::new(i, settings.tile_size, settings.tile_size))
                    as Box<dyn RenderTarget>
            })
            .collect(),
    );
    let contexts: Vec<Arc<dyn RenderContext>> = (0..settings.threads)
        .map(|_| Arc::new(SoftwareContext::new()) as Arc<dyn RenderContext>)
        .collect();

    let renderer: Arc<dyn TileRenderer> = Arc::new(CheckerboardRenderer {
        delay: settings.render_delay,
        cell_px: 16.0,
    });

    let tiler = Tiler::default();
    let viewport = GeoRect::new(-45.0, -45.0, 45.0, 45.0);
    let tile_scale = tiler.tile_scale_for(&viewport, settings.viewport_px, settings.tile_size);

    queue.start(contexts, pool.clone(), settings.visual_scale)?;
    info!(?settings, tile_scale, "Benchmark started");

    let started = Instant::now();
    queue.request_viewport(Arc::clone(&renderer), &tiler, &viewport, tile_scale, tile_scale);

    if let Some(bump_after) = settings.bump_after {
        wait_while(|| queue.stats().committed < bump_after && !is_idle(&queue));
        let tile_width = tiler.world().width() / f64::from(1u32 << tile_scale);
        let shift = tile_width / 2.0;
        let panned = GeoRect::new(
            viewport.min_x() + shift,
            viewport.min_y(),
            viewport.max_x() + shift,
            viewport.max_y(),
        );
        let sequence = queue.request_viewport(renderer, &tiler, &panned, tile_scale, tile_scale);
        info!(sequence, "Viewport panned");
    }

    wait_while(|| !is_idle(&queue));
    let elapsed = started.elapsed();

    let stats = queue.stats();
    let cache_stats = queue.tile_cache().lock().stats();
    queue.stop();

    println!("tilequeue bench");
    println!("  Threads:       {}", settings.threads);
    println!("  Targets:       {} x {}px", settings.targets, settings.tile_size);
    println!("  Tile scale:    {}", tile_scale);
    println!("  Elapsed:       {:.1} ms", elapsed.as_secs_f64() * 1000.0);
    println!("  Peak targets:  {}", pool.peak_outstanding());
    println!("  Invalidations: {}", invalidations.load(Ordering::Relaxed));
    println!();
    print!("{}", stats.format());
    println!();
    print!("{}", cache_stats.format());

    info!(
        committed = stats.committed,
        stale = stats.stale,
        elapsed_ms = elapsed.as_millis() as u64,
        "Benchmark finished"
    );
    Ok(())
}

/// True once every submitted command has been handled and nothing is
/// queued or being rendered.
fn is_idle(queue: &RenderQueue) -> bool {
    let stats = queue.stats();
    stats.processed() >= stats.submitted
        && queue.pending_commands() == 0
        && queue.tile_cache().lock().reserved_count() == 0
}

fn wait_while(mut condition: impl FnMut() -> bool) {
    while condition() {
        thread::sleep(POLL_INTERVAL);
    }
}
