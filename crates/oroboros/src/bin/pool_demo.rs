//! # Pool Demo
//!
//! Runs the effects runtime headless for a fixed number of frames and logs
//! what the pools did.
//!
//! ```text
//! pool_demo [pools.toml]
//! RUST_LOG=debug pool_demo crates/oroboros/config/pools.toml
//! ```

use std::process::ExitCode;

use oroboros::effects::EffectsResult;
use oroboros::pool::PoolConfigSet;
use oroboros::scene::Position;
use oroboros::EffectsRuntime;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Frames simulated.
const FRAMES: u32 = 600;

/// Fixed time step (60 FPS).
const DELTA_TIME: f32 = 1.0 / 60.0;

/// A burst and a decal every this many frames.
const EMIT_EVERY: u32 = 30;

/// Sparks per burst.
const BURST_SIZE: usize = 24;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let pools = match std::env::args().nth(1) {
        Some(path) => match PoolConfigSet::from_file(&path) {
            Ok(pools) => {
                info!("Loaded pool configuration from {}", path);
                pools
            }
            Err(err) => {
                error!("Failed to load {}: {}", path, err);
                return ExitCode::FAILURE;
            }
        },
        None => PoolConfigSet::default(),
    };

    match run(&pools) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("Demo failed: {}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(pools: &PoolConfigSet) -> EffectsResult<()> {
    let mut runtime = EffectsRuntime::new(pools)?;

    for frame in 0..FRAMES {
        // Walk the focus east, one tile every two seconds
        let t = frame as f32 * DELTA_TIME;
        let focus = Position::new(t * 8.0, 0.0, 0.0);
        runtime.move_target(focus + Position::new(0.0, 1.0, 0.0))?;

        if frame % EMIT_EVERY == 0 {
            runtime.burst(focus, BURST_SIZE)?;
            runtime.spawn_decal(focus, frame % (EMIT_EVERY * 2) == 0)?;
        }

        let stats = runtime.frame(DELTA_TIME, focus)?;
        if stats.tiles_spawned > 0 || frame % 120 == 0 {
            info!(
                "Frame {}: {} decals, {} sparks, {} tiles (+{} / -{})",
                stats.frame,
                stats.decals_live,
                stats.sparks_live,
                stats.tiles_live,
                stats.tiles_spawned,
                stats.tiles_recycled
            );
        }
    }

    let stats = runtime.stats().clone();
    info!(
        "{} frames, avg {:.3}ms, max {}us, {} over budget, peak {} live, {} retired",
        stats.frames_recorded,
        stats.avg_frame_ms(),
        stats.max_frame_us,
        stats.frames_over_budget,
        stats.peak_live,
        stats.retired_sum
    );
    info!(
        "Pooled nodes: {} decals, {} sparks, {} tiles",
        runtime.decals().len() + runtime.decals().available_count(),
        runtime.sparks().created_count(),
        runtime.tiles().len() + runtime.tiles().available_count()
    );

    let scene = runtime.shutdown();
    info!("Scene after shutdown: {} nodes", scene.len());
    Ok(())
}
