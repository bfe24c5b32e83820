//! # Effects Runtime
//!
//! Owns the scene, the pool registry and every effect system, and drives
//! them once per frame:
//! ```text
//! Frame N:
//! ┌──────────────────────────────────────────────────────────┐
//! │ 1. TILES                                                 │
//! │    └─ Stream the tile window around the focus point      │
//! │                                                          │
//! │ 2. DECALS                                                │
//! │    ├─ Fade, follow stick targets                         │
//! │    └─ Flush self-recycle requests                        │
//! │                                                          │
//! │ 3. SPARKS                                                │
//! │    ├─ Ballistic step                                     │
//! │    └─ Flush self-recycle requests                        │
//! │                                                          │
//! │ 4. STATS                                                 │
//! │    └─ Record FrameStats                                  │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! Teardown is explicit: [`EffectsRuntime::shutdown`] disposes decals,
//! sparks and tiles, then the registry, and hands the scene back.

use std::time::{Duration, Instant};

use oroboros_effects::{
    DecalSystem, EffectsResult, Spark, SparkEmitter, SparkSettings, TileSettings, TileStreamer,
    DECAL_LIFETIME,
};
use oroboros_pool::{PoolConfigSet, PoolRegistry};
use oroboros_scene::{NodeId, Position, SceneTree};
use tracing::{info, warn};

/// Pool name for decals in a [`PoolConfigSet`].
pub const DECAL_POOL: &str = "decals";

/// Pool name for sparks in a [`PoolConfigSet`].
pub const SPARK_POOL: &str = "sparks";

/// Pool name for tiles in a [`PoolConfigSet`].
pub const TILE_POOL: &str = "tiles";

/// Frame time above which a frame is logged as slow.
pub const MAX_FRAME_TIME: Duration = Duration::from_millis(33);

/// Effect settings for the runtime.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RuntimeSettings {
    /// Seconds a decal stays visible.
    pub decal_lifetime: f32,
    /// Spark launch ranges.
    pub sparks: SparkSettings,
    /// Tile grid.
    pub tiles: TileSettings,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            decal_lifetime: DECAL_LIFETIME,
            sparks: SparkSettings::default(),
            tiles: TileSettings::default(),
        }
    }
}

/// What one frame did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Frame number.
    pub frame: u64,
    /// Live decals after the frame.
    pub decals_live: usize,
    /// Decals retired this frame.
    pub decals_retired: usize,
    /// Live sparks after the frame.
    pub sparks_live: usize,
    /// Sparks retired this frame.
    pub sparks_retired: usize,
    /// Live tiles after the frame.
    pub tiles_live: usize,
    /// Tiles that entered the window.
    pub tiles_spawned: usize,
    /// Tiles that left the window.
    pub tiles_recycled: usize,
    /// Total frame time in microseconds.
    pub total_us: u64,
}

impl FrameStats {
    /// Live items across every system.
    #[must_use]
    pub const fn live(&self) -> usize {
        self.decals_live + self.sparks_live + self.tiles_live
    }
}

/// Accumulated statistics across frames.
#[derive(Clone, Debug)]
pub struct FrameStatsAccumulator {
    /// Total frames recorded.
    pub frames_recorded: u64,
    /// Sum of total frame times.
    pub total_us_sum: u64,
    /// Max frame time.
    pub max_frame_us: u64,
    /// Frames that exceeded [`MAX_FRAME_TIME`].
    pub frames_over_budget: u64,
    /// Most items live at the end of a frame.
    pub peak_live: usize,
    /// Items retired across every system.
    pub retired_sum: u64,
}

impl FrameStatsAccumulator {
    /// Creates a new accumulator.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            frames_recorded: 0,
            total_us_sum: 0,
            max_frame_us: 0,
            frames_over_budget: 0,
            peak_live: 0,
            retired_sum: 0,
        }
    }

    /// Records a frame's statistics.
    pub fn record(&mut self, stats: FrameStats) {
        self.frames_recorded += 1;
        self.total_us_sum += stats.total_us;
        self.max_frame_us = self.max_frame_us.max(stats.total_us);
        self.peak_live = self.peak_live.max(stats.live());
        self.retired_sum +=
            (stats.decals_retired + stats.sparks_retired + stats.tiles_recycled) as u64;

        if stats.total_us > MAX_FRAME_TIME.as_micros() as u64 {
            self.frames_over_budget += 1;
        }
    }

    /// Returns average frame time in milliseconds.
    #[must_use]
    pub fn avg_frame_ms(&self) -> f64 {
        if self.frames_recorded == 0 {
            return 0.0;
        }
        (self.total_us_sum as f64 / self.frames_recorded as f64) / 1000.0
    }
}

impl Default for FrameStatsAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

/// The effects orchestrator.
///
/// # Example
///
/// ```rust,ignore
/// let mut runtime = EffectsRuntime::new(&PoolConfigSet::from_file("pools.toml")?)?;
///
/// runtime.burst(Position::ZERO, 16)?;
/// let stats = runtime.frame(1.0 / 60.0, player_position)?;
///
/// let scene = runtime.shutdown();
/// ```
#[derive(Debug)]
pub struct EffectsRuntime {
    scene: SceneTree,
    registry: PoolRegistry,
    decals: DecalSystem,
    sparks: SparkEmitter,
    tiles: TileStreamer,
    /// Node decals can stick to.
    target: NodeId,
    /// Frame counter.
    frame_count: u64,
    stats: FrameStatsAccumulator,
}

impl EffectsRuntime {
    /// Creates a runtime with default effect settings.
    ///
    /// # Errors
    ///
    /// Returns an error if a pool configuration is invalid or a prewarm
    /// fails.
    pub fn new(pools: &PoolConfigSet) -> EffectsResult<Self> {
        Self::with_settings(pools, RuntimeSettings::default())
    }

    /// Creates a runtime.
    ///
    /// Builds the "Pools" root with one template per effect, a "Target" node
    /// for decals to stick to, and every effect system.
    ///
    /// # Arguments
    ///
    /// * `pools` - Pool configurations, looked up by [`DECAL_POOL`],
    ///   [`SPARK_POOL`] and [`TILE_POOL`]
    /// * `settings` - Effect settings
    ///
    /// # Errors
    ///
    /// Returns an error for invalid pool configurations or effect settings,
    /// or a failed prewarm.
    pub fn with_settings(pools: &PoolConfigSet, settings: RuntimeSettings) -> EffectsResult<Self> {
        let mut scene = SceneTree::new();
        let root = scene.create_node("Pools", None)?;
        let decal = scene.create_node("Decal", Some(root))?;
        let spark = scene.create_node("Spark", Some(root))?;
        scene.attach_behaviour(spark, Spark::default())?;
        let tile = scene.create_node("Tile", Some(root))?;
        let target = scene.create_node("Target", None)?;

        let decals = DecalSystem::new(
            &mut scene,
            decal,
            &pools.get(DECAL_POOL),
            settings.decal_lifetime,
        )?;
        let sparks = SparkEmitter::new(&mut scene, spark, &pools.get(SPARK_POOL), settings.sparks)?;
        let tiles = TileStreamer::new(&mut scene, tile, &pools.get(TILE_POOL), settings.tiles)?;

        info!(
            "Effects runtime ready: {} decals, {} sparks, {} tiles prewarmed",
            decals.available_count(),
            sparks.available_count(),
            tiles.available_count()
        );

        Ok(Self {
            scene,
            registry: PoolRegistry::new(),
            decals,
            sparks,
            tiles,
            target,
            frame_count: 0,
            stats: FrameStatsAccumulator::new(),
        })
    }

    /// Spawns a decal, optionally stuck to the target node.
    ///
    /// # Errors
    ///
    /// Returns an error if no decal can be built.
    pub fn spawn_decal(&mut self, position: Position, stick: bool) -> EffectsResult<usize> {
        let stick_to = stick.then_some(self.target);
        self.decals.spawn(&mut self.scene, position, stick_to)
    }

    /// Launches `count` sparks from `origin`.
    ///
    /// # Errors
    ///
    /// Returns an error if a spark cannot be spawned.
    pub fn burst(&mut self, origin: Position, count: usize) -> EffectsResult<()> {
        self.sparks.burst(&mut self.scene, origin, count)
    }

    /// Moves the target node decals stick to.
    ///
    /// # Errors
    ///
    /// Returns a scene error if the target was destroyed.
    pub fn move_target(&mut self, position: Position) -> EffectsResult<()> {
        self.scene.set_position(self.target, position)?;
        Ok(())
    }

    /// Runs one frame.
    ///
    /// # Arguments
    ///
    /// * `delta_time` - Seconds since the previous frame
    /// * `focus` - Point the tile window follows
    ///
    /// # Errors
    ///
    /// Returns the first error raised by an effect system. The frame counter
    /// still advances.
    pub fn frame(&mut self, delta_time: f32, focus: Position) -> EffectsResult<FrameStats> {
        let start = Instant::now();
        let frame = self.frame_count;
        self.frame_count += 1;

        let tiles = self.tiles.update(&mut self.scene, &mut self.registry, focus)?;
        let decals_retired = self.decals.tick(&mut self.scene, delta_time)?;
        let sparks_retired = self.sparks.tick(&mut self.scene, delta_time)?;

        let stats = FrameStats {
            frame,
            decals_live: self.decals.len(),
            decals_retired,
            sparks_live: self.sparks.len(),
            sparks_retired,
            tiles_live: self.tiles.len(),
            tiles_spawned: tiles.spawned,
            tiles_recycled: tiles.recycled,
            total_us: start.elapsed().as_micros() as u64,
        };
        self.stats.record(stats);

        if stats.total_us > MAX_FRAME_TIME.as_micros() as u64 {
            warn!(
                "Frame {} exceeded budget: {:.2}ms",
                frame,
                stats.total_us as f64 / 1000.0
            );
        }
        Ok(stats)
    }

    /// Returns the current frame count.
    #[inline]
    #[must_use]
    pub const fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Returns the accumulated statistics.
    #[must_use]
    pub const fn stats(&self) -> &FrameStatsAccumulator {
        &self.stats
    }

    /// The scene every effect lives in.
    #[must_use]
    pub const fn scene(&self) -> &SceneTree {
        &self.scene
    }

    /// Node decals stick to.
    #[inline]
    #[must_use]
    pub const fn target(&self) -> NodeId {
        self.target
    }

    /// The decal system.
    #[must_use]
    pub const fn decals(&self) -> &DecalSystem {
        &self.decals
    }

    /// The spark emitter.
    #[must_use]
    pub const fn sparks(&self) -> &SparkEmitter {
        &self.sparks
    }

    /// The tile streamer.
    #[must_use]
    pub const fn tiles(&self) -> &TileStreamer {
        &self.tiles
    }

    /// The registry lending scratch collections to the effect systems.
    #[must_use]
    pub const fn registry(&self) -> &PoolRegistry {
        &self.registry
    }

    /// Tears every pool down and hands the scene back.
    ///
    /// Decals, sparks and tiles are disposed in that order, then the
    /// registry. Only the templates and the target remain in the scene.
    #[must_use]
    pub fn shutdown(self) -> SceneTree {
        let Self {
            mut scene,
            registry,
            decals,
            sparks,
            tiles,
            frame_count,
            stats,
            ..
        } = self;

        decals.dispose(&mut scene);
        sparks.dispose(&mut scene);
        tiles.dispose(&mut scene);
        registry.dispose();

        info!(
            "Effects runtime shut down after {} frames (avg {:.3}ms, peak {} live)",
            frame_count,
            stats.avg_frame_ms(),
            stats.peak_live
        );
        scene
    }
}

#[cfg(test)]
mod tests {
    use oroboros_effects::EffectsError;
    use oroboros_pool::{PoolConfig, PoolError, MAX_PREWARM};

    use super::*;

    fn settings() -> RuntimeSettings {
        RuntimeSettings {
            decal_lifetime: 0.5,
            sparks: SparkSettings::default(),
            tiles: TileSettings {
                tile_size: 10.0,
                radius: 1,
            },
        }
    }

    #[test]
    fn test_new_builds_templates_and_prewarms() {
        let pools = PoolConfigSet::from_toml_str(
            r#"
            [pools.sparks]
            prewarm = 6
            "#,
        )
        .unwrap();
        let runtime = EffectsRuntime::with_settings(&pools, settings()).unwrap();

        assert_eq!(runtime.sparks().available_count(), 6);
        assert_eq!(runtime.decals().available_count(), 0);
        // Pools, three templates, target, six sparks
        assert_eq!(runtime.scene().len(), 11);
        assert_eq!(runtime.frame_count(), 0);
    }

    #[test]
    fn test_frame_drives_every_system() {
        let mut runtime = EffectsRuntime::with_settings(&PoolConfigSet::default(), settings()).unwrap();
        runtime.spawn_decal(Position::new(1.0, 0.0, 0.0), true).unwrap();
        runtime.burst(Position::ZERO, 4).unwrap();

        let stats = runtime.frame(0.1, Position::ZERO).unwrap();
        assert_eq!(stats.frame, 0);
        assert_eq!(stats.decals_live, 1);
        assert_eq!(stats.sparks_live, 4);
        assert_eq!(stats.tiles_live, 9);
        assert_eq!(stats.tiles_spawned, 9);
        assert_eq!(stats.live(), 14);

        // Decals expire after half a second, sparks within two
        let mut retired = (0, 0);
        for _ in 0..25 {
            let stats = runtime.frame(0.1, Position::ZERO).unwrap();
            retired.0 += stats.decals_retired;
            retired.1 += stats.sparks_retired;
        }
        assert_eq!(retired, (1, 4));
        assert_eq!(runtime.frame_count(), 26);
        assert_eq!(runtime.stats().frames_recorded, 26);
        assert_eq!(runtime.stats().peak_live, 14);
    }

    #[test]
    fn test_stuck_decal_follows_target() {
        let mut runtime = EffectsRuntime::with_settings(&PoolConfigSet::default(), settings()).unwrap();
        let key = runtime.spawn_decal(Position::new(0.0, 1.0, 0.0), true).unwrap();
        runtime.move_target(Position::new(3.0, 0.0, 0.0)).unwrap();
        runtime.frame(0.1, Position::ZERO).unwrap();

        let node = runtime.decals().get(key).unwrap().node();
        assert_eq!(runtime.scene().world_position(node), Ok(Position::new(3.0, 1.0, 0.0)));
    }

    #[test]
    fn test_shutdown_leaves_templates_only() {
        let mut runtime = EffectsRuntime::with_settings(&PoolConfigSet::default(), settings()).unwrap();
        runtime.burst(Position::ZERO, 8).unwrap();
        runtime.spawn_decal(Position::ZERO, false).unwrap();
        runtime.frame(0.1, Position::new(25.0, 0.0, 25.0)).unwrap();
        let target = runtime.target();

        let scene = runtime.shutdown();
        assert_eq!(scene.len(), 5);
        assert!(scene.contains(target));
    }

    #[test]
    fn test_invalid_pool_config_fails() {
        let mut pools = PoolConfigSet::default();
        pools.pools.insert(
            TILE_POOL.to_string(),
            PoolConfig::named(TILE_POOL).with_prewarm(MAX_PREWARM + 1),
        );
        let err = EffectsRuntime::new(&pools).unwrap_err();
        assert!(matches!(err, EffectsError::Pool(PoolError::InvalidConfig(_))));
    }

    #[test]
    fn test_accumulator_averages() {
        let mut stats = FrameStatsAccumulator::new();
        assert!(stats.avg_frame_ms().abs() < f64::EPSILON);

        for total_us in [1_000, 3_000] {
            stats.record(FrameStats {
                total_us,
                sparks_retired: 2,
                ..FrameStats::default()
            });
        }
        assert!((stats.avg_frame_ms() - 2.0).abs() < 1e-9);
        assert_eq!(stats.retired_sum, 4);
        assert_eq!(stats.max_frame_us, 3_000);
        assert_eq!(stats.frames_over_budget, 0);
    }
}
