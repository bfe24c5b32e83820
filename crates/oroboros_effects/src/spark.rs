//! # Sparks
//!
//! Short-lived ballistic particles. The [`Spark`] behaviour lives on the
//! template node; every duplicate carries its own copy, which the pool
//! takes over through the behaviour-lookup strategy.
//!
//! Launch parameters are drawn from [`SparkSettings`] with a seeded
//! xorshift generator, so a burst is reproducible for a given seed.

use oroboros_pool::{
    Attached, BehaviourLookup, KeyedResourcePool, PoolCallback, PoolConfig, PoolMember, Recycler,
};
use oroboros_scene::{Behaviour, NodeId, Position, SceneTree};
use tracing::debug;

use crate::error::{EffectsError, EffectsResult};
use crate::placement::set_world_position;

/// Gravity applied to sparks (m/s², Y axis).
pub const GRAVITY: f32 = -9.8;

/// Seed used when a zero seed is configured (xorshift would stay at zero).
const FALLBACK_SEED: u64 = 0x9E37_79B9_7F4A_7C15;

/// A pooled spark particle.
#[derive(Clone, Debug)]
pub struct Spark {
    node: NodeId,
    velocity: Position,
    /// Seconds since launch.
    age: f32,
    lifetime: f32,
    gravity: f32,
    member: PoolMember<u32>,
}

impl Spark {
    /// Creates an unlaunched spark.
    #[must_use]
    pub fn new(gravity: f32) -> Self {
        Self {
            node: NodeId::NULL,
            velocity: Position::ZERO,
            age: 0.0,
            lifetime: 0.0,
            gravity,
            member: PoolMember::new(),
        }
    }

    /// Starts the flight.
    pub fn launch(&mut self, velocity: Position, lifetime: f32) {
        self.velocity = velocity;
        self.lifetime = lifetime;
        self.age = 0.0;
    }

    /// Moves the spark by `delta_time` seconds of flight.
    ///
    /// Requests its own recycle once its lifetime is over.
    ///
    /// # Errors
    ///
    /// Returns a scene error if the spark node is stale, or a pool error if
    /// its pool is gone.
    pub fn tick(&mut self, scene: &mut SceneTree, delta_time: f32) -> EffectsResult<()> {
        self.velocity.y += self.gravity * delta_time;
        let position = scene.position(self.node)? + self.velocity.scale(delta_time);
        scene.set_position(self.node, position)?;

        self.age += delta_time;
        if self.age >= self.lifetime {
            self.member.request_recycle()?;
        }
        Ok(())
    }

    /// Node the spark moves.
    #[inline]
    #[must_use]
    pub const fn node(&self) -> NodeId {
        self.node
    }

    /// Current velocity.
    #[inline]
    #[must_use]
    pub const fn velocity(&self) -> Position {
        self.velocity
    }

    /// Seconds since launch.
    #[inline]
    #[must_use]
    pub const fn age(&self) -> f32 {
        self.age
    }

    /// Flight duration in seconds.
    #[inline]
    #[must_use]
    pub const fn lifetime(&self) -> f32 {
        self.lifetime
    }
}

impl Default for Spark {
    fn default() -> Self {
        Self::new(GRAVITY)
    }
}

impl Behaviour for Spark {
    fn on_attach(&mut self, node: NodeId) {
        self.node = node;
    }
}

impl Attached<SceneTree> for Spark {
    fn handle(&self) -> NodeId {
        self.node
    }
}

impl PoolCallback<u32> for Spark {
    fn on_pool_create(&mut self, recycler: Recycler<u32>) {
        self.member.bind(recycler);
    }

    fn on_pool_spawn(&mut self, key: u32) {
        self.age = 0.0;
        self.member.activate(key);
    }

    fn on_pool_recycle(&mut self) {
        self.velocity = Position::ZERO;
        self.member.deactivate();
    }

    fn on_pool_dispose(&mut self) {
        self.member.release();
    }
}

/// Launch ranges for a [`SparkEmitter`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SparkSettings {
    /// Minimum lifetime in seconds.
    pub lifetime_min: f32,
    /// Maximum lifetime in seconds.
    pub lifetime_max: f32,
    /// Minimum initial velocity.
    pub velocity_min: Position,
    /// Maximum initial velocity.
    pub velocity_max: Position,
    /// Random seed.
    pub seed: u64,
}

impl Default for SparkSettings {
    fn default() -> Self {
        Self {
            lifetime_min: 1.0,
            lifetime_max: 2.0,
            velocity_min: Position::new(-1.0, 0.0, -1.0),
            velocity_max: Position::new(1.0, 5.0, 1.0),
            seed: FALLBACK_SEED,
        }
    }
}

impl SparkSettings {
    /// Checks the ranges.
    ///
    /// # Errors
    ///
    /// Returns [`EffectsError::InvalidSettings`] if the lifetime is not
    /// positive or any range is inverted.
    pub fn validate(&self) -> EffectsResult<()> {
        if self.lifetime_min.is_nan() || self.lifetime_min <= 0.0 {
            return Err(EffectsError::InvalidSettings(format!(
                "spark lifetime_min must be positive, got {}",
                self.lifetime_min
            )));
        }
        let ranges = [
            ("lifetime", self.lifetime_min, self.lifetime_max),
            ("velocity.x", self.velocity_min.x, self.velocity_max.x),
            ("velocity.y", self.velocity_min.y, self.velocity_max.y),
            ("velocity.z", self.velocity_min.z, self.velocity_max.z),
        ];
        for (name, min, max) in ranges {
            if min.is_nan() || max.is_nan() || min > max {
                return Err(EffectsError::InvalidSettings(format!(
                    "spark {name} range is inverted ({min} > {max})"
                )));
            }
        }
        Ok(())
    }
}

/// Emits bursts of pooled sparks.
///
/// # Example
///
/// ```rust,ignore
/// scene.attach_behaviour(template, Spark::default())?;
/// let mut sparks = SparkEmitter::new(&mut scene, template, &config, SparkSettings::default())?;
///
/// sparks.burst(&mut scene, impact, 16)?;
/// let retired = sparks.tick(&mut scene, dt)?;
/// ```
#[derive(Debug)]
pub struct SparkEmitter {
    pool: KeyedResourcePool<SceneTree, u32, BehaviourLookup<Spark>>,
    settings: SparkSettings,
    /// Next key handed out. Wraps around.
    next_key: u32,
    /// Xorshift state. Never zero.
    rng: u64,
}

impl SparkEmitter {
    /// Creates an emitter over `template`, which must carry a [`Spark`].
    ///
    /// # Errors
    ///
    /// Returns [`EffectsError::InvalidSettings`] for bad launch ranges, or a
    /// pool error for an invalid configuration or a failed prewarm.
    pub fn new(
        scene: &mut SceneTree,
        template: NodeId,
        config: &PoolConfig,
        settings: SparkSettings,
    ) -> EffectsResult<Self> {
        settings.validate()?;
        let pool = KeyedResourcePool::new(scene, template, BehaviourLookup::new(), config)?;
        let rng = if settings.seed == 0 {
            FALLBACK_SEED
        } else {
            settings.seed
        };
        Ok(Self {
            pool,
            settings,
            next_key: 0,
            rng,
        })
    }

    /// Launches `count` sparks from `origin`.
    ///
    /// # Errors
    ///
    /// Returns the first error raised while spawning or placing a spark.
    /// Sparks launched before the error stay live.
    pub fn burst(
        &mut self,
        scene: &mut SceneTree,
        origin: Position,
        count: usize,
    ) -> EffectsResult<()> {
        for _ in 0..count {
            let velocity = Position::new(
                self.sample(self.settings.velocity_min.x, self.settings.velocity_max.x),
                self.sample(self.settings.velocity_min.y, self.settings.velocity_max.y),
                self.sample(self.settings.velocity_min.z, self.settings.velocity_max.z),
            );
            let lifetime = self.sample(self.settings.lifetime_min, self.settings.lifetime_max);
            let key = self.take_key();

            let spark = self.pool.spawn(scene, key)?;
            spark.launch(velocity, lifetime);
            let node = spark.node();
            set_world_position(scene, node, origin)?;
        }
        debug!("Spark burst: {} launched, {} live", count, self.pool.len());
        Ok(())
    }

    /// Advances every live spark and retires the expired ones.
    ///
    /// Returns the number of sparks retired.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by a spark.
    pub fn tick(&mut self, scene: &mut SceneTree, delta_time: f32) -> EffectsResult<usize> {
        for spark in self.pool.values_mut() {
            spark.tick(scene, delta_time)?;
        }
        Ok(self.pool.flush_recycle_requests(scene))
    }

    /// Iterates the live sparks.
    pub fn iter(&self) -> impl Iterator<Item = &Spark> {
        self.pool.values()
    }

    /// Number of live sparks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pool.len()
    }

    /// Checks if no spark is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }

    /// Number of retired sparks waiting for reuse.
    #[must_use]
    pub fn available_count(&self) -> usize {
        self.pool.available_count()
    }

    /// Number of spark nodes ever duplicated.
    #[must_use]
    pub const fn created_count(&self) -> usize {
        self.pool.created_count()
    }

    /// Retires every live spark.
    pub fn clear(&mut self, scene: &mut SceneTree) {
        self.pool.clear_all(scene);
    }

    /// Tears the emitter down, destroying every spark node.
    pub fn dispose(self, scene: &mut SceneTree) {
        self.pool.dispose(scene);
    }

    /// Returns the next free key.
    fn take_key(&mut self) -> u32 {
        while self.pool.contains(&self.next_key) {
            self.next_key = self.next_key.wrapping_add(1);
        }
        let key = self.next_key;
        self.next_key = self.next_key.wrapping_add(1);
        key
    }

    /// Uniform sample in `[min, max)`.
    fn sample(&mut self, min: f32, max: f32) -> f32 {
        self.rng ^= self.rng << 13;
        self.rng ^= self.rng >> 7;
        self.rng ^= self.rng << 17;
        let bits = u16::try_from(self.rng >> 48).unwrap_or(u16::MAX);
        min + (max - min) * (f32::from(bits) / 65_536.0)
    }
}
