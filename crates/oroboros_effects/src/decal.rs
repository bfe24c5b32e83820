//! # Decals
//!
//! Timed marks left in the scene (splats, scorch marks). Each decal fades
//! out over its lifetime, can stick to a moving node, and asks its pool to
//! recycle it when the timer runs out.
//!
//! ```text
//! spawn ──► initialize(position, stick_to)
//!   │
//!   ▼
//! tick: fade alpha, follow the stick target
//!   │  timer fired
//!   ▼
//! request_recycle ──► flushed at the end of DecalSystem::tick
//! ```

use oroboros_pool::{
    Attached, KeyedResourcePool, Parameterized, PoolCallback, PoolConfig, PoolMember, PoolResult,
    Recycler,
};
use oroboros_scene::{NodeId, Position, SceneError, SceneTree};

use crate::countdown::Countdown;
use crate::error::EffectsResult;
use crate::placement::set_world_position;

/// Default decal lifetime in seconds.
pub const DECAL_LIFETIME: f32 = 15.0;

/// A pooled decal.
#[derive(Debug)]
pub struct Decal {
    node: NodeId,
    timer: Countdown,
    /// Alpha at the start of the lifetime.
    base_alpha: f32,
    alpha: f32,
    /// Node the decal follows, if any.
    sticking: Option<NodeId>,
    /// Offset from the stick target, in scene space.
    stick_offset: Position,
    member: PoolMember<usize>,
}

impl Decal {
    /// Creates a decal attached to `node`.
    #[must_use]
    pub fn new(node: NodeId, lifetime: f32, base_alpha: f32) -> Self {
        Self {
            node,
            timer: Countdown::new(lifetime),
            base_alpha,
            alpha: base_alpha,
            sticking: None,
            stick_offset: Position::ZERO,
            member: PoolMember::new(),
        }
    }

    /// Places the decal and optionally sticks it to `stick_to`.
    ///
    /// # Errors
    ///
    /// Returns a scene error if the decal node or `stick_to` is stale.
    pub fn initialize(
        &mut self,
        scene: &mut SceneTree,
        position: Position,
        stick_to: Option<NodeId>,
    ) -> EffectsResult<()> {
        let stick_offset = match stick_to {
            Some(target) => position - scene.world_position(target)?,
            None => Position::ZERO,
        };
        set_world_position(scene, self.node, position)?;
        self.sticking = stick_to;
        self.stick_offset = stick_offset;
        Ok(())
    }

    /// Advances the decal by `delta_time` seconds.
    ///
    /// Requests its own recycle when the lifetime ends. A stick target that
    /// no longer exists is dropped.
    ///
    /// # Errors
    ///
    /// Returns a scene error if the decal node is stale, or a pool error if
    /// its pool is gone.
    pub fn tick(&mut self, scene: &mut SceneTree, delta_time: f32) -> EffectsResult<()> {
        if self.timer.tick(delta_time) {
            self.member.request_recycle()?;
        }
        self.alpha = self.base_alpha * self.timer.remaining_scale();

        let Some(target) = self.sticking else {
            return Ok(());
        };
        if !scene.contains(target) {
            self.sticking = None;
            return Ok(());
        }
        let position = scene.world_position(target)? + self.stick_offset;
        set_world_position(scene, self.node, position)?;
        Ok(())
    }

    /// Node the decal is drawn at.
    #[inline]
    #[must_use]
    pub const fn node(&self) -> NodeId {
        self.node
    }

    /// Current opacity.
    #[inline]
    #[must_use]
    pub const fn alpha(&self) -> f32 {
        self.alpha
    }

    /// Node the decal follows, if any.
    #[inline]
    #[must_use]
    pub const fn sticking(&self) -> Option<NodeId> {
        self.sticking
    }

    /// Seconds until the decal retires.
    #[inline]
    #[must_use]
    pub const fn time_left(&self) -> f32 {
        self.timer.remaining()
    }
}

impl Attached<SceneTree> for Decal {
    fn handle(&self) -> NodeId {
        self.node
    }
}

impl PoolCallback<usize> for Decal {
    fn on_pool_create(&mut self, recycler: Recycler<usize>) {
        self.member.bind(recycler);
    }

    fn on_pool_spawn(&mut self, key: usize) {
        self.member.activate(key);
        self.timer.replay();
        self.alpha = self.base_alpha;
    }

    fn on_pool_recycle(&mut self) {
        self.sticking = None;
        self.member.deactivate();
    }

    fn on_pool_dispose(&mut self) {
        self.member.release();
    }
}

type DecalFactory = Box<dyn FnMut(&mut SceneTree, NodeId) -> PoolResult<Decal>>;

/// Spawns, updates and retires decals.
///
/// # Example
///
/// ```rust,ignore
/// let mut decals = DecalSystem::new(&mut scene, template, &config, DECAL_LIFETIME)?;
///
/// decals.spawn(&mut scene, hit_point, Some(target))?;
/// let retired = decals.tick(&mut scene, dt)?;
/// ```
#[derive(Debug)]
pub struct DecalSystem {
    pool: KeyedResourcePool<SceneTree, usize, Parameterized<Decal, DecalFactory>>,
}

impl DecalSystem {
    /// Creates the system over `template`.
    ///
    /// # Arguments
    ///
    /// * `scene` - Scene holding the template
    /// * `template` - Node duplicated for every decal
    /// * `config` - Pool settings
    /// * `lifetime` - Seconds each decal stays visible
    ///
    /// # Errors
    ///
    /// Returns a pool error for an invalid configuration or a failed prewarm.
    pub fn new(
        scene: &mut SceneTree,
        template: NodeId,
        config: &PoolConfig,
        lifetime: f32,
    ) -> EffectsResult<Self> {
        let factory: DecalFactory = Box::new(move |_: &mut SceneTree, node: NodeId| {
            Ok(Decal::new(node, lifetime, 1.0))
        });
        let pool = KeyedResourcePool::new(scene, template, Parameterized::new(factory), config)?;
        Ok(Self { pool })
    }

    /// Spawns a decal at `position`, optionally stuck to `stick_to`.
    ///
    /// Returns the decal's key.
    ///
    /// # Errors
    ///
    /// Returns an error if no decal can be built or `stick_to` is stale. A
    /// stale `stick_to` is rejected before anything is spawned.
    pub fn spawn(
        &mut self,
        scene: &mut SceneTree,
        position: Position,
        stick_to: Option<NodeId>,
    ) -> EffectsResult<usize> {
        if let Some(target) = stick_to.filter(|&target| !scene.contains(target)) {
            return Err(SceneError::StaleNode(target).into());
        }
        let (key, decal) = self.pool.spawn_next(scene)?;
        if let Err(err) = decal.initialize(scene, position, stick_to) {
            self.pool.recycle(scene, &key)?;
            return Err(err);
        }
        Ok(key)
    }

    /// Advances every live decal and retires the expired ones.
    ///
    /// Returns the number of decals retired.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by a decal.
    pub fn tick(&mut self, scene: &mut SceneTree, delta_time: f32) -> EffectsResult<usize> {
        for decal in self.pool.values_mut() {
            decal.tick(scene, delta_time)?;
        }
        Ok(self.pool.flush_recycle_requests(scene))
    }

    /// Gets a live decal.
    #[must_use]
    pub fn get(&self, key: usize) -> Option<&Decal> {
        self.pool.try_get(&key)
    }

    /// Number of live decals.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pool.len()
    }

    /// Checks if no decal is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }

    /// Number of retired decals waiting for reuse.
    #[must_use]
    pub fn available_count(&self) -> usize {
        self.pool.available_count()
    }

    /// Retires every live decal.
    pub fn clear(&mut self, scene: &mut SceneTree) {
        self.pool.clear_all(scene);
    }

    /// Tears the system down, destroying every decal node.
    pub fn dispose(self, scene: &mut SceneTree) {
        self.pool.dispose(scene);
    }
}
