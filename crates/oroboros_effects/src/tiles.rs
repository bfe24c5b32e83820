//! # Tile Streaming
//!
//! Keeps a square of ground tiles around a moving focus point. Tiles are
//! plain scene nodes pooled directly and keyed by their grid coordinate:
//! - Tiles leaving the square are recycled first
//! - Entering tiles reuse those nodes before new ones are duplicated
//! - Siblings are ordered so the nearest tiles are drawn last
//!
//! ```text
//!  focus moves one tile east (radius 1)
//!
//!  R . . .        R = recycled
//!  R . . S        S = spawned
//!  R . . S
//!    . . S
//! ```

use std::collections::HashSet;
use std::fmt;

use oroboros_pool::{Direct, KeyedResourcePool, PoolConfig, PoolRegistry};
use oroboros_scene::{NodeId, Position, SceneTree};
use tracing::debug;

use crate::error::{EffectsError, EffectsResult};
use crate::placement::set_world_position;

/// Largest supported streaming radius, in tiles.
pub const MAX_RADIUS: u16 = 64;

/// Tile coordinate (identifies a tile in the ground grid).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileCoord {
    /// X coordinate (in tiles).
    pub x: i32,
    /// Z coordinate (in tiles).
    pub z: i32,
}

impl TileCoord {
    /// Creates a new tile coordinate.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Converts a scene-space point to the tile containing it.
    ///
    /// Returns `None` for a non-finite point or one outside the `i32` grid.
    #[inline]
    #[must_use]
    pub fn from_world(world_x: f32, world_z: f32, tile_size: f32) -> Option<Self> {
        Some(Self {
            x: grid_index(world_x / tile_size)?,
            z: grid_index(world_z / tile_size)?,
        })
    }

    /// Returns the scene-space center of the tile.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn center(self, tile_size: f32) -> Position {
        Position::new(
            (self.x as f32 + 0.5) * tile_size,
            0.0,
            (self.z as f32 + 0.5) * tile_size,
        )
    }

    /// Returns the squared grid distance to another tile.
    #[inline]
    #[must_use]
    pub fn distance_sq(self, other: Self) -> i64 {
        let dx = i64::from(self.x) - i64::from(other.x);
        let dz = i64::from(self.z) - i64::from(other.z);
        dx * dx + dz * dz
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn grid_index(scaled: f32) -> Option<i32> {
    let cell = scaled.floor();
    // i32::MAX rounds up to 2^31 as f32, so the upper bound is exclusive
    (cell >= i32::MIN as f32 && cell < i32::MAX as f32).then(|| cell as i32)
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.z)
    }
}

/// Grid settings for a [`TileStreamer`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TileSettings {
    /// Tile edge length in scene units.
    pub tile_size: f32,
    /// Tiles kept on each side of the focus tile.
    pub radius: u16,
}

impl Default for TileSettings {
    fn default() -> Self {
        Self {
            tile_size: 16.0,
            radius: 2,
        }
    }
}

impl TileSettings {
    /// Checks the settings.
    ///
    /// # Errors
    ///
    /// Returns [`EffectsError::InvalidSettings`] for a non-positive tile size
    /// or a radius above [`MAX_RADIUS`].
    pub fn validate(&self) -> EffectsResult<()> {
        if !self.tile_size.is_finite() || self.tile_size <= 0.0 {
            return Err(EffectsError::InvalidSettings(format!(
                "tile_size must be positive, got {}",
                self.tile_size
            )));
        }
        if self.radius > MAX_RADIUS {
            return Err(EffectsError::InvalidSettings(format!(
                "radius {} exceeds {MAX_RADIUS}",
                self.radius
            )));
        }
        Ok(())
    }
}

/// What one [`TileStreamer::update`] changed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TileUpdate {
    /// Tiles that entered the square.
    pub spawned: usize,
    /// Tiles that left the square.
    pub recycled: usize,
}

/// Streams pooled tiles around a focus point.
///
/// # Example
///
/// ```rust,ignore
/// let mut tiles = TileStreamer::new(&mut scene, template, &config, TileSettings::default())?;
///
/// // Every frame
/// let update = tiles.update(&mut scene, &mut registry, player_position)?;
/// ```
#[derive(Debug)]
pub struct TileStreamer {
    pool: KeyedResourcePool<SceneTree, TileCoord, Direct>,
    settings: TileSettings,
    /// Focus tile of the last update.
    center: Option<TileCoord>,
}

impl TileStreamer {
    /// Creates a streamer over `template`.
    ///
    /// # Errors
    ///
    /// Returns [`EffectsError::InvalidSettings`] for bad grid settings, or a
    /// pool error for an invalid configuration or a failed prewarm.
    pub fn new(
        scene: &mut SceneTree,
        template: NodeId,
        config: &PoolConfig,
        settings: TileSettings,
    ) -> EffectsResult<Self> {
        settings.validate()?;
        let pool = KeyedResourcePool::new(scene, template, Direct, config)?;
        Ok(Self {
            pool,
            settings,
            center: None,
        })
    }

    /// Moves the streamed square to the tile under `focus`.
    ///
    /// Nothing changes while the focus stays on the same tile. Working sets
    /// are borrowed from `registry` and always handed back.
    ///
    /// # Errors
    ///
    /// Returns [`EffectsError::InvalidSettings`] without touching any tile
    /// when the square around `focus` does not fit the tile grid. Otherwise
    /// returns the first pool or scene error; tiles processed before the
    /// error keep their new state.
    pub fn update(
        &mut self,
        scene: &mut SceneTree,
        registry: &mut PoolRegistry,
        focus: Position,
    ) -> EffectsResult<TileUpdate> {
        let center = TileCoord::from_world(focus.x, focus.z, self.settings.tile_size)
            .filter(|coord| self.window_fits(*coord))
            .ok_or_else(|| {
                EffectsError::InvalidSettings(format!(
                    "focus ({}, {}) is outside the tile grid",
                    focus.x, focus.z
                ))
            })?;
        if self.center == Some(center) {
            return Ok(TileUpdate::default());
        }

        let scratch = registry.scratch::<TileCoord>();
        let mut wanted = scratch.spawn_set();
        let mut leaving = scratch.spawn_list();
        let result = self.stream(scene, center, &mut wanted, &mut leaving);

        let scratch = registry.scratch::<TileCoord>();
        scratch.recycle_set(wanted);
        scratch.recycle_list(leaving);

        if let Ok(update) = &result {
            debug!(
                "Tiles streamed around {}: {} spawned, {} recycled, {} live",
                center,
                update.spawned,
                update.recycled,
                self.pool.len()
            );
        }
        result
    }

    fn window_fits(&self, center: TileCoord) -> bool {
        let radius = i32::from(self.settings.radius);
        [center.x, center.z].iter().all(|&axis| {
            axis.checked_sub(radius).is_some() && axis.checked_add(radius).is_some()
        })
    }

    fn stream(
        &mut self,
        scene: &mut SceneTree,
        center: TileCoord,
        wanted: &mut HashSet<TileCoord>,
        leaving: &mut Vec<TileCoord>,
    ) -> EffectsResult<TileUpdate> {
        let radius = i32::from(self.settings.radius);
        for dx in -radius..=radius {
            for dz in -radius..=radius {
                wanted.insert(TileCoord::new(center.x + dx, center.z + dz));
            }
        }

        leaving.extend(self.pool.keys().filter(|coord| !wanted.contains(*coord)));
        for coord in &*leaving {
            self.pool.recycle(scene, coord)?;
        }

        let mut spawned = 0;
        for &coord in &*wanted {
            if self.pool.contains(&coord) {
                continue;
            }
            let node = *self.pool.spawn(scene, coord)?;
            set_world_position(scene, node, coord.center(self.settings.tile_size))?;
            spawned += 1;
        }

        // Farthest first, so the focus tile ends up last
        self.pool.sort(scene, |a, _, b, _| {
            b.distance_sq(center)
                .cmp(&a.distance_sq(center))
                .then_with(|| a.cmp(b))
        });
        self.center = Some(center);

        Ok(TileUpdate {
            spawned,
            recycled: leaving.len(),
        })
    }

    /// Node of a live tile.
    #[must_use]
    pub fn node(&self, coord: TileCoord) -> Option<NodeId> {
        self.pool.try_get(&coord).copied()
    }

    /// Checks if a tile is live.
    #[must_use]
    pub fn contains(&self, coord: TileCoord) -> bool {
        self.pool.contains(&coord)
    }

    /// Iterates the live tiles, farthest from the focus first.
    pub fn tiles(&self) -> impl Iterator<Item = TileCoord> + '_ {
        self.pool.keys().copied()
    }

    /// Focus tile of the last update.
    #[inline]
    #[must_use]
    pub const fn center(&self) -> Option<TileCoord> {
        self.center
    }

    /// Grid settings.
    #[inline]
    #[must_use]
    pub const fn settings(&self) -> &TileSettings {
        &self.settings
    }

    /// Number of live tiles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pool.len()
    }

    /// Checks if no tile is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }

    /// Number of retired tiles waiting for reuse.
    #[must_use]
    pub fn available_count(&self) -> usize {
        self.pool.available_count()
    }

    /// Retires every tile. The next update streams from scratch.
    pub fn clear(&mut self, scene: &mut SceneTree) {
        self.pool.clear_all(scene);
        self.center = None;
    }

    /// Tears the streamer down, destroying every tile node.
    pub fn dispose(self, scene: &mut SceneTree) {
        self.pool.dispose(scene);
    }
}
