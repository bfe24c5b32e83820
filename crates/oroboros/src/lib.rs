//! # OROBOROS
//!
//! The composition root, wiring every pooling crate together.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      EffectsRuntime                          │
//! ├──────────────────────────────────────────────────────────────┤
//! │                                                              │
//! │  ┌───────────────┐   ┌───────────────┐   ┌───────────────┐   │
//! │  │ DecalSystem   │   │ SparkEmitter  │   │ TileStreamer  │   │
//! │  │ Parameterized │   │ Behaviour     │   │ Direct        │   │
//! │  └───────┬───────┘   └───────┬───────┘   └───────┬───────┘   │
//! │          │                   │                   │           │
//! │          ▼                   ▼                   ▼           │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │ KeyedResourcePool  (oroboros_pool)                     │  │
//! │  └───────────────────────────┬────────────────────────────┘  │
//! │                              ▼                               │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │ SceneTree  (oroboros_scene)      PoolRegistry          │  │
//! │  └────────────────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - `runtime`: Frame orchestration, statistics and teardown

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod runtime;

// Re-export the layers
pub use oroboros_effects as effects;
pub use oroboros_pool as pool;
pub use oroboros_scene as scene;

pub use runtime::{
    EffectsRuntime, FrameStats, FrameStatsAccumulator, RuntimeSettings, DECAL_POOL, SPARK_POOL,
    TILE_POOL,
};
