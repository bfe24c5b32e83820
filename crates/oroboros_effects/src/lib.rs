//! # OROBOROS Effects
//!
//! Frame effects built on keyed pools, one per creation strategy:
//! - [`DecalSystem`]: factory-built decals that fade and retire on a timer
//! - [`SparkEmitter`]: ballistic sparks found on the duplicated template
//! - [`TileStreamer`]: bare tile nodes streamed around a focus point
//!
//! Every system follows the same frame shape: items update themselves,
//! expired items ask to be recycled, and the system flushes those requests
//! once the update pass is done.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod countdown;
pub mod decal;
pub mod error;
mod placement;
pub mod spark;
pub mod tiles;

pub use countdown::Countdown;
pub use decal::{Decal, DecalSystem, DECAL_LIFETIME};
pub use error::{EffectsError, EffectsResult};
pub use spark::{Spark, SparkEmitter, SparkSettings, GRAVITY};
pub use tiles::{TileCoord, TileSettings, TileStreamer, TileUpdate, MAX_RADIUS};
