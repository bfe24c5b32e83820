//! # OROBOROS Scene
//!
//! A small scene graph that pooled objects attach to:
//! - Generational [`NodeId`]s (stale ids are rejected)
//! - Named, enable-able nodes with ordered children
//! - Cloneable [`Behaviour`] components
//!
//! [`SceneTree`] implements the pool's attachment capabilities, so any
//! `KeyedResourcePool` can park, reorder and rename its items in the scene.
//!
//! ## Example
//!
//! ```rust,ignore
//! use oroboros_pool::{Direct, KeyedResourcePool, PoolConfig};
//! use oroboros_scene::SceneTree;
//!
//! let mut scene = SceneTree::new();
//! let pools = scene.create_node("Pools", None)?;
//! let template = scene.create_node("Tile", Some(pools))?;
//! let mut tiles = KeyedResourcePool::new(&mut scene, template, Direct, &PoolConfig::named("tiles"))?;
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod behaviour;
pub mod error;
pub mod host;
pub mod node;
pub mod tree;

pub use behaviour::Behaviour;
pub use error::{SceneError, SceneResult};
pub use node::{NodeId, Position};
pub use tree::SceneTree;
