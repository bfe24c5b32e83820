//! Scene-space placement shared by the effect systems.

use oroboros_scene::{NodeId, Position, SceneTree};

use crate::error::EffectsResult;

/// Moves `node` so that its scene-space position is `position`.
pub(crate) fn set_world_position(
    scene: &mut SceneTree,
    node: NodeId,
    position: Position,
) -> EffectsResult<()> {
    let origin = match scene.parent(node)? {
        Some(parent) => scene.world_position(parent)?,
        None => Position::ZERO,
    };
    scene.set_position(node, position - origin)?;
    Ok(())
}
