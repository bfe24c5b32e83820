//! # Scene Tree
//!
//! The container for all scene nodes. Destroyed slots are reused with a
//! bumped generation, so ids held past a `destroy` are rejected instead of
//! aliasing the new occupant.

use std::fmt;

use oroboros_pool::SlotId;

use crate::behaviour::{Behaviour, BehaviourSlot};
use crate::error::{SceneError, SceneResult};
use crate::node::{NodeId, Position};

/// One node slot.
struct Node {
    /// Current id of the slot (generation included).
    id: NodeId,
    /// Whether this slot is currently in use.
    alive: bool,
    name: String,
    enabled: bool,
    /// Position relative to the parent.
    position: Position,
    parent: Option<NodeId>,
    /// Ordered children; the last one is the last sibling.
    children: Vec<NodeId>,
    behaviours: Vec<Box<dyn BehaviourSlot>>,
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let behaviours: Vec<&str> = self.behaviours.iter().map(|b| b.type_name()).collect();
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("enabled", &self.enabled)
            .field("parent", &self.parent)
            .field("children", &self.children)
            .field("behaviours", &behaviours)
            .finish()
    }
}

/// A scene graph of named, enable-able nodes carrying behaviours.
///
/// # Example
///
/// ```rust,ignore
/// let mut scene = SceneTree::new();
///
/// let pools = scene.create_node("Pools", None)?;
/// let template = scene.create_node("Decal", Some(pools))?;
/// let copy = scene.instantiate(template, Some(pools))?;
/// scene.set_last_sibling(copy)?;
/// ```
#[derive(Debug, Default)]
pub struct SceneTree {
    /// All node slots ever used.
    nodes: Vec<Node>,
    /// Free list of slot indices for reuse.
    free_indices: Vec<u32>,
    /// Top-level nodes, in sibling order.
    roots: Vec<NodeId>,
    /// Number of currently alive nodes.
    alive_count: usize,
}

impl SceneTree {
    /// Creates an empty scene.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of alive nodes.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.alive_count
    }

    /// Checks if the scene has no nodes.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.alive_count == 0
    }

    /// Checks if `id` names an alive node.
    #[inline]
    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        if id.slot().is_null() {
            return false;
        }
        self.nodes
            .get(id.slot().index() as usize)
            .is_some_and(|node| node.alive && node.id == id)
    }

    fn node(&self, id: NodeId) -> SceneResult<&Node> {
        if !self.contains(id) {
            return Err(SceneError::StaleNode(id));
        }
        Ok(&self.nodes[id.slot().index() as usize])
    }

    fn node_mut(&mut self, id: NodeId) -> SceneResult<&mut Node> {
        if !self.contains(id) {
            return Err(SceneError::StaleNode(id));
        }
        Ok(&mut self.nodes[id.slot().index() as usize])
    }

    fn check_parent(&self, parent: Option<NodeId>) -> SceneResult<()> {
        match parent {
            Some(parent) => self.node(parent).map(|_| ()),
            None => Ok(()),
        }
    }

    fn siblings_mut(&mut self, parent: Option<NodeId>) -> SceneResult<&mut Vec<NodeId>> {
        match parent {
            Some(parent) => Ok(&mut self.node_mut(parent)?.children),
            None => Ok(&mut self.roots),
        }
    }

    /// Creates an enabled node at the origin as the last child of `parent`
    /// (`None` = top level).
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::StaleNode`] if `parent` is not alive.
    #[allow(clippy::cast_possible_truncation)]
    pub fn create_node(
        &mut self,
        name: impl Into<String>,
        parent: Option<NodeId>,
    ) -> SceneResult<NodeId> {
        self.check_parent(parent)?;

        let name = name.into();
        let id = if let Some(index) = self.free_indices.pop() {
            let node = &mut self.nodes[index as usize];
            // Increment generation to invalidate old references
            let id = NodeId::from_slot(node.id.slot().next_generation());
            *node = Node::fresh(id, name, parent);
            id
        } else {
            let id = NodeId::from_slot(SlotId::new(self.nodes.len() as u32, 0));
            self.nodes.push(Node::fresh(id, name, parent));
            id
        };

        self.siblings_mut(parent)?.push(id);
        self.alive_count += 1;
        Ok(id)
    }

    /// Duplicates `template` and its whole subtree as the last child of
    /// `parent`.
    ///
    /// Names, enable flags and local positions are copied. Behaviours are
    /// cloned and re-attached to the copies.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::StaleNode`] if `template` or `parent` is not
    /// alive.
    pub fn instantiate(
        &mut self,
        template: NodeId,
        parent: Option<NodeId>,
    ) -> SceneResult<NodeId> {
        let source = self.node(template)?;
        let name = source.name.clone();
        let enabled = source.enabled;
        let position = source.position;
        let children = source.children.clone();
        let behaviours: Vec<Box<dyn BehaviourSlot>> =
            source.behaviours.iter().map(|b| b.clone_slot()).collect();

        let copy = self.create_node(name, parent)?;
        let node = &mut self.nodes[copy.slot().index() as usize];
        node.enabled = enabled;
        node.position = position;
        for mut behaviour in behaviours {
            behaviour.attach(copy);
            node.behaviours.push(behaviour);
        }

        for child in children {
            self.instantiate(child, Some(copy))?;
        }
        Ok(copy)
    }

    /// Returns the parent of `node`.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::StaleNode`] if `node` is not alive.
    pub fn parent(&self, node: NodeId) -> SceneResult<Option<NodeId>> {
        Ok(self.node(node)?.parent)
    }

    /// Returns the children of `node`, in sibling order.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::StaleNode`] if `node` is not alive.
    pub fn children(&self, node: NodeId) -> SceneResult<&[NodeId]> {
        Ok(&self.node(node)?.children)
    }

    /// Returns the top-level nodes, in sibling order.
    #[must_use]
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Moves `node` under `parent` (`None` = top level) as its last child.
    ///
    /// # Errors
    ///
    /// - [`SceneError::StaleNode`] if `node` or `parent` is not alive
    /// - [`SceneError::Cycle`] if `parent` is `node` or one of its descendants
    pub fn set_parent(&mut self, node: NodeId, parent: Option<NodeId>) -> SceneResult<()> {
        let old_parent = self.node(node)?.parent;
        if let Some(new_parent) = parent {
            let mut cursor = Some(new_parent);
            while let Some(ancestor) = cursor {
                if ancestor == node {
                    return Err(SceneError::Cycle {
                        node,
                        parent: new_parent,
                    });
                }
                cursor = self.node(ancestor)?.parent;
            }
        }

        self.siblings_mut(old_parent)?.retain(|&sibling| sibling != node);
        self.siblings_mut(parent)?.push(node);
        self.node_mut(node)?.parent = parent;
        Ok(())
    }

    /// Moves `node` to the end of its siblings.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::StaleNode`] if `node` is not alive.
    pub fn set_last_sibling(&mut self, node: NodeId) -> SceneResult<()> {
        let parent = self.node(node)?.parent;
        let siblings = self.siblings_mut(parent)?;
        siblings.retain(|&sibling| sibling != node);
        siblings.push(node);
        Ok(())
    }

    /// Returns the position of `node` among its siblings.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::StaleNode`] if `node` is not alive.
    pub fn sibling_index(&self, node: NodeId) -> SceneResult<usize> {
        let siblings = match self.node(node)?.parent {
            Some(parent) => &self.node(parent)?.children,
            None => &self.roots,
        };
        siblings
            .iter()
            .position(|&sibling| sibling == node)
            .ok_or(SceneError::StaleNode(node))
    }

    /// Returns the name of `node`.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::StaleNode`] if `node` is not alive.
    pub fn name(&self, node: NodeId) -> SceneResult<&str> {
        Ok(&self.node(node)?.name)
    }

    /// Renames `node`.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::StaleNode`] if `node` is not alive.
    pub fn set_name(&mut self, node: NodeId, name: &str) -> SceneResult<()> {
        let slot = self.node_mut(node)?;
        slot.name.clear();
        slot.name.push_str(name);
        Ok(())
    }

    /// Returns the node's own enable flag.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::StaleNode`] if `node` is not alive.
    pub fn is_enabled(&self, node: NodeId) -> SceneResult<bool> {
        Ok(self.node(node)?.enabled)
    }

    /// Sets the node's own enable flag.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::StaleNode`] if `node` is not alive.
    pub fn set_enabled(&mut self, node: NodeId, enabled: bool) -> SceneResult<()> {
        self.node_mut(node)?.enabled = enabled;
        Ok(())
    }

    /// Checks if `node` and all its ancestors are enabled.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::StaleNode`] if `node` is not alive.
    pub fn is_active_in_hierarchy(&self, node: NodeId) -> SceneResult<bool> {
        let mut cursor = Some(node);
        while let Some(current) = cursor {
            let slot = self.node(current)?;
            if !slot.enabled {
                return Ok(false);
            }
            cursor = slot.parent;
        }
        Ok(true)
    }

    /// Returns the position of `node` relative to its parent.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::StaleNode`] if `node` is not alive.
    pub fn position(&self, node: NodeId) -> SceneResult<Position> {
        Ok(self.node(node)?.position)
    }

    /// Sets the position of `node` relative to its parent.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::StaleNode`] if `node` is not alive.
    pub fn set_position(&mut self, node: NodeId, position: Position) -> SceneResult<()> {
        self.node_mut(node)?.position = position;
        Ok(())
    }

    /// Returns the position of `node` in scene space.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::StaleNode`] if `node` is not alive.
    pub fn world_position(&self, node: NodeId) -> SceneResult<Position> {
        let mut total = Position::ZERO;
        let mut cursor = Some(node);
        while let Some(current) = cursor {
            let slot = self.node(current)?;
            total = total + slot.position;
            cursor = slot.parent;
        }
        Ok(total)
    }

    /// Attaches `behaviour` to `node` and runs its `on_attach`.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::StaleNode`] if `node` is not alive.
    pub fn attach_behaviour<B: Behaviour>(
        &mut self,
        node: NodeId,
        mut behaviour: B,
    ) -> SceneResult<()> {
        let slot = self.node_mut(node)?;
        behaviour.on_attach(node);
        slot.behaviours.push(Box::new(behaviour));
        Ok(())
    }

    /// Gets the `B` behaviour of `node`, if it carries one.
    #[must_use]
    pub fn behaviour<B: Behaviour>(&self, node: NodeId) -> Option<&B> {
        self.node(node)
            .ok()?
            .behaviours
            .iter()
            .find_map(|slot| slot.as_any().downcast_ref::<B>())
    }

    /// Gets the `B` behaviour of `node` mutably, if it carries one.
    pub fn behaviour_mut<B: Behaviour>(&mut self, node: NodeId) -> Option<&mut B> {
        self.node_mut(node)
            .ok()?
            .behaviours
            .iter_mut()
            .find_map(|slot| slot.as_any_mut().downcast_mut::<B>())
    }

    /// Removes the `B` behaviour from `node` and returns it.
    pub fn detach_behaviour<B: Behaviour>(&mut self, node: NodeId) -> Option<B> {
        let behaviours = &mut self.node_mut(node).ok()?.behaviours;
        let index = behaviours
            .iter()
            .position(|slot| slot.as_any().is::<B>())?;
        behaviours
            .remove(index)
            .into_any()
            .downcast::<B>()
            .ok()
            .map(|behaviour| *behaviour)
    }

    /// Destroys `node` and its whole subtree.
    ///
    /// Ids of destroyed nodes are stale afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::StaleNode`] if `node` is not alive.
    pub fn destroy(&mut self, node: NodeId) -> SceneResult<()> {
        let parent = self.node(node)?.parent;
        self.siblings_mut(parent)?.retain(|&sibling| sibling != node);
        self.release(node);
        Ok(())
    }

    /// Frees the slots of `node` and its descendants.
    fn release(&mut self, node: NodeId) {
        let slot = &mut self.nodes[node.slot().index() as usize];
        slot.alive = false;
        slot.parent = None;
        slot.behaviours.clear();
        let children = std::mem::take(&mut slot.children);

        self.free_indices.push(node.slot().index());
        self.alive_count -= 1;

        for child in children {
            self.release(child);
        }
    }
}

impl Node {
    fn fresh(id: NodeId, name: String, parent: Option<NodeId>) -> Self {
        Self {
            id,
            alive: true,
            name,
            enabled: true,
            position: Position::ZERO,
            parent,
            children: Vec::new(),
            behaviours: Vec::new(),
        }
    }
}
