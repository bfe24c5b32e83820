//! Minimal in-memory attachment host for unit tests.

use std::cell::Cell;
use std::rc::Rc;

use crate::attach::{Attached, AttachmentHost, BehaviourHost};
use crate::error::{PoolError, PoolResult};
use crate::lifecycle::{PoolCallback, PoolMember, Recycler};

#[derive(Debug)]
struct MockNode {
    name: String,
    parent: Option<u32>,
    children: Vec<u32>,
    enabled: bool,
    alive: bool,
    probe: bool,
}

/// Flat node list; handles are indices.
#[derive(Debug, Default)]
pub struct MockHost {
    nodes: Vec<MockNode>,
    roots: Vec<u32>,
}

impl MockHost {
    pub fn new() -> Self {
        Self::default()
    }

    #[allow(clippy::cast_possible_truncation)]
    pub fn add_node(&mut self, name: &str, parent: Option<u32>) -> u32 {
        let handle = self.nodes.len() as u32;
        self.nodes.push(MockNode {
            name: name.to_string(),
            parent,
            children: Vec::new(),
            enabled: true,
            alive: true,
            probe: false,
        });
        self.siblings_mut(parent).push(handle);
        handle
    }

    pub fn attach_probe(&mut self, handle: u32) {
        self.nodes[handle as usize].probe = true;
    }

    pub fn name(&self, handle: u32) -> &str {
        &self.nodes[handle as usize].name
    }

    pub fn is_enabled(&self, handle: u32) -> bool {
        self.nodes[handle as usize].enabled
    }

    pub fn is_alive(&self, handle: u32) -> bool {
        self.nodes[handle as usize].alive
    }

    pub fn alive_count(&self) -> usize {
        self.nodes.iter().filter(|node| node.alive).count()
    }

    pub fn children(&self, parent: Option<u32>) -> &[u32] {
        match parent {
            Some(parent) => &self.nodes[parent as usize].children,
            None => &self.roots,
        }
    }

    fn siblings_mut(&mut self, parent: Option<u32>) -> &mut Vec<u32> {
        match parent {
            Some(parent) => &mut self.nodes[parent as usize].children,
            None => &mut self.roots,
        }
    }

    fn detach(&mut self, handle: u32) {
        let parent = self.nodes[handle as usize].parent;
        self.siblings_mut(parent).retain(|&child| child != handle);
    }
}

impl AttachmentHost for MockHost {
    type Handle = u32;

    #[allow(clippy::cast_possible_truncation)]
    fn instantiate(&mut self, template: u32, parent: Option<u32>) -> PoolResult<u32> {
        let Some(source) = self.nodes.get(template as usize).filter(|node| node.alive) else {
            return Err(PoolError::Construction(format!("template {template} is gone")));
        };
        let copy = MockNode {
            name: source.name.clone(),
            parent,
            children: Vec::new(),
            enabled: source.enabled,
            alive: true,
            probe: source.probe,
        };
        let handle = self.nodes.len() as u32;
        self.nodes.push(copy);
        self.siblings_mut(parent).push(handle);
        Ok(handle)
    }

    fn parent_of(&self, handle: u32) -> Option<u32> {
        self.nodes[handle as usize].parent
    }

    fn set_parent(&mut self, handle: u32, parent: Option<u32>) {
        self.detach(handle);
        self.nodes[handle as usize].parent = parent;
        self.siblings_mut(parent).push(handle);
    }

    fn set_last_sibling(&mut self, handle: u32) {
        let parent = self.nodes[handle as usize].parent;
        self.set_parent(handle, parent);
    }

    fn set_name(&mut self, handle: u32, name: &str) {
        self.nodes[handle as usize].name = name.to_string();
    }

    fn set_enabled(&mut self, handle: u32, enabled: bool) {
        self.nodes[handle as usize].enabled = enabled;
    }

    fn destroy(&mut self, handle: u32) {
        self.detach(handle);
        let children = std::mem::take(&mut self.nodes[handle as usize].children);
        for child in children {
            self.nodes[child as usize].parent = None;
            self.destroy(child);
        }
        self.nodes[handle as usize].alive = false;
    }
}

impl BehaviourHost<Probe> for MockHost {
    fn take_behaviour(&mut self, handle: u32) -> Option<Probe> {
        let node = self.nodes.get_mut(handle as usize)?;
        if !node.probe {
            return None;
        }
        node.probe = false;
        Some(Probe::new(handle))
    }
}

impl<K> PoolCallback<K> for u32 {}

/// Pooled item that records every lifecycle call it receives.
#[derive(Debug)]
pub struct Probe {
    pub handle: u32,
    pub label: String,
    pub created: usize,
    pub spawns: usize,
    pub recycles: usize,
    /// Transient state; must be empty after every spawn.
    pub scratch: Vec<u32>,
    pub member: PoolMember<u32>,
    /// Shared so disposal stays observable after the pool is consumed.
    pub disposals: Rc<Cell<usize>>,
}

impl Probe {
    pub fn new(handle: u32) -> Self {
        Self {
            handle,
            label: String::new(),
            created: 0,
            spawns: 0,
            recycles: 0,
            scratch: Vec::new(),
            member: PoolMember::new(),
            disposals: Rc::new(Cell::new(0)),
        }
    }
}

impl Attached<MockHost> for Probe {
    fn handle(&self) -> u32 {
        self.handle
    }
}

impl PoolCallback<u32> for Probe {
    fn on_pool_create(&mut self, recycler: Recycler<u32>) {
        self.created += 1;
        self.member.bind(recycler);
    }

    fn on_pool_spawn(&mut self, key: u32) {
        self.spawns += 1;
        self.scratch.clear();
        self.member.activate(key);
    }

    fn on_pool_recycle(&mut self) {
        self.recycles += 1;
        self.member.deactivate();
    }

    fn on_pool_dispose(&mut self) {
        self.disposals.set(self.disposals.get() + 1);
        self.member.release();
    }
}
