//! Script instance arena.
//!
//! Script instances reference each other (most commonly through the
//! `ancestor` property) and may form cycles. They are owned by an
//! [`InstanceHeap`] and referenced by [`InstanceId`] handles, so a cycle is
//! just two handles pointing at each other.

use crate::datum::{Datum, PropMap, ScriptRef, PROP_ANCESTOR};

/// Handle to a script instance in an [`InstanceHeap`]. The generation ties
/// the handle to one lifetime of the heap, so handles taken before a
/// [`clear`](InstanceHeap::clear) never resolve again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId {
    generation: u32,
    index: u32,
}

impl InstanceId {
    /// Position of the instance in its heap.
    pub fn index(self) -> u32 {
        self.index
    }

    /// Heap generation the handle was issued in.
    pub fn generation(self) -> u32 {
        self.generation
    }
}

/// An object created from a parent script.
#[derive(Debug, Clone, Default)]
pub struct ScriptInstance {
    /// The script the instance was created from, if any.
    pub script: Option<ScriptRef>,
    /// Properties in declaration order. `ancestor` is one of them.
    pub properties: PropMap,
}

impl ScriptInstance {
    /// Direct ancestor, when the `ancestor` property holds an instance.
    pub fn ancestor(&self) -> Option<InstanceId> {
        match self.properties.get(PROP_ANCESTOR) {
            Some(Datum::Instance(id)) => Some(*id),
            _ => None,
        }
    }
}

/// Owner of every script instance created during a run.
#[derive(Debug, Default)]
pub struct InstanceHeap {
    instances: Vec<ScriptInstance>,
    generation: u32,
}

impl InstanceHeap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a new instance and return its handle.
    pub fn alloc(&mut self, script: Option<ScriptRef>, properties: PropMap) -> InstanceId {
        let id = InstanceId {
            generation: self.generation,
            index: self.instances.len() as u32,
        };
        self.instances.push(ScriptInstance { script, properties });
        id
    }

    pub fn get(&self, id: InstanceId) -> Option<&ScriptInstance> {
        if id.generation != self.generation {
            return None;
        }
        self.instances.get(id.index as usize)
    }

    pub fn get_mut(&mut self, id: InstanceId) -> Option<&mut ScriptInstance> {
        if id.generation != self.generation {
            return None;
        }
        self.instances.get_mut(id.index as usize)
    }

    /// Direct ancestor of `id`.
    pub fn ancestor(&self, id: InstanceId) -> Option<InstanceId> {
        self.get(id).and_then(ScriptInstance::ancestor)
    }

    /// Copy an instance into a new slot. Property values are cloned as
    /// handles, so containers and ancestors are shared with the original.
    pub fn shallow_clone(&mut self, id: InstanceId) -> Option<InstanceId> {
        let source = self.get(id)?.clone();
        Some(self.alloc(source.script, source.properties))
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Drop every instance and start a new generation. Outstanding handles
    /// resolve to `None`, even once their slot is reused.
    pub fn clear(&mut self) {
        self.instances.clear();
        self.generation = self.generation.wrapping_add(1);
    }
}
