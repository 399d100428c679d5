//! Property lookup along `ancestor` links.
//!
//! Every walk visits at most [`MAX_ANCESTOR_DEPTH`] instances and then gives
//! up quietly, so cyclic chains terminate like missing properties do.

use lingo_common::{Datum, InstanceHeap, InstanceId};

/// Maximum number of instances one walk visits.
pub const MAX_ANCESTOR_DEPTH: usize = 100;

/// Iterator over an instance and its ancestors, nearest first.
pub struct Chain<'a> {
    heap: &'a InstanceHeap,
    next: Option<InstanceId>,
    visited: usize,
}

impl Iterator for Chain<'_> {
    type Item = InstanceId;

    fn next(&mut self) -> Option<InstanceId> {
        if self.visited >= MAX_ANCESTOR_DEPTH {
            return None;
        }
        let current = self.next?;
        self.heap.get(current)?;
        self.visited += 1;
        self.next = self.heap.ancestor(current);
        Some(current)
    }
}

/// Walk `start` and its ancestors.
pub fn chain(heap: &InstanceHeap, start: InstanceId) -> Chain<'_> {
    Chain {
        heap,
        next: Some(start),
        visited: 0,
    }
}

/// Closest instance on the chain that declares `name`.
pub fn find_owner(heap: &InstanceHeap, start: InstanceId, name: &str) -> Option<InstanceId> {
    chain(heap, start).find(|id| {
        heap.get(*id)
            .is_some_and(|inst| inst.properties.contains_key(name))
    })
}

pub fn has_property(heap: &InstanceHeap, start: InstanceId, name: &str) -> bool {
    find_owner(heap, start, name).is_some()
}

/// Value of `name` from the closest declaring instance, or void.
pub fn get_property(heap: &InstanceHeap, start: InstanceId, name: &str) -> Datum {
    find_owner(heap, start, name)
        .and_then(|owner| heap.get(owner))
        .and_then(|inst| inst.properties.get(name).cloned())
        .unwrap_or_default()
}

/// Write `name` on the instance that already declares it, or declare it on
/// `start`.
pub fn set_property(heap: &mut InstanceHeap, start: InstanceId, name: &str, value: Datum) {
    let owner = find_owner(heap, start, name).unwrap_or(start);
    if let Some(inst) = heap.get_mut(owner) {
        inst.properties.insert(name.to_string(), value);
    }
}

/// The ancestor `depth` links up. Depth 0 and below yield `None`.
pub fn ancestor_at_depth(heap: &InstanceHeap, start: InstanceId, depth: i32) -> Option<InstanceId> {
    let depth = usize::try_from(depth).ok().filter(|d| *d >= 1)?;
    let mut current = start;
    for _ in 0..depth.min(MAX_ANCESTOR_DEPTH) {
        current = heap.ancestor(current)?;
    }
    Some(current)
}

/// Number of ancestor links below `start`, capped by the walk bound.
pub fn chain_depth(heap: &InstanceHeap, start: InstanceId) -> usize {
    let mut depth = 0;
    let mut current = start;
    while depth < MAX_ANCESTOR_DEPTH {
        match heap.ancestor(current) {
            Some(next) => {
                depth += 1;
                current = next;
            }
            None => break,
        }
    }
    depth
}
