/*
 * visited.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Identity tracking for cycle avoidance.
//!
//! A node is identified by its address together with its type. A record and
//! its first field can share an address, so the address alone is not enough.
//!
//! Only shared pointees are recorded. Each one is retained for the rest of
//! the merge call: an address freed mid-merge could otherwise be handed to a
//! new allocation and mistaken for a visited node.

use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::collections::HashSet;
use std::ptr;
use std::rc::Rc;

/// Identity of one destination node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VisitKey {
    addr: usize,
    ty: TypeId,
}

impl VisitKey {
    /// Key for the value behind a reference.
    pub fn of<T: 'static>(value: &T) -> Self {
        Self::from_ptr(ptr::from_ref(value).cast_mut())
    }

    /// Key for the value behind a raw pointer. The pointer is never
    /// dereferenced.
    pub fn from_ptr<T: 'static>(value: *mut T) -> Self {
        Self {
            addr: value.addr(),
            ty: TypeId::of::<T>(),
        }
    }
}

/// Shared destination nodes already processed (or in progress) in one merge
/// call.
#[derive(Debug, Default)]
pub struct VisitedSet {
    keys: HashSet<VisitKey>,
    retained: Vec<Rc<dyn Any>>,
}

impl VisitedSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the pointee of `value`, keeping it alive while the set lives.
    /// Returns false if it was already recorded.
    pub fn insert_shared<T: 'static>(&mut self, value: &Rc<RefCell<T>>) -> bool {
        if !self.keys.insert(VisitKey::from_ptr(value.as_ptr())) {
            return false;
        }
        let retained: Rc<dyn Any> = Rc::<RefCell<T>>::clone(value);
        self.retained.push(retained);
        true
    }

    /// Check if a node has been recorded.
    pub fn contains(&self, key: &VisitKey) -> bool {
        self.keys.contains(key)
    }

    /// Number of recorded nodes.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Check if no node has been recorded.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
