/*
 * traverse.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! The deep merge traversal.
//!
//! [`deep_merge`] is the single recursion point. Every container
//! implementation calls back into it for its children, so the depth guard
//! and transformer lookup apply uniformly at every node. The per-kind
//! behavior lives in each type's [`Merge::merge_from`].
//!
//! A `&mut` path reaches each owned node exactly once, so only shared
//! pointees (`Rc<RefCell<_>>`) are tracked for cycles.

use crate::config::MergeConfig;
use crate::env::{Environment, ProcessEnvironment};
use crate::registry::FieldRegistry;
use crate::types::{Kind, MergeError};
use crate::visited::{VisitKey, VisitedSet};
use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::rc::Rc;

static PROCESS_ENVIRONMENT: ProcessEnvironment = ProcessEnvironment;

/// A type that can be deep-merged with another value of the same type.
///
/// Implemented for scalars, standard containers and [`AnyValue`](crate::AnyValue);
/// use `#[derive(Merge)]` for records.
pub trait Merge: Clone + 'static {
    /// Structural kind, used for field metadata and dispatch decisions.
    const KIND: Kind;

    /// Check if the value is the zero value of its type.
    fn is_empty_value(&self) -> bool;

    /// Check if the value is an absent optional or dynamic value.
    fn is_nil(&self) -> bool {
        false
    }

    /// Merge `src` into `self` according to the policy in `cx`.
    ///
    /// Containers must recurse through [`deep_merge`], never by calling
    /// `merge_from` on their children directly.
    fn merge_from(&mut self, src: &Self, cx: &mut MergeContext<'_>) -> Result<(), MergeError>;

    /// Parse a value from the environment variable `name`.
    ///
    /// Only scalar types (and wrappers of scalars) read the environment.
    fn from_env(_name: &str, _env: &dyn Environment) -> Option<Self> {
        None
    }

    /// Replace `self` with the value of the environment variable `name`.
    ///
    /// Returns true if a value was written.
    fn override_from_env(&mut self, name: &str, env: &dyn Environment) -> bool {
        match Self::from_env(name, env) {
            Some(value) => {
                *self = value;
                true
            }
            None => false,
        }
    }
}

/// State for one merge call.
pub struct MergeContext<'a> {
    config: &'a MergeConfig,
    registry: &'a FieldRegistry,
    environment: &'a dyn Environment,
    visited: VisitedSet,
    depth: usize,
}

impl<'a> MergeContext<'a> {
    /// Create a fresh context: empty visited set, depth zero.
    pub fn new(config: &'a MergeConfig) -> Self {
        Self {
            config,
            registry: config.registry().unwrap_or(FieldRegistry::global()),
            environment: config.environment().unwrap_or(&PROCESS_ENVIRONMENT),
            visited: VisitedSet::new(),
            depth: 0,
        }
    }

    /// The merge policy.
    pub fn config(&self) -> &'a MergeConfig {
        self.config
    }

    /// The field registry in use.
    pub fn registry(&self) -> &'a FieldRegistry {
        self.registry
    }

    /// The environment read for field overrides.
    pub fn environment(&self) -> &'a dyn Environment {
        self.environment
    }

    /// Current nesting depth.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Check if a shared pointee has been recorded, without recording it.
    pub fn is_visited(&self, key: &VisitKey) -> bool {
        self.visited.contains(key)
    }

    /// Record a shared pointee. Returns false if it was already recorded.
    ///
    /// The pointee is kept alive until the merge call ends, so its address
    /// can't be reused by another allocation in the meantime.
    pub fn visit_shared<T: 'static>(&mut self, value: &Rc<RefCell<T>>) -> bool {
        self.visited.insert_shared(value)
    }
}

/// Merge `src` into `dst`, recursively.
pub fn deep_merge<T: Merge>(
    dst: &mut T,
    src: &T,
    cx: &mut MergeContext<'_>,
) -> Result<(), MergeError> {
    let config = cx.config;
    if let Some(max_depth) = config.max_depth()
        && cx.depth > max_depth
    {
        return Err(MergeError::NestingTooDeep { max_depth });
    }

    if let Some(transformers) = config.transformers()
        && !dst.is_empty_value()
        && let Some(transform) = transformers.transformer(TypeId::of::<T>())
    {
        tracing::debug!(ty = std::any::type_name::<T>(), "Running transformer");
        return transform(dst as &mut dyn Any, src as &dyn Any);
    }

    cx.depth += 1;
    let result = dst.merge_from(src, cx);
    cx.depth -= 1;
    result
}
