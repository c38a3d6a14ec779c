/*
 * config.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Merge policy configuration.
//!
//! A [`MergeConfig`] is built once per merge call by applying option
//! functions, in order, to `MergeConfig::default()`. Later options win when
//! two of them touch the same flag.
//!
//! ```rust,ignore
//! merge(&mut base, &overlay, &[&with_override, &with_append_sequence])?;
//! ```

use crate::env::Environment;
use crate::registry::FieldRegistry;
use crate::traverse::Merge;
use crate::types::MergeError;
use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// An option applied to a [`MergeConfig`] before merging.
pub type MergeOption<'a> = &'a dyn Fn(&mut MergeConfig);

/// Merge function registered for a single type.
///
/// Receives the destination and source as `Any`; both hold the registered
/// type.
pub type TransformFn = dyn Fn(&mut dyn Any, &dyn Any) -> Result<(), MergeError> + Send + Sync;

/// Custom merge functions that replace default handling for specific types.
///
/// A transformer is only consulted when the destination value is not empty.
pub trait Transformers: Send + Sync {
    /// Get the merge function for a type, if there is one.
    fn transformer(&self, type_id: TypeId) -> Option<&TransformFn>;
}

/// [`Transformers`] backed by a type-indexed table.
#[derive(Default)]
pub struct TransformerMap {
    entries: HashMap<TypeId, Box<TransformFn>>,
}

impl TransformerMap {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a merge function for `T`, replacing any previous one.
    pub fn with<T, F>(mut self, transform: F) -> Self
    where
        T: Merge,
        F: Fn(&mut T, &T) -> Result<(), MergeError> + Send + Sync + 'static,
    {
        let wrapped = move |dst: &mut dyn Any, src: &dyn Any| -> Result<(), MergeError> {
            match (dst.downcast_mut::<T>(), src.downcast_ref::<T>()) {
                (Some(dst), Some(src)) => transform(dst, src),
                _ => Err(MergeError::DifferentArgumentTypes {
                    dst: type_name::<T>(),
                    src: "dyn Any",
                }),
            }
        };
        self.entries.insert(TypeId::of::<T>(), Box::new(wrapped));
        self
    }

    /// Number of registered types.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no type has a registered transformer.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Transformers for TransformerMap {
    fn transformer(&self, type_id: TypeId) -> Option<&TransformFn> {
        self.entries.get(&type_id).map(|f| f.as_ref())
    }
}

impl fmt::Debug for TransformerMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformerMap")
            .field("len", &self.entries.len())
            .finish()
    }
}

/// Policy flags and collaborators for one merge call.
#[derive(Clone, Default)]
pub struct MergeConfig {
    overwrite: bool,
    append_sequences: bool,
    type_check: bool,
    overwrite_with_empty_value: bool,
    overwrite_empty_sequence_with_empty_value: bool,
    sequence_deep_copy: bool,
    must_override_check: bool,
    max_depth: Option<usize>,
    transformers: Option<Arc<dyn Transformers>>,
    environment: Option<Arc<dyn Environment>>,
    registry: Option<Arc<FieldRegistry>>,
}

impl MergeConfig {
    /// Build a configuration by applying options in order.
    pub fn from_options(options: &[MergeOption<'_>]) -> Self {
        let mut config = Self::default();
        for option in options {
            option(&mut config);
        }
        config
    }

    /// Non-empty source values replace non-empty destination values.
    pub fn overwrite(&self) -> bool {
        self.overwrite
    }

    /// Sequences are concatenated instead of replaced.
    pub fn append_sequences(&self) -> bool {
        self.append_sequences
    }

    /// Replacing a dynamic value requires matching concrete types.
    pub fn type_check(&self) -> bool {
        self.type_check
    }

    /// Empty source values replace destination values.
    pub fn overwrite_with_empty_value(&self) -> bool {
        self.overwrite_with_empty_value
    }

    /// Empty source sequences replace destination sequences.
    pub fn overwrite_empty_sequence_with_empty_value(&self) -> bool {
        self.overwrite_empty_sequence_with_empty_value
    }

    /// Sequences are merged element by element over their common prefix.
    pub fn sequence_deep_copy(&self) -> bool {
        self.sequence_deep_copy
    }

    /// `mustoverride` fields fail the merge when nothing overrides them.
    pub fn must_override_check(&self) -> bool {
        self.must_override_check
    }

    /// Maximum nesting depth before the merge fails (unlimited if `None`).
    pub fn max_depth(&self) -> Option<usize> {
        self.max_depth
    }

    /// Custom per-type merge functions.
    pub fn transformers(&self) -> Option<&dyn Transformers> {
        self.transformers.as_deref()
    }

    /// Environment used for field overrides (the process environment if
    /// `None`).
    pub fn environment(&self) -> Option<&dyn Environment> {
        self.environment.as_deref()
    }

    /// Field registry (the global registry if `None`).
    pub fn registry(&self) -> Option<&FieldRegistry> {
        self.registry.as_deref()
    }
}

impl fmt::Debug for MergeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MergeConfig")
            .field("overwrite", &self.overwrite)
            .field("append_sequences", &self.append_sequences)
            .field("type_check", &self.type_check)
            .field("overwrite_with_empty_value", &self.overwrite_with_empty_value)
            .field(
                "overwrite_empty_sequence_with_empty_value",
                &self.overwrite_empty_sequence_with_empty_value,
            )
            .field("sequence_deep_copy", &self.sequence_deep_copy)
            .field("must_override_check", &self.must_override_check)
            .field("max_depth", &self.max_depth)
            .field("transformers", &self.transformers.is_some())
            .field("environment", &self.environment.is_some())
            .field("registry", &self.registry.is_some())
            .finish()
    }
}

/// Override non-empty destination values with non-empty source values.
pub fn with_override(config: &mut MergeConfig) {
    config.overwrite = true;
}

/// Override destination values with empty source values too.
pub fn with_overwrite_with_empty_value(config: &mut MergeConfig) {
    config.overwrite = true;
    config.overwrite_with_empty_value = true;
}

/// Override destination sequences with empty source sequences.
pub fn with_override_empty_sequence(config: &mut MergeConfig) {
    config.overwrite_empty_sequence_with_empty_value = true;
}

/// Append source sequences to destination sequences.
pub fn with_append_sequence(config: &mut MergeConfig) {
    config.append_sequences = true;
}

/// Check concrete types when overwriting dynamic values.
///
/// Only meaningful together with [`with_override`].
pub fn with_type_check(config: &mut MergeConfig) {
    config.type_check = true;
}

/// Merge sequences element by element, with overwrite.
pub fn with_sequence_deep_copy(config: &mut MergeConfig) {
    config.sequence_deep_copy = true;
    config.overwrite = true;
}

/// Fail when a `mustoverride` field is not overridden.
pub fn with_must_override_check(config: &mut MergeConfig) {
    config.must_override_check = true;
}

/// Use custom merge functions for specific types.
pub fn with_transformers(
    transformers: impl Transformers + 'static,
) -> impl Fn(&mut MergeConfig) {
    let transformers: Arc<dyn Transformers> = Arc::new(transformers);
    move |config: &mut MergeConfig| config.transformers = Some(Arc::clone(&transformers))
}

/// Read environment overrides from `environment` instead of the process.
pub fn with_environment(environment: impl Environment + 'static) -> impl Fn(&mut MergeConfig) {
    let environment: Arc<dyn Environment> = Arc::new(environment);
    move |config: &mut MergeConfig| config.environment = Some(Arc::clone(&environment))
}

/// Cache field metadata in `registry` instead of the global registry.
pub fn with_registry(registry: Arc<FieldRegistry>) -> impl Fn(&mut MergeConfig) {
    move |config: &mut MergeConfig| config.registry = Some(Arc::clone(&registry))
}

/// Fail with [`MergeError::NestingTooDeep`] past `max_depth` levels.
///
/// Nesting is unlimited by default.
pub fn with_max_depth(max_depth: usize) -> impl Fn(&mut MergeConfig) {
    move |config: &mut MergeConfig| config.max_depth = Some(max_depth)
}
