/*
 * registry.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Per-type field metadata registry.
//!
//! Field metadata is computed once per record type, the first time the type
//! is merged (or eagerly through [`FieldRegistry::register`]), and kept for
//! the lifetime of the registry. Entries are never evicted: the set of record
//! types a program merges is fixed at compile time.
//!
//! The registry is safe to share between threads. Merges that don't name a
//! registry use [`FieldRegistry::global`].

use crate::field::{FieldInfo, parse_field};
use crate::record::Record;
use once_cell::sync::Lazy;
use std::any::{TypeId, type_name};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

static GLOBAL_REGISTRY: Lazy<FieldRegistry> = Lazy::new(FieldRegistry::new);

/// Field metadata for one record type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordInfo {
    /// Type name of the record
    pub type_name: &'static str,

    /// Mergeable fields in declaration order
    pub fields: Vec<FieldInfo>,
}

impl RecordInfo {
    /// Compute metadata for a record type.
    pub fn describe<R: Record>() -> Self {
        Self {
            type_name: type_name::<R>(),
            fields: R::field_descriptors().iter().map(parse_field).collect(),
        }
    }

    /// Check if the record has any mergeable fields.
    ///
    /// Records without mergeable fields are merged as a single value.
    pub fn has_mergeable_fields(&self) -> bool {
        !self.fields.is_empty()
    }

    /// Look up a field by its registered name.
    pub fn field(&self, name: &str) -> Option<&FieldInfo> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Registry of record field metadata, keyed by type.
#[derive(Debug, Default)]
pub struct FieldRegistry {
    records: RwLock<HashMap<TypeId, Arc<RecordInfo>>>,
}

impl FieldRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry used when a merge doesn't supply its own.
    pub fn global() -> &'static FieldRegistry {
        &GLOBAL_REGISTRY
    }

    /// Get the metadata for `R`, computing and caching it on first use.
    pub fn register<R: Record>(&self) -> Arc<RecordInfo> {
        let key = TypeId::of::<R>();
        if let Some(info) = self.read().get(&key) {
            return Arc::clone(info);
        }

        let info = Arc::new(RecordInfo::describe::<R>());
        tracing::debug!(
            record = info.type_name,
            fields = info.fields.len(),
            "Registered record field metadata"
        );

        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(records.entry(key).or_insert(info))
    }

    /// Get the cached metadata for `R`, if it has been registered.
    pub fn get<R: Record>(&self) -> Option<Arc<RecordInfo>> {
        self.read().get(&TypeId::of::<R>()).cloned()
    }

    /// Check if `R` has been registered.
    pub fn contains<R: Record>(&self) -> bool {
        self.read().contains_key(&TypeId::of::<R>())
    }

    /// Number of registered record types.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Check if no record type has been registered.
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<TypeId, Arc<RecordInfo>>> {
        self.records.read().unwrap_or_else(PoisonError::into_inner)
    }
}
