/*
 * map.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! `Merge` for keyed collections.
//!
//! Maps are merged entry by entry, driven by the source's keys. For each
//! source entry:
//!
//! - a nil source value (`None`, a nil `AnyValue`) is copied only when
//!   overwrite is on
//! - a key missing from the destination, or holding an empty value, receives
//!   a clone of the source value
//! - records, pointers, maps, sequences and dynamic values are deep-merged in
//!   place
//! - with overwrite on, the source value is then assigned over anything that
//!   is not a pointer, map or sequence (even when the source value is empty)
//!
//! Destination keys that are absent from the source are never touched.

use crate::traverse::{Merge, MergeContext, deep_merge};
use crate::types::{Kind, MergeError};
use indexmap::IndexMap;
use std::collections::{BTreeMap, HashMap};
use std::hash::{BuildHasher, Hash};

/// Keyed storage the entry merge works against.
trait MapEntries<K, V> {
    fn entry_mut(&mut self, key: &K) -> Option<&mut V>;
    fn insert_entry(&mut self, key: K, value: V);
}

impl<K: Eq + Hash, V, S: BuildHasher> MapEntries<K, V> for HashMap<K, V, S> {
    fn entry_mut(&mut self, key: &K) -> Option<&mut V> {
        self.get_mut(key)
    }

    fn insert_entry(&mut self, key: K, value: V) {
        self.insert(key, value);
    }
}

impl<K: Ord, V> MapEntries<K, V> for BTreeMap<K, V> {
    fn entry_mut(&mut self, key: &K) -> Option<&mut V> {
        self.get_mut(key)
    }

    fn insert_entry(&mut self, key: K, value: V) {
        self.insert(key, value);
    }
}

impl<K: Eq + Hash, V, S: BuildHasher> MapEntries<K, V> for IndexMap<K, V, S> {
    fn entry_mut(&mut self, key: &K) -> Option<&mut V> {
        self.get_mut(key)
    }

    fn insert_entry(&mut self, key: K, value: V) {
        self.insert(key, value);
    }
}

fn merge_entries<'s, K, V, M>(
    dst: &mut M,
    src: impl IntoIterator<Item = (&'s K, &'s V)>,
    cx: &mut MergeContext<'_>,
) -> Result<(), MergeError>
where
    K: Clone + 's,
    V: Merge,
    M: MapEntries<K, V>,
{
    let config = cx.config();
    for (key, src_value) in src {
        if src_value.is_nil() {
            if config.overwrite() {
                dst.insert_entry(key.clone(), src_value.clone());
            }
            continue;
        }

        match dst.entry_mut(key) {
            None => dst.insert_entry(key.clone(), src_value.clone()),
            Some(dst_value) if dst_value.is_empty_value() => dst_value.clone_from(src_value),
            Some(dst_value) => {
                if !matches!(V::KIND, Kind::Scalar | Kind::Array) {
                    deep_merge(dst_value, src_value, cx)?;
                }
                if config.overwrite() && assigned_on_overwrite(V::KIND) {
                    dst_value.clone_from(src_value);
                }
            }
        }
    }
    Ok(())
}

/// Whether an existing entry of this kind is replaced outright under
/// overwrite. Pointers keep their merged pointee; maps and sequences keep
/// their merged contents.
fn assigned_on_overwrite(kind: Kind) -> bool {
    !matches!(kind, Kind::Pointer | Kind::Map | Kind::Sequence)
}

impl<K, V, S> Merge for HashMap<K, V, S>
where
    K: Eq + Hash + Clone + 'static,
    V: Merge,
    S: BuildHasher + Clone + 'static,
{
    const KIND: Kind = Kind::Map;

    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }

    fn merge_from(&mut self, src: &Self, cx: &mut MergeContext<'_>) -> Result<(), MergeError> {
        merge_entries(self, src, cx)
    }
}

impl<K, V> Merge for BTreeMap<K, V>
where
    K: Ord + Clone + 'static,
    V: Merge,
{
    const KIND: Kind = Kind::Map;

    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }

    fn merge_from(&mut self, src: &Self, cx: &mut MergeContext<'_>) -> Result<(), MergeError> {
        merge_entries(self, src, cx)
    }
}

impl<K, V, S> Merge for IndexMap<K, V, S>
where
    K: Eq + Hash + Clone + 'static,
    V: Merge,
    S: BuildHasher + Clone + 'static,
{
    const KIND: Kind = Kind::Map;

    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }

    fn merge_from(&mut self, src: &Self, cx: &mut MergeContext<'_>) -> Result<(), MergeError> {
        merge_entries(self, src, cx)
    }
}
