/*
 * field.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Field metadata and tag parsing for mergeable records.
//!
//! `#[derive(Merge)]` emits one [`FieldDescriptor`] per mergeable field. The
//! descriptor carries the field's declared type and its raw tag string; the
//! tag is only interpreted here, by [`parse_field`].
//!
//! ## Tag Syntax
//!
//! Tags are comma-separated tokens: `"final"`, `"optional,mustoverride"`.
//! Whitespace around tokens is ignored, as are empty tokens. Recognized
//! tokens are [`FIELD_TAG_OPTIONAL`], [`FIELD_TAG_FINAL`] and
//! [`FIELD_TAG_MUST_OVERRIDE`]; anything else is kept in [`FieldInfo::tags`]
//! but has no effect on merging.

use crate::traverse::Merge;
use crate::types::Kind;
use std::any::{TypeId, type_name};

/// Tag token marking a field as optional.
pub const FIELD_TAG_OPTIONAL: &str = "optional";

/// Tag token marking a field as final: never touched by merge or environment.
pub const FIELD_TAG_FINAL: &str = "final";

/// Tag token marking a field that must be overridden.
pub const FIELD_TAG_MUST_OVERRIDE: &str = "mustoverride";

/// Static description of one record field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Field name used for metadata and environment lookup
    pub name: &'static str,

    /// Declared type of the field
    pub type_name: &'static str,

    /// Identity of the declared type
    pub type_id: TypeId,

    /// Structural kind of the declared type
    pub kind: Kind,

    /// Raw tag string, if the field carries one
    pub tag: Option<&'static str>,
}

impl FieldDescriptor {
    /// Describe a field of type `T`.
    pub fn of<T: Merge>(name: &'static str, tag: Option<&'static str>) -> Self {
        Self {
            name,
            type_name: type_name::<T>(),
            type_id: TypeId::of::<T>(),
            kind: T::KIND,
            tag,
        }
    }
}

/// Parsed metadata for a record field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldInfo {
    pub name: &'static str,
    pub tags: Vec<String>,
    pub type_name: &'static str,
    pub type_id: TypeId,
    pub kind: Kind,
    pub optional: bool,
    pub is_final: bool,
    pub complex: bool,
    pub must_override: bool,
}

/// Parse a field descriptor into field metadata.
///
/// This is where tags are interpreted. The result depends only on the
/// descriptor, so callers are free to cache it per type.
pub fn parse_field(descriptor: &FieldDescriptor) -> FieldInfo {
    let mut info = FieldInfo {
        name: descriptor.name,
        tags: Vec::new(),
        type_name: descriptor.type_name,
        type_id: descriptor.type_id,
        kind: descriptor.kind,
        optional: false,
        is_final: false,
        complex: descriptor.kind.is_complex(),
        must_override: false,
    };

    let Some(tag) = descriptor.tag else {
        return info;
    };

    for token in tag.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        match token {
            FIELD_TAG_OPTIONAL => info.optional = true,
            FIELD_TAG_FINAL => info.is_final = true,
            FIELD_TAG_MUST_OVERRIDE => info.must_override = true,
            unknown => {
                tracing::trace!(field = info.name, token = unknown, "Ignoring unknown field tag");
            }
        }
        info.tags.push(token.to_string());
    }

    info
}
