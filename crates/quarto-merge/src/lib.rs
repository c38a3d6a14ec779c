/*
 * lib.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Deep merging of typed records.
//!
//! This crate layers an "override" value onto a "base" value of the same
//! type, field by field and recursively, under a configurable conflict
//! policy. Scalar record fields can additionally be overridden from
//! environment variables.
//!
//! # Key Features
//!
//! - **Derived records**: `#[derive(Merge)]` on any struct
//! - **Policies**: fill-only (default), overwrite, overwrite with empty
//!   values, sequence append and element-wise sequence merge
//! - **Field tags**: `final` fields are never touched, `mustoverride` fields
//!   can be required
//! - **Environment overrides**: `MSVC_<Field>` by default, or a per-record
//!   prefix with `#[merge(env_prefix = "...")]`
//! - **Cycle safety**: shared `Rc<RefCell<_>>` graphs are visited once
//!
//! # Architecture
//!
//! - [`Merge`]: implemented by every mergeable type; [`deep_merge`] is the
//!   traversal that dispatches to it
//! - [`Record`]: field-level merging, generated by the derive
//! - [`MergeConfig`]: the policy, built from option functions
//! - [`FieldRegistry`]: per-type field metadata, computed once
//! - [`AnyValue`]: a dynamically-typed slot
//!
//! # Example
//!
//! ```rust
//! use quarto_merge::{Merge, merge, with_override};
//!
//! #[derive(Debug, Clone, Default, Merge)]
//! struct Render {
//!     engine: String,
//!     #[merge(final)]
//!     output_dir: String,
//!     filters: Vec<String>,
//! }
//!
//! let mut project = Render {
//!     engine: "knitr".to_string(),
//!     output_dir: "_site".to_string(),
//!     filters: vec![],
//! };
//! let document = Render {
//!     engine: "jupyter".to_string(),
//!     output_dir: "docs".to_string(),
//!     filters: vec!["lightbox".to_string()],
//! };
//!
//! merge(&mut project, &document, &[&with_override]).unwrap();
//! assert_eq!(project.output_dir, "_site");
//! assert_eq!(project.filters, vec!["lightbox"]);
//! ```

extern crate self as quarto_merge;

mod config;
mod dynamic;
mod env;
mod field;
mod map;
mod merge;
mod pointer;
mod record;
mod registry;
mod scalar;
mod sequence;
mod traverse;
mod types;
mod visited;

pub use quarto_merge_macros::Merge;

pub use types::{Kind, MergeError, SequenceOperation};

pub use traverse::{Merge, MergeContext, deep_merge};

pub use config::{
    MergeConfig,
    MergeOption,
    TransformFn,
    TransformerMap,
    Transformers,
    with_append_sequence,
    with_environment,
    with_max_depth,
    with_must_override_check,
    with_override,
    with_override_empty_sequence,
    with_overwrite_with_empty_value,
    with_registry,
    with_sequence_deep_copy,
    with_transformers,
    with_type_check,
};

pub use env::{
    DEFAULT_ENVIRONMENT_PREFIX,
    Environment,
    Overridable,
    ProcessEnvironment,
    default_environment_name,
};

pub use field::{
    FIELD_TAG_FINAL,
    FIELD_TAG_MUST_OVERRIDE,
    FIELD_TAG_OPTIONAL,
    FieldDescriptor,
    FieldInfo,
    parse_field,
};

pub use registry::{FieldRegistry, RecordInfo};

pub use record::{FieldMerger, Record, merge_record};

pub use dynamic::{AnyValue, DynMerge};

pub use visited::{VisitKey, VisitedSet};

#[allow(deprecated)]
pub use merge::merge_with_overwrite;
pub use merge::{merge, merge_any, merge_with_config};
