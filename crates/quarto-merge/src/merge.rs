/*
 * merge.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Merge entry points.
//!
//! Every call starts a fresh traversal: an empty visited set and depth zero.

use crate::config::{MergeConfig, MergeOption, with_override};
use crate::dynamic::AnyValue;
use crate::traverse::{Merge, MergeContext, deep_merge};
use crate::types::MergeError;

/// Fill empty values of `dst` from `src`, recursively.
///
/// The default policy never replaces a non-empty destination value; pass
/// options such as [`with_override`] or
/// [`with_append_sequence`](crate::with_append_sequence) to change that.
pub fn merge<T: Merge>(
    dst: &mut T,
    src: &T,
    options: &[MergeOption<'_>],
) -> Result<(), MergeError> {
    let config = MergeConfig::from_options(options);
    merge_with_config(dst, src, &config)
}

/// Like [`merge`], with non-empty source values replacing destination values.
#[deprecated(note = "use `merge` with `with_override`")]
pub fn merge_with_overwrite<T: Merge>(
    dst: &mut T,
    src: &T,
    options: &[MergeOption<'_>],
) -> Result<(), MergeError> {
    let mut options = options.to_vec();
    options.push(&with_override);
    merge(dst, src, &options)
}

/// Merge with a prepared configuration.
pub fn merge_with_config<T: Merge>(
    dst: &mut T,
    src: &T,
    config: &MergeConfig,
) -> Result<(), MergeError> {
    let mut cx = MergeContext::new(config);
    deep_merge(dst, src, &mut cx)
}

/// Merge two dynamically-typed values holding the same concrete type.
///
/// The held values are merged with each other, so a nil source is a no-op and
/// a nil destination is an error.
pub fn merge_any(
    dst: &mut AnyValue,
    src: &AnyValue,
    options: &[MergeOption<'_>],
) -> Result<(), MergeError> {
    let Some(dst_value) = dst.as_dyn_mut() else {
        return Err(MergeError::InvalidDestination);
    };
    let Some(src_value) = src.as_dyn() else {
        return Ok(());
    };

    if dst_value.dyn_type_id() != src_value.dyn_type_id() {
        return Err(MergeError::DifferentArgumentTypes {
            dst: dst_value.dyn_type_name(),
            src: src_value.dyn_type_name(),
        });
    }

    let config = MergeConfig::from_options(options);
    let mut cx = MergeContext::new(&config);
    dst_value.dyn_merge(src_value, &mut cx)
}
