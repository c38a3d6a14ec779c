/*
 * sequence.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! `Merge` for growable sequences.
//!
//! Exactly one of three policies applies per merge, checked in order:
//!
//! 1. **Replace**: the source replaces the destination when the source is
//!    non-empty (or empty sequences may overwrite), the destination is empty
//!    (or overwrite is on), and neither append nor deep copy is requested.
//! 2. **Append**: the source elements are appended to the destination.
//! 3. **Deep copy**: elements are merged pairwise over the common prefix;
//!    the rest of the longer sequence is left alone.

use crate::traverse::{Merge, MergeContext, deep_merge};
use crate::types::{Kind, MergeError};

impl<T: Merge> Merge for Vec<T> {
    const KIND: Kind = Kind::Sequence;

    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }

    fn merge_from(&mut self, src: &Self, cx: &mut MergeContext<'_>) -> Result<(), MergeError> {
        let config = cx.config();
        let src_allowed = !src.is_empty()
            || config.overwrite_with_empty_value()
            || config.overwrite_empty_sequence_with_empty_value();
        let dst_allowed = config.overwrite() || self.is_empty();

        if src_allowed
            && dst_allowed
            && !config.append_sequences()
            && !config.sequence_deep_copy()
        {
            self.clone_from(src);
        } else if config.append_sequences() {
            self.extend(src.iter().cloned());
        } else if config.sequence_deep_copy() {
            for (dst_item, src_item) in self.iter_mut().zip(src) {
                deep_merge(dst_item, src_item, cx)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        MergeConfig, MergeOption, with_append_sequence, with_override,
        with_override_empty_sequence, with_sequence_deep_copy,
    };
    use pretty_assertions::assert_eq;

    fn merged<T: Merge>(mut dst: Vec<T>, src: Vec<T>, options: &[MergeOption<'_>]) -> Vec<T> {
        let config = MergeConfig::from_options(options);
        let mut cx = MergeContext::new(&config);
        deep_merge(&mut dst, &src, &mut cx).unwrap();
        dst
    }

    #[test]
    fn test_fill_empty_destination() {
        assert_eq!(merged(vec![], vec![1, 2], &[]), vec![1, 2]);
    }

    #[test]
    fn test_default_keeps_destination() {
        assert_eq!(merged(vec![1], vec![2, 3], &[]), vec![1]);
    }

    #[test]
    fn test_override_replaces() {
        assert_eq!(merged(vec![1], vec![2, 3], &[&with_override]), vec![2, 3]);
        // Empty sources don't replace unless asked to
        assert_eq!(merged(vec![1], vec![], &[&with_override]), vec![1]);
        assert_eq!(
            merged(
                vec![1],
                vec![],
                &[&with_override, &with_override_empty_sequence]
            ),
            Vec::<i64>::new()
        );
    }

    #[test]
    fn test_append() {
        assert_eq!(
            merged(vec![1, 2, 3], vec![4, 5], &[&with_append_sequence]),
            vec![1, 2, 3, 4, 5]
        );
        assert_eq!(
            merged(
                vec![1],
                vec![2],
                &[&with_override, &with_append_sequence]
            ),
            vec![1, 2]
        );
    }

    #[test]
    fn test_deep_copy_merges_common_prefix() {
        let dst = vec!["a".to_string(), String::new(), "c".to_string()];
        let src = vec!["x".to_string(), "y".to_string()];
        assert_eq!(
            merged(dst, src, &[&with_sequence_deep_copy]),
            vec!["x".to_string(), "y".to_string(), "c".to_string()]
        );
    }

    #[test]
    fn test_deep_copy_leaves_source_tail() {
        let dst = vec![Some(1i64)];
        let src = vec![Some(5), Some(6)];
        assert_eq!(merged(dst, src, &[&with_sequence_deep_copy]), vec![Some(5)]);
    }
}
