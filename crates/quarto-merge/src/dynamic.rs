/*
 * dynamic.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Dynamically-typed merge values.
//!
//! [`AnyValue`] is a nil-able slot holding any [`Merge`] type. Its concrete
//! type is only known at runtime, so merging two of them checks the
//! concrete types and reports a mismatch as an error instead of relying on
//! the compiler.

use crate::traverse::{Merge, MergeContext, deep_merge};
use crate::types::{Kind, MergeError, SequenceOperation};
use std::any::{Any, TypeId, type_name};
use std::fmt;

/// Object-safe view of a [`Merge`] type.
pub trait DynMerge: Any {
    fn dyn_kind(&self) -> Kind;
    fn dyn_type_name(&self) -> &'static str;
    fn dyn_type_id(&self) -> TypeId;
    fn dyn_is_empty(&self) -> bool;
    fn dyn_clone(&self) -> Box<dyn DynMerge>;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Merge `src` into `self`. Fails if `src` holds a different type.
    fn dyn_merge(
        &mut self,
        src: &dyn DynMerge,
        cx: &mut MergeContext<'_>,
    ) -> Result<(), MergeError>;
}

impl<T: Merge> DynMerge for T {
    fn dyn_kind(&self) -> Kind {
        T::KIND
    }

    fn dyn_type_name(&self) -> &'static str {
        type_name::<T>()
    }

    fn dyn_type_id(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn dyn_is_empty(&self) -> bool {
        self.is_empty_value()
    }

    fn dyn_clone(&self) -> Box<dyn DynMerge> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn dyn_merge(
        &mut self,
        src: &dyn DynMerge,
        cx: &mut MergeContext<'_>,
    ) -> Result<(), MergeError> {
        match src.as_any().downcast_ref::<T>() {
            Some(src) => deep_merge(self, src, cx),
            None => Err(MergeError::DifferentArgumentTypes {
                dst: type_name::<T>(),
                src: src.dyn_type_name(),
            }),
        }
    }
}

/// A nil-able value of any mergeable type.
#[derive(Default)]
pub struct AnyValue(Option<Box<dyn DynMerge>>);

impl AnyValue {
    /// Wrap a value.
    pub fn new<T: Merge>(value: T) -> Self {
        AnyValue(Some(Box::new(value)))
    }

    /// The nil value.
    pub fn nil() -> Self {
        AnyValue(None)
    }

    /// Kind of the held value, if any.
    pub fn kind(&self) -> Option<Kind> {
        self.0.as_deref().map(|v| v.dyn_kind())
    }

    /// Type name of the held value, if any.
    pub fn type_name(&self) -> Option<&'static str> {
        self.0.as_deref().map(|v| v.dyn_type_name())
    }

    /// Type of the held value, if any.
    pub fn value_type_id(&self) -> Option<TypeId> {
        self.0.as_deref().map(|v| v.dyn_type_id())
    }

    pub fn downcast_ref<T: Merge>(&self) -> Option<&T> {
        self.0.as_deref()?.as_any().downcast_ref()
    }

    pub fn downcast_mut<T: Merge>(&mut self) -> Option<&mut T> {
        self.0.as_deref_mut()?.as_any_mut().downcast_mut()
    }

    pub(crate) fn as_dyn(&self) -> Option<&dyn DynMerge> {
        self.0.as_deref()
    }

    pub(crate) fn as_dyn_mut(&mut self) -> Option<&mut dyn DynMerge> {
        self.0.as_deref_mut()
    }
}

impl Clone for AnyValue {
    fn clone(&self) -> Self {
        AnyValue(self.0.as_deref().map(|v| v.dyn_clone()))
    }
}

impl fmt::Debug for AnyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.type_name() {
            Some(name) => write!(f, "AnyValue({name})"),
            None => f.write_str("AnyValue(nil)"),
        }
    }
}

impl Merge for AnyValue {
    const KIND: Kind = Kind::Interface;

    fn is_empty_value(&self) -> bool {
        self.0.as_deref().is_none_or(|v| v.dyn_is_empty())
    }

    fn is_nil(&self) -> bool {
        self.0.is_none()
    }

    fn merge_from(&mut self, src: &Self, cx: &mut MergeContext<'_>) -> Result<(), MergeError> {
        let config = cx.config();
        let Some(src_value) = src.as_dyn() else {
            if config.overwrite_with_empty_value() {
                self.0 = None;
            }
            return Ok(());
        };

        let dst_value = match self.0.as_deref_mut() {
            Some(value) => value,
            None => {
                self.0 = Some(src_value.dyn_clone());
                return Ok(());
            }
        };

        let same_type = dst_value.dyn_type_id() == src_value.dyn_type_id();
        if config.overwrite() {
            if config.type_check() && !same_type {
                return Err(MergeError::DifferentArgumentTypes {
                    dst: dst_value.dyn_type_name(),
                    src: src_value.dyn_type_name(),
                });
            }
            self.0 = Some(src_value.dyn_clone());
            return Ok(());
        }

        let kind = dst_value.dyn_kind();
        if kind != src_value.dyn_kind() {
            return Ok(());
        }
        if same_type {
            return dst_value.dyn_merge(src_value, cx);
        }
        if kind == Kind::Sequence && (config.append_sequences() || config.type_check()) {
            let operation = if config.append_sequences() {
                SequenceOperation::Append
            } else {
                SequenceOperation::Override
            };
            return Err(MergeError::SequenceTypeMismatch {
                operation,
                src: src_value.dyn_type_name(),
                dst: dst_value.dyn_type_name(),
            });
        }
        Err(MergeError::DifferentArgumentTypes {
            dst: dst_value.dyn_type_name(),
            src: src_value.dyn_type_name(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        MergeConfig, MergeOption, with_append_sequence, with_override,
        with_overwrite_with_empty_value, with_sequence_deep_copy, with_type_check,
    };

    fn merge_values(
        dst: &mut AnyValue,
        src: &AnyValue,
        options: &[MergeOption<'_>],
    ) -> Result<(), MergeError> {
        let config = MergeConfig::from_options(options);
        let mut cx = MergeContext::new(&config);
        deep_merge(dst, src, &mut cx)
    }

    #[test]
    fn test_accessors() {
        let value = AnyValue::new(5i64);
        assert_eq!(value.kind(), Some(Kind::Scalar));
        assert_eq!(value.downcast_ref::<i64>(), Some(&5));
        assert!(value.downcast_ref::<String>().is_none());
        assert!(!value.is_nil());
        assert_eq!(format!("{:?}", value), "AnyValue(i64)");

        let nil = AnyValue::nil();
        assert!(nil.is_nil());
        assert!(nil.is_empty_value());
        assert_eq!(nil.kind(), None);
        assert_eq!(format!("{:?}", nil), "AnyValue(nil)");
    }

    #[test]
    fn test_clone_is_deep() {
        let original = AnyValue::new(vec![1i64]);
        let mut copy = original.clone();
        copy.downcast_mut::<Vec<i64>>().unwrap().push(2);
        assert_eq!(original.downcast_ref::<Vec<i64>>(), Some(&vec![1]));
    }

    #[test]
    fn test_nil_destination_takes_source() {
        let mut dst = AnyValue::nil();
        merge_values(&mut dst, &AnyValue::new("x".to_string()), &[]).unwrap();
        assert_eq!(dst.downcast_ref::<String>().map(String::as_str), Some("x"));
    }

    #[test]
    fn test_nil_source() {
        let mut dst = AnyValue::new(1i64);
        merge_values(&mut dst, &AnyValue::nil(), &[&with_override]).unwrap();
        assert_eq!(dst.downcast_ref::<i64>(), Some(&1));

        merge_values(&mut dst, &AnyValue::nil(), &[&with_overwrite_with_empty_value]).unwrap();
        assert!(dst.is_nil());
    }

    #[test]
    fn test_same_type_recurses() {
        let mut dst = AnyValue::new(vec![1i64]);
        let src = AnyValue::new(vec![2i64]);
        merge_values(&mut dst, &src, &[&with_append_sequence]).unwrap();
        assert_eq!(dst.downcast_ref::<Vec<i64>>(), Some(&vec![1, 2]));
    }

    #[test]
    fn test_overwrite_replaces_sequences_whole() {
        let mut dst = AnyValue::new(vec![1i64, 2]);
        let src = AnyValue::new(vec![3i64]);
        merge_values(&mut dst, &src, &[&with_override, &with_append_sequence]).unwrap();
        assert_eq!(dst.downcast_ref::<Vec<i64>>(), Some(&vec![3]));

        let mut dst = AnyValue::new(vec![1i64, 2]);
        merge_values(&mut dst, &src, &[&with_sequence_deep_copy]).unwrap();
        assert_eq!(dst.downcast_ref::<Vec<i64>>(), Some(&vec![3]));
    }

    #[test]
    fn test_overwrite_replaces_across_types() {
        let mut dst = AnyValue::new(1i64);
        merge_values(&mut dst, &AnyValue::new("two".to_string()), &[&with_override]).unwrap();
        assert_eq!(dst.type_name(), Some(type_name::<String>()));
    }

    #[test]
    fn test_type_check_rejects_replacement() {
        let mut dst = AnyValue::new(1i64);
        let result = merge_values(
            &mut dst,
            &AnyValue::new("two".to_string()),
            &[&with_override, &with_type_check],
        );
        assert!(matches!(
            result,
            Err(MergeError::DifferentArgumentTypes { .. })
        ));
        assert_eq!(dst.downcast_ref::<i64>(), Some(&1));
    }

    #[test]
    fn test_append_mismatched_sequences() {
        let mut dst = AnyValue::new(vec![1i64]);
        let src = AnyValue::new(vec!["a".to_string()]);
        let result = merge_values(&mut dst, &src, &[&with_append_sequence]);
        assert!(matches!(
            result,
            Err(MergeError::SequenceTypeMismatch {
                operation: SequenceOperation::Append,
                ..
            })
        ));
    }

    #[test]
    fn test_different_kinds_without_overwrite_is_a_no_op() {
        let mut dst = AnyValue::new(1i64);
        merge_values(&mut dst, &AnyValue::new(vec![2i64]), &[]).unwrap();
        assert_eq!(dst.downcast_ref::<i64>(), Some(&1));
    }

    #[test]
    fn test_same_kind_different_type_without_overwrite_fails() {
        let mut dst = AnyValue::new(1i64);
        let result = merge_values(&mut dst, &AnyValue::new("x".to_string()), &[]);
        assert!(matches!(
            result,
            Err(MergeError::DifferentArgumentTypes { .. })
        ));
    }
}
