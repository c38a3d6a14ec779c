/*
 * types.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Core type definitions for deep merging.

use std::fmt;
use thiserror::Error;

/// Structural kind of a mergeable type.
///
/// The traversal dispatches on the kind of the destination node. Record, map,
/// array and sequence kinds are "complex": they never receive environment
/// overrides directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    /// A struct with named fields (or an opaque struct/enum with none).
    Record,

    /// A keyed collection (`HashMap`, `BTreeMap`, `IndexMap`).
    Map,

    /// A growable sequence (`Vec`).
    Sequence,

    /// A fixed-size array, merged as a whole value.
    Array,

    /// An optional or boxed slot (`Option`, `Box`, `Rc<RefCell<_>>`).
    Pointer,

    /// A dynamically-typed slot ([`AnyValue`](crate::AnyValue)).
    Interface,

    /// Everything else: numbers, booleans, strings.
    Scalar,
}

impl Kind {
    /// Check if values of this kind are merged structurally rather than
    /// assigned as a unit.
    pub fn is_complex(self) -> bool {
        matches!(
            self,
            Kind::Record | Kind::Map | Kind::Array | Kind::Sequence
        )
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Kind::Record => "record",
            Kind::Map => "map",
            Kind::Sequence => "sequence",
            Kind::Array => "array",
            Kind::Pointer => "pointer",
            Kind::Interface => "interface",
            Kind::Scalar => "scalar",
        };
        f.write_str(name)
    }
}

/// Sequence operation that required matching element types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceOperation {
    /// Destination replaced by the source sequence.
    Override,

    /// Source sequence appended to the destination.
    Append,
}

impl fmt::Display for SequenceOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SequenceOperation::Override => f.write_str("override"),
            SequenceOperation::Append => f.write_str("append"),
        }
    }
}

/// Errors that can occur while merging.
///
/// Any error aborts the whole traversal. Fields merged before the failure
/// keep their merged values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MergeError {
    /// The destination cannot receive a merge (a nil dynamic value).
    #[error("dst must be a non-nil mutable reference")]
    InvalidDestination,

    /// Destination and source hold different concrete types.
    #[error("src and dst must be of same type (dst: {dst}, src: {src})")]
    DifferentArgumentTypes {
        /// Concrete type of the destination
        dst: &'static str,
        /// Concrete type of the source
        src: &'static str,
    },

    /// Sequences with different element types were replaced or appended.
    #[error("cannot {operation} two sequences with different type ({src}, {dst})")]
    SequenceTypeMismatch {
        /// The operation that was attempted
        operation: SequenceOperation,
        /// Concrete type of the source sequence
        src: &'static str,
        /// Concrete type of the destination sequence
        dst: &'static str,
    },

    /// Nesting exceeds the configured maximum depth.
    #[error("merge nesting too deep (max depth: {max_depth})")]
    NestingTooDeep {
        /// Maximum allowed depth
        max_depth: usize,
    },

    /// A `mustoverride` field received neither an environment value nor a
    /// non-empty source value.
    #[error("field `{field}` of `{record}` must be overridden")]
    NotOverridden {
        /// Type name of the record
        record: &'static str,
        /// Field name as registered
        field: &'static str,
    },

    /// A custom transformer reported a failure.
    #[error("transform failed: {0}")]
    Transform(String),
}

impl MergeError {
    /// Create a transformer failure from any displayable message.
    pub fn transform(message: impl fmt::Display) -> Self {
        MergeError::Transform(message.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complex_kinds() {
        assert!(Kind::Record.is_complex());
        assert!(Kind::Map.is_complex());
        assert!(Kind::Array.is_complex());
        assert!(Kind::Sequence.is_complex());

        assert!(!Kind::Pointer.is_complex());
        assert!(!Kind::Interface.is_complex());
        assert!(!Kind::Scalar.is_complex());
    }

    #[test]
    fn test_error_messages() {
        insta::assert_snapshot!(
            MergeError::InvalidDestination.to_string(),
            @"dst must be a non-nil mutable reference"
        );
        insta::assert_snapshot!(
            MergeError::NestingTooDeep { max_depth: 8 }.to_string(),
            @"merge nesting too deep (max depth: 8)"
        );
        insta::assert_snapshot!(
            MergeError::SequenceTypeMismatch {
                operation: SequenceOperation::Append,
                src: "Vec<i64>",
                dst: "Vec<String>",
            }
            .to_string(),
            @"cannot append two sequences with different type (Vec<i64>, Vec<String>)"
        );
    }

    #[test]
    fn test_transform_error() {
        let error = MergeError::transform("bad port");
        assert_eq!(error, MergeError::Transform("bad port".to_string()));
        assert_eq!(error.to_string(), "transform failed: bad port");
    }
}
