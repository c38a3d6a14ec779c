/*
 * scalar.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! `Merge` for scalar types and fixed-size arrays.
//!
//! Scalars are assigned as a whole: the source replaces the destination when
//! the destination is empty (or overwrite is on) and the source is non-empty
//! (or empty values may overwrite). Booleans, signed integers, `f64` and
//! `String` can also be read from the environment.

use crate::env::{Environment, lookup, parse_bool};
use crate::traverse::{Merge, MergeContext};
use crate::types::{Kind, MergeError};

/// Assign `src` to `dst` under the scalar policy.
pub(crate) fn assign_scalar<T: Merge>(dst: &mut T, src: &T, cx: &MergeContext<'_>) {
    let config = cx.config();
    let must_set = (dst.is_empty_value() || config.overwrite())
        && (!src.is_empty_value() || config.overwrite_with_empty_value());
    if must_set {
        dst.clone_from(src);
    }
}

macro_rules! impl_env_scalar {
    ($($ty:ty => $empty:expr, $parse:expr;)*) => {
        $(
            impl Merge for $ty {
                const KIND: Kind = Kind::Scalar;

                fn is_empty_value(&self) -> bool {
                    let is_empty: fn(&$ty) -> bool = $empty;
                    is_empty(self)
                }

                fn merge_from(
                    &mut self,
                    src: &Self,
                    cx: &mut MergeContext<'_>,
                ) -> Result<(), MergeError> {
                    assign_scalar(self, src, cx);
                    Ok(())
                }

                fn from_env(name: &str, env: &dyn Environment) -> Option<Self> {
                    let parse: fn(&str) -> Option<$ty> = $parse;
                    lookup(env, name, parse)
                }
            }
        )*
    };
}

macro_rules! impl_plain_scalar {
    ($($ty:ty => $empty:expr;)*) => {
        $(
            impl Merge for $ty {
                const KIND: Kind = Kind::Scalar;

                fn is_empty_value(&self) -> bool {
                    let is_empty: fn(&$ty) -> bool = $empty;
                    is_empty(self)
                }

                fn merge_from(
                    &mut self,
                    src: &Self,
                    cx: &mut MergeContext<'_>,
                ) -> Result<(), MergeError> {
                    assign_scalar(self, src, cx);
                    Ok(())
                }
            }
        )*
    };
}

impl_env_scalar! {
    bool => |v| !*v, parse_bool;
    i8 => |v| *v == 0, |s| s.parse().ok();
    i16 => |v| *v == 0, |s| s.parse().ok();
    i32 => |v| *v == 0, |s| s.parse().ok();
    i64 => |v| *v == 0, |s| s.parse().ok();
    isize => |v| *v == 0, |s| s.parse().ok();
    f64 => |v| *v == 0.0, |s| s.parse().ok();
    String => |v| v.is_empty(), |s| Some(s.to_string());
}

impl_plain_scalar! {
    u8 => |v| *v == 0;
    u16 => |v| *v == 0;
    u32 => |v| *v == 0;
    u64 => |v| *v == 0;
    usize => |v| *v == 0;
    f32 => |v| *v == 0.0;
    char => |v| *v == '\0';
}

impl<T: Merge, const N: usize> Merge for [T; N] {
    const KIND: Kind = Kind::Array;

    fn is_empty_value(&self) -> bool {
        N == 0
    }

    fn merge_from(&mut self, src: &Self, cx: &mut MergeContext<'_>) -> Result<(), MergeError> {
        assign_scalar(self, src, cx);
        Ok(())
    }
}
