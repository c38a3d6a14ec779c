/*
 * pointer.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! `Merge` for optional, boxed and shared slots.
//!
//! - `Option<T>`: a `None` source clears the destination only when empty
//!   values may overwrite; a `None` destination takes a clone of the source;
//!   two present values are merged.
//! - `Box<T>`: always present, merged through to the pointee.
//! - `Rc<RefCell<T>>`: merged through to the shared pointee. Aliasing
//!   handles, pointees already visited in this merge and pointees that are
//!   currently borrowed are left alone, which is what keeps cyclic graphs
//!   finite.
//!
//! Optionals and boxes of scalars can be read from the environment.

use crate::env::Environment;
use crate::traverse::{Merge, MergeContext, deep_merge};
use crate::types::{Kind, MergeError};
use std::cell::RefCell;
use std::rc::Rc;

impl<T: Merge> Merge for Option<T> {
    const KIND: Kind = Kind::Pointer;

    fn is_empty_value(&self) -> bool {
        self.is_none()
    }

    fn is_nil(&self) -> bool {
        self.is_none()
    }

    fn merge_from(&mut self, src: &Self, cx: &mut MergeContext<'_>) -> Result<(), MergeError> {
        let Some(src) = src else {
            if cx.config().overwrite_with_empty_value() {
                *self = None;
            }
            return Ok(());
        };

        match self {
            Some(dst) => deep_merge(dst, src, cx),
            None => {
                *self = Some(src.clone());
                Ok(())
            }
        }
    }

    fn from_env(name: &str, env: &dyn Environment) -> Option<Self> {
        if T::KIND == Kind::Scalar {
            T::from_env(name, env).map(Some)
        } else {
            None
        }
    }
}

impl<T: Merge> Merge for Box<T> {
    const KIND: Kind = Kind::Pointer;

    fn is_empty_value(&self) -> bool {
        self.as_ref().is_empty_value()
    }

    fn merge_from(&mut self, src: &Self, cx: &mut MergeContext<'_>) -> Result<(), MergeError> {
        deep_merge(self.as_mut(), src.as_ref(), cx)
    }

    fn from_env(name: &str, env: &dyn Environment) -> Option<Self> {
        if T::KIND == Kind::Scalar {
            T::from_env(name, env).map(Box::new)
        } else {
            None
        }
    }
}

impl<T: Merge> Merge for Rc<RefCell<T>> {
    const KIND: Kind = Kind::Pointer;

    fn is_empty_value(&self) -> bool {
        self.try_borrow().is_ok_and(|value| value.is_empty_value())
    }

    fn merge_from(&mut self, src: &Self, cx: &mut MergeContext<'_>) -> Result<(), MergeError> {
        if Rc::ptr_eq(self, src) {
            return Ok(());
        }

        if T::KIND == Kind::Record && !cx.visit_shared(self) {
            tracing::trace!(
                record = std::any::type_name::<T>(),
                "Skipping shared record already visited"
            );
            return Ok(());
        }

        let (Ok(mut dst), Ok(src)) = (self.try_borrow_mut(), src.try_borrow()) else {
            tracing::trace!(
                ty = std::any::type_name::<T>(),
                "Skipping shared value borrowed elsewhere"
            );
            return Ok(());
        };
        deep_merge(&mut *dst, &*src, cx)
    }
}
