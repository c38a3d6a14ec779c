/*
 * record.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Field-by-field merging of records.
//!
//! A record is merged by visiting its mergeable fields in declaration order.
//! For each field:
//!
//! 1. `final` fields are skipped entirely.
//! 2. Non-complex fields are offered to the environment first. A field that
//!    takes its value from the environment is not merged any further.
//! 3. Everything else goes through [`deep_merge`].
//!
//! A record without mergeable fields is treated as a single value: it is
//! replaced by the source when overwrite is on.
//!
//! `#[derive(Merge)]` generates the [`Record`] implementation. Hand-written
//! implementations must call [`FieldMerger::field`] once per descriptor, with
//! the descriptor's index.

use crate::env::default_environment_name;
use crate::field::FieldDescriptor;
use crate::registry::RecordInfo;
use crate::traverse::{Merge, MergeContext, deep_merge};
use crate::types::MergeError;
use std::sync::Arc;

/// A record type: a struct merged field by field.
pub trait Record: Merge {
    /// Describe the mergeable fields, in declaration order.
    fn field_descriptors() -> Vec<FieldDescriptor>;

    /// Merge each mergeable field of `src` into `self` through `fields`.
    fn merge_fields(
        &mut self,
        src: &Self,
        fields: &mut FieldMerger<'_, '_>,
    ) -> Result<(), MergeError>;

    /// Name of the environment variable that overrides `field_name`.
    fn environment_name(&self, field_name: &str) -> String {
        default_environment_name(field_name)
    }
}

/// Merges the fields of one record.
pub struct FieldMerger<'c, 'a> {
    cx: &'c mut MergeContext<'a>,
    info: Arc<RecordInfo>,
    env_names: Vec<Option<String>>,
}

impl<'a> FieldMerger<'_, 'a> {
    /// Merge the field described by descriptor `index`.
    pub fn field<T: Merge>(
        &mut self,
        index: usize,
        dst: &mut T,
        src: &T,
    ) -> Result<(), MergeError> {
        let Some(field) = self.info.fields.get(index) else {
            return deep_merge(dst, src, self.cx);
        };

        if field.is_final {
            tracing::trace!(
                record = self.info.type_name,
                field = field.name,
                "Skipping final field"
            );
            return Ok(());
        }

        if let Some(Some(variable)) = self.env_names.get(index)
            && dst.override_from_env(variable, self.cx.environment())
        {
            tracing::debug!(
                record = self.info.type_name,
                field = field.name,
                variable = variable.as_str(),
                "Field overridden from environment"
            );
            return Ok(());
        }

        if field.must_override
            && self.cx.config().must_override_check()
            && src.is_empty_value()
        {
            return Err(MergeError::NotOverridden {
                record: self.info.type_name,
                field: field.name,
            });
        }

        deep_merge(dst, src, self.cx)
    }

    /// The context of the merge in progress.
    pub fn context(&mut self) -> &mut MergeContext<'a> {
        self.cx
    }
}

/// Merge a record: field by field, or as a whole if it has no mergeable
/// fields.
pub fn merge_record<R: Record>(
    dst: &mut R,
    src: &R,
    cx: &mut MergeContext<'_>,
) -> Result<(), MergeError> {
    let info = cx.registry().register::<R>();

    if !info.has_mergeable_fields() {
        let config = cx.config();
        if config.overwrite() && (!src.is_empty_value() || config.overwrite_with_empty_value()) {
            dst.clone_from(src);
        }
        return Ok(());
    }

    let env_names = info
        .fields
        .iter()
        .map(|field| {
            (!field.is_final && !field.complex).then(|| dst.environment_name(field.name))
        })
        .collect();

    let mut fields = FieldMerger { cx, info, env_names };
    dst.merge_fields(src, &mut fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Merge;
    use crate::config::{
        MergeConfig, MergeOption, with_environment, with_must_override_check, with_override,
    };
    use std::collections::HashMap;

    #[derive(Debug, Clone, Default, PartialEq, Merge)]
    struct Server {
        host: String,
        port: i64,
        #[merge(final)]
        id: String,
        tags: Vec<String>,
    }

    #[derive(Debug, Clone, PartialEq, Merge)]
    enum Mode {
        Fast,
        Safe,
    }

    #[derive(Debug, Clone, PartialEq, Merge)]
    struct Job {
        mode: Mode,
        #[merge(mustoverride)]
        owner: String,
    }

    fn merged<T: Merge>(
        mut dst: T,
        src: T,
        options: &[MergeOption<'_>],
    ) -> Result<T, MergeError> {
        let isolated = with_environment(HashMap::<String, String>::new());
        let mut all: Vec<MergeOption<'_>> = Vec::with_capacity(options.len() + 1);
        all.push(&isolated);
        all.extend_from_slice(options);

        let config = MergeConfig::from_options(&all);
        let mut cx = MergeContext::new(&config);
        deep_merge(&mut dst, &src, &mut cx)?;
        Ok(dst)
    }

    fn server(host: &str, port: i64, id: &str) -> Server {
        Server {
            host: host.to_string(),
            port,
            id: id.to_string(),
            tags: Vec::new(),
        }
    }

    #[test]
    fn test_fields_filled_from_source() {
        let result = merged(server("", 0, ""), server("example.org", 443, "src"), &[]).unwrap();
        assert_eq!(result.host, "example.org");
        assert_eq!(result.port, 443);
    }

    #[test]
    fn test_final_field_untouched() {
        let result = merged(server("", 0, ""), server("a", 1, "src"), &[&with_override]).unwrap();
        assert_eq!(result.id, "");
    }

    #[test]
    fn test_environment_overrides_field() {
        let vars = HashMap::from([("MSVC_port".to_string(), "8443".to_string())]);
        let env = with_environment(vars);
        let config = MergeConfig::from_options(&[&env]);
        let mut cx = MergeContext::new(&config);

        let mut dst = server("a", 80, "");
        deep_merge(&mut dst, &server("b", 81, ""), &mut cx).unwrap();
        assert_eq!(dst.port, 8443);
        assert_eq!(dst.host, "a");
    }

    #[test]
    fn test_opaque_record_assigned_whole() {
        assert_eq!(merged(Mode::Fast, Mode::Safe, &[]).unwrap(), Mode::Fast);
        assert_eq!(
            merged(Mode::Fast, Mode::Safe, &[&with_override]).unwrap(),
            Mode::Safe
        );
    }

    #[test]
    fn test_must_override_check() {
        let dst = Job {
            mode: Mode::Fast,
            owner: String::new(),
        };
        let unset = Job {
            mode: Mode::Fast,
            owner: String::new(),
        };
        let set = Job {
            mode: Mode::Safe,
            owner: "ops".to_string(),
        };

        // Unchecked by default
        assert!(merged(dst.clone(), unset.clone(), &[]).is_ok());

        let result = merged(dst.clone(), unset, &[&with_must_override_check]);
        assert!(matches!(
            result,
            Err(MergeError::NotOverridden { field: "owner", .. })
        ));

        let result = merged(dst, set, &[&with_must_override_check]).unwrap();
        assert_eq!(result.owner, "ops");
    }
}
