/*
 * env.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Environment variable overrides for scalar record fields.
//!
//! Before a non-complex record field is merged, the engine looks for an
//! environment variable named after the field. If one is set to a value that
//! parses as the field's type, that value wins over both the destination and
//! the source, and the field is not merged any further.
//!
//! Variable names come from the record's [`Overridable`] implementation, or
//! from [`DEFAULT_ENVIRONMENT_PREFIX`] followed by the field name. A name is
//! tried as given first, then upper-cased.

use std::collections::HashMap;
use std::hash::BuildHasher;

/// Prefix used for records that don't implement [`Overridable`].
pub const DEFAULT_ENVIRONMENT_PREFIX: &str = "MSVC_";

/// Records whose fields can be overridden from named environment variables.
///
/// `#[derive(Merge)]` implements this for `#[merge(env_prefix = "...")]`;
/// write it by hand and mark the record `#[merge(overridable)]` for any
/// other naming scheme.
pub trait Overridable {
    /// Name of the environment variable that overrides `field_name`.
    fn environment_setting(&self, field_name: &str) -> String;
}

/// Variable name used for `field_name` on records without [`Overridable`].
pub fn default_environment_name(field_name: &str) -> String {
    format!("{DEFAULT_ENVIRONMENT_PREFIX}{field_name}")
}

/// Read access to environment variables.
pub trait Environment: Send + Sync {
    /// Get a single variable.
    fn var(&self, name: &str) -> Option<String>;
}

/// The environment of the current process.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnvironment;

impl Environment for ProcessEnvironment {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl<S: BuildHasher + Send + Sync> Environment for HashMap<String, String, S> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// Look up and parse a variable, retrying with the upper-cased name.
///
/// Empty and unparsable values count as unset.
pub fn lookup<T>(
    env: &dyn Environment,
    name: &str,
    parse: impl Fn(&str) -> Option<T>,
) -> Option<T> {
    if let Some(value) = read(env, name, &parse) {
        return Some(value);
    }

    let upper = name.to_uppercase();
    if upper != name {
        read(env, &upper, &parse)
    } else {
        None
    }
}

fn read<T>(env: &dyn Environment, name: &str, parse: &impl Fn(&str) -> Option<T>) -> Option<T> {
    env.var(name)
        .filter(|raw| !raw.is_empty())
        .and_then(|raw| parse(&raw))
}

/// Parse a boolean the way configuration files in the wild spell them.
pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}
