/*
 * environment_override.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Environment variable overrides for scalar record fields.
 */

use quarto_merge::{
    Merge, MergeConfig, Overridable, merge, with_environment, with_override,
};
use std::collections::HashMap;

#[derive(Debug, Clone, Default, PartialEq, Merge)]
#[merge(env_prefix = "OTC_")]
struct OvrTestConfig {
    #[merge(rename = "Name")]
    name: String,
    #[merge(rename = "Description")]
    description: Option<String>,
    sub: OvrTestSubConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Merge)]
#[merge(env_prefix = "OVRTSC_")]
struct OvrTestSubConfig {
    #[merge(rename = "Note")]
    note: Option<String>,
    #[merge(rename = "Value")]
    value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Merge)]
struct Region(String);

#[derive(Debug, Clone, Default, PartialEq, Merge)]
#[merge(env_prefix = "SVC_")]
struct Service {
    region: Region,
    debug: bool,
    workers: i32,
    ratio: f64,
    hosts: Vec<String>,
    timeout: Box<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Merge)]
#[merge(overridable)]
struct Database {
    url: String,
}

impl Overridable for Database {
    fn environment_setting(&self, field_name: &str) -> String {
        format!("DB_{}", field_name.to_uppercase())
    }
}

fn env(vars: &[(&str, &str)]) -> HashMap<String, String> {
    vars.iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn ovr_config(n: u8) -> OvrTestConfig {
    OvrTestConfig {
        name: format!("name{n}"),
        description: Some(format!("desc{n}")),
        sub: OvrTestSubConfig {
            note: Some(format!("note{n}")),
            value: format!("value{n}"),
        },
    }
}

#[test]
fn test_override_with_environment() {
    let mut otc1 = ovr_config(1);
    let otc2 = ovr_config(2);

    merge(&mut otc1, &otc2, &[&with_environment(env(&[])), &with_override]).unwrap();
    assert_eq!(otc1.sub.value, otc2.sub.value);
    assert_eq!(otc1.sub.note, otc2.sub.note);

    let vars = env(&[("OVRTSC_Value", "goober!"), ("OVRTSC_Note", "little note")]);
    merge(&mut otc1, &otc2, &[&with_environment(vars), &with_override]).unwrap();
    assert_eq!(otc1.sub.value, "goober!");
    assert_eq!(otc1.sub.note.as_deref(), Some("little note"));
    assert_eq!(otc1.name, "name2");
}

#[test]
fn test_environment_wins_over_both_sides() {
    let mut dst = ovr_config(1);
    let vars = env(&[("OTC_Name", "from env")]);

    merge(&mut dst, &ovr_config(2), &[&with_environment(vars)]).unwrap();
    assert_eq!(dst.name, "from env");
    assert_eq!(dst.sub.value, "value1");
}

#[test]
fn test_upper_case_name_retry() {
    let mut dst = ovr_config(1);
    let vars = env(&[("OVRTSC_VALUE", "upper")]);

    merge(&mut dst, &ovr_config(2), &[&with_environment(vars)]).unwrap();
    assert_eq!(dst.sub.value, "upper");
}

#[test]
fn test_none_optional_receives_environment_value() {
    let mut dst = OvrTestConfig::default();
    let vars = env(&[("OTC_Description", "described")]);

    merge(&mut dst, &OvrTestConfig::default(), &[&with_environment(vars)]).unwrap();
    assert_eq!(dst.description.as_deref(), Some("described"));
}

#[test]
fn test_typed_scalars_from_environment() {
    let vars = env(&[
        ("SVC_region", "eu-west"),
        ("SVC_debug", "TRUE"),
        ("SVC_workers", "-4"),
        ("SVC_ratio", "0.5"),
        ("SVC_hosts", "a,b"),
        ("SVC_timeout", "30"),
    ]);
    let mut dst = Service::default();

    merge(&mut dst, &Service::default(), &[&with_environment(vars)]).unwrap();
    assert_eq!(dst.region, Region("eu-west".to_string()));
    assert!(dst.debug);
    assert_eq!(dst.workers, -4);
    assert_eq!(dst.ratio, 0.5);
    assert_eq!(*dst.timeout, 30);
    // Sequences are complex and never read from the environment
    assert!(dst.hosts.is_empty());
}

#[test]
fn test_unparsable_values_fall_back_to_merge() {
    let vars = env(&[("SVC_workers", "many"), ("SVC_debug", "")]);
    let mut dst = Service::default();
    let src = Service {
        workers: 8,
        debug: true,
        ..Service::default()
    };

    merge(&mut dst, &src, &[&with_environment(vars)]).unwrap();
    assert_eq!(dst.workers, 8);
    assert!(dst.debug);
}

#[test]
fn test_hand_written_overridable() {
    let vars = env(&[("DB_URL", "postgres://db")]);
    let mut dst = Database::default();

    merge(&mut dst, &Database::default(), &[&with_environment(vars)]).unwrap();
    assert_eq!(dst.url, "postgres://db");
}

#[test]
fn test_default_prefix_without_overridable() {
    #[derive(Debug, Clone, Default, Merge)]
    struct Plain {
        level: String,
    }

    let vars = env(&[("MSVC_level", "info")]);
    let mut dst = Plain::default();
    merge(&mut dst, &Plain::default(), &[&with_environment(vars)]).unwrap();
    assert_eq!(dst.level, "info");
}

#[test]
fn test_process_environment_is_the_default() {
    #[derive(Debug, Clone, Default, Merge)]
    #[merge(env_prefix = "QUARTO_MERGE_PROCESS_TEST_")]
    struct Process {
        #[merge(rename = "Name")]
        name: String,
    }

    // SAFETY: the variable name is unique to this test
    unsafe {
        std::env::set_var("QUARTO_MERGE_PROCESS_TEST_Name", "goober!");
    }

    let config = MergeConfig::default();
    let mut dst = Process::default();
    quarto_merge::merge_with_config(&mut dst, &Process::default(), &config).unwrap();
    assert_eq!(dst.name, "goober!");

    unsafe {
        std::env::remove_var("QUARTO_MERGE_PROCESS_TEST_Name");
    }
}
