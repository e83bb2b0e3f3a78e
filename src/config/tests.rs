//! Integration tests for the configuration system: environment parsing, file
//! persistence and use by the containers.

use super::*;
use crate::error::StowageError;
use crate::{GenericQueue, GenericVector, NarrowString, TypeTag, TypedQueue, TypedVector};
use std::env;
use std::fs;
use tempfile::tempdir;

#[test]
fn test_environment_variable_parsing() {
    env::set_var("TEST_CFG_CONTAINER_INITIAL_CAPACITY", "48");
    env::set_var("TEST_CFG_CONTAINER_GROWTH_FACTOR", "1.5");
    env::set_var("TEST_CFG_CONTAINER_QUEUE_AUTO_GROW", "off");
    env::set_var("TEST_CFG_CONTAINER_STRING_INITIAL_CAPACITY", "not-a-number");

    let config = ContainerConfig::from_env_with_prefix("TEST_CFG_")
        .expect("Failed to parse ContainerConfig from environment");
    assert_eq!(config.initial_capacity, 48);
    assert_eq!(config.growth_factor, 1.5);
    assert!(!config.queue_auto_grow);
    // unparsable values fall back to the default
    assert_eq!(
        config.string_initial_capacity,
        ContainerConfig::default().string_initial_capacity
    );

    env::remove_var("TEST_CFG_CONTAINER_INITIAL_CAPACITY");
    env::remove_var("TEST_CFG_CONTAINER_GROWTH_FACTOR");
    env::remove_var("TEST_CFG_CONTAINER_QUEUE_AUTO_GROW");
    env::remove_var("TEST_CFG_CONTAINER_STRING_INITIAL_CAPACITY");
}

#[test]
fn test_environment_rejects_invalid_values() {
    env::set_var("TEST_BAD_CONTAINER_GROWTH_FACTOR", "9.0");
    let result = ContainerConfig::from_env_with_prefix("TEST_BAD_");
    assert!(matches!(result, Err(StowageError::Configuration { .. })));
    env::remove_var("TEST_BAD_CONTAINER_GROWTH_FACTOR");
}

#[test]
fn test_environment_boolean_parsing() {
    let test_cases = [
        ("true", true),
        ("TRUE", true),
        ("1", true),
        ("yes", true),
        ("On", true),
        ("false", false),
        ("0", false),
        ("no", false),
        ("off", false),
        ("invalid", false),
        ("", false),
    ];

    for (value, expected) in test_cases {
        env::set_var("TEST_STOWAGE_BOOL_VALUE", value);
        assert_eq!(
            parse_env_bool("TEST_STOWAGE_BOOL_VALUE", !expected),
            expected,
            "Failed for value: '{}'",
            value
        );
    }
    env::remove_var("TEST_STOWAGE_BOOL_VALUE");

    assert!(parse_env_bool("TEST_STOWAGE_BOOL_UNSET", true));
    assert_eq!(parse_env_var("TEST_STOWAGE_NUM_UNSET", 7usize), 7);
}

#[test]
fn test_file_round_trip() -> crate::Result<()> {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let path = temp_dir.path().join("containers.json");

    let config = ContainerConfig::builder()
        .initial_capacity(200)
        .growth_factor(1.75)
        .queue_auto_grow(false)
        .build()?;
    config.save_to_file(&path)?;

    let loaded = ContainerConfig::load_from_file(&path)?;
    assert_eq!(loaded, config);

    let json = fs::read_to_string(&path).expect("config file readable");
    assert!(json.contains("\"growth_factor\": 1.75"));
    Ok(())
}

#[test]
fn test_file_errors() {
    let temp_dir = tempdir().expect("Failed to create temp directory");

    let missing = ContainerConfig::load_from_file(temp_dir.path().join("missing.json"));
    assert!(matches!(missing, Err(StowageError::Configuration { .. })));

    let garbage = temp_dir.path().join("garbage.json");
    fs::write(&garbage, "{ not json").expect("write garbage");
    assert!(ContainerConfig::load_from_file(&garbage).is_err());

    let invalid = temp_dir.path().join("invalid.json");
    fs::write(
        &invalid,
        r#"{"initial_capacity":0,"growth_factor":2.0,"queue_auto_grow":true,"string_initial_capacity":8}"#,
    )
    .expect("write invalid");
    let err = ContainerConfig::load_from_file(&invalid).unwrap_err();
    assert!(err.to_string().contains("initial_capacity"));
}

#[test]
fn test_containers_honor_config() -> crate::Result<()> {
    let config = ContainerConfig::realtime_preset();

    let vec = TypedVector::with_config(8, &config)?;
    assert_eq!(vec.capacity(), config.initial_capacity);

    let generic = GenericVector::with_config(&config)?;
    assert_eq!(generic.capacity(), config.initial_capacity);

    let mut queue = GenericQueue::with_config(&config)?;
    assert!(!queue.auto_grow());
    for i in 0..config.initial_capacity as u32 {
        queue.push(TypeTag::UInt32, &i.to_ne_bytes())?;
    }
    assert!(matches!(
        queue.push(TypeTag::UInt32, &0u32.to_ne_bytes()),
        Err(StowageError::CapacityExceeded { .. })
    ));

    let small = ContainerConfig::builder()
        .initial_capacity(2)
        .growth_factor(1.5)
        .build()?;
    let mut typed = TypedQueue::with_config(1, &small)?;
    for b in 0..3u8 {
        typed.push(&[b])?;
    }
    // 2 * 1.5 = 3 slots, then the minimum capacity applies
    assert!(typed.capacity() >= 3);

    let text = NarrowString::with_config(&config)?;
    assert!(text.capacity() >= config.string_initial_capacity);
    Ok(())
}

#[test]
fn test_with_config_rejects_invalid_config() {
    let shrinking = ContainerConfig {
        growth_factor: 0.5,
        ..ContainerConfig::default()
    };
    let undefined = ContainerConfig {
        growth_factor: f64::NAN,
        ..ContainerConfig::default()
    };
    let empty = ContainerConfig {
        initial_capacity: 0,
        ..ContainerConfig::default()
    };

    for config in [&shrinking, &undefined, &empty] {
        assert!(matches!(
            TypedVector::with_config(8, config),
            Err(StowageError::Configuration { .. })
        ));
        assert!(matches!(
            GenericVector::with_config(config),
            Err(StowageError::Configuration { .. })
        ));
        assert!(matches!(
            TypedQueue::with_config(8, config),
            Err(StowageError::Configuration { .. })
        ));
        assert!(matches!(
            GenericQueue::with_config(config),
            Err(StowageError::Configuration { .. })
        ));
        assert!(matches!(
            NarrowString::with_config(config),
            Err(StowageError::Configuration { .. })
        ));
    }
}
