//! Settings Workflow Integration Tests
//!
//! Exercises the cache through a real file backend:
//! - read-with-default and last-writer-wins semantics
//! - persistence across reopening
//! - coalescing of many writes into one flush

mod common;

use common::TestFixture;
use prefcache::{FlushOutcome, JsonCodec, SettingValue, SettingsCodec};
use std::collections::BTreeMap;

// =============================================================================
// Core Semantics
// =============================================================================

#[test]
fn test_get_unknown_key_returns_and_stores_default() {
    let fixture = TestFixture::new();

    for (key, default) in [("volume", 1.0), ("music", 0.5), ("sfx", 0.0)] {
        assert!(!fixture.cache.contains_key(key));
        assert_eq!(fixture.cache.get_value(key, default).unwrap(), default);
        assert!(fixture.cache.contains_key(key));
    }
}

#[test]
fn test_set_wins_over_default() {
    let fixture = TestFixture::new();

    fixture.cache.set_value("player_name", "ada").unwrap();
    fixture.cache.set_value("player_name", "grace").unwrap();

    assert_eq!(
        fixture
            .cache
            .get_value("player_name", "nobody".to_string())
            .unwrap(),
        "grace"
    );
}

#[test]
fn test_remove_then_contains_is_false() {
    let fixture = TestFixture::new();

    fixture.cache.set_value("present", true).unwrap();
    fixture.cache.remove("present");
    fixture.cache.remove("never_there");

    assert!(!fixture.cache.contains_key("present"));
    assert!(!fixture.cache.contains_key("never_there"));
}

#[test]
fn test_volume_scenario() {
    let fixture = TestFixture::new();

    fixture.cache.set_value("volume", 0.8).unwrap();
    assert_eq!(fixture.cache.get_value("volume", 1.0).unwrap(), 0.8);

    fixture.cache.remove("volume");
    assert_eq!(fixture.cache.get_value("volume", 1.0).unwrap(), 1.0);
    assert_eq!(
        fixture.cache.snapshot().get("volume"),
        Some(&SettingValue::Float(1.0))
    );
}

// =============================================================================
// Persistence
// =============================================================================

#[test]
fn test_nothing_written_until_flush() {
    let fixture = TestFixture::new();

    fixture.cache.set_value("volume", 0.8).unwrap();
    assert!(!fixture.settings_path().exists());

    assert!(fixture.cache.flush().is_persisted());
    assert!(fixture.settings_path().exists());
}

#[test]
fn test_settings_survive_reopen() {
    let fixture = TestFixture::new();

    let mut keybinds = BTreeMap::new();
    keybinds.insert("jump".to_string(), "space".to_string());
    keybinds.insert("crouch".to_string(), "ctrl".to_string());

    fixture.cache.set_value("volume", 0.8).unwrap();
    fixture.cache.set_value("launch_count", 3_i64).unwrap();
    fixture.cache.set_value("fullscreen", true).unwrap();
    fixture.cache.set_value("keybinds", keybinds.clone()).unwrap();
    fixture.cache.flush();

    let reopened = fixture.reopen();
    assert!(!reopened.is_dirty());
    assert_eq!(reopened.get_value("volume", 1.0).unwrap(), 0.8);
    assert_eq!(reopened.get_value("launch_count", 0_i64).unwrap(), 3);
    assert!(reopened.get_value("fullscreen", false).unwrap());
    assert_eq!(
        reopened.get_value("keybinds", BTreeMap::<String, String>::new()).unwrap(),
        keybinds
    );
    assert_eq!(reopened.snapshot(), fixture.cache.snapshot());
}

#[test]
fn test_unflushed_changes_are_lost_on_reopen() {
    let fixture = TestFixture::new();

    fixture.cache.set_value("volume", 0.8).unwrap();
    fixture.cache.flush();
    fixture.cache.set_value("volume", 0.1).unwrap();

    let reopened = fixture.reopen();
    assert_eq!(reopened.get_value("volume", 1.0).unwrap(), 0.8);
}

#[test]
fn test_many_writes_coalesce_into_one_flush() {
    let fixture = TestFixture::new();

    for i in 0..100 {
        fixture.cache.set_value("counter", i).unwrap();
    }

    match fixture.cache.flush() {
        FlushOutcome::Persisted { generation, .. } => assert_eq!(generation, 100),
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(fixture.cache.flush(), FlushOutcome::Clean);

    let blob = std::fs::read(fixture.settings_path()).unwrap();
    let persisted = JsonCodec::new().decode(&blob).unwrap();
    assert_eq!(persisted.get("counter"), Some(&SettingValue::Int(99)));
}

#[test]
fn test_persisted_file_is_plain_json() {
    let fixture = TestFixture::new();

    fixture.cache.set_value("volume", 0.8).unwrap();
    fixture.cache.set_value("muted", false).unwrap();
    fixture.cache.flush();

    let content = std::fs::read_to_string(fixture.settings_path()).unwrap();
    let json: serde_json::Value = serde_json::from_str(&content).unwrap();
    assert_eq!(json["volume"], 0.8);
    assert_eq!(json["muted"], false);
}

#[test]
fn test_flush_and_close_persists() {
    let fixture = TestFixture::new();
    let cache = fixture.reopen();

    cache.set_value("difficulty", "hard").unwrap();
    assert!(cache.flush_and_close().is_persisted());

    let reopened = fixture.reopen();
    assert_eq!(
        reopened.get_value("difficulty", String::new()).unwrap(),
        "hard"
    );
}
