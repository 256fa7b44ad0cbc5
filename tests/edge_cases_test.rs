//! Edge Cases Integration Tests
//!
//! Tests for startup recovery and boundary behaviors:
//! - Missing, corrupted and non-map settings blobs
//! - Type mismatches and coercion on read
//! - Values that cannot be persisted

mod common;

use common::TestFixture;
use prefcache::{
    Error, FileSettings, FlushOutcome, MemoryBackend, SettingValue, SettingsCache,
};
use std::fs;

// =============================================================================
// Startup Recovery
// =============================================================================

#[test]
fn test_corrupted_file_starts_empty() {
    let fixture = TestFixture::new();
    fs::write(fixture.settings_path(), "{ this is not json").unwrap();

    let cache = fixture.reopen();
    assert!(cache.is_empty());
    assert!(!cache.is_dirty());
}

#[test]
fn test_corrupted_file_is_replaced_on_next_flush() {
    let fixture = TestFixture::new();
    fs::write(fixture.settings_path(), [0xff, 0xfe, 0x00]).unwrap();

    let cache = fixture.reopen();
    // Nothing changed yet, so the corrupt blob is left alone
    assert_eq!(cache.flush(), FlushOutcome::Clean);

    cache.set_value("volume", 0.5).unwrap();
    assert!(cache.flush().is_persisted());
    assert_eq!(fixture.reopen().get_value("volume", 1.0).unwrap(), 0.5);
}

#[test]
fn test_non_map_blob_starts_empty() {
    for blob in [&b"[1, 2, 3]"[..], b"42", b"\"settings\"", b"null"] {
        let cache = SettingsCache::open(MemoryBackend::with_blob("settings", blob)).unwrap();
        assert!(cache.is_empty(), "blob {:?}", String::from_utf8_lossy(blob));
    }
}

#[test]
fn test_null_entries_are_dropped_on_load() {
    let cache = SettingsCache::open(MemoryBackend::with_blob(
        "settings",
        br#"{"volume": 0.7, "legacy": null, "tags": ["a", null]}"#.to_vec(),
    ))
    .unwrap();

    assert!(!cache.contains_key("legacy"));
    assert_eq!(cache.get_value("volume", 1.0).unwrap(), 0.7);
    assert_eq!(
        cache.get_value("tags", Vec::<String>::new()).unwrap(),
        vec!["a".to_string()]
    );
}

#[test]
fn test_empty_key_in_blob_is_dropped_on_load() {
    let fixture = TestFixture::new();
    fs::write(fixture.settings_path(), r#"{"": 1, "volume": 0.5}"#).unwrap();

    let cache = fixture.reopen();
    assert_eq!(cache.keys(), vec!["volume"]);
    assert!(!cache.contains_key(""));

    // The next flush rewrites the store without it
    cache.set_value("muted", true).unwrap();
    cache.flush();
    let content = fs::read_to_string(fixture.settings_path()).unwrap();
    assert!(!content.contains(r#""""#));
}

#[test]
fn test_unreadable_store_starts_empty() {
    let fixture = TestFixture::new();
    // A directory where the file should be makes the read fail
    fs::create_dir_all(fixture.settings_path()).unwrap();

    let cache = FileSettings::open(fixture.backend()).unwrap();
    assert!(cache.is_empty());

    // And the write fails too, which is absorbed
    cache.set_value("volume", 0.5).unwrap();
    assert_eq!(cache.flush(), FlushOutcome::Failed);
    assert!(cache.is_dirty());
}

// =============================================================================
// Type Handling
// =============================================================================

#[test]
fn test_type_mismatch_propagates() {
    let fixture = TestFixture::new();
    fixture.cache.set_value("player_name", "ada").unwrap();

    let err = fixture.cache.get_value("player_name", 0_i64).unwrap_err();
    assert!(err.is_type_mismatch());
    assert!(!err.is_persistence_error());
    assert!(err.to_string().contains("player_name"));
}

#[test]
fn test_int_reads_as_float_after_reload() {
    let fixture = TestFixture::new();
    fixture.cache.set_value("volume", 1_i64).unwrap();
    fixture.cache.flush();

    let cache = fixture.reopen();
    assert_eq!(cache.get_value("volume", 0.5_f64).unwrap(), 1.0);
    assert_eq!(cache.snapshot()["volume"], SettingValue::Int(1));
}

#[test]
fn test_integral_float_survives_reload_as_float() {
    let fixture = TestFixture::new();
    fixture.cache.set_value("scale", 2.0_f64).unwrap();
    fixture.cache.flush();

    let cache = fixture.reopen();
    assert_eq!(cache.snapshot()["scale"], SettingValue::Float(2.0));
    assert_eq!(cache.get_value("scale", 0_i32).unwrap(), 2);
}

#[test]
fn test_out_of_range_integer_is_mismatch() {
    let fixture = TestFixture::new();
    fixture.cache.set_value("big", i64::MAX).unwrap();

    assert!(matches!(
        fixture.cache.get_value("big", 0_i32),
        Err(Error::TypeMismatch { .. })
    ));
    assert_eq!(fixture.cache.get_value("big", 0_i64).unwrap(), i64::MAX);
}

#[test]
fn test_large_u64_roundtrips_through_file() {
    let fixture = TestFixture::new();
    fixture.cache.set_value("seed", 1_u64 << 40).unwrap();
    fixture.cache.flush();

    let cache = fixture.reopen();
    assert_eq!(cache.get_value("seed", 0_u64).unwrap(), 1_u64 << 40);
}

#[test]
fn test_u64_above_i64_max_is_rejected() {
    let fixture = TestFixture::new();

    for huge in [u64::MAX, (1_u64 << 63) + 1] {
        assert!(matches!(
            fixture.cache.set_value("seed", huge),
            Err(Error::InvalidValue { .. })
        ));
    }
    assert!(!fixture.cache.contains_key("seed"));
    assert_eq!(fixture.cache.flush(), FlushOutcome::Clean);
}

#[test]
fn test_non_finite_values_never_reach_storage() {
    let fixture = TestFixture::new();

    assert!(matches!(
        fixture.cache.set_value("gain", f64::NEG_INFINITY),
        Err(Error::InvalidValue { .. })
    ));
    assert!(matches!(
        fixture.cache.set_value("curve", vec![0.0, f64::NAN]),
        Err(Error::InvalidValue { .. })
    ));
    assert_eq!(fixture.cache.flush(), FlushOutcome::Clean);
}

#[test]
fn test_unicode_keys_and_values() {
    let fixture = TestFixture::new();
    fixture.cache.set_value("名前", "ゲーム").unwrap();
    fixture.cache.set_value("emoji 🎮", "✓").unwrap();
    fixture.cache.flush();

    let cache = fixture.reopen();
    assert_eq!(cache.get_value("名前", String::new()).unwrap(), "ゲーム");
    assert_eq!(cache.get_value("emoji 🎮", String::new()).unwrap(), "✓");
}
