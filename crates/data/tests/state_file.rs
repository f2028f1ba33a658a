use chrono::{Duration, Utc};
use picker_core::{DrawRequest, Item, Origin, PickerEvent, StoreVariant};
use picker_data::{open_picker, PickerConfig};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

fn unique_temp_file(tag: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time")
        .as_nanos();
    std::env::temp_dir().join(format!(
        "picker_data_state_{tag}_{}_{}",
        std::process::id(),
        nanos
    ))
}

fn config(store: StoreVariant, tag: &str) -> PickerConfig {
    let dataset = unique_temp_file(&format!("{tag}_dataset.csv"));
    std::fs::write(&dataset, "\"Ann\",1\n\"Ben\",2\n\n\"Cy\",3\n").expect("write dataset");
    PickerConfig {
        dataset_path: dataset,
        state_path: unique_temp_file(&format!("{tag}_state.json")),
        store,
        seed: Some(17),
        ..PickerConfig::default()
    }
}

fn cleanup(config: &PickerConfig) {
    let _ = std::fs::remove_file(&config.dataset_path);
    let _ = std::fs::remove_file(&config.state_path);
}

fn draw_once(config: &PickerConfig) -> Item {
    let now = Utc::now();
    let mut picker = open_picker(config, now);
    assert_eq!(picker.request_draw(now), DrawRequest::Started);
    let replay = picker.simulate_spin().expect("replay");
    replay.result
}

#[test]
fn drawn_state_survives_reopen() {
    for (variant, tag) in [(StoreVariant::Cookie, "cookie"), (StoreVariant::Local, "local")] {
        let config = config(variant, tag);
        let drawn = draw_once(&config);

        let reopened = open_picker(&config, Utc::now());
        assert_eq!(reopened.origin(), Origin::Restored);
        assert_eq!(reopened.pool().drawn(), &[drawn.clone()]);
        assert_eq!(reopened.pool().remaining().len(), 2);
        assert!(!reopened.pool().remaining().contains(&drawn));
        cleanup(&config);
    }
}

#[test]
fn expired_cookie_state_reloads_dataset() {
    let config = config(StoreVariant::Cookie, "expired");
    draw_once(&config);
    let later = Utc::now() + Duration::days(8);
    let reopened = open_picker(&config, later);
    assert_eq!(reopened.origin(), Origin::Dataset);
    assert!(reopened.pool().drawn().is_empty());
    assert_eq!(
        reopened.pool().remaining(),
        &[Item::new(1, "Ann"), Item::new(2, "Ben"), Item::new(3, "Cy")]
    );
    cleanup(&config);
}

#[test]
fn corrupt_state_file_reloads_dataset() {
    let config = config(StoreVariant::Local, "corrupt");
    std::fs::write(&config.state_path, "not a jar").expect("write");
    let picker = open_picker(&config, Utc::now());
    assert_eq!(picker.origin(), Origin::Dataset);
    assert_eq!(picker.pool().remaining().len(), 3);
    cleanup(&config);
}

#[test]
fn missing_dataset_uses_synthetic_items() {
    let mut config = config(StoreVariant::Local, "synthetic");
    let _ = std::fs::remove_file(&config.dataset_path);
    config.synthetic_count = 12;
    let picker = open_picker(&config, Utc::now());
    assert_eq!(picker.origin(), Origin::Synthetic);
    assert_eq!(picker.pool().remaining().len(), 12);
    cleanup(&config);
}

#[test]
fn default_config_persists_synthetic_fallback() {
    let config = PickerConfig {
        dataset_path: unique_temp_file("absent_dataset.csv"),
        state_path: unique_temp_file("default_state.json"),
        ..PickerConfig::default()
    };
    assert_eq!(config.store, StoreVariant::Cookie);
    assert_eq!(config.cookie_max_bytes, None);

    let now = Utc::now();
    let mut picker = open_picker(&config, now);
    assert_eq!(picker.origin(), Origin::Synthetic);
    assert_eq!(picker.pool().remaining().len(), 150);
    assert!(picker
        .events()
        .drain()
        .all(|event| !matches!(event, PickerEvent::PersistenceFailed { .. })));
    assert_eq!(picker.request_draw(now), DrawRequest::Started);
    let drawn = picker.simulate_spin().expect("replay").result;
    assert!(picker
        .events()
        .drain()
        .all(|event| !matches!(event, PickerEvent::PersistenceFailed { .. })));

    let reopened = open_picker(&config, Utc::now());
    assert_eq!(reopened.origin(), Origin::Restored);
    assert_eq!(reopened.pool().drawn(), &[drawn]);
    assert_eq!(reopened.pool().remaining().len(), 149);
    cleanup(&config);
}

#[test]
fn configured_cookie_limit_refuses_large_state() {
    let config = PickerConfig {
        dataset_path: unique_temp_file("absent_limited.csv"),
        state_path: unique_temp_file("limited_state.json"),
        cookie_max_bytes: Some(4096),
        ..PickerConfig::default()
    };
    let mut picker = open_picker(&config, Utc::now());
    assert!(picker
        .events()
        .drain()
        .any(|event| matches!(event, PickerEvent::PersistenceFailed { .. })));
    let reopened = open_picker(&config, Utc::now());
    assert_eq!(reopened.origin(), Origin::Synthetic);
    cleanup(&config);
}
