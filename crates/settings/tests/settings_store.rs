//! Integration tests for the SettingsStore:
//! - Persisting only changed (delta) fields
//! - Values surviving a restart
//! - Reloading after external file modification
//! - Sanitizing on load, update and reload

use std::fs;

use serde::{Deserialize, Serialize};
use settings::{Settings, SettingsError, SettingsStore};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct Volume {
    master: f32,
    music: f32,
}

impl Default for Volume {
    fn default() -> Self {
        Self {
            master: 1.0,
            music: 0.8,
        }
    }
}

impl Settings for Volume {
    const SECTION: &'static str = "volume";

    fn sanitize(&mut self) {
        self.master = self.master.clamp(0.0, 1.0);
        self.music = self.music.clamp(0.0, 1.0);
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
struct Controls {
    sensitivity: f32,
    invert_y: bool,
}

impl Settings for Controls {
    const SECTION: &'static str = "controls";
}

fn store_at(path: &std::path::Path) -> SettingsStore {
    SettingsStore::builder()
        .with_settings_file(path)
        .build()
        .expect("build store")
}

#[test]
fn update_persists_only_the_delta() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("prefs.settings.json");

    let store = store_at(&path);
    store.register::<Volume>().expect("register volume");
    assert!(!path.exists(), "nothing is written before the first update");

    store
        .update::<Volume, _>(|v| v.music = 0.25)
        .expect("update music");

    let root: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&path).expect("read file")).expect("parse");
    assert_eq!(root, serde_json::json!({ "volume": { "music": 0.25 } }));
}

#[test]
fn values_survive_a_restart() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("prefs.settings.json");

    {
        let store = store_at(&path);
        store.register::<Controls>().expect("register controls");
        store
            .update::<Controls, _>(|c| {
                c.sensitivity = 2.5;
                c.invert_y = true;
            })
            .expect("update controls");
    }

    let store = store_at(&path);
    store.register::<Controls>().expect("register again");
    let controls = store.get::<Controls>().expect("get controls");
    assert_eq!(controls.sensitivity, 2.5);
    assert!(controls.invert_y);
}

#[test]
fn reverting_to_default_removes_the_section_from_disk() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("prefs.settings.json");

    let store = store_at(&path);
    store.register::<Volume>().expect("register");
    store.update::<Volume, _>(|v| v.master = 0.5).expect("lower");
    store.update::<Volume, _>(|v| v.master = 1.0).expect("restore");

    let root: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&path).expect("read file")).expect("parse");
    assert_eq!(root, serde_json::json!({}));
}

#[test]
fn sanitize_runs_on_update_and_on_load() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("prefs.settings.json");
    fs::write(&path, r#"{ "volume": { "master": 7.0 } }"#).expect("seed file");

    let store = store_at(&path);
    store.register::<Volume>().expect("register");
    assert_eq!(store.get::<Volume>().expect("get").master, 1.0);

    let updated = store
        .update::<Volume, _>(|v| v.music = -3.0)
        .expect("update");
    assert_eq!(updated.music, 0.0);
}

#[test]
fn reload_picks_up_external_edits_and_bumps_revision() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("prefs.settings.json");

    let store = store_at(&path);
    store.register::<Controls>().expect("register");
    let before = store.revision();

    fs::write(&path, r#"{ "controls": { "sensitivity": 0.5 } }"#).expect("external edit");
    store.reload().expect("reload");

    assert!(store.revision() > before);
    assert_eq!(store.get::<Controls>().expect("get").sensitivity, 0.5);
}

#[test]
fn reload_sanitizes_out_of_range_edits() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("prefs.settings.json");
    fs::write(&path, r#"{ "volume": { "master": 5.0 } }"#).expect("seed file");

    let store = store_at(&path);
    store.register::<Volume>().expect("register");
    assert_eq!(store.get::<Volume>().expect("get").master, 1.0);

    fs::write(&path, r#"{ "volume": { "master": 5.0, "music": -2.0 } }"#).expect("edit");
    store.reload().expect("reload");

    let volume = store.get::<Volume>().expect("get after reload");
    assert_eq!(volume.master, 1.0);
    assert_eq!(volume.music, 0.0);
}

#[test]
fn unregistered_sections_are_reported_and_kept_on_disk() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("prefs.settings.json");
    fs::write(&path, r#"{ "legacy": { "x": 1 } }"#).expect("seed file");

    let store = store_at(&path);
    assert!(matches!(
        store.get::<Controls>(),
        Err(SettingsError::NotRegistered("controls"))
    ));

    store.register::<Controls>().expect("register");
    assert!(matches!(
        store.register::<Controls>(),
        Err(SettingsError::AlreadyRegistered("controls"))
    ));

    store
        .update::<Controls, _>(|c| c.sensitivity = 3.0)
        .expect("update");
    let root: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&path).expect("read file")).expect("parse");
    assert_eq!(
        root,
        serde_json::json!({ "legacy": { "x": 1 }, "controls": { "sensitivity": 3.0 } })
    );
}
