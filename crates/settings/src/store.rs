use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde_json::{Map, Value};

use crate::{Settings, SettingsError};

type JsonMap = Map<String, Value>;

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

/// Serialize a section into a JSON object.
fn to_section_map<T: Settings>(value: &T) -> Result<JsonMap, SettingsError> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        _ => Err(SettingsError::Invalid("section must serialize to an object")),
    }
}

/// Merge default + delta recursively (objects only).
fn merge_maps(default: &JsonMap, delta: &JsonMap) -> JsonMap {
    let mut merged = default.clone();
    for (k, v_delta) in delta {
        match (merged.get(k), v_delta) {
            (Some(Value::Object(def_m)), Value::Object(delta_m)) => {
                let rec = merge_maps(def_m, delta_m);
                merged.insert(k.clone(), Value::Object(rec));
            }
            _ => {
                merged.insert(k.clone(), v_delta.clone());
            }
        }
    }
    merged
}

/// Compute recursive diff (new vs default). Returns None if identical.
fn diff_value(new_v: &Value, default_v: &Value) -> Option<Value> {
    match (new_v, default_v) {
        (Value::Object(new_m), Value::Object(def_m)) => {
            let diff_m = diff_map(new_m, def_m);
            if diff_m.is_empty() {
                None
            } else {
                Some(Value::Object(diff_m))
            }
        }
        _ if new_v == default_v => None,
        _ => Some(new_v.clone()),
    }
}

fn diff_map(new_m: &JsonMap, def_m: &JsonMap) -> JsonMap {
    let mut out = JsonMap::new();
    for (k, new_v) in new_m {
        match def_m.get(k) {
            Some(def_v) => {
                if let Some(d) = diff_value(new_v, def_v) {
                    out.insert(k.clone(), d);
                }
            }
            None => {
                out.insert(k.clone(), new_v.clone());
            }
        }
    }
    out
}

/// Merge a delta over the defaults and run the typed sanitizer on the result.
fn effective_map<T: Settings>(
    default_map: &JsonMap,
    delta: Option<&Value>,
) -> Result<JsonMap, SettingsError> {
    let section = T::SECTION;
    let merged = match delta {
        Some(Value::Object(delta)) => merge_maps(default_map, delta),
        Some(_) => {
            tracing::warn!(target: "settings", section, "ignoring non-object delta");
            default_map.clone()
        }
        None => default_map.clone(),
    };

    // Hand-edited files may hold out-of-range values.
    let mut typed: T = serde_json::from_value(Value::Object(merged)).unwrap_or_else(|err| {
        tracing::warn!(target: "settings", section, %err, "falling back to defaults");
        T::default()
    });
    typed.sanitize();
    to_section_map(&typed)
}

type Resolver = fn(&JsonMap, Option<&Value>) -> Result<JsonMap, SettingsError>;

/// Defaults of one registered section plus its typed merge.
struct Section {
    defaults: JsonMap,
    resolve: Resolver,
}

fn read_deltas(path: &Path) -> Result<HashMap<String, Value>, SettingsError> {
    if !path.exists() {
        return Ok(HashMap::new());
    }
    let content = fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(HashMap::new());
    }
    Ok(serde_json::from_str(&content)?)
}

/// Builder for `SettingsStore` (single delta file).
#[derive(Default)]
pub struct SettingsStoreBuilder {
    settings_file: Option<PathBuf>,
}

impl SettingsStoreBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.settings_file = Some(path.into());
        self
    }

    pub fn build(self) -> Result<SettingsStore, SettingsError> {
        let file_path = self
            .settings_file
            .ok_or(SettingsError::Invalid("settings file not specified"))?;

        if let Some(dir) = file_path.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                fs::create_dir_all(dir)?;
            }
        }

        let deltas = read_deltas(&file_path)?;

        Ok(SettingsStore {
            file_path,
            deltas: RwLock::new(deltas),
            sections: RwLock::new(HashMap::new()),
            values: RwLock::new(HashMap::new()),
            revision: AtomicU64::new(0),
        })
    }
}

/// Settings store (thread-safe).
///
/// Holds the full default object and the effective merged object for every
/// registered section, and the raw deltas read from disk. Deltas for sections
/// that are not registered (yet) survive every write.
pub struct SettingsStore {
    file_path: PathBuf,
    deltas: RwLock<HashMap<String, Value>>, // section -> delta object
    sections: RwLock<HashMap<&'static str, Section>>, // section -> defaults and merge
    values: RwLock<HashMap<&'static str, JsonMap>>, // section -> effective object
    revision: AtomicU64,
}

impl SettingsStore {
    pub fn builder() -> SettingsStoreBuilder {
        SettingsStoreBuilder::new()
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    /// Monotonic counter bumped by every update and reload.
    pub fn revision(&self) -> u64 {
        self.revision.load(Ordering::Acquire)
    }

    pub fn is_registered<T: Settings>(&self) -> bool {
        read(&self.values).contains_key(T::SECTION)
    }

    /// Register a section type (loads defaults and applies an existing delta if present).
    pub fn register<T: Settings>(&self) -> Result<(), SettingsError> {
        let section = T::SECTION;
        if self.is_registered::<T>() {
            return Err(SettingsError::AlreadyRegistered(section));
        }

        let default_map = to_section_map(&T::default())?;
        let effective = effective_map::<T>(&default_map, read(&self.deltas).get(section))?;

        write(&self.sections).insert(
            section,
            Section {
                defaults: default_map,
                resolve: effective_map::<T>,
            },
        );
        write(&self.values).insert(section, effective);
        Ok(())
    }

    fn snapshot<T: Settings>(&self) -> Result<Option<T>, SettingsError> {
        let Some(map) = read(&self.values).get(T::SECTION).cloned() else {
            return Ok(None);
        };
        Ok(Some(serde_json::from_value(Value::Object(map))?))
    }

    /// Snapshot of the effective section value.
    pub fn get<T: Settings>(&self) -> Result<Arc<T>, SettingsError> {
        self.try_get::<T>()?
            .ok_or(SettingsError::NotRegistered(T::SECTION))
    }

    /// Optional variant: `None` if not registered.
    pub fn try_get<T: Settings>(&self) -> Result<Option<Arc<T>>, SettingsError> {
        Ok(self.snapshot::<T>()?.map(Arc::new))
    }

    /// Update via mutable closure. Only the delta against the defaults is persisted.
    pub fn update<T, F>(&self, mutator: F) -> Result<Arc<T>, SettingsError>
    where
        T: Settings,
        F: FnOnce(&mut T),
    {
        let section = T::SECTION;
        let mut instance = self
            .snapshot::<T>()?
            .ok_or(SettingsError::NotRegistered(section))?;
        mutator(&mut instance);
        instance.sanitize();

        let new_map = to_section_map(&instance)?;
        let diff = {
            let sections = read(&self.sections);
            let registered = sections
                .get(section)
                .ok_or(SettingsError::NotRegistered(section))?;
            diff_map(&new_map, &registered.defaults)
        };

        write(&self.values).insert(section, new_map);
        {
            let mut deltas = write(&self.deltas);
            if diff.is_empty() {
                deltas.remove(section);
            } else {
                deltas.insert(section.to_string(), Value::Object(diff));
            }
        }

        self.persist_deltas()?;
        self.revision.fetch_add(1, Ordering::AcqRel);
        Ok(Arc::new(instance))
    }

    /// Reload deltas from disk and re-merge all registered sections.
    ///
    /// Re-merged values pass through the same sanitizer as on registration.
    pub fn reload(&self) -> Result<(), SettingsError> {
        let new_deltas = read_deltas(&self.file_path)?;

        let mut reloaded = HashMap::new();
        for (section, registered) in read(&self.sections).iter() {
            let effective = (registered.resolve)(&registered.defaults, new_deltas.get(*section))?;
            reloaded.insert(*section, effective);
        }

        write(&self.values).extend(reloaded);
        *write(&self.deltas) = new_deltas;
        self.revision.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }

    fn persist_deltas(&self) -> Result<(), SettingsError> {
        let clean: serde_json::Map<String, Value> = read(&self.deltas)
            .iter()
            .filter(|(_, v)| !matches!(v, Value::Object(m) if m.is_empty()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        let json = serde_json::to_string_pretty(&clean)?;

        // Write-then-rename so a crash never leaves a truncated file behind.
        let tmp = self.file_path.with_extension("tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.file_path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(v: Value) -> JsonMap {
        match v {
            Value::Object(m) => m,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn merge_overrides_only_delta_keys() {
        let defaults = obj(json!({ "a": 1, "nested": { "x": true, "y": 2 } }));
        let delta = obj(json!({ "nested": { "y": 5 } }));

        let merged = merge_maps(&defaults, &delta);
        assert_eq!(
            Value::Object(merged),
            json!({ "a": 1, "nested": { "x": true, "y": 5 } })
        );
    }

    #[test]
    fn diff_of_identical_maps_is_empty() {
        let defaults = obj(json!({ "a": 1, "nested": { "x": true } }));
        assert!(diff_map(&defaults, &defaults).is_empty());
    }
}
