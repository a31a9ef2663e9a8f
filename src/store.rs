use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::error::{ProgressError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StoreKey {
    pub user: String,
    pub key: String,
}

impl StoreKey {
    pub fn new(user: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            key: key.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum StoredValue {
    Str(String),
    Int(i32),
    Long(i64),
    Float(f32),
    Bool(bool),
    StringSet(BTreeSet<String>),
}

impl StoredValue {
    pub fn kind(&self) -> &'static str {
        match self {
            StoredValue::Str(_) => "string",
            StoredValue::Int(_) => "int",
            StoredValue::Long(_) => "long",
            StoredValue::Float(_) => "float",
            StoredValue::Bool(_) => "bool",
            StoredValue::StringSet(_) => "string set",
        }
    }
}

pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &StoreKey) -> Result<Option<StoredValue>>;

    fn set(&self, key: StoreKey, value: StoredValue) -> Result<()>;

    fn remove(&self, key: &StoreKey) -> Result<()>;

    /// All logical keys and values belonging to `user`, ordered by key.
    fn entries(&self, user: &str) -> Result<Vec<(String, StoredValue)>>;
}

fn user_entries(map: &BTreeMap<StoreKey, StoredValue>, user: &str) -> Vec<(String, StoredValue)> {
    let start = StoreKey::new(user, "");
    map.range(start..)
        .take_while(|(k, _)| k.user == user)
        .map(|(k, v)| (k.key.clone(), v.clone()))
        .collect()
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<StoreKey, StoredValue>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &StoreKey) -> Result<Option<StoredValue>> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn set(&self, key: StoreKey, value: StoredValue) -> Result<()> {
        self.entries.write().insert(key, value);
        Ok(())
    }

    fn remove(&self, key: &StoreKey) -> Result<()> {
        self.entries.write().remove(key);
        Ok(())
    }

    fn entries(&self, user: &str) -> Result<Vec<(String, StoredValue)>> {
        Ok(user_entries(&self.entries.read(), user))
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct PersistedEntry {
    user: String,
    key: String,
    value: StoredValue,
}

/// Map kept in memory and written through to a JSON file after every mutation.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: RwLock<BTreeMap<StoreKey, StoredValue>>,
}

impl JsonFileStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut entries = BTreeMap::new();

        if path.exists() {
            let file = File::open(&path)?;
            let persisted: Vec<PersistedEntry> = serde_json::from_reader(file)?;
            for entry in persisted {
                entries.insert(StoreKey::new(entry.user, entry.key), entry.value);
            }
            info!(path = %path.display(), entries = entries.len(), "Loaded progress store");
        } else {
            debug!(path = %path.display(), "Progress store file not found, starting empty");
        }

        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    // Sibling temp file renamed over the target; the file holds the old or the new snapshot.
    fn save(&self, entries: &BTreeMap<StoreKey, StoredValue>) -> Result<()> {
        let persisted: Vec<PersistedEntry> = entries
            .iter()
            .map(|(k, v)| PersistedEntry {
                user: k.user.clone(),
                key: k.key.clone(),
                value: v.clone(),
            })
            .collect();

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir)?;
        {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            serde_json::to_writer_pretty(&mut writer, &persisted)?;
            writer.flush()?;
        }
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &StoreKey) -> Result<Option<StoredValue>> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn set(&self, key: StoreKey, value: StoredValue) -> Result<()> {
        let mut entries = self.entries.write();
        let previous = entries.insert(key.clone(), value);
        if let Err(e) = self.save(&entries) {
            warn!(path = %self.path.display(), key = %key.key, error = %e, "Failed to persist write, rolling back");
            match previous {
                Some(old) => entries.insert(key, old),
                None => entries.remove(&key),
            };
            return Err(e);
        }
        Ok(())
    }

    fn remove(&self, key: &StoreKey) -> Result<()> {
        let mut entries = self.entries.write();
        let Some(previous) = entries.remove(key) else {
            return Ok(());
        };
        if let Err(e) = self.save(&entries) {
            warn!(path = %self.path.display(), key = %key.key, error = %e, "Failed to persist removal, rolling back");
            entries.insert(key.clone(), previous);
            return Err(e);
        }
        Ok(())
    }

    fn entries(&self, user: &str) -> Result<Vec<(String, StoredValue)>> {
        Ok(user_entries(&self.entries.read(), user))
    }
}

/// View of the store fixed to one user. Absent keys resolve to the default
/// passed by the caller; a value of the wrong kind is a `TypeMismatch`.
pub struct UserScope<'a> {
    store: &'a dyn KeyValueStore,
    user: String,
}

impl<'a> UserScope<'a> {
    pub fn new(store: &'a dyn KeyValueStore, user: impl Into<String>) -> Self {
        Self {
            store,
            user: user.into(),
        }
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    fn key(&self, key: &str) -> StoreKey {
        StoreKey::new(self.user.clone(), key)
    }

    pub fn get(&self, key: &str) -> Result<Option<StoredValue>> {
        self.store.get(&self.key(key))
    }

    pub fn set(&self, key: &str, value: StoredValue) -> Result<()> {
        self.store.set(self.key(key), value)
    }

    pub fn remove(&self, key: &str) -> Result<()> {
        self.store.remove(&self.key(key))
    }

    pub fn get_all(&self) -> Result<BTreeMap<String, StoredValue>> {
        Ok(self.store.entries(&self.user)?.into_iter().collect())
    }

    /// Entries whose key starts with `prefix`, keyed by the remainder.
    pub fn entries_with_prefix(&self, prefix: &str) -> Result<Vec<(String, StoredValue)>> {
        Ok(self
            .store
            .entries(&self.user)?
            .into_iter()
            .filter_map(|(k, v)| k.strip_prefix(prefix).map(|rest| (rest.to_string(), v)))
            .collect())
    }

    fn typed<T>(
        &self,
        key: &str,
        expected: &'static str,
        extract: impl FnOnce(StoredValue) -> std::result::Result<T, StoredValue>,
    ) -> Result<Option<T>> {
        match self.get(key)? {
            None => Ok(None),
            Some(value) => extract(value).map(Some).map_err(|other| ProgressError::TypeMismatch {
                key: key.to_string(),
                expected,
                found: other.kind(),
            }),
        }
    }

    pub fn get_string(&self, key: &str) -> Result<Option<String>> {
        self.typed(key, "string", |v| match v {
            StoredValue::Str(s) => Ok(s),
            other => Err(other),
        })
    }

    pub fn get_int(&self, key: &str, default: i32) -> Result<i32> {
        let value = self.typed(key, "int", |v| match v {
            StoredValue::Int(i) => Ok(i),
            other => Err(other),
        })?;
        Ok(value.unwrap_or(default))
    }

    pub fn get_long(&self, key: &str, default: i64) -> Result<i64> {
        Ok(self.get_long_opt(key)?.unwrap_or(default))
    }

    pub fn get_long_opt(&self, key: &str) -> Result<Option<i64>> {
        self.typed(key, "long", |v| match v {
            StoredValue::Long(l) => Ok(l),
            other => Err(other),
        })
    }

    pub fn get_float(&self, key: &str, default: f32) -> Result<f32> {
        let value = self.typed(key, "float", |v| match v {
            StoredValue::Float(f) => Ok(f),
            other => Err(other),
        })?;
        Ok(value.unwrap_or(default))
    }

    pub fn get_bool(&self, key: &str, default: bool) -> Result<bool> {
        let value = self.typed(key, "bool", |v| match v {
            StoredValue::Bool(b) => Ok(b),
            other => Err(other),
        })?;
        Ok(value.unwrap_or(default))
    }

    pub fn get_string_set(&self, key: &str) -> Result<BTreeSet<String>> {
        let value = self.typed(key, "string set", |v| match v {
            StoredValue::StringSet(s) => Ok(s),
            other => Err(other),
        })?;
        Ok(value.unwrap_or_default())
    }

    pub fn set_string(&self, key: &str, value: impl Into<String>) -> Result<()> {
        self.set(key, StoredValue::Str(value.into()))
    }

    pub fn set_int(&self, key: &str, value: i32) -> Result<()> {
        self.set(key, StoredValue::Int(value))
    }

    pub fn set_long(&self, key: &str, value: i64) -> Result<()> {
        self.set(key, StoredValue::Long(value))
    }

    pub fn set_float(&self, key: &str, value: f32) -> Result<()> {
        self.set(key, StoredValue::Float(value))
    }

    pub fn set_bool(&self, key: &str, value: bool) -> Result<()> {
        self.set(key, StoredValue::Bool(value))
    }

    pub fn set_string_set(&self, key: &str, value: BTreeSet<String>) -> Result<()> {
        self.set(key, StoredValue::StringSet(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_keys_resolve_to_defaults() {
        let store = MemoryStore::new();
        let scope = UserScope::new(&store, "alice");
        assert_eq!(scope.get_int("learning_streak", 0).unwrap(), 0);
        assert_eq!(scope.get_long("last_learning_day", 0).unwrap(), 0);
        assert_eq!(scope.get_float("word_learning_progress", 0.0).unwrap(), 0.0);
        assert!(!scope.get_bool("badge_streak_7", false).unwrap());
        assert!(scope.get_string_set("review_list").unwrap().is_empty());
        assert_eq!(scope.get_string("current_word").unwrap(), None);
    }

    #[test]
    fn users_are_isolated() {
        let store = MemoryStore::new();
        UserScope::new(&store, "alice").set_int("learning_streak", 4).unwrap();
        UserScope::new(&store, "bob").set_int("learning_streak", 9).unwrap();

        assert_eq!(UserScope::new(&store, "alice").get_int("learning_streak", 0).unwrap(), 4);
        assert_eq!(UserScope::new(&store, "bob").get_int("learning_streak", 0).unwrap(), 9);
        assert_eq!(UserScope::new(&store, "carol").get_all().unwrap().len(), 0);
    }

    #[test]
    fn underscore_in_user_id_does_not_leak() {
        // With plain prefix concatenation "a" + "_b_x" and "a_b" + "_x" would collide.
        let store = MemoryStore::new();
        UserScope::new(&store, "a").set_int("b_x", 1).unwrap();
        UserScope::new(&store, "a_b").set_int("x", 2).unwrap();

        let a = UserScope::new(&store, "a").get_all().unwrap();
        assert_eq!(a.len(), 1);
        assert_eq!(a.get("b_x"), Some(&StoredValue::Int(1)));
    }

    #[test]
    fn wrong_kind_is_reported() {
        let store = MemoryStore::new();
        let scope = UserScope::new(&store, "alice");
        scope.set_string("learning_streak", "seven").unwrap();
        let err = scope.get_int("learning_streak", 0).unwrap_err();
        assert!(matches!(
            err,
            ProgressError::TypeMismatch { expected: "int", found: "string", .. }
        ));
    }

    #[test]
    fn prefix_scan_strips_prefix() {
        let store = MemoryStore::new();
        let scope = UserScope::new(&store, "alice");
        scope.set_long("word_review_schedule_猫", 10).unwrap();
        scope.set_long("word_review_schedule_犬", 20).unwrap();
        scope.set_long("grammar_review_schedule_は", 30).unwrap();

        let mut items: Vec<String> = scope
            .entries_with_prefix("word_review_schedule_")
            .unwrap()
            .into_iter()
            .map(|(k, _)| k)
            .collect();
        items.sort();
        assert_eq!(items, vec!["犬".to_string(), "猫".to_string()]);
    }

    #[test]
    fn file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("progress.json");
        {
            let store = JsonFileStore::open(&path).unwrap();
            let scope = UserScope::new(&store, "alice");
            scope.set_int("learning_streak", 3).unwrap();
            scope
                .set_string_set("review_list", ["easy_1".to_string()].into_iter().collect())
                .unwrap();
            scope.set_long("tmp", 1).unwrap();
            scope.remove("tmp").unwrap();
        }

        let store = JsonFileStore::open(&path).unwrap();
        let scope = UserScope::new(&store, "alice");
        assert_eq!(scope.get_int("learning_streak", 0).unwrap(), 3);
        assert!(scope.get_string_set("review_list").unwrap().contains("easy_1"));
        assert_eq!(scope.get("tmp").unwrap(), None);
    }

    #[test]
    fn failed_file_write_leaves_state_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("profile");
        std::fs::create_dir(&sub).unwrap();
        let store = JsonFileStore::open(sub.join("progress.json")).unwrap();
        let scope = UserScope::new(&store, "alice");
        scope.set_int("learning_streak", 2).unwrap();

        std::fs::remove_dir_all(&sub).unwrap();
        assert!(matches!(scope.set_int("learning_streak", 5), Err(ProgressError::Io(_))));
        assert_eq!(scope.get_int("learning_streak", 0).unwrap(), 2);

        assert!(scope.set_int("fresh_key", 1).is_err());
        assert_eq!(scope.get("fresh_key").unwrap(), None);

        assert!(scope.remove("learning_streak").is_err());
        assert_eq!(scope.get_int("learning_streak", 0).unwrap(), 2);
    }

    #[test]
    fn file_writes_leave_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("progress.json");
        let store = JsonFileStore::open(&path).unwrap();
        let scope = UserScope::new(&store, "alice");
        for streak in 1..=5 {
            scope.set_int("learning_streak", streak).unwrap();
        }

        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("progress.json")]);
        let reopened = JsonFileStore::open(&path).unwrap();
        assert_eq!(UserScope::new(&reopened, "alice").get_int("learning_streak", 0).unwrap(), 5);
    }
}
