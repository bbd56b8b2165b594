// Cache store backed by a single JSON file.
// Handles TTL lookups, eviction on read, and full-file persistence on every write.

use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use tracing::debug;

use crate::error::{PostcacheError, Result};

use super::ttl::is_expired;

/// Timestamp layout used in backing files, e.g. `2024-03-01 12:00:00.000000`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// A single cached value with its creation time and retention.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// The cached payload.
    #[serde(rename = "values")]
    pub value: Value,
    /// When the entry was written.
    #[serde(rename = "timestamp", with = "timestamp_format")]
    pub created_at: NaiveDateTime,
    /// Whole days the entry stays fresh.
    #[serde(rename = "expire_in_days")]
    pub ttl_days: i64,
}

impl CacheEntry {
    pub fn new(value: Value, ttl_days: i64, now: NaiveDateTime) -> Self {
        Self {
            value,
            created_at: now,
            ttl_days,
        }
    }

    /// Check if this entry has expired at `now`.
    pub fn is_expired(&self, now: NaiveDateTime) -> bool {
        is_expired(self.created_at, self.ttl_days, now)
    }
}

mod timestamp_format {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    use super::TIMESTAMP_FORMAT;

    // Accepts any number of fractional digits, including none.
    const PARSE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

    pub fn serialize<S: Serializer>(ts: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(&ts.format(TIMESTAMP_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(d)?;
        NaiveDateTime::parse_from_str(&raw, PARSE_FORMAT).map_err(D::Error::custom)
    }
}

/// Identifier-to-entry mapping as stored on disk.
pub type Entries = HashMap<String, CacheEntry>;

/// TTL cache bound to one backing file.
///
/// Identifiers are uppercased on every access. The store is written in full
/// on each `set`; there is no locking, so only one process may own a file.
#[derive(Debug)]
pub struct CacheStore {
    path: PathBuf,
    entries: Entries,
}

impl CacheStore {
    /// Create an empty store for `path` without reading it.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            entries: Entries::new(),
        }
    }

    /// Load the mapping at `path` and bind a store to it.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = Self::load(&path)?;
        debug!(path = %path.display(), entries = entries.len(), "opened cache");
        Ok(Self { path, entries })
    }

    /// Read the mapping stored at `path`.
    ///
    /// A missing or blank file is an empty mapping. Anything else that fails
    /// to parse is reported as corrupt rather than discarded.
    pub fn load(path: &Path) -> Result<Entries> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Entries::new()),
            Err(e) => return Err(PostcacheError::Io(e)),
        };

        if contents.trim().is_empty() {
            return Ok(Entries::new());
        }

        serde_json::from_str(&contents).map_err(|source| PostcacheError::CacheCorrupt {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Fresh value for `identifier`, evicting it from memory if it has expired.
    pub fn get(&mut self, identifier: &str, now: NaiveDateTime) -> Option<&Value> {
        let key = identifier.to_uppercase();

        let expired = self.entries.get(&key)?.is_expired(now);
        if expired {
            debug!(identifier = %key, "cache entry expired");
            self.entries.remove(&key);
            return None;
        }

        self.entries.get(&key).map(|entry| &entry.value)
    }

    /// Typed variant of [`CacheStore::get`].
    pub fn get_as<T: DeserializeOwned>(
        &mut self,
        identifier: &str,
        now: NaiveDateTime,
    ) -> Result<Option<T>> {
        match self.get(identifier, now) {
            Some(value) => Ok(Some(T::deserialize(value)?)),
            None => Ok(None),
        }
    }

    /// Insert or overwrite `identifier` and persist the whole mapping.
    ///
    /// On a persistence error the entry stays in memory but not on disk.
    pub fn set(
        &mut self,
        identifier: &str,
        value: Value,
        ttl_days: i64,
        now: NaiveDateTime,
    ) -> Result<()> {
        let key = identifier.to_uppercase();
        self.entries.insert(key, CacheEntry::new(value, ttl_days, now));
        self.save()
    }

    /// Typed variant of [`CacheStore::set`].
    pub fn set_as<T: Serialize>(
        &mut self,
        identifier: &str,
        value: &T,
        ttl_days: i64,
        now: NaiveDateTime,
    ) -> Result<()> {
        let value = serde_json::to_value(value)?;
        self.set(identifier, value, ttl_days, now)
    }

    /// Drop `identifier`, persisting only if it was present.
    pub fn remove(&mut self, identifier: &str) -> Result<bool> {
        let removed = self.entries.remove(&identifier.to_uppercase()).is_some();
        if removed {
            self.save()?;
        }
        Ok(removed)
    }

    /// Write the full mapping to the backing file.
    pub fn save(&self) -> Result<()> {
        self.write_file().map_err(|source| PostcacheError::Persist {
            path: self.path.clone(),
            source,
        })
    }

    fn write_file(&self) -> io::Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(&self.entries)?;

        // Write atomically via temp file
        let temp_path = self.path.with_extension("tmp");
        let mut file = fs::File::create(&temp_path)?;
        file.write_all(json.as_bytes())?;
        file.sync_all()?;
        fs::rename(&temp_path, &self.path)?;

        Ok(())
    }

    /// Whether an entry exists for `identifier`, expired or not.
    pub fn contains(&self, identifier: &str) -> bool {
        self.entries.contains_key(&identifier.to_uppercase())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
