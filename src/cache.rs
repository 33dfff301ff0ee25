use std::collections::BTreeMap;
use std::fs;
use std::io;

use camino::Utf8Path;
use tracing::{debug, info, warn};

use crate::domain::{KoId, PathwayRecord};
use crate::error::Ko2PathwayError;
use crate::fs_util;

/// Persistent KO -> pathway mapping, stored as one JSON object keyed by KO.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PathwayCache {
    entries: BTreeMap<KoId, Vec<PathwayRecord>>,
}

impl PathwayCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Never fails: a missing, unreadable or malformed file yields an empty cache.
    pub fn load(path: &Utf8Path) -> Self {
        match Self::try_load(path) {
            Ok(Some(cache)) => {
                info!(path = %path, entries = cache.len(), "loaded pathway cache");
                cache
            }
            Ok(None) => {
                info!(path = %path, "no pathway cache yet, starting empty");
                Self::new()
            }
            Err(err) => {
                warn!(path = %path, error = %err, "ignoring unusable pathway cache");
                Self::new()
            }
        }
    }

    pub fn try_load(path: &Utf8Path) -> Result<Option<Self>, Ko2PathwayError> {
        let content = match fs::read_to_string(path.as_std_path()) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(Ko2PathwayError::CacheRead(err.to_string())),
        };
        let entries: BTreeMap<KoId, Vec<PathwayRecord>> = serde_json::from_str(&content)
            .map_err(|err| Ko2PathwayError::CacheRead(err.to_string()))?;
        Ok(Some(Self { entries }))
    }

    /// Overwrites `path` with the full mapping.
    pub fn save(&self, path: &Utf8Path) -> Result<(), Ko2PathwayError> {
        let content = serde_json::to_vec_pretty(&self.entries)
            .map_err(|err| Ko2PathwayError::CacheWrite(err.to_string()))?;
        fs_util::write_atomic(path.as_std_path(), &content)
            .map_err(|err| Ko2PathwayError::CacheWrite(format!("{path}: {err}")))?;
        debug!(path = %path, entries = self.len(), "saved pathway cache");
        Ok(())
    }

    pub fn lookup(&self, ko: &KoId) -> Option<&[PathwayRecord]> {
        self.entries.get(ko).map(Vec::as_slice)
    }

    pub fn contains(&self, ko: &KoId) -> bool {
        self.entries.contains_key(ko)
    }

    /// Adds a resolution. Existing entries are kept; returns whether `ko` was new.
    pub fn insert(&mut self, ko: KoId, records: Vec<PathwayRecord>) -> bool {
        if self.entries.contains_key(&ko) {
            return false;
        }
        self.entries.insert(ko, records);
        true
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&KoId, &[PathwayRecord])> {
        self.entries
            .iter()
            .map(|(ko, records)| (ko, records.as_slice()))
    }
}
