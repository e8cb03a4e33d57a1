//! Per-year snapshot cache.
//!
//! Layout: `{cache_dir}/{pattern with the wildcard replaced by the year}`
//!
//! Features:
//! - Brotli-compressed JSON payload, one file per calendar year
//! - Atomic writes (write to .tmp, fsync, rename into place)
//! - Missing file is a cache miss, not an error
//! - Year invariant validated on load (every day key inside the file's year)
//! - Directory enumeration reads the year from the wildcard positions only

use super::pattern::FilePattern;
use crate::domain::{DayRecord, YearSnapshot};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

const BROTLI_BUFFER: usize = 4096;
const BROTLI_QUALITY: u32 = 9;
const BROTLI_WINDOW: u32 = 22;

/// Errors from cache I/O. The sync engine treats every load error as a miss.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache I/O on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to encode snapshot for {year}: {reason}")]
    Encode { year: i32, reason: String },

    #[error("corrupt cache file {path}: {reason}")]
    Decode { path: PathBuf, reason: String },

    #[error("cache file for {year} holds dates outside that year: {keys:?}")]
    OutOfYear { year: i32, keys: Vec<String> },
}

/// On-disk payload. Plant identity is stored with the year data so
/// a title can be rendered without going online.
#[derive(Serialize)]
struct PayloadRef<'a> {
    complete: bool,
    year_production: f64,
    days: &'a BTreeMap<String, DayRecord>,
    plant_id: &'a str,
    plant_name: &'a str,
}

#[derive(Deserialize)]
struct Payload {
    complete: bool,
    year_production: f64,
    days: BTreeMap<String, DayRecord>,
    #[serde(default)]
    plant_id: String,
    #[serde(default)]
    plant_name: String,
}

/// The per-year snapshot cache.
#[derive(Debug, Clone)]
pub struct YearCache {
    cache_dir: PathBuf,
    pattern: FilePattern,
}

impl YearCache {
    pub fn new(cache_dir: impl Into<PathBuf>, pattern: FilePattern) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            pattern,
        }
    }

    /// Root directory of the cache.
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn pattern(&self) -> &FilePattern {
        &self.pattern
    }

    /// Path to the file for `year`.
    pub fn year_path(&self, year: i32) -> PathBuf {
        self.cache_dir.join(self.pattern.file_name(year))
    }

    /// Load the snapshot for `year`. `Ok(None)` when no file exists.
    pub fn load(&self, year: i32) -> Result<Option<YearSnapshot>, CacheError> {
        let path = self.year_path(year);
        let compressed = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(CacheError::Io { path, source }),
        };

        let mut json = Vec::new();
        brotli::Decompressor::new(compressed.as_slice(), BROTLI_BUFFER)
            .read_to_end(&mut json)
            .map_err(|e| CacheError::Decode {
                path: path.clone(),
                reason: format!("decompress: {e}"),
            })?;
        let payload: Payload = serde_json::from_slice(&json).map_err(|e| CacheError::Decode {
            path: path.clone(),
            reason: format!("parse: {e}"),
        })?;

        let snapshot = YearSnapshot {
            year,
            complete: payload.complete,
            year_production: payload.year_production,
            days: payload.days,
            plant_id: payload.plant_id,
            plant_name: payload.plant_name,
        };

        let foreign = snapshot.foreign_keys();
        if !foreign.is_empty() {
            return Err(CacheError::OutOfYear {
                year,
                keys: foreign.into_iter().map(str::to_string).collect(),
            });
        }

        debug!(year, days = snapshot.days.len(), complete = snapshot.complete, "cache loaded");
        Ok(Some(snapshot))
    }

    /// Write the snapshot, replacing any previous file for its year.
    ///
    /// Writes are atomic: the payload goes to a .tmp sibling which is renamed
    /// into place once flushed, so a reader never sees a partial file.
    pub fn save(&self, snapshot: &YearSnapshot) -> Result<PathBuf, CacheError> {
        let foreign = snapshot.foreign_keys();
        if !foreign.is_empty() {
            return Err(CacheError::OutOfYear {
                year: snapshot.year,
                keys: foreign.into_iter().map(str::to_string).collect(),
            });
        }

        let payload = PayloadRef {
            complete: snapshot.complete,
            year_production: snapshot.year_production,
            days: &snapshot.days,
            plant_id: &snapshot.plant_id,
            plant_name: &snapshot.plant_name,
        };
        let json = serde_json::to_vec(&payload).map_err(|e| CacheError::Encode {
            year: snapshot.year,
            reason: e.to_string(),
        })?;

        let mut compressed = Vec::new();
        {
            let mut writer = brotli::CompressorWriter::new(
                &mut compressed,
                BROTLI_BUFFER,
                BROTLI_QUALITY,
                BROTLI_WINDOW,
            );
            writer.write_all(&json).map_err(|e| CacheError::Encode {
                year: snapshot.year,
                reason: format!("compress: {e}"),
            })?;
            // Dropping the writer finishes the brotli stream.
        }

        fs::create_dir_all(&self.cache_dir).map_err(|source| CacheError::Io {
            path: self.cache_dir.clone(),
            source,
        })?;

        let path = self.year_path(snapshot.year);
        let mut tmp_name = path.clone().into_os_string();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);

        write_synced(&tmp_path, &compressed).map_err(|source| {
            let _ = fs::remove_file(&tmp_path);
            CacheError::Io {
                path: tmp_path.clone(),
                source,
            }
        })?;

        fs::rename(&tmp_path, &path).map_err(|source| {
            // Clean up temp file on rename failure
            let _ = fs::remove_file(&tmp_path);
            CacheError::Io {
                path: path.clone(),
                source,
            }
        })?;

        debug!(year = snapshot.year, path = %path.display(), "cache saved");
        Ok(path)
    }

    /// Years that have a cache file in the directory.
    pub fn list_local_years(&self) -> BTreeSet<i32> {
        let entries = match fs::read_dir(&self.cache_dir) {
            Ok(entries) => entries,
            Err(e) => {
                if e.kind() != io::ErrorKind::NotFound {
                    warn!(dir = %self.cache_dir.display(), error = %e, "cannot scan cache directory");
                }
                return BTreeSet::new();
            }
        };

        entries
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
            .filter_map(|entry| {
                let name = entry.file_name();
                self.pattern.year_of(name.to_str()?)
            })
            .collect()
    }
}

fn write_synced(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}
