//! Feedback Record Stores
//!
//! Records carry hashes of the secret and context, never the raw text.
//! `JsonlRecordStore` appends one JSON object per line and rotates files
//! by size.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{sha256_hex, RecordStore};
use crate::logic::error::{EngineError, EngineResult};
use crate::logic::features::{FeatureVector, LayoutInfo};
use crate::logic::labels::ConfidenceLevel;

const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024; // 10 MB

// ============================================================================
// RECORD
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackRecord {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,

    pub secret_hash: String,
    pub context_hash: String,

    pub feature_version: u8,
    pub layout_hash: u32,
    pub features: Vec<f32>,

    pub label: ConfidenceLevel,
    /// confirmed_secret, ignored_warning, ...
    pub user_action: String,
    /// Model confidence at feedback time
    pub confidence: f32,
    pub model_version: String,
}

impl FeedbackRecord {
    pub fn new(
        secret: &str,
        context: &str,
        features: &FeatureVector,
        label: ConfidenceLevel,
        user_action: impl Into<String>,
        confidence: f32,
        model_version: impl Into<String>,
    ) -> Self {
        let layout = LayoutInfo::current();
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            secret_hash: sha256_hex(secret),
            context_hash: sha256_hex(context),
            feature_version: layout.version,
            layout_hash: layout.hash,
            features: features.to_vec(),
            label,
            user_action: user_action.into(),
            confidence,
            model_version: model_version.into(),
        }
    }
}

/// Query filter; unset fields match everything
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordFilter {
    pub label: Option<ConfidenceLevel>,
    pub model_version: Option<String>,
    pub limit: Option<usize>,
}

impl RecordFilter {
    pub fn matches(&self, record: &FeedbackRecord) -> bool {
        self.label.map_or(true, |l| l == record.label)
            && self
                .model_version
                .as_deref()
                .map_or(true, |v| v == record.model_version)
    }

    /// Newest first, truncated to `limit`
    fn apply(&self, records: impl DoubleEndedIterator<Item = FeedbackRecord>) -> Vec<FeedbackRecord> {
        let matching = records.rev().filter(|r| self.matches(r));
        match self.limit {
            Some(limit) => matching.take(limit).collect(),
            None => matching.collect(),
        }
    }
}

// ============================================================================
// MEMORY STORE
// ============================================================================

#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    records: Mutex<Vec<FeedbackRecord>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

impl RecordStore for MemoryRecordStore {
    fn append(&self, record: &FeedbackRecord) -> EngineResult<()> {
        self.records.lock().push(record.clone());
        Ok(())
    }

    fn query(&self, filter: &RecordFilter) -> EngineResult<Vec<FeedbackRecord>> {
        let records = self.records.lock();
        Ok(filter.apply(records.iter().cloned()))
    }
}

// ============================================================================
// JSONL STORE
// ============================================================================

pub struct JsonlRecordStore {
    file: Mutex<Option<File>>,
    base_dir: PathBuf,
    max_file_size: u64,
}

impl JsonlRecordStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> EngineResult<Self> {
        Self::with_max_file_size(base_dir, MAX_FILE_SIZE)
    }

    pub fn with_max_file_size(base_dir: impl Into<PathBuf>, max_file_size: u64) -> EngineResult<Self> {
        let base_dir = base_dir.into();
        fs::create_dir_all(&base_dir)?;

        Ok(Self {
            file: Mutex::new(None),
            base_dir,
            max_file_size,
        })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Log files, oldest first (timestamped names sort chronologically)
    pub fn log_files(&self) -> EngineResult<Vec<PathBuf>> {
        let mut entries = fs::read_dir(&self.base_dir)?
            .filter_map(|res| res.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().map_or(false, |ext| ext == "jsonl"))
            .collect::<Vec<_>>();
        entries.sort();
        Ok(entries)
    }

    fn create_new_file(&self) -> EngineResult<File> {
        // YYYY-MM-DD-HHMMSS-millis, plus a short id so fast rotations never collide
        let now = Utc::now();
        let suffix = Uuid::new_v4().simple().to_string();
        let filename = format!("feedback-{}-{}.jsonl", now.format("%Y-%m-%d-%H%M%S-%3f"), &suffix[..8]);
        let path = self.base_dir.join(filename);

        Ok(OpenOptions::new().create(true).append(true).open(path)?)
    }

    fn open_current(&self) -> EngineResult<File> {
        if let Some(path) = self.log_files()?.pop() {
            let f = OpenOptions::new().create(true).append(true).open(&path)?;
            if f.metadata()?.len() < self.max_file_size {
                return Ok(f);
            }
        }
        self.create_new_file()
    }

    fn read_file(path: &Path) -> EngineResult<Vec<FeedbackRecord>> {
        let reader = BufReader::new(File::open(path)?);
        let mut records = Vec::new();

        for (n, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<FeedbackRecord>(&line) {
                Ok(r) => records.push(r),
                Err(e) => log::warn!("Skipping bad record {}:{}: {}", path.display(), n + 1, e),
            }
        }
        Ok(records)
    }
}

impl RecordStore for JsonlRecordStore {
    fn append(&self, record: &FeedbackRecord) -> EngineResult<()> {
        let mut guard = self.file.lock();

        if guard.is_none() {
            *guard = Some(self.open_current()?);
        }

        let should_rotate = match guard.as_ref() {
            Some(f) => f.metadata()?.len() >= self.max_file_size,
            None => false,
        };
        if should_rotate {
            log::debug!("Rotating feedback log in {}", self.base_dir.display());
            *guard = Some(self.create_new_file()?);
        }

        let file = guard
            .as_mut()
            .ok_or_else(|| EngineError::Store("feedback log not open".to_string()))?;
        let json = serde_json::to_string(record)?;
        writeln!(file, "{}", json)?;
        Ok(())
    }

    fn query(&self, filter: &RecordFilter) -> EngineResult<Vec<FeedbackRecord>> {
        let mut all = Vec::new();
        for path in self.log_files()? {
            all.extend(Self::read_file(&path)?);
        }
        Ok(filter.apply(all.into_iter()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn record(label: ConfidenceLevel, version: &str) -> FeedbackRecord {
        FeedbackRecord::new(
            "sk-secret",
            "const k = 'sk-secret'",
            &FeatureVector::new(),
            label,
            "confirmed_secret",
            0.8,
            version,
        )
    }

    #[test]
    fn test_record_hashes_inputs() {
        let r = record(ConfidenceLevel::High, "default");
        assert_eq!(r.secret_hash, sha256_hex("sk-secret"));
        assert_ne!(r.secret_hash, r.context_hash);
        assert!(r.features.len() == crate::logic::features::FEATURE_COUNT);
        assert_eq!(r.layout_hash, LayoutInfo::current().hash);
    }

    #[test]
    fn test_memory_store_filter() {
        let store = MemoryRecordStore::new();
        store.append(&record(ConfidenceLevel::High, "default")).unwrap();
        store.append(&record(ConfidenceLevel::Low, "default")).unwrap();
        store.append(&record(ConfidenceLevel::High, "v2")).unwrap();

        let all = store.query(&RecordFilter::default()).unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].model_version, "v2");

        let high = store
            .query(&RecordFilter { label: Some(ConfidenceLevel::High), ..Default::default() })
            .unwrap();
        assert_eq!(high.len(), 2);

        let limited = store
            .query(&RecordFilter { model_version: Some("default".into()), limit: Some(1), ..Default::default() })
            .unwrap();
        assert_eq!(limited.len(), 1);
        assert_eq!(limited[0].label, ConfidenceLevel::Low);
    }

    #[test]
    fn test_jsonl_append_and_query() {
        let dir = tempdir().unwrap();
        let store = JsonlRecordStore::new(dir.path()).unwrap();

        let first = record(ConfidenceLevel::Medium, "default");
        store.append(&first).unwrap();
        store.append(&record(ConfidenceLevel::FalsePositive, "default")).unwrap();

        let files = store.log_files().unwrap();
        assert_eq!(files.len(), 1);

        let content = fs::read_to_string(&files[0]).unwrap();
        assert_eq!(content.lines().count(), 2);
        assert!(!content.contains("sk-secret"));

        let all = store.query(&RecordFilter::default()).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[1], first);
    }

    #[test]
    fn test_jsonl_rotation() {
        let dir = tempdir().unwrap();
        let store = JsonlRecordStore::with_max_file_size(dir.path(), 1).unwrap();

        store.append(&record(ConfidenceLevel::High, "default")).unwrap();
        store.append(&record(ConfidenceLevel::High, "default")).unwrap();

        assert_eq!(store.log_files().unwrap().len(), 2);
        assert_eq!(store.query(&RecordFilter::default()).unwrap().len(), 2);
    }

    #[test]
    fn test_jsonl_skips_bad_lines() {
        let dir = tempdir().unwrap();
        let store = JsonlRecordStore::new(dir.path()).unwrap();
        store.append(&record(ConfidenceLevel::High, "default")).unwrap();

        let path = store.log_files().unwrap().remove(0);
        let mut f = OpenOptions::new().append(true).open(&path).unwrap();
        writeln!(f, "{{ broken").unwrap();

        assert_eq!(store.query(&RecordFilter::default()).unwrap().len(), 1);
    }

    #[test]
    fn test_jsonl_reopen_appends_to_latest() {
        let dir = tempdir().unwrap();
        {
            let store = JsonlRecordStore::new(dir.path()).unwrap();
            store.append(&record(ConfidenceLevel::Low, "default")).unwrap();
        }
        let store = JsonlRecordStore::new(dir.path()).unwrap();
        store.append(&record(ConfidenceLevel::Low, "default")).unwrap();

        assert_eq!(store.log_files().unwrap().len(), 1);
        assert_eq!(store.query(&RecordFilter::default()).unwrap().len(), 2);
    }
}
