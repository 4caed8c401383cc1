/// Calculation history for analytics.
///
/// Two backends:
///  * `MemoryStore`    – bounded, newest first, lost on restart
///  * `JsonLinesStore` – append-only file, one JSON record per line
///
/// Writes are best-effort: callers log a failed `record` and move on.

use std::collections::VecDeque;
use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, RwLock};

use tracing::warn;

use crate::config::{StorageBackend, StorageConfig};
use crate::error::{ConfigError, StoreError};
use crate::models::solar::CalculationRecord;

pub trait CalculationStore: Send + Sync {
    fn backend(&self) -> &'static str;
    fn record(&self, record: CalculationRecord) -> Result<(), StoreError>;
    /// Up to `limit` records, newest first.
    fn recent(&self, limit: usize) -> Result<Vec<CalculationRecord>, StoreError>;
}

pub fn open_store(config: &StorageConfig) -> Result<Arc<dyn CalculationStore>, ConfigError> {
    match config.backend {
        StorageBackend::Memory => Ok(Arc::new(MemoryStore::new(config.max_records))),
        StorageBackend::JsonLines => {
            let path = config.path.clone().ok_or(ConfigError::Invalid {
                field: "storage.path",
                reason: "required by the json_lines backend".to_string(),
            })?;
            Ok(Arc::new(JsonLinesStore::new(path)))
        }
    }
}

// ─── Memory ──────────────────────────────────────────────────

#[derive(Debug)]
pub struct MemoryStore {
    records: RwLock<VecDeque<CalculationRecord>>,
    capacity: usize,
}

impl MemoryStore {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self { records: RwLock::new(VecDeque::with_capacity(capacity.min(64))), capacity }
    }
}

impl CalculationStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    fn record(&self, record: CalculationRecord) -> Result<(), StoreError> {
        let mut records = self.records.write().map_err(|_| StoreError::Poisoned)?;
        records.push_front(record);
        records.truncate(self.capacity);
        Ok(())
    }

    fn recent(&self, limit: usize) -> Result<Vec<CalculationRecord>, StoreError> {
        let records = self.records.read().map_err(|_| StoreError::Poisoned)?;
        Ok(records.iter().take(limit).cloned().collect())
    }
}

// ─── JSON lines ──────────────────────────────────────────────

#[derive(Debug)]
pub struct JsonLinesStore {
    path: PathBuf,
    // serialises appends against reads of a half-written line
    lock: Mutex<()>,
}

impl JsonLinesStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), lock: Mutex::new(()) }
    }
}

impl CalculationStore for JsonLinesStore {
    fn backend(&self) -> &'static str {
        "json_lines"
    }

    fn record(&self, record: CalculationRecord) -> Result<(), StoreError> {
        let mut line = serde_json::to_vec(&record)?;
        line.push(b'\n');

        let _guard = self.lock.lock().map_err(|_| StoreError::Poisoned)?;
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        file.write_all(&line)?;
        Ok(())
    }

    fn recent(&self, limit: usize) -> Result<Vec<CalculationRecord>, StoreError> {
        let _guard = self.lock.lock().map_err(|_| StoreError::Poisoned)?;
        let file = match std::fs::File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut window: VecDeque<CalculationRecord> = VecDeque::with_capacity(limit.min(512));
        for (n, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<CalculationRecord>(&line) {
                Ok(record) => {
                    window.push_back(record);
                    if window.len() > limit {
                        window.pop_front();
                    }
                }
                Err(e) => warn!(path = %self.path.display(), line = n + 1, error = %e, "skipping unreadable calculation record"),
            }
        }
        Ok(window.into_iter().rev().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::solar::{CalculateRequest, SolarResult};
    use chrono::NaiveDate;

    fn record(latitude: f64) -> CalculationRecord {
        let request = CalculateRequest { latitude, longitude: 0.0, offset_angle: None };
        let result = SolarResult {
            optimal_pitch: latitude.abs(),
            optimal_azimuth: 180.0,
            annual_solar_radiation: 4.5,
            efficiency_factor: 0.75,
            estimated_annual_output: 1231.88,
            calculation_date: NaiveDate::from_ymd_opt(2026, 10, 14).unwrap(),
        };
        CalculationRecord::new(&request, &result)
    }

    #[test]
    fn memory_store_keeps_newest_within_capacity() {
        let store = MemoryStore::new(3);
        for lat in [1.0, 2.0, 3.0, 4.0] {
            store.record(record(lat)).unwrap();
        }
        let recent = store.recent(10).unwrap();
        let lats: Vec<f64> = recent.iter().map(|r| r.latitude).collect();
        assert_eq!(lats, vec![4.0, 3.0, 2.0]);
        assert_eq!(store.recent(1).unwrap()[0].latitude, 4.0);
    }

    #[test]
    fn json_lines_store_appends_and_reads_back_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonLinesStore::new(dir.path().join("calculations.jsonl"));
        assert!(store.recent(5).unwrap().is_empty());

        let first = record(10.0);
        store.record(first.clone()).unwrap();
        store.record(record(20.0)).unwrap();
        store.record(record(30.0)).unwrap();

        let recent = store.recent(2).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].latitude, 30.0);
        assert_eq!(recent[1].latitude, 20.0);
        assert_eq!(store.recent(10).unwrap()[2], first);
    }

    #[test]
    fn json_lines_store_skips_corrupt_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("calculations.jsonl");
        let store = JsonLinesStore::new(&path);
        store.record(record(5.0)).unwrap();
        std::fs::OpenOptions::new().append(true).open(&path).unwrap()
            .write_all(b"{truncated\n").unwrap();
        store.record(record(6.0)).unwrap();

        let lats: Vec<f64> = store.recent(10).unwrap().iter().map(|r| r.latitude).collect();
        assert_eq!(lats, vec![6.0, 5.0]);
    }

    #[test]
    fn unwritable_path_is_an_error_not_a_panic() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonLinesStore::new(dir.path().join("missing").join("calculations.jsonl"));
        assert!(matches!(store.record(record(1.0)), Err(StoreError::Io(_))));
    }

    #[test]
    fn open_store_follows_backend() {
        let memory = open_store(&StorageConfig::default()).unwrap();
        assert_eq!(memory.backend(), "memory");

        let config = StorageConfig {
            backend: StorageBackend::JsonLines,
            path: Some(PathBuf::from("calculations.jsonl")),
            max_records: 10,
        };
        assert_eq!(open_store(&config).unwrap().backend(), "json_lines");
    }
}
