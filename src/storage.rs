// Persistence boundary: the row shape external stores see, plus a JSON
// file store. Rows always come back in ascending week order; the ledger's
// counters are defined over that order.

use crate::ledger::WeekResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// What leaves the process per revealed week. `revealed_at` serializes as
/// an ISO-8601 timestamp.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StoredWeekResult {
    pub week: u32,
    pub lowest_score: Option<f64>,
    pub lowest_scorer: Option<String>,
    pub is_safe: bool,
    pub revealed_at: DateTime<Utc>,
}

impl From<&WeekResult> for StoredWeekResult {
    fn from(r: &WeekResult) -> Self {
        Self {
            week: r.week,
            lowest_score: r.lowest_score,
            lowest_scorer: r.lowest_scorer.clone(),
            is_safe: r.outcome.is_safe(),
            revealed_at: r.revealed_at,
        }
    }
}

/// Narrow sink/source for week results. Implementations decide where rows
/// live; callers rely only on append plus ordered load.
pub trait ResultStore {
    fn load_all(&self) -> Result<Vec<StoredWeekResult>, String>;
    fn append(&self, row: &StoredWeekResult) -> Result<(), String>;
}

pub struct JsonResultStore {
    path: PathBuf,
}

impl JsonResultStore {
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Result<Self, String> {
        fs::create_dir_all(&data_dir).map_err(|e| format!("{}", e))?;
        Ok(Self {
            path: data_dir.as_ref().join("season_results.json"),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self, rows: &[StoredWeekResult]) -> Result<(), String> {
        let data = serde_json::to_vec_pretty(rows).map_err(|e| format!("{}", e))?;
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, data).map_err(|e| format!("{}", e))?;
        fs::rename(&tmp_path, &self.path).map_err(|e| format!("{}", e))
    }
}

impl ResultStore for JsonResultStore {
    fn load_all(&self) -> Result<Vec<StoredWeekResult>, String> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let data = fs::read(&self.path).map_err(|e| format!("{}", e))?;
        let mut rows: Vec<StoredWeekResult> =
            serde_json::from_slice(&data).map_err(|e| format!("{}", e))?;
        rows.sort_by_key(|r| r.week);
        Ok(rows)
    }

    fn append(&self, row: &StoredWeekResult) -> Result<(), String> {
        let mut rows = self.load_all()?;
        rows.push(row.clone());
        rows.sort_by_key(|r| r.week);
        self.save(&rows)
    }
}
