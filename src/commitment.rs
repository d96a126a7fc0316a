// Commitment store: the per-week secret seeds and the single published
// digest binding them. The digest is SHA-256 over the seeds concatenated in
// ascending week order with no separators; changing that encoding would
// silently break verification of every previously published commitment, so
// it never changes.

use crate::config::SeasonConfig;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommitmentError {
    /// Seed count does not match the configured season length. Fatal: the
    /// season cannot start.
    ConfigMismatch {
        expected_weeks: u32,
        actual_weeks: u32,
    },
    /// The week numbering has a hole; seeds must cover 1..=N.
    MissingWeek { week: u32 },
}

impl fmt::Display for CommitmentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommitmentError::ConfigMismatch {
                expected_weeks,
                actual_weeks,
            } => write!(
                f,
                "expected {} week seeds, got {}",
                expected_weeks, actual_weeks
            ),
            CommitmentError::MissingWeek { week } => {
                write!(f, "no seed committed for week {}", week)
            }
        }
    }
}

/// The published document: `{ "commitment": "<hex-64>", "weeks": { "1":
/// "<seed>", ... } }`. Seeds are generated once, before week 1, and never
/// change; the digest is the season's non-repudiation anchor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CommitmentDocument {
    pub commitment: String,
    pub weeks: BTreeMap<u32, String>,
}

/// Digest over seeds in the given order, hex encoded.
pub fn digest_seeds<'a, I>(seeds: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let mut hasher = Sha256::new();
    for seed in seeds {
        hasher.update(seed.as_bytes());
    }
    hex::encode(hasher.finalize())
}

/// Recompute and compare. Same seed sequence, same digest, always.
pub fn verify_commitment<'a, I>(seeds: I, commitment: &str) -> bool
where
    I: IntoIterator<Item = &'a str>,
{
    digest_seeds(seeds) == commitment
}

impl CommitmentDocument {
    /// Bind an ordered seed list for a whole season. Deterministic: the
    /// digest is a pure function of the seed sequence.
    pub fn commit(config: &SeasonConfig, seeds: Vec<String>) -> Result<Self, CommitmentError> {
        if seeds.len() != config.total_weeks as usize {
            return Err(CommitmentError::ConfigMismatch {
                expected_weeks: config.total_weeks,
                actual_weeks: seeds.len() as u32,
            });
        }
        let commitment = digest_seeds(seeds.iter().map(String::as_str));
        let weeks = seeds
            .into_iter()
            .enumerate()
            .map(|(i, seed)| (i as u32 + 1, seed))
            .collect();
        Ok(Self { commitment, weeks })
    }

    /// Check a loaded document against the season shape: one seed per week,
    /// numbered 1..=total_weeks.
    pub fn check_config(&self, config: &SeasonConfig) -> Result<(), CommitmentError> {
        if self.weeks.len() != config.total_weeks as usize {
            return Err(CommitmentError::ConfigMismatch {
                expected_weeks: config.total_weeks,
                actual_weeks: self.weeks.len() as u32,
            });
        }
        for week in 1..=config.total_weeks {
            if !self.weeks.contains_key(&week) {
                return Err(CommitmentError::MissingWeek { week });
            }
        }
        Ok(())
    }

    /// Recompute the digest from the full seed set and compare with the
    /// published value.
    pub fn verify(&self) -> bool {
        verify_commitment(self.weeks.values().map(String::as_str), &self.commitment)
    }

    pub fn seed(&self, week: u32) -> Option<&str> {
        self.weeks.get(&week).map(String::as_str)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let data = fs::read(path).map_err(|e| format!("{}", e))?;
        serde_json::from_slice(&data).map_err(|e| format!("{}", e))
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), String> {
        let data = serde_json::to_vec_pretty(self).map_err(|e| format!("{}", e))?;
        let path = path.as_ref();
        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, data).map_err(|e| format!("{}", e))?;
        fs::rename(&tmp_path, path).map_err(|e| format!("{}", e))
    }
}
