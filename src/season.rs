// Season runner: the one place reveals are serialized and the wall clock is
// read. The mutexed ledger is the single writer; the result store is a
// recoverable cache of the in-memory sequence, refolded on open.

use crate::commitment::{CommitmentDocument, CommitmentError};
use crate::config::{ConfigError, SeasonConfig};
use crate::draw::LowestScore;
use crate::ledger::{RebuildError, RevealError, SeasonLedger, SeasonStats, WeekResult};
use crate::storage::{ResultStore, StoredWeekResult};
use chrono::Utc;
use std::fmt;
use std::sync::{Mutex, PoisonError};

#[derive(Clone, Debug, PartialEq)]
pub enum SeasonError {
    Config(ConfigError),
    Commitment(CommitmentError),
    /// The document's digest does not reproduce from its own seeds. The
    /// season must not start over a broken anchor.
    CommitmentBroken,
    Store(String),
    Rebuild(RebuildError),
}

impl fmt::Display for SeasonError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeasonError::Config(e) => write!(f, "{}", e),
            SeasonError::Commitment(e) => write!(f, "{}", e),
            SeasonError::CommitmentBroken => {
                write!(f, "published commitment does not match its seeds")
            }
            SeasonError::Store(e) => write!(f, "result store: {}", e),
            SeasonError::Rebuild(e) => write!(f, "{}", e),
        }
    }
}

pub struct Season {
    seeds: CommitmentDocument,
    ledger: Mutex<SeasonLedger>,
    store: Option<Box<dyn ResultStore + Send + Sync>>,
}

impl Season {
    /// Check the commitment against the season shape and its own digest,
    /// then refold any persisted rows into the ledger.
    pub fn open(
        config: SeasonConfig,
        seeds: CommitmentDocument,
        store: Option<Box<dyn ResultStore + Send + Sync>>,
    ) -> Result<Self, SeasonError> {
        config.validate().map_err(SeasonError::Config)?;
        seeds.check_config(&config).map_err(SeasonError::Commitment)?;
        if !seeds.verify() {
            return Err(SeasonError::CommitmentBroken);
        }
        let rows = match &store {
            Some(s) => s.load_all().map_err(SeasonError::Store)?,
            None => Vec::new(),
        };
        let ledger = SeasonLedger::rebuild(config, &seeds, &rows).map_err(SeasonError::Rebuild)?;
        Ok(Self {
            seeds,
            ledger: Mutex::new(ledger),
            store,
        })
    }

    /// The one critical section: derive counters, draw, record, persist.
    /// Two racing calls for the same week see exactly one winner; the loser
    /// gets `AlreadyRevealed` with the stored row. A persistence failure is
    /// logged and does not lose the in-memory result.
    pub fn reveal_week(
        &self,
        week: u32,
        aux: Option<&LowestScore>,
    ) -> Result<WeekResult, RevealError> {
        let mut ledger = self.ledger.lock().unwrap_or_else(PoisonError::into_inner);
        let result = match ledger.reveal_week(&self.seeds, week, aux, Utc::now()) {
            Ok(result) => result,
            Err(e) => {
                if matches!(e, RevealError::Protocol(_)) {
                    eprintln!("week {} reveal hit impossible counters: {}", week, e);
                }
                return Err(e);
            }
        };
        if let Some(store) = &self.store {
            if let Err(e) = store.append(&StoredWeekResult::from(&result)) {
                eprintln!("week {} result save failed: {}", week, e);
            }
        }
        Ok(result)
    }

    pub fn results(&self) -> Vec<WeekResult> {
        self.ledger
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .results()
            .to_vec()
    }

    pub fn result(&self, week: u32) -> Option<WeekResult> {
        self.ledger
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .result(week)
            .cloned()
    }

    pub fn stats(&self) -> SeasonStats {
        self.ledger
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .stats()
    }

    pub fn next_week(&self) -> Option<u32> {
        self.ledger
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .next_week()
    }

    pub fn config(&self) -> SeasonConfig {
        *self
            .ledger
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .config()
    }

    pub fn commitment(&self) -> &CommitmentDocument {
        &self.seeds
    }
}
