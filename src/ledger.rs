// Season ledger: the ordered, immutable week-result sequence and the
// counters derived from it. Reveals are strictly sequential and at most
// once per week; every counter is a fold over the sequence, never an
// independent source of truth.

use crate::commitment::CommitmentDocument;
use crate::config::{ConfigError, SeasonConfig};
use crate::draw::{self, Draw, DrawError, LowestScore, Outcome};
use crate::storage::StoredWeekResult;
use chrono::{DateTime, Utc};
use std::fmt;

/// One revealed week. Created exactly once, never mutated or deleted.
#[derive(Clone, Debug, PartialEq)]
pub struct WeekResult {
    pub week: u32,
    pub base_seed: String,
    pub lowest_score: Option<f64>,
    pub lowest_scorer: Option<String>,
    pub full_seed: String,
    pub outcome: Outcome,
    /// Odds in effect when the draw ran. Display only.
    pub probability_percent: f64,
    pub hash_hex: Option<String>,
    pub revealed_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum RevealError {
    /// Idempotency guard, not a failure: the week is already decided and
    /// the stored result rides along. Nothing was recomputed.
    AlreadyRevealed(Box<WeekResult>),
    /// An earlier week is still unrevealed. Counters are running totals
    /// over a sequential history; skipping ahead would corrupt them.
    OutOfOrder { week: u32, next_unrevealed: u32 },
    /// No seed was committed for this week. Never falls back to a default.
    SeedUnavailable { week: u32 },
    /// The draw engine rejected the derived counters: a ledger bug.
    Protocol(DrawError),
}

impl fmt::Display for RevealError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RevealError::AlreadyRevealed(result) => {
                write!(f, "week {} already revealed ({})", result.week, result.outcome)
            }
            RevealError::OutOfOrder {
                week,
                next_unrevealed,
            } => write!(
                f,
                "cannot reveal week {} before week {}",
                week, next_unrevealed
            ),
            RevealError::SeedUnavailable { week } => {
                write!(f, "no seed committed for week {}", week)
            }
            RevealError::Protocol(e) => write!(f, "{}", e),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum RebuildError {
    Config(ConfigError),
    Reveal(RevealError),
    /// A persisted row disagrees with the replayed outcome: the store was
    /// tampered with or belongs to a different seed set.
    OutcomeMismatch { week: u32, stored_safe: bool },
}

impl fmt::Display for RebuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RebuildError::Config(e) => write!(f, "{}", e),
            RebuildError::Reveal(e) => write!(f, "{}", e),
            RebuildError::OutcomeMismatch { week, stored_safe } => write!(
                f,
                "stored outcome for week {} ({}) does not match replay",
                week,
                if *stored_safe { "SAFE" } else { "CHOP" }
            ),
        }
    }
}

/// Derived season summary for display.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SeasonStats {
    pub safes_used: u32,
    pub safes_remaining: u32,
    pub weeks_revealed: u32,
    pub weeks_remaining: u32,
    pub current_probability_percent: f64,
}

#[derive(Clone, Debug)]
pub struct SeasonLedger {
    config: SeasonConfig,
    results: Vec<WeekResult>,
}

impl SeasonLedger {
    pub fn new(config: SeasonConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            results: Vec::new(),
        })
    }

    pub fn config(&self) -> &SeasonConfig {
        &self.config
    }

    /// All revealed weeks, in week order.
    pub fn results(&self) -> &[WeekResult] {
        &self.results
    }

    pub fn result(&self, week: u32) -> Option<&WeekResult> {
        let idx = week.checked_sub(1)? as usize;
        self.results.get(idx)
    }

    /// SAFE outcomes among drawn weeks. An overridden terminal week never
    /// counts, whatever its recorded outcome.
    pub fn quota_used(&self) -> u32 {
        self.results
            .iter()
            .filter(|r| r.outcome.is_safe() && !self.config.is_terminal_override_week(r.week))
            .count() as u32
    }

    pub fn weeks_revealed(&self) -> u32 {
        self.results.len() as u32
    }

    pub fn quota_remaining(&self) -> u32 {
        self.config.total_quota.saturating_sub(self.quota_used())
    }

    /// Drawable weeks not yet revealed.
    pub fn draw_weeks_remaining(&self) -> u32 {
        self.config
            .drawable_weeks()
            .saturating_sub(self.weeks_revealed())
    }

    /// First unrevealed week, if the season is still running.
    pub fn next_week(&self) -> Option<u32> {
        let next = self.weeks_revealed() + 1;
        (next <= self.config.total_weeks).then_some(next)
    }

    pub fn stats(&self) -> SeasonStats {
        let safes_used = self.quota_used();
        let safes_remaining = self.config.total_quota.saturating_sub(safes_used);
        let weeks_revealed = self.weeks_revealed();
        let draw_weeks = self.draw_weeks_remaining();
        let current_probability_percent = if safes_remaining > 0 && draw_weeks > 0 {
            f64::from(safes_remaining) / f64::from(draw_weeks) * 100.0
        } else {
            0.0
        };
        SeasonStats {
            safes_used,
            safes_remaining,
            weeks_revealed,
            weeks_remaining: self.config.total_weeks.saturating_sub(weeks_revealed),
            current_probability_percent,
        }
    }

    /// Decide one week: the committed seed joined with the auxiliary input
    /// feeds the draw, the counters come from the revealed history, and the
    /// result is appended to it.
    pub fn reveal_week(
        &mut self,
        seeds: &CommitmentDocument,
        week: u32,
        aux: Option<&LowestScore>,
        revealed_at: DateTime<Utc>,
    ) -> Result<WeekResult, RevealError> {
        if week == 0 || week > self.config.total_weeks {
            return Err(RevealError::SeedUnavailable { week });
        }
        if let Some(existing) = self.result(week) {
            return Err(RevealError::AlreadyRevealed(Box::new(existing.clone())));
        }
        let next = self.weeks_revealed() + 1;
        if week != next {
            return Err(RevealError::OutOfOrder {
                week,
                next_unrevealed: next,
            });
        }
        let base_seed = seeds
            .seed(week)
            .ok_or(RevealError::SeedUnavailable { week })?;
        let full_seed = draw::full_seed(base_seed, aux);

        let drawn = match self.config.terminal_week_override {
            Some(outcome) if week == self.config.total_weeks => Draw {
                outcome,
                probability_percent: match outcome {
                    Outcome::Safe => 100.0,
                    Outcome::Chop => 0.0,
                },
                hash_hex: None,
                threshold_hex: None,
            },
            _ => draw::draw(
                week,
                &full_seed,
                self.quota_remaining(),
                self.draw_weeks_remaining(),
            )
            .map_err(RevealError::Protocol)?,
        };

        let result = WeekResult {
            week,
            base_seed: base_seed.to_string(),
            lowest_score: aux.map(|a| a.value),
            lowest_scorer: aux.and_then(|a| a.scorer.clone()),
            full_seed,
            outcome: drawn.outcome,
            probability_percent: drawn.probability_percent,
            hash_hex: drawn.hash_hex,
            revealed_at,
        };
        self.results.push(result.clone());
        Ok(result)
    }

    /// Refold persisted rows into a ledger, replaying every outcome from
    /// the committed seeds. Rows must arrive in ascending week order; a row
    /// whose stored outcome disagrees with the replay is rejected.
    pub fn rebuild(
        config: SeasonConfig,
        seeds: &CommitmentDocument,
        rows: &[StoredWeekResult],
    ) -> Result<Self, RebuildError> {
        let mut ledger = Self::new(config).map_err(RebuildError::Config)?;
        for row in rows {
            let aux = row.lowest_score.map(|value| LowestScore {
                value,
                scorer: row.lowest_scorer.clone(),
            });
            let result = ledger
                .reveal_week(seeds, row.week, aux.as_ref(), row.revealed_at)
                .map_err(RebuildError::Reveal)?;
            if result.outcome.is_safe() != row.is_safe {
                return Err(RebuildError::OutcomeMismatch {
                    week: row.week,
                    stored_safe: row.is_safe,
                });
            }
        }
        Ok(ledger)
    }
}
