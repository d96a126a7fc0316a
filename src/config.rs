// Season shape: fixed length, fixed SAFE quota, optional hard-wired final
// week. Immutable for the life of a season.

use crate::draw::Outcome;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonConfig {
    pub total_weeks: u32,
    pub total_quota: u32,
    /// When set, the final week never enters the draw: the configured
    /// outcome is recorded directly and the week counts toward neither the
    /// quota nor the drawable pool. Used when a season ends in a fixed
    /// elimination event (a championship week).
    #[serde(default)]
    pub terminal_week_override: Option<Outcome>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigError {
    NoWeeks,
    QuotaExceedsDrawableWeeks {
        total_quota: u32,
        drawable_weeks: u32,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::NoWeeks => write!(f, "season must have at least one week"),
            ConfigError::QuotaExceedsDrawableWeeks {
                total_quota,
                drawable_weeks,
            } => write!(
                f,
                "quota of {} safes cannot fit in {} drawable weeks",
                total_quota, drawable_weeks
            ),
        }
    }
}

impl SeasonConfig {
    pub fn new(total_weeks: u32, total_quota: u32) -> Self {
        Self {
            total_weeks,
            total_quota,
            terminal_week_override: None,
        }
    }

    pub fn with_terminal_override(mut self, outcome: Outcome) -> Self {
        self.terminal_week_override = Some(outcome);
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.total_weeks == 0 {
            return Err(ConfigError::NoWeeks);
        }
        if self.total_quota > self.drawable_weeks() {
            return Err(ConfigError::QuotaExceedsDrawableWeeks {
                total_quota: self.total_quota,
                drawable_weeks: self.drawable_weeks(),
            });
        }
        Ok(())
    }

    /// Weeks that can actually reach the draw engine.
    pub fn drawable_weeks(&self) -> u32 {
        match self.terminal_week_override {
            Some(_) => self.total_weeks.saturating_sub(1),
            None => self.total_weeks,
        }
    }

    pub fn is_terminal_override_week(&self, week: u32) -> bool {
        self.terminal_week_override.is_some() && week == self.total_weeks
    }
}
