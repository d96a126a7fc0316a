// Independent replay of published draws. No state here: everything is
// recomputed from disclosed values, so any observer can run the same
// checks bit for bit once a week's seed is out.

use crate::commitment::CommitmentDocument;
use crate::config::SeasonConfig;
use crate::draw::{self, DrawError, LowestScore, Outcome};
use crate::ledger::{RebuildError, SeasonLedger, WeekResult};
use crate::storage::StoredWeekResult;

/// Replay one week from its public values and compare with the claimed
/// outcome.
pub fn verify_week(
    week: u32,
    base_seed: &str,
    aux: Option<&LowestScore>,
    claimed: Outcome,
    quota_remaining: u32,
    weeks_remaining: u32,
) -> Result<bool, DrawError> {
    let full_seed = draw::full_seed(base_seed, aux);
    let drawn = draw::draw(week, &full_seed, quota_remaining, weeks_remaining)?;
    Ok(drawn.outcome == claimed)
}

/// Confirm the full seed set reproduces the pre-published digest.
pub fn verify_commitment(doc: &CommitmentDocument) -> bool {
    doc.verify()
}

/// Replay a whole published season: refold the public rows against the
/// committed seeds and hand back the recomputed results. Any tampered
/// outcome surfaces as a rebuild error.
pub fn replay_season(
    config: SeasonConfig,
    doc: &CommitmentDocument,
    rows: &[StoredWeekResult],
) -> Result<Vec<WeekResult>, RebuildError> {
    let ledger = SeasonLedger::rebuild(config, doc, rows)?;
    Ok(ledger.results().to_vec())
}
