// Deterministic fair-draw core: pre-committed seeds in, replayable
// SAFE/CHOP decisions out.

pub mod commitment;
pub mod config;
pub mod draw;
pub mod ledger;
pub mod season;
pub mod storage;
pub mod verify;

// Global constants for the public verification contract
pub const LOWEST_SCORE_TAG: &str = "_LOWEST_SCORE_";

// No randomness source anywhere; reveal timestamps are injected into the
// ledger, and only the season runner reads the wall clock.

/*
The decision path (draw, ledger, verify) intentionally avoids:
- async
- wall clock access
- floating point
- external IO
*/
