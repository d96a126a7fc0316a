// Draw engine: decides one week's SAFE/CHOP from the week's full seed and
// the running quota counters. The decision path is exact integer work only;
// probability is carried alongside for display and never compared.

use sha2::{Digest, Sha256};
use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Outcome {
    Safe,
    Chop,
}

impl Outcome {
    pub fn is_safe(self) -> bool {
        matches!(self, Outcome::Safe)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Outcome::Safe => "SAFE",
            Outcome::Chop => "CHOP",
        })
    }
}

/// The week's auxiliary input: the league's lowest score, unknown until the
/// week finishes. Only the value feeds the seed; the scorer is recorded for
/// the audit trail.
#[derive(Clone, Debug, PartialEq)]
pub struct LowestScore {
    pub value: f64,
    pub scorer: Option<String>,
}

impl LowestScore {
    pub fn new(value: f64, scorer: impl Into<String>) -> Self {
        Self {
            value,
            scorer: Some(scorer.into()),
        }
    }

    pub fn unattributed(value: f64) -> Self {
        Self {
            value,
            scorer: None,
        }
    }
}

/// Textual join the public verification contract depends on: the committed
/// base seed alone, or `<base>_LOWEST_SCORE_<value>` with the score in its
/// natural decimal form (no trailing zeros beyond what the value needs).
/// Anyone holding the base seed and the disclosed score must reproduce this
/// byte-for-byte.
pub fn full_seed(base_seed: &str, aux: Option<&LowestScore>) -> String {
    match aux {
        Some(low) => format!("{}{}{}", base_seed, crate::LOWEST_SCORE_TAG, low.value),
        None => base_seed.to_string(),
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DrawError {
    /// Impossible counters: the caller is drawing past the end of the
    /// season or tracking quota wrong. Never coerced to a usable value.
    ProtocolViolation {
        week: u32,
        quota_remaining: u32,
        weeks_remaining: u32,
    },
}

impl fmt::Display for DrawError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DrawError::ProtocolViolation {
                week,
                quota_remaining,
                weeks_remaining,
            } => write!(
                f,
                "week {}: impossible draw counters ({} safes over {} weeks)",
                week, quota_remaining, weeks_remaining
            ),
        }
    }
}

/// One decided draw. `hash_hex` and `threshold_hex` are disclosed for the
/// verification panel and are `None` on the two forced branches, which never
/// hash anything.
#[derive(Clone, Debug, PartialEq)]
pub struct Draw {
    pub outcome: Outcome,
    /// Odds in effect when the draw ran, as a percentage. Display only.
    pub probability_percent: f64,
    pub hash_hex: Option<String>,
    pub threshold_hex: Option<String>,
}

/// Decide a week.
///
/// Order matters: exhausted quota forces CHOP, quota equal to the remaining
/// weeks forces SAFE (the remaining safes must fill every remaining week),
/// and only between those bounds does the seed hash get a say. The hash is
/// read as a big-endian 256-bit integer and compared against
/// `floor(quota * 2^256 / weeks)` computed exactly.
pub fn draw(
    week: u32,
    full_seed: &str,
    quota_remaining: u32,
    weeks_remaining: u32,
) -> Result<Draw, DrawError> {
    if weeks_remaining == 0 || quota_remaining > weeks_remaining {
        return Err(DrawError::ProtocolViolation {
            week,
            quota_remaining,
            weeks_remaining,
        });
    }

    if quota_remaining == 0 {
        return Ok(Draw {
            outcome: Outcome::Chop,
            probability_percent: 0.0,
            hash_hex: None,
            threshold_hex: None,
        });
    }

    if quota_remaining == weeks_remaining {
        return Ok(Draw {
            outcome: Outcome::Safe,
            probability_percent: 100.0,
            hash_hex: None,
            threshold_hex: None,
        });
    }

    let digest: [u8; 32] = Sha256::digest(full_seed.as_bytes()).into();
    let hash = words_from_digest(&digest);
    let threshold = threshold_words(u64::from(quota_remaining), u64::from(weeks_remaining));

    let outcome = if hash < threshold {
        Outcome::Safe
    } else {
        Outcome::Chop
    };

    Ok(Draw {
        outcome,
        probability_percent: f64::from(quota_remaining) / f64::from(weeks_remaining) * 100.0,
        hash_hex: Some(hex::encode(digest)),
        threshold_hex: Some(words_hex(&threshold)),
    })
}

/// 256-bit value as four 64-bit words, most significant first, so array
/// ordering matches numeric ordering.
type Words256 = [u64; 4];

fn words_from_digest(digest: &[u8; 32]) -> Words256 {
    let mut words = [0u64; 4];
    for (word, chunk) in words.iter_mut().zip(digest.chunks_exact(8)) {
        let mut buf = [0u8; 8];
        buf.copy_from_slice(chunk);
        *word = u64::from_be_bytes(buf);
    }
    words
}

/// floor(quota * 2^256 / weeks), word by word. Long division of the 320-bit
/// dividend by a single word; callers guarantee 0 < quota < weeks, so the
/// quotient always fits in 256 bits and the running remainder stays below
/// `weeks`.
fn threshold_words(quota: u64, weeks: u64) -> Words256 {
    let mut rem = u128::from(quota);
    let mut out = [0u64; 4];
    for word in out.iter_mut() {
        let acc = rem << 64;
        *word = (acc / u128::from(weeks)) as u64;
        rem = acc % u128::from(weeks);
    }
    out
}

fn words_hex(words: &Words256) -> String {
    let mut s = String::with_capacity(64);
    for w in words {
        s.push_str(&format!("{:016x}", w));
    }
    s
}
