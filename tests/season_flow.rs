// Whole-season flows: reveal through the runner, persist, reload, replay.

use survivor_core::commitment::CommitmentDocument;
use survivor_core::config::SeasonConfig;
use survivor_core::draw::{LowestScore, Outcome};
use survivor_core::ledger::RevealError;
use survivor_core::season::Season;
use survivor_core::storage::{JsonResultStore, ResultStore};
use survivor_core::verify;
use std::sync::Arc;
use std::thread;

fn committed(total_weeks: u32, total_quota: u32) -> (SeasonConfig, CommitmentDocument) {
    let config = SeasonConfig::new(total_weeks, total_quota);
    let seeds = (1..=total_weeks)
        .map(|w| format!("MNF_2025_W{:02}_8:15PM_ET", w))
        .collect();
    let doc = CommitmentDocument::commit(&config, seeds).expect("commit");
    (config, doc)
}

fn store_in(dir: &tempfile::TempDir) -> JsonResultStore {
    JsonResultStore::new(dir.path()).expect("result store")
}

#[test]
fn a_full_season_lands_exactly_on_quota() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (config, doc) = committed(17, 5);
    let season =
        Season::open(config, doc.clone(), Some(Box::new(store_in(&dir)))).expect("open");

    for week in 1..=17 {
        let aux = LowestScore::new(60.0 + f64::from(week), format!("player-{}", week));
        season.reveal_week(week, Some(&aux)).expect("reveal");
    }
    let safes = season
        .results()
        .iter()
        .filter(|r| r.outcome == Outcome::Safe)
        .count();
    assert_eq!(safes, 5);
    assert_eq!(season.next_week(), None);

    // The persisted rows carry the same outcomes, in ascending week order.
    let rows = store_in(&dir).load_all().expect("load");
    assert_eq!(rows.len(), 17);
    assert!(rows.windows(2).all(|w| w[0].week < w[1].week));
    assert_eq!(rows.iter().filter(|r| r.is_safe).count(), 5);

    // Any observer can replay the published season from the public values.
    let replayed = verify::replay_season(config, &doc, &rows).expect("replay");
    assert_eq!(replayed.len(), 17);
    for (replay, live) in replayed.iter().zip(season.results().iter()) {
        assert_eq!(replay.outcome, live.outcome);
    }
}

#[test]
fn reopening_a_season_resumes_where_it_left_off() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (config, doc) = committed(6, 2);

    {
        let season =
            Season::open(config, doc.clone(), Some(Box::new(store_in(&dir)))).expect("open");
        for week in 1..=3 {
            season
                .reveal_week(week, Some(&LowestScore::unattributed(70.0 + f64::from(week))))
                .expect("reveal");
        }
    }

    let reopened =
        Season::open(config, doc, Some(Box::new(store_in(&dir)))).expect("reopen");
    assert_eq!(reopened.next_week(), Some(4));
    assert_eq!(reopened.results().len(), 3);
    assert_eq!(reopened.stats().weeks_revealed, 3);

    // The already-decided weeks come back as stored, not recomputed anew.
    match reopened.reveal_week(2, None) {
        Err(RevealError::AlreadyRevealed(stored)) => assert_eq!(stored.week, 2),
        other => panic!("expected AlreadyRevealed, got {:?}", other),
    }
}

#[test]
fn skipping_ahead_is_rejected_and_changes_nothing() {
    let (config, doc) = committed(5, 2);
    let season = Season::open(config, doc, None).expect("open");
    assert_eq!(
        season.reveal_week(3, None),
        Err(RevealError::OutOfOrder {
            week: 3,
            next_unrevealed: 1,
        })
    );
    assert_eq!(season.results().len(), 0);
    assert_eq!(season.next_week(), Some(1));
}

#[test]
fn racing_reveals_produce_one_winner() {
    let (config, doc) = committed(4, 2);
    let season = Arc::new(Season::open(config, doc, None).expect("open"));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let season = Arc::clone(&season);
            thread::spawn(move || season.reveal_week(1, Some(&LowestScore::new(88.1, "Sam"))))
        })
        .collect();

    let mut wins = Vec::new();
    let mut repeats = Vec::new();
    for handle in handles {
        match handle.join().expect("join") {
            Ok(result) => wins.push(result),
            Err(RevealError::AlreadyRevealed(stored)) => repeats.push(*stored),
            Err(other) => panic!("unexpected reveal error: {:?}", other),
        }
    }
    assert_eq!(wins.len(), 1);
    assert_eq!(repeats.len(), 7);
    for repeat in &repeats {
        assert_eq!(repeat.outcome, wins[0].outcome);
        assert_eq!(repeat.full_seed, wins[0].full_seed);
    }
    assert_eq!(season.stats().weeks_revealed, 1);
}

#[test]
fn championship_season_holds_quota_over_the_drawable_weeks() {
    let config = SeasonConfig::new(5, 2).with_terminal_override(Outcome::Chop);
    let seeds = (1..=5).map(|w| format!("SEED_W{}", w)).collect();
    let doc = CommitmentDocument::commit(&config, seeds).expect("commit");
    let season = Season::open(config, doc, None).expect("open");

    for week in 1..=5 {
        season.reveal_week(week, None).expect("reveal");
    }
    let results = season.results();
    assert_eq!(results[4].outcome, Outcome::Chop);
    assert!(results[4].hash_hex.is_none());
    let safes = results[..4]
        .iter()
        .filter(|r| r.outcome == Outcome::Safe)
        .count();
    assert_eq!(safes, 2);
}

#[test]
fn a_tampered_store_fails_the_reopen() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (config, doc) = committed(4, 2);
    {
        let season =
            Season::open(config, doc.clone(), Some(Box::new(store_in(&dir)))).expect("open");
        for week in 1..=4 {
            season.reveal_week(week, None).expect("reveal");
        }
    }

    let store = store_in(&dir);
    let mut rows = store.load_all().expect("load");
    rows[1].is_safe = !rows[1].is_safe;
    let raw = serde_json::to_vec_pretty(&rows).expect("serialize");
    std::fs::write(store.path(), raw).expect("rewrite");

    assert!(Season::open(config, doc, Some(Box::new(store_in(&dir)))).is_err());
}
