fn main() {
    use std::env;
    use std::fs;

    use survivor_core::commitment::CommitmentDocument;
    use survivor_core::config::SeasonConfig;
    use survivor_core::draw::{LowestScore, Outcome};
    use survivor_core::ledger::RevealError;
    use survivor_core::season::Season;
    use survivor_core::storage::{JsonResultStore, ResultStore};
    use survivor_core::verify;

    let mut args = env::args().skip(1);
    let command = match args.next() {
        Some(c) => c,
        None => {
            eprintln!("usage: survivor-season <commit|reveal|verify> [flags]");
            return;
        }
    };

    let mut seeds_path: Option<String> = None;
    let mut commitment_path: Option<String> = None;
    let mut data_dir: Option<String> = None;
    let mut quota: Option<u32> = None;
    let mut week: Option<u32> = None;
    let mut score: Option<f64> = None;
    let mut scorer: Option<String> = None;
    let mut terminal_chop = false;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--seeds" => seeds_path = args.next(),
            "--commitment" => commitment_path = args.next(),
            "--data-dir" => data_dir = args.next(),
            "--quota" => quota = args.next().map(|v| v.parse().expect("quota number")),
            "--week" => week = args.next().map(|v| v.parse().expect("week number")),
            "--score" => score = args.next().map(|v| v.parse().expect("score number")),
            "--scorer" => scorer = args.next(),
            "--terminal-chop" => terminal_chop = true,
            _ => {
                eprintln!("unknown arg {}", arg);
                return;
            }
        }
    }

    let config_for = |total_weeks: u32| {
        let mut config = SeasonConfig::new(total_weeks, quota.expect("missing --quota"));
        if terminal_chop {
            config = config.with_terminal_override(Outcome::Chop);
        }
        config.validate().expect("season config");
        config
    };

    match command.as_str() {
        "commit" => {
            let seeds_path = seeds_path.expect("missing --seeds");
            let raw = fs::read_to_string(&seeds_path).expect("read seeds file");
            let seeds: Vec<String> = serde_json::from_str(&raw).expect("parse seeds json");
            let config = config_for(seeds.len() as u32);
            let doc = CommitmentDocument::commit(&config, seeds).expect("commitment");
            let out = commitment_path.expect("missing --commitment");
            doc.save(&out).expect("write commitment document");
            println!("{}", doc.commitment);
        }
        "reveal" => {
            let doc = CommitmentDocument::load(commitment_path.expect("missing --commitment"))
                .expect("read commitment document");
            let config = config_for(doc.weeks.len() as u32);
            let store =
                JsonResultStore::new(data_dir.expect("missing --data-dir")).expect("result store");
            let season = Season::open(config, doc, Some(Box::new(store))).expect("open season");

            let aux = score.map(|value| match scorer {
                Some(name) => LowestScore::new(value, name),
                None => LowestScore::unattributed(value),
            });
            match season.reveal_week(week.expect("missing --week"), aux.as_ref()) {
                Ok(r) => println!(
                    "week {}: {} ({:.1}% odds in effect)",
                    r.week, r.outcome, r.probability_percent
                ),
                Err(RevealError::AlreadyRevealed(r)) => {
                    println!("week {}: {} (already revealed)", r.week, r.outcome)
                }
                Err(e) => {
                    eprintln!("reveal failed: {}", e);
                    std::process::exit(1);
                }
            }
        }
        "verify" => {
            let doc = CommitmentDocument::load(commitment_path.expect("missing --commitment"))
                .expect("read commitment document");
            if !verify::verify_commitment(&doc) {
                eprintln!("commitment digest does not match its seeds");
                std::process::exit(1);
            }
            let config = config_for(doc.weeks.len() as u32);
            let store =
                JsonResultStore::new(data_dir.expect("missing --data-dir")).expect("result store");
            let rows = store.load_all().expect("load results");
            match verify::replay_season(config, &doc, &rows) {
                Ok(results) => {
                    for r in &results {
                        println!("week {}: {} verified", r.week, r.outcome);
                    }
                    println!(
                        "commitment {} holds over {} revealed weeks",
                        doc.commitment,
                        results.len()
                    );
                }
                Err(e) => {
                    eprintln!("replay failed: {}", e);
                    std::process::exit(1);
                }
            }
        }
        _ => eprintln!("unknown command {}", command),
    }
}
