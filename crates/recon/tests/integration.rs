use std::path::PathBuf;

use rewardsync_recon::config::{MatchStrategy, ReconConfig};
use rewardsync_recon::engine::{load_input, reconcile, run, CandidateText};
use rewardsync_recon::ingest::parse_table;
use rewardsync_recon::model::{CandidateFeed, MatchType, ReconResult};
use rewardsync_recon::report::export_csv;
use rewardsync_recon::ReconError;

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn read_fixture(name: &str) -> String {
    let path = fixtures_dir().join(name);
    std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("cannot read {}: {e}", path.display()))
}

/// Load a fixture config and reconcile the feeds it lists.
fn load_and_run(config_file: &str) -> ReconResult {
    let config = ReconConfig::from_toml(&read_fixture(config_file)).unwrap();
    config.validate().unwrap();

    let source_file = &config.source.as_ref().expect("fixture config has [source]").file;
    let source_text = read_fixture(source_file);
    let texts: Vec<(String, String, String)> = config
        .candidates
        .iter()
        .map(|c| (c.file.clone(), c.program.clone(), read_fixture(&c.file)))
        .collect();
    let feeds: Vec<CandidateText<'_>> = texts
        .iter()
        .map(|(label, program, text)| CandidateText { label, program, text })
        .collect();

    reconcile(&config, source_file, &source_text, &feeds).unwrap()
}

fn run_pair(config: &ReconConfig, source: &str, program: &str, candidates: &str) -> ReconResult {
    let source_text = read_fixture(source);
    let candidate_text = read_fixture(candidates);
    let feeds = [CandidateText { label: candidates, program, text: &candidate_text }];
    reconcile(config, source, &source_text, &feeds).unwrap()
}

// -------------------------------------------------------------------------
// Sample month
// -------------------------------------------------------------------------

#[test]
fn march_close_matches_everything() {
    let result = load_and_run("march.recon.toml");

    assert_eq!(result.meta.config_name, "March close");
    assert_eq!(result.meta.strategy, MatchStrategy::Greedy);
    assert!(result.meta.header_suggestions.is_empty());

    let s = &result.summary;
    assert_eq!(s.total_transactions, 6);
    assert_eq!(s.exact_matches, 5);
    assert_eq!(s.fuzzy_matches, 1);
    assert_eq!(s.unmatched, 0);
    assert_eq!(s.match_accuracy, 100);
    assert_eq!(s.total_candidates, 8);
    assert_eq!(s.unmatched_candidates, 2);
    assert_eq!(s.exact_matches + s.fuzzy_matches + s.unmatched, s.total_transactions);

    let programs: Vec<&str> = result
        .matches
        .iter()
        .map(|m| m.candidate.as_ref().unwrap().program.as_str())
        .collect();
    assert_eq!(programs, ["alle", "alle", "alle", "aspire", "alle", "alle"]);
}

#[test]
fn sarah_johnson_matches_with_middle_initial() {
    let result = load_and_run("march.recon.toml");
    let sarah = &result.matches[0];

    assert_eq!(sarah.source.name, "Sarah Johnson");
    assert!(sarah.match_type.is_match());
    assert!(sarah.confidence_score > 0.7);
    assert_eq!(sarah.candidate.as_ref().unwrap().name, "Sarah M Johnson");
    assert_eq!(sarah.source.extra.get("location_id").map(String::as_str), Some("LOC001"));
}

#[test]
fn robert_davis_does_not_match_david_williams() {
    let result = run_pair(&ReconConfig::default(), "robert-pos.csv", "aspire", "williams-aspire.csv");
    let m = &result.matches[0];

    assert_eq!(m.match_type, MatchType::Unmatched);
    assert!(m.candidate.is_none());
    assert!(m.confidence_score < 0.7);
    let breakdown = m.breakdown.expect("best candidate breakdown is reported");
    assert_eq!(breakdown.date_offset_days, Some(-47));
    assert_eq!(result.summary.unmatched_candidates, 1);
}

#[test]
fn runs_are_deterministic() {
    let a = load_and_run("march.recon.toml");
    let b = load_and_run("march.recon.toml");
    assert_eq!(
        serde_json::to_string(&a.matches).unwrap(),
        serde_json::to_string(&b.matches).unwrap()
    );
    assert_eq!(a.summary.exact_matches, b.summary.exact_matches);
}

// -------------------------------------------------------------------------
// Pool
// -------------------------------------------------------------------------

#[test]
fn pool_keeps_unconsumed_candidates() {
    let result = load_and_run("march.recon.toml");
    let matched = result.summary.exact_matches + result.summary.fuzzy_matches;
    assert_eq!(result.summary.unmatched_candidates, result.summary.total_candidates - matched);

    let mut consumed: Vec<(String, usize)> = result
        .matches
        .iter()
        .filter_map(|m| m.candidate.as_ref())
        .map(|c| (c.program.clone(), c.row))
        .collect();
    let before = consumed.len();
    consumed.sort();
    consumed.dedup();
    assert_eq!(consumed.len(), before, "a candidate was consumed twice");
}

#[test]
fn empty_pool_leaves_everything_unmatched() {
    let config = ReconConfig::default();
    let mut input = load_input(&config, "pos.csv", &read_fixture("pos.csv"), &[]).unwrap();
    input.candidate_feeds.push(CandidateFeed { program: "alle".into(), records: vec![] });

    let result = run(&config, &input).unwrap();
    assert_eq!(result.summary.total_transactions, 6);
    assert_eq!(result.summary.unmatched, 6);
    assert_eq!(result.summary.match_accuracy, 0);
    assert_eq!(result.summary.total_candidates, 0);
    assert!(result.matches.iter().all(|m| m.confidence_score == 0.0 && m.breakdown.is_none()));
}

#[test]
fn optimal_strategy_avoids_starvation() {
    let result = load_and_run("starvation.recon.toml");
    assert_eq!(result.meta.strategy, MatchStrategy::Optimal);
    assert_eq!(result.summary.unmatched, 0);
    assert_eq!(result.matches[0].candidate.as_ref().unwrap().name, "Kim Parke");
    assert_eq!(result.matches[1].candidate.as_ref().unwrap().name, "Kim Park");
    assert_eq!(result.matches[1].match_type, MatchType::Fuzzy);

    let mut greedy = ReconConfig::default();
    greedy.strategy = MatchStrategy::Greedy;
    let result = run_pair(&greedy, "starvation-pos.csv", "alle", "starvation-alle.csv");
    assert_eq!(result.matches[0].candidate.as_ref().unwrap().name, "Kim Park");
    assert_eq!(result.matches[1].match_type, MatchType::Unmatched);
}

// -------------------------------------------------------------------------
// Aliases and tolerant parsing
// -------------------------------------------------------------------------

#[test]
fn configured_aliases_bind_front_desk_headers() {
    let config = ReconConfig::from_toml(&read_fixture("guest.recon.toml")).unwrap();
    config.validate().unwrap();
    let result = run_pair(&config, "guest-pos.csv", "alle", "guest-alle.csv");

    let nguyen = &result.matches[0];
    assert_eq!(nguyen.source.name, "Nguyen, Thi");
    assert_eq!(nguyen.source.amount_cents, Some(125_000));
    assert_eq!(nguyen.match_type, MatchType::Exact);
    assert_eq!(nguyen.breakdown.unwrap().date_offset_days, Some(-2));

    let kate = &result.matches[1];
    assert_eq!(kate.source.amount_cents, Some(-2_500));
    assert_eq!(kate.match_type, MatchType::Unmatched);
    assert_eq!(result.meta.date_tolerance_days, 3);
}

// -------------------------------------------------------------------------
// Errors
// -------------------------------------------------------------------------

#[test]
fn header_only_feed_is_parse_error() {
    let feeds = [CandidateText {
        label: "alle.csv",
        program: "alle",
        text: "customer_name,product,points_redeemed,redemption_date\n\n",
    }];
    let err = reconcile(&ReconConfig::default(), "pos.csv", &read_fixture("pos.csv"), &feeds).unwrap_err();
    match err {
        ReconError::Parse { input, .. } => assert_eq!(input, "alle.csv"),
        other => panic!("expected parse error, got {other:?}"),
    }
}

#[test]
fn no_candidate_feeds_is_validation_error() {
    let err = reconcile(&ReconConfig::default(), "pos.csv", &read_fixture("pos.csv"), &[]).unwrap_err();
    assert!(matches!(err, ReconError::Validation(_)));
}

// -------------------------------------------------------------------------
// Export
// -------------------------------------------------------------------------

#[test]
fn csv_export_round_trips() {
    let result = load_and_run("march.recon.toml");
    let csv = export_csv(&result).unwrap();
    let table = parse_table("export", &csv).unwrap();

    assert_eq!(table.rows.len(), result.matches.len());
    for (i, m) in result.matches.iter().enumerate() {
        assert_eq!(table.get(i, "customer_name"), Some(m.source.name.as_str()));
        assert_eq!(table.get(i, "match_type"), Some(m.match_type.to_string().as_str()));
        assert_eq!(
            table.get(i, "reward_program"),
            m.candidate.as_ref().map(|c| c.program.as_str())
        );
    }
}
