use std::time::Instant;

use crate::alias::AliasTable;
use crate::config::{MatchStrategy, ReconConfig};
use crate::error::ReconError;
use crate::ingest::{load_candidates, load_source, parse_table};
use crate::matcher::{match_greedy, match_optimal, CandidatePool, MatchContext};
use crate::model::{ReconInput, ReconMeta, ReconResult};
use crate::report::compute_summary;

/// Raw text of one rewards feed. `label` names the input in errors
/// (typically the file path).
#[derive(Debug, Clone, Copy)]
pub struct CandidateText<'a> {
    pub label: &'a str,
    pub program: &'a str,
    pub text: &'a str,
}

/// Parse every feed and resolve columns through the configured alias table.
/// Any structurally invalid feed aborts the whole load.
pub fn load_input(
    config: &ReconConfig,
    source_label: &str,
    source_text: &str,
    candidates: &[CandidateText<'_>],
) -> Result<ReconInput, ReconError> {
    let aliases = AliasTable::from_config(&config.aliases);
    let mut header_suggestions = Vec::new();

    let source_table = parse_table(source_label, source_text)?;
    header_suggestions.extend(aliases.suggest(source_label, &source_table.headers));
    let source = load_source(&source_table, &aliases);

    let mut candidate_feeds = Vec::with_capacity(candidates.len());
    for feed in candidates {
        let table = parse_table(feed.label, feed.text)?;
        header_suggestions.extend(aliases.suggest(feed.label, &table.headers));
        candidate_feeds.push(load_candidates(&table, feed.program, &aliases));
    }

    for s in &header_suggestions {
        tracing::warn!(
            input = %s.input,
            header = %s.header,
            suggestion = %s.suggestion,
            "unrecognized column; did you mean '{}'?",
            s.suggestion
        );
    }

    Ok(ReconInput {
        source,
        candidate_feeds,
        header_suggestions,
    })
}

/// Parse, load, and reconcile in one call.
pub fn reconcile(
    config: &ReconConfig,
    source_label: &str,
    source_text: &str,
    candidates: &[CandidateText<'_>],
) -> Result<ReconResult, ReconError> {
    let input = load_input(config, source_label, source_text, candidates)?;
    run(config, &input)
}

/// Run reconciliation per config. Returns one result per source record, in
/// source order, plus summary statistics.
pub fn run(config: &ReconConfig, input: &ReconInput) -> Result<ReconResult, ReconError> {
    config.validate()?;

    if input.source.is_empty() {
        return Err(ReconError::Validation("no source transactions supplied".into()));
    }
    if input.candidate_feeds.is_empty() {
        return Err(ReconError::Validation("no candidate feeds supplied".into()));
    }

    let started = Instant::now();
    let pool = CandidatePool::from_feeds(&input.candidate_feeds);
    let total_candidates = pool.len();
    let ctx = MatchContext::from_config(config);

    tracing::debug!(
        config = %config.name,
        strategy = %config.strategy,
        sources = input.source.len(),
        candidates = total_candidates,
        "starting reconciliation"
    );

    let (matches, pool) = match config.strategy {
        MatchStrategy::Greedy => match_greedy(&input.source, pool, &ctx),
        MatchStrategy::Optimal => match_optimal(&input.source, pool, &ctx),
    };

    let processing_ms = started.elapsed().as_millis() as u64;
    let summary = compute_summary(&matches, total_candidates, pool.remaining(), processing_ms);

    tracing::debug!(
        exact = summary.exact_matches,
        fuzzy = summary.fuzzy_matches,
        unmatched = summary.unmatched,
        accuracy = summary.match_accuracy,
        elapsed_ms = processing_ms,
        "reconciliation finished"
    );

    Ok(ReconResult {
        meta: ReconMeta {
            config_name: config.name.clone(),
            strategy: config.strategy,
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
            exact_threshold: config.thresholds.exact,
            fuzzy_threshold: config.thresholds.fuzzy,
            date_tolerance_days: config.date_tolerance_days,
            header_suggestions: input.header_suggestions.clone(),
        },
        summary,
        matches,
    })
}
