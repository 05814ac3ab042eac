//! Summary statistics and export formats for a finished run.

use crate::error::ReconError;
use crate::model::{MatchResult, MatchType, ReconResult, ReconSummary};

const REPORT_TITLE: &str = "Rewards Reconciliation Report";

pub const CSV_COLUMNS: [&str; 13] = [
    "source_row",
    "customer_name",
    "service",
    "date",
    "amount",
    "match_type",
    "confidence",
    "confidence_label",
    "reward_program",
    "candidate_name",
    "candidate_service",
    "candidate_date",
    "reward_amount",
];

/// Compute summary statistics from match results.
pub fn compute_summary(
    matches: &[MatchResult],
    total_candidates: usize,
    unmatched_candidates: usize,
    processing_ms: u64,
) -> ReconSummary {
    let mut exact_matches = 0;
    let mut fuzzy_matches = 0;
    let mut unmatched = 0;
    let mut matched_amount_cents = 0i64;

    for m in matches {
        match m.match_type {
            MatchType::Exact => exact_matches += 1,
            MatchType::Fuzzy => fuzzy_matches += 1,
            MatchType::Unmatched => unmatched += 1,
        }
        if m.match_type.is_match() {
            matched_amount_cents = matched_amount_cents.saturating_add(m.source.amount_cents.unwrap_or(0));
        }
    }

    ReconSummary {
        total_transactions: matches.len(),
        exact_matches,
        fuzzy_matches,
        unmatched,
        match_accuracy: match_accuracy(exact_matches + fuzzy_matches, matches.len()),
        total_candidates,
        unmatched_candidates,
        matched_amount_cents,
        processing_ms,
    }
}

/// `round(matched / total * 100)`, 0 for an empty run.
pub fn match_accuracy(matched: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    (matched as f64 / total as f64 * 100.0).round() as u32
}

/// Hundredths as a plain decimal string: 45000 -> "450.00", -50 -> "-0.50".
pub fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{sign}{}.{:02}", abs / 100, abs % 100)
}

fn amount_field(cents: Option<i64>, raw: &str) -> String {
    cents.map(format_cents).unwrap_or_else(|| raw.to_string())
}

fn date_field(date: Option<chrono::NaiveDate>, raw: &str) -> String {
    date.map(|d| d.to_string()).unwrap_or_else(|| raw.to_string())
}

fn csv_row(m: &MatchResult) -> Vec<String> {
    let s = &m.source;
    let mut row = vec![
        s.row.to_string(),
        s.name.clone(),
        s.service.clone(),
        date_field(s.date, &s.raw_date),
        amount_field(s.amount_cents, &s.raw_amount),
        m.match_type.to_string(),
        format!("{:.4}", m.confidence_score),
        m.confidence_label.to_string(),
    ];
    match &m.candidate {
        Some(c) => row.extend([
            c.program.clone(),
            c.name.clone(),
            c.service.clone(),
            date_field(c.date, &c.raw_date),
            amount_field(c.amount_cents, &c.raw_amount),
        ]),
        None => row.extend(std::iter::repeat(String::new()).take(5)),
    }
    row
}

fn write_table(writer: &mut csv::Writer<Vec<u8>>, result: &ReconResult) -> Result<(), ReconError> {
    writer
        .write_record(CSV_COLUMNS)
        .map_err(|e| ReconError::Export(e.to_string()))?;
    for m in &result.matches {
        writer
            .write_record(csv_row(m))
            .map_err(|e| ReconError::Export(e.to_string()))?;
    }
    Ok(())
}

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<String, ReconError> {
    let bytes = writer
        .into_inner()
        .map_err(|e| ReconError::Export(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| ReconError::Export(e.to_string()))
}

/// Header row plus one row per match. Fields containing a comma, quote, or
/// line break are quoted with embedded quotes doubled (RFC4180).
pub fn export_csv(result: &ReconResult) -> Result<String, ReconError> {
    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Necessary)
        .from_writer(Vec::new());
    write_table(&mut writer, result)?;
    finish(writer)
}

/// The `export_csv` table preceded by a short report header: title,
/// generation time, totals, and a blank separator line.
pub fn export_csv_report(result: &ReconResult) -> Result<String, ReconError> {
    let mut preamble = csv::WriterBuilder::new()
        .flexible(true)
        .quote_style(csv::QuoteStyle::Necessary)
        .from_writer(Vec::new());
    let lines = [
        REPORT_TITLE.to_string(),
        format!("Generated: {}", result.meta.run_at),
        format!("Total Transactions: {}", result.summary.total_transactions),
        format!("Accuracy: {}%", result.summary.match_accuracy),
    ];
    for line in &lines {
        preamble
            .write_record([line])
            .map_err(|e| ReconError::Export(e.to_string()))?;
    }
    let mut out = finish(preamble)?;
    out.push('\n');
    out.push_str(&export_csv(result)?);
    Ok(out)
}

pub fn to_json_pretty(result: &ReconResult) -> Result<String, ReconError> {
    serde_json::to_string_pretty(result).map_err(|e| ReconError::Export(e.to_string()))
}
