//! Tabular ingestion: raw CSV text to header-keyed rows, then to typed records.

use std::collections::BTreeMap;

use crate::alias::{AliasTable, CanonicalField, ColumnBinding};
use crate::error::ReconError;
use crate::model::{CandidateFeed, CandidateRecord, SourceRecord};
use crate::similarity::parse_date;

/// Parsed delimited text. Every row has exactly `headers.len()` values.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub input: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Value of `header` in data row `row` (0-based).
    pub fn get(&self, row: usize, header: &str) -> Option<&str> {
        let col = self.headers.iter().position(|h| h == header)?;
        self.rows.get(row).map(|r| r[col].as_str())
    }

    /// Rows as header → value mappings, in input order.
    pub fn row_maps(&self) -> Vec<BTreeMap<String, String>> {
        self.rows
            .iter()
            .map(|row| {
                self.headers
                    .iter()
                    .cloned()
                    .zip(row.iter().cloned())
                    .collect()
            })
            .collect()
    }
}

/// Trim, strip a UTF-8 byte-order mark, and case-fold a header.
pub fn normalize_header(raw: &str) -> String {
    raw.trim_start_matches('\u{feff}').trim().to_lowercase()
}

/// Parse comma-delimited text with an RFC4180 header line.
///
/// Short rows are padded with empty strings, surplus fields are dropped, and
/// blank lines are skipped. Fails unless there is a header and at least one
/// data row.
pub fn parse_table(input: &str, text: &str) -> Result<Table, ReconError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let mut records = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| ReconError::parse(input, e.to_string()))?;
        // A whitespace-only line is blank; a line of bare delimiters is a row.
        if record.len() == 1 && record.iter().all(|field| field.is_empty()) {
            continue;
        }
        records.push(record);
    }

    if records.len() < 2 {
        return Err(ReconError::parse(
            input,
            format!(
                "expected a header line and at least one data row, found {} non-empty line(s)",
                records.len()
            ),
        ));
    }

    let headers: Vec<String> = records[0].iter().map(normalize_header).collect();
    let width = headers.len();

    let rows = records[1..]
        .iter()
        .map(|record| {
            (0..width)
                .map(|i| record.get(i).unwrap_or("").to_string())
                .collect()
        })
        .collect();

    Ok(Table {
        input: input.to_string(),
        headers,
        rows,
    })
}

/// Amounts at or above this many cents parse as `None`.
const MAX_AMOUNT_CENTS: f64 = 1e15;

/// Parse a money-like value into hundredths. Accepts `$`, thousands
/// separators, and `(123.45)` negatives. Returns `None` for anything else.
pub fn parse_amount_cents(raw: &str) -> Option<i64> {
    let mut s = raw.trim();
    let mut negative = false;
    if let Some(inner) = s.strip_prefix('(').and_then(|x| x.strip_suffix(')')) {
        negative = true;
        s = inner.trim();
    }
    if let Some(rest) = s.strip_prefix('-') {
        // "(-5)" marks the sign twice.
        if negative {
            return None;
        }
        negative = true;
        s = rest.trim_start();
    }
    let cleaned: String = s.chars().filter(|c| *c != '$' && *c != ',').collect();
    if cleaned.is_empty() {
        return None;
    }
    let value: f64 = cleaned.parse().ok()?;
    if !value.is_finite() || value < 0.0 {
        return None;
    }
    let cents = (value * 100.0).round();
    if cents >= MAX_AMOUNT_CENTS {
        return None;
    }
    let cents = cents as i64;
    Some(if negative { -cents } else { cents })
}

/// Canonical values pulled from one row through a column binding.
struct Canonical {
    name: String,
    service: String,
    raw_amount: String,
    raw_date: String,
    extra: BTreeMap<String, String>,
}

fn extract(table: &Table, binding: &ColumnBinding, row: &[String]) -> Canonical {
    let field = |f: CanonicalField| {
        binding
            .column(f)
            .map(|idx| row[idx].clone())
            .unwrap_or_default()
    };
    let extra = table
        .headers
        .iter()
        .enumerate()
        .filter(|(idx, h)| !binding.is_bound(*idx) && !h.is_empty())
        .map(|(idx, h)| (h.clone(), row[idx].clone()))
        .collect();

    Canonical {
        name: field(CanonicalField::Name),
        service: field(CanonicalField::Service),
        raw_amount: field(CanonicalField::Amount),
        raw_date: field(CanonicalField::Date),
        extra,
    }
}

fn warn_missing(table: &Table, binding: &ColumnBinding) {
    let missing = binding.missing();
    if !missing.is_empty() {
        let names: Vec<String> = missing.iter().map(|f| f.to_string()).collect();
        tracing::warn!(
            input = %table.input,
            missing = %names.join(","),
            "no column matched; affected fields score as missing"
        );
    }
}

/// Build POS records from a parsed table.
pub fn load_source(table: &Table, aliases: &AliasTable) -> Vec<SourceRecord> {
    let binding = aliases.resolve(&table.headers);
    warn_missing(table, &binding);

    table
        .rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let c = extract(table, &binding, row);
            SourceRecord {
                row: i + 1,
                amount_cents: parse_amount_cents(&c.raw_amount),
                date: parse_date(&c.raw_date),
                name: c.name,
                service: c.service,
                raw_amount: c.raw_amount,
                raw_date: c.raw_date,
                extra: c.extra,
            }
        })
        .collect()
}

/// Build redemption records for one rewards program.
pub fn load_candidates(table: &Table, program: &str, aliases: &AliasTable) -> CandidateFeed {
    let binding = aliases.resolve(&table.headers);
    warn_missing(table, &binding);

    let records = table
        .rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let c = extract(table, &binding, row);
            CandidateRecord {
                row: i + 1,
                program: program.to_string(),
                amount_cents: parse_amount_cents(&c.raw_amount),
                date: parse_date(&c.raw_date),
                name: c.name,
                service: c.service,
                raw_amount: c.raw_amount,
                raw_date: c.raw_date,
                extra: c.extra,
            }
        })
        .collect();

    CandidateFeed {
        program: program.to_string(),
        records,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const POS: &str = "\
name,service,amount,date,location_id,staff_member
\"Sarah Johnson\",\"Botox Cosmetic\",450.00,\"2024-03-15\",\"LOC001\",\"Dr. Smith\"
\"Michael Chen\",\"Juvederm Ultra\",650.00,\"2024-03-15\",\"LOC001\",\"Dr. Johnson\"
";

    #[test]
    fn parse_quoted_rows() {
        let t = parse_table("pos", POS).unwrap();
        assert_eq!(t.headers, vec!["name", "service", "amount", "date", "location_id", "staff_member"]);
        assert_eq!(t.rows.len(), 2);
        assert_eq!(t.get(0, "name"), Some("Sarah Johnson"));
        assert_eq!(t.get(1, "staff_member"), Some("Dr. Johnson"));
    }

    #[test]
    fn headers_are_trimmed_and_case_folded() {
        let t = parse_table("x", "\u{feff} Customer_Name , DATE\nAnn,2024-01-01\n").unwrap();
        assert_eq!(t.headers, vec!["customer_name", "date"]);
    }

    #[test]
    fn short_rows_are_padded_and_long_rows_truncated() {
        let t = parse_table("x", "a,b,c\n1\n1,2,3,4\n").unwrap();
        assert_eq!(t.rows[0], vec!["1", "", ""]);
        assert_eq!(t.rows[1], vec!["1", "2", "3"]);
    }

    #[test]
    fn embedded_comma_and_quote() {
        let t = parse_table("x", "name,service\n\"Davis, Robert\",\"The \"\"Lyft\"\"\"\n").unwrap();
        assert_eq!(t.get(0, "name"), Some("Davis, Robert"));
        assert_eq!(t.get(0, "service"), Some("The \"Lyft\""));
    }

    #[test]
    fn blank_lines_are_ignored() {
        let t = parse_table("x", "\n\nname\n\n  \nAnn\n\n").unwrap();
        assert_eq!(t.rows.len(), 1);
    }

    #[test]
    fn header_only_is_parse_error() {
        let err = parse_table("alle", "customer_name,product\n").unwrap_err();
        match err {
            ReconError::Parse { input, reason } => {
                assert_eq!(input, "alle");
                assert!(reason.contains("found 1 non-empty line"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn empty_text_is_parse_error() {
        assert!(matches!(parse_table("pos", "   \n"), Err(ReconError::Parse { .. })));
    }

    #[test]
    fn row_maps_are_keyed_by_header() {
        let t = parse_table("pos", POS).unwrap();
        let maps = t.row_maps();
        assert_eq!(maps[1]["service"], "Juvederm Ultra");
        assert_eq!(maps[1]["amount"], "650.00");
    }

    #[test]
    fn amount_parsing() {
        assert_eq!(parse_amount_cents("450.00"), Some(45000));
        assert_eq!(parse_amount_cents(" $1,234.5 "), Some(123450));
        assert_eq!(parse_amount_cents("90"), Some(9000));
        assert_eq!(parse_amount_cents("(12.34)"), Some(-1234));
        assert_eq!(parse_amount_cents("(-5)"), None);
        assert_eq!(parse_amount_cents("( - 5)"), None);
        assert_eq!(parse_amount_cents("-$5"), Some(-500));
        assert_eq!(parse_amount_cents("0.005"), Some(1));
        assert_eq!(parse_amount_cents(""), None);
        assert_eq!(parse_amount_cents("n/a"), None);
        assert_eq!(parse_amount_cents("inf"), None);
    }

    #[test]
    fn implausible_amounts_are_rejected() {
        assert_eq!(parse_amount_cents("9e18"), None);
        assert_eq!(parse_amount_cents("(9e18)"), None);
        assert_eq!(parse_amount_cents("10000000000000"), None);
        assert_eq!(parse_amount_cents("9999999999.99"), Some(999_999_999_999));
        assert_eq!(parse_amount_cents("1e3"), Some(100_000));
    }

    #[test]
    fn delimiter_only_row_is_data() {
        let t = parse_table("x", "name,service\n,\n").unwrap();
        assert_eq!(t.rows, vec![vec![String::new(), String::new()]]);

        let t = parse_table("x", "name,service\n , \nAnn,Botox\n").unwrap();
        assert_eq!(t.rows.len(), 2);
    }

    #[test]
    fn load_source_binds_aliases_and_keeps_extras() {
        let t = parse_table("pos", POS).unwrap();
        let records = load_source(&t, &AliasTable::default());
        assert_eq!(records.len(), 2);
        let r = &records[0];
        assert_eq!(r.row, 1);
        assert_eq!(r.name, "Sarah Johnson");
        assert_eq!(r.service, "Botox Cosmetic");
        assert_eq!(r.amount_cents, Some(45000));
        assert_eq!(r.date, NaiveDate::from_ymd_opt(2024, 3, 15));
        assert_eq!(r.extra["location_id"], "LOC001");
        assert!(!r.extra.contains_key("name"));
    }

    #[test]
    fn load_candidates_tags_program_and_tolerates_bad_values() {
        let csv = "member_name,treatment,reward_amount,transaction_date\nRobert J Davis,Restylane Lyft,abc,not-a-date\n";
        let t = parse_table("aspire", csv).unwrap();
        let feed = load_candidates(&t, "aspire", &AliasTable::default());
        assert_eq!(feed.program, "aspire");
        let c = &feed.records[0];
        assert_eq!(c.program, "aspire");
        assert_eq!(c.name, "Robert J Davis");
        assert_eq!(c.amount_cents, None);
        assert_eq!(c.raw_amount, "abc");
        assert_eq!(c.date, None);
        assert_eq!(c.raw_date, "not-a-date");
    }

    #[test]
    fn missing_column_degrades_to_empty_field() {
        let t = parse_table("pos", "customer,amount\nAnn,10\n").unwrap();
        let records = load_source(&t, &AliasTable::default());
        assert_eq!(records[0].name, "");
        assert_eq!(records[0].extra["customer"], "Ann");
    }
}
