//! `rewardsync run|match|validate|sample|demo`: file handling around the engine.

use std::path::{Path, PathBuf};

use rewardsync_recon::engine::{reconcile, CandidateText};
use rewardsync_recon::report::{export_csv, export_csv_report, format_cents, to_json_pretty};
use rewardsync_recon::sample::{sample_candidates, SampleFeed, SAMPLE_POS};
use rewardsync_recon::{MatchStrategy, MatchType, ReconConfig, ReconResult};

use crate::exit_codes::{EXIT_RECON_INVALID_CONFIG, EXIT_RECON_UNMATCHED};
use crate::CliError;

/// Where and how results are written.
#[derive(Debug, Default)]
pub struct OutputOptions {
    pub json: bool,
    pub output: Option<PathBuf>,
    pub csv: Option<PathBuf>,
    pub report: bool,
    pub fail_on_unmatched: bool,
}

/// A rewards feed to read from disk.
struct FeedFile {
    program: String,
    path: PathBuf,
}

fn read_file(path: &Path) -> Result<String, CliError> {
    std::fs::read_to_string(path).map_err(|e| CliError::io(format!("cannot read {}: {e}", path.display())))
}

fn write_file(path: &Path, contents: &str) -> Result<(), CliError> {
    std::fs::write(path, contents).map_err(|e| CliError::io(format!("cannot write {}: {e}", path.display())))
}

fn load_config(path: &Path) -> Result<ReconConfig, CliError> {
    let config_str = read_file(path)?;
    Ok(ReconConfig::from_toml(&config_str)?)
}

/// Split a `PROGRAM=FILE` argument.
fn parse_feed_arg(arg: &str) -> Result<FeedFile, CliError> {
    match arg.split_once('=') {
        Some((program, file)) if !program.trim().is_empty() && !file.trim().is_empty() => Ok(FeedFile {
            program: program.trim().to_string(),
            path: PathBuf::from(file.trim()),
        }),
        _ => Err(CliError::usage(format!("invalid --candidates value '{arg}'"))
            .with_hint("expected PROGRAM=FILE, e.g. alle=alle.csv")),
    }
}

fn execute(config: &ReconConfig, source: &Path, feeds: &[FeedFile]) -> Result<ReconResult, CliError> {
    let source_label = source.display().to_string();
    tracing::debug!(source = %source_label, feeds = feeds.len(), "reading inputs");
    let source_text = read_file(source)?;

    let mut texts = Vec::with_capacity(feeds.len());
    for feed in feeds {
        texts.push((feed.path.display().to_string(), read_file(&feed.path)?));
    }
    let candidates: Vec<CandidateText<'_>> = feeds
        .iter()
        .zip(&texts)
        .map(|(feed, (label, text))| CandidateText { label, program: &feed.program, text })
        .collect();

    Ok(reconcile(config, &source_label, &source_text, &candidates)?)
}

// ============================================================================
// run
// ============================================================================

pub fn cmd_run(config_path: PathBuf, opts: OutputOptions) -> Result<(), CliError> {
    let config = load_config(&config_path)?;

    let Some(source) = &config.source else {
        return Err(CliError {
            code: EXIT_RECON_INVALID_CONFIG,
            message: format!("{} has no [source] section", config_path.display()),
            hint: Some("add [source] file = \"pos.csv\", or use `rewardsync match`".to_string()),
        });
    };
    if config.candidates.is_empty() {
        return Err(CliError {
            code: EXIT_RECON_INVALID_CONFIG,
            message: format!("{} lists no [[candidates]] feeds", config_path.display()),
            hint: Some("add [[candidates]] program = \"alle\" file = \"alle.csv\"".to_string()),
        });
    }

    // Feed paths are relative to the config file's directory
    let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));
    let source_path = base_dir.join(&source.file);
    let feeds: Vec<FeedFile> = config
        .candidates
        .iter()
        .map(|c| FeedFile { program: c.program.clone(), path: base_dir.join(&c.file) })
        .collect();

    let result = execute(&config, &source_path, &feeds)?;
    emit(&result, &opts)
}

// ============================================================================
// match
// ============================================================================

pub fn cmd_match(
    source: PathBuf,
    candidate_args: Vec<String>,
    config_path: Option<PathBuf>,
    strategy: Option<MatchStrategy>,
    opts: OutputOptions,
) -> Result<(), CliError> {
    let mut config = match config_path {
        Some(path) => load_config(&path)?,
        None => ReconConfig::default(),
    };
    if let Some(strategy) = strategy {
        config.strategy = strategy;
    }

    let feeds = candidate_args
        .iter()
        .map(|arg| parse_feed_arg(arg))
        .collect::<Result<Vec<_>, _>>()?;
    for (i, feed) in feeds.iter().enumerate() {
        if feeds[..i].iter().any(|f| f.program == feed.program) {
            return Err(CliError::usage(format!("program '{}' given more than once", feed.program)));
        }
    }

    let result = execute(&config, &source, &feeds)?;
    emit(&result, &opts)
}

// ============================================================================
// validate / sample / demo
// ============================================================================

pub fn cmd_validate(config_path: PathBuf) -> Result<(), CliError> {
    let config = load_config(&config_path)?;
    eprintln!(
        "valid: '{}' ({} strategy, exact >= {}, fuzzy >= {}, {} candidate feed(s))",
        config.name,
        config.strategy,
        config.thresholds.exact,
        config.thresholds.fuzzy,
        config.candidates.len(),
    );
    Ok(())
}

pub fn cmd_sample(feed: SampleFeed) -> Result<(), CliError> {
    print!("{}", feed.csv());
    Ok(())
}

pub fn cmd_demo(json: bool) -> Result<(), CliError> {
    let mut config = ReconConfig::default();
    config.name = "sample data".to_string();
    let result = reconcile(&config, "sample pos", SAMPLE_POS, &sample_candidates())?;
    emit(&result, &OutputOptions { json, ..OutputOptions::default() })
}

// ============================================================================
// Output
// ============================================================================

fn emit(result: &ReconResult, opts: &OutputOptions) -> Result<(), CliError> {
    if opts.json || opts.output.is_some() {
        let json_str = to_json_pretty(result)?;
        if let Some(ref path) = opts.output {
            write_file(path, &json_str)?;
            eprintln!("wrote {}", path.display());
        }
        if opts.json {
            println!("{json_str}");
        }
    }

    if let Some(ref path) = opts.csv {
        let csv = if opts.report { export_csv_report(result)? } else { export_csv(result)? };
        write_file(path, &csv)?;
        eprintln!("wrote {}", path.display());
    }

    print_summary(result);

    let unmatched = result.summary.unmatched;
    if opts.fail_on_unmatched && unmatched > 0 {
        return Err(CliError {
            code: EXIT_RECON_UNMATCHED,
            message: format!("{unmatched} transaction(s) unmatched"),
            hint: None,
        });
    }
    Ok(())
}

/// Human summary to stderr.
fn print_summary(result: &ReconResult) {
    let s = &result.summary;
    eprintln!(
        "{}: {} transactions, {} exact, {} fuzzy, {} unmatched ({}% matched, {}ms)",
        result.meta.config_name,
        s.total_transactions,
        s.exact_matches,
        s.fuzzy_matches,
        s.unmatched,
        s.match_accuracy,
        s.processing_ms,
    );
    eprintln!(
        "candidates: {} loaded, {} unconsumed; matched revenue ${}",
        s.total_candidates,
        s.unmatched_candidates,
        format_cents(s.matched_amount_cents),
    );

    for m in result.matches.iter().filter(|m| m.match_type == MatchType::Unmatched) {
        eprintln!(
            "  unmatched row {}: {} / {} (best score {:.2})",
            m.source.row, m.source.name, m.source.service, m.confidence_score,
        );
    }
}
