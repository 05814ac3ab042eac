// rewardsync CLI - reconcile POS transactions against rewards-program redemptions

mod exit_codes;
mod recon;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use rewardsync_recon::sample::SampleFeed;
use rewardsync_recon::{MatchStrategy, ReconError};
use tracing_subscriber::EnvFilter;

use exit_codes::{recon_exit_code, EXIT_RECON_IO, EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "rewardsync")]
#[command(about = "Match point-of-sale transactions to rewards-program redemptions")]
#[command(long_version = long_version())]
#[command(version)]
#[command(subcommand_required = false)]
struct Cli {
    /// Log engine activity to stderr (-v debug, -vv trace). RUST_LOG overrides.
    #[arg(long, short = 'v', action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile the feeds listed in a TOML config file
    #[command(after_help = "\
Examples:
  rewardsync run march.recon.toml
  rewardsync run march.recon.toml --json
  rewardsync run march.recon.toml --output result.json --csv matches.csv
  rewardsync run march.recon.toml --csv report.csv --report")]
    Run {
        /// Path to the .recon.toml config file
        config: PathBuf,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Reconcile ad-hoc files without feed sections in a config
    #[command(after_help = "\
Examples:
  rewardsync match --source pos.csv --candidates alle=alle.csv
  rewardsync match --source pos.csv --candidates alle=alle.csv aspire=aspire.csv --json
  rewardsync match --source pos.csv --candidates alle=alle.csv --config tuning.toml --strategy optimal")]
    Match {
        /// POS export (CSV)
        #[arg(long)]
        source: PathBuf,

        /// Rewards feeds as PROGRAM=FILE pairs
        #[arg(long, num_args = 1.., required = true, value_name = "PROGRAM=FILE")]
        candidates: Vec<String>,

        /// Tuning config (thresholds, weights, aliases); feed sections are ignored
        #[arg(long)]
        config: Option<PathBuf>,

        /// Override the config's matching strategy
        #[arg(long)]
        strategy: Option<StrategyArg>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Parse and validate a config without running
    #[command(after_help = "\
Examples:
  rewardsync validate march.recon.toml")]
    Validate {
        /// Path to the .recon.toml config file
        config: PathBuf,
    },

    /// Print a built-in sample feed as CSV
    #[command(after_help = "\
Examples:
  rewardsync sample pos > pos.csv
  rewardsync sample alle > alle.csv")]
    Sample {
        /// Which feed to print
        feed: SampleArg,
    },

    /// Reconcile the built-in sample feeds
    Demo {
        /// Output JSON to stdout instead of a human summary
        #[arg(long)]
        json: bool,
    },
}

#[derive(clap::Args)]
struct OutputArgs {
    /// Output JSON to stdout instead of human summary
    #[arg(long)]
    json: bool,

    /// Write JSON output to file
    #[arg(long)]
    output: Option<PathBuf>,

    /// Write matches as CSV to file
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Prefix the CSV with a report header (title, timestamp, totals)
    #[arg(long, requires = "csv")]
    report: bool,

    /// Exit 64 when any transaction is left unmatched
    #[arg(long)]
    fail_on_unmatched: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum StrategyArg {
    Greedy,
    Optimal,
}

impl From<StrategyArg> for MatchStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Greedy => MatchStrategy::Greedy,
            StrategyArg::Optimal => MatchStrategy::Optimal,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum SampleArg {
    Pos,
    Alle,
    Aspire,
}

impl From<SampleArg> for SampleFeed {
    fn from(arg: SampleArg) -> Self {
        match arg {
            SampleArg::Pos => SampleFeed::Pos,
            SampleArg::Alle => SampleFeed::Alle,
            SampleArg::Aspire => SampleFeed::Aspire,
        }
    }
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("GIT_COMMIT_HASH"), ")",
        "\nengine:  rewardsync-recon ", env!("CARGO_PKG_VERSION"),
        "\nbuild:   ", env!("BUILD_PROFILE"),
    )
}

/// Level used when `RUST_LOG` is unset or invalid.
fn default_log_level(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    }
}

/// Logs go to stderr so `--json` stdout stays a single JSON value.
/// `RUST_LOG` wins over `-v` when set.
fn init_logging(verbose: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_log_level(verbose)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        None => {
            eprintln!("Usage: rewardsync <command> [options]");
            eprintln!("       rewardsync --help for more information");
            Ok(())
        }
        Some(Commands::Run { config, output }) => recon::cmd_run(config, output.into()),
        Some(Commands::Match { source, candidates, config, strategy, output }) => {
            recon::cmd_match(source, candidates, config, strategy.map(Into::into), output.into())
        }
        Some(Commands::Validate { config }) => recon::cmd_validate(config),
        Some(Commands::Sample { feed }) => recon::cmd_sample(feed.into()),
        Some(Commands::Demo { json }) => recon::cmd_demo(json),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

impl From<OutputArgs> for recon::OutputOptions {
    fn from(args: OutputArgs) -> Self {
        Self {
            json: args.json,
            output: args.output,
            csv: args.csv,
            report: args.report,
            fail_on_unmatched: args.fail_on_unmatched,
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn usage(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self { code: EXIT_RECON_IO, message: msg.into(), hint: None }
    }

    /// Create error from an engine error with the matching exit code.
    pub fn recon(err: ReconError) -> Self {
        let code = recon_exit_code(&err);
        let hint = match &err {
            ReconError::Parse { .. } => {
                Some("each feed needs a header line and at least one data row".to_string())
            }
            ReconError::ConfigValidation(_) => {
                Some("run `rewardsync validate <config>` after editing".to_string())
            }
            _ => None,
        };
        Self { code, message: err.to_string(), hint }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<ReconError> for CliError {
    fn from(err: ReconError) -> Self {
        Self::recon(err)
    }
}
