use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::scanner::model::RiskLevel;

/// Command-line interface for reclaim
#[derive(Parser, Debug)]
#[command(
    name = "reclaim",
    version,
    about = "Find disk-space-consuming files and remove them safely",
    long_about = "reclaim scans cache, log and temp locations (or the whole disk) for large\n\
                  files, rates how risky each one is to delete, and removes the ones you pick.",
    after_help = "EXAMPLES:\n  \
        reclaim scan                              Fast scan of well-known locations\n  \
        reclaim scan --deep --threshold-mb 500    Whole-disk scan for files >= 500 MB\n  \
        reclaim scan --root ~/Downloads --json    Scan one folder, JSON output\n  \
        reclaim clean                             Delete low-risk files (asks first)\n  \
        reclaim clean --category Logs --max-risk medium --dry-run\n  \
        reclaim config set scan_threshold_mb 50   Change the size threshold"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format
    #[arg(long, global = true, default_value = "human")]
    pub format: OutputFormat,

    /// Shorthand for --format json
    #[arg(long, global = true)]
    pub json: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Verbose output
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Minimal output
    #[arg(long, short, global = true)]
    pub quiet: bool,
}

impl Cli {
    pub fn output_format(&self) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else if self.quiet {
            OutputFormat::Quiet
        } else {
            self.format
        }
    }
}

/// Options shared by every command that runs a scan
#[derive(Args, Debug, Clone, Default)]
pub struct ScanArgs {
    /// Scan the entire filesystem instead of well-known locations
    #[arg(long)]
    pub deep: bool,

    /// Scan these directories instead of a preset (repeatable)
    #[arg(long = "root", value_name = "DIR")]
    pub roots: Vec<PathBuf>,

    /// Minimum file size in MB (10–1000)
    #[arg(long, value_name = "MB")]
    pub threshold_mb: Option<u64>,

    /// Extra path or glob to skip (repeatable)
    #[arg(long = "exclude", value_name = "PATTERN")]
    pub excludes: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan for reclaimable files
    Scan {
        #[command(flatten)]
        scan: ScanArgs,

        /// Show individual files in results
        #[arg(long)]
        detailed: bool,
    },

    /// Scan, select and delete files
    Clean {
        #[command(flatten)]
        scan: ScanArgs,

        /// Only select files in these categories
        #[arg(long = "category", value_delimiter = ',')]
        categories: Vec<String>,

        /// Highest risk level to select (default: only low-risk files)
        #[arg(long)]
        max_risk: Option<RiskLevel>,

        /// Show what would be deleted without deleting
        #[arg(long)]
        dry_run: bool,

        /// Skip confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Key name (e.g. scan_threshold_mb, stale_days, licensed)
        key: String,
        /// Value
        value: String,
    },
    /// Reset to defaults
    Reset,
    /// Print the config file location
    Path,
}

#[derive(Debug, Clone, Copy, PartialEq, ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
    Quiet,
}
