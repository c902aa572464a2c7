use crate::context::DEFAULT_CONTEXT_RANGE;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "logfix")]
#[command(author, version, about = "Parse application logs and attach remediation suggestions to errors")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// TOML configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Number of parallel threads (0 = auto-detect)
    #[arg(long, short = 'j', global = true)]
    pub parallel: Option<usize>,

    /// Dynamic knowledge-base file
    #[arg(long, global = true)]
    pub kb_path: Option<PathBuf>,

    /// Prediction cache file
    #[arg(long, global = true)]
    pub predictions_path: Option<PathBuf>,

    /// Classifier keyword model (JSON)
    #[arg(long, global = true)]
    pub model: Option<PathBuf>,

    /// Never call the remediation API
    #[arg(long, global = true)]
    pub no_api: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(long, short = 'v', global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Parse log files and attach solutions to error, warning and debug entries
    Analyze(AnalyzeArgs),

    /// Resolve a single message through all tiers
    Resolve(MessageArgs),

    /// Run only the classifier on a message
    Predict(MessageArgs),

    /// Inspect and edit the dynamic knowledge base
    Kb(KbArgs),

    /// Page through or search a raw log file
    View(ViewArgs),

    /// Show the records around the entry holding a message
    Context(ContextArgs),
}

#[derive(Args)]
pub struct AnalyzeArgs {
    /// Log files to analyze (supports glob patterns)
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Output format
    #[arg(long, short, value_enum, default_value = "table")]
    pub output: OutputFormat,

    /// Filter by log level(s)
    #[arg(long, short)]
    pub level: Option<Vec<String>>,

    /// Show every level, not only ERROR, WARN and DEBUG
    #[arg(long, conflicts_with = "level")]
    pub all_levels: bool,

    /// Restrict to these file names
    #[arg(long = "file")]
    pub file: Option<Vec<String>>,

    /// Filter by time - start (e.g., "1 hour ago", "2025-01-01")
    #[arg(long)]
    pub since: Option<String>,

    /// Filter by time - end
    #[arg(long)]
    pub until: Option<String>,

    /// Keyword to search in message or solution
    #[arg(long, short)]
    pub grep: Option<String>,

    /// Maximum number of results
    #[arg(long, short = 'n')]
    pub limit: Option<usize>,

    /// Output file (default: stdout)
    #[arg(long)]
    pub output_file: Option<PathBuf>,
}

#[derive(Args)]
pub struct MessageArgs {
    /// Log message text
    #[arg(required = true)]
    pub message: String,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct KbArgs {
    #[command(subcommand)]
    pub action: KbAction,
}

#[derive(Subcommand)]
pub enum KbAction {
    /// List dynamic entries sorted by key
    List {
        /// Only entries whose key or solution contains this text
        #[arg(long, short)]
        search: Option<String>,
    },
    /// Add a new entry; fails if the key exists
    Add { key: String, solution: String },
    /// Create or replace an entry
    Update { key: String, solution: String },
    /// Delete an entry
    Delete { key: String },
}

#[derive(Args)]
pub struct ViewArgs {
    /// Log file to view
    #[arg(required = true)]
    pub file: PathBuf,

    /// Show only lines matching this keyword, with surrounding lines
    #[arg(long, short)]
    pub grep: Option<String>,

    /// Keyword must equal the whole line
    #[arg(long, requires = "grep")]
    pub strict: bool,

    /// Page to show when not searching
    #[arg(long, default_value = "1")]
    pub page: usize,

    /// Lines per page
    #[arg(long, default_value = "100")]
    pub per_page: usize,
}

#[derive(Args)]
pub struct ContextArgs {
    /// Log file holding the entry
    #[arg(required = true)]
    pub file: PathBuf,

    /// Message of the selected entry
    #[arg(long, short)]
    pub message: String,

    /// Records to show before and after
    #[arg(long, short, default_value_t = DEFAULT_CONTEXT_RANGE)]
    pub range: usize,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    Table,
    /// JSON array
    Json,
    /// Newline-delimited JSON
    Ndjson,
    /// CSV format
    Csv,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Ndjson => write!(f, "ndjson"),
            OutputFormat::Csv => write!(f, "csv"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["logfix", "analyze", "a.log", "-j", "4", "--no-api", "-vv", "-l", "error"]).unwrap();
        assert_eq!(cli.global.parallel, Some(4));
        assert!(cli.global.no_api);
        assert_eq!(cli.global.verbose, 2);
        match cli.command {
            Commands::Analyze(args) => {
                assert_eq!(args.files, vec![PathBuf::from("a.log")]);
                assert_eq!(args.level, Some(vec!["error".to_string()]));
                assert_eq!(args.output, OutputFormat::Table);
            }
            _ => panic!("expected analyze"),
        }
    }

    #[test]
    fn test_kb_subcommands() {
        let cli = Cli::try_parse_from(["logfix", "kb", "add", "modem offline", "Power cycle it."]).unwrap();
        match cli.command {
            Commands::Kb(KbArgs {
                action: KbAction::Add { key, solution },
            }) => {
                assert_eq!(key, "modem offline");
                assert_eq!(solution, "Power cycle it.");
            }
            _ => panic!("expected kb add"),
        }
    }

    #[test]
    fn test_strict_requires_grep() {
        assert!(Cli::try_parse_from(["logfix", "view", "a.log", "--strict"]).is_err());
        assert!(Cli::try_parse_from(["logfix", "view", "a.log", "--strict", "-g", "x"]).is_ok());
    }
}
