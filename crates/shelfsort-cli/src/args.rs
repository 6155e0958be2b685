use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "shelfsort")]
#[command(about = "Keyword-scoring product classifier")]
#[command(version)]
pub struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Quiet output (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Base directory (default: ~/.shelfsort)
    #[arg(long, global = true)]
    pub base_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Classify a single product
    Classify {
        #[command(flatten)]
        product: ProductArgs,

        /// Escalate low-confidence results to the configured vision command
        #[arg(long)]
        vision: bool,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,

        /// Number of runner-up scores to show
        #[arg(long, default_value = "3")]
        top: usize,
    },

    /// Classify a batch of products (JSON array or JSON Lines)
    Batch {
        /// Products file
        file: PathBuf,

        /// Escalate low-confidence results to the configured vision command
        #[arg(long)]
        vision: bool,

        /// Minimum confidence to apply a category (default: from config)
        #[arg(long)]
        min_confidence: Option<i64>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Inspect category rules
    Rules {
        #[command(subcommand)]
        action: RulesAction,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Product fields for `classify`
#[derive(Args, Debug, Default)]
pub struct ProductArgs {
    /// Read the product from a JSON file instead of flags
    #[arg(long, conflicts_with_all = ["name", "name_ar", "description", "breadcrumb", "url", "image"])]
    pub file: Option<PathBuf>,

    /// Product name
    #[arg(long)]
    pub name: Option<String>,

    /// Arabic product name
    #[arg(long)]
    pub name_ar: Option<String>,

    /// Product description
    #[arg(long)]
    pub description: Option<String>,

    /// Breadcrumb entry (repeatable, outermost first)
    #[arg(long, value_name = "TEXT")]
    pub breadcrumb: Vec<String>,

    /// Source page URL
    #[arg(long)]
    pub url: Option<String>,

    /// Image URL (repeatable, primary first)
    #[arg(long, value_name = "URL")]
    pub image: Vec<String>,
}

#[derive(Subcommand)]
pub enum RulesAction {
    /// List rules in evaluation order
    List,

    /// Show a rule's keywords
    Show {
        /// Rule id
        id: String,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a config value
    Get {
        /// Config key (e.g., vision.command)
        key: String,
    },

    /// Set a config value
    Set {
        /// Config key (e.g., reclassify.min_confidence)
        key: String,

        /// Value to set
        value: String,
    },

    /// List all config values
    List,

    /// Show config file path
    Path,

    /// Initialize config file with defaults
    Init,
}
