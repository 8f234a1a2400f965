use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sendblocks")]
#[command(author = "SendBlocks")]
#[command(version)]
#[command(about = "Deploy SendBlocks functions, webhooks and subgraphs from YAML", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Project directory (holds sendblocks.config.json and src/)
    #[arg(short = 'C', long, global = true, default_value = ".")]
    pub project: PathBuf,

    /// API base URL, overrides sendblocks.config.json
    #[arg(long, env = "SENDBLOCKS_API_URL", global = true, hide_env_values = true)]
    pub api_url: Option<String>,

    /// Bearer token, overrides the .auth file
    #[arg(long, env = "SENDBLOCKS_TOKEN", global = true, hide_env_values = true)]
    pub token: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show what deploy would change
    Preview(PreviewArgs),

    /// Create and update the declared resources
    Deploy(DeployArgs),

    /// Delete the declared resources that exist remotely
    Destroy(DestroyArgs),

    /// Manage deployed functions
    #[command(subcommand)]
    Functions(FunctionsCommand),

    /// Manage deployed webhooks
    #[command(subcommand)]
    Webhooks(WebhooksCommand),

    /// Manage deployed subgraph schemas
    #[command(subcommand)]
    Subgraphs(SubgraphsCommand),

    /// Convert a number between hex and decimal
    Convert {
        /// `0x`-prefixed or a-f hex converts to decimal; decimal converts to hex
        value: String,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

// ============================================================================
// Preview / Deploy / Destroy
// ============================================================================

#[derive(Args)]
pub struct PreviewArgs {
    /// Warn when the token cannot list subgraphs
    #[arg(long)]
    pub warn_on_forbidden_subgraphs: bool,
}

#[derive(Args)]
pub struct DeployArgs {
    /// Show the preview and stop
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Do not ask for confirmation
    #[arg(short = 'y', long)]
    pub non_interactive: bool,

    /// Continue with the remaining resources after a failure
    #[arg(long)]
    pub keep_going: bool,
}

#[derive(Args)]
pub struct DestroyArgs {
    /// Show what would be destroyed and stop
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Do not ask for confirmation
    #[arg(short = 'y', long)]
    pub non_interactive: bool,

    /// Stop at the first failed deletion
    #[arg(long)]
    pub fail_fast: bool,
}

// ============================================================================
// Functions
// ============================================================================

#[derive(Subcommand)]
pub enum FunctionsCommand {
    /// List deployed functions
    List,

    /// Delete a deployed function by name
    Delete {
        /// Function name
        name: String,
    },

    /// Replay a block range through deployed functions
    ReplayBlocks(ReplayArgs),
}

#[derive(Args)]
pub struct ReplayArgs {
    /// First block (decimal or 0x-prefixed hex)
    #[arg(long)]
    pub start: String,

    /// Last block (decimal or 0x-prefixed hex)
    #[arg(long)]
    pub end: String,

    /// Functions to replay, comma-separated (default: every declared function)
    #[arg(long, value_delimiter = ',')]
    pub functions: Vec<String>,
}

// ============================================================================
// Webhooks / Subgraphs
// ============================================================================

#[derive(Subcommand)]
pub enum WebhooksCommand {
    /// List deployed webhooks
    List,

    /// Delete a deployed webhook by name
    Delete {
        /// Webhook name
        name: String,
    },
}

#[derive(Subcommand)]
pub enum SubgraphsCommand {
    /// List deployed subgraph schemas
    List,

    /// Delete a deployed subgraph schema by name
    Delete {
        /// Schema name
        name: String,
    },
}
