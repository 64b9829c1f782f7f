//! Clap derive structures for the `arbor` CLI.
//!
//! Defines the command tree, global flags, and shared types.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// arbor -- browse and edit a tree that lives on a remote service
#[derive(Debug, Parser)]
#[command(
    name = "arbor",
    version,
    about = "Browse and edit remote trees from the command line",
    long_about = "Keeps a local snapshot of a remote tree and edits it through the\n\
        service's create / rename / delete endpoints.\n\n\
        Every edit is followed by a full reload: what you see is always\n\
        the server's view of the tree.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Profile to use
    #[arg(long, short = 'p', env = "ARBOR_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Service base URL (overrides profile)
    #[arg(long, short = 'u', env = "ARBOR_URL", global = true)]
    pub url: Option<String>,

    /// Tree name (overrides profile)
    #[arg(long, short = 't', env = "ARBOR_TREE", global = true)]
    pub tree: Option<String>,

    /// Endpoint namespace, e.g. "api.user"
    #[arg(long, env = "ARBOR_NAMESPACE", global = true)]
    pub namespace: Option<String>,

    /// Output format [default: from config, else tree]
    #[arg(long, short = 'o', env = "ARBOR_OUTPUT", global = true)]
    pub output: Option<OutputFormat>,

    /// When to use color output [default: from config, else auto]
    #[arg(long, env = "ARBOR_COLOR", global = true)]
    pub color: Option<ColorMode>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept invalid TLS certificates
    #[arg(long, short = 'k', env = "ARBOR_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds
    #[arg(long, env = "ARBOR_TIMEOUT", global = true)]
    pub timeout: Option<u64>,

    /// Wait for an in-flight operation instead of failing as busy
    #[arg(long, global = true)]
    pub queue: bool,
}

impl GlobalOpts {
    pub fn output_format(&self) -> OutputFormat {
        self.output.clone().unwrap_or(OutputFormat::Tree)
    }

    pub fn color_mode(&self) -> ColorMode {
        self.color.clone().unwrap_or(ColorMode::Auto)
    }
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Indented tree (default, interactive)
    Tree,
    /// One row per node
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one node id per line (scripting)
    Plain,
}

#[derive(Debug, Clone, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Load the tree and print it
    #[command(alias = "ls")]
    Show,

    /// Add a node under the root or under --parent
    Add(AddArgs),

    /// Rename a node
    #[command(alias = "mv")]
    Rename(RenameArgs),

    /// Delete a node and its whole subtree
    #[command(alias = "rm")]
    Delete(DeleteArgs),

    /// Reload periodically and print the tree whenever it changes
    Watch(WatchArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Tree edits ───────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct AddArgs {
    /// Parent node id (defaults to the root)
    #[arg(long)]
    pub parent: Option<String>,

    /// Name of the new node
    pub name: String,
}

#[derive(Debug, Args)]
pub struct RenameArgs {
    /// Node id
    pub id: String,

    /// New name
    pub name: String,
}

#[derive(Debug, Args)]
pub struct DeleteArgs {
    /// Node id
    pub id: String,
}

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Seconds between reloads
    #[arg(long, short = 'i', default_value = "10", value_parser = clap::value_parser!(u64).range(1..))]
    pub interval: u64,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create or extend the config file with a profile
    Init,

    /// Display current resolved configuration
    Show,

    /// Print the config file location
    Path,

    /// Set the default profile
    Use {
        /// Profile name
        name: String,
    },
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
