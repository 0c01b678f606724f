//! Clap derive structures for the `thingsbridge` CLI.
//!
//! Defines the command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Root ─────────────────────────────────────────────────────────────

/// thingsbridge -- poll and control ThingsBoard device attributes
#[derive(Debug, Parser)]
#[command(
    name = "thingsbridge",
    version,
    about = "Poll and control ThingsBoard device attributes",
    long_about = "Polls the ThingsBoard device HTTP API, flattens client and shared\n\
        attributes into points, and writes shared attributes back.",
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

// ── Flags shared by every command ────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Configuration file (defaults to the platform config directory)
    #[arg(long, env = "THINGSBRIDGE_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Configuration entry to operate on
    #[arg(long, short = 'e', env = "THINGSBRIDGE_ENTRY", global = true)]
    pub entry: Option<String>,

    /// How results are printed
    #[arg(
        long,
        short = 'o',
        env = "THINGSBRIDGE_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// Colorize `watch` output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Log more (-v info, -vv debug, -vvv trace)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Print nothing but errors
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Answer yes to confirmations
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Skip TLS certificate verification
    #[arg(long, short = 'k', env = "THINGSBRIDGE_INSECURE", global = true)]
    pub insecure: bool,
}

// ── Rendering ────────────────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    Table,
    /// Indented JSON
    Json,
    /// JSON on one line
    JsonCompact,
    /// YAML document
    Yaml,
    /// One item per line, for shell pipelines
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Only when stdout is a terminal and NO_COLOR is unset
    Auto,
    /// Even when piped
    Always,
    /// Plain text only
    Never,
}

// ── Commands ─────────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Validate a host and access token, then save a configuration entry
    Setup(SetupArgs),

    /// Manage configuration entries
    Entries(EntriesArgs),

    /// List projected points, or write a read-write point
    #[command(alias = "p")]
    Points(PointsArgs),

    /// Set one shared attribute by its bare name
    Set(SetArgs),

    /// Set several shared attributes from a JSON object
    SetMany(SetManyArgs),

    /// Poll continuously and print discovered points and refresh results
    Watch(WatchArgs),

    /// Print a shell completion script
    Completions(CompletionsArgs),
}

// ── Setup ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct SetupArgs {
    /// ThingsBoard host; https:// is assumed when no scheme is given
    #[arg(long)]
    pub host: String,

    /// Device access token (prompted for when omitted)
    #[arg(long, conflicts_with = "token_env")]
    pub token: Option<String>,

    /// Read the token from this environment variable and store only its name
    #[arg(long)]
    pub token_env: Option<String>,
}

// ── Entries ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct EntriesArgs {
    #[command(subcommand)]
    pub command: EntriesCommand,
}

#[derive(Debug, Subcommand)]
pub enum EntriesCommand {
    /// List configured entries
    #[command(alias = "ls")]
    List,

    /// Remove a configuration entry
    #[command(alias = "rm")]
    Remove {
        /// Entry id
        id: String,
    },
}

// ── Points ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct PointsArgs {
    #[command(subcommand)]
    pub command: Option<PointsCommand>,
}

#[derive(Debug, Subcommand)]
pub enum PointsCommand {
    /// Write a numeric value through a read-write point
    Set {
        /// Qualified key, e.g. shared_setpoint
        key: String,
        /// New value
        #[arg(allow_negative_numbers = true)]
        value: f64,
    },
}

// ── Attribute writes ─────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct SetArgs {
    /// Bare shared attribute name, sent as-is
    pub attribute_key: String,

    /// Value; JSON scalars keep their type, anything else is a string
    #[arg(allow_hyphen_values = true)]
    pub value: String,
}

#[derive(Debug, Args)]
#[group(required = true, multiple = false)]
pub struct SetManyArgs {
    /// Inline JSON object of name -> value
    #[arg(long)]
    pub json: Option<String>,

    /// Path to a JSON file holding the object
    #[arg(long, short = 'F')]
    pub from_file: Option<PathBuf>,
}

// ── Watch ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Poll period in seconds (overrides the configured interval)
    #[arg(long, short = 'i')]
    pub interval: Option<u64>,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Target shell
    pub shell: clap_complete::Shell,
}
