//! Clap derive structures for the `ponctl` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// ponctl -- provision and inspect ONUs through a TL1 UNM server
#[derive(Debug, Parser)]
#[command(
    name = "ponctl",
    version,
    about = "Provision and inspect GPON ONUs from the command line",
    long_about = "Talks TL1 to a UNM OLT management server: lists ONUs on a PON port,\n\
        reads optical levels, and runs the full ONU activation sequence\n\
        (delete, add, WAN profiles, LAN port).",
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
    /// Server profile to use
    #[arg(long, short = 'p', env = "PONCTL_PROFILE", global = true)]
    pub profile: Option<String>,

    /// UNM server host (overrides profile)
    #[arg(long, short = 'H', env = "PONCTL_HOST", global = true)]
    pub host: Option<String>,

    /// UNM TL1 port (overrides profile)
    #[arg(long, env = "PONCTL_PORT", global = true)]
    pub port: Option<u16>,

    /// UNM username (overrides profile)
    #[arg(long, short = 'u', env = "PONCTL_USERNAME", global = true)]
    pub username: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "PONCTL_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// Per-command timeout in seconds
    #[arg(long, env = "PONCTL_TIMEOUT", global = true)]
    pub timeout: Option<u64>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,
}

// ── Output Enum ──────────────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Inspect ONUs on a PON port
    #[command(alias = "onu")]
    Onus(OnusArgs),

    /// Provision an ONU from explicit parameters
    Provision(ProvisionArgs),

    /// Provision the ONU recorded for a service protocol
    Activate(ActivateArgs),

    /// Check that the UNM server answers and accepts the credentials
    Ping,

    /// Inspect CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── ONUs ─────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct OnusArgs {
    #[command(subcommand)]
    pub command: OnusCommand,
}

#[derive(Debug, Subcommand)]
pub enum OnusCommand {
    /// List ONUs registered on a PON port
    #[command(alias = "ls")]
    List {
        /// OLT identifier (usually its IP)
        olt: String,
        /// PON slot
        #[arg(value_name = "SLOT")]
        pon_slot: u32,
        /// PON port
        #[arg(value_name = "PORT")]
        pon_port: u32,
        /// Keep ONUs whose name or description contains this (case-insensitive)
        #[arg(long, short = 'f')]
        filter: Option<String>,
    },

    /// Show optical levels of one ONU
    Optical {
        /// OLT identifier (usually its IP)
        olt: String,
        /// PON slot
        #[arg(value_name = "SLOT")]
        pon_slot: u32,
        /// PON port
        #[arg(value_name = "PORT")]
        pon_port: u32,
        /// ONU serial / MAC identifier
        mac: String,
    },
}

// ── Provisioning ─────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ProvisionArgs {
    /// TOML file with provisioning parameters; flags override its values
    #[arg(long, short = 'F')]
    pub file: Option<PathBuf>,

    /// OLT identifier (usually its IP)
    #[arg(long)]
    pub olt: Option<String>,

    /// PON slot
    #[arg(long)]
    pub pon_slot: Option<u32>,

    /// PON port
    #[arg(long)]
    pub pon_port: Option<u32>,

    /// ONU serial / MAC identifier
    #[arg(long)]
    pub serial: Option<String>,

    /// Splitter name
    #[arg(long)]
    pub splitter: Option<String>,

    /// Splitter port
    #[arg(long)]
    pub splitter_port: Option<String>,

    /// Client name shown on the ONU record
    #[arg(long)]
    pub client_name: Option<String>,

    /// ONU hardware model (defaults to the profile's model)
    #[arg(long)]
    pub model: Option<String>,

    /// Service VLAN
    #[arg(long)]
    pub vlan: Option<String>,

    /// PPPoE username
    #[arg(long)]
    pub pppoe_user: Option<String>,

    /// PPPoE password
    #[arg(long, env = "PONCTL_PPPOE_PASSWORD", hide_env_values = true)]
    pub pppoe_password: Option<String>,
}

#[derive(Debug, Args)]
pub struct ActivateArgs {
    /// Service protocol (assignment) number
    pub protocol: u64,

    /// TOML file with `[[connections]]` records
    #[arg(long, short = 'c', env = "PONCTL_CONNECTIONS")]
    pub connections: PathBuf,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Display current resolved configuration
    Show,

    /// Print config file path
    Path,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
