//! Clap derive structures for the `kegmon` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{ArgGroup, Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// kegmon -- manage keg volume monitors from the command line
#[derive(Debug, Parser)]
#[command(
    name = "kegmon",
    version,
    about = "Manage keg volume monitors from the command line",
    long_about = "Administer weight and flow devices on a kegmon server.\n\n\
        Device commands are checked against the device's current state; a\n\
        command the device cannot accept right now is skipped, not failed.",
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
    #[arg(long, short = 'p', env = "KEGMON_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Server URL (overrides profile)
    #[arg(long, short = 's', env = "KEGMON_SERVER", global = true)]
    pub server: Option<String>,

    /// Login email (overrides profile)
    #[arg(long, short = 'e', env = "KEGMON_EMAIL", global = true)]
    pub email: Option<String>,

    /// Config file (defaults to the platform config dir)
    #[arg(long, env = "KEGMON_CONFIG", global = true, hide_env = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "KEGMON_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "KEGMON_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "KEGMON_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

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

#[derive(Debug, Clone, ValueEnum)]
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
    /// Log in and show the account in use
    Login(LoginArgs),

    /// Manage devices and send them commands
    #[command(alias = "dev", alias = "d")]
    Devices(DevicesArgs),

    /// Manage user accounts and API keys
    #[command(alias = "u")]
    Users(UsersArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Login ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct LoginArgs {
    /// Save server, email, and password (keyring) to the active profile
    #[arg(long)]
    pub save: bool,
}

// ── Devices ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct DevicesArgs {
    #[command(subcommand)]
    pub command: DevicesCommand,
}

#[derive(Debug, Subcommand)]
pub enum DevicesCommand {
    /// List all devices
    #[command(alias = "ls")]
    List,

    /// Show one device
    Get {
        /// Device ID
        id: String,
    },

    /// Find devices by hardware chip ID
    Find {
        /// Chip ID reported by the hardware
        chip_id: String,
    },

    /// Register a new device
    Create {
        #[command(flatten)]
        fields: DeviceFields,

        /// Read the device body from a JSON file instead
        #[arg(long, short = 'F', conflicts_with_all = ["name", "chip_id", "device_type"])]
        from_file: Option<PathBuf>,
    },

    /// Update device settings
    Update {
        /// Device ID
        id: String,

        #[command(flatten)]
        fields: DeviceFields,

        /// Read the update body from a JSON file instead
        #[arg(long, short = 'F')]
        from_file: Option<PathBuf>,
    },

    /// Delete a device
    #[command(alias = "rm")]
    Delete {
        /// Device ID
        id: String,
    },

    /// Turn maintenance mode on or off
    Maintenance(MaintenanceArgs),

    /// Calibrate against a known weight (enter calibration mode, then commit)
    Calibrate {
        /// Device ID
        id: String,

        /// Known weight placed on the scale, in the device's unit
        #[arg(long, short = 'w', allow_negative_numbers = true)]
        weight: f64,
    },

    /// Leave calibration mode without calibrating
    CalibrateCancel {
        /// Device ID
        id: String,
    },

    /// Ask the device to report in
    Ping {
        /// Device ID
        id: String,
    },

    /// Zero the scale
    Tare {
        /// Device ID
        id: String,
    },

    /// Wipe stored samples (maintenance mode only)
    ClearMemory {
        /// Device ID
        id: String,
    },

    /// Ask the device to push its most recent sample
    Sample {
        /// Device ID
        id: String,
    },

    /// Send a raw rpc command, bypassing state checks
    Rpc {
        /// Device ID
        id: String,

        /// Command name (e.g. start_maintenance_mode)
        command: String,

        /// JSON payload
        #[arg(long, short = 'd', default_value = "{}")]
        data: String,
    },

    /// Show the measurement history of a device
    Measurements {
        /// Device ID
        id: String,
    },

    /// Show manufacturer info for a device
    Info {
        /// Device ID
        id: String,

        /// Single key to fetch
        #[arg(long)]
        key: Option<String>,
    },
}

/// Writable device fields shared by create and update.
#[derive(Debug, Args)]
pub struct DeviceFields {
    /// Display name
    #[arg(long)]
    pub name: Option<String>,

    /// Hardware chip ID
    #[arg(long)]
    pub chip_id: Option<String>,

    /// Chip model
    #[arg(long)]
    pub chip_model: Option<String>,

    /// Sensing hardware
    #[arg(long = "type", value_enum)]
    pub device_type: Option<DeviceKind>,

    /// Weight of the empty keg
    #[arg(long)]
    pub empty_keg_weight: Option<f64>,

    /// Unit of --empty-keg-weight
    #[arg(long)]
    pub empty_keg_weight_unit: Option<String>,

    /// Volume of a full keg
    #[arg(long)]
    pub start_volume: Option<f64>,

    /// Unit of --start-volume
    #[arg(long)]
    pub start_volume_unit: Option<String>,

    /// Unit used to display remaining volume
    #[arg(long)]
    pub display_volume_unit: Option<String>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum DeviceKind {
    Weight,
    Flow,
}

#[derive(Debug, Args)]
#[command(group(ArgGroup::new("mode").required(true).args(["on", "off"])))]
pub struct MaintenanceArgs {
    /// Device ID
    pub id: String,

    /// Enter maintenance mode
    #[arg(long)]
    pub on: bool,

    /// Leave maintenance mode
    #[arg(long)]
    pub off: bool,
}

// ── Users ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct UsersArgs {
    #[command(subcommand)]
    pub command: UsersCommand,
}

#[derive(Debug, Subcommand)]
pub enum UsersCommand {
    /// List all users
    #[command(alias = "ls")]
    List,

    /// Show one user
    Get {
        /// User ID
        id: String,
    },

    /// Show the logged-in user
    Me,

    /// Delete a user
    #[command(alias = "rm")]
    Delete {
        /// User ID
        id: String,
    },

    /// Manage a user's API key
    ApiKey(ApiKeyArgs),
}

#[derive(Debug, Args)]
pub struct ApiKeyArgs {
    #[command(subcommand)]
    pub command: ApiKeyCommand,
}

#[derive(Debug, Subcommand)]
pub enum ApiKeyCommand {
    /// Show the current key, if any
    Show {
        /// User ID
        id: String,
    },

    /// Issue a key
    Issue {
        /// User ID
        id: String,

        /// Replace an existing key
        #[arg(long)]
        regenerate: bool,
    },

    /// Revoke the current key
    Revoke {
        /// User ID
        id: String,
    },
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
