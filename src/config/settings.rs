//! Runtime settings
//!
//! The command grammar is positional, so tuning knobs are taken from the
//! environment instead of competing with it on the command line.

use std::time::Duration;

use clap::{Parser, ValueEnum, builder::FalseyValueParser};

/// How the result of the update operation maps to the process exit status
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExitPolicy {
    /// Exit successfully once the update finished, whatever its result
    #[default]
    AlwaysSucceed,
    /// Exit with failure when the update reported an error
    Propagate,
}

/// Raw settings as read from the environment
#[derive(Parser, Debug, Clone)]
#[clap(name = "bluefruit", version, author)]
#[clap(about = "Bluefruit firmware updater runtime settings")]
pub struct EnvArgs {
    /// Bluetooth adapter name (e.g. hci0)
    #[clap(long, env = "BLUEFRUIT_ADAPTER")]
    pub adapter: Option<String>,

    /// Seconds to wait for a line on standard input
    #[clap(long, env = "BLUEFRUIT_INPUT_TIMEOUT")]
    pub input_timeout: Option<u64>,

    /// Seconds to wait for the firmware update to finish
    #[clap(long, env = "BLUEFRUIT_UPDATE_TIMEOUT")]
    pub update_timeout: Option<u64>,

    /// Exit status policy after the update finished
    #[clap(long, env = "BLUEFRUIT_EXIT_POLICY", value_enum, default_value = "always-succeed")]
    pub exit_policy: ExitPolicy,

    /// Reject invocations naming more than one command
    #[clap(long, env = "BLUEFRUIT_STRICT_COMMANDS", value_parser = FalseyValueParser::new())]
    pub strict_commands: bool,

    /// Packets between receipt notifications during transfer (0 disables)
    #[clap(long, env = "BLUEFRUIT_PACKET_NOTIFY", default_value = "10")]
    pub packet_notify: u16,
}

/// Runtime configuration settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub adapter: Option<String>,
    pub input_timeout: Option<Duration>,
    pub update_timeout: Option<Duration>,
    pub exit_policy: ExitPolicy,
    pub strict_commands: bool,
    pub packet_notify: u16,
}

impl Settings {
    /// Read settings from `BLUEFRUIT_*` environment variables
    pub fn from_env() -> Result<Self, clap::Error> {
        EnvArgs::try_parse_from(["bluefruit"]).map(Settings::from)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            adapter: None,
            input_timeout: None,
            update_timeout: None,
            exit_policy: ExitPolicy::AlwaysSucceed,
            strict_commands: false,
            packet_notify: 10,
        }
    }
}

impl From<EnvArgs> for Settings {
    fn from(args: EnvArgs) -> Self {
        Settings {
            adapter: args.adapter,
            input_timeout: args.input_timeout.map(Duration::from_secs),
            update_timeout: args.update_timeout.map(Duration::from_secs),
            exit_policy: args.exit_policy,
            strict_commands: args.strict_commands,
            packet_notify: args.packet_notify,
        }
    }
}
