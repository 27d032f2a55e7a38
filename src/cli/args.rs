//! CLI argument definitions using Clap

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::domain::config::{is_valid_log_level, VALID_LOG_LEVELS};
use crate::domain::recorder::{MAX_MAX_DURATION_SECS, MIN_MAX_DURATION_SECS};

/// Recorder node - capture microphone audio into a base64 node payload
#[derive(Parser, Debug)]
#[command(name = "recorder-node")]
#[command(version)]
#[command(about = "Record microphone audio into a serialized recorder node")]
#[command(long_about = None)]
pub struct Cli {
    /// Log level (error, warn, info, debug, trace). RUST_LOG takes precedence.
    #[arg(long, global = true, value_name = "LEVEL", value_parser = parse_log_level)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Record until Enter or the countdown expires, then print the node JSON
    Record {
        /// Maximum recording duration in seconds (1-600)
        #[arg(
            short = 'm',
            long,
            value_name = "SECS",
            value_parser = clap::value_parser!(u32)
                .range(MIN_MAX_DURATION_SECS as i64..=MAX_MAX_DURATION_SECS as i64)
        )]
        max_duration: Option<u32>,

        /// Write the node JSON to this file instead of stdout
        #[arg(short = 'o', long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Load an existing node JSON before recording
        #[arg(short = 'n', long, value_name = "FILE")]
        node: Option<PathBuf>,
    },
    /// Decode the payload of a saved node into an audio file
    Decode {
        /// Saved node JSON
        #[arg(value_name = "NODE_JSON")]
        node: PathBuf,

        /// Audio file to write (default: recording.<ext>)
        #[arg(short = 'o', long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config action subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Create config file with defaults
    Init,
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// Config value
        value: String,
    },
    /// Get a config value
    Get {
        /// Config key
        key: String,
    },
    /// List all config values
    List,
    /// Show config file path
    Path,
}

/// Valid config keys
pub const VALID_CONFIG_KEYS: &[&str] = &["max_duration", "log_level"];

/// Check if a config key is valid
pub fn is_valid_config_key(key: &str) -> bool {
    VALID_CONFIG_KEYS.contains(&key)
}

fn parse_log_level(value: &str) -> Result<String, String> {
    if is_valid_log_level(value) {
        Ok(value.to_ascii_lowercase())
    } else {
        Err(format!("expected one of: {}", VALID_LOG_LEVELS.join(", ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_parses_record_defaults() {
        let cli = Cli::parse_from(["recorder-node", "record"]);
        match cli.command {
            Commands::Record {
                max_duration,
                output,
                node,
            } => {
                assert!(max_duration.is_none());
                assert!(output.is_none());
                assert!(node.is_none());
            }
            other => panic!("Expected Record command, got {:?}", other),
        }
        assert!(cli.log_level.is_none());
    }

    #[test]
    fn cli_parses_record_options() {
        let cli = Cli::parse_from([
            "recorder-node",
            "record",
            "-m",
            "30",
            "-o",
            "node.json",
            "--node",
            "saved.json",
        ]);
        if let Commands::Record {
            max_duration,
            output,
            node,
        } = cli.command
        {
            assert_eq!(max_duration, Some(30));
            assert_eq!(output, Some(PathBuf::from("node.json")));
            assert_eq!(node, Some(PathBuf::from("saved.json")));
        } else {
            panic!("Expected Record command");
        }
    }

    #[test]
    fn cli_rejects_out_of_range_duration() {
        assert!(Cli::try_parse_from(["recorder-node", "record", "-m", "0"]).is_err());
        assert!(Cli::try_parse_from(["recorder-node", "record", "-m", "601"]).is_err());
        assert!(Cli::try_parse_from(["recorder-node", "record", "-m", "600"]).is_ok());
    }

    #[test]
    fn cli_parses_decode() {
        let cli = Cli::parse_from(["recorder-node", "decode", "node.json", "-o", "out.webm"]);
        if let Commands::Decode { node, output } = cli.command {
            assert_eq!(node, PathBuf::from("node.json"));
            assert_eq!(output, Some(PathBuf::from("out.webm")));
        } else {
            panic!("Expected Decode command");
        }
    }

    #[test]
    fn cli_parses_config_set() {
        let cli = Cli::parse_from(["recorder-node", "config", "set", "max_duration", "20"]);
        if let Commands::Config {
            action: ConfigAction::Set { key, value },
        } = cli.command
        {
            assert_eq!(key, "max_duration");
            assert_eq!(value, "20");
        } else {
            panic!("Expected Config Set command");
        }
    }

    #[test]
    fn log_level_is_global_and_validated() {
        let cli = Cli::parse_from(["recorder-node", "config", "path", "--log-level", "DEBUG"]);
        assert_eq!(cli.log_level, Some("debug".to_string()));
        assert!(Cli::try_parse_from(["recorder-node", "--log-level", "loud", "record"]).is_err());
    }

    #[test]
    fn subcommand_is_required() {
        assert!(Cli::try_parse_from(["recorder-node"]).is_err());
    }

    #[test]
    fn valid_config_keys() {
        assert!(is_valid_config_key("max_duration"));
        assert!(is_valid_config_key("log_level"));
        assert!(!is_valid_config_key("api_key"));
    }

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }
}
