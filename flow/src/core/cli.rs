use clap::{Parser, Subcommand};

use std::path::PathBuf;

use super::config::InputFormat;
use super::constants::{APP_NAME_LOWER, ENV_CONFIG, ENV_DEBUG, ENV_INPUT_FORMAT, ENV_PRETTY};

#[derive(Parser, Debug)]
#[command(name = APP_NAME_LOWER)]
#[command(version, about = "Rebuild grouped display logs from flat chat message logs", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable debug logging and print grouping statistics to the log
    #[arg(long, global = true, env = ENV_DEBUG)]
    pub debug: bool,

    /// Path to config file
    #[arg(long, short = 'c', global = true, env = ENV_CONFIG)]
    pub config: Option<PathBuf>,

    /// Input log format (auto, json or jsonl)
    #[arg(long, short = 'f', global = true, env = ENV_INPUT_FORMAT, value_parser = parse_input_format)]
    pub format: Option<InputFormat>,

    /// Pretty-print JSON output
    #[arg(long, global = true, env = ENV_PRETTY)]
    pub pretty: Option<bool>,
}

/// Parse input format from CLI/env string
fn parse_input_format(s: &str) -> Result<InputFormat, String> {
    match s.to_lowercase().as_str() {
        "auto" => Ok(InputFormat::Auto),
        "json" => Ok(InputFormat::Json),
        "jsonl" | "ndjson" => Ok(InputFormat::Jsonl),
        _ => Err(format!(
            "Invalid input format '{}'. Valid options: auto, json, jsonl",
            s
        )),
    }
}

#[derive(Subcommand, Clone, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Group a message log into a display log (default command)
    Group {
        /// Message log path, `-` or omitted for stdin
        input: Option<PathBuf>,

        /// Write the display log here instead of stdout
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },
    /// Print grouping statistics and aggregated usage for a message log
    Stats {
        /// Message log path, `-` or omitted for stdin
        input: Option<PathBuf>,
    },
}

/// Configuration derived from CLI arguments
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub debug: bool,
    pub config: Option<PathBuf>,
    pub format: Option<InputFormat>,
    pub pretty: Option<bool>,
}

impl Cli {
    fn into_parts(self) -> (CliConfig, Option<Commands>) {
        let config = CliConfig {
            debug: self.debug,
            config: self.config,
            format: self.format,
            pretty: self.pretty,
        };
        (config, self.command)
    }
}

/// Parse CLI arguments and return config with command
pub fn parse() -> (CliConfig, Option<Commands>) {
    Cli::parse().into_parts()
}
