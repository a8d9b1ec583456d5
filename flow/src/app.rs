//! Core application

use std::fs::File;
use std::io::{self, BufWriter};
use std::path::Path;

use anyhow::{Context, Result};

use crate::core::cli::{self, Commands};
use crate::core::config::AppConfig;
use crate::core::constants::{APP_NAME, APP_NAME_LOWER, ENV_LOG};
use crate::data::{LogSource, read_messages, write_json};
use crate::domain::conversation::{GroupingResult, group_messages_with_stats};

pub struct CoreApp {
    pub config: AppConfig,
}

impl CoreApp {
    /// Run the application with CLI argument parsing
    pub fn run() -> Result<()> {
        dotenvy::dotenv().ok();

        let (cli_config, command) = cli::parse();
        Self::init_logging(cli_config.debug);

        tracing::debug!(app = APP_NAME, "Application starting");
        tracing::trace!(command = ?command, "Parsed command");

        let app = Self {
            config: AppConfig::load(&cli_config)?,
        };

        match command {
            Some(Commands::Group { input, output }) => app.group(input.as_deref(), output.as_deref()),
            Some(Commands::Stats { input }) => app.stats(input.as_deref()),
            None => app.group(None, None),
        }
    }

    /// Logs go to stderr; stdout carries only JSON.
    fn init_logging(debug: bool) {
        let level = if debug { "debug" } else { "info" };
        let default_filter = format!("{level},{APP_NAME_LOWER}={level}");

        let filter = std::env::var(ENV_LOG)
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or(default_filter);

        tracing_subscriber::fmt()
            .with_writer(io::stderr)
            .with_target(false)
            .with_thread_ids(false)
            .with_level(true)
            .with_ansi(true)
            .compact()
            .with_env_filter(filter)
            .init();
    }

    fn load(&self, input: Option<&Path>) -> Result<GroupingResult> {
        let source = LogSource::from_arg(input);
        let messages = read_messages(&source, self.config.input.format)
            .with_context(|| format!("Failed to load message log from {}", source))?;

        let result = group_messages_with_stats(&messages);
        if self.config.debug {
            tracing::info!(stats = ?result.stats, "Grouping finished");
        }
        Ok(result)
    }

    fn group(&self, input: Option<&Path>, output: Option<&Path>) -> Result<()> {
        let result = self.load(input)?;
        let pretty = self.config.output.pretty;

        match output {
            Some(path) => {
                let file = File::create(path)
                    .with_context(|| format!("Failed to create output file: {}", path.display()))?;
                write_json(BufWriter::new(file), &result.messages, pretty)
                    .with_context(|| format!("Failed to write display log: {}", path.display()))?;
                tracing::info!(
                    path = %path.display(),
                    messages = result.messages.len(),
                    groups = result.stats.groups,
                    "Display log written"
                );
            }
            None => write_json(io::stdout().lock(), &result.messages, pretty)
                .context("Failed to write display log to stdout")?,
        }
        Ok(())
    }

    fn stats(&self, input: Option<&Path>) -> Result<()> {
        let report = self.load(input)?.report();
        write_json(io::stdout().lock(), &report, self.config.output.pretty)
            .context("Failed to write statistics to stdout")
    }
}
