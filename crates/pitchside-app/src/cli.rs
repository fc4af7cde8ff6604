//! CLI argument definitions and the interactive command grammar.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::Parser;
use std::path::PathBuf;

/// Pitchside: terminal host for the football prediction chat.
#[derive(Parser, Debug)]
#[command(name = "pitchside", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    /// Simulated reply delay in milliseconds.
    #[arg(short = 'd', long = "delay-ms")]
    pub delay_ms: Option<u64>,

    /// Write the effective configuration to the config path and exit.
    #[arg(long = "write-config")]
    pub write_config: bool,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > PITCHSIDE_CONFIG env var > ~/.pitchside/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("PITCHSIDE_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Resolve the log level.
    ///
    /// Priority: --log-level flag > config file value.
    pub fn resolve_log_level(&self, config_level: Option<&str>) -> String {
        self.log_level
            .clone()
            .or_else(|| config_level.map(str::to_string))
            .unwrap_or_else(|| "info".to_string())
    }
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".pitchside").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".pitchside").join("config.toml");
    }
    PathBuf::from("config.toml")
}

/// One line of terminal input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Submit(String),
    Open,
    Close,
    Minimize,
    Expand,
    Toggle,
    /// `/quick` lists, `/quick n` submits the 1-based suggestion `n`.
    Quick(Option<usize>),
    History,
    Cancel,
    Help,
    Quit,
    Unknown(String),
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        let Some(rest) = trimmed.strip_prefix('/') else {
            return Command::Submit(line.to_string());
        };

        let mut parts = rest.split_whitespace();
        let name = parts.next().unwrap_or_default();
        let arg = parts.next();
        if parts.next().is_some() {
            return Command::Unknown(trimmed.to_string());
        }

        match (name, arg) {
            ("open", None) => Command::Open,
            ("close", None) => Command::Close,
            ("min" | "minimize", None) => Command::Minimize,
            ("expand", None) => Command::Expand,
            ("toggle", None) => Command::Toggle,
            ("quick", None) => Command::Quick(None),
            ("quick", Some(n)) => match n.parse::<usize>() {
                Ok(n) => Command::Quick(Some(n)),
                Err(_) => Command::Unknown(trimmed.to_string()),
            },
            ("history", None) => Command::History,
            ("cancel", None) => Command::Cancel,
            ("help", None) => Command::Help,
            ("quit" | "exit", None) => Command::Quit,
            _ => Command::Unknown(trimmed.to_string()),
        }
    }
}
