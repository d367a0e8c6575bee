pub mod config;
pub mod flush;

use clap::{Parser, Subcommand};

/// SessionBridge: keeps messaging-platform users pinned to dialog engine
/// sessions.
#[derive(Debug, Parser)]
#[command(name = "sessionbridge", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start the HTTP server (default when no subcommand is given).
    Serve,
    /// Delete every key in the session store and exit.
    Flush,
    /// Configuration utilities.
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Print version information.
    Version,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Parse the config file and report any errors.
    Validate,
    /// Dump the resolved configuration (with defaults) as TOML.
    Show,
}

// ── Config loading helper ─────────────────────────────────────────────

/// Load the configuration from the path specified by `SB_CONFIG` (or
/// `config.toml` by default).  Returns the parsed [`Config`] and the
/// path that was used.  A missing file yields the defaults.
///
/// [`Config`]: sb_domain::config::Config
pub fn load_config() -> anyhow::Result<(sb_domain::config::Config, String)> {
    let config_path = std::env::var("SB_CONFIG").unwrap_or_else(|_| "config.toml".into());
    let config = load_config_from(&config_path)?;
    Ok((config, config_path))
}

pub fn load_config_from(config_path: &str) -> anyhow::Result<sb_domain::config::Config> {
    if !std::path::Path::new(config_path).exists() {
        return Ok(sb_domain::config::Config::default());
    }
    let raw = std::fs::read_to_string(config_path)
        .map_err(|e| anyhow::anyhow!("reading {config_path}: {e}"))?;
    toml::from_str(&raw).map_err(|e| anyhow::anyhow!("parsing {config_path}: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_gives_defaults() {
        let config = load_config_from("/nonexistent/sessionbridge.toml").unwrap();
        assert_eq!(config.server.port, 5000);
    }

    #[test]
    fn file_is_parsed() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nport = 8080\n\n[engine]\nassistant_id = \"a-1\"").unwrap();

        let config = load_config_from(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.engine.assistant_id, "a-1");
    }

    #[test]
    fn parse_errors_name_the_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server\nport = ").unwrap();

        let path = file.path().to_str().unwrap().to_owned();
        let err = load_config_from(&path).unwrap_err();
        assert!(err.to_string().contains(&path));
    }

    #[test]
    fn cli_parses_subcommands() {
        let cli = Cli::try_parse_from(["sessionbridge", "config", "validate"]).unwrap();
        assert!(matches!(cli.command, Some(Command::Config(ConfigCommand::Validate))));

        let cli = Cli::try_parse_from(["sessionbridge"]).unwrap();
        assert!(cli.command.is_none());

        let cli = Cli::try_parse_from(["sessionbridge", "flush"]).unwrap();
        assert!(matches!(cli.command, Some(Command::Flush)));
    }
}
