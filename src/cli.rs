//! Command-line interface parsing for the station daemon
//!
//! Everything meaningful lives in the config file; the CLI only points at
//! it and offers a couple of quick overrides.

use std::path::PathBuf;

use clap::Parser;

/// wxhub - weather station telemetry aggregation daemon
#[derive(Parser, Debug)]
#[command(name = "wxhub")]
#[command(about = "Aggregates station telemetry and serves the query API")]
#[command(version)]
pub struct Cli {
    /// Path to the JSON config file
    #[arg(long, value_name = "FILE", default_value = "config.json")]
    pub config: PathBuf,

    /// Override the API port from the config file
    #[arg(long)]
    pub port: Option<u16>,

    /// Override the data directory holding state and the summary database
    #[arg(long, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_no_args() {
        let cli = Cli::parse_from(["wxhub"]);
        assert_eq!(cli.config, PathBuf::from("config.json"));
        assert!(cli.port.is_none());
        assert!(cli.data_dir.is_none());
    }

    #[test]
    fn test_cli_parse_overrides() {
        let cli = Cli::parse_from([
            "wxhub",
            "--config",
            "/etc/wxhub/config.json",
            "--port",
            "9001",
            "--data-dir",
            "/var/lib/wxhub",
        ]);
        assert_eq!(cli.config, PathBuf::from("/etc/wxhub/config.json"));
        assert_eq!(cli.port, Some(9001));
        assert_eq!(
            cli.data_dir.as_deref(),
            Some(std::path::Path::new("/var/lib/wxhub"))
        );
    }
}
