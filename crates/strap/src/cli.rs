use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// strap - bootstrap environment installer
#[derive(Parser, Debug)]
#[command(name = "strap")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long, env = "STRAP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log level or filter directive (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Install the bootstrap archive unless the environment is already present
    Install {
        /// Bootstrap zip archive
        #[arg(short, long)]
        archive: PathBuf,

        /// Expected SHA-256 of the archive, overriding the configuration
        #[arg(long)]
        sha256: Option<String>,

        /// Extra attempts after a recoverable failure
        #[arg(long, default_value_t = 0)]
        retries: usize,

        /// Do not run post-install hooks
        #[arg(long)]
        skip_hooks: bool,
    },

    /// Show whether the environment is installed
    Status,

    /// Recreate the storage directory and its links to shared storage
    Storage,

    /// Print the effective configuration as TOML
    Config,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn install_arguments() {
        let cli = Cli::try_parse_from([
            "strap",
            "--log-level",
            "debug",
            "install",
            "--archive",
            "bootstrap.zip",
            "--retries",
            "2",
            "--skip-hooks",
        ])
        .unwrap();
        assert_eq!(cli.log_level, "debug");
        match cli.command {
            Commands::Install {
                archive,
                retries,
                skip_hooks,
                sha256,
            } => {
                assert_eq!(archive, PathBuf::from("bootstrap.zip"));
                assert_eq!(retries, 2);
                assert!(skip_hooks);
                assert!(sha256.is_none());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn install_requires_archive() {
        assert!(Cli::try_parse_from(["strap", "install"]).is_err());
    }
}
