//! CLI module for the account service
//!
//! - `serve`: run the HTTP API (default)
//! - `migrate`: apply or revert the PostgreSQL schema

pub mod migrate;
pub mod serve;

use clap::{Parser, Subcommand};

/// Account service - signup, token login and password reset over HTTP
#[derive(Parser)]
#[command(name = "account-service")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP API server (default)
    Serve,

    /// Apply pending database migrations
    Migrate(migrate::MigrateArgs),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_command() {
        let cli = Cli::try_parse_from(["account-service"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_migrate_revert() {
        let cli = Cli::try_parse_from(["account-service", "migrate", "--revert"]).unwrap();
        match cli.command {
            Some(Command::Migrate(args)) => assert!(args.revert),
            _ => panic!("expected migrate"),
        }
    }
}
