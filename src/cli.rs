//! CLI argument parsing for the ppm-portal binary.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "ppm-portal", about = "Patient Pro Marketing portal backend")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the HTTP server (default if no subcommand given)
    Serve,
    /// Run database migrations and exit
    Migrate,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn cli_migrate_command_parses() {
        let cli = Cli::parse_from(["ppm-portal", "migrate"]);
        assert!(matches!(cli.command, Some(Command::Migrate)));
    }

    #[test]
    fn cli_no_command_defaults_to_none() {
        let cli = Cli::parse_from(["ppm-portal"]);
        assert!(cli.command.is_none());
    }

    #[test]
    fn cli_unknown_command_fails() {
        assert!(Cli::try_parse_from(["ppm-portal", "create-admin"]).is_err());
    }
}
