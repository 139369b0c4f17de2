use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "relay-harvester", version, about = "Discover, verify and list public stream relays")]
pub struct Cli {
    /// RON configuration file; reference defaults are used when omitted.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Also write logs to this file.
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// Log debug output, including every failed liveness check.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Scrape candidates, keep live relays and write the channel list.
    Discover,
    /// Classify the channel list into smooth and bad lists.
    Verify,
    /// Discover, then verify.
    Run,
}

impl Command {
    pub fn discovers(self) -> bool {
        matches!(self, Command::Discover | Command::Run)
    }

    pub fn verifies(self) -> bool {
        matches!(self, Command::Verify | Command::Run)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_with_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["relay-harvester", "run", "--config", "relay.ron", "-v"]);
        assert_eq!(cli.command, Command::Run);
        assert_eq!(cli.config, Some(PathBuf::from("relay.ron")));
        assert!(cli.verbose);
        assert!(cli.command.discovers() && cli.command.verifies());
    }

    #[test]
    fn verify_alone_skips_discovery() {
        let cli = Cli::parse_from(["relay-harvester", "verify"]);
        assert!(!cli.command.discovers());
        assert!(cli.command.verifies());
    }
}
