use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "stash-demo",
    version,
    about = "Runs the todo, meal and employee flows against the Stash query cache"
)]
pub struct Cli {
    /// TOML settings file (optional)
    #[arg(long, short, env = "STASH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Use the in-memory transports instead of the public APIs
    #[arg(long)]
    pub offline: bool,

    /// Print the Prometheus rendering of the cache metrics on exit
    #[arg(long)]
    pub metrics: bool,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// List, create and toggle todos
    Todos,
    /// Browse the meal catalogue
    Meals,
    /// Create, update and delete an employee
    Employees,
    /// Every flow, one after the other
    All,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flags() {
        let cli = Cli::parse_from(["stash-demo", "--offline", "--metrics", "meals"]);
        assert!(cli.offline);
        assert!(cli.metrics);
        assert_eq!(cli.cmd, Command::Meals);
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_subcommand_required() {
        assert!(Cli::try_parse_from(["stash-demo"]).is_err());
    }
}
