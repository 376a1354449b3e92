use std::time::Duration;

use clap::{Args, Parser, Subcommand};

/// Limits every engine applies to its storage calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoragePolicy {
    pub timeout: Duration,
    /// Extra attempts at re-applying a symmetric friend write that was
    /// observed one-sided.
    pub symmetry_retries: u32,
}

impl Default for StoragePolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            symmetry_retries: 2,
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct StoreConfig {
    /// MongoDB connection string. Needs a replica set for transactions.
    #[clap(long, env = "MONGO_URL")]
    pub mongo_uri: String,

    #[clap(long, env = "MONGO_DB", default_value = "mutuals")]
    pub db_name: String,

    #[clap(long, env = "STORAGE_TIMEOUT_MS", default_value_t = 5000)]
    pub storage_timeout_ms: u64,

    #[clap(long, env = "SYMMETRY_RETRIES", default_value_t = 2)]
    pub symmetry_retries: u32,

    #[clap(long, env = "TRANSACTION_RETRIES", default_value_t = 5)]
    pub transaction_retries: u32,
}

impl StoreConfig {
    pub fn policy(&self) -> StoragePolicy {
        StoragePolicy {
            timeout: Duration::from_millis(self.storage_timeout_ms),
            symmetry_retries: self.symmetry_retries,
        }
    }
}

#[derive(Debug, Parser)]
#[clap(name = "mutuals", version, about = "friend graph maintenance")]
pub struct Cli {
    #[clap(flatten)]
    pub store: StoreConfig,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Report every one-sided friend edge.
    Audit,
    /// Fix one-sided friend edges, restoring the missing side by default.
    Repair {
        /// Remove one-sided edges instead of completing them.
        #[clap(long)]
        drop: bool,
    },
}

#[test]
fn cli_is_consistent() {
    use clap::CommandFactory;

    Cli::command().debug_assert();
}

#[test]
fn cli_parses_repair_with_overrides() {
    let cli = Cli::try_parse_from(vec![
        "mutuals",
        "--mongo-uri",
        "mongodb://localhost:27017/?replicaSet=rs0",
        "--storage-timeout-ms",
        "250",
        "repair",
        "--drop",
    ])
    .unwrap();

    assert_eq!(cli.command, Command::Repair { drop: true });
    assert_eq!(cli.store.policy().timeout, Duration::from_millis(250));
}
