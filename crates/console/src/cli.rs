use clap::{Parser, Subcommand};

/// Inspect and edit the Aries service registry.
#[derive(Debug, Parser)]
#[command(name = "aries")]
#[command(about = "Inspect and edit the Aries service registry")]
pub struct Cli {
    /// Print the Prometheus rendering of collected metrics before exiting
    #[arg(long = "dump-metrics", global = true)]
    pub dump_metrics: bool,

    /// Enable debug logging
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Fetch and print every registered service, one JSON object per line
    List,
    /// Fetch the registry and print the service with the given id
    Show { id: String },
    /// Register a new service from a JSON object
    Add { payload: String },
    /// Replace an existing service (matched by its `id`) from a JSON object
    Update { payload: String },
    /// Re-fetch periodically and print every store change until Ctrl-C
    Watch {
        #[arg(long = "interval-secs", default_value_t = 60)]
        interval_secs: u64,
    },
}
