//! CLI module for the proposer

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "proposer")]
#[command(about = "Flow proposal key allocator - rotates admin keys and hands out sequence numbers", long_about = None)]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Load environment variables from this file before reading the configuration
    #[arg(long, global = true, env = "FLOW_PDS_ENV_FILE")]
    pub env_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Allocate proposal keys for the admin account concurrently and print them
    ProposalKeys {
        /// Number of proposal keys to allocate
        #[arg(long, short = 'n', default_value = "1")]
        count: usize,
    },

    /// Sign a message with the admin key
    Sign {
        /// The message to sign
        message: String,

        /// Treat the message as hex encoded bytes
        #[arg(long, default_value = "false")]
        hex: bool,
    },

    /// Show the admin account keys as reported by the access node
    Keys,
}
