// src/config.rs
//! Crawl configuration and command-line input.

use crate::constants::{
    DEFAULT_MAX_CONCURRENT_REQUEST, DEFAULT_MAX_DISCOVERABLE_NODES, DEFAULT_MAX_FOREIGN_NODES,
    DEFAULT_QUIET_TIMEOUT_MS,
};
use crate::error::CrawlError;
use clap::Parser;

/// Parsed command-line input for the `notion-graph` binary.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CommandLineInput {
    /// Root block id: the 32-character tail of a public page URL, with or
    /// without dashes
    pub root_block_id: String,

    /// Maximum number of unique nodes to discover (0 = unbounded; know
    /// what you are doing before lifting the cap)
    #[arg(long, default_value_t = DEFAULT_MAX_DISCOVERABLE_NODES)]
    pub max_nodes: u32,

    /// Maximum number of nodes to discover outside the root's workspace
    #[arg(long, default_value_t = DEFAULT_MAX_FOREIGN_NODES)]
    pub max_foreign_nodes: u32,

    /// Number of page fetches kept in flight at once
    #[arg(long, default_value_t = DEFAULT_MAX_CONCURRENT_REQUEST)]
    pub max_concurrent: usize,

    /// Idle period (ms) after the last settled fetch before the crawl is
    /// judged complete
    #[arg(long, default_value_t = DEFAULT_QUIET_TIMEOUT_MS)]
    pub quiet_timeout_ms: u64,

    /// File to write the graph JSON to (stdout when omitted)
    #[arg(short, long)]
    pub output: Option<String>,

    /// Enable verbose progress logging (debug level)
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

/// Tuning parameters for one crawl.
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    /// Unique-node budget; `None` disables the cap entirely, which is
    /// never recommended on a workspace of unknown size.
    pub max_discoverable_nodes: Option<u32>,
    /// Budget for nodes living outside the root's workspace. Backlinks
    /// can chain through arbitrarily many foreign workspaces; this keeps
    /// the crawl from following them forever. Set to 0 to stay inside
    /// the root workspace.
    pub max_discoverable_nodes_in_other_spaces: u32,
    /// Fetches kept in flight at once.
    pub max_concurrent_request: usize,
    /// Idle period after the last settled fetch before completion is
    /// inferred without an explicit close signal.
    pub quiet_timeout_ms: u64,
    /// Emit progress as the crawl runs.
    pub verbose: bool,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            max_discoverable_nodes: Some(DEFAULT_MAX_DISCOVERABLE_NODES),
            max_discoverable_nodes_in_other_spaces: DEFAULT_MAX_FOREIGN_NODES,
            max_concurrent_request: DEFAULT_MAX_CONCURRENT_REQUEST,
            quiet_timeout_ms: DEFAULT_QUIET_TIMEOUT_MS,
            verbose: true,
        }
    }
}

impl CrawlConfig {
    /// Resolves a crawl configuration from CLI input.
    pub fn from_cli(cli: &CommandLineInput) -> Self {
        Self {
            max_discoverable_nodes: (cli.max_nodes > 0).then_some(cli.max_nodes),
            max_discoverable_nodes_in_other_spaces: cli.max_foreign_nodes,
            max_concurrent_request: cli.max_concurrent,
            quiet_timeout_ms: cli.quiet_timeout_ms,
            verbose: cli.verbose,
        }
    }

    /// Rejects impossible parameter combinations before any fetch happens.
    pub fn validate(&self) -> Result<(), CrawlError> {
        if let Some(max_nodes) = self.max_discoverable_nodes {
            if self.max_discoverable_nodes_in_other_spaces > max_nodes {
                return Err(CrawlError::Configuration(format!(
                    "expected max_discoverable_nodes ({}) to be bigger than or equal to \
                     max_discoverable_nodes_in_other_spaces ({}); at least one node must \
                     come from the root workspace",
                    max_nodes, self.max_discoverable_nodes_in_other_spaces
                )));
            }
        }
        if self.max_concurrent_request == 0 {
            return Err(CrawlError::Configuration(
                "max_concurrent_request must be bigger than 0".to_string(),
            ));
        }
        Ok(())
    }
}
