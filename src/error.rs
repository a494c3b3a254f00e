// src/error.rs
//! Crawl error types.
//!
//! Two kinds of failure live here. Fatal ones (`Configuration`, `IdFormat`,
//! `RootResolution`, `RootKindRejected`) stop a crawl before it really
//! starts. Everything else is accumulated into the final result while the
//! crawl keeps going: one unreachable block must not cost the rest of the
//! workspace.

use crate::types::BlockId;
use thiserror::Error;

/// Every failure mode of a crawl.
#[derive(Error, Debug)]
pub enum CrawlError {
    /// An impossible combination of tuning parameters, rejected before any
    /// fetch happens.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// The root identifier is not a 32-character alphanumeric id nor its
    /// dashed form.
    #[error("invalid block id `{input}`: {reason}")]
    IdFormat { input: String, reason: String },

    /// No topmost block could be located for the requested root.
    #[error("could not find a topmost block from id {block_id}")]
    RootResolution { block_id: BlockId },

    /// The resolved root is a block type the crawler does not materialize.
    #[error("root block {block_id} is not an acceptable type: {kind}")]
    RootKindRejected { block_id: BlockId, kind: String },

    /// The request for one block's page document never reached the API or
    /// came back unreadable at the transport level.
    #[error("request for block {block_id} failed: {source}")]
    Network {
        block_id: BlockId,
        #[source]
        source: reqwest::Error,
    },

    /// The API answered with a non-success status.
    #[error("api returned status {status} for block {block_id}")]
    Api {
        block_id: BlockId,
        status: reqwest::StatusCode,
    },

    /// The response body did not decode into a page document.
    #[error("malformed page document for block {block_id}: {reason}")]
    MalformedDocument { block_id: BlockId, reason: String },

    /// A well-typed response is missing a field the crawl needs, e.g. an
    /// alias without its pointer or a collection view without its
    /// collection id.
    #[error("block {block_id} is missing expected field `{field}`")]
    MissingField {
        block_id: BlockId,
        field: &'static str,
    },

    /// A collection id named by a block is absent from the response's
    /// collection map.
    #[error("collection {collection_id} is not a key in the collection map")]
    UnknownCollection { collection_id: BlockId },
}

impl CrawlError {
    /// Whether this error aborts a crawl before discovery starts.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            CrawlError::Configuration(_)
                | CrawlError::IdFormat { .. }
                | CrawlError::RootResolution { .. }
                | CrawlError::RootKindRejected { .. }
        )
    }
}

/// Result type alias for convenience
#[allow(dead_code)]
pub type Result<T, E = CrawlError> = std::result::Result<T, E>;
