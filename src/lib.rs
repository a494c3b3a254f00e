// src/lib.rs
//! notion-graph library — crawls the tree of blocks reachable from one
//! root page into a deduplicated node list and undirected edge list.
//!
//! # Public API
//!
//! The library exposes types organized by concern:
//! - **Error handling** — [`CrawlError`]
//! - **Configuration** — [`CrawlConfig`], [`CommandLineInput`]
//! - **Domain types** — [`BlockId`], [`SpaceId`], [`ContentNode`], [`NodeKind`]
//! - **API client** — [`ContentApiClient`], [`NotionHttpClient`], wire types
//! - **Crawling** — [`CrawlEngine`], [`TaskQueue`], [`UndirectedNodeGraph`]
//!
//! ```no_run
//! use notion_graph::{CrawlConfig, CrawlEngine, NotionHttpClient};
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), notion_graph::CrawlError> {
//! let client = Arc::new(NotionHttpClient::new()?);
//! let engine = CrawlEngine::new(client, CrawlConfig::default())?;
//! let graph = engine.build("e040febf70a94950b8620e6f00005004").await;
//! println!("{} nodes, {} links", graph.nodes.len(), graph.links.len());
//! # Ok(())
//! # }
//! ```

mod api;
mod config;
mod constants;
mod crawl;
mod error;
mod types;

// --- Error Handling ---
pub use crate::error::CrawlError;

// --- Configuration ---
pub use crate::config::{CommandLineInput, CrawlConfig};

// --- Domain Types ---
pub use crate::types::{BlockId, ContentNode, NodeKind, SpaceId};

// --- API Client ---
pub use crate::api::responses::{
    AliasPointer, BlockEnvelope, BlockFormat, BlockKind, BlockRecord, CollectionEnvelope,
    CollectionRecord, PageDocument,
};
pub use crate::api::{ContentApiClient, NotionHttpClient};

// --- Crawling ---
pub use crate::crawl::{BlockGraph, CrawlEngine, GraphLink, TaskQueue, UndirectedNodeGraph};
