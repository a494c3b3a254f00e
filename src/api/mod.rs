// src/api/mod.rs
//! Document API interaction — the ability to fetch page documents from a
//! workspace.
//!
//! The crawl engine depends on the [`ContentApiClient`] trait, never on
//! HTTP details; tests substitute an in-memory fixture client.

pub mod client;
pub mod responses;

use crate::error::CrawlError;
use crate::types::BlockId;
use responses::PageDocument;

/// The ability to fetch one block's page document.
///
/// The response contains the block itself, its recursive ancestors and its
/// children; ancestors are what make topmost-block resolution possible
/// from any starting id.
#[async_trait::async_trait]
pub trait ContentApiClient: Send + Sync {
    async fn fetch_page(&self, block_id: &BlockId) -> Result<PageDocument, CrawlError>;
}

pub use client::NotionHttpClient;
