// src/api/client.rs
//! HTTP client for the unofficial document API.
//!
//! This is a thin wrapper around reqwest for `loadPageChunk` requests. It
//! handles request shaping and status checking without any crawl logic.
//! Only public pages are reachable without credentials, which is all the
//! crawler needs.

use super::responses::PageDocument;
use super::ContentApiClient;
use crate::error::CrawlError;
use crate::types::BlockId;
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};

const API_BASE_URL: &str = "https://www.notion.so/api/v3";

/// How many records one `loadPageChunk` call may return. 100 is the
/// observed server-side maximum; using it minimizes round-trips.
const PAGE_CHUNK_LIMIT: u32 = 100;

#[derive(Serialize)]
struct LoadPageChunkRequest<'a> {
    #[serde(rename = "pageId")]
    page_id: &'a str,
    limit: u32,
    cursor: ChunkCursor,
    #[serde(rename = "chunkNumber")]
    chunk_number: u32,
    #[serde(rename = "verticalColumns")]
    vertical_columns: bool,
}

#[derive(Default, Serialize)]
struct ChunkCursor {
    stack: Vec<serde_json::Value>,
}

#[derive(Default, Deserialize)]
struct LoadPageChunkResponse {
    #[serde(rename = "recordMap", default)]
    record_map: PageDocument,
}

/// A thin wrapper around a reqwest [`Client`] for page document requests.
#[derive(Clone)]
pub struct NotionHttpClient {
    client: Client,
    base_url: String,
}

impl NotionHttpClient {
    /// Creates a client against the public API endpoint.
    pub fn new() -> Result<Self, CrawlError> {
        Self::with_base_url(API_BASE_URL)
    }

    /// Creates a client against a custom base URL.
    pub fn with_base_url(base_url: &str) -> Result<Self, CrawlError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|err| {
                CrawlError::Configuration(format!("could not build http client: {}", err))
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait::async_trait]
impl ContentApiClient for NotionHttpClient {
    async fn fetch_page(&self, block_id: &BlockId) -> Result<PageDocument, CrawlError> {
        let url = format!("{}/loadPageChunk", self.base_url);
        log::debug!("POST {} ({})", url, block_id);

        let body = LoadPageChunkRequest {
            page_id: block_id.as_str(),
            limit: PAGE_CHUNK_LIMIT,
            cursor: ChunkCursor::default(),
            chunk_number: 0,
            vertical_columns: false,
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|source| CrawlError::Network {
                block_id: block_id.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(CrawlError::Api {
                block_id: block_id.clone(),
                status,
            });
        }

        let text = response.text().await.map_err(|source| CrawlError::Network {
            block_id: block_id.clone(),
            source,
        })?;

        let parsed: LoadPageChunkResponse =
            serde_json::from_str(&text).map_err(|err| CrawlError::MalformedDocument {
                block_id: block_id.clone(),
                reason: err.to_string(),
            })?;

        Ok(parsed.record_map)
    }
}
