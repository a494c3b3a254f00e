// src/api/responses.rs
//! Wire types for the unofficial document API.
//!
//! A `loadPageChunk` response is a record map: every block involved in the
//! queried page (the block itself, its recursive ancestors, and its
//! children) keyed by id, plus — when the queried block is itself a
//! collection — a sibling map of collection records carrying database
//! display names. Only the fields the crawl reads are modeled; the rest of
//! the payload is ignored during deserialization.

use crate::constants::{UNKNOWN_DATABASE_TITLE, UNTITLED_FALLBACK};
use crate::types::{BlockId, SpaceId};
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;

/// Block types the crawler materializes or follows.
///
/// Everything else the API returns (text, to-dos, images, ...) is page
/// content rather than graph structure and is skipped without comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Page,
    CollectionView,
    CollectionViewPage,
    Alias,
}

impl BlockKind {
    /// Classifies a raw `type` string; `None` for unsupported kinds.
    pub fn classify(raw: &str) -> Option<Self> {
        match raw {
            "page" => Some(Self::Page),
            "collection_view" => Some(Self::CollectionView),
            "collection_view_page" => Some(Self::CollectionViewPage),
            "alias" => Some(Self::Alias),
            _ => None,
        }
    }
}

/// One page worth of the document graph.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageDocument {
    /// Block records keyed by dashed id, in response order.
    #[serde(default)]
    pub block: IndexMap<String, BlockEnvelope>,
    /// Collection records keyed by collection id; present only when the
    /// queried block is itself a collection.
    #[serde(default)]
    pub collection: IndexMap<String, CollectionEnvelope>,
}

/// The API wraps every record in a role envelope whose `value` is
/// occasionally absent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BlockEnvelope {
    #[serde(default)]
    pub value: Option<BlockRecord>,
}

/// A single block record.
#[derive(Debug, Clone, Deserialize)]
pub struct BlockRecord {
    pub id: BlockId,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub space_id: Option<SpaceId>,
    #[serde(default)]
    pub parent_id: Option<BlockId>,
    /// `space` when the block sits at the top level of a workspace.
    #[serde(default)]
    pub parent_table: Option<String>,
    /// For collection views, the collection holding the display name.
    #[serde(default)]
    pub collection_id: Option<BlockId>,
    /// Rich-text property bag; only `title` is read here.
    #[serde(default)]
    pub properties: Option<Value>,
    #[serde(default)]
    pub format: Option<BlockFormat>,
}

impl BlockRecord {
    /// Extracts the display title of a page-like record.
    ///
    /// Untitled pages carry no `properties` at all, and a titled page may
    /// still hold an empty fragment; both fall back to the untitled
    /// sentinel. Be conservative with the shape — the unofficial API may
    /// change without notice.
    pub fn page_title(&self) -> String {
        let fragment = self
            .properties
            .as_ref()
            .and_then(|properties| properties.get("title"))
            .and_then(|title| title.get(0))
            .and_then(|first| first.get(0))
            .and_then(Value::as_str);

        match fragment {
            Some(text) if !text.is_empty() => text.to_string(),
            _ => UNTITLED_FALLBACK.to_string(),
        }
    }

    /// Whether this block sits directly at the top level of a workspace
    /// (one of the pages on the app's left navigation panel).
    pub fn is_toplevel(&self) -> bool {
        self.parent_table.as_deref() == Some("space")
    }

    /// Target of an alias block, when present.
    pub fn alias_pointer(&self) -> Option<&AliasPointer> {
        self.format
            .as_ref()
            .and_then(|format| format.alias_pointer.as_ref())
    }
}

/// Formatting metadata; only the alias pointer matters here.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BlockFormat {
    #[serde(default)]
    pub alias_pointer: Option<AliasPointer>,
}

/// Target of an alias block.
#[derive(Debug, Clone, Deserialize)]
pub struct AliasPointer {
    pub id: BlockId,
    #[serde(rename = "spaceId", default)]
    pub space_id: Option<SpaceId>,
}

/// Envelope around a collection record.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CollectionEnvelope {
    #[serde(default)]
    pub value: Option<CollectionRecord>,
}

/// A collection (database) definition. The display name lives here and is
/// only revealed when the collection's own view is queried directly.
#[derive(Debug, Clone, Deserialize)]
pub struct CollectionRecord {
    /// Database display name as rich text.
    #[serde(default)]
    pub name: Option<Value>,
}

impl CollectionRecord {
    /// Extracts the database display name, falling back to the
    /// unknown-database placeholder.
    pub fn display_name(&self) -> String {
        self.name
            .as_ref()
            .and_then(|name| name.get(0))
            .and_then(|first| first.get(0))
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| UNKNOWN_DATABASE_TITLE.to_string())
    }
}
