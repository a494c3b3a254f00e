// src/types/ids.rs
//! Canonical block and workspace identifiers.
//!
//! A block id travels in two shapes: the bare 32-character tail of a public
//! page URL, and the dashed `8-4-4-4-12` form every API payload uses. The
//! dashed form is canonical here; [`BlockId::parse`] normalizes user input
//! into it and rejects everything else.

use crate::constants::UNKNOWN_SPACE_ID;
use crate::error::CrawlError;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

lazy_static! {
    static ref UNDASHED_ID: Regex =
        Regex::new(r"^[a-zA-Z0-9]{32}$").expect("undashed id regex must compile");
    static ref DASHED_ID: Regex = Regex::new(
        r"^[a-zA-Z0-9]{8}-[a-zA-Z0-9]{4}-[a-zA-Z0-9]{4}-[a-zA-Z0-9]{4}-[a-zA-Z0-9]{12}$"
    )
    .expect("dashed id regex must compile");
}

/// Identifier of a single block, stored in canonical dashed form.
///
/// Deserialization from API payloads is pass-through: the API already emits
/// dashed ids and is trusted on the way in. User-supplied input goes
/// through [`BlockId::parse`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(String);

impl BlockId {
    /// Normalizes a block id into canonical dashed form.
    ///
    /// Accepts a 32-character alphanumeric id (dashes are inserted) or an
    /// already-dashed 36-character id (returned unchanged, which makes
    /// parsing idempotent). Anything else is a format error.
    pub fn parse(input: &str) -> Result<Self, CrawlError> {
        let trimmed = input.trim();

        if DASHED_ID.is_match(trimmed) {
            return Ok(Self(trimmed.to_string()));
        }

        if trimmed.len() != 32 {
            return Err(CrawlError::IdFormat {
                input: trimmed.to_string(),
                reason: format!("incorrect length of id: {}", trimmed.len()),
            });
        }

        if !UNDASHED_ID.is_match(trimmed) {
            return Err(CrawlError::IdFormat {
                input: trimmed.to_string(),
                reason: "id must match /^[a-zA-Z0-9]{32}$/".to_string(),
            });
        }

        Ok(Self(format!(
            "{}-{}-{}-{}-{}",
            &trimmed[0..8],
            &trimmed[8..12],
            &trimmed[12..16],
            &trimmed[16..20],
            &trimmed[20..32]
        )))
    }

    /// Returns the canonical dashed id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a workspace ("space").
///
/// Nodes whose space differs from the root's are foreign and count against
/// their own discovery budget.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpaceId(String);

impl SpaceId {
    /// Sentinel for records that omit their workspace id.
    pub fn unknown() -> Self {
        Self(UNKNOWN_SPACE_ID.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SpaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
