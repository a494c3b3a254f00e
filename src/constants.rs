// src/constants.rs
//! Domain constants that define the operational boundaries of a crawl.
//!
//! Each constant is named for the domain concept it constrains. Reading
//! these should tell you the story of how a crawl behaves: how many nodes
//! it will accept, how wide it fans out, and what it calls content it
//! cannot name.

// ---------------------------------------------------------------------------
// Crawl budgets
// ---------------------------------------------------------------------------

/// Default cap on unique discovered nodes.
///
/// A workspace of unknown size can hold tens of thousands of pages; the
/// default keeps an unattended crawl from running for hours.
pub const DEFAULT_MAX_DISCOVERABLE_NODES: u32 = 500;

/// Default cap on nodes discovered outside the root's workspace.
///
/// Cross-workspace links ("link to page" across spaces) can chain into
/// arbitrarily many foreign workspaces; without this cap the crawl may
/// effectively never halt.
pub const DEFAULT_MAX_FOREIGN_NODES: u32 = 250;

/// Default number of page fetches kept in flight at once.
pub const DEFAULT_MAX_CONCURRENT_REQUEST: usize = 35;

/// Default idle period after the last settled fetch before the crawl is
/// judged complete in the absence of an explicit close signal.
pub const DEFAULT_QUIET_TIMEOUT_MS: u64 = 15_000;

// ---------------------------------------------------------------------------
// Display fallbacks
// ---------------------------------------------------------------------------

/// Title used for pages that carry no title property at all.
pub const UNTITLED_FALLBACK: &str = "Untitled";

/// Placeholder title for an inline database until its own page document
/// reveals the real display name.
pub const UNKNOWN_DATABASE_TITLE: &str = "Unknown database title";

/// Placeholder title for a full-page database until its own page document
/// reveals the real display name.
pub const UNKNOWN_DATABASE_PAGE_TITLE: &str = "Unknown database page title";

/// Sentinel workspace id for records that omit `space_id`.
pub const UNKNOWN_SPACE_ID: &str = "Unknown space id";
