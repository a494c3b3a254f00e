// src/types/node.rs
//! Materialized graph nodes.

use super::ids::{BlockId, SpaceId};
use serde::Serialize;

/// What kind of content a node represents.
///
/// Aliases never materialize as nodes; they only contribute an edge, so
/// there is no alias variant here. A full-page database carries the id of
/// the collection that holds its display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeKind {
    Page,
    CollectionView,
    CollectionViewPage { collection_id: BlockId },
}

impl NodeKind {
    /// Collection kinds start with a placeholder title that is rewritten
    /// once their own page document is fetched.
    pub fn is_collection(&self) -> bool {
        matches!(
            self,
            NodeKind::CollectionView | NodeKind::CollectionViewPage { .. }
        )
    }
}

/// One unit of discovered content.
///
/// A node is created the moment it is first discovered and never removed.
/// After creation only two things may change: `child_count` grows as
/// children are discovered through it, and collection kinds have their
/// `title` rewritten exactly once with the real database name.
#[derive(Debug, Clone, Serialize)]
pub struct ContentNode {
    pub id: BlockId,
    pub title: String,
    pub space_id: SpaceId,
    /// Id of the node that discovered this one; `None` only for the root.
    pub parent_id: Option<BlockId>,
    /// Children discovered through this node so far.
    pub child_count: u32,
    #[serde(flatten)]
    pub kind: NodeKind,
}
