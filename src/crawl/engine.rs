// src/crawl/engine.rs
//! Recursive discovery of the content graph.
//!
//! A crawl does a lot of concurrent fetching, and any single fetch may
//! fail. The stance throughout: record the error, keep the siblings. A
//! result with a few missing subtrees is still a viewable graph; only a
//! root that cannot be resolved at all produces an empty one.

use super::graph::{GraphLink, UndirectedNodeGraph};
use super::queue::TaskQueue;
use crate::api::responses::{BlockKind, BlockRecord, PageDocument};
use crate::api::ContentApiClient;
use crate::config::CrawlConfig;
use crate::constants::{UNKNOWN_DATABASE_PAGE_TITLE, UNKNOWN_DATABASE_TITLE};
use crate::error::CrawlError;
use crate::types::{BlockId, ContentNode, NodeKind, SpaceId};
use futures::future::BoxFuture;
use futures::FutureExt;
use indexmap::IndexMap;
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// Final crawl result.
///
/// Serializes to the `{nodes, links}` shape graph frontends consume;
/// accumulated errors ride along for the caller but stay out of the JSON.
#[derive(Debug, Default, Serialize)]
pub struct BlockGraph {
    pub nodes: Vec<ContentNode>,
    pub links: Vec<GraphLink>,
    #[serde(skip)]
    pub errors: Vec<CrawlError>,
}

impl BlockGraph {
    fn aborted(errors: Vec<CrawlError>) -> Self {
        Self {
            errors,
            ..Self::default()
        }
    }
}

/// Mutable crawl state — the single owner of every cross-task invariant:
/// node uniqueness, edge dedup and the budget counters. Discovery tasks
/// run concurrently but only touch this through the lock.
#[derive(Default)]
struct CrawlState {
    nodes: IndexMap<BlockId, ContentNode>,
    graph: UndirectedNodeGraph,
    errors: Vec<CrawlError>,
    /// Unique child nodes accepted so far. The root is not counted.
    discovered: u64,
    /// Accepted nodes living outside the root's workspace.
    foreign_discovered: u64,
}

/// Everything a discovery task needs, shared across the crawl.
struct CrawlContext {
    client: Arc<dyn ContentApiClient>,
    config: CrawlConfig,
    root_space_id: SpaceId,
    state: Mutex<CrawlState>,
}

/// Builds a graph of content nodes reachable from one root block.
pub struct CrawlEngine {
    client: Arc<dyn ContentApiClient>,
    config: CrawlConfig,
}

impl CrawlEngine {
    /// Creates an engine, rejecting impossible configurations (foreign
    /// budget above the node budget, zero concurrency) before any fetch
    /// happens.
    pub fn new(client: Arc<dyn ContentApiClient>, config: CrawlConfig) -> Result<Self, CrawlError> {
        config.validate()?;
        Ok(Self { client, config })
    }

    /// Builds the graph reachable from `root_block_id`, given as the
    /// 32-character id from a page URL or its dashed form.
    ///
    /// Always returns a [`BlockGraph`]: fatal failures (unparseable id,
    /// unresolvable or unsupported root) yield an empty graph carrying the
    /// recorded error, while per-node failures during the crawl are
    /// accumulated and siblings continue.
    pub async fn build(&self, root_block_id: &str) -> BlockGraph {
        let mut errors = Vec::new();

        let root_id = match BlockId::parse(root_block_id) {
            Ok(id) => id,
            Err(err) => {
                errors.push(err);
                return BlockGraph::aborted(errors);
            }
        };

        let root_record = match self.resolve_topmost_block(&root_id, &mut errors).await {
            Some(record) => record,
            None => return BlockGraph::aborted(errors),
        };

        let root_node = match materialize_root(&root_record) {
            Ok(node) => node,
            Err(err) => {
                errors.push(err);
                return BlockGraph::aborted(errors);
            }
        };

        let queue = match TaskQueue::new(
            self.config.max_concurrent_request,
            self.config.max_discoverable_nodes.map(u64::from),
            Duration::from_millis(self.config.quiet_timeout_ms),
        ) {
            Ok(queue) => queue,
            Err(err) => {
                errors.push(err);
                return BlockGraph::aborted(errors);
            }
        };

        let context = Arc::new(CrawlContext {
            client: Arc::clone(&self.client),
            config: self.config.clone(),
            root_space_id: root_node.space_id.clone(),
            state: Mutex::new(CrawlState {
                errors,
                ..CrawlState::default()
            }),
        });
        context
            .state
            .lock()
            .nodes
            .insert(root_node.id.clone(), root_node.clone());

        log::info!(
            "crawl starting from {} (\"{}\")",
            root_node.id,
            root_node.title
        );

        // The root's discovery pass runs directly and enqueues a task per
        // accepted child; those tasks enqueue their own children in turn.
        // Joined, not sequenced: completion can only be judged while
        // discovery is free to keep feeding the queue.
        let root_discovery =
            discover_block_children(Arc::clone(&context), root_node, Arc::clone(&queue));
        tokio::join!(root_discovery, queue.completed());

        let mut state = context.state.lock();
        // Edges may reference children that were never fetched (the node
        // cap can truncate discovery mid-flight); drop them.
        let links: Vec<GraphLink> = state
            .graph
            .export_links()
            .into_iter()
            .filter(|link| {
                state.nodes.contains_key(&link.source) && state.nodes.contains_key(&link.target)
            })
            .collect();
        let nodes: Vec<ContentNode> = state.nodes.values().cloned().collect();
        let errors = std::mem::take(&mut state.errors);

        log::info!(
            "crawl finished: {} nodes, {} links, {} errors",
            nodes.len(),
            links.len(),
            errors.len()
        );

        BlockGraph {
            nodes,
            links,
            errors,
        }
    }

    /// Finds the topmost block reachable from any block id.
    ///
    /// The API returns a block's recursive ancestors alongside the block
    /// itself, so one fetch suffices: the topmost block is either the
    /// requested one or the ancestor parked directly under the workspace.
    async fn resolve_topmost_block(
        &self,
        root_id: &BlockId,
        errors: &mut Vec<CrawlError>,
    ) -> Option<BlockRecord> {
        let document = match self.client.fetch_page(root_id).await {
            Ok(document) => document,
            Err(err) => {
                errors.push(err);
                errors.push(CrawlError::RootResolution {
                    block_id: root_id.clone(),
                });
                return None;
            }
        };

        let record = document
            .block
            .values()
            .filter_map(|envelope| envelope.value.as_ref())
            .find(|record| record.id == *root_id || record.is_toplevel())
            .cloned();

        if record.is_none() {
            errors.push(CrawlError::RootResolution {
                block_id: root_id.clone(),
            });
        }
        record
    }
}

/// Classifies the resolved root record into a root node.
///
/// An alias cannot anchor a crawl (it never materializes as a node), and a
/// full-page database without its collection id cannot be titled later, so
/// both are rejected alongside plainly unsupported types.
fn materialize_root(record: &BlockRecord) -> Result<ContentNode, CrawlError> {
    let rejected = || CrawlError::RootKindRejected {
        block_id: record.id.clone(),
        kind: record.kind.clone(),
    };

    let kind = match BlockKind::classify(&record.kind) {
        Some(BlockKind::Page) => NodeKind::Page,
        Some(BlockKind::CollectionView) => NodeKind::CollectionView,
        Some(BlockKind::CollectionViewPage) => match &record.collection_id {
            Some(collection_id) => NodeKind::CollectionViewPage {
                collection_id: collection_id.clone(),
            },
            None => return Err(rejected()),
        },
        Some(BlockKind::Alias) | None => return Err(rejected()),
    };

    Ok(ContentNode {
        id: record.id.clone(),
        title: record.page_title(),
        space_id: record.space_id.clone().unwrap_or_else(SpaceId::unknown),
        parent_id: None,
        child_count: 0,
        kind,
    })
}

/// One discovery task: fetch `parent`'s page document, register every
/// acceptable child, and enqueue a discovery task per accepted child.
///
/// Boxed so the recursion is expressed as "task enqueues task", never as
/// call-stack depth.
fn discover_block_children(
    context: Arc<CrawlContext>,
    parent: ContentNode,
    queue: Arc<TaskQueue<()>>,
) -> BoxFuture<'static, ()> {
    async move {
        let document = match context.client.fetch_page(&parent.id).await {
            Ok(document) => document,
            Err(err) => {
                log::warn!("fetch failed for {}: {}", parent.id, err);
                context.state.lock().errors.push(err);
                return;
            }
        };

        // This response is addressed to the parent directly, which is the
        // only request that reveals a collection's true display name.
        if parent.kind.is_collection() {
            backfill_collection_title(&context, &parent, &document);
        }

        for envelope in document.block.values() {
            if node_budget_exhausted(&context) {
                log::info!("node budget reached; closing the queue");
                queue.mark_no_more_enqueues();
                return;
            }

            let Some(record) = envelope.value.as_ref() else {
                continue;
            };
            let Some(kind) = BlockKind::classify(&record.kind) else {
                continue;
            };

            // The response echoes the parent itself; also skip anything
            // another task has already registered.
            if record.id == parent.id || context.state.lock().nodes.contains_key(&record.id) {
                continue;
            }

            let Some(space_id) = record.space_id.clone() else {
                continue;
            };

            // Nodes from other workspaces consume their own budget.
            // Aliases are exempt: they are structural links, not content.
            if kind != BlockKind::Alias && space_id != context.root_space_id {
                let mut state = context.state.lock();
                let budget = u64::from(context.config.max_discoverable_nodes_in_other_spaces);
                if state.foreign_discovered >= budget {
                    continue;
                }
                state.foreign_discovered += 1;
            }

            match kind {
                BlockKind::Alias => match record.alias_pointer() {
                    Some(pointer) => {
                        context
                            .state
                            .lock()
                            .graph
                            .add_edge(&parent.id, &pointer.id);
                    }
                    None => {
                        context.state.lock().errors.push(CrawlError::MissingField {
                            block_id: record.id.clone(),
                            field: "format.alias_pointer",
                        });
                    }
                },
                BlockKind::Page => {
                    let child = ContentNode {
                        id: record.id.clone(),
                        title: record.page_title(),
                        space_id,
                        parent_id: Some(parent.id.clone()),
                        child_count: 0,
                        kind: NodeKind::Page,
                    };
                    register_discovered_node(&context, &parent, child, &queue);
                }
                BlockKind::CollectionView => {
                    let child = ContentNode {
                        id: record.id.clone(),
                        // The real name arrives with the child's own fetch.
                        title: UNKNOWN_DATABASE_TITLE.to_string(),
                        space_id,
                        parent_id: Some(parent.id.clone()),
                        child_count: 0,
                        kind: NodeKind::CollectionView,
                    };
                    register_discovered_node(&context, &parent, child, &queue);
                }
                BlockKind::CollectionViewPage => {
                    let Some(collection_id) = record.collection_id.clone() else {
                        context.state.lock().errors.push(CrawlError::MissingField {
                            block_id: record.id.clone(),
                            field: "collection_id",
                        });
                        continue;
                    };
                    let child = ContentNode {
                        id: record.id.clone(),
                        title: UNKNOWN_DATABASE_PAGE_TITLE.to_string(),
                        space_id,
                        parent_id: Some(parent.id.clone()),
                        child_count: 0,
                        kind: NodeKind::CollectionViewPage { collection_id },
                    };
                    register_discovered_node(&context, &parent, child, &queue);
                }
            }
        }
    }
    .boxed()
}

fn node_budget_exhausted(context: &CrawlContext) -> bool {
    match context.config.max_discoverable_nodes {
        Some(cap) => context.state.lock().discovered > u64::from(cap),
        None => false,
    }
}

/// Registers a freshly discovered child and schedules its own discovery.
///
/// The external success counter is advanced by exactly one accepted node,
/// which is what gates the queue's total cap — "node accepted" and "task
/// attempted" are deliberately different currencies.
fn register_discovered_node(
    context: &Arc<CrawlContext>,
    parent: &ContentNode,
    child: ContentNode,
    queue: &Arc<TaskQueue<()>>,
) {
    {
        let mut state = context.state.lock();
        // Recheck under the lock: a sibling task may have registered the
        // same child between the loop's skip check and here. The loser
        // contributes nothing, exactly as a later re-encounter would not.
        if state.nodes.contains_key(&child.id) {
            return;
        }
        state.discovered += 1;
        state.graph.add_edge(&child.id, &parent.id);
        if let Some(parent_entry) = state.nodes.get_mut(&parent.id) {
            parent_entry.child_count += 1;
        }
        state.nodes.insert(child.id.clone(), child.clone());
    }
    log::debug!("discovered {} (\"{}\")", child.id, child.title);
    queue.report_accepted(1);
    queue.enqueue(discover_block_children(
        Arc::clone(context),
        child,
        Arc::clone(queue),
    ));
}

/// Rewrites a collection node's placeholder title with the display name
/// from its directly addressed response.
///
/// Nested references never carry the name; only the response for the
/// collection itself includes the `collection` sibling map that holds it.
/// Every missing piece is recorded, and the rewrite happens only when the
/// whole chain is intact.
fn backfill_collection_title(
    context: &Arc<CrawlContext>,
    parent: &ContentNode,
    document: &PageDocument,
) {
    let record = document
        .block
        .get(parent.id.as_str())
        .and_then(|envelope| envelope.value.as_ref());
    let collection_id = record.and_then(|record| record.collection_id.clone());

    let mut state = context.state.lock();
    if record.is_none() {
        state.errors.push(CrawlError::MissingField {
            block_id: parent.id.clone(),
            field: "block",
        });
    }
    if collection_id.is_none() {
        state.errors.push(CrawlError::MissingField {
            block_id: parent.id.clone(),
            field: "collection_id",
        });
    }
    if document.collection.is_empty() {
        state.errors.push(CrawlError::MissingField {
            block_id: parent.id.clone(),
            field: "collection",
        });
        return;
    }

    let Some(collection_id) = collection_id else {
        return;
    };

    match document.collection.get(collection_id.as_str()) {
        Some(envelope) => {
            let title = envelope
                .value
                .as_ref()
                .map(|collection| collection.display_name())
                .unwrap_or_else(|| UNKNOWN_DATABASE_TITLE.to_string());
            if let Some(node) = state.nodes.get_mut(&parent.id) {
                node.title = title;
            }
        }
        None => {
            state
                .errors
                .push(CrawlError::UnknownCollection { collection_id });
        }
    }
}
