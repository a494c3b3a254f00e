// tests/crawl_scenarios.rs
//! End-to-end crawl scenarios against an in-memory fixture client.
//!
//! Fixtures are raw `loadPageChunk`-shaped JSON documents keyed by block
//! id; any id without a fixture resolves to an empty document, which reads
//! as "no children".

use async_trait::async_trait;
use notion_graph::{
    BlockGraph, BlockId, ContentApiClient, ContentNode, CrawlConfig, CrawlEngine, CrawlError,
    NodeKind, PageDocument,
};
use pretty_assertions::assert_eq;
use serde_json::{json, Map, Value};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

const MAIN_SPACE: &str = "11111111-1111-1111-1111-111111111111";
const OTHER_SPACE: &str = "99999999-9999-9999-9999-999999999999";

const ROOT: &str = "aaaaaaaa-0000-0000-0000-aaaaaaaaaaaa";

/// A dashed block id derived from a small test number.
fn id(n: u32) -> String {
    format!("{:08x}-0000-0000-0000-{:012x}", n, n)
}

// --- fixture client -------------------------------------------------------

#[derive(Default)]
struct FixtureClient {
    pages: HashMap<String, Value>,
    failing: HashSet<String>,
}

impl FixtureClient {
    fn new() -> Self {
        Self::default()
    }

    fn with_page(mut self, block_id: &str, document: Value) -> Self {
        self.pages.insert(block_id.to_string(), document);
        self
    }

    fn with_failure(mut self, block_id: &str) -> Self {
        self.failing.insert(block_id.to_string());
        self
    }
}

#[async_trait]
impl ContentApiClient for FixtureClient {
    async fn fetch_page(&self, block_id: &BlockId) -> Result<PageDocument, CrawlError> {
        if self.failing.contains(block_id.as_str()) {
            return Err(CrawlError::MalformedDocument {
                block_id: block_id.clone(),
                reason: "fixture failure".to_string(),
            });
        }
        let value = self
            .pages
            .get(block_id.as_str())
            .cloned()
            .unwrap_or_else(|| json!({ "block": {} }));
        Ok(serde_json::from_value(value).expect("fixture page documents must deserialize"))
    }
}

// --- fixture builders -----------------------------------------------------

fn document(entries: Vec<(String, Value)>) -> Value {
    let mut block = Map::new();
    for (entry_id, entry) in entries {
        block.insert(entry_id, entry);
    }
    json!({ "block": block })
}

fn root_entry(block_id: &str, title: &str) -> (String, Value) {
    (
        block_id.to_string(),
        json!({
            "value": {
                "id": block_id,
                "type": "page",
                "space_id": MAIN_SPACE,
                "parent_table": "space",
                "properties": { "title": [[title]] }
            }
        }),
    )
}

fn page_entry(block_id: &str, space: &str, title: &str) -> (String, Value) {
    (
        block_id.to_string(),
        json!({
            "value": {
                "id": block_id,
                "type": "page",
                "space_id": space,
                "properties": { "title": [[title]] }
            }
        }),
    )
}

fn alias_entry(block_id: &str, space: &str, target: &str) -> (String, Value) {
    (
        block_id.to_string(),
        json!({
            "value": {
                "id": block_id,
                "type": "alias",
                "space_id": space,
                "format": { "alias_pointer": { "id": target, "spaceId": space } }
            }
        }),
    )
}

fn test_config() -> CrawlConfig {
    CrawlConfig {
        max_discoverable_nodes: Some(100),
        max_discoverable_nodes_in_other_spaces: 50,
        max_concurrent_request: 4,
        quiet_timeout_ms: 50,
        verbose: false,
    }
}

fn engine(client: FixtureClient, config: CrawlConfig) -> CrawlEngine {
    CrawlEngine::new(Arc::new(client), config).expect("test configuration must be valid")
}

fn node<'a>(graph: &'a BlockGraph, block_id: &str) -> &'a ContentNode {
    graph
        .nodes
        .iter()
        .find(|node| node.id.as_str() == block_id)
        .unwrap_or_else(|| panic!("node {} not in result", block_id))
}

fn has_link(graph: &BlockGraph, a: &str, b: &str) -> bool {
    graph.links.iter().any(|link| {
        (link.source.as_str() == a && link.target.as_str() == b)
            || (link.source.as_str() == b && link.target.as_str() == a)
    })
}

// --- scenarios ------------------------------------------------------------

#[tokio::test]
async fn root_with_zero_children() {
    let client = FixtureClient::new().with_page(ROOT, document(vec![root_entry(ROOT, "Home")]));
    let graph = engine(client, test_config()).build(ROOT).await;

    assert_eq!(graph.nodes.len(), 1);
    assert_eq!(graph.nodes[0].title, "Home");
    assert_eq!(graph.nodes[0].parent_id, None);
    assert!(graph.links.is_empty());
    assert!(graph.errors.is_empty());
}

#[tokio::test]
async fn undashed_root_id_resolves_to_the_same_crawl() {
    let client = FixtureClient::new().with_page(ROOT, document(vec![root_entry(ROOT, "Home")]));
    let undashed = ROOT.replace('-', "");
    let graph = engine(client, test_config()).build(&undashed).await;

    assert_eq!(graph.nodes.len(), 1);
    assert_eq!(graph.nodes[0].id.as_str(), ROOT);
    assert!(graph.errors.is_empty());
}

#[tokio::test]
async fn three_child_pages_yield_four_nodes_and_three_links() {
    let client = FixtureClient::new().with_page(
        ROOT,
        document(vec![
            root_entry(ROOT, "Home"),
            page_entry(&id(1), MAIN_SPACE, "First"),
            page_entry(&id(2), MAIN_SPACE, "Second"),
            page_entry(&id(3), MAIN_SPACE, "Third"),
        ]),
    );
    let config = CrawlConfig {
        max_discoverable_nodes: Some(10),
        max_discoverable_nodes_in_other_spaces: 10,
        ..test_config()
    };
    let graph = engine(client, config).build(ROOT).await;

    assert_eq!(graph.nodes.len(), 4);
    assert_eq!(graph.links.len(), 3);
    assert!(graph.errors.is_empty());
    assert_eq!(node(&graph, ROOT).child_count, 3);
    for child in [id(1), id(2), id(3)] {
        assert!(has_link(&graph, ROOT, &child));
        assert_eq!(
            node(&graph, &child).parent_id.as_ref().unwrap().as_str(),
            ROOT
        );
    }
}

#[tokio::test]
async fn alias_to_an_undiscovered_target_is_filtered_out() {
    let client = FixtureClient::new().with_page(
        ROOT,
        document(vec![
            root_entry(ROOT, "Home"),
            alias_entry(&id(7), MAIN_SPACE, &id(99)),
        ]),
    );
    let graph = engine(client, test_config()).build(ROOT).await;

    // The alias never materializes and its target was never discovered,
    // so the raw edge is dropped by the final filter.
    assert_eq!(graph.nodes.len(), 1);
    assert!(graph.links.is_empty());
    assert!(graph.errors.is_empty());
}

#[tokio::test]
async fn alias_between_discovered_nodes_contributes_an_edge() {
    let client = FixtureClient::new()
        .with_page(
            ROOT,
            document(vec![
                root_entry(ROOT, "Home"),
                page_entry(&id(1), MAIN_SPACE, "First"),
                page_entry(&id(2), MAIN_SPACE, "Second"),
            ]),
        )
        .with_page(
            &id(1),
            document(vec![alias_entry(&id(7), MAIN_SPACE, &id(2))]),
        );
    let graph = engine(client, test_config()).build(ROOT).await;

    assert_eq!(graph.nodes.len(), 3);
    assert_eq!(graph.links.len(), 3);
    assert!(has_link(&graph, &id(1), &id(2)));
    // The alias itself never became a node.
    assert!(graph.nodes.iter().all(|node| node.id.as_str() != id(7)));
    assert!(graph.errors.is_empty());
}

#[tokio::test]
async fn alias_duplicating_a_parent_edge_is_deduplicated() {
    // Root links to its own child through an alias as well; the unordered
    // pair already exists in the opposite direction.
    let client = FixtureClient::new().with_page(
        ROOT,
        document(vec![
            root_entry(ROOT, "Home"),
            page_entry(&id(1), MAIN_SPACE, "First"),
            alias_entry(&id(7), MAIN_SPACE, &id(1)),
        ]),
    );
    let graph = engine(client, test_config()).build(ROOT).await;

    assert_eq!(graph.nodes.len(), 2);
    assert_eq!(graph.links.len(), 1);
}

#[tokio::test]
async fn alias_without_a_pointer_is_a_recorded_structural_error() {
    let broken_alias = (
        id(7),
        json!({
            "value": { "id": id(7), "type": "alias", "space_id": MAIN_SPACE, "format": {} }
        }),
    );
    let client = FixtureClient::new().with_page(
        ROOT,
        document(vec![
            root_entry(ROOT, "Home"),
            broken_alias,
            page_entry(&id(1), MAIN_SPACE, "Sibling"),
        ]),
    );
    let graph = engine(client, test_config()).build(ROOT).await;

    // The broken entry is skipped; its sibling is still discovered.
    assert_eq!(graph.nodes.len(), 2);
    assert_eq!(graph.links.len(), 1);
    assert_eq!(graph.errors.len(), 1);
    assert!(matches!(
        graph.errors[0],
        CrawlError::MissingField {
            field: "format.alias_pointer",
            ..
        }
    ));
}

#[tokio::test]
async fn zero_foreign_budget_skips_foreign_children_entirely() {
    let client = FixtureClient::new().with_page(
        ROOT,
        document(vec![
            root_entry(ROOT, "Home"),
            page_entry(&id(1), OTHER_SPACE, "Foreign"),
        ]),
    );
    let config = CrawlConfig {
        max_discoverable_nodes_in_other_spaces: 0,
        ..test_config()
    };
    let graph = engine(client, config).build(ROOT).await;

    assert_eq!(graph.nodes.len(), 1);
    assert!(graph.links.is_empty());
    assert!(graph.errors.is_empty());
    assert_eq!(node(&graph, ROOT).child_count, 0);
}

#[tokio::test]
async fn foreign_budget_is_consumed_one_node_at_a_time() {
    let client = FixtureClient::new().with_page(
        ROOT,
        document(vec![
            root_entry(ROOT, "Home"),
            page_entry(&id(1), OTHER_SPACE, "Foreign one"),
            page_entry(&id(2), OTHER_SPACE, "Foreign two"),
        ]),
    );
    let config = CrawlConfig {
        max_discoverable_nodes_in_other_spaces: 1,
        ..test_config()
    };
    let graph = engine(client, config).build(ROOT).await;

    // Exactly one foreign node fits the budget.
    assert_eq!(graph.nodes.len(), 2);
    assert_eq!(graph.links.len(), 1);
}

#[tokio::test]
async fn aliases_are_exempt_from_the_foreign_budget() {
    let client = FixtureClient::new()
        .with_page(
            ROOT,
            document(vec![
                root_entry(ROOT, "Home"),
                page_entry(&id(1), MAIN_SPACE, "First"),
                page_entry(&id(2), MAIN_SPACE, "Second"),
            ]),
        )
        .with_page(
            &id(1),
            document(vec![alias_entry(&id(7), OTHER_SPACE, &id(2))]),
        );
    let config = CrawlConfig {
        max_discoverable_nodes_in_other_spaces: 0,
        ..test_config()
    };
    let graph = engine(client, config).build(ROOT).await;

    // The foreign-space alias still contributed its edge.
    assert!(has_link(&graph, &id(1), &id(2)));
    assert_eq!(graph.links.len(), 3);
}

#[tokio::test]
async fn node_budget_truncates_discovery_but_still_completes() {
    let mut entries = vec![root_entry(ROOT, "Home")];
    for n in 1..=5 {
        entries.push(page_entry(&id(n), MAIN_SPACE, "Child"));
    }
    let client = FixtureClient::new().with_page(ROOT, document(entries));
    let config = CrawlConfig {
        max_discoverable_nodes: Some(2),
        max_discoverable_nodes_in_other_spaces: 0,
        ..test_config()
    };
    let graph = engine(client, config).build(ROOT).await;

    // The budget check fires once the discovered count exceeds the cap:
    // children are accepted up to one past it, then scheduling stops and
    // the queue still reaches its single completion signal.
    assert_eq!(graph.nodes.len(), 4);
    assert_eq!(graph.links.len(), 3);
    assert!(graph.errors.is_empty());
    // No dangling references survive the final filter.
    for link in &graph.links {
        assert!(graph.nodes.iter().any(|node| node.id == link.source));
        assert!(graph.nodes.iter().any(|node| node.id == link.target));
    }
}

#[tokio::test]
async fn one_failing_fetch_does_not_stop_the_siblings() {
    let client = FixtureClient::new()
        .with_page(
            ROOT,
            document(vec![
                root_entry(ROOT, "Home"),
                page_entry(&id(1), MAIN_SPACE, "Broken subtree"),
                page_entry(&id(2), MAIN_SPACE, "Healthy subtree"),
            ]),
        )
        .with_page(
            &id(2),
            document(vec![page_entry(&id(3), MAIN_SPACE, "Grandchild")]),
        )
        .with_failure(&id(1));
    let graph = engine(client, test_config()).build(ROOT).await;

    // The broken subtree's own children are lost; everything else stays.
    assert_eq!(graph.nodes.len(), 4);
    assert_eq!(graph.links.len(), 3);
    assert_eq!(graph.errors.len(), 1);
    assert!(matches!(
        graph.errors[0],
        CrawlError::MalformedDocument { .. }
    ));
}

#[tokio::test]
async fn collection_view_title_is_backfilled_from_its_own_response() {
    let view_id = id(5);
    let collection_id = id(50);
    let view_entry = (
        view_id.clone(),
        json!({
            "value": { "id": view_id.as_str(), "type": "collection_view", "space_id": MAIN_SPACE }
        }),
    );

    // The view's directly addressed response carries the collection map
    // holding the real database name.
    let mut block = Map::new();
    block.insert(
        view_id.clone(),
        json!({
            "value": {
                "id": view_id.as_str(),
                "type": "collection_view",
                "space_id": MAIN_SPACE,
                "collection_id": collection_id.as_str()
            }
        }),
    );
    let mut collection = Map::new();
    collection.insert(
        collection_id.clone(),
        json!({ "value": { "name": [["Tasks database"]] } }),
    );
    let view_own_document = json!({ "block": block, "collection": collection });

    let client = FixtureClient::new()
        .with_page(ROOT, document(vec![root_entry(ROOT, "Home"), view_entry]))
        .with_page(&view_id, view_own_document);
    let graph = engine(client, test_config()).build(ROOT).await;

    assert_eq!(graph.nodes.len(), 2);
    assert_eq!(node(&graph, &view_id).title, "Tasks database");
    assert!(graph.errors.is_empty());
}

#[tokio::test]
async fn collection_view_page_keeps_its_collection_id() {
    let cvp_id = id(6);
    let collection_id = id(60);
    let cvp_entry = (
        cvp_id.clone(),
        json!({
            "value": {
                "id": cvp_id.as_str(),
                "type": "collection_view_page",
                "space_id": MAIN_SPACE,
                "collection_id": collection_id.as_str()
            }
        }),
    );
    let client =
        FixtureClient::new().with_page(ROOT, document(vec![root_entry(ROOT, "Home"), cvp_entry]));
    let graph = engine(client, test_config()).build(ROOT).await;

    match &node(&graph, &cvp_id).kind {
        NodeKind::CollectionViewPage {
            collection_id: kept,
        } => {
            assert_eq!(kept.as_str(), collection_id);
        }
        other => panic!("expected a collection view page, got {:?}", other),
    }
}

#[tokio::test]
async fn collection_view_page_without_collection_id_is_skipped() {
    let cvp_entry = (
        id(6),
        json!({
            "value": { "id": id(6), "type": "collection_view_page", "space_id": MAIN_SPACE }
        }),
    );
    let client =
        FixtureClient::new().with_page(ROOT, document(vec![root_entry(ROOT, "Home"), cvp_entry]));
    let graph = engine(client, test_config()).build(ROOT).await;

    assert_eq!(graph.nodes.len(), 1);
    assert_eq!(graph.errors.len(), 1);
    assert!(matches!(
        graph.errors[0],
        CrawlError::MissingField {
            field: "collection_id",
            ..
        }
    ));
}

#[tokio::test]
async fn child_reachable_from_two_parents_is_registered_once() {
    let client = FixtureClient::new()
        .with_page(
            ROOT,
            document(vec![
                root_entry(ROOT, "Home"),
                page_entry(&id(1), MAIN_SPACE, "Left"),
                page_entry(&id(2), MAIN_SPACE, "Right"),
            ]),
        )
        .with_page(
            &id(1),
            document(vec![page_entry(&id(3), MAIN_SPACE, "Shared")]),
        )
        .with_page(
            &id(2),
            document(vec![page_entry(&id(3), MAIN_SPACE, "Shared")]),
        );
    let graph = engine(client, test_config()).build(ROOT).await;

    // Whichever parent discovers the shared child first owns it; the other
    // encounter is skipped wholesale, so no second edge appears.
    assert_eq!(graph.nodes.len(), 4);
    assert_eq!(graph.links.len(), 3);
    assert!(graph.errors.is_empty());
}

#[tokio::test]
async fn unsupported_child_kinds_and_valueless_envelopes_are_skipped() {
    let text_child = (
        id(1),
        json!({ "value": { "id": id(1), "type": "text", "space_id": MAIN_SPACE } }),
    );
    let valueless = (id(2), json!({ "value": null }));
    // A supported kind without a workspace id cannot proceed either.
    let spaceless = (id(3), json!({ "value": { "id": id(3), "type": "page" } }));

    let client = FixtureClient::new().with_page(
        ROOT,
        document(vec![
            root_entry(ROOT, "Home"),
            text_child,
            valueless,
            spaceless,
        ]),
    );
    let graph = engine(client, test_config()).build(ROOT).await;

    assert_eq!(graph.nodes.len(), 1);
    assert!(graph.links.is_empty());
    assert!(graph.errors.is_empty());
}

#[tokio::test]
async fn unsupported_root_kind_aborts_with_an_empty_graph() {
    let text_root = (
        ROOT.to_string(),
        json!({ "value": { "id": ROOT, "type": "text", "space_id": MAIN_SPACE } }),
    );
    let client = FixtureClient::new().with_page(ROOT, document(vec![text_root]));
    let graph = engine(client, test_config()).build(ROOT).await;

    assert!(graph.nodes.is_empty());
    assert!(graph.links.is_empty());
    assert_eq!(graph.errors.len(), 1);
    assert!(matches!(
        graph.errors[0],
        CrawlError::RootKindRejected { .. }
    ));
}

#[tokio::test]
async fn failing_root_fetch_records_the_resolution_error() {
    let client = FixtureClient::new().with_failure(ROOT);
    let graph = engine(client, test_config()).build(ROOT).await;

    assert!(graph.nodes.is_empty());
    assert_eq!(graph.errors.len(), 2);
    assert!(matches!(graph.errors[1], CrawlError::RootResolution { .. }));
}

#[tokio::test]
async fn root_absent_from_its_own_document_fails_resolution() {
    // Neither the requested id nor any workspace-toplevel block appears.
    let stray = page_entry(&id(1), MAIN_SPACE, "Stray");
    let client = FixtureClient::new().with_page(ROOT, document(vec![stray]));
    let graph = engine(client, test_config()).build(ROOT).await;

    assert!(graph.nodes.is_empty());
    assert_eq!(graph.errors.len(), 1);
    assert!(matches!(graph.errors[0], CrawlError::RootResolution { .. }));
}

#[tokio::test]
async fn malformed_root_id_is_a_format_error() {
    let client = FixtureClient::new();
    let graph = engine(client, test_config())
        .build("definitely-not-an-id")
        .await;

    assert!(graph.nodes.is_empty());
    assert_eq!(graph.errors.len(), 1);
    assert!(matches!(graph.errors[0], CrawlError::IdFormat { .. }));
}

#[tokio::test]
async fn topmost_ancestor_is_preferred_when_the_requested_id_is_absent() {
    // Requesting a block deep in a page returns its ancestors too; when
    // the requested id itself is not in the map, the workspace-toplevel
    // ancestor anchors the crawl.
    let toplevel = id(10);
    let client =
        FixtureClient::new().with_page(ROOT, document(vec![root_entry(&toplevel, "Workspace home")]));
    let graph = engine(client, test_config()).build(ROOT).await;

    assert_eq!(graph.nodes.len(), 1);
    assert_eq!(graph.nodes[0].id.as_str(), toplevel);
    assert!(graph.errors.is_empty());
}

#[tokio::test]
async fn result_serializes_to_the_d3_shape_without_errors() {
    let client = FixtureClient::new().with_page(
        ROOT,
        document(vec![
            root_entry(ROOT, "Home"),
            page_entry(&id(1), MAIN_SPACE, "First"),
        ]),
    );
    let graph = engine(client, test_config()).build(ROOT).await;

    let value = serde_json::to_value(&graph).unwrap();
    assert!(value.get("errors").is_none());
    assert_eq!(value["nodes"].as_array().unwrap().len(), 2);
    let link = &value["links"][0];
    assert!(link.get("source").is_some() && link.get("target").is_some());
}
