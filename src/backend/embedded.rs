//! EmbeddedBackend: in-process graph store
//!
//! Wraps a [`GraphStore`] behind a tokio `RwLock` and evaluates query
//! patterns natively; no network needed.

use async_trait::async_trait;
use std::cmp::Ordering;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::backend::client::{GraphBackend, IndexSpec};
use crate::backend::models::{EntitySummary, GraphStats, QueryResult, ResultEdge, ResultNode, ResultValue};
use crate::error::{FraudRingError, FraudRingResult};
use crate::graph::{Edge, EdgeType, GraphError, GraphStore, Label, Node, NodeId};
use crate::model::{NodeRef, NodeSpec, Rel};
use crate::query::cypher::ENTITY_LIST_LIMIT;
use crate::query::eval::{self, Binding};
use crate::query::{AggregateQuery, GraphQuery};

/// In-process backend around a shared [`GraphStore`]
pub struct EmbeddedBackend {
    store: Arc<RwLock<GraphStore>>,
}

impl EmbeddedBackend {
    pub fn new() -> Self {
        Self {
            store: Arc::new(RwLock::new(GraphStore::new())),
        }
    }

    /// Wrap an existing store
    pub fn with_store(store: Arc<RwLock<GraphStore>>) -> Self {
        Self { store }
    }

    /// The underlying store, for direct inspection in tests
    pub fn store(&self) -> &Arc<RwLock<GraphStore>> {
        &self.store
    }
}

impl Default for EmbeddedBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn to_result_node(node: &Node) -> ResultNode {
    ResultNode {
        id: node.id.as_u64().to_string(),
        labels: node.label_names(),
        properties: node.properties.clone(),
    }
}

fn to_result_edge(edge: &Edge) -> ResultEdge {
    ResultEdge {
        id: edge.id.as_u64().to_string(),
        source: edge.source.as_u64().to_string(),
        target: edge.target.as_u64().to_string(),
        rel_type: edge.edge_type.as_str().to_string(),
        properties: edge.properties.clone(),
    }
}

fn materialise(store: &GraphStore, binding: Binding) -> ResultValue {
    match binding {
        Binding::Node(id) => store
            .get_node(id)
            .map(|n| ResultValue::Node(to_result_node(n)))
            .unwrap_or(ResultValue::Null),
        Binding::Edge(id) => store
            .get_edge(id)
            .map(|e| ResultValue::Relationship(to_result_edge(e)))
            .unwrap_or(ResultValue::Null),
        Binding::Null => ResultValue::Null,
    }
}

/// Attach every relationship among the result nodes
fn with_edges(store: &GraphStore, mut result: QueryResult, nodes: &[NodeId]) -> QueryResult {
    result.edges = eval::edges_among(store, nodes)
        .into_iter()
        .filter_map(|id| store.get_edge(id))
        .map(to_result_edge)
        .collect();
    result
}

/// Cypher `ORDER BY` places nulls last
fn nulls_last(a: Option<&str>, b: Option<&str>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn text<'a>(node: &'a Node, key: &str) -> Option<&'a str> {
    node.get_property(key).and_then(|v| v.as_string())
}

#[async_trait]
impl GraphBackend for EmbeddedBackend {
    fn describe(&self) -> String {
        "embedded (mem://)".to_string()
    }

    async fn create(&self, spec: NodeSpec) -> FraudRingResult<()> {
        let mut store = self.store.write().await;
        let id = store.create_node(spec.labels, spec.properties)?;
        debug!("Created {} {:?}", id, spec.kind);
        Ok(())
    }

    async fn connect(&self, from: &NodeRef, rel: Rel, to: &NodeRef) -> FraudRingResult<()> {
        let mut store = self.store.write().await;
        let resolve = |r: &NodeRef| {
            store
                .node_by_external_id(&r.id)
                .filter(|n| n.has_label(&r.kind.label()))
                .map(|n| n.id)
                .ok_or_else(|| GraphError::UnknownExternalId(r.to_string()))
        };
        let source = resolve(from)?;
        let target = resolve(to)?;
        store.create_edge(source, target, EdgeType::new(rel.as_str()))?;
        Ok(())
    }

    async fn create_index(&self, index: &IndexSpec) -> FraudRingResult<()> {
        let mut store = self.store.write().await;
        match store.create_index(Label::new(index.label.as_str()), index.property.as_str()) {
            Ok(()) => Ok(()),
            Err(GraphError::IndexAlreadyExists { .. }) => Err(FraudRingError::IndexExists(index.name())),
            Err(e) => Err(e.into()),
        }
    }

    async fn clear(&self) -> FraudRingResult<()> {
        self.store.write().await.clear();
        Ok(())
    }

    async fn query(&self, query: &GraphQuery) -> FraudRingResult<QueryResult> {
        query.validate()?;
        let store = self.store.read().await;
        match query {
            GraphQuery::Patterns(branches) => {
                let matches = eval::match_patterns(&store, branches, query.columns());
                let rows = matches
                    .rows
                    .iter()
                    .map(|row| row.iter().map(|b| materialise(&store, *b)).collect())
                    .collect();
                let result = QueryResult::from_rows(matches.columns.clone(), rows);
                Ok(with_edges(&store, result, &matches.node_ids()))
            }
            GraphQuery::Neighborhood { label, id, hops } => {
                let nodes = eval::neighborhood(&store, label, id, *hops);
                let rows = nodes
                    .iter()
                    .map(|n| vec![materialise(&store, Binding::Node(*n))])
                    .collect();
                let result = QueryResult::from_rows(query.columns(), rows);
                Ok(with_edges(&store, result, &nodes))
            }
        }
    }

    async fn aggregate(&self, query: &AggregateQuery) -> FraudRingResult<ResultValue> {
        query.validate()?;
        let store = self.store.read().await;
        Ok(eval::aggregate(&store, query).into())
    }

    async fn ping(&self) -> FraudRingResult<()> {
        Ok(())
    }

    async fn stats(&self) -> FraudRingResult<GraphStats> {
        let store = self.store.read().await;
        let claims = store.nodes_by_label(&Label::new("Claim"));
        let fraud_claims = claims
            .iter()
            .filter(|c| c.get_property("is_fraud").and_then(|v| v.as_boolean()) == Some(true))
            .count();
        Ok(GraphStats {
            total_nodes: store.node_count() as u64,
            total_relationships: store.edge_count() as u64,
            claims: claims.len() as u64,
            fraud_claims: fraud_claims as u64,
        })
    }

    async fn labels(&self) -> FraudRingResult<Vec<String>> {
        let store = self.store.read().await;
        Ok(store.labels().iter().map(|l| l.as_str().to_string()).collect())
    }

    async fn entities(&self, label: &str) -> FraudRingResult<Vec<EntitySummary>> {
        let store = self.store.read().await;
        let mut nodes = store.nodes_by_label(&Label::new(label));
        nodes.sort_by(|a, b| {
            nulls_last(text(a, "name"), text(b, "name"))
                .then_with(|| nulls_last(text(a, "number"), text(b, "number")))
        });
        Ok(nodes
            .into_iter()
            .take(ENTITY_LIST_LIMIT)
            .map(|node| {
                let result = to_result_node(node);
                EntitySummary {
                    id: result.external_id().unwrap_or(&result.id).to_string(),
                    display: result.display_name(),
                }
            })
            .collect())
    }
}
