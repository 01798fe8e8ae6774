//! RemoteBackend: Neo4j-compatible server over HTTP
//!
//! Every operation is one (or a few) parameterised Cypher statements sent to
//! the transactional endpoint `POST {uri}/db/{database}/tx/commit` with basic
//! auth. Rows are requested in both `row` and `graph` form so that node and
//! relationship cells can be told apart through the `meta` entries.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::backend::client::{GraphBackend, IndexSpec};
use crate::backend::models::{EntitySummary, GraphStats, QueryResult, ResultEdge, ResultNode, ResultValue};
use crate::error::{FraudRingError, FraudRingResult};
use crate::graph::{PropertyMap, PropertyValue};
use crate::model::{NodeRef, NodeSpec, Rel};
use crate::query::cypher::{self, Statement};
use crate::query::{AggregateQuery, GraphQuery};

#[derive(Debug, Deserialize)]
struct TxResponse {
    #[serde(default)]
    results: Vec<TxResult>,
    #[serde(default)]
    errors: Vec<TxError>,
}

#[derive(Debug, Deserialize)]
struct TxError {
    code: String,
    message: String,
}

impl TxError {
    fn to_error(&self) -> FraudRingError {
        FraudRingError::QueryError(format!("{}: {}", self.code, self.message))
    }
}

/// Server errors meaning the schema item is already defined
fn is_already_defined(message: &str) -> bool {
    message.contains("AlreadyExists") || message.contains("already exists")
}

/// Only index creation treats "already exists" as `IndexExists`; on any
/// other statement it is a real constraint failure.
fn index_outcome(index: &IndexSpec, result: FraudRingResult<TxResult>) -> FraudRingResult<()> {
    match result {
        Ok(_) => Ok(()),
        Err(FraudRingError::QueryError(msg)) if is_already_defined(&msg) => {
            Err(FraudRingError::IndexExists(index.name()))
        }
        Err(e) => Err(e),
    }
}

#[derive(Debug, Default, Deserialize)]
struct TxResult {
    #[serde(default)]
    columns: Vec<String>,
    #[serde(default)]
    data: Vec<TxRow>,
}

#[derive(Debug, Deserialize)]
struct TxRow {
    #[serde(default)]
    row: Vec<Value>,
    #[serde(default)]
    meta: Vec<Value>,
    #[serde(default)]
    graph: TxGraph,
}

#[derive(Debug, Default, Deserialize)]
struct TxGraph {
    #[serde(default)]
    nodes: Vec<TxNode>,
    #[serde(default)]
    relationships: Vec<TxRelationship>,
}

#[derive(Debug, Deserialize)]
struct TxNode {
    id: String,
    #[serde(rename = "elementId")]
    element_id: Option<String>,
    #[serde(default)]
    labels: Vec<String>,
    #[serde(default)]
    properties: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct TxRelationship {
    id: String,
    #[serde(rename = "elementId")]
    element_id: Option<String>,
    #[serde(rename = "type")]
    rel_type: String,
    #[serde(rename = "startNode")]
    start_node: String,
    #[serde(rename = "startNodeElementId")]
    start_element_id: Option<String>,
    #[serde(rename = "endNode")]
    end_node: String,
    #[serde(rename = "endNodeElementId")]
    end_element_id: Option<String>,
    #[serde(default)]
    properties: Map<String, Value>,
}

fn property_map(properties: &Map<String, Value>) -> PropertyMap {
    properties
        .iter()
        .map(|(k, v)| (k.clone(), PropertyValue::from_json(v)))
        .collect()
}

impl TxNode {
    fn key(&self) -> &str {
        self.element_id.as_deref().unwrap_or(&self.id)
    }

    fn to_result(&self) -> ResultNode {
        ResultNode {
            id: self.key().to_string(),
            labels: self.labels.clone(),
            properties: property_map(&self.properties),
        }
    }
}

impl TxRelationship {
    fn key(&self) -> &str {
        self.element_id.as_deref().unwrap_or(&self.id)
    }

    fn to_result(&self) -> ResultEdge {
        ResultEdge {
            id: self.key().to_string(),
            source: self.start_element_id.clone().unwrap_or_else(|| self.start_node.clone()),
            target: self.end_element_id.clone().unwrap_or_else(|| self.end_node.clone()),
            rel_type: self.rel_type.clone(),
            properties: property_map(&self.properties),
        }
    }
}

/// Element id named by a `meta` entry, with its kind
fn meta_ref(meta: &Value) -> Option<(&str, String)> {
    let kind = meta.get("type")?.as_str()?;
    let id = match meta.get("elementId").and_then(Value::as_str) {
        Some(element_id) => element_id.to_string(),
        None => meta.get("id")?.to_string(),
    };
    Some((kind, id))
}

impl TxRow {
    fn cells(&self) -> Vec<ResultValue> {
        self.row
            .iter()
            .enumerate()
            .map(|(i, value)| {
                if value.is_null() {
                    return ResultValue::Null;
                }
                match self.meta.get(i).and_then(meta_ref) {
                    Some(("node", id)) => self
                        .graph
                        .nodes
                        .iter()
                        .find(|n| n.key() == id)
                        .map(|n| ResultValue::Node(n.to_result()))
                        .unwrap_or(ResultValue::Null),
                    Some(("relationship", id)) => self
                        .graph
                        .relationships
                        .iter()
                        .find(|r| r.key() == id)
                        .map(|r| ResultValue::Relationship(r.to_result()))
                        .unwrap_or(ResultValue::Null),
                    _ => PropertyValue::from_json(value).into(),
                }
            })
            .collect()
    }
}

impl TxResult {
    fn first_cell(&self) -> ResultValue {
        self.data
            .first()
            .and_then(|row| row.cells().into_iter().next())
            .unwrap_or(ResultValue::Null)
    }

    fn count(&self) -> u64 {
        self.first_cell().as_integer().unwrap_or(0).max(0) as u64
    }
}

/// Backend talking to a Neo4j-compatible server
pub struct RemoteBackend {
    endpoint: String,
    user: String,
    password: String,
    http_client: Client,
}

impl RemoteBackend {
    /// Create a backend for `base_url` (e.g. `http://localhost:7474`) and
    /// the named database
    pub fn new(base_url: &str, database: &str, user: &str, password: &str) -> Self {
        Self {
            endpoint: format!("{}/db/{}/tx/commit", base_url.trim_end_matches('/'), database),
            user: user.to_string(),
            password: password.to_string(),
            http_client: Client::new(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Run statements in one auto-committed transaction
    async fn run(&self, statements: Vec<Statement>) -> FraudRingResult<Vec<TxResult>> {
        let statements: Vec<Value> = statements
            .into_iter()
            .map(|s| {
                debug!("cypher: {}", s.statement.replace('\n', " "));
                serde_json::json!({
                    "statement": s.statement,
                    "parameters": s.parameters,
                    "resultDataContents": ["row", "graph"],
                })
            })
            .collect();
        let body = serde_json::json!({ "statements": statements });

        let response = self
            .http_client
            .post(&self.endpoint)
            .basic_auth(&self.user, Some(&self.password))
            .json(&body)
            .send()
            .await
            .map_err(|e| FraudRingError::ConnectionError(format!("{}: {}", self.endpoint, e)))?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(FraudRingError::ConnectionError(format!(
                    "authentication rejected by {}",
                    self.endpoint
                )))
            }
            status if !status.is_success() => {
                return Err(FraudRingError::ConnectionError(format!(
                    "{} returned {}",
                    self.endpoint, status
                )))
            }
            _ => {}
        }

        let parsed: TxResponse = response.json().await?;
        if let Some(error) = parsed.errors.first() {
            return Err(error.to_error());
        }
        Ok(parsed.results)
    }

    async fn run_one(&self, statement: Statement) -> FraudRingResult<TxResult> {
        Ok(self.run(vec![statement]).await?.into_iter().next().unwrap_or_default())
    }

    /// All relationships among the given nodes
    async fn edges_among(&self, nodes: &[ResultNode]) -> FraudRingResult<Vec<ResultEdge>> {
        let ids: Vec<String> = nodes
            .iter()
            .filter_map(|n| n.external_id().map(str::to_string))
            .collect();
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let result = self.run_one(cypher::relationships_among(&ids)).await?;
        let mut edges: HashMap<String, ResultEdge> = HashMap::new();
        for row in &result.data {
            for rel in &row.graph.relationships {
                edges.entry(rel.key().to_string()).or_insert_with(|| rel.to_result());
            }
        }
        let mut edges: Vec<ResultEdge> = edges.into_values().collect();
        edges.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(edges)
    }
}

#[async_trait]
impl GraphBackend for RemoteBackend {
    fn describe(&self) -> String {
        self.endpoint.clone()
    }

    async fn create(&self, spec: NodeSpec) -> FraudRingResult<()> {
        self.run_one(cypher::create_node(&spec)).await?;
        Ok(())
    }

    async fn connect(&self, from: &NodeRef, rel: Rel, to: &NodeRef) -> FraudRingResult<()> {
        let result = self.run_one(cypher::connect(from, rel, to)).await?;
        if result.count() == 0 {
            return Err(FraudRingError::QueryError(format!(
                "cannot connect {} -[{}]-> {}: endpoint missing",
                from, rel, to
            )));
        }
        Ok(())
    }

    async fn create_index(&self, index: &IndexSpec) -> FraudRingResult<()> {
        index_outcome(index, self.run_one(cypher::create_index(index)?).await)
    }

    async fn clear(&self) -> FraudRingResult<()> {
        self.run_one(cypher::clear()).await?;
        Ok(())
    }

    async fn query(&self, query: &GraphQuery) -> FraudRingResult<QueryResult> {
        let result = self.run_one(query.to_cypher()?).await?;
        let rows = result.data.iter().map(TxRow::cells).collect();
        let mut out = QueryResult::from_rows(result.columns, rows);
        out.edges = self.edges_among(&out.nodes).await?;
        Ok(out)
    }

    async fn aggregate(&self, query: &AggregateQuery) -> FraudRingResult<ResultValue> {
        Ok(self.run_one(query.to_cypher()?).await?.first_cell())
    }

    async fn ping(&self) -> FraudRingResult<()> {
        match self.run_one(cypher::ping()).await {
            Ok(_) => Ok(()),
            Err(FraudRingError::ConnectionError(msg)) => Err(FraudRingError::ConnectionError(msg)),
            Err(e) => {
                warn!("Ping against {} failed: {}", self.endpoint, e);
                Err(FraudRingError::ConnectionError(e.to_string()))
            }
        }
    }

    async fn stats(&self) -> FraudRingResult<GraphStats> {
        let results = self.run(cypher::stats()).await?;
        let count = |i: usize| results.get(i).map(TxResult::count).unwrap_or(0);
        Ok(GraphStats {
            total_nodes: count(0),
            total_relationships: count(1),
            claims: count(2),
            fraud_claims: count(3),
        })
    }

    async fn labels(&self) -> FraudRingResult<Vec<String>> {
        let result = self.run_one(cypher::labels()).await?;
        Ok(result
            .data
            .iter()
            .filter_map(|row| row.row.first().and_then(Value::as_str).map(str::to_string))
            .collect())
    }

    async fn entities(&self, label: &str) -> FraudRingResult<Vec<EntitySummary>> {
        let result = self.run_one(cypher::entities(label)?).await?;
        Ok(result
            .data
            .iter()
            .filter_map(|row| {
                let id = row.row.first()?.as_str()?.to_string();
                let display = row
                    .row
                    .get(1)
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| id.clone());
                Some(EntitySummary { id, display })
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_shape() {
        let backend = RemoteBackend::new("http://localhost:7474/", "neo4j", "neo4j", "secret");
        assert_eq!(backend.endpoint(), "http://localhost:7474/db/neo4j/tx/commit");
    }

    #[test]
    fn test_rows_tagged_through_meta() {
        let body = serde_json::json!({
            "results": [{
                "columns": ["ph", "r0", "p", "n"],
                "data": [{
                    "row": [{"number": "555-847-2931"}, {}, {"name": "Marcus Williams"}, 3],
                    "meta": [
                        {"id": 1, "elementId": "4:x:1", "type": "node", "deleted": false},
                        {"id": 7, "elementId": "5:x:7", "type": "relationship", "deleted": false},
                        {"id": 2, "elementId": "4:x:2", "type": "node", "deleted": false},
                        null
                    ],
                    "graph": {
                        "nodes": [
                            {"id": "1", "elementId": "4:x:1", "labels": ["Phone"], "properties": {"id": "PH_S2_MAIN", "number": "555-847-2931"}},
                            {"id": "2", "elementId": "4:x:2", "labels": ["Person", "Claimant"], "properties": {"id": "P_S2_000", "name": "Marcus Williams"}}
                        ],
                        "relationships": [
                            {"id": "7", "elementId": "5:x:7", "type": "HAS_PHONE", "startNode": "2", "endNode": "1",
                             "startNodeElementId": "4:x:2", "endNodeElementId": "4:x:1", "properties": {}}
                        ]
                    }
                }]
            }],
            "errors": []
        });
        let parsed: TxResponse = serde_json::from_value(body).unwrap();
        let cells = parsed.results[0].data[0].cells();
        assert_eq!(cells[0].as_node().unwrap().external_id(), Some("PH_S2_MAIN"));
        match &cells[1] {
            ResultValue::Relationship(edge) => {
                assert_eq!(edge.rel_type, "HAS_PHONE");
                assert_eq!(edge.source, "4:x:2");
            }
            other => panic!("expected relationship, got {:?}", other),
        }
        assert!(cells[2].as_node().unwrap().has_label("Claimant"));
        assert_eq!(cells[3].as_integer(), Some(3));
    }

    #[test]
    fn test_already_exists_only_swallowed_for_indexes() {
        let error = TxError {
            code: "Neo.ClientError.Schema.ConstraintValidationFailed".to_string(),
            message: "Node(12) already exists with label `Claim` and property `id` = 'CLM_S1_000'".to_string(),
        };
        assert!(matches!(error.to_error(), FraudRingError::QueryError(_)));

        let index = IndexSpec::new("Claim", "id");
        let outcome = index_outcome(&index, Err(error.to_error()));
        assert!(matches!(outcome, Err(FraudRingError::IndexExists(name)) if name == "claim_id"));

        let equivalent = TxError {
            code: "Neo.ClientError.Schema.EquivalentSchemaRuleAlreadyExists".to_string(),
            message: "An equivalent index already exists".to_string(),
        };
        assert!(matches!(
            index_outcome(&index, Err(equivalent.to_error())),
            Err(FraudRingError::IndexExists(_))
        ));

        let syntax = TxError {
            code: "Neo.ClientError.Statement.SyntaxError".to_string(),
            message: "Invalid input".to_string(),
        };
        assert!(matches!(
            index_outcome(&index, Err(syntax.to_error())),
            Err(FraudRingError::QueryError(_))
        ));
        assert!(index_outcome(&index, Ok(TxResult::default())).is_ok());
    }

    #[test]
    fn test_count_of_empty_result_is_zero() {
        assert_eq!(TxResult::default().count(), 0);
    }
}
