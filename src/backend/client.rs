//! GraphBackend trait: the capability the generator and the walkthroughs
//! need from a graph store

use async_trait::async_trait;

use crate::backend::models::{EntitySummary, GraphStats, QueryResult, ResultValue};
use crate::error::FraudRingResult;
use crate::model::{NodeRef, NodeSpec, Rel};
use crate::query::{AggregateQuery, GraphQuery};

/// A lookup index on `(label, property)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSpec {
    pub label: String,
    pub property: String,
}

impl IndexSpec {
    pub fn new(label: impl Into<String>, property: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            property: property.into(),
        }
    }

    pub fn name(&self) -> String {
        format!("{}_{}", self.label.to_lowercase(), self.property.to_lowercase())
    }
}

/// Unified store interface.
///
/// Implemented by:
/// - `EmbeddedBackend`: in-process property graph (tests, demos, `mem://`)
/// - `RemoteBackend`: Neo4j-compatible server over HTTP
///
/// Each call is one atomic statement; nothing spans calls.
#[async_trait]
pub trait GraphBackend: Send + Sync {
    /// Short description for logs, e.g. the store URI
    fn describe(&self) -> String;

    /// Create a node; its `id` property must be unique
    async fn create(&self, spec: NodeSpec) -> FraudRingResult<()>;

    /// Create a directed relationship between two existing nodes
    async fn connect(&self, from: &NodeRef, rel: Rel, to: &NodeRef) -> FraudRingResult<()>;

    /// Create a lookup index; `IndexExists` when it is already defined
    async fn create_index(&self, index: &IndexSpec) -> FraudRingResult<()>;

    /// Delete every node and relationship
    async fn clear(&self) -> FraudRingResult<()>;

    /// Run a read query
    async fn query(&self, query: &GraphQuery) -> FraudRingResult<QueryResult>;

    /// Run an aggregate query; a scalar or `Null`
    async fn aggregate(&self, query: &AggregateQuery) -> FraudRingResult<ResultValue>;

    /// Check the store is reachable; failure is a `ConnectionError`
    async fn ping(&self) -> FraudRingResult<()>;

    async fn stats(&self) -> FraudRingResult<GraphStats>;

    /// Labels in use, sorted
    async fn labels(&self) -> FraudRingResult<Vec<String>>;

    /// Up to 500 entities of one label ordered by name
    async fn entities(&self, label: &str) -> FraudRingResult<Vec<EntitySummary>>;
}
