//! Result types shared by the embedded and remote backends

use crate::graph::{PropertyMap, PropertyValue, EXTERNAL_ID_KEY};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A node returned from a query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultNode {
    /// Store-assigned element id
    pub id: String,
    pub labels: Vec<String>,
    pub properties: PropertyMap,
}

impl ResultNode {
    pub fn get(&self, key: &str) -> Option<&PropertyValue> {
        self.properties.get(key).filter(|v| !v.is_null())
    }

    pub fn external_id(&self) -> Option<&str> {
        self.get(EXTERNAL_ID_KEY).and_then(|v| v.as_string())
    }

    pub fn has_label(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }

    /// The first of name, number, street and id that is set
    pub fn display_name(&self) -> String {
        ["name", "number", "street", EXTERNAL_ID_KEY]
            .iter()
            .find_map(|key| self.get(key))
            .map(|v| v.to_string())
            .unwrap_or_else(|| self.id.clone())
    }

    pub fn is_fraud(&self) -> bool {
        self.get("is_fraud").and_then(|v| v.as_boolean()).unwrap_or(false)
    }
}

/// A relationship returned from a query; endpoints are element ids
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(rename = "type")]
    pub rel_type: String,
    #[serde(default)]
    pub properties: PropertyMap,
}

/// One cell of a result row, tagged by what it holds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ResultValue {
    Node(ResultNode),
    Relationship(ResultEdge),
    Scalar(PropertyValue),
    Null,
}

impl ResultValue {
    pub fn is_null(&self) -> bool {
        matches!(self, ResultValue::Null | ResultValue::Scalar(PropertyValue::Null))
    }

    pub fn as_node(&self) -> Option<&ResultNode> {
        match self {
            ResultValue::Node(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_scalar(&self) -> Option<&PropertyValue> {
        match self {
            ResultValue::Scalar(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self.as_scalar()? {
            PropertyValue::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            other => other.as_integer(),
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        self.as_scalar().and_then(|v| v.as_float())
    }

    pub fn as_boolean(&self) -> Option<bool> {
        self.as_scalar().and_then(|v| v.as_boolean())
    }
}

impl From<PropertyValue> for ResultValue {
    fn from(value: PropertyValue) -> Self {
        if value.is_null() {
            ResultValue::Null
        } else {
            ResultValue::Scalar(value)
        }
    }
}

/// Result of a read query.
///
/// `nodes` lists every distinct node bound in `rows`; `edges` lists every
/// relationship between those nodes, whether or not a row bound it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<ResultValue>>,
    pub nodes: Vec<ResultNode>,
    pub edges: Vec<ResultEdge>,
}

impl QueryResult {
    /// Build from rows, collecting the distinct nodes; edges are added by
    /// the backend
    pub fn from_rows(columns: Vec<String>, rows: Vec<Vec<ResultValue>>) -> Self {
        let mut seen = HashSet::new();
        let nodes = rows
            .iter()
            .flatten()
            .filter_map(ResultValue::as_node)
            .filter(|n| seen.insert(n.id.clone()))
            .cloned()
            .collect();
        Self {
            columns,
            rows,
            nodes,
            edges: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Values of one column, top to bottom
    pub fn column(&self, name: &str) -> Vec<&ResultValue> {
        match self.columns.iter().position(|c| c == name) {
            Some(i) => self.rows.iter().filter_map(|row| row.get(i)).collect(),
            None => Vec::new(),
        }
    }

    pub fn node(&self, element_id: &str) -> Option<&ResultNode> {
        self.nodes.iter().find(|n| n.id == element_id)
    }

    pub fn node_by_external_id(&self, external_id: &str) -> Option<&ResultNode> {
        self.nodes.iter().find(|n| n.external_id() == Some(external_id))
    }
}

/// Admin counts of the store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphStats {
    pub total_nodes: u64,
    pub total_relationships: u64,
    pub claims: u64,
    pub fraud_claims: u64,
}

/// One row of an entity listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySummary {
    pub id: String,
    pub display: String,
}
