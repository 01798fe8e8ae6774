//! In-memory graph storage
//!
//! Nodes and edges live in arenas addressed by their ids, with adjacency
//! lists in both directions, a label index, a unique index on the external
//! `id` property, and optional secondary property indices.

use super::edge::Edge;
use super::node::{Node, EXTERNAL_ID_KEY};
use super::property::{PropertyMap, PropertyValue};
use super::types::{EdgeId, EdgeType, Label, NodeId};
use std::collections::HashMap;
use thiserror::Error;

/// Errors that can occur during graph operations
#[derive(Error, Debug, PartialEq)]
pub enum GraphError {
    #[error("Node {0} not found")]
    NodeNotFound(NodeId),

    #[error("Invalid edge: source node {0} does not exist")]
    InvalidEdgeSource(NodeId),

    #[error("Invalid edge: target node {0} does not exist")]
    InvalidEdgeTarget(NodeId),

    #[error("Node with id '{0}' already exists")]
    DuplicateExternalId(String),

    #[error("No node with id '{0}'")]
    UnknownExternalId(String),

    #[error("Index on :{label}({property}) already exists")]
    IndexAlreadyExists { label: Label, property: String },
}

pub type GraphResult<T> = Result<T, GraphError>;

/// Hashable projection of a property value for index buckets
///
/// Keys are equal exactly when [`PropertyValue::matches`] holds, so a whole
/// float shares the bucket of the equal integer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum IndexKey {
    Text(String),
    Int(i64),
    Float(u64),
    Bool(bool),
    Null,
}

impl From<&PropertyValue> for IndexKey {
    fn from(value: &PropertyValue) -> Self {
        match value {
            PropertyValue::String(s) => IndexKey::Text(s.clone()),
            PropertyValue::Integer(i) => IndexKey::Int(*i),
            PropertyValue::Float(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => IndexKey::Int(*f as i64),
            // -0.0 and 0.0 are caught above
            PropertyValue::Float(f) => IndexKey::Float(f.to_bits()),
            PropertyValue::Boolean(b) => IndexKey::Bool(*b),
            PropertyValue::Null => IndexKey::Null,
        }
    }
}

type PropertyIndex = HashMap<IndexKey, Vec<NodeId>>;

/// In-memory graph storage
///
/// - nodes / edges: arenas, `NodeId(n)` lives at slot `n - 1`
/// - outgoing / incoming: adjacency lists per node slot
/// - label_index: Label -> nodes in creation order
/// - external_ids: unique `id` property -> NodeId
/// - property_indices: (Label, property) -> value -> nodes
#[derive(Debug, Default)]
pub struct GraphStore {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    outgoing: Vec<Vec<EdgeId>>,
    incoming: Vec<Vec<EdgeId>>,
    label_index: HashMap<Label, Vec<NodeId>>,
    edge_type_counts: HashMap<EdgeType, usize>,
    external_ids: HashMap<String, NodeId>,
    property_indices: HashMap<(Label, String), PropertyIndex>,
}

impl GraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a node with the given labels and properties.
    ///
    /// When the properties carry a string `id`, it must be unique in the store.
    pub fn create_node(&mut self, labels: Vec<Label>, properties: PropertyMap) -> GraphResult<NodeId> {
        let external_id = properties
            .get(EXTERNAL_ID_KEY)
            .and_then(|v| v.as_string())
            .map(str::to_string);

        if let Some(ext) = &external_id {
            if self.external_ids.contains_key(ext) {
                return Err(GraphError::DuplicateExternalId(ext.clone()));
            }
        }

        let node_id = NodeId::new(self.nodes.len() as u64 + 1);
        let node = Node::new(node_id, labels, properties);

        for label in &node.labels {
            self.label_index.entry(label.clone()).or_default().push(node_id);
            for (key, value) in &node.properties {
                if let Some(index) = self.property_indices.get_mut(&(label.clone(), key.clone())) {
                    index.entry(IndexKey::from(value)).or_default().push(node_id);
                }
            }
        }

        if let Some(ext) = external_id {
            self.external_ids.insert(ext, node_id);
        }

        self.nodes.push(node);
        self.outgoing.push(Vec::new());
        self.incoming.push(Vec::new());
        Ok(node_id)
    }

    /// Create a directed edge between two existing nodes
    pub fn create_edge(
        &mut self,
        source: NodeId,
        target: NodeId,
        edge_type: impl Into<EdgeType>,
    ) -> GraphResult<EdgeId> {
        if !self.has_node(source) {
            return Err(GraphError::InvalidEdgeSource(source));
        }
        if !self.has_node(target) {
            return Err(GraphError::InvalidEdgeTarget(target));
        }

        let edge_id = EdgeId::new(self.edges.len() as u64 + 1);
        let edge = Edge::new(edge_id, source, target, edge_type);

        *self.edge_type_counts.entry(edge.edge_type.clone()).or_insert(0) += 1;
        self.outgoing[Self::slot(source)].push(edge_id);
        self.incoming[Self::slot(target)].push(edge_id);
        self.edges.push(edge);
        Ok(edge_id)
    }

    fn slot(id: NodeId) -> usize {
        (id.as_u64() as usize).saturating_sub(1)
    }

    pub fn has_node(&self, id: NodeId) -> bool {
        id.as_u64() >= 1 && Self::slot(id) < self.nodes.len()
    }

    pub fn get_node(&self, id: NodeId) -> Option<&Node> {
        if id.as_u64() == 0 {
            return None;
        }
        self.nodes.get(Self::slot(id))
    }

    pub fn get_edge(&self, id: EdgeId) -> Option<&Edge> {
        if id.as_u64() == 0 {
            return None;
        }
        self.edges.get(id.as_u64() as usize - 1)
    }

    /// Look a node up by its external `id` property
    pub fn node_by_external_id(&self, external_id: &str) -> Option<&Node> {
        self.external_ids
            .get(external_id)
            .and_then(|&id| self.get_node(id))
    }

    pub fn outgoing(&self, node: NodeId) -> Vec<&Edge> {
        self.adjacent(&self.outgoing, node)
    }

    pub fn incoming(&self, node: NodeId) -> Vec<&Edge> {
        self.adjacent(&self.incoming, node)
    }

    fn adjacent<'a>(&'a self, lists: &'a [Vec<EdgeId>], node: NodeId) -> Vec<&'a Edge> {
        if !self.has_node(node) {
            return Vec::new();
        }
        lists[Self::slot(node)]
            .iter()
            .filter_map(|&id| self.get_edge(id))
            .collect()
    }

    /// All nodes carrying `label`, in creation order
    pub fn nodes_by_label(&self, label: &Label) -> Vec<&Node> {
        self.label_index
            .get(label)
            .map(|ids| ids.iter().filter_map(|&id| self.get_node(id)).collect())
            .unwrap_or_default()
    }

    /// Nodes with `label` whose `property` equals `value`.
    ///
    /// Served from a property index when one exists, otherwise by scanning
    /// the label.
    pub fn find_nodes(&self, label: &Label, property: &str, value: &PropertyValue) -> Vec<&Node> {
        if property == EXTERNAL_ID_KEY {
            if let PropertyValue::String(ext) = value {
                return self
                    .node_by_external_id(ext)
                    .filter(|n| n.has_label(label))
                    .into_iter()
                    .collect();
            }
        }

        if let Some(index) = self.property_indices.get(&(label.clone(), property.to_string())) {
            return index
                .get(&IndexKey::from(value))
                .map(|ids| ids.iter().filter_map(|&id| self.get_node(id)).collect())
                .unwrap_or_default();
        }

        self.nodes_by_label(label)
            .into_iter()
            .filter(|n| n.get_property(property).map_or(false, |v| v.matches(value)))
            .collect()
    }

    /// Register a secondary index on `(label, property)` and back-fill it
    pub fn create_index(&mut self, label: Label, property: impl Into<String>) -> GraphResult<()> {
        let property = property.into();
        let key = (label.clone(), property.clone());
        if self.property_indices.contains_key(&key) {
            return Err(GraphError::IndexAlreadyExists { label, property });
        }

        let mut index = PropertyIndex::new();
        for node in self.nodes_by_label(&label) {
            if let Some(value) = node.get_property(&property) {
                index.entry(IndexKey::from(value)).or_default().push(node.id);
            }
        }
        self.property_indices.insert(key, index);
        Ok(())
    }

    pub fn has_index(&self, label: &Label, property: &str) -> bool {
        self.property_indices.contains_key(&(label.clone(), property.to_string()))
    }

    /// Every label currently in use, sorted
    pub fn labels(&self) -> Vec<Label> {
        let mut labels: Vec<Label> = self
            .label_index
            .iter()
            .filter(|(_, ids)| !ids.is_empty())
            .map(|(label, _)| label.clone())
            .collect();
        labels.sort();
        labels
    }

    pub fn edge_type_count(&self, edge_type: &EdgeType) -> usize {
        self.edge_type_counts.get(edge_type).copied().unwrap_or(0)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn all_nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    pub fn all_edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.iter()
    }

    /// Remove every node and edge.
    ///
    /// Index definitions are kept (emptied), the way a database keeps its
    /// schema across `DETACH DELETE`.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.edges.clear();
        self.outgoing.clear();
        self.incoming.clear();
        self.label_index.clear();
        self.edge_type_counts.clear();
        self.external_ids.clear();
        for index in self.property_indices.values_mut() {
            index.clear();
        }
    }
}
