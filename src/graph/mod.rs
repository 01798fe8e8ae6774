//! Embedded property graph
//!
//! Nodes with multiple labels and properties, directed typed edges, and
//! in-memory storage with label, external-id and property indices. Backs
//! the embedded store adapter and every test in the crate.

pub mod edge;
pub mod node;
pub mod property;
pub mod store;
pub mod types;

pub use edge::Edge;
pub use node::{Node, EXTERNAL_ID_KEY};
pub use property::{PropertyMap, PropertyValue};
pub use store::{GraphError, GraphResult, GraphStore};
pub use types::{EdgeId, EdgeType, Label, NodeId};
