//! Graph store adapters
//!
//! The generator, walkthroughs and verification only see [`GraphBackend`].
//! Two implementations exist: the in-process [`EmbeddedBackend`] and the
//! HTTP [`RemoteBackend`] for a Neo4j-compatible server.

pub mod client;
pub mod embedded;
pub mod models;
pub mod remote;

pub use client::{GraphBackend, IndexSpec};
pub use embedded::EmbeddedBackend;
pub use models::{EntitySummary, GraphStats, QueryResult, ResultEdge, ResultNode, ResultValue};
pub use remote::RemoteBackend;
