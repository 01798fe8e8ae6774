//! Fraud ring demo graph
//!
//! Builds a synthetic auto-insurance claims graph with four hand-crafted
//! fraud scenarios hidden among randomised legitimate claims, and walks an
//! investigator through each scenario one read-only query at a time.
//!
//! # Layout
//!
//! - [`graph`]: in-process property graph used by the embedded backend
//! - [`backend`]: the store adapter trait, embedded and remote (Neo4j HTTP)
//! - [`query`]: the fixed read-only pattern and aggregate queries
//! - [`model`]: typed claims-graph entities
//! - [`generator`]: background noise and the scenario builders
//! - [`scenario`]: walkthrough catalog and step cursor
//! - [`verify`]: read-back checks against each scenario's design counts
//! - [`view`]: styled nodes and edges for a graph widget
//!
//! ## Example Usage
//!
//! ```no_run
//! use fraudring::{Catalog, GeneratorConfig, Generator, StoreConfig};
//!
//! # async fn run() -> fraudring::FraudRingResult<()> {
//! let backend = StoreConfig::default().connect().await?;
//! let stats = Generator::new(backend.clone(), GeneratorConfig::seeded(7)).generate_all().await?;
//! assert_eq!(stats.get("scenario_1_claims"), Some(47));
//!
//! let catalog = Catalog::load()?;
//! for result in fraudring::verify(backend.as_ref(), &catalog).await {
//!     println!("{} / {}: {}", result.scenario, result.check, result.passed);
//! }
//! # Ok(())
//! # }
//! ```

#![warn(clippy::all)]

pub mod backend;
pub mod config;
pub mod error;
pub mod generator;
pub mod graph;
pub mod model;
pub mod query;
pub mod scenario;
pub mod verify;
pub mod view;

pub use backend::{EmbeddedBackend, GraphBackend, QueryResult, RemoteBackend, ResultNode, ResultValue};
pub use config::{GeneratorConfig, StoreConfig};
pub use error::{FraudRingError, FraudRingResult};
pub use generator::{GenerationStats, Generator};
pub use query::{AggregateQuery, GraphQuery};
pub use scenario::{Catalog, ScenarioDescriptor, StepDescriptor, Walkthrough};
pub use verify::{verify, CheckResult, Expected};
pub use view::GraphView;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get version string
pub fn version() -> &'static str {
    VERSION
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert_eq!(version(), "0.3.0");
    }
}
