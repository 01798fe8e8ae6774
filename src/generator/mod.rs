//! Synthetic claims-graph generator
//!
//! [`Generator::generate_all`] wipes the store and rebuilds it in a fixed
//! order: indexes, reference pools, background claims, then the scenarios,
//! each of which references entities created by the steps before it.

pub mod background;
pub mod names;
pub mod scenarios;
pub mod session;

use crate::backend::{GraphBackend, IndexSpec};
use crate::config::GeneratorConfig;
use crate::error::{FraudRingError, FraudRingResult};
use crate::model::Kind;
use chrono::{Local, NaiveDate};
use indexmap::IndexMap;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

pub use background::BoundedPicker;
pub use scenarios::ClaimAssignment;
pub use session::GenerationSession;

/// Claims created per generation step, in creation order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct GenerationStats(IndexMap<String, usize>);

impl GenerationStats {
    pub fn record(&mut self, step: &str, claims: usize) {
        self.0.insert(step.to_string(), claims);
    }

    pub fn get(&self, step: &str) -> Option<usize> {
        self.0.get(step).copied()
    }

    pub fn total(&self) -> usize {
        self.0.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

/// Indexes created before any data; the `id` of every kind plus phone numbers
pub fn index_specs() -> Vec<IndexSpec> {
    let mut specs: Vec<IndexSpec> = Kind::ALL.iter().map(|k| IndexSpec::new(k.as_str(), "id")).collect();
    specs.push(IndexSpec::new(Kind::Phone.as_str(), "number"));
    specs
}

/// Rebuilds the demo graph on a backend
pub struct Generator {
    backend: Arc<dyn GraphBackend>,
    config: GeneratorConfig,
    today: NaiveDate,
    running: Mutex<()>,
}

impl Generator {
    pub fn new(backend: Arc<dyn GraphBackend>, config: GeneratorConfig) -> Self {
        Self {
            backend,
            config,
            today: Local::now().date_naive(),
            running: Mutex::new(()),
        }
    }

    /// Pin the date relative windows are measured from
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Clear the store and regenerate every entity
    ///
    /// Concurrent calls run one after another. Any failed write aborts the
    /// run; the next call starts again from a cleared store.
    pub async fn generate_all(&self) -> FraudRingResult<GenerationStats> {
        self.config.validate()?;
        let _guard = self.running.lock().await;
        let backend = self.backend.as_ref();

        info!("Clearing {}", backend.describe());
        backend.clear().await?;

        create_indexes(backend).await?;

        let mut session = GenerationSession::new(self.config.seed, self.today, &scenarios::RESERVED_PHONES);
        let mut stats = GenerationStats::default();

        background::create_pools(&mut session, backend, &self.config).await?;
        let claims = background::generate_background(&mut session, backend, &self.config).await?;
        stats.record("background_claims", claims);

        stats.record(
            "scenario_1_claims",
            scenarios::captive_mill::generate(&mut session, backend).await?,
        );
        stats.record(
            "scenario_2_claims",
            scenarios::identity_web::generate(&mut session, backend).await?,
        );
        stats.record(
            "scenario_3a_claims",
            scenarios::provider_audit::generate(&mut session, backend).await?,
        );
        stats.record(
            "scenario_3b_claims",
            scenarios::city_general::generate(&mut session, backend).await?,
        );
        stats.record(
            "scenario_4_claims",
            scenarios::network_migration::generate(&mut session, backend).await?,
        );

        info!("Generation complete: {} claims", stats.total());
        Ok(stats)
    }
}

async fn create_indexes(backend: &dyn GraphBackend) -> FraudRingResult<()> {
    for spec in index_specs() {
        match backend.create_index(&spec).await {
            Ok(()) => debug!("Created index {}", spec.name()),
            Err(FraudRingError::IndexExists(name)) => debug!("Index {} already exists", name),
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_keep_order() {
        let mut stats = GenerationStats::default();
        stats.record("background_claims", 150);
        stats.record("scenario_1_claims", 47);
        assert_eq!(stats.total(), 197);
        assert_eq!(stats.get("scenario_1_claims"), Some(47));
        let keys: Vec<&str> = stats.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["background_claims", "scenario_1_claims"]);
        assert_eq!(
            serde_json::to_string(&stats).unwrap(),
            r#"{"background_claims":150,"scenario_1_claims":47}"#
        );
    }

    #[test]
    fn test_index_specs() {
        let names: Vec<String> = index_specs().iter().map(IndexSpec::name).collect();
        assert_eq!(names.len(), 9);
        assert!(names.contains(&"claim_id".to_string()));
        assert!(names.contains(&"phone_number".to_string()));
    }
}
