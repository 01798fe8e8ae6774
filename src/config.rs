//! Store and generator configuration

use crate::backend::{EmbeddedBackend, GraphBackend, RemoteBackend};
use crate::error::{FraudRingError, FraudRingResult};
use std::sync::Arc;
use tracing::info;

/// URI scheme of the in-process store
pub const EMBEDDED_SCHEME: &str = "mem://";

/// Default database name on a remote server
pub const DEFAULT_DATABASE: &str = "neo4j";

/// Where the graph lives and how to authenticate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// `mem://` for the embedded store, `http(s)://host:port` for a server
    pub uri: String,
    pub user: Option<String>,
    pub password: Option<String>,
    pub database: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            uri: EMBEDDED_SCHEME.to_string(),
            user: None,
            password: None,
            database: DEFAULT_DATABASE.to_string(),
        }
    }
}

fn required(value: &Option<String>, what: &str) -> FraudRingResult<String> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(FraudRingError::ConfigError(format!(
            "{} is required for a remote store",
            what
        ))),
    }
}

impl StoreConfig {
    pub fn is_embedded(&self) -> bool {
        self.uri.trim().starts_with(EMBEDDED_SCHEME)
    }

    /// Build the backend named by the URI without contacting it
    pub fn backend(&self) -> FraudRingResult<Arc<dyn GraphBackend>> {
        let uri = self.uri.trim();
        if uri.is_empty() {
            return Err(FraudRingError::ConfigError("store URI is missing".into()));
        }
        if self.is_embedded() {
            return Ok(Arc::new(EmbeddedBackend::new()));
        }
        if uri.starts_with("http://") || uri.starts_with("https://") {
            let user = required(&self.user, "user")?;
            let password = required(&self.password, "password")?;
            if self.database.trim().is_empty() {
                return Err(FraudRingError::ConfigError("database name is empty".into()));
            }
            return Ok(Arc::new(RemoteBackend::new(uri, self.database.trim(), &user, &password)));
        }
        Err(FraudRingError::ConfigError(format!(
            "unsupported store URI '{}' (expected mem:// or http(s)://)",
            uri
        )))
    }

    /// Build the backend and check that it answers
    pub async fn connect(&self) -> FraudRingResult<Arc<dyn GraphBackend>> {
        let backend = self.backend()?;
        backend.ping().await?;
        info!("Connected to {}", backend.describe());
        Ok(backend)
    }
}

/// Inclusive bounds on how many claims one pool member receives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Band {
    pub min: usize,
    pub max: usize,
}

impl Band {
    pub const fn new(min: usize, max: usize) -> Self {
        Self { min, max }
    }

    /// True when `claims` can be spread over `members` inside the band
    pub fn admits(&self, members: usize, claims: usize) -> bool {
        self.min <= self.max && members * self.min <= claims && claims <= members * self.max
    }
}

/// Pool sizes, rates and randomness of one generation run
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorConfig {
    /// Seed for reproducible runs; entropy when `None`
    pub seed: Option<u64>,
    pub adjusters: usize,
    pub providers: usize,
    pub attorneys: usize,
    pub body_shops: usize,
    pub locations: usize,
    pub background_claims: usize,
    /// Share of background claims with an attorney
    pub attorney_rate: f64,
    pub body_shop_rate: f64,
    pub witness_rate: f64,
    /// Share of background claimants who share an address with a spouse
    pub couple_rate: f64,
    pub provider_band: Band,
    pub attorney_band: Band,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            seed: None,
            adjusters: 15,
            providers: 25,
            attorneys: 12,
            body_shops: 8,
            locations: 20,
            background_claims: 150,
            attorney_rate: 0.30,
            body_shop_rate: 0.40,
            witness_rate: 0.60,
            couple_rate: 0.05,
            provider_band: Band::new(3, 8),
            attorney_band: Band::new(2, 6),
        }
    }
}

impl GeneratorConfig {
    pub fn seeded(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Self::default()
        }
    }

    /// Background claims that get an attorney
    pub fn represented_claims(&self) -> usize {
        (self.background_claims as f64 * self.attorney_rate).round() as usize
    }

    /// Background claimants living with the previous claimant
    pub fn couples(&self) -> usize {
        (self.background_claims as f64 * self.couple_rate).floor() as usize
    }

    pub fn validate(&self) -> FraudRingResult<()> {
        for (name, rate) in [
            ("attorney_rate", self.attorney_rate),
            ("body_shop_rate", self.body_shop_rate),
            ("witness_rate", self.witness_rate),
            ("couple_rate", self.couple_rate),
        ] {
            if !(0.0..=1.0).contains(&rate) {
                return Err(FraudRingError::ConfigError(format!("{} must lie in [0, 1], got {}", name, rate)));
            }
        }
        for (name, size) in [
            ("adjusters", self.adjusters),
            ("providers", self.providers),
            ("body_shops", self.body_shops),
            ("locations", self.locations),
        ] {
            if size == 0 {
                return Err(FraudRingError::ConfigError(format!("{} pool is empty", name)));
            }
        }
        if !self.provider_band.admits(self.providers, self.background_claims) {
            return Err(FraudRingError::ConfigError(format!(
                "{} claims cannot be spread over {} providers with {}..={} claims each",
                self.background_claims, self.providers, self.provider_band.min, self.provider_band.max
            )));
        }
        let represented = self.represented_claims();
        if represented > 0 && !self.attorney_band.admits(self.attorneys, represented) {
            return Err(FraudRingError::ConfigError(format!(
                "{} represented claims cannot be spread over {} attorneys with {}..={} clients each",
                represented, self.attorneys, self.attorney_band.min, self.attorney_band.max
            )));
        }
        if self.couples() * 2 > self.background_claims {
            return Err(FraudRingError::ConfigError("too many couples for the claim count".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_generator_config_is_feasible() {
        let config = GeneratorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.represented_claims(), 45);
        assert_eq!(config.couples(), 7);
    }

    #[test]
    fn test_infeasible_provider_band_rejected() {
        let config = GeneratorConfig {
            providers: 15,
            ..GeneratorConfig::default()
        };
        assert!(matches!(config.validate(), Err(FraudRingError::ConfigError(_))));
    }

    #[test]
    fn test_rates_checked() {
        let config = GeneratorConfig {
            witness_rate: 1.5,
            ..GeneratorConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_store_uri_selection() {
        assert!(StoreConfig::default().backend().is_ok());

        let missing = StoreConfig {
            uri: "  ".into(),
            ..StoreConfig::default()
        };
        assert!(matches!(missing.backend(), Err(FraudRingError::ConfigError(_))));

        let bolt = StoreConfig {
            uri: "bolt://localhost:7687".into(),
            ..StoreConfig::default()
        };
        assert!(matches!(bolt.backend(), Err(FraudRingError::ConfigError(_))));

        let no_password = StoreConfig {
            uri: "http://localhost:7474".into(),
            user: Some("neo4j".into()),
            ..StoreConfig::default()
        };
        let err = no_password.backend().err().unwrap();
        assert!(err.is_fatal());

        let remote = StoreConfig {
            uri: "http://localhost:7474".into(),
            user: Some("neo4j".into()),
            password: Some("secret".into()),
            ..StoreConfig::default()
        };
        assert_eq!(
            remote.backend().unwrap().describe(),
            "http://localhost:7474/db/neo4j/tx/commit"
        );
    }

    #[tokio::test]
    async fn test_embedded_connect() {
        let backend = StoreConfig::default().connect().await.unwrap();
        assert_eq!(backend.stats().await.unwrap().total_nodes, 0);
    }
}
