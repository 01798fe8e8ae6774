//! Walkthrough catalog
//!
//! The investigation narratives are data: an embedded YAML document lists
//! every scenario with its ordered steps, each bound to one read-only
//! [`GraphQuery`]. The verification contract of a scenario is not part of
//! the document; it is derived from the generator's constants (see
//! [`checks`]) and attached when the catalog loads.

pub mod checks;

use crate::backend::{GraphBackend, QueryResult};
use crate::error::{FraudRingError, FraudRingResult};
use crate::model::ScenarioTag;
use crate::query::GraphQuery;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub use checks::Check;

const WALKTHROUGHS: &str = include_str!("../../scenarios/walkthroughs.yaml");

/// Entity a walkthrough starts from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartingEntity {
    pub label: String,
    pub id: String,
    pub name: String,
}

/// One point in a narrative, bound to one query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepDescriptor {
    pub title: String,
    pub narrative: String,
    /// How long the same finding takes without a graph
    pub traditional: String,
    #[serde(default)]
    pub discovery: Option<String>,
    pub query: GraphQuery,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conclusion {
    pub exposure: String,
    pub traditional_time: String,
    pub graph_time: String,
    pub key_finding: String,
    #[serde(default)]
    pub action_items: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioDescriptor {
    pub id: u8,
    pub tag: ScenarioTag,
    pub title: String,
    pub subtitle: String,
    pub anchor: StartingEntity,
    pub trigger: String,
    pub steps: Vec<StepDescriptor>,
    pub conclusion: Conclusion,
    /// Verification contract, derived in code
    #[serde(skip)]
    pub checks: Vec<Check>,
}

impl ScenarioDescriptor {
    pub fn step(&self, index: usize) -> Option<&StepDescriptor> {
        self.steps.get(index)
    }

    fn validate(&self) -> FraudRingResult<()> {
        if self.steps.is_empty() {
            return Err(FraudRingError::ConfigError(format!("scenario {} has no steps", self.id)));
        }
        for (index, step) in self.steps.iter().enumerate() {
            step.query.validate().map_err(|e| {
                FraudRingError::ConfigError(format!("scenario {} step {}: {}", self.id, index, e))
            })?;
        }
        Ok(())
    }
}

/// Ordered scenario descriptors
#[derive(Debug, Clone)]
pub struct Catalog {
    scenarios: Vec<ScenarioDescriptor>,
}

impl Catalog {
    /// The built-in walkthroughs
    pub fn load() -> FraudRingResult<Self> {
        Self::from_yaml(WALKTHROUGHS)
    }

    /// Parse walkthroughs and attach each scenario's checks
    pub fn from_yaml(text: &str) -> FraudRingResult<Self> {
        let mut scenarios: Vec<ScenarioDescriptor> = serde_yaml::from_str(text)?;
        for scenario in &mut scenarios {
            scenario.validate()?;
            scenario.checks = checks::for_scenario(scenario.id);
            debug!(
                "Loaded scenario {} '{}' ({} steps, {} checks)",
                scenario.id,
                scenario.title,
                scenario.steps.len(),
                scenario.checks.len()
            );
        }
        let mut ids: Vec<u8> = scenarios.iter().map(|s| s.id).collect();
        ids.sort_unstable();
        ids.dedup();
        if ids.len() != scenarios.len() {
            return Err(FraudRingError::ConfigError("duplicate scenario id in catalog".into()));
        }
        Ok(Self { scenarios })
    }

    pub fn get(&self, id: u8) -> Option<&ScenarioDescriptor> {
        self.scenarios.iter().find(|s| s.id == id)
    }

    /// Mutable access, e.g. to extend a scenario's checks
    pub fn get_mut(&mut self, id: u8) -> Option<&mut ScenarioDescriptor> {
        self.scenarios.iter_mut().find(|s| s.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScenarioDescriptor> {
        self.scenarios.iter()
    }

    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }

    /// Start a walkthrough of scenario `id`
    pub fn walkthrough(&self, id: u8) -> FraudRingResult<Walkthrough<'_>> {
        self.get(id)
            .map(Walkthrough::new)
            .ok_or_else(|| FraudRingError::QueryError(format!("unknown scenario {}", id)))
    }
}

/// Cursor over the steps of one scenario
#[derive(Debug, Clone)]
pub struct Walkthrough<'a> {
    scenario: &'a ScenarioDescriptor,
    position: usize,
}

impl<'a> Walkthrough<'a> {
    pub fn new(scenario: &'a ScenarioDescriptor) -> Self {
        Self { scenario, position: 0 }
    }

    pub fn scenario(&self) -> &'a ScenarioDescriptor {
        self.scenario
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn current(&self) -> &'a StepDescriptor {
        &self.scenario.steps[self.position]
    }

    /// Advance one step; `None` when already on the last
    pub fn next(&mut self) -> Option<&'a StepDescriptor> {
        if self.is_complete() {
            return None;
        }
        self.position += 1;
        Some(self.current())
    }

    /// Go back one step; `None` when already on the first
    pub fn previous(&mut self) -> Option<&'a StepDescriptor> {
        if self.position == 0 {
            return None;
        }
        self.position -= 1;
        Some(self.current())
    }

    pub fn reset(&mut self) {
        self.position = 0;
    }

    /// Jump to step `index` (0-based); `None` leaves the cursor where it was
    pub fn seek(&mut self, index: usize) -> Option<&'a StepDescriptor> {
        let step = self.scenario.step(index)?;
        self.position = index;
        Some(step)
    }

    /// True on the last step, where the conclusion is shown
    pub fn is_complete(&self) -> bool {
        self.position + 1 >= self.scenario.steps.len()
    }

    /// Run the current step's query
    pub async fn run(&self, backend: &dyn GraphBackend) -> FraudRingResult<QueryResult> {
        backend.query(&self.current().query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog_loads() {
        let catalog = Catalog::load().unwrap();
        assert_eq!(catalog.len(), 4);
        let ids: Vec<u8> = catalog.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);

        let mill = catalog.get(1).unwrap();
        assert_eq!(mill.tag, ScenarioTag::CaptiveMill);
        assert_eq!(mill.anchor.id, "ATT_S1_WEBB");
        assert_eq!(mill.steps.len(), 7);
        assert!(mill.steps[0].discovery.is_none());
        assert!(mill.steps[1].discovery.as_deref().unwrap().starts_with("**47 claimants"));
        assert!(!mill.checks.is_empty());
        assert!(catalog.iter().all(|s| !s.checks.is_empty()));
    }

    #[test]
    fn test_walkthrough_cursor() {
        let catalog = Catalog::load().unwrap();
        let mut walk = catalog.walkthrough(2).unwrap();
        assert_eq!(walk.current().title, "Starting Point: Phone Number Alert");
        assert!(walk.previous().is_none());

        let steps = walk.scenario().steps.len();
        for _ in 1..steps {
            assert!(walk.next().is_some());
        }
        assert!(walk.is_complete());
        assert!(walk.next().is_none());
        assert_eq!(walk.position(), steps - 1);

        assert!(walk.previous().is_some());
        assert!(!walk.is_complete());
        walk.reset();
        assert_eq!(walk.position(), 0);

        let last = walk.seek(steps - 1).unwrap().title.clone();
        assert_eq!(walk.current().title, last);
        assert!(walk.seek(steps).is_none());
        assert_eq!(walk.position(), steps - 1);
    }

    #[test]
    fn test_unknown_scenario() {
        let catalog = Catalog::load().unwrap();
        assert!(catalog.walkthrough(9).is_err());
    }

    #[test]
    fn test_invalid_step_query_rejected() {
        let yaml = r#"
- id: 1
  tag: scenario_1
  title: Broken
  subtitle: Broken
  anchor: { label: Attorney, id: X, name: X }
  trigger: x
  steps:
    - title: bad
      narrative: x
      traditional: x
      query: { neighborhood: { label: Attorney, id: X, hops: 9 } }
  conclusion: { exposure: x, traditional_time: x, graph_time: x, key_finding: x }
"#;
        let err = Catalog::from_yaml(yaml).unwrap_err();
        assert!(matches!(err, FraudRingError::ConfigError(_)));
    }
}
