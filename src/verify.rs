//! Read-back verification of the generated scenarios
//!
//! Every check is a single aggregate read compared against the value the
//! scenario was built with. A mismatch is reported, never raised.

use crate::backend::{GraphBackend, ResultValue};
use crate::scenario::Catalog;
use serde::Serialize;
use std::fmt;
use tracing::{info, warn};

/// Value a check must produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Expected {
    Exactly(u64),
    AtLeast(u64),
    Flag(bool),
}

impl Expected {
    pub fn admits(&self, actual: &ResultValue) -> bool {
        match self {
            Expected::Exactly(n) => actual.as_integer() == Some(*n as i64),
            Expected::AtLeast(n) => actual.as_integer().map_or(false, |v| v >= *n as i64),
            Expected::Flag(flag) => actual.as_boolean() == Some(*flag),
        }
    }
}

impl fmt::Display for Expected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expected::Exactly(n) => write!(f, "{}", n),
            Expected::AtLeast(n) => write!(f, ">= {}", n),
            Expected::Flag(flag) => write!(f, "{}", flag),
        }
    }
}

/// Outcome of one check
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckResult {
    pub scenario: String,
    pub check: String,
    pub expected: String,
    pub actual: String,
    pub passed: bool,
}

fn render(value: &ResultValue) -> String {
    match value {
        ResultValue::Null => "null".to_string(),
        ResultValue::Scalar(v) => match value.as_integer() {
            Some(i) => i.to_string(),
            None => v.to_string(),
        },
        ResultValue::Node(node) => node.display_name(),
        ResultValue::Relationship(edge) => edge.rel_type.clone(),
    }
}

/// Run every check of every scenario in catalog order
pub async fn verify(backend: &dyn GraphBackend, catalog: &Catalog) -> Vec<CheckResult> {
    let mut results = Vec::new();
    for scenario in catalog.iter() {
        for check in &scenario.checks {
            let (actual, passed) = match backend.aggregate(&check.query).await {
                Ok(value) => (render(&value), check.expected.admits(&value)),
                Err(e) => {
                    warn!("Check '{}' failed to run: {}", check.label, e);
                    (e.truncated(), false)
                }
            };
            results.push(CheckResult {
                scenario: scenario.title.clone(),
                check: check.label.clone(),
                expected: check.expected.to_string(),
                actual,
                passed,
            });
        }
    }
    let passed = results.iter().filter(|r| r.passed).count();
    info!("Verification: {}/{} checks passed", passed, results.len());
    results
}
