//! Hand-crafted fraud scenarios and the legitimate contrast
//!
//! Each scenario assigns its claims through a pure `allocate` function so
//! that the counts asserted by verification hold by construction.

pub mod captive_mill;
pub mod city_general;
pub mod identity_web;
pub mod network_migration;
pub mod provider_audit;

use super::session::{ClaimPlan, ClaimantPlan, GenerationSession, Household};
use crate::backend::GraphBackend;
use crate::error::{FraudRingError, FraudRingResult};
use crate::model::{ClaimStatus, Kind, NodeRef, Rel, ScenarioTag, DATE_FORMAT};
use chrono::NaiveDate;
use rand::seq::SliceRandom;

/// Phone numbers owned by scenarios; never generated at random
pub const RESERVED_PHONES: [&str; 3] = [
    identity_web::MAIN_NUMBER,
    identity_web::ALT_NUMBER,
    provider_audit::SHARED_NUMBER,
];

/// Where one scenario claim goes
///
/// `None` falls back to a random background provider, no attorney, no
/// witness, and a fresh phone or home respectively.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClaimAssignment {
    pub provider: Option<String>,
    pub attorney: Option<String>,
    pub witness: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// Attributes shared by every claim of one scenario batch
#[derive(Debug, Clone)]
pub(crate) struct ClaimTemplate {
    pub scenario: ScenarioTag,
    pub claim_prefix: &'static str,
    pub person_prefix: &'static str,
    pub phone_prefix: &'static str,
    pub address_prefix: &'static str,
    pub name: &'static str,
    pub incidents: &'static [&'static str],
    pub status: ClaimStatus,
    /// Marks the claim fraudulent when set
    pub fraud_type: Option<&'static str>,
    pub amount: (f64, f64),
    /// Days before today, oldest first
    pub window: (i64, i64),
    pub location: Option<&'static str>,
    pub claimant_fraud: Option<bool>,
}

/// A filed scenario claim and the household behind it
#[derive(Debug, Clone)]
pub(crate) struct FiledClaim {
    pub claim: NodeRef,
    pub claimant: Household,
}

pub(crate) fn fixed_date(text: &str) -> FraudRingResult<NaiveDate> {
    NaiveDate::parse_from_str(text, DATE_FORMAT)
        .map_err(|e| FraudRingError::ConfigError(format!("bad scenario date '{}': {}", text, e)))
}

/// Create a claimant and claim wired as `assignment` says
pub(crate) async fn file_assigned(
    session: &mut GenerationSession,
    backend: &dyn GraphBackend,
    template: &ClaimTemplate,
    assignment: &ClaimAssignment,
) -> FraudRingResult<FiledClaim> {
    let claimant = session
        .create_claimant(
            backend,
            ClaimantPlan {
                person_prefix: template.person_prefix,
                phone_prefix: template.phone_prefix,
                address_prefix: template.address_prefix,
                scenario: Some(template.scenario),
                is_fraud: template.claimant_fraud,
                phone: assignment.phone.as_deref().map(|id| NodeRef::new(Kind::Phone, id)),
                address: assignment.address.as_deref().map(|id| NodeRef::new(Kind::Address, id)),
                ..ClaimantPlan::default()
            },
        )
        .await?;

    let provider = match &assignment.provider {
        Some(id) => NodeRef::new(Kind::Provider, id),
        None => session.pick_provider()?,
    };
    let incident = template
        .incidents
        .choose(session.rng())
        .copied()
        .unwrap_or("Rear-End Collision");
    let plan = ClaimPlan {
        id_prefix: template.claim_prefix,
        name: template.name.to_string(),
        amount: session.amount(template.amount.0, template.amount.1),
        date: session.date_between(template.window.0, template.window.1),
        incident_type: incident.to_string(),
        status: template.status,
        is_fraud: template.fraud_type.is_some(),
        fraud_type: template.fraud_type.map(str::to_string),
        scenario: Some(template.scenario),
        claimant: claimant.person.clone(),
        provider,
        location: template.location.map(|id| NodeRef::new(Kind::Location, id)),
    };
    let claim = session.file_claim(backend, plan).await?;

    if let Some(attorney) = &assignment.attorney {
        backend
            .connect(&claim, Rel::RepresentedBy, &NodeRef::new(Kind::Attorney, attorney))
            .await?;
    }
    if let Some(witness) = &assignment.witness {
        backend
            .connect(&claim, Rel::WitnessedBy, &NodeRef::new(Kind::Person, witness))
            .await?;
    }
    Ok(FiledClaim { claim, claimant })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_reserved_phones_distinct() {
        let unique: HashSet<&str> = RESERVED_PHONES.iter().copied().collect();
        assert_eq!(unique.len(), RESERVED_PHONES.len());
    }

    #[test]
    fn test_fixed_date() {
        assert_eq!(fixed_date("2024-01-15").unwrap().to_string(), "2024-01-15");
        assert!(matches!(fixed_date("15/01/2024"), Err(FraudRingError::ConfigError(_))));
    }
}
