//! Scenario 4: a shut-down mill reappearing under a new name
//!
//! Dr. Bernard's lost its license after confirmed fraud. Its attorney,
//! Michael Chen, keeps sending clients to Rapid Recovery Med, owned by a
//! former Bernard's employee.

use super::{file_assigned, fixed_date, ClaimAssignment, ClaimTemplate};
use crate::backend::GraphBackend;
use crate::error::FraudRingResult;
use crate::generator::session::GenerationSession;
use crate::model::{Attorney, ClaimStatus, Person, Provider, Rel, Role, ScenarioTag};
use tracing::info;

pub const TAG: ScenarioTag = ScenarioTag::NetworkMigration;

pub const BERNARD: &str = "PROV_S4_BERNARD";
pub const RAPID: &str = "PROV_S4_RAPID";
pub const CHEN: &str = "ATT_S4_CHEN";
pub const SIMMONS: &str = "P_S4_SIMMONS";

pub const BERNARD_CLAIMS: usize = 15;
pub const CHEN_AT_BERNARD: usize = 12;
pub const NEW_CLAIMS: usize = 34;
pub const RAPID_CLAIMS: usize = 28;

pub const CLAIMS: usize = BERNARD_CLAIMS + NEW_CLAIMS;

const BERNARD_TEMPLATE: ClaimTemplate = ClaimTemplate {
    scenario: TAG,
    claim_prefix: "CLM_S4_BER",
    person_prefix: "P_S4_BER",
    phone_prefix: "PH_S4",
    address_prefix: "ADDR_S4",
    name: "Auto Claim - FRAUD CONFIRMED",
    incidents: &["Staged Accident"],
    status: ClaimStatus::Denied,
    fraud_type: Some("Medical Mill"),
    amount: (18000.0, 40000.0),
    window: (420, 180),
    location: None,
    claimant_fraud: Some(true),
};

const NEW_TEMPLATE: ClaimTemplate = ClaimTemplate {
    scenario: TAG,
    claim_prefix: "CLM_S4_NEW",
    person_prefix: "P_S4_NEW",
    phone_prefix: "PH_S4",
    address_prefix: "ADDR_S4",
    name: "Auto Claim - Soft Tissue",
    incidents: &["Rear-End Collision"],
    status: ClaimStatus::Open,
    fraud_type: None,
    amount: (15000.0, 38000.0),
    window: (120, 0),
    location: None,
    claimant_fraud: None,
};

/// Claim `index` of the confirmed-fraud batch at Bernard's
pub fn allocate_closed(index: usize) -> ClaimAssignment {
    ClaimAssignment {
        provider: Some(BERNARD.to_string()),
        attorney: (index < CHEN_AT_BERNARD).then(|| CHEN.to_string()),
        ..ClaimAssignment::default()
    }
}

/// Claim `index` of Chen's new clients after the shutdown
pub fn allocate_new(index: usize) -> ClaimAssignment {
    ClaimAssignment {
        provider: (index < RAPID_CLAIMS).then(|| RAPID.to_string()),
        attorney: Some(CHEN.to_string()),
        ..ClaimAssignment::default()
    }
}

pub async fn generate(session: &mut GenerationSession, backend: &dyn GraphBackend) -> FraudRingResult<usize> {
    let bernard = Provider {
        closed: Some(fixed_date("2025-07-15")?),
        status: "License Revoked".to_string(),
        is_fraud: Some(true),
        fraud_type: Some("Medical Mill - Confirmed".to_string()),
        scenario: Some(TAG),
        ..Provider::active(BERNARD, "Dr. Bernard's Auto Injury Center", "MED-S4-REVOKED", fixed_date("2020-03-01")?)
    };
    let bernard_ref = bernard.node_ref();
    backend.create(bernard.into()).await?;

    let chen = Attorney {
        id: CHEN.to_string(),
        name: "Michael Chen".to_string(),
        bar_number: "BAR-321654".to_string(),
        scenario: Some(TAG),
    };
    backend.create(chen.into()).await?;

    for index in 0..BERNARD_CLAIMS {
        file_assigned(session, backend, &BERNARD_TEMPLATE, &allocate_closed(index)).await?;
    }

    let simmons = Person {
        role: Some("Owner".to_string()),
        job_title: Some("Medical Director / Owner".to_string()),
        scenario: Some(TAG),
        ..Person::new(SIMMONS, "Dr. Patricia Simmons")
    }
    .with_role(Role::Employee);
    let rapid = Provider {
        scenario: Some(TAG),
        ..Provider::active(RAPID, "Rapid Recovery Med", "MED-S4-RAPID001", fixed_date("2025-09-15")?)
    };
    let (simmons_ref, rapid_ref) = (simmons.node_ref(), rapid.node_ref());
    backend.create(simmons.into()).await?;
    backend.create(rapid.into()).await?;
    backend.connect(&simmons_ref, Rel::FormerEmployeeOf, &bernard_ref).await?;
    backend.connect(&rapid_ref, Rel::OwnedBy, &simmons_ref).await?;
    backend.connect(&rapid_ref, Rel::Employs, &simmons_ref).await?;

    for index in 0..NEW_CLAIMS {
        file_assigned(session, backend, &NEW_TEMPLATE, &allocate_new(index)).await?;
    }

    info!(
        "Scenario 4: {} fraud claims at Bernard's, {} new Chen claims ({} at Rapid)",
        BERNARD_CLAIMS, NEW_CLAIMS, RAPID_CLAIMS
    );
    Ok(CLAIMS)
}
