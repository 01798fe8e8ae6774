//! Scenario 1: an attorney feeding two clinics run by his household
//!
//! J. Marcus Webb represents every claim. His wife Linda is the registered
//! agent of both clinics, which share one business address. Maria Santos
//! works at Peak and as Webb's paralegal, witnesses the first claims, and
//! lives with James Rivera, billing manager at Wellness.

use super::{file_assigned, fixed_date, ClaimAssignment, ClaimTemplate};
use crate::backend::GraphBackend;
use crate::error::FraudRingResult;
use crate::generator::session::GenerationSession;
use crate::model::{Address, AddressType, Attorney, ClaimStatus, Person, Provider, Rel, Role, ScenarioTag};
use tracing::info;

pub const TAG: ScenarioTag = ScenarioTag::CaptiveMill;

pub const WEBB: &str = "ATT_S1_WEBB";
pub const LINDA: &str = "P_S1_LINDA";
pub const MARIA: &str = "P_S1_MARIA";
pub const JAMES: &str = "P_S1_JAMES";
pub const WELLNESS: &str = "PROV_S1_WELLNESS";
pub const PEAK: &str = "PROV_S1_PEAK";
pub const BUSINESS_ADDRESS: &str = "ADDR_S1_BIZ";
pub const HOME_ADDRESS: &str = "ADDR_S1_HOME";

pub const CLAIMS: usize = 47;
pub const WELLNESS_CLAIMS: usize = 22;
pub const PEAK_CLAIMS: usize = 19;
pub const MARIA_WITNESSED: usize = 8;

/// Claims at Webb's two clinics
pub const CLINIC_CLAIMS: usize = WELLNESS_CLAIMS + PEAK_CLAIMS;

const TEMPLATE: ClaimTemplate = ClaimTemplate {
    scenario: TAG,
    claim_prefix: "CLM_S1",
    person_prefix: "P_S1_CLM",
    phone_prefix: "PH_S1",
    address_prefix: "ADDR_S1_CLM",
    name: "Auto Claim - Soft Tissue Injury",
    incidents: &["Rear-End Collision"],
    status: ClaimStatus::Open,
    fraud_type: None,
    amount: (15000.0, 45000.0),
    window: (180, 0),
    location: None,
    claimant_fraud: None,
};

pub fn allocate(index: usize) -> ClaimAssignment {
    let provider = if index < WELLNESS_CLAIMS {
        Some(WELLNESS)
    } else if index < CLINIC_CLAIMS {
        Some(PEAK)
    } else {
        None
    };
    ClaimAssignment {
        provider: provider.map(String::from),
        attorney: Some(WEBB.to_string()),
        witness: (index < MARIA_WITNESSED).then(|| MARIA.to_string()),
        ..ClaimAssignment::default()
    }
}

fn atlanta(id: &str, street: &str, unit: &str, zip: &str, kind: AddressType) -> Address {
    Address {
        id: id.to_string(),
        street: street.to_string(),
        unit: Some(unit.to_string()),
        city: "Atlanta".to_string(),
        state: "GA".to_string(),
        zip: zip.to_string(),
        kind,
        shared_by: None,
        scenario: Some(TAG),
    }
}

async fn create_ring(backend: &dyn GraphBackend) -> FraudRingResult<()> {
    let webb = Attorney {
        id: WEBB.to_string(),
        name: "J. Marcus Webb".to_string(),
        bar_number: "BAR-789456".to_string(),
        scenario: Some(TAG),
    };
    let linda = Person {
        role: Some("Registered Agent".to_string()),
        job_title: Some("Registered Agent".to_string()),
        scenario: Some(TAG),
        ..Person::new(LINDA, "Linda Webb")
    }
    .with_role(Role::Employee);
    let (webb_ref, linda_ref) = (webb.node_ref(), linda.node_ref());
    backend.create(webb.into()).await?;
    backend.create(linda.into()).await?;
    backend.connect(&webb_ref, Rel::MarriedTo, &linda_ref).await?;

    let office = atlanta(BUSINESS_ADDRESS, "1847 Commerce Boulevard", "Suite 200", "30309", AddressType::Business);
    let office_ref = office.node_ref();
    backend.create(office.into()).await?;

    let wellness = Provider {
        scenario: Some(TAG),
        ..Provider::active(WELLNESS, "Wellness Partners Medical", "MED-S1-001", fixed_date("2024-01-15")?)
    };
    let peak = Provider {
        scenario: Some(TAG),
        ..Provider::active(PEAK, "Peak Recovery Clinic", "MED-S1-002", fixed_date("2024-04-01")?)
    };
    let (wellness_ref, peak_ref) = (wellness.node_ref(), peak.node_ref());
    backend.create(wellness.into()).await?;
    backend.create(peak.into()).await?;
    for clinic in [&wellness_ref, &peak_ref] {
        backend.connect(clinic, Rel::LocatedAt, &office_ref).await?;
        backend.connect(clinic, Rel::RegisteredAgent, &linda_ref).await?;
    }

    let home = atlanta(HOME_ADDRESS, "445 Maple Street", "Apt 12", "30312", AddressType::Residential);
    let home_ref = home.node_ref();
    backend.create(home.into()).await?;

    let james = Person {
        job_title: Some("Billing Manager".to_string()),
        scenario: Some(TAG),
        ..Person::new(JAMES, "James Rivera")
    }
    .with_role(Role::Employee);
    let maria = Person {
        job_title: Some("Patient Coordinator / Paralegal".to_string()),
        scenario: Some(TAG),
        ..Person::new(MARIA, "Maria Santos")
    }
    .with_role(Role::Employee)
    .with_role(Role::Witness);
    let (james_ref, maria_ref) = (james.node_ref(), maria.node_ref());
    backend.create(james.into()).await?;
    backend.create(maria.into()).await?;

    backend.connect(&wellness_ref, Rel::Employs, &james_ref).await?;
    backend.connect(&peak_ref, Rel::Employs, &maria_ref).await?;
    backend.connect(&webb_ref, Rel::Employs, &maria_ref).await?;
    backend.connect(&james_ref, Rel::LivesAt, &home_ref).await?;
    backend.connect(&maria_ref, Rel::LivesAt, &home_ref).await?;
    Ok(())
}

pub async fn generate(session: &mut GenerationSession, backend: &dyn GraphBackend) -> FraudRingResult<usize> {
    create_ring(backend).await?;
    for index in 0..CLAIMS {
        file_assigned(session, backend, &TEMPLATE, &allocate(index)).await?;
    }
    info!(
        "Scenario 1: {} claims ({} at Wellness, {} at Peak, {} witnessed by Maria)",
        CLAIMS, WELLNESS_CLAIMS, PEAK_CLAIMS, MARIA_WITNESSED
    );
    Ok(CLAIMS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocation_counts() {
        let all: Vec<ClaimAssignment> = (0..CLAIMS).map(allocate).collect();
        let at = |id: &str| all.iter().filter(|a| a.provider.as_deref() == Some(id)).count();
        assert_eq!(at(WELLNESS), 22);
        assert_eq!(at(PEAK), 19);
        assert_eq!(all.iter().filter(|a| a.provider.is_none()).count(), 6);
        assert!(all.iter().all(|a| a.attorney.as_deref() == Some(WEBB)));
        assert_eq!(all.iter().filter(|a| a.witness.is_some()).count(), 8);
    }

    #[test]
    fn test_maria_witnesses_wellness_claims() {
        for index in 0..MARIA_WITNESSED {
            assert_eq!(allocate(index).provider.as_deref(), Some(WELLNESS));
        }
        assert_eq!(allocate(MARIA_WITNESSED).witness, None);
    }
}
