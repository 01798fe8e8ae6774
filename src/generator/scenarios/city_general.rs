//! Scenario 3b: a busy emergency room that only looks suspicious
//!
//! High volume at a high-traffic junction, but every claimant has a unique
//! phone, the attorneys are spread out, and the only shared homes belong to
//! two married couples.

use super::{file_assigned, fixed_date, ClaimAssignment, ClaimTemplate};
use crate::backend::GraphBackend;
use crate::error::FraudRingResult;
use crate::generator::background::MARRIED_COUPLE;
use crate::generator::names;
use crate::generator::session::GenerationSession;
use crate::model::{Attorney, ClaimStatus, Location, LocationType, Provider, Rel, ScenarioTag};
use rand::Rng;
use tracing::info;

pub const TAG: ScenarioTag = ScenarioTag::ProviderAudit;

pub const CITY_GENERAL: &str = "PROV_S3_CITYGEN";
pub const JUNCTION: &str = "LOC_S3_I85";

pub const CLAIMS: usize = 32;
pub const ATTORNEYS: usize = 12;
pub const COUPLES: usize = 2;

/// Claims with an attorney; every even claim is represented
pub const REPRESENTED: usize = (CLAIMS + 1) / 2;

const TEMPLATE: ClaimTemplate = ClaimTemplate {
    scenario: TAG,
    claim_prefix: "CLM_S3_CG",
    person_prefix: "P_S3_CG",
    phone_prefix: "PH_S3_CG",
    address_prefix: "ADDR_S3_CG",
    name: "Auto Claim - ER Visit",
    incidents: &["Rear-End Collision", "Side Impact", "Multi-Vehicle"],
    status: ClaimStatus::Closed,
    fraud_type: None,
    amount: (3000.0, 18000.0),
    window: (365, 0),
    location: Some(JUNCTION),
    claimant_fraud: None,
};

pub fn attorney_id(index: usize) -> String {
    format!("ATT_S3_CG_{:03}", index)
}

pub fn couple_address(couple: usize) -> String {
    format!("ADDR_S3_COUPLE_{}", couple)
}

/// Even claims rotate through the dedicated attorneys; the first claimants
/// pair up into couples sharing a home
pub fn allocate(index: usize) -> ClaimAssignment {
    ClaimAssignment {
        provider: Some(CITY_GENERAL.to_string()),
        attorney: (index % 2 == 0).then(|| attorney_id((index / 2) % ATTORNEYS)),
        address: (index < COUPLES * 2).then(|| couple_address(index / 2)),
        ..ClaimAssignment::default()
    }
}

async fn create_anchors(session: &mut GenerationSession, backend: &dyn GraphBackend) -> FraudRingResult<()> {
    let er = Provider {
        billing_pct_above_peer: Some(42),
        legitimate_high_volume: true,
        scenario: Some(TAG),
        ..Provider::active(CITY_GENERAL, "City General Emergency Room", "MED-S3-CG001", fixed_date("2015-06-01")?)
    };
    backend.create(er.into()).await?;

    let junction = Location {
        id: JUNCTION.to_string(),
        name: "I-85 / Highway 20 Junction".to_string(),
        kind: LocationType::Highway,
        lat: 33.7490,
        lng: -84.3880,
        high_traffic: true,
        scenario: Some(TAG),
    };
    backend.create(junction.into()).await?;

    for index in 0..ATTORNEYS {
        let attorney = Attorney {
            id: attorney_id(index),
            name: names::attorney_name(session.rng()),
            bar_number: format!("BAR-CG{}", session.rng().gen_range(100000..=999999)),
            scenario: Some(TAG),
        };
        backend.create(attorney.into()).await?;
    }

    for couple in 0..COUPLES {
        let home = session.random_home(couple_address(couple), Some(TAG), Some(MARRIED_COUPLE.to_string()));
        backend.create(home.into()).await?;
    }
    Ok(())
}

pub async fn generate(session: &mut GenerationSession, backend: &dyn GraphBackend) -> FraudRingResult<usize> {
    create_anchors(session, backend).await?;
    let mut partner = None;
    for index in 0..CLAIMS {
        let filed = file_assigned(session, backend, &TEMPLATE, &allocate(index)).await?;
        if index < COUPLES * 2 {
            match partner.take() {
                Some(first) => {
                    backend.connect(&first, Rel::MarriedTo, &filed.claimant.person).await?;
                }
                None => partner = Some(filed.claimant.person),
            }
        }
    }
    info!(
        "Scenario 3b: {} legitimate claims, {} attorneys, {} married couples",
        CLAIMS, ATTORNEYS, COUPLES
    );
    Ok(CLAIMS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashMap, HashSet};

    #[test]
    fn test_every_attorney_used() {
        let mut clients: HashMap<String, usize> = HashMap::new();
        for index in 0..CLAIMS {
            if let Some(attorney) = allocate(index).attorney {
                *clients.entry(attorney).or_default() += 1;
            }
        }
        assert_eq!(clients.len(), ATTORNEYS);
        assert_eq!(clients.values().sum::<usize>(), REPRESENTED);
        assert!(clients.values().all(|&n| (1..=2).contains(&n)));
    }

    #[test]
    fn test_only_couples_share_homes() {
        let homes: Vec<Option<String>> = (0..CLAIMS).map(|i| allocate(i).address).collect();
        let shared: HashSet<&String> = homes.iter().flatten().collect();
        assert_eq!(shared.len(), COUPLES);
        assert_eq!(homes.iter().flatten().count(), COUPLES * 2);
        assert!((0..CLAIMS).all(|i| allocate(i).phone.is_none()));
    }
}
