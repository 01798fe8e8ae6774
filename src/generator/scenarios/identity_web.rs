//! Scenario 2: seven claimants tied together by two phones and one apartment

use crate::backend::GraphBackend;
use crate::error::FraudRingResult;
use crate::generator::session::{ClaimPlan, ClaimantPlan, GenerationSession};
use crate::model::{Address, AddressType, ClaimStatus, Kind, NodeRef, Phone, ScenarioTag};
use tracing::info;

use super::ClaimAssignment;

pub const TAG: ScenarioTag = ScenarioTag::IdentityWeb;

pub const MAIN_PHONE: &str = "PH_S2_MAIN";
pub const MAIN_NUMBER: &str = "555-847-2931";
pub const ALT_PHONE: &str = "PH_S2_ALT";
pub const ALT_NUMBER: &str = "555-847-2932";
pub const OAK_ADDRESS: &str = "ADDR_S2_OAK";

/// (name, shares the main phone, lives at the Oak Street apartment)
pub const CLAIMANTS: [(&str, bool, bool); 7] = [
    ("Marcus Williams", true, false),
    ("Tanya Williams", true, false),
    ("Deshawn Brooks", true, true),
    ("Keisha Brooks", true, true),
    ("Andre Thompson", true, true),
    ("Lisa Morgan", false, true),
    ("Tyrell Morgan", false, true),
];

pub const CLAIM_AMOUNTS: [f64; 6] = [32000.0, 28500.0, 35000.0, 31000.0, 29500.0, 29000.0];
pub const CLAIM_TOTAL: f64 = 185000.0;

pub const MAIN_PHONE_USERS: usize = 5;
pub const ALT_PHONE_USERS: usize = 2;
pub const OAK_RESIDENTS: usize = 5;

/// Claims fall inside this many days, starting 60 days ago
pub const WINDOW_DAYS: i64 = 45;
const WINDOW_START: i64 = 60;

pub fn claimant_id(index: usize) -> String {
    format!("P_S2_{:03}", index)
}

/// Phone and home of claimant `index`
pub fn allocate(index: usize) -> ClaimAssignment {
    let (_, main, oak) = CLAIMANTS[index % CLAIMANTS.len()];
    ClaimAssignment {
        phone: Some(if main { MAIN_PHONE } else { ALT_PHONE }.to_string()),
        address: oak.then(|| OAK_ADDRESS.to_string()),
        ..ClaimAssignment::default()
    }
}

async fn create_shared(backend: &dyn GraphBackend) -> FraudRingResult<()> {
    for (id, number) in [(MAIN_PHONE, MAIN_NUMBER), (ALT_PHONE, ALT_NUMBER)] {
        let phone = Phone {
            id: id.to_string(),
            number: number.to_string(),
            scenario: Some(TAG),
        };
        backend.create(phone.into()).await?;
    }
    let oak = Address {
        id: OAK_ADDRESS.to_string(),
        street: "847 Oak Street".to_string(),
        unit: Some("Apt 4B".to_string()),
        city: "Atlanta".to_string(),
        state: "GA".to_string(),
        zip: "30310".to_string(),
        kind: AddressType::Residential,
        shared_by: None,
        scenario: Some(TAG),
    };
    backend.create(oak.into()).await?;
    Ok(())
}

pub async fn generate(session: &mut GenerationSession, backend: &dyn GraphBackend) -> FraudRingResult<usize> {
    create_shared(backend).await?;

    let mut claimants = Vec::with_capacity(CLAIMANTS.len());
    for (index, (name, _, _)) in CLAIMANTS.iter().enumerate() {
        let assignment = allocate(index);
        let household = session
            .create_claimant(
                backend,
                ClaimantPlan {
                    id: Some(claimant_id(index)),
                    name: Some(name.to_string()),
                    address_prefix: "ADDR_S2",
                    scenario: Some(TAG),
                    phone: assignment.phone.as_deref().map(|id| NodeRef::new(Kind::Phone, id)),
                    address: assignment.address.as_deref().map(|id| NodeRef::new(Kind::Address, id)),
                    ..ClaimantPlan::default()
                },
            )
            .await?;
        claimants.push(household.person);
    }

    for (claimant, amount) in claimants.into_iter().zip(CLAIM_AMOUNTS) {
        let provider = session.pick_provider()?;
        let plan = ClaimPlan {
            id_prefix: "CLM_S2",
            name: "Auto Claim - Rear-End Collision".to_string(),
            amount,
            date: session.date_between(WINDOW_START, WINDOW_START - WINDOW_DAYS),
            incident_type: "Rear-End Collision".to_string(),
            status: ClaimStatus::Open,
            is_fraud: false,
            fraud_type: None,
            scenario: Some(TAG),
            claimant,
            provider,
            location: None,
        };
        session.file_claim(backend, plan).await?;
    }

    info!(
        "Scenario 2: {} claimants, {} claims totalling {}",
        CLAIMANTS.len(),
        CLAIM_AMOUNTS.len(),
        CLAIM_TOTAL
    );
    Ok(CLAIM_AMOUNTS.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amounts_total() {
        assert_eq!(CLAIM_AMOUNTS.iter().sum::<f64>(), CLAIM_TOTAL);
    }

    #[test]
    fn test_shared_identifier_counts() {
        let all: Vec<ClaimAssignment> = (0..CLAIMANTS.len()).map(allocate).collect();
        let on = |phone: &str| all.iter().filter(|a| a.phone.as_deref() == Some(phone)).count();
        assert_eq!(on(MAIN_PHONE), MAIN_PHONE_USERS);
        assert_eq!(on(ALT_PHONE), ALT_PHONE_USERS);
        assert_eq!(on(MAIN_PHONE) + on(ALT_PHONE), 7);
        assert_eq!(all.iter().filter(|a| a.address.is_some()).count(), OAK_RESIDENTS);
    }

    #[test]
    fn test_claimant_ids() {
        assert_eq!(claimant_id(0), "P_S2_000");
        assert_eq!(claimant_id(6), "P_S2_006");
    }
}
