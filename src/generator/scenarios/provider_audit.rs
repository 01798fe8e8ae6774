//! Scenario 3a: two clinics sharing an attorney, a witness and a phone

use super::{file_assigned, fixed_date, ClaimAssignment, ClaimTemplate};
use crate::backend::GraphBackend;
use crate::error::FraudRingResult;
use crate::generator::session::GenerationSession;
use crate::model::{Attorney, ClaimStatus, Person, Phone, Provider, Role, ScenarioTag};
use tracing::info;

pub const TAG: ScenarioTag = ScenarioTag::ProviderAudit;

pub const VEGA: &str = "ATT_S3_VEGA";
pub const CARMEN: &str = "P_S3_CARMEN";
pub const SUNRISE: &str = "PROV_S3_SUNRISE";
pub const PEAK: &str = "PROV_S3_PEAK";
pub const SHARED_PHONE: &str = "PH_S3_SHARED";
pub const SHARED_NUMBER: &str = "555-991-8847";

/// Per-clinic targets: claims, Vega clients, Carmen witnessed, shared phone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClinicShare {
    pub claims: usize,
    pub vega: usize,
    pub carmen: usize,
    pub shared_phone: usize,
}

pub const SUNRISE_SHARE: ClinicShare = ClinicShare {
    claims: 28,
    vega: 23,
    carmen: 4,
    shared_phone: 4,
};

pub const PEAK_SHARE: ClinicShare = ClinicShare {
    claims: 15,
    vega: 12,
    carmen: 2,
    shared_phone: 3,
};

pub const CLAIMS: usize = SUNRISE_SHARE.claims + PEAK_SHARE.claims;
pub const SHARED_PHONE_USERS: usize = SUNRISE_SHARE.shared_phone + PEAK_SHARE.shared_phone;

const SUNRISE_TEMPLATE: ClaimTemplate = ClaimTemplate {
    scenario: TAG,
    claim_prefix: "CLM_S3_SUN",
    person_prefix: "P_S3_SUN",
    phone_prefix: "PH_S3",
    address_prefix: "ADDR_S3",
    name: "Auto Claim - Soft Tissue",
    incidents: &["Rear-End Collision"],
    status: ClaimStatus::Open,
    fraud_type: None,
    amount: (18000.0, 42000.0),
    window: (180, 0),
    location: None,
    claimant_fraud: None,
};

const PEAK_TEMPLATE: ClaimTemplate = ClaimTemplate {
    claim_prefix: "CLM_S3_PEAK",
    person_prefix: "P_S3_PEAK",
    amount: (16000.0, 38000.0),
    ..SUNRISE_TEMPLATE
};

/// Assignment of claim `index` at `clinic`; targets fill the first indices
pub fn allocate(clinic: &str, share: ClinicShare, index: usize) -> ClaimAssignment {
    ClaimAssignment {
        provider: Some(clinic.to_string()),
        attorney: (index < share.vega).then(|| VEGA.to_string()),
        witness: (index < share.carmen).then(|| CARMEN.to_string()),
        phone: (index < share.shared_phone).then(|| SHARED_PHONE.to_string()),
        address: None,
    }
}

async fn create_anchors(backend: &dyn GraphBackend) -> FraudRingResult<()> {
    let vega = Attorney {
        id: VEGA.to_string(),
        name: "Roberto Vega".to_string(),
        bar_number: "BAR-456123".to_string(),
        scenario: Some(TAG),
    };
    backend.create(vega.into()).await?;

    let sunrise = Provider {
        billing_pct_above_peer: Some(38),
        scenario: Some(TAG),
        ..Provider::active(SUNRISE, "Sunrise Wellness Clinic", "MED-S3-001", fixed_date("2024-02-01")?)
    };
    let peak = Provider {
        scenario: Some(TAG),
        ..Provider::active(PEAK, "Peak Recovery Center", "MED-S3-002", fixed_date("2024-05-01")?)
    };
    backend.create(sunrise.into()).await?;
    backend.create(peak.into()).await?;

    let phone = Phone {
        id: SHARED_PHONE.to_string(),
        number: SHARED_NUMBER.to_string(),
        scenario: Some(TAG),
    };
    backend.create(phone.into()).await?;

    let carmen = Person {
        scenario: Some(TAG),
        ..Person::new(CARMEN, "Carmen Reyes")
    }
    .with_role(Role::Witness);
    backend.create(carmen.into()).await?;
    Ok(())
}

pub async fn generate(session: &mut GenerationSession, backend: &dyn GraphBackend) -> FraudRingResult<usize> {
    create_anchors(backend).await?;
    for (clinic, share, template) in [
        (SUNRISE, SUNRISE_SHARE, &SUNRISE_TEMPLATE),
        (PEAK, PEAK_SHARE, &PEAK_TEMPLATE),
    ] {
        for index in 0..share.claims {
            file_assigned(session, backend, template, &allocate(clinic, share, index)).await?;
        }
    }
    info!(
        "Scenario 3a: {} claims at Sunrise, {} at Peak, {} shared-phone users",
        SUNRISE_SHARE.claims, PEAK_SHARE.claims, SHARED_PHONE_USERS
    );
    Ok(CLAIMS)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tally(clinic: &str, share: ClinicShare) -> ClinicShare {
        let all: Vec<ClaimAssignment> = (0..share.claims).map(|i| allocate(clinic, share, i)).collect();
        assert!(all.iter().all(|a| a.provider.as_deref() == Some(clinic)));
        ClinicShare {
            claims: all.len(),
            vega: all.iter().filter(|a| a.attorney.is_some()).count(),
            carmen: all.iter().filter(|a| a.witness.is_some()).count(),
            shared_phone: all.iter().filter(|a| a.phone.is_some()).count(),
        }
    }

    #[test]
    fn test_allocation_matches_targets() {
        assert_eq!(tally(SUNRISE, SUNRISE_SHARE), SUNRISE_SHARE);
        assert_eq!(tally(PEAK, PEAK_SHARE), PEAK_SHARE);
        assert_eq!(CLAIMS, 43);
        assert_eq!(SHARED_PHONE_USERS, 7);
    }
}
