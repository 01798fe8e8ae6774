//! Reference pools and legitimate background claims

use super::names;
use super::session::{ClaimPlan, ClaimantPlan, GenerationSession, Household, Sequence};
use crate::backend::GraphBackend;
use crate::config::{Band, GeneratorConfig};
use crate::error::FraudRingResult;
use crate::model::{
    Address, AddressType, Attorney, BodyShop, ClaimStatus, Location, NodeRef, Person, Provider, Rel, Role,
};
use rand::seq::{index, SliceRandom};
use rand::Rng;
use std::collections::BTreeSet;
use tracing::{debug, info};

/// Relationship recorded on addresses shared by spouses
pub const MARRIED_COUPLE: &str = "Married Couple";

/// Spreads claims over a pool so every member ends inside a [`Band`]
///
/// Members below the lower bound are served first; once all reach it, picks
/// are uniform among members still below the upper bound.
#[derive(Debug, Clone)]
pub struct BoundedPicker {
    counts: Vec<usize>,
    band: Band,
}

impl BoundedPicker {
    pub fn new(members: usize, band: Band) -> Self {
        Self {
            counts: vec![0; members],
            band,
        }
    }

    /// Index of the next member, or `None` when all are at the upper bound
    pub fn pick<R: Rng>(&mut self, rng: &mut R) -> Option<usize> {
        let starved: Vec<usize> = (0..self.counts.len()).filter(|&i| self.counts[i] < self.band.min).collect();
        let candidates = if starved.is_empty() {
            (0..self.counts.len()).filter(|&i| self.counts[i] < self.band.max).collect()
        } else {
            starved
        };
        let chosen = *candidates.choose(rng)?;
        self.counts[chosen] += 1;
        Some(chosen)
    }

    pub fn counts(&self) -> &[usize] {
        &self.counts
    }
}

/// Claim indices whose claimant lives with the previous claimant
///
/// Only odd indices qualify so that no two couples overlap.
pub fn couple_indices<R: Rng>(rng: &mut R, claims: usize, couples: usize) -> BTreeSet<usize> {
    let slots = claims / 2;
    index::sample(rng, slots, couples.min(slots))
        .into_iter()
        .map(|k| 2 * k + 1)
        .collect()
}

/// Claim indices that receive an attorney
pub fn represented_indices<R: Rng>(rng: &mut R, claims: usize, represented: usize) -> BTreeSet<usize> {
    index::sample(rng, claims, represented.min(claims)).into_iter().collect()
}

fn pick_from(pool: &[NodeRef], slot: Option<usize>, what: &str) -> FraudRingResult<NodeRef> {
    slot.and_then(|i| pool.get(i))
        .cloned()
        .ok_or_else(|| crate::error::FraudRingError::ConfigError(format!("{} band exhausted", what)))
}

/// Create adjusters, providers, attorneys, body shops and locations
pub async fn create_pools(
    session: &mut GenerationSession,
    backend: &dyn GraphBackend,
    config: &GeneratorConfig,
) -> FraudRingResult<()> {
    for _ in 0..config.adjusters {
        let adjuster = Person {
            employee_id: Some(format!("EMP-{}", session.rng().gen_range(10000..=99999))),
            ..Person::new(
                session.next_id(Sequence::Adjuster, "ADJ"),
                names::person_name(session.rng()),
            )
        }
        .with_role(Role::Adjuster);
        session.adjusters.push(adjuster.node_ref());
        backend.create(adjuster.into()).await?;
    }

    for i in 0..config.providers {
        let age = session.rng().gen_range(365..=1500);
        let opened = session.days_ago(age);
        let provider = Provider::active(
            session.next_id(Sequence::Provider, "PROV_BG"),
            names::provider_name(i),
            format!("MED-{}", session.rng().gen_range(100000..=999999)),
            opened,
        );
        let (city, state, zip) = names::city_state(session.rng());
        let office = Address {
            id: session.next_id(Sequence::Address, "ADDR"),
            street: names::street_address(session.rng()),
            unit: None,
            city: city.to_string(),
            state: state.to_string(),
            zip: zip.to_string(),
            kind: AddressType::Business,
            shared_by: None,
            scenario: None,
        };
        let (provider_ref, office_ref) = (provider.node_ref(), office.node_ref());
        backend.create(provider.into()).await?;
        backend.create(office.into()).await?;
        backend.connect(&provider_ref, Rel::LocatedAt, &office_ref).await?;
        session.providers.push(provider_ref);
    }

    for _ in 0..config.attorneys {
        let attorney = Attorney {
            id: session.next_id(Sequence::Attorney, "ATT_BG"),
            name: names::attorney_name(session.rng()),
            bar_number: format!("BAR-{}", session.rng().gen_range(100000..=999999)),
            scenario: None,
        };
        session.attorneys.push(attorney.node_ref());
        backend.create(attorney.into()).await?;
    }

    for i in 0..config.body_shops {
        let shop = BodyShop {
            id: session.next_id(Sequence::BodyShop, "BS_BG"),
            name: names::body_shop_name(i),
            license: format!("BS-{}", session.rng().gen_range(10000..=99999)),
        };
        session.body_shops.push(shop.node_ref());
        backend.create(shop.into()).await?;
    }

    for _ in 0..config.locations {
        let (name, kind) = names::location(session.rng());
        let location = Location {
            id: session.next_id(Sequence::Location, "LOC"),
            name,
            kind,
            lat: names::coordinate(session.rng(), 33.5),
            lng: names::coordinate(session.rng(), -84.4),
            high_traffic: false,
            scenario: None,
        };
        session.locations.push(location.node_ref());
        backend.create(location.into()).await?;
    }

    info!(
        "Created pools: {} adjusters, {} providers, {} attorneys, {} body shops, {} locations",
        config.adjusters, config.providers, config.attorneys, config.body_shops, config.locations
    );
    Ok(())
}

/// Generate the legitimate claims that scenario anomalies stand out against
pub async fn generate_background(
    session: &mut GenerationSession,
    backend: &dyn GraphBackend,
    config: &GeneratorConfig,
) -> FraudRingResult<usize> {
    let claims = config.background_claims;
    let couples = couple_indices(session.rng(), claims, config.couples());
    let represented = represented_indices(session.rng(), claims, config.represented_claims());
    let mut providers = BoundedPicker::new(session.providers.len(), config.provider_band);
    let mut attorneys = BoundedPicker::new(session.attorneys.len(), config.attorney_band);

    let mut previous: Option<Household> = None;
    for i in 0..claims {
        let spouse = if couples.contains(&i) { previous.take() } else { None };
        let shared_by = couples.contains(&(i + 1)).then(|| MARRIED_COUPLE.to_string());
        let household = session
            .create_claimant(
                backend,
                ClaimantPlan {
                    person_prefix: "P",
                    phone_prefix: "PH",
                    address_prefix: "ADDR",
                    is_fraud: Some(false),
                    address: spouse.as_ref().map(|s| s.home.clone()),
                    shared_by,
                    ..ClaimantPlan::default()
                },
            )
            .await?;
        if let Some(partner) = &spouse {
            backend.connect(&partner.person, Rel::MarriedTo, &household.person).await?;
        }
        let claimant = household.person.clone();
        previous = Some(household);

        let provider_slot = providers.pick(session.rng());
        let provider = pick_from(&session.providers, provider_slot, "provider")?;
        let incident = names::INCIDENT_TYPES
            .choose(session.rng())
            .copied()
            .unwrap_or("Rear-End Collision");
        let plan = ClaimPlan {
            id_prefix: "CLM_BG",
            name: format!("Auto Claim - {}", incident),
            amount: session.amount(2000.0, 25000.0),
            date: session.date_between(365, 0),
            incident_type: incident.to_string(),
            status: ClaimStatus::Closed,
            is_fraud: false,
            fraud_type: None,
            scenario: None,
            claimant,
            provider,
            location: None,
        };
        let claim = session.file_claim(backend, plan).await?;

        if represented.contains(&i) {
            let attorney_slot = attorneys.pick(session.rng());
            let attorney = pick_from(&session.attorneys, attorney_slot, "attorney")?;
            backend.connect(&claim, Rel::RepresentedBy, &attorney).await?;
        }
        if session.chance(config.body_shop_rate) {
            let shop = session.pick_body_shop()?;
            backend.connect(&claim, Rel::RepairedAt, &shop).await?;
        }
        if session.chance(config.witness_rate) {
            let witness = Person {
                is_fraud: Some(false),
                ..Person::new(
                    session.next_id(Sequence::Person, "P"),
                    names::person_name(session.rng()),
                )
            }
            .with_role(Role::Witness);
            let witness_ref = witness.node_ref();
            backend.create(witness.into()).await?;
            backend.connect(&claim, Rel::WitnessedBy, &witness_ref).await?;
        }
    }

    debug!("Provider load: {:?}", providers.counts());
    info!(
        "Generated {} background claims ({} represented, {} couples)",
        claims,
        represented.len(),
        couples.len()
    );
    Ok(claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_bounded_picker_respects_band() {
        let mut rng = StdRng::seed_from_u64(3);
        let band = Band::new(3, 8);
        let mut picker = BoundedPicker::new(25, band);
        for _ in 0..150 {
            assert!(picker.pick(&mut rng).is_some());
        }
        assert_eq!(picker.counts().iter().sum::<usize>(), 150);
        assert!(picker.counts().iter().all(|&c| (3..=8).contains(&c)));
    }

    #[test]
    fn test_bounded_picker_fills_minimum_first() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut picker = BoundedPicker::new(12, Band::new(2, 6));
        for _ in 0..24 {
            picker.pick(&mut rng);
        }
        assert!(picker.counts().iter().all(|&c| c == 2));
    }

    #[test]
    fn test_bounded_picker_exhausts() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut picker = BoundedPicker::new(2, Band::new(0, 1));
        assert!(picker.pick(&mut rng).is_some());
        assert!(picker.pick(&mut rng).is_some());
        assert_eq!(picker.pick(&mut rng), None);
    }

    #[test]
    fn test_couples_on_odd_indices() {
        let mut rng = StdRng::seed_from_u64(5);
        let couples = couple_indices(&mut rng, 150, 7);
        assert_eq!(couples.len(), 7);
        assert!(couples.iter().all(|i| i % 2 == 1 && *i < 150));
    }

    #[test]
    fn test_represented_exact_count() {
        let mut rng = StdRng::seed_from_u64(5);
        let chosen = represented_indices(&mut rng, 150, 45);
        assert_eq!(chosen.len(), 45);
        assert!(chosen.iter().all(|i| *i < 150));
    }
}
