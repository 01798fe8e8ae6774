//! Per-run generation state: id sequences, randomness, reference pools

use super::names;
use crate::backend::GraphBackend;
use crate::error::{FraudRingError, FraudRingResult};
use crate::model::{
    Address, AddressType, Claim, ClaimStatus, NodeRef, Person, Phone, Rel, Role, ScenarioTag,
};
use chrono::{Duration, NaiveDate};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;
use tracing::debug;

/// Independent id sequences, one per kind of generated entity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sequence {
    Claim,
    Person,
    Provider,
    Attorney,
    BodyShop,
    Adjuster,
    Address,
    Phone,
    Location,
}

const SEQUENCES: usize = 9;

/// Claim about to be filed, with its mandatory links
#[derive(Debug, Clone)]
pub struct ClaimPlan {
    pub id_prefix: &'static str,
    pub name: String,
    pub amount: f64,
    pub date: NaiveDate,
    pub incident_type: String,
    pub status: ClaimStatus,
    pub is_fraud: bool,
    pub fraud_type: Option<String>,
    pub scenario: Option<ScenarioTag>,
    pub claimant: NodeRef,
    pub provider: NodeRef,
    /// Random pool location when `None`
    pub location: Option<NodeRef>,
}

/// Claimant about to be created with a phone and a home
#[derive(Debug, Clone, Default)]
pub struct ClaimantPlan {
    /// Fixed id instead of the next person id
    pub id: Option<String>,
    /// Fixed name instead of a random one
    pub name: Option<String>,
    pub person_prefix: &'static str,
    pub phone_prefix: &'static str,
    pub address_prefix: &'static str,
    pub scenario: Option<ScenarioTag>,
    pub is_fraud: Option<bool>,
    /// Existing phone to share instead of a fresh one
    pub phone: Option<NodeRef>,
    /// Existing home to share instead of a fresh one
    pub address: Option<NodeRef>,
    /// Marks a fresh home as legitimately shared, e.g. "Married Couple"
    pub shared_by: Option<String>,
}

/// A created claimant with the phone and home it was linked to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Household {
    pub person: NodeRef,
    pub phone: NodeRef,
    pub home: NodeRef,
}

/// Counters, pools and randomness of one `generate_all` run
pub struct GenerationSession {
    rng: StdRng,
    today: NaiveDate,
    sequences: [usize; SEQUENCES],
    used_phones: HashSet<String>,
    pub adjusters: Vec<NodeRef>,
    pub providers: Vec<NodeRef>,
    pub attorneys: Vec<NodeRef>,
    pub body_shops: Vec<NodeRef>,
    pub locations: Vec<NodeRef>,
}

impl GenerationSession {
    /// `reserved_phones` are never handed out as fresh numbers
    pub fn new(seed: Option<u64>, today: NaiveDate, reserved_phones: &[&str]) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            rng,
            today,
            sequences: [0; SEQUENCES],
            used_phones: reserved_phones.iter().map(|p| p.to_string()).collect(),
            adjusters: Vec::new(),
            providers: Vec::new(),
            attorneys: Vec::new(),
            body_shops: Vec::new(),
            locations: Vec::new(),
        }
    }

    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    /// `{prefix}_{nnnnn}` from the given sequence
    pub fn next_id(&mut self, sequence: Sequence, prefix: &str) -> String {
        let slot = &mut self.sequences[sequence as usize];
        let id = format!("{}_{:05}", prefix, *slot);
        *slot += 1;
        id
    }

    /// A `555-XXX-XXXX` number not used before in this run
    pub fn fresh_phone_number(&mut self) -> String {
        loop {
            let number = names::phone_number(&mut self.rng);
            if self.used_phones.insert(number.clone()) {
                return number;
            }
        }
    }

    pub fn days_ago(&self, days: i64) -> NaiveDate {
        self.today - Duration::days(days)
    }

    /// Random date between `from_days_ago` and `to_days_ago` before today
    pub fn date_between(&mut self, from_days_ago: i64, to_days_ago: i64) -> NaiveDate {
        let start = self.days_ago(from_days_ago);
        let span = (from_days_ago - to_days_ago).max(1);
        start + Duration::days(self.rng.gen_range(0..=span))
    }

    pub fn amount(&mut self, low: f64, high: f64) -> f64 {
        names::amount(&mut self.rng, low, high)
    }

    pub fn chance(&mut self, probability: f64) -> bool {
        self.rng.gen_bool(probability.clamp(0.0, 1.0))
    }

    fn pick(rng: &mut StdRng, pool: &[NodeRef], name: &str) -> FraudRingResult<NodeRef> {
        pool.choose(rng)
            .cloned()
            .ok_or_else(|| FraudRingError::ConfigError(format!("{} pool is empty", name)))
    }

    pub fn pick_adjuster(&mut self) -> FraudRingResult<NodeRef> {
        Self::pick(&mut self.rng, &self.adjusters, "adjuster")
    }

    pub fn pick_provider(&mut self) -> FraudRingResult<NodeRef> {
        Self::pick(&mut self.rng, &self.providers, "provider")
    }

    pub fn pick_location(&mut self) -> FraudRingResult<NodeRef> {
        Self::pick(&mut self.rng, &self.locations, "location")
    }

    pub fn pick_body_shop(&mut self) -> FraudRingResult<NodeRef> {
        Self::pick(&mut self.rng, &self.body_shops, "body shop")
    }

    /// A random residential address
    pub fn random_home(&mut self, id: String, scenario: Option<ScenarioTag>, shared_by: Option<String>) -> Address {
        let (city, state, zip) = names::city_state(&mut self.rng);
        Address {
            id,
            street: names::street_address(&mut self.rng),
            unit: None,
            city: city.to_string(),
            state: state.to_string(),
            zip: zip.to_string(),
            kind: AddressType::Residential,
            shared_by,
            scenario,
        }
    }

    /// Create a claimant with its phone and home, sharing either when the
    /// plan names an existing one
    pub async fn create_claimant(&mut self, backend: &dyn GraphBackend, plan: ClaimantPlan) -> FraudRingResult<Household> {
        let id = match plan.id {
            Some(id) => id,
            None => self.next_id(Sequence::Person, plan.person_prefix),
        };
        let name = match plan.name {
            Some(name) => name,
            None => names::person_name(&mut self.rng),
        };
        let person = Person {
            ssn: Some(names::ssn(&mut self.rng)),
            is_fraud: plan.is_fraud,
            scenario: plan.scenario,
            ..Person::new(id, name)
        }
        .with_role(Role::Claimant);
        let person_ref = person.node_ref();
        backend.create(person.into()).await?;

        let phone_ref = match plan.phone {
            Some(shared) => shared,
            None => {
                let phone = Phone {
                    id: self.next_id(Sequence::Phone, plan.phone_prefix),
                    number: self.fresh_phone_number(),
                    scenario: plan.scenario,
                };
                let phone_ref = phone.node_ref();
                backend.create(phone.into()).await?;
                phone_ref
            }
        };
        backend.connect(&person_ref, Rel::HasPhone, &phone_ref).await?;

        let home_ref = match plan.address {
            Some(shared) => shared,
            None => {
                let id = self.next_id(Sequence::Address, plan.address_prefix);
                let home = self.random_home(id, plan.scenario, plan.shared_by);
                let home_ref = home.node_ref();
                backend.create(home.into()).await?;
                home_ref
            }
        };
        backend.connect(&person_ref, Rel::LivesAt, &home_ref).await?;

        Ok(Household {
            person: person_ref,
            phone: phone_ref,
            home: home_ref,
        })
    }

    /// Create a claim linked to its claimant, provider, a pool adjuster and a
    /// location
    pub async fn file_claim(&mut self, backend: &dyn GraphBackend, plan: ClaimPlan) -> FraudRingResult<NodeRef> {
        let claim = Claim {
            id: self.next_id(Sequence::Claim, plan.id_prefix),
            name: plan.name,
            amount: plan.amount,
            date: plan.date,
            incident_type: plan.incident_type,
            status: plan.status,
            is_fraud: plan.is_fraud,
            fraud_type: plan.fraud_type,
            scenario: plan.scenario,
        };
        let claim_ref = claim.node_ref();
        debug!("Filing {} at {}", claim_ref, plan.provider);
        backend.create(claim.into()).await?;

        let adjuster = self.pick_adjuster()?;
        let location = match plan.location {
            Some(location) => location,
            None => self.pick_location()?,
        };
        backend.connect(&claim_ref, Rel::FiledBy, &plan.claimant).await?;
        backend.connect(&claim_ref, Rel::TreatedAt, &plan.provider).await?;
        backend.connect(&claim_ref, Rel::HandledBy, &adjuster).await?;
        backend.connect(&claim_ref, Rel::OccurredAt, &location).await?;
        Ok(claim_ref)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> GenerationSession {
        let today = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        GenerationSession::new(Some(11), today, &["555-847-2931"])
    }

    #[test]
    fn test_sequences_are_independent() {
        let mut s = session();
        assert_eq!(s.next_id(Sequence::Claim, "CLM_BG"), "CLM_BG_00000");
        assert_eq!(s.next_id(Sequence::Claim, "CLM_S1"), "CLM_S1_00001");
        assert_eq!(s.next_id(Sequence::Phone, "PH"), "PH_00000");
    }

    #[test]
    fn test_phone_numbers_unique() {
        let mut s = session();
        let numbers: HashSet<String> = (0..500).map(|_| s.fresh_phone_number()).collect();
        assert_eq!(numbers.len(), 500);
        assert!(!numbers.contains("555-847-2931"));
    }

    #[test]
    fn test_date_window() {
        let mut s = session();
        for _ in 0..200 {
            let date = s.date_between(420, 180);
            assert!(date >= s.days_ago(420) && date <= s.days_ago(180));
        }
    }

    #[test]
    fn test_seeded_sessions_agree() {
        let mut a = session();
        let mut b = session();
        assert_eq!(a.fresh_phone_number(), b.fresh_phone_number());
        assert_eq!(a.amount(1.0, 100.0), b.amount(1.0, 100.0));
    }
}
