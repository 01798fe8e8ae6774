//! Verification contract of each scenario
//!
//! Expected values come from the generator's own constants, so the numbers a
//! scenario is built with and the numbers it is checked against cannot drift.

use crate::generator::scenarios::{captive_mill, city_general, identity_web, network_migration, provider_audit};
use crate::model::{Kind, Rel, ScenarioTag};
use crate::query::{AggregateQuery, Anchor, Direction, Expand, Pattern};
use crate::verify::Expected;
use serde::Serialize;

/// One aggregate read and the value it must produce
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Check {
    pub label: String,
    pub query: AggregateQuery,
    pub expected: Expected,
}

impl Check {
    fn new(label: impl Into<String>, query: AggregateQuery, expected: Expected) -> Self {
        Self {
            label: label.into(),
            query,
            expected,
        }
    }
}

fn exactly(n: usize) -> Expected {
    Expected::Exactly(n as u64)
}

fn anchor(kind: Kind, id: &str) -> Pattern {
    Pattern::new(Anchor::by_id("n", kind.as_str(), id))
}

/// Claims attached to `id` through an incoming `rel`
fn claims_of(kind: Kind, id: &str, rel: Rel) -> Pattern {
    anchor(kind, id).then(Expand::new("n", rel, Direction::In, "c").label(Kind::Claim.as_str()))
}

/// People attached to `id` through an incoming `rel`
fn people_on(kind: Kind, id: &str, rel: Rel) -> Pattern {
    anchor(kind, id).then(Expand::new("n", rel, Direction::In, "p").label(Kind::Person.as_str()))
}

fn scenario_claims(tag: ScenarioTag) -> Pattern {
    Pattern::new(Anchor::by_property("c", Kind::Claim.as_str(), "scenario", tag.as_str()))
}

/// Checks for scenario `id`; empty for an unknown id
pub fn for_scenario(id: u8) -> Vec<Check> {
    match id {
        1 => captive_mill_checks(),
        2 => identity_web_checks(),
        3 => provider_audit_checks(),
        4 => network_migration_checks(),
        _ => Vec::new(),
    }
}

fn captive_mill_checks() -> Vec<Check> {
    use captive_mill::*;
    let clinic_claims = claims_of(Kind::Attorney, WEBB, Rel::RepresentedBy)
        .then(Expand::new("c", Rel::TreatedAt, Direction::Out, "prov").label(Kind::Provider.as_str()))
        .then(Expand::new("prov", Rel::RegisteredAgent, Direction::Out, "agent").filter("id", LINDA));
    vec![
        Check::new(
            "Webb claims",
            AggregateQuery::count_distinct(claims_of(Kind::Attorney, WEBB, Rel::RepresentedBy), "c"),
            exactly(CLAIMS),
        ),
        Check::new(
            "Webb claims at Linda's clinics",
            AggregateQuery::count_distinct(clinic_claims, "c"),
            exactly(CLINIC_CLAIMS),
        ),
        Check::new(
            "Claims witnessed by Maria",
            AggregateQuery::count_distinct(claims_of(Kind::Person, MARIA, Rel::WitnessedBy), "c"),
            exactly(MARIA_WITNESSED),
        ),
        Check::new(
            "Clinics with Linda as agent",
            AggregateQuery::count_distinct(
                anchor(Kind::Person, LINDA).then(
                    Expand::new("n", Rel::RegisteredAgent, Direction::In, "prov").label(Kind::Provider.as_str()),
                ),
                "prov",
            ),
            exactly(2),
        ),
    ]
}

fn identity_web_checks() -> Vec<Check> {
    use identity_web::*;
    let either_phone = Pattern::new(Anchor {
        values: vec![MAIN_PHONE.into(), ALT_PHONE.into()],
        ..Anchor::by_id("n", Kind::Phone.as_str(), MAIN_PHONE)
    })
    .then(Expand::new("n", Rel::HasPhone, Direction::In, "p").label(Kind::Person.as_str()));
    vec![
        Check::new(
            "Main phone users",
            AggregateQuery::count_distinct(people_on(Kind::Phone, MAIN_PHONE, Rel::HasPhone), "p"),
            exactly(MAIN_PHONE_USERS),
        ),
        Check::new(
            "Second phone users",
            AggregateQuery::count_distinct(people_on(Kind::Phone, ALT_PHONE, Rel::HasPhone), "p"),
            exactly(ALT_PHONE_USERS),
        ),
        Check::new(
            "Oak Street residents",
            AggregateQuery::count_distinct(people_on(Kind::Address, OAK_ADDRESS, Rel::LivesAt), "p"),
            exactly(OAK_RESIDENTS),
        ),
        Check::new(
            "People on either phone",
            AggregateQuery::count_distinct(either_phone, "p"),
            exactly(CLAIMANTS.len()),
        ),
        Check::new(
            "Identity web claims",
            AggregateQuery::count_distinct(scenario_claims(TAG), "c"),
            exactly(CLAIM_AMOUNTS.len()),
        ),
        Check::new(
            "Identity web claim total",
            AggregateQuery::sum(scenario_claims(TAG), "c", "claim_amount"),
            Expected::Exactly(CLAIM_TOTAL as u64),
        ),
    ]
}

fn provider_audit_checks() -> Vec<Check> {
    use provider_audit::*;
    let sunrise = || claims_of(Kind::Provider, SUNRISE, Rel::TreatedAt);
    let city_general = || claims_of(Kind::Provider, city_general::CITY_GENERAL, Rel::TreatedAt);
    vec![
        Check::new(
            "Sunrise claims",
            AggregateQuery::count_distinct(sunrise(), "c"),
            exactly(SUNRISE_SHARE.claims),
        ),
        Check::new(
            "Vega claims at Sunrise",
            AggregateQuery::count_distinct(
                sunrise().then(Expand::new("c", Rel::RepresentedBy, Direction::Out, "a").filter("id", VEGA)),
                "c",
            ),
            exactly(SUNRISE_SHARE.vega),
        ),
        Check::new(
            "Carmen witnessed at Sunrise",
            AggregateQuery::count_distinct(
                sunrise().then(Expand::new("c", Rel::WitnessedBy, Direction::Out, "w").filter("id", CARMEN)),
                "c",
            ),
            exactly(SUNRISE_SHARE.carmen),
        ),
        Check::new(
            "Shared phone users",
            AggregateQuery::count_distinct(people_on(Kind::Phone, SHARED_PHONE, Rel::HasPhone), "p"),
            exactly(SHARED_PHONE_USERS),
        ),
        Check::new(
            "City General claims",
            AggregateQuery::count_distinct(city_general(), "c"),
            exactly(city_general::CLAIMS),
        ),
        Check::new(
            "City General distinct attorneys",
            AggregateQuery::count_distinct(
                city_general().then(
                    Expand::new("c", Rel::RepresentedBy, Direction::Out, "a").label(Kind::Attorney.as_str()),
                ),
                "a",
            ),
            Expected::AtLeast(city_general::ATTORNEYS as u64),
        ),
        Check::new(
            "City General distinct claimant phones",
            AggregateQuery::count_distinct(
                city_general()
                    .then(Expand::new("c", Rel::FiledBy, Direction::Out, "p"))
                    .then(Expand::new("p", Rel::HasPhone, Direction::Out, "ph")),
                "ph",
            ),
            exactly(city_general::CLAIMS),
        ),
        Check::new(
            "City General distinct claimant addresses",
            AggregateQuery::count_distinct(
                city_general()
                    .then(Expand::new("c", Rel::FiledBy, Direction::Out, "p"))
                    .then(Expand::new("p", Rel::LivesAt, Direction::Out, "home")),
                "home",
            ),
            exactly(city_general::CLAIMS - city_general::COUPLES),
        ),
        Check::new(
            "City General marked legitimate",
            AggregateQuery::property(
                Pattern::new(Anchor::by_id("n", Kind::Provider.as_str(), city_general::CITY_GENERAL)),
                "n",
                "legitimate_high_volume",
            ),
            Expected::Flag(true),
        ),
    ]
}

fn network_migration_checks() -> Vec<Check> {
    use network_migration::*;
    vec![
        Check::new(
            "Bernard's flagged fraudulent",
            AggregateQuery::property(anchor(Kind::Provider, BERNARD), "n", "is_fraud"),
            Expected::Flag(true),
        ),
        Check::new(
            "Fraud claims at Bernard's",
            AggregateQuery::count_distinct(
                Pattern::new(Anchor::by_id("n", Kind::Provider.as_str(), BERNARD)).then(
                    Expand::new("n", Rel::TreatedAt, Direction::In, "c")
                        .label(Kind::Claim.as_str())
                        .filter("is_fraud", true),
                ),
                "c",
            ),
            exactly(BERNARD_CLAIMS),
        ),
        Check::new(
            "Chen active claims",
            AggregateQuery::count_distinct(
                anchor(Kind::Attorney, CHEN).then(
                    Expand::new("n", Rel::RepresentedBy, Direction::In, "c")
                        .label(Kind::Claim.as_str())
                        .filter("is_fraud", false),
                ),
                "c",
            ),
            exactly(NEW_CLAIMS),
        ),
        Check::new(
            "Chen claims at Rapid Recovery",
            AggregateQuery::count_distinct(
                anchor(Kind::Attorney, CHEN)
                    .then(
                        Expand::new("n", Rel::RepresentedBy, Direction::In, "c")
                            .label(Kind::Claim.as_str())
                            .filter("is_fraud", false),
                    )
                    .then(Expand::new("c", Rel::TreatedAt, Direction::Out, "prov").filter("id", RAPID)),
                "c",
            ),
            exactly(RAPID_CLAIMS),
        ),
        Check::new(
            "Simmons formerly at Bernard's",
            AggregateQuery::count_distinct(
                anchor(Kind::Person, SIMMONS)
                    .then(Expand::new("n", Rel::FormerEmployeeOf, Direction::Out, "prov").filter("id", BERNARD)),
                "prov",
            ),
            exactly(1),
        ),
    ]
}
