//! Typed entities of the insurance-claims graph
//!
//! Every entity converts into a [`NodeSpec`] (labels plus properties) that a
//! [`GraphBackend`](crate::backend::GraphBackend) can create, and exposes a
//! [`NodeRef`] used to connect it to other entities.

use crate::graph::{Label, PropertyMap, PropertyValue, EXTERNAL_ID_KEY};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Date format used for every date property
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Primary entity type; the first label of every node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Kind {
    Claim,
    Person,
    Provider,
    Attorney,
    BodyShop,
    Address,
    Phone,
    Location,
}

impl Kind {
    pub const ALL: [Kind; 8] = [
        Kind::Claim,
        Kind::Person,
        Kind::Provider,
        Kind::Attorney,
        Kind::BodyShop,
        Kind::Address,
        Kind::Phone,
        Kind::Location,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Claim => "Claim",
            Kind::Person => "Person",
            Kind::Provider => "Provider",
            Kind::Attorney => "Attorney",
            Kind::BodyShop => "BodyShop",
            Kind::Address => "Address",
            Kind::Phone => "Phone",
            Kind::Location => "Location",
        }
    }

    pub fn label(&self) -> Label {
        Label::new(self.as_str())
    }
}

/// Role tags a `Person` node can carry in addition to its primary label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Claimant,
    Witness,
    Adjuster,
    Employee,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Claimant => "Claimant",
            Role::Witness => "Witness",
            Role::Adjuster => "Adjuster",
            Role::Employee => "Employee",
        }
    }
}

/// Relationship types of the claims graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Rel {
    FiledBy,
    TreatedAt,
    RepresentedBy,
    HandledBy,
    WitnessedBy,
    RepairedAt,
    OccurredAt,
    LivesAt,
    HasPhone,
    LocatedAt,
    Employs,
    RegisteredAgent,
    OwnedBy,
    MarriedTo,
    FormerEmployeeOf,
}

impl Rel {
    pub const ALL: [Rel; 15] = [
        Rel::FiledBy,
        Rel::TreatedAt,
        Rel::RepresentedBy,
        Rel::HandledBy,
        Rel::WitnessedBy,
        Rel::RepairedAt,
        Rel::OccurredAt,
        Rel::LivesAt,
        Rel::HasPhone,
        Rel::LocatedAt,
        Rel::Employs,
        Rel::RegisteredAgent,
        Rel::OwnedBy,
        Rel::MarriedTo,
        Rel::FormerEmployeeOf,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Rel::FiledBy => "FILED_BY",
            Rel::TreatedAt => "TREATED_AT",
            Rel::RepresentedBy => "REPRESENTED_BY",
            Rel::HandledBy => "HANDLED_BY",
            Rel::WitnessedBy => "WITNESSED_BY",
            Rel::RepairedAt => "REPAIRED_AT",
            Rel::OccurredAt => "OCCURRED_AT",
            Rel::LivesAt => "LIVES_AT",
            Rel::HasPhone => "HAS_PHONE",
            Rel::LocatedAt => "LOCATED_AT",
            Rel::Employs => "EMPLOYS",
            Rel::RegisteredAgent => "REGISTERED_AGENT",
            Rel::OwnedBy => "OWNED_BY",
            Rel::MarriedTo => "MARRIED_TO",
            Rel::FormerEmployeeOf => "FORMER_EMPLOYEE_OF",
        }
    }

    pub fn from_name(name: &str) -> Option<Rel> {
        Rel::ALL.iter().copied().find(|r| r.as_str() == name)
    }

    /// Lower-case phrase shown on edges in a rendered graph
    pub fn display_label(&self) -> &'static str {
        match self {
            Rel::FiledBy => "filed by",
            Rel::TreatedAt => "treated at",
            Rel::RepresentedBy => "represented by",
            Rel::HandledBy => "handled by",
            Rel::WitnessedBy => "witnessed by",
            Rel::RepairedAt => "repaired at",
            Rel::OccurredAt => "occurred at",
            Rel::LivesAt => "lives at",
            Rel::HasPhone => "uses phone",
            Rel::LocatedAt => "located at",
            Rel::Employs => "employs",
            Rel::RegisteredAgent => "registered agent",
            Rel::OwnedBy => "owned by",
            Rel::MarriedTo => "married to",
            Rel::FormerEmployeeOf => "formerly at",
        }
    }
}

impl fmt::Display for Rel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Isolation tag written on every entity a scenario creates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ScenarioTag {
    #[serde(rename = "scenario_1")]
    CaptiveMill,
    #[serde(rename = "scenario_2")]
    IdentityWeb,
    #[serde(rename = "scenario_3")]
    ProviderAudit,
    #[serde(rename = "scenario_4")]
    NetworkMigration,
}

impl ScenarioTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScenarioTag::CaptiveMill => "scenario_1",
            ScenarioTag::IdentityWeb => "scenario_2",
            ScenarioTag::ProviderAudit => "scenario_3",
            ScenarioTag::NetworkMigration => "scenario_4",
        }
    }
}

impl fmt::Display for ScenarioTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reference to an existing node by primary label and external id
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeRef {
    pub kind: Kind,
    pub id: String,
}

impl NodeRef {
    pub fn new(kind: Kind, id: impl Into<String>) -> Self {
        Self { kind, id: id.into() }
    }
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}:{})", self.kind.as_str(), self.id)
    }
}

/// Labels and properties of a node about to be created
#[derive(Debug, Clone, PartialEq)]
pub struct NodeSpec {
    pub kind: Kind,
    pub labels: Vec<Label>,
    pub properties: PropertyMap,
}

impl NodeSpec {
    fn new(kind: Kind, id: &str) -> Self {
        let mut properties = PropertyMap::new();
        properties.insert(EXTERNAL_ID_KEY.to_string(), id.into());
        Self {
            kind,
            labels: vec![kind.label()],
            properties,
        }
    }

    fn with_role(mut self, role: Role) -> Self {
        let label = Label::new(role.as_str());
        if !self.labels.contains(&label) {
            self.labels.push(label);
        }
        self
    }

    fn set(mut self, key: &str, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(key.to_string(), value.into());
        self
    }

    fn set_opt<V: Into<PropertyValue>>(self, key: &str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.set(key, v),
            None => self,
        }
    }

    fn tagged(self, scenario: Option<ScenarioTag>) -> Self {
        self.set_opt("scenario", scenario.map(|s| s.as_str()))
    }

    pub fn external_id(&self) -> Option<&str> {
        self.properties.get(EXTERNAL_ID_KEY).and_then(|v| v.as_string())
    }

    pub fn node_ref(&self) -> Option<NodeRef> {
        self.external_id().map(|id| NodeRef::new(self.kind, id))
    }

    pub fn scenario(&self) -> Option<&str> {
        self.properties.get("scenario").and_then(|v| v.as_string())
    }
}

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClaimStatus {
    Open,
    Closed,
    Denied,
}

impl ClaimStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimStatus::Open => "Open",
            ClaimStatus::Closed => "Closed",
            ClaimStatus::Denied => "Denied",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Claim {
    pub id: String,
    pub name: String,
    pub amount: f64,
    pub date: NaiveDate,
    pub incident_type: String,
    pub status: ClaimStatus,
    pub is_fraud: bool,
    pub fraud_type: Option<String>,
    pub scenario: Option<ScenarioTag>,
}

impl Claim {
    pub fn node_ref(&self) -> NodeRef {
        NodeRef::new(Kind::Claim, &self.id)
    }
}

impl From<Claim> for NodeSpec {
    fn from(c: Claim) -> Self {
        NodeSpec::new(Kind::Claim, &c.id)
            .set("name", c.name)
            .set("claim_amount", c.amount)
            .set("claim_date", format_date(c.date))
            .set("claim_type", "Auto")
            .set("incident_type", c.incident_type)
            .set("status", c.status.as_str())
            .set("is_fraud", c.is_fraud)
            .set_opt("fraud_type", c.fraud_type)
            .tagged(c.scenario)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Person {
    pub id: String,
    pub name: String,
    pub roles: Vec<Role>,
    /// Free-text role property, e.g. "Registered Agent" or "Owner"
    pub role: Option<String>,
    pub job_title: Option<String>,
    pub ssn: Option<String>,
    pub employee_id: Option<String>,
    pub is_fraud: Option<bool>,
    pub scenario: Option<ScenarioTag>,
}

impl Person {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_role(mut self, role: Role) -> Self {
        if !self.roles.contains(&role) {
            self.roles.push(role);
        }
        if self.role.is_none() {
            self.role = Some(role.as_str().to_string());
        }
        self
    }

    pub fn node_ref(&self) -> NodeRef {
        NodeRef::new(Kind::Person, &self.id)
    }
}

impl From<Person> for NodeSpec {
    fn from(p: Person) -> Self {
        let spec = p
            .roles
            .iter()
            .fold(NodeSpec::new(Kind::Person, &p.id), |spec, role| spec.with_role(*role));
        spec.set("name", p.name)
            .set_opt("role", p.role)
            .set_opt("job_title", p.job_title)
            .set_opt("ssn", p.ssn)
            .set_opt("employee_id", p.employee_id)
            .set_opt("is_fraud", p.is_fraud)
            .tagged(p.scenario)
    }
}

#[derive(Debug, Clone)]
pub struct Provider {
    pub id: String,
    pub name: String,
    pub license: String,
    pub opened: NaiveDate,
    pub closed: Option<NaiveDate>,
    pub status: String,
    pub is_fraud: Option<bool>,
    pub fraud_type: Option<String>,
    pub billing_pct_above_peer: Option<i64>,
    pub legitimate_high_volume: bool,
    pub scenario: Option<ScenarioTag>,
}

impl Provider {
    pub fn active(id: impl Into<String>, name: impl Into<String>, license: impl Into<String>, opened: NaiveDate) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            license: license.into(),
            opened,
            closed: None,
            status: "Active".to_string(),
            is_fraud: None,
            fraud_type: None,
            billing_pct_above_peer: None,
            legitimate_high_volume: false,
            scenario: None,
        }
    }

    pub fn node_ref(&self) -> NodeRef {
        NodeRef::new(Kind::Provider, &self.id)
    }
}

impl From<Provider> for NodeSpec {
    fn from(p: Provider) -> Self {
        let spec = NodeSpec::new(Kind::Provider, &p.id)
            .set("name", p.name)
            .set("license", p.license)
            .set("opened_date", format_date(p.opened))
            .set_opt("closed_date", p.closed.map(format_date))
            .set("status", p.status)
            .set_opt("is_fraud", p.is_fraud)
            .set_opt("fraud_type", p.fraud_type)
            .set_opt("avg_billing_pct_above_peer", p.billing_pct_above_peer)
            .tagged(p.scenario);
        if p.legitimate_high_volume {
            spec.set("legitimate_high_volume", true)
        } else {
            spec
        }
    }
}

#[derive(Debug, Clone)]
pub struct Attorney {
    pub id: String,
    pub name: String,
    pub bar_number: String,
    pub scenario: Option<ScenarioTag>,
}

impl Attorney {
    pub fn node_ref(&self) -> NodeRef {
        NodeRef::new(Kind::Attorney, &self.id)
    }
}

impl From<Attorney> for NodeSpec {
    fn from(a: Attorney) -> Self {
        NodeSpec::new(Kind::Attorney, &a.id)
            .set("name", a.name)
            .set("bar_number", a.bar_number)
            .tagged(a.scenario)
    }
}

#[derive(Debug, Clone)]
pub struct BodyShop {
    pub id: String,
    pub name: String,
    pub license: String,
}

impl BodyShop {
    pub fn node_ref(&self) -> NodeRef {
        NodeRef::new(Kind::BodyShop, &self.id)
    }
}

impl From<BodyShop> for NodeSpec {
    fn from(b: BodyShop) -> Self {
        NodeSpec::new(Kind::BodyShop, &b.id)
            .set("name", b.name)
            .set("license", b.license)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AddressType {
    Business,
    Residential,
}

impl AddressType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AddressType::Business => "Business",
            AddressType::Residential => "Residential",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Address {
    pub id: String,
    pub street: String,
    pub unit: Option<String>,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub kind: AddressType,
    /// Set on addresses legitimately shared by a household, e.g. "Married Couple"
    pub shared_by: Option<String>,
    pub scenario: Option<ScenarioTag>,
}

impl Address {
    pub fn node_ref(&self) -> NodeRef {
        NodeRef::new(Kind::Address, &self.id)
    }

    /// Street, unit and city on one line
    pub fn one_line(&self) -> String {
        let mut parts = vec![self.street.clone()];
        if let Some(unit) = &self.unit {
            parts.push(unit.clone());
        }
        parts.push(format!("{}, {} {}", self.city, self.state, self.zip));
        parts.join(", ")
    }
}

impl From<Address> for NodeSpec {
    fn from(a: Address) -> Self {
        let shared = a.shared_by.is_some();
        let spec = NodeSpec::new(Kind::Address, &a.id)
            .set("name", a.one_line())
            .set("street", a.street)
            .set_opt("unit", a.unit)
            .set("city", a.city)
            .set("state", a.state)
            .set("zip", a.zip)
            .set("type", a.kind.as_str())
            .set_opt("relationship", a.shared_by)
            .tagged(a.scenario);
        if shared {
            spec.set("legitimate_shared", true)
        } else {
            spec
        }
    }
}

#[derive(Debug, Clone)]
pub struct Phone {
    pub id: String,
    pub number: String,
    pub scenario: Option<ScenarioTag>,
}

impl Phone {
    pub fn node_ref(&self) -> NodeRef {
        NodeRef::new(Kind::Phone, &self.id)
    }
}

impl From<Phone> for NodeSpec {
    fn from(p: Phone) -> Self {
        NodeSpec::new(Kind::Phone, &p.id)
            .set("name", p.number.clone())
            .set("number", p.number)
            .tagged(p.scenario)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LocationType {
    Highway,
    Intersection,
}

impl LocationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LocationType::Highway => "Highway",
            LocationType::Intersection => "Intersection",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Location {
    pub id: String,
    pub name: String,
    pub kind: LocationType,
    pub lat: f64,
    pub lng: f64,
    pub high_traffic: bool,
    pub scenario: Option<ScenarioTag>,
}

impl Location {
    pub fn node_ref(&self) -> NodeRef {
        NodeRef::new(Kind::Location, &self.id)
    }
}

impl From<Location> for NodeSpec {
    fn from(l: Location) -> Self {
        let spec = NodeSpec::new(Kind::Location, &l.id)
            .set("name", l.name)
            .set("type", l.kind.as_str())
            .set("lat", l.lat)
            .set("lng", l.lng)
            .tagged(l.scenario);
        if l.high_traffic {
            spec.set("high_traffic", true)
        } else {
            spec
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rel_names_round_trip() {
        for rel in Rel::ALL {
            assert_eq!(Rel::from_name(rel.as_str()), Some(rel));
        }
        assert_eq!(Rel::from_name("KNOWS"), None);
        assert_eq!(serde_json::to_string(&Rel::FormerEmployeeOf).unwrap(), "\"FORMER_EMPLOYEE_OF\"");
    }

    #[test]
    fn test_person_roles_become_labels() {
        let maria = Person {
            job_title: Some("Patient Coordinator / Paralegal".into()),
            scenario: Some(ScenarioTag::CaptiveMill),
            ..Person::new("P_S1_MARIA", "Maria Santos")
        }
        .with_role(Role::Employee)
        .with_role(Role::Witness);

        let spec = NodeSpec::from(maria);
        let labels: Vec<&str> = spec.labels.iter().map(|l| l.as_str()).collect();
        assert_eq!(labels, vec!["Person", "Employee", "Witness"]);
        assert_eq!(spec.properties["role"].as_string(), Some("Employee"));
        assert_eq!(spec.scenario(), Some("scenario_1"));
        assert_eq!(spec.node_ref(), Some(NodeRef::new(Kind::Person, "P_S1_MARIA")));
    }

    #[test]
    fn test_claim_properties() {
        let claim = Claim {
            id: "CLM_S4_BER_00001".into(),
            name: "Auto Claim - FRAUD CONFIRMED".into(),
            amount: 21000.5,
            date: NaiveDate::from_ymd_opt(2025, 1, 9).unwrap(),
            incident_type: "Staged Accident".into(),
            status: ClaimStatus::Denied,
            is_fraud: true,
            fraud_type: Some("Medical Mill".into()),
            scenario: Some(ScenarioTag::NetworkMigration),
        };
        let spec = NodeSpec::from(claim);
        assert_eq!(spec.properties["claim_date"].as_string(), Some("2025-01-09"));
        assert_eq!(spec.properties["is_fraud"].as_boolean(), Some(true));
        assert_eq!(spec.properties["status"].as_string(), Some("Denied"));
        assert_eq!(spec.properties["claim_amount"].as_float(), Some(21000.5));
    }

    #[test]
    fn test_untagged_background_entities_have_no_scenario() {
        let phone = Phone {
            id: "PH_00001".into(),
            number: "555-123-4567".into(),
            scenario: None,
        };
        assert_eq!(NodeSpec::from(phone).scenario(), None);
    }

    #[test]
    fn test_shared_address_flags() {
        let addr = Address {
            id: "ADDR_S3_COUPLE_0".into(),
            street: "12 Oak Avenue".into(),
            unit: None,
            city: "Atlanta".into(),
            state: "GA".into(),
            zip: "30301".into(),
            kind: AddressType::Residential,
            shared_by: Some("Married Couple".into()),
            scenario: Some(ScenarioTag::ProviderAudit),
        };
        assert_eq!(addr.one_line(), "12 Oak Avenue, Atlanta, GA 30301");
        let spec = NodeSpec::from(addr);
        assert_eq!(spec.properties["legitimate_shared"].as_boolean(), Some(true));
        assert_eq!(spec.properties["relationship"].as_string(), Some("Married Couple"));
    }
}
