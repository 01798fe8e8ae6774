//! Random names, addresses and identifiers for synthetic entities

use crate::model::LocationType;
use rand::seq::SliceRandom;
use rand::Rng;

const FIRST_NAMES: &[&str] = &[
    "James", "Mary", "John", "Patricia", "Robert", "Jennifer", "Michael", "Linda", "William",
    "Elizabeth", "David", "Barbara", "Richard", "Susan", "Joseph", "Jessica", "Thomas", "Sarah",
    "Charles", "Karen", "Christopher", "Nancy", "Daniel", "Lisa", "Matthew", "Betty", "Anthony",
    "Margaret", "Mark", "Sandra", "Donald", "Ashley", "Steven", "Kimberly", "Paul", "Emily",
    "Andrew", "Donna", "Joshua", "Michelle", "Kenneth", "Dorothy", "Kevin", "Carol", "Brian",
    "Amanda", "George", "Melissa", "Edward", "Deborah", "Ronald", "Stephanie", "Timothy",
    "Rebecca", "Jason", "Sharon",
];

const LAST_NAMES: &[&str] = &[
    "Smith", "Johnson", "Williams", "Brown", "Jones", "Garcia", "Miller", "Davis", "Rodriguez",
    "Martinez", "Hernandez", "Lopez", "Wilson", "Anderson", "Thomas", "Taylor", "Moore",
    "Jackson", "Martin", "Lee", "Thompson", "White", "Harris", "Clark", "Lewis", "Robinson",
    "Walker", "Young", "Allen", "King", "Wright", "Scott", "Green", "Baker", "Adams", "Nelson",
    "Hill", "Campbell", "Mitchell", "Roberts", "Carter", "Phillips", "Evans", "Turner", "Torres",
    "Parker", "Collins",
];

const STREETS: &[&str] = &[
    "Main Street", "Oak Avenue", "Maple Drive", "Cedar Lane", "Pine Road", "Elm Street",
    "Washington Boulevard", "Park Avenue", "Lake Drive", "River Road", "Highland Avenue",
    "Forest Drive", "Valley Road", "Spring Street", "Church Street", "Mill Road", "School Street",
    "North Street", "South Avenue", "West Drive",
];

/// (city, state, zip)
const CITIES: &[(&str, &str, &str)] = &[
    ("Atlanta", "GA", "30301"),
    ("Birmingham", "AL", "35201"),
    ("Charlotte", "NC", "28201"),
    ("Nashville", "TN", "37201"),
    ("Jacksonville", "FL", "32099"),
    ("Memphis", "TN", "38101"),
    ("Richmond", "VA", "23218"),
    ("Columbia", "SC", "29201"),
];

pub const PROVIDER_NAMES: &[&str] = &[
    "Community Health Center", "Family Medical Associates", "Metro Urgent Care",
    "Riverside Medical Group", "Valley Health Clinic", "Lakeside Medical",
    "Central Care Physicians", "Eastside Health Partners", "Westview Medical",
    "Northpoint Healthcare", "Southside Medical Center", "Heritage Health",
    "Cornerstone Medical", "Gateway Health Services", "Precision Medical Group",
];

pub const BODY_SHOP_NAMES: &[&str] = &[
    "Expert Auto Body", "Premier Collision Center", "Quality Auto Repair", "Elite Body Works",
    "Precision Collision", "Master Auto Body", "Champion Collision", "Superior Auto Repair",
];

pub const INCIDENT_TYPES: &[&str] = &[
    "Rear-End Collision",
    "Side Impact",
    "Parking Lot Incident",
    "Multi-Vehicle Accident",
    "Single Vehicle Accident",
];

fn pick<'a, R: Rng>(rng: &mut R, items: &'a [&'a str]) -> &'a str {
    items.choose(rng).copied().unwrap_or_default()
}

pub fn person_name<R: Rng>(rng: &mut R) -> String {
    format!("{} {}", pick(rng, FIRST_NAMES), pick(rng, LAST_NAMES))
}

pub fn attorney_name<R: Rng>(rng: &mut R) -> String {
    format!("{}, Esq.", person_name(rng))
}

pub fn street_address<R: Rng>(rng: &mut R) -> String {
    format!("{} {}", rng.gen_range(100..=9999), pick(rng, STREETS))
}

pub fn city_state<R: Rng>(rng: &mut R) -> (&'static str, &'static str, &'static str) {
    CITIES.choose(rng).copied().unwrap_or(CITIES[0])
}

pub fn ssn<R: Rng>(rng: &mut R) -> String {
    format!(
        "{}-{}-{}",
        rng.gen_range(100..=999),
        rng.gen_range(10..=99),
        rng.gen_range(1000..=9999)
    )
}

/// `555-XXX-XXXX`; uniqueness is the caller's concern
pub fn phone_number<R: Rng>(rng: &mut R) -> String {
    format!("555-{}-{}", rng.gen_range(100..=999), rng.gen_range(1000..=9999))
}

/// Dollar amount in `[low, high]`, rounded to cents
pub fn amount<R: Rng>(rng: &mut R, low: f64, high: f64) -> f64 {
    (rng.gen_range(low..=high) * 100.0).round() / 100.0
}

/// Background provider name; names repeat with a suffix past the list
pub fn provider_name(index: usize) -> String {
    let base = PROVIDER_NAMES[index % PROVIDER_NAMES.len()];
    match index / PROVIDER_NAMES.len() {
        0 => base.to_string(),
        round => format!("{} {}", base, round + 1),
    }
}

pub fn body_shop_name(index: usize) -> String {
    BODY_SHOP_NAMES[index % BODY_SHOP_NAMES.len()].to_string()
}

/// Accident location name and type from one of the road templates
pub fn location<R: Rng>(rng: &mut R) -> (String, LocationType) {
    let n = rng.gen_range(1..=50);
    match rng.gen_range(0..8) {
        0 => (format!("I-85 Exit {}", n), LocationType::Highway),
        1 => (format!("Highway 20 Mile {}", n), LocationType::Highway),
        2 => (format!("{} & Main Street", n), LocationType::Intersection),
        3 => (format!("{} & Oak Avenue", n), LocationType::Intersection),
        4 => (format!("Highway 78 Exit {}", n), LocationType::Highway),
        5 => (format!("I-20 Mile Marker {}", n), LocationType::Highway),
        6 => (
            format!("{} Street & {} Avenue", n, rng.gen_range(1..=20)),
            LocationType::Intersection,
        ),
        _ => (format!("Route {} Junction", n), LocationType::Highway),
    }
}

/// Coordinate within half a degree of `center`, rounded to 4 places
pub fn coordinate<R: Rng>(rng: &mut R, center: f64) -> f64 {
    ((center + rng.gen_range(-0.5..=0.5)) * 10_000.0).round() / 10_000.0
}
