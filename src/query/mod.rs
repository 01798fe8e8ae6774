//! Fixed, read-only query surface
//!
//! Walkthrough steps, exploration and verification express their reads as
//! small pattern descriptions instead of query strings:
//!
//! ```text
//! (anchor:Label {key IN values}) -[REL]-> (alias:Label {filter}) ...
//! ```
//!
//! A [`GraphQuery`] is either a union of such patterns or the undirected
//! neighborhood of one entity. An [`AggregateQuery`] reduces one pattern to a
//! single scalar. Both are evaluated natively by the embedded backend
//! ([`eval`]) and rendered to parameterised Cypher for a remote server
//! ([`cypher`]).

pub mod cypher;
pub mod eval;

use crate::error::{FraudRingError, FraudRingResult};
use crate::graph::{PropertyValue, EXTERNAL_ID_KEY};
use crate::model::Rel;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Largest neighborhood radius accepted
pub const MAX_HOPS: u8 = 5;

/// Property equality constraints, in declaration order
pub type PropertyFilter = IndexMap<String, PropertyValue>;

/// Direction of an expansion step, relative to its `from` node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Out,
    In,
    Both,
}

fn default_key() -> String {
    EXTERNAL_ID_KEY.to_string()
}

/// Starting nodes of a pattern
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anchor {
    pub alias: String,
    pub label: String,
    /// Property compared against `values`; the external id by default
    #[serde(default = "default_key")]
    pub key: String,
    /// Accepted values; empty means every node with the label
    #[serde(default)]
    pub values: Vec<PropertyValue>,
    #[serde(default, rename = "where", skip_serializing_if = "IndexMap::is_empty")]
    pub filter: PropertyFilter,
}

impl Anchor {
    pub fn by_id(alias: impl Into<String>, label: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            label: label.into(),
            key: default_key(),
            values: vec![PropertyValue::String(id.into())],
            filter: PropertyFilter::new(),
        }
    }

    pub fn by_property(
        alias: impl Into<String>,
        label: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<PropertyValue>,
    ) -> Self {
        Self {
            alias: alias.into(),
            label: label.into(),
            key: key.into(),
            values: vec![value.into()],
            filter: PropertyFilter::new(),
        }
    }
}

/// One relationship hop from an already bound alias
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expand {
    pub from: String,
    pub rel: Rel,
    #[serde(default)]
    pub direction: Direction,
    /// Alias bound to the far node; reusing a bound alias closes a cycle
    pub to: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default, rename = "where", skip_serializing_if = "IndexMap::is_empty")]
    pub filter: PropertyFilter,
    /// OPTIONAL MATCH semantics: keep the row and bind `Null` on no match
    #[serde(default)]
    pub optional: bool,
}

impl Expand {
    pub fn new(from: impl Into<String>, rel: Rel, direction: Direction, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            rel,
            direction,
            to: to.into(),
            label: None,
            filter: PropertyFilter::new(),
            optional: false,
        }
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn filter(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.filter.insert(key.into(), value.into());
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Column holding the matched relationship
    pub fn rel_alias(&self, step: usize) -> String {
        format!("r{}", step)
    }
}

/// An anchored chain of expansions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pattern {
    pub anchor: Anchor,
    #[serde(default)]
    pub expand: Vec<Expand>,
}

impl Pattern {
    pub fn new(anchor: Anchor) -> Self {
        Self {
            anchor,
            expand: Vec::new(),
        }
    }

    pub fn then(mut self, step: Expand) -> Self {
        self.expand.push(step);
        self
    }

    /// Result columns in binding order: anchor, then relationship and far
    /// node of each step (aliases reused to close a cycle appear once)
    pub fn columns(&self) -> Vec<String> {
        let mut columns = vec![self.anchor.alias.clone()];
        for (i, step) in self.expand.iter().enumerate() {
            columns.push(step.rel_alias(i));
            if !columns.contains(&step.to) {
                columns.push(step.to.clone());
            }
        }
        columns
    }

    pub fn validate(&self) -> FraudRingResult<()> {
        check_identifier(&self.anchor.alias)?;
        check_identifier(&self.anchor.label)?;
        check_identifier(&self.anchor.key)?;
        for key in self.anchor.filter.keys() {
            check_identifier(key)?;
        }

        let mut bound: HashSet<&str> = HashSet::new();
        bound.insert(self.anchor.alias.as_str());
        for (i, step) in self.expand.iter().enumerate() {
            check_identifier(&step.to)?;
            if let Some(label) = &step.label {
                check_identifier(label)?;
            }
            for key in step.filter.keys() {
                check_identifier(key)?;
            }
            if !bound.contains(step.from.as_str()) {
                return Err(FraudRingError::QueryError(format!(
                    "step {} expands from unbound alias '{}'",
                    i + 1,
                    step.from
                )));
            }
            if step.to == step.from {
                return Err(FraudRingError::QueryError(format!(
                    "step {} expands '{}' onto itself",
                    i + 1,
                    step.from
                )));
            }
            if step.to.starts_with('r') && step.to[1..].chars().all(|c| c.is_ascii_digit()) {
                return Err(FraudRingError::QueryError(format!(
                    "alias '{}' is reserved for relationships",
                    step.to
                )));
            }
            bound.insert(step.to.as_str());
        }
        Ok(())
    }
}

/// Read query issued by walkthrough steps and exploration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GraphQuery {
    /// Union of pattern branches, duplicate rows removed
    Patterns(Vec<Pattern>),
    /// Every node within `hops` undirected steps of the root
    Neighborhood { label: String, id: String, hops: u8 },
}

impl GraphQuery {
    pub fn pattern(pattern: Pattern) -> Self {
        GraphQuery::Patterns(vec![pattern])
    }

    /// Neighborhood query; the radius must lie in `1..=MAX_HOPS`
    pub fn neighborhood(label: impl Into<String>, id: impl Into<String>, hops: u8) -> FraudRingResult<Self> {
        let query = GraphQuery::Neighborhood {
            label: label.into(),
            id: id.into(),
            hops,
        };
        query.validate()?;
        Ok(query)
    }

    pub fn validate(&self) -> FraudRingResult<()> {
        match self {
            GraphQuery::Patterns(branches) => {
                if branches.is_empty() {
                    return Err(FraudRingError::QueryError("query has no patterns".into()));
                }
                branches.iter().try_for_each(Pattern::validate)
            }
            GraphQuery::Neighborhood { label, hops, .. } => {
                check_identifier(label)?;
                if !(1..=MAX_HOPS).contains(hops) {
                    return Err(FraudRingError::QueryError(format!(
                        "hop count {} outside 1..={}",
                        hops, MAX_HOPS
                    )));
                }
                Ok(())
            }
        }
    }

    /// Union of the branch columns in first-seen order
    pub fn columns(&self) -> Vec<String> {
        match self {
            GraphQuery::Patterns(branches) => {
                let mut columns: Vec<String> = Vec::new();
                for column in branches.iter().flat_map(Pattern::columns) {
                    if !columns.contains(&column) {
                        columns.push(column);
                    }
                }
                columns
            }
            GraphQuery::Neighborhood { .. } => vec!["n".to_string()],
        }
    }
}

/// Reduction applied to the rows of an aggregate pattern
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Measure {
    /// Number of distinct nodes bound to the alias
    CountDistinct(String),
    /// Sum of a numeric property over all rows
    Sum { alias: String, key: String },
    /// Property of the first bound node, `Null` when nothing matched
    Property { alias: String, key: String },
}

impl Measure {
    pub fn alias(&self) -> &str {
        match self {
            Measure::CountDistinct(alias) => alias,
            Measure::Sum { alias, .. } | Measure::Property { alias, .. } => alias,
        }
    }
}

/// A pattern reduced to one scalar; used by verification and admin stats
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateQuery {
    pub pattern: Pattern,
    pub measure: Measure,
}

impl AggregateQuery {
    pub fn count_distinct(pattern: Pattern, alias: impl Into<String>) -> Self {
        Self {
            pattern,
            measure: Measure::CountDistinct(alias.into()),
        }
    }

    pub fn sum(pattern: Pattern, alias: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            pattern,
            measure: Measure::Sum {
                alias: alias.into(),
                key: key.into(),
            },
        }
    }

    pub fn property(pattern: Pattern, alias: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            pattern,
            measure: Measure::Property {
                alias: alias.into(),
                key: key.into(),
            },
        }
    }

    pub fn validate(&self) -> FraudRingResult<()> {
        self.pattern.validate()?;
        if let Measure::Sum { key, .. } | Measure::Property { key, .. } = &self.measure {
            check_identifier(key)?;
        }
        let alias = self.measure.alias();
        if !self.pattern.columns().iter().any(|c| c == alias) {
            return Err(FraudRingError::QueryError(format!(
                "aggregate over unknown alias '{}'",
                alias
            )));
        }
        Ok(())
    }
}

/// Labels, aliases and keys are spliced into Cypher text, so only plain
/// identifiers are accepted.
pub(crate) fn check_identifier(name: &str) -> FraudRingResult<()> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(FraudRingError::QueryError(format!("invalid identifier '{}'", name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn webb_clients() -> Pattern {
        Pattern::new(Anchor::by_id("a", "Attorney", "ATT_S1_WEBB"))
            .then(Expand::new("a", Rel::RepresentedBy, Direction::In, "c").label("Claim"))
            .then(Expand::new("c", Rel::FiledBy, Direction::Out, "p").label("Person"))
    }

    #[test]
    fn test_columns_in_binding_order() {
        assert_eq!(webb_clients().columns(), vec!["a", "r0", "c", "r1", "p"]);
    }

    #[test]
    fn test_union_columns_merge() {
        let other = Pattern::new(Anchor::by_id("a", "Attorney", "ATT_S1_WEBB"))
            .then(Expand::new("a", Rel::Employs, Direction::Out, "e"));
        let query = GraphQuery::Patterns(vec![webb_clients(), other]);
        assert_eq!(query.columns(), vec!["a", "r0", "c", "r1", "p", "e"]);
    }

    #[test]
    fn test_hop_bounds() {
        assert!(GraphQuery::neighborhood("Claim", "CLM_BG_00000", 1).is_ok());
        assert!(GraphQuery::neighborhood("Claim", "CLM_BG_00000", 5).is_ok());
        for hops in [0, 6] {
            let err = GraphQuery::neighborhood("Claim", "CLM_BG_00000", hops).unwrap_err();
            assert!(matches!(err, FraudRingError::QueryError(_)));
        }
    }

    #[test]
    fn test_unbound_alias_rejected() {
        let bad = Pattern::new(Anchor::by_id("a", "Attorney", "ATT_S1_WEBB"))
            .then(Expand::new("x", Rel::RepresentedBy, Direction::In, "c"));
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_identifiers_checked() {
        assert!(check_identifier("Provider").is_ok());
        assert!(check_identifier("_tmp1").is_ok());
        assert!(check_identifier("").is_err());
        assert!(check_identifier("1abc").is_err());
        assert!(check_identifier("n) DETACH DELETE (m").is_err());

        let bad = GraphQuery::pattern(Pattern::new(Anchor::by_id("a", "Attorney`", "X")));
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_aggregate_alias_must_exist() {
        let ok = AggregateQuery::count_distinct(webb_clients(), "c");
        assert!(ok.validate().is_ok());
        let bad = AggregateQuery::count_distinct(webb_clients(), "zz");
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_pattern_from_yaml() {
        let yaml = r#"
patterns:
  - anchor: { alias: prov, label: Provider, values: [PROV_S3_SUNRISE] }
    expand:
      - { from: prov, rel: TREATED_AT, direction: in, to: c, label: Claim }
      - { from: c, rel: REPRESENTED_BY, to: att, where: { id: ATT_S3_VEGA } }
      - { from: c, rel: WITNESSED_BY, to: w, optional: true }
"#;
        let query: GraphQuery = serde_yaml::from_str(yaml).unwrap();
        let GraphQuery::Patterns(branches) = &query else {
            panic!("expected patterns");
        };
        let pattern = &branches[0];
        assert_eq!(pattern.anchor.key, "id");
        assert_eq!(pattern.expand[0].direction, Direction::In);
        assert_eq!(pattern.expand[1].direction, Direction::Out);
        assert_eq!(pattern.expand[1].filter["id"], PropertyValue::from("ATT_S3_VEGA"));
        assert!(pattern.expand[2].optional);
        assert!(query.validate().is_ok());
    }
}
