//! Rendering of queries and writes to parameterised Cypher
//!
//! Values always travel as `$pN` parameters; only labels, aliases,
//! relationship types and property keys are spliced into the text, and
//! those are validated identifiers.

use super::{AggregateQuery, Direction, Expand, GraphQuery, Measure, Pattern, PropertyFilter};
use crate::backend::IndexSpec;
use crate::error::FraudRingResult;
use crate::graph::PropertyValue;
use crate::model::{NodeRef, NodeSpec, Rel};
use serde::Serialize;
use serde_json::{Map, Value};

/// Most rows returned when listing the entities of one label
pub const ENTITY_LIST_LIMIT: usize = 500;

/// One Cypher statement with its parameters, in the shape of the HTTP
/// transactional API request body
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statement {
    pub statement: String,
    pub parameters: Map<String, Value>,
}

impl Statement {
    pub fn new(statement: impl Into<String>) -> Self {
        Self {
            statement: statement.into(),
            parameters: Map::new(),
        }
    }

    pub fn param(mut self, name: &str, value: Value) -> Self {
        self.parameters.insert(name.to_string(), value);
        self
    }
}

#[derive(Default)]
struct Params {
    values: Map<String, Value>,
}

impl Params {
    fn bind(&mut self, value: Value) -> String {
        let name = format!("p{}", self.values.len());
        self.values.insert(name.clone(), value);
        format!("${}", name)
    }
}

fn where_clause(alias: &str, filter: &PropertyFilter, params: &mut Params, mut conditions: Vec<String>) -> String {
    for (key, value) in filter {
        let p = params.bind(value.to_json());
        conditions.push(format!("{}.{} = {}", alias, key, p));
    }
    if conditions.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", conditions.join(" AND "))
    }
}

fn relationship(step: &Expand, index: usize) -> String {
    let rel = format!("[{}:{}]", step.rel_alias(index), step.rel.as_str());
    match step.direction {
        Direction::Out => format!("-{}->", rel),
        Direction::In => format!("<-{}-", rel),
        Direction::Both => format!("-{}-", rel),
    }
}

/// MATCH / OPTIONAL MATCH clauses of one pattern, one per line
fn match_clauses(pattern: &Pattern, params: &mut Params) -> Vec<String> {
    let anchor = &pattern.anchor;
    let mut anchor_conditions = Vec::new();
    match anchor.values.as_slice() {
        [] => {}
        [single] => {
            let p = params.bind(single.to_json());
            anchor_conditions.push(format!("{}.{} = {}", anchor.alias, anchor.key, p));
        }
        many => {
            let list = Value::Array(many.iter().map(PropertyValue::to_json).collect());
            let p = params.bind(list);
            anchor_conditions.push(format!("{}.{} IN {}", anchor.alias, anchor.key, p));
        }
    }

    let mut clauses = vec![format!(
        "MATCH ({}:{}){}",
        anchor.alias,
        anchor.label,
        where_clause(&anchor.alias, &anchor.filter, params, anchor_conditions)
    )];

    let mut bound = vec![anchor.alias.as_str()];
    for (i, step) in pattern.expand.iter().enumerate() {
        let target = if bound.contains(&step.to.as_str()) {
            format!("({})", step.to)
        } else {
            match &step.label {
                Some(label) => format!("({}:{})", step.to, label),
                None => format!("({})", step.to),
            }
        };
        bound.push(step.to.as_str());
        clauses.push(format!(
            "{} ({}){}{}{}",
            if step.optional { "OPTIONAL MATCH" } else { "MATCH" },
            step.from,
            relationship(step, i),
            target,
            where_clause(&step.to, &step.filter, params, Vec::new())
        ));
    }
    clauses
}

impl GraphQuery {
    /// Render to one Cypher statement; union branches return the same
    /// columns, padded with `null`
    pub fn to_cypher(&self) -> FraudRingResult<Statement> {
        self.validate()?;
        let mut params = Params::default();
        let text = match self {
            GraphQuery::Patterns(branches) => {
                let columns = self.columns();
                branches
                    .iter()
                    .map(|branch| {
                        let own = branch.columns();
                        let mut lines = match_clauses(branch, &mut params);
                        let projection: Vec<String> = columns
                            .iter()
                            .map(|c| {
                                if own.contains(c) {
                                    c.clone()
                                } else {
                                    format!("null AS {}", c)
                                }
                            })
                            .collect();
                        lines.push(format!("RETURN DISTINCT {}", projection.join(", ")));
                        lines.join("\n")
                    })
                    .collect::<Vec<_>>()
                    .join("\nUNION\n")
            }
            GraphQuery::Neighborhood { label, id, hops } => {
                let p = params.bind(Value::String(id.clone()));
                format!(
                    "MATCH path = (root:{} {{id: {}}})-[*1..{}]-(connected)\nUNWIND nodes(path) AS n\nRETURN DISTINCT n",
                    label, p, hops
                )
            }
        };
        Ok(Statement {
            statement: text,
            parameters: params.values,
        })
    }
}

impl AggregateQuery {
    /// Render to one Cypher statement returning a single `value` column
    pub fn to_cypher(&self) -> FraudRingResult<Statement> {
        self.validate()?;
        let mut params = Params::default();
        let mut lines = match_clauses(&self.pattern, &mut params);
        lines.push(match &self.measure {
            Measure::CountDistinct(alias) => format!("RETURN count(DISTINCT {}) AS value", alias),
            Measure::Sum { alias, key } => format!("RETURN sum({}.{}) AS value", alias, key),
            Measure::Property { alias, key } => format!("RETURN {}.{} AS value LIMIT 1", alias, key),
        });
        Ok(Statement {
            statement: lines.join("\n"),
            parameters: params.values,
        })
    }
}

fn props_json(spec: &NodeSpec) -> Map<String, Value> {
    spec.properties
        .iter()
        .filter(|(_, v)| !v.is_null())
        .map(|(k, v)| (k.clone(), v.to_json()))
        .collect()
}

pub fn create_node(spec: &NodeSpec) -> Statement {
    let labels: Vec<&str> = spec.labels.iter().map(|l| l.as_str()).collect();
    Statement::new(format!("CREATE (n:{}) SET n = $props", labels.join(":")))
        .param("props", Value::Object(props_json(spec)))
}

/// Relationship creation; returns a `created` count of 0 when either end is
/// missing
pub fn connect(from: &NodeRef, rel: Rel, to: &NodeRef) -> Statement {
    Statement::new(format!(
        "MATCH (a:{} {{id: $from}}), (b:{} {{id: $to}})\nCREATE (a)-[:{}]->(b)\nRETURN count(*) AS created",
        from.kind.as_str(),
        to.kind.as_str(),
        rel.as_str()
    ))
    .param("from", Value::String(from.id.clone()))
    .param("to", Value::String(to.id.clone()))
}

pub fn create_index(index: &IndexSpec) -> FraudRingResult<Statement> {
    super::check_identifier(&index.label)?;
    super::check_identifier(&index.property)?;
    Ok(Statement::new(format!(
        "CREATE INDEX {} IF NOT EXISTS FOR (n:{}) ON (n.{})",
        index.name(),
        index.label,
        index.property
    )))
}

pub fn clear() -> Statement {
    Statement::new("MATCH (n) DETACH DELETE n")
}

/// Admin counts, one statement per figure: nodes, relationships, claims,
/// fraudulent claims
pub fn stats() -> Vec<Statement> {
    vec![
        Statement::new("MATCH (n) RETURN count(n) AS count"),
        Statement::new("MATCH ()-[r]->() RETURN count(r) AS count"),
        Statement::new("MATCH (c:Claim) RETURN count(c) AS count"),
        Statement::new("MATCH (c:Claim {is_fraud: true}) RETURN count(c) AS count"),
    ]
}

pub fn labels() -> Statement {
    Statement::new("CALL db.labels() YIELD label RETURN label ORDER BY label")
}

pub fn entities(label: &str) -> FraudRingResult<Statement> {
    super::check_identifier(label)?;
    Ok(Statement::new(format!(
        "MATCH (n:{})\nRETURN n.id AS id, coalesce(n.name, n.number, n.street, n.id) AS display\nORDER BY n.name, n.number\nLIMIT {}",
        label, ENTITY_LIST_LIMIT
    )))
}

/// Every relationship between nodes whose external ids are listed
pub fn relationships_among(ids: &[String]) -> Statement {
    Statement::new("MATCH (a)-[r]->(b)\nWHERE a.id IN $ids AND b.id IN $ids\nRETURN a AS source, r, b AS target")
        .param("ids", Value::Array(ids.iter().cloned().map(Value::String).collect()))
}

pub fn ping() -> Statement {
    Statement::new("RETURN 1 AS ok")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::Anchor;

    #[test]
    fn test_pattern_rendering() {
        let query = GraphQuery::pattern(
            Pattern::new(Anchor::by_id("prov", "Provider", "PROV_S3_SUNRISE"))
                .then(Expand::new("prov", Rel::TreatedAt, Direction::In, "c").label("Claim"))
                .then(
                    Expand::new("c", Rel::RepresentedBy, Direction::Out, "att")
                        .filter("id", "ATT_S3_VEGA")
                        .optional(),
                ),
        );
        let stmt = query.to_cypher().unwrap();
        assert_eq!(
            stmt.statement,
            "MATCH (prov:Provider) WHERE prov.id = $p0\n\
             MATCH (prov)<-[r0:TREATED_AT]-(c:Claim)\n\
             OPTIONAL MATCH (c)-[r1:REPRESENTED_BY]->(att) WHERE att.id = $p1\n\
             RETURN DISTINCT prov, r0, c, r1, att"
        );
        assert_eq!(stmt.parameters["p0"], Value::String("PROV_S3_SUNRISE".into()));
        assert_eq!(stmt.parameters["p1"], Value::String("ATT_S3_VEGA".into()));
    }

    #[test]
    fn test_union_pads_missing_columns() {
        let a = Pattern::new(Anchor::by_id("ph", "Phone", "PH_S2_MAIN"))
            .then(Expand::new("ph", Rel::HasPhone, Direction::In, "p"));
        let b = Pattern::new(Anchor::by_id("addr", "Address", "ADDR_S2_OAK"))
            .then(Expand::new("addr", Rel::LivesAt, Direction::In, "p"));
        let stmt = GraphQuery::Patterns(vec![a, b]).to_cypher().unwrap();
        let parts: Vec<&str> = stmt.statement.split("\nUNION\n").collect();
        assert_eq!(parts.len(), 2);
        assert!(parts[0].ends_with("RETURN DISTINCT ph, r0, p, null AS addr"));
        assert!(parts[1].ends_with("RETURN DISTINCT null AS ph, r0, p, addr"));
        assert_eq!(stmt.parameters.len(), 2);
    }

    #[test]
    fn test_neighborhood_rendering() {
        let stmt = GraphQuery::neighborhood("Attorney", "ATT_S1_WEBB", 2)
            .unwrap()
            .to_cypher()
            .unwrap();
        assert!(stmt.statement.contains("(root:Attorney {id: $p0})-[*1..2]-(connected)"));
    }

    #[test]
    fn test_aggregate_rendering() {
        let pattern = Pattern::new(Anchor::by_id("a", "Attorney", "ATT_S4_CHEN"))
            .then(Expand::new("a", Rel::RepresentedBy, Direction::In, "c").filter("is_fraud", false));
        let stmt = AggregateQuery::count_distinct(pattern, "c").to_cypher().unwrap();
        assert!(stmt.statement.ends_with("RETURN count(DISTINCT c) AS value"));
        assert_eq!(stmt.parameters["p1"], Value::Bool(false));
    }

    #[test]
    fn test_write_statements() {
        let stmt = connect(
            &NodeRef::new(crate::model::Kind::Claim, "CLM_BG_00000"),
            Rel::FiledBy,
            &NodeRef::new(crate::model::Kind::Person, "P_BG_00000"),
        );
        assert!(stmt.statement.contains("CREATE (a)-[:FILED_BY]->(b)"));
        assert_eq!(stmt.parameters["to"], Value::String("P_BG_00000".into()));

        let index = create_index(&IndexSpec::new("Phone", "number")).unwrap();
        assert_eq!(
            index.statement,
            "CREATE INDEX phone_number IF NOT EXISTS FOR (n:Phone) ON (n.number)"
        );
        assert!(entities("Bad Label").is_err());
    }
}
