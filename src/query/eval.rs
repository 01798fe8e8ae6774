//! Native evaluation of query patterns against the embedded [`GraphStore`]
//!
//! Rows are built breadth-first, one expansion step at a time, the way a
//! chain of `MATCH` / `OPTIONAL MATCH` clauses is evaluated. Bindings stay
//! lazy (ids only); the embedded backend materialises them afterwards.

use super::{AggregateQuery, Direction, Expand, Measure, Pattern, PropertyFilter};
use crate::graph::{EdgeId, GraphStore, Label, Node, NodeId, PropertyValue};
use std::collections::{HashMap, HashSet, VecDeque};

/// Value bound to a column of a result row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Binding {
    Node(NodeId),
    Edge(EdgeId),
    Null,
}

type Bindings = HashMap<String, Binding>;

/// Rows of a pattern union, aligned with `columns`
#[derive(Debug, Clone, Default)]
pub struct Matches {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Binding>>,
}

impl Matches {
    /// Distinct nodes bound anywhere in the rows, in first-seen order
    pub fn node_ids(&self) -> Vec<NodeId> {
        let mut seen = HashSet::new();
        self.rows
            .iter()
            .flatten()
            .filter_map(|b| match b {
                Binding::Node(id) if seen.insert(*id) => Some(*id),
                _ => None,
            })
            .collect()
    }
}

fn passes(node: &Node, filter: &PropertyFilter) -> bool {
    filter
        .iter()
        .all(|(key, value)| node.get_property(key).map_or(false, |v| v.matches(value)))
}

fn anchor_nodes(store: &GraphStore, pattern: &Pattern) -> Vec<NodeId> {
    let anchor = &pattern.anchor;
    let label = Label::new(anchor.label.as_str());
    let candidates: Vec<&Node> = if anchor.values.is_empty() {
        store.nodes_by_label(&label)
    } else {
        let mut seen = HashSet::new();
        anchor
            .values
            .iter()
            .flat_map(|value| store.find_nodes(&label, &anchor.key, value))
            .filter(|node| seen.insert(node.id))
            .collect()
    };

    candidates
        .into_iter()
        .filter(|node| passes(node, &anchor.filter))
        .map(|node| node.id)
        .collect()
}

/// Edges of type `step.rel` leaving `from` in the step's direction, paired
/// with the node on the far side
fn neighbours(store: &GraphStore, from: NodeId, step: &Expand) -> Vec<(EdgeId, NodeId)> {
    let rel = step.rel.as_str();
    let mut found = Vec::new();
    if matches!(step.direction, Direction::Out | Direction::Both) {
        for edge in store.outgoing(from) {
            if edge.edge_type.as_str() == rel {
                found.push((edge.id, edge.target));
            }
        }
    }
    if matches!(step.direction, Direction::In | Direction::Both) {
        for edge in store.incoming(from) {
            if edge.edge_type.as_str() == rel && !found.iter().any(|(id, _)| *id == edge.id) {
                found.push((edge.id, edge.source));
            }
        }
    }
    found
}

fn expand_row(store: &GraphStore, row: &Bindings, step: &Expand, rel_column: &str) -> Vec<Bindings> {
    let no_match = || {
        if step.optional {
            let mut kept = row.clone();
            kept.insert(rel_column.to_string(), Binding::Null);
            kept.entry(step.to.clone()).or_insert(Binding::Null);
            vec![kept]
        } else {
            Vec::new()
        }
    };

    let from = match row.get(&step.from) {
        Some(Binding::Node(id)) => *id,
        _ => return no_match(),
    };
    let closing = match row.get(&step.to) {
        Some(Binding::Node(id)) => Some(*id),
        Some(_) => return no_match(),
        None => None,
    };
    let label = step.label.as_deref().map(Label::new);

    let mut out = Vec::new();
    for (edge, other) in neighbours(store, from, step) {
        if closing.map_or(false, |bound| bound != other) {
            continue;
        }
        let Some(node) = store.get_node(other) else {
            continue;
        };
        if label.as_ref().map_or(false, |l| !node.has_label(l)) || !passes(node, &step.filter) {
            continue;
        }
        let mut next = row.clone();
        next.insert(rel_column.to_string(), Binding::Edge(edge));
        next.insert(step.to.clone(), Binding::Node(other));
        out.push(next);
    }

    if out.is_empty() {
        no_match()
    } else {
        out
    }
}

fn pattern_rows(store: &GraphStore, pattern: &Pattern) -> Vec<Bindings> {
    let mut rows: Vec<Bindings> = anchor_nodes(store, pattern)
        .into_iter()
        .map(|id| {
            let mut row = Bindings::new();
            row.insert(pattern.anchor.alias.clone(), Binding::Node(id));
            row
        })
        .collect();

    for (i, step) in pattern.expand.iter().enumerate() {
        let rel_column = step.rel_alias(i);
        rows = rows
            .iter()
            .flat_map(|row| expand_row(store, row, step, &rel_column))
            .collect();
        if rows.is_empty() {
            break;
        }
    }
    rows
}

/// Evaluate a union of patterns; duplicate rows are dropped
pub fn match_patterns(store: &GraphStore, branches: &[Pattern], columns: Vec<String>) -> Matches {
    let mut seen: HashSet<Vec<Binding>> = HashSet::new();
    let mut rows = Vec::new();

    for pattern in branches {
        for bindings in pattern_rows(store, pattern) {
            let row: Vec<Binding> = columns
                .iter()
                .map(|c| bindings.get(c).copied().unwrap_or(Binding::Null))
                .collect();
            if seen.insert(row.clone()) {
                rows.push(row);
            }
        }
    }

    Matches { columns, rows }
}

/// Nodes within `hops` undirected steps of the root, root first.
///
/// Empty when the root is unknown or has no relationships at all, matching
/// a path match of length `1..hops`.
pub fn neighborhood(store: &GraphStore, label: &str, id: &str, hops: u8) -> Vec<NodeId> {
    let root = match store.node_by_external_id(id) {
        Some(node) if node.has_label(&Label::new(label)) => node.id,
        _ => return Vec::new(),
    };

    let mut visited = vec![root];
    let mut seen: HashSet<NodeId> = HashSet::from([root]);
    let mut frontier = VecDeque::from([(root, 0u8)]);

    while let Some((node, depth)) = frontier.pop_front() {
        if depth == hops {
            continue;
        }
        let adjacent = store
            .outgoing(node)
            .into_iter()
            .map(|e| e.target)
            .chain(store.incoming(node).into_iter().map(|e| e.source));
        for next in adjacent {
            if seen.insert(next) {
                visited.push(next);
                frontier.push_back((next, depth + 1));
            }
        }
    }

    if visited.len() == 1 {
        Vec::new()
    } else {
        visited
    }
}

/// Directed edges whose both endpoints are in `nodes`, in creation order
pub fn edges_among(store: &GraphStore, nodes: &[NodeId]) -> Vec<EdgeId> {
    let members: HashSet<NodeId> = nodes.iter().copied().collect();
    let mut edges: Vec<EdgeId> = nodes
        .iter()
        .flat_map(|&n| store.outgoing(n))
        .filter(|e| members.contains(&e.target))
        .map(|e| e.id)
        .collect();
    edges.sort();
    edges.dedup();
    edges
}

/// Reduce an aggregate pattern to one value; `Null` when nothing matched
/// a property lookup
pub fn aggregate(store: &GraphStore, query: &AggregateQuery) -> PropertyValue {
    let rows = pattern_rows(store, &query.pattern);
    let bound = |row: &Bindings, alias: &str| match row.get(alias) {
        Some(Binding::Node(id)) => store.get_node(*id),
        _ => None,
    };

    match &query.measure {
        Measure::CountDistinct(alias) => {
            let distinct: HashSet<NodeId> = rows
                .iter()
                .filter_map(|row| bound(row, alias).map(|n| n.id))
                .collect();
            PropertyValue::Integer(distinct.len() as i64)
        }
        Measure::Sum { alias, key } => {
            let mut int_total: i64 = 0;
            let mut float_total: f64 = 0.0;
            let mut any_float = false;
            for value in rows.iter().filter_map(|row| bound(row, alias)?.get_property(key)) {
                match value {
                    PropertyValue::Integer(i) => int_total += i,
                    PropertyValue::Float(f) => {
                        float_total += f;
                        any_float = true;
                    }
                    _ => {}
                }
            }
            if any_float {
                PropertyValue::Float(float_total + int_total as f64)
            } else {
                PropertyValue::Integer(int_total)
            }
        }
        Measure::Property { alias, key } => rows
            .first()
            .and_then(|row| bound(row, alias))
            .and_then(|node| node.get_property(key))
            .cloned()
            .unwrap_or(PropertyValue::Null),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::PropertyMap;
    use crate::model::Rel;
    use crate::query::Anchor;

    fn node(store: &mut GraphStore, label: &str, id: &str, extra: &[(&str, PropertyValue)]) -> NodeId {
        let mut props = PropertyMap::new();
        props.insert("id".into(), id.into());
        for (k, v) in extra {
            props.insert(k.to_string(), v.clone());
        }
        store.create_node(vec![Label::new(label)], props).unwrap()
    }

    /// Two claims represented by one attorney, one of them witnessed
    fn small_graph() -> GraphStore {
        let mut store = GraphStore::new();
        let att = node(&mut store, "Attorney", "ATT_1", &[]);
        let c1 = node(&mut store, "Claim", "CLM_1", &[("claim_amount", 1000.0.into()), ("is_fraud", true.into())]);
        let c2 = node(&mut store, "Claim", "CLM_2", &[("claim_amount", 500.into()), ("is_fraud", false.into())]);
        let w = node(&mut store, "Person", "P_W", &[]);
        let p1 = node(&mut store, "Person", "P_1", &[]);
        let p2 = node(&mut store, "Person", "P_2", &[]);
        node(&mut store, "Phone", "PH_LONELY", &[]);
        store.create_edge(c1, att, "REPRESENTED_BY").unwrap();
        store.create_edge(c2, att, "REPRESENTED_BY").unwrap();
        store.create_edge(c1, w, "WITNESSED_BY").unwrap();
        store.create_edge(c1, p1, "FILED_BY").unwrap();
        store.create_edge(c2, p2, "FILED_BY").unwrap();
        store
    }

    fn claims_of_attorney() -> Pattern {
        Pattern::new(Anchor::by_id("a", "Attorney", "ATT_1"))
            .then(Expand::new("a", Rel::RepresentedBy, Direction::In, "c").label("Claim"))
    }

    #[test]
    fn test_required_and_optional_steps() {
        let store = small_graph();

        let required = claims_of_attorney().then(Expand::new("c", Rel::WitnessedBy, Direction::Out, "w"));
        let m = match_patterns(&store, &[required.clone()], required.columns());
        assert_eq!(m.rows.len(), 1);

        let optional = claims_of_attorney().then(Expand::new("c", Rel::WitnessedBy, Direction::Out, "w").optional());
        let m = match_patterns(&store, &[optional.clone()], optional.columns());
        assert_eq!(m.rows.len(), 2);
        assert!(m.rows.iter().any(|row| row[4] == Binding::Null));
    }

    #[test]
    fn test_filters_apply_to_far_node() {
        let store = small_graph();
        let fraud = AggregateQuery::count_distinct(
            Pattern::new(Anchor::by_id("a", "Attorney", "ATT_1")).then(
                Expand::new("a", Rel::RepresentedBy, Direction::In, "c").filter("is_fraud", false),
            ),
            "c",
        );
        assert_eq!(aggregate(&store, &fraud), PropertyValue::Integer(1));
    }

    #[test]
    fn test_union_dedupes_rows() {
        let store = small_graph();
        let branches = vec![claims_of_attorney(), claims_of_attorney()];
        let m = match_patterns(&store, &branches, claims_of_attorney().columns());
        assert_eq!(m.rows.len(), 2);
        assert_eq!(m.node_ids().len(), 3);
    }

    #[test]
    fn test_sum_mixes_int_and_float() {
        let store = small_graph();
        let sum = AggregateQuery::sum(claims_of_attorney(), "c", "claim_amount");
        assert_eq!(aggregate(&store, &sum), PropertyValue::Float(1500.0));
    }

    #[test]
    fn test_property_of_missing_anchor_is_null() {
        let store = small_graph();
        let q = AggregateQuery::property(Pattern::new(Anchor::by_id("x", "Provider", "NOPE")), "x", "is_fraud");
        assert_eq!(aggregate(&store, &q), PropertyValue::Null);
    }

    #[test]
    fn test_neighborhood_radius() {
        let store = small_graph();
        // P_1 -> CLM_1 -> {ATT_1, P_W}
        assert_eq!(neighborhood(&store, "Person", "P_1", 1).len(), 2);
        assert_eq!(neighborhood(&store, "Person", "P_1", 2).len(), 4);
        // via ATT_1 to CLM_2, then P_2
        assert_eq!(neighborhood(&store, "Person", "P_1", 4).len(), 6);
        assert!(neighborhood(&store, "Phone", "PH_LONELY", 3).is_empty());
        assert!(neighborhood(&store, "Claim", "P_1", 3).is_empty());
    }

    #[test]
    fn test_edges_among_subset() {
        let store = small_graph();
        let nodes = neighborhood(&store, "Person", "P_1", 1);
        assert_eq!(edges_among(&store, &nodes).len(), 1);
    }
}
