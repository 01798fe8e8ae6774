//! Styled view models for an external graph widget
//!
//! Turns a [`QueryResult`] into nodes and edges carrying display label,
//! color, size and tooltip. Serialises to JSON.

use crate::backend::{QueryResult, ResultNode};
use crate::model::Rel;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// Display types, most specific first
pub const DISPLAY_PRIORITY: [&str; 12] = [
    "Claimant", "Witness", "Adjuster", "Employee", "Provider", "Attorney", "BodyShop", "Address", "Phone",
    "Location", "Claim", "Person",
];

pub const FRAUD_COLOR: &str = "#E74C3C";
pub const DEFAULT_COLOR: &str = "#AAB7B8";
pub const EDGE_COLOR: &str = "#B0B0B0";

const NODE_SIZE: u32 = 28;
const FRAUD_SIZE: u32 = 42;
const ROOT_SIZE: u32 = 48;
const BORDER: u32 = 2;
const HIGHLIGHT_BORDER: u32 = 4;
const MAX_LABEL_CHARS: usize = 25;

/// Color of a display type
pub fn color_of(display_type: &str) -> &'static str {
    match display_type {
        "Claim" => "#4A90A4",
        "Claimant" => "#5DADE2",
        "Witness" => "#85C1E9",
        "Adjuster" => "#58D68D",
        "Employee" => "#48C9B0",
        "Provider" => "#AF7AC5",
        "Attorney" => "#F5B041",
        "BodyShop" => "#EB984E",
        "Address" => "#45B7A0",
        "Phone" => "#5499C7",
        "Location" => "#9B7ED9",
        _ => DEFAULT_COLOR,
    }
}

/// Most specific display type among `labels`
pub fn display_type(labels: &[String]) -> String {
    DISPLAY_PRIORITY
        .iter()
        .find(|p| labels.iter().any(|l| l == *p))
        .map(|p| p.to_string())
        .or_else(|| labels.first().cloned())
        .unwrap_or_else(|| "Unknown".to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
    Dot,
    Star,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewNode {
    /// Store element id
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub display_type: String,
    pub color: String,
    pub size: u32,
    pub border_width: u32,
    pub shape: Shape,
    pub tooltip: String,
    pub is_fraud: bool,
    pub is_root: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewEdge {
    pub source: String,
    pub target: String,
    pub label: String,
    pub color: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GraphView {
    pub nodes: Vec<ViewNode>,
    pub edges: Vec<ViewEdge>,
}

impl GraphView {
    /// Style every node of `result`, keeping only `filter` display types
    /// when given; `root_id` is the external id of the starting entity
    pub fn from_result(result: &QueryResult, root_id: Option<&str>, filter: Option<&HashSet<String>>) -> Self {
        let mut nodes = Vec::new();
        for node in &result.nodes {
            let kind = display_type(&node.labels);
            if filter.map_or(false, |f| !f.contains(&kind)) {
                continue;
            }
            nodes.push(style_node(node, kind, root_id));
        }

        let shown: HashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
        let mut seen: HashSet<(String, String)> = HashSet::new();
        let mut edges = Vec::new();
        for edge in &result.edges {
            if !shown.contains(edge.source.as_str()) || !shown.contains(edge.target.as_str()) {
                continue;
            }
            let reverse = (edge.target.clone(), edge.source.clone());
            if seen.contains(&reverse) || !seen.insert((edge.source.clone(), edge.target.clone())) {
                continue;
            }
            edges.push(ViewEdge {
                source: edge.source.clone(),
                target: edge.target.clone(),
                label: edge_label(&edge.rel_type),
                color: EDGE_COLOR.to_string(),
            });
        }
        Self { nodes, edges }
    }

    /// Nodes per display type
    pub fn type_counts(&self) -> HashMap<&str, usize> {
        let mut counts = HashMap::new();
        for node in &self.nodes {
            *counts.entry(node.display_type.as_str()).or_insert(0) += 1;
        }
        counts
    }

    pub fn fraud_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_fraud).count()
    }
}

fn edge_label(rel_type: &str) -> String {
    match Rel::from_name(rel_type) {
        Some(rel) => rel.display_label().to_string(),
        None => rel_type.replace('_', " ").to_lowercase(),
    }
}

fn truncate_label(name: &str) -> String {
    if name.chars().count() > MAX_LABEL_CHARS {
        let head: String = name.chars().take(MAX_LABEL_CHARS).collect();
        format!("{}...", head)
    } else {
        name.to_string()
    }
}

/// `$12,345.67`
pub fn format_currency(amount: f64) -> String {
    let cents = (amount * 100.0).round() as i64;
    let (whole, frac) = (cents.abs() / 100, cents.abs() % 100);
    let digits = whole.to_string();
    let mut grouped = String::new();
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let sign = if cents < 0 { "-" } else { "" };
    format!("{}${}.{:02}", sign, grouped, frac)
}

fn tooltip(node: &ResultNode, kind: &str, name: &str) -> String {
    let text = |key: &str| node.get(key).map(|v| v.to_string());
    let mut lines = vec![kind.to_uppercase(), name.to_string()];
    let mut push = |label: &str, value: Option<String>| {
        if let Some(value) = value {
            lines.push(format!("{}: {}", label, value));
        }
    };
    match kind {
        "Claim" => {
            push("Amount", node.get("claim_amount").and_then(|v| v.as_float()).map(format_currency));
            push("Date", text("claim_date"));
            push("Status", text("status"));
            push("Type", text("incident_type"));
        }
        "Provider" => {
            push("License", text("license"));
            push("Status", text("status"));
            push("Opened", text("opened_date"));
        }
        "Attorney" => push("Bar", text("bar_number")),
        "Phone" => push("Number", text("number")),
        "Address" => {
            let mut parts: Vec<String> = ["street", "unit"].iter().filter_map(|k| text(*k)).collect();
            if let Some(city) = text("city") {
                parts.push(format!("{}, {}", city, text("state").unwrap_or_default()));
            }
            push("Address", (!parts.is_empty()).then(|| parts.join(", ")));
            push("Type", text("type"));
        }
        "Claimant" | "Witness" | "Employee" | "Person" => {
            push("Role", text("role"));
            push("Title", text("job_title"));
        }
        _ => {}
    }
    if node.is_fraud() {
        lines.push(String::new());
        lines.push("CONFIRMED FRAUD".to_string());
        lines.push(format!("Type: {}", text("fraud_type").unwrap_or_else(|| "Unknown".to_string())));
    }
    lines.push(String::new());
    lines.push(format!("ID: {}", node.external_id().unwrap_or(&node.id)));
    lines.join("\n")
}

fn style_node(node: &ResultNode, kind: String, root_id: Option<&str>) -> ViewNode {
    let is_fraud = node.is_fraud();
    let is_root = root_id.is_some() && node.external_id() == root_id;
    let (mut size, mut border_width) = (NODE_SIZE, BORDER);
    let mut color = color_of(&kind);
    if is_fraud {
        color = FRAUD_COLOR;
        size = FRAUD_SIZE;
        border_width = HIGHLIGHT_BORDER;
    }
    if is_root {
        size = ROOT_SIZE;
        border_width = HIGHLIGHT_BORDER;
    }
    let name = node.display_name();
    ViewNode {
        id: node.id.clone(),
        label: truncate_label(&name),
        tooltip: tooltip(node, &kind, &name),
        color: color.to_string(),
        display_type: kind,
        size,
        border_width,
        shape: if is_root { Shape::Star } else { Shape::Dot },
        is_fraud,
        is_root,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{ResultEdge, ResultValue};
    use crate::graph::{PropertyMap, PropertyValue};

    fn node(id: &str, labels: &[&str], props: &[(&str, PropertyValue)]) -> ResultNode {
        let mut properties = PropertyMap::new();
        for (k, v) in props {
            properties.insert(k.to_string(), v.clone());
        }
        ResultNode {
            id: id.to_string(),
            labels: labels.iter().map(|l| l.to_string()).collect(),
            properties,
        }
    }

    fn edge(id: &str, source: &str, target: &str, rel: &str) -> ResultEdge {
        ResultEdge {
            id: id.to_string(),
            source: source.to_string(),
            target: target.to_string(),
            rel_type: rel.to_string(),
            properties: PropertyMap::new(),
        }
    }

    fn sample() -> QueryResult {
        let claim = node(
            "1",
            &["Claim"],
            &[
                ("id", "CLM_S4_BER_00001".into()),
                ("name", "Auto Claim - FRAUD CONFIRMED".into()),
                ("claim_amount", PropertyValue::Float(23456.5)),
                ("is_fraud", true.into()),
                ("fraud_type", "Medical Mill".into()),
            ],
        );
        let person = node(
            "2",
            &["Person", "Claimant"],
            &[("id", "P_S4_BER_00001".into()), ("name", "Maria Gonzalez".into())],
        );
        let provider = node(
            "3",
            &["Provider"],
            &[("id", "PROV_S4_BERNARD".into()), ("name", "Dr. Bernard's Auto Injury Center".into())],
        );
        let mut result = QueryResult::from_rows(
            vec!["c".into(), "p".into(), "prov".into()],
            vec![vec![
                ResultValue::Node(claim),
                ResultValue::Node(person),
                ResultValue::Node(provider),
            ]],
        );
        result.edges = vec![
            edge("10", "1", "2", "FILED_BY"),
            edge("11", "2", "1", "FILED_BY"),
            edge("12", "1", "3", "TREATED_AT"),
        ];
        result
    }

    #[test]
    fn test_display_priority() {
        let labels = vec!["Person".to_string(), "Employee".to_string(), "Witness".to_string()];
        assert_eq!(display_type(&labels), "Witness");
        assert_eq!(display_type(&["Vehicle".to_string()]), "Vehicle");
        assert_eq!(display_type(&[]), "Unknown");
    }

    #[test]
    fn test_node_styles() {
        let view = GraphView::from_result(&sample(), Some("PROV_S4_BERNARD"), None);
        assert_eq!(view.nodes.len(), 3);

        let claim = &view.nodes[0];
        assert!(claim.is_fraud);
        assert_eq!(claim.color, FRAUD_COLOR);
        assert_eq!((claim.size, claim.border_width), (42, 4));
        assert!(claim.tooltip.contains("Amount: $23,456.50"));
        assert!(claim.tooltip.contains("CONFIRMED FRAUD"));

        let person = &view.nodes[1];
        assert_eq!(person.display_type, "Claimant");
        assert_eq!((person.size, person.border_width), (28, 2));
        assert_eq!(person.shape, Shape::Dot);

        let root = &view.nodes[2];
        assert!(root.is_root);
        assert_eq!(root.shape, Shape::Star);
        assert_eq!(root.size, 48);
        assert_eq!(root.label, "Dr. Bernard's Auto Injury...");
    }

    #[test]
    fn test_reverse_edges_collapse() {
        let view = GraphView::from_result(&sample(), None, None);
        assert_eq!(view.edges.len(), 2);
        assert_eq!(view.edges[0].label, "filed by");
        assert_eq!(view.edges[1].label, "treated at");
    }

    #[test]
    fn test_filter_drops_nodes_and_their_edges() {
        let only: HashSet<String> = ["Claim".to_string(), "Provider".to_string()].into_iter().collect();
        let view = GraphView::from_result(&sample(), None, Some(&only));
        assert_eq!(view.nodes.len(), 2);
        assert_eq!(view.edges.len(), 1);
        assert_eq!(view.type_counts().get("Claim"), Some(&1));
        assert_eq!(view.fraud_count(), 1);
    }

    #[test]
    fn test_currency() {
        assert_eq!(format_currency(185000.0), "$185,000.00");
        assert_eq!(format_currency(999.999), "$1,000.00");
        assert_eq!(format_currency(12.5), "$12.50");
    }
}
