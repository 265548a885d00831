//! Mermaid serialisation: [`DiagramGraph`] → [`DiagramDescription`].
//!
//! Output is a `graph TD` flowchart. Statements are written in input-line
//! order: each line's node declaration, then the edge that attaches it.
//!
//! ```text
//! graph TD
//! step0["Collect requirements"]
//! sub1["Interview stakeholders"]
//! step0 --> sub1
//! step2["Draft design"]
//! step0 --> step2
//! ```

use super::outline::{self, DiagramGraph};
use crate::error::DiagramError;
use serde::Serialize;
use std::fmt;
use std::fmt::Write as _;

/// Leading directive every description must start with.
pub const DIRECTIVE: &str = "graph TD";

/// Mermaid flowchart text, as produced by [`serialize`] or received from a
/// client for rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DiagramDescription(String);

impl DiagramDescription {
    /// Accept client-supplied text for rendering.
    ///
    /// Surrounding whitespace is trimmed. The only check is that the text
    /// starts with [`DIRECTIVE`]; the graph itself is not validated here.
    pub fn parse(text: &str) -> Result<Self, DiagramError> {
        let trimmed = outline::trim_line(text);
        if trimmed.is_empty() || !trimmed.starts_with(DIRECTIVE) {
            return Err(DiagramError::InvalidDiagramFormat);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Number of statements after the header line.
    pub fn statement_count(&self) -> usize {
        self.0.lines().skip(1).filter(|l| !l.trim().is_empty()).count()
    }
}

impl fmt::Display for DiagramDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for DiagramDescription {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Serialise a graph to Mermaid text. Pure and deterministic.
pub fn serialize(graph: &DiagramGraph) -> DiagramDescription {
    let mut out = String::with_capacity(16 + graph.nodes.len() * 48);
    out.push_str(DIRECTIVE);
    out.push('\n');

    // Every edge targets the node created on the same line, and both lists
    // are in line order, so one forward cursor over `edges` is enough.
    let mut edges = graph.edges.iter().peekable();
    for step in &graph.nodes {
        let _ = writeln!(out, "{}[\"{}\"]", step.id, step.label);
        while let Some(edge) = edges.next_if(|e| e.line <= step.line) {
            let _ = writeln!(out, "{} --> {}", edge.from, edge.to);
        }
    }
    for edge in edges {
        let _ = writeln!(out, "{} --> {}", edge.from, edge.to);
    }

    DiagramDescription(out)
}

/// Parse an outline and serialise it in one call.
pub fn compile(raw: &str) -> DiagramDescription {
    serialize(&outline::parse(raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::outline::{parse, Tier};

    #[test]
    fn reference_outline_statement_order() {
        let d = compile("1. Collect requirements\n- Interview stakeholders\n2. Draft design");
        assert_eq!(
            d.as_str(),
            "graph TD\n\
             step0[\"Collect requirements\"]\n\
             sub1[\"Interview stakeholders\"]\n\
             step0 --> sub1\n\
             step2[\"Draft design\"]\n\
             step0 --> step2\n"
        );
    }

    #[test]
    fn empty_graph_is_header_only() {
        let d = compile("nothing here\nat all");
        assert_eq!(d.as_str(), "graph TD\n");
        assert_eq!(d.statement_count(), 0);
    }

    #[test]
    fn first_primary_has_no_edge() {
        let d = compile("1. only");
        assert_eq!(d.as_str(), "graph TD\nstep0[\"only\"]\n");
    }

    #[test]
    fn node_statement_counts_match_tiers() {
        let input = "- orphan\n1. a\n- x\n2. b\n- y\nprose\n3. c";
        let graph = parse(input);
        let d = serialize(&graph);
        let text = d.as_str();

        let primary_nodes = text.lines().filter(|l| l.starts_with("step") && l.contains('[')).count();
        let secondary_nodes = text.lines().filter(|l| l.starts_with("sub") && l.contains('[')).count();
        assert_eq!(primary_nodes, graph.count(Tier::Primary));
        assert_eq!(primary_nodes, 3);
        assert_eq!(secondary_nodes, 2);
    }

    #[test]
    fn every_edge_follows_its_node() {
        let d = compile("1. a\n- a1\n2. b\n- b1\n- b2\n3. c");
        let lines: Vec<&str> = d.as_str().lines().collect();
        for (i, line) in lines.iter().enumerate() {
            if let Some((_, to)) = line.split_once(" --> ") {
                let previous = lines[i - 1];
                assert!(
                    previous.starts_with(&format!("{to}[")),
                    "edge {line:?} not directly after its node (prev {previous:?})"
                );
            }
        }
    }

    #[test]
    fn serialize_is_deterministic() {
        let g = parse("1. a\n- b\n2. c");
        assert_eq!(serialize(&g), serialize(&g));
    }

    #[test]
    fn compiled_output_passes_directive_check() {
        let d = compile("1. a");
        assert!(DiagramDescription::parse(d.as_str()).is_ok());
    }

    #[test]
    fn description_parse_trims_whitespace() {
        let d = DiagramDescription::parse("\n\n  graph TD\nA-->B  \n").unwrap();
        assert_eq!(d.as_str(), "graph TD\nA-->B");

        let d = DiagramDescription::parse("\u{FEFF}graph TD\nA-->B").unwrap();
        assert_eq!(d.as_str(), "graph TD\nA-->B");
    }

    #[test]
    fn description_parse_rejects_other_text() {
        for bad in ["not a diagram", "", "    ", "graph LR\nA-->B", "flowchart TD\nA"] {
            assert!(
                matches!(
                    DiagramDescription::parse(bad),
                    Err(DiagramError::InvalidDiagramFormat)
                ),
                "accepted {bad:?}"
            );
        }
    }
}
