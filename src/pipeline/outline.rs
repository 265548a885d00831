//! Outline parsing: plain-text process steps → [`DiagramGraph`].
//!
//! Two line shapes are recognised, after trimming:
//!
//! ```text
//! 1. Collect requirements      ← primary   (digits, dot)
//! - Interview stakeholders     ← secondary (leading dash)
//! 2. Draft design              ← primary, chained after step 1
//! ```
//!
//! Primary steps form a linear chain in input order. A secondary step hangs
//! off the most recent primary step and can never have children of its own.
//! A secondary step that appears before any primary step has nothing to
//! attach to and is dropped ([`OrphanPolicy::Drop`]).
//!
//! Ids come from the line's position among the *non-blank* lines, so a line
//! that matches neither shape still uses up an index. `"1. a\nnote\n2. b"`
//! yields `step0` and `step2`; there is no `step1`.
//!
//! [`parse`] never fails. Input with no recognisable lines gives an empty
//! graph.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

static RE_PRIMARY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]+\.").unwrap());
static RE_PRIMARY_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]+\.\s*").unwrap());
static RE_SECONDARY_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^-\s*").unwrap());
static RE_UNSAFE_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-zA-Z0-9\s-]").unwrap());
static RE_WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Outline level of a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// Numbered top-level entry (`"3. text"`).
    Primary,
    /// Dashed sub-entry (`"- text"`).
    Secondary,
}

impl Tier {
    fn id_prefix(self) -> &'static str {
        match self {
            Tier::Primary => "step",
            Tier::Secondary => "sub",
        }
    }
}

/// What to do with a secondary step that has no primary step above it.
///
/// Only one policy exists today; it is named so the rule is explicit
/// rather than a side effect of the parse loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrphanPolicy {
    /// Emit neither a node nor an edge.
    #[default]
    Drop,
}

/// One outline entry that made it into the graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Step {
    /// `step<i>` or `sub<i>`, where `i` is the non-blank line index.
    pub id: String,
    pub tier: Tier,
    /// Sanitised label, safe to embed in `["…"]` without escaping.
    pub label: String,
    /// Index of the originating line among the non-blank lines.
    pub line: usize,
}

/// Directed "parent precedes/contains child" link between two steps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Edge {
    pub from: String,
    pub to: String,
    /// Index of the line whose step is the edge's target.
    pub line: usize,
}

/// Parser output: nodes and edges, both in input line order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiagramGraph {
    pub nodes: Vec<Step>,
    pub edges: Vec<Edge>,
}

impl DiagramGraph {
    /// `true` when no line produced a node.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of nodes of the given tier.
    pub fn count(&self, tier: Tier) -> usize {
        self.nodes.iter().filter(|s| s.tier == tier).count()
    }

    /// The edge created together with `step`, if any.
    pub fn incoming_edge(&self, step: &Step) -> Option<&Edge> {
        self.edges.iter().find(|e| e.to == step.id)
    }
}

/// Trim whitespace and byte-order marks from both ends of a line.
pub(crate) fn trim_line(line: &str) -> &str {
    line.trim_matches(|c: char| c.is_whitespace() || c == '\u{FEFF}')
}

/// Parse an outline into a graph using the default [`OrphanPolicy`].
pub fn parse(raw: &str) -> DiagramGraph {
    parse_with(raw, OrphanPolicy::default())
}

/// Parse an outline into a graph.
pub fn parse_with(raw: &str, orphans: OrphanPolicy) -> DiagramGraph {
    let mut graph = DiagramGraph::default();
    // Open primary ids, most recent last. Secondary ids are never pushed.
    let mut parents: Vec<String> = Vec::new();

    let lines = raw.split('\n').map(trim_line).filter(|l| !l.is_empty());

    for (index, line) in lines.enumerate() {

        let (tier, text) = if RE_PRIMARY.is_match(line) {
            (Tier::Primary, RE_PRIMARY_MARKER.replace(line, ""))
        } else if line.starts_with('-') {
            if parents.is_empty() {
                match orphans {
                    OrphanPolicy::Drop => continue,
                }
            }
            (Tier::Secondary, RE_SECONDARY_MARKER.replace(line, ""))
        } else {
            continue;
        };

        let id = format!("{}{}", tier.id_prefix(), index);
        graph.nodes.push(Step {
            id: id.clone(),
            tier,
            label: sanitize_label(&text),
            line: index,
        });

        if let Some(parent) = parents.last() {
            graph.edges.push(Edge {
                from: parent.clone(),
                to: id.clone(),
                line: index,
            });
        }

        if tier == Tier::Primary {
            parents.push(id);
        }
    }

    graph
}

/// Make `text` safe to embed in a quoted Mermaid label.
///
/// Anything other than ASCII letters, ASCII digits, whitespace and `-`
/// becomes a space; whitespace runs collapse to one space; ends are trimmed.
/// Lossy and idempotent.
pub fn sanitize_label(text: &str) -> String {
    let replaced = RE_UNSAFE_CHARS.replace_all(text, " ");
    RE_WHITESPACE_RUN
        .replace_all(&replaced, " ")
        .trim()
        .to_string()
}
