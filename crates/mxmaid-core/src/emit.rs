//! Mermaid flowchart emission.
//!
//! Output is deterministic: groups in index insertion order, ungrouped nodes
//! in source order, edges last in source order.

use crate::error::{Error, Result};
use crate::model::{DiagramModel, Edge, Group, Node};
use crate::style::StyleValue;
use rustc_hash::FxHashSet;
use std::str::FromStr;
use tracing::warn;

/// Mermaid flow direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    /// Top-down.
    #[default]
    Td,
    /// Left-to-right.
    Lr,
    /// Right-to-left.
    Rl,
    /// Bottom-up.
    Bt,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Td => "TD",
            Direction::Lr => "LR",
            Direction::Rl => "RL",
            Direction::Bt => "BT",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            // Mermaid treats TB as a synonym for TD.
            "TD" | "TB" => Ok(Direction::Td),
            "LR" => Ok(Direction::Lr),
            "RL" => Ok(Direction::Rl),
            "BT" => Ok(Direction::Bt),
            other => Err(Error::Conversion {
                message: format!("unknown flow direction: {other}"),
            }),
        }
    }
}

/// Renders the model as Mermaid flowchart text.
///
/// Any `kind` other than `"flowchart"` falls back to flowchart with a
/// warning. Fails only on a group cycle under the strict policy.
pub(crate) fn emit_flowchart(
    model: &DiagramModel,
    direction: Direction,
    kind: &str,
    strict: bool,
) -> Result<String> {
    if kind != "flowchart" {
        warn!("diagram kind '{kind}' is not fully supported; defaulting to flowchart");
    }

    let mut lines = vec![format!("flowchart {direction}")];

    // A group that appears as a member of another group renders nested, not
    // at the top level.
    let nested: FxHashSet<&str> = model
        .groups
        .values()
        .flat_map(|group| group.members.iter().map(String::as_str))
        .filter(|id| model.groups.contains_key(*id))
        .collect();

    let mut emitted: FxHashSet<&str> = FxHashSet::default();
    let mut visited: FxHashSet<&str> = FxHashSet::default();
    for (group_id, group) in &model.groups {
        if nested.contains(group_id.as_str()) {
            continue;
        }
        let mut stack: FxHashSet<&str> = FxHashSet::default();
        emit_subgraph(
            model,
            group_id,
            group,
            0,
            &mut lines,
            &mut emitted,
            &mut visited,
            &mut stack,
            strict,
        )?;
    }

    // A group never reached from the top level sits on a pure cycle: every
    // participant is a member of another participant.
    for group_id in model.groups.keys() {
        if !visited.contains(group_id.as_str()) {
            if strict {
                return Err(Error::Parse {
                    message: format!("group cycle detected at id {group_id}"),
                });
            }
            warn!("breaking group cycle at id {group_id}; emitting its members flat");
        }
    }

    for node in &model.nodes {
        if !emitted.contains(node.id.as_str()) {
            lines.push(format_node(node));
        }
    }

    for edge in &model.edges {
        let Some((source, target)) = edge.source.as_deref().zip(edge.target.as_deref()) else {
            warn!("skipping edge {} due to missing endpoints", edge.id);
            continue;
        };
        if model.node(source).is_none() || model.node(target).is_none() {
            warn!("skipping edge {} due to missing endpoints", edge.id);
            continue;
        }
        lines.push(format_edge(edge, source, target));
    }

    Ok(lines.join("\n"))
}

/// Depth-first pre-order subgraph emission. Every member consumed here, at
/// any depth, is recorded in `emitted` so the flat node pass skips it.
#[allow(clippy::too_many_arguments)]
fn emit_subgraph<'a>(
    model: &'a DiagramModel,
    group_id: &'a str,
    group: &'a Group,
    depth: usize,
    lines: &mut Vec<String>,
    emitted: &mut FxHashSet<&'a str>,
    visited: &mut FxHashSet<&'a str>,
    stack: &mut FxHashSet<&'a str>,
    strict: bool,
) -> Result<()> {
    if !stack.insert(group_id) {
        // Malformed input: a group contains itself, directly or transitively.
        if strict {
            return Err(Error::Parse {
                message: format!("group cycle detected at id {group_id}"),
            });
        }
        warn!("breaking group cycle at id {group_id}");
        return Ok(());
    }
    visited.insert(group_id);

    let indent = "    ".repeat(depth);
    lines.push(format!("{indent}subgraph {group_id}[{}]", group.label));
    for member_id in &group.members {
        emitted.insert(member_id);
        if let Some(nested) = model.groups.get(member_id) {
            emit_subgraph(
                model,
                member_id,
                nested,
                depth + 1,
                lines,
                emitted,
                visited,
                stack,
                strict,
            )?;
        } else if let Some(node) = model.node(member_id) {
            lines.push(format!("{indent}    {}", format_node(node)));
        } else {
            warn!("group {group_id} references unknown member id {member_id}");
        }
    }
    lines.push(format!("{indent}end"));
    stack.remove(group_id);
    Ok(())
}

/// Shape selection, first matching rule wins: rhombus, ellipse, rounded or
/// stadium, plain rectangle. Identifiers get an `N` prefix so numeric-looking
/// draw.io ids stay valid Mermaid identifiers.
fn format_node(node: &Node) -> String {
    let trimmed = node.label.trim();
    let label = if trimmed.is_empty() {
        format!("Node_{}", node.id)
    } else {
        trimmed.to_string()
    };
    let id = &node.id;

    let shape = node
        .style_map
        .get("shape")
        .and_then(StyleValue::as_str)
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    if shape == "rhombus" {
        format!("N{id}{{\"{label}\"}}")
    } else if shape == "ellipse" || node.style_map.contains_key("ellipse") {
        format!("N{id}(( \"{label}\" ))")
    } else if shape == "stadium"
        || node.style_map.get("rounded").and_then(StyleValue::as_str) == Some("1")
    {
        format!("N{id}(\"{label}\")")
    } else {
        format!("N{id}[\"{label}\"]")
    }
}

/// Solid arrow by default; a dashed style switches to dotted; `endArrow=none`
/// strips the head from whichever connector was chosen.
fn format_edge(edge: &Edge, source: &str, target: &str) -> String {
    let dashed = edge
        .style_map
        .get("dashed")
        .map(|v| v.as_str() != Some("0"))
        .unwrap_or(false);
    let mut arrow = if dashed { "-.->" } else { "-->" }.to_string();
    if edge
        .style_map
        .get("endArrow")
        .and_then(StyleValue::as_str)
        == Some("none")
    {
        arrow = arrow.replacen("->", "-", 1);
    }

    let label = edge.label.trim();
    if label.is_empty() {
        format!("N{source} {arrow} N{target}")
    } else {
        format!("N{source} -- \"{label}\" {arrow} N{target}")
    }
}
