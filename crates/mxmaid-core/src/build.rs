//! Structural model construction from decoded graph-model XML.

use crate::error::{Error, Result};
use crate::extract::GRAPH_MODEL_MARKER;
use crate::model::{DiagramModel, Edge, Group, Node};
use crate::style::parse_style;
use indexmap::IndexMap;
use tracing::{debug, error, info};

/// Background layer cells present in every draw.io page.
const RESERVED_CELL_IDS: [&str; 2] = ["0", "1"];

/// Builds the model for one decoded page.
///
/// `Ok(None)` is the relaxed-policy outcome for XML that cannot be parsed at
/// all; the orchestrator turns it into empty output.
pub(crate) fn build_model(xml: &str, strict: bool) -> Result<Option<DiagramModel>> {
    let normalized = normalize_xml(xml);
    let doc = match roxmltree::Document::parse(&normalized) {
        Ok(doc) => doc,
        Err(err) => {
            error!("error parsing diagram XML: {err}");
            if strict {
                return Err(Error::Parse {
                    message: err.to_string(),
                });
            }
            return Ok(None);
        }
    };

    let graph = locate_graph_model(&doc);
    // Older exports place cells directly under <mxGraphModel> instead of
    // inside a <root> element.
    let cells_root = graph
        .children()
        .find(|child| child.has_tag_name("root"))
        .unwrap_or(graph);

    let mut model = DiagramModel::default();
    for cell in cells_root
        .children()
        .filter(|child| child.has_tag_name("mxCell"))
    {
        let Some(id) = cell.attribute("id") else {
            debug!("skipping mxCell without an id attribute");
            continue;
        };
        if RESERVED_CELL_IDS.contains(&id) {
            continue;
        }

        if cell.attribute("vertex") == Some("1") {
            let style = cell.attribute("style").unwrap_or("").to_string();
            let geometry = cell
                .children()
                .find(|child| child.has_tag_name("mxGeometry"))
                .map(|geom| {
                    geom.attributes()
                        .map(|a| (a.name().to_string(), a.value().to_string()))
                        .collect::<IndexMap<_, _>>()
                })
                .unwrap_or_default();
            model.add_node(Node {
                id: id.to_string(),
                label: cell.attribute("value").unwrap_or("").to_string(),
                style_map: parse_style(&style),
                style,
                geometry,
                parent: cell.attribute("parent").map(str::to_string),
            });
        } else if cell.attribute("edge") == Some("1") {
            let style = cell.attribute("style").unwrap_or("").to_string();
            model.add_edge(Edge {
                id: id.to_string(),
                source: cell.attribute("source").map(str::to_string),
                target: cell.attribute("target").map(str::to_string),
                label: cell.attribute("value").unwrap_or("").to_string(),
                style_map: parse_style(&style),
                style,
            });
        } else {
            debug!("skipping cell id {id}: not a vertex or edge");
        }
    }

    collect_groups(&mut model);
    info!(
        "built diagram model: {} nodes, {} edges, {} groups",
        model.nodes.len(),
        model.edges.len(),
        model.groups.len()
    );
    Ok(Some(model))
}

/// Fixes up quirks seen in exported files before handing the text to the XML
/// parser: the HTML `&nbsp;` entity, a missing prolog, and bare
/// `<mxGraphModel>` fragments without any wrapper element.
fn normalize_xml(xml: &str) -> String {
    let text = xml.replace("&nbsp;", "&#160;");
    let trimmed = text.trim();
    if trimmed.starts_with(GRAPH_MODEL_MARKER) {
        return format!("<diagram>{text}</diagram>");
    }
    if !trimmed.starts_with("<?xml") && text.contains(GRAPH_MODEL_MARKER) {
        return format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{text}");
    }
    text
}

/// Descends through up to two wrapper levels (`<diagram>`, or `<mxfile>` and
/// its first `<diagram>`) to the effective `<mxGraphModel>` element. Falls
/// back to the document root when no wrapper matches.
fn locate_graph_model<'a>(doc: &'a roxmltree::Document<'a>) -> roxmltree::Node<'a, 'a> {
    let root = doc.root_element();
    match root.tag_name().name() {
        "diagram" => root
            .children()
            .find(|child| child.has_tag_name("mxGraphModel"))
            .unwrap_or(root),
        "mxfile" => root
            .children()
            .find(|child| child.has_tag_name("diagram"))
            .and_then(|diagram| {
                diagram
                    .children()
                    .find(|child| child.has_tag_name("mxGraphModel"))
            })
            .unwrap_or(root),
        _ => root,
    }
}

/// Registers every node whose parent's raw style marks it as a container
/// (group or swimlane) as a member of that parent's group. Nesting stays
/// implicit: a member id that is itself a group key is resolved at emission.
fn collect_groups(model: &mut DiagramModel) {
    let mut groups: IndexMap<String, Group> = IndexMap::new();
    for node in &model.nodes {
        let Some(parent_id) = node.parent.as_deref() else {
            continue;
        };
        let Some(parent) = model.node(parent_id) else {
            continue;
        };
        if parent.style.contains("group") || parent.style.contains("swimlane") {
            let group = groups.entry(parent_id.to_string()).or_insert_with(|| {
                let label = parent.label.trim();
                Group {
                    label: if label.is_empty() {
                        format!("Group_{parent_id}")
                    } else {
                        parent.label.clone()
                    },
                    members: Vec::new(),
                }
            });
            group.members.push(node.id.clone());
        }
    }
    model.groups = groups;
}
