//! Graphviz DOT rendering.
//!
//! Styling follows the usual PROV diagram conventions: entities are yellow
//! ellipses, activities blue boxes, agents orange houses. With
//! `show_attributes` each element with attributes gets a note-shaped
//! annotation node hanging off it on a dashed edge.

use crate::model::{format_time, AttrValue, Element, Relation, RelationKind};
use crate::{ProvDocument, Record};
use ahash::AHashMap;

fn dot_escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

fn element_style(element: &Element) -> &'static str {
    match element {
        Element::Entity(_) => "shape=oval, style=filled, fillcolor=\"#FFFC87\", color=\"#808080\"",
        Element::Activity(_) => "shape=box, style=filled, fillcolor=\"#9FB1FC\", color=\"#0000FF\"",
        Element::Agent(_) => "shape=house, style=filled, fillcolor=\"#FED37F\"",
    }
}

fn relation_style(kind: RelationKind) -> &'static str {
    match kind {
        RelationKind::Generation => ", fontcolor=\"darkgreen\", color=\"darkgreen\"",
        RelationKind::Usage => ", fontcolor=\"red4\", color=\"red3\"",
        RelationKind::Attribution => ", fontcolor=\"#FED37F\", color=\"#FED37F\"",
        RelationKind::Start => ", fontcolor=\"#0000FF\", color=\"#0000FF\"",
        RelationKind::Derivation | RelationKind::Specialization => "",
    }
}

fn annotation_label(element: &Element) -> String {
    let mut label = String::new();
    if let Element::Activity(a) = element {
        label.push_str(&format!("startTime: {}\\l", format_time(&a.start_time)));
        if let Some(end) = &a.end_time {
            label.push_str(&format!("endTime: {}\\l", format_time(end)));
        }
    }
    for (k, v) in element.attributes().iter() {
        let value = match v {
            AttrValue::Str(s) => dot_escape(s),
            AttrValue::DateTime(t) => format_time(t),
            AttrValue::Bool(b) => b.to_string(),
        };
        label.push_str(&format!("{}: {}\\l", dot_escape(k), value));
    }
    label
}

fn edge_label(rel: &Relation, show_attributes: bool) -> String {
    match rel.role() {
        Some(role) if show_attributes => {
            format!("{}\\n({})", rel.kind().prov_name(), dot_escape(role))
        }
        _ => rel.kind().prov_name().to_string(),
    }
}

/// Render `doc` as a DOT digraph.
pub fn to_dot(doc: &ProvDocument, show_attributes: bool) -> String {
    let mut out = String::new();
    out.push_str("digraph prov {\n");
    out.push_str("  charset=\"utf-8\";\n");
    out.push_str("  rankdir=BT;\n");
    out.push_str("  node [fontname=\"Helvetica\", fontsize=10];\n");
    out.push_str("  edge [fontname=\"Helvetica\", fontsize=8];\n\n");

    let mut node_names: AHashMap<&str, String> = AHashMap::new();
    let mut annotations = 0usize;

    for record in doc.records() {
        match record {
            Record::Element(element) => {
                let name = format!("n{}", node_names.len() + 1);
                let id = element.id().as_str();
                out.push_str(&format!(
                    "  {name} [label=\"{}\", {}, URL=\"{}{}\"];\n",
                    dot_escape(id),
                    element_style(element),
                    dot_escape(doc.default_namespace()),
                    dot_escape(id),
                ));
                let has_annotation =
                    !element.attributes().is_empty() || matches!(element, Element::Activity(_));
                if show_attributes && has_annotation {
                    annotations += 1;
                    let ann = format!("ann{annotations}");
                    out.push_str(&format!(
                        "  {ann} [shape=note, color=\"gray\", fontcolor=\"black\", fontsize=8, label=\"{}\"];\n",
                        annotation_label(element)
                    ));
                    out.push_str(&format!(
                        "  {ann} -> {name} [style=dashed, arrowhead=none, color=\"gray\"];\n"
                    ));
                }
                node_names.insert(id, name);
            }
            Record::Relation(rel) => {
                let (from, to) = rel.endpoints();
                let (Some(a), Some(b)) = (
                    node_names.get(from.as_str()),
                    node_names.get(to.as_str()),
                ) else {
                    tracing::warn!(
                        relation = %rel.id,
                        from = from.as_str(),
                        to = to.as_str(),
                        "relation references an unknown element; edge dropped"
                    );
                    continue;
                };
                out.push_str(&format!(
                    "  {a} -> {b} [label=\"{}\"{}];\n",
                    edge_label(rel, show_attributes),
                    relation_style(rel.kind())
                ));
            }
        }
    }

    out.push_str("}\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Attributes, ProvId, ProvKind, PROV_TYPE};

    fn sample() -> ProvDocument {
        let mut doc = ProvDocument::new("http://data.scrc.uk/");
        let dp = doc.entity(ProvId::new(ProvKind::DataProduct, 1), || {
            Attributes::new().with(PROV_TYPE, "file").with("description", "a \"quoted\" file")
        });
        let author = doc.agent(ProvId::new(ProvKind::Author, 1), || {
            Attributes::new().with("name", "Ivana Valenti")
        });
        doc.was_attributed_to(&dp, &author, Some("author"));
        doc
    }

    #[test]
    fn topology_is_independent_of_attribute_display() {
        let with = to_dot(&sample(), true);
        let without = to_dot(&sample(), false);

        for text in [&with, &without] {
            assert!(text.contains("n1 [label=\"api/data_product/1\", shape=oval"));
            assert!(text.contains("n2 [label=\"api/author/1\", shape=house"));
            assert!(text.contains("n1 -> n2 [label=\"wasAttributedTo"));
        }
        assert!(with.contains("shape=note"));
        assert!(with.contains("description: a \\\"quoted\\\" file\\l"));
        assert!(with.contains("wasAttributedTo\\n(author)"));
        assert!(!without.contains("shape=note"));
        assert!(!without.contains("(author)"));
    }

    #[test]
    fn dangling_relations_are_skipped() {
        let mut doc = ProvDocument::new("http://data.scrc.uk/");
        let e = doc.entity(ProvId::new(ProvKind::Object, 1), Attributes::new);
        doc.was_derived_from(&e, &ProvId::new(ProvKind::Object, 2));
        let text = to_dot(&doc, true);
        assert!(!text.contains("->"));
    }
}
