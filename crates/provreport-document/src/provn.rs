//! PROV-N textual notation.
//!
//! One record per line, in creation order:
//!
//! ```text
//! document
//!   default <http://data.scrc.uk/>
//!
//!   entity(api/data_product/1, [prov:type="file", ...])
//!   wasAttributedTo(api/data_product/1, api/author/1, [prov:role="author"])
//! endDocument
//! ```
//!
//! Formal arguments that are not set print as `-`.

use crate::model::{format_time, AttrValue, Attributes, Element, Relation, Term};
use crate::{ProvDocument, Record, PROV_ROLE};

fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

fn literal(v: &AttrValue) -> String {
    match v {
        AttrValue::Str(s) => quote(s),
        AttrValue::DateTime(t) => format!("{} %% xsd:dateTime", quote(&format_time(t))),
        AttrValue::Bool(b) => format!("\"{b}\" %% xsd:boolean"),
    }
}

fn attribute_block(attrs: &Attributes) -> Option<String> {
    if attrs.is_empty() {
        return None;
    }
    let parts: Vec<String> = attrs
        .iter()
        .map(|(k, v)| format!("{k}={}", literal(v)))
        .collect();
    Some(format!("[{}]", parts.join(", ")))
}

fn element_line(element: &Element) -> String {
    let mut items = vec![element.id().to_string()];
    if let Element::Activity(a) = element {
        items.push(format_time(&a.start_time));
        items.push(a.end_time.as_ref().map_or_else(|| "-".to_string(), format_time));
    }
    if let Some(block) = attribute_block(element.attributes()) {
        items.push(block);
    }
    format!("{}({})", element.keyword(), items.join(", "))
}

fn relation_line(rel: &Relation) -> String {
    let mut items: Vec<String> = rel
        .formal_terms()
        .into_iter()
        .map(|(_, term)| match term {
            Term::Ref(id) => id.to_string(),
            Term::Time(t) => format_time(t),
            Term::Absent => "-".to_string(),
        })
        .collect();
    if let Some(role) = rel.role() {
        items.push(format!("[{PROV_ROLE}={}]", quote(role)));
    }
    format!("{}({})", rel.kind().prov_name(), items.join(", "))
}

/// Render `doc` as PROV-N.
pub fn to_provn(doc: &ProvDocument) -> String {
    let mut out = String::new();
    out.push_str("document\n");
    out.push_str(&format!("  default <{}>\n", doc.default_namespace()));
    out.push_str("  \n");
    for record in doc.records() {
        let line = match record {
            Record::Element(e) => element_line(e),
            Record::Relation(r) => relation_line(r),
        };
        out.push_str("  ");
        out.push_str(&line);
        out.push('\n');
    }
    out.push_str("endDocument");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ProvId, ProvKind, PROV_PERSON, PROV_TYPE};
    use chrono::{TimeZone, Utc};

    #[test]
    fn renders_entity_attribution_and_specialization() {
        let mut doc = ProvDocument::new("http://data.scrc.uk/");
        let dp = doc.entity(ProvId::new(ProvKind::DataProduct, 1), || {
            Attributes::new()
                .with(PROV_TYPE, "file")
                .with("storage", "https://data.scrc.uk/api/text_file/input/1")
                .with("description", "input 1 object")
        });
        let author = doc.agent(ProvId::new(ProvKind::Author, 1), || {
            Attributes::new().with(PROV_TYPE, PROV_PERSON).with("name", "Ivana Valenti")
        });
        doc.was_attributed_to(&dp, &author, Some("author"));
        let ext = doc.entity(ProvId::new(ProvKind::ExternalObject, 1), || {
            Attributes::new()
                .with("title", "this is cr test input 1")
                .with("release_date", Utc.with_ymd_and_hms(2020, 7, 10, 18, 38, 0).unwrap())
        });
        doc.specialization_of(&ext, &dp);

        let expected = concat!(
            "document\n",
            "  default <http://data.scrc.uk/>\n",
            "  \n",
            "  entity(api/data_product/1, [prov:type=\"file\", storage=\"https://data.scrc.uk/api/text_file/input/1\", description=\"input 1 object\"])\n",
            "  agent(api/author/1, [prov:type=\"prov:Person\", name=\"Ivana Valenti\"])\n",
            "  wasAttributedTo(api/data_product/1, api/author/1, [prov:role=\"author\"])\n",
            "  entity(api/external_object/1, [title=\"this is cr test input 1\", release_date=\"2020-07-10T18:38:00+00:00\" %% xsd:dateTime])\n",
            "  specializationOf(api/external_object/1, api/data_product/1)\n",
            "endDocument",
        );
        assert_eq!(to_provn(&doc), expected);
    }

    #[test]
    fn renders_activity_and_placeholder_arguments() {
        let mut doc = ProvDocument::new("http://data.scrc.uk/");
        let t = Utc.with_ymd_and_hms(2021, 7, 17, 18, 21, 11).unwrap();
        let run = doc.activity(ProvId::new(ProvKind::CodeRun, 1), t, None, || {
            Attributes::new().with(PROV_TYPE, "run")
        });
        let user = doc.agent(ProvId::new(ProvKind::User, 1), Attributes::new);
        let out = doc.entity(ProvId::new(ProvKind::DataProduct, 2), Attributes::new);
        let inp = doc.entity(ProvId::new(ProvKind::DataProduct, 1), Attributes::new);
        doc.was_started_by(&run, &user, t, Some("code runner"));
        doc.used(&run, &inp, Some("input data"));
        doc.was_generated_by(&out, &run);
        doc.was_derived_from(&out, &inp);

        let text = to_provn(&doc);
        let lines: Vec<&str> = text.lines().map(str::trim).collect();
        assert!(lines.contains(&"activity(api/code_run/1, 2021-07-17T18:21:11+00:00, -, [prov:type=\"run\"])"));
        assert!(lines.contains(&"agent(api/user/1)"));
        assert!(lines.contains(&"wasStartedBy(api/code_run/1, api/user/1, -, 2021-07-17T18:21:11+00:00, [prov:role=\"code runner\"])"));
        assert!(lines.contains(&"used(api/code_run/1, api/data_product/1, -, [prov:role=\"input data\"])"));
        assert!(lines.contains(&"wasGeneratedBy(api/data_product/2, api/code_run/1, -)"));
        assert!(lines.contains(&"wasDerivedFrom(api/data_product/2, api/data_product/1, -, -, -)"));
    }

    #[test]
    fn quotes_are_escaped() {
        assert_eq!(quote(r#"say "hi""#), r#""say \"hi\"""#);
        assert_eq!(literal(&AttrValue::Bool(true)), "\"true\" %% xsd:boolean");
    }
}
