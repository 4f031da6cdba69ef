//! PROV-JSON encoding.
//!
//! Layout follows the W3C PROV-JSON submission: a `prefix` block, one map per
//! element class, one map per relation kind keyed by relation id. Maps keep
//! insertion order, so the encoding is byte-stable for a given document.

use crate::model::{format_time, AttrValue, Attributes, Element, RelationKind, Term};
use crate::{ProvDocument, PROV_ROLE};
use serde_json::{json, Map, Value};

const ELEMENT_SECTIONS: [&str; 3] = ["entity", "activity", "agent"];

fn attr_value_json(v: &AttrValue) -> Value {
    match v {
        AttrValue::Str(s) => Value::String(s.clone()),
        AttrValue::DateTime(t) => json!({ "$": format_time(t), "type": "xsd:dateTime" }),
        AttrValue::Bool(b) => Value::Bool(*b),
    }
}

fn push_attributes(out: &mut Map<String, Value>, attrs: &Attributes) {
    for (k, v) in attrs.iter() {
        out.insert(k.to_string(), attr_value_json(v));
    }
}

fn element_json(element: &Element) -> Value {
    let mut body = Map::new();
    if let Element::Activity(a) = element {
        body.insert("prov:startTime".into(), Value::String(format_time(&a.start_time)));
        if let Some(end) = &a.end_time {
            body.insert("prov:endTime".into(), Value::String(format_time(end)));
        }
    }
    push_attributes(&mut body, element.attributes());
    Value::Object(body)
}

/// Encode `doc` as a PROV-JSON value.
pub fn to_prov_json(doc: &ProvDocument) -> Value {
    let mut root = Map::new();
    root.insert(
        "prefix".into(),
        json!({ "default": doc.default_namespace() }),
    );

    let mut sections: Vec<Map<String, Value>> = vec![Map::new(); ELEMENT_SECTIONS.len()];
    for element in doc.elements() {
        let slot = match element {
            Element::Entity(_) => 0,
            Element::Activity(_) => 1,
            Element::Agent(_) => 2,
        };
        sections[slot].insert(element.id().to_string(), element_json(element));
    }
    for (name, section) in ELEMENT_SECTIONS.iter().zip(sections) {
        if !section.is_empty() {
            root.insert((*name).to_string(), Value::Object(section));
        }
    }

    for kind in RelationKind::ALL {
        let mut section = Map::new();
        for rel in doc.relations_of(kind) {
            let mut body = Map::new();
            for (member, term) in rel.formal_terms() {
                match term {
                    Term::Ref(id) => {
                        body.insert(member.to_string(), Value::String(id.to_string()));
                    }
                    Term::Time(t) => {
                        body.insert(member.to_string(), Value::String(format_time(t)));
                    }
                    Term::Absent => {}
                }
            }
            if let Some(role) = rel.role() {
                body.insert(PROV_ROLE.to_string(), Value::String(role.to_string()));
            }
            section.insert(rel.id.to_string(), Value::Object(body));
        }
        if !section.is_empty() {
            root.insert(kind.prov_name().to_string(), Value::Object(section));
        }
    }

    Value::Object(root)
}

pub fn to_prov_json_string(doc: &ProvDocument) -> Result<String, serde_json::Error> {
    serde_json::to_string(&to_prov_json(doc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ProvId, ProvKind, PROV_TYPE};
    use chrono::{TimeZone, Utc};

    #[test]
    fn encodes_sections_in_insertion_order() {
        let mut doc = ProvDocument::new("http://data.scrc.uk/");
        let dp = doc.entity(ProvId::new(ProvKind::DataProduct, 2), || {
            Attributes::new()
                .with(PROV_TYPE, "file")
                .with("last_updated", Utc.with_ymd_and_hms(2021, 7, 1, 0, 0, 0).unwrap())
                .with("description", "output 1 object")
        });
        let run = doc.activity(
            ProvId::new(ProvKind::CodeRun, 1),
            Utc.with_ymd_and_hms(2021, 7, 17, 18, 21, 11).unwrap(),
            None,
            || Attributes::new().with(PROV_TYPE, "run").with("description", "Test run"),
        );
        let user = doc.agent(ProvId::new(ProvKind::User, 1), || {
            Attributes::new().with(PROV_TYPE, "prov:Person").with("name", "User Not Found")
        });
        doc.was_generated_by(&dp, &run);
        doc.was_started_by(
            &run,
            &user,
            Utc.with_ymd_and_hms(2021, 7, 17, 18, 21, 11).unwrap(),
            Some("code runner"),
        );

        let v = to_prov_json(&doc);
        assert_eq!(v["prefix"]["default"], "http://data.scrc.uk/");
        assert_eq!(
            v["entity"]["api/data_product/2"]["last_updated"],
            json!({"$": "2021-07-01T00:00:00+00:00", "type": "xsd:dateTime"})
        );
        assert_eq!(
            v["activity"]["api/code_run/1"],
            json!({
                "prov:startTime": "2021-07-17T18:21:11+00:00",
                "prov:type": "run",
                "description": "Test run",
            })
        );
        assert_eq!(
            v["wasGeneratedBy"]["_:id1"],
            json!({"prov:entity": "api/data_product/2", "prov:activity": "api/code_run/1"})
        );
        assert_eq!(
            v["wasStartedBy"]["_:id2"],
            json!({
                "prov:activity": "api/code_run/1",
                "prov:trigger": "api/user/1",
                "prov:time": "2021-07-17T18:21:11+00:00",
                "prov:role": "code runner",
            })
        );
        assert!(v.get("used").is_none());

        let keys: Vec<&String> = v["entity"]["api/data_product/2"]
            .as_object()
            .unwrap()
            .keys()
            .collect();
        assert_eq!(keys, vec!["prov:type", "last_updated", "description"]);
    }

    #[test]
    fn string_encoding_is_stable() {
        let mut doc = ProvDocument::new("http://data.scrc.uk/");
        let e = doc.entity(ProvId::new(ProvKind::Object, 4), || {
            Attributes::new().with("file_type", "text file")
        });
        let x = doc.entity(ProvId::new(ProvKind::ExternalObject, 1), Attributes::new);
        doc.specialization_of(&x, &e);

        let a = to_prov_json_string(&doc).unwrap();
        let b = to_prov_json_string(&doc).unwrap();
        assert_eq!(a, b);
        assert_eq!(
            a,
            r#"{"prefix":{"default":"http://data.scrc.uk/"},"entity":{"api/object/4":{"file_type":"text file"},"api/external_object/1":{}},"specializationOf":{"_:id1":{"prov:specificEntity":"api/external_object/1","prov:generalEntity":"api/object/4"}}}"#
        );
    }
}
