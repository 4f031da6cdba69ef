//! PROV document graph
//!
//! A [`ProvDocument`] is the output side of the provenance generator: an
//! append-only list of records (elements and relations) plus an identity
//! registry that guarantees at most one element per identifier.
//!
//! ```text
//!   builder ──► ProvDocument ──┬──► PROV-JSON  (prov_json)
//!   (get-or-create,            ├──► PROV-N     (provn)
//!    append relations)         ├──► PROV-XML   (prov_xml)
//!                              └──► DOT ──► dot -Tjpg / -Tsvg  (dot, report)
//! ```
//!
//! Relations reference elements by [`ProvId`] rather than embedding them, so
//! cycles between entities (e.g. specialization edges) need no shared
//! ownership. Serializers only borrow the document.

pub mod dot;
pub mod model;
pub mod prov_json;
pub mod prov_xml;
pub mod provn;
pub mod report;

use ahash::AHashMap;
use chrono::{DateTime, Utc};

pub use model::{
    format_time, Activity, Agent, AttrValue, Attributes, Element, ElementClass, Entity, ProvId,
    ProvKind, Relation, RelationBody, RelationId, RelationKind, Term, PROV_PERSON, PROV_ROLE,
    PROV_TYPE,
};
pub use report::{
    serialize_prov_document, RenderError, RenderOptions, RenderedReport, ReportFormat,
};

/// One entry of the document, in creation order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    Element(Element),
    Relation(Relation),
}

/// Request-scoped provenance document.
///
/// Not thread-safe and not meant to be: one document is built by one caller
/// and discarded after serialization.
#[derive(Debug, Clone)]
pub struct ProvDocument {
    default_namespace: String,
    records: Vec<Record>,
    /// identifier -> position in `records`
    index: AHashMap<ProvId, usize>,
    relation_count: u32,
}

impl ProvDocument {
    pub fn new(default_namespace: impl Into<String>) -> Self {
        Self {
            default_namespace: default_namespace.into(),
            records: Vec::new(),
            index: AHashMap::new(),
            relation_count: 0,
        }
    }

    pub fn default_namespace(&self) -> &str {
        &self.default_namespace
    }

    // ------------------------------------------------------------------------
    // Identity registry
    // ------------------------------------------------------------------------

    /// Get-or-create. `build` runs only when `id` is not registered yet.
    fn get_or_create(&mut self, id: ProvId, build: impl FnOnce(ProvId) -> Element) -> ProvId {
        if let Some(&pos) = self.index.get(&id) {
            if let Record::Element(existing) = &self.records[pos] {
                tracing::trace!(id = id.as_str(), class = ?existing.class(), "reusing element");
            }
            return id;
        }
        let element = build(id.clone());
        self.index.insert(id.clone(), self.records.len());
        self.records.push(Record::Element(element));
        id
    }

    pub fn entity(&mut self, id: ProvId, attributes: impl FnOnce() -> Attributes) -> ProvId {
        self.get_or_create(id, |id| {
            Element::Entity(Entity {
                id,
                attributes: attributes(),
            })
        })
    }

    pub fn activity(
        &mut self,
        id: ProvId,
        start_time: DateTime<Utc>,
        end_time: Option<DateTime<Utc>>,
        attributes: impl FnOnce() -> Attributes,
    ) -> ProvId {
        self.get_or_create(id, |id| {
            Element::Activity(Activity {
                id,
                start_time,
                end_time,
                attributes: attributes(),
            })
        })
    }

    pub fn agent(&mut self, id: ProvId, attributes: impl FnOnce() -> Attributes) -> ProvId {
        self.get_or_create(id, |id| {
            Element::Agent(Agent {
                id,
                attributes: attributes(),
            })
        })
    }

    pub fn element(&self, id: &ProvId) -> Option<&Element> {
        match self.records.get(*self.index.get(id)?)? {
            Record::Element(e) => Some(e),
            Record::Relation(_) => None,
        }
    }

    // ------------------------------------------------------------------------
    // Relations
    // ------------------------------------------------------------------------

    fn push_relation(&mut self, body: RelationBody) -> RelationId {
        self.relation_count += 1;
        let id = RelationId(self.relation_count);
        self.records.push(Record::Relation(Relation { id, body }));
        id
    }

    pub fn was_attributed_to(&mut self, entity: &ProvId, agent: &ProvId, role: Option<&str>) -> RelationId {
        self.push_relation(RelationBody::Attribution {
            entity: entity.clone(),
            agent: agent.clone(),
            role: role.map(str::to_string),
        })
    }

    pub fn used(&mut self, activity: &ProvId, entity: &ProvId, role: Option<&str>) -> RelationId {
        self.push_relation(RelationBody::Usage {
            activity: activity.clone(),
            entity: entity.clone(),
            role: role.map(str::to_string),
        })
    }

    pub fn was_generated_by(&mut self, entity: &ProvId, activity: &ProvId) -> RelationId {
        self.push_relation(RelationBody::Generation {
            entity: entity.clone(),
            activity: activity.clone(),
        })
    }

    pub fn was_derived_from(&mut self, generated: &ProvId, used: &ProvId) -> RelationId {
        self.push_relation(RelationBody::Derivation {
            generated: generated.clone(),
            used: used.clone(),
        })
    }

    pub fn specialization_of(&mut self, specific: &ProvId, general: &ProvId) -> RelationId {
        self.push_relation(RelationBody::Specialization {
            specific: specific.clone(),
            general: general.clone(),
        })
    }

    pub fn was_started_by(
        &mut self,
        activity: &ProvId,
        trigger: &ProvId,
        time: DateTime<Utc>,
        role: Option<&str>,
    ) -> RelationId {
        self.push_relation(RelationBody::Start {
            activity: activity.clone(),
            trigger: trigger.clone(),
            time,
            role: role.map(str::to_string),
        })
    }

    // ------------------------------------------------------------------------
    // Read access
    // ------------------------------------------------------------------------

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.records.iter().filter_map(|r| match r {
            Record::Element(e) => Some(e),
            Record::Relation(_) => None,
        })
    }

    pub fn relations(&self) -> impl Iterator<Item = &Relation> {
        self.records.iter().filter_map(|r| match r {
            Record::Relation(rel) => Some(rel),
            Record::Element(_) => None,
        })
    }

    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.elements().filter_map(|e| match e {
            Element::Entity(x) => Some(x),
            _ => None,
        })
    }

    pub fn activities(&self) -> impl Iterator<Item = &Activity> {
        self.elements().filter_map(|e| match e {
            Element::Activity(x) => Some(x),
            _ => None,
        })
    }

    pub fn agents(&self) -> impl Iterator<Item = &Agent> {
        self.elements().filter_map(|e| match e {
            Element::Agent(x) => Some(x),
            _ => None,
        })
    }

    pub fn relations_of(&self, kind: RelationKind) -> impl Iterator<Item = &Relation> {
        self.relations().filter(move |r| r.kind() == kind)
    }

    pub fn element_count(&self) -> usize {
        self.index.len()
    }

    pub fn relation_count(&self) -> usize {
        self.relation_count as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn get_or_create_runs_factory_once_per_identifier() {
        let mut doc = ProvDocument::new("http://data.scrc.uk/");
        let id = ProvId::new(ProvKind::DataProduct, 1);

        let mut calls = 0;
        doc.entity(id.clone(), || {
            calls += 1;
            Attributes::new().with("name", "first")
        });
        doc.entity(id.clone(), || {
            calls += 1;
            Attributes::new().with("name", "second")
        });

        assert_eq!(calls, 1);
        assert_eq!(doc.element_count(), 1);
        let element = doc.element(&id).unwrap();
        assert_eq!(element.attributes().get_str("name"), Some("first"));
    }

    #[test]
    fn relations_are_numbered_in_creation_order() {
        let mut doc = ProvDocument::new("http://data.scrc.uk/");
        let e = doc.entity(ProvId::new(ProvKind::DataProduct, 1), Attributes::new);
        let a = doc.agent(ProvId::new(ProvKind::Author, 1), Attributes::new);
        let run = doc.activity(
            ProvId::new(ProvKind::CodeRun, 1),
            Utc.with_ymd_and_hms(2021, 7, 17, 18, 21, 11).unwrap(),
            None,
            Attributes::new,
        );

        let r1 = doc.was_attributed_to(&e, &a, Some("author"));
        let r2 = doc.was_generated_by(&e, &run);
        let r3 = doc.was_attributed_to(&e, &a, Some("author"));

        assert_eq!((r1.0, r2.0, r3.0), (1, 2, 3));
        assert_eq!(doc.relation_count(), 3);
        assert_eq!(doc.relations_of(RelationKind::Attribution).count(), 2);
        let ids: Vec<String> = doc.relations().map(|r| r.id.to_string()).collect();
        assert_eq!(ids, vec!["_:id1", "_:id2", "_:id3"]);
    }

    #[test]
    fn records_interleave_elements_and_relations() {
        let mut doc = ProvDocument::new("http://data.scrc.uk/");
        let e = doc.entity(ProvId::new(ProvKind::DataProduct, 1), Attributes::new);
        let a = doc.agent(ProvId::new(ProvKind::Author, 2), Attributes::new);
        doc.was_attributed_to(&e, &a, None);
        let x = doc.entity(ProvId::new(ProvKind::ExternalObject, 3), Attributes::new);
        doc.specialization_of(&x, &e);

        let shape: Vec<&str> = doc
            .records()
            .iter()
            .map(|r| match r {
                Record::Element(el) => el.keyword(),
                Record::Relation(rel) => rel.kind().prov_name(),
            })
            .collect();
        assert_eq!(
            shape,
            vec!["entity", "agent", "wasAttributedTo", "entity", "specializationOf"]
        );
        assert_eq!(doc.entities().count(), 2);
        assert_eq!(doc.agents().count(), 1);
        assert_eq!(doc.activities().count(), 0);
    }
}
