//! PROV vocabulary: identifiers, attribute values, elements and relations.

use chrono::{DateTime, Utc};
use std::fmt;

pub const PROV_TYPE: &str = "prov:type";
pub const PROV_ROLE: &str = "prov:role";
pub const PROV_PERSON: &str = "prov:Person";

/// Render a timestamp the way every serializer writes it
/// (`2021-07-17T18:21:11+00:00`).
pub fn format_time(t: &DateTime<Utc>) -> String {
    t.to_rfc3339()
}

// ============================================================================
// Identifiers
// ============================================================================

/// PROV element class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementClass {
    Entity,
    Activity,
    Agent,
}

/// The kinds of registry record that become PROV elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProvKind {
    DataProduct,
    Object,
    CodeRepo,
    CodeRepoRelease,
    ExternalObject,
    Author,
    User,
    CodeRun,
}

impl ProvKind {
    /// URL path segment used in identifiers (`api/<segment>/<id>`).
    pub fn segment(self) -> &'static str {
        match self {
            Self::DataProduct => "data_product",
            Self::Object => "object",
            Self::CodeRepo => "code_repo",
            Self::CodeRepoRelease => "code_repo_release",
            Self::ExternalObject => "external_object",
            Self::Author => "author",
            Self::User => "user",
            Self::CodeRun => "code_run",
        }
    }
}

/// Document-unique identifier of an element, relative to the document's
/// default namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProvId(String);

impl ProvId {
    pub fn new(kind: ProvKind, id: u64) -> Self {
        Self(format!("api/{}/{id}", kind.segment()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProvId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Synthetic relation identifier, numbered from 1 in creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RelationId(pub u32);

impl fmt::Display for RelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "_:id{}", self.0)
    }
}

// ============================================================================
// Attributes
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrValue {
    Str(String),
    DateTime(DateTime<Utc>),
    Bool(bool),
}

impl From<&str> for AttrValue {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<DateTime<Utc>> for AttrValue {
    fn from(v: DateTime<Utc>) -> Self {
        Self::DateTime(v)
    }
}

impl From<bool> for AttrValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

/// Ordered attribute list in which no key appears twice.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes {
    entries: Vec<(String, AttrValue)>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `key`, or overwrite its value in place if already present.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<AttrValue>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, v)) => *v = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn extend(&mut self, other: Attributes) {
        for (k, v) in other.entries {
            self.insert(k, v);
        }
    }

    pub fn get(&self, key: &str) -> Option<&AttrValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        match self.get(key)? {
            AttrValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttrValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<AttrValue>> FromIterator<(K, V)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut out = Self::new();
        for (k, v) in iter {
            out.insert(k, v);
        }
        out
    }
}

// ============================================================================
// Elements
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    pub id: ProvId,
    pub attributes: Attributes,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Activity {
    pub id: ProvId,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub attributes: Attributes,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Agent {
    pub id: ProvId,
    pub attributes: Attributes,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Element {
    Entity(Entity),
    Activity(Activity),
    Agent(Agent),
}

impl Element {
    pub fn id(&self) -> &ProvId {
        match self {
            Element::Entity(e) => &e.id,
            Element::Activity(a) => &a.id,
            Element::Agent(a) => &a.id,
        }
    }

    pub fn class(&self) -> ElementClass {
        match self {
            Element::Entity(_) => ElementClass::Entity,
            Element::Activity(_) => ElementClass::Activity,
            Element::Agent(_) => ElementClass::Agent,
        }
    }

    pub fn attributes(&self) -> &Attributes {
        match self {
            Element::Entity(e) => &e.attributes,
            Element::Activity(a) => &a.attributes,
            Element::Agent(a) => &a.attributes,
        }
    }

    /// PROV keyword for this element (`entity`, `activity`, `agent`).
    pub fn keyword(&self) -> &'static str {
        match self {
            Element::Entity(_) => "entity",
            Element::Activity(_) => "activity",
            Element::Agent(_) => "agent",
        }
    }

    pub fn prov_type(&self) -> Option<&str> {
        self.attributes().get_str(PROV_TYPE)
    }
}

// ============================================================================
// Relations
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationKind {
    Attribution,
    Usage,
    Generation,
    Derivation,
    Specialization,
    Start,
}

impl RelationKind {
    pub const ALL: [RelationKind; 6] = [
        RelationKind::Attribution,
        RelationKind::Usage,
        RelationKind::Generation,
        RelationKind::Derivation,
        RelationKind::Specialization,
        RelationKind::Start,
    ];

    /// PROV-N / PROV-JSON / PROV-XML name of the relation.
    pub fn prov_name(self) -> &'static str {
        match self {
            RelationKind::Attribution => "wasAttributedTo",
            RelationKind::Usage => "used",
            RelationKind::Generation => "wasGeneratedBy",
            RelationKind::Derivation => "wasDerivedFrom",
            RelationKind::Specialization => "specializationOf",
            RelationKind::Start => "wasStartedBy",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelationBody {
    Attribution {
        entity: ProvId,
        agent: ProvId,
        role: Option<String>,
    },
    Usage {
        activity: ProvId,
        entity: ProvId,
        role: Option<String>,
    },
    Generation {
        entity: ProvId,
        activity: ProvId,
    },
    Derivation {
        generated: ProvId,
        used: ProvId,
    },
    Specialization {
        specific: ProvId,
        general: ProvId,
    },
    Start {
        activity: ProvId,
        trigger: ProvId,
        time: DateTime<Utc>,
        role: Option<String>,
    },
}

/// A positional argument of a relation, as PROV-N lists them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Term<'a> {
    Ref(&'a ProvId),
    Time(&'a DateTime<Utc>),
    Absent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    pub id: RelationId,
    pub body: RelationBody,
}

impl Relation {
    pub fn kind(&self) -> RelationKind {
        match self.body {
            RelationBody::Attribution { .. } => RelationKind::Attribution,
            RelationBody::Usage { .. } => RelationKind::Usage,
            RelationBody::Generation { .. } => RelationKind::Generation,
            RelationBody::Derivation { .. } => RelationKind::Derivation,
            RelationBody::Specialization { .. } => RelationKind::Specialization,
            RelationBody::Start { .. } => RelationKind::Start,
        }
    }

    /// Formal arguments in PROV-N order, keyed by their `prov:` member name.
    pub fn formal_terms(&self) -> Vec<(&'static str, Term<'_>)> {
        match &self.body {
            RelationBody::Attribution { entity, agent, .. } => vec![
                ("prov:entity", Term::Ref(entity)),
                ("prov:agent", Term::Ref(agent)),
            ],
            RelationBody::Usage { activity, entity, .. } => vec![
                ("prov:activity", Term::Ref(activity)),
                ("prov:entity", Term::Ref(entity)),
                ("prov:time", Term::Absent),
            ],
            RelationBody::Generation { entity, activity } => vec![
                ("prov:entity", Term::Ref(entity)),
                ("prov:activity", Term::Ref(activity)),
                ("prov:time", Term::Absent),
            ],
            RelationBody::Derivation { generated, used } => vec![
                ("prov:generatedEntity", Term::Ref(generated)),
                ("prov:usedEntity", Term::Ref(used)),
                ("prov:activity", Term::Absent),
                ("prov:generation", Term::Absent),
                ("prov:usage", Term::Absent),
            ],
            RelationBody::Specialization { specific, general } => vec![
                ("prov:specificEntity", Term::Ref(specific)),
                ("prov:generalEntity", Term::Ref(general)),
            ],
            RelationBody::Start {
                activity,
                trigger,
                time,
                ..
            } => vec![
                ("prov:activity", Term::Ref(activity)),
                ("prov:trigger", Term::Ref(trigger)),
                ("prov:starter", Term::Absent),
                ("prov:time", Term::Time(time)),
            ],
        }
    }

    pub fn role(&self) -> Option<&str> {
        match &self.body {
            RelationBody::Attribution { role, .. }
            | RelationBody::Usage { role, .. }
            | RelationBody::Start { role, .. } => role.as_deref(),
            _ => None,
        }
    }

    /// Directed edge for graph rendering: (from, to).
    pub fn endpoints(&self) -> (&ProvId, &ProvId) {
        match &self.body {
            RelationBody::Attribution { entity, agent, .. } => (entity, agent),
            RelationBody::Usage { activity, entity, .. } => (activity, entity),
            RelationBody::Generation { entity, activity } => (entity, activity),
            RelationBody::Derivation { generated, used } => (generated, used),
            RelationBody::Specialization { specific, general } => (specific, general),
            RelationBody::Start {
                activity, trigger, ..
            } => (activity, trigger),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers_use_api_segments() {
        assert_eq!(
            ProvId::new(ProvKind::CodeRepoRelease, 17).as_str(),
            "api/code_repo_release/17"
        );
        assert_eq!(ProvId::new(ProvKind::CodeRun, 1).to_string(), "api/code_run/1");
    }

    #[test]
    fn attribute_insert_replaces_in_place() {
        let mut attrs = Attributes::new()
            .with("name", "repo")
            .with("version", "0.1.0")
            .with("storage", "https://example.org/x");
        attrs.insert("name", "release");
        let keys: Vec<&str> = attrs.keys().collect();
        assert_eq!(keys, vec!["name", "version", "storage"]);
        assert_eq!(attrs.get_str("name"), Some("release"));
        assert_eq!(attrs.len(), 3);
    }

    #[test]
    fn relation_ids_render_as_blank_nodes() {
        assert_eq!(RelationId(12).to_string(), "_:id12");
    }
}
