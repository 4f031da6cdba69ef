//! Agent resolution: authors of objects and the user who started a run.

use crate::ReportConfig;
use chrono::{DateTime, Utc};
use provreport_document::{Attributes, ProvDocument, ProvId, ProvKind, PROV_PERSON, PROV_TYPE};
use provreport_records::{Author, RecordId, RegistryReader};

const AUTHOR_ROLE: &str = "author";
const RUNNER_ROLE: &str = "code runner";

/// Attribute `entity` to each of `authors`, in list order.
///
/// Agents are shared across the document; every call still appends its own
/// attribution edge.
pub fn attach_authors(doc: &mut ProvDocument, entity: &ProvId, authors: &[Author]) {
    for author in authors {
        let agent = doc.agent(ProvId::new(ProvKind::Author, author.id), || {
            let mut attrs = Attributes::new()
                .with(PROV_TYPE, PROV_PERSON)
                .with("name", author.name.as_str());
            if let Some(identifier) = author.identifier.as_deref().filter(|i| !i.is_empty()) {
                attrs.insert("identifier", identifier);
            }
            attrs
        });
        doc.was_attributed_to(entity, &agent, Some(AUTHOR_ROLE));
    }
}

/// Record that `user_id` started `activity` at `run_date`.
///
/// A user whose display name cannot be resolved still gets an agent, named
/// with [`ReportConfig::unknown_user_name`].
pub fn attach_runner<R: RegistryReader + ?Sized>(
    reader: &R,
    doc: &mut ProvDocument,
    activity: &ProvId,
    user_id: RecordId,
    run_date: DateTime<Utc>,
    config: &ReportConfig,
) -> ProvId {
    let agent = doc.agent(ProvId::new(ProvKind::User, user_id), || {
        let name = match reader.user_full_name(user_id) {
            Ok(name) => name,
            Err(e) => {
                tracing::warn!(user = user_id, error = %e, "runner name unavailable, using placeholder");
                config.unknown_user_name.clone()
            }
        };
        Attributes::new().with(PROV_TYPE, PROV_PERSON).with("name", name)
    });
    doc.was_started_by(activity, &agent, run_date, Some(RUNNER_ROLE));
    agent
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use provreport_document::RelationKind;
    use provreport_records::{Snapshot, SnapshotRegistry, User};

    fn author(id: u64, name: &str, identifier: Option<&str>) -> Author {
        Author {
            id,
            name: name.into(),
            identifier: identifier.map(str::to_string),
        }
    }

    #[test]
    fn shared_author_gets_one_agent_and_one_edge_per_entity() {
        let mut doc = ProvDocument::new("http://data.scrc.uk/");
        let a = doc.entity(ProvId::new(ProvKind::DataProduct, 1), Attributes::new);
        let b = doc.entity(ProvId::new(ProvKind::DataProduct, 2), Attributes::new);
        let shared = author(3, "Rosanna Massabeti", None);

        attach_authors(&mut doc, &a, std::slice::from_ref(&shared));
        attach_authors(&mut doc, &b, std::slice::from_ref(&shared));

        assert_eq!(doc.agents().count(), 1);
        assert_eq!(doc.relations_of(RelationKind::Attribution).count(), 2);
        let agent = doc.element(&ProvId::new(ProvKind::Author, 3)).unwrap();
        let keys: Vec<&str> = agent.attributes().keys().collect();
        assert_eq!(keys, vec!["prov:type", "name"]);
    }

    #[test]
    fn identifier_is_emitted_when_known() {
        let mut doc = ProvDocument::new("http://data.scrc.uk/");
        let e = doc.entity(ProvId::new(ProvKind::Object, 1), Attributes::new);
        attach_authors(
            &mut doc,
            &e,
            &[author(1, "Ivana Valenti", Some("https://orcid.org/0000-0000-0000-0001"))],
        );
        let agent = doc.element(&ProvId::new(ProvKind::Author, 1)).unwrap();
        assert_eq!(
            agent.attributes().get_str("identifier"),
            Some("https://orcid.org/0000-0000-0000-0001")
        );
    }

    #[test]
    fn attribution_order_follows_author_list() {
        let mut doc = ProvDocument::new("http://data.scrc.uk/");
        let e = doc.entity(ProvId::new(ProvKind::Object, 1), Attributes::new);
        attach_authors(&mut doc, &e, &[author(2, "B", None), author(1, "A", None)]);

        let agents: Vec<String> = doc
            .relations_of(RelationKind::Attribution)
            .map(|r| r.endpoints().1.to_string())
            .collect();
        assert_eq!(agents, vec!["api/author/2", "api/author/1"]);
    }

    #[test]
    fn unresolved_runner_gets_placeholder_name() {
        let snapshot = Snapshot {
            users: vec![User {
                id: 2,
                username: "jdoe".into(),
                full_name: Some("Jane Doe".into()),
            }],
            ..Snapshot::default()
        };
        let reg = SnapshotRegistry::new(snapshot).unwrap();
        let config = ReportConfig::default();
        let t = Utc.with_ymd_and_hms(2021, 7, 17, 18, 21, 11).unwrap();

        let mut doc = ProvDocument::new(config.base_url.as_str());
        let run = doc.activity(ProvId::new(ProvKind::CodeRun, 1), t, None, Attributes::new);
        let missing = attach_runner(&reg, &mut doc, &run, 1, t, &config);
        let known = attach_runner(&reg, &mut doc, &run, 2, t, &config);

        let name = |id: &ProvId| doc.element(id).unwrap().attributes().get_str("name").map(str::to_string);
        assert_eq!(name(&missing).as_deref(), Some("User Not Found"));
        assert_eq!(name(&known).as_deref(), Some("Jane Doe"));
        assert_eq!(doc.relations_of(RelationKind::Start).count(), 2);
    }
}
