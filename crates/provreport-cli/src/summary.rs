//! Human-readable document summary (`provreport summary`).

use colored::Colorize;
use provreport_document::{ElementClass, ProvDocument, RelationKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentSummary {
    pub entities: usize,
    pub activities: usize,
    pub agents: usize,
    /// Relation counts per kind, in PROV-JSON section order; kinds with no
    /// relations are left out.
    pub relations: Vec<(RelationKind, usize)>,
}

impl DocumentSummary {
    pub fn of(doc: &ProvDocument) -> Self {
        let count = |class| doc.elements().filter(|e| e.class() == class).count();
        let relations = RelationKind::ALL
            .iter()
            .map(|&k| (k, doc.relations_of(k).count()))
            .filter(|&(_, n)| n > 0)
            .collect();
        Self {
            entities: count(ElementClass::Entity),
            activities: count(ElementClass::Activity),
            agents: count(ElementClass::Agent),
            relations,
        }
    }

    pub fn relation_total(&self) -> usize {
        self.relations.iter().map(|(_, n)| n).sum()
    }

    /// Render for a terminal. `NO_COLOR` / `CLICOLOR` are honoured by
    /// `colored`.
    pub fn render(&self, title: &str) -> String {
        let row = |label: &str, n: usize, paint: fn(String) -> colored::ColoredString| {
            format!("  {} {}\n", paint(format!("{label:<18}")), n)
        };
        let mut out = format!("{}\n", title.bold());
        out.push_str(&row("entities", self.entities, |s| s.yellow()));
        out.push_str(&row("activities", self.activities, |s| s.blue()));
        out.push_str(&row("agents", self.agents, |s| s.magenta()));
        out.push_str(&row("relations", self.relation_total(), |s| s.green()));
        for (kind, n) in &self.relations {
            out.push_str(&format!("    {:<16} {}\n", kind.prov_name(), n));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use provreport_document::{Attributes, ProvId, ProvKind};

    #[test]
    fn counts_elements_and_relations() {
        let mut doc = ProvDocument::new("http://data.scrc.uk/");
        let a = doc.entity(ProvId::new(ProvKind::DataProduct, 1), Attributes::new);
        let b = doc.entity(ProvId::new(ProvKind::DataProduct, 2), Attributes::new);
        let who = doc.agent(ProvId::new(ProvKind::Author, 1), Attributes::new);
        doc.was_attributed_to(&a, &who, Some("author"));
        doc.was_attributed_to(&b, &who, Some("author"));
        doc.was_derived_from(&a, &b);

        let summary = DocumentSummary::of(&doc);
        assert_eq!((summary.entities, summary.activities, summary.agents), (2, 0, 1));
        assert_eq!(
            summary.relations,
            vec![(RelationKind::Attribution, 2), (RelationKind::Derivation, 1)]
        );
        assert_eq!(summary.relation_total(), 3);

        colored::control::set_override(false);
        let text = summary.render("api/data_product/1");
        assert!(text.starts_with("api/data_product/1\n"));
        assert!(text.contains("wasAttributedTo"));
        assert!(text.contains("wasDerivedFrom"));
    }
}
