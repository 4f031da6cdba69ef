//! Run activity builder: the walk from a data product to the run that
//! produced it, and from that run to everything it touched.

use crate::agents::{attach_authors, attach_runner};
use crate::external::annotate_external_object;
use crate::metadata::object_metadata;
use crate::{BuildError, ReportConfig};
use provreport_document::{Attributes, ProvDocument, ProvId, ProvKind, PROV_TYPE};
use provreport_records::{CodeRun, DataProduct, Object, RecordId, RegistryReader};

const ROLE_SOFTWARE: &str = "software";
const ROLE_MODEL_CONFIG: &str = "model configuration";
const ROLE_SUBMISSION_SCRIPT: &str = "submission script";
const ROLE_INPUT: &str = "input data";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Input,
    Output,
}

/// Look up data product `id` and build its document.
pub fn generate_prov_document_for_id<R: RegistryReader + ?Sized>(
    reader: &R,
    id: RecordId,
    config: &ReportConfig,
) -> Result<ProvDocument, BuildError> {
    let data_product = reader
        .data_product(id)
        .ok_or(BuildError::DataProductNotFound(id))?;
    generate_prov_document(reader, &data_product, config)
}

/// Build the provenance document of `data_product`.
///
/// When no run produced the data product the document holds only the root
/// entity with its authors and external source.
pub fn generate_prov_document<R: RegistryReader + ?Sized>(
    reader: &R,
    data_product: &DataProduct,
    config: &ReportConfig,
) -> Result<ProvDocument, BuildError> {
    let mut walk = Walk {
        reader,
        config,
        doc: ProvDocument::new(config.base_url.as_str()),
    };

    let object = reader
        .object(data_product.object)
        .ok_or(BuildError::MissingRecord {
            kind: ProvKind::Object,
            id: data_product.object,
        })?;
    let root = walk.file_entity(data_product, &object);

    let whole = reader
        .whole_object_component(object.id)
        .ok_or(BuildError::MissingWholeObject(object.id))?;
    let Some(run) = reader.producing_run(whole.id) else {
        tracing::debug!(
            data_product = data_product.id,
            component = whole.id,
            "no producing run, returning entity-only document"
        );
        return Ok(walk.doc);
    };

    walk.run(&run, &root, data_product.id)?;

    tracing::debug!(
        data_product = data_product.id,
        elements = walk.doc.element_count(),
        relations = walk.doc.relation_count(),
        "provenance document built"
    );
    Ok(walk.doc)
}

struct Walk<'a, R: ?Sized> {
    reader: &'a R,
    config: &'a ReportConfig,
    doc: ProvDocument,
}

impl<R: RegistryReader + ?Sized> Walk<'_, R> {
    /// `api/data_product/<id>` entity with its authors and external source.
    fn file_entity(&mut self, data_product: &DataProduct, object: &Object) -> ProvId {
        let reader = self.reader;
        let entity = self
            .doc
            .entity(ProvId::new(ProvKind::DataProduct, data_product.id), || {
                let mut attrs = Attributes::new().with(PROV_TYPE, "file");
                attrs.extend(object_metadata(reader, object));
                attrs
            });
        attach_authors(&mut self.doc, &entity, &reader.authors_of(object.id));
        annotate_external_object(reader, &mut self.doc, data_product, &entity);
        entity
    }

    /// Plain object entity (`api/object/<id>`) with its authors.
    fn object_entity(&mut self, object: &Object) -> ProvId {
        let reader = self.reader;
        let entity = self
            .doc
            .entity(ProvId::new(ProvKind::Object, object.id), || {
                object_metadata(reader, object)
            });
        attach_authors(&mut self.doc, &entity, &reader.authors_of(object.id));
        entity
    }

    fn run(&mut self, run: &CodeRun, root: &ProvId, root_id: RecordId) -> Result<(), BuildError> {
        let activity = self.doc.activity(
            ProvId::new(ProvKind::CodeRun, run.id),
            run.run_date,
            None,
            || {
                let mut attrs = Attributes::new().with(PROV_TYPE, "run");
                if let Some(d) = run.description.as_deref().filter(|d| !d.is_empty()) {
                    attrs.insert("description", d);
                }
                attrs
            },
        );
        self.doc.was_generated_by(root, &activity);
        attach_runner(
            self.reader,
            &mut self.doc,
            &activity,
            run.updated_by,
            run.run_date,
            self.config,
        );

        if let Some(repo_id) = run.code_repo {
            self.code_repo(&activity, repo_id);
        }
        if let Some(config_id) = run.model_config {
            match self.reader.object(config_id) {
                Some(object) => {
                    let entity = self.object_entity(&object);
                    self.doc.used(&activity, &entity, Some(ROLE_MODEL_CONFIG));
                }
                None => tracing::debug!(run = run.id, object = config_id, "model config missing"),
            }
        }

        let script = self
            .reader
            .object(run.submission_script)
            .ok_or(BuildError::MissingRecord {
                kind: ProvKind::Object,
                id: run.submission_script,
            })?;
        let entity = self.object_entity(&script);
        self.doc.used(&activity, &entity, Some(ROLE_SUBMISSION_SCRIPT));

        self.linked_files(&activity, root, root_id, &run.inputs, Direction::Input);
        self.linked_files(&activity, root, root_id, &run.outputs, Direction::Output);
        Ok(())
    }

    /// Released code gets an `api/code_repo_release/<release id>` entity,
    /// unreleased code an `api/code_repo/<object id>` one.
    fn code_repo(&mut self, activity: &ProvId, repo_id: RecordId) {
        let reader = self.reader;
        let Some(repo) = reader.object(repo_id) else {
            tracing::debug!(object = repo_id, "code repo object missing");
            return;
        };

        let entity = match reader.code_repo_release_of(repo.id) {
            Some(release) => self
                .doc
                .entity(ProvId::new(ProvKind::CodeRepoRelease, release.id), || {
                    let mut attrs = object_metadata(reader, &repo);
                    attrs.insert("name", release.name.as_str());
                    attrs.insert("version", release.version.as_str());
                    if let Some(website) = release.website.as_deref().filter(|w| !w.is_empty()) {
                        attrs.insert("website", website);
                    }
                    attrs
                }),
            None => {
                tracing::debug!(object = repo.id, "code repo has no release record");
                self.doc
                    .entity(ProvId::new(ProvKind::CodeRepo, repo.id), || {
                        object_metadata(reader, &repo)
                    })
            }
        };

        attach_authors(&mut self.doc, &entity, &reader.authors_of(repo.id));
        self.doc.used(activity, &entity, Some(ROLE_SOFTWARE));
    }

    fn linked_files(
        &mut self,
        activity: &ProvId,
        root: &ProvId,
        root_id: RecordId,
        components: &[RecordId],
        direction: Direction,
    ) {
        let reader = self.reader;
        for &component_id in components {
            let Some(component) = reader.component(component_id) else {
                tracing::debug!(component = component_id, "component missing");
                continue;
            };
            let Some(object) = reader.object(component.object) else {
                tracing::debug!(component = component_id, object = component.object, "object missing");
                continue;
            };
            let Some(data_product) = reader.data_product_of_object(object.id) else {
                tracing::debug!(
                    component = component_id,
                    object = object.id,
                    "object is not a data product, skipped"
                );
                continue;
            };
            if direction == Direction::Output && data_product.id == root_id {
                continue;
            }

            let entity = self.file_entity(&data_product, &object);
            match direction {
                Direction::Input => {
                    self.doc.used(activity, &entity, Some(ROLE_INPUT));
                    self.doc.was_derived_from(root, &entity);
                }
                Direction::Output => {
                    self.doc.was_generated_by(&entity, activity);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use provreport_records::{ObjectComponent, Snapshot, SnapshotRegistry};

    fn object(id: u64, components: Vec<u64>) -> Object {
        Object {
            id,
            last_updated: Utc.with_ymd_and_hms(2021, 7, 1, 0, 0, 0).unwrap(),
            storage_location: None,
            description: None,
            file_type: None,
            authors: vec![],
            components,
        }
    }

    fn whole(id: u64, object: u64) -> ObjectComponent {
        ObjectComponent {
            id,
            name: "whole_object".into(),
            object,
            whole_object: true,
            inputs_of: vec![],
            outputs_of: vec![],
        }
    }

    fn dp(id: u64, object: u64) -> DataProduct {
        DataProduct {
            id,
            object,
            namespace: "prov".into(),
            name: format!("dp/{id}"),
            version: "0.1.0".into(),
        }
    }

    #[test]
    fn unknown_data_product_is_not_found() {
        let reg = SnapshotRegistry::new(Snapshot::default()).unwrap();
        let err = generate_prov_document_for_id(&reg, 42, &ReportConfig::default()).unwrap_err();
        assert_eq!(err, BuildError::DataProductNotFound(42));
    }

    #[test]
    fn missing_whole_object_component_is_an_error() {
        let snapshot = Snapshot {
            objects: vec![object(1, vec![])],
            data_products: vec![dp(1, 1)],
            ..Snapshot::default()
        };
        let reg = SnapshotRegistry::new(snapshot).unwrap();
        let err = generate_prov_document_for_id(&reg, 1, &ReportConfig::default()).unwrap_err();
        assert_eq!(err, BuildError::MissingWholeObject(1));
    }

    #[test]
    fn missing_submission_script_is_an_error() {
        let snapshot = Snapshot {
            objects: vec![object(1, vec![1])],
            components: vec![whole(1, 1)],
            data_products: vec![dp(1, 1)],
            code_runs: vec![CodeRun {
                id: 1,
                run_date: Utc.with_ymd_and_hms(2021, 7, 17, 18, 21, 11).unwrap(),
                description: None,
                code_repo: None,
                model_config: None,
                submission_script: 99,
                inputs: vec![],
                outputs: vec![1],
                updated_by: 1,
            }],
            ..Snapshot::default()
        };
        let reg = SnapshotRegistry::new(snapshot).unwrap();
        let err = generate_prov_document_for_id(&reg, 1, &ReportConfig::default()).unwrap_err();
        assert_eq!(
            err,
            BuildError::MissingRecord {
                kind: ProvKind::Object,
                id: 99
            }
        );
    }

    #[test]
    fn document_uses_configured_namespace() {
        let snapshot = Snapshot {
            objects: vec![object(1, vec![1])],
            components: vec![whole(1, 1)],
            data_products: vec![dp(1, 1)],
            ..Snapshot::default()
        };
        let reg = SnapshotRegistry::new(snapshot).unwrap();
        let config = ReportConfig::default().with_base_url("https://registry.example.org");
        let doc = generate_prov_document_for_id(&reg, 1, &config).unwrap();
        assert_eq!(doc.default_namespace(), "https://registry.example.org/");
    }
}
