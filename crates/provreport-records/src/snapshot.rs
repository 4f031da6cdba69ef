//! In-memory registry snapshot.
//!
//! The on-disk form is a single JSON document with one array per table.
//! Component back-links (`inputs_of` / `outputs_of`) are rebuilt from the
//! run table on load, so the run table is the only source of truth for
//! which runs consumed or produced a component.

use crate::{
    Author, CodeRepoRelease, CodeRun, DataProduct, ExternalObject, Object, ObjectComponent,
    RecordError, RecordId, RegistryReader, User,
};
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub authors: Vec<Author>,
    #[serde(default)]
    pub objects: Vec<Object>,
    #[serde(default)]
    pub components: Vec<ObjectComponent>,
    #[serde(default)]
    pub data_products: Vec<DataProduct>,
    #[serde(default)]
    pub external_objects: Vec<ExternalObject>,
    #[serde(default)]
    pub code_repo_releases: Vec<CodeRepoRelease>,
    #[serde(default)]
    pub code_runs: Vec<CodeRun>,
}

/// [`RegistryReader`] over a fully loaded [`Snapshot`].
#[derive(Debug, Clone)]
pub struct SnapshotRegistry {
    snapshot: Snapshot,
    users: AHashMap<RecordId, usize>,
    authors: AHashMap<RecordId, usize>,
    objects: AHashMap<RecordId, usize>,
    components: AHashMap<RecordId, usize>,
    data_products: AHashMap<RecordId, usize>,
    data_product_by_object: AHashMap<RecordId, usize>,
    external_by_data_product: AHashMap<RecordId, usize>,
    release_by_object: AHashMap<RecordId, usize>,
    code_runs: AHashMap<RecordId, usize>,
}

fn index_by<T>(
    table: &'static str,
    rows: &[T],
    key: impl Fn(&T) -> RecordId,
) -> Result<AHashMap<RecordId, usize>, RecordError> {
    let mut out = AHashMap::with_capacity(rows.len());
    for (i, row) in rows.iter().enumerate() {
        let id = key(row);
        if out.insert(id, i).is_some() {
            return Err(RecordError::DuplicateId { table, id });
        }
    }
    Ok(out)
}

impl SnapshotRegistry {
    pub fn new(mut snapshot: Snapshot) -> Result<Self, RecordError> {
        let users = index_by("user", &snapshot.users, |u| u.id)?;
        let authors = index_by("author", &snapshot.authors, |a| a.id)?;
        let objects = index_by("object", &snapshot.objects, |o| o.id)?;
        let components = index_by("object_component", &snapshot.components, |c| c.id)?;
        let data_products = index_by("data_product", &snapshot.data_products, |d| d.id)?;
        let data_product_by_object =
            index_by("data_product.object", &snapshot.data_products, |d| d.object)?;
        let external_by_data_product = index_by(
            "external_object.data_product",
            &snapshot.external_objects,
            |e| e.data_product,
        )?;
        let release_by_object =
            index_by("code_repo_release.object", &snapshot.code_repo_releases, |r| r.object)?;
        let code_runs = index_by("code_run", &snapshot.code_runs, |r| r.id)?;

        for c in &mut snapshot.components {
            c.inputs_of.clear();
            c.outputs_of.clear();
        }
        for run in &snapshot.code_runs {
            for cid in &run.inputs {
                if let Some(&i) = components.get(cid) {
                    snapshot.components[i].inputs_of.push(run.id);
                }
            }
            for cid in &run.outputs {
                if let Some(&i) = components.get(cid) {
                    snapshot.components[i].outputs_of.push(run.id);
                }
            }
        }

        Ok(Self {
            snapshot,
            users,
            authors,
            objects,
            components,
            data_products,
            data_product_by_object,
            external_by_data_product,
            release_by_object,
            code_runs,
        })
    }

    pub fn from_json_str(text: &str) -> Result<Self, RecordError> {
        let snapshot: Snapshot = serde_json::from_str(text)?;
        Self::new(snapshot)
    }

    pub fn from_path(path: &Path) -> Result<Self, RecordError> {
        let text = std::fs::read_to_string(path).map_err(|source| RecordError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    fn code_run(&self, id: RecordId) -> Option<&CodeRun> {
        self.code_runs.get(&id).map(|&i| &self.snapshot.code_runs[i])
    }
}

impl RegistryReader for SnapshotRegistry {
    fn data_product(&self, id: RecordId) -> Option<DataProduct> {
        self.data_products
            .get(&id)
            .map(|&i| self.snapshot.data_products[i].clone())
    }

    fn data_product_of_object(&self, object_id: RecordId) -> Option<DataProduct> {
        self.data_product_by_object
            .get(&object_id)
            .map(|&i| self.snapshot.data_products[i].clone())
    }

    fn object(&self, id: RecordId) -> Option<Object> {
        self.objects.get(&id).map(|&i| self.snapshot.objects[i].clone())
    }

    fn component(&self, id: RecordId) -> Option<ObjectComponent> {
        self.components
            .get(&id)
            .map(|&i| self.snapshot.components[i].clone())
    }

    fn producing_run(&self, component_id: RecordId) -> Option<CodeRun> {
        let &i = self.components.get(&component_id)?;
        let run_id = *self.snapshot.components[i].outputs_of.first()?;
        self.code_run(run_id).cloned()
    }

    fn authors_of(&self, object_id: RecordId) -> Vec<Author> {
        let Some(&i) = self.objects.get(&object_id) else {
            return Vec::new();
        };
        self.snapshot.objects[i]
            .authors
            .iter()
            .filter_map(|id| self.authors.get(id))
            .map(|&a| self.snapshot.authors[a].clone())
            .collect()
    }

    fn external_object_of(&self, data_product_id: RecordId) -> Option<ExternalObject> {
        self.external_by_data_product
            .get(&data_product_id)
            .map(|&i| self.snapshot.external_objects[i].clone())
    }

    fn code_repo_release_of(&self, object_id: RecordId) -> Option<CodeRepoRelease> {
        self.release_by_object
            .get(&object_id)
            .map(|&i| self.snapshot.code_repo_releases[i].clone())
    }

    fn user_full_name(&self, user_id: RecordId) -> Result<String, RecordError> {
        let &i = self
            .users
            .get(&user_id)
            .ok_or(RecordError::UserNotFound(user_id))?;
        self.snapshot.users[i]
            .full_name
            .clone()
            .filter(|n| !n.is_empty())
            .ok_or(RecordError::UserNameMissing(user_id))
    }
}
