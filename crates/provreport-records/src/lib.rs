//! Registry records (read-only boundary)
//!
//! The provenance generator never owns persistent state. It reads a snapshot
//! of the data registry through [`RegistryReader`]: typed lookups such as
//! "get object by id" or "get the code run whose outputs include component X".
//!
//! Two things live here:
//! - the record types the registry hands out (objects, components, runs, ...)
//! - [`SnapshotRegistry`], an in-memory reader loaded from a JSON snapshot.
//!
//! Optional relations come back as `Option`, never as an error. The only
//! fallible lookup is [`RegistryReader::user_full_name`], which resolves a
//! display name from an external user directory.

pub mod snapshot;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub use snapshot::{Snapshot, SnapshotRegistry};

/// Primary key of a registry record.
pub type RecordId = u64;

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("duplicate {table} id {id} in snapshot")]
    DuplicateId { table: &'static str, id: RecordId },

    #[error("user {0} not found in user directory")]
    UserNotFound(RecordId),

    #[error("user {0} has no full name on record")]
    UserNameMissing(RecordId),

    #[error("failed to read snapshot `{path}`: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid snapshot json: {0}")]
    Json(#[from] serde_json::Error),
}

// ============================================================================
// Records
// ============================================================================

/// Root URI of a storage cache (e.g. `https://github.com/`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageRoot {
    pub id: RecordId,
    pub root: String,
    #[serde(default)]
    pub local: bool,
}

/// Location of an item relative to a [`StorageRoot`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageLocation {
    pub id: RecordId,
    pub path: String,
    pub hash: String,
    #[serde(default = "default_public")]
    pub public: bool,
    pub storage_root: StorageRoot,
}

fn default_public() -> bool {
    true
}

impl StorageLocation {
    /// Root and path joined verbatim; the registry stores roots with their
    /// trailing separator, so nothing is inserted between the two.
    pub fn full_uri(&self) -> String {
        format!("{}{}", self.storage_root.root, self.path)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileType {
    pub id: RecordId,
    pub name: String,
    pub extension: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: RecordId,
    pub name: String,
    #[serde(default)]
    pub identifier: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: RecordId,
    pub username: String,
    #[serde(default)]
    pub full_name: Option<String>,
}

/// A stored item: a file, a code release, a configuration, a data product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Object {
    pub id: RecordId,
    pub last_updated: DateTime<Utc>,
    #[serde(default)]
    pub storage_location: Option<StorageLocation>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub file_type: Option<FileType>,
    /// Author ids, in the order the registry lists them.
    #[serde(default)]
    pub authors: Vec<RecordId>,
    /// Component ids, in the order the registry lists them.
    #[serde(default)]
    pub components: Vec<RecordId>,
}

/// A part of an [`Object`]. Exactly one component per object has
/// `whole_object` set and stands for the object as a unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectComponent {
    pub id: RecordId,
    pub name: String,
    pub object: RecordId,
    #[serde(default)]
    pub whole_object: bool,
    /// Runs consuming this component. Derived from the run table on load.
    #[serde(default, skip_deserializing)]
    pub inputs_of: Vec<RecordId>,
    /// Runs producing this component. Derived from the run table on load.
    #[serde(default, skip_deserializing)]
    pub outputs_of: Vec<RecordId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataProduct {
    pub id: RecordId,
    pub object: RecordId,
    pub namespace: String,
    pub name: String,
    pub version: String,
}

/// An external source a [`DataProduct`] was taken from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalObject {
    pub id: RecordId,
    pub data_product: RecordId,
    pub title: String,
    pub release_date: DateTime<Utc>,
    pub version: String,
    #[serde(default)]
    pub identifier: Option<String>,
    #[serde(default)]
    pub alternate_identifier: Option<String>,
    #[serde(default)]
    pub alternate_identifier_type: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub original_store: Option<StorageLocation>,
}

/// Marks an [`Object`] as an official release of model code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeRepoRelease {
    pub id: RecordId,
    pub object: RecordId,
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub website: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeRun {
    pub id: RecordId,
    pub run_date: DateTime<Utc>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub code_repo: Option<RecordId>,
    #[serde(default)]
    pub model_config: Option<RecordId>,
    pub submission_script: RecordId,
    /// Input component ids, in registry order.
    #[serde(default)]
    pub inputs: Vec<RecordId>,
    /// Output component ids, in registry order.
    #[serde(default)]
    pub outputs: Vec<RecordId>,
    pub updated_by: RecordId,
}

// ============================================================================
// Reader
// ============================================================================

/// Typed read access to the registry.
///
/// Implementations must return list results in a stable order; report
/// determinism depends on it.
pub trait RegistryReader {
    fn data_product(&self, id: RecordId) -> Option<DataProduct>;

    /// The data product publishing `object_id`, if it is published at all.
    fn data_product_of_object(&self, object_id: RecordId) -> Option<DataProduct>;

    fn object(&self, id: RecordId) -> Option<Object>;

    fn component(&self, id: RecordId) -> Option<ObjectComponent>;

    /// First run (in registry order) listing `component_id` among its outputs.
    fn producing_run(&self, component_id: RecordId) -> Option<CodeRun>;

    fn authors_of(&self, object_id: RecordId) -> Vec<Author>;

    fn external_object_of(&self, data_product_id: RecordId) -> Option<ExternalObject>;

    /// Release record attached to a code repository object, if any.
    fn code_repo_release_of(&self, object_id: RecordId) -> Option<CodeRepoRelease>;

    /// Display name from the user directory.
    fn user_full_name(&self, user_id: RecordId) -> Result<String, RecordError>;

    fn whole_object_component(&self, object_id: RecordId) -> Option<ObjectComponent> {
        let object = self.object(object_id)?;
        object
            .components
            .iter()
            .filter_map(|id| self.component(*id))
            .find(|c| c.whole_object)
    }
}
