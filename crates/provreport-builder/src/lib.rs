//! Provenance document builder
//!
//! Starting from one data product, walks the surrounding registry records
//! and writes them into a fresh [`ProvDocument`]:
//!
//! ```text
//!   data product ──► root entity ── authors, external source
//!        │
//!        └─ whole-object component ──► producing run (none: stop here)
//!                                          │
//!              activity ◄──────────────────┘
//!                ├─ runner (wasStartedBy)
//!                ├─ code release / config / submission script (used)
//!                ├─ inputs  (used + wasDerivedFrom)
//!                └─ outputs (wasGeneratedBy)
//! ```
//!
//! Optional records that are missing are skipped; only mandatory references
//! (the root object, the whole-object component, the submission script)
//! produce a [`BuildError`].

pub mod agents;
pub mod external;
pub mod metadata;
pub mod run;

pub use agents::{attach_authors, attach_runner};
pub use external::annotate_external_object;
pub use metadata::object_metadata;
pub use run::{generate_prov_document, generate_prov_document_for_id};

use provreport_document::ProvKind;
use provreport_records::RecordId;

pub const DEFAULT_BASE_URL: &str = "http://data.scrc.uk/";
pub const DEFAULT_UNKNOWN_USER_NAME: &str = "User Not Found";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum BuildError {
    #[error("data product {0} not found")]
    DataProductNotFound(RecordId),

    #[error("{} {id} referenced but missing from the registry", .kind.segment())]
    MissingRecord { kind: ProvKind, id: RecordId },

    #[error("object {0} has no whole-object component")]
    MissingWholeObject(RecordId),
}

/// Per-report settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportConfig {
    /// Default namespace identifiers are resolved against.
    pub base_url: String,
    /// Name given to a run's user when the user directory cannot supply one.
    pub unknown_user_name: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            unknown_user_name: DEFAULT_UNKNOWN_USER_NAME.to_string(),
        }
    }
}

impl ReportConfig {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let mut url = base_url.into();
        if !url.ends_with('/') {
            url.push('/');
        }
        self.base_url = url;
        self
    }
}
