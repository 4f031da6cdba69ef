//! Descriptive attributes of a registry object.

use provreport_document::Attributes;
use provreport_records::{Object, RegistryReader};

/// Attributes describing `object`, in the fixed order
/// `last_updated`, `storage`, `description`, `namespace`, `name`, `version`,
/// `file_type`. Absent or empty fields are skipped.
///
/// `namespace`/`name`/`version` are only present when the object is
/// published as a data product.
pub fn object_metadata<R: RegistryReader + ?Sized>(reader: &R, object: &Object) -> Attributes {
    let mut attrs = Attributes::new().with("last_updated", object.last_updated);

    if let Some(location) = &object.storage_location {
        attrs.insert("storage", location.full_uri());
    }
    if let Some(description) = object.description.as_deref().filter(|d| !d.is_empty()) {
        attrs.insert("description", description);
    }
    if let Some(dp) = reader.data_product_of_object(object.id) {
        attrs.insert("namespace", dp.namespace);
        attrs.insert("name", dp.name);
        attrs.insert("version", dp.version);
    }
    if let Some(file_type) = &object.file_type {
        attrs.insert("file_type", file_type.name.as_str());
    }
    attrs
}
