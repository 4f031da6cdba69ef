//! External-source annotation of data product entities.

use provreport_document::{Attributes, ProvDocument, ProvId, ProvKind};
use provreport_records::{DataProduct, ExternalObject, RegistryReader};

fn external_attributes(ext: &ExternalObject) -> Attributes {
    let mut attrs = Attributes::new()
        .with("title", ext.title.as_str())
        .with("release_date", ext.release_date)
        .with("version", ext.version.as_str());

    let optional = [
        ("identifier", &ext.identifier),
        ("alternate_identifier", &ext.alternate_identifier),
        ("alternate_identifier_type", &ext.alternate_identifier_type),
        ("description", &ext.description),
    ];
    for (key, value) in optional {
        if let Some(v) = value.as_deref().filter(|v| !v.is_empty()) {
            attrs.insert(key, v);
        }
    }
    if let Some(store) = &ext.original_store {
        attrs.insert("original_store", store.full_uri());
    }
    attrs
}

/// Add the external source of `data_product` (if it has one) as an entity
/// specializing `data_product_entity`. Returns the external entity id.
pub fn annotate_external_object<R: RegistryReader + ?Sized>(
    reader: &R,
    doc: &mut ProvDocument,
    data_product: &DataProduct,
    data_product_entity: &ProvId,
) -> Option<ProvId> {
    let Some(ext) = reader.external_object_of(data_product.id) else {
        tracing::debug!(data_product = data_product.id, "no external source");
        return None;
    };
    let entity = doc.entity(ProvId::new(ProvKind::ExternalObject, ext.id), || {
        external_attributes(&ext)
    });
    doc.specialization_of(&entity, data_product_entity);
    Some(entity)
}
