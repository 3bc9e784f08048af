use tracing::debug;
use vcatalog_core::PropertyKind;
use vcatalog_storage::SchemaResolver;

use crate::error::EngineError;

/// Computes the property names a revert will attempt.
///
/// A non-empty explicit list is returned as given and the schema is never
/// consulted. Otherwise the definition's properties of `kind` are listed in
/// declaration order, followed by the implicit properties. A missing
/// definition contributes nothing.
pub fn select_properties<S: SchemaResolver + ?Sized>(
    schema: &S,
    explicit: &[String],
    definition_name: &str,
    kind: PropertyKind,
    implicit: &[String],
) -> Result<Vec<String>, EngineError> {
    if !explicit.is_empty() {
        return Ok(explicit.to_vec());
    }

    let mut names: Vec<String> = match schema.get_catalog_definition(definition_name)? {
        Some(definition) => definition
            .property_names(kind)
            .map(str::to_string)
            .collect(),
        None => {
            debug!(definition = definition_name, "no catalog definition; implicit properties only");
            Vec::new()
        }
    };
    names.extend(implicit.iter().cloned());
    Ok(names)
}
