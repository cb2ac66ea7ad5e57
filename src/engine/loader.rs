use crate::catalog::models::CatalogFile;
use crate::error::Error;
use crate::fs::{FileReader, LocalFiles};
use crate::utils::to_kebab_case;
use std::collections::BTreeSet;
use std::path::Path;

/// Loads an operation catalog from a YAML or JSON file.
///
/// # Errors
/// Returns an error if the file doesn't exist, cannot be parsed, or declares
/// the same operation id or name twice.
pub fn load_catalog_file<P: AsRef<Path>>(path: P) -> Result<CatalogFile, Error> {
    let path = path.as_ref();
    if !LocalFiles.is_file(path) {
        return Err(Error::invalid_catalog(format!(
            "catalog file '{}' does not exist",
            path.display()
        )));
    }
    tracing::debug!(path = %path.display(), "loading catalog");
    let content = LocalFiles.read_text(path)?;
    parse_catalog(&content)
}

/// Parses catalog text. YAML is a superset of JSON, so both are accepted.
///
/// # Errors
/// Returns an error if the text is not a valid catalog.
pub fn parse_catalog(content: &str) -> Result<CatalogFile, Error> {
    let catalog: CatalogFile = serde_yaml::from_str(content)?;

    let mut ids = BTreeSet::new();
    let mut names = BTreeSet::new();
    for operation in &catalog.operations {
        if !ids.insert(operation.id.as_str()) {
            return Err(Error::invalid_catalog(format!(
                "operation id '{}' is declared more than once",
                operation.id
            )));
        }
        let name = operation
            .name
            .clone()
            .unwrap_or_else(|| to_kebab_case(&operation.id));
        if !names.insert(name.clone()) {
            return Err(Error::invalid_catalog(format!(
                "operation name '{name}' is declared more than once"
            )));
        }
    }
    Ok(catalog)
}
