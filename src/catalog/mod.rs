//! Operation catalogs: a declarative list of HTTP-shaped operations.

pub mod models;
pub mod operation;
pub mod transport;

use crate::invocation::ExecutorDescriptor;
use crate::link::OperationRegistry;
use models::CatalogFile;
use operation::CatalogOperation;
use std::sync::Arc;
use transport::Transport;

pub use transport::DryRunTransport;

#[derive(Debug)]
pub struct Catalog {
    pub name: String,
    pub version: Option<String>,
    operations: Vec<Arc<CatalogOperation>>,
}

impl Catalog {
    #[must_use]
    pub fn new(file: CatalogFile, transport: Arc<dyn Transport>) -> Self {
        let base_url = file.base_url.clone().unwrap_or_default();
        let operations = file
            .operations
            .into_iter()
            .map(|spec| {
                Arc::new(CatalogOperation::new(
                    spec,
                    file.configs.as_ref(),
                    &base_url,
                    &file.extension_prefix,
                    Arc::clone(&transport),
                ))
            })
            .collect();
        Self {
            name: file.name,
            version: file.version,
            operations,
        }
    }

    /// Finds an operation by command name, falling back to its id.
    #[must_use]
    pub fn operation(&self, name: &str) -> Option<Arc<CatalogOperation>> {
        self.operations
            .iter()
            .find(|op| op.name() == name)
            .or_else(|| self.operations.iter().find(|op| op.id() == name))
            .cloned()
    }

    pub fn operations(&self) -> impl Iterator<Item = &Arc<CatalogOperation>> {
        self.operations.iter()
    }

    #[must_use]
    pub fn operation_names(&self) -> Vec<String> {
        self.operations.iter().map(|op| op.name().to_string()).collect()
    }
}

impl OperationRegistry for Catalog {
    fn lookup_by_id(&self, id: &str) -> Option<Arc<dyn ExecutorDescriptor>> {
        self.operations
            .iter()
            .find(|op| op.id() == id)
            .map(|op| Arc::clone(op) as Arc<dyn ExecutorDescriptor>)
    }

    /// Accepts `#/operations/<id>` and `#/paths/<escaped path>/<method>`,
    /// with or without a document before the `#`.
    fn resolve_ref(&self, reference: &str) -> Option<Arc<dyn ExecutorDescriptor>> {
        let fragment = reference.split_once('#').map_or(reference, |(_, fragment)| fragment);
        let pointer = crate::link::pointer::JsonPointer::parse(fragment).ok()?;
        match pointer.tokens() {
            [kind, id] if kind == "operations" => self.lookup_by_id(id),
            [kind, path, method] if kind == "paths" => self
                .operations
                .iter()
                .find(|op| op.path() == path && op.method().eq_ignore_ascii_case(method))
                .map(|op| Arc::clone(op) as Arc<dyn ExecutorDescriptor>),
            _ => {
                tracing::debug!(reference, "unsupported operation reference");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::loader::parse_catalog;

    fn catalog() -> Catalog {
        let file = parse_catalog(
            r"
name: volumes
operations:
  - id: getVolume
    method: get
    path: /volumes/{id}
    parameters:
      - name: id
        in: path
        schema: {type: string}
  - id: listVolumes
    name: list
    method: get
    path: /volumes
",
        )
        .unwrap();
        Catalog::new(file, Arc::new(DryRunTransport))
    }

    #[test]
    fn finds_operations_by_name_or_id() {
        let catalog = catalog();
        assert_eq!(catalog.operation("get-volume").unwrap().id(), "getVolume");
        assert_eq!(catalog.operation("listVolumes").unwrap().name(), "list");
        assert!(catalog.operation("nope").is_none());
    }

    #[test]
    fn resolves_operation_refs() {
        let catalog = catalog();
        let by_id = catalog.resolve_ref("#/operations/listVolumes").unwrap();
        assert_eq!(by_id.id(), "listVolumes");
        let by_path = catalog.resolve_ref("volumes.yaml#/paths/~1volumes~1{id}/GET").unwrap();
        assert_eq!(by_path.id(), "getVolume");
        assert!(catalog.resolve_ref("#/components/x").is_none());
    }
}
