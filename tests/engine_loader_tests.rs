use relay_cli::engine::loader::{load_catalog_file, parse_catalog};
use relay_cli::error::{Error, ErrorKind};
use std::io::Write;
use tempfile::NamedTempFile;

const CATALOG: &str = r"
name: volumes
baseUrl: https://api.example.com
operations:
  - id: getVolume
    method: get
    path: /volumes/{id}
    parameters:
      - name: id
        in: path
        schema: {type: string}
    links:
      next:
        operationId: getVolume
        parameters:
          id: $response.body#/next
";

#[test]
fn test_load_catalog_from_yaml_file() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(CATALOG.as_bytes()).unwrap();

    let catalog = load_catalog_file(file.path()).unwrap();

    assert_eq!(catalog.name, "volumes");
    assert_eq!(catalog.extension_prefix, "x-relay");
    assert_eq!(catalog.operations.len(), 1);
    assert!(catalog.operations[0].links.contains_key("next"));
}

#[test]
fn test_load_catalog_accepts_json() {
    let catalog = parse_catalog(
        r#"{"name": "volumes", "extensionPrefix": "x-acme", "operations": [{"id": "listVolumes", "method": "get", "path": "/volumes"}]}"#,
    )
    .unwrap();

    assert_eq!(catalog.extension_prefix, "x-acme");
    assert_eq!(catalog.operations[0].id, "listVolumes");
}

#[test]
fn test_missing_catalog_file() {
    let err = load_catalog_file("/nonexistent/catalog.yaml").unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::Catalog));
    assert!(err.to_string().contains("/nonexistent/catalog.yaml"));
}

#[test]
fn test_invalid_yaml_is_a_parse_error() {
    let err = parse_catalog("name: [unclosed").unwrap_err();
    assert!(matches!(err, Error::Yaml(_)));
}

#[test]
fn test_duplicate_ids_are_rejected() {
    let err = parse_catalog(
        r"
name: dup
operations:
  - {id: getVolume, method: get, path: /a}
  - {id: getVolume, method: get, path: /b}
",
    )
    .unwrap_err();
    assert!(err.to_string().contains("operation id 'getVolume' is declared more than once"));
}

#[test]
fn test_derived_names_must_be_unique() {
    let err = parse_catalog(
        r"
name: dup
operations:
  - {id: getVolume, method: get, path: /a}
  - {id: other, name: get-volume, method: get, path: /b}
",
    )
    .unwrap_err();
    assert!(err.to_string().contains("operation name 'get-volume' is declared more than once"));
}
