use crate::constants;
use crate::invocation::ParameterLocation;
use crate::link::Link;
use crate::schema::Schema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// An operation catalog as written on disk (YAML or JSON).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogFile {
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
    /// Prefix of the vendor extensions understood by every operation.
    #[serde(default = "default_extension_prefix")]
    pub extension_prefix: String,
    /// Configs shared by every operation, merged into each configs schema.
    #[serde(default)]
    pub configs: Option<Schema>,
    #[serde(default)]
    pub operations: Vec<OperationSpec>,
}

fn default_extension_prefix() -> String {
    constants::DEFAULT_EXTENSION_PREFIX.to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationSpec {
    /// Operation id, the target of `operationId` links.
    pub id: String,
    /// Command name; defaults to the kebab-cased id.
    #[serde(default)]
    pub name: Option<String>,
    pub method: String,
    pub path: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub parameters: Vec<ParameterSpec>,
    /// Object schema of the JSON request body.
    #[serde(default)]
    pub request_body: Option<Schema>,
    /// Operation-specific configs.
    #[serde(default)]
    pub configs: Option<Schema>,
    #[serde(default)]
    pub positional_args: Vec<String>,
    #[serde(default)]
    pub hidden_flags: Vec<String>,
    #[serde(default)]
    pub links: BTreeMap<String, Link>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ParameterSpec {
    pub name: String,
    #[serde(rename = "in")]
    pub location: ParameterLocation,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub schema: Schema,
}
