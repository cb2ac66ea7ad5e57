//! Links between operations.
//!
//! A link declares how to derive the input of a target operation from the
//! result of a previous one, using runtime expressions.

pub mod expression;
pub mod pointer;
pub mod resolver;

use crate::constants;
use crate::invocation::ExecutorDescriptor;
use crate::schema::Schema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

pub use expression::{ExpressionEvaluator, RuntimeExpression};
pub use resolver::{LinkDescription, LinkResolver};

/// Finds link targets.
#[cfg_attr(test, mockall::automock)]
pub trait OperationRegistry: Send + Sync {
    fn lookup_by_id(&self, id: &str) -> Option<Arc<dyn ExecutorDescriptor>>;

    /// Resolves an `operationRef` such as `#/operations/getVolume`.
    fn resolve_ref(&self, reference: &str) -> Option<Arc<dyn ExecutorDescriptor>>;
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Link {
    /// Key of the link in its operation's link table.
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_ref: Option<String>,
    /// Target parameter name → runtime expression or constant.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: BTreeMap<String, Value>,
    #[serde(flatten)]
    pub extensions: BTreeMap<String, Value>,
    #[serde(skip)]
    target: OnceLock<Option<Arc<dyn ExecutorDescriptor>>>,
    #[serde(skip)]
    additional_parameters: OnceLock<Schema>,
}

impl Link {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_operation_id(mut self, id: impl Into<String>) -> Self {
        self.operation_id = Some(id.into());
        self
    }

    #[must_use]
    pub fn with_operation_ref(mut self, reference: impl Into<String>) -> Self {
        self.operation_ref = Some(reference.into());
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn with_parameter(mut self, name: impl Into<String>, expression: impl Into<Value>) -> Self {
        self.parameters.insert(name.into(), expression.into());
        self
    }

    /// Adds a request-body pointer mapping under `{prefix}-requestBodyParameters`.
    #[must_use]
    pub fn with_body_parameter(mut self, prefix: &str, pointer: &str, expression: impl Into<String>) -> Self {
        let key = body_parameters_key(prefix);
        let entry = self
            .extensions
            .entry(key)
            .or_insert_with(|| Value::Object(serde_json::Map::new()));
        if let Value::Object(map) = entry {
            map.insert(pointer.to_string(), Value::String(expression.into()));
        }
        self
    }

    /// The target operation, resolved once and cached on the link.
    ///
    /// `operationId` is tried first, then `operationRef`.
    pub fn target(&self, registry: &dyn OperationRegistry) -> Option<Arc<dyn ExecutorDescriptor>> {
        self.target
            .get_or_init(|| {
                let target = self
                    .operation_id
                    .as_deref()
                    .and_then(|id| registry.lookup_by_id(id))
                    .or_else(|| {
                        self.operation_ref
                            .as_deref()
                            .and_then(|reference| registry.resolve_ref(reference))
                    });
                if target.is_none() {
                    tracing::warn!(
                        link = %self.name,
                        operation_id = ?self.operation_id,
                        operation_ref = ?self.operation_ref,
                        "link target not found"
                    );
                }
                target
            })
            .clone()
    }

    /// The link's name, or `missing` when it has no reachable target.
    pub fn display_name(&self, registry: &dyn OperationRegistry) -> &str {
        if self.target(registry).is_some() {
            &self.name
        } else {
            constants::MISSING_LINK_NAME
        }
    }

    /// Request-body mappings (JSON pointer → expression) declared under the
    /// operation's extension prefix. Entries whose expression is not a
    /// string are ignored.
    #[must_use]
    pub fn request_body_parameters(&self, prefix: &str) -> BTreeMap<String, String> {
        let Some(value) = self.extensions.get(&body_parameters_key(prefix)) else {
            return BTreeMap::new();
        };
        let Value::Object(map) = value else {
            tracing::warn!(link = %self.name, "request body parameters must be a mapping, ignoring");
            return BTreeMap::new();
        };
        map.iter()
            .filter_map(|(pointer, expr)| match expr {
                Value::String(expr) => Some((pointer.clone(), expr.clone())),
                _ => {
                    tracing::warn!(link = %self.name, pointer = %pointer, "non-string body parameter expression ignored");
                    None
                }
            })
            .collect()
    }

    pub(crate) fn cached_additional_parameters(&self, compute: impl FnOnce() -> Schema) -> &Schema {
        self.additional_parameters.get_or_init(compute)
    }
}

fn body_parameters_key(prefix: &str) -> String {
    format!("{prefix}-{}", constants::EXT_REQUEST_BODY_PARAMETERS)
}
