//! Framework-agnostic invocation model for the engine.
//!
//! The engine never talks to a transport or a CLI parser directly. It works
//! against two narrow contracts defined here: [`ExecutorDescriptor`] (one
//! invokable operation) and [`OperationResult`] (what one execution produced).

use crate::constants;
use crate::error::Error;
use crate::link::Link;
use crate::schema::Schema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::Span;

/// Parameter values keyed by their external (flag-facing) property name.
pub type Parameters = Map<String, Value>;

/// Config values keyed by their external property name.
pub type Configs = Map<String, Value>;

/// Where an operation parameter travels on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    Path,
    Query,
    Header,
    Cookie,
}

impl ParameterLocation {
    pub const PARAMETERS: [Self; 2] = [Self::Path, Self::Query];
    pub const CONFIGS: [Self; 2] = [Self::Header, Self::Cookie];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Path => constants::PARAM_LOCATION_PATH,
            Self::Query => constants::PARAM_LOCATION_QUERY,
            Self::Header => constants::PARAM_LOCATION_HEADER,
            Self::Cookie => constants::PARAM_LOCATION_COOKIE,
        }
    }

    /// Header and cookie values are ambient selections and flow as configs;
    /// path and query values are per-call parameters.
    #[must_use]
    pub const fn is_config(self) -> bool {
        matches!(self, Self::Header | Self::Cookie)
    }
}

impl fmt::Display for ParameterLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maps an external property name to the parameter it represents on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterBinding {
    /// Name used in `Parameters`/`Configs` and for flags.
    pub external_name: String,
    /// Name declared by the operation document.
    pub wire_name: String,
    pub location: ParameterLocation,
}

impl ParameterBinding {
    /// True if `key` names this parameter either bare or as `{location}.{name}`.
    #[must_use]
    pub fn matches(&self, key: &str) -> bool {
        key == self.wire_name
            || key
                .split_once('.')
                .is_some_and(|(location, name)| location == self.location.as_str() && name == self.wire_name)
    }
}

/// Cancellation marker threaded through every call boundary.
///
/// The engine only propagates it; operations decide whether to observe it.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Per-invocation context: cancellation plus the span events are logged under.
#[derive(Debug, Clone)]
pub struct Context {
    pub cancellation: CancellationFlag,
    pub span: Span,
}

impl Context {
    #[must_use]
    pub fn new(span: Span) -> Self {
        Self {
            cancellation: CancellationFlag::default(),
            span,
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new(Span::current())
    }
}

/// One invokable operation.
pub trait ExecutorDescriptor: fmt::Debug + Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str {
        ""
    }

    /// Operation id used for link lookups.
    fn id(&self) -> &str {
        self.name()
    }

    fn parameters_schema(&self) -> &Schema;

    fn configs_schema(&self) -> &Schema;

    /// Ordered parameter property names usable as positional arguments.
    fn positional_args(&self) -> &[String] {
        &[]
    }

    /// Parameter property names whose flags are hidden from help.
    fn hidden_flags(&self) -> &[String] {
        &[]
    }

    fn links(&self) -> &[Link] {
        &[]
    }

    /// Wire location of each path/query/header/cookie parameter.
    fn parameter_bindings(&self) -> &[ParameterBinding] {
        &[]
    }

    /// Prefix of the vendor extensions this operation understands.
    fn extension_prefix(&self) -> &str {
        constants::DEFAULT_EXTENSION_PREFIX
    }

    /// Runs the operation.
    ///
    /// # Errors
    ///
    /// Returns an error if the operation could not be carried out.
    fn execute(
        &self,
        ctx: &Context,
        parameters: Parameters,
        configs: Configs,
    ) -> Result<Box<dyn OperationResult>, Error>;
}

/// The inputs that produced a result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultSource {
    pub operation: String,
    pub parameters: Parameters,
    pub configs: Configs,
    /// Locations of the source operation's parameters.
    #[serde(default)]
    pub bindings: Vec<ParameterBinding>,
}

impl ResultSource {
    /// Looks up a source value by its wire name and location.
    #[must_use]
    pub fn value_at(&self, location: ParameterLocation, wire_name: &str) -> Option<&Value> {
        let binding = self
            .bindings
            .iter()
            .find(|b| b.location == location && b.wire_name == wire_name)?;
        let values = if location.is_config() {
            &self.configs
        } else {
            &self.parameters
        };
        values.get(&binding.external_name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestData {
    pub method: String,
    pub url: String,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// Structured body before encoding, if the request carried one.
    #[serde(default)]
    pub body: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseData {
    pub status: u16,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// Decoded structured body, if the response carried one.
    #[serde(default)]
    pub body: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultipartPart {
    pub name: String,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

/// The decoded payload handed to output formatting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "lowercase")]
pub enum ResultPayload {
    Value(Value),
    Reader(Vec<u8>),
    Multipart(Vec<MultipartPart>),
}

/// Outcome of one execution.
pub trait OperationResult: fmt::Debug + Send + Sync {
    fn source(&self) -> &ResultSource;

    fn request(&self) -> &RequestData;

    fn response(&self) -> &ResponseData;

    fn payload(&self) -> &ResultPayload;
}

/// Concrete result of an HTTP-shaped operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpResult {
    pub source: ResultSource,
    pub request: RequestData,
    pub response: ResponseData,
    pub payload: ResultPayload,
}

impl HttpResult {
    /// Builds a result whose payload is the decoded response body.
    #[must_use]
    pub fn with_value(source: ResultSource, request: RequestData, response: ResponseData) -> Self {
        let payload = ResultPayload::Value(response.body.clone().unwrap_or(Value::Null));
        Self {
            source,
            request,
            response,
            payload,
        }
    }
}

impl OperationResult for HttpResult {
    fn source(&self) -> &ResultSource {
        &self.source
    }

    fn request(&self) -> &RequestData {
        &self.request
    }

    fn response(&self) -> &ResponseData {
        &self.response
    }

    fn payload(&self) -> &ResultPayload {
        &self.payload
    }
}
