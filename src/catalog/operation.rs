use super::models::{OperationSpec, ParameterSpec};
use super::transport::Transport;
use crate::constants;
use crate::error::Error;
use crate::flags::value::format_value;
use crate::invocation::{
    Configs, Context, ExecutorDescriptor, HttpResult, OperationResult, ParameterBinding, ParameterLocation,
    Parameters, RequestData, ResultSource,
};
use crate::link::Link;
use crate::schema::Schema;
use crate::utils::to_kebab_case;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// One operation of a catalog, executable through a [`Transport`].
pub struct CatalogOperation {
    id: String,
    name: String,
    description: String,
    method: String,
    path: String,
    base_url: String,
    extension_prefix: String,
    parameters_schema: Schema,
    configs_schema: Schema,
    bindings: Vec<ParameterBinding>,
    /// External body property name → wire name.
    body_properties: BTreeMap<String, String>,
    positional_args: Vec<String>,
    hidden_flags: Vec<String>,
    links: Vec<Link>,
    transport: Arc<dyn Transport>,
}

impl fmt::Debug for CatalogOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CatalogOperation")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("method", &self.method)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl CatalogOperation {
    /// Builds the operation's schemas and parameter bindings.
    ///
    /// The parameters schema holds path and query parameters plus the
    /// request body's properties; body properties colliding with a
    /// parameter are renamed with a `req-` prefix. The configs schema holds
    /// the catalog-wide configs, the operation's own configs, and its header
    /// and cookie parameters.
    #[must_use]
    pub fn new(
        spec: OperationSpec,
        shared_configs: Option<&Schema>,
        base_url: &str,
        extension_prefix: &str,
        transport: Arc<dyn Transport>,
    ) -> Self {
        let mut parameter_properties = BTreeMap::new();
        let mut parameter_required = Vec::new();
        let mut config_properties = BTreeMap::new();
        let mut config_required = Vec::new();
        let mut bindings = Vec::new();

        for config_schema in [shared_configs, spec.configs.as_ref()].into_iter().flatten() {
            for (name, schema) in &config_schema.properties {
                config_properties.insert(name.clone(), schema.clone());
                if config_schema.is_required(name) {
                    config_required.push(name.clone());
                }
            }
        }

        for parameter in &spec.parameters {
            let external = external_name(&parameter.name, &parameter.schema, extension_prefix);
            let schema = parameter_schema(parameter);
            let (properties, required) = if parameter.location.is_config() {
                (&mut config_properties, &mut config_required)
            } else {
                (&mut parameter_properties, &mut parameter_required)
            };
            properties.insert(external.clone(), schema);
            if parameter.required || parameter.location == ParameterLocation::Path {
                required.push(external.clone());
            }
            bindings.push(ParameterBinding {
                external_name: external,
                wire_name: parameter.name.clone(),
                location: parameter.location,
            });
        }

        let mut body_properties = BTreeMap::new();
        if let Some(body) = &spec.request_body {
            for (wire, schema) in &body.properties {
                let mut external = external_name(wire, schema, extension_prefix);
                while parameter_properties.contains_key(&external) {
                    external = format!("{}{external}", constants::BODY_CONFLICT_PREFIX);
                }
                parameter_properties.insert(external.clone(), schema.clone());
                if body.is_required(wire) {
                    parameter_required.push(external.clone());
                }
                body_properties.insert(external, wire.clone());
            }
        }

        let links = spec
            .links
            .into_iter()
            .map(|(name, mut link)| {
                link.name = name;
                link
            })
            .collect();

        Self {
            name: spec.name.unwrap_or_else(|| to_kebab_case(&spec.id)),
            id: spec.id,
            description: spec.description.unwrap_or_default(),
            method: spec.method.to_uppercase(),
            path: spec.path,
            base_url: base_url.trim_end_matches('/').to_string(),
            extension_prefix: extension_prefix.to_string(),
            parameters_schema: Schema::object(parameter_properties, parameter_required),
            configs_schema: Schema::object(config_properties, config_required),
            bindings,
            body_properties,
            positional_args: spec.positional_args,
            hidden_flags: spec.hidden_flags,
            links,
            transport,
        }
    }

    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Encodes the request for the given inputs.
    ///
    /// # Errors
    ///
    /// Returns a validation error if a path parameter has no value.
    pub fn build_request(&self, parameters: &Parameters, configs: &Configs) -> Result<RequestData, Error> {
        let mut path = self.path.clone();
        let mut query = Vec::new();
        let mut headers = BTreeMap::new();
        let mut cookies = Vec::new();

        for binding in &self.bindings {
            let values = if binding.location.is_config() {
                configs
            } else {
                parameters
            };
            let value = values.get(&binding.external_name);
            match (binding.location, value) {
                (ParameterLocation::Path, Some(value)) => {
                    let placeholder = format!("{{{}}}", binding.wire_name);
                    path = path.replace(&placeholder, &urlencoding::encode(&format_value(value)));
                }
                (ParameterLocation::Path, None) => {
                    return Err(Error::validation(format!(
                        "missing path parameter '{}' for operation '{}'",
                        binding.wire_name, self.name
                    )));
                }
                (ParameterLocation::Query, Some(Value::Array(items))) => {
                    for item in items {
                        query.push(encode_pair(&binding.wire_name, item));
                    }
                }
                (ParameterLocation::Query, Some(value)) => query.push(encode_pair(&binding.wire_name, value)),
                (ParameterLocation::Header, Some(value)) => {
                    headers.insert(binding.wire_name.clone(), format_value(value));
                }
                (ParameterLocation::Cookie, Some(value)) => {
                    cookies.push(format!("{}={}", binding.wire_name, format_value(value)));
                }
                (_, None) => {}
            }
        }

        if !cookies.is_empty() {
            headers.insert(constants::HEADER_COOKIE.to_string(), cookies.join("; "));
        }

        let mut body = Map::new();
        for (external, wire) in &self.body_properties {
            if let Some(value) = parameters.get(external) {
                body.insert(wire.clone(), value.clone());
            }
        }
        let body = if body.is_empty() {
            None
        } else {
            headers.insert(
                constants::HEADER_CONTENT_TYPE.to_string(),
                constants::CONTENT_TYPE_JSON.to_string(),
            );
            Some(Value::Object(body))
        };

        let mut url = format!("{}{path}", self.base_url);
        if !query.is_empty() {
            url.push('?');
            url.push_str(&query.join("&"));
        }

        Ok(RequestData {
            method: self.method.clone(),
            url,
            headers,
            body,
        })
    }
}

fn encode_pair(name: &str, value: &Value) -> String {
    format!(
        "{}={}",
        urlencoding::encode(name),
        urlencoding::encode(&format_value(value))
    )
}

/// `{prefix}-name` on the schema overrides the wire name.
fn external_name(wire: &str, schema: &Schema, prefix: &str) -> String {
    schema
        .extensions
        .get(&format!("{prefix}-{}", constants::EXT_NAME))
        .and_then(Value::as_str)
        .filter(|name| !name.is_empty())
        .unwrap_or(wire)
        .to_string()
}

fn parameter_schema(parameter: &ParameterSpec) -> Schema {
    let mut schema = parameter.schema.clone();
    if schema.description.is_none() {
        schema.description.clone_from(&parameter.description);
    }
    schema
}

impl ExecutorDescriptor for CatalogOperation {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn parameters_schema(&self) -> &Schema {
        &self.parameters_schema
    }

    fn configs_schema(&self) -> &Schema {
        &self.configs_schema
    }

    fn positional_args(&self) -> &[String] {
        &self.positional_args
    }

    fn hidden_flags(&self) -> &[String] {
        &self.hidden_flags
    }

    fn links(&self) -> &[Link] {
        &self.links
    }

    fn parameter_bindings(&self) -> &[ParameterBinding] {
        &self.bindings
    }

    fn extension_prefix(&self) -> &str {
        &self.extension_prefix
    }

    fn execute(
        &self,
        ctx: &Context,
        parameters: Parameters,
        configs: Configs,
    ) -> Result<Box<dyn OperationResult>, Error> {
        let _guard = ctx.span.enter();
        tracing::debug!(operation = %self.id, "executing operation");

        let request = self.build_request(&parameters, &configs)?;
        let response = self.transport.send(ctx, &request)?;
        let source = ResultSource {
            operation: self.id.clone(),
            parameters,
            configs,
            bindings: self.bindings.clone(),
        };
        Ok(Box::new(HttpResult::with_value(source, request, response)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::transport::MockTransport;
    use crate::invocation::ResponseData;
    use serde_json::json;

    fn spec() -> OperationSpec {
        serde_yaml::from_str(
            r"
id: createVolume
method: post
path: /projects/{project_id}/volumes
parameters:
  - name: project_id
    in: path
    schema:
      type: string
      x-relay-name: project
  - name: name
    in: query
    schema:
      type: string
  - name: X-Zone
    in: header
    schema:
      type: string
requestBody:
  type: object
  required: [name]
  properties:
    name:
      type: string
    size:
      type: integer
",
        )
        .unwrap()
    }

    fn operation(transport: Arc<dyn Transport>) -> CatalogOperation {
        CatalogOperation::new(spec(), None, "https://api.example.com/", "x-relay", transport)
    }

    #[test]
    fn builds_schemas_and_bindings() {
        let op = operation(Arc::new(MockTransport::new()));
        assert_eq!(op.name(), "create-volume");
        let params = op.parameters_schema();
        assert!(params.properties.contains_key("project"));
        assert!(params.properties.contains_key("name"));
        assert!(params.properties.contains_key("req-name"));
        assert!(params.properties.contains_key("size"));
        assert!(params.is_required("project"));
        assert!(params.is_required("req-name"));
        assert!(op.configs_schema().properties.contains_key("X-Zone"));
        assert_eq!(op.parameter_bindings().len(), 3);
    }

    #[test]
    fn body_rename_repeats_until_unique() {
        let spec: OperationSpec = serde_yaml::from_str(
            r"
id: tagVolume
method: post
path: /volumes
parameters:
  - name: name
    in: query
    schema:
      type: string
  - name: req-name
    in: query
    schema:
      type: integer
requestBody:
  type: object
  properties:
    name:
      type: boolean
",
        )
        .unwrap();
        let op = CatalogOperation::new(spec, None, "https://api.example.com", "x-relay", Arc::new(MockTransport::new()));

        let params = op.parameters_schema();
        assert_eq!(
            params.properties.keys().map(String::as_str).collect::<Vec<_>>(),
            vec!["name", "req-name", "req-req-name"]
        );
        assert!(params.properties["req-name"].schema_type.includes("integer"));
        assert!(params.properties["req-req-name"].schema_type.includes("boolean"));

        let mut parameters = Parameters::new();
        parameters.insert("req-name".into(), json!(3));
        parameters.insert("req-req-name".into(), json!(true));
        let request = op.build_request(&parameters, &Configs::new()).unwrap();
        assert_eq!(request.url, "https://api.example.com/volumes?req-name=3");
        assert_eq!(request.body, Some(json!({"name": true})));
    }

    #[test]
    fn encodes_request() {
        let op = operation(Arc::new(MockTransport::new()));
        let mut parameters = Parameters::new();
        parameters.insert("project".into(), json!("p 1"));
        parameters.insert("name".into(), json!("q"));
        parameters.insert("req-name".into(), json!("data"));
        let mut configs = Configs::new();
        configs.insert("X-Zone".into(), json!("br-ne1"));

        let request = op.build_request(&parameters, &configs).unwrap();
        assert_eq!(request.method, "POST");
        assert_eq!(request.url, "https://api.example.com/projects/p%201/volumes?name=q");
        assert_eq!(request.headers.get("X-Zone").map(String::as_str), Some("br-ne1"));
        assert_eq!(request.body, Some(json!({"name": "data"})));
    }

    #[test]
    fn missing_path_parameter_is_rejected() {
        let op = operation(Arc::new(MockTransport::new()));
        let err = op.build_request(&Parameters::new(), &Configs::new()).unwrap_err();
        assert!(err.to_string().contains("project_id"));
    }

    #[test]
    fn execute_records_source_and_response() {
        let mut transport = MockTransport::new();
        transport.expect_send().times(1).returning(|_, request| {
            Ok(ResponseData {
                status: 201,
                body: request.body.clone(),
                ..ResponseData::default()
            })
        });
        let op = operation(Arc::new(transport));
        let mut parameters = Parameters::new();
        parameters.insert("project".into(), json!("p1"));
        parameters.insert("req-name".into(), json!("data"));

        let result = op.execute(&Context::default(), parameters, Configs::new()).unwrap();
        assert_eq!(result.response().status, 201);
        assert_eq!(result.source().operation, "createVolume");
        assert_eq!(
            result.source().value_at(ParameterLocation::Path, "project_id"),
            Some(&json!("p1"))
        );
    }
}
