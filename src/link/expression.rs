//! Runtime expressions evaluated against an operation result.
//!
//! Supported forms:
//!
//! - `$url`, `$method`, `$statusCode`
//! - `$request.{path,query,header,cookie}.<name>`
//! - `$request.body` and `$request.body#/json/pointer`
//! - `$response.header.<name>`, `$response.body`, `$response.body#/pointer`
//! - templates embedding expressions in text, e.g. `vol-{$response.body#/id}`
//!
//! Any value that is not a string starting with `$` and contains no
//! embedded expression is a literal and evaluates to itself.

use crate::error::Error;
use crate::invocation::{OperationResult, ParameterLocation};
use crate::utils::find_header;
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;
use tracing::Span;

static EXPRESSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\$(?:(?P<simple>url|method|statusCode)|(?P<side>request|response)\.(?:(?P<loc>path|query|header|cookie)\.(?P<name>.+)|body(?:#(?P<pointer>.*))?))$",
    )
    .expect("expression pattern is valid")
});

static TEMPLATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{(\$[^{}]+)\}").expect("template pattern is valid"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Request,
    Response,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeExpression {
    Url,
    Method,
    StatusCode,
    Parameter {
        side: Side,
        location: ParameterLocation,
        name: String,
    },
    /// Body of the request or response, optionally narrowed by a JSON pointer.
    Body { side: Side, pointer: String },
    Template(Vec<TemplatePart>),
    Literal(Value),
}

#[derive(Debug, Clone, PartialEq)]
pub enum TemplatePart {
    Text(String),
    Expression(RuntimeExpression),
}

impl RuntimeExpression {
    /// Parses a link parameter value.
    ///
    /// # Errors
    ///
    /// Returns a validation error for strings starting with `$` that are not
    /// a known expression, including `$response` locations other than
    /// `header`.
    pub fn parse(value: &Value) -> Result<Self, Error> {
        let Value::String(text) = value else {
            return Ok(Self::Literal(value.clone()));
        };
        if text.starts_with('$') {
            return Self::parse_expression(text);
        }
        if !TEMPLATE_RE.is_match(text) {
            return Ok(Self::Literal(value.clone()));
        }

        let mut parts = Vec::new();
        let mut last = 0;
        for captures in TEMPLATE_RE.captures_iter(text) {
            let (Some(whole), Some(inner)) = (captures.get(0), captures.get(1)) else {
                continue;
            };
            if whole.start() > last {
                parts.push(TemplatePart::Text(text[last..whole.start()].to_string()));
            }
            parts.push(TemplatePart::Expression(Self::parse_expression(inner.as_str())?));
            last = whole.end();
        }
        if last < text.len() {
            parts.push(TemplatePart::Text(text[last..].to_string()));
        }
        Ok(Self::Template(parts))
    }

    fn parse_expression(text: &str) -> Result<Self, Error> {
        let captures = EXPRESSION_RE
            .captures(text)
            .ok_or_else(|| Error::validation(format!("invalid runtime expression '{text}'")))?;

        if let Some(simple) = captures.name("simple") {
            return Ok(match simple.as_str() {
                "url" => Self::Url,
                "method" => Self::Method,
                _ => Self::StatusCode,
            });
        }

        let side = match captures.name("side").map(|m| m.as_str()) {
            Some("response") => Side::Response,
            _ => Side::Request,
        };

        if let (Some(location), Some(name)) = (captures.name("loc"), captures.name("name")) {
            let location = match location.as_str() {
                "path" => ParameterLocation::Path,
                "query" => ParameterLocation::Query,
                "header" => ParameterLocation::Header,
                _ => ParameterLocation::Cookie,
            };
            if side == Side::Response && location != ParameterLocation::Header {
                return Err(Error::validation(format!(
                    "invalid runtime expression '{text}': responses only expose headers and body"
                )));
            }
            return Ok(Self::Parameter {
                side,
                location,
                name: name.as_str().to_string(),
            });
        }

        Ok(Self::Body {
            side,
            pointer: captures
                .name("pointer")
                .map(|m| m.as_str().to_string())
                .unwrap_or_default(),
        })
    }

    /// Evaluates the expression; `None` means the addressed value is absent.
    #[must_use]
    pub fn evaluate(&self, result: &dyn OperationResult) -> Option<Value> {
        match self {
            Self::Url => Some(Value::String(result.request().url.clone())),
            Self::Method => Some(Value::String(result.request().method.clone())),
            Self::StatusCode => Some(Value::from(result.response().status)),
            Self::Literal(value) => Some(value.clone()),
            Self::Body { side, pointer } => {
                let body = match side {
                    Side::Request => result.request().body.as_ref()?,
                    Side::Response => result.response().body.as_ref()?,
                };
                body.pointer(pointer).cloned()
            }
            Self::Parameter {
                side: Side::Response,
                name,
                ..
            } => find_header(&result.response().headers, name).map(|v| Value::String(v.clone())),
            Self::Parameter {
                side: Side::Request,
                location,
                name,
            } => request_parameter(result, *location, name),
            Self::Template(parts) => {
                let mut out = String::new();
                for part in parts {
                    match part {
                        TemplatePart::Text(text) => out.push_str(text),
                        TemplatePart::Expression(expr) => match expr.evaluate(result)? {
                            Value::String(s) => out.push_str(&s),
                            other => out.push_str(&other.to_string()),
                        },
                    }
                }
                Some(Value::String(out))
            }
        }
    }
}

/// Reads a request parameter from the recorded inputs, falling back to the
/// encoded request for values added by the transport.
fn request_parameter(result: &dyn OperationResult, location: ParameterLocation, name: &str) -> Option<Value> {
    if let Some(value) = result.source().value_at(location, name) {
        return Some(value.clone());
    }
    let request = result.request();
    match location {
        ParameterLocation::Path => None,
        ParameterLocation::Query => {
            let (_, query) = request.url.split_once('?')?;
            query
                .split('&')
                .filter_map(|pair| pair.split_once('=').or(Some((pair, ""))))
                .find(|(key, _)| urlencoding::decode(key).is_ok_and(|k| k == name))
                .and_then(|(_, value)| urlencoding::decode(value).ok())
                .map(|value| Value::String(value.into_owned()))
        }
        ParameterLocation::Header => {
            find_header(&request.headers, name).map(|v| Value::String(v.clone()))
        }
        ParameterLocation::Cookie => {
            let cookies = find_header(&request.headers, crate::constants::HEADER_COOKIE)?;
            cookies
                .split(';')
                .filter_map(|pair| pair.trim().split_once('='))
                .find(|(key, _)| *key == name)
                .map(|(_, value)| Value::String(value.to_string()))
        }
    }
}

/// Resolves link parameter values against one result.
pub struct ExpressionEvaluator<'a> {
    result: &'a dyn OperationResult,
    span: Span,
}

impl<'a> ExpressionEvaluator<'a> {
    #[must_use]
    pub fn new(result: &'a dyn OperationResult, span: Span) -> Self {
        Self { result, span }
    }

    /// Resolves `expression`. Malformed expressions are logged and treated
    /// as not found.
    #[must_use]
    pub fn resolve(&self, expression: &Value) -> Option<Value> {
        let _guard = self.span.enter();
        match RuntimeExpression::parse(expression) {
            Ok(parsed) => {
                let value = parsed.evaluate(self.result);
                if value.is_none() {
                    tracing::debug!(expression = %expression, "runtime expression resolved to nothing");
                }
                value
            }
            Err(err) => {
                tracing::warn!(expression = %expression, error = %err, "ignoring malformed runtime expression");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invocation::{HttpResult, ParameterBinding, RequestData, ResponseData, ResultSource};
    use serde_json::json;
    use std::collections::BTreeMap;

    fn result() -> HttpResult {
        let mut source = ResultSource {
            operation: "create-volume".into(),
            bindings: vec![ParameterBinding {
                external_name: "project".into(),
                wire_name: "project_id".into(),
                location: ParameterLocation::Path,
            }],
            ..ResultSource::default()
        };
        source.parameters.insert("project".into(), json!("p-1"));

        let mut request_headers = BTreeMap::new();
        request_headers.insert("Cookie".to_string(), "session=abc; theme=dark".to_string());
        request_headers.insert("X-Tenant".to_string(), "acme".to_string());
        let mut response_headers = BTreeMap::new();
        response_headers.insert("Location".to_string(), "/volumes/v-9".to_string());

        HttpResult::with_value(
            source,
            RequestData {
                method: "POST".into(),
                url: "https://api.example.com/p-1/volumes?zone=br%2Dne1&dry".into(),
                headers: request_headers,
                body: Some(json!({"name": "data", "spec": {"size": 10}})),
            },
            ResponseData {
                status: 201,
                headers: response_headers,
                body: Some(json!({"id": "v-9", "tags": ["a", "b"]})),
            },
        )
    }

    fn eval(expression: Value) -> Option<Value> {
        RuntimeExpression::parse(&expression).unwrap().evaluate(&result())
    }

    #[test]
    fn evaluates_simple_expressions() {
        assert_eq!(eval(json!("$method")), Some(json!("POST")));
        assert_eq!(eval(json!("$statusCode")), Some(json!(201)));
        assert!(eval(json!("$url")).unwrap().as_str().unwrap().starts_with("https://"));
    }

    #[test]
    fn evaluates_body_pointers() {
        assert_eq!(eval(json!("$response.body#/id")), Some(json!("v-9")));
        assert_eq!(eval(json!("$response.body#/tags/1")), Some(json!("b")));
        assert_eq!(eval(json!("$request.body#/spec/size")), Some(json!(10)));
        assert_eq!(eval(json!("$response.body#/missing")), None);
        assert_eq!(eval(json!("$request.body")), Some(json!({"name": "data", "spec": {"size": 10}})));
    }

    #[test]
    fn evaluates_request_parameters() {
        assert_eq!(eval(json!("$request.path.project_id")), Some(json!("p-1")));
        assert_eq!(eval(json!("$request.query.zone")), Some(json!("br-ne1")));
        assert_eq!(eval(json!("$request.query.dry")), Some(json!("")));
        assert_eq!(eval(json!("$request.header.x-tenant")), Some(json!("acme")));
        assert_eq!(eval(json!("$request.cookie.theme")), Some(json!("dark")));
        assert_eq!(eval(json!("$request.path.nope")), None);
    }

    #[test]
    fn evaluates_response_headers() {
        assert_eq!(eval(json!("$response.header.location")), Some(json!("/volumes/v-9")));
    }

    #[test]
    fn literals_and_templates() {
        assert_eq!(eval(json!(42)), Some(json!(42)));
        assert_eq!(eval(json!("plain text")), Some(json!("plain text")));
        assert_eq!(
            eval(json!("vol-{$response.body#/id}-{$statusCode}")),
            Some(json!("vol-v-9-201"))
        );
        assert_eq!(eval(json!("x-{$response.body#/nope}")), None);
    }

    #[test]
    fn rejects_malformed_expressions() {
        assert!(RuntimeExpression::parse(&json!("$respons.body")).is_err());
        assert!(RuntimeExpression::parse(&json!("$response.query.x")).is_err());

        let result = result();
        let evaluator = ExpressionEvaluator::new(&result, Span::none());
        assert_eq!(evaluator.resolve(&json!("$bogus")), None);
        assert_eq!(evaluator.resolve(&json!("$response.body#/id")), Some(json!("v-9")));
    }
}
