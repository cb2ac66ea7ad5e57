use super::expression::ExpressionEvaluator;
use super::pointer::JsonPointer;
use super::{Link, OperationRegistry};
use crate::error::Error;
use crate::invocation::{Configs, ExecutorDescriptor, OperationResult, ParameterLocation, Parameters};
use crate::schema::Schema;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::Span;

/// Summary of a link for listings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkDescription {
    pub name: String,
    pub target: Option<String>,
    pub description: String,
    pub parameters: BTreeMap<String, Value>,
    /// Parameters the caller may still supply.
    pub additional_parameters: Schema,
}

/// Derives the input of a link's target operation from a previous result.
pub struct LinkResolver<'a> {
    registry: &'a dyn OperationRegistry,
    span: Span,
}

impl<'a> LinkResolver<'a> {
    #[must_use]
    pub fn new(registry: &'a dyn OperationRegistry, span: Span) -> Self {
        Self { registry, span }
    }

    /// # Errors
    ///
    /// Returns a link-resolution error if the target cannot be found.
    pub fn target(&self, link: &Link) -> Result<Arc<dyn ExecutorDescriptor>, Error> {
        link.target(self.registry)
            .ok_or_else(|| Error::link_missing_target(&link.name))
    }

    /// The target's parameters that the link does not already provide, as a
    /// closed object schema. Computed once per link.
    ///
    /// # Errors
    ///
    /// Returns a link-resolution error if the target cannot be found.
    pub fn additional_parameters_schema(&self, link: &Link) -> Result<Schema, Error> {
        let target = self.target(link)?;
        Ok(link
            .cached_additional_parameters(|| compute_additional_parameters(link, target.as_ref()))
            .clone())
    }

    /// Builds the target's parameters and configs.
    ///
    /// Link parameters are routed by the target's parameter locations
    /// (parameter locations first, then config locations). Request-body
    /// mappings are written through JSON pointers. `additional` values never
    /// overwrite link-derived ones. Configs the link left unset are copied
    /// from the source call.
    ///
    /// # Errors
    ///
    /// Returns a link-resolution error if the target is unreachable,
    /// `additional` does not match [`Self::additional_parameters_schema`], or
    /// a body pointer with a resolved value is malformed or cannot be
    /// applied.
    pub fn prepare(
        &self,
        source: &dyn OperationResult,
        link: &Link,
        additional: &Parameters,
    ) -> Result<(Parameters, Configs), Error> {
        let _guard = self.span.enter();
        let target = self.target(link)?;

        let schema = self.additional_parameters_schema(link)?;
        if let Err(problems) = schema.validate(&Value::Object(additional.clone())) {
            return Err(Error::invalid_additional_parameters(&link.name, &problems));
        }

        let evaluator = ExpressionEvaluator::new(source, self.span.clone());
        let mut parameters = Parameters::new();
        let mut configs = Configs::new();

        for (key, expression) in &link.parameters {
            let Some(value) = evaluator.resolve(expression) else {
                tracing::debug!(link = %link.name, parameter = %key, "link parameter not resolved, skipping");
                continue;
            };
            insert_parameter(target.as_ref(), key, value, &mut parameters, &mut configs);
        }

        let body_parameters = link.request_body_parameters(target.extension_prefix());
        if !body_parameters.is_empty() {
            let mut body = Value::Object(std::mem::take(&mut parameters));
            for (raw_pointer, expression) in &body_parameters {
                let Some(value) = evaluator.resolve(&Value::String(expression.clone())) else {
                    tracing::debug!(link = %link.name, pointer = %raw_pointer, "body parameter not resolved, skipping");
                    continue;
                };
                JsonPointer::parse(raw_pointer)?.set(&mut body, value)?;
            }
            if let Value::Object(map) = body {
                parameters = map;
            }
        }

        for (key, value) in additional {
            parameters.entry(key.clone()).or_insert_with(|| value.clone());
        }

        for name in target.configs_schema().properties.keys() {
            if configs.contains_key(name) {
                continue;
            }
            if let Some(value) = source.source().configs.get(name) {
                configs.insert(name.clone(), value.clone());
            }
        }

        tracing::debug!(
            link = %link.name,
            target = target.name(),
            parameters = parameters.len(),
            configs = configs.len(),
            "prepared link call"
        );
        Ok((parameters, configs))
    }

    #[must_use]
    pub fn describe(&self, link: &Link) -> LinkDescription {
        let target = link.target(self.registry);
        let additional_parameters = self
            .additional_parameters_schema(link)
            .unwrap_or_else(|_| Schema::empty_object());
        LinkDescription {
            name: link.display_name(self.registry).to_string(),
            target: target.map(|t| t.name().to_string()),
            description: link.description.clone().unwrap_or_default(),
            parameters: link.parameters.clone(),
            additional_parameters,
        }
    }
}

fn compute_additional_parameters(link: &Link, target: &dyn ExecutorDescriptor) -> Schema {
    let parameters = target.parameters_schema();
    let bindings = target.parameter_bindings();
    let satisfied = |prop: &str| {
        link.parameters.keys().any(|key| {
            key == prop
                || bindings
                    .iter()
                    .any(|b| b.external_name == prop && b.matches(key))
        })
    };

    let properties: Vec<(String, Schema)> = parameters
        .properties
        .iter()
        .filter(|(name, _)| !satisfied(name))
        .map(|(name, schema)| (name.clone(), schema.clone()))
        .collect();
    let required: Vec<String> = parameters
        .required
        .iter()
        .filter(|name| properties.iter().any(|(prop, _)| prop == *name))
        .cloned()
        .collect();
    Schema::object(properties, required)
}

fn insert_parameter(
    target: &dyn ExecutorDescriptor,
    key: &str,
    value: Value,
    parameters: &mut Parameters,
    configs: &mut Configs,
) {
    let bindings = target.parameter_bindings();
    for (locations, values) in [
        (&ParameterLocation::PARAMETERS, &mut *parameters),
        (&ParameterLocation::CONFIGS, &mut *configs),
    ] {
        if let Some(binding) = bindings
            .iter()
            .find(|b| locations.contains(&b.location) && b.matches(key))
        {
            values.insert(binding.external_name.clone(), value);
            return;
        }
    }

    if target.parameters_schema().properties.contains_key(key) {
        parameters.insert(key.to_string(), value);
    } else if target.configs_schema().properties.contains_key(key) {
        configs.insert(key.to_string(), value);
    } else {
        tracing::warn!(parameter = %key, target = target.name(), "link parameter matches nothing on the target, dropping");
    }
}
