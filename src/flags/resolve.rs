//! Turns a populated [`FlagSet`] into parameter and config values.

use super::{FlagId, FlagSet};
use crate::config::ValueSource;
use crate::error::{Error, UsageError, UsageIssue};
use crate::invocation::{Configs, Parameters};
use serde_json::Value;
use tracing::Span;

/// Resolves every schema flag's effective value.
///
/// Each value comes from the first layer that has one: explicit command-line
/// input, then the [`ValueSource`] (config flags only), then the schema
/// default. Problems across all flags are collected into a single
/// [`UsageError`].
pub struct ValueResolver<'a> {
    source: &'a dyn ValueSource,
    span: Span,
}

impl<'a> ValueResolver<'a> {
    #[must_use]
    pub fn new(source: &'a dyn ValueSource, span: Span) -> Self {
        Self { source, span }
    }

    /// # Errors
    ///
    /// Returns [`Error::HelpRequested`] if any flag was given the help
    /// sentinel, otherwise a usage error listing every missing required flag
    /// and every invalid value.
    pub fn resolve(&self, flags: &FlagSet) -> Result<(Parameters, Configs), Error> {
        let _guard = self.span.enter();

        if let Some(id) = flags
            .schema_flags()
            .iter()
            .chain(flags.child_flags())
            .copied()
            .find(|id| flags.flag(*id).help_requested())
        {
            return Err(Error::HelpRequested {
                flag: flags.name(id).to_string(),
                help: flags.help(id),
            });
        }

        let mut parameters = Parameters::new();
        let mut configs = Configs::new();
        let mut missing = Vec::new();
        let mut issues = Vec::new();

        for &id in flags.schema_flags() {
            let flag = flags.flag(id);
            let (Some(schema), Some(prop_name)) = (flag.schema(), flag.prop_name()) else {
                continue;
            };

            let Some(value) = self.effective_value(flags, id) else {
                if flag.is_required() {
                    missing.push(flag.name.clone());
                }
                continue;
            };

            if let Err(problems) = schema.validate(&value) {
                issues.push(UsageIssue::InvalidValue {
                    flag: flag.name.clone(),
                    reason: problems.join("; "),
                });
                continue;
            }

            let target = if flag.is_config() {
                &mut configs
            } else {
                &mut parameters
            };
            target.insert(prop_name.to_string(), value);
        }

        if !missing.is_empty() {
            issues.push(UsageIssue::MissingRequired(missing));
        }
        if !issues.is_empty() {
            tracing::debug!(issues = issues.len(), "flag resolution failed");
            return Err(Error::Usage(UsageError::new(issues)));
        }

        tracing::debug!(
            parameters = parameters.len(),
            configs = configs.len(),
            "resolved flag values"
        );
        Ok((parameters, configs))
    }

    fn effective_value(&self, flags: &FlagSet, id: FlagId) -> Option<Value> {
        let flag = flags.flag(id);
        if flag.is_changed() {
            if let Some(value) = flags.value(id) {
                return Some(value);
            }
        }
        if flag.is_config() {
            if let Some(value) = flag.prop_name().and_then(|name| self.source.lookup(name)) {
                return Some(value);
            }
        }
        flag.schema().and_then(|schema| schema.default.clone())
    }
}
