//! Synthesizes the flag set of one command from its descriptor.

use super::{ChildFlag, ExternalFlag, FlagId, FlagKind, FlagSet, SchemaFlag};
use crate::constants;
use crate::error::Error;
use crate::invocation::ExecutorDescriptor;
use crate::schema::Schema;
use crate::utils::normalize_flag_name;
use serde_json::Value;
use tracing::Span;

/// Builds a [`FlagSet`] from an operation's parameter and config schemas.
///
/// Naming rules, applied to every property in order (parameters first,
/// each schema's properties in lexicographic order):
///
/// - a leading `_` marks an internal knob, surfaced under `control.`;
/// - the name is normalized to kebab-case, segment by segment;
/// - while the name is taken, the origin prefix (`param.` or `config.`)
///   is prepended again, so every name ends up unique.
///
/// Object-typed properties also get one child flag per nested property,
/// named `<parent>.<property>` and resolved against the same name table.
#[derive(Debug, Clone)]
pub struct FlagSynthesizer {
    span: Span,
}

impl FlagSynthesizer {
    #[must_use]
    pub const fn new(span: Span) -> Self {
        Self { span }
    }

    /// Builds the flag set, reserving `existing` names first.
    ///
    /// # Errors
    ///
    /// Returns a programming error if a positional argument names a property
    /// the parameters schema does not declare.
    pub fn build(&self, executor: &dyn ExecutorDescriptor, existing: &[&str]) -> Result<FlagSet, Error> {
        self.build_with_extras(executor, existing, Vec::new())
    }

    /// Like [`Self::build`], additionally registering flags the command owns
    /// outside its schemas. Their names are reserved before any schema flag.
    ///
    /// # Errors
    ///
    /// See [`Self::build`].
    pub fn build_with_extras(
        &self,
        executor: &dyn ExecutorDescriptor,
        existing: &[&str],
        extras: Vec<(String, ExternalFlag)>,
    ) -> Result<FlagSet, Error> {
        let _guard = self.span.enter();
        let mut set = FlagSet::new();

        for name in existing {
            set.add_external_flag(name, ExternalFlag::default());
        }
        for (name, flag) in extras {
            set.add_external_flag(&name, flag);
        }

        let hidden = executor.hidden_flags();
        let parameters = executor.parameters_schema();
        for (prop_name, schema) in &parameters.properties {
            let is_hidden = hidden.iter().any(|h| h == prop_name);
            add_property(&mut set, prop_name, schema, parameters.is_required(prop_name), false, is_hidden);
        }

        let mut positionals = Vec::with_capacity(executor.positional_args().len());
        for (i, name) in executor.positional_args().iter().enumerate() {
            let id = set
                .schema_flags()
                .iter()
                .copied()
                .find(|id| {
                    matches!(&set.flag(*id).kind, FlagKind::Schema(f) if !f.is_config && &f.prop_name == name)
                })
                .ok_or_else(|| {
                    Error::programming(format!(
                        "positional argument {i} of '{}' refers to '{name}', which is not a parameter property",
                        executor.name()
                    ))
                })?;
            positionals.push(id);
        }
        set.set_positionals(positionals);

        let configs = executor.configs_schema();
        for (prop_name, schema) in &configs.properties {
            add_property(&mut set, prop_name, schema, configs.is_required(prop_name), true, false);
        }

        tracing::debug!(
            operation = executor.name(),
            schema_flags = set.schema_flags().len(),
            child_flags = set.child_flags().len(),
            positionals = set.positionals().len(),
            "synthesized flags"
        );
        Ok(set)
    }
}

fn add_property(
    set: &mut FlagSet,
    prop_name: &str,
    schema: &Schema,
    required: bool,
    is_config: bool,
    hidden: bool,
) -> FlagId {
    let base = prop_name.strip_prefix(constants::INTERNAL_MARKER_PREFIX).map_or_else(
        || prop_name.to_string(),
        |rest| format!("{}{rest}", constants::CONTROL_NAMESPACE),
    );
    let name = unique_name(set, normalize_flag_name(&base), is_config);
    let id = set.add_schema_flag(
        name,
        SchemaFlag {
            prop_name: prop_name.to_string(),
            schema: schema.clone(),
            required,
            is_config,
        },
        hidden,
    );
    add_children(set, id, schema, is_config, hidden);
    id
}

fn add_children(set: &mut FlagSet, parent: FlagId, schema: &Schema, is_config: bool, hidden: bool) {
    if !schema.is_object() {
        return;
    }
    for (prop_name, child_schema) in &schema.properties {
        let candidate = format!(
            "{}{}{}",
            set.name(parent),
            constants::CHILD_FLAG_SEPARATOR,
            normalize_flag_name(prop_name)
        );
        let name = unique_name(set, candidate, is_config);
        let id = set.add_child_flag(
            name,
            ChildFlag {
                parent,
                prop_name: prop_name.clone(),
                schema: child_schema.clone(),
                required: schema.is_required(prop_name),
                is_config,
            },
            hidden,
        );
        add_children(set, id, child_schema, is_config, hidden);
    }
}

fn unique_name(set: &FlagSet, mut name: String, is_config: bool) -> String {
    let prefix = if is_config {
        constants::CONFIG_CONFLICT_PREFIX
    } else {
        constants::PARAM_CONFLICT_PREFIX
    };
    while set.contains_name(&name) {
        tracing::trace!(flag = %name, prefix, "flag name taken, prefixing");
        name = format!("{prefix}{name}");
    }
    name
}

impl FlagSet {
    /// Usage example line built from the `example` of every schema and
    /// child flag, e.g. `  relay run create-volume --name=data --size=10`.
    ///
    /// When a flag and one of its child flags both render an example, only
    /// the more specific child form is kept. Returns an empty string when no
    /// flag carries an example.
    #[must_use]
    pub fn usage_example(&self, cmd_path: &str) -> String {
        let mut entries: Vec<(String, String)> = self
            .schema_flags()
            .iter()
            .chain(self.child_flags())
            .filter_map(|&id| {
                let example = self.example_value(id)?;
                let name = self.name(id).to_string();
                let rendered = format!("--{name}={}", quote_example(&example));
                Some((rendered, name))
            })
            .collect();
        entries.sort();

        let mut examples: Vec<String> = Vec::with_capacity(entries.len());
        let mut last_name: Option<&str> = None;
        for (rendered, name) in &entries {
            let covered = last_name.is_some_and(|last| {
                last.len() > name.len()
                    && last.starts_with(name.as_str())
                    && last[name.len()..].starts_with(constants::CHILD_FLAG_SEPARATOR)
            });
            if covered {
                continue;
            }
            examples.push(rendered.clone());
            last_name = Some(name);
        }

        if examples.is_empty() {
            String::new()
        } else {
            format!("  {cmd_path} {}", examples.join(" "))
        }
    }

    /// The flag's own example, or its slot in the parent's example object.
    fn example_value(&self, id: FlagId) -> Option<Value> {
        let flag = self.flag(id);
        if let Some(example) = flag.schema().and_then(|s| s.example.clone()) {
            return Some(example);
        }
        match &flag.kind {
            FlagKind::Child(child) => match self.example_value(child.parent)? {
                Value::Object(map) => map.get(&child.prop_name).cloned(),
                _ => None,
            },
            _ => None,
        }
    }
}

fn quote_example(value: &Value) -> String {
    let text = super::value::format_value(value);
    if text.contains(char::is_whitespace) {
        format!("'{text}'")
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invocation::{Configs, Context, OperationResult, Parameters};
    use serde_json::json;

    #[derive(Debug, Default)]
    struct Descriptor {
        parameters: Schema,
        configs: Schema,
        positionals: Vec<String>,
    }

    impl ExecutorDescriptor for Descriptor {
        fn name(&self) -> &str {
            "test-op"
        }

        fn parameters_schema(&self) -> &Schema {
            &self.parameters
        }

        fn configs_schema(&self) -> &Schema {
            &self.configs
        }

        fn positional_args(&self) -> &[String] {
            &self.positionals
        }

        fn execute(&self, _: &Context, _: Parameters, _: Configs) -> Result<Box<dyn OperationResult>, Error> {
            Err(Error::transport("not executable"))
        }
    }

    fn synth() -> FlagSynthesizer {
        FlagSynthesizer::new(Span::none())
    }

    #[test]
    fn conflicting_config_gets_prefixed() {
        let descriptor = Descriptor {
            parameters: Schema::object([("region", Schema::string())], Vec::<&str>::new()),
            configs: Schema::object([("region", Schema::string())], Vec::<&str>::new()),
            ..Descriptor::default()
        };
        let set = synth().build(&descriptor, &[]).unwrap();
        assert!(set.lookup("region").is_some());
        let config = set.lookup("config.region").unwrap();
        assert!(set.flag(config).is_config());
        assert_eq!(set.flag(config).prop_name(), Some("region"));
    }

    #[test]
    fn prefix_repeats_until_unique() {
        let descriptor = Descriptor {
            parameters: Schema::object([("help", Schema::string())], Vec::<&str>::new()),
            ..Descriptor::default()
        };
        let set = synth().build(&descriptor, &["help", "param.help"]).unwrap();
        assert!(set.lookup("param.param.help").is_some());
    }

    #[test]
    fn internal_properties_move_to_control_namespace() {
        let descriptor = Descriptor {
            configs: Schema::object([("_waitTermination", Schema::boolean())], Vec::<&str>::new()),
            ..Descriptor::default()
        };
        let set = synth().build(&descriptor, &[]).unwrap();
        let id = set.lookup("control.wait-termination").unwrap();
        assert_eq!(set.flag(id).prop_name(), Some("_waitTermination"));
    }

    #[test]
    fn object_properties_get_child_flags() {
        let network = Schema::object(
            [("vpcId", Schema::string()), ("subnet", Schema::string())],
            ["vpcId"],
        );
        let descriptor = Descriptor {
            parameters: Schema::object([("network", network)], Vec::<&str>::new()),
            ..Descriptor::default()
        };
        let set = synth().build(&descriptor, &[]).unwrap();
        let vpc = set.lookup("network.vpc-id").unwrap();
        assert!(set.flag(vpc).is_required());
        assert_eq!(set.child_flags().len(), 2);
    }

    #[test]
    fn unknown_positional_is_a_programming_error() {
        let descriptor = Descriptor {
            parameters: Schema::object([("name", Schema::string())], Vec::<&str>::new()),
            positionals: vec!["nope".into()],
            ..Descriptor::default()
        };
        let err = synth().build(&descriptor, &[]).unwrap_err();
        assert_eq!(err.kind(), Some(crate::error::ErrorKind::Programming));
        assert!(err.to_string().contains("'nope'"));
    }

    #[test]
    fn usage_example_prefers_child_form() {
        let network = Schema::object([("vpc", Schema::string())], Vec::<&str>::new())
            .with_example(json!({"vpc": "v-1"}));
        let descriptor = Descriptor {
            parameters: Schema::object(
                [
                    ("network", network),
                    ("name", Schema::string().with_example(json!("my disk"))),
                    ("size", Schema::integer()),
                ],
                Vec::<&str>::new(),
            ),
            ..Descriptor::default()
        };
        let set = synth().build(&descriptor, &[]).unwrap();
        assert_eq!(
            set.usage_example("relay run test-op"),
            "  relay run test-op --name='my disk' --network.vpc=v-1"
        );
    }

    #[test]
    fn usage_example_is_empty_without_examples() {
        let descriptor = Descriptor {
            parameters: Schema::object([("size", Schema::integer())], Vec::<&str>::new()),
            ..Descriptor::default()
        };
        let set = synth().build(&descriptor, &[]).unwrap();
        assert_eq!(set.usage_example("relay"), "");
    }
}
