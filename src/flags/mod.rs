//! Schema-derived command-line flags.
//!
//! Every flag of one command lives in a [`FlagSet`] arena and is addressed
//! by [`FlagId`]. Flags come in three variants sharing one interface
//! (name, value, set, parse):
//!
//! - [`SchemaFlag`]: one top-level property of the parameters or configs schema;
//! - [`ChildFlag`]: one nested property of an object-typed flag. It owns no
//!   value: setting it merges a single key into its parent's aggregate value,
//!   reading it projects that key back out;
//! - [`ExternalFlag`]: a flag that exists independently of any schema.
//!
//! Child flags refer to their parent by id, so the parent/child tree never
//! holds references into itself.

pub mod completion;
pub mod positional;
pub mod resolve;
pub mod synth;
pub mod value;

use crate::constants;
use crate::error::{Error, UsageError, UsageIssue};
use crate::schema::Schema;
use crate::utils::short_description;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

pub use completion::{Completion, CompletionProvider, ShellDirective};
pub use positional::ExpandSlot;
pub use resolve::ValueResolver;
pub use synth::FlagSynthesizer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FlagId(usize);

#[derive(Debug, Clone)]
pub struct SchemaFlag {
    /// Property name in the owning schema; the key of the resolved value.
    pub prop_name: String,
    pub schema: Schema,
    pub required: bool,
    pub is_config: bool,
}

#[derive(Debug, Clone)]
pub struct ChildFlag {
    pub parent: FlagId,
    /// Property name inside the parent's object value.
    pub prop_name: String,
    pub schema: Schema,
    /// Required within the parent object.
    pub required: bool,
    pub is_config: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ExternalFlag {
    pub usage: String,
    pub default: Option<String>,
    /// Owned flags are added to the generated command; the others only
    /// reserve their name.
    pub owned: bool,
    /// Repeated values accumulate into an array instead of replacing.
    pub repeatable: bool,
}

impl ExternalFlag {
    /// A flag this command adds to its own surface.
    #[must_use]
    pub fn owned(usage: impl Into<String>) -> Self {
        Self {
            usage: usage.into(),
            owned: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn repeatable(mut self) -> Self {
        self.repeatable = true;
        self
    }
}

#[derive(Debug, Clone)]
pub enum FlagKind {
    Schema(SchemaFlag),
    Child(ChildFlag),
    External(ExternalFlag),
}

#[derive(Debug, Clone)]
pub struct Flag {
    pub name: String,
    pub kind: FlagKind,
    pub hidden: bool,
    value: Option<Value>,
    changed: bool,
    help_requested: bool,
}

impl Flag {
    fn new(name: String, kind: FlagKind, hidden: bool) -> Self {
        Self {
            name,
            kind,
            hidden,
            value: None,
            changed: false,
            help_requested: false,
        }
    }

    #[must_use]
    pub fn schema(&self) -> Option<&Schema> {
        match &self.kind {
            FlagKind::Schema(flag) => Some(&flag.schema),
            FlagKind::Child(flag) => Some(&flag.schema),
            FlagKind::External(_) => None,
        }
    }

    #[must_use]
    pub const fn is_config(&self) -> bool {
        match &self.kind {
            FlagKind::Schema(flag) => flag.is_config,
            FlagKind::Child(flag) => flag.is_config,
            FlagKind::External(_) => false,
        }
    }

    #[must_use]
    pub fn prop_name(&self) -> Option<&str> {
        match &self.kind {
            FlagKind::Schema(flag) => Some(&flag.prop_name),
            FlagKind::Child(flag) => Some(&flag.prop_name),
            FlagKind::External(_) => None,
        }
    }

    #[must_use]
    pub const fn is_required(&self) -> bool {
        match &self.kind {
            FlagKind::Schema(flag) => flag.required,
            FlagKind::Child(flag) => flag.required,
            FlagKind::External(_) => false,
        }
    }

    #[must_use]
    pub const fn is_changed(&self) -> bool {
        self.changed
    }

    #[must_use]
    pub const fn help_requested(&self) -> bool {
        self.help_requested
    }

    /// Whether the generated command reads a value after this flag. Flags
    /// that only reserve a name are not part of the command.
    #[must_use]
    pub const fn takes_value(&self) -> bool {
        match &self.kind {
            FlagKind::Schema(_) | FlagKind::Child(_) => true,
            FlagKind::External(external) => external.owned,
        }
    }

    /// Type tag used for help and completion.
    #[must_use]
    pub fn type_tag(&self) -> &str {
        let Some(schema) = self.schema() else {
            return constants::SCHEMA_TYPE_STRING;
        };
        if !schema.enum_values.is_empty() {
            return constants::FLAG_TYPE_ENUM;
        }
        match schema.format.as_deref() {
            Some(constants::SCHEMA_FORMAT_FILE) => return constants::FLAG_TYPE_FILE,
            Some(constants::SCHEMA_FORMAT_DIRECTORY) => return constants::FLAG_TYPE_DIRECTORY,
            _ => {}
        }
        schema.schema_type.primary().unwrap_or(constants::FLAG_TYPE_ANY)
    }

    /// The schema default, rendered the way a user would type it.
    #[must_use]
    pub fn default_text(&self) -> Option<String> {
        match &self.kind {
            FlagKind::External(flag) => flag.default.clone(),
            _ => self.schema()?.default.as_ref().map(value::format_value),
        }
    }
}

/// All flags of one command.
#[derive(Debug, Clone, Default)]
pub struct FlagSet {
    flags: Vec<Flag>,
    known: BTreeMap<String, FlagId>,
    schema_flags: Vec<FlagId>,
    child_flags: Vec<FlagId>,
    extra_flags: Vec<FlagId>,
    positionals: Vec<FlagId>,
}

impl FlagSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn flag(&self, id: FlagId) -> &Flag {
        &self.flags[id.0]
    }

    /// Clears the hidden mark of every flag, for help and completion.
    pub fn reveal_hidden(&mut self) {
        for flag in &mut self.flags {
            flag.hidden = false;
        }
    }

    #[must_use]
    pub fn name(&self, id: FlagId) -> &str {
        &self.flags[id.0].name
    }

    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<FlagId> {
        self.known.get(name).copied()
    }

    #[must_use]
    pub fn contains_name(&self, name: &str) -> bool {
        self.known.contains_key(name)
    }

    /// Every known flag, including reserved names, ordered by name.
    pub fn known(&self) -> impl Iterator<Item = (&str, FlagId)> {
        self.known.iter().map(|(name, id)| (name.as_str(), *id))
    }

    #[must_use]
    pub fn schema_flags(&self) -> &[FlagId] {
        &self.schema_flags
    }

    #[must_use]
    pub fn child_flags(&self) -> &[FlagId] {
        &self.child_flags
    }

    /// External flags owned by this command.
    #[must_use]
    pub fn extra_flags(&self) -> &[FlagId] {
        &self.extra_flags
    }

    #[must_use]
    pub fn positionals(&self) -> &[FlagId] {
        &self.positionals
    }

    /// Flags the generated command must accept: schema, child and owned
    /// external flags.
    pub fn command_flags(&self) -> impl Iterator<Item = FlagId> + '_ {
        self.schema_flags
            .iter()
            .chain(&self.child_flags)
            .chain(&self.extra_flags)
            .copied()
    }

    fn push(&mut self, flag: Flag) -> FlagId {
        let id = FlagId(self.flags.len());
        self.known.insert(flag.name.clone(), id);
        self.flags.push(flag);
        id
    }

    pub(crate) fn add_schema_flag(&mut self, name: String, flag: SchemaFlag, hidden: bool) -> FlagId {
        let id = self.push(Flag::new(name, FlagKind::Schema(flag), hidden));
        self.schema_flags.push(id);
        id
    }

    pub(crate) fn add_child_flag(&mut self, name: String, flag: ChildFlag, hidden: bool) -> FlagId {
        let id = self.push(Flag::new(name, FlagKind::Child(flag), hidden));
        self.child_flags.push(id);
        id
    }

    /// Registers a flag that exists outside the schemas. Its name takes part
    /// in conflict resolution like any other.
    pub fn add_external_flag(&mut self, name: &str, flag: ExternalFlag) -> FlagId {
        let owned = flag.owned;
        let id = self.push(Flag::new(name.to_string(), FlagKind::External(flag), false));
        if owned {
            self.extra_flags.push(id);
        }
        id
    }

    pub(crate) fn set_positionals(&mut self, positionals: Vec<FlagId>) {
        self.positionals = positionals;
    }

    /// The explicitly set value. Child flags project their parent's value.
    #[must_use]
    pub fn value(&self, id: FlagId) -> Option<Value> {
        let flag = &self.flags[id.0];
        match &flag.kind {
            FlagKind::Child(child) => match self.value(child.parent)? {
                Value::Object(map) => map.get(&child.prop_name).cloned(),
                _ => None,
            },
            _ => flag.value.clone(),
        }
    }

    /// True when the flag holds neither an explicit value nor a change marker.
    #[must_use]
    pub fn is_unset(&self, id: FlagId) -> bool {
        !self.flags[id.0].changed && self.value(id).is_none()
    }

    /// Parses `raw` according to the flag's schema and stores it.
    ///
    /// The help sentinel only marks the flag; file sentinels are loaded here.
    ///
    /// # Errors
    ///
    /// Returns a usage error naming the flag if the value cannot be decoded.
    pub fn set(&mut self, id: FlagId, raw: &str) -> Result<(), Error> {
        if raw == constants::VALUE_HELP_IS_REQUIRED {
            let flag = &mut self.flags[id.0];
            flag.help_requested = true;
            flag.changed = true;
            return Ok(());
        }

        let invalid = |flag: &str, reason: String| {
            Error::Usage(UsageError::single(UsageIssue::InvalidValue {
                flag: flag.to_string(),
                reason,
            }))
        };

        let flag = &mut self.flags[id.0];
        match &flag.kind {
            FlagKind::Schema(schema_flag) => {
                let decoded = value::decode(&schema_flag.schema, flag.value.clone(), raw)
                    .map_err(|reason| invalid(&flag.name, reason))?;
                flag.value = Some(decoded);
                flag.changed = true;
                Ok(())
            }
            FlagKind::External(external) => {
                let raw = Value::String(raw.to_string());
                let value = match (external.repeatable, flag.value.take()) {
                    (true, Some(Value::Array(mut items))) => {
                        items.push(raw);
                        Value::Array(items)
                    }
                    (true, _) => Value::Array(vec![raw]),
                    (false, _) => raw,
                };
                flag.value = Some(value);
                flag.changed = true;
                Ok(())
            }
            FlagKind::Child(child) => {
                let (parent, prop_name, schema) = (child.parent, child.prop_name.clone(), child.schema.clone());
                let decoded = value::decode(&schema, self.value(id), raw)
                    .map_err(|reason| invalid(&self.flags[id.0].name, reason))?;
                self.merge_into(parent, prop_name, decoded);
                self.flags[id.0].changed = true;
                Ok(())
            }
        }
    }

    /// Applies a single-key merge update to an object flag.
    fn merge_into(&mut self, id: FlagId, key: String, item: Value) {
        let mut object = match self.value(id) {
            Some(Value::Object(map)) => map,
            _ => Map::new(),
        };
        object.insert(key, item);

        let next = match &self.flags[id.0].kind {
            FlagKind::Child(child) => Some((child.parent, child.prop_name.clone())),
            _ => None,
        };
        self.flags[id.0].changed = true;
        match next {
            Some((parent, prop_name)) => self.merge_into(parent, prop_name, Value::Object(object)),
            None => self.flags[id.0].value = Some(Value::Object(object)),
        }
    }

    /// One-line usage for `--help` listings.
    #[must_use]
    pub fn usage(&self, id: FlagId) -> String {
        let flag = &self.flags[id.0];
        match &flag.kind {
            FlagKind::External(external) => external.usage.clone(),
            FlagKind::Schema(schema_flag) => {
                let mut usage = schema_usage(&schema_flag.schema);
                if schema_flag.required {
                    usage.push_str(" (required)");
                }
                usage
            }
            FlagKind::Child(child) => {
                let parent = &self.flags[child.parent.0];
                let parent_short = parent
                    .schema()
                    .and_then(Schema::summary)
                    .map(short_description)
                    .filter(|s| !s.is_empty())
                    .unwrap_or_else(|| format!("{}'s {} property", parent.name, child.prop_name));
                format!(
                    "{parent_short}: {}\nThis is the same as '--{}={}=<{}>'.",
                    schema_usage(&child.schema),
                    parent.name,
                    child.prop_name,
                    flag.type_tag(),
                )
            }
        }
    }

    /// Full help shown when a flag is given the help sentinel.
    #[must_use]
    pub fn help(&self, id: FlagId) -> String {
        let flag = &self.flags[id.0];
        let mut lines = vec![format!("--{} <{}>", flag.name, flag.type_tag())];
        for line in self.usage(id).lines().filter(|l| !l.is_empty()) {
            lines.push(format!("  {line}"));
        }
        if let Some(schema) = flag.schema() {
            if !schema.enum_values.is_empty() {
                let values = schema
                    .enum_values
                    .iter()
                    .map(value::format_value)
                    .collect::<Vec<_>>()
                    .join(", ");
                lines.push(format!("  Accepted values: {values}"));
            }
            let children: Vec<_> = self
                .child_flags
                .iter()
                .filter(|child| matches!(&self.flags[child.0].kind, FlagKind::Child(c) if c.parent == id))
                .map(|child| format!("--{} <{}>", self.flags[child.0].name, self.flags[child.0].type_tag()))
                .collect();
            if !children.is_empty() {
                lines.push(format!("  Properties: {}", children.join(", ")));
            }
        }
        if let Some(default) = flag.default_text() {
            lines.push(format!("  Default: {default}"));
        }
        lines.push(format!(
            "  Values starting with '{}' are read from a JSON file, '{}' from a plain file.",
            constants::VALUE_LOAD_JSON_FROM_FILE_PREFIX,
            constants::VALUE_LOAD_VERBATIM_FROM_FILE_PREFIX
        ));
        lines.join("\n")
    }
}

fn schema_usage(schema: &Schema) -> String {
    schema.summary().unwrap_or_default().trim().to_string()
}
