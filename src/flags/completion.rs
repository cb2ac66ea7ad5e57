//! Shell completion for flag values and positional arguments.

use super::{FlagId, FlagSet};
use crate::constants;
use std::ops::{BitOr, BitOrAssign};
use tracing::Span;

/// Bit set telling the shell what to do besides offering candidates.
///
/// Values match the completion protocol shared by cobra-style shell scripts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ShellDirective(u8);

impl ShellDirective {
    /// Let the shell fall back to file completion.
    pub const DEFAULT: Self = Self(0);
    pub const NO_FILE_COMP: Self = Self(4);
    pub const FILTER_DIRS: Self = Self(16);

    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for ShellDirective {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for ShellDirective {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Completion {
    pub candidates: Vec<String>,
    /// Hints shown to the user without being inserted.
    pub active_help: Vec<String>,
    pub directive: ShellDirective,
}

impl Completion {
    /// Renders the completion protocol: one candidate per line, active help
    /// lines marked, and the directive last as `:<bits>`.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        for candidate in &self.candidates {
            out.push_str(candidate);
            out.push('\n');
        }
        for help in &self.active_help {
            out.push_str(constants::ACTIVE_HELP_MARKER);
            out.push_str(help);
            out.push('\n');
        }
        out.push(':');
        out.push_str(&self.directive.bits().to_string());
        out.push('\n');
        out
    }
}

pub struct CompletionProvider<'a> {
    flags: &'a FlagSet,
    span: Span,
}

impl<'a> CompletionProvider<'a> {
    #[must_use]
    pub const fn new(flags: &'a FlagSet, span: Span) -> Self {
        Self { flags, span }
    }

    /// Candidate values for one flag.
    ///
    /// Enum flags offer the prefix matches, or failing that the substring
    /// matches, or failing that every value. File and directory flags defer to the shell.
    /// Any other flag offers its default value.
    #[must_use]
    pub fn complete_flag(&self, id: FlagId, to_complete: &str) -> Completion {
        let mut completion = Completion::default();
        completion.directive = self.complete_flag_values(id, to_complete, &mut completion.candidates);
        completion
    }

    fn complete_flag_values(&self, id: FlagId, to_complete: &str, candidates: &mut Vec<String>) -> ShellDirective {
        let flag = self.flags.flag(id);
        match flag.type_tag() {
            constants::FLAG_TYPE_FILE => ShellDirective::DEFAULT,
            constants::FLAG_TYPE_DIRECTORY => ShellDirective::FILTER_DIRS,
            constants::FLAG_TYPE_ENUM => {
                let values = flag
                    .schema()
                    .map(|s| s.enum_values.iter().map(super::value::format_value).collect::<Vec<_>>())
                    .unwrap_or_default();
                candidates.extend(select_enum_values(values, to_complete));
                ShellDirective::NO_FILE_COMP
            }
            _ => {
                if let Some(default) = flag.default_text().filter(|d| !d.is_empty()) {
                    candidates.push(default);
                }
                if to_complete.starts_with(constants::VALUE_LOAD_JSON_FROM_FILE_PREFIX)
                    || to_complete.starts_with(constants::VALUE_LOAD_VERBATIM_FROM_FILE_PREFIX)
                {
                    ShellDirective::DEFAULT
                } else {
                    ShellDirective::NO_FILE_COMP
                }
            }
        }
    }

    /// Completion for the next positional argument, given the positional
    /// arguments already typed.
    #[must_use]
    pub fn complete_args(&self, args: &[String], to_complete: &str) -> Completion {
        let _guard = self.span.enter();
        let positionals = self.flags.positionals();
        let mut completion = Completion {
            directive: ShellDirective::NO_FILE_COMP,
            ..Completion::default()
        };

        if positionals.is_empty() {
            completion
                .active_help
                .push("This command does not take any arguments".to_string());
            return completion;
        }

        match self.flags.expand_slot().index() {
            Some(k) if args.len() >= k => {
                completion.active_help.push(format!(
                    "The following arguments are accepted: multiple {}",
                    self.active_help_for(positionals[k])
                ));
                completion.directive =
                    self.complete_flag_values(positionals[k], to_complete, &mut completion.candidates);
                for id in &positionals[k + 1..] {
                    let line = format!(" or {}", self.active_help_for(*id));
                    completion.active_help[0].push_str(&line);
                    completion.directive |= self.complete_flag_values(*id, to_complete, &mut completion.candidates);
                }
            }
            _ => {
                let Some(id) = positionals.get(args.len()) else {
                    completion
                        .active_help
                        .push("This command does not take any more arguments".to_string());
                    return completion;
                };
                completion.active_help.push(self.active_help_for(*id));
                completion.directive = self.complete_flag_values(*id, to_complete, &mut completion.candidates);
            }
        }

        tracing::trace!(
            candidates = completion.candidates.len(),
            directive = completion.directive.bits(),
            "completed positional argument"
        );
        completion
    }

    /// Completes a whole command line: `words` are the arguments already
    /// typed after the command name, `to_complete` is the partial last word.
    #[must_use]
    pub fn complete_command_line(&self, words: &[String], to_complete: &str) -> Completion {
        let mut positionals: Vec<String> = Vec::new();
        let mut pending_flag: Option<FlagId> = None;

        for word in words {
            if pending_flag.take().is_some() {
                continue;
            }
            if let Some(flag) = word.strip_prefix("--") {
                if !flag.contains('=') {
                    pending_flag = self.flags.lookup(flag).filter(|id| self.flags.flag(*id).takes_value());
                }
                continue;
            }
            positionals.push(word.clone());
        }

        if let Some(id) = pending_flag {
            if self.flags.flag(id).schema().is_some() {
                return self.complete_flag(id, to_complete);
            }
            return Completion {
                directive: ShellDirective::NO_FILE_COMP,
                ..Completion::default()
            };
        }

        if let Some(flag) = to_complete.strip_prefix("--") {
            if let Some((name, partial)) = flag.split_once('=') {
                let Some(id) = self.flags.lookup(name) else {
                    return Completion {
                        directive: ShellDirective::NO_FILE_COMP,
                        ..Completion::default()
                    };
                };
                let mut completion = self.complete_flag(id, partial);
                completion.candidates = completion
                    .candidates
                    .into_iter()
                    .map(|candidate| format!("--{name}={candidate}"))
                    .collect();
                return completion;
            }
            return self.complete_flag_names(flag);
        }

        self.complete_args(&positionals, to_complete)
    }

    fn complete_flag_names(&self, prefix: &str) -> Completion {
        let candidates = self
            .flags
            .command_flags()
            .filter(|id| !self.flags.flag(*id).hidden)
            .map(|id| self.flags.name(id))
            .filter(|name| name.starts_with(prefix))
            .map(|name| format!("--{name}"))
            .collect::<std::collections::BTreeSet<_>>()
            .into_iter()
            .collect();
        Completion {
            candidates,
            active_help: Vec::new(),
            directive: ShellDirective::NO_FILE_COMP,
        }
    }

    fn active_help_for(&self, id: FlagId) -> String {
        let flag = self.flags.flag(id);
        let description = flag
            .schema()
            .and_then(crate::schema::Schema::summary)
            .unwrap_or_default();
        if description.is_empty() {
            flag.name.clone()
        } else {
            format!("{} ({description})", flag.name)
        }
    }
}

/// Keeps the first non-empty group of enum values: prefix matches, else
/// substring matches, else every value.
fn select_enum_values(values: Vec<String>, to_complete: &str) -> Vec<String> {
    let (prefixed, rest): (Vec<_>, Vec<_>) = values.into_iter().partition(|v| v.starts_with(to_complete));
    if !prefixed.is_empty() {
        return prefixed;
    }
    let (contained, others): (Vec<_>, Vec<_>) = rest.into_iter().partition(|v| v.contains(to_complete));
    if contained.is_empty() {
        others
    } else {
        contained
    }
}
