//! Binding of positional command-line arguments to positional flags.

use super::{FlagId, FlagSet};
use crate::constants;
use crate::error::{Error, UsageError, UsageIssue};

/// Which positional, if any, soaks up a variable number of arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpandSlot {
    None,
    At(usize),
    /// More than one array-typed positional; expansion is disabled.
    Ambiguous,
}

impl ExpandSlot {
    #[must_use]
    pub const fn index(self) -> Option<usize> {
        match self {
            Self::At(i) => Some(i),
            Self::None | Self::Ambiguous => None,
        }
    }
}

impl FlagSet {
    /// Finds the single array-typed positional.
    #[must_use]
    pub fn expand_slot(&self) -> ExpandSlot {
        let mut slot = ExpandSlot::None;
        for (i, id) in self.positionals().iter().enumerate() {
            if self.flag(*id).schema().is_some_and(crate::schema::Schema::is_array) {
                if slot != ExpandSlot::None {
                    return ExpandSlot::Ambiguous;
                }
                slot = ExpandSlot::At(i);
            }
        }
        slot
    }

    /// Display names of the positionals; the expand slot gets a `...` suffix.
    #[must_use]
    pub fn positional_names(&self) -> Vec<String> {
        let expand = self.expand_slot().index();
        self.positionals()
            .iter()
            .enumerate()
            .map(|(i, id)| {
                let name = self.name(*id);
                if Some(i) == expand {
                    format!("{name}{}", constants::EXPAND_SLOT_SUFFIX)
                } else {
                    name.to_string()
                }
            })
            .collect()
    }

    /// Assigns positional arguments to positional flags.
    ///
    /// Without an expand slot, arguments fill the positionals still unset,
    /// left to right. With an expand slot at `k`, the first `k` arguments go
    /// to the leading positionals, the trailing fixed positionals take the
    /// last arguments, and everything in between is appended to the array.
    /// The trailing group and the array are only filled once enough
    /// arguments are present for both.
    ///
    /// # Errors
    ///
    /// Returns a usage error if there are too many arguments or if an
    /// argument cannot be decoded for its flag.
    pub fn bind_positionals(&mut self, args: &[String]) -> Result<(), Error> {
        let positionals = self.positionals().to_vec();
        match self.expand_slot().index() {
            Some(k) => self.bind_with_expansion(&positionals, k, args),
            None => self.bind_fixed(&positionals, args),
        }
    }

    fn bind_fixed(&mut self, positionals: &[FlagId], args: &[String]) -> Result<(), Error> {
        if args.is_empty() {
            return Ok(());
        }
        if positionals.is_empty() {
            return Err(positional_error(format!(
                "this command does not accept positional arguments, {} given: {}",
                args.len(),
                args.join(" ")
            )));
        }
        if args.len() > positionals.len() {
            return Err(positional_error(format!(
                "this command receives at most {} positional arguments, {} given",
                positionals.len(),
                args.len()
            )));
        }

        let unset: Vec<FlagId> = positionals.iter().copied().filter(|id| self.is_unset(*id)).collect();
        if args.len() > unset.len() {
            return Err(positional_error(format!(
                "this command has one or more invalid positional arguments, given: {}",
                args.join(" ")
            )));
        }

        let mut issues = Vec::new();
        for (id, arg) in unset.into_iter().zip(args) {
            self.collect_set(id, arg, &mut issues);
        }
        finish(issues)
    }

    fn bind_with_expansion(&mut self, positionals: &[FlagId], k: usize, args: &[String]) -> Result<(), Error> {
        let mut issues = Vec::new();

        let pre = k.min(args.len());
        for (id, arg) in positionals[..pre].iter().zip(&args[..pre]) {
            self.set_if_unset(*id, arg, &mut issues);
        }

        let post_count = positionals.len() - k - 1;
        if let Some(post_start) = args.len().checked_sub(post_count).filter(|start| *start >= k) {
            for (id, arg) in positionals[k + 1..].iter().zip(&args[post_start..]) {
                self.set_if_unset(*id, arg, &mut issues);
            }
            for arg in &args[k..post_start] {
                self.collect_set(positionals[k], arg, &mut issues);
            }
        }

        finish(issues)
    }

    fn set_if_unset(&mut self, id: FlagId, arg: &str, issues: &mut Vec<UsageIssue>) {
        if self.is_unset(id) {
            self.collect_set(id, arg, issues);
        } else {
            tracing::debug!(flag = self.name(id), "positional already set by flag, skipping argument");
        }
    }

    fn collect_set(&mut self, id: FlagId, arg: &str, issues: &mut Vec<UsageIssue>) {
        match self.set(id, arg) {
            Ok(()) => {}
            Err(Error::Usage(usage)) => issues.extend(usage.issues),
            Err(other) => issues.push(UsageIssue::InvalidValue {
                flag: self.name(id).to_string(),
                reason: other.to_string(),
            }),
        }
    }
}

fn positional_error(message: String) -> Error {
    Error::Usage(UsageError::single(UsageIssue::Positional(message)))
}

fn finish(issues: Vec<UsageIssue>) -> Result<(), Error> {
    if issues.is_empty() {
        Ok(())
    } else {
        Err(Error::Usage(UsageError::new(issues)))
    }
}
