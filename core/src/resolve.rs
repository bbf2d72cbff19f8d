//! Whole-invocation resolution.
//!
//! The [`Resolver`] drives the [`Evaluator`] the way an option parser
//! does: it walks the options in declaration order, feeds each one its raw
//! value and the snapshot so far, round-trips prompt requests through a
//! [`Prompter`], and checks group constraints once every option resolved.
//!
//! # Example
//!
//! ```
//! use constrained_option_core::*;
//!
//! let schema = CommandSchema::builder("cli")
//!     .option(OptionSchema::new("a"))
//!     .option(OptionSchema::new("b").prompt_if("a"))
//!     .build()
//!     .unwrap();
//!
//! let mut prompter = ScriptedPrompter::new(["1"]);
//! let snapshot = Resolver::new(&schema)
//!     .run(Invocation::new().with("a", "0"), &mut prompter)
//!     .unwrap();
//!
//! assert_eq!(snapshot.get("b"), Some(&Value::from("1")));
//! ```

use std::collections::{HashMap, VecDeque};
use std::io;

use tracing::debug;

use crate::error::ResolveError;
use crate::evaluator::{Evaluator, Outcome, PromptRequest};
use crate::{CommandSchema, Snapshot, Value};

/// Raw values supplied on the command line for one invocation.
///
/// Supplying the same option twice keeps the last value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Invocation {
    values: HashMap<String, Value>,
}

impl Invocation {
    /// Creates an empty invocation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a supplied value.
    pub fn with(mut self, option: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(option, value);
        self
    }

    /// Adds a supplied value in place.
    pub fn insert(&mut self, option: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(option.into(), value.into());
    }

    /// The supplied value of an option.
    pub fn get(&self, option: &str) -> Option<&Value> {
        self.values.get(option)
    }

    /// Number of supplied options.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if nothing was supplied.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn take(&mut self, option: &str) -> Option<Value> {
        self.values.remove(option)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Invocation {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut invocation = Invocation::new();
        for (option, value) in iter {
            invocation.insert(option, value);
        }
        invocation
    }
}

/// Source of answers for prompt requests.
pub trait Prompter {
    /// Shows `request.text` and returns the user's answer.
    ///
    /// # Errors
    ///
    /// Any I/O failure of the underlying channel, including end of input.
    fn prompt(&mut self, request: &PromptRequest) -> io::Result<String>;
}

/// Answers prompts from a fixed queue, failing once it runs dry.
///
/// Useful for tests and non-interactive callers.
#[derive(Debug, Clone, Default)]
pub struct ScriptedPrompter {
    answers: VecDeque<String>,
    asked: Vec<PromptRequest>,
}

impl ScriptedPrompter {
    /// Creates a prompter with queued answers.
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            asked: Vec::new(),
        }
    }

    /// A prompter with no answers: any prompt fails.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Requests seen so far, in order.
    pub fn asked(&self) -> &[PromptRequest] {
        &self.asked
    }
}

impl Prompter for ScriptedPrompter {
    fn prompt(&mut self, request: &PromptRequest) -> io::Result<String> {
        self.asked.push(request.clone());
        self.answers.pop_front().ok_or_else(|| {
            io::Error::new(io::ErrorKind::UnexpectedEof, "no scripted answer left")
        })
    }
}

/// Resolves a full invocation against one schema.
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'s> {
    evaluator: Evaluator<'s>,
}

impl<'s> Resolver<'s> {
    /// Creates a resolver for a schema.
    pub fn new(schema: &'s CommandSchema) -> Self {
        Self {
            evaluator: Evaluator::new(schema),
        }
    }

    /// Resolves every option in declaration order, then checks groups.
    ///
    /// Returns the final snapshot with one entry per declared option.
    ///
    /// # Errors
    ///
    /// The first [`ResolveError`] raised. Supplying an option the schema
    /// does not declare fails with [`ResolveError::UnknownOption`] before
    /// anything is resolved.
    pub fn run(
        &self,
        mut invocation: Invocation,
        prompter: &mut dyn Prompter,
    ) -> Result<Snapshot, ResolveError> {
        let schema = self.evaluator.schema();

        let mut unknown: Vec<&String> = invocation
            .values
            .keys()
            .filter(|name| schema.option(name).is_none())
            .collect();
        unknown.sort();
        if let Some(name) = unknown.first() {
            return Err(ResolveError::UnknownOption((*name).clone()));
        }

        let mut snapshot = Snapshot::new();
        for option in schema.options() {
            let raw = invocation.take(&option.name);
            let value = match self.evaluator.resolve(&option.name, raw, &snapshot)? {
                Outcome::Prompt(request) => {
                    let answer = prompter.prompt(&request).map_err(|source| {
                        ResolveError::Prompt {
                            option: option.name.clone(),
                            source,
                        }
                    })?;
                    Some(self.evaluator.accept_prompt(&option.name, &answer, &snapshot)?)
                }
                resolved => resolved.into_value(),
            };
            snapshot.set(option.name.clone(), value);
        }

        self.evaluator.check_groups(&snapshot)?;
        debug!(command = %schema.name, resolved = snapshot.len(), "invocation resolved");
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GroupRule, OptionSchema};

    #[test]
    fn test_unknown_supplied_option_is_rejected() {
        let schema = CommandSchema::builder("cli")
            .option(OptionSchema::new("a"))
            .build()
            .unwrap();
        let err = Resolver::new(&schema)
            .run(Invocation::new().with("zz", "1"), &mut ScriptedPrompter::empty())
            .unwrap_err();
        assert_eq!(err.to_string(), "No such option: '--zz'");
    }

    #[test]
    fn test_prompt_eof_is_a_fault() {
        let schema = CommandSchema::builder("cli")
            .option(OptionSchema::new("a").prompt_if_none_of(Vec::<String>::new()))
            .build()
            .unwrap();
        let err = Resolver::new(&schema)
            .run(Invocation::new(), &mut ScriptedPrompter::empty())
            .unwrap_err();
        assert!(matches!(err, ResolveError::Prompt { ref option, .. } if option == "a"));
    }

    #[test]
    fn test_group_checked_after_prompt() {
        let schema = CommandSchema::builder("cli")
            .option(OptionSchema::new("a"))
            .option(OptionSchema::new("b").prompt_if("a"))
            .group(GroupRule::RequireOne, ["a", "b"])
            .build()
            .unwrap();
        let mut prompter = ScriptedPrompter::new(["1"]);
        let err = Resolver::new(&schema)
            .run(Invocation::new().with("a", "0"), &mut prompter)
            .unwrap_err();

        assert_eq!(prompter.asked().len(), 1);
        assert_eq!(err.to_string(), "require exact one of '--a' '--b'");
    }

    #[test]
    fn test_last_supplied_value_wins() {
        let invocation: Invocation = [("a", "1"), ("a", "2")].into_iter().collect();
        assert_eq!(invocation.get("a"), Some(&Value::from("2")));
        assert_eq!(invocation.len(), 1);
    }
}
