//! The per-option resolution pipeline.
//!
//! For one option and the snapshot of options resolved before it, the
//! [`Evaluator`] runs these steps in order, stopping at the first failure:
//!
//! 1. value supplied: select the type, coerce, check every ALLOWED
//!    predicate in declaration order;
//! 2. value absent: the option is mandatory if it is unconditionally
//!    required or any REQUIRED predicate holds;
//! 3. a DEFAULT callable that yields a value fills the option;
//! 4. still absent and mandatory: `Missing option`;
//! 5. any PROMPT predicate holds: ask the caller to prompt, otherwise the
//!    option stays unset.
//!
//! The evaluator never mutates the snapshot, so resolving the same option
//! against the same snapshot again yields the same outcome.

use tracing::{debug, warn};

use crate::callback::CallbackError;
use crate::error::ResolveError;
use crate::predicate::Predicate;
use crate::{CommandSchema, OptionSchema, Snapshot, Value, ValueType};

/// Successful result of resolving one option.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The user supplied a valid value.
    Supplied(Value),
    /// A default filled the option.
    Defaulted(Value),
    /// The option stays unset.
    Unset,
    /// The caller must prompt and pass the answer to
    /// [`Evaluator::accept_prompt`].
    Prompt(PromptRequest),
}

impl Outcome {
    /// The resolved value; `None` for unset and pending prompts.
    pub fn into_value(self) -> Option<Value> {
        match self {
            Outcome::Supplied(v) | Outcome::Defaulted(v) => Some(v),
            Outcome::Unset | Outcome::Prompt(_) => None,
        }
    }
}

/// Request for interactive input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptRequest {
    /// Option being prompted for.
    pub option: String,
    /// Text to show the user.
    pub text: String,
    /// Type the answer will be coerced to.
    pub value_type: ValueType,
}

/// Runs constraint evaluation against one [`CommandSchema`].
///
/// # Examples
///
/// ```
/// use constrained_option_core::*;
///
/// let schema = CommandSchema::builder("cli")
///     .option(OptionSchema::new("a"))
///     .option(OptionSchema::new("b").allowed_if("a"))
///     .build()
///     .unwrap();
/// let evaluator = Evaluator::new(&schema);
///
/// let mut snapshot = Snapshot::new();
/// snapshot.set("a", None);
///
/// let err = evaluator
///     .resolve("b", Some(Value::from("1")), &snapshot)
///     .unwrap_err();
/// assert_eq!(err.to_string(), "Invalid value for '--b': require '--a'");
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Evaluator<'s> {
    schema: &'s CommandSchema,
}

impl<'s> Evaluator<'s> {
    /// Creates an evaluator for a schema.
    pub fn new(schema: &'s CommandSchema) -> Self {
        Self { schema }
    }

    /// The schema being evaluated.
    pub fn schema(&self) -> &'s CommandSchema {
        self.schema
    }

    /// Resolves one option given its raw value (or `None` when not supplied).
    ///
    /// # Errors
    ///
    /// [`ResolveError::InvalidValue`] or [`ResolveError::Validation`] for a
    /// rejected supplied value, [`ResolveError::Missing`] for a required
    /// option left unset, [`ResolveError::Callback`] when a user callable
    /// fails, [`ResolveError::UnknownOption`] for an undeclared name.
    pub fn resolve(
        &self,
        option: &str,
        raw: Option<Value>,
        snapshot: &Snapshot,
    ) -> Result<Outcome, ResolveError> {
        let decl = self.declaration(option)?;

        if let Some(raw) = raw {
            let value = self.accept(decl, &raw, snapshot)?;
            debug!(option, value = %value, "accepted supplied value");
            return Ok(Outcome::Supplied(value));
        }

        let mandatory = decl.required || any_holds(decl, decl.constraints().required(), snapshot)?;
        debug!(option, mandatory, "checked required constraints");

        if let Some(default) = decl.constraints().default_value() {
            let produced = default.call(snapshot).map_err(|e| callback_fault(decl, e))?;
            if let Some(produced) = produced {
                let value = self.coerce(decl, &produced, snapshot)?;
                debug!(option, value = %value, "applied default");
                return Ok(Outcome::Defaulted(value));
            }
        }

        if mandatory {
            debug!(option, "required option is missing");
            return Err(ResolveError::Missing(decl.name.clone()));
        }

        if any_holds(decl, decl.constraints().prompt(), snapshot)? {
            let request = PromptRequest {
                option: decl.name.clone(),
                text: decl.prompt_text(),
                value_type: self.select_type(decl, snapshot)?,
            };
            debug!(option, text = %request.text, "requesting prompt");
            return Ok(Outcome::Prompt(request));
        }

        debug!(option, "left unset");
        Ok(Outcome::Unset)
    }

    /// Accepts a prompt answer for an option that returned [`Outcome::Prompt`].
    ///
    /// The answer goes through the same coercion and ALLOWED checks as a
    /// supplied value.
    ///
    /// # Errors
    ///
    /// Same as the supplied-value path of [`resolve`](Self::resolve).
    pub fn accept_prompt(
        &self,
        option: &str,
        answer: &str,
        snapshot: &Snapshot,
    ) -> Result<Value, ResolveError> {
        let decl = self.declaration(option)?;
        let value = self.accept(decl, &Value::from(answer), snapshot)?;
        debug!(option, value = %value, "accepted prompt answer");
        Ok(value)
    }

    /// Checks every group constraint against the fully resolved snapshot.
    ///
    /// # Errors
    ///
    /// [`ResolveError::Group`] for the first failing group.
    pub fn check_groups(&self, snapshot: &Snapshot) -> Result<(), ResolveError> {
        self.schema.groups().check(snapshot).map_err(|err| {
            debug!(group = %err.group, offending = ?err.offending, "group constraint failed");
            ResolveError::from(err)
        })
    }

    fn declaration(&self, option: &str) -> Result<&'s OptionSchema, ResolveError> {
        self.schema
            .option(option)
            .ok_or_else(|| ResolveError::UnknownOption(option.to_string()))
    }

    fn accept(
        &self,
        decl: &OptionSchema,
        raw: &Value,
        snapshot: &Snapshot,
    ) -> Result<Value, ResolveError> {
        let value = self.coerce(decl, raw, snapshot)?;
        for predicate in decl.constraints().allowed() {
            if !evaluate(decl, predicate, snapshot)? {
                return Err(ResolveError::Validation {
                    option: decl.name.clone(),
                    reason: predicate.violation(),
                });
            }
        }
        Ok(value)
    }

    fn coerce(
        &self,
        decl: &OptionSchema,
        raw: &Value,
        snapshot: &Snapshot,
    ) -> Result<Value, ResolveError> {
        let value_type = self.select_type(decl, snapshot)?;
        value_type
            .coerce(raw)
            .ok_or_else(|| ResolveError::InvalidValue {
                option: decl.name.clone(),
                value: raw.to_string(),
                expected: value_type.describe(),
            })
    }

    fn select_type(
        &self,
        decl: &OptionSchema,
        snapshot: &Snapshot,
    ) -> Result<ValueType, ResolveError> {
        match decl.constraints().type_selector() {
            Some(selector) => selector.call(snapshot).map_err(|e| callback_fault(decl, e)),
            None => Ok(decl.value_type.clone()),
        }
    }
}

fn any_holds<'p>(
    decl: &OptionSchema,
    predicates: impl Iterator<Item = &'p Predicate>,
    snapshot: &Snapshot,
) -> Result<bool, ResolveError> {
    for predicate in predicates {
        if evaluate(decl, predicate, snapshot)? {
            return Ok(true);
        }
    }
    Ok(false)
}

fn evaluate(
    decl: &OptionSchema,
    predicate: &Predicate,
    snapshot: &Snapshot,
) -> Result<bool, ResolveError> {
    predicate
        .evaluate(snapshot)
        .map_err(|e| callback_fault(decl, e))
}

fn callback_fault(decl: &OptionSchema, source: CallbackError) -> ResolveError {
    warn!(option = %decl.name, error = %source, "constraint callback failed");
    ResolveError::Callback {
        option: decl.name.clone(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    fn snapshot(pairs: &[(&str, Option<&str>)]) -> Snapshot {
        pairs
            .iter()
            .map(|(n, v)| (*n, v.map(Value::from)))
            .collect()
    }

    fn schema(option: OptionSchema) -> CommandSchema {
        CommandSchema::builder("cli")
            .option(OptionSchema::new("a"))
            .option(OptionSchema::new("b"))
            .option(option)
            .build()
            .unwrap()
    }

    #[test]
    fn test_allowed_skipped_when_absent() {
        let schema = schema(OptionSchema::new("c").allowed_if("a"));
        let outcome = Evaluator::new(&schema)
            .resolve("c", None, &snapshot(&[("a", None), ("b", None)]))
            .unwrap();
        assert_eq!(outcome, Outcome::Unset);
    }

    #[test]
    fn test_first_failing_allowed_is_reported() {
        let schema = schema(
            OptionSchema::new("c")
                .allowed_if("a")
                .allowed_if_not("b")
                .allowed_if_any_of(["a", "b"]),
        );
        let err = Evaluator::new(&schema)
            .resolve("c", Some("x".into()), &snapshot(&[("a", Some("0")), ("b", Some("1"))]))
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid value for '--c': conflict with '--b'");
    }

    #[test]
    fn test_required_any_predicate_makes_mandatory() {
        let schema = schema(OptionSchema::new("c").required_if("a").required_if("b"));
        let err = Evaluator::new(&schema)
            .resolve("c", None, &snapshot(&[("a", None), ("b", Some("1"))]))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Missing);
    }

    #[test]
    fn test_default_satisfies_requirement() {
        let schema = schema(OptionSchema::new("c").required().default_value("d"));
        let outcome = Evaluator::new(&schema)
            .resolve("c", None, &Snapshot::new())
            .unwrap();
        assert_eq!(outcome, Outcome::Defaulted(Value::from("d")));
    }

    #[test]
    fn test_outcome_into_value() {
        assert_eq!(Outcome::Supplied(Value::Int(3)).into_value(), Some(Value::Int(3)));
        assert_eq!(Outcome::Defaulted(Value::from("d")).into_value(), Some(Value::from("d")));
        assert_eq!(Outcome::Unset.into_value(), None);

        let schema = schema(OptionSchema::new("c").prompt_if_not("a"));
        let outcome = Evaluator::new(&schema)
            .resolve("c", None, &Snapshot::new())
            .unwrap();
        assert_eq!(outcome.into_value(), None);
    }

    #[test]
    fn test_default_returning_none_falls_through() {
        let schema = schema(
            OptionSchema::new("c")
                .default_func(["a"], |d| d.text("a").map(str::to_string))
                .prompt_if_not("a"),
        );
        let outcome = Evaluator::new(&schema)
            .resolve("c", None, &snapshot(&[("a", None), ("b", None)]))
            .unwrap();
        assert!(matches!(outcome, Outcome::Prompt(ref r) if r.text == "C"));
    }

    #[test]
    fn test_mandatory_wins_over_prompt() {
        let schema = schema(OptionSchema::new("c").required_if("a").prompt_if("a"));
        let err = Evaluator::new(&schema)
            .resolve("c", None, &snapshot(&[("a", Some("0"))]))
            .unwrap_err();
        assert_eq!(err.to_string(), "Missing option '--c'");
    }

    #[test]
    fn test_prompt_answer_is_coerced_and_allowed_checked() {
        let schema = schema(
            OptionSchema::new("c")
                .with_type(ValueType::Integer)
                .allowed_if("a")
                .prompt_if_not("b"),
        );
        let evaluator = Evaluator::new(&schema);
        let with_a = snapshot(&[("a", Some("0")), ("b", None)]);

        assert_eq!(evaluator.accept_prompt("c", "5", &with_a).unwrap(), Value::Int(5));
        assert!(matches!(
            evaluator.accept_prompt("c", "five", &with_a),
            Err(ResolveError::InvalidValue { .. })
        ));

        let without_a = snapshot(&[("a", None), ("b", None)]);
        assert!(matches!(
            evaluator.accept_prompt("c", "5", &without_a),
            Err(ResolveError::Validation { .. })
        ));
    }

    #[test]
    fn test_callback_failure_is_a_fault() {
        let schema =
            schema(OptionSchema::new("c").try_allowed_func(["a"], |_| Err("kaput".into())));
        let err = Evaluator::new(&schema)
            .resolve("c", Some("x".into()), &Snapshot::new())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Fault);
        assert!(err.to_string().contains("kaput"));
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let schema = schema(OptionSchema::new("c").allowed_if_one_of(["a", "b"]));
        let evaluator = Evaluator::new(&schema);
        let snap = snapshot(&[("a", Some("0")), ("b", None)]);

        let first = evaluator.resolve("c", Some("1".into()), &snap).unwrap();
        let second = evaluator.resolve("c", Some("1".into()), &snap).unwrap();
        assert_eq!(first, second);
        assert_eq!(snap, snapshot(&[("a", Some("0")), ("b", None)]));
    }

    #[test]
    fn test_unknown_option() {
        let schema = schema(OptionSchema::new("c"));
        let err = Evaluator::new(&schema)
            .resolve("zzz", None, &Snapshot::new())
            .unwrap_err();
        assert!(matches!(err, ResolveError::UnknownOption(name) if name == "zzz"));
    }
}
