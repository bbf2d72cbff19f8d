//! Option and command schemas.
//!
//! An [`OptionSchema`] is declared once with its constraints attached through
//! builder methods named after the rule they add (`allowed_if`,
//! `required_if_any_of`, `prompt_func`, `default_func`, `type_func`, ...).
//! A [`CommandSchema`] owns the options in declaration order plus the
//! [`GroupRegistrar`] for group constraints, and is immutable once built.
//!
//! # Example
//!
//! ```
//! use constrained_option_core::*;
//!
//! let schema = CommandSchema::builder("deploy")
//!     .option(OptionSchema::new("env"))
//!     .option(OptionSchema::new("region").allowed_if("env"))
//!     .option(OptionSchema::new("token").required_if_not("env"))
//!     .group(GroupRule::RequireAny, ["env", "token"])
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(schema.option_names(), vec!["env", "region", "token"]);
//! assert_eq!(schema.groups().len(), 1);
//! ```

use crate::callback::{Callback, CallbackError, Dependencies};
use crate::constraint::{Constraint, ConstraintSet};
use crate::group::{GroupRegistrar, GroupRule};
use crate::predicate::Predicate;
use crate::validate::{SchemaError, validate_schema};
use crate::{Value, ValueType};

macro_rules! predicate_builders {
    (
        $variant:ident;
        $present:ident, $absent:ident, $all:ident, $none:ident, $any:ident, $one:ident,
        $func:ident, $try_func:ident
    ) => {
        #[doc = concat!("Adds a ", stringify!($variant), " constraint: `name` is present.")]
        pub fn $present(self, name: impl Into<String>) -> Self {
            self.constrain(Constraint::$variant(Predicate::present(name)))
        }

        #[doc = concat!("Adds a ", stringify!($variant), " constraint: `name` is absent.")]
        pub fn $absent(self, name: impl Into<String>) -> Self {
            self.constrain(Constraint::$variant(Predicate::absent(name)))
        }

        #[doc = concat!(
            "Adds a ",
            stringify!($variant),
            " constraint: all of `names` are present."
        )]
        pub fn $all<I, S>(self, names: I) -> Self
        where
            I: IntoIterator<Item = S>,
            S: Into<String>,
        {
            self.constrain(Constraint::$variant(Predicate::all_of(names)))
        }

        #[doc = concat!(
            "Adds a ",
            stringify!($variant),
            " constraint: none of `names` is present."
        )]
        pub fn $none<I, S>(self, names: I) -> Self
        where
            I: IntoIterator<Item = S>,
            S: Into<String>,
        {
            self.constrain(Constraint::$variant(Predicate::none_of(names)))
        }

        #[doc = concat!(
            "Adds a ",
            stringify!($variant),
            " constraint: at least one of `names` is present."
        )]
        pub fn $any<I, S>(self, names: I) -> Self
        where
            I: IntoIterator<Item = S>,
            S: Into<String>,
        {
            self.constrain(Constraint::$variant(Predicate::any_of(names)))
        }

        #[doc = concat!(
            "Adds a ",
            stringify!($variant),
            " constraint: exactly one of `names` is present."
        )]
        pub fn $one<I, S>(self, names: I) -> Self
        where
            I: IntoIterator<Item = S>,
            S: Into<String>,
        {
            self.constrain(Constraint::$variant(Predicate::exactly_one_of(names)))
        }

        #[doc = concat!(
            "Adds a ",
            stringify!($variant),
            " constraint from a custom predicate over `deps`."
        )]
        pub fn $func<I, S, F>(self, deps: I, func: F) -> Self
        where
            I: IntoIterator<Item = S>,
            S: Into<String>,
            F: Fn(&Dependencies<'_>) -> bool + Send + Sync + 'static,
        {
            self.constrain(Constraint::$variant(Predicate::custom(Callback::new(deps, func))))
        }

        #[doc = concat!("Like the infallible form; an `Err` aborts resolution as an engine fault.")]
        pub fn $try_func<I, S, F>(self, deps: I, func: F) -> Self
        where
            I: IntoIterator<Item = S>,
            S: Into<String>,
            F: Fn(&Dependencies<'_>) -> Result<bool, CallbackError> + Send + Sync + 'static,
        {
            self.constrain(Constraint::$variant(Predicate::custom(Callback::fallible(deps, func))))
        }
    };
}

/// Declaration of one option and its constraints.
///
/// # Examples
///
/// ```
/// use constrained_option_core::{ConstraintKind, OptionSchema, ValueType};
///
/// let opt = OptionSchema::new("e")
///     .with_type(ValueType::Integer)
///     .allowed_if("a")
///     .allowed_if_not("b")
///     .allowed_if_one_of(["c", "d"]);
///
/// assert_eq!(opt.constraints().count(ConstraintKind::Allowed), 3);
/// assert_eq!(opt.prompt_text(), "E");
/// ```
#[derive(Debug, Clone)]
pub struct OptionSchema {
    /// Option name without the leading `--`.
    pub name: String,
    /// Coercion type when no type selector is attached.
    pub value_type: ValueType,
    /// Help text.
    pub help: Option<String>,
    /// Prompt text; derived from the name when unset.
    pub prompt: Option<String>,
    /// Unconditionally required.
    pub required: bool,
    constraints: ConstraintSet,
}

impl OptionSchema {
    /// Creates an unconstrained text option.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value_type: ValueType::Text,
            help: None,
            prompt: None,
            required: false,
            constraints: ConstraintSet::new(),
        }
    }

    /// Sets the coercion type.
    pub fn with_type(mut self, value_type: ValueType) -> Self {
        self.value_type = value_type;
        self
    }

    /// Sets the help text.
    pub fn with_help(mut self, help: &str) -> Self {
        self.help = Some(help.to_string());
        self
    }

    /// Sets the prompt text.
    pub fn with_prompt(mut self, prompt: &str) -> Self {
        self.prompt = Some(prompt.to_string());
        self
    }

    /// Marks the option as always required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Attaches an arbitrary constraint.
    pub fn constrain(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    predicate_builders!(
        Allowed;
        allowed_if, allowed_if_not, allowed_if_all_of, allowed_if_none_of,
        allowed_if_any_of, allowed_if_one_of, allowed_func, try_allowed_func
    );
    predicate_builders!(
        Required;
        required_if, required_if_not, required_if_all_of, required_if_none_of,
        required_if_any_of, required_if_one_of, required_func, try_required_func
    );
    predicate_builders!(
        Prompt;
        prompt_if, prompt_if_not, prompt_if_all_of, prompt_if_none_of,
        prompt_if_any_of, prompt_if_one_of, prompt_func, try_prompt_func
    );

    /// Uses a fixed default value.
    pub fn default_value(self, value: impl Into<Value>) -> Self {
        let value = value.into();
        self.constrain(Constraint::Default(Callback::new(
            Vec::<String>::new(),
            move |_| Some(value.clone()),
        )))
    }

    /// Computes the default from `deps`; returning `None` leaves the option unset.
    pub fn default_func<I, S, F, V>(self, deps: I, func: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(&Dependencies<'_>) -> Option<V> + Send + Sync + 'static,
        V: Into<Value>,
    {
        self.constrain(Constraint::Default(Callback::new(deps, move |d| {
            func(d).map(Into::into)
        })))
    }

    /// Fallible form of [`default_func`](Self::default_func).
    pub fn try_default_func<I, S, F>(self, deps: I, func: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(&Dependencies<'_>) -> Result<Option<Value>, CallbackError> + Send + Sync + 'static,
    {
        self.constrain(Constraint::Default(Callback::fallible(deps, func)))
    }

    /// Selects the coercion type from `deps` per invocation.
    pub fn type_func<I, S, F>(self, deps: I, func: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(&Dependencies<'_>) -> ValueType + Send + Sync + 'static,
    {
        self.constrain(Constraint::TypeSelect(Callback::new(deps, func)))
    }

    /// Fallible form of [`type_func`](Self::type_func).
    pub fn try_type_func<I, S, F>(self, deps: I, func: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(&Dependencies<'_>) -> Result<ValueType, CallbackError> + Send + Sync + 'static,
    {
        self.constrain(Constraint::TypeSelect(Callback::fallible(deps, func)))
    }

    /// The attached constraints.
    pub fn constraints(&self) -> &ConstraintSet {
        &self.constraints
    }

    /// Prompt text, falling back to the name with `_`/`-` as spaces and a
    /// capitalized first letter.
    pub fn prompt_text(&self) -> String {
        if let Some(prompt) = &self.prompt {
            return prompt.clone();
        }
        let words = self.name.replace(['_', '-'], " ");
        let mut chars = words.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

/// An immutable command schema: options in declaration order plus groups.
#[derive(Debug, Clone)]
pub struct CommandSchema {
    /// Command name.
    pub name: String,
    options: Vec<OptionSchema>,
    groups: GroupRegistrar,
}

impl CommandSchema {
    /// Starts a schema.
    pub fn builder(name: impl Into<String>) -> CommandSchemaBuilder {
        CommandSchemaBuilder {
            schema: CommandSchema {
                name: name.into(),
                options: Vec::new(),
                groups: GroupRegistrar::new(),
            },
        }
    }

    /// Options in declaration order.
    pub fn options(&self) -> &[OptionSchema] {
        &self.options
    }

    /// Looks up an option by name.
    pub fn option(&self, name: &str) -> Option<&OptionSchema> {
        self.options.iter().find(|o| o.name == name)
    }

    /// Declaration index of an option.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.options.iter().position(|o| o.name == name)
    }

    /// Option names in declaration order.
    pub fn option_names(&self) -> Vec<&str> {
        self.options.iter().map(|o| o.name.as_str()).collect()
    }

    /// The group registrar.
    pub fn groups(&self) -> &GroupRegistrar {
        &self.groups
    }
}

/// Builder for [`CommandSchema`]; [`build`](Self::build) validates.
#[derive(Debug)]
pub struct CommandSchemaBuilder {
    schema: CommandSchema,
}

impl CommandSchemaBuilder {
    /// Declares the next option.
    pub fn option(mut self, option: OptionSchema) -> Self {
        self.schema.options.push(option);
        self
    }

    /// Registers a group constraint.
    pub fn group<I, S>(mut self, rule: GroupRule, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.schema.groups.register(rule, members);
        self
    }

    /// Validates and returns the schema.
    ///
    /// # Errors
    ///
    /// Returns the first [`SchemaError`] reported by
    /// [`validate_schema`].
    pub fn build(self) -> Result<CommandSchema, SchemaError> {
        match validate_schema(&self.schema).into_iter().next() {
            Some(err) => Err(err),
            None => Ok(self.schema),
        }
    }

    /// Returns the schema without validating it.
    pub fn build_unchecked(self) -> CommandSchema {
        self.schema
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ConstraintKind;

    #[test]
    fn test_prompt_text_derivation() {
        assert_eq!(OptionSchema::new("b").prompt_text(), "B");
        assert_eq!(OptionSchema::new("dry_run").prompt_text(), "Dry run");
        assert_eq!(
            OptionSchema::new("dry-run").with_prompt("Really?").prompt_text(),
            "Really?"
        );
    }

    #[test]
    fn test_builders_attach_in_order() {
        let opt = OptionSchema::new("c")
            .required_if("a")
            .prompt_if_none_of(["a", "b"])
            .allowed_func(["a"], |d| d.text("a") == Some("0"))
            .default_func(["a"], |d| d.text("a").map(str::to_uppercase))
            .type_func(["a"], |_| ValueType::Integer);

        let kinds: Vec<_> = opt.constraints().iter().map(Constraint::kind).collect();
        assert_eq!(
            kinds,
            vec![
                ConstraintKind::Required,
                ConstraintKind::Prompt,
                ConstraintKind::Allowed,
                ConstraintKind::Default,
                ConstraintKind::TypeSelect,
            ]
        );
    }

    #[test]
    fn test_schema_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<CommandSchema>();
    }

    #[test]
    fn test_build_rejects_invalid_schema() {
        let err = CommandSchema::builder("cli")
            .option(OptionSchema::new("a"))
            .option(OptionSchema::new("a"))
            .build()
            .unwrap_err();
        assert_eq!(err, SchemaError::DuplicateOption("a".to_string()));
    }
}
