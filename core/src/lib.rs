//! Declarative constraints between command-line options.
//!
//! This crate lets a command declare, per option, when the option may be
//! supplied, when it must be supplied, when the user should be prompted for
//! it, how its default is computed and which type its value is parsed as,
//! all as functions of the other options of the same invocation:
//!
//! - [`Predicate`]: a boolean test over the [`Snapshot`] of already-resolved
//!   options (`Present`, `Absent`, `AllOf`, `NoneOf`, `AnyOf`,
//!   `ExactlyOneOf`, or a custom callable).
//! - [`Constraint`] and [`ConstraintSet`]: the ALLOWED, REQUIRED, PROMPT,
//!   DEFAULT and TYPE_SELECT effects attached to one [`OptionSchema`].
//! - [`Evaluator`]: resolves one option given its raw value.
//! - [`GroupRegistrar`]: `require_all`, `require_any` and `require_one`
//!   rules over sets of options, checked after every option resolved.
//! - [`Resolver`]: drives a full invocation in declaration order, routing
//!   prompt requests through a [`Prompter`].
//!
//! Schemas are built with [`CommandSchema::builder`] or loaded from YAML
//! or JSON with [`SchemaConfig`]; [`validate_schema`] rejects schemas that
//! could never resolve the way they read.
//!
//! # Example
//!
//! ```
//! use constrained_option_core::*;
//!
//! let schema = CommandSchema::builder("tool")
//!     .option(OptionSchema::new("a"))
//!     .option(OptionSchema::new("b"))
//!     .option(
//!         OptionSchema::new("e")
//!             .allowed_if("a")
//!             .allowed_if_not("b"),
//!     )
//!     .build()
//!     .unwrap();
//!
//! let resolver = Resolver::new(&schema);
//! let mut prompter = ScriptedPrompter::empty();
//!
//! let snapshot = resolver
//!     .run(Invocation::new().with("a", "0").with("e", "2"), &mut prompter)
//!     .unwrap();
//! assert_eq!(snapshot.get("e"), Some(&Value::from("2")));
//!
//! let err = resolver
//!     .run(
//!         Invocation::new().with("a", "0").with("b", "1").with("e", "2"),
//!         &mut prompter,
//!     )
//!     .unwrap_err();
//! assert_eq!(err.to_string(), "Invalid value for '--e': conflict with '--b'");
//! ```

mod callback;
mod config;
mod constraint;
mod error;
mod evaluator;
mod group;
mod predicate;
mod resolve;
mod schema;
mod types;
mod validate;

pub use callback::{Callback, CallbackError, Dependencies};
pub use config::{GroupConfig, OptionConfig, RuleConfig, SchemaConfig, TypeName};
pub use constraint::{Constraint, ConstraintKind, ConstraintSet};
pub use error::{ConfigError, ErrorKind, ResolveError};
pub use evaluator::{Evaluator, Outcome, PromptRequest};
pub use group::{Group, GroupError, GroupId, GroupRegistrar, GroupRule};
pub use predicate::Predicate;
pub use resolve::{Invocation, Prompter, Resolver, ScriptedPrompter};
pub use schema::{CommandSchema, CommandSchemaBuilder, OptionSchema};
pub use types::{Snapshot, Value, ValueType};
pub use validate::{SchemaError, validate_schema};
