//! Build-time schema validation.
//!
//! Catches schemas that could never resolve the way they read: duplicate
//! or malformed option names, constraints that reference undeclared
//! options or options declared later (resolution runs in declaration order,
//! so those would always read as absent), more than one default or type
//! selector on one option, choice types without choices, and empty or
//! dangling groups.
//!
//! # Examples
//!
//! ```
//! use constrained_option_core::*;
//!
//! let schema = CommandSchema::builder("cli")
//!     .option(OptionSchema::new("a"))
//!     .option(OptionSchema::new("b").allowed_if("a"))
//!     .build_unchecked();
//! assert!(validate_schema(&schema).is_empty());
//!
//! // `a` cannot depend on `b`, which resolves after it
//! let schema = CommandSchema::builder("cli")
//!     .option(OptionSchema::new("a").allowed_if("b"))
//!     .option(OptionSchema::new("b"))
//!     .build_unchecked();
//! assert!(matches!(
//!     validate_schema(&schema)[0],
//!     SchemaError::ForwardReference { .. }
//! ));
//! ```

use std::collections::HashSet;

use thiserror::Error;

use crate::{CommandSchema, ConstraintKind, GroupId, OptionSchema, ValueType};

/// Schema validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// Command name is empty or whitespace-only.
    #[error("command name cannot be empty")]
    EmptyCommandName,
    /// Option name is empty.
    #[error("option name cannot be empty")]
    EmptyOptionName,
    /// Option name starts with `-` or contains whitespace or `=`.
    #[error("invalid option name: {0:?}")]
    InvalidOptionName(String),
    /// Two options share a name.
    #[error("duplicate option: '--{0}'")]
    DuplicateOption(String),
    /// A constraint names an option the schema does not declare.
    #[error("'--{option}' references undeclared option '--{reference}'")]
    UnknownReference {
        /// Option carrying the constraint.
        option: String,
        /// Undeclared name.
        reference: String,
    },
    /// A constraint names the option itself or one declared after it.
    #[error("'--{option}' references '--{reference}', which resolves after it")]
    ForwardReference {
        /// Option carrying the constraint.
        option: String,
        /// Later-declared name.
        reference: String,
    },
    /// More than one default or type selector on one option.
    #[error("'--{option}' declares more than one {kind} constraint")]
    DuplicateConstraint {
        /// Offending option.
        option: String,
        /// Either `Default` or `TypeSelect`.
        kind: ConstraintKind,
    },
    /// A choice option lists no choices, so no value could be accepted.
    #[error("'--{0}' is a choice with no choices")]
    EmptyChoices(String),
    /// A group has no members.
    #[error("group {0} has no members")]
    EmptyGroup(GroupId),
    /// A group lists an undeclared option.
    #[error("group {group} references undeclared option '--{member}'")]
    UnknownGroupMember {
        /// Offending group.
        group: GroupId,
        /// Undeclared name.
        member: String,
    },
}

/// Validates a command schema, returning every problem found.
///
/// Options are checked in declaration order, then groups.
pub fn validate_schema(schema: &CommandSchema) -> Vec<SchemaError> {
    let mut errors = Vec::new();

    if schema.name.trim().is_empty() {
        errors.push(SchemaError::EmptyCommandName);
    }

    let mut seen: HashSet<&str> = HashSet::new();
    for option in schema.options() {
        if let Some(err) = check_name(&option.name) {
            errors.push(err);
            continue;
        }
        if !seen.insert(option.name.as_str()) {
            errors.push(SchemaError::DuplicateOption(option.name.clone()));
        }
    }

    for (index, option) in schema.options().iter().enumerate() {
        errors.extend(check_references(schema, index, option));
        if matches!(&option.value_type, ValueType::Choice(choices) if choices.is_empty()) {
            errors.push(SchemaError::EmptyChoices(option.name.clone()));
        }
        for kind in [ConstraintKind::Default, ConstraintKind::TypeSelect] {
            if option.constraints().count(kind) > 1 {
                errors.push(SchemaError::DuplicateConstraint {
                    option: option.name.clone(),
                    kind,
                });
            }
        }
    }

    for group in schema.groups().iter() {
        if group.members.is_empty() {
            errors.push(SchemaError::EmptyGroup(group.id));
        }
        for member in &group.members {
            if schema.option(member).is_none() {
                errors.push(SchemaError::UnknownGroupMember {
                    group: group.id,
                    member: member.clone(),
                });
            }
        }
    }

    errors
}

fn check_name(name: &str) -> Option<SchemaError> {
    if name.is_empty() {
        return Some(SchemaError::EmptyOptionName);
    }
    if name.starts_with('-') || name.contains('=') || name.chars().any(char::is_whitespace) {
        return Some(SchemaError::InvalidOptionName(name.to_string()));
    }
    None
}

fn check_references(
    schema: &CommandSchema,
    index: usize,
    option: &OptionSchema,
) -> Vec<SchemaError> {
    let mut errors = Vec::new();
    let mut reported: HashSet<&str> = HashSet::new();

    for constraint in option.constraints().iter() {
        for reference in constraint.references() {
            if !reported.insert(reference.as_str()) {
                continue;
            }
            match schema.position(reference) {
                None => errors.push(SchemaError::UnknownReference {
                    option: option.name.clone(),
                    reference: reference.clone(),
                }),
                Some(at) if at >= index => errors.push(SchemaError::ForwardReference {
                    option: option.name.clone(),
                    reference: reference.clone(),
                }),
                Some(_) => {}
            }
        }
    }

    errors
}
