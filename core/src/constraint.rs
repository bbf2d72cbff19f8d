//! Constraints and per-option constraint sets.

use std::fmt;

use crate::callback::Callback;
use crate::predicate::Predicate;
use crate::{Value, ValueType};

/// Effect a constraint has on its target option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstraintKind {
    /// A supplied value is accepted only if the predicate holds.
    Allowed,
    /// The option must have a value if the predicate holds.
    Required,
    /// The user is prompted for a missing value if the predicate holds.
    Prompt,
    /// Produces a value when none was supplied.
    Default,
    /// Picks the coercion type for this invocation.
    TypeSelect,
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConstraintKind::Allowed => "allowed",
            ConstraintKind::Required => "required",
            ConstraintKind::Prompt => "prompt",
            ConstraintKind::Default => "default",
            ConstraintKind::TypeSelect => "type",
        };
        f.write_str(name)
    }
}

/// A predicate or value-producing callable bound to an effect kind.
#[derive(Debug, Clone)]
pub enum Constraint {
    /// Gate a supplied value.
    Allowed(Predicate),
    /// Make the option mandatory.
    Required(Predicate),
    /// Ask for a missing value.
    Prompt(Predicate),
    /// Produce a default; `None` means no default in this invocation.
    Default(Callback<Option<Value>>),
    /// Select the coercion type.
    TypeSelect(Callback<ValueType>),
}

impl Constraint {
    /// The effect kind.
    pub fn kind(&self) -> ConstraintKind {
        match self {
            Constraint::Allowed(_) => ConstraintKind::Allowed,
            Constraint::Required(_) => ConstraintKind::Required,
            Constraint::Prompt(_) => ConstraintKind::Prompt,
            Constraint::Default(_) => ConstraintKind::Default,
            Constraint::TypeSelect(_) => ConstraintKind::TypeSelect,
        }
    }

    /// Option names the constraint reads.
    pub fn references(&self) -> &[String] {
        match self {
            Constraint::Allowed(p) | Constraint::Required(p) | Constraint::Prompt(p) => {
                p.references()
            }
            Constraint::Default(callback) => callback.dependencies(),
            Constraint::TypeSelect(callback) => callback.dependencies(),
        }
    }
}

/// Ordered constraints attached to one option.
///
/// Declaration order is kept: ALLOWED predicates are checked in that
/// order and the first failing one is reported.
///
/// # Examples
///
/// ```
/// use constrained_option_core::{Constraint, ConstraintKind, ConstraintSet, Predicate};
///
/// let mut set = ConstraintSet::new();
/// set.push(Constraint::Allowed(Predicate::present("a")));
/// set.push(Constraint::Allowed(Predicate::absent("b")));
/// set.push(Constraint::Required(Predicate::present("c")));
///
/// assert_eq!(set.allowed().count(), 2);
/// assert_eq!(set.count(ConstraintKind::Required), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConstraintSet {
    constraints: Vec<Constraint>,
}

impl ConstraintSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a constraint.
    pub fn push(&mut self, constraint: Constraint) {
        self.constraints.push(constraint);
    }

    /// All constraints in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Constraint> {
        self.constraints.iter()
    }

    /// Returns `true` if no constraint is attached.
    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    /// Number of constraints of one kind.
    pub fn count(&self, kind: ConstraintKind) -> usize {
        self.constraints.iter().filter(|c| c.kind() == kind).count()
    }

    /// ALLOWED predicates in declaration order.
    pub fn allowed(&self) -> impl Iterator<Item = &Predicate> {
        self.constraints.iter().filter_map(|c| match c {
            Constraint::Allowed(p) => Some(p),
            _ => None,
        })
    }

    /// REQUIRED predicates in declaration order.
    pub fn required(&self) -> impl Iterator<Item = &Predicate> {
        self.constraints.iter().filter_map(|c| match c {
            Constraint::Required(p) => Some(p),
            _ => None,
        })
    }

    /// PROMPT predicates in declaration order.
    pub fn prompt(&self) -> impl Iterator<Item = &Predicate> {
        self.constraints.iter().filter_map(|c| match c {
            Constraint::Prompt(p) => Some(p),
            _ => None,
        })
    }

    /// The DEFAULT callable. Schema validation rejects more than one.
    pub fn default_value(&self) -> Option<&Callback<Option<Value>>> {
        self.constraints.iter().find_map(|c| match c {
            Constraint::Default(callback) => Some(callback),
            _ => None,
        })
    }

    /// The TYPE_SELECT callable. Schema validation rejects more than one.
    pub fn type_selector(&self) -> Option<&Callback<ValueType>> {
        self.constraints.iter().find_map(|c| match c {
            Constraint::TypeSelect(callback) => Some(callback),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_accessors_keep_declaration_order() {
        let mut set = ConstraintSet::new();
        set.push(Constraint::Prompt(Predicate::present("x")));
        set.push(Constraint::Allowed(Predicate::present("a")));
        set.push(Constraint::Required(Predicate::present("r")));
        set.push(Constraint::Allowed(Predicate::absent("b")));

        let allowed: Vec<_> = set.allowed().map(Predicate::violation).collect();
        assert_eq!(allowed, vec!["require '--a'", "conflict with '--b'"]);
        assert_eq!(set.required().count(), 1);
        assert_eq!(set.prompt().count(), 1);
        assert!(set.default_value().is_none());
        assert!(set.type_selector().is_none());
    }

    #[test]
    fn test_references_cover_callables() {
        let default = Constraint::Default(Callback::new(["a"], |_| None));
        assert_eq!(default.kind(), ConstraintKind::Default);
        assert_eq!(default.references(), ["a".to_string()]);
    }
}
