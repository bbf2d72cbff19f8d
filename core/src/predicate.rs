//! Predicates over a resolved-option snapshot.
//!
//! Built-in predicates test presence of one option or count present
//! options in a set. [`Predicate::Custom`] runs a user callable. Each
//! predicate has a fixed failure message used when it guards an option's
//! ALLOWED constraint.

use crate::callback::{Callback, CallbackError};
use crate::types::{quoted, quoted_list};
use crate::Snapshot;

/// Boolean condition over a [`Snapshot`].
///
/// Set operands are de-duplicated on construction, keeping the first
/// occurrence so messages list names in declared order.
///
/// # Examples
///
/// ```
/// use constrained_option_core::{Predicate, Snapshot, Value};
///
/// let mut snapshot = Snapshot::new();
/// snapshot.set("a", Some(Value::from("0")));
/// snapshot.set("b", None);
///
/// assert!(Predicate::present("a").evaluate(&snapshot).unwrap());
/// assert!(Predicate::exactly_one_of(["a", "b"]).evaluate(&snapshot).unwrap());
/// assert_eq!(
///     Predicate::all_of(["a", "b"]).violation(),
///     "require all of '--a' '--b'"
/// );
/// ```
#[derive(Debug, Clone)]
pub enum Predicate {
    /// The option has a value.
    Present(String),
    /// The option has no value.
    Absent(String),
    /// Every listed option has a value.
    AllOf(Vec<String>),
    /// No listed option has a value.
    NoneOf(Vec<String>),
    /// At least one listed option has a value.
    AnyOf(Vec<String>),
    /// Exactly one listed option has a value.
    ExactlyOneOf(Vec<String>),
    /// A user callable over its declared dependencies.
    Custom(Callback<bool>),
}

impl Predicate {
    /// `Present(name)`.
    pub fn present(name: impl Into<String>) -> Self {
        Predicate::Present(name.into())
    }

    /// `Absent(name)`.
    pub fn absent(name: impl Into<String>) -> Self {
        Predicate::Absent(name.into())
    }

    /// `AllOf(names)`.
    pub fn all_of<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Predicate::AllOf(name_set(names))
    }

    /// `NoneOf(names)`.
    pub fn none_of<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Predicate::NoneOf(name_set(names))
    }

    /// `AnyOf(names)`.
    pub fn any_of<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Predicate::AnyOf(name_set(names))
    }

    /// `ExactlyOneOf(names)`.
    pub fn exactly_one_of<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Predicate::ExactlyOneOf(name_set(names))
    }

    /// `Custom(callable)`.
    pub fn custom(callback: Callback<bool>) -> Self {
        Predicate::Custom(callback)
    }

    /// Evaluates the predicate. Only custom predicates can fail.
    pub fn evaluate(&self, snapshot: &Snapshot) -> Result<bool, CallbackError> {
        let present = |names: &[String]| names.iter().filter(|n| snapshot.is_present(n)).count();

        Ok(match self {
            Predicate::Present(name) => snapshot.is_present(name),
            Predicate::Absent(name) => !snapshot.is_present(name),
            Predicate::AllOf(names) => present(names) == names.len(),
            Predicate::NoneOf(names) => present(names) == 0,
            Predicate::AnyOf(names) => present(names) > 0,
            Predicate::ExactlyOneOf(names) => present(names) == 1,
            Predicate::Custom(callback) => callback.call(snapshot)?,
        })
    }

    /// Message reported when this predicate rejects a supplied value.
    pub fn violation(&self) -> String {
        match self {
            Predicate::Present(name) => format!("require {}", quoted(name)),
            Predicate::Absent(name) => format!("conflict with {}", quoted(name)),
            Predicate::AllOf(names) => format!("require all of {}", quoted_list(names)),
            Predicate::NoneOf(names) => format!("conflict with {}", quoted_list(names)),
            Predicate::AnyOf(names) => {
                format!("require at least one of {}", quoted_list(names))
            }
            Predicate::ExactlyOneOf(names) => {
                format!("require exact one of {}", quoted_list(names))
            }
            Predicate::Custom(_) => "validation failed".to_string(),
        }
    }

    /// Option names this predicate reads.
    pub fn references(&self) -> &[String] {
        match self {
            Predicate::Present(name) | Predicate::Absent(name) => std::slice::from_ref(name),
            Predicate::AllOf(names)
            | Predicate::NoneOf(names)
            | Predicate::AnyOf(names)
            | Predicate::ExactlyOneOf(names) => names,
            Predicate::Custom(callback) => callback.dependencies(),
        }
    }
}

fn name_set<I, S>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut set: Vec<String> = Vec::new();
    for name in names {
        let name = name.into();
        if !set.contains(&name) {
            set.push(name);
        }
    }
    set
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Value;

    fn snapshot(present: &[&str]) -> Snapshot {
        ["a", "b", "c"]
            .into_iter()
            .map(|n| (n, present.contains(&n).then(|| Value::from("x"))))
            .collect()
    }

    #[test]
    fn test_exactly_one_of_zero_one_two() {
        let p = Predicate::exactly_one_of(["a", "b"]);
        assert!(!p.evaluate(&snapshot(&[])).unwrap());
        assert!(p.evaluate(&snapshot(&["a"])).unwrap());
        assert!(p.evaluate(&snapshot(&["b"])).unwrap());
        assert!(!p.evaluate(&snapshot(&["a", "b"])).unwrap());
    }

    #[test]
    fn test_set_predicates_are_monotone() {
        let all = Predicate::all_of(["a", "b"]);
        let any = Predicate::any_of(["a", "b"]);
        let none = Predicate::none_of(["a", "b"]);

        let steps = [snapshot(&[]), snapshot(&["a"]), snapshot(&["a", "b"])];
        let eval = |p: &Predicate| -> Vec<bool> {
            steps.iter().map(|s| p.evaluate(s).unwrap()).collect()
        };

        assert_eq!(eval(&all), vec![false, false, true]);
        assert_eq!(eval(&any), vec![false, true, true]);
        assert_eq!(eval(&none), vec![true, false, false]);
    }

    #[test]
    fn test_unrelated_options_do_not_matter() {
        let p = Predicate::none_of(["a", "b"]);
        assert!(p.evaluate(&snapshot(&["c"])).unwrap());
    }

    #[test]
    fn test_duplicate_operands_are_collapsed() {
        let p = Predicate::exactly_one_of(["a", "a", "b"]);
        assert_eq!(p.references(), ["a".to_string(), "b".to_string()]);
        assert!(p.evaluate(&snapshot(&["a"])).unwrap());
    }

    #[test]
    fn test_violation_messages() {
        assert_eq!(Predicate::present("a").violation(), "require '--a'");
        assert_eq!(Predicate::absent("a").violation(), "conflict with '--a'");
        assert_eq!(
            Predicate::none_of(["a", "b"]).violation(),
            "conflict with '--a' '--b'"
        );
        assert_eq!(
            Predicate::any_of(["a", "b"]).violation(),
            "require at least one of '--a' '--b'"
        );
        assert_eq!(
            Predicate::exactly_one_of(["a", "b"]).violation(),
            "require exact one of '--a' '--b'"
        );
        let custom = Predicate::custom(Callback::new(["a"], |_| true));
        assert_eq!(custom.violation(), "validation failed");
    }
}
