//! Group constraints over sets of options.
//!
//! Groups are declared on the command schema rather than on any single
//! option and are checked once, after every option has been resolved.

use std::fmt;

use thiserror::Error;

use crate::Snapshot;
use crate::types::quoted_list;

/// Cardinality rule of a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupRule {
    /// Every member must be present.
    RequireAll,
    /// At least one member must be present.
    RequireAny,
    /// Exactly one member must be present.
    RequireOne,
}

impl GroupRule {
    fn phrase(self) -> &'static str {
        match self {
            GroupRule::RequireAll => "require all of",
            GroupRule::RequireAny => "require at least one of",
            GroupRule::RequireOne => "require exact one of",
        }
    }
}

/// Identifier of a registered group, unique within one schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupId(usize);

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A named set of options under one cardinality rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    /// Registrar-assigned id.
    pub id: GroupId,
    /// Cardinality rule.
    pub rule: GroupRule,
    /// Member option names in declaration order.
    pub members: Vec<String>,
}

impl Group {
    /// Checks the rule against a fully resolved snapshot.
    pub fn check(&self, snapshot: &Snapshot) -> Result<(), GroupError> {
        let (present, missing): (Vec<&String>, Vec<&String>) = self
            .members
            .iter()
            .partition(|m| snapshot.is_present(m));

        let (ok, offending) = match self.rule {
            GroupRule::RequireAll => (missing.is_empty(), missing),
            GroupRule::RequireAny => (!present.is_empty(), self.members.iter().collect()),
            GroupRule::RequireOne => {
                let ok = present.len() == 1;
                let offending = if present.is_empty() {
                    self.members.iter().collect()
                } else {
                    present
                };
                (ok, offending)
            }
        };

        if ok {
            return Ok(());
        }
        Err(GroupError {
            group: self.id,
            rule: self.rule,
            members: self.members.clone(),
            offending: offending.into_iter().cloned().collect(),
        })
    }
}

/// A group rule failed after resolution.
///
/// Displays as the rule phrase followed by every member, for example
/// `require exact one of '--a' '--b'`. `offending` names the members that
/// caused the failure: the missing ones for `RequireAll`, the present ones
/// when `RequireOne` saw more than one, all members otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{} {}", .rule.phrase(), quoted_list(.members))]
pub struct GroupError {
    /// Failing group.
    pub group: GroupId,
    /// Its rule.
    pub rule: GroupRule,
    /// All members in declaration order.
    pub members: Vec<String>,
    /// Members responsible for the failure.
    pub offending: Vec<String>,
}

/// Schema-scoped table of group constraints.
///
/// # Examples
///
/// ```
/// use constrained_option_core::{GroupRegistrar, GroupRule, Snapshot, Value};
///
/// let mut groups = GroupRegistrar::new();
/// groups.register(GroupRule::RequireOne, ["a", "b"]);
///
/// let mut snapshot = Snapshot::new();
/// snapshot.set("a", Some(Value::from("0")));
/// snapshot.set("b", Some(Value::from("1")));
///
/// let err = groups.check(&snapshot).unwrap_err();
/// assert_eq!(err.to_string(), "require exact one of '--a' '--b'");
/// ```
#[derive(Debug, Clone, Default)]
pub struct GroupRegistrar {
    groups: Vec<Group>,
}

impl GroupRegistrar {
    /// Creates an empty registrar.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a group and returns its id. Duplicate members collapse.
    pub fn register<I, S>(&mut self, rule: GroupRule, members: I) -> GroupId
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let id = GroupId(self.groups.len());
        let mut names: Vec<String> = Vec::new();
        for member in members {
            let member = member.into();
            if !names.contains(&member) {
                names.push(member);
            }
        }
        self.groups.push(Group {
            id,
            rule,
            members: names,
        });
        id
    }

    /// Looks up a group.
    pub fn get(&self, id: GroupId) -> Option<&Group> {
        self.groups.get(id.0)
    }

    /// All groups in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Group> {
        self.groups.iter()
    }

    /// Number of registered groups.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Returns `true` if no group is registered.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Checks every group in registration order, stopping at the first failure.
    pub fn check(&self, snapshot: &Snapshot) -> Result<(), GroupError> {
        self.groups.iter().try_for_each(|g| g.check(snapshot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Value;

    fn snapshot(present: &[&str]) -> Snapshot {
        ["a", "b"]
            .into_iter()
            .map(|n| (n, present.contains(&n).then(|| Value::from("1"))))
            .collect()
    }

    fn group(rule: GroupRule) -> GroupRegistrar {
        let mut groups = GroupRegistrar::new();
        groups.register(rule, ["a", "b"]);
        groups
    }

    #[test]
    fn test_require_one() {
        let groups = group(GroupRule::RequireOne);
        assert!(groups.check(&snapshot(&["a"])).is_ok());

        let err = groups.check(&snapshot(&["a", "b"])).unwrap_err();
        assert_eq!(err.to_string(), "require exact one of '--a' '--b'");
        assert_eq!(err.offending, vec!["a", "b"]);

        assert!(groups.check(&snapshot(&[])).is_err());
    }

    #[test]
    fn test_require_any() {
        let groups = group(GroupRule::RequireAny);
        assert!(groups.check(&snapshot(&["b"])).is_ok());

        let err = groups.check(&snapshot(&[])).unwrap_err();
        assert_eq!(err.to_string(), "require at least one of '--a' '--b'");
    }

    #[test]
    fn test_require_all_reports_missing_members() {
        let groups = group(GroupRule::RequireAll);
        assert!(groups.check(&snapshot(&["a", "b"])).is_ok());

        let err = groups.check(&snapshot(&["a"])).unwrap_err();
        assert_eq!(err.to_string(), "require all of '--a' '--b'");
        assert_eq!(err.offending, vec!["b"]);
    }

    #[test]
    fn test_registrar_lookup() {
        let mut groups = GroupRegistrar::new();
        let first = groups.register(GroupRule::RequireAll, ["a", "b", "a"]);
        let second = groups.register(GroupRule::RequireAny, ["b", "c"]);

        assert_eq!(groups.get(first).unwrap().members, vec!["a", "b"]);
        assert_eq!(groups.get(second).unwrap().rule, GroupRule::RequireAny);
        assert_eq!(groups.iter().map(|g| g.id).collect::<Vec<_>>(), vec![first, second]);
        assert_eq!(groups.len(), 2);
    }
}
