//! User-supplied callables and the dependency view they receive.

use std::fmt;
use std::sync::Arc;

use crate::{Snapshot, Value};

/// Error returned by a fallible user callable.
pub type CallbackError = Box<dyn std::error::Error + Send + Sync>;

type CallbackFn<T> = dyn Fn(&Dependencies<'_>) -> Result<T, CallbackError> + Send + Sync;

/// Read-only view of the snapshot restricted to declared dependencies.
///
/// A name that was not declared, or that has no resolved value, reads as
/// absent. A dependency does not need to be required itself.
#[derive(Clone, Copy)]
pub struct Dependencies<'a> {
    declared: &'a [String],
    snapshot: &'a Snapshot,
}

impl<'a> Dependencies<'a> {
    pub(crate) fn new(declared: &'a [String], snapshot: &'a Snapshot) -> Self {
        Self { declared, snapshot }
    }

    /// Resolved value of a declared dependency.
    pub fn get(&self, name: &str) -> Option<&'a Value> {
        if self.declared.iter().any(|d| d == name) {
            self.snapshot.get(name)
        } else {
            None
        }
    }

    /// Text value of a declared dependency.
    pub fn text(&self, name: &str) -> Option<&'a str> {
        self.get(name).and_then(Value::as_str)
    }

    /// Returns `true` if a declared dependency has a value.
    pub fn is_present(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
}

/// A user callable with an explicit dependency list.
///
/// Used for custom predicates (`Callback<bool>`), default producers
/// (`Callback<Option<Value>>`) and type selectors (`Callback<ValueType>`).
///
/// # Examples
///
/// ```
/// use constrained_option_core::{Callback, Snapshot, Value};
///
/// let is_zero = Callback::new(["a"], |deps| deps.text("a") == Some("0"));
///
/// let mut snapshot = Snapshot::new();
/// snapshot.set("a", Some(Value::from("0")));
/// assert!(is_zero.call(&snapshot).unwrap());
/// ```
pub struct Callback<T> {
    dependencies: Vec<String>,
    func: Arc<CallbackFn<T>>,
}

impl<T: 'static> Callback<T> {
    /// Wraps an infallible function.
    pub fn new<I, S, F>(dependencies: I, func: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(&Dependencies<'_>) -> T + Send + Sync + 'static,
    {
        Self::fallible(dependencies, move |deps| Ok(func(deps)))
    }

    /// Wraps a function that can fail; its error surfaces as an engine fault.
    pub fn fallible<I, S, F>(dependencies: I, func: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(&Dependencies<'_>) -> Result<T, CallbackError> + Send + Sync + 'static,
    {
        Self {
            dependencies: dependencies.into_iter().map(Into::into).collect(),
            func: Arc::new(func),
        }
    }

    /// Declared dependency names.
    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    /// Invokes the callable against a snapshot.
    pub fn call(&self, snapshot: &Snapshot) -> Result<T, CallbackError> {
        (self.func)(&Dependencies::new(&self.dependencies, snapshot))
    }
}

impl<T> Clone for Callback<T> {
    fn clone(&self) -> Self {
        Self {
            dependencies: self.dependencies.clone(),
            func: Arc::clone(&self.func),
        }
    }
}

impl<T> fmt::Debug for Callback<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callback")
            .field("dependencies", &self.dependencies)
            .finish_non_exhaustive()
    }
}
