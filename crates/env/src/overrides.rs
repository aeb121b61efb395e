//! Scoped environment variable overrides
//!
//! [`EnvOverrides`] describes a set of assignments and removals. Applying it
//! to a store returns an [`EnvVarGuard`] that puts every touched variable
//! back the way it was when the guard goes away, whether the scope ends
//! normally, through `?`, or by unwinding.
//!
//! ```
//! use tpb_env::{EnvOverrides, EnvStore, MemoryEnv};
//!
//! let mut env = MemoryEnv::new().with("CC", "gcc");
//! {
//!     let guard = EnvOverrides::new()
//!         .set("CC", "clang")
//!         .unset("CFLAGS")
//!         .apply(&mut env)
//!         .unwrap();
//!     assert_eq!(guard.get("CC").as_deref(), Some("clang"));
//! }
//! assert_eq!(env.get("CC").as_deref(), Some("gcc"));
//! ```

use std::collections::{BTreeMap, HashMap};
use std::ffi::{OsStr, OsString};
use std::hash::BuildHasher;

use tpb_errors::EnvError;
use tracing::{debug, trace, warn};

use crate::store::{set_or_unset, set_or_unset_os, EnvStore, ProcessEnv};

/// Variable assignments to apply for the lifetime of a scope
///
/// A `None` value means the variable is removed while the scope is active.
/// Building an override set never touches the environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvOverrides {
    vars: BTreeMap<String, Option<String>>,
}

impl EnvOverrides {
    /// Create an empty override set
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy overrides out of an existing mapping
    ///
    /// The mapping is copied, so changing it afterwards has no effect on
    /// the returned set.
    #[must_use]
    pub fn from_map<K, V, H>(mapping: &HashMap<K, Option<V>, H>) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
        H: BuildHasher,
    {
        Self {
            vars: mapping
                .iter()
                .map(|(k, v)| {
                    (
                        k.as_ref().to_string(),
                        v.as_ref().map(|v| v.as_ref().to_string()),
                    )
                })
                .collect(),
        }
    }

    /// Set `name` to `value` while the scope is active
    #[must_use]
    pub fn set(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(name.into(), Some(value.into()));
        self
    }

    /// Remove `name` while the scope is active
    #[must_use]
    pub fn unset(mut self, name: impl Into<String>) -> Self {
        self.vars.insert(name.into(), None);
        self
    }

    /// Merge individually named overrides on top of this set
    ///
    /// Named entries win over existing entries with the same name.
    #[must_use]
    pub fn merge_named<I, K, V>(mut self, named: I) -> Self
    where
        I: IntoIterator<Item = (K, Option<V>)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (name, value) in named {
            self.vars.insert(name.into(), value.map(Into::into));
        }
        self
    }

    /// The override for `name`: `None` if untouched, `Some(None)` if removed
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Option<&str>> {
        self.vars.get(name).map(Option::as_deref)
    }

    /// Iterate over the overrides in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_deref()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Apply the overrides to `store` and return the guard that undoes them
    ///
    /// The previous value of each variable is captured just before it is
    /// overwritten, as a raw value so that non-Unicode values come back
    /// intact. If the store rejects one of the overrides, those already
    /// applied are rolled back before the error is returned.
    ///
    /// # Errors
    ///
    /// Returns the store's error for the first override it rejects.
    pub fn apply<S: EnvStore>(&self, mut store: S) -> Result<EnvVarGuard<S>, EnvError> {
        let mut saved = Vec::with_capacity(self.vars.len());

        for (name, value) in &self.vars {
            let previous = store.get_os(name);
            if let Err(err) = set_or_unset(&mut store, name, value.as_deref()) {
                warn!(name = %name, error = %err, "environment override rejected, rolling back");
                restore_saved(&mut store, &mut saved);
                return Err(err);
            }
            debug!(name = %name, value = ?value, previous = ?previous, "environment override applied");
            saved.push((name.clone(), previous));
        }

        Ok(EnvVarGuard { store, saved })
    }

    /// Apply the overrides to the process environment
    ///
    /// # Errors
    ///
    /// Returns an error if a name or value cannot be stored in the process
    /// environment.
    pub fn apply_process(&self) -> Result<EnvVarGuard<ProcessEnv>, EnvError> {
        self.apply(ProcessEnv)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, Option<V>)> for EnvOverrides {
    fn from_iter<I: IntoIterator<Item = (K, Option<V>)>>(iter: I) -> Self {
        Self::new().merge_named(iter)
    }
}

/// Restores the variables touched by an [`EnvOverrides`] when dropped
///
/// The guard is itself an [`EnvStore`] that reads and writes through to the
/// underlying store, so a nested scope is opened by applying another
/// override set to `&mut guard`. Restoration happens exactly once, either
/// in [`EnvVarGuard::restore`] or on drop.
#[must_use = "dropping the guard immediately restores the environment"]
#[derive(Debug)]
pub struct EnvVarGuard<S: EnvStore> {
    store: S,
    saved: Vec<(String, Option<OsString>)>,
}

impl<S: EnvStore> EnvVarGuard<S> {
    /// Values the touched variables had before the overrides were applied
    pub fn saved(&self) -> impl Iterator<Item = (&str, Option<&OsStr>)> {
        self.saved.iter().map(|(k, v)| (k.as_str(), v.as_deref()))
    }

    /// Restore the saved values now instead of on drop
    ///
    /// Every saved variable is restored even if one of them fails.
    ///
    /// # Errors
    ///
    /// Returns the first error reported by the store.
    pub fn restore(mut self) -> Result<(), EnvError> {
        match restore_saved(&mut self.store, &mut self.saved) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl<S: EnvStore> EnvStore for EnvVarGuard<S> {
    fn get(&self, name: &str) -> Option<String> {
        self.store.get(name)
    }

    fn set(&mut self, name: &str, value: &str) -> Result<(), EnvError> {
        self.store.set(name, value)
    }

    fn unset(&mut self, name: &str) -> Result<(), EnvError> {
        self.store.unset(name)
    }

    fn vars(&self) -> Vec<(String, String)> {
        self.store.vars()
    }

    fn get_os(&self, name: &str) -> Option<OsString> {
        self.store.get_os(name)
    }

    fn set_os(&mut self, name: &str, value: &OsStr) -> Result<(), EnvError> {
        self.store.set_os(name, value)
    }
}

impl<S: EnvStore> Drop for EnvVarGuard<S> {
    fn drop(&mut self) {
        if let Some(err) = restore_saved(&mut self.store, &mut self.saved) {
            warn!(error = %err, "failed to restore environment on scope exit");
        }
    }
}

/// Put back saved values in reverse order of application, draining `saved`
fn restore_saved<S: EnvStore + ?Sized>(
    store: &mut S,
    saved: &mut Vec<(String, Option<OsString>)>,
) -> Option<EnvError> {
    let mut first_error = None;
    while let Some((name, value)) = saved.pop() {
        trace!(name = %name, value = ?value, "restoring environment variable");
        if let Err(err) = set_or_unset_os(store, &name, value.as_deref()) {
            first_error.get_or_insert(EnvError::RestoreFailed {
                name,
                message: err.to_string(),
            });
        }
    }
    first_error
}

/// Run `f` with `overrides` applied to `store`, restoring afterwards
///
/// # Errors
///
/// Returns an error if the overrides cannot be applied or restored. The
/// closure's own result is returned inside `Ok`.
pub fn with_env_vars<S, T, F>(store: S, overrides: &EnvOverrides, f: F) -> Result<T, EnvError>
where
    S: EnvStore,
    F: FnOnce(&mut EnvVarGuard<S>) -> T,
{
    let mut guard = overrides.apply(store)?;
    let value = f(&mut guard);
    guard.restore()?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryEnv;

    #[test]
    fn test_construct_is_lazy() {
        let env = MemoryEnv::new().with("V", "before");
        let overrides = EnvOverrides::new().set("V", "after").unset("W");
        assert_eq!(overrides.len(), 2);
        assert_eq!(env.get("V").as_deref(), Some("before"));
    }

    #[test]
    fn test_enter_and_exit() {
        let mut env = MemoryEnv::new().with("KEEP", "k").with("GONE", "g");
        let before = env.clone();

        {
            let guard = EnvOverrides::new()
                .set("NEW", "n")
                .unset("GONE")
                .apply(&mut env)
                .unwrap();
            assert_eq!(guard.get("NEW").as_deref(), Some("n"));
            assert!(!guard.contains("GONE"));
            assert_eq!(guard.get("KEEP").as_deref(), Some("k"));
        }

        assert_eq!(env, before);
    }

    #[test]
    fn test_saved_state_records_absence() {
        let mut env = MemoryEnv::new().with("A", "1");
        let guard = EnvOverrides::new()
            .set("A", "2")
            .set("B", "3")
            .apply(&mut env)
            .unwrap();
        let saved: Vec<_> = guard.saved().collect();
        assert_eq!(saved, [("A", Some(OsStr::new("1"))), ("B", None)]);
    }

    #[test]
    fn test_named_precedence() {
        let mut mapping = HashMap::new();
        mapping.insert("X".to_string(), Some("1".to_string()));
        mapping.insert("Y".to_string(), Some("y".to_string()));

        let overrides = EnvOverrides::from_map(&mapping).merge_named([("X", Some("2"))]);
        assert_eq!(overrides.get("X"), Some(Some("2")));
        assert_eq!(overrides.get("Y"), Some(Some("y")));

        let mut env = MemoryEnv::new();
        let guard = overrides.apply(&mut env).unwrap();
        assert_eq!(guard.get("X").as_deref(), Some("2"));
    }

    #[test]
    fn test_mapping_is_copied() {
        let mut mapping: HashMap<&str, Option<&str>> = HashMap::new();
        mapping.insert("COPIED", Some("original"));
        let overrides = EnvOverrides::from_map(&mapping);

        mapping.insert("COPIED", Some("changed"));
        mapping.insert("LATE", Some("late"));

        let mut env = MemoryEnv::new();
        let guard = overrides.apply(&mut env).unwrap();
        assert_eq!(guard.get("COPIED").as_deref(), Some("original"));
        assert!(!guard.contains("LATE"));
    }

    #[test]
    fn test_nested_scopes() {
        let mut env = MemoryEnv::new();
        {
            let mut outer = EnvOverrides::new().set("V", "a").apply(&mut env).unwrap();
            {
                let inner = EnvOverrides::new().set("V", "b").apply(&mut outer).unwrap();
                assert_eq!(inner.get("V").as_deref(), Some("b"));
            }
            assert_eq!(outer.get("V").as_deref(), Some("a"));
        }
        assert!(!env.contains("V"));
    }

    #[test]
    fn test_explicit_restore_runs_once() {
        let mut env = MemoryEnv::new().with("V", "orig");
        let mut guard = EnvOverrides::new().set("V", "tmp").apply(&mut env).unwrap();
        // A write made inside the scope to an untouched variable survives exit
        guard.set("OTHER", "kept").unwrap();
        guard.restore().unwrap();
        assert_eq!(env.get("V").as_deref(), Some("orig"));
        assert_eq!(env.get("OTHER").as_deref(), Some("kept"));
    }

    #[test]
    fn test_rollback_on_rejected_override() {
        let mut env = MemoryEnv::new().with("A_FIRST", "orig");
        // Overrides apply in name order, so A_FIRST is set before the bad name
        let overrides = EnvOverrides::new()
            .set("A_FIRST", "changed")
            .set("B=BAD", "x")
            .set("C_LAST", "never");

        let err = overrides.apply(&mut env).unwrap_err();
        assert!(matches!(err, EnvError::InvalidName { .. }));
        assert_eq!(env.get("A_FIRST").as_deref(), Some("orig"));
        assert!(!env.contains("C_LAST"));
    }

    #[test]
    fn test_with_env_vars() {
        let mut env = MemoryEnv::new();
        let overrides = EnvOverrides::new().set("CC", "clang");
        let seen = with_env_vars(&mut env, &overrides, |scoped| scoped.get("CC")).unwrap();
        assert_eq!(seen.as_deref(), Some("clang"));
        assert!(!env.contains("CC"));
    }

    #[test]
    fn test_restores_on_early_return() {
        fn failing_step(env: &mut MemoryEnv) -> Result<(), EnvError> {
            let mut guard = EnvOverrides::new().set("STEP", "running").apply(env)?;
            guard.set("STEP=", "boom")?;
            Ok(())
        }

        let mut env = MemoryEnv::new();
        assert!(failing_step(&mut env).is_err());
        assert!(!env.contains("STEP"));
    }

    #[test]
    fn test_restores_on_panic() {
        let mut env = MemoryEnv::new().with("P", "before");
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = EnvOverrides::new().unset("P").apply(&mut env).unwrap();
            panic!("build step blew up");
        }));
        assert!(result.is_err());
        assert_eq!(env.get("P").as_deref(), Some("before"));
    }
}
