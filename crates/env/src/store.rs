//! Environment variable stores
//!
//! Everything in this crate reads and writes variables through [`EnvStore`]
//! so the same code can run against the real process environment
//! ([`ProcessEnv`]) or an in-memory map ([`MemoryEnv`]).

use std::collections::BTreeMap;
use std::ffi::{OsStr, OsString};

use tpb_errors::EnvError;

/// A mutable name to value mapping where absence is a distinct state
pub trait EnvStore {
    /// Current value of `name`, or `None` if the variable is not set
    fn get(&self, name: &str) -> Option<String>;

    /// Set `name` to `value`
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot represent the name or value.
    fn set(&mut self, name: &str, value: &str) -> Result<(), EnvError>;

    /// Remove `name`; removing an unset variable is a no-op
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot represent the name.
    fn unset(&mut self, name: &str) -> Result<(), EnvError>;

    /// All variables currently set, sorted by name
    fn vars(&self) -> Vec<(String, String)>;

    /// Whether `name` is currently set
    fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Raw value of `name`, including values that are not valid Unicode
    ///
    /// Saving and restoring go through this pair so a value survives a
    /// scope even when [`EnvStore::get`] cannot represent it.
    fn get_os(&self, name: &str) -> Option<OsString> {
        self.get(name).map(OsString::from)
    }

    /// Set `name` to a raw value
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot represent the name or value.
    /// The default rejects values that are not valid Unicode.
    fn set_os(&mut self, name: &str, value: &OsStr) -> Result<(), EnvError> {
        let value = value.to_str().ok_or_else(|| EnvError::InvalidValue {
            name: name.to_string(),
            reason: "value is not valid Unicode".to_string(),
        })?;
        self.set(name, value)
    }
}

impl<T: EnvStore + ?Sized> EnvStore for &mut T {
    fn get(&self, name: &str) -> Option<String> {
        (**self).get(name)
    }

    fn set(&mut self, name: &str, value: &str) -> Result<(), EnvError> {
        (**self).set(name, value)
    }

    fn unset(&mut self, name: &str) -> Result<(), EnvError> {
        (**self).unset(name)
    }

    fn vars(&self) -> Vec<(String, String)> {
        (**self).vars()
    }

    fn get_os(&self, name: &str) -> Option<OsString> {
        (**self).get_os(name)
    }

    fn set_os(&mut self, name: &str, value: &OsStr) -> Result<(), EnvError> {
        (**self).set_os(name, value)
    }
}

/// Set `name` to `value`, or remove it when `value` is `None`
///
/// # Errors
///
/// Propagates the store's error unchanged.
pub fn set_or_unset<S: EnvStore + ?Sized>(
    store: &mut S,
    name: &str,
    value: Option<&str>,
) -> Result<(), EnvError> {
    match value {
        Some(value) => store.set(name, value),
        None => store.unset(name),
    }
}

/// Raw-value form of [`set_or_unset`]
///
/// # Errors
///
/// Propagates the store's error unchanged.
pub fn set_or_unset_os<S: EnvStore + ?Sized>(
    store: &mut S,
    name: &str,
    value: Option<&OsStr>,
) -> Result<(), EnvError> {
    match value {
        Some(value) => store.set_os(name, value),
        None => store.unset(name),
    }
}

/// Check a variable name against what the OS environment accepts
///
/// # Errors
///
/// Returns [`EnvError::InvalidName`] for empty names and names containing
/// `=` or NUL.
pub fn validate_name(name: &str) -> Result<(), EnvError> {
    let reason = if name.is_empty() {
        "name is empty"
    } else if name.contains('=') {
        "name contains '='"
    } else if name.contains('\0') {
        "name contains a NUL byte"
    } else {
        return Ok(());
    };
    Err(EnvError::InvalidName {
        name: name.to_string(),
        reason: reason.to_string(),
    })
}

/// Check a variable value against what the OS environment accepts
///
/// # Errors
///
/// Returns [`EnvError::InvalidValue`] for values containing NUL.
pub fn validate_value(name: &str, value: &str) -> Result<(), EnvError> {
    if value.contains('\0') {
        return Err(EnvError::InvalidValue {
            name: name.to_string(),
            reason: "value contains a NUL byte".to_string(),
        });
    }
    Ok(())
}

/// The real process environment
///
/// Names and values are validated before they reach `std::env`, which
/// would otherwise panic on them. Variables whose value is not valid
/// Unicode read as unset through `get` and `vars`; `get_os` and `set_os`
/// see them as they are.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvStore for ProcessEnv {
    fn get(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }

    fn set(&mut self, name: &str, value: &str) -> Result<(), EnvError> {
        validate_name(name)?;
        validate_value(name, value)?;
        std::env::set_var(name, value);
        Ok(())
    }

    fn unset(&mut self, name: &str) -> Result<(), EnvError> {
        validate_name(name)?;
        std::env::remove_var(name);
        Ok(())
    }

    fn get_os(&self, name: &str) -> Option<OsString> {
        std::env::var_os(name)
    }

    fn set_os(&mut self, name: &str, value: &OsStr) -> Result<(), EnvError> {
        validate_name(name)?;
        if value.as_encoded_bytes().contains(&0) {
            return Err(EnvError::InvalidValue {
                name: name.to_string(),
                reason: "value contains a NUL byte".to_string(),
            });
        }
        std::env::set_var(name, value);
        Ok(())
    }

    fn vars(&self) -> Vec<(String, String)> {
        let mut vars: Vec<(String, String)> = std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .collect();
        vars.sort();
        vars
    }
}

/// In-memory environment, validated like [`ProcessEnv`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryEnv {
    vars: BTreeMap<String, String>,
}

impl MemoryEnv {
    /// Create an empty environment
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the current process environment
    #[must_use]
    pub fn from_process() -> Self {
        ProcessEnv.vars().into_iter().collect()
    }

    /// Add a variable, builder style
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }

    /// Number of variables set
    #[must_use]
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    /// Whether no variables are set
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MemoryEnv {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl EnvStore for MemoryEnv {
    fn get(&self, name: &str) -> Option<String> {
        self.vars.get(name).cloned()
    }

    fn set(&mut self, name: &str, value: &str) -> Result<(), EnvError> {
        validate_name(name)?;
        validate_value(name, value)?;
        self.vars.insert(name.to_string(), value.to_string());
        Ok(())
    }

    fn unset(&mut self, name: &str) -> Result<(), EnvError> {
        validate_name(name)?;
        self.vars.remove(name);
        Ok(())
    }

    fn vars(&self) -> Vec<(String, String)> {
        self.vars
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_or_unset() {
        let mut env = MemoryEnv::new().with("A", "1");

        set_or_unset(&mut env, "B", Some("2")).unwrap();
        assert_eq!(env.get("B").as_deref(), Some("2"));

        set_or_unset(&mut env, "A", None).unwrap();
        assert!(!env.contains("A"));

        // Removing something that is not there is fine
        set_or_unset(&mut env, "A", None).unwrap();
        assert_eq!(env.len(), 1);
    }

    #[test]
    fn test_rejects_invalid_names() {
        let mut env = MemoryEnv::new();
        for bad in ["", "A=B", "A\0B"] {
            let err = env.set(bad, "x").unwrap_err();
            assert!(matches!(err, EnvError::InvalidName { .. }), "{bad:?}");
        }
        assert!(matches!(
            env.unset("X=Y").unwrap_err(),
            EnvError::InvalidName { .. }
        ));
        assert!(env.is_empty());
    }

    #[test]
    fn test_rejects_nul_in_value() {
        let mut env = MemoryEnv::new();
        let err = env.set("A", "x\0y").unwrap_err();
        assert_eq!(
            err,
            EnvError::InvalidValue {
                name: "A".to_string(),
                reason: "value contains a NUL byte".to_string(),
            }
        );
    }

    #[test]
    fn test_vars_are_sorted() {
        let env: MemoryEnv = [("ZED", "z"), ("ALPHA", "a"), ("MID", "m")]
            .into_iter()
            .collect();
        let names: Vec<String> = env.vars().into_iter().map(|(k, _)| k).collect();
        assert_eq!(names, ["ALPHA", "MID", "ZED"]);
    }

    #[test]
    fn test_process_env_rejects_before_touching_std() {
        let mut env = ProcessEnv;
        // std::env::set_var would panic on this name
        assert!(env.set("TPB_BAD=NAME", "1").is_err());
        assert!(env.set("TPB_STORE_NUL_VALUE", "a\0b").is_err());
        assert!(env.get("TPB_STORE_NUL_VALUE").is_none());
    }

    #[test]
    fn test_default_set_os_needs_unicode() {
        let mut env = MemoryEnv::new();
        env.set_os("A", OsStr::new("plain")).unwrap();
        assert_eq!(env.get_os("A"), Some(OsString::from("plain")));

        set_or_unset_os(&mut env, "A", None).unwrap();
        assert!(!env.contains("A"));
    }

    #[cfg(unix)]
    #[test]
    fn test_process_env_keeps_raw_bytes() {
        use std::os::unix::ffi::OsStrExt;

        let raw = OsStr::from_bytes(b"caf\xe9");
        let mut env = ProcessEnv;
        env.set_os("TPB_STORE_RAW_VALUE", raw).unwrap();
        assert_eq!(env.get("TPB_STORE_RAW_VALUE"), None);
        assert_eq!(env.get_os("TPB_STORE_RAW_VALUE").as_deref(), Some(raw));
        assert!(env
            .set_os("TPB_STORE_RAW_VALUE", OsStr::from_bytes(b"a\0b"))
            .is_err());
        env.unset("TPB_STORE_RAW_VALUE").unwrap();

        let err = MemoryEnv::new().set_os("A", raw).unwrap_err();
        assert!(matches!(err, EnvError::InvalidValue { .. }));
    }

    #[test]
    fn test_mut_ref_is_a_store() {
        fn touch<S: EnvStore>(mut store: S) {
            store.set("TOUCHED", "yes").unwrap();
        }
        let mut env = MemoryEnv::new();
        touch(&mut env);
        assert_eq!(env.get("TOUCHED").as_deref(), Some("yes"));
    }
}
