//! Helpers for reading and logging build environment variables

use std::collections::BTreeSet;

use tpb_errors::EnvError;
use tracing::info;

use crate::store::EnvStore;

const LOG_SEPARATOR: &str =
    "--------------------------------------------------------------------------------";

/// Interpret a string as a boolean flag
///
/// Accepts `1/0`, `true/false`, `yes/no`, `on/off`, `t/f` and `y/n` in any
/// case, ignoring surrounding whitespace. An empty string is false.
#[must_use]
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" | "t" | "y" => Some(true),
        "" | "0" | "false" | "no" | "off" | "f" | "n" => Some(false),
        _ => None,
    }
}

/// Read a boolean flag from the environment; unset means false
///
/// # Errors
///
/// Returns [`EnvError::InvalidBool`] if the variable is set to something
/// [`parse_bool`] does not understand.
pub fn get_bool_env_var<S: EnvStore + ?Sized>(store: &S, name: &str) -> Result<bool, EnvError> {
    let Some(value) = store.get(name) else {
        return Ok(false);
    };
    parse_bool(&value).ok_or(EnvError::InvalidBool {
        name: name.to_string(),
        value,
    })
}

/// `NAME=value`, or `NAME=None` when the variable is unset
#[must_use]
pub fn env_var_name_and_value<S: EnvStore + ?Sized>(store: &S, name: &str) -> String {
    match store.get(name) {
        Some(value) => format!("{name}={value}"),
        None => format!("{name}=None"),
    }
}

/// Log every variable in the environment, one per line
pub fn dump_env_vars_to_log<S: EnvStore + ?Sized>(store: &S, program_name: Option<&str>) {
    if let Some(program) = program_name {
        info!("{LOG_SEPARATOR}");
        info!("Environment of {program}:");
        info!("{LOG_SEPARATOR}");
    }
    for (name, value) in store.vars() {
        info!("{name}={value}");
    }
    info!("{LOG_SEPARATOR}");
}

/// Remove a variable that could interfere with a third-party build
///
/// Returns the value it had, if any.
///
/// # Errors
///
/// Propagates the store's error if the variable cannot be removed.
pub fn unset_env_var_if_set_and_log<S: EnvStore + ?Sized>(
    store: &mut S,
    name: &str,
) -> Result<Option<String>, EnvError> {
    let Some(previous) = store.get(name) else {
        return Ok(None);
    };
    info!("Unsetting {name} for third-party build (was set to \"{previous}\").");
    store.unset(name)?;
    Ok(Some(previous))
}

/// Colon-separated directory list from a variable; unset gives an empty list
#[must_use]
pub fn get_dir_list_from_env_var<S: EnvStore + ?Sized>(store: &S, name: &str) -> Vec<String> {
    store
        .get(name)
        .map(|value| value.split(':').map(str::to_string).collect())
        .unwrap_or_default()
}

/// Join directories with `:`, trimming each and skipping empty entries
///
/// Entries are trimmed before the emptiness check, so whitespace-only
/// entries are dropped too.
#[must_use]
pub fn join_dir_list<I, D>(dirs: I) -> String
where
    I: IntoIterator<Item = D>,
    D: AsRef<str>,
{
    dirs.into_iter()
        .map(|d| d.as_ref().trim().to_string())
        .filter(|d| !d.is_empty())
        .collect::<Vec<_>>()
        .join(":")
}

/// Whitespace-separated flag list from a variable; unset gives an empty list
#[must_use]
pub fn get_flag_list_from_env_var<S: EnvStore + ?Sized>(store: &S, name: &str) -> Vec<String> {
    store
        .get(name)
        .map(|value| value.split_whitespace().map(str::to_string).collect())
        .unwrap_or_default()
}

/// Set of whitespace-separated words, e.g. an allow-list written one per line
#[must_use]
pub fn split_into_word_set(text: &str) -> BTreeSet<String> {
    text.split_whitespace().map(str::to_string).collect()
}
