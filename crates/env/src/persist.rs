//! Saving a subset of the build environment as a shell script
//!
//! The script lands next to a dependency's build directory so a failed build
//! can be reproduced by sourcing it.

use std::collections::BTreeSet;
use std::path::Path;

use tpb_errors::Error;
use tracing::debug;

use crate::helpers::split_into_word_set;
use crate::store::EnvStore;

/// Variables always worth saving for a build
pub const ENV_VARS_TO_SAVE: &str = "
    ASAN_OPTIONS
    CC
    CFLAGS
    CPPFLAGS
    CXX
    CXXFLAGS
    LANG
    LDFLAGS
    PATH
    PYTHONPATH
    NM
    AR
    LD
    AS
";

/// Variables set by enabling a devtoolset / software collection
pub const DEVTOOLSET_ENV_VARS: &str = "
    INFOPATH
    LD_LIBRARY_PATH
    MANPATH
    PCP_DIR
    PERLLIB
    PERL5LIB
    PKG_CONFIG_PATH
    PYTHONPATH
    X_SCLS
";

/// Default prefix of toolkit-owned variables that are always saved
pub const DEFAULT_SAVE_PREFIX: &str = "TPB_";

/// Which variables end up in the saved script
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvSaveFilter {
    names: BTreeSet<String>,
    prefix: Option<String>,
}

impl EnvSaveFilter {
    /// Filter with an explicit allow-list and no prefix
    #[must_use]
    pub fn new<I, N>(names: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
            prefix: None,
        }
    }

    /// Also save every variable whose name starts with `prefix`
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        self.prefix = (!prefix.is_empty()).then_some(prefix);
        self
    }

    /// Add more names to the allow-list
    #[must_use]
    pub fn with_names<I, N>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<String>,
    {
        self.names.extend(names.into_iter().map(Into::into));
        self
    }

    /// Whether `name` should be saved
    #[must_use]
    pub fn matches(&self, name: &str) -> bool {
        self.names.contains(name)
            || self
                .prefix
                .as_deref()
                .is_some_and(|prefix| name.starts_with(prefix))
    }
}

impl Default for EnvSaveFilter {
    fn default() -> Self {
        Self::new(split_into_word_set(ENV_VARS_TO_SAVE))
            .with_names(split_into_word_set(DEVTOOLSET_ENV_VARS))
            .with_prefix(DEFAULT_SAVE_PREFIX)
    }
}

/// Quote `value` so a POSIX shell reads it back unchanged
#[must_use]
pub fn shell_quote(value: &str) -> String {
    if value.is_empty() {
        return "''".to_string();
    }
    let is_safe = |c: char| c.is_ascii_alphanumeric() || "_@%+=:,./-".contains(c);
    if value.chars().all(is_safe) {
        return value.to_string();
    }
    format!("'{}'", value.replace('\'', r#"'"'"'"#))
}

/// One `export NAME=value` line per matching variable, sorted by name
#[must_use]
pub fn render_env_script<S: EnvStore + ?Sized>(store: &S, filter: &EnvSaveFilter) -> String {
    let mut vars = store.vars();
    vars.sort();
    vars.into_iter()
        .filter(|(name, _)| filter.matches(name))
        .map(|(name, value)| format!("export {name}={}\n", shell_quote(&value)))
        .collect()
}

/// Write the matching variables to `path` as a shell script
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn write_env_vars<S: EnvStore + ?Sized>(
    store: &S,
    filter: &EnvSaveFilter,
    path: &Path,
) -> Result<(), Error> {
    let script = render_env_script(store, filter);
    std::fs::write(path, &script).map_err(|e| Error::io_with_path(&e, path))?;
    debug!(
        path = %path.display(),
        count = script.lines().count(),
        "saved build environment"
    );
    Ok(())
}
