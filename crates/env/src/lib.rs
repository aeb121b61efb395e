#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Build environment handling for tpb
//!
//! Third-party builds are driven largely through environment variables
//! (`CC`, `CXXFLAGS`, `PKG_CONFIG_PATH`, ...). This crate provides:
//! - an [`EnvStore`] abstraction over the process environment, with an
//!   in-memory implementation for tests
//! - [`EnvOverrides`] / [`EnvVarGuard`] for temporary, self-restoring
//!   changes to the environment
//! - helpers for reading list and flag variables and for logging them
//! - [`write_env_vars`] to save the interesting part of a build's
//!   environment as a sourceable shell script

mod helpers;
mod overrides;
mod persist;
mod store;

pub use helpers::{
    dump_env_vars_to_log, env_var_name_and_value, get_bool_env_var, get_dir_list_from_env_var,
    get_flag_list_from_env_var, join_dir_list, parse_bool, split_into_word_set,
    unset_env_var_if_set_and_log,
};
pub use overrides::{with_env_vars, EnvOverrides, EnvVarGuard};
pub use persist::{
    render_env_script, shell_quote, write_env_vars, EnvSaveFilter, DEFAULT_SAVE_PREFIX,
    DEVTOOLSET_ENV_VARS, ENV_VARS_TO_SAVE,
};
pub use store::{
    set_or_unset, set_or_unset_os, validate_name, validate_value, EnvStore, MemoryEnv, ProcessEnv,
};
