//! Environment variable error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum EnvError {
    #[error("invalid environment variable name {name:?}: {reason}")]
    InvalidName { name: String, reason: String },

    #[error("invalid value for environment variable {name}: {reason}")]
    InvalidValue { name: String, reason: String },

    #[error("cannot interpret {value:?} from {name} as a boolean")]
    InvalidBool { name: String, value: String },

    #[error("failed to restore {name}: {message}")]
    RestoreFailed { name: String, message: String },
}

impl UserFacingError for EnvError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::InvalidName { .. } => Some(
                "Environment variable names must be non-empty and contain no '=' or NUL bytes.",
            ),
            Self::InvalidValue { .. } => {
                Some("Environment variable values must not contain NUL bytes.")
            }
            Self::InvalidBool { .. } => {
                Some("Use one of 1/0, true/false, yes/no, on/off for boolean variables.")
            }
            Self::RestoreFailed { .. } => None,
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::InvalidName { .. } => "env.invalid_name",
            Self::InvalidValue { .. } => "env.invalid_value",
            Self::InvalidBool { .. } => "env.invalid_bool",
            Self::RestoreFailed { .. } => "env.restore_failed",
        };
        Some(code)
    }
}
