//! Dependency build error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum BuildError {
    #[error("build failed: {message}")]
    Failed { message: String },

    #[error("invalid URL: {url}")]
    InvalidUrl { url: String },

    #[error("unknown dependency: {name}")]
    UnknownDependency { name: String },
}

impl UserFacingError for BuildError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::InvalidUrl { .. } => {
                Some("Correct the URL pattern in the dependency definition.")
            }
            Self::UnknownDependency { .. } => {
                Some("Run `tpb list` to see the available dependency definitions.")
            }
            _ => None,
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::Failed { .. } => "build.failed",
            Self::InvalidUrl { .. } => "build.invalid_url",
            Self::UnknownDependency { .. } => "build.unknown_dependency",
        };
        Some(code)
    }
}
