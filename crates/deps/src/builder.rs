//! The interface dependency definitions use to request builds

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use tpb_errors::Error;
use tracing::debug;

use crate::cmake::CMakeArgs;
use crate::dependency::Dependency;

/// Native build tool a dependency is built with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildTool {
    CMake,
    Configure,
    Make,
}

impl fmt::Display for BuildTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CMake => write!(f, "cmake"),
            Self::Configure => write!(f, "configure"),
            Self::Make => write!(f, "make"),
        }
    }
}

/// Operations a dependency definition may ask of the build orchestrator
pub trait BuilderInterface {
    /// Configure, build and install with CMake
    ///
    /// # Errors
    ///
    /// Returns an error if the build fails.
    fn build_with_cmake(
        &mut self,
        dep: &Dependency,
        extra_cmake_args: &[String],
    ) -> Result<(), Error>;

    /// Run `./configure`, then `make` and `make install`
    ///
    /// # Errors
    ///
    /// Returns an error if the build fails.
    fn build_with_configure(
        &mut self,
        dep: &Dependency,
        extra_args: &[String],
    ) -> Result<(), Error>;

    /// Run `make` and `make install` in the source tree
    ///
    /// # Errors
    ///
    /// Returns an error if the build fails.
    fn build_with_make(&mut self, dep: &Dependency, extra_args: &[String]) -> Result<(), Error>;
}

/// A build request captured by [`RecordingBuilder`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildInvocation {
    pub dependency: String,
    pub tool: BuildTool,
    /// Arguments exactly as the definition passed them
    pub requested_args: Vec<String>,
    /// Arguments after the orchestrator's defaults were added
    pub args: Vec<String>,
}

/// Builder that records what would be built instead of building it
#[derive(Debug, Clone)]
pub struct RecordingBuilder {
    install_prefix: PathBuf,
    pkg_config_path: Vec<String>,
    invocations: Vec<BuildInvocation>,
}

impl RecordingBuilder {
    #[must_use]
    pub fn new(install_prefix: impl Into<PathBuf>) -> Self {
        Self {
            install_prefix: install_prefix.into(),
            pkg_config_path: Vec::new(),
            invocations: Vec::new(),
        }
    }

    /// `PKG_CONFIG_PATH` entries used to derive `CMAKE_PREFIX_PATH`
    #[must_use]
    pub fn with_pkg_config_path(mut self, dirs: Vec<String>) -> Self {
        self.pkg_config_path = dirs;
        self
    }

    /// Everything requested so far, in order
    #[must_use]
    pub fn invocations(&self) -> &[BuildInvocation] {
        &self.invocations
    }

    fn record(
        &mut self,
        dep: &Dependency,
        tool: BuildTool,
        requested: &[String],
        args: Vec<String>,
    ) {
        debug!(dependency = %dep.name, tool = %tool, args = ?args, "recorded build request");
        self.invocations.push(BuildInvocation {
            dependency: dep.name.clone(),
            tool,
            requested_args: requested.to_vec(),
            args,
        });
    }

    fn prefix_arg(&self) -> String {
        format!("--prefix={}", self.install_prefix.display())
    }
}

impl BuilderInterface for RecordingBuilder {
    fn build_with_cmake(
        &mut self,
        dep: &Dependency,
        extra_cmake_args: &[String],
    ) -> Result<(), Error> {
        let args = CMakeArgs::new(&self.install_prefix)
            .with_pkg_config_path(self.pkg_config_path.iter().cloned())
            .build(extra_cmake_args);
        self.record(dep, BuildTool::CMake, extra_cmake_args, args);
        Ok(())
    }

    fn build_with_configure(
        &mut self,
        dep: &Dependency,
        extra_args: &[String],
    ) -> Result<(), Error> {
        let mut args = Vec::with_capacity(extra_args.len() + 1);
        if !extra_args.iter().any(|a| a.starts_with("--prefix=")) {
            args.push(self.prefix_arg());
        }
        args.extend(extra_args.iter().cloned());
        self.record(dep, BuildTool::Configure, extra_args, args);
        Ok(())
    }

    fn build_with_make(&mut self, dep: &Dependency, extra_args: &[String]) -> Result<(), Error> {
        let mut args = extra_args.to_vec();
        if !extra_args.iter().any(|a| a.starts_with("PREFIX=")) {
            args.push(format!("PREFIX={}", self.install_prefix.display()));
        }
        self.record(dep, BuildTool::Make, extra_args, args);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dependency::BuildGroup;

    #[test]
    fn test_records_in_order() {
        let dep = Dependency::new("thing", "1.0", "https://x/{0}.tgz", BuildGroup::Common);
        let mut builder = RecordingBuilder::new("/opt/installed");

        builder
            .build_with_configure(&dep, &["--disable-shared".to_string()])
            .unwrap();
        builder.build_with_make(&dep, &[]).unwrap();

        let recorded = builder.invocations();
        assert_eq!(recorded.len(), 2);
        assert_eq!(recorded[0].tool, BuildTool::Configure);
        assert_eq!(
            recorded[0].args,
            ["--prefix=/opt/installed", "--disable-shared"]
        );
        assert_eq!(recorded[1].tool, BuildTool::Make);
        assert_eq!(recorded[1].args, ["PREFIX=/opt/installed"]);
        assert!(recorded[1].requested_args.is_empty());
    }

    #[test]
    fn test_explicit_prefix_wins() {
        let dep = Dependency::new("thing", "1.0", "https://x/{0}.tgz", BuildGroup::Common);
        let mut builder = RecordingBuilder::new("/opt/installed");
        builder
            .build_with_configure(&dep, &["--prefix=/custom".to_string()])
            .unwrap();
        assert_eq!(builder.invocations()[0].args, ["--prefix=/custom"]);
    }
}
