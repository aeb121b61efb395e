//! CMake argument assembly

use std::path::{Path, PathBuf};

/// Arguments passed to `cmake` when configuring a dependency
#[derive(Debug, Clone)]
pub struct CMakeArgs {
    source_dir: Option<PathBuf>,
    install_prefix: PathBuf,
    default_args: Vec<String>,
    pkg_config_path: Vec<String>,
}

impl CMakeArgs {
    /// Configure into `install_prefix` with release defaults
    #[must_use]
    pub fn new(install_prefix: impl Into<PathBuf>) -> Self {
        Self {
            source_dir: None,
            install_prefix: install_prefix.into(),
            default_args: vec!["-DCMAKE_BUILD_TYPE=Release".to_string()],
            pkg_config_path: Vec::new(),
        }
    }

    /// Source directory, passed as the first argument
    #[must_use]
    pub fn with_source_dir(mut self, source_dir: impl Into<PathBuf>) -> Self {
        self.source_dir = Some(source_dir.into());
        self
    }

    /// `PKG_CONFIG_PATH` entries of already built dependencies
    #[must_use]
    pub fn with_pkg_config_path<I, P>(mut self, dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        self.pkg_config_path = dirs.into_iter().map(Into::into).collect();
        self
    }

    /// Final argument list with the dependency's own arguments appended
    ///
    /// Defaults are skipped when the dependency sets the same variable.
    #[must_use]
    pub fn build(&self, extra_args: &[String]) -> Vec<String> {
        let mut args = vec![];

        if let Some(source_dir) = &self.source_dir {
            args.push(source_dir.display().to_string());
        }

        if !sets_variable(extra_args, "CMAKE_INSTALL_PREFIX") {
            args.push(format!(
                "-DCMAKE_INSTALL_PREFIX={}",
                self.install_prefix.display()
            ));
        }

        for default_arg in &self.default_args {
            let variable = default_arg
                .trim_start_matches("-D")
                .split('=')
                .next()
                .unwrap_or_default();
            if !sets_variable(extra_args, variable) {
                args.push(default_arg.clone());
            }
        }

        // <prefix>/lib/pkgconfig -> <prefix>
        let prefix_paths: Vec<String> = self
            .pkg_config_path
            .iter()
            .filter(|p| !p.is_empty())
            .filter_map(|p| {
                Path::new(p)
                    .parent()
                    .and_then(Path::parent)
                    .map(|p| p.display().to_string())
            })
            .collect();
        if !prefix_paths.is_empty() && !sets_variable(extra_args, "CMAKE_PREFIX_PATH") {
            args.push(format!("-DCMAKE_PREFIX_PATH={}", prefix_paths.join(";")));
        }

        args.extend(extra_args.iter().cloned());
        args
    }
}

/// Whether `args` contain a `-D<variable>=` or `-D<variable>:<type>=` definition
fn sets_variable(args: &[String], variable: &str) -> bool {
    args.iter().any(|arg| {
        arg.strip_prefix("-D")
            .and_then(|rest| rest.strip_prefix(variable))
            .is_some_and(|rest| rest.starts_with('=') || rest.starts_with(':'))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_defaults() {
        let args = CMakeArgs::new("/opt/tpb/installed/common")
            .with_source_dir("/build/libcds-2.3.3")
            .build(&strings(&["-DBUILD_SHARED_LIBS=ON"]));
        assert_eq!(
            args,
            [
                "/build/libcds-2.3.3",
                "-DCMAKE_INSTALL_PREFIX=/opt/tpb/installed/common",
                "-DCMAKE_BUILD_TYPE=Release",
                "-DBUILD_SHARED_LIBS=ON",
            ]
        );
    }

    #[test]
    fn test_user_args_override_defaults() {
        let args = CMakeArgs::new("/prefix").build(&strings(&[
            "-DCMAKE_BUILD_TYPE=Debug",
            "-DCMAKE_INSTALL_PREFIX:PATH=/elsewhere",
        ]));
        assert_eq!(
            args,
            ["-DCMAKE_BUILD_TYPE=Debug", "-DCMAKE_INSTALL_PREFIX:PATH=/elsewhere"]
        );
    }

    #[test]
    fn test_similar_variable_names_do_not_count() {
        let args = CMakeArgs::new("/prefix").build(&strings(&["-DCMAKE_BUILD_TYPE_INIT=x"]));
        assert!(args.contains(&"-DCMAKE_BUILD_TYPE=Release".to_string()));
    }

    #[test]
    fn test_prefix_path_from_pkg_config() {
        let args = CMakeArgs::new("/prefix")
            .with_pkg_config_path(["/deps/a/lib/pkgconfig", "", "/deps/b/lib/pkgconfig"])
            .build(&[]);
        assert_eq!(args.last().unwrap(), "-DCMAKE_PREFIX_PATH=/deps/a;/deps/b");
    }
}
