//! Dependency metadata

use serde::{Deserialize, Serialize};
use std::fmt;
use tpb_errors::BuildError;

/// Archive extensions recognised when naming downloaded sources
const ARCHIVE_EXTENSIONS: &[&str] = &[
    ".tar.gz", ".tar.bz2", ".tar.xz", ".tar.zst", ".tgz", ".tbz2", ".zip",
];

/// Which family of builds a dependency takes part in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildGroup {
    /// Built once and shared by every build type
    Common,
    /// Never built with sanitizer instrumentation
    UninstrumentedOnly,
    /// Rebuilt for each instrumented (ASAN/TSAN) build type
    PotentiallyInstrumented,
}

impl BuildGroup {
    /// All groups, in build order
    pub const ALL: [Self; 3] = [
        Self::Common,
        Self::UninstrumentedOnly,
        Self::PotentiallyInstrumented,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Common => "common",
            Self::UninstrumentedOnly => "uninstrumented_only",
            Self::PotentiallyInstrumented => "potentially_instrumented",
        }
    }
}

impl fmt::Display for BuildGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl clap::ValueEnum for BuildGroup {
    fn value_variants<'a>() -> &'a [Self] {
        &Self::ALL
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        Some(clap::builder::PossibleValue::new(self.as_str()))
    }
}

/// A third-party dependency: what to download and how it is grouped
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub name: String,
    pub version: String,
    /// Download URL with `{0}` or `{version}` standing in for the version
    pub url_pattern: String,
    pub build_group: BuildGroup,
    /// Whether sources are copied into the build directory before building
    #[serde(default = "default_copy_sources")]
    pub copy_sources: bool,
    /// Patch files applied to the sources, in order
    #[serde(default)]
    pub patches: Vec<String>,
}

fn default_copy_sources() -> bool {
    true
}

impl Dependency {
    /// Create a dependency that copies its sources and has no patches
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        url_pattern: impl Into<String>,
        build_group: BuildGroup,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            url_pattern: url_pattern.into(),
            build_group,
            copy_sources: default_copy_sources(),
            patches: Vec::new(),
        }
    }

    /// Build in place instead of copying the sources first
    #[must_use]
    pub fn with_copy_sources(mut self, copy_sources: bool) -> Self {
        self.copy_sources = copy_sources;
        self
    }

    /// Add a patch to apply before building
    #[must_use]
    pub fn with_patch(mut self, patch: impl Into<String>) -> Self {
        self.patches.push(patch.into());
        self
    }

    /// Download URL with the version filled in
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::InvalidUrl`] if the result is not of the form
    /// `scheme://...`.
    pub fn download_url(&self) -> Result<String, BuildError> {
        let url = self
            .url_pattern
            .replace("{0}", &self.version)
            .replace("{version}", &self.version);

        let valid_scheme = url.split_once("://").is_some_and(|(scheme, rest)| {
            !scheme.is_empty()
                && !rest.is_empty()
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        });
        if !valid_scheme {
            return Err(BuildError::InvalidUrl { url });
        }
        Ok(url)
    }

    /// `<name>-<version>`, the directory the sources unpack into
    #[must_use]
    pub fn source_dir_name(&self) -> String {
        format!("{}-{}", self.name, self.version)
    }

    /// Local file name for the downloaded archive
    ///
    /// Upstream archives are often named after the tag only (`v2.3.3.tar.gz`),
    /// so the file is stored as `<name>-<version>` plus the archive extension.
    /// Unknown extensions keep the URL's own file name.
    ///
    /// # Errors
    ///
    /// Returns an error if the download URL is invalid.
    pub fn archive_name(&self) -> Result<String, BuildError> {
        let url = self.download_url()?;
        let file_name = url.rsplit('/').next().unwrap_or_default();

        let archive = ARCHIVE_EXTENSIONS
            .iter()
            .find(|ext| file_name.ends_with(*ext))
            .map_or_else(
                || file_name.to_string(),
                |ext| format!("{}{ext}", self.source_dir_name()),
            );
        Ok(archive)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Dependency {
        Dependency::new(
            "libcds",
            "2.3.3",
            "https://github.com/khizmax/libcds/archive/v{0}.tar.gz",
            BuildGroup::PotentiallyInstrumented,
        )
    }

    #[test]
    fn test_download_url() {
        assert_eq!(
            sample().download_url().unwrap(),
            "https://github.com/khizmax/libcds/archive/v2.3.3.tar.gz"
        );

        let named = Dependency::new(
            "zlib",
            "1.3.1",
            "https://zlib.net/zlib-{version}.tar.xz",
            BuildGroup::Common,
        );
        assert_eq!(
            named.download_url().unwrap(),
            "https://zlib.net/zlib-1.3.1.tar.xz"
        );
    }

    #[test]
    fn test_invalid_url() {
        for pattern in ["github.com/x/{0}.tar.gz", "://host/x", "https://", "h ttp://x"] {
            let dep = Dependency::new("x", "1", pattern, BuildGroup::Common);
            assert!(
                matches!(dep.download_url(), Err(BuildError::InvalidUrl { .. })),
                "{pattern}"
            );
        }
    }

    #[test]
    fn test_archive_name() {
        assert_eq!(sample().archive_name().unwrap(), "libcds-2.3.3.tar.gz");

        let odd = Dependency::new(
            "tool",
            "9",
            "https://example.com/dl/tool-{0}.bin",
            BuildGroup::Common,
        );
        assert_eq!(odd.archive_name().unwrap(), "tool-9.bin");
    }

    #[test]
    fn test_defaults_and_setters() {
        let dep = sample();
        assert!(dep.copy_sources);
        assert!(dep.patches.is_empty());

        let dep = dep.with_copy_sources(false).with_patch("libcds-fix.patch");
        assert!(!dep.copy_sources);
        assert_eq!(dep.patches, ["libcds-fix.patch"]);
        assert_eq!(dep.source_dir_name(), "libcds-2.3.3");
    }

    #[test]
    fn test_build_group_serde() {
        let json = serde_json::to_string(&BuildGroup::UninstrumentedOnly).unwrap();
        assert_eq!(json, "\"uninstrumented_only\"");
        assert_eq!(BuildGroup::PotentiallyInstrumented.to_string(), "potentially_instrumented");

        let dep: Dependency = serde_json::from_str(
            r#"{"name":"re2","version":"2024-07-02","url_pattern":"https://x/{0}.tar.gz","build_group":"common"}"#,
        )
        .unwrap();
        assert!(dep.copy_sources);
        assert_eq!(dep.build_group, BuildGroup::Common);
    }
}
