//! Integration tests for dependency definitions

#[cfg(test)]
mod tests {
    use tpb_deps::*;
    use tpb_env::{get_dir_list_from_env_var, EnvOverrides, MemoryEnv};

    #[test]
    fn test_libcds_definition() {
        let libcds = LibCdsDependency::new();
        let dep = libcds.dependency();

        assert_eq!(dep.name, "libcds");
        assert_eq!(dep.version, "2.3.3");
        assert_eq!(dep.build_group, BuildGroup::PotentiallyInstrumented);
        assert!(!dep.copy_sources);
        assert_eq!(
            dep.download_url().unwrap(),
            "https://github.com/khizmax/libcds/archive/v2.3.3.tar.gz"
        );
        assert_eq!(dep.archive_name().unwrap(), "libcds-2.3.3.tar.gz");
    }

    #[test]
    fn test_libcds_requests_cmake_build() {
        let registry = Registry::builtin();
        let libcds = registry.get("libcds").unwrap();

        let mut builder = RecordingBuilder::new("/opt/tpb/installed/asan");
        libcds.build(&mut builder).unwrap();

        let [invocation] = builder.invocations() else {
            panic!("expected exactly one build request");
        };
        assert_eq!(invocation.dependency, "libcds");
        assert_eq!(invocation.tool, BuildTool::CMake);
        assert_eq!(
            invocation.requested_args,
            ["-DCMAKE_BUILD_TYPE=Release", "-DBUILD_SHARED_LIBS=ON"]
        );
        assert_eq!(
            invocation.args,
            [
                "-DCMAKE_INSTALL_PREFIX=/opt/tpb/installed/asan",
                "-DCMAKE_BUILD_TYPE=Release",
                "-DBUILD_SHARED_LIBS=ON",
            ]
        );
    }

    #[test]
    fn test_plan_under_scoped_pkg_config_path() {
        let mut env = MemoryEnv::new();
        let overrides = EnvOverrides::new().set(
            "PKG_CONFIG_PATH",
            "/opt/tpb/installed/common/lib/pkgconfig",
        );

        let guard = overrides.apply(&mut env).unwrap();
        let mut builder = RecordingBuilder::new("/opt/tpb/installed/common")
            .with_pkg_config_path(get_dir_list_from_env_var(&guard, "PKG_CONFIG_PATH"));
        drop(guard);

        LibCdsDependency::new().build(&mut builder).unwrap();
        assert!(builder.invocations()[0]
            .args
            .contains(&"-DCMAKE_PREFIX_PATH=/opt/tpb/installed/common".to_string()));
    }
}
