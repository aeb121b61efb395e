//! libcds: concurrent data structures library

use tpb_errors::Error;

use super::DependencyDefinition;
use crate::builder::BuilderInterface;
use crate::dependency::{BuildGroup, Dependency};

pub struct LibCdsDependency {
    dependency: Dependency,
}

impl LibCdsDependency {
    #[must_use]
    pub fn new() -> Self {
        Self {
            dependency: Dependency::new(
                "libcds",
                "2.3.3",
                "https://github.com/khizmax/libcds/archive/v{0}.tar.gz",
                BuildGroup::PotentiallyInstrumented,
            )
            .with_copy_sources(false),
        }
    }
}

impl Default for LibCdsDependency {
    fn default() -> Self {
        Self::new()
    }
}

impl DependencyDefinition for LibCdsDependency {
    fn dependency(&self) -> &Dependency {
        &self.dependency
    }

    fn build(&self, builder: &mut dyn BuilderInterface) -> Result<(), Error> {
        builder.build_with_cmake(
            &self.dependency,
            &[
                "-DCMAKE_BUILD_TYPE=Release".to_string(),
                "-DBUILD_SHARED_LIBS=ON".to_string(),
            ],
        )
    }
}
