#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Third-party dependency definitions for tpb
//!
//! This crate describes what each third-party dependency is (name, version,
//! where to download it, which build group it belongs to) and which native
//! build it asks for. Running the build itself is up to the implementor of
//! [`BuilderInterface`]; [`RecordingBuilder`] only records the requests.

mod builder;
mod cmake;
mod definitions;
mod dependency;

pub use builder::{BuildInvocation, BuildTool, BuilderInterface, RecordingBuilder};
pub use cmake::CMakeArgs;
pub use definitions::{DependencyDefinition, LibCdsDependency, Registry};
pub use dependency::{BuildGroup, Dependency};
