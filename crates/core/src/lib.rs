//! Append a CI build entry to F-Droid style app metadata.
//!
//! A CI job that builds an app from its own checkout needs a metadata record
//! describing exactly that checkout. This crate derives the version name from
//! `git describe`, the version code from the Gradle build script, clones the
//! app's most recent build entry with those values and the CI commit, points
//! the app's `Repo` at the local checkout and writes the record back in place.

pub mod config;
pub mod error;
pub mod fs;
pub mod metadata;
pub mod pipeline;
pub mod resolve;
pub mod synth;
pub mod version;

pub use config::{ConfigError, GenCiBuildConfig};
pub use error::{DeriveError, GenCiBuildError, MetadataError, ResolveError, SynthesizeError};
pub use fs::{FileSystem, MockFileSystem, RealFileSystem};
pub use metadata::{ApplicationRecord, BuildEntry, MetadataFormat, MetadataPolicy};
pub use pipeline::{run, AppendedBuild, RunRequest};
pub use version::{GitCli, VersionControl, VersionDescriptor};
