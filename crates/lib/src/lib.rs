//! distbuild-lib: cross-platform release builds
//!
//! This crate turns one project into release archives for many targets:
//! - `BuildConfig`: the release configuration read once per run
//! - `BuildOrchestrator`: fans out one `PlatformBuildJob` per target
//! - `Packager`: bundles each executable with README and license
//! - `manifest`: the `checksums.txt` covering every produced archive
//! - `release`: the end-to-end run tying these together

pub mod config;
pub mod consts;
pub mod docs;
pub mod execute;
pub mod manifest;
pub mod package;
pub mod platform;
pub mod release;
pub mod util;
pub mod workspace;
