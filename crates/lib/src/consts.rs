//! Constants shared across the crate.

/// Default name of the release configuration file, relative to the project root.
pub const CONFIG_FILENAME: &str = "release.config.json";

/// Default transient working directory, relative to the project root.
pub const WORK_DIR_NAME: &str = "temp";

/// Marker file identifying a work directory created by a run.
pub const WORK_DIR_MARKER: &str = ".distbuild-work";

/// Default persistent output directory, relative to the project root.
pub const DIST_DIR_NAME: &str = "dist";

/// Name of the checksum manifest written into the output directory.
pub const CHECKSUMS_FILENAME: &str = "checksums.txt";

/// Raw README shipped when doc conversion is disabled or fails.
pub const README_SOURCE: &str = "README.md";

/// License file shipped in every archive.
pub const LICENSE_SOURCE: &str = "LICENSE.txt";

/// Names the shared files take inside each archive.
pub const README_ARCHIVE_NAME: &str = "README.txt";
pub const LICENSE_ARCHIVE_NAME: &str = "LICENSE.txt";

/// Default compiler toolchain executable.
pub const DEFAULT_COMPILER: &str = "go";

/// Read size used when streaming files into the hasher.
pub const HASH_CHUNK_SIZE: usize = 8192;
