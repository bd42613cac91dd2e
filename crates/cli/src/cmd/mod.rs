mod build;
mod checksums;
mod verify;

pub use build::{BuildArgs, cmd_build};
pub use checksums::cmd_checksums;
pub use verify::cmd_verify;
