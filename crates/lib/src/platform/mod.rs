//! Target platform identifiers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// OS identifier the toolchain uses for Windows targets.
pub const WINDOWS: &str = "windows";

/// A build target: an (operating system, architecture) pair such as `linux/amd64`.
///
/// Any non-empty OS or architecture is accepted. The compiler, not the parser,
/// decides whether a combination is actually buildable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlatformSpec {
  pub os: String,
  pub arch: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlatformParseError {
  #[error("platform '{0}' must have the form <os>/<arch>")]
  MissingSeparator(String),

  #[error("platform '{0}' has an empty OS")]
  EmptyOs(String),

  #[error("platform '{0}' has an empty architecture")]
  EmptyArch(String),
}

impl PlatformSpec {
  pub fn new(os: impl Into<String>, arch: impl Into<String>) -> Self {
    Self {
      os: os.into(),
      arch: arch.into(),
    }
  }

  pub fn is_windows(&self) -> bool {
    self.os == WINDOWS
  }

  /// File name of the executable the compiler produces for this platform.
  pub fn executable_name(&self, app_name: &str) -> String {
    if self.is_windows() {
      format!("{}.exe", app_name)
    } else {
      app_name.to_string()
    }
  }

  /// Stem shared by the job directory and the archive (`{app}_{os}_{arch}`).
  pub fn artifact_stem(&self, app_name: &str) -> String {
    format!("{}_{}_{}", app_name, self.os, self.arch)
  }
}

impl FromStr for PlatformSpec {
  type Err = PlatformParseError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let (os, arch) = s
      .split_once('/')
      .ok_or_else(|| PlatformParseError::MissingSeparator(s.to_string()))?;

    if os.is_empty() {
      return Err(PlatformParseError::EmptyOs(s.to_string()));
    }
    if arch.is_empty() {
      return Err(PlatformParseError::EmptyArch(s.to_string()));
    }
    // A second separator would make the round trip ambiguous.
    if arch.contains('/') {
      return Err(PlatformParseError::MissingSeparator(s.to_string()));
    }

    Ok(Self::new(os, arch))
  }
}

impl fmt::Display for PlatformSpec {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}/{}", self.os, self.arch)
  }
}

impl Serialize for PlatformSpec {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(self)
  }
}

impl<'de> Deserialize<'de> for PlatformSpec {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    let s = String::deserialize(deserializer)?;
    s.parse().map_err(serde::de::Error::custom)
  }
}
