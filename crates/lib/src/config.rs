//! Release configuration loading.
//!
//! The configuration is a JSON document read once at the start of a run.
//! Every field except `version` is required; a missing or malformed
//! field aborts the run before any job starts.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::platform::PlatformSpec;

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("config file not found: {0}")]
  NotFound(PathBuf),

  #[error("failed to read config {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("invalid config: {0}")]
  Parse(#[from] serde_json::Error),

  #[error("app_name must not be empty")]
  EmptyAppName,

  #[error("app_name '{0}' must not contain path separators")]
  InvalidAppName(String),

  #[error("platforms must list at least one <os>/<arch> target")]
  NoPlatforms,

  #[error("platform {0} is listed more than once")]
  DuplicatePlatform(PlatformSpec),

  #[error("platform {0} is not part of the release config")]
  UnknownPlatform(PlatformSpec),
}

/// Build settings for a release run.
///
/// Immutable once loaded; the orchestrator only ever reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildConfig {
  /// Base name for executables and archives.
  pub app_name: String,

  /// Strip symbol tables and debug info from binaries.
  pub strip_binaries: bool,

  /// Ask the compiler for verbose output.
  pub verbose: bool,

  /// Run the toolchain's formatter before building.
  pub format_code: bool,

  /// Targets to build, in submission order.
  pub platforms: Vec<PlatformSpec>,

  /// Convert README.md to plain text with pandoc before packaging.
  #[serde(rename = "pandoc_conversion")]
  pub doc_conversion_enabled: bool,

  /// Release version, carried through to the run report.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub version: Option<String>,
}

impl BuildConfig {
  /// Load and validate a config file.
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    if !path.exists() {
      return Err(ConfigError::NotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
      path: path.to_path_buf(),
      source,
    })?;

    let config = Self::from_json(&content)?;
    debug!(
      path = %path.display(),
      app = %config.app_name,
      platforms = config.platforms.len(),
      "loaded release config"
    );
    Ok(config)
  }

  /// Parse and validate a config from JSON text.
  pub fn from_json(content: &str) -> Result<Self, ConfigError> {
    let config: BuildConfig = serde_json::from_str(content)?;
    config.validate()?;
    Ok(config)
  }

  fn validate(&self) -> Result<(), ConfigError> {
    if self.app_name.trim().is_empty() {
      return Err(ConfigError::EmptyAppName);
    }
    if self.app_name.contains(['/', '\\']) {
      return Err(ConfigError::InvalidAppName(self.app_name.clone()));
    }
    if self.platforms.is_empty() {
      return Err(ConfigError::NoPlatforms);
    }

    // Each platform owns a workspace subdirectory named after it.
    let mut seen = HashSet::new();
    for platform in &self.platforms {
      if !seen.insert(platform) {
        return Err(ConfigError::DuplicatePlatform(platform.clone()));
      }
    }

    Ok(())
  }

  /// Returns a copy of this config restricted to `only`, keeping config order.
  ///
  /// Used to re-run a failed subset. Every requested platform must already
  /// be part of the config.
  pub fn restrict_to(&self, only: &[PlatformSpec]) -> Result<Self, ConfigError> {
    if only.is_empty() {
      return Ok(self.clone());
    }

    if let Some(unknown) = only.iter().find(|p| !self.platforms.contains(p)) {
      return Err(ConfigError::UnknownPlatform(unknown.clone()));
    }

    Ok(Self {
      platforms: self.platforms.iter().filter(|p| only.contains(p)).cloned().collect(),
      ..self.clone()
    })
  }
}
