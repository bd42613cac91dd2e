//! Scoped working directories for a release run.
//!
//! A [`Workspace`] owns the transient working directory for the duration of
//! a run. The directory is removed when the workspace is released, and also
//! when the guard is dropped on an early exit, so repeated runs never see
//! stale partial state.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::consts::{DIST_DIR_NAME, WORK_DIR_MARKER, WORK_DIR_NAME};

#[derive(Debug, Error)]
pub enum WorkspaceError {
  #[error("work dir {work_dir} must not contain or sit inside {other}")]
  Overlap { work_dir: PathBuf, other: PathBuf },

  #[error("work dir {0} already exists and was not created by distbuild; refusing to delete it")]
  ForeignWorkDir(PathBuf),

  #[error("failed to create {path}: {source}")]
  Create {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to remove {path}: {source}")]
  Remove {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}

/// Directory layout of a release run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspacePaths {
  /// Project being built; the compiler runs here.
  pub project_root: PathBuf,
  /// Transient directory, removed after the run.
  pub work_dir: PathBuf,
  /// Persistent output directory for archives and the checksum manifest.
  pub dist_dir: PathBuf,
}

impl WorkspacePaths {
  /// Default layout: `<root>/temp` and `<root>/dist`.
  pub fn for_project(project_root: impl Into<PathBuf>) -> Self {
    let project_root = project_root.into();
    Self {
      work_dir: project_root.join(WORK_DIR_NAME),
      dist_dir: project_root.join(DIST_DIR_NAME),
      project_root,
    }
  }

  fn check_disjoint(&self) -> Result<(), WorkspaceError> {
    let overlap = |other: &Path| WorkspaceError::Overlap {
      work_dir: self.work_dir.clone(),
      other: other.to_path_buf(),
    };

    if self.dist_dir.starts_with(&self.work_dir) || self.work_dir.starts_with(&self.dist_dir) {
      return Err(overlap(&self.dist_dir));
    }
    if self.project_root.starts_with(&self.work_dir) {
      return Err(overlap(&self.project_root));
    }
    Ok(())
  }
}

/// Guard over the transient working directory.
#[derive(Debug)]
pub struct Workspace {
  paths: WorkspacePaths,
  released: bool,
}

impl Workspace {
  /// Create the output directory if absent and a fresh, empty work directory.
  ///
  /// A work directory left behind by an interrupted run is removed first.
  /// Runs mark their work directory with [`WORK_DIR_MARKER`]; an existing,
  /// non-empty directory without the marker is never deleted.
  pub fn acquire(paths: WorkspacePaths) -> Result<Self, WorkspaceError> {
    paths.check_disjoint()?;

    std::fs::create_dir_all(&paths.dist_dir).map_err(|source| WorkspaceError::Create {
      path: paths.dist_dir.clone(),
      source,
    })?;

    if paths.work_dir.exists() {
      if !is_disposable(&paths.work_dir) {
        return Err(WorkspaceError::ForeignWorkDir(paths.work_dir.clone()));
      }
      warn!(path = %paths.work_dir.display(), "removing stale work directory");
      remove_work_dir(&paths.work_dir)?;
    }

    let create_err = |source| WorkspaceError::Create {
      path: paths.work_dir.clone(),
      source,
    };
    std::fs::create_dir_all(&paths.work_dir).map_err(create_err)?;
    std::fs::write(paths.work_dir.join(WORK_DIR_MARKER), "").map_err(create_err)?;

    debug!(
      work_dir = %paths.work_dir.display(),
      dist_dir = %paths.dist_dir.display(),
      "workspace acquired"
    );

    Ok(Self { paths, released: false })
  }

  pub fn project_root(&self) -> &Path {
    &self.paths.project_root
  }

  pub fn work_dir(&self) -> &Path {
    &self.paths.work_dir
  }

  pub fn dist_dir(&self) -> &Path {
    &self.paths.dist_dir
  }

  /// Remove the work directory, reporting any failure.
  pub fn release(mut self) -> Result<(), WorkspaceError> {
    self.released = true;
    info!("cleaning up work directory");
    remove_work_dir(&self.paths.work_dir)
  }
}

impl Drop for Workspace {
  fn drop(&mut self) {
    if self.released {
      return;
    }
    if let Err(e) = remove_work_dir(&self.paths.work_dir) {
      warn!(error = %e, "failed to clean up work directory");
    }
  }
}

/// Whether an existing work directory may be wiped: it is empty, or an
/// earlier run left its marker in it.
fn is_disposable(path: &Path) -> bool {
  if path.join(WORK_DIR_MARKER).is_file() {
    return true;
  }
  match std::fs::read_dir(path) {
    Ok(mut entries) => entries.next().is_none(),
    Err(_) => false,
  }
}

fn remove_work_dir(path: &Path) -> Result<(), WorkspaceError> {
  match std::fs::remove_dir_all(path) {
    Ok(()) => Ok(()),
    Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
    Err(source) => Err(WorkspaceError::Remove {
      path: path.to_path_buf(),
      source,
    }),
  }
}
