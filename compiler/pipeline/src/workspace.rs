//! Workspace preparation.
//!
//! Every directory the run writes into is created up front, before any
//! network activity, so a permissions problem aborts the run immediately
//! instead of after a slow download.

use std::fs;
use std::path::{Path, PathBuf};

use crate::{PipelineError, Result};

/// Create each of `dirs` (resolved against `root`) and all missing parents.
///
/// Safe to call when the directories already exist. Fails with
/// [`PipelineError::Filesystem`] if a path cannot be created, for instance
/// because a regular file is in the way.
pub fn prepare_workspace(root: &Path, dirs: &[PathBuf]) -> Result<()> {
    for dir in dirs {
        let path = root.join(dir);
        fs::create_dir_all(&path).map_err(|e| PipelineError::filesystem(&path, e))?;
        logging::trace("WORKSPACE", &format!("ensured {}", path.display()));
    }
    Ok(())
}
