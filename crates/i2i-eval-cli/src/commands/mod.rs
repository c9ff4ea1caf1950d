//! CLI command implementations.

pub mod inspect;
pub mod render;
pub mod run;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use i2i_eval::{locate_latest, CheckpointRef};

/// Resolve the checkpoint to operate on: explicit path first, then the most
/// recently modified checkpoint under the search root.
pub fn find_checkpoint(explicit: Option<PathBuf>, search_dir: &Path) -> Result<CheckpointRef> {
    if let Some(path) = explicit {
        return CheckpointRef::from_path(&path)
            .with_context(|| format!("checkpoint directory not usable: {}", path.display()));
    }
    locate_latest(search_dir)
        .with_context(|| format!("cannot search {}", search_dir.display()))?
        .with_context(|| {
            format!(
                "no checkpoint found under {} (pass an explicit checkpoint path)",
                search_dir.display()
            )
        })
}
