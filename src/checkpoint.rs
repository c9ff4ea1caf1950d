//! Checkpoint discovery and inspection.
//!
//! Training runs land in directories named after the model configuration
//! (`model_m(<model>)_d(<disc>)_g(<gen>)_<label>`). This module locates the
//! most recently modified checkpoint under a search root and can inventory a
//! checkpoint's contents (weights, history, evaluations, visualizations)
//! without touching anything.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::artifacts::{candidate_roots, EvalSelector, OutputKind, ARRAY_DIR_PREFIX};
use crate::error::Result;

/// Directory-name prefix identifying checkpoint directories.
pub const CHECKPOINT_PREFIX: &str = "model_m";

/// Naming tags parsed from a checkpoint directory name.
///
/// Full form: `model_m(<model>)_d(<disc>)_g(<gen>)_<label>`. The `d(...)` and
/// `g(...)` groups may be absent; the minimal form is `model_m(<model>)_<label>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointName {
    /// Model kind, e.g. `cyclegan` or `autoencoder`.
    pub model: String,

    /// Discriminator tag, if present in the name.
    pub discriminator: Option<String>,

    /// Generator tag, if present in the name.
    pub generator: Option<String>,

    /// Free-form run label (dataset, experiment name).
    pub label: String,
}

impl CheckpointName {
    /// Parse a checkpoint directory name into its tags.
    ///
    /// Returns `None` when the name does not follow the convention.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        let rest = name.strip_prefix(CHECKPOINT_PREFIX)?;
        let (model, rest) = take_group(rest)?;

        let (discriminator, rest) = match take_tagged_group(rest, "_d") {
            Some((value, rest)) => (Some(value), rest),
            None => (None, rest),
        };
        let (generator, rest) = match take_tagged_group(rest, "_g") {
            Some((value, rest)) => (Some(value), rest),
            None => (None, rest),
        };

        let label = rest.strip_prefix('_')?;
        if label.is_empty() {
            return None;
        }

        Some(Self {
            model,
            discriminator,
            generator,
            label: label.to_string(),
        })
    }
}

impl std::fmt::Display for CheckpointName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{CHECKPOINT_PREFIX}({})", self.model)?;
        if let Some(d) = &self.discriminator {
            write!(f, "_d({d})")?;
        }
        if let Some(g) = &self.generator {
            write!(f, "_g({g})")?;
        }
        write!(f, "_{}", self.label)
    }
}

/// Consume a leading `(...)` group, returning its contents and the remainder.
fn take_group(s: &str) -> Option<(String, &str)> {
    let rest = s.strip_prefix('(')?;
    let close = rest.find(')')?;
    Some((rest[..close].to_string(), &rest[close + 1..]))
}

/// Consume `<tag>(...)` (e.g. `_d(basic)`), returning contents and remainder.
fn take_tagged_group<'a>(s: &'a str, tag: &str) -> Option<(String, &'a str)> {
    take_group(s.strip_prefix(tag)?)
}

/// A trained-model output directory, identified on disk.
///
/// Created by the external training process; read-only to this crate.
#[derive(Debug, Clone)]
pub struct CheckpointRef {
    /// Absolute path of the checkpoint directory.
    pub path: PathBuf,

    /// Filesystem modification time of the directory.
    pub modified: SystemTime,

    /// Tags parsed from the directory name, when the name follows convention.
    pub name: Option<CheckpointName>,
}

impl CheckpointRef {
    /// Build a reference to an explicitly given checkpoint directory.
    ///
    /// The directory must exist.
    pub fn from_path(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let meta = fs::metadata(&path)?;
        if !meta.is_dir() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotADirectory,
                format!("checkpoint path is not a directory: {}", path.display()),
            )
            .into());
        }
        let name = path
            .file_name()
            .and_then(|s| s.to_str())
            .and_then(CheckpointName::parse);
        Ok(Self {
            path,
            modified: meta.modified()?,
            name,
        })
    }
}

/// Find the most recently modified checkpoint directory under `base_dir`.
///
/// Scans immediate subdirectories named `model_m*` and returns the one with
/// the greatest modification time. Ties are broken by lexicographically
/// greatest path, so the result is deterministic for identical on-disk state.
/// Note that "latest" is mtime-based and does not survive filesystem copies.
/// Returns `Ok(None)` when no candidate exists; callers are expected to fall
/// back to an explicit path.
pub fn locate_latest(base_dir: &Path) -> Result<Option<CheckpointRef>> {
    if !base_dir.is_dir() {
        return Ok(None);
    }

    let mut best: Option<CheckpointRef> = None;
    for entry in fs::read_dir(base_dir)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let Some(file_name) = path.file_name().and_then(|s| s.to_str()) else {
            continue;
        };
        if !file_name.starts_with(CHECKPOINT_PREFIX) {
            continue;
        }

        let modified = entry.metadata()?.modified()?;
        tracing::debug!(path = %path.display(), ?modified, "checkpoint candidate");

        let better = match &best {
            None => true,
            Some(current) => {
                (modified, &path) > (current.modified, &current.path)
            }
        };
        if better {
            let name = CheckpointName::parse(file_name);
            best = Some(CheckpointRef {
                path,
                modified,
                name,
            });
        }
    }

    Ok(best)
}

/// Per-directory file count, used by inventory listings.
#[derive(Debug, Clone, Serialize)]
pub struct DirCount {
    /// Directory name (not full path).
    pub name: String,

    /// Number of files directly inside.
    pub files: usize,
}

/// Contents of one evaluation-array container directory.
#[derive(Debug, Clone, Serialize)]
pub struct EvalDirInfo {
    /// Path of the container directory (`ndarrays_eval*`).
    pub path: PathBuf,

    /// File counts for each known output kind present.
    pub kinds: Vec<DirCount>,
}

/// What a checkpoint directory actually holds, for the listing-only mode.
#[derive(Debug, Clone, Serialize)]
pub struct CheckpointInventory {
    /// Checkpoint directory that was inventoried.
    pub path: PathBuf,

    /// Parsed naming tags, when available.
    pub name: Option<CheckpointName>,

    /// Weights files (`net_*.pth`), sorted by name.
    pub weights: Vec<String>,

    /// Last epoch recorded in `history.csv`, if present and parseable.
    pub last_epoch: Option<u32>,

    /// Evaluation container directories found under the known layouts.
    pub evals: Vec<EvalDirInfo>,

    /// Visualization subdirectories with their PNG counts.
    pub visualizations: Vec<DirCount>,
}

/// Inventory a checkpoint directory without modifying anything.
///
/// Used by the listing-only mode: reports weights, training history,
/// existing evaluation arrays for `selector`, and existing visualizations.
pub fn inspect(checkpoint: &CheckpointRef, selector: &EvalSelector) -> Result<CheckpointInventory> {
    let mut weights: Vec<String> = Vec::new();
    for entry in fs::read_dir(&checkpoint.path)? {
        let entry = entry?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if name.starts_with("net_") && name.ends_with(".pth") {
            weights.push(name.to_string());
        }
    }
    weights.sort();

    let last_epoch = read_last_epoch(&checkpoint.path.join("history.csv"));

    let mut evals = Vec::new();
    for root in candidate_roots(&checkpoint.path, selector) {
        if !root.is_dir() {
            continue;
        }
        let mut containers = list_subdirs_with_prefix(&root, ARRAY_DIR_PREFIX)?;
        containers.sort();
        for container in containers {
            let dir = root.join(&container);
            let mut kinds = Vec::new();
            for kind in OutputKind::ALL {
                let kind_dir = dir.join(kind.dir_name());
                if kind_dir.is_dir() {
                    kinds.push(DirCount {
                        name: kind.dir_name().to_string(),
                        files: count_files(&kind_dir)?,
                    });
                }
            }
            evals.push(EvalDirInfo { path: dir, kinds });
        }
    }

    let mut visualizations = Vec::new();
    let vis_root = checkpoint.path.join("visualizations");
    if vis_root.is_dir() {
        let mut names = list_subdirs_with_prefix(&vis_root, "")?;
        names.sort();
        for name in names {
            let dir = vis_root.join(&name);
            let files = fs::read_dir(&dir)?
                .filter_map(std::result::Result::ok)
                .filter(|e| {
                    e.path()
                        .extension()
                        .and_then(|s| s.to_str())
                        .is_some_and(|ext| ext.eq_ignore_ascii_case("png"))
                })
                .count();
            visualizations.push(DirCount { name, files });
        }
    }

    Ok(CheckpointInventory {
        path: checkpoint.path.clone(),
        name: checkpoint.name.clone(),
        weights,
        last_epoch,
        evals,
        visualizations,
    })
}

/// Parse the epoch column of the last data row in `history.csv`.
fn read_last_epoch(path: &Path) -> Option<u32> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .ok()?;
    let mut last: Option<u32> = None;
    for record in reader.records() {
        let record = record.ok()?;
        if let Some(epoch) = record.get(0).and_then(|s| s.trim().parse().ok()) {
            last = Some(epoch);
        }
    }
    last
}

fn list_subdirs_with_prefix(dir: &Path, prefix: &str) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.path().is_dir() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            if name.starts_with(prefix) {
                names.push(name.to_string());
            }
        }
    }
    Ok(names)
}

fn count_files(dir: &Path) -> Result<usize> {
    let mut count = 0;
    for entry in fs::read_dir(dir)? {
        if entry?.path().is_file() {
            count += 1;
        }
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use filetime::{set_file_mtime, FileTime};
    use tempfile::TempDir;

    #[test]
    fn test_parse_full_name() {
        let name = CheckpointName::parse(
            "model_m(cyclegan)_d(basic)_g(vit-unet)_brats19-t1-t2",
        )
        .unwrap();
        assert_eq!(name.model, "cyclegan");
        assert_eq!(name.discriminator.as_deref(), Some("basic"));
        assert_eq!(name.generator.as_deref(), Some("vit-unet"));
        assert_eq!(name.label, "brats19-t1-t2");
    }

    #[test]
    fn test_parse_minimal_name() {
        let name = CheckpointName::parse("model_m(autoencoder)_pretrain").unwrap();
        assert_eq!(name.model, "autoencoder");
        assert_eq!(name.discriminator, None);
        assert_eq!(name.generator, None);
        assert_eq!(name.label, "pretrain");
    }

    #[test]
    fn test_parse_rejects_other_names() {
        assert_eq!(CheckpointName::parse("results"), None);
        assert_eq!(CheckpointName::parse("model_m(x)"), None);
        assert_eq!(CheckpointName::parse("model_m(x)_"), None);
    }

    #[test]
    fn test_name_display_round_trips() {
        for raw in [
            "model_m(cyclegan)_d(basic)_g(unet)_run1",
            "model_m(autoencoder)_pretrain-256",
        ] {
            let name = CheckpointName::parse(raw).unwrap();
            assert_eq!(name.to_string(), raw);
        }
    }

    #[test]
    fn test_locate_latest_by_mtime() {
        let tmp = TempDir::new().unwrap();
        let a = tmp.path().join("model_m(x)_a");
        let b = tmp.path().join("model_m(x)_b");
        fs::create_dir(&a).unwrap();
        fs::create_dir(&b).unwrap();
        set_file_mtime(&a, FileTime::from_unix_time(10, 0)).unwrap();
        set_file_mtime(&b, FileTime::from_unix_time(20, 0)).unwrap();

        let found = locate_latest(tmp.path()).unwrap().unwrap();
        assert_eq!(found.path, b);
    }

    #[test]
    fn test_locate_latest_mtime_wins_over_name() {
        // Lexicographically later name must not beat a later mtime.
        let tmp = TempDir::new().unwrap();
        let early = tmp.path().join("model_m(x)_zzz");
        let late = tmp.path().join("model_m(x)_aaa");
        fs::create_dir(&early).unwrap();
        fs::create_dir(&late).unwrap();
        set_file_mtime(&early, FileTime::from_unix_time(10, 0)).unwrap();
        set_file_mtime(&late, FileTime::from_unix_time(20, 0)).unwrap();

        let found = locate_latest(tmp.path()).unwrap().unwrap();
        assert_eq!(found.path, late);
    }

    #[test]
    fn test_locate_latest_tie_breaks_lexicographically() {
        let tmp = TempDir::new().unwrap();
        let a = tmp.path().join("model_m(x)_a");
        let b = tmp.path().join("model_m(x)_b");
        fs::create_dir(&a).unwrap();
        fs::create_dir(&b).unwrap();
        let t = FileTime::from_unix_time(100, 0);
        set_file_mtime(&a, t).unwrap();
        set_file_mtime(&b, t).unwrap();

        let found = locate_latest(tmp.path()).unwrap().unwrap();
        assert_eq!(found.path, b);
    }

    #[test]
    fn test_locate_latest_ignores_other_dirs() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("results")).unwrap();
        fs::write(tmp.path().join("model_m_file"), b"not a dir").unwrap();
        assert!(locate_latest(tmp.path()).unwrap().is_none());
    }

    #[test]
    fn test_locate_latest_missing_base() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("nope");
        assert!(locate_latest(&missing).unwrap().is_none());
    }

    #[test]
    fn test_from_path_requires_directory() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("not_a_dir");
        fs::write(&file, b"x").unwrap();
        assert!(CheckpointRef::from_path(&file).is_err());
        assert!(CheckpointRef::from_path(tmp.path().join("missing")).is_err());
    }

    #[test]
    fn test_inspect_inventory() {
        let tmp = TempDir::new().unwrap();
        let ckpt = tmp.path().join("model_m(cyclegan)_run");
        fs::create_dir(&ckpt).unwrap();
        fs::write(ckpt.join("net_gen_ab.pth"), b"w").unwrap();
        fs::write(ckpt.join("net_disc_b.pth"), b"w").unwrap();
        fs::write(ckpt.join("history.csv"), "epoch,loss\n1,0.9\n2,0.8\n").unwrap();

        let eval = ckpt.join("evals").join("final").join("ndarrays_eval-test");
        for kind in ["fake_b", "real_b"] {
            let dir = eval.join(kind);
            fs::create_dir_all(&dir).unwrap();
            fs::write(dir.join("000.npy"), b"x").unwrap();
            fs::write(dir.join("001.npy"), b"x").unwrap();
        }

        let ckpt_ref = CheckpointRef::from_path(&ckpt).unwrap();
        let selector = EvalSelector::final_epoch(crate::artifacts::Split::Test);
        let inv = inspect(&ckpt_ref, &selector).unwrap();

        assert_eq!(inv.weights, vec!["net_disc_b.pth", "net_gen_ab.pth"]);
        assert_eq!(inv.last_epoch, Some(2));
        assert_eq!(inv.evals.len(), 1);
        let kinds = &inv.evals[0].kinds;
        assert_eq!(kinds.len(), 2);
        assert!(kinds.iter().all(|k| k.files == 2));
        assert!(inv.visualizations.is_empty());
    }

    /// Recursive listing of paths with sizes and mtimes, for change detection.
    fn snapshot_tree(dir: &Path) -> Vec<(PathBuf, u64, SystemTime)> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(dir).unwrap() {
            let entry = entry.unwrap();
            let path = entry.path();
            let meta = entry.metadata().unwrap();
            entries.push((path.clone(), meta.len(), meta.modified().unwrap()));
            if meta.is_dir() {
                entries.extend(snapshot_tree(&path));
            }
        }
        entries.sort();
        entries
    }

    #[test]
    fn test_inspect_performs_no_writes() {
        let tmp = TempDir::new().unwrap();
        let ckpt = tmp.path().join("model_m(cyclegan)_run");
        fs::create_dir(&ckpt).unwrap();
        fs::write(ckpt.join("net_gen_ab.pth"), b"w").unwrap();
        fs::write(ckpt.join("history.csv"), "epoch,loss\n1,0.9\n").unwrap();
        let dir = ckpt
            .join("evals")
            .join("final")
            .join("ndarrays_eval-test")
            .join("fake_b");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("000.npy"), b"x").unwrap();

        let before = snapshot_tree(tmp.path());

        let ckpt_ref = CheckpointRef::from_path(&ckpt).unwrap();
        let selector = EvalSelector::final_epoch(crate::artifacts::Split::Test);
        inspect(&ckpt_ref, &selector).unwrap();

        assert_eq!(snapshot_tree(tmp.path()), before);
    }
}
