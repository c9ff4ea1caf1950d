//! Machine-readable run report.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::artifacts::EvalSelector;
use crate::checkpoint::CheckpointName;
use crate::error::Result;
use crate::render::JobReport;

/// Everything one pipeline run found, generated, and wrote.
///
/// Persisted as `run_report.json` under the output root and rendered
/// human-readably by the CLI.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Checkpoint directory the run evaluated.
    pub checkpoint: PathBuf,

    /// Naming tags parsed from the checkpoint directory name, if any.
    pub checkpoint_name: Option<CheckpointName>,

    /// The (epoch, split) selector the run used.
    pub selector: EvalSelector,

    /// Resolved array container directory.
    pub artifact_dir: PathBuf,

    /// Root directory the visualizations were written under.
    pub output_dir: PathBuf,

    /// Per-job outcomes, in the order the jobs ran.
    pub jobs: Vec<JobReport>,

    /// When the report was generated.
    #[serde(with = "chrono_serde")]
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl RunReport {
    /// Total panels rendered across all jobs.
    #[must_use]
    pub fn total_rendered(&self) -> usize {
        self.jobs.iter().map(JobReport::rendered).sum()
    }

    /// Jobs that were skipped, with their reasons.
    pub fn skipped_jobs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.jobs.iter().filter_map(|job| {
            job.skip_reason
                .as_deref()
                .map(|reason| (job.name.as_str(), reason))
        })
    }

    /// Write the report as pretty-printed JSON into `dir`.
    pub fn write(&self, dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join("run_report.json");
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, json)?;
        Ok(path)
    }
}

mod chrono_serde {
    use chrono::{DateTime, Utc};
    use serde::{Serialize, Serializer};

    pub fn serialize<S>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        dt.to_rfc3339().serialize(serializer)
    }
}
