//! The end-to-end evaluation pipeline.
//!
//! Stage order is fixed: locate the checkpoint, invoke the translation
//! collaborator, resolve the artifact layout, render each comparison job,
//! write the run report. Translation runs strictly before resolution,
//! since resolution reads the output translation is expected to have just
//! produced. A fatal stage error aborts the run with its diagnostic; job
//! skips accumulate as warnings in the report instead.

mod report;

pub use report::RunReport;

use std::path::PathBuf;

use crate::artifacts::{resolve, EvalSelector, Split};
use crate::checkpoint::{locate_latest, CheckpointRef};
use crate::error::{Error, Result};
use crate::render::{default_jobs, render_job, ComparisonJob, PixelScale, RenderOptions};
use crate::translate::{invoke_translation, TranslateFn, TranslationRequest};

/// Immutable configuration for one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Explicit checkpoint directory; wins over discovery when set.
    pub checkpoint: Option<PathBuf>,

    /// Root searched for the latest checkpoint when none is given
    /// explicitly. Defaults to the current directory.
    pub search_dir: Option<PathBuf>,

    /// Which evaluation run to produce and visualize.
    pub selector: EvalSelector,

    /// Number of samples to generate and render per job.
    pub sample_count: usize,

    /// Output root override; defaults to `<checkpoint>/visualizations`.
    pub output_dir: Option<PathBuf>,

    /// Comparison jobs to render.
    pub jobs: Vec<ComparisonJob>,

    /// Pixel-value interpretation for loaded samples.
    pub scale: PixelScale,
}

impl PipelineConfig {
    /// Create a new configuration builder.
    #[must_use]
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }
}

/// Builder for [`PipelineConfig`].
#[derive(Debug, Default)]
pub struct PipelineConfigBuilder {
    checkpoint: Option<PathBuf>,
    search_dir: Option<PathBuf>,
    selector: Option<EvalSelector>,
    sample_count: Option<usize>,
    output_dir: Option<PathBuf>,
    jobs: Option<Vec<ComparisonJob>>,
    scale: Option<PixelScale>,
}

impl PipelineConfigBuilder {
    /// Set an explicit checkpoint directory.
    #[must_use]
    pub fn checkpoint(mut self, path: impl Into<PathBuf>) -> Self {
        self.checkpoint = Some(path.into());
        self
    }

    /// Set the discovery search root.
    #[must_use]
    pub fn search_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.search_dir = Some(path.into());
        self
    }

    /// Set the evaluation selector.
    #[must_use]
    pub fn selector(mut self, selector: EvalSelector) -> Self {
        self.selector = Some(selector);
        self
    }

    /// Set the per-job sample count.
    #[must_use]
    pub fn sample_count(mut self, count: usize) -> Self {
        self.sample_count = Some(count);
        self
    }

    /// Override the output root.
    #[must_use]
    pub fn output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(path.into());
        self
    }

    /// Replace the default comparison jobs.
    #[must_use]
    pub fn jobs(mut self, jobs: Vec<ComparisonJob>) -> Self {
        self.jobs = Some(jobs);
        self
    }

    /// Set the pixel-value interpretation.
    #[must_use]
    pub fn scale(mut self, scale: PixelScale) -> Self {
        self.scale = Some(scale);
        self
    }

    /// Build the configuration.
    #[must_use]
    pub fn build(self) -> PipelineConfig {
        PipelineConfig {
            checkpoint: self.checkpoint,
            search_dir: self.search_dir,
            selector: self
                .selector
                .unwrap_or_else(|| EvalSelector::final_epoch(Split::Test)),
            sample_count: self.sample_count.unwrap_or(10),
            output_dir: self.output_dir,
            jobs: self.jobs.unwrap_or_else(default_jobs),
            scale: self.scale.unwrap_or_default(),
        }
    }
}

/// One evaluation pipeline: a configuration plus the translation
/// collaborator callback.
pub struct Pipeline {
    config: PipelineConfig,
    translate: TranslateFn,
}

impl Pipeline {
    /// Create a pipeline from a configuration and a translation callback.
    #[must_use]
    pub fn new(config: PipelineConfig, translate: TranslateFn) -> Self {
        Self { config, translate }
    }

    /// Locate the checkpoint this run will evaluate.
    ///
    /// An explicit path wins; otherwise the most recently modified
    /// checkpoint under the search root is used.
    pub fn locate_checkpoint(&self) -> Result<CheckpointRef> {
        if let Some(path) = &self.config.checkpoint {
            return CheckpointRef::from_path(path);
        }
        let searched = self
            .config
            .search_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."));
        locate_latest(&searched)?.ok_or(Error::CheckpointNotFound { searched })
    }

    /// Run the whole pipeline and return the run report.
    pub fn run(&self) -> Result<RunReport> {
        let checkpoint = self.locate_checkpoint()?;
        tracing::debug!(checkpoint = %checkpoint.path.display(), "evaluating checkpoint");

        let request = TranslationRequest::new(
            &checkpoint.path,
            &self.config.selector,
            self.config.sample_count,
        );
        invoke_translation(&self.translate, &request)?;

        let artifacts = resolve(&checkpoint.path, &self.config.selector)?;
        tracing::debug!(dir = %artifacts.dir.display(), kinds = ?artifacts.kinds, "resolved artifacts");

        let output_root = self
            .config
            .output_dir
            .clone()
            .unwrap_or_else(|| checkpoint.path.join("visualizations"));
        std::fs::create_dir_all(&output_root)?;

        let options = RenderOptions {
            sample_count: self.config.sample_count,
            scale: self.config.scale,
        };

        let mut jobs = Vec::with_capacity(self.config.jobs.len());
        for job in &self.config.jobs {
            jobs.push(render_job(job, &artifacts, &output_root, &options)?);
        }

        let report = RunReport {
            checkpoint: checkpoint.path.clone(),
            checkpoint_name: checkpoint.name.clone(),
            selector: self.config.selector,
            artifact_dir: artifacts.dir,
            output_dir: output_root.clone(),
            jobs,
            timestamp: chrono::Utc::now(),
        };
        report.write(&output_root)?;

        Ok(report)
    }
}
