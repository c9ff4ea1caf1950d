//! # i2i-eval
//!
//! Post-training evaluation orchestration for image-to-image translation
//! models.
//!
//! Given a checkpoint directory produced by an external training process,
//! this library resolves which on-disk artifact layout the checkpoint uses,
//! triggers generation of translated samples through a caller-supplied
//! callback, locates the resulting arrays across historical directory
//! conventions, and renders side-by-side comparison images for each output
//! pairing.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use i2i_eval::{Pipeline, PipelineConfig, TranslationOutcome};
//!
//! let config = PipelineConfig::builder()
//!     .checkpoint("outdir/model_m(cyclegan)_d(basic)_g(vit-unet)_brats19")
//!     .sample_count(10)
//!     .build();
//!
//! let pipeline = Pipeline::new(config, Box::new(|request| {
//!     // Run your translation step here.
//!     Ok(TranslationOutcome::success())
//! }));
//!
//! let report = pipeline.run()?;
//! println!("rendered {} comparisons", report.total_rendered());
//! ```
//!
//! ## Modules
//!
//! - [`error`]: Error types for the library
//! - [`checkpoint`]: Checkpoint discovery and inspection
//! - [`artifacts`]: Evaluation-artifact model and layout resolution
//! - [`translate`]: Translation collaborator interface
//! - [`render`]: Comparison visualization
//! - [`pipeline`]: End-to-end pipeline and run report

pub mod artifacts;
pub mod checkpoint;
pub mod error;
pub mod pipeline;
pub mod render;
pub mod translate;

// Re-export commonly used types
pub use artifacts::{resolve, ArtifactSet, EvalSelector, OutputKind, ResolutionFailure, Split};
pub use checkpoint::{locate_latest, CheckpointInventory, CheckpointName, CheckpointRef};
pub use error::{Error, Result};
pub use pipeline::{Pipeline, PipelineConfig, RunReport};
pub use render::{
    default_jobs, render_dir_pair, render_job, ComparisonJob, JobReport, PixelScale,
    RenderOptions, VisualizationResult,
};
pub use translate::{TranslateFn, TranslationOutcome, TranslationRequest};
