//! Comparison visualization.
//!
//! One [`ComparisonJob`] describes one named pairing of output kinds (e.g.
//! generated vs. ground truth). Rendering a job enumerates the source
//! samples, pairs them positionally with the comparison samples when a
//! comparison folder exists, and writes one panel image per sample. Jobs are
//! best-effort: a missing source folder is a logged skip, not an error,
//! because some pairings are legitimately absent depending on how the model
//! was trained.

mod loader;
mod npy;
mod panel;

pub use loader::{list_sample_files, load_sample, PixelScale, RECOGNIZED_EXTENSIONS};
pub use npy::{parse_npy, NpyArray};
#[cfg(test)]
pub(crate) use npy::encode_npy_f32;
pub use panel::{render_comparison, render_single, save_png, CAPTION_BAR, PANEL_GUTTER};

use std::fs;
use std::path::{Path, PathBuf};

use imgref::ImgVec;
use serde::Serialize;

use crate::artifacts::{ArtifactSet, OutputKind};
use crate::error::Result;

/// One visualization task: a source kind, an optional comparison kind, and
/// where the rendered panels go.
#[derive(Debug, Clone)]
pub struct ComparisonJob {
    /// Kind whose samples are rendered (left panel).
    pub source: OutputKind,

    /// Kind paired against the source (right panel), when configured.
    pub comparison: Option<OutputKind>,

    /// Subdirectory name under the output root.
    pub output_name: String,

    /// Caption override for the source panel; derived from the filename
    /// when unset.
    pub title: Option<String>,

    /// Caption override for the comparison panel.
    pub compare_title: Option<String>,
}

impl ComparisonJob {
    /// A job pairing `source` against `comparison`.
    #[must_use]
    pub fn paired(source: OutputKind, comparison: OutputKind, output_name: &str) -> Self {
        Self {
            source,
            comparison: Some(comparison),
            output_name: output_name.to_string(),
            title: None,
            compare_title: None,
        }
    }
}

/// The standard pairings rendered for every evaluation run.
#[must_use]
pub fn default_jobs() -> Vec<ComparisonJob> {
    vec![
        ComparisonJob::paired(OutputKind::FakeB, OutputKind::RealB, "fake_vs_real"),
        ComparisonJob::paired(OutputKind::FakeA, OutputKind::RealA, "fake_a_vs_real_a"),
        ComparisonJob::paired(OutputKind::RecoA, OutputKind::RealA, "cycle_consistency_a"),
    ]
}

/// Rendering knobs shared by every job in a run.
#[derive(Debug, Clone, Copy)]
pub struct RenderOptions {
    /// Maximum number of samples rendered per job.
    pub sample_count: usize,

    /// Pixel-value interpretation for loaded samples.
    pub scale: PixelScale,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            sample_count: 10,
            scale: PixelScale::Auto,
        }
    }
}

/// Per-sample outcome of a rendering job.
#[derive(Debug, Clone, Serialize)]
pub struct VisualizationResult {
    /// Zero-based sample index (also the output filename index).
    pub index: usize,

    /// Source sample file.
    pub source: PathBuf,

    /// Comparison sample file, when this sample was paired.
    pub comparison: Option<PathBuf>,

    /// Rendered panel image path.
    pub output: PathBuf,

    /// Whether the panel was written.
    pub success: bool,

    /// PSNR between source and comparison in dB, when both loaded and
    /// dimensions matched.
    pub psnr: Option<f64>,
}

/// Outcome of one job.
#[derive(Debug, Clone, Serialize)]
pub struct JobReport {
    /// The job's output subdirectory name.
    pub name: String,

    /// Directory the panels were written to.
    pub output_dir: PathBuf,

    /// Why the job was skipped, when it was.
    pub skip_reason: Option<String>,

    /// Per-sample results, in rendering order.
    pub results: Vec<VisualizationResult>,
}

impl JobReport {
    fn skipped(name: &str, output_dir: PathBuf, reason: String) -> Self {
        Self {
            name: name.to_string(),
            output_dir,
            skip_reason: Some(reason),
            results: Vec::new(),
        }
    }

    /// Number of successfully rendered panels.
    #[must_use]
    pub fn rendered(&self) -> usize {
        self.results.iter().filter(|r| r.success).count()
    }
}

/// Render one job against a resolved artifact set.
///
/// A missing source folder yields a skipped report; a configured-but-missing
/// comparison folder downgrades to single-panel rendering.
pub fn render_job(
    job: &ComparisonJob,
    artifacts: &ArtifactSet,
    output_root: &Path,
    options: &RenderOptions,
) -> Result<JobReport> {
    let output_dir = output_root.join(&job.output_name);

    let source_dir = artifacts.kind_dir(job.source).filter(|d| d.is_dir());
    let Some(source_dir) = source_dir else {
        tracing::warn!(job = %job.output_name, kind = %job.source, "source folder absent, skipping job");
        return Ok(JobReport::skipped(
            &job.output_name,
            output_dir,
            format!("source folder `{}` not present", job.source),
        ));
    };

    let compare_dir = job.comparison.and_then(|kind| artifacts.kind_dir(kind));

    let results = render_dir_pair(
        &source_dir,
        compare_dir.as_deref(),
        &output_dir,
        options,
        job.title.as_deref(),
        job.compare_title.as_deref(),
    )?;

    Ok(JobReport {
        name: job.output_name.clone(),
        output_dir,
        skip_reason: None,
        results,
    })
}

/// Render samples from `source_dir`, paired positionally against
/// `compare_dir` when given.
///
/// Sources are the sorted recognized files, truncated to
/// `options.sample_count`; mismatched folder counts truncate pairing to the
/// shorter list. Output files are named `sample_NNN.png` so directory
/// listings sort stably. Per-sample load failures are recorded, not
/// propagated.
pub fn render_dir_pair(
    source_dir: &Path,
    compare_dir: Option<&Path>,
    output_dir: &Path,
    options: &RenderOptions,
    title: Option<&str>,
    compare_title: Option<&str>,
) -> Result<Vec<VisualizationResult>> {
    let mut sources = list_sample_files(source_dir)?;
    sources.truncate(options.sample_count);

    let compares = match compare_dir.filter(|d| d.is_dir()) {
        Some(dir) => {
            let mut files = list_sample_files(dir)?;
            files.truncate(options.sample_count);
            files
        }
        None => Vec::new(),
    };

    fs::create_dir_all(output_dir)?;

    let mut results = Vec::with_capacity(sources.len());
    for (index, source) in sources.iter().enumerate() {
        let output = output_dir.join(format!("sample_{index:03}.png"));
        let comparison = compares.get(index).cloned();

        let rendered = render_one(
            source,
            comparison.as_deref(),
            &output,
            options.scale,
            title,
            compare_title,
        );

        let (success, psnr) = match rendered {
            Ok(psnr) => (true, psnr),
            Err(err) => {
                tracing::warn!(sample = %source.display(), %err, "sample failed to render");
                (false, None)
            }
        };

        results.push(VisualizationResult {
            index,
            source: source.clone(),
            comparison,
            output,
            success,
            psnr,
        });
    }

    Ok(results)
}

/// Render a single sample (optionally paired), returning the pair's PSNR.
fn render_one(
    source: &Path,
    comparison: Option<&Path>,
    output: &Path,
    scale: PixelScale,
    title: Option<&str>,
    compare_title: Option<&str>,
) -> Result<Option<f64>> {
    let left = load_sample(source, scale)?;
    let left_caption = title
        .map(str::to_string)
        .unwrap_or_else(|| file_caption(source));

    match comparison {
        Some(compare_path) => {
            let right = load_sample(compare_path, scale)?;
            let right_caption = compare_title
                .map(str::to_string)
                .unwrap_or_else(|| file_caption(compare_path));

            let image = render_comparison(&left, &left_caption, &right, &right_caption);
            save_png(&image, output)?;

            let comparable =
                left.width() == right.width() && left.height() == right.height();
            Ok(comparable.then(|| psnr_unit(&left, &right)))
        }
        None => {
            let image = render_single(&left, &left_caption);
            save_png(&image, output)?;
            Ok(None)
        }
    }
}

fn file_caption(path: &Path) -> String {
    path.file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("sample")
        .to_string()
}

/// PSNR between two unit-range grayscale images of identical dimensions.
///
/// Returns infinity for identical images.
#[must_use]
pub fn psnr_unit(reference: &ImgVec<f32>, test: &ImgVec<f32>) -> f64 {
    assert_eq!(reference.width(), test.width());
    assert_eq!(reference.height(), test.height());

    let mut mse_sum = 0.0_f64;
    let mut count = 0usize;
    for (ref_row, test_row) in reference.rows().zip(test.rows()) {
        for (r, t) in ref_row.iter().zip(test_row.iter()) {
            let diff = f64::from(*r) - f64::from(*t);
            mse_sum += diff * diff;
            count += 1;
        }
    }

    let mse = mse_sum / count as f64;
    if mse == 0.0 {
        f64::INFINITY
    } else {
        10.0 * (1.0 / mse).log10()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::npy::encode_npy_f32;
    use tempfile::TempDir;

    fn write_samples(dir: &Path, count: usize, value: f32) {
        fs::create_dir_all(dir).unwrap();
        for i in 0..count {
            let data = vec![value; 16];
            fs::write(
                dir.join(format!("{i:04}.npy")),
                encode_npy_f32(&[4, 4], &data),
            )
            .unwrap();
        }
    }

    fn options(sample_count: usize) -> RenderOptions {
        RenderOptions {
            sample_count,
            scale: PixelScale::Auto,
        }
    }

    #[test]
    fn test_default_jobs_cover_standard_pairings() {
        let jobs = default_jobs();
        let names: Vec<&str> = jobs.iter().map(|j| j.output_name.as_str()).collect();
        assert_eq!(
            names,
            vec!["fake_vs_real", "fake_a_vs_real_a", "cycle_consistency_a"]
        );
        assert!(jobs.iter().all(|j| j.comparison.is_some()));
    }

    #[test]
    fn test_paired_rendering_counts_and_names() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("fake_b");
        let cmp = tmp.path().join("real_b");
        write_samples(&src, 3, 0.2);
        write_samples(&cmp, 3, 0.8);
        let out = tmp.path().join("out");

        let results =
            render_dir_pair(&src, Some(&cmp), &out, &options(10), None, None).unwrap();
        assert_eq!(results.len(), 3);
        for (i, result) in results.iter().enumerate() {
            assert!(result.success);
            assert!(result.comparison.is_some());
            assert!(result.psnr.is_some());
            let name = format!("sample_{i:03}.png");
            assert_eq!(result.output, out.join(&name));
            assert!(result.output.is_file());
        }
    }

    #[test]
    fn test_mismatched_counts_truncate_pairing() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("fake_b");
        let cmp = tmp.path().join("real_b");
        write_samples(&src, 5, 0.2);
        write_samples(&cmp, 2, 0.8);
        let out = tmp.path().join("out");

        let results =
            render_dir_pair(&src, Some(&cmp), &out, &options(10), None, None).unwrap();
        // Every source still renders; only the first two are paired.
        assert_eq!(results.len(), 5);
        assert_eq!(results.iter().filter(|r| r.comparison.is_some()).count(), 2);
    }

    #[test]
    fn test_sample_count_limits_sources() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("fake_b");
        write_samples(&src, 8, 0.5);
        let out = tmp.path().join("out");

        let results = render_dir_pair(&src, None, &out, &options(3), None, None).unwrap();
        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|r| r.comparison.is_none()));
    }

    #[test]
    fn test_corrupt_sample_is_recorded_not_fatal() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("fake_b");
        write_samples(&src, 2, 0.5);
        fs::write(src.join("0000.npy"), b"garbage").unwrap();
        let out = tmp.path().join("out");

        let results = render_dir_pair(&src, None, &out, &options(10), None, None).unwrap();
        assert_eq!(results.len(), 2);
        assert!(!results[0].success);
        assert!(results[1].success);
    }

    #[test]
    fn test_zero_dimension_sample_is_recorded_not_fatal() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("fake_b");
        write_samples(&src, 2, 0.5);
        // Well-formed NPY with a degenerate shape; must not abort the job.
        fs::write(src.join("0000.npy"), encode_npy_f32(&[2, 0], &[])).unwrap();
        let out = tmp.path().join("out");

        let results = render_dir_pair(&src, None, &out, &options(10), None, None).unwrap();
        assert_eq!(results.len(), 2);
        assert!(!results[0].success);
        assert!(results[1].success);
    }

    #[test]
    fn test_render_job_skips_absent_source() {
        let tmp = TempDir::new().unwrap();
        let artifacts = ArtifactSet {
            dir: tmp.path().to_path_buf(),
            kinds: vec![OutputKind::RealB],
        };
        let job = ComparisonJob::paired(OutputKind::RecoA, OutputKind::RealA, "cycle");

        let report = render_job(&job, &artifacts, tmp.path(), &options(10)).unwrap();
        assert!(report.skip_reason.is_some());
        assert!(report.results.is_empty());
        assert_eq!(report.rendered(), 0);
    }

    #[test]
    fn test_render_job_single_panel_without_comparison() {
        let tmp = TempDir::new().unwrap();
        let container = tmp.path().join("ndarrays_eval-test");
        write_samples(&container.join("fake_b"), 2, 0.4);
        let artifacts = ArtifactSet {
            dir: container,
            kinds: vec![OutputKind::FakeB],
        };
        let job = ComparisonJob::paired(OutputKind::FakeB, OutputKind::RealB, "fake_vs_real");
        let out = tmp.path().join("vis");

        let report = render_job(&job, &artifacts, &out, &options(10)).unwrap();
        assert!(report.skip_reason.is_none());
        assert_eq!(report.results.len(), 2);
        assert!(report.results.iter().all(|r| r.comparison.is_none()));
    }

    #[test]
    fn test_title_overrides_used() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("fake_b");
        write_samples(&src, 1, 0.5);
        let out = tmp.path().join("out");

        // Overrides must not panic even when longer than the panel.
        let results = render_dir_pair(
            &src,
            None,
            &out,
            &options(1),
            Some("Generated (domain B)"),
            None,
        )
        .unwrap();
        assert!(results[0].success);
    }

    #[test]
    fn test_psnr_identical_is_infinite() {
        let img = ImgVec::new(vec![0.5_f32; 16], 4, 4);
        assert!(psnr_unit(&img, &img).is_infinite());
    }

    #[test]
    fn test_psnr_known_value() {
        let a = ImgVec::new(vec![0.5_f32; 16], 4, 4);
        let b = ImgVec::new(vec![0.6_f32; 16], 4, 4);
        // Constant difference of 0.1: 10 * log10(1 / 0.01) = 20 dB.
        let psnr = psnr_unit(&a, &b);
        assert!((psnr - 20.0).abs() < 0.05);
    }
}
