//! Full pipeline run: generate translations, resolve, render, report.

use std::path::PathBuf;

use anyhow::{Context, Result};
use i2i_eval::{EvalSelector, Pipeline, PipelineConfig, PixelScale, RunReport, Split};

use crate::translator::CommandTranslator;

#[allow(clippy::too_many_arguments)]
pub fn run(
    checkpoint: Option<PathBuf>,
    samples: usize,
    split: Split,
    epoch: Option<u32>,
    output_dir: Option<PathBuf>,
    search_dir: PathBuf,
    translate_cmd: &str,
    pixel_scale: PixelScale,
    json: bool,
) -> Result<()> {
    let translator = CommandTranslator::new(translate_cmd)
        .context("invalid --translate-cmd template")?;

    let mut builder = PipelineConfig::builder()
        .search_dir(search_dir)
        .selector(EvalSelector { epoch, split })
        .sample_count(samples)
        .scale(pixel_scale);
    if let Some(path) = checkpoint {
        builder = builder.checkpoint(path);
    }
    if let Some(path) = output_dir {
        builder = builder.output_dir(path);
    }

    let pipeline = Pipeline::new(builder.build(), translator.into_translate_fn());
    let report = pipeline.run().context("evaluation pipeline failed")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

fn print_report(report: &RunReport) {
    println!("Checkpoint: {}", report.checkpoint.display());
    if let Some(name) = &report.checkpoint_name {
        println!(
            "  model: {}  generator: {}  label: {}",
            name.model,
            name.generator.as_deref().unwrap_or("-"),
            name.label
        );
    }
    println!("Selector:   {}", report.selector);
    println!("Artifacts:  {}", report.artifact_dir.display());
    println!();

    for job in &report.jobs {
        match &job.skip_reason {
            Some(reason) => println!("  {}: skipped ({reason})", job.name),
            None => {
                let failed = job.results.len() - job.rendered();
                if failed > 0 {
                    println!(
                        "  {}: {} rendered, {} failed -> {}",
                        job.name,
                        job.rendered(),
                        failed,
                        job.output_dir.display()
                    );
                } else {
                    println!(
                        "  {}: {} rendered -> {}",
                        job.name,
                        job.rendered(),
                        job.output_dir.display()
                    );
                }
            }
        }
    }

    println!();
    println!(
        "{} comparison images under {}",
        report.total_rendered(),
        report.output_dir.display()
    );
}
