//! Standalone rendering over explicit directories.

use std::path::Path;

use anyhow::{ensure, Context, Result};
use i2i_eval::{render_dir_pair, PixelScale, RenderOptions};

pub fn run(
    source_dir: &Path,
    output_dir: &Path,
    samples: usize,
    compare_with: Option<&Path>,
    title: Option<&str>,
    compare_title: Option<&str>,
    pixel_scale: PixelScale,
) -> Result<()> {
    ensure!(
        source_dir.is_dir(),
        "source directory not found: {}",
        source_dir.display()
    );

    let options = RenderOptions {
        sample_count: samples,
        scale: pixel_scale,
    };
    let results = render_dir_pair(
        source_dir,
        compare_with,
        output_dir,
        &options,
        title,
        compare_title,
    )
    .context("rendering failed")?;

    let rendered = results.iter().filter(|r| r.success).count();
    for result in results.iter().filter(|r| !r.success) {
        println!("  failed: {}", result.source.display());
    }
    println!(
        "{rendered} of {} sample(s) rendered to {}",
        results.len(),
        output_dir.display()
    );
    Ok(())
}
