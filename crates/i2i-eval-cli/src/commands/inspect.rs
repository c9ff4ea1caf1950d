//! Listing-only mode: report what a checkpoint holds, touch nothing.

use std::path::PathBuf;

use anyhow::{Context, Result};
use i2i_eval::checkpoint::inspect;
use i2i_eval::{EvalSelector, Split};

use super::find_checkpoint;

pub fn run(
    checkpoint: Option<PathBuf>,
    split: Split,
    epoch: Option<u32>,
    search_dir: PathBuf,
) -> Result<()> {
    let checkpoint = find_checkpoint(checkpoint, &search_dir)?;
    let selector = EvalSelector { epoch, split };
    let inventory =
        inspect(&checkpoint, &selector).context("cannot inventory checkpoint directory")?;

    println!("Checkpoint: {}", inventory.path.display());
    if let Some(name) = &inventory.name {
        println!(
            "  model: {}  discriminator: {}  generator: {}  label: {}",
            name.model,
            name.discriminator.as_deref().unwrap_or("-"),
            name.generator.as_deref().unwrap_or("-"),
            name.label
        );
    }

    if inventory.weights.is_empty() {
        println!("  no weights files (net_*.pth)");
    } else {
        println!("  {} weights file(s):", inventory.weights.len());
        for (i, name) in inventory.weights.iter().enumerate() {
            if i == 5 {
                println!("    ... and {} more", inventory.weights.len() - 5);
                break;
            }
            println!("    {name}");
        }
    }

    match inventory.last_epoch {
        Some(epoch) => println!("  training history up to epoch {epoch}"),
        None => println!("  no training history"),
    }

    if inventory.evals.is_empty() {
        println!("  no evaluation arrays for {selector}");
    } else {
        println!("  evaluation arrays for {selector}:");
        for eval in &inventory.evals {
            println!("    {}", eval.path.display());
            for kind in &eval.kinds {
                println!("      {}: {} file(s)", kind.name, kind.files);
            }
        }
    }

    if inventory.visualizations.is_empty() {
        println!("  no visualizations");
    } else {
        println!("  visualizations:");
        for vis in &inventory.visualizations {
            println!("    {}: {} image(s)", vis.name, vis.files);
        }
    }

    Ok(())
}
