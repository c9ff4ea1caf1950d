//! i2i-eval CLI - checkpoint evaluation and comparison visualization

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use i2i_eval::{PixelScale, Split};
use tracing_subscriber::EnvFilter;

mod commands;
mod translator;

/// Checkpoint evaluation and visualization tool for image-to-image
/// translation models.
#[derive(Parser)]
#[command(name = "i2i-eval")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate translations for a checkpoint and render comparisons
    Run {
        /// Checkpoint directory (default: latest under the search root)
        checkpoint: Option<PathBuf>,

        /// Number of samples to generate and render per pairing
        #[arg(short = 'n', long, default_value_t = 10)]
        samples: usize,

        /// Dataset split to evaluate
        #[arg(long, default_value = "test")]
        split: Split,

        /// Specific epoch to evaluate (default: final weights)
        #[arg(long)]
        epoch: Option<u32>,

        /// Output directory for visualizations
        /// (default: `<checkpoint>/visualizations`)
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Root searched for checkpoints when none is given explicitly
        #[arg(long, env = "I2I_EVAL_OUTDIR", default_value = ".")]
        search_dir: PathBuf,

        /// Command prefix invoked as the translation step
        #[arg(long, default_value = "python scripts/translate_data.py")]
        translate_cmd: String,

        /// How to map raw pixel values into the unit range
        #[arg(long, value_enum, default_value_t = PixelScaleArg::Auto)]
        pixel_scale: PixelScaleArg,

        /// Print the run report as JSON instead of the summary
        #[arg(long)]
        json: bool,
    },

    /// List a checkpoint's contents without generating or rendering
    Inspect {
        /// Checkpoint directory (default: latest under the search root)
        checkpoint: Option<PathBuf>,

        /// Dataset split whose evaluations to list
        #[arg(long, default_value = "test")]
        split: Split,

        /// Specific epoch whose evaluations to list
        #[arg(long)]
        epoch: Option<u32>,

        /// Root searched for checkpoints when none is given explicitly
        #[arg(long, env = "I2I_EVAL_OUTDIR", default_value = ".")]
        search_dir: PathBuf,
    },

    /// Render comparisons from explicit sample directories
    Render {
        /// Directory holding the samples to render
        source_dir: PathBuf,

        /// Directory to write the panel images to
        output_dir: PathBuf,

        /// Number of samples to render
        #[arg(short = 'n', long, default_value_t = 10)]
        samples: usize,

        /// Directory paired against the source, by sorted position
        #[arg(long)]
        compare_with: Option<PathBuf>,

        /// Caption override for the source panel
        #[arg(long)]
        title: Option<String>,

        /// Caption override for the comparison panel
        #[arg(long)]
        compare_title: Option<String>,

        /// How to map raw pixel values into the unit range
        #[arg(long, value_enum, default_value_t = PixelScaleArg::Auto)]
        pixel_scale: PixelScaleArg,
    },
}

/// CLI spelling of [`PixelScale`].
#[derive(Debug, Clone, Copy, ValueEnum)]
enum PixelScaleArg {
    /// Rescale by 1/255 iff the sample's maximum exceeds 1.0
    Auto,
    /// Values are already in [0, 1]
    Unit,
    /// Values are raw 8-bit; always rescale
    #[value(name = "8bit")]
    EightBit,
}

impl From<PixelScaleArg> for PixelScale {
    fn from(arg: PixelScaleArg) -> Self {
        match arg {
            PixelScaleArg::Auto => Self::Auto,
            PixelScaleArg::Unit => Self::Unit,
            PixelScaleArg::EightBit => Self::EightBit,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if cli.verbose { "debug" } else { "warn" })
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Run {
            checkpoint,
            samples,
            split,
            epoch,
            output_dir,
            search_dir,
            translate_cmd,
            pixel_scale,
            json,
        } => commands::run::run(
            checkpoint,
            samples,
            split,
            epoch,
            output_dir,
            search_dir,
            &translate_cmd,
            pixel_scale.into(),
            json,
        ),
        Commands::Inspect {
            checkpoint,
            split,
            epoch,
            search_dir,
        } => commands::inspect::run(checkpoint, split, epoch, search_dir),
        Commands::Render {
            source_dir,
            output_dir,
            samples,
            compare_with,
            title,
            compare_title,
            pixel_scale,
        } => commands::render::run(
            &source_dir,
            &output_dir,
            samples,
            compare_with.as_deref(),
            title.as_deref(),
            compare_title.as_deref(),
            pixel_scale.into(),
        ),
    }
}
