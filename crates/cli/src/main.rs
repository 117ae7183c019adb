use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use clap::Parser;

use flexiblur_core::blurring::domain::blur_settings::{BlurMode, CustomSettings, MotionDirection};
use flexiblur_core::pipeline::batch_config::BatchConfig;
use flexiblur_core::pipeline::batch_dispatcher::BatchDispatcher;
use flexiblur_core::pipeline::export::export_outputs;
use flexiblur_core::pipeline::media_processor::{BlurJob, FileMediaProcessor};
use flexiblur_core::shared::constants::{MAX_BLUR_RADIUS, MAX_KERNEL_SIZE};
use flexiblur_core::shared::region::Region;
use flexiblur_core::shared::time_window::TimeWindow;

/// Blur a rectangular region across a batch of images and videos.
///
/// Images are overwritten in place. Videos are written to the output
/// directory under their original file name.
#[derive(Parser, Debug)]
#[command(name = "flexiblur")]
struct Cli {
    /// Input images (.jpg, .jpeg, .png) and videos (.mp4, .avi).
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// JSON config with `output.directory` and `parallel_processing.max_workers`.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory for processed videos (overrides the config file).
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Maximum number of files processed at once (overrides the config file).
    #[arg(long)]
    max_workers: Option<usize>,

    /// Region to blur as X,Y,WIDTH,HEIGHT. Omit to blur the whole frame.
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    region: Option<Vec<i32>>,

    /// Blur mode: heavy, slight, custom, motion, radial.
    #[arg(long, default_value = "heavy")]
    mode: String,

    /// Gaussian kernel size for custom mode (even values are rounded up).
    #[arg(long)]
    ksize: Option<i32>,

    /// Gaussian sigma for custom mode (0 = derive from kernel size).
    #[arg(long)]
    sigma: Option<f64>,

    /// Motion blur direction: horizontal or vertical.
    #[arg(long)]
    direction: Option<String>,

    /// Blur radius for radial mode.
    #[arg(long)]
    angle: Option<f64>,

    /// Video start time in seconds.
    #[arg(long, default_value = "0")]
    start: f64,

    /// Video end time in seconds (default: end of clip).
    #[arg(long)]
    end: Option<f64>,

    /// Copy finished outputs into this directory.
    #[arg(long, requires = "names")]
    save_dir: Option<PathBuf>,

    /// Output names for --save-dir, one per input, in input order.
    #[arg(long, value_delimiter = ',', requires = "save_dir")]
    names: Option<Vec<String>>,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let config = build_config(&cli)?;
    let job = build_job(&cli)?;
    log::info!(
        "{} mode, region {:?}, output to {}",
        job.mode,
        job.region,
        config.output.directory.display()
    );

    let processor = Arc::new(FileMediaProcessor::new(config.output.directory.clone()));
    let dispatcher = BatchDispatcher::new(&config, processor).with_progress(Box::new(
        |current, total| {
            eprint!("\rProcessing media {current}/{total}");
        },
    ));

    let result = dispatcher.run(&cli.inputs, &job)?;
    eprintln!();
    println!("{} of {} items processed", result.len(), cli.inputs.len());
    for (input, output) in result.entries() {
        println!("  {} -> {}", input.display(), output.display());
    }

    if let (Some(save_dir), Some(names)) = (&cli.save_dir, &cli.names) {
        let saved = export_outputs(&cli.inputs, &result, names, save_dir)?;
        log::info!("Saved {} files to {}", saved.len(), save_dir.display());
    }

    Ok(())
}

fn build_config(cli: &Cli) -> Result<BatchConfig, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => BatchConfig::load(path)?,
        None => BatchConfig::default(),
    };
    if let Some(dir) = &cli.output_dir {
        config.output.directory = dir.clone();
    }
    if let Some(workers) = cli.max_workers {
        config.parallel_processing.max_workers = workers;
    }
    config.validate()?;
    Ok(config)
}

fn build_job(cli: &Cli) -> Result<BlurJob, Box<dyn std::error::Error>> {
    let mode: BlurMode = cli.mode.parse()?;

    let mut settings = CustomSettings::default();
    if let Some(ksize) = cli.ksize {
        settings.ksize = ksize;
    }
    if let Some(sigma) = cli.sigma {
        settings.sigma = sigma;
    }
    if let Some(direction) = &cli.direction {
        settings.direction = direction.parse::<MotionDirection>()?;
    }
    if let Some(angle) = cli.angle {
        settings.angle = angle;
    }

    let region = match &cli.region {
        Some(values) => {
            Region::from_xywh(values).ok_or("Region must be four values: X,Y,WIDTH,HEIGHT")?
        }
        None => Region::Whole,
    };

    Ok(BlurJob {
        region,
        mode,
        settings,
        window: TimeWindow::new(cli.start, cli.end),
    })
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(region) = &cli.region {
        if region.len() != 4 {
            return Err(format!(
                "Region must be four values X,Y,WIDTH,HEIGHT, got {}",
                region.len()
            )
            .into());
        }
    }
    if let Some(ksize) = cli.ksize {
        if !(1..=MAX_KERNEL_SIZE).contains(&ksize) {
            return Err(
                format!("Kernel size must be between 1 and {MAX_KERNEL_SIZE}, got {ksize}").into(),
            );
        }
    }
    if let Some(sigma) = cli.sigma {
        if !sigma.is_finite() || sigma < 0.0 {
            return Err(format!("Sigma must be a non-negative number, got {sigma}").into());
        }
    }
    if let Some(angle) = cli.angle {
        if !angle.is_finite() || !(0.0..=MAX_BLUR_RADIUS).contains(&angle) {
            return Err(
                format!("Angle must be between 0 and {MAX_BLUR_RADIUS}, got {angle}").into(),
            );
        }
    }
    if !cli.start.is_finite() || cli.start < 0.0 {
        return Err(format!("Start time must be non-negative, got {}", cli.start).into());
    }
    if let Some(end) = cli.end {
        if !end.is_finite() || end <= cli.start {
            return Err(format!(
                "End time ({end}) must be after start time ({})",
                cli.start
            )
            .into());
        }
    }
    if cli.max_workers == Some(0) {
        return Err("Max workers must be at least 1".into());
    }
    if let Some(names) = &cli.names {
        if names.len() != cli.inputs.len() {
            return Err(format!(
                "Got {} names for {} inputs; --names needs one per input",
                names.len(),
                cli.inputs.len()
            )
            .into());
        }
    }
    Ok(())
}
