use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use retrocam::models::AppConfig;
use retrocam::services::{CapturePipeline, TestPatternCamera};

#[derive(Parser)]
#[command(name = "retrocam")]
#[command(about = "Retro camera core - capture, quantize and export limited-palette photos")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "retrocam.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the live preview loop against the synthetic test camera
    Preview {
        /// How long to run, in seconds
        #[arg(short, long, default_value_t = 2)]
        seconds: u64,
    },
    /// Capture photos from the synthetic test camera and export PNGs
    Snap {
        /// Number of photos to capture
        #[arg(short = 'n', long, default_value_t = 1)]
        count: usize,

        /// Output directory for the exported files
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        /// Override the configured export scale
        #[arg(short, long)]
        scale: Option<u32>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "retrocam=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().without_time())
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load_from_path(&cli.config);

    match cli.command {
        Some(Commands::Preview { seconds }) => run_preview(config, seconds).await,
        Some(Commands::Snap {
            count,
            output,
            scale,
        }) => run_snap(config, count, &output, scale).await,
        None => {
            run_status(&config);
            Ok(())
        }
    }
}

/// Drive the preview loop for a while and report the frame throughput.
async fn run_preview(config: AppConfig, seconds: u64) -> anyhow::Result<()> {
    let camera = Arc::new(TestPatternCamera::new());
    let pipeline = CapturePipeline::new(camera, config.settings.clone());

    let mut preview = pipeline.subscribe_preview();
    pipeline.start_stream(config.camera.facing).await?;

    let deadline = tokio::time::Instant::now() + Duration::from_secs(seconds);
    let mut frames = 0usize;
    while tokio::time::timeout_at(deadline, preview.changed()).await.is_ok_and(|r| r.is_ok()) {
        if preview.borrow_and_update().is_some() {
            frames += 1;
        }
    }

    pipeline.stop_stream().await;
    println!(
        "preview: {} frames in {}s ({:.1} fps)",
        frames,
        seconds,
        frames as f64 / seconds.max(1) as f64
    );
    Ok(())
}

/// Capture `count` photos and write the exports into `output`.
async fn run_snap(
    config: AppConfig,
    count: usize,
    output: &PathBuf,
    scale: Option<u32>,
) -> anyhow::Result<()> {
    let export_scale = scale.unwrap_or(config.settings.export_scale);
    let camera = Arc::new(TestPatternCamera::new());
    let pipeline = CapturePipeline::new(camera, config.settings.clone());

    pipeline.start_stream(config.camera.facing).await?;
    std::fs::create_dir_all(output)?;

    for i in 0..count {
        let photo = pipeline.capture().await?;
        let export = pipeline.export_photo(i, export_scale).await?;
        let path = output.join(&export.filename);
        std::fs::write(&path, &export.bytes)?;
        println!(
            "saved {} ({}x{} photo, {} bytes)",
            path.display(),
            photo.buffer.width(),
            photo.buffer.height(),
            export.bytes.len()
        );
    }

    pipeline.stop_stream().await;
    Ok(())
}

/// Print the effective configuration.
fn run_status(config: &AppConfig) {
    println!("retrocam - retro camera core");
    println!();
    println!("  facing:           {}", config.camera.facing);
    println!(
        "  processing width: {}",
        config.settings.processing_width.pixels()
    );
    println!("  shades:           {}", config.settings.levels);
    println!("  palette:          {}", config.settings.palette);
    println!("  dither:           {}", config.settings.dither);
    println!("  export scale:     {}x", config.settings.export_scale);
    println!();
    println!("run `retrocam preview` or `retrocam snap` to exercise the pipeline");
}
