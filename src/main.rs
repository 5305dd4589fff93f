use anyhow::{Context, Result};
use clap::Parser;
use ecg_analyzer::{
    config::{Config, InputConfig},
    ecg::EcgPipeline,
    models::{ModelManager, PixelRange, TensorSpec},
    web::serve,
};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ecg-analyzer")]
#[command(about = "ONNX-powered ECG arrhythmia classification service")]
struct Args {
    /// Server bind address
    #[arg(long, default_value = "0.0.0.0:8000")]
    bind: String,

    /// Number of worker threads
    #[arg(long)]
    workers: Option<usize>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// ONNX model path
    #[arg(long, default_value = "models/ecg_model.onnx")]
    model_path: String,

    /// Model input height
    #[arg(long, default_value_t = 224)]
    input_height: usize,

    /// Model input width
    #[arg(long, default_value_t = 224)]
    input_width: usize,

    /// Feed the model a single luma channel instead of RGB
    #[arg(long)]
    grayscale: bool,

    /// Pixel range the model was trained on (zero-to-one | minus-one-to-one)
    #[arg(long, default_value = "zero-to-one")]
    pixel_range: PixelRange,

    /// Maximum accepted image size in MiB
    #[arg(long, default_value_t = 50)]
    max_upload_mb: usize,

    /// Analyze a single image file, print the result as JSON and exit
    #[arg(long)]
    image: Option<PathBuf>,

    /// Enable development mode
    #[arg(long)]
    dev: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // 初始化日志系统
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)),
        )
        .with_target(false)
        .init();

    let input_config = InputConfig {
        spec: TensorSpec::new(
            args.input_height,
            args.input_width,
            if args.grayscale { 1 } else { 3 },
        ),
        pixel_range: args.pixel_range,
        max_image_bytes: InputConfig::max_image_bytes_from_mib(args.max_upload_mb)?,
    };

    let config = Config::new(
        args.bind,
        args.model_path,
        args.workers,
        args.dev,
        input_config,
    )?;

    tracing::info!("Model path: {}", config.model_path.display());

    if let Some(path) = args.image {
        return analyze_once(config, &path);
    }

    tracing::info!("Starting ECG analyzer service...");
    tracing::info!("Bind address: {}", config.bind_addr);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.workers)
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;

    runtime.block_on(serve(config))?;

    Ok(())
}

fn analyze_once(config: Config, path: &std::path::Path) -> Result<()> {
    let manager = ModelManager::init(config)?;
    let report = EcgPipeline::from_manager(&manager)
        .process_path(path)
        .with_context(|| format!("failed to analyze {}", path.display()))?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
