mod app;
mod ui;

use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use eframe::egui;
use log::{error, info};

use app::SnapclassApp;
use snapclass::{
    BuiltinModel, Classifier, ModelManager, ModelSource, PreprocessConfig, RuntimeConfig,
    SessionController,
};

#[derive(Parser, Debug)]
#[command(name = "snapclass", version, about = "Classify images with a pretrained network")]
struct Args {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Builtin model to fetch and load
    #[arg(long, value_enum, default_value_t = BuiltinModel::ResNet50, global = true)]
    model: BuiltinModel,

    /// Cache directory for downloaded models
    #[arg(long, global = true)]
    cache_dir: Option<PathBuf>,

    /// Load this ONNX file instead of a builtin model
    #[arg(long, global = true)]
    model_file: Option<PathBuf>,

    /// Label file for --model-file, one class name per line
    #[arg(long, requires = "model_file", global = true)]
    labels: Option<PathBuf>,

    /// Intra-op threads for inference (0 lets the runtime decide)
    #[arg(long, default_value_t = 0, global = true)]
    threads: usize,

    /// Number of predictions to report per image
    #[arg(short = 'k', long, default_value = "5", value_parser = parse_top_k, global = true)]
    top_k: NonZeroUsize,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Open the desktop application (default)
    Gui,
    /// Classify images and print the top predictions
    Classify {
        #[arg(required = true)]
        images: Vec<PathBuf>,
        /// Print predictions as JSON
        #[arg(long)]
        json: bool,
    },
    /// Load the model and print a summary
    Info,
    /// Download the builtin model into the cache
    Download {
        /// Remove cached files first
        #[arg(long)]
        fresh: bool,
    },
}

fn parse_top_k(value: &str) -> Result<NonZeroUsize, String> {
    let k: usize = value.parse().map_err(|e| format!("{e}"))?;
    NonZeroUsize::new(k).ok_or_else(|| "must be at least 1".to_string())
}

impl Args {
    fn model_source(&self) -> Result<ModelSource> {
        if let Some(model_path) = &self.model_file {
            return Ok(ModelSource::Custom {
                model_path: model_path.clone(),
                labels_path: self.labels.clone(),
            });
        }

        let manager = match &self.cache_dir {
            Some(dir) => ModelManager::new(dir),
            None => ModelManager::new_default(),
        }
        .context("Failed to create model cache directory")?;

        Ok(ModelSource::Builtin {
            model: self.model,
            manager,
        })
    }

    fn runtime_config(&self) -> RuntimeConfig {
        if self.threads > 0 {
            RuntimeConfig::with_threads(self.threads)
        } else {
            RuntimeConfig::default()
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    let level = match args.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    snapclass::init_logger(level);

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    let source = args.model_source()?;
    let runtime_config = args.runtime_config();
    let preprocess = PreprocessConfig::default();

    let result = match &args.command {
        None | Some(Command::Gui) => {
            run_gui(&runtime, source, runtime_config, preprocess, args.top_k)
        }
        Some(Command::Classify { images, json }) => {
            let classifier = load_blocking(&runtime, &source, &runtime_config, &preprocess)?;
            run_classify(&classifier, images, args.top_k.get(), *json)
        }
        Some(Command::Info) => {
            let classifier = load_blocking(&runtime, &source, &runtime_config, &preprocess)?;
            print_info(&classifier, &source);
            Ok(())
        }
        Some(Command::Download { fresh }) => {
            runtime
                .block_on(source.prepare(*fresh))
                .with_context(|| format!("Failed to prepare {}", source.describe()))?;
            println!("{} is ready", source.describe());
            Ok(())
        }
    };

    runtime.shutdown_background();
    result
}

fn load_blocking(
    runtime: &tokio::runtime::Runtime,
    source: &ModelSource,
    runtime_config: &RuntimeConfig,
    preprocess: &PreprocessConfig,
) -> Result<Classifier> {
    info!("Loading {}...", source.describe());
    runtime
        .block_on(source.prepare(false))
        .with_context(|| format!("Failed to prepare {}", source.describe()))?;
    source
        .load(runtime_config, preprocess)
        .with_context(|| format!("Failed to load {}", source.describe()))
}

// ---------------------------------------------------------------------------
// Desktop shell
// ---------------------------------------------------------------------------

fn run_gui(
    runtime: &tokio::runtime::Runtime,
    source: ModelSource,
    runtime_config: RuntimeConfig,
    preprocess: PreprocessConfig,
    top_k: NonZeroUsize,
) -> Result<()> {
    let handle = runtime.handle().clone();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1000.0, 700.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Snapclass – Image Classifier",
        options,
        Box::new(move |cc| {
            let ctx = cc.egui_ctx.clone();
            let loader_handle = handle.clone();

            let session = SessionController::builder(handle)
                .top_k(top_k)
                .on_update(move || ctx.request_repaint())
                .start(move || {
                    loader_handle.block_on(source.prepare(false))?;
                    source.load(&runtime_config, &preprocess)
                });

            Ok(Box::new(SnapclassApp::new(session)))
        }),
    )
    .map_err(|e| anyhow::anyhow!("Desktop shell failed: {e}"))
}

// ---------------------------------------------------------------------------
// Headless commands
// ---------------------------------------------------------------------------

fn run_classify(classifier: &Classifier, images: &[PathBuf], top_k: usize, json: bool) -> Result<()> {
    let mut predictions = Vec::with_capacity(images.len());
    let mut failures = 0;

    for path in images {
        match classifier.predict(path, top_k) {
            Ok(prediction) => {
                if !json {
                    println!("{}:\n{}\n", path.display(), prediction);
                }
                predictions.push(prediction);
            }
            Err(e) => {
                failures += 1;
                error!("Failed to classify {:?}: {e}", path);
                eprintln!("{}: {e}", path.display());
            }
        }
    }

    if json {
        let out = serde_json::to_string_pretty(&predictions).context("Failed to encode predictions")?;
        println!("{out}");
    }

    if failures > 0 {
        anyhow::bail!("{failures} of {} images could not be classified", images.len());
    }
    Ok(())
}

fn print_info(classifier: &Classifier, source: &ModelSource) {
    let info = classifier.info();

    println!("Snapclass Image Classifier");
    println!("{}", "=".repeat(50));
    println!("Model: {}", source.describe());
    if let Some(path) = &info.model_path {
        println!("  - File: {path}");
    }
    if let Some(characteristics) = source.characteristics() {
        println!("  - Download size: about {} MB", characteristics.model_size_mb);
    }
    match info.num_classes {
        Some(n) => println!("  - Output classes: {n}"),
        None => println!("  - Output classes: (not declared by the model)"),
    }
    println!("  - Input size: {0}x{0} RGB", info.input_size);
    println!("  - Resize shorter side to: {}", info.resize_shorter);
    println!("  - Class labels loaded: {}", info.num_labels);
    println!("  - Available classes (sample): {:?}...", info.sample_labels);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top_k_flag() {
        assert_eq!(parse_top_k("3").unwrap().get(), 3);
        assert!(parse_top_k("0").is_err());
        assert!(parse_top_k("-1").is_err());

        let args = Args::try_parse_from(["snapclass", "classify", "a.png"]).unwrap();
        assert_eq!(args.top_k.get(), 5);
        assert!(Args::try_parse_from(["snapclass", "-k", "0", "info"]).is_err());
    }
}
