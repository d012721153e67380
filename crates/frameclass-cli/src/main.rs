//! frameclass CLI
//!
//! Lists bundled models, prints their descriptors, and runs image files
//! through the frame pipeline as if they were camera frames.

use anyhow::{bail, Context, Result};
use clap::Parser;
use frameclass_classifiers::{
    ActiveClassifier, BackendKind, ClassifierAvailability, ClassifierFactory, FrameOutcome,
    FramePipeline, FrameclassConfig,
};
use frameclass_core::Frame;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

mod cli;

use cli::{Cli, Command};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    let mut config = FrameclassConfig::load_or_default(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;
    if let Some(models_dir) = cli.models_dir {
        config.models_dir = models_dir;
    }
    config.validate()?;
    debug!("Using models from {}", config.models_dir.display());

    match cli.command {
        Command::Models => list_models(&config),
        Command::Describe { model } => describe(&config, &model),
        Command::Classify {
            model,
            json,
            images,
        } => classify(&config, model, json, images).await,
    }
}

fn list_models(config: &FrameclassConfig) -> Result<()> {
    let catalog = config.model_store().catalog()?;
    if catalog.is_empty() {
        println!("No models found in {}", config.models_dir.display());
        return Ok(());
    }

    for backend in [BackendKind::TracedModule, BackendKind::TensorGraph] {
        println!("{}:", backend);
        for model in catalog.models(backend) {
            println!("  {}", model);
        }
    }
    Ok(())
}

fn describe(config: &FrameclassConfig, model: &str) -> Result<()> {
    let descriptor = config.model_store().descriptor_for(model)?;
    println!("{}", serde_json::to_string_pretty(&descriptor)?);
    Ok(())
}

async fn classify(
    config: &FrameclassConfig,
    model: Option<String>,
    json: bool,
    images: Vec<PathBuf>,
) -> Result<()> {
    let store = config.model_store();
    let model = match model {
        Some(model) => model,
        None => {
            let catalog = store.catalog()?;
            match catalog.default_model(config.preferred_backend) {
                Some((_, model)) => model.to_string(),
                None => bail!("No models found in {}", config.models_dir.display()),
            }
        }
    };

    let factory = ClassifierFactory::new(store);
    let availability = factory.create_for_model(&model);
    if let ClassifierAvailability::Unavailable { model, reason } = &availability {
        bail!("Model {} is unavailable: {}", model, reason);
    }

    let active = Arc::new(ActiveClassifier::empty());
    active.activate(availability);
    info!("Classifying {} image(s) with {}", images.len(), model);

    let (pipeline, mut feed) = FramePipeline::spawn(Arc::clone(&active), config.frame_queue_capacity);

    let sources = images.clone();
    let producer = tokio::spawn(async move {
        for (sequence, path) in sources.into_iter().enumerate() {
            let decoded = tokio::task::spawn_blocking({
                let path = path.clone();
                move || image::open(&path).map(|image| image.to_rgb8())
            })
            .await;

            match decoded {
                Ok(Ok(image)) => {
                    if !pipeline.submit_wait(Frame::new(sequence as u64, image)).await {
                        break;
                    }
                }
                Ok(Err(e)) => warn!("Skipping {}: {}", path.display(), e),
                Err(e) => warn!("Decoding {} failed: {}", path.display(), e),
            }
        }
        pipeline.shutdown().await
    });

    while let Some(outcome) = feed.next().await {
        let source = images
            .get(outcome.sequence as usize)
            .map(|path| path.display().to_string())
            .unwrap_or_default();
        print_outcome(&source, &outcome, json)?;
    }

    let stats = producer.await.context("Frame producer failed")?;
    info!(
        "Done: {} accepted, {} classified, {} dropped, {} stale",
        stats.accepted,
        stats.classified,
        stats.dropped,
        feed.stale_count()
    );
    Ok(())
}

fn print_outcome(source: &str, outcome: &FrameOutcome, json: bool) -> Result<()> {
    if json {
        let line = serde_json::json!({
            "sequence": outcome.sequence,
            "image": source,
            "model": outcome.classified.model,
            "backend": outcome.classified.backend,
            "predictions": outcome.classified.predictions,
        });
        println!("{}", serde_json::to_string(&line)?);
        return Ok(());
    }

    println!("[{}] {}", outcome.sequence, source);
    for prediction in &outcome.classified.predictions {
        println!(
            "  {:<32} {:>7}",
            prediction.label,
            prediction.formatted_confidence()
        );
    }
    Ok(())
}

/// Initialize tracing/logging
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("frameclass=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("frameclass=info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
