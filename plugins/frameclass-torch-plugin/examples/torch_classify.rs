//! Classify image files with a TorchScript model through the frame pipeline.
//!
//! Usage: cargo run --example torch_classify -- <models-dir> <model.pt> <image>...

use frameclass_classifiers::{ActiveClassifier, ClassifierFactory, FramePipeline, ModelStore};
use frameclass_core::Frame;
use frameclass_torch_plugin::TorchScriptLoader;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let mut args = std::env::args().skip(1);
    let (Some(models_dir), Some(model)) = (args.next(), args.next()) else {
        eprintln!("usage: torch_classify <models-dir> <model.pt> <image>...");
        std::process::exit(2);
    };

    let factory = ClassifierFactory::new(ModelStore::new(models_dir))
        .with_traced_loader(Arc::new(TorchScriptLoader::new()));
    let active = Arc::new(ActiveClassifier::empty());
    active.switch_to(&factory, &model);
    if !active.is_available() {
        return Err(format!("{} could not be loaded", model).into());
    }

    let (pipeline, mut feed) = FramePipeline::spawn(Arc::clone(&active), 2);
    let images: Vec<String> = args.collect();
    let producer = tokio::spawn(async move {
        for (sequence, path) in images.iter().enumerate() {
            match image::open(path) {
                Ok(image) => {
                    pipeline
                        .submit_wait(Frame::new(sequence as u64, image.to_rgb8()))
                        .await;
                }
                Err(e) => eprintln!("skipping {}: {}", path, e),
            }
        }
        pipeline.shutdown().await
    });

    while let Some(outcome) = feed.next().await {
        println!("frame {}", outcome.sequence);
        for prediction in &outcome.classified.predictions {
            println!("  {} {}", prediction.label, prediction.formatted_confidence());
        }
    }

    let stats = producer.await?;
    println!("{} frames classified", stats.classified);
    Ok(())
}
