//! Command-line arguments

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "frameclass")]
#[command(about = "Image classification over tensor-graph and traced-module models", long_about = None)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "frameclass.yaml", env = "FRAMECLASS_CONFIG")]
    pub config: PathBuf,

    /// Directory holding models and their JSON sidecars (overrides config)
    #[arg(short, long, env = "FRAMECLASS_MODELS_DIR")]
    pub models_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List bundled models grouped by backend
    Models,

    /// Print the descriptor for a model
    Describe {
        /// Model file name, e.g. `mobilenet.tflite`
        model: String,
    },

    /// Classify image files as a sequence of frames
    Classify {
        /// Model to use instead of the default one
        #[arg(short, long)]
        model: Option<String>,

        /// Print predictions as JSON lines
        #[arg(long)]
        json: bool,

        /// Images to classify, in frame order
        #[arg(required = true)]
        images: Vec<PathBuf>,
    },
}
