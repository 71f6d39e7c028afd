use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};

use common::tensor::{tensor_map_from_json, tensor_map_to_json, TensorMap};
use common::types::Device;
use config::ConfigManager;
use inference_orchestrator::{
    build_orchestrator, default_device, init_logging, PipelineManifest,
};

/// Sequential model inference orchestrator
#[derive(Parser)]
#[command(name = "inference-orchestrator", version, about)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Load one model and run inference against a JSON tensor map
    Run {
        /// Model name under the models directory
        #[arg(long)]
        model: String,

        /// Device to compile for, overriding the configured default
        #[arg(long)]
        device: Option<String>,

        /// Path to a JSON file of named input tensors
        #[arg(long)]
        input: PathBuf,
    },

    /// Run a multi-stage pipeline described by a JSON manifest
    Pipeline {
        /// Path to the pipeline manifest
        #[arg(long)]
        manifest: PathBuf,

        /// Path to a JSON file of named input tensors
        #[arg(long)]
        input: PathBuf,
    },

    /// List the models available in the models directory
    List,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = ConfigManager::new(cli.config.as_deref())?;
    init_logging(config.log_filter());

    let mut orchestrator = build_orchestrator(&config)?;

    match cli.command {
        Command::Run {
            model,
            device,
            input,
        } => {
            let device = match device {
                Some(name) => name
                    .parse::<Device>()
                    .map_err(common::error::Error::Config)?,
                None => default_device(&config)?,
            };

            let inputs = read_tensor_map(&input)?;
            orchestrator.load_model(&model, device)?;
            let outputs = orchestrator.infer(&inputs)?;
            orchestrator.release();

            print_tensor_map(&outputs)?;
        }

        Command::Pipeline { manifest, input } => {
            let text = std::fs::read_to_string(&manifest)?;
            let stages =
                PipelineManifest::from_json(&text)?.into_stages(&default_device(&config)?)?;

            let inputs = read_tensor_map(&input)?;
            let outputs = orchestrator.run_pipeline(stages, inputs)?;

            print_tensor_map(&outputs)?;
        }

        Command::List => {
            for name in orchestrator.available_models()? {
                println!("{}", name);
            }
        }
    }

    Ok(())
}

fn read_tensor_map(path: &Path) -> Result<TensorMap> {
    let text = std::fs::read_to_string(path)?;
    let value: serde_json::Value = serde_json::from_str(&text)?;
    Ok(tensor_map_from_json(&value)?)
}

fn print_tensor_map(map: &TensorMap) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&tensor_map_to_json(map))?);
    Ok(())
}
