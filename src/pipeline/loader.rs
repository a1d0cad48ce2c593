use std::fs::File;
use std::io::{BufReader, ErrorKind};
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{error, info};

use crate::pipeline::{ModelState, Pipeline};

pub const DEFAULT_MODEL_PATH: &str = "salary_prediction_pipeline.json";

/// Single load attempt. Failures are logged and leave the service running without a model.
#[tracing::instrument(level = "info")]
pub fn load_model(path: &Path) -> ModelState {
    match read_pipeline(path) {
        Ok(pipeline) => {
            info!(
                "Model '{}' loaded successfully from {} ({} features)",
                pipeline.name(),
                path.display(),
                pipeline.feature_width()
            );
            ModelState::Available(Arc::new(pipeline))
        }
        Err(err) if is_not_found(&err) => {
            error!(
                "Model file '{}' not found. Place the model file next to the server or pass --model-path",
                path.display()
            );
            ModelState::Unavailable
        }
        Err(err) => {
            error!("An error occurred while loading the model: {:#}", err);
            ModelState::Unavailable
        }
    }
}

pub fn read_pipeline(path: &Path) -> Result<Pipeline> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open model file {}", path.display()))?;
    Pipeline::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to read model file {}", path.display()))
}

fn is_not_found(err: &anyhow::Error) -> bool {
    err.chain()
        .filter_map(|cause| cause.downcast_ref::<std::io::Error>())
        .any(|io| io.kind() == ErrorKind::NotFound)
}
