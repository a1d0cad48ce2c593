use std::fmt::Debug;
use std::sync::Arc;

use anyhow::Result;

pub use crate::pipeline::artifact::Pipeline;
pub use crate::pipeline::record::EmployeeRecord;

pub mod artifact;
pub mod loader;
pub mod record;

/// Anything that maps a single [`EmployeeRecord`] to a salary estimate.
pub trait SalaryEstimator: Send + Sync {
    fn estimate(&self, record: &EmployeeRecord) -> Result<f64>;
}

/// Result of the one-time model load at startup.
#[derive(Clone)]
pub enum ModelState {
    Available(Arc<dyn SalaryEstimator>),
    Unavailable,
}

impl ModelState {
    pub fn predictor(&self) -> Option<&dyn SalaryEstimator> {
        match self {
            ModelState::Available(predictor) => Some(predictor.as_ref()),
            ModelState::Unavailable => None,
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, ModelState::Available(_))
    }
}

impl Debug for ModelState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelState::Available(_) => write!(f, "Available"),
            ModelState::Unavailable => write!(f, "Unavailable"),
        }
    }
}
