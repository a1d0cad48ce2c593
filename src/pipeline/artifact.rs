//! Fitted preprocessing + regression pipeline.
//!
//! The artifact is a JSON document produced by the training job. Numeric
//! columns are standard-scaled, categorical columns are one-hot encoded, and
//! the resulting feature vector is fed to either a linear model or a forest
//! of regression trees:
//!
//! ```text
//! x = [scaled numeric columns..., one-hot block per categorical column...]
//! ```

use std::collections::HashSet;
use std::fmt::Display;
use std::io::Read;

use anyhow::{anyhow, bail, ensure, Context, Result};
use serde::{Deserialize, Serialize};

use crate::pipeline::record::{EmployeeRecord, CATEGORICAL_COLUMNS, NUMERIC_COLUMNS};
use crate::pipeline::SalaryEstimator;

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct PipelineArtifact {
    /// Free-form name of the fitted pipeline, only used for logging
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub numeric: Vec<NumericStep>,

    #[serde(default)]
    pub categorical: Vec<CategoricalStep>,

    pub regressor: Regressor,
}

/// Standard scaling of one numeric column: `(x - mean) / scale`.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct NumericStep {
    pub column: String,
    #[serde(default)]
    pub mean: f64,
    #[serde(default = "unit_scale")]
    pub scale: f64,
}

fn unit_scale() -> f64 {
    1.0
}

/// One-hot encoding of one categorical column over a fixed category list.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct CategoricalStep {
    pub column: String,
    pub categories: Vec<String>,
    #[serde(default)]
    pub handle_unknown: HandleUnknown,
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HandleUnknown {
    /// Unseen categories encode to an all-zero block
    #[default]
    Ignore,
    Error,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Regressor {
    Linear { coefficients: Vec<f64>, intercept: f64 },
    Forest { trees: Vec<Tree> },
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct Tree {
    /// Flat node list, node 0 is the root and children always point forward
    pub nodes: Vec<TreeNode>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        leaf: f64,
    },
}

impl Tree {
    fn evaluate(&self, features: &[f64]) -> f64 {
        let mut index = 0;
        loop {
            match &self.nodes[index] {
                TreeNode::Leaf { leaf } => return *leaf,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    index = if features[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    fn validate(&self, tree_index: usize, width: usize) -> Result<()> {
        ensure!(!self.nodes.is_empty(), "Tree {} has no nodes", tree_index);
        for (index, node) in self.nodes.iter().enumerate() {
            match node {
                TreeNode::Leaf { leaf } => {
                    ensure!(
                        leaf.is_finite(),
                        "Tree {} node {} has a non-finite leaf value",
                        tree_index,
                        index
                    );
                }
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    ensure!(
                        *feature < width,
                        "Tree {} node {} splits on feature {} but the pipeline produces {} features",
                        tree_index,
                        index,
                        feature,
                        width
                    );
                    ensure!(
                        threshold.is_finite(),
                        "Tree {} node {} has a non-finite threshold",
                        tree_index,
                        index
                    );
                    for child in [left, right] {
                        ensure!(
                            *child > index && *child < self.nodes.len(),
                            "Tree {} node {} points to invalid child {}",
                            tree_index,
                            index,
                            child
                        );
                    }
                }
            }
        }
        Ok(())
    }
}

/// A validated [`PipelineArtifact`] ready to serve estimates.
#[derive(Debug, Clone)]
pub struct Pipeline {
    artifact: PipelineArtifact,
    width: usize,
}

impl Pipeline {
    pub fn new(artifact: PipelineArtifact) -> Result<Self> {
        let width = validate_steps(&artifact)?;

        match &artifact.regressor {
            Regressor::Linear {
                coefficients,
                intercept,
            } => {
                ensure!(
                    coefficients.len() == width,
                    "Linear regressor has {} coefficients but the pipeline produces {} features",
                    coefficients.len(),
                    width
                );
                ensure!(
                    intercept.is_finite() && coefficients.iter().all(|c| c.is_finite()),
                    "Linear regressor has non-finite parameters"
                );
            }
            Regressor::Forest { trees } => {
                ensure!(!trees.is_empty(), "Forest regressor has no trees");
                for (index, tree) in trees.iter().enumerate() {
                    tree.validate(index, width)?;
                }
            }
        }

        Ok(Self { artifact, width })
    }

    pub fn from_json(str: &str) -> Result<Self> {
        let artifact: PipelineArtifact =
            serde_json::from_str(str).context("Malformed pipeline artifact")?;
        Self::new(artifact)
    }

    pub fn from_reader(reader: impl Read) -> Result<Self> {
        let artifact: PipelineArtifact =
            serde_json::from_reader(reader).context("Malformed pipeline artifact")?;
        Self::new(artifact)
    }

    pub fn name(&self) -> &str {
        self.artifact.name.as_deref().unwrap_or("unnamed pipeline")
    }

    /// Number of features fed to the regressor.
    pub fn feature_width(&self) -> usize {
        self.width
    }

    pub fn artifact(&self) -> &PipelineArtifact {
        &self.artifact
    }

    /// Runs the preprocessing steps on a single record.
    pub fn transform(&self, record: &EmployeeRecord) -> Result<Vec<f64>> {
        let mut features = Vec::with_capacity(self.width);

        for step in &self.artifact.numeric {
            let value = record
                .numeric(&step.column)
                .ok_or_else(|| anyhow!("Record has no numeric column '{}'", step.column))?;
            let scale = if step.scale == 0.0 { 1.0 } else { step.scale };
            features.push((value - step.mean) / scale);
        }

        for step in &self.artifact.categorical {
            let value = record
                .categorical(&step.column)
                .ok_or_else(|| anyhow!("Record has no categorical column '{}'", step.column))?;
            let position = step.categories.iter().position(|c| c == value);
            if position.is_none() && step.handle_unknown == HandleUnknown::Error {
                bail!(
                    "Found unknown category '{}' in column '{}' during transform",
                    value,
                    step.column
                );
            }
            features.extend((0..step.categories.len()).map(|i| {
                if Some(i) == position {
                    1.0
                } else {
                    0.0
                }
            }));
        }

        Ok(features)
    }
}

impl SalaryEstimator for Pipeline {
    #[tracing::instrument(level = "debug", skip(self))]
    fn estimate(&self, record: &EmployeeRecord) -> Result<f64> {
        let features = self.transform(record)?;
        let estimate = match &self.artifact.regressor {
            Regressor::Linear {
                coefficients,
                intercept,
            } => {
                intercept
                    + coefficients
                        .iter()
                        .zip(&features)
                        .map(|(c, x)| c * x)
                        .sum::<f64>()
            }
            Regressor::Forest { trees } => {
                trees.iter().map(|tree| tree.evaluate(&features)).sum::<f64>() / trees.len() as f64
            }
        };
        Ok(estimate)
    }
}

impl Display for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Name: {}", self.name())?;
        for step in &self.artifact.numeric {
            writeln!(
                f,
                "Numeric: {} (mean {}, scale {})",
                step.column, step.mean, step.scale
            )?;
        }
        for step in &self.artifact.categorical {
            writeln!(
                f,
                "Categorical: {} ({} categories, unknown: {:?})",
                step.column,
                step.categories.len(),
                step.handle_unknown
            )?;
        }
        match &self.artifact.regressor {
            Regressor::Linear { .. } => writeln!(f, "Regressor: linear")?,
            Regressor::Forest { trees } => writeln!(f, "Regressor: forest of {} trees", trees.len())?,
        }
        write!(f, "Features: {}", self.width)
    }
}

/// Checks the preprocessing steps against the record schema and returns the feature width.
fn validate_steps(artifact: &PipelineArtifact) -> Result<usize> {
    let mut seen = HashSet::new();

    for step in &artifact.numeric {
        if !NUMERIC_COLUMNS.contains(&step.column.as_str()) {
            bail!("'{}' is not a numeric input column", step.column);
        }
        ensure!(
            step.mean.is_finite() && step.scale.is_finite(),
            "Numeric column '{}' has non-finite scaling parameters",
            step.column
        );
        ensure!(
            seen.insert(step.column.as_str()),
            "Column '{}' is transformed twice",
            step.column
        );
    }

    for step in &artifact.categorical {
        if !CATEGORICAL_COLUMNS.contains(&step.column.as_str()) {
            bail!("'{}' is not a categorical input column", step.column);
        }
        ensure!(
            !step.categories.is_empty(),
            "Categorical column '{}' has no categories",
            step.column
        );
        ensure!(
            seen.insert(step.column.as_str()),
            "Column '{}' is transformed twice",
            step.column
        );
    }

    let width = artifact.numeric.len()
        + artifact
            .categorical
            .iter()
            .map(|step| step.categories.len())
            .sum::<usize>();
    ensure!(width > 0, "Pipeline produces no features");
    Ok(width)
}
