//! On-disk schema of the model artifact.
//!
//! These types mirror the JSON document exactly. Transform names are kept
//! as strings here; they are only bound to functions when the artifact is
//! resolved against a [`TransformRegistry`](super::TransformRegistry).

use crate::error::Result;
use serde::{Deserialize, Serialize};

pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ModelArtifact {
    pub format_version: u32,
    pub transforms_version: u32,
    /// Training-time column order.
    pub features: Vec<String>,
    pub columns: Vec<ColumnSpec>,
    pub regressor: RegressorSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_transform: Option<String>,
}

impl ModelArtifact {
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "encoder", rename_all = "snake_case")]
pub enum ColumnSpec {
    Passthrough { column: String },
    Function { column: String, transform: String },
    OneHot { column: String, categories: Vec<String> },
}

impl ColumnSpec {
    pub fn column(&self) -> &str {
        match self {
            ColumnSpec::Passthrough { column }
            | ColumnSpec::Function { column, .. }
            | ColumnSpec::OneHot { column, .. } => column,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "snake_case")]
pub enum RegressorSpec {
    RandomForest { trees: Vec<TreeSpec> },
    Linear { coefficients: Vec<f64>, intercept: f64 },
}

/// A fitted regression tree in parallel-array form.
///
/// Node `i` is a leaf when `children_left[i] == -1`. Otherwise samples with
/// `x[feature[i]] <= threshold[i]` continue at `children_left[i]`, the rest
/// at `children_right[i]`.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct TreeSpec {
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    pub value: Vec<f64>,
}

impl TreeSpec {
    pub const LEAF: i64 = -1;

    pub fn node_count(&self) -> usize {
        self.value.len()
    }
}
