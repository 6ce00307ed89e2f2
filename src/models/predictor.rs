use super::registry::{TransformFn, TransformRegistry};
use super::types::{ColumnSpec, ModelArtifact, RegressorSpec, TreeSpec, ARTIFACT_FORMAT_VERSION};
use crate::error::{ModelError, Result};
use crate::features::{is_numeric_feature, FeatureRecord, FeatureValue, FEATURES};

/// A loaded, immutable price model.
///
/// Built once from a [`ModelArtifact`] and shared read-only between request
/// handlers for the life of the process.
#[derive(Debug)]
pub struct PricePredictor {
    encoders: Vec<ColumnEncoder>,
    width: usize,
    regressor: Regressor,
    output: Option<TransformFn>,
}

#[derive(Debug)]
enum ColumnEncoder {
    Passthrough,
    Function(TransformFn),
    OneHot(Vec<String>),
}

impl ColumnEncoder {
    fn width(&self) -> usize {
        match self {
            ColumnEncoder::Passthrough | ColumnEncoder::Function(_) => 1,
            ColumnEncoder::OneHot(categories) => categories.len(),
        }
    }

    fn encode(&self, value: FeatureValue<'_>, out: &mut Vec<f64>) {
        match (self, value) {
            (ColumnEncoder::Passthrough, FeatureValue::Number(x)) => out.push(x),
            (ColumnEncoder::Function(f), FeatureValue::Number(x)) => out.push(f(x)),
            (ColumnEncoder::OneHot(categories), FeatureValue::Text(s)) => {
                out.extend(categories.iter().map(|c| if c == s { 1.0 } else { 0.0 }))
            }
            // Column kinds are checked at load time.
            (encoder, _) => out.extend(std::iter::repeat(0.0).take(encoder.width())),
        }
    }
}

#[derive(Debug)]
enum Regressor {
    Forest(Vec<RegressionTree>),
    Linear { coefficients: Vec<f64>, intercept: f64 },
}

#[derive(Debug)]
enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf(f64),
}

#[derive(Debug)]
struct RegressionTree {
    nodes: Vec<TreeNode>,
}

impl RegressionTree {
    fn from_spec(index: usize, spec: &TreeSpec, width: usize) -> Result<Self> {
        let n = spec.node_count();
        let invalid = |reason: String| ModelError::InvalidRegressor(format!("tree {}: {}", index, reason));

        if n == 0 {
            return Err(invalid("no nodes".to_string()));
        }
        if [
            spec.children_left.len(),
            spec.children_right.len(),
            spec.feature.len(),
            spec.threshold.len(),
        ]
        .iter()
        .any(|len| *len != n)
        {
            return Err(invalid("node arrays differ in length".to_string()));
        }

        let mut nodes = Vec::with_capacity(n);
        for i in 0..n {
            let (left, right) = (spec.children_left[i], spec.children_right[i]);
            if left == TreeSpec::LEAF {
                nodes.push(TreeNode::Leaf(spec.value[i]));
                continue;
            }
            // Children always sit after their parent, so traversal terminates.
            let child = |c: i64| -> Result<usize> {
                usize::try_from(c)
                    .ok()
                    .filter(|c| *c > i && *c < n)
                    .ok_or_else(|| invalid(format!("node {} has invalid child {}", i, c)))
            };
            let feature = usize::try_from(spec.feature[i])
                .ok()
                .filter(|f| *f < width)
                .ok_or_else(|| {
                    invalid(format!(
                        "node {} splits on feature {} of {}",
                        i, spec.feature[i], width
                    ))
                })?;
            nodes.push(TreeNode::Split {
                feature,
                threshold: spec.threshold[i],
                left: child(left)?,
                right: child(right)?,
            });
        }
        Ok(Self { nodes })
    }

    fn predict_one(&self, x: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                TreeNode::Leaf(value) => return *value,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if x[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }
}

impl Regressor {
    fn from_spec(spec: &RegressorSpec, width: usize) -> Result<Self> {
        match spec {
            RegressorSpec::RandomForest { trees } => {
                if trees.is_empty() {
                    return Err(ModelError::InvalidRegressor("forest has no trees".into()));
                }
                let trees = trees
                    .iter()
                    .enumerate()
                    .map(|(i, tree)| RegressionTree::from_spec(i, tree, width))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Regressor::Forest(trees))
            }
            RegressorSpec::Linear {
                coefficients,
                intercept,
            } => {
                if coefficients.len() != width {
                    return Err(ModelError::InvalidRegressor(format!(
                        "{} coefficients for {} encoded features",
                        coefficients.len(),
                        width
                    )));
                }
                Ok(Regressor::Linear {
                    coefficients: coefficients.clone(),
                    intercept: *intercept,
                })
            }
        }
    }

    fn predict_one(&self, x: &[f64]) -> f64 {
        match self {
            Regressor::Forest(trees) => {
                let sum: f64 = trees.iter().map(|tree| tree.predict_one(x)).sum();
                sum / trees.len() as f64
            }
            Regressor::Linear {
                coefficients,
                intercept,
            } => intercept + coefficients.iter().zip(x).map(|(c, v)| c * v).sum::<f64>(),
        }
    }
}

impl PricePredictor {
    /// Binds an artifact to concrete transforms and validates its shape.
    pub fn from_artifact(artifact: &ModelArtifact, registry: &TransformRegistry) -> Result<Self> {
        if artifact.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(ModelError::FormatVersion(artifact.format_version));
        }
        if artifact.transforms_version != registry.version() {
            return Err(ModelError::RegistryVersion {
                artifact: artifact.transforms_version,
                registry: registry.version(),
            });
        }

        let expected: Vec<String> = FEATURES.iter().map(|f| f.to_string()).collect();
        let columns: Vec<String> = artifact.columns.iter().map(|c| c.column().to_string()).collect();
        if artifact.features != expected {
            return Err(ModelError::FeatureOrder {
                expected,
                found: artifact.features.clone(),
            });
        }
        if columns != expected {
            return Err(ModelError::FeatureOrder {
                expected,
                found: columns,
            });
        }

        let encoders = artifact
            .columns
            .iter()
            .map(|spec| resolve_column(spec, registry))
            .collect::<Result<Vec<_>>>()?;
        let width = encoders.iter().map(ColumnEncoder::width).sum();
        let regressor = Regressor::from_spec(&artifact.regressor, width)?;
        let output = artifact
            .output_transform
            .as_deref()
            .map(|name| registry.resolve(name))
            .transpose()?;

        Ok(Self {
            encoders,
            width,
            regressor,
            output,
        })
    }

    /// Number of columns in the encoded design vector.
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn tree_count(&self) -> usize {
        match &self.regressor {
            Regressor::Forest(trees) => trees.len(),
            Regressor::Linear { .. } => 0,
        }
    }

    pub fn encode(&self, record: &FeatureRecord) -> Vec<f64> {
        let mut row = Vec::with_capacity(self.width);
        for (index, encoder) in self.encoders.iter().enumerate() {
            if let Some(value) = record.value(index) {
                encoder.encode(value, &mut row);
            }
        }
        row
    }

    /// One prediction per record, in input order.
    pub fn predict(&self, records: &[FeatureRecord]) -> Vec<f64> {
        records
            .iter()
            .map(|record| {
                let raw = self.regressor.predict_one(&self.encode(record));
                match self.output {
                    Some(f) => f(raw),
                    None => raw,
                }
            })
            .collect()
    }
}

fn resolve_column(spec: &ColumnSpec, registry: &TransformRegistry) -> Result<ColumnEncoder> {
    let column = spec.column();
    let numeric = is_numeric_feature(column);
    let mismatch = |reason: &str| ModelError::ColumnEncoding {
        column: column.to_string(),
        reason: reason.to_string(),
    };

    match spec {
        ColumnSpec::Passthrough { .. } if numeric => Ok(ColumnEncoder::Passthrough),
        ColumnSpec::Function { transform, .. } if numeric => {
            Ok(ColumnEncoder::Function(registry.resolve(transform)?))
        }
        ColumnSpec::OneHot { categories, .. } if !numeric => {
            if categories.is_empty() {
                return Err(mismatch("one_hot encoder has no categories"));
            }
            Ok(ColumnEncoder::OneHot(categories.clone()))
        }
        ColumnSpec::OneHot { .. } => Err(mismatch("one_hot applied to a numeric column")),
        _ => Err(mismatch("numeric encoder applied to a text column")),
    }
}
