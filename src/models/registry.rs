use crate::error::{ModelError, Result};
use std::collections::HashMap;

/// Scalar transform referenced by name from a model artifact.
pub type TransformFn = fn(f64) -> f64;

pub fn log_transform(x: f64) -> f64 {
    x.ln_1p()
}

pub fn exp_transform(x: f64) -> f64 {
    x.exp_m1()
}

pub fn identity(x: f64) -> f64 {
    x
}

/// Named transforms that artifacts may reference.
///
/// Artifacts record the registry version they were exported against, so a
/// registry change that alters the meaning of a name must bump `version`.
#[derive(Debug, Clone)]
pub struct TransformRegistry {
    version: u32,
    transforms: HashMap<String, TransformFn>,
}

impl TransformRegistry {
    pub const STANDARD_VERSION: u32 = 1;

    pub fn empty(version: u32) -> Self {
        Self {
            version,
            transforms: HashMap::new(),
        }
    }

    /// The transforms the price model is trained with.
    pub fn standard() -> Self {
        Self::empty(Self::STANDARD_VERSION)
            .with("log_transform", log_transform)
            .with("exp_transform", exp_transform)
            .with("identity", identity)
    }

    pub fn with(mut self, name: &str, transform: TransformFn) -> Self {
        self.register(name, transform);
        self
    }

    pub fn register(&mut self, name: &str, transform: TransformFn) {
        self.transforms.insert(name.to_string(), transform);
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn resolve(&self, name: &str) -> Result<TransformFn> {
        self.transforms
            .get(name)
            .copied()
            .ok_or_else(|| ModelError::UnresolvedTransform(name.to_string()))
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.transforms.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
