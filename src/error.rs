use std::path::PathBuf;
use thiserror::Error;

/// Failures while acquiring or loading the model artifact.
///
/// All of these are fatal at startup: the process never starts serving
/// without a loaded predictor.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model download failed: {0}")]
    Download(#[from] reqwest::Error),

    #[error("model cache I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("checksum mismatch for downloaded model: expected {expected}, got {actual}")]
    Checksum { expected: String, actual: String },

    #[error("malformed model artifact: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("unsupported artifact format version {0}")]
    FormatVersion(u32),

    #[error("artifact expects transform registry v{artifact}, but v{registry} is installed")]
    RegistryVersion { artifact: u32, registry: u32 },

    #[error("unresolved transform '{0}'")]
    UnresolvedTransform(String),

    #[error("artifact feature order {found:?} does not match {expected:?}")]
    FeatureOrder {
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error("invalid encoder for column '{column}': {reason}")]
    ColumnEncoding { column: String, reason: String },

    #[error("invalid regressor: {0}")]
    InvalidRegressor(String),
}

impl ModelError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Failures while turning request input into a feature record.
#[derive(Debug, Error, PartialEq)]
pub enum FeatureError {
    #[error("Missing fields: {}", quoted_list(.0))]
    MissingFields(Vec<String>),

    #[error("could not convert {field} value {value} to float")]
    NotNumeric { field: String, value: String },
}

fn quoted_list(items: &[String]) -> String {
    let inner = items
        .iter()
        .map(|item| format!("'{}'", item))
        .collect::<Vec<_>>()
        .join(", ");
    format!("[{}]", inner)
}

pub type Result<T, E = ModelError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_message_lists_every_key() {
        let err = FeatureError::MissingFields(vec!["bedrooms".into(), "tenure".into()]);
        assert_eq!(err.to_string(), "Missing fields: ['bedrooms', 'tenure']");
    }

    #[test]
    fn not_numeric_message_names_field() {
        let err = FeatureError::NotNumeric {
            field: "bathrooms".into(),
            value: "\"two\"".into(),
        };
        assert!(err.to_string().contains("bathrooms"));
    }
}
