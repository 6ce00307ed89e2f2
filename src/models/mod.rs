pub mod downloader;
pub mod loader;
pub mod predictor;
pub mod registry;
pub mod types;

pub use downloader::ModelDownloader;
pub use loader::ModelLoader;
pub use predictor::PricePredictor;
pub use registry::{TransformFn, TransformRegistry};
pub use types::{ColumnSpec, ModelArtifact, RegressorSpec, TreeSpec};
