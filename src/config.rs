use clap::Parser;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_MODEL_URL: &str =
    "https://github.com/Nas365/LondonHousesPricePrediction-/releases/download/v1.0/best_random_forest.json";

/// Server settings. Each flag can also be set through its environment variable.
#[derive(Parser, Debug, Clone)]
#[command(name = "house-price-server", version, about = "London house price prediction service")]
pub struct ServerConfig {
    /// Where to fetch the model artifact from on a cold cache
    #[arg(long, env = "MODEL_URL", default_value = DEFAULT_MODEL_URL)]
    pub model_url: String,

    /// Local cache file for the model artifact
    #[arg(long, env = "MODEL_PATH", default_value = "model_cache.json")]
    pub model_path: PathBuf,

    /// Expected SHA-256 of the artifact (hex); verification is skipped when unset
    #[arg(long, env = "MODEL_SHA256")]
    pub model_sha256: Option<String>,

    /// Connect and read timeout for the model download, in seconds
    #[arg(long, env = "DOWNLOAD_TIMEOUT_SECS", default_value_t = 60)]
    pub download_timeout_secs: u64,

    #[arg(long, env = "BIND_HOST", default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub host: IpAddr,

    #[arg(long, env = "PORT", default_value_t = 5000)]
    pub port: u16,
}

impl ServerConfig {
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }
}
