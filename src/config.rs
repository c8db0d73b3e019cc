use serde::Deserialize;
use std::time::Duration;

use crate::models::RecommendationPolicy;

/// Where cached recommendations and movie lookups live
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    #[default]
    Redis,
    Memory,
}

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Redis connection URL
    #[serde(default = "default_redis_url")]
    pub redis_url: String,

    #[serde(default)]
    pub cache_backend: CacheBackend,

    /// OpenAI API key
    pub openai_api_key: String,

    #[serde(default = "default_openai_api_url")]
    pub openai_api_url: String,

    #[serde(default = "default_openai_model")]
    pub openai_model: String,

    /// OpenWeather API key
    pub openweather_api_key: String,

    #[serde(default = "default_openweather_api_url")]
    pub openweather_api_url: String,

    /// TMDB API key
    pub tmdb_api_key: String,

    #[serde(default = "default_tmdb_api_url")]
    pub tmdb_api_url: String,

    /// Prefix for TMDB poster paths
    #[serde(default = "default_tmdb_image_base_url")]
    pub tmdb_image_base_url: String,

    /// Extra origin allowed by CORS
    #[serde(default)]
    pub frontend_url: Option<String>,

    /// How many recommendations a model response must contain
    #[serde(default)]
    pub recommendation_policy: RecommendationPolicy,

    /// Timeout for each outbound HTTP call
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    7002
}

fn default_redis_url() -> String {
    "redis://localhost:6379".to_string()
}

fn default_openai_api_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_openai_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_openweather_api_url() -> String {
    "https://api.openweathermap.org/data/2.5/weather".to_string()
}

fn default_tmdb_api_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_tmdb_image_base_url() -> String {
    "https://image.tmdb.org/t/p/w500".to_string()
}

fn default_http_timeout_secs() -> u64 {
    10
}

const DEFAULT_ALLOWED_ORIGINS: [&str; 2] = ["http://localhost:7001", "http://localhost:5173"];

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let config = envy::from_env::<Config>()
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects missing API keys and a malformed OpenAI key
    pub fn validate(&self) -> anyhow::Result<()> {
        for (name, value) in [
            ("OPENAI_API_KEY", &self.openai_api_key),
            ("OPENWEATHER_API_KEY", &self.openweather_api_key),
            ("TMDB_API_KEY", &self.tmdb_api_key),
        ] {
            if value.trim().is_empty() {
                anyhow::bail!("{} must not be empty", name);
            }
        }

        if !self.openai_api_key.trim().starts_with("sk-") {
            anyhow::bail!("Invalid OpenAI API key format. The key should start with \"sk-\".");
        }

        if self.http_timeout_secs == 0 {
            anyhow::bail!("HTTP_TIMEOUT_SECS must be greater than zero");
        }

        Ok(())
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// CORS origins: local front-ends plus `frontend_url` and its https variant
    pub fn allowed_origins(&self) -> Vec<String> {
        let mut origins: Vec<String> = DEFAULT_ALLOWED_ORIGINS
            .iter()
            .map(|o| o.to_string())
            .collect();

        if let Some(frontend) = self.frontend_url.as_deref().filter(|u| !u.is_empty()) {
            origins.push(frontend.to_string());
            if let Some(rest) = frontend.strip_prefix("http://") {
                origins.push(format!("https://{}", rest));
            }
        }

        origins
    }
}
