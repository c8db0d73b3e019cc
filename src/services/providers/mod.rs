//! External data providers
//!
//! Each outbound dependency of the recommendation pipeline sits behind a trait
//! so the orchestrator can be wired with real HTTP clients in production and
//! with fakes in tests.

use reqwest::Client as HttpClient;
use std::time::Duration;

use crate::{
    error::AppResult,
    models::{TmdbMovie, WeatherSnapshot},
};

pub mod openai;
pub mod openweather;
pub mod tmdb;

pub use openai::OpenAiProvider;
pub use openweather::OpenWeatherProvider;
pub use tmdb::TmdbProvider;

/// Current weather lookup by city name
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait WeatherProvider: Send + Sync {
    /// Fails with `NotFound` for an unknown city and `UpstreamAuth` for a
    /// rejected credential.
    async fn weather_by_city(&self, city: &str) -> AppResult<WeatherSnapshot>;

    fn name(&self) -> &'static str;
}

/// Language model completion
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ModelProvider: Send + Sync {
    /// Sends `system_prompt` as the only message and returns the completion
    /// text, or `None` when the model produced no content.
    async fn complete(&self, system_prompt: &str) -> AppResult<Option<String>>;

    fn name(&self) -> &'static str;
}

/// Movie database search
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait MovieProvider: Send + Sync {
    /// Raw matches for a title and release year, in the provider's relevance order
    async fn search_movie(&self, title: &str, year: &str) -> AppResult<Vec<TmdbMovie>>;

    fn name(&self) -> &'static str;
}

/// Builds the HTTP client shared by a provider, bounding every call by `timeout`
pub fn http_client(timeout: Duration) -> AppResult<HttpClient> {
    let client = HttpClient::builder().timeout(timeout).build()?;
    Ok(client)
}
