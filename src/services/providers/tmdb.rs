//! TMDB movie search provider
//!
//! Only `GET /search/movie` is used; ranking is left to TMDB.

use crate::{
    error::{AppError, AppResult},
    models::{TmdbMovie, TmdbSearchResponse},
    services::providers::{http_client, MovieProvider},
};
use reqwest::{Client as HttpClient, StatusCode};
use std::time::Duration;

#[derive(Clone)]
pub struct TmdbProvider {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
}

impl TmdbProvider {
    pub fn new(api_key: String, api_url: String, timeout: Duration) -> AppResult<Self> {
        Ok(Self {
            http_client: http_client(timeout)?,
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
        })
    }

    /// Query parameters for a title search; a placeholder year is not sent
    fn search_params<'a>(&'a self, title: &'a str, year: &'a str) -> Vec<(&'static str, &'a str)> {
        let mut params = vec![("api_key", self.api_key.as_str()), ("query", title)];
        if is_year(year) {
            params.push(("year", year));
        }
        params
    }
}

/// Client-facing error for a failed search; the response body is only logged
fn map_error_status(status: StatusCode) -> AppError {
    match status {
        StatusCode::UNAUTHORIZED => {
            AppError::UpstreamAuth("Authentication with the movie database failed".to_string())
        }
        _ => AppError::ExternalApi(format!("TMDB API returned status {}", status)),
    }
}

fn is_year(year: &str) -> bool {
    year.len() == 4 && year.chars().all(|c| c.is_ascii_digit())
}

#[async_trait::async_trait]
impl MovieProvider for TmdbProvider {
    async fn search_movie(&self, title: &str, year: &str) -> AppResult<Vec<TmdbMovie>> {
        let url = format!("{}/search/movie", self.api_url);

        let response = self
            .http_client
            .get(&url)
            .query(&self.search_params(title, year))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(
                title = %title,
                status = %status,
                body = %body,
                "TMDB API request failed"
            );
            return Err(map_error_status(status));
        }

        let search: TmdbSearchResponse = response.json().await?;

        tracing::debug!(
            title = %title,
            year = %year,
            results = search.results.len(),
            provider = "tmdb",
            "Movie search completed"
        );

        Ok(search.results)
    }

    fn name(&self) -> &'static str {
        "tmdb"
    }
}
