//! OpenWeather current-weather provider
//!
//! Calls `GET {api_url}?q=<city>&appid=<key>&units=metric&lang=fr` and
//! normalizes the payload into a [`WeatherSnapshot`].

use crate::{
    error::{AppError, AppResult},
    models::{weather::OpenWeatherError, OpenWeatherResponse, WeatherSnapshot},
    services::providers::{http_client, WeatherProvider},
};
use reqwest::{Client as HttpClient, StatusCode};
use std::time::Duration;

#[derive(Clone)]
pub struct OpenWeatherProvider {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String, api_url: String, timeout: Duration) -> AppResult<Self> {
        Ok(Self {
            http_client: http_client(timeout)?,
            api_key,
            api_url,
        })
    }

    /// Maps a non-success OpenWeather response onto the error taxonomy
    fn map_error_status(status: StatusCode, body: &str) -> AppError {
        match status {
            StatusCode::NOT_FOUND => AppError::NotFound(
                "City not found. Please check the spelling.".to_string(),
            ),
            StatusCode::UNAUTHORIZED => AppError::UpstreamAuth(
                "Authentication with the weather API failed".to_string(),
            ),
            _ => {
                let detail = serde_json::from_str::<OpenWeatherError>(body)
                    .ok()
                    .and_then(|e| e.message);
                match detail {
                    Some(message) => AppError::ExternalApi(format!("Weather error: {}", message)),
                    None => AppError::ExternalApi(
                        "Unable to fetch weather data. Please try again.".to_string(),
                    ),
                }
            }
        }
    }
}

#[async_trait::async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn weather_by_city(&self, city: &str) -> AppResult<WeatherSnapshot> {
        tracing::debug!(city = %city, "Fetching weather");

        let response = self
            .http_client
            .get(&self.api_url)
            .query(&[
                ("q", city),
                ("appid", self.api_key.as_str()),
                ("units", "metric"),
                ("lang", "fr"),
            ])
            .send()
            .await
            .map_err(|e| {
                tracing::error!(city = %city, error = %e, "Weather request failed");
                e
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(
                city = %city,
                status = %status,
                body = %body,
                "Weather API request failed"
            );
            return Err(Self::map_error_status(status, &body));
        }

        let raw: OpenWeatherResponse = response.json().await?;
        let snapshot = WeatherSnapshot::from(raw);

        tracing::info!(
            city = %city,
            temperature = snapshot.temperature,
            condition = %snapshot.condition,
            provider = "openweather",
            "Weather fetched"
        );

        Ok(snapshot)
    }

    fn name(&self) -> &'static str {
        "openweather"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_maps_to_not_found() {
        let err = OpenWeatherProvider::map_error_status(
            StatusCode::NOT_FOUND,
            r#"{"cod":"404","message":"city not found"}"#,
        );
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn test_unauthorized_maps_to_upstream_auth() {
        let err = OpenWeatherProvider::map_error_status(
            StatusCode::UNAUTHORIZED,
            r#"{"cod":401,"message":"Invalid API key"}"#,
        );
        assert!(matches!(err, AppError::UpstreamAuth(_)));
    }

    #[test]
    fn test_other_status_carries_provider_message() {
        let err = OpenWeatherProvider::map_error_status(
            StatusCode::TOO_MANY_REQUESTS,
            r#"{"cod":429,"message":"rate limited"}"#,
        );
        match err {
            AppError::ExternalApi(msg) => assert_eq!(msg, "Weather error: rate limited"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_other_status_without_body_is_generic() {
        let err = OpenWeatherProvider::map_error_status(StatusCode::BAD_GATEWAY, "<html>");
        assert!(matches!(err, AppError::ExternalApi(_)));
    }

    #[tokio::test]
    async fn test_unreachable_api_is_upstream_failure() {
        let provider = OpenWeatherProvider::new(
            "test_key".to_string(),
            "http://127.0.0.1:1/weather".to_string(),
            Duration::from_secs(2),
        )
        .unwrap();

        let err = provider.weather_by_city("Paris").await.unwrap_err();
        assert!(matches!(err, AppError::HttpClient(_)));
    }
}
