use serde::{Deserialize, Serialize};

/// Normalized weather for one city at request time
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WeatherSnapshot {
    /// Degrees Celsius, rounded
    pub temperature: i64,
    pub condition: String,
    /// Percent
    pub humidity: u32,
    pub wind_speed: f64,
}

// ============================================================================
// OpenWeather API Types
// ============================================================================

/// Raw response from the OpenWeather current-weather endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct OpenWeatherResponse {
    pub main: OpenWeatherMain,
    #[serde(default)]
    pub weather: Vec<OpenWeatherCondition>,
    #[serde(default)]
    pub wind: Option<OpenWeatherWind>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OpenWeatherMain {
    pub temp: f64,
    pub humidity: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OpenWeatherCondition {
    pub main: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OpenWeatherWind {
    pub speed: f64,
}

/// OpenWeather error body, e.g. `{"cod":"404","message":"city not found"}`
#[derive(Debug, Clone, Deserialize)]
pub struct OpenWeatherError {
    #[serde(default)]
    pub message: Option<String>,
}

impl From<OpenWeatherResponse> for WeatherSnapshot {
    fn from(raw: OpenWeatherResponse) -> Self {
        let condition = raw
            .weather
            .into_iter()
            .next()
            .map(|w| w.main)
            .unwrap_or_else(|| "Unknown".to_string());

        WeatherSnapshot {
            temperature: raw.main.temp.round() as i64,
            condition,
            humidity: raw.main.humidity,
            wind_speed: raw.wind.map(|w| w.speed).unwrap_or_default(),
        }
    }
}
