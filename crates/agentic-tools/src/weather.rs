//! Current-weather lookup (wttr.in JSON format)

use crate::error::{Error, Result};
use crate::http::{join_url, HttpClient};
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// wttr.in base URL
pub const WTTR_BASE: &str = "https://wttr.in";

/// Current conditions at a location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReport {
    /// Location as requested
    pub location: String,
    /// Temperature, °C
    pub temperature_c: f64,
    /// Apparent temperature, °C
    pub feels_like_c: f64,
    /// Relative humidity, %
    pub humidity: u32,
    /// Short English description
    pub description: String,
    /// Wind speed, km/h
    pub wind_kph: f64,
}

/// Weather source
#[async_trait::async_trait]
pub trait WeatherProvider: Send + Sync {
    /// Current conditions for `location`
    async fn current(&self, location: &str) -> Result<WeatherReport>;
}

/// wttr.in client
#[derive(Debug, Clone)]
pub struct WttrWeather {
    http: HttpClient,
    base_url: String,
}

#[derive(Deserialize)]
struct WttrResponse {
    #[serde(default)]
    current_condition: Vec<WttrCondition>,
}

#[derive(Deserialize)]
struct WttrCondition {
    #[serde(rename = "temp_C", default)]
    temp_c: String,
    #[serde(rename = "FeelsLikeC", default)]
    feels_like_c: String,
    #[serde(default)]
    humidity: String,
    #[serde(rename = "weatherDesc", default)]
    weather_desc: Vec<WttrText>,
    #[serde(rename = "windspeedKmph", default)]
    windspeed_kmph: String,
}

#[derive(Deserialize)]
struct WttrText {
    value: String,
}

impl WttrWeather {
    /// Create a client for `base_url` (normally [`WTTR_BASE`])
    #[must_use]
    pub fn new(http: HttpClient, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }
}

#[async_trait::async_trait]
impl WeatherProvider for WttrWeather {
    #[instrument(skip(self))]
    async fn current(&self, location: &str) -> Result<WeatherReport> {
        let location = location.trim();
        if location.is_empty() {
            return Err(Error::InvalidInput("location must not be empty".to_string()));
        }

        let url = join_url(&self.base_url, &urlencoding::encode(location));
        let response: WttrResponse = self
            .http
            .get_json(|c| c.get(&url).query(&[("format", "j1")]))
            .await?;

        let condition = response
            .current_condition
            .into_iter()
            .next()
            .ok_or_else(|| Error::InvalidResponse("no current_condition".to_string()))?;

        Ok(WeatherReport {
            location: location.to_string(),
            temperature_c: condition.temp_c.parse().unwrap_or_default(),
            feels_like_c: condition.feels_like_c.parse().unwrap_or_default(),
            humidity: condition.humidity.parse().unwrap_or_default(),
            description: condition
                .weather_desc
                .into_iter()
                .next()
                .map(|d| d.value)
                .unwrap_or_default(),
            wind_kph: condition.windspeed_kmph.parse().unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::HttpConfig;
    use mockito::Matcher;

    #[tokio::test]
    async fn test_current_weather() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/Seoul")
            .match_query(Matcher::UrlEncoded("format".into(), "j1".into()))
            .with_status(200)
            .with_body(r#"{"current_condition": [{
                "temp_C": "21", "FeelsLikeC": "20", "humidity": "55",
                "weatherDesc": [{"value": "Partly cloudy"}], "windspeedKmph": "11"
            }]}"#)
            .create_async()
            .await;

        let weather = WttrWeather::new(HttpClient::new(HttpConfig::default()).unwrap(), server.url());
        let report = weather.current("Seoul").await.unwrap();

        assert_eq!(report.temperature_c, 21.0);
        assert_eq!(report.humidity, 55);
        assert_eq!(report.description, "Partly cloudy");
    }

    #[tokio::test]
    async fn test_missing_condition_is_invalid_response() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/Busan")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let weather = WttrWeather::new(HttpClient::new(HttpConfig::default()).unwrap(), server.url());
        assert!(matches!(
            weather.current("Busan").await,
            Err(Error::InvalidResponse(_))
        ));
    }
}
