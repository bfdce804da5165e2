use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{check_status, http_client, ServiceError, WeatherProvider};

const WEATHER_URL: &str = "https://api.weatherapi.com/v1/current.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherLocation {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherCondition {
    pub text: String,
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentWeather {
    pub temp_c: f64,
    pub temp_f: f64,
    pub condition: WeatherCondition,
    pub wind_mph: f64,
    pub wind_degree: f64,
    pub humidity: f64,
    pub cloud: f64,
    pub feelslike_c: f64,
    pub feelslike_f: f64,
    pub uv: f64,
}

/// Current conditions at a point, in the shape weatherapi.com reports them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReport {
    pub location: WeatherLocation,
    pub current: CurrentWeather,
}

pub struct WeatherApiClient {
    client: reqwest::Client,
    api_key: String,
}

impl WeatherApiClient {
    pub fn new(api_key: &str) -> Result<Self, ServiceError> {
        Ok(WeatherApiClient {
            client: http_client()?,
            api_key: api_key.to_string(),
        })
    }
}

#[async_trait]
impl WeatherProvider for WeatherApiClient {
    async fn current_weather(&self, latitude: f64, longitude: f64) -> Result<WeatherReport, ServiceError> {
        let query = format!("{},{}", latitude, longitude);
        let response = self
            .client
            .get(WEATHER_URL)
            .query(&[("key", self.api_key.as_str()), ("q", query.as_str())])
            .send()
            .await?;
        let response = check_status("weatherapi.com", response).await?;
        Ok(response.json().await?)
    }
}
