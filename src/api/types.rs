//! Request and outcome types shared by both executor front-ends.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Supported external APIs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiAlias {
    /// OpenWeatherMap current-weather endpoint
    Weather,
    /// NewsAPI everything endpoint
    News,
}

impl ApiAlias {
    /// Canonical lowercase name, used as routing key, filename prefix and
    /// credential lookup base
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Weather => "weather",
            Self::News => "news",
        }
    }
}

impl fmt::Display for ApiAlias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ApiAlias {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "weather" => Ok(Self::Weather),
            "news" => Ok(Self::News),
            _ => Err(format!("Invalid API alias: {s}")),
        }
    }
}

/// A unit of work: which API to call and with what parameters
///
/// This is the wire shape of a broker message body and the payload of a
/// queued task. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRequest {
    pub api_alias: ApiAlias,
    #[serde(default)]
    pub params: HashMap<String, String>,
}

impl TaskRequest {
    /// Build a request from explicit parameter pairs
    pub fn new<I, K, V>(api_alias: ApiAlias, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            api_alias,
            params: params
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Weather request; `country` defaults to "RU" when `None`
    pub fn weather(city: impl Into<String>, country: Option<String>) -> Self {
        Self::new(
            ApiAlias::Weather,
            [
                ("city".to_string(), city.into()),
                ("country".to_string(), country.unwrap_or_else(|| "RU".into())),
            ],
        )
    }

    /// News request; `language` defaults to "en" when `None`
    pub fn news(query: impl Into<String>, language: Option<String>) -> Self {
        Self::new(
            ApiAlias::News,
            [
                ("query".to_string(), query.into()),
                (
                    "language".to_string(),
                    language.unwrap_or_else(|| "en".into()),
                ),
            ],
        )
    }

    /// Parameter lookup with a fallback default
    pub fn param_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.params.get(key).map(String::as_str).unwrap_or(default)
    }
}

/// Structured success payload returned by a completed task
///
/// Mirrors what the status facade hands back to the caller: a status marker,
/// an echo of the identifying input parameters, the fetched upstream body and
/// the path the response was stored under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskOutcome {
    pub status: String,
    #[serde(flatten)]
    pub params: HashMap<String, String>,
    pub data: serde_json::Value,
    pub file: String,
}

impl TaskOutcome {
    pub fn success(
        params: HashMap<String, String>,
        data: serde_json::Value,
        file: impl Into<String>,
    ) -> Self {
        Self {
            status: "success".to_string(),
            params,
            data,
            file: file.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_alias_roundtrip() {
        assert_eq!(ApiAlias::from_str("weather").unwrap(), ApiAlias::Weather);
        assert_eq!(ApiAlias::from_str("news").unwrap(), ApiAlias::News);
        assert!(ApiAlias::from_str("unknown").is_err());
        assert_eq!(ApiAlias::Weather.to_string(), "weather");
    }

    #[test]
    fn test_request_wire_shape() {
        let request = TaskRequest::weather("Kazan", None);
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["api_alias"], "weather");
        assert_eq!(body["params"]["city"], "Kazan");
        assert_eq!(body["params"]["country"], "RU");

        let decoded: TaskRequest = serde_json::from_value(body).unwrap();
        assert_eq!(decoded, request);
    }

    #[test]
    fn test_request_missing_params_field_defaults_empty() {
        let decoded: TaskRequest =
            serde_json::from_str(r#"{"api_alias": "news"}"#).unwrap();
        assert_eq!(decoded.api_alias, ApiAlias::News);
        assert!(decoded.params.is_empty());
        assert_eq!(decoded.param_or("query", "technology"), "technology");
    }

    #[test]
    fn test_news_defaults() {
        let request = TaskRequest::news("rust", None);
        assert_eq!(request.param_or("language", ""), "en");
        assert_eq!(request.param_or("query", ""), "rust");
    }

    #[test]
    fn test_outcome_flattens_params() {
        let mut params = HashMap::new();
        params.insert("city".to_string(), "Kazan".to_string());
        let outcome = TaskOutcome::success(
            params,
            serde_json::json!({"temp": 15}),
            "/data/weather_Kazan_RU.json",
        );

        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(value["status"], "success");
        assert_eq!(value["city"], "Kazan");
        assert_eq!(value["data"]["temp"], 15);
        assert!(value["file"].as_str().unwrap().ends_with("weather_Kazan_RU.json"));
    }
}
