//! API client for a running hiring server

use anyhow::{Context, Result};
use hiring_lib::{Candidate, MatchInsight, RankedCandidate};
use reqwest::{Client, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::collections::HashMap;
use url::Url;

pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        let base_url = Url::parse(base_url).context("Invalid API URL")?;

        Ok(Self { client, base_url })
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.base_url.join(path).context("Invalid path")?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to send request")?;
        Self::decode(response).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        let url = self.base_url.join(path).context("Invalid path")?;
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .context("Failed to send request")?;
        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            match serde_json::from_str::<ErrorResponse>(&body) {
                Ok(err) => anyhow::bail!("API error ({}): {}: {}", status, err.error, err.message),
                Err(_) => anyhow::bail!("API error ({}): {}", status, body),
            }
        }
        response.json().await.context("Failed to parse response")
    }

    pub async fn health(&self) -> Result<HealthStatus> {
        self.get("health").await
    }

    pub async fn predict(&self, features: HashMap<String, serde_json::Value>) -> Result<PredictResponse> {
        self.post("predict", &PredictRequest { features }).await
    }

    pub async fn rank(&self, candidates: Vec<Candidate>) -> Result<RankResponse> {
        self.post("rank", &RankRequest { candidates }).await
    }

    pub async fn reload(&self) -> Result<ReloadResponse> {
        self.post("reload", &serde_json::json!({})).await
    }
}

// API response types

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub model_loaded: bool,
    #[serde(default)]
    pub model_version: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictRequest {
    pub features: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictResponse {
    pub success: bool,
    /// Match probability in [0, 1]
    pub prediction: f64,
    pub label: u8,
    pub model_version: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insight: Option<MatchInsight>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankRequest {
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankResponse {
    pub success: bool,
    pub candidates: Vec<RankedCandidate>,
    pub model_version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReloadResponse {
    pub success: bool,
    pub model_version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_health() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/health")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"status":"healthy","model_loaded":true,"model_version":"rf-0123456789ab","components":{}}"#)
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let health = client.health().await.unwrap();
        assert!(health.model_loaded);
        assert_eq!(health.model_version.as_deref(), Some("rf-0123456789ab"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_predict_sends_features() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/predict")
            .match_body(mockito::Matcher::Json(json!({"features": {"skills": "5"}})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "success": true,
                    "prediction": 0.875,
                    "label": 1,
                    "model_version": "rf-0123456789ab",
                    "message": "Random Forest prediction successful"
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let features = HashMap::from([("skills".to_string(), json!("5"))]);
        let response = client.predict(features).await.unwrap();
        assert_eq!(response.prediction, 0.875);
        assert_eq!(response.label, 1);
        assert!(response.insight.is_none());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_rank() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/rank")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "success": true,
                    "candidates": [
                        {"id": "b", "match_score": 0.9, "label": 1, "scored": true},
                        {"id": "a", "match_score": 0.5, "label": 0, "scored": false}
                    ],
                    "model_version": "rf-0123456789ab"
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let pool = vec![
            Candidate {
                id: "a".to_string(),
                features: HashMap::new(),
            },
            Candidate {
                id: "b".to_string(),
                features: HashMap::from([("skill_match_score".to_string(), json!(0.9))]),
            },
        ];
        let response = client.rank(pool).await.unwrap();
        assert_eq!(response.candidates[0].id, "b");
        assert!(!response.candidates[1].scored);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_error_body_is_reported() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/predict")
            .with_status(503)
            .with_header("content-type", "application/json")
            .with_body(r#"{"success":false,"error":"model_unavailable","message":"no trained model is loaded"}"#)
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let err = client.predict(HashMap::new()).await.unwrap_err();
        let message = err.to_string();
        assert!(message.contains("503"));
        assert!(message.contains("model_unavailable"));
    }

    #[test]
    fn test_invalid_url() {
        assert!(ApiClient::new("not a url").is_err());
    }
}
