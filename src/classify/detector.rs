use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

const DETECT_TIMEOUT: Duration = Duration::from_secs(8);

#[derive(Debug, thiserror::Error)]
pub enum DetectError {
    #[error("detector error: status {0}")]
    Status(u16),

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("detector returned no candidates")]
    Empty,
}

/// Abstraction for the external language-detection service.
/// Implemented by `HttpDetector` for production; mock implementations used in tests.
pub trait LanguageDetector {
    async fn detect(&self, text: &str) -> Result<String, DetectError>;
}

/// Client for a LibreTranslate-style `POST /detect` endpoint. The response is
/// a confidence-ordered candidate list; only the best candidate is used.
#[derive(Clone)]
pub struct HttpDetector {
    http: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct Detection {
    language: String,
}

impl HttpDetector {
    pub fn new(http: Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

impl LanguageDetector for HttpDetector {
    async fn detect(&self, text: &str) -> Result<String, DetectError> {
        let url = format!("{}/detect", self.base_url);

        let response = self
            .http
            .post(&url)
            .header("User-Agent", crate::USER_AGENT)
            .json(&serde_json::json!({ "q": text }))
            .timeout(DETECT_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DetectError::Status(status.as_u16()));
        }

        let detections: Vec<Detection> = response.json().await?;
        let best = detections.into_iter().next().ok_or(DetectError::Empty)?;
        debug!(language = %best.language, "language detected");
        Ok(best.language)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json_string, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn detect_returns_best_candidate() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/detect"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                { "language": "de", "confidence": 92.0 },
                { "language": "en", "confidence": 8.0 }
            ])))
            .mount(&server)
            .await;

        let detector = HttpDetector::new(Client::new(), &server.uri());
        let language = detector.detect("Wie alt muss man sein?").await.unwrap();
        assert_eq!(language, "de");
    }

    #[tokio::test]
    async fn detect_sends_question_as_query() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/detect"))
            .and(body_json_string(r#"{"q":"salam"}"#))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!([{ "language": "az" }])),
            )
            .expect(1)
            .mount(&server)
            .await;

        let detector = HttpDetector::new(Client::new(), &server.uri());
        assert_eq!(detector.detect("salam").await.unwrap(), "az");
    }

    #[tokio::test]
    async fn detect_error_status_surfaces() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/detect"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let detector = HttpDetector::new(Client::new(), &server.uri());
        let err = detector.detect("hello").await.unwrap_err();
        assert!(matches!(err, DetectError::Status(503)));
    }

    #[tokio::test]
    async fn detect_empty_candidate_list_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/detect"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .mount(&server)
            .await;

        let detector = HttpDetector::new(Client::new(), &server.uri());
        let err = detector.detect("hello").await.unwrap_err();
        assert!(matches!(err, DetectError::Empty));
    }
}
