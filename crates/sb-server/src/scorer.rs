//! HTTP client for an external sentiment scoring service.
//!
//! POSTs `{"text": ...}` to `{url}/sentiment` and expects
//! `{"sentiment": "positive", "score": 0.93, "compound": 0.71}` back.
//! Any failure is reported as a `CollaboratorError`; the agent falls back
//! to a neutral score, so a down scorer never blocks a reply.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use sb_dialog::{CollaboratorError, CollaboratorResult, SentimentScorer};
use sb_protocol::transcript::{Sentiment, SentimentLabel};

use crate::config::ScorerConfig;

#[derive(Serialize)]
struct ScoreRequest<'a> {
    text: &'a str,
}

/// Scorer response (only fields we need).
#[derive(Deserialize)]
struct ScoreResponse {
    sentiment: String,
    score: f64,
    #[serde(default)]
    compound: Option<f64>,
}

/// Client for the sentiment service.
pub struct HttpScorer {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl HttpScorer {
    pub fn new(config: &ScorerConfig) -> reqwest::Result<Self> {
        let timeout = Duration::from_millis(config.timeout_ms);
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: format!("{}/sentiment", config.url.trim_end_matches('/')),
            timeout,
        })
    }

    fn map_err(&self, e: reqwest::Error) -> CollaboratorError {
        if e.is_timeout() {
            CollaboratorError::Timeout(self.timeout)
        } else if e.is_connect() {
            CollaboratorError::Unavailable(e.to_string())
        } else {
            CollaboratorError::Backend(e.to_string())
        }
    }
}

fn parse_label(raw: &str) -> Option<SentimentLabel> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "positive" => Some(SentimentLabel::Positive),
        "negative" => Some(SentimentLabel::Negative),
        "neutral" => Some(SentimentLabel::Neutral),
        _ => None,
    }
}

#[async_trait]
impl SentimentScorer for HttpScorer {
    async fn score(&self, text: &str) -> CollaboratorResult<Sentiment> {
        let response = self
            .client
            .post(&self.url)
            .json(&ScoreRequest { text })
            .send()
            .await
            .map_err(|e| self.map_err(e))?;

        let status = response.status();
        if status.is_server_error() {
            return Err(CollaboratorError::Unavailable(format!("scorer returned {status}")));
        }
        if !status.is_success() {
            return Err(CollaboratorError::Backend(format!("scorer returned {status}")));
        }

        let body: ScoreResponse = response.json().await.map_err(|e| self.map_err(e))?;
        let label = parse_label(&body.sentiment).ok_or_else(|| {
            CollaboratorError::Backend(format!("unrecognized sentiment label: {}", body.sentiment))
        })?;
        let score = body.score.clamp(0.0, 1.0);
        let compound = body.compound.unwrap_or(match label {
            SentimentLabel::Positive => score,
            SentimentLabel::Negative => -score,
            SentimentLabel::Neutral => 0.0,
        });

        Ok(Sentiment {
            label,
            score,
            compound: compound.clamp(-1.0, 1.0),
        })
    }

    fn name(&self) -> &str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn scorer_for(server: &MockServer, timeout_ms: u64) -> HttpScorer {
        HttpScorer::new(&ScorerConfig {
            url: server.uri(),
            timeout_ms,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn parses_scored_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/sentiment"))
            .and(body_json(serde_json::json!({"text": "love it"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "sentiment": "POSITIVE",
                "score": 0.93,
                "compound": 0.71
            })))
            .mount(&server)
            .await;

        let s = scorer_for(&server, 1000).score("love it").await.unwrap();
        assert_eq!(s.label, SentimentLabel::Positive);
        assert_eq!(s.score, 0.93);
        assert_eq!(s.compound, 0.71);
    }

    #[tokio::test]
    async fn missing_compound_follows_label() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/sentiment"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "sentiment": "negative",
                "score": 0.8
            })))
            .mount(&server)
            .await;

        let s = scorer_for(&server, 1000).score("broken").await.unwrap();
        assert_eq!(s.label, SentimentLabel::Negative);
        assert_eq!(s.compound, -0.8);
    }

    #[tokio::test]
    async fn server_error_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = scorer_for(&server, 1000).score("hi").await.unwrap_err();
        assert!(matches!(err, CollaboratorError::Unavailable(_)));
    }

    #[tokio::test]
    async fn unknown_label_is_backend_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "sentiment": "ecstatic",
                "score": 0.99
            })))
            .mount(&server)
            .await;

        let err = scorer_for(&server, 1000).score("hi").await.unwrap_err();
        assert!(matches!(err, CollaboratorError::Backend(_)));
    }

    #[tokio::test]
    async fn garbage_body_is_backend_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = scorer_for(&server, 1000).score("hi").await.unwrap_err();
        assert!(matches!(err, CollaboratorError::Backend(_)));
    }

    #[tokio::test]
    async fn slow_scorer_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_delay(Duration::from_millis(500))
                    .set_body_json(serde_json::json!({"sentiment": "neutral", "score": 0.5})),
            )
            .mount(&server)
            .await;

        let err = scorer_for(&server, 50).score("hi").await.unwrap_err();
        assert_eq!(err, CollaboratorError::Timeout(Duration::from_millis(50)));
    }

    #[tokio::test]
    async fn unreachable_scorer_is_unavailable() {
        let scorer = HttpScorer::new(&ScorerConfig {
            url: "http://127.0.0.1:1".into(),
            timeout_ms: 1000,
        })
        .unwrap();
        let err = scorer.score("hi").await.unwrap_err();
        assert!(matches!(err, CollaboratorError::Unavailable(_)));
    }
}
