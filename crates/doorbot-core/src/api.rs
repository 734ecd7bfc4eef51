use std::time::Duration;

use reqwest::{Response, StatusCode};
use thiserror::Error;

use crate::types::{AuthorizationStatus, HealthSnapshot, UnlockEvent};

/// Every request is independently bounded; a slow server must not stall
/// the poll cadence for longer than this.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

// ---------------------------------------------------------------------------
// TransportError
// ---------------------------------------------------------------------------

/// Failure of one server call, split so callers (and tests) can tell what
/// actually went wrong instead of a blanket "request failed".
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection, DNS, or timeout failure before an HTTP response arrived.
    #[error("request failed: {0}")]
    Request(#[source] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("server rejected request: {0}")]
    Status(StatusCode),

    /// The response body could not be decoded.
    #[error("failed to decode response: {0}")]
    Decode(#[source] reqwest::Error),
}

fn check_status(response: Response) -> Result<Response, TransportError> {
    if !response.status().is_success() {
        return Err(TransportError::Status(response.status()));
    }
    Ok(response)
}

// ---------------------------------------------------------------------------
// ApiClient
// ---------------------------------------------------------------------------

/// Client for the authorization server. One `reqwest::Client` built at
/// startup and shared by every call; the bearer token is sent as-is (it is
/// opaque here, and an empty token is tolerated).
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> crate::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(TransportError::Request)?;
        Ok(Self {
            http,
            base_url: base_url.into(),
            token: token.into(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    /// `GET /` — ask the server whether to unlock.
    pub async fn poll(&self) -> Result<AuthorizationStatus, TransportError> {
        let response = self
            .http
            .get(self.url("/"))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(TransportError::Request)?;
        check_status(response)?
            .json()
            .await
            .map_err(TransportError::Decode)
    }

    /// `POST /sounds` — publish the locally available clip names.
    pub async fn sync_sounds(&self, sounds: &[String]) -> Result<(), TransportError> {
        let response = self
            .http
            .post(self.url("/sounds"))
            .bearer_auth(&self.token)
            .json(&serde_json::json!({ "sounds": sounds }))
            .send()
            .await
            .map_err(TransportError::Request)?;
        check_status(response)?;
        Ok(())
    }

    /// `POST /log` — push one unlock event.
    pub async fn push_event(&self, event: &UnlockEvent) -> Result<(), TransportError> {
        let response = self
            .http
            .post(self.url("/log"))
            .bearer_auth(&self.token)
            .json(event)
            .send()
            .await
            .map_err(TransportError::Request)?;
        check_status(response)?;
        Ok(())
    }

    /// `POST /health/doorbot` — push one heartbeat.
    pub async fn push_heartbeat(&self, snapshot: &HealthSnapshot) -> Result<(), TransportError> {
        let response = self
            .http
            .post(self.url("/health/doorbot"))
            .bearer_auth(&self.token)
            .json(snapshot)
            .send()
            .await
            .map_err(TransportError::Request)?;
        check_status(response)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::timestamp_now;
    use mockito::Matcher;

    #[tokio::test]
    async fn poll_parses_a_full_response() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/")
            .match_header("authorization", "Bearer secret")
            .with_status(200)
            .with_body(r#"{"letmein": true, "sound": "chime.wav", "hold_time": 5, "sender": "alice"}"#)
            .create_async()
            .await;

        let client = ApiClient::new(server.url(), "secret").unwrap();
        let status = client.poll().await.unwrap();
        assert!(status.letmein);
        assert_eq!(status.sound, "chime.wav");
        assert_eq!(status.hold_time, 5);
        assert_eq!(status.sender, "alice");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn poll_defaults_absent_fields() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/")
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let client = ApiClient::new(server.url(), "").unwrap();
        let status = client.poll().await.unwrap();
        assert!(!status.letmein);
        assert_eq!(status.hold_time, 0);
    }

    #[tokio::test]
    async fn poll_non_success_is_a_status_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/")
            .with_status(503)
            .create_async()
            .await;

        let client = ApiClient::new(server.url(), "secret").unwrap();
        match client.poll().await.unwrap_err() {
            TransportError::Status(code) => assert_eq!(code, StatusCode::SERVICE_UNAVAILABLE),
            other => panic!("expected a status error, got {other}"),
        }
    }

    #[tokio::test]
    async fn poll_garbage_body_is_a_decode_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/")
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        let client = ApiClient::new(server.url(), "secret").unwrap();
        let err = client.poll().await.unwrap_err();
        assert!(matches!(err, TransportError::Decode(_)));
    }

    #[tokio::test]
    async fn poll_unreachable_server_is_a_request_error() {
        // Discard port; nothing listens there.
        let client = ApiClient::new("http://127.0.0.1:9", "secret").unwrap();
        let err = client.poll().await.unwrap_err();
        assert!(matches!(err, TransportError::Request(_)));
    }

    #[tokio::test]
    async fn sync_sounds_posts_the_expected_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/sounds")
            .match_body(Matcher::Json(serde_json::json!({
                "sounds": ["a.wav", "b.wav"]
            })))
            .with_status(200)
            .create_async()
            .await;

        let client = ApiClient::new(server.url(), "secret").unwrap();
        client
            .sync_sounds(&["a.wav".into(), "b.wav".into()])
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn push_event_sends_the_event_verbatim() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/log")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "sound": "chime.wav",
                "sender": "alice"
            })))
            .with_status(200)
            .create_async()
            .await;

        let client = ApiClient::new(server.url(), "secret").unwrap();
        let event = UnlockEvent::new("chime.wav", "alice");
        client.push_event(&event).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn push_heartbeat_targets_the_doorbot_health_endpoint() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/health/doorbot")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "uptime_seconds": 7
            })))
            .with_status(200)
            .create_async()
            .await;

        let client = ApiClient::new(server.url(), "secret").unwrap();
        let snapshot = HealthSnapshot {
            timestamp: timestamp_now(),
            uptime_seconds: 7,
            last_unlock: None,
            cpu_temp_c: Some(48.2),
            memory_used_pct: None,
        };
        client.push_heartbeat(&snapshot).await.unwrap();
        mock.assert_async().await;
    }
}
