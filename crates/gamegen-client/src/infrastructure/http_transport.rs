//! reqwest-backed [`Transport`].
//!
//! One [`reqwest::Client`] is built per transport with the configured
//! whole-request timeout and a cookie store, so the session cookie set by
//! `login` is sent with every later request (the browser's
//! `credentials: "include"`).
//!
//! reqwest errors are classified into [`TransportError`] here; nothing above
//! this module sees a reqwest type.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, RequestBuilder};
use tracing::{debug, info};

use crate::application::dispatcher::{RawResponse, RequestDispatcher, Transport, TransportError};
use crate::domain::config::ClientConfig;

pub struct HttpTransport {
    client: Client,
    config: ClientConfig,
}

impl HttpTransport {
    /// Builds the HTTP client.
    ///
    /// # Errors
    ///
    /// [`TransportError::Other`] when the TLS backend cannot be initialised.
    pub fn new(config: ClientConfig) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .cookie_store(true)
            .build()
            .map_err(|e| TransportError::Other(e.to_string()))?;
        Ok(Self { client, config })
    }

    async fn execute(&self, request: RequestBuilder) -> Result<RawResponse, TransportError> {
        let response = request.send().await.map_err(classify)?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(classify)?;
        debug!(status, bytes = body.len(), "response received");
        Ok(RawResponse::new(status, body.to_vec()))
    }
}

fn classify(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout
    } else if e.is_connect() {
        TransportError::Connect(e.to_string())
    } else {
        TransportError::Other(e.to_string())
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post_json(&self, body: Vec<u8>) -> Result<RawResponse, TransportError> {
        let request = self
            .client
            .post(self.config.action_url())
            .header(CONTENT_TYPE, "application/json")
            .body(body);
        self.execute(request).await
    }

    async fn post_form(
        &self,
        path: &str,
        fields: Vec<(String, String)>,
    ) -> Result<RawResponse, TransportError> {
        let request = self.client.post(self.config.endpoint_url(path)).form(&fields);
        self.execute(request).await
    }

    async fn get(&self, path: &str) -> Result<RawResponse, TransportError> {
        let request = self.client.get(self.config.endpoint_url(path));
        self.execute(request).await
    }
}

/// Builds a [`RequestDispatcher`] talking HTTP to `config.server_url`.
///
/// # Errors
///
/// See [`HttpTransport::new`].
pub fn connect(config: &ClientConfig) -> Result<RequestDispatcher, TransportError> {
    let transport = HttpTransport::new(config.clone())?;
    info!(
        url = %config.action_url(),
        timeout_secs = config.timeout_secs,
        auth_mode = ?config.auth_mode,
        "dispatcher ready"
    );
    Ok(RequestDispatcher::new(Arc::new(transport), config.auth_mode))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{body_string, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer) -> ClientConfig {
        ClientConfig {
            server_url: server.uri(),
            timeout_secs: 5,
            ..ClientConfig::default()
        }
    }

    #[tokio::test]
    async fn test_post_json_sets_content_type_and_returns_body() {
        // Arrange
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/"))
            .and(header("content-type", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"status":"success"}"#))
            .expect(1)
            .mount(&server)
            .await;
        let transport = HttpTransport::new(config_for(&server)).unwrap();

        // Act
        let raw = transport.post_json(b"{}".to_vec()).await.unwrap();

        // Assert
        assert_eq!(raw.status, 200);
        assert_eq!(raw.body, br#"{"status":"success"}"#.to_vec());
    }

    #[tokio::test]
    async fn test_post_form_urlencodes_fields() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/login"))
            .and(body_string("email=a%40b.c&password=p+w"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"status":"success"}"#))
            .expect(1)
            .mount(&server)
            .await;
        let transport = HttpTransport::new(config_for(&server)).unwrap();

        let raw = transport
            .post_form(
                "/api/login",
                vec![
                    ("email".to_string(), "a@b.c".to_string()),
                    ("password".to_string(), "p w".to_string()),
                ],
            )
            .await
            .unwrap();

        assert!(raw.is_success());
    }

    #[tokio::test]
    async fn test_non_2xx_status_is_returned_not_raised() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/check-auth"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;
        let transport = HttpTransport::new(config_for(&server)).unwrap();

        let raw = transport.get("/api/check-auth").await.unwrap();

        assert_eq!(raw.status, 503);
    }

    #[tokio::test]
    async fn test_slow_server_is_classified_as_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
            .mount(&server)
            .await;
        let config = ClientConfig {
            timeout_secs: 1,
            ..config_for(&server)
        };
        let transport = HttpTransport::new(config).unwrap();

        let err = transport.post_json(b"{}".to_vec()).await.unwrap_err();

        assert_eq!(err, TransportError::Timeout);
    }
}
