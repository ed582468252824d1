//! Outbound request dispatch with status mapping and failure logging.
//!
//! Log lines carry the method, the endpoint and the status or transport error. Request
//! headers and form bodies are never logged, so bearer tokens and client secrets stay out
//! of the output.

use reqwest::StatusCode;
use reqwest_middleware::RequestBuilder;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::{unauthenticated_error, upstream_error, Error, UpstreamErrorKind};

/// Send a request and map any non-success status onto the crate's error taxonomy.
///
/// - 401 becomes `ErrorKind::Unauthenticated`
/// - any other non-2xx becomes `UpstreamErrorKind::Rejected(status)`
/// - a request that never got a response becomes `ErrorKind::Transport`
pub async fn send_logged(
    method: &str,
    url: &str,
    request: RequestBuilder,
) -> Result<reqwest::Response, Error> {
    debug!("{} {}", method, url);

    let response = request.send().await.map_err(|e| {
        let err = Error::from(e);
        warn!("{} {} failed: {}", method, url, err);
        err
    })?;

    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let error_text = response.text().await.unwrap_or_default();
    warn!("{} {} returned {}: {}", method, url, status, error_text);

    if status == StatusCode::UNAUTHORIZED {
        Err(unauthenticated_error(&error_text))
    } else {
        Err(upstream_error(
            UpstreamErrorKind::Rejected(status.as_u16()),
            &error_text,
        ))
    }
}

/// Decode a successful response body as JSON.
pub async fn json_or_error<T: DeserializeOwned>(
    method: &str,
    url: &str,
    response: reqwest::Response,
) -> Result<T, Error> {
    let body = response.bytes().await?;
    serde_json::from_slice(&body).map_err(|e| {
        warn!("{} {} returned an unparseable body: {}", method, url, e);
        Error {
            source: Some(Box::new(e)),
            error_kind: crate::ErrorKind::Upstream(UpstreamErrorKind::InvalidResponse),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::AuthenticatedClientBuilder;
    use crate::ErrorKind;
    use mockito::Server;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Pong {
        ok: bool,
    }

    #[tokio::test]
    async fn test_success_is_decoded() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/ping")
            .with_status(200)
            .with_body(r#"{"ok": true}"#)
            .create_async()
            .await;

        let client = AuthenticatedClientBuilder::new().build().unwrap();
        let url = format!("{}/ping", server.url());
        let response = send_logged("GET", &url, client.get(&url)).await.unwrap();
        let pong: Pong = json_or_error("GET", &url, response).await.unwrap();
        assert!(pong.ok);
    }

    #[tokio::test]
    async fn test_unauthorized_maps_to_unauthenticated() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/ping")
            .with_status(401)
            .create_async()
            .await;

        let client = AuthenticatedClientBuilder::new().build().unwrap();
        let url = format!("{}/ping", server.url());
        let err = send_logged("GET", &url, client.get(&url)).await.unwrap_err();
        assert_eq!(err.error_kind, ErrorKind::Unauthenticated);
    }

    #[tokio::test]
    async fn test_client_error_maps_to_rejected() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/token")
            .with_status(400)
            .with_body(r#"{"error": "invalid_grant"}"#)
            .create_async()
            .await;

        let client = AuthenticatedClientBuilder::new()
            .with_max_retries(0)
            .build()
            .unwrap();
        let url = format!("{}/token", server.url());
        let err = send_logged("POST", &url, client.post(&url)).await.unwrap_err();
        assert_eq!(
            err.error_kind,
            ErrorKind::Upstream(UpstreamErrorKind::Rejected(400))
        );
    }

    #[tokio::test]
    async fn test_garbage_body_is_invalid_response() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/ping")
            .with_status(200)
            .with_body("<html>")
            .create_async()
            .await;

        let client = AuthenticatedClientBuilder::new().build().unwrap();
        let url = format!("{}/ping", server.url());
        let response = send_logged("GET", &url, client.get(&url)).await.unwrap();
        let err = json_or_error::<Pong>("GET", &url, response)
            .await
            .unwrap_err();
        assert_eq!(
            err.error_kind,
            ErrorKind::Upstream(UpstreamErrorKind::InvalidResponse)
        );
    }
}
