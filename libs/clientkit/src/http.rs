//! JSON HTTP client bound to one host.
//!
//! This module provides a wrapper around `reqwest::Client` that pins a base
//! URL, attaches the bearer token from the shared [`TokenStore`] at call
//! time, and folds every outcome into [`ApiError`].
//!
//! Design notes:
//! - The token is read per request, never captured at construction, so a
//!   client built before login sends authenticated requests after it.
//! - Requests without a stored token simply omit the `Authorization`
//!   header; the server decides whether that is acceptable.
//! - Each request runs inside its own tracing span; failures are logged
//!   here once and then propagated, so callers do not log them again.

use std::time::Duration;

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{Instrument, Level};
use url::Url;

use crate::error::ApiError;
use crate::token::TokenStore;

/// HTTP client for one API host. Cheap to clone.
#[derive(Clone)]
pub struct ApiClient {
    base: String,
    inner: reqwest::Client,
    store: TokenStore,
}

impl ApiClient {
    /// Build a client for `base_url` with a per-request `timeout`.
    ///
    /// The base URL's trailing slash is dropped so request paths can always
    /// start with `/` regardless of how the host was configured.
    pub fn new(base_url: Url, timeout: Duration, store: TokenStore) -> reqwest::Result<Self> {
        let inner = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base: base_url.as_str().trim_end_matches('/').to_string(),
            inner,
            store,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base
    }

    /// GET `path` and decode the JSON response body.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let req = self.request(Method::GET, path);
        let response = self.send(Method::GET, path, req).await?;
        decode(path, response).await
    }

    /// POST `body` as JSON to `path` and decode the JSON response body.
    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let req = self.request(Method::POST, path).json(body);
        let response = self.send(Method::POST, path, req).await?;
        decode(path, response).await
    }

    /// POST `body` as JSON to `path`; only the status matters, the response
    /// body is discarded.
    pub async fn post_json_unit<B>(&self, path: &str, body: &B) -> Result<(), ApiError>
    where
        B: Serialize + ?Sized,
    {
        let req = self.request(Method::POST, path).json(body);
        self.send(Method::POST, path, req).await?;
        Ok(())
    }

    /// PATCH `body` as JSON to `path` and decode the JSON response body.
    pub async fn patch_json<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let req = self.request(Method::PATCH, path).json(body);
        let response = self.send(Method::PATCH, path, req).await?;
        decode(path, response).await
    }

    /// DELETE `path`; the response body is discarded.
    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        let req = self.request(Method::DELETE, path);
        self.send(Method::DELETE, path, req).await?;
        Ok(())
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base, path);
        let mut req = self.inner.request(method, url);
        if let Some(token) = self.store.bearer() {
            req = req.bearer_auth(token);
        }
        req
    }

    /// Execute a built request inside a span for the outgoing call and map
    /// the outcome: transport failures become `Network`, non-2xx responses
    /// become `Rejected` with the raw body captured.
    async fn send(
        &self,
        method: Method,
        path: &str,
        req: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, ApiError> {
        let span = tracing::span!(
            Level::INFO, "outgoing_http",
            http.method = %method,
            http.path = %path,
            authenticated = self.store.is_logged_in(),
        );
        async move {
            let response = req.send().await.map_err(|e| {
                tracing::error!(error = %e, "request did not complete");
                ApiError::Network(e)
            })?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                tracing::error!(http.status_code = status.as_u16(), "server rejected request");
                return Err(ApiError::rejected(status, body));
            }
            Ok(response)
        }
        .instrument(span)
        .await
    }
}

async fn decode<T: DeserializeOwned>(path: &str, response: reqwest::Response) -> Result<T, ApiError> {
    response.json::<T>().await.map_err(|e| {
        tracing::error!(path, error = %e, "failed to decode response body");
        ApiError::Network(e)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenPair;
    use httpmock::prelude::*;
    use serde_json::json;

    fn client_for(base: &str) -> (ApiClient, TokenStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::load(dir.path().join("credentials.json"));
        let url = Url::parse(base).unwrap();
        let client = ApiClient::new(url, Duration::from_secs(5), store.clone()).unwrap();
        (client, store, dir)
    }

    #[test]
    fn trailing_slash_is_dropped_from_base() {
        let (client, _, _dir) = client_for("http://127.0.0.1:9999/api/");
        assert_eq!(client.base_url(), "http://127.0.0.1:9999/api");
    }

    #[tokio::test]
    async fn get_decodes_json_body() {
        let server = MockServer::start();
        let m = server.mock(|when, then| {
            when.method(GET).path("/ping");
            then.status(200).json_body(json!({"ok": true}));
        });

        let (client, _, _dir) = client_for(&server.base_url());
        let value: serde_json::Value = client.get_json("/ping").await.unwrap();
        assert_eq!(value["ok"], true);
        m.assert();
    }

    #[tokio::test]
    async fn bearer_token_is_read_at_call_time() {
        let server = MockServer::start();
        let m = server.mock(|when, then| {
            when.method(GET)
                .path("/secure")
                .header("authorization", "Bearer t-123");
            then.status(200).json_body(json!({"ok": true}));
        });

        // Login happens after the client is built.
        let (client, store, _dir) = client_for(&server.base_url());
        store.set(TokenPair::new("t-123", "r-123")).unwrap();

        let _: serde_json::Value = client.get_json("/secure").await.unwrap();
        m.assert();
    }

    #[tokio::test]
    async fn no_authorization_header_when_logged_out() {
        let server = MockServer::start();
        let authed = server.mock(|when, then| {
            when.method(GET).path("/secure").header_exists("authorization");
            then.status(200).json_body(json!({"ok": true}));
        });

        let (client, _, _dir) = client_for(&server.base_url());
        let result: Result<serde_json::Value, _> = client.get_json("/secure").await;

        // The only mock that would answer requires the header, so the call
        // falls through and the mock stays cold.
        assert!(result.is_err());
        assert_eq!(authed.hits(), 0);
    }

    #[tokio::test]
    async fn non_2xx_becomes_rejected_with_body() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/things");
            then.status(409).body("duplicate");
        });

        let (client, _, _dir) = client_for(&server.base_url());
        let result: Result<serde_json::Value, _> =
            client.post_json("/things", &json!({"name": "x"})).await;

        match result {
            Err(ApiError::Rejected { status, body }) => {
                assert_eq!(status.as_u16(), 409);
                assert_eq!(body, "duplicate");
            }
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn transport_failure_becomes_network() {
        // Nothing listens on a discard port.
        let (client, _, _dir) = client_for("http://127.0.0.1:9");
        let result: Result<serde_json::Value, _> = client.get_json("/ping").await;
        assert!(matches!(result, Err(ApiError::Network(_))));
    }

    #[tokio::test]
    async fn undecodable_body_becomes_network() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/ping");
            then.status(200).body("plain text");
        });

        #[derive(serde::Deserialize, Debug)]
        struct Ping {
            #[allow(dead_code)]
            ok: bool,
        }

        let (client, _, _dir) = client_for(&server.base_url());
        let result: Result<Ping, _> = client.get_json("/ping").await;
        assert!(matches!(result, Err(ApiError::Network(_))));
    }

    #[tokio::test]
    async fn post_sends_json_body_and_patch_roundtrips() {
        let server = MockServer::start();
        let post = server.mock(|when, then| {
            when.method(POST)
                .path("/login")
                .json_body(json!({"email": "e@x.io", "password": "pw"}));
            then.status(200)
                .json_body(json!({"token": "t", "refreshToken": "r"}));
        });
        let patch = server.mock(|when, then| {
            when.method(PATCH).path("/profile").json_body(json!({"nick": "n"}));
            then.status(200).json_body(json!({"nick": "n"}));
        });

        let (client, _, _dir) = client_for(&server.base_url());
        let pair: TokenPair = client
            .post_json("/login", &json!({"email": "e@x.io", "password": "pw"}))
            .await
            .unwrap();
        assert_eq!(pair, TokenPair::new("t", "r"));

        let echoed: serde_json::Value =
            client.patch_json("/profile", &json!({"nick": "n"})).await.unwrap();
        assert_eq!(echoed["nick"], "n");

        post.assert();
        patch.assert();
    }

    #[tokio::test]
    async fn delete_and_unit_post_ignore_response_bodies() {
        let server = MockServer::start();
        let del = server.mock(|when, then| {
            when.method(DELETE).path("/things");
            then.status(200).body("gone");
        });
        let pw = server.mock(|when, then| {
            when.method(POST).path("/password");
            then.status(200).body("changed");
        });

        let (client, _, _dir) = client_for(&server.base_url());
        client.delete("/things").await.unwrap();
        client
            .post_json_unit("/password", &json!({"password": "pw"}))
            .await
            .unwrap();

        del.assert();
        pw.assert();
    }
}
