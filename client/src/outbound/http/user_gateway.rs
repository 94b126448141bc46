//! Reqwest-backed user gateway.
//!
//! This adapter owns transport details only: URL building, JSON encoding,
//! timeout and status handling, and decoding backend records. Every failure
//! collapses into the operation's [`DataAccessError`]; the detail is logged.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::domain::ports::{DataAccessError, UserGateway};
use crate::domain::{User, UserId, UserPayload};

/// Errors raised while building the HTTP gateway.
#[derive(Debug, Error)]
pub enum HttpGatewayBuildError {
    /// The reqwest client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
    /// The base URL cannot carry path segments.
    #[error("base URL cannot be used for REST paths: {url}")]
    InvalidBaseUrl {
        /// Rejected URL.
        url: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    List,
    Fetch,
    Create,
    Update,
    Delete,
}

impl Operation {
    const fn name(self) -> &'static str {
        match self {
            Self::List => "list",
            Self::Fetch => "fetch",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }

    const fn error(self) -> DataAccessError {
        match self {
            Self::List => DataAccessError::list(),
            Self::Fetch => DataAccessError::fetch(),
            Self::Create => DataAccessError::create(),
            Self::Update => DataAccessError::update(),
            Self::Delete => DataAccessError::delete(),
        }
    }
}

/// User gateway speaking JSON to `{base}/users`.
#[derive(Debug, Clone)]
pub struct HttpUserGateway {
    client: Client,
    users: Url,
}

impl HttpUserGateway {
    /// Build a gateway whose every request is bounded by `timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error when the base URL cannot carry a path or the reqwest
    /// client cannot be constructed.
    ///
    /// # Examples
    /// ```
    /// use std::time::Duration;
    ///
    /// use client::outbound::http::HttpUserGateway;
    ///
    /// let base = url::Url::parse("http://localhost:3001").expect("valid URL");
    /// let gateway = HttpUserGateway::new(&base, Duration::from_secs(10)).expect("gateway");
    /// assert_eq!(gateway.users_url().as_str(), "http://localhost:3001/users");
    /// ```
    pub fn new(base_url: &Url, timeout: Duration) -> Result<Self, HttpGatewayBuildError> {
        let users = users_url(base_url)?;
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, users })
    }

    /// Collection URL for user records.
    #[must_use]
    pub const fn users_url(&self) -> &Url {
        &self.users
    }

    fn record_url(&self, id: UserId) -> Url {
        let mut url = self.users.clone();
        // The collection URL was checked to accept path segments.
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.push(&id.to_string());
        }
        url
    }

    async fn execute(
        &self,
        operation: Operation,
        request: RequestBuilder,
    ) -> Result<Vec<u8>, DataAccessError> {
        let response = request
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|error| map_transport_error(operation, &error))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|error| map_transport_error(operation, &error))?;
        if !status.is_success() {
            return Err(map_status_error(operation, status, body.as_ref()));
        }
        Ok(body.to_vec())
    }
}

#[async_trait]
impl UserGateway for HttpUserGateway {
    async fn list(&self) -> Result<Vec<User>, DataAccessError> {
        let request = self.client.get(self.users.clone());
        let body = self.execute(Operation::List, request).await?;
        decode(Operation::List, &body)
    }

    async fn fetch(&self, id: UserId) -> Result<User, DataAccessError> {
        let request = self.client.get(self.record_url(id));
        let body = self.execute(Operation::Fetch, request).await?;
        decode(Operation::Fetch, &body)
    }

    async fn create(&self, payload: &UserPayload) -> Result<User, DataAccessError> {
        let request = self.client.post(self.users.clone()).json(payload);
        let body = self.execute(Operation::Create, request).await?;
        decode(Operation::Create, &body)
    }

    async fn update(&self, id: UserId, payload: &UserPayload) -> Result<User, DataAccessError> {
        let request = self.client.put(self.record_url(id)).json(payload);
        let body = self.execute(Operation::Update, request).await?;
        decode(Operation::Update, &body)
    }

    async fn delete(&self, id: UserId) -> Result<(), DataAccessError> {
        let request = self.client.delete(self.record_url(id));
        self.execute(Operation::Delete, request).await.map(|_| ())
    }
}

fn users_url(base: &Url) -> Result<Url, HttpGatewayBuildError> {
    let mut url = base.clone();
    {
        let mut segments =
            url.path_segments_mut()
                .map_err(|()| HttpGatewayBuildError::InvalidBaseUrl {
                    url: base.to_string(),
                })?;
        segments.pop_if_empty().push("users");
    }
    Ok(url)
}

fn decode<T: DeserializeOwned>(operation: Operation, body: &[u8]) -> Result<T, DataAccessError> {
    serde_json::from_slice(body).map_err(|error| {
        debug!(
            operation = operation.name(),
            %error,
            body = %body_preview(body),
            "user backend response could not be decoded"
        );
        operation.error()
    })
}

fn map_transport_error(operation: Operation, error: &reqwest::Error) -> DataAccessError {
    debug!(
        operation = operation.name(),
        timed_out = error.is_timeout(),
        %error,
        "user backend request failed"
    );
    operation.error()
}

fn map_status_error(operation: Operation, status: StatusCode, body: &[u8]) -> DataAccessError {
    debug!(
        operation = operation.name(),
        status = status.as_u16(),
        body = %body_preview(body),
        "user backend returned an error status"
    );
    operation.error()
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for non-network mapping helpers.

    use super::*;
    use rstest::rstest;

    fn gateway(base: &str) -> HttpUserGateway {
        let base = Url::parse(base).expect("valid URL");
        HttpUserGateway::new(&base, Duration::from_secs(1)).expect("gateway builds")
    }

    #[rstest]
    #[case("http://localhost:3001", "http://localhost:3001/users")]
    #[case("http://localhost:3001/", "http://localhost:3001/users")]
    #[case("https://api.example.org/v1", "https://api.example.org/v1/users")]
    #[case("https://api.example.org/v1/", "https://api.example.org/v1/users")]
    fn users_url_appends_the_collection(#[case] base: &str, #[case] expected: &str) {
        assert_eq!(gateway(base).users_url().as_str(), expected);
    }

    #[rstest]
    fn record_url_appends_the_identifier() {
        let url = gateway("http://localhost:3001").record_url(UserId::new(5));
        assert_eq!(url.as_str(), "http://localhost:3001/users/5");
    }

    #[rstest]
    fn rejects_base_urls_without_paths() {
        let base = Url::parse("mailto:admin@example.org").expect("valid URL");
        let error = HttpUserGateway::new(&base, Duration::from_secs(1)).expect_err("no path");
        assert!(matches!(error, HttpGatewayBuildError::InvalidBaseUrl { .. }));
    }

    #[rstest]
    #[case(Operation::List, StatusCode::INTERNAL_SERVER_ERROR, DataAccessError::List)]
    #[case(Operation::Fetch, StatusCode::NOT_FOUND, DataAccessError::Fetch)]
    #[case(Operation::Create, StatusCode::BAD_REQUEST, DataAccessError::Create)]
    #[case(Operation::Update, StatusCode::CONFLICT, DataAccessError::Update)]
    #[case(Operation::Delete, StatusCode::GATEWAY_TIMEOUT, DataAccessError::Delete)]
    fn statuses_map_to_the_operation_error(
        #[case] operation: Operation,
        #[case] status: StatusCode,
        #[case] expected: DataAccessError,
    ) {
        assert_eq!(map_status_error(operation, status, b"{}"), expected);
    }

    #[rstest]
    fn undecodable_bodies_map_to_the_operation_error() {
        let result: Result<Vec<User>, _> = decode(Operation::List, b"<html>oops</html>");
        assert_eq!(result, Err(DataAccessError::List));
    }

    #[rstest]
    fn records_without_identity_fail_to_decode() {
        let body = br#"{"firstName":"Jo","lastName":"Lee","email":"jo@x.com","phone":"1234567890"}"#;
        let result: Result<User, _> = decode(Operation::Create, body);
        assert_eq!(result, Err(DataAccessError::Create));
    }

    #[rstest]
    fn body_preview_compacts_and_truncates() {
        let body = format!("error:\n   {}", "x".repeat(200));
        let preview = body_preview(body.as_bytes());
        assert!(preview.starts_with("error: x"));
        assert!(preview.ends_with("..."));
        assert_eq!(preview.chars().count(), 163);
    }
}
