//! HTTP transport for the processor REST API.
//!
//! Wraps a shared `reqwest::Client` with Basic authentication (private key
//! as username, empty password), JSON bodies, a 60 second timeout and
//! response classification into [`ProcessorError`].
//!
//! # Rate limiting
//!
//! When the processor answers with API error code 122 (request rate limit
//! exceeded) the transport backs off for ten seconds and retries the call
//! exactly once. A second rate-limit answer surfaces as
//! [`ProcessorError::RateLimitExceeded`].

use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::{Duration, Instant};

use crate::config::ProcessorConfig;
use crate::ports::{ApiErrorCode, ProcessorError};

use super::types::ApiErrorBody;

/// Total per-request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Back-off before the single rate-limit retry.
const RATE_LIMIT_BACKOFF: Duration = Duration::from_secs(10);

/// HTTP method for a transport call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

/// Authenticated JSON transport to the processor API.
pub struct ApiTransport {
    client: reqwest::Client,
    base_url: String,
    private_key: SecretString,
    debug_logging: bool,
}

impl ApiTransport {
    /// Build a transport from processor configuration.
    pub fn new(config: &ProcessorConfig) -> Result<Self, ProcessorError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ProcessorError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            private_key: SecretString::new(config.active_private_key().to_string()),
            debug_logging: config.debug_logging,
        })
    }

    /// GET a JSON resource.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ProcessorError> {
        self.request::<T, ()>(Method::Get, path, None).await
    }

    /// POST a JSON body, expecting a JSON response.
    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ProcessorError> {
        self.request(Method::Post, path, Some(body)).await
    }

    /// POST without a body, expecting a JSON response.
    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T, ProcessorError> {
        self.request::<T, ()>(Method::Post, path, None).await
    }

    /// PUT a JSON body, expecting a JSON response.
    pub async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ProcessorError> {
        self.request(Method::Put, path, Some(body)).await
    }

    async fn request<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T, ProcessorError> {
        let url = format!("{}{}", self.base_url, path);
        let mut rate_limit_retried = false;

        loop {
            let started = Instant::now();
            let result = self.execute(method, &url, body).await;

            if self.debug_logging {
                match &result {
                    Ok((status, _)) => tracing::debug!(
                        method = method.as_str(),
                        url = %url,
                        status = status.as_u16(),
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "processor API call"
                    ),
                    Err(e) => tracing::debug!(
                        method = method.as_str(),
                        url = %url,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        error = %e,
                        "processor API call failed"
                    ),
                }
            }

            let (status, text) = result?;

            if Self::is_success_status(status) {
                return serde_json::from_str(&text).map_err(|e| {
                    ProcessorError::Unknown(format!("unparsable success body: {}", e))
                });
            }

            match Self::classify_error(status, &text) {
                ProcessorError::RateLimitExceeded if !rate_limit_retried => {
                    tracing::warn!(url = %url, "rate limited, backing off before retry");
                    rate_limit_retried = true;
                    tokio::time::sleep(RATE_LIMIT_BACKOFF).await;
                }
                error => return Err(error),
            }
        }
    }

    async fn execute<B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: &str,
        body: Option<&B>,
    ) -> Result<(reqwest::StatusCode, String), ProcessorError> {
        let request = self.build_request(method, url, body)?;
        let response = self
            .client
            .execute(request)
            .await
            .map_err(|e| ProcessorError::Transport(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ProcessorError::Transport(e.to_string()))?;

        Ok((status, text))
    }

    /// Every call carries Basic auth and declares JSON both ways.
    fn build_request<B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: &str,
        body: Option<&B>,
    ) -> Result<reqwest::Request, ProcessorError> {
        let mut builder = match method {
            Method::Get => self.client.get(url),
            Method::Post => self.client.post(url),
            Method::Put => self.client.put(url),
            Method::Delete => self.client.delete(url),
        }
        .basic_auth(self.private_key.expose_secret(), Option::<&str>::None)
        .header(reqwest::header::ACCEPT, "application/json")
        .header(reqwest::header::CONTENT_TYPE, "application/json");

        if let Some(body) = body {
            builder = builder.json(body);
        }

        builder
            .build()
            .map_err(|e| ProcessorError::Transport(e.to_string()))
    }

    /// 2xx and 3xx responses carry a parseable result body.
    fn is_success_status(status: reqwest::StatusCode) -> bool {
        status.is_success() || status.is_redirection()
    }

    /// Map a non-2xx response to a typed error.
    ///
    /// 4xx and 5xx bodies carrying a numeric API code become
    /// [`ProcessorError::Api`] (or `RateLimitExceeded` for the rate-limit
    /// code); bodies without a code become [`ProcessorError::Http`]; any
    /// other status class is unexpected.
    fn classify_error(status: reqwest::StatusCode, body: &str) -> ProcessorError {
        if !status.is_client_error() && !status.is_server_error() {
            return ProcessorError::InvalidHttpCode(status.as_u16());
        }

        match serde_json::from_str::<ApiErrorBody>(body) {
            Ok(parsed) => match parsed.code {
                Some(code) if code == ApiErrorCode::RequestRateLimitExceeded.code() => {
                    ProcessorError::RateLimitExceeded
                }
                Some(code) => ProcessorError::Api {
                    code,
                    message: parsed.message_text(),
                },
                None => ProcessorError::Http {
                    status: status.as_u16(),
                    body: body.to_string(),
                },
            },
            Err(_) => ProcessorError::Http {
                status: status.as_u16(),
                body: body.to_string(),
            },
        }
    }
}
