//! A [`Gateway`] implementation that talks to a _remote_ payment gateway over HTTP.
//!
//! [`GatewayClient`] handles the `configuration`, `apple_pay_web/sessions` and
//! `payment_methods/apple_payment_tokens` endpoints.
//!
//! ## Example
//!
//! ```rust
//! use applepay_client::gateway_client::GatewayClient;
//! use applepay_types::config::Authorization;
//!
//! let gateway = GatewayClient::try_from("https://gateway.example/client_api/v1")
//!     .unwrap()
//!     .with_authorization(Authorization::new("sandbox_tokenization_key"));
//! ```
//!
//! ## Features
//!
//! - Uses `reqwest` for async HTTP requests
//! - Supports optional timeout and headers
//! - Caches the configuration response with a TTL
//! - Integrates with `tracing` if the `telemetry` feature is enabled

use applepay_types::config::{Authorization, GatewayConfiguration};
use applepay_types::proto::ValidationPayload;
use applepay_types::proto::gateway::{MerchantSessionRequest, TokenizeRequest, TokenizeResponse};
use http::{HeaderMap, StatusCode};
use reqwest::Client;
use std::fmt::Display;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use url::Url;

use crate::gateway::{Gateway, GatewayError};

#[cfg(feature = "telemetry")]
use tracing::{Instrument, Span, instrument};

#[derive(Clone, Debug)]
struct ConfigurationCacheState {
    configuration: GatewayConfiguration,
    expires_at: Instant,
}

/// TTL cache for the `configuration` endpoint response.
///
/// Each clone has an independent cache state.
#[derive(Debug)]
pub struct ConfigurationCache {
    ttl: Duration,
    state: RwLock<Option<ConfigurationCacheState>>,
}

impl ConfigurationCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            state: RwLock::new(None),
        }
    }

    /// Returns the cached configuration if still fresh.
    pub async fn get(&self) -> Option<GatewayConfiguration> {
        let guard = self.state.read().await;
        let cache = guard.as_ref()?;
        if Instant::now() < cache.expires_at {
            Some(cache.configuration.clone())
        } else {
            None
        }
    }

    pub async fn set(&self, configuration: GatewayConfiguration) {
        let mut guard = self.state.write().await;
        *guard = Some(ConfigurationCacheState {
            configuration,
            expires_at: Instant::now() + self.ttl,
        });
    }

    pub async fn clear(&self) {
        let mut guard = self.state.write().await;
        *guard = None;
    }
}

impl Clone for ConfigurationCache {
    fn clone(&self) -> Self {
        Self::new(self.ttl)
    }
}

/// A client for a remote payment gateway.
#[derive(Clone, Debug)]
pub struct GatewayClient {
    /// Base URL of the gateway client API (e.g. `https://gateway.example/client_api/v1/`)
    base_url: Url,
    /// Full URL to `GET ./configuration`
    configuration_url: Url,
    /// Full URL to `POST ./apple_pay_web/sessions`
    merchant_sessions_url: Url,
    /// Full URL to `POST ./payment_methods/apple_payment_tokens`
    apple_payment_tokens_url: Url,
    client: Client,
    /// Tokenization key or client token, sent as a bearer token
    authorization: Option<Authorization>,
    headers: HeaderMap,
    timeout: Option<Duration>,
    configuration_cache: ConfigurationCache,
}

/// Errors that can occur while interacting with a remote gateway.
#[derive(Debug, thiserror::Error)]
pub enum GatewayClientError {
    #[error("URL parse error: {context}: {source}")]
    UrlParse {
        context: &'static str,
        #[source]
        source: url::ParseError,
    },
    #[error("HTTP error: {context}: {source}")]
    Http {
        context: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("Failed to deserialize JSON: {context}: {source}")]
    JsonDeserialization {
        context: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("Unexpected HTTP status {status}: {context}: {body}")]
    HttpStatus {
        context: &'static str,
        status: StatusCode,
        body: String,
    },
    #[error("Failed to read response body as text: {context}: {source}")]
    ResponseBodyRead {
        context: &'static str,
        #[source]
        source: reqwest::Error,
    },
}

impl GatewayError for GatewayClientError {
    /// Only a 4xx answer other than 429 is a refusal. 5xx and rate limiting
    /// mean the gateway could not serve the request.
    fn is_rejection(&self) -> bool {
        match self {
            GatewayClientError::HttpStatus { status, .. } => {
                status.is_client_error() && *status != StatusCode::TOO_MANY_REQUESTS
            }
            _ => false,
        }
    }
}

impl Gateway for GatewayClient {
    type Error = GatewayClientError;

    fn configuration(
        &self,
    ) -> impl Future<Output = Result<GatewayConfiguration, Self::Error>> + Send {
        GatewayClient::configuration(self)
    }

    #[cfg(feature = "telemetry")]
    async fn create_merchant_session(
        &self,
        request: &MerchantSessionRequest,
    ) -> Result<ValidationPayload, GatewayClientError> {
        with_span(
            GatewayClient::create_merchant_session(self, request),
            tracing::info_span!("applepay.gateway_client.merchant_session", timeout = ?self.timeout),
        )
        .await
    }

    #[cfg(not(feature = "telemetry"))]
    async fn create_merchant_session(
        &self,
        request: &MerchantSessionRequest,
    ) -> Result<ValidationPayload, GatewayClientError> {
        GatewayClient::create_merchant_session(self, request).await
    }

    #[cfg(feature = "telemetry")]
    async fn tokenize_apple_payment_token(
        &self,
        request: &TokenizeRequest,
    ) -> Result<TokenizeResponse, GatewayClientError> {
        with_span(
            GatewayClient::tokenize_apple_payment_token(self, request),
            tracing::info_span!("applepay.gateway_client.tokenize", timeout = ?self.timeout),
        )
        .await
    }

    #[cfg(not(feature = "telemetry"))]
    async fn tokenize_apple_payment_token(
        &self,
        request: &TokenizeRequest,
    ) -> Result<TokenizeResponse, GatewayClientError> {
        GatewayClient::tokenize_apple_payment_token(self, request).await
    }
}

impl GatewayClient {
    /// Default TTL for caching the configuration response (10 minutes).
    pub const DEFAULT_CONFIGURATION_CACHE_TTL: Duration = Duration::from_secs(10 * 60);

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn configuration_url(&self) -> &Url {
        &self.configuration_url
    }

    pub fn merchant_sessions_url(&self) -> &Url {
        &self.merchant_sessions_url
    }

    pub fn apple_payment_tokens_url(&self) -> &Url {
        &self.apple_payment_tokens_url
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn timeout(&self) -> &Option<Duration> {
        &self.timeout
    }

    pub fn configuration_cache(&self) -> &ConfigurationCache {
        &self.configuration_cache
    }

    /// Constructs a new [`GatewayClient`] from a base URL.
    ///
    /// Endpoint URLs are resolved relative to the base, so it should end with `/`.
    pub fn try_new(base_url: Url) -> Result<Self, GatewayClientError> {
        let join = |path: &str, context: &'static str| {
            base_url
                .join(path)
                .map_err(|e| GatewayClientError::UrlParse { context, source: e })
        };
        let configuration_url = join(
            "./configuration",
            "Failed to construct ./configuration URL",
        )?;
        let merchant_sessions_url = join(
            "./apple_pay_web/sessions",
            "Failed to construct ./apple_pay_web/sessions URL",
        )?;
        let apple_payment_tokens_url = join(
            "./payment_methods/apple_payment_tokens",
            "Failed to construct ./payment_methods/apple_payment_tokens URL",
        )?;
        Ok(Self {
            client: Client::new(),
            base_url,
            configuration_url,
            merchant_sessions_url,
            apple_payment_tokens_url,
            authorization: None,
            headers: HeaderMap::new(),
            timeout: None,
            configuration_cache: ConfigurationCache::new(Self::DEFAULT_CONFIGURATION_CACHE_TTL),
        })
    }

    /// Authorizes all future requests with a tokenization key or client token.
    pub fn with_authorization(&self, authorization: Authorization) -> Self {
        let mut this = self.clone();
        this.authorization = Some(authorization);
        this
    }

    /// Attaches custom headers to all future requests.
    pub fn with_headers(&self, headers: HeaderMap) -> Self {
        let mut this = self.clone();
        this.headers = headers;
        this
    }

    /// Sets a timeout for all future requests.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        let mut this = self.clone();
        this.timeout = Some(timeout);
        this
    }

    /// Sets the TTL for caching the configuration response.
    ///
    /// Default is 10 minutes. Use [`Self::without_configuration_cache()`] to disable caching.
    pub fn with_configuration_cache_ttl(&self, ttl: Duration) -> Self {
        let mut this = self.clone();
        this.configuration_cache = ConfigurationCache::new(ttl);
        this
    }

    pub fn without_configuration_cache(&self) -> Self {
        self.with_configuration_cache_ttl(Duration::ZERO)
    }

    /// Sends a `POST ./apple_pay_web/sessions` request.
    pub async fn create_merchant_session(
        &self,
        request: &MerchantSessionRequest,
    ) -> Result<ValidationPayload, GatewayClientError> {
        self.post_json(
            &self.merchant_sessions_url,
            "POST /apple_pay_web/sessions",
            request,
        )
        .await
    }

    /// Sends a `POST ./payment_methods/apple_payment_tokens` request.
    pub async fn tokenize_apple_payment_token(
        &self,
        request: &TokenizeRequest,
    ) -> Result<TokenizeResponse, GatewayClientError> {
        self.post_json(
            &self.apple_payment_tokens_url,
            "POST /payment_methods/apple_payment_tokens",
            request,
        )
        .await
    }

    /// Always makes an HTTP request, bypassing the cache.
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "applepay.gateway_client.configuration", skip_all, err)
    )]
    async fn configuration_inner(&self) -> Result<GatewayConfiguration, GatewayClientError> {
        self.get_json(&self.configuration_url, "GET /configuration")
            .await
    }

    /// Sends a `GET ./configuration` request.
    /// Results are cached with a configurable TTL (default: 10 minutes).
    pub async fn configuration(&self) -> Result<GatewayConfiguration, GatewayClientError> {
        if let Some(configuration) = self.configuration_cache.get().await {
            return Ok(configuration);
        }

        #[cfg(feature = "telemetry")]
        tracing::info!("applepay.gateway_client.configuration_cache_miss");

        let configuration = self.configuration_inner().await?;
        self.configuration_cache.set(configuration.clone()).await;

        Ok(configuration)
    }

    fn prepare(&self, mut req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if let Some(authorization) = &self.authorization {
            req = req.bearer_auth(authorization.expose());
        }
        for (key, value) in self.headers.iter() {
            req = req.header(key, value);
        }
        if let Some(timeout) = self.timeout {
            req = req.timeout(timeout);
        }
        req
    }

    /// Generic POST helper that handles JSON serialization, error mapping,
    /// timeout application, and telemetry integration.
    ///
    /// `context` names the endpoint in tracing and error messages (e.g. `"POST /apple_pay_web/sessions"`).
    async fn post_json<T, R>(
        &self,
        url: &Url,
        context: &'static str,
        payload: &T,
    ) -> Result<R, GatewayClientError>
    where
        T: serde::Serialize + ?Sized,
        R: serde::de::DeserializeOwned,
    {
        let req = self.prepare(self.client.post(url.clone()).json(payload));
        let result = Self::send(req, context).await;
        record_result_on_span(&result);
        result
    }

    /// Generic GET helper, see [`Self::post_json`].
    async fn get_json<R>(&self, url: &Url, context: &'static str) -> Result<R, GatewayClientError>
    where
        R: serde::de::DeserializeOwned,
    {
        let req = self.prepare(self.client.get(url.clone()));
        let result = Self::send(req, context).await;
        record_result_on_span(&result);
        result
    }

    async fn send<R>(
        req: reqwest::RequestBuilder,
        context: &'static str,
    ) -> Result<R, GatewayClientError>
    where
        R: serde::de::DeserializeOwned,
    {
        let http_response = req
            .send()
            .await
            .map_err(|e| GatewayClientError::Http { context, source: e })?;

        if http_response.status().is_success() {
            http_response
                .json::<R>()
                .await
                .map_err(|e| GatewayClientError::JsonDeserialization { context, source: e })
        } else {
            let status = http_response.status();
            let body = http_response
                .text()
                .await
                .map_err(|e| GatewayClientError::ResponseBodyRead { context, source: e })?;
            Err(GatewayClientError::HttpStatus {
                context,
                status,
                body,
            })
        }
    }
}

/// Parses a base URL string, normalizing it to a single trailing slash.
impl TryFrom<&str> for GatewayClient {
    type Error = GatewayClientError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let mut normalized = value.trim_end_matches('/').to_string();
        normalized.push('/');
        let url = Url::parse(&normalized).map_err(|e| GatewayClientError::UrlParse {
            context: "Failed to parse base url",
            source: e,
        })?;
        GatewayClient::try_new(url)
    }
}

impl TryFrom<String> for GatewayClient {
    type Error = GatewayClientError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        GatewayClient::try_from(value.as_str())
    }
}

#[cfg(feature = "telemetry")]
fn record_result_on_span<R, E: Display>(result: &Result<R, E>) {
    let span = Span::current();
    match result {
        Ok(_) => {
            span.record("otel.status_code", "OK");
        }
        Err(err) => {
            span.record("otel.status_code", "ERROR");
            span.record("error.message", tracing::field::display(err));
            tracing::event!(tracing::Level::ERROR, error = %err, "Request to gateway failed");
        }
    }
}

/// Noop if telemetry feature is off.
#[cfg(not(feature = "telemetry"))]
fn record_result_on_span<R, E: Display>(_result: &Result<R, E>) {}

#[cfg(feature = "telemetry")]
fn with_span<F: Future>(fut: F, span: Span) -> impl Future<Output = F::Output> {
    fut.instrument(span)
}
