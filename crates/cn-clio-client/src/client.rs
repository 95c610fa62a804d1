//! Authenticated, rate-limited, retrying HTTP client for the Clio API.

use std::future::Future;
use std::time::{Duration, Instant};

use futures_util::stream::{self, Stream, TryStreamExt};
use reqwest::Method;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, RETRY_AFTER};
use serde_json::Value;

use cn_protocol::calls::HttpMethod;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult, excerpt};
use crate::pagination::{Page, PageCursor};
use crate::rate_limit::RateLimiter;
use crate::retry::{Decision, Outcome, RetryState, parse_retry_after};

/// A successful (status < 400) response with its decoded JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    /// `Value::Null` when the body was empty (e.g. 204 No Content).
    pub body: Value,
}

impl ApiResponse {
    async fn read(response: reqwest::Response) -> ClientResult<Self> {
        let status = response.status().as_u16();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))?;
        let body = if bytes.iter().all(u8::is_ascii_whitespace) {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).map_err(|e| ClientError::Decode(e.to_string()))?
        };
        Ok(Self { status, body })
    }

    /// The `data` member of the body, or `Null`.
    pub fn data(&self) -> &Value {
        self.body.get("data").unwrap_or(&Value::Null)
    }
}

/// A failed attempt, kept until the retry state decides what to do with it.
enum Failure {
    Status {
        status: u16,
        retry_after: Option<Duration>,
        body: String,
    },
    Transport(reqwest::Error),
}

impl Failure {
    fn outcome(&self) -> Outcome {
        match self {
            Failure::Status {
                status,
                retry_after,
                ..
            } => Outcome::Status {
                status: *status,
                retry_after: *retry_after,
            },
            Failure::Transport(_) => Outcome::Transport,
        }
    }

    fn into_error(self, attempts: u32) -> ClientError {
        match self {
            Failure::Status { status, body, .. } if (400..500).contains(&status) && status != 429 => {
                ClientError::Client {
                    status,
                    body: excerpt(&body),
                }
            }
            Failure::Status { status, body, .. } => ClientError::Server {
                status,
                attempts,
                body: excerpt(&body),
            },
            Failure::Transport(source) => ClientError::Transport { attempts, source },
        }
    }
}

impl std::fmt::Display for Failure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Failure::Status { status, .. } => write!(f, "HTTP {status}"),
            Failure::Transport(e) => write!(f, "{e}"),
        }
    }
}

/// Client for one Clio account.
///
/// Owns its own rate window; independently configured clients never
/// interfere with each other's quota.
pub struct ApiClient {
    http: reqwest::Client,
    config: ClientConfig,
    auth_token: Option<String>,
    limiter: RateLimiter,
}

impl ApiClient {
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let version = HeaderValue::from_str(&config.api_version).map_err(|e| {
            ClientError::Configuration(format!("invalid api_version {:?}: {e}", config.api_version))
        })?;
        headers.insert("X-API-VERSION", version);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout())
            .build()
            .map_err(|e| ClientError::Configuration(format!("failed to build HTTP client: {e}")))?;

        let limiter = RateLimiter::new(config.requests_per_minute, config.requests_per_hour);

        Ok(Self {
            http,
            config,
            auth_token: None,
            limiter,
        })
    }

    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.set_auth_token(token);
        self
    }

    /// Set or replace the bearer token.
    pub fn set_auth_token(&mut self, token: impl Into<String>) {
        let token = token.into();
        self.auth_token = (!token.trim().is_empty()).then_some(token);
    }

    pub fn has_auth_token(&self) -> bool {
        self.auth_token.is_some()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    fn url_for(&self, endpoint: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        )
    }

    /// Issue a request with the configured retry budget.
    pub async fn request(
        &self,
        method: Method,
        endpoint: &str,
        params: &[(String, String)],
        body: Option<&Value>,
    ) -> ClientResult<ApiResponse> {
        self.request_with_retries(method, endpoint, params, body, self.config.max_retries)
            .await
    }

    /// Issue a request, retrying transient failures up to `max_retries` times.
    ///
    /// Every attempt waits for the rate gate first. A 429 carrying
    /// `Retry-After` sleeps that long and retries without consuming the
    /// budget. 5xx and transport failures back off exponentially. Other 4xx
    /// fail immediately.
    pub async fn request_with_retries(
        &self,
        method: Method,
        endpoint: &str,
        params: &[(String, String)],
        body: Option<&Value>,
        max_retries: u32,
    ) -> ClientResult<ApiResponse> {
        let token = self
            .auth_token
            .as_deref()
            .ok_or_else(|| ClientError::Configuration("authentication token not set".into()))?;
        let url = self.url_for(endpoint);
        let mut state = RetryState::new(max_retries, self.config.backoff_base());
        let started = Instant::now();

        loop {
            self.limiter.acquire().await;

            let mut builder = self.http.request(method.clone(), &url).bearer_auth(token);
            if !params.is_empty() {
                builder = builder.query(params);
            }
            if let Some(body) = body {
                builder = builder.json(body);
            }

            let result = match builder.send().await {
                Ok(response) if response.status().as_u16() < 400 => Ok(response),
                Ok(response) => {
                    let status = response.status().as_u16();
                    let retry_after = response
                        .headers()
                        .get(RETRY_AFTER)
                        .and_then(|v| v.to_str().ok())
                        .and_then(parse_retry_after);
                    let body = response.text().await.unwrap_or_default();
                    Err(Failure::Status {
                        status,
                        retry_after,
                        body,
                    })
                }
                Err(e) => Err(Failure::Transport(e)),
            };

            let outcome = match &result {
                Ok(_) => Outcome::Success,
                Err(failure) => failure.outcome(),
            };

            match state.decide(outcome) {
                Decision::Accept | Decision::GiveUp => {
                    let response = result.map_err(|failure| {
                        tracing::warn!(
                            method = %method,
                            endpoint,
                            attempts = state.attempts(),
                            error = %failure,
                            "request failed"
                        );
                        failure.into_error(state.attempts())
                    })?;
                    tracing::debug!(
                        method = %method,
                        endpoint,
                        status = response.status().as_u16(),
                        attempts = state.attempts(),
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "request completed"
                    );
                    return ApiResponse::read(response).await;
                }
                Decision::Throttle(delay) => {
                    tracing::warn!(
                        endpoint,
                        wait_secs = delay.as_secs(),
                        "rate limited by server, honoring Retry-After"
                    );
                    tokio::time::sleep(delay).await;
                }
                Decision::Backoff(delay) => {
                    if let Err(failure) = &result {
                        tracing::warn!(
                            endpoint,
                            error = %failure,
                            retry = state.retries_used(),
                            max_retries,
                            wait_ms = delay.as_millis() as u64,
                            "transient failure, backing off"
                        );
                    }
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    /// Lazily walk every page of a list endpoint, yielding individual items
    /// in server order.
    ///
    /// The stream ends when the server stops sending `meta.paging.next` or
    /// returns an empty page. The first error ends the stream.
    pub fn paginated_request<'a>(
        &'a self,
        endpoint: &'a str,
        params: &[(String, String)],
        per_page: u32,
    ) -> impl Stream<Item = ClientResult<Value>> + 'a {
        let first = PageCursor::first(params, per_page);

        stream::try_unfold(Some(first), move |cursor| async move {
            let Some(cursor) = cursor else {
                return Ok::<_, ClientError>(None);
            };
            let response = self
                .request(Method::GET, endpoint, &cursor.query(), None)
                .await?;
            let page = Page::from_body(response.body);
            if page.items.is_empty() {
                return Ok(None);
            }
            tracing::debug!(
                endpoint,
                page = cursor.page(),
                items = page.items.len(),
                has_next = page.next.is_some(),
                "fetched page"
            );
            let next = page.next.as_deref().map(|marker| cursor.advance(marker));
            Ok(Some((page.items, next)))
        })
        .map_ok(|items| stream::iter(items.into_iter().map(Ok::<Value, ClientError>)))
        .try_flatten()
    }

    /// Collect every item of a list endpoint.
    ///
    /// Bounded only by memory; prefer `paginated_request` for large collections.
    pub async fn get_all(
        &self,
        endpoint: &str,
        params: &[(String, String)],
        per_page: u32,
    ) -> ClientResult<Vec<Value>> {
        self.paginated_request(endpoint, params, per_page)
            .try_collect()
            .await
    }

    /// `get_all` under an overall deadline spanning every page and retry.
    pub async fn get_all_within(
        &self,
        deadline: Duration,
        endpoint: &str,
        params: &[(String, String)],
        per_page: u32,
    ) -> ClientResult<Vec<Value>> {
        within(deadline, self.get_all(endpoint, params, per_page)).await
    }
}

/// Run a client future under an overall deadline.
///
/// On expiry the future is dropped, cancelling any in-flight I/O, sleep, or
/// pending retry, and `DeadlineExceeded` is returned.
pub async fn within<T>(
    deadline: Duration,
    future: impl Future<Output = ClientResult<T>>,
) -> ClientResult<T> {
    match tokio::time::timeout(deadline, future).await {
        Ok(result) => result,
        Err(_) => Err(ClientError::DeadlineExceeded(deadline)),
    }
}

/// Map a descriptor method onto reqwest's.
pub fn method_for(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Delete => Method::DELETE,
        HttpMethod::Patch => Method::PATCH,
    }
}
