// crates/fleetgate-appwrite/src/client.rs
// ============================================================================
// Module: Appwrite Client Execution
// Description: Timeout-bounded execution with conditional retry and backoff.
// Purpose: Replay only requests that are provably safe to replay.
// Dependencies: fleetgate-core, reqwest, rand
// ============================================================================

//! ## Overview
//! Each upstream attempt is bounded by the configured timeout. A request is
//! retryable when its method is GET or the operation carries an idempotency
//! key; a failure triggers a retry when the status is in the configured
//! retry set or the attempt timed out or failed at the transport layer.
//! Backoff doubles per attempt, clamps at the maximum delay, and adds
//! uniform jitter below a quarter of the base delay. The retry loop itself
//! is a pure function over an attempt closure so its behavior is testable
//! without sockets.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::thread;
use std::time::Duration;

use fleetgate_core::AuthContext;
use fleetgate_core::ErrorCode;
use fleetgate_core::NormalizedOperation;
use fleetgate_core::StandardError;
use fleetgate_core::UpstreamAdapter;
use rand::Rng;
use reqwest::blocking::Client;
use reqwest::blocking::RequestBuilder;
use reqwest::blocking::multipart::Form;
use reqwest::redirect::Policy;
use serde_json::Value;
use serde_json::json;

use crate::request::Method;
use crate::request::RequestBody;
use crate::request::RequestSpec;
use crate::request::build_request;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Response format version pinned for every upstream request.
pub const RESPONSE_FORMAT_VERSION: &str = "1.8.0";

/// Statuses that trigger a retry by default.
const DEFAULT_RETRY_STATUSES: &[u16] = &[408, 425, 429, 500, 502, 503, 504];

/// Returns the default retryable status set.
#[must_use]
pub fn default_retry_statuses() -> BTreeSet<u16> {
    DEFAULT_RETRY_STATUSES.iter().copied().collect()
}

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Configuration for the Appwrite adapter.
///
/// # Invariants
/// - `timeout_ms` bounds every individual attempt.
/// - Attempts number `1..=max_retries + 1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppwriteAdapterConfig {
    /// Per-attempt timeout in milliseconds.
    pub timeout_ms: u64,
    /// Maximum retries after the first attempt.
    pub max_retries: u32,
    /// Base backoff delay in milliseconds.
    pub retry_base_delay_ms: u64,
    /// Maximum backoff delay in milliseconds.
    pub retry_max_delay_ms: u64,
    /// HTTP statuses that trigger a retry.
    pub retry_statuses: BTreeSet<u16>,
    /// Whether the legacy `auth.users.update` alias stays routable.
    pub allow_legacy_user_update: bool,
    /// User agent string for outbound requests.
    pub user_agent: String,
}

impl Default for AppwriteAdapterConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 10_000,
            max_retries: 2,
            retry_base_delay_ms: 250,
            retry_max_delay_ms: 5_000,
            retry_statuses: default_retry_statuses(),
            allow_legacy_user_update: true,
            user_agent: "fleetgate/0.1".to_string(),
        }
    }
}

// ============================================================================
// SECTION: Retry Loop
// ============================================================================

/// Outcome of one upstream attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// A response arrived, successful or not.
    Response(HttpResponse),
    /// The attempt hit the per-attempt timeout.
    Timeout,
    /// The attempt failed below HTTP (connect, TLS, I/O).
    Transport(String),
}

/// Minimal response view consumed by the retry loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Raw response body.
    pub body: String,
}

/// Returns true when a request is safe to replay.
#[must_use]
pub const fn request_is_retryable(method: Method, has_idempotency_key: bool) -> bool {
    matches!(method, Method::Get) || has_idempotency_key
}

/// Base backoff delay for attempt `n` (1-based), without jitter.
#[must_use]
pub const fn backoff_base_ms(base_ms: u64, max_ms: u64, attempt: u32) -> u64 {
    let shift = attempt.saturating_sub(1);
    let shift = if shift > 62 { 62 } else { shift };
    let doubled = base_ms.saturating_mul(1_u64 << shift);
    if doubled > max_ms { max_ms } else { doubled }
}

/// Runs the attempt loop, sleeping between retryable failures.
///
/// Returns the final attempt's outcome and the number of attempts made.
/// Retries happen only while `request_retryable` holds, the outcome is a
/// retry trigger, and attempts remain.
pub fn execute_with_retry<F>(
    config: &AppwriteAdapterConfig,
    request_retryable: bool,
    mut attempt: F,
) -> (AttemptOutcome, u32)
where
    F: FnMut(u32) -> AttemptOutcome,
{
    let max_attempts = config.max_retries.saturating_add(1);
    let mut attempts = 0;
    loop {
        attempts += 1;
        let outcome = attempt(attempts);
        let trigger = match &outcome {
            AttemptOutcome::Response(response) => {
                config.retry_statuses.contains(&response.status)
            }
            AttemptOutcome::Timeout | AttemptOutcome::Transport(_) => true,
        };
        if !trigger || !request_retryable || attempts >= max_attempts {
            return (outcome, attempts);
        }
        thread::sleep(Duration::from_millis(jittered_backoff_ms(config, attempts)));
    }
}

/// Backoff with uniform jitter in `[0, base / 4)`.
fn jittered_backoff_ms(config: &AppwriteAdapterConfig, attempt: u32) -> u64 {
    let base =
        backoff_base_ms(config.retry_base_delay_ms, config.retry_max_delay_ms, attempt);
    let jitter_cap = config.retry_base_delay_ms / 4;
    if jitter_cap == 0 {
        return base;
    }
    base.saturating_add(rand::thread_rng().gen_range(0..jitter_cap))
}

// ============================================================================
// SECTION: Adapter
// ============================================================================

/// Appwrite upstream adapter.
pub struct AppwriteAdapter {
    /// Adapter configuration.
    config: AppwriteAdapterConfig,
    /// Blocking HTTP client with the per-attempt timeout baked in.
    client: Client,
}

impl AppwriteAdapter {
    /// Creates an adapter from configuration.
    ///
    /// # Errors
    ///
    /// Returns `INTERNAL_ERROR` when the HTTP client cannot be built.
    pub fn new(config: AppwriteAdapterConfig) -> Result<Self, StandardError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent(config.user_agent.clone())
            .redirect(Policy::none())
            .build()
            .map_err(|err| {
                StandardError::new(
                    ErrorCode::InternalError,
                    format!("http client build failed: {err}"),
                )
            })?;
        Ok(Self {
            config,
            client,
        })
    }

    /// Returns the adapter configuration.
    #[must_use]
    pub const fn config(&self) -> &AppwriteAdapterConfig {
        &self.config
    }

    /// Builds the reqwest request for one attempt.
    ///
    /// Multipart bodies are not reusable across attempts, so the request is
    /// rebuilt from the spec every time.
    fn assemble(
        &self,
        spec: &RequestSpec,
        project_id: &str,
        auth: &AuthContext,
    ) -> RequestBuilder {
        let url = format!(
            "{}{}",
            auth.endpoint.trim_end_matches('/'),
            spec.path.as_str()
        );
        let mut builder = match spec.method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
            Method::Put => self.client.put(&url),
            Method::Patch => self.client.patch(&url),
            Method::Delete => self.client.delete(&url),
        };
        if !spec.query.is_empty() {
            builder = builder.query(&spec.query);
        }
        builder = builder
            .header("X-Appwrite-Key", auth.api_key.as_str())
            .header("X-Appwrite-Response-Format", RESPONSE_FORMAT_VERSION);
        if spec.project_header {
            builder = builder.header("X-Appwrite-Project", project_id);
        }
        match &spec.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder
                .header("Content-Type", "application/json")
                .body(value.to_string()),
            RequestBody::Multipart(fields) => {
                let mut form = Form::new();
                for (name, value) in fields {
                    form = form.text(name.clone(), value.clone());
                }
                builder.multipart(form)
            }
        }
    }

    /// Performs one attempt and classifies the outcome.
    fn attempt(&self, spec: &RequestSpec, project_id: &str, auth: &AuthContext) -> AttemptOutcome {
        match self.assemble(spec, project_id, auth).send() {
            Ok(response) => {
                let status = response.status().as_u16();
                let body = response.text().unwrap_or_default();
                AttemptOutcome::Response(HttpResponse {
                    status,
                    body,
                })
            }
            Err(err) if err.is_timeout() => AttemptOutcome::Timeout,
            Err(err) => AttemptOutcome::Transport(err.to_string()),
        }
    }
}

impl UpstreamAdapter for AppwriteAdapter {
    fn execute_operation(
        &self,
        project_id: &str,
        operation: &NormalizedOperation,
        auth: &AuthContext,
        _correlation_id: &str,
    ) -> Result<Value, StandardError> {
        if !auth.is_complete() {
            return Err(StandardError::new(
                ErrorCode::AuthContextRequired,
                format!("no usable credentials for project '{project_id}'"),
            )
            .with_remediation("configure endpoint and api_key for the target project"));
        }
        let spec = build_request(
            operation.action,
            &operation.params,
            self.config.allow_legacy_user_update,
        )?;
        let retryable =
            request_is_retryable(spec.method, operation.idempotency_key.is_some());
        let (outcome, _attempts) = execute_with_retry(&self.config, retryable, |_| {
            self.attempt(&spec, project_id, auth)
        });
        resolve_outcome(&self.config, outcome)
    }
}

// ============================================================================
// SECTION: Response Handling
// ============================================================================

/// Maps the final attempt outcome to data or a standard error.
///
/// Non-2xx responses become `INTERNAL_ERROR` carrying the upstream status
/// and message; their retryability mirrors the retry-status set. Timeouts
/// and transport failures are always retryable triggers.
///
/// # Errors
///
/// Returns [`StandardError`] for every non-2xx, timeout, or transport
/// outcome.
pub fn resolve_outcome(
    config: &AppwriteAdapterConfig,
    outcome: AttemptOutcome,
) -> Result<Value, StandardError> {
    match outcome {
        AttemptOutcome::Response(response) if (200..300).contains(&response.status) => {
            Ok(parse_body(&response.body))
        }
        AttemptOutcome::Response(response) => {
            Err(upstream_error(&response)
                .retryable(config.retry_statuses.contains(&response.status)))
        }
        AttemptOutcome::Timeout => Err(StandardError::new(
            ErrorCode::InternalError,
            "upstream request timed out",
        )
        .retryable(true)),
        AttemptOutcome::Transport(message) => Err(StandardError::new(
            ErrorCode::InternalError,
            format!("upstream transport failure: {message}"),
        )
        .retryable(true)),
    }
}

/// Parses a response body as JSON, wrapping non-JSON bodies.
fn parse_body(body: &str) -> Value {
    serde_json::from_str(body).unwrap_or_else(|_| json!({ "raw": body }))
}

/// Builds the non-2xx upstream error.
fn upstream_error(response: &HttpResponse) -> StandardError {
    let message = serde_json::from_str::<Value>(&response.body)
        .ok()
        .and_then(|value| value.get("message").and_then(Value::as_str).map(str::to_string));
    let text = match message {
        Some(message) => format!("Appwrite {}: {message}", response.status),
        None => format!("Appwrite {}", response.status),
    };
    StandardError::new(ErrorCode::InternalError, text)
}
