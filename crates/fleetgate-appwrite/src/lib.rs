// crates/fleetgate-appwrite/src/lib.rs
// ============================================================================
// Module: Fleetgate Appwrite Adapter
// Description: Upstream HTTP adapter for Appwrite project tenants.
// Purpose: Translate planned operations into concrete Appwrite REST calls.
// Dependencies: fleetgate-core, reqwest, serde_json
// ============================================================================

//! ## Overview
//! This crate implements the upstream seam of the control plane for
//! Appwrite. Request building is a pure function of `(action, params)` and
//! validates every required path and body parameter before a single byte
//! leaves the process. Execution wraps each attempt in a timeout and retries
//! only requests that are safe to replay: GETs and operations carrying an
//! idempotency key. The Appwrite wire contract (header names, response
//! format version, multipart deployments) is reproduced byte-exact.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod client;
pub mod request;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use client::AppwriteAdapter;
pub use client::AppwriteAdapterConfig;
pub use client::AttemptOutcome;
pub use client::HttpResponse;
pub use client::RESPONSE_FORMAT_VERSION;
pub use client::backoff_base_ms;
pub use client::default_retry_statuses;
pub use client::execute_with_retry;
pub use client::request_is_retryable;
pub use client::resolve_outcome;
pub use request::Method;
pub use request::RequestBody;
pub use request::RequestSpec;
pub use request::build_request;
