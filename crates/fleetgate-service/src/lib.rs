// crates/fleetgate-service/src/lib.rs
// ============================================================================
// Module: Fleetgate Service
// Description: Control service facade for the fleetgate tool surface.
// Purpose: Expose the seven tool operations over the core engine.
// Dependencies: fleetgate-core, fleetgate-config, fleetgate-appwrite
// ============================================================================

//! ## Overview
//! This crate wires the core engine, the configuration model, and the
//! upstream adapter into the control service that framing layers (stdio,
//! HTTP) serve. The framing itself is an external collaborator: it decodes a
//! named tool call, invokes one method on [`ControlService`], and encodes
//! the response. Everything policy-relevant happens here or deeper.
//! Security posture: tool inputs are untrusted and validated fail-closed;
//! client-supplied credentials are never honored.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod capabilities;
pub mod correlation;
pub mod metrics;
pub mod service;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use capabilities::Capabilities;
pub use capabilities::CapabilityRegistry;
pub use capabilities::DomainCapabilities;
pub use capabilities::SUPPORTED_TRANSPORTS;
pub use capabilities::Transport;
pub use correlation::CorrelationIdGenerator;
pub use metrics::NoopMetrics;
pub use metrics::ServiceMetrics;
pub use metrics::ToolMetricEvent;
pub use metrics::ToolName;
pub use metrics::ToolOutcome;
pub use service::ApplyRequest;
pub use service::ApplyResponse;
pub use service::CapabilitiesRequest;
pub use service::CapabilitiesResponse;
pub use service::ConfirmIssueRequest;
pub use service::ConfirmIssueResponse;
pub use service::ContextResponse;
pub use service::ControlService;
pub use service::ControlServiceConfig;
pub use service::MutationErrorResponse;
pub use service::PreviewRequest;
pub use service::PreviewResponse;
pub use service::ScopeCatalogResponse;
pub use service::TargetsResolveRequest;
pub use service::TargetsResolveResponse;
