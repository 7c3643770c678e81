// crates/fleetgate-service/src/capabilities.rs
// ============================================================================
// Module: Fleetgate Capabilities
// Description: Transport and domain capability registry.
// Purpose: Advertise what this deployment can do and reject what it cannot.
// Dependencies: fleetgate-core, serde
// ============================================================================

//! ## Overview
//! The capability registry answers `capabilities.list` and validates the
//! `transport` parameter carried by tool requests. An unsupported transport
//! is rejected with `CAPABILITY_UNAVAILABLE` and the supported set, so
//! clients can renegotiate without guessing.

// ============================================================================
// SECTION: Imports
// ============================================================================

use fleetgate_core::ErrorCode;
use fleetgate_core::SCOPE_CATALOG_VERSION;
use fleetgate_core::StandardError;
use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Transports
// ============================================================================

/// Framing transports the control plane can be served over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transport {
    /// Newline-framed stdio.
    Stdio,
    /// HTTP request/response framing.
    Http,
}

impl Transport {
    /// Returns the stable wire label for this transport.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stdio => "stdio",
            Self::Http => "http",
        }
    }
}

/// Transports supported by this build.
pub const SUPPORTED_TRANSPORTS: &[Transport] = &[Transport::Stdio, Transport::Http];

// ============================================================================
// SECTION: Capabilities
// ============================================================================

/// Domain availability flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainCapabilities {
    /// Project lifecycle management (requires management credentials).
    pub project: bool,
    /// Database and collection operations.
    pub database: bool,
    /// Auth user operations.
    pub auth: bool,
    /// Function, deployment, and execution operations.
    pub function: bool,
    /// Plan/apply operation machinery.
    pub operation: bool,
}

/// Capability summary advertised to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    /// Domain availability.
    pub domains: DomainCapabilities,
    /// Default transport.
    pub transport_default: Transport,
    /// Supported transports.
    pub supported_transports: Vec<Transport>,
    /// Whether targeting can resolve without explicit input.
    pub auto_targeting_enabled: bool,
    /// Scope catalog version tag.
    pub scope_catalog_version: String,
}

/// Capability registry for one service instance.
#[derive(Debug, Clone)]
pub struct CapabilityRegistry {
    /// Default transport advertised to clients.
    transport_default: Transport,
    /// Whether management credentials are configured.
    management_enabled: bool,
    /// Whether auto targeting can resolve.
    auto_targeting_enabled: bool,
}

impl CapabilityRegistry {
    /// Creates a registry from deployment facts.
    #[must_use]
    pub const fn new(
        transport_default: Transport,
        management_enabled: bool,
        auto_targeting_enabled: bool,
    ) -> Self {
        Self {
            transport_default,
            management_enabled,
            auto_targeting_enabled,
        }
    }

    /// Returns the capability summary.
    #[must_use]
    pub fn capabilities(&self) -> Capabilities {
        Capabilities {
            domains: DomainCapabilities {
                project: self.management_enabled,
                database: true,
                auth: true,
                function: true,
                operation: true,
            },
            transport_default: self.transport_default,
            supported_transports: SUPPORTED_TRANSPORTS.to_vec(),
            auto_targeting_enabled: self.auto_targeting_enabled,
            scope_catalog_version: SCOPE_CATALOG_VERSION.to_string(),
        }
    }

    /// Validates an optional transport parameter.
    ///
    /// # Errors
    ///
    /// Returns `CAPABILITY_UNAVAILABLE` carrying the supported transports
    /// when the named transport is not served by this build.
    pub fn validate_transport(&self, transport: Option<&str>) -> Result<(), StandardError> {
        let Some(requested) = transport else {
            return Ok(());
        };
        let supported = SUPPORTED_TRANSPORTS
            .iter()
            .any(|candidate| candidate.as_str() == requested);
        if supported {
            return Ok(());
        }
        Err(StandardError::new(
            ErrorCode::CapabilityUnavailable,
            format!("transport '{requested}' is not supported"),
        )
        .with_supported_transports(
            SUPPORTED_TRANSPORTS.iter().map(|t| t.as_str().to_string()).collect(),
        )
        .with_remediation("use one of the supported transports"))
    }
}
