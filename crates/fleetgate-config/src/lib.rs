// crates/fleetgate-config/src/lib.rs
// ============================================================================
// Module: Fleetgate Configuration
// Description: Configuration loading and validation for fleetgate.
// Purpose: Provide strict, fail-closed config parsing with precise errors.
// Dependencies: fleetgate-core, serde, serde_json
// ============================================================================

//! ## Overview
//! Configuration is loaded from a JSON file and validated fail-closed before
//! any server state is built. Every violation reports the offending path so
//! operators can fix the file without guesswork. Production deployments are
//! refused when the confirmation secret is still the development sentinel.
//! Security posture: configuration carries tenant credentials and is
//! untrusted input until validated.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::ConfigError;
pub use config::DefaultsConfig;
pub use config::Environment;
pub use config::FleetConfig;
pub use config::ManagementConfig;
pub use config::ProjectConfig;
pub use config::load_config;
