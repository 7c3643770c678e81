// crates/fleetgate-service/src/metrics.rs
// ============================================================================
// Module: Fleetgate Service Metrics
// Description: Outcome counters for tool invocations.
// Purpose: Let deployments observe the tool surface without redesign.
// Dependencies: none
// ============================================================================

//! ## Overview
//! A minimal metrics seam: every tool invocation reports its tool name and
//! outcome. The default sink discards events; deployments route them to
//! their own pipeline.

// ============================================================================
// SECTION: Types
// ============================================================================

/// Tool operations exposed by the control service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolName {
    /// `capabilities.list`
    CapabilitiesList,
    /// `context.get`
    ContextGet,
    /// `targets.resolve`
    TargetsResolve,
    /// `scopes.catalog.get`
    ScopesCatalogGet,
    /// `changes.preview`
    ChangesPreview,
    /// `changes.apply`
    ChangesApply,
    /// `confirm.issue`
    ConfirmIssue,
}

impl ToolName {
    /// Returns the stable wire label for this tool.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CapabilitiesList => "capabilities.list",
            Self::ContextGet => "context.get",
            Self::TargetsResolve => "targets.resolve",
            Self::ScopesCatalogGet => "scopes.catalog.get",
            Self::ChangesPreview => "changes.preview",
            Self::ChangesApply => "changes.apply",
            Self::ConfirmIssue => "confirm.issue",
        }
    }
}

/// Outcome of one tool invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolOutcome {
    /// Invocation produced a success response.
    Ok,
    /// Invocation produced an error response.
    Failed,
}

/// One metric event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolMetricEvent {
    /// Tool that was invoked.
    pub tool: ToolName,
    /// Invocation outcome.
    pub outcome: ToolOutcome,
}

// ============================================================================
// SECTION: Sink
// ============================================================================

/// Metrics sink for tool invocations.
pub trait ServiceMetrics: Send + Sync {
    /// Records one event.
    fn record(&self, event: ToolMetricEvent);
}

/// Metrics sink that discards all events.
pub struct NoopMetrics;

impl ServiceMetrics for NoopMetrics {
    fn record(&self, _event: ToolMetricEvent) {}
}
