//! Data Transfer Objects
//!
//! JSON bodies for the service's own endpoints. Graphite responses are
//! written by `crate::graphite` directly.

use serde::Serialize;

// ============================================
// HEALTH DTOs
// ============================================

/// Full health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Overall status: healthy, unhealthy
    pub status: String,
    /// Series fetcher status
    pub storage: String,
    /// Number of nodes at the root of the metric tree
    pub root_nodes: usize,
    /// Server uptime in seconds
    pub uptime_seconds: u64,
    /// Application version
    pub version: String,
}
