//! Application State
//!
//! Shared state accessible by all API handlers.
//! Wrapped in Arc for thread-safe sharing across async tasks.

use crate::query::QueryEngine;
use crate::storage::SeriesFetcher;
use std::sync::Arc;
use std::time::Instant;

/// Shared application state for all handlers
#[derive(Clone)]
pub struct AppState {
    /// Tree lookup and series data
    pub fetcher: Arc<dyn SeriesFetcher>,
    /// Engine evaluating translated targets
    pub engine: Arc<dyn QueryEngine>,
    /// API configuration
    pub config: Arc<ApiConfig>,
    /// Server start time for uptime tracking
    pub start_time: Instant,
}

impl AppState {
    pub fn new(
        fetcher: Arc<dyn SeriesFetcher>,
        engine: Arc<dyn QueryEngine>,
        config: ApiConfig,
    ) -> Self {
        Self {
            fetcher,
            engine,
            config: Arc::new(config),
            start_time: Instant::now(),
        }
    }

    /// Get server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Boundary used when a render request has no `until`
    pub default_until: String,
    /// Bytes buffered before a render chunk is sent
    pub stream_chunk_bytes: usize,
    /// Chunks in flight between the render task and the socket
    pub stream_buffer_chunks: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            default_until: "now".to_string(),
            stream_chunk_bytes: 8 * 1024,
            stream_buffer_chunks: 16,
        }
    }
}

impl ApiConfig {
    /// Create config with custom host and port
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    /// Get the socket address string
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
