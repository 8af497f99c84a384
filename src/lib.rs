//! # Graphite Bridge
//!
//! A Graphite web protocol front end for a series query engine. Dashboards
//! that speak Graphite (`/metrics/find` and `/render`) can browse and plot
//! series held by any [`storage::SeriesFetcher`] and evaluated by any
//! [`query::QueryEngine`].
//!
//! ## Modules
//!
//! - [`graphite`]: Time parsing, target translation and the JSON writers
//! - [`query`]: Function-call series DSL, duration grammar, evaluation
//! - [`storage`]: Series cursors, the metric tree, an in-memory store
//! - [`api`]: HTTP server with Axum
//! - [`config`]: TOML and environment configuration
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use graphite_bridge::graphite::{parse_time, write_render_response, RenderRequest};
//! use graphite_bridge::query::DslEngine;
//! use graphite_bridge::storage::MemoryStore;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = MemoryStore::new();
//!     store.seed_demo(chrono::Utc::now())?;
//!
//!     let request = RenderRequest {
//!         targets: vec!["servers.web1.cpu.user".to_string()],
//!         from: parse_time("-1h")?.expect("non-empty"),
//!         until: parse_time("now")?.expect("non-empty"),
//!         max_data_points: 100,
//!     };
//!
//!     let mut out = std::io::stdout();
//!     write_render_response(&mut out, &DslEngine::new(), &store, &request)?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod graphite;
pub mod query;
pub mod storage;

// Re-export top-level types for convenience
pub use storage::{
    MemoryStore, SeriesCollection, SeriesCursor, SeriesFetcher, SeriesHandle, StorageError,
    StorageResult, TreeNode,
};

pub use query::{DslEngine, QueryEngine, QueryError};

pub use graphite::{
    parse_time, quote_identifiers, translate_target, write_find_response, write_render_response,
    RenderRequest, RenderSummary, TimeParseError,
};

pub use api::{build_router, serve, ApiConfig, ApiError, AppState};

pub use config::{Config, ConfigError, LoggingConfig};
