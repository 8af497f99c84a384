//! Series storage
//!
//! This module provides the series backend consumed by the query engine
//! and the Graphite protocol layer:
//!
//! - **types**: tree nodes, series cursors and result collections
//! - **glob**: Graphite path globbing
//! - **memory**: in-memory fixed-step series store
//! - **error**: Error types
//!
//! # Architecture
//!
//! ```text
//! find:   pattern → GlobPattern → TreeNode[]
//! fetch:  name + window → slot-aligned cursor (optionally consolidated)
//! ```

pub mod error;
pub mod glob;
pub mod memory;
pub mod types;

// Re-export commonly used types
pub use error::{StorageError, StorageResult};
pub use glob::GlobPattern;
pub use memory::MemoryStore;
pub use types::{SeriesCollection, SeriesCursor, SeriesFetcher, SeriesHandle, TreeNode, VecCursor};
