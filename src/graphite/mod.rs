//! Graphite web protocol
//!
//! Translation between Graphite's `/metrics/find` and `/render` requests
//! and the series query engine:
//!
//! - **time**: `from` / `until` boundary parsing
//! - **quote**: quoting of dotted metric paths inside target expressions
//! - **translate**: target → DSL query → engine
//! - **find**: find response writer
//! - **render**: streaming render response writer
//!
//! # Flow
//!
//! ```text
//! render: from/until → per target: quote → group(...) → evaluate → series → JSON
//! find:   query → SeriesFetcher::find → JSON
//! ```
//!
//! The writers target any `std::io::Write`, so they can be driven into a
//! `Vec<u8>` in tests and into a streaming HTTP body in the server.

pub mod find;
pub mod quote;
pub mod render;
pub mod time;
pub mod translate;

pub use find::write_find_response;
pub use quote::quote_identifiers;
pub use render::{write_render_response, RenderRequest, RenderSummary};
pub use time::{parse_time, parse_time_at, TimeBoundary, TimeParseError};
pub use translate::{build_query, translate_target};

use std::io::{self, Write};

/// Write `s` as an escaped JSON string literal
pub(crate) fn write_json_str<W: Write>(out: &mut W, s: &str) -> io::Result<()> {
    serde_json::to_writer(out, s).map_err(io::Error::from)
}
