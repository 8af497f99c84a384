//! `/render` response body
//!
//! Targets are evaluated one after another and written out as soon as
//! their series are read, so the array is streamed rather than built in
//! memory:
//!
//! ```text
//! [
//! {"target": "servers.web1.cpu", "datapoints": [
//! [12.5, 1700000000],[null, 1700000060]]},
//! {"target": "web2", "datapoints": [
//! ]}]
//! ```
//!
//! Graphite stamps each point with the *start* of its interval while
//! cursors report the end, so every timestamp is shifted back by one step.
//! Points whose shifted timestamp is not after the epoch are omitted.
//!
//! A target the engine rejects ends the response: it is logged, the array
//! is closed and later targets are not evaluated.

use chrono::{DateTime, Utc};
use std::io::{self, Write};

use crate::graphite::translate::translate_target;
use crate::graphite::write_json_str;
use crate::query::QueryEngine;
use crate::storage::{SeriesFetcher, SeriesHandle};

/// Parameters of one render request, already validated
#[derive(Debug, Clone, PartialEq)]
pub struct RenderRequest {
    /// Target expressions in the order they were supplied
    pub targets: Vec<String>,
    pub from: DateTime<Utc>,
    pub until: DateTime<Utc>,
    pub max_data_points: i64,
}

/// What a render pass produced
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RenderSummary {
    pub targets_evaluated: usize,
    pub series_written: usize,
    pub points_written: usize,
    pub points_dropped: usize,
    /// Target whose evaluation failed and ended the response
    pub failed_target: Option<String>,
}

/// Evaluate the request's targets and stream the render JSON array
///
/// Only I/O errors are returned; query failures end the array early and
/// are reported through `RenderSummary::failed_target`. Every series
/// cursor is released before this returns, on every path.
pub fn write_render_response<W: Write>(
    out: &mut W,
    engine: &dyn QueryEngine,
    fetcher: &dyn SeriesFetcher,
    request: &RenderRequest,
) -> io::Result<RenderSummary> {
    let mut summary = RenderSummary::default();

    out.write_all(b"[")?;

    for target in &request.targets {
        summary.targets_evaluated += 1;

        let series = match translate_target(
            engine,
            fetcher,
            target,
            request.from,
            request.until,
            request.max_data_points,
        ) {
            Ok(series) => series,
            Err(e) => {
                tracing::warn!(
                    target_expr = %target,
                    error = %e,
                    "Target evaluation failed, closing render response"
                );
                summary.failed_target = Some(target.clone());
                break;
            }
        };

        for (name, mut handle) in series {
            if summary.series_written > 0 {
                out.write_all(b",\n")?;
            } else {
                out.write_all(b"\n")?;
            }
            write_series(out, &name, &mut handle, &mut summary)?;
            summary.series_written += 1;
        }
    }

    out.write_all(b"]\n")?;
    out.flush()?;

    Ok(summary)
}

/// Write one `{"target": ..., "datapoints": [...]}` object
fn write_series<W: Write>(
    out: &mut W,
    name: &str,
    handle: &mut SeriesHandle,
    summary: &mut RenderSummary,
) -> io::Result<()> {
    out.write_all(br#"{"target": "#)?;
    write_json_str(out, handle.alias().unwrap_or(name))?;
    out.write_all(b", \"datapoints\": [\n")?;

    let mut written = 0usize;
    while handle.next() {
        let start = handle
            .current_time()
            .checked_sub_signed(handle.step())
            .map(|t| t.timestamp())
            .unwrap_or(0);

        // TODO: drop only the epoch sentinel (start == 0) once it is settled
        // whether pre-epoch points can be real data
        if start <= 0 {
            summary.points_dropped += 1;
            continue;
        }

        if written > 0 {
            out.write_all(b",")?;
        }
        let value = handle.current_value();
        if value.is_finite() {
            write!(out, "[{}, {}]", value, start)?;
        } else {
            write!(out, "[null, {}]", start)?;
        }
        written += 1;
    }

    out.write_all(b"]}")?;
    summary.points_written += written;
    Ok(())
}
