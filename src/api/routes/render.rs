//! Render Routes
//!
//! - GET|POST /render - Evaluate targets and stream their datapoints
//!
//! Parameter errors are answered with 400 before any output. Once the
//! parameters are valid the status is 200 and the body is streamed from a
//! blocking task; failures after that point only end the stream early.

use axum::{
    extract::{Form, Query, State},
    http::{header, Method},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;

use crate::api::error::{ApiError, ApiResult};
use crate::api::params::FormParams;
use crate::api::state::AppState;
use crate::api::stream::streaming_body;
use crate::graphite::{parse_time, write_render_response, RenderRequest};

/// GET|POST /render
pub async fn render(
    State(state): State<Arc<AppState>>,
    method: Method,
    Query(query): Query<Vec<(String, String)>>,
    form: Option<Form<Vec<(String, String)>>>,
) -> ApiResult<Response> {
    let params = FormParams::from_request(&method, query, form.map(|Form(body)| body));
    let request = parse_render_request(&params, &state.config.default_until)?;

    let request_id = uuid::Uuid::new_v4();
    let span = tracing::info_span!(
        "render",
        request_id = %request_id,
        targets = request.targets.len(),
        from = %request.from,
        until = %request.until,
        max_data_points = request.max_data_points,
    );

    let (mut writer, body) = streaming_body(
        state.config.stream_chunk_bytes,
        state.config.stream_buffer_chunks,
    );
    let engine = Arc::clone(&state.engine);
    let fetcher = Arc::clone(&state.fetcher);

    tokio::task::spawn_blocking(move || {
        let _guard = span.enter();
        let started = Instant::now();

        match write_render_response(&mut writer, engine.as_ref(), fetcher.as_ref(), &request) {
            Ok(summary) => tracing::info!(
                targets_evaluated = summary.targets_evaluated,
                series = summary.series_written,
                points = summary.points_written,
                points_dropped = summary.points_dropped,
                failed_target = ?summary.failed_target,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Render complete"
            ),
            Err(e) => tracing::debug!(
                error = %e,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Render stream aborted"
            ),
        }
    });

    Ok(([(header::CONTENT_TYPE, "application/json")], body).into_response())
}

/// Validate render parameters
///
/// `from` is required. `until` falls back to `to`, then to `default_until`.
/// `maxDataPoints` is a required integer; 0 or less means no limit.
pub fn parse_render_request(params: &FormParams, default_until: &str) -> ApiResult<RenderRequest> {
    let from = parse_time(params.get("from").unwrap_or_default())
        .map_err(|e| ApiError::bad_request("from", e))?
        .ok_or_else(|| ApiError::bad_request("from", "missing"))?;

    let until_text = params.first_non_empty(&["until", "to"]).unwrap_or_default();
    let until = match parse_time(until_text).map_err(|e| ApiError::bad_request("until", e))? {
        Some(until) => until,
        None => parse_time(default_until)
            .map_err(|e| ApiError::Internal(format!("default until {:?}: {}", default_until, e)))?
            .unwrap_or_else(Utc::now),
    };

    let max_data_points = params
        .get("maxDataPoints")
        .unwrap_or_default()
        .parse::<i64>()
        .map_err(|e| ApiError::bad_request("maxDataPoints", e))?;

    let targets = params
        .all("target")
        .into_iter()
        .map(str::to_string)
        .collect();

    Ok(RenderRequest {
        targets,
        from,
        until,
        max_data_points,
    })
}
