//! Target translation
//!
//! Turns one Graphite `target` into a DSL query and hands it to the query
//! engine. The DSL only accepts function calls at top level, so the quoted
//! target is wrapped in `group(...)`, which passes its argument through
//! unchanged.

use chrono::{DateTime, Utc};

use crate::graphite::quote::quote_identifiers;
use crate::query::{QueryEngine, QueryResult};
use crate::storage::{SeriesCollection, SeriesFetcher};

/// Build the DSL query text for a Graphite target
pub fn build_query(target: &str) -> String {
    format!("group({})", quote_identifiers(target))
}

/// Evaluate one Graphite target
///
/// The window is passed to the engine in whole seconds. Engine errors are
/// returned as-is.
pub fn translate_target(
    engine: &dyn QueryEngine,
    fetcher: &dyn SeriesFetcher,
    target: &str,
    from: DateTime<Utc>,
    until: DateTime<Utc>,
    max_points: i64,
) -> QueryResult<SeriesCollection> {
    let query = build_query(target);
    tracing::debug!(target_expr = %target, query = %query, "Translated target");
    engine.evaluate(
        fetcher,
        &query,
        whole_seconds(from),
        whole_seconds(until),
        max_points,
    )
}

fn whole_seconds(t: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp(t.timestamp(), 0).unwrap_or(t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{DslEngine, QueryError};
    use crate::storage::MemoryStore;
    use std::sync::Mutex;

    /// Records the arguments it is called with
    #[derive(Default)]
    struct RecordingEngine {
        calls: Mutex<Vec<(String, DateTime<Utc>, DateTime<Utc>, i64)>>,
    }

    impl QueryEngine for RecordingEngine {
        fn evaluate(
            &self,
            _fetcher: &dyn SeriesFetcher,
            query: &str,
            from: DateTime<Utc>,
            until: DateTime<Utc>,
            max_points: i64,
        ) -> QueryResult<SeriesCollection> {
            self.calls
                .lock()
                .unwrap()
                .push((query.to_string(), from, until, max_points));
            Ok(SeriesCollection::new())
        }
    }

    fn ts(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    #[test]
    fn test_build_query_wraps_in_group() {
        assert_eq!(build_query("a.b.c"), r#"group("a.b.c")"#);
        assert_eq!(
            build_query("alias(a.b, 'x')"),
            r#"group(alias("a.b", 'x'))"#
        );
    }

    #[test]
    fn test_translate_passes_arguments_through() {
        let engine = RecordingEngine::default();
        let store = MemoryStore::new();

        translate_target(&engine, &store, "servers.*.cpu", ts(100), ts(200), 42).unwrap();

        let calls = engine.calls.lock().unwrap();
        assert_eq!(
            calls.as_slice(),
            &[(r#"group("servers.*.cpu")"#.to_string(), ts(100), ts(200), 42)]
        );
    }

    #[test]
    fn test_translate_truncates_window_to_seconds() {
        let engine = RecordingEngine::default();
        let store = MemoryStore::new();
        let from = DateTime::from_timestamp(100, 250_000_000).unwrap();
        let until = DateTime::from_timestamp(200, 999_999_999).unwrap();

        translate_target(&engine, &store, "a.b", from, until, 0).unwrap();

        let calls = engine.calls.lock().unwrap();
        assert_eq!(calls[0].1, ts(100));
        assert_eq!(calls[0].2, ts(200));
    }

    #[test]
    fn test_translate_with_dsl_engine() {
        let store = MemoryStore::new();
        store.create_series("servers.1a.cpu", 60).unwrap();

        let series =
            translate_target(&DslEngine::new(), &store, "servers.1a.cpu", ts(0), ts(600), 0).unwrap();
        assert_eq!(series.names(), vec!["servers.1a.cpu"]);
    }

    #[test]
    fn test_translate_surfaces_engine_error() {
        let store = MemoryStore::new();
        let result = translate_target(&DslEngine::new(), &store, "bogus(", ts(0), ts(1), 0);
        assert!(matches!(result, Err(QueryError::Parse(_))));
    }
}
