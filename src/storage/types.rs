//! Core data types shared by the series store, the query engine and the
//! Graphite protocol layer
//!
//! - `TreeNode`: an entry in the dotted metric namespace
//! - `SeriesCursor`: forward-only access to one series' points
//! - `SeriesHandle`: owning guard that releases a cursor exactly once
//! - `SeriesCollection`: name-ordered result set of one query
//! - `SeriesFetcher`: tree lookup + data access consumed by the engine

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::btree_map;
use std::collections::BTreeMap;

use crate::storage::error::StorageResult;

/// A node of the metric namespace tree
///
/// Leaves are concrete series, branches are namespace prefixes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode {
    /// Full dotted path, e.g. `servers.web1.cpu`
    pub name: String,
    /// True if this node is a concrete series
    pub leaf: bool,
}

impl TreeNode {
    /// Create a leaf node
    pub fn leaf(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            leaf: true,
        }
    }

    /// Create a branch node
    pub fn branch(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            leaf: false,
        }
    }

    /// Last dot-separated segment of the name
    pub fn text(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }
}

/// Forward-only cursor over the points of a single series
///
/// `current_value` and `current_time` are only meaningful after `next`
/// returned `true`. Times are interval *end* times.
pub trait SeriesCursor: Send {
    /// Advance to the next point, returns false once exhausted
    fn next(&mut self) -> bool;

    /// Value at the current position
    fn current_value(&self) -> f64;

    /// Time at the current position
    fn current_time(&self) -> DateTime<Utc>;

    /// Fixed interval between consecutive points
    fn step(&self) -> Duration;

    /// Display name overriding the series name
    fn alias(&self) -> Option<&str> {
        None
    }

    /// Release any resources held by the cursor
    fn close(&mut self);
}

/// Owning guard around a cursor
///
/// The cursor is closed when the handle is dropped, so every exit path
/// (including early returns and unwinding) releases it exactly once.
pub struct SeriesHandle {
    cursor: Box<dyn SeriesCursor>,
    alias: Option<String>,
}

impl SeriesHandle {
    pub fn new(cursor: Box<dyn SeriesCursor>) -> Self {
        Self {
            cursor,
            alias: None,
        }
    }

    /// Builder method: override the display name
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.set_alias(alias);
        self
    }

    pub fn set_alias(&mut self, alias: impl Into<String>) {
        self.alias = Some(alias.into());
    }

    pub fn next(&mut self) -> bool {
        self.cursor.next()
    }

    pub fn current_value(&self) -> f64 {
        self.cursor.current_value()
    }

    pub fn current_time(&self) -> DateTime<Utc> {
        self.cursor.current_time()
    }

    pub fn step(&self) -> Duration {
        self.cursor.step()
    }

    /// Alias set on the handle, falling back to the cursor's own alias
    pub fn alias(&self) -> Option<&str> {
        self.alias
            .as_deref()
            .or_else(|| self.cursor.alias())
            .filter(|a| !a.is_empty())
    }
}

impl Drop for SeriesHandle {
    fn drop(&mut self) {
        self.cursor.close();
    }
}

impl std::fmt::Debug for SeriesHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeriesHandle")
            .field("alias", &self.alias())
            .field("step", &self.step())
            .finish()
    }
}

/// Result set of one query execution, keyed by series name
///
/// Iteration is lexicographic by name regardless of insertion order.
#[derive(Debug, Default)]
pub struct SeriesCollection {
    series: BTreeMap<String, SeriesHandle>,
}

impl SeriesCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a series, keeping an existing entry of the same name
    ///
    /// Returns false (and drops, thereby closing, `handle`) on collision.
    pub fn insert(&mut self, name: impl Into<String>, handle: SeriesHandle) -> bool {
        match self.series.entry(name.into()) {
            btree_map::Entry::Vacant(slot) => {
                slot.insert(handle);
                true
            }
            btree_map::Entry::Occupied(_) => false,
        }
    }

    /// Merge another collection into this one, first name wins
    pub fn merge(&mut self, other: SeriesCollection) {
        for (name, handle) in other {
            self.insert(name, handle);
        }
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Series names in iteration order
    pub fn names(&self) -> Vec<&str> {
        self.series.keys().map(String::as_str).collect()
    }

    pub fn get(&self, name: &str) -> Option<&SeriesHandle> {
        self.series.get(name)
    }

    pub fn iter_mut(&mut self) -> btree_map::IterMut<'_, String, SeriesHandle> {
        self.series.iter_mut()
    }
}

impl IntoIterator for SeriesCollection {
    type Item = (String, SeriesHandle);
    type IntoIter = btree_map::IntoIter<String, SeriesHandle>;

    fn into_iter(self) -> Self::IntoIter {
        self.series.into_iter()
    }
}

/// Tree lookup and data access for a series backend
pub trait SeriesFetcher: Send + Sync {
    /// Resolve a Graphite glob pattern to namespace nodes
    fn find(&self, pattern: &str) -> Vec<TreeNode>;

    /// Open a cursor over one series for the window `[from, until]`
    fn fetch(
        &self,
        name: &str,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
        max_points: i64,
    ) -> StorageResult<Box<dyn SeriesCursor>>;
}

/// Cursor over an owned vector of points
#[derive(Debug, Clone)]
pub struct VecCursor {
    points: Vec<(DateTime<Utc>, f64)>,
    step: Duration,
    pos: Option<usize>,
    closed: bool,
}

impl VecCursor {
    pub fn new(points: Vec<(DateTime<Utc>, f64)>, step: Duration) -> Self {
        Self {
            points,
            step,
            pos: None,
            closed: false,
        }
    }

    fn current(&self) -> Option<&(DateTime<Utc>, f64)> {
        self.pos.and_then(|p| self.points.get(p))
    }
}

impl SeriesCursor for VecCursor {
    fn next(&mut self) -> bool {
        if self.closed {
            return false;
        }
        let next = self.pos.map_or(0, |p| p + 1).min(self.points.len());
        self.pos = Some(next);
        next < self.points.len()
    }

    fn current_value(&self) -> f64 {
        self.current().map(|(_, v)| *v).unwrap_or(f64::NAN)
    }

    fn current_time(&self) -> DateTime<Utc> {
        self.current().map(|(t, _)| *t).unwrap_or_default()
    }

    fn step(&self) -> Duration {
        self.step
    }

    fn close(&mut self) {
        self.closed = true;
        self.points = Vec::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingCursor {
        closes: Arc<AtomicUsize>,
    }

    impl SeriesCursor for CountingCursor {
        fn next(&mut self) -> bool {
            false
        }
        fn current_value(&self) -> f64 {
            f64::NAN
        }
        fn current_time(&self) -> DateTime<Utc> {
            DateTime::default()
        }
        fn step(&self) -> Duration {
            Duration::seconds(60)
        }
        fn close(&mut self) {
            self.closes.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn counting(closes: &Arc<AtomicUsize>) -> SeriesHandle {
        SeriesHandle::new(Box::new(CountingCursor {
            closes: Arc::clone(closes),
        }))
    }

    fn ts(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    #[test]
    fn test_tree_node_text() {
        assert_eq!(TreeNode::leaf("servers.web1.cpu").text(), "cpu");
        assert_eq!(TreeNode::branch("servers").text(), "servers");
    }

    #[test]
    fn test_vec_cursor_iteration() {
        let mut cursor = VecCursor::new(vec![(ts(60), 1.0), (ts(120), 2.0)], Duration::seconds(60));

        assert!(cursor.next());
        assert_eq!(cursor.current_time(), ts(60));
        assert_eq!(cursor.current_value(), 1.0);
        assert!(cursor.next());
        assert_eq!(cursor.current_value(), 2.0);
        assert!(!cursor.next());
        assert!(!cursor.next());
        assert!(cursor.current_value().is_nan());
    }

    #[test]
    fn test_vec_cursor_closed_stops() {
        let mut cursor = VecCursor::new(vec![(ts(60), 1.0)], Duration::seconds(60));
        cursor.close();
        assert!(!cursor.next());
    }

    #[test]
    fn test_handle_closes_once_on_drop() {
        let closes = Arc::new(AtomicUsize::new(0));
        {
            let _handle = counting(&closes);
        }
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_collection_sorted_by_name() {
        let closes = Arc::new(AtomicUsize::new(0));
        let mut collection = SeriesCollection::new();
        collection.insert("zeta", counting(&closes));
        collection.insert("alpha", counting(&closes));
        collection.insert("mid", counting(&closes));

        assert_eq!(collection.names(), vec!["alpha", "mid", "zeta"]);
        let names: Vec<String> = collection.into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["alpha", "mid", "zeta"]);
        assert_eq!(closes.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_collection_first_name_wins() {
        let closes = Arc::new(AtomicUsize::new(0));
        let mut collection = SeriesCollection::new();
        assert!(collection.insert("a", counting(&closes).with_alias("first")));
        assert!(!collection.insert("a", counting(&closes).with_alias("second")));

        // the rejected handle was released immediately
        assert_eq!(closes.load(Ordering::SeqCst), 1);
        assert_eq!(collection.get("a").unwrap().alias(), Some("first"));

        drop(collection);
        assert_eq!(closes.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_empty_alias_is_ignored() {
        let handle = SeriesHandle::new(Box::new(VecCursor::new(vec![], Duration::seconds(1))))
            .with_alias("");
        assert_eq!(handle.alias(), None);
    }
}
