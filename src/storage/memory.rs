//! In-memory series store
//!
//! Fixed-step series held in a `BTreeMap` behind an `RwLock`. Writes are
//! aligned to step slots; a slot covering `[end - step, end)` is keyed by
//! its end time, which is also the time a cursor reports for it.
//!
//! # Usage
//! ```ignore
//! let store = MemoryStore::new();
//! store.create_series("servers.web1.cpu", 60)?;
//! store.write("servers.web1.cpu", 1_700_000_000, 42.0)?;
//! let nodes = store.find("servers.*");
//! ```

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::RwLock;

use crate::storage::error::{StorageError, StorageResult};
use crate::storage::glob::GlobPattern;
use crate::storage::types::{SeriesCursor, SeriesFetcher, TreeNode};

/// A stored series: step in seconds and values keyed by slot end
#[derive(Debug, Clone)]
struct StoredSeries {
    step: i64,
    points: BTreeMap<i64, f64>,
}

/// One entry of a JSON seed file
#[derive(Debug, Deserialize)]
struct SeedSeries {
    name: String,
    step: i64,
    #[serde(default)]
    points: Vec<(i64, Option<f64>)>,
}

/// Thread-safe in-memory series store
#[derive(Debug, Default)]
pub struct MemoryStore {
    series: RwLock<BTreeMap<String, StoredSeries>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a series with a step in seconds
    ///
    /// Registering an existing name is a no-op; its step is kept.
    pub fn create_series(&self, name: &str, step: i64) -> StorageResult<()> {
        validate_name(name)?;
        if step <= 0 {
            return Err(StorageError::InvalidStep {
                name: name.to_string(),
                step,
            });
        }

        let mut series = self.series.write()?;
        series
            .entry(name.to_string())
            .or_insert_with(|| StoredSeries {
                step,
                points: BTreeMap::new(),
            });
        Ok(())
    }

    /// Record a value at a Unix timestamp (seconds)
    pub fn write(&self, name: &str, timestamp: i64, value: f64) -> StorageResult<()> {
        let mut series = self.series.write()?;
        let stored = series
            .get_mut(name)
            .ok_or_else(|| StorageError::SeriesNotFound(name.to_string()))?;

        let slot_end = align_end(timestamp, stored.step)?;
        stored.points.insert(slot_end, value);
        Ok(())
    }

    /// Number of registered series
    pub fn series_count(&self) -> usize {
        self.series.read().map(|s| s.len()).unwrap_or(0)
    }

    /// Load series from a JSON seed file
    ///
    /// The file holds `[{"name": ..., "step": ..., "points": [[ts, value], ...]}]`;
    /// `null` values are skipped. Returns the number of points written.
    pub fn load_seed_file(&self, path: &Path) -> StorageResult<usize> {
        let content = std::fs::read_to_string(path)?;
        let seeds: Vec<SeedSeries> = serde_json::from_str(&content)?;

        let mut written = 0;
        for seed in seeds {
            self.create_series(&seed.name, seed.step)?;
            for (ts, value) in seed.points {
                if let Some(value) = value {
                    self.write(&seed.name, ts, value)?;
                    written += 1;
                }
            }
        }

        tracing::info!(
            path = %path.display(),
            series = self.series_count(),
            points = written,
            "Loaded seed file"
        );
        Ok(written)
    }

    /// Populate a small demo namespace covering the 24 hours before `now`
    pub fn seed_demo(&self, now: DateTime<Utc>) -> StorageResult<()> {
        let hosts = [("web1", 0.0), ("web2", 1.0), ("db1", 2.0)];
        let now = now.timestamp();
        let step = 60;

        for (host, phase) in hosts {
            let cpu = format!("servers.{}.cpu.user", host);
            let mem = format!("servers.{}.mem.used", host);
            self.create_series(&cpu, step)?;
            self.create_series(&mem, step)?;

            for i in 0..(24 * 60) {
                let ts = now - i * step;
                let angle = (i as f64) * std::f64::consts::PI / 720.0 + phase;
                self.write(&cpu, ts, 50.0 + 40.0 * angle.sin())?;
                self.write(&mem, ts, 2048.0 + 512.0 * angle.cos())?;
            }
        }

        tracing::info!(series = self.series_count(), "Seeded demo series");
        Ok(())
    }
}

impl SeriesFetcher for MemoryStore {
    fn find(&self, pattern: &str) -> Vec<TreeNode> {
        if pattern.is_empty() {
            return Vec::new();
        }

        let glob = match GlobPattern::new(pattern) {
            Ok(glob) => glob,
            Err(e) => {
                tracing::warn!(pattern = %pattern, error = %e, "Invalid find pattern");
                return Vec::new();
            }
        };

        let series = match self.series.read() {
            Ok(series) => series,
            Err(e) => {
                tracing::error!(error = %e, "Series lock poisoned");
                return Vec::new();
            }
        };

        let depth = glob.depth();
        let mut leaves = BTreeSet::new();
        let mut branches = BTreeSet::new();

        for name in series.keys() {
            let parts: Vec<&str> = name.split('.').collect();
            if !glob.matches_prefix(&parts) {
                continue;
            }
            let prefix = parts[..depth].join(".");
            if parts.len() == depth {
                leaves.insert(prefix);
            } else {
                branches.insert(prefix);
            }
        }

        let names: BTreeSet<&String> = leaves.iter().chain(branches.iter()).collect();
        let mut nodes = Vec::with_capacity(leaves.len() + branches.len());
        for name in names {
            if leaves.contains(name) {
                nodes.push(TreeNode::leaf(name.clone()));
            }
            if branches.contains(name) {
                nodes.push(TreeNode::branch(name.clone()));
            }
        }
        nodes
    }

    fn fetch(
        &self,
        name: &str,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
        max_points: i64,
    ) -> StorageResult<Box<dyn SeriesCursor>> {
        if from > until {
            return Err(StorageError::InvalidTimeRange);
        }

        let series = self.series.read()?;
        let stored = series
            .get(name)
            .ok_or_else(|| StorageError::SeriesNotFound(name.to_string()))?;

        let step = stored.step;
        let first_end = align_end(from.timestamp(), step)?;
        let last_end = align_end(until.timestamp(), step)?;
        let slots = (last_end - first_end) / step + 1;

        let group = if max_points > 0 && slots > max_points {
            (slots + max_points - 1) / max_points
        } else {
            1
        };

        let points = stored
            .points
            .range(first_end..=last_end)
            .map(|(k, v)| (*k, *v))
            .collect();

        tracing::trace!(
            series = %name,
            slots,
            group,
            "Opened memory cursor"
        );

        Ok(Box::new(MemoryCursor {
            points,
            step,
            group,
            next_end: first_end,
            last_end,
            current: None,
            closed: false,
        }))
    }
}

/// End of the slot containing `ts`
fn align_end(ts: i64, step: i64) -> StorageResult<i64> {
    ts.checked_sub(ts.rem_euclid(step))
        .and_then(|start| start.checked_add(step))
        .ok_or(StorageError::TimestampOutOfRange(ts))
}

fn validate_name(name: &str) -> StorageResult<()> {
    if name.is_empty() || name.split('.').any(str::is_empty) {
        return Err(StorageError::InvalidName(name.to_string()));
    }
    Ok(())
}

/// Lazily walks slots, averaging `group` base slots per emitted point
struct MemoryCursor {
    points: BTreeMap<i64, f64>,
    step: i64,
    group: i64,
    next_end: i64,
    last_end: i64,
    current: Option<(i64, f64)>,
    closed: bool,
}

impl SeriesCursor for MemoryCursor {
    fn next(&mut self) -> bool {
        if self.closed || self.next_end > self.last_end {
            self.current = None;
            return false;
        }

        let bucket_end = self
            .next_end
            .saturating_add((self.group - 1).saturating_mul(self.step));
        let (sum, count) = self
            .points
            .range(self.next_end..=bucket_end)
            .map(|(_, v)| *v)
            .filter(|v| v.is_finite())
            .fold((0.0, 0u32), |(sum, count), v| (sum + v, count + 1));

        let value = if count > 0 { sum / count as f64 } else { f64::NAN };
        self.current = Some((bucket_end, value));
        self.next_end = bucket_end.saturating_add(self.step);
        true
    }

    fn current_value(&self) -> f64 {
        self.current.map(|(_, v)| v).unwrap_or(f64::NAN)
    }

    fn current_time(&self) -> DateTime<Utc> {
        self.current
            .and_then(|(t, _)| DateTime::from_timestamp(t, 0))
            .unwrap_or_default()
    }

    fn step(&self) -> Duration {
        Duration::seconds(self.step * self.group)
    }

    fn close(&mut self) {
        self.closed = true;
        self.current = None;
        self.points.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn ts(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    fn drain(mut cursor: Box<dyn SeriesCursor>) -> Vec<(i64, f64)> {
        let mut out = Vec::new();
        while cursor.next() {
            out.push((cursor.current_time().timestamp(), cursor.current_value()));
        }
        cursor.close();
        out
    }

    fn store_with(names: &[&str]) -> MemoryStore {
        let store = MemoryStore::new();
        for name in names {
            store.create_series(name, 60).unwrap();
        }
        store
    }

    #[test]
    fn test_create_series_validation() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.create_series("", 60),
            Err(StorageError::InvalidName(_))
        ));
        assert!(matches!(
            store.create_series("a..b", 60),
            Err(StorageError::InvalidName(_))
        ));
        assert!(matches!(
            store.create_series("a.b", 0),
            Err(StorageError::InvalidStep { .. })
        ));
        assert!(store.create_series("a.b", 10).is_ok());
        assert_eq!(store.series_count(), 1);
    }

    #[test]
    fn test_write_unknown_series() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.write("nope", 0, 1.0),
            Err(StorageError::SeriesNotFound(_))
        ));
    }

    #[test]
    fn test_write_rejects_unalignable_timestamp() {
        let store = store_with(&["a.b"]);
        assert!(matches!(
            store.write("a.b", i64::MAX, 1.0),
            Err(StorageError::TimestampOutOfRange(i64::MAX))
        ));
        assert!(matches!(
            store.write("a.b", i64::MIN, 1.0),
            Err(StorageError::TimestampOutOfRange(i64::MIN))
        ));
        assert!(store.write("a.b", -90, 1.0).is_ok());
    }

    #[test]
    fn test_seed_file_with_extreme_timestamp_fails() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"name": "a.b", "step": 60, "points": [[9223372036854775807, 1.0]]}}]"#
        )
        .unwrap();

        let store = MemoryStore::new();
        assert!(matches!(
            store.load_seed_file(file.path()),
            Err(StorageError::TimestampOutOfRange(_))
        ));
    }

    #[test]
    fn test_fetch_reports_slot_ends() {
        let store = store_with(&["a.b"]);
        store.write("a.b", 600, 1.0).unwrap();
        store.write("a.b", 690, 2.0).unwrap();

        let points = drain(store.fetch("a.b", ts(600), ts(720), 0).unwrap());
        assert_eq!(points.len(), 3);
        assert_eq!(points[0], (660, 1.0));
        assert_eq!(points[1], (720, 2.0));
        assert_eq!(points[2].0, 780);
        assert!(points[2].1.is_nan());
    }

    #[test]
    fn test_fetch_consolidates_to_max_points() {
        let store = store_with(&["a.b"]);
        for i in 0..10 {
            store.write("a.b", i * 60, i as f64).unwrap();
        }

        let cursor = store.fetch("a.b", ts(0), ts(540), 5).unwrap();
        assert_eq!(cursor.step(), Duration::seconds(120));
        let points = drain(cursor);
        assert_eq!(points.len(), 5);
        assert_eq!(points[0], (120, 0.5));
        assert_eq!(points[4], (600, 8.5));
    }

    #[test]
    fn test_fetch_rejects_inverted_range() {
        let store = store_with(&["a.b"]);
        assert!(matches!(
            store.fetch("a.b", ts(100), ts(0), 0),
            Err(StorageError::InvalidTimeRange)
        ));
    }

    #[test]
    fn test_find_branches_and_leaves() {
        let store = store_with(&[
            "servers.web1.cpu",
            "servers.web2.cpu",
            "servers.total",
            "other.x",
        ]);

        let nodes = store.find("servers.*");
        assert_eq!(
            nodes,
            vec![
                TreeNode::leaf("servers.total"),
                TreeNode::branch("servers.web1"),
                TreeNode::branch("servers.web2"),
            ]
        );

        let nodes = store.find("*");
        assert_eq!(
            nodes,
            vec![TreeNode::branch("other"), TreeNode::branch("servers")]
        );
    }

    #[test]
    fn test_find_node_that_is_leaf_and_branch() {
        let store = store_with(&["a.b", "a.b.c"]);
        let nodes = store.find("a.*");
        assert_eq!(nodes, vec![TreeNode::leaf("a.b"), TreeNode::branch("a.b")]);
    }

    #[test]
    fn test_find_empty_pattern() {
        let store = store_with(&["a.b"]);
        assert!(store.find("").is_empty());
    }

    #[test]
    fn test_load_seed_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"name": "a.b", "step": 60, "points": [[60, 1.5], [120, null], [180, 3.0]]}}]"#
        )
        .unwrap();

        let store = MemoryStore::new();
        assert_eq!(store.load_seed_file(file.path()).unwrap(), 2);
        assert_eq!(store.find("a.*"), vec![TreeNode::leaf("a.b")]);
    }

    #[test]
    fn test_seed_demo() {
        let store = MemoryStore::new();
        store.seed_demo(ts(1_700_000_000)).unwrap();
        assert_eq!(store.series_count(), 6);
        assert_eq!(store.find("servers.*").len(), 3);
    }
}
