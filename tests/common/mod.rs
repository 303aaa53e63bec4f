//! Shared fixtures: in-memory fetchers, payload builders, temp directories.
#![allow(dead_code)]

use fanpipe::{FetchError, ItemFetcher, WorkItem};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// One NDJSON line keyed on `hash`.
pub fn line(key: &str, value: &str) -> String {
    format!(r#"{{"hash":"{key}","value":"{value}"}}"#)
}

/// NDJSON payload with a trailing newline.
pub fn ndjson(lines: &[String]) -> Vec<u8> {
    let mut out = lines.join("\n");
    out.push('\n');
    out.into_bytes()
}

pub fn items(ids: &[&str]) -> Vec<WorkItem> {
    ids.iter().map(|id| WorkItem::from(*id)).collect()
}

/// Serves payloads from memory, fails configured items, counts every fetch.
#[derive(Default)]
pub struct MapFetcher {
    payloads: HashMap<String, Vec<u8>>,
    failing: HashSet<String>,
    calls: Mutex<HashMap<String, usize>>,
}

impl MapFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, item: &str, payload: Vec<u8>) -> Self {
        self.payloads.insert(item.to_string(), payload);
        self
    }

    pub fn failing(mut self, item: &str) -> Self {
        self.failing.insert(item.to_string());
        self
    }

    pub fn calls(&self) -> HashMap<String, usize> {
        self.calls.lock().unwrap().clone()
    }
}

impl ItemFetcher for MapFetcher {
    fn fetch(&self, item: &WorkItem) -> Result<Vec<u8>, FetchError> {
        *self
            .calls
            .lock()
            .unwrap()
            .entry(item.as_str().to_string())
            .or_insert(0) += 1;
        if self.failing.contains(item.as_str()) {
            return Err(FetchError::Other(format!("injected failure for {item}")));
        }
        self.payloads
            .get(item.as_str())
            .cloned()
            .ok_or_else(|| FetchError::NotFound(item.clone()))
    }
}

/// `n` items named `item-<i>`, each payload holding `per_item` records keyed `item-<i>-<j>`.
pub fn generated(n: usize, per_item: usize) -> (Vec<WorkItem>, MapFetcher) {
    let mut fetcher = MapFetcher::new();
    let mut ids = Vec::with_capacity(n);
    for i in 0..n {
        let id = format!("item-{i}");
        let lines: Vec<String> = (0..per_item)
            .map(|j| line(&format!("{id}-{j}"), "v"))
            .collect();
        fetcher = fetcher.with(&id, ndjson(&lines));
        ids.push(WorkItem::new(id));
    }
    (ids, fetcher)
}

/// Temp directory removed on drop.
pub struct TempDir(PathBuf);

impl TempDir {
    pub fn new(tag: &str) -> Self {
        static COUNTER: AtomicUsize = AtomicUsize::new(0);
        let path = std::env::temp_dir().join(format!(
            "fanpipe-test-{}-{}-{}",
            tag,
            std::process::id(),
            COUNTER.fetch_add(1, Ordering::Relaxed)
        ));
        let _ = fs::remove_dir_all(&path);
        fs::create_dir_all(&path).unwrap();
        Self(path)
    }

    pub fn path(&self) -> &Path {
        &self.0
    }

    pub fn write(&self, rel: &str, contents: &[u8]) -> PathBuf {
        let path = self.0.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, contents).unwrap();
        path
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.0);
    }
}

/// Shared call counter usable from closures.
pub fn counter() -> Arc<AtomicUsize> {
    Arc::new(AtomicUsize::new(0))
}
