//! Public and internal types for the fanpipe API and pipeline.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use crate::tasks::CancelToken;
use crate::utils::config::PipelineDefaults;

/// Opaque identifier naming one unit of remote work (e.g. an object key).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkItem(String);

impl WorkItem {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorkItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for WorkItem {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for WorkItem {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// One decoded entity. `key` is the merge key in [`ResultCollection`]; `fields` holds every
/// attribute of the payload fragment, flattened to lowercase dotted names.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Record {
    key: String,
    fields: BTreeMap<String, String>,
}

impl Record {
    pub fn new(key: impl Into<String>, fields: BTreeMap<String, String>) -> Self {
        Self {
            key: key.into(),
            fields,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn fields(&self) -> &BTreeMap<String, String> {
        &self.fields
    }

    /// Case-insensitive attribute lookup. Field names are stored lowercase.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.fields.get(&name.to_lowercase()).map(String::as_str)
    }

    /// Like [`Self::attribute`] but returns `""` when the attribute is missing.
    pub fn attribute_or_empty(&self, name: &str) -> &str {
        self.attribute(name).unwrap_or("")
    }

    /// New record with `later`'s fields laid over `self`'s. Keeps `self`'s key.
    pub fn merged_with(&self, later: &Record) -> Record {
        let mut fields = self.fields.clone();
        fields.extend(later.fields.iter().map(|(k, v)| (k.clone(), v.clone())));
        Record {
            key: self.key.clone(),
            fields,
        }
    }
}

/// Map of record key → record. Returned by [`PipelineRunner::run`](crate::pipeline::PipelineRunner::run).
pub type ResultCollection = HashMap<String, Record>;

/// What the aggregator does when a record arrives with a key already in the collection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicatePolicy {
    /// Later record replaces the earlier one (last write wins).
    #[default]
    Overwrite,
    /// First record stays; later ones are dropped.
    KeepFirst,
    /// Later record's fields are laid over the earlier record's fields.
    Merge,
}

/// Payload layout understood by the bundled decoders.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum PayloadFormat {
    /// One JSON object per line.
    #[default]
    Ndjson,
    /// A single JSON document with a top-level `"Records"` array.
    Envelope,
}

/// Called by a worker after it finishes an item (fetched or not).
pub type ItemCallback = Arc<dyn Fn(&WorkItem) + Send + Sync>;

/// Lib options for [`PipelineRunner`](crate::pipeline::PipelineRunner).
#[derive(Clone)]
pub struct PipelineOpts {
    /// Number of worker threads. Must be ≥ 1.
    pub worker_count: usize,
    /// Bound of the work queue. Must be ≥ 1.
    pub queue_capacity: usize,
    pub duplicate_policy: DuplicatePolicy,
    /// Raise to stop dispatch and let workers exit early; the collection is truncated, not corrupted.
    pub cancel: Option<CancelToken>,
    pub on_item_done: Option<ItemCallback>,
}

impl Default for PipelineOpts {
    fn default() -> Self {
        Self {
            worker_count: PipelineDefaults::WORKERS,
            queue_capacity: PipelineDefaults::QUEUE_CAPACITY,
            duplicate_policy: DuplicatePolicy::default(),
            cancel: None,
            on_item_done: None,
        }
    }
}

impl fmt::Debug for PipelineOpts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineOpts")
            .field("worker_count", &self.worker_count)
            .field("queue_capacity", &self.queue_capacity)
            .field("duplicate_policy", &self.duplicate_policy)
            .field("cancel", &self.cancel)
            .field("on_item_done", &self.on_item_done.is_some())
            .finish()
    }
}

/// Full options (CLI). Built from defaults, `.fanpipe.toml`, environment, then flags.
#[derive(Clone, Debug)]
pub struct Opts {
    pub dir: PathBuf,
    /// When None, derived from available threads and the FD limit.
    pub worker_count: Option<usize>,
    pub queue_capacity: usize,
    /// Field whose value becomes the record key (case-insensitive, dotted for nested fields).
    pub key_field: String,
    /// File extensions to pick up from `dir` (without dot). Empty means every file.
    pub extensions: Vec<String>,
    /// Exclude patterns (glob syntax) applied to file names and relative paths.
    pub exclude: Vec<String>,
    pub follow_links: bool,
    pub format: PayloadFormat,
    pub duplicate_policy: DuplicatePolicy,
    /// Write the collection here as JSON. When None, print to stdout.
    pub output: Option<PathBuf>,
    /// Cancel the run when this file appears.
    pub stop_file: Option<PathBuf>,
    pub verbose: bool,
}

impl Default for Opts {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
            worker_count: None,
            queue_capacity: PipelineDefaults::QUEUE_CAPACITY,
            key_field: PipelineDefaults::KEY_FIELD.to_string(),
            extensions: Vec::new(),
            exclude: Vec::new(),
            follow_links: false,
            format: PayloadFormat::default(),
            duplicate_policy: DuplicatePolicy::default(),
            output: None,
            stop_file: None,
            verbose: false,
        }
    }
}

/// One piece of work that was reported and skipped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SkippedWork {
    /// The whole item: its payload could not be fetched.
    Item { item: WorkItem, reason: String },
    /// One fragment of an item's payload could not be decoded.
    Fragment {
        item: WorkItem,
        fragment: usize,
        offset: Option<usize>,
        reason: String,
    },
}

impl SkippedWork {
    pub fn item(&self) -> &WorkItem {
        match self {
            SkippedWork::Item { item, .. } | SkippedWork::Fragment { item, .. } => item,
        }
    }
}

impl fmt::Display for SkippedWork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkippedWork::Item { item, reason } => write!(f, "{item}: {reason}"),
            SkippedWork::Fragment {
                item,
                fragment,
                offset: Some(offset),
                reason,
            } => write!(f, "{item} fragment {fragment} (byte {offset}): {reason}"),
            SkippedWork::Fragment {
                item,
                fragment,
                offset: None,
                reason,
            } => write!(f, "{item} fragment {fragment}: {reason}"),
        }
    }
}

/// Counts and skipped work for one run.
#[derive(Clone, Debug, Default)]
pub struct RunReport {
    pub items_total: usize,
    /// Items pushed onto the work queue (less than total only when cancelled).
    pub items_dispatched: usize,
    /// Items a worker tried to fetch.
    pub items_attempted: usize,
    pub fetch_failures: usize,
    pub decode_failures: usize,
    /// Items whose processing panicked; reported and skipped like a fetch failure.
    pub panicked_items: usize,
    /// Records received by the aggregator.
    pub records_produced: usize,
    /// Records whose key was already present in the collection.
    pub duplicate_keys: usize,
    pub skipped: Vec<SkippedWork>,
    /// The cancel token was raised during the run.
    pub cancelled: bool,
}

impl RunReport {
    /// True when every listed item was attempted. False means the run was truncated.
    pub fn is_complete(&self) -> bool {
        self.items_attempted == self.items_total
    }
}

/// Result of a run: the finished collection plus its report.
#[derive(Debug)]
pub struct PipelineOutput {
    pub collection: ResultCollection,
    pub report: RunReport,
}
