//! Collaborator seams: where work items come from and how their payloads are fetched.

use anyhow::{Context, Result};
use log::{debug, warn};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::WorkItem;
use crate::engine::tools::{
    has_wanted_extension, is_excluded, is_os_hidden_file, path_to_item_string,
};
use crate::error::FetchError;

/// Enumerates every unit of work for one run. A failure aborts the run before dispatch.
pub trait WorkSource {
    fn list(&self) -> Result<Vec<WorkItem>>;
}

/// Retrieves the raw payload for one item. Called concurrently from every worker.
pub trait ItemFetcher: Send + Sync {
    fn fetch(&self, item: &WorkItem) -> std::result::Result<Vec<u8>, FetchError>;
}

impl<F> ItemFetcher for F
where
    F: Fn(&WorkItem) -> std::result::Result<Vec<u8>, FetchError> + Send + Sync,
{
    fn fetch(&self, item: &WorkItem) -> std::result::Result<Vec<u8>, FetchError> {
        self(item)
    }
}

/// A list that is already materialized.
#[derive(Clone, Debug, Default)]
pub struct StaticSource(pub Vec<WorkItem>);

impl WorkSource for StaticSource {
    fn list(&self) -> Result<Vec<WorkItem>> {
        Ok(self.0.clone())
    }
}

/// Files under a directory. Items are paths relative to the root, forward-slashed, in file-name order.
///
/// Entries that cannot be read are logged and skipped; only an unreadable root fails the listing.
#[derive(Clone, Debug)]
pub struct DirSource {
    root: PathBuf,
    extensions: Vec<String>,
    exclude: Vec<String>,
    skip_paths: Vec<PathBuf>,
    follow_links: bool,
}

impl DirSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            extensions: Vec::new(),
            exclude: Vec::new(),
            skip_paths: Vec::new(),
            follow_links: false,
        }
    }

    pub fn extensions(mut self, extensions: Vec<String>) -> Self {
        self.extensions = extensions;
        self
    }

    pub fn exclude(mut self, exclude: Vec<String>) -> Self {
        self.exclude = exclude;
        self
    }

    /// Exact relative paths never listed (e.g. the run's own config or output file).
    pub fn skip_paths(mut self, skip_paths: Vec<PathBuf>) -> Self {
        self.skip_paths = skip_paths;
        self
    }

    pub fn follow_links(mut self, follow_links: bool) -> Self {
        self.follow_links = follow_links;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn should_include(&self, rel: &Path) -> bool {
        !is_os_hidden_file(rel)
            && !self.skip_paths.iter().any(|p| p == rel)
            && has_wanted_extension(rel, &self.extensions)
            && !is_excluded(rel, &self.exclude)
    }
}

impl WorkSource for DirSource {
    fn list(&self) -> Result<Vec<WorkItem>> {
        let meta = std::fs::metadata(&self.root)
            .with_context(|| format!("read source directory {}", self.root.display()))?;
        if !meta.is_dir() {
            anyhow::bail!("source is not a directory: {}", self.root.display());
        }

        let mut items = Vec::new();
        for entry in WalkDir::new(&self.root)
            .follow_links(self.follow_links)
            .sort_by_file_name()
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!("Skipping unreadable path: {}", err);
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(rel) = entry.path().strip_prefix(&self.root) else {
                continue;
            };
            if self.should_include(rel) {
                items.push(WorkItem::new(path_to_item_string(rel)));
            }
        }
        debug!("listed {} items under {}", items.len(), self.root.display());
        Ok(items)
    }
}

/// Reads `root/<item>` from the local filesystem.
#[derive(Clone, Debug)]
pub struct FsFetcher {
    root: PathBuf,
}

impl FsFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ItemFetcher for FsFetcher {
    fn fetch(&self, item: &WorkItem) -> std::result::Result<Vec<u8>, FetchError> {
        let path = self.root.join(item.as_str());
        std::fs::read(&path).map_err(|source| match source.kind() {
            std::io::ErrorKind::NotFound => FetchError::NotFound(item.clone()),
            _ => FetchError::Io {
                item: item.clone(),
                source,
            },
        })
    }
}
