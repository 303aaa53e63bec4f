//! Load `.fanpipe.toml` from the scanned directory, then environment overrides (CLI only).
//! Lib callers pass [`PipelineOpts`](crate::PipelineOpts) directly.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::types::{DuplicatePolicy, Opts, PayloadFormat};

use super::config::PackagePaths;

#[derive(Debug, Deserialize)]
pub struct FanpipeToml {
    #[serde(default)]
    settings: RunSection,
}

#[derive(Debug, Default, Deserialize)]
struct RunSection {
    workers: Option<usize>,
    queue_capacity: Option<usize>,
    key_field: Option<String>,
    extensions: Option<Vec<String>>,
    exclude: Option<Vec<String>>,
    follow_links: Option<bool>,
    format: Option<PayloadFormat>,
    on_duplicate: Option<DuplicatePolicy>,
    output: Option<String>,
    stop_file: Option<String>,
    verbose: Option<bool>,
}

/// Load the config file from `dir`. `Ok(None)` when there is no file; `Err` when it does not parse.
pub fn load_fanpipe_toml(dir: &Path) -> Result<Option<FanpipeToml>> {
    let path = dir.join(PackagePaths::get().config_filename());
    let Ok(s) = std::fs::read_to_string(&path) else {
        return Ok(None);
    };
    let file = toml::from_str(&s).with_context(|| format!("parse {}", path.display()))?;
    Ok(Some(file))
}

impl FanpipeToml {
    pub fn verbose(&self) -> Option<bool> {
        self.settings.verbose
    }
}

/// Overwrite opts field from file when present.
macro_rules! apply_file_opt {
    ($sec:expr, $opts:expr, $sec_field:ident => $opts_field:ident) => {
        if let Some(v) = $sec.$sec_field.clone() {
            $opts.$opts_field = v;
        }
    };
}

/// Apply file config to opts (only fields present in the file). Call before env and CLI.
pub fn apply_file_to_opts(file: &FanpipeToml, opts: &mut Opts) {
    let sec = &file.settings;
    if let Some(n) = sec.workers {
        opts.worker_count = Some(n);
    }
    apply_file_opt!(sec, opts, queue_capacity => queue_capacity);
    apply_file_opt!(sec, opts, key_field => key_field);
    apply_file_opt!(sec, opts, extensions => extensions);
    apply_file_opt!(sec, opts, exclude => exclude);
    apply_file_opt!(sec, opts, follow_links => follow_links);
    apply_file_opt!(sec, opts, format => format);
    apply_file_opt!(sec, opts, on_duplicate => duplicate_policy);
    apply_file_opt!(sec, opts, verbose => verbose);
    if let Some(ref p) = sec.output {
        opts.output = Some(PathBuf::from(p));
    }
    if let Some(ref p) = sec.stop_file {
        opts.stop_file = Some(PathBuf::from(p));
    }
}

/// Apply `FANPIPE_WORKERS` / `FANPIPE_QUEUE_CAP` (process env or `.env`). Unparseable values are logged and ignored.
pub fn apply_env_to_opts(opts: &mut Opts) {
    let _ = dotenvy::dotenv();
    let paths = PackagePaths::get();
    if let Some(n) = env_usize(&paths.env_var("WORKERS")) {
        opts.worker_count = Some(n);
    }
    if let Some(n) = env_usize(&paths.env_var("QUEUE_CAP")) {
        opts.queue_capacity = n;
    }
}

fn env_usize(name: &str) -> Option<usize> {
    let raw = std::env::var(name).ok()?;
    raw.trim()
        .parse()
        .map_err(|e| log::warn!("ignoring {}={:?}: {}", name, raw, e))
        .ok()
}
