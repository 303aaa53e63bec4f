//! CLI command handler: list DIR, run the pipeline, write the collection as JSON.

use anyhow::{Context, Result};
use kdam::Animation;
use log::{debug, info, warn};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::engine::arg_parser::Cli;
use crate::engine::decoder::decoder_for;
use crate::engine::progress::{
    ProgressBarConfig, create_progress_bar, finish_progress_bar, item_progress_callback,
};
use crate::engine::tools::relative_under;
use crate::pipeline::{PipelineRunner, print_skipped};
use crate::source::{DirSource, FsFetcher, WorkSource};
use crate::tasks::{CancelToken, PeriodicCheck};
use crate::types::{Opts, PipelineOpts, PipelineOutput, ResultCollection};
use crate::utils::config::{PackagePaths, STOP_FILE_POLL_INTERVAL, WorkerThreadLimits};
use crate::utils::fanpipe_toml::{
    FanpipeToml, apply_env_to_opts, apply_file_to_opts, load_fanpipe_toml,
};
use crate::utils::setup_logging;

/// Overwrite opts field from CLI when the flag was given.
macro_rules! apply_cli_opt {
    ($cli:expr, $opts:expr, $cli_field:ident => $opts_field:ident) => {
        if let Some(v) = $cli.$cli_field.clone() {
            $opts.$opts_field = v;
        }
    };
}

/// Load `.fanpipe.toml` from DIR, start logging, then layer everything into [`Opts`].
fn setup_opts(cli: &Cli) -> Opts {
    let file = load_fanpipe_toml(&cli.dir);
    let file_verbose = file
        .as_ref()
        .ok()
        .and_then(Option::as_ref)
        .and_then(|f| f.verbose());
    setup_logging(cli.verbose.or(file_verbose).unwrap_or(false));
    let file = file.unwrap_or_else(|e| {
        warn!("Ignoring config file: {:#}", e);
        None
    });
    layer_opts(cli, file.as_ref())
}

/// Defaults → `file` → environment → flags.
pub fn layer_opts(cli: &Cli, file: Option<&FanpipeToml>) -> Opts {
    let mut opts = Opts {
        dir: cli.dir.clone(),
        ..Opts::default()
    };
    if let Some(file) = file {
        apply_file_to_opts(file, &mut opts);
    }
    apply_env_to_opts(&mut opts);

    if cli.workers.is_some() {
        opts.worker_count = cli.workers;
    }
    apply_cli_opt!(cli, opts, queue_capacity => queue_capacity);
    apply_cli_opt!(cli, opts, key_field => key_field);
    apply_cli_opt!(cli, opts, follow_links => follow_links);
    apply_cli_opt!(cli, opts, format => format);
    apply_cli_opt!(cli, opts, on_duplicate => duplicate_policy);
    apply_cli_opt!(cli, opts, verbose => verbose);
    if !cli.extensions.is_empty() {
        opts.extensions = cli.extensions.clone();
    }
    if !cli.exclude.is_empty() {
        opts.exclude = cli.exclude.clone();
    }
    if cli.output.is_some() {
        opts.output = cli.output.clone();
    }
    if cli.stop_file.is_some() {
        opts.stop_file = cli.stop_file.clone();
    }
    opts
}

/// Files the run itself owns under DIR, relative to DIR: the config file, plus the output and
/// stop files when they resolve inside DIR. These are never listed as work items.
pub fn run_owned_paths(opts: &Opts) -> Vec<PathBuf> {
    let mut owned = vec![PathBuf::from(PackagePaths::get().config_filename())];
    let Ok(root) = opts.dir.canonicalize() else {
        return owned;
    };
    for path in [opts.output.as_deref(), opts.stop_file.as_deref()]
        .into_iter()
        .flatten()
    {
        if let Some(rel) = relative_under(&root, path) {
            debug!("Not listing run-owned file {}", rel.display());
            owned.push(rel);
        }
    }
    owned
}

/// Start the stop-file watcher: cancels `run_cancel` when `stop_file` appears.
fn spawn_stop_file_watch(
    stop_file: &Path,
    run_cancel: &CancelToken,
    watch_stop: &CancelToken,
) -> Result<PeriodicCheck> {
    let stop_file = stop_file.to_path_buf();
    let run_cancel = run_cancel.clone();
    PeriodicCheck::spawn(STOP_FILE_POLL_INTERVAL, watch_stop.clone(), move || {
        if stop_file.exists() {
            warn!("Stop file {} found; cancelling run", stop_file.display());
            run_cancel.cancel();
            true
        } else {
            false
        }
    })
    .context("start stop-file watcher")
}

/// Write the collection as a JSON object keyed by record key, sorted for stable output.
fn write_collection(collection: &ResultCollection, output: Option<&Path>) -> Result<()> {
    let sorted: BTreeMap<&String, _> = collection.iter().collect();
    match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("create output file {}", path.display()))?;
            let mut w = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut w, &sorted).context("write collection")?;
            writeln!(w)?;
            w.flush().context("flush output file")?;
            info!("Wrote {} records to {}", collection.len(), path.display());
        }
        None => {
            let stdout = std::io::stdout();
            let mut w = stdout.lock();
            serde_json::to_writer_pretty(&mut w, &sorted).context("write collection")?;
            writeln!(w)?;
        }
    }
    Ok(())
}

/// Run the pipeline over DIR and emit the collection. A cancelled run still writes what it has,
/// then returns an error.
pub fn handle_run(cli: &Cli) -> Result<()> {
    let opts = setup_opts(cli);
    let worker_count = opts
        .worker_count
        .unwrap_or_else(|| WorkerThreadLimits::current().io_workers());
    debug!("Using {} workers", worker_count);

    let source = DirSource::new(&opts.dir)
        .extensions(opts.extensions.clone())
        .exclude(opts.exclude.clone())
        .skip_paths(run_owned_paths(&opts))
        .follow_links(opts.follow_links);
    let items = source.list()?;

    let cancel = CancelToken::new();
    let cancel_handler = cancel.clone();
    ctrlc::set_handler(move || cancel_handler.cancel()).context("set Ctrl+C handler")?;

    let watch_stop = CancelToken::new();
    let watcher = opts
        .stop_file
        .as_deref()
        .map(|p| spawn_stop_file_watch(p, &cancel, &watch_stop))
        .transpose()?;

    let bar = opts.verbose.then(|| {
        create_progress_bar(ProgressBarConfig::new(
            items.len(),
            "Fetching",
            Animation::Classic,
        ))
    });

    let runner = PipelineRunner::from_shared(
        Arc::new(FsFetcher::new(&opts.dir)),
        Arc::from(decoder_for(opts.format, &opts.key_field)),
        PipelineOpts {
            worker_count,
            queue_capacity: opts.queue_capacity,
            duplicate_policy: opts.duplicate_policy,
            cancel: Some(cancel.clone()),
            on_item_done: bar.as_ref().map(item_progress_callback),
        },
    );
    let result = runner.run(items);

    watch_stop.cancel();
    if let Some(w) = watcher {
        w.wait();
    }
    let PipelineOutput { collection, report } = result?;
    if let Some(bar) = &bar {
        finish_progress_bar(bar, report.items_attempted);
    }
    if opts.verbose {
        print_skipped(&report);
    }

    write_collection(&collection, opts.output.as_deref())?;

    if !report.is_complete() {
        anyhow::bail!(
            "Run {}: {} of {} items processed; output is partial",
            if report.cancelled { "cancelled" } else { "truncated" },
            report.items_attempted,
            report.items_total
        );
    }
    Ok(())
}
