//! Work source and fetcher tests against real temp directories.

mod common;

use common::{TempDir, line, ndjson};
use fanpipe::engine::{relative_under, run_owned_paths};
use fanpipe::{
    DirSource, FetchError, FsFetcher, ItemFetcher, NdjsonDecoder, Opts, PipelineOpts,
    PipelineRunner, StaticSource, WorkItem, WorkSource,
};
use std::path::PathBuf;

fn ids(items: &[WorkItem]) -> Vec<&str> {
    items.iter().map(WorkItem::as_str).collect()
}

#[test]
fn test_dir_source_lists_relative_forward_slashed_files() {
    let dir = TempDir::new("list");
    dir.write("b.json", b"{}");
    dir.write("a.json", b"{}");
    dir.write("nested/deeper/c.json", b"{}");

    let items = DirSource::new(dir.path()).list().unwrap();
    assert_eq!(ids(&items), vec!["a.json", "b.json", "nested/deeper/c.json"]);
}

#[test]
fn test_dir_source_skips_os_hidden_files() {
    let dir = TempDir::new("hidden");
    dir.write(".DS_Store", b"junk");
    dir.write("Thumbs.db", b"junk");
    dir.write("._resource", b"junk");
    dir.write("data.json", b"{}");

    let items = DirSource::new(dir.path()).list().unwrap();
    assert_eq!(ids(&items), vec!["data.json"]);
}

#[test]
fn test_dir_source_extension_filter() {
    let dir = TempDir::new("ext");
    dir.write("keep.json", b"{}");
    dir.write("keep.NDJSON", b"{}");
    dir.write("drop.txt", b"{}");
    dir.write("no_extension", b"{}");

    let items = DirSource::new(dir.path())
        .extensions(vec!["json".to_string(), ".ndjson".to_string()])
        .list()
        .unwrap();
    assert_eq!(ids(&items), vec!["keep.NDJSON", "keep.json"]);
}

#[test]
fn test_dir_source_exclude_patterns() {
    let dir = TempDir::new("exclude");
    dir.write("keep.json", b"{}");
    dir.write("skip.tmp", b"{}");
    dir.write("archive/old.json", b"{}");

    let items = DirSource::new(dir.path())
        .exclude(vec!["*.tmp".to_string(), "archive/*".to_string()])
        .list()
        .unwrap();
    assert_eq!(ids(&items), vec!["keep.json"]);
}

#[test]
fn test_dir_source_empty_directory() {
    let dir = TempDir::new("empty");
    assert!(DirSource::new(dir.path()).list().unwrap().is_empty());
}

#[test]
fn test_dir_source_missing_root_fails() {
    let dir = TempDir::new("missing");
    let err = DirSource::new(dir.path().join("nope")).list().unwrap_err();
    assert!(err.to_string().contains("read source directory"));
}

#[test]
fn test_dir_source_file_root_fails() {
    let dir = TempDir::new("fileroot");
    let file = dir.write("single.json", b"{}");
    let err = DirSource::new(&file).list().unwrap_err();
    assert!(err.to_string().contains("not a directory"));
}

#[test]
fn test_fs_fetcher_reads_relative_item() {
    let dir = TempDir::new("fetch");
    dir.write("sub/payload.ndjson", b"hello");
    let fetcher = FsFetcher::new(dir.path());
    let bytes = fetcher.fetch(&WorkItem::from("sub/payload.ndjson")).unwrap();
    assert_eq!(bytes, b"hello");
}

#[test]
fn test_fs_fetcher_missing_file_is_not_found() {
    let dir = TempDir::new("fetch-missing");
    let fetcher = FsFetcher::new(dir.path());
    let err = fetcher.fetch(&WorkItem::from("absent.json")).unwrap_err();
    match err {
        FetchError::NotFound(item) => assert_eq!(item.as_str(), "absent.json"),
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[test]
fn test_fs_fetcher_directory_is_io_error() {
    let dir = TempDir::new("fetch-dir");
    dir.write("inner/file.json", b"{}");
    let fetcher = FsFetcher::new(dir.path());
    let err = fetcher.fetch(&WorkItem::from("inner")).unwrap_err();
    assert!(matches!(err, FetchError::Io { .. }));
    assert!(err.to_string().starts_with("reading inner"));
}

#[test]
fn test_static_source_returns_items_in_order() {
    let source = StaticSource(vec![WorkItem::from("z"), WorkItem::from("a")]);
    assert_eq!(ids(&source.list().unwrap()), vec!["z", "a"]);
}

#[test]
fn test_directory_run_end_to_end() {
    let dir = TempDir::new("e2e");
    dir.write("one.ndjson", &ndjson(&[line("k1", "a"), line("k2", "a")]));
    dir.write("two/two.ndjson", &ndjson(&[line("k3", "b")]));
    dir.write("notes.txt", b"ignored by extension filter");

    let source = DirSource::new(dir.path()).extensions(vec!["ndjson".to_string()]);
    let runner = PipelineRunner::new(
        FsFetcher::new(dir.path()),
        NdjsonDecoder::default(),
        PipelineOpts {
            worker_count: 2,
            ..PipelineOpts::default()
        },
    );
    let out = runner.run_source(&source).unwrap();
    assert_eq!(out.report.items_total, 2);
    assert_eq!(out.collection.len(), 3);
    assert_eq!(out.collection["k3"].attribute("value"), Some("b"));
}

// --- files the run owns ---

#[test]
fn test_dir_source_skip_paths() {
    let dir = TempDir::new("skip");
    dir.write("a.ndjson", b"{}");
    dir.write("out/result.json", b"{}");
    dir.write("keep/result.json", b"{}");

    let items = DirSource::new(dir.path())
        .skip_paths(vec![PathBuf::from("out/result.json")])
        .list()
        .unwrap();
    assert_eq!(ids(&items), vec!["a.ndjson", "keep/result.json"]);
}

#[test]
fn test_config_output_and_stop_file_are_not_work_items() {
    let dir = TempDir::new("owned");
    dir.write("a.ndjson", &ndjson(&[line("k1", "a")]));
    dir.write(
        ".fanpipe.toml",
        b"[settings]\nworkers = 2\nformat = \"ndjson\"\n",
    );
    dir.write("out.json", b"{\n  \"k1\": {}\n}\n");
    dir.write("STOP", b"");

    let opts = Opts {
        dir: dir.path().to_path_buf(),
        output: Some(dir.path().join("out.json")),
        stop_file: Some(dir.path().join("STOP")),
        ..Opts::default()
    };
    let owned = run_owned_paths(&opts);
    assert!(owned.contains(&PathBuf::from(".fanpipe.toml")));
    assert!(owned.contains(&PathBuf::from("out.json")));
    assert!(owned.contains(&PathBuf::from("STOP")));

    let source = DirSource::new(dir.path()).skip_paths(owned);
    assert_eq!(ids(&source.list().unwrap()), vec!["a.ndjson"]);

    let runner = PipelineRunner::new(
        FsFetcher::new(dir.path()),
        NdjsonDecoder::default(),
        PipelineOpts::default(),
    );
    let out = runner.run_source(&source).unwrap();
    assert_eq!(out.report.decode_failures, 0);
    assert!(out.report.skipped.is_empty());
    assert_eq!(out.collection.len(), 1);
}

#[test]
fn test_output_outside_dir_is_not_skipped() {
    let dir = TempDir::new("owned-in");
    let elsewhere = TempDir::new("owned-out");
    let opts = Opts {
        dir: dir.path().to_path_buf(),
        output: Some(elsewhere.path().join("out.json")),
        ..Opts::default()
    };
    assert_eq!(run_owned_paths(&opts), vec![PathBuf::from(".fanpipe.toml")]);
}

#[test]
fn test_relative_under_resolves_missing_files_through_parent() {
    let dir = TempDir::new("relative");
    dir.write("sub/existing.json", b"{}");
    let root = dir.path().canonicalize().unwrap();

    assert_eq!(
        relative_under(&root, &dir.path().join("sub/existing.json")),
        Some(PathBuf::from("sub/existing.json"))
    );
    assert_eq!(
        relative_under(&root, &dir.path().join("sub/not-yet.json")),
        Some(PathBuf::from("sub/not-yet.json"))
    );
    assert_eq!(relative_under(&root, &std::env::temp_dir()), None);
}
