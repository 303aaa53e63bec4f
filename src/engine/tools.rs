//! Payload flattening and path/filter utilities

use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Flatten a JSON object into lowercase dotted names. Nested objects recurse
/// (`{"a":{"B":1}}` → `a.b = "1"`); strings lose their quotes; other values keep their JSON text.
pub fn flatten_object(obj: &Map<String, Value>) -> BTreeMap<String, String> {
    let mut out = BTreeMap::new();
    flatten_into(&mut out, None, obj);
    out
}

fn flatten_into(
    out: &mut BTreeMap<String, String>,
    prefix: Option<&str>,
    obj: &Map<String, Value>,
) {
    for (k, v) in obj {
        let name = match prefix {
            Some(p) => format!("{p}.{}", k.to_lowercase()),
            None => k.to_lowercase(),
        };
        match v {
            Value::Object(inner) => flatten_into(out, Some(&name), inner),
            other => {
                out.insert(name, value_text(other));
            }
        }
    }
}

/// Text of a scalar: strings unquoted, everything else as JSON.
pub fn value_text(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Normalize a relative path into a work item id (forward slashes on every platform).
pub fn path_to_item_string(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// `path` relative to the canonical `root`, or None when it lies outside it.
/// A path that does not exist yet is resolved through its parent directory.
pub fn relative_under(root: &Path, path: &Path) -> Option<PathBuf> {
    let resolved = match path.canonicalize() {
        Ok(p) => p,
        Err(_) => {
            let name = path.file_name()?;
            let parent = match path.parent() {
                Some(p) if !p.as_os_str().is_empty() => p,
                _ => Path::new("."),
            };
            parent.canonicalize().ok()?.join(name)
        }
    };
    resolved.strip_prefix(root).ok().map(Path::to_path_buf)
}

/// Check if a file should be excluded based on OS-specific hidden files
pub fn is_os_hidden_file(path: &Path) -> bool {
    if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
        match name {
            // macOS
            ".DS_Store" | ".AppleDouble" | ".LSOverride" => true,
            // Windows
            "Thumbs.db" | "ehthumbs.db" | "Desktop.ini" => true,
            // Linux
            ".directory" => true,
            // macOS resource forks
            _ => name.starts_with("._"),
        }
    } else {
        false
    }
}

/// True if `ext` is empty or the file's extension is in it (case-insensitive, no dot).
pub fn has_wanted_extension(path: &Path, ext: &[String]) -> bool {
    if ext.is_empty() {
        return true;
    }
    match path.extension().and_then(|e| e.to_str()) {
        Some(e) => ext
            .iter()
            .any(|w| w.trim_start_matches('.').eq_ignore_ascii_case(e)),
        None => false,
    }
}

/// True if the file name or the relative path matches any exclude pattern.
pub fn is_excluded(rel: &Path, exclude_patterns: &[String]) -> bool {
    if exclude_patterns.is_empty() {
        return false;
    }
    let name = rel.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let rel_str = path_to_item_string(rel);
    exclude_patterns
        .iter()
        .any(|p| glob_match(p, name) || glob_match(p, &rel_str))
}

/// Simple glob pattern matching (supports * and ?)
pub fn glob_match(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();
    glob_match_chars(&pattern, &text)
}

fn glob_match_chars(pattern: &[char], text: &[char]) -> bool {
    match pattern.split_first() {
        None => text.is_empty(),
        Some(('*', rest)) => {
            if rest.is_empty() {
                return true; // trailing * matches everything
            }
            (0..=text.len()).any(|i| glob_match_chars(rest, &text[i..]))
        }
        Some(('?', rest)) => !text.is_empty() && glob_match_chars(rest, &text[1..]),
        Some((c, rest)) => text.first() == Some(c) && glob_match_chars(rest, &text[1..]),
    }
}
