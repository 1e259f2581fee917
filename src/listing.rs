use std::fs;
use std::io;
use std::path::Path;

use chrono::Local;

use crate::error::ServeError;

/// Dark stylesheet embedded in every listing page. Opaque styling data,
/// kept as-is.
const DARK_THEME: &str = r#"
:root {
    --bg: #121212;
    --text: #e0e0e0;
    --accent: #bb86fc;
    --border: #333;
}
body {
    font-family: 'Segoe UI', sans-serif;
    background: var(--bg);
    color: var(--text);
    margin: 0;
    padding: 20px;
    line-height: 1.6;
}
a {
    color: var(--accent);
    text-decoration: none;
}
a:hover {
    text-decoration: underline;
}
.container {
    max-width: 800px;
    margin: 0 auto;
    background: #1e1e1e;
    border-radius: 8px;
    padding: 20px;
    box-shadow: 0 4px 6px rgba(0,0,0,0.3);
}
.header {
    display: flex;
    justify-content: space-between;
    align-items: center;
    margin-bottom: 20px;
    padding-bottom: 10px;
    border-bottom: 1px solid var(--border);
}
.file-list {
    margin: 0;
    padding: 0;
    list-style: none;
}
.file-item {
    display: flex;
    justify-content: space-between;
    padding: 8px 12px;
    margin: 4px 0;
    border-radius: 4px;
}
.file-item:hover {
    background: #333;
}
.file-size {
    color: #aaa;
    font-family: monospace;
}
"#;

/// What a listing row points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Directory,
    File,
}

/// One rendered row of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    pub display_name: String,
    pub kind: EntryKind,
    pub size_label: String,
}

impl ListingEntry {
    fn parent() -> Self {
        Self {
            display_name: "../".to_string(),
            kind: EntryKind::Directory,
            size_label: "-".to_string(),
        }
    }

    fn directory(name: &str) -> Self {
        Self {
            display_name: format!("{name}/"),
            kind: EntryKind::Directory,
            size_label: "-".to_string(),
        }
    }

    fn file(name: &str, size: u64) -> Self {
        Self {
            display_name: name.to_string(),
            kind: EntryKind::File,
            size_label: format_kib(size),
        }
    }
}

/// Kibibyte label with one decimal place; zero-byte files render "0.0 KB".
fn format_kib(bytes: u64) -> String {
    format!("{:.1} KB", bytes as f64 / 1024.0)
}

/// Render the listing for `dir` as a complete HTML document.
///
/// The scan runs on the blocking pool. Any filesystem error mid-scan fails
/// the whole render; a partial listing is never produced.
pub async fn render_directory(root: &Path, dir: &Path) -> Result<String, ServeError> {
    let root = root.to_path_buf();
    let dir = dir.to_path_buf();

    tokio::task::spawn_blocking(move || {
        let entries = scan(&root, &dir)?;
        Ok(render_html(&listing_title(&root, &dir), &entries))
    })
    .await
    .map_err(|err| ServeError::Io(io::Error::new(io::ErrorKind::Other, err.to_string())))?
}

/// Title line: the directory's path relative to the served root, prefixed
/// with a slash. The root itself is titled "/".
fn listing_title(root: &Path, dir: &Path) -> String {
    let relative = dir.strip_prefix(root).unwrap_or(dir);
    if relative.as_os_str().is_empty() {
        "Directory listing for /".to_string()
    } else {
        format!("Directory listing for /{}", relative.display())
    }
}

/// Snapshot the immediate children of `dir` in one pass, sorted by raw name
/// (case-sensitive), with the parent link prepended for non-root listings.
fn scan(root: &Path, dir: &Path) -> Result<Vec<ListingEntry>, ServeError> {
    let render_err = |err: io::Error| ServeError::Render {
        path: dir.display().to_string(),
        source: err,
    };

    let mut children = Vec::new();
    for entry in fs::read_dir(dir).map_err(render_err)? {
        let entry = entry.map_err(render_err)?;
        let name = entry.file_name().to_string_lossy().into_owned();
        // Follows symlinks, matching how targets are classified; a dead
        // link fails the listing rather than rendering a bogus row.
        let metadata = fs::metadata(entry.path()).map_err(render_err)?;
        children.push((name, metadata));
    }
    children.sort_by(|a, b| a.0.cmp(&b.0));

    let mut entries = Vec::with_capacity(children.len() + 1);
    if dir != root {
        entries.push(ListingEntry::parent());
    }
    for (name, metadata) in children {
        if metadata.is_dir() {
            entries.push(ListingEntry::directory(&name));
        } else {
            entries.push(ListingEntry::file(&name, metadata.len()));
        }
    }
    Ok(entries)
}

fn render_html(title: &str, entries: &[ListingEntry]) -> String {
    let items = entries
        .iter()
        .map(|entry| {
            let name = escape_html(&entry.display_name);
            let size = &entry.size_label;
            format!(
                "<li class=\"file-item\"><a href=\"{name}\">{name}</a><span class=\"file-size\">{size}</span></li>"
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let title = escape_html(title);
    let timestamp = Local::now().format("%a %b %e %H:%M:%S %Y");

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <title>{title}</title>
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <style>{DARK_THEME}</style>
</head>
<body>
    <div class="container">
        <div class="header">
            <h1>{title}</h1>
            <small>{timestamp}</small>
        </div>
        <ul class="file-list">
            {items}
        </ul>
    </div>
</body>
</html>"#
    )
}

/// Minimal HTML escaping for names that land in attribute and text position.
fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}
