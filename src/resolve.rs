use std::path::{Component, Path, PathBuf};

use tracing::warn;

/// Classification of a request path against the served tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedTarget {
    /// Nothing served at this location. Escaping paths land here too, so a
    /// probe cannot distinguish "blocked" from "absent".
    Missing,
    Directory(PathBuf),
    File(PathBuf),
}

/// Resolve a raw request path to a filesystem location under `root`.
///
/// The raw path is percent-decoded, then rebuilt component-by-component:
/// parent references, rooted components, and embedded NUL bytes never reach
/// the filesystem. Existing paths are canonicalized and must remain under
/// the canonical root, which also catches symlink escapes.
pub fn resolve_request_path(root: &Path, raw: &str) -> ResolvedTarget {
    let decoded = match urlencoding::decode(raw) {
        Ok(decoded) => decoded,
        Err(_) => return ResolvedTarget::Missing,
    };
    match build_candidate(root, &decoded) {
        Some(candidate) => classify(root, &candidate),
        None => ResolvedTarget::Missing,
    }
}

/// Join the request path onto `root` without touching the filesystem.
fn build_candidate(root: &Path, request_path: &str) -> Option<PathBuf> {
    let relative = request_path.trim_start_matches('/');

    if relative.is_empty() || relative == "." {
        return Some(root.to_path_buf());
    }

    let mut result = root.to_path_buf();
    for component in Path::new(relative).components() {
        match component {
            Component::Normal(name) => {
                if name.to_string_lossy().contains('\0') {
                    warn!("path component contains a NUL byte");
                    return None;
                }
                result.push(name);
            }
            Component::CurDir => continue,
            Component::ParentDir => {
                warn!("parent directory reference in request path");
                return None;
            }
            Component::RootDir | Component::Prefix(_) => {
                warn!("rooted component in request path");
                return None;
            }
        }
    }

    if !result.starts_with(root) {
        return None;
    }
    Some(result)
}

/// Stat the candidate and pin it under the canonical root.
fn classify(root: &Path, candidate: &Path) -> ResolvedTarget {
    // canonicalize fails for paths that do not exist
    let canonical = match candidate.canonicalize() {
        Ok(path) => path,
        Err(_) => return ResolvedTarget::Missing,
    };
    let canonical_root = match root.canonicalize() {
        Ok(path) => path,
        Err(_) => return ResolvedTarget::Missing,
    };
    if !canonical.starts_with(&canonical_root) {
        warn!(
            "{} resolves outside the served root, treating as absent",
            candidate.display()
        );
        return ResolvedTarget::Missing;
    }

    match std::fs::metadata(&canonical) {
        Ok(meta) if meta.is_dir() => ResolvedTarget::Directory(canonical),
        Ok(_) => ResolvedTarget::File(canonical),
        Err(_) => ResolvedTarget::Missing,
    }
}
