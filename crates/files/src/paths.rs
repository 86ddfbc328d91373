//! Deploy path normalization and common-root stripping.
//!
//! When a user deploys `dist/`, the site root should be the contents of
//! `dist`, not a `dist` folder. Flattening strips the deepest directory
//! shared by every file, always on segment boundaries.

/// A rewritten upload path and its basename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptimizedPath {
    pub path: String,
    pub name: String,
}

impl OptimizedPath {
    fn new(path: String) -> Self {
        let name = basename(&path).to_string();
        Self { path, name }
    }
}

/// Converts a path to forward slashes and drops empty, `.` and leading
/// separators.
///
/// `..` segments are kept so that validation can still see and reject them.
pub fn normalize_path(path: &str) -> String {
    path.replace('\\', "/")
        .split('/')
        .filter(|seg| !seg.is_empty() && *seg != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// Normalizes a batch of paths and, with `flatten`, strips their deepest
/// common directory.
///
/// A single path is reduced to its basename: its parent is trivially the
/// common directory. Paths with no shared ancestor are returned normalized
/// but otherwise unchanged.
pub fn optimize_paths<S: AsRef<str>>(paths: &[S], flatten: bool) -> Vec<OptimizedPath> {
    let normalized: Vec<String> = paths.iter().map(|p| normalize_path(p.as_ref())).collect();

    if !flatten || normalized.is_empty() {
        return normalized.into_iter().map(OptimizedPath::new).collect();
    }

    if let [only] = normalized.as_slice() {
        return vec![OptimizedPath::new(basename(only).to_string())];
    }

    let depth = common_dir_depth(&normalized);
    if depth == 0 {
        return normalized.into_iter().map(OptimizedPath::new).collect();
    }

    normalized
        .iter()
        .map(|p| {
            let stripped = p.splitn(depth + 1, '/').nth(depth).unwrap_or(p);
            OptimizedPath::new(stripped.to_string())
        })
        .collect()
}

/// Number of leading directory segments shared by every path.
fn common_dir_depth(paths: &[String]) -> usize {
    let mut dirs = paths.iter().map(|p| {
        let mut segments: Vec<&str> = p.split('/').collect();
        segments.pop();
        segments
    });

    let Some(mut common) = dirs.next() else {
        return 0;
    };
    for segments in dirs {
        let shared = common
            .iter()
            .zip(&segments)
            .take_while(|(a, b)| a == b)
            .count();
        common.truncate(shared);
        if common.is_empty() {
            break;
        }
    }
    common.len()
}

fn basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}
