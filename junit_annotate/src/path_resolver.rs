use std::collections::HashMap;
use std::path::{Path, PathBuf};

use globset::{GlobBuilder, GlobMatcher};
use ignore::WalkBuilder;
use path_slash::PathExt;
use tracing::{debug, warn};

pub fn default_exclude_sources() -> Vec<String> {
    vec!["/build/".to_string(), "/__pycache__/".to_string()]
}

/// Maps bare file or class names (`CalcUtilsTest`, `tests/foo.rs`) to
/// workspace-relative paths.
///
/// One resolver belongs to one parsing run; lookups are memoized for the
/// lifetime of the resolver since the same class is usually named by many
/// test cases.
#[derive(Debug)]
pub struct PathResolver {
    workspace: PathBuf,
    workspace_prefix: String,
    exclude_sources: Vec<String>,
    follow_symlinks: bool,
    cache: HashMap<String, String>,
}

impl PathResolver {
    pub fn new(workspace: &Path, exclude_sources: Vec<String>, follow_symlinks: bool) -> Self {
        let workspace = dunce::canonicalize(workspace).unwrap_or_else(|_| workspace.to_path_buf());
        let mut workspace_prefix = workspace.to_slash_lossy().to_string();
        if !workspace_prefix.ends_with('/') {
            workspace_prefix.push('/');
        }
        Self {
            workspace,
            workspace_prefix,
            exclude_sources,
            follow_symlinks,
            cache: HashMap::new(),
        }
    }

    pub fn workspace(&self) -> &Path {
        &self.workspace
    }

    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }

    /// Never fails: the normalized candidate is returned when nothing matches.
    pub fn resolve(&mut self, candidate: &str) -> String {
        if let Some(hit) = self.cache.get(candidate) {
            return hit.clone();
        }
        debug!("Resolving path for {candidate}");
        let resolved = self.resolve_uncached(candidate);
        self.cache.insert(candidate.to_string(), resolved.clone());
        resolved
    }

    /// Removes the workspace prefix from an already resolved path.
    pub fn strip_workspace(&self, path: &str) -> String {
        path.strip_prefix(&self.workspace_prefix)
            .unwrap_or(path)
            .to_string()
    }

    fn resolve_uncached(&self, candidate: &str) -> String {
        let normalized = self.normalize_candidate(candidate);
        if normalized.is_empty() {
            return normalized;
        }
        if self.workspace.join(&normalized).is_file() {
            return normalized;
        }
        self.search(&normalized).unwrap_or(normalized)
    }

    fn normalize_candidate(&self, candidate: &str) -> String {
        let slashed = candidate.trim().replace('\\', "/");
        let relative = match Path::new(&slashed) {
            abs if abs.is_absolute() && abs.starts_with(&self.workspace) => {
                pathdiff::diff_paths(abs, &self.workspace)
                    .map(|p| p.to_slash_lossy().to_string())
                    .unwrap_or_else(|| self.strip_workspace(&slashed))
            }
            _ => self.strip_workspace(&slashed),
        };
        relative
            .strip_prefix("./")
            .unwrap_or(&relative)
            .to_string()
    }

    fn search(&self, normalized: &str) -> Option<String> {
        let matcher = candidate_matcher(normalized)?;
        let walker = WalkBuilder::new(&self.workspace)
            .standard_filters(false)
            .hidden(false)
            .follow_links(self.follow_symlinks)
            .sort_by_file_name(|a, b| a.cmp(b))
            .filter_entry(|entry| entry.file_name() != ".git")
            .build();

        for entry in walker.filter_map(Result::ok) {
            if !entry.file_type().is_some_and(|t| t.is_file()) {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(&self.workspace) else {
                continue;
            };
            let relative = relative.to_slash_lossy().to_string();
            if !matcher.is_match(&relative) {
                continue;
            }
            let absolute = entry.path().to_slash_lossy().to_string();
            debug!("Matched file: {absolute}");
            if self
                .exclude_sources
                .iter()
                .any(|excluded| absolute.contains(excluded.as_str()))
            {
                continue;
            }
            debug!("Resolved path: {relative}");
            return Some(relative);
        }
        None
    }
}

/// `**/<candidate>.*` with the candidate taken literally.
fn candidate_matcher(normalized: &str) -> Option<GlobMatcher> {
    let pattern = format!("**/{}.*", escape_glob(normalized));
    match GlobBuilder::new(&pattern).literal_separator(true).build() {
        Ok(glob) => Some(glob.compile_matcher()),
        Err(err) => {
            warn!("Cannot search for {normalized}: {err}");
            None
        }
    }
}

fn escape_glob(raw: &str) -> String {
    raw.chars()
        .map(|c| match c {
            '*' | '?' | '[' | ']' | '{' | '}' => format!("[{c}]"),
            _ => c.to_string(),
        })
        .collect()
}
