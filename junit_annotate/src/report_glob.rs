use std::path::{Path, PathBuf};

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use indexmap::IndexSet;
use path_slash::PathExt;
use tracing::{debug, warn};

/// Newline separated include patterns, where `!pattern` lines exclude.
#[derive(Debug, Clone, Default)]
pub struct ReportGlob {
    includes: Vec<String>,
    excludes: Vec<String>,
}

impl ReportGlob {
    /// Relative patterns are anchored at `base_dir`.
    pub fn parse(raw: &str, base_dir: &Path) -> Self {
        let mut glob = Self::default();
        for line in raw.lines().map(str::trim).filter(|l| !l.is_empty() && !l.starts_with('#')) {
            match line.strip_prefix('!') {
                Some(excluded) => glob.excludes.push(anchor(excluded.trim(), base_dir)),
                None => glob.includes.push(anchor(line, base_dir)),
            }
        }
        glob
    }

    pub fn is_empty(&self) -> bool {
        self.includes.is_empty()
    }

    /// Matching files in walk order; a file matched by several patterns is listed once.
    pub fn resolve(&self, follow_symlinks: bool) -> Vec<PathBuf> {
        let excludes = build_set(&self.excludes);
        let mut found: IndexSet<PathBuf> = IndexSet::new();
        for pattern in &self.includes {
            let root = walk_root(pattern);
            if root.is_file() {
                let slashed = root.to_slash_lossy().to_string();
                if !excludes.as_ref().is_some_and(|set| set.is_match(&slashed)) {
                    found.insert(root);
                }
                continue;
            }
            // A plain directory stands for everything below it.
            let pattern = if root.to_slash_lossy() == pattern.trim_end_matches('/') {
                format!("{}/**", pattern.trim_end_matches('/'))
            } else {
                pattern.clone()
            };
            let Some(include) = build_set(std::slice::from_ref(&pattern)) else {
                continue;
            };
            debug!("Searching {} for {pattern}", root.display());
            let walker = WalkBuilder::new(&root)
                .standard_filters(false)
                .hidden(false)
                .follow_links(follow_symlinks)
                .sort_by_file_name(|a, b| a.cmp(b))
                .build();
            for entry in walker.filter_map(Result::ok) {
                if !entry.file_type().is_some_and(|t| t.is_file()) {
                    continue;
                }
                let slashed = entry.path().to_slash_lossy().to_string();
                if !include.is_match(&slashed) {
                    continue;
                }
                if excludes.as_ref().is_some_and(|set| set.is_match(&slashed)) {
                    continue;
                }
                found.insert(entry.into_path());
            }
        }
        found.into_iter().collect()
    }
}

fn anchor(pattern: &str, base_dir: &Path) -> String {
    let pattern = pattern.replace('\\', "/");
    let pattern = pattern.strip_prefix("./").unwrap_or(&pattern);
    if Path::new(pattern).is_absolute() {
        return pattern.to_string();
    }
    let mut base = base_dir.to_slash_lossy().to_string();
    if !base.ends_with('/') {
        base.push('/');
    }
    format!("{base}{pattern}")
}

fn build_set(patterns: &[String]) -> Option<GlobSet> {
    if patterns.is_empty() {
        return None;
    }
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        // `*` stays within one directory, `**` crosses them.
        match GlobBuilder::new(pattern).literal_separator(true).build() {
            Ok(glob) => {
                builder.add(glob);
            }
            Err(err) => warn!("Ignoring report pattern {pattern}: {err}"),
        }
    }
    builder.build().ok()
}

/// The longest leading run of components without glob syntax.
fn walk_root(pattern: &str) -> PathBuf {
    let literal: Vec<&str> = pattern
        .split('/')
        .take_while(|component| !component.contains(['*', '?', '[', '{']))
        .collect();
    let joined = literal.join("/");
    if joined.is_empty() {
        PathBuf::from("/")
    } else {
        PathBuf::from(joined)
    }
}
