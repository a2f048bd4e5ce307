use std::path::{Path, PathBuf};

pub fn fixtures_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
}

/// Copies the fixture tree into a fresh temporary workspace.
///
/// Source lookups walk the whole workspace, so every test gets its own copy
/// instead of sharing the checked-in directory.
pub fn copy_fixtures() -> tempfile::TempDir {
    let dir = tempfile::tempdir().expect("create temp workspace");
    copy_tree(&fixtures_root(), dir.path());
    dir
}

fn copy_tree(from: &Path, to: &Path) {
    for entry in walkdir::WalkDir::new(from)
        .into_iter()
        .filter_map(|entry| entry.ok())
    {
        let relative = entry
            .path()
            .strip_prefix(from)
            .expect("walked entries live under the root");
        let target = to.join(relative);
        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target).expect("create fixture dir");
        } else if entry.file_type().is_file() {
            std::fs::copy(entry.path(), &target).expect("copy fixture file");
        }
    }
}
