use std::path::Path;

use crate::path_resolver::{PathResolver, default_exclude_sources};

fn write_file(root: &Path, rel: &str) {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, "// source\n").unwrap();
}

fn workspace_with(files: &[&str]) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    for file in files {
        write_file(dir.path(), file);
    }
    dir
}

#[test]
fn finds_java_and_kotlin_sources_by_class_name() {
    let dir = workspace_with(&[
        "tests/email/src/test/java/action/surefire/report/email/EmailAddressTest.java",
        "tests/utils/src/test/java/action/surefire/report/calc/CalcUtilsTest.kt",
    ]);
    let mut resolver = PathResolver::new(dir.path(), default_exclude_sources(), false);
    assert_eq!(
        resolver.resolve("EmailAddressTest"),
        "tests/email/src/test/java/action/surefire/report/email/EmailAddressTest.java"
    );
    assert_eq!(
        resolver.resolve("CalcUtilsTest"),
        "tests/utils/src/test/java/action/surefire/report/calc/CalcUtilsTest.kt"
    );
}

#[test]
fn skips_matches_in_excluded_directories() {
    let dir = workspace_with(&[
        "a/build/generated/StringUtilsTest.java",
        "b/src/test/StringUtilsTest.java",
    ]);
    let mut resolver = PathResolver::new(dir.path(), default_exclude_sources(), false);
    assert_eq!(resolver.resolve("StringUtilsTest"), "b/src/test/StringUtilsTest.java");
}

#[test]
fn unresolvable_candidate_is_returned_normalized() {
    let dir = workspace_with(&["src/lib.rs"]);
    let mut resolver = PathResolver::new(dir.path(), vec![], false);
    assert_eq!(resolver.resolve("./NoSuchTest"), "NoSuchTest");
    assert_eq!(resolver.resolve(""), "");
}

#[test]
fn existing_relative_path_is_kept() {
    let dir = workspace_with(&["tests/project/manifest_secrets.rs"]);
    let mut resolver = PathResolver::new(dir.path(), default_exclude_sources(), false);
    assert_eq!(
        resolver.resolve("tests/project/manifest_secrets.rs"),
        "tests/project/manifest_secrets.rs"
    );
}

#[test]
fn absolute_paths_under_the_workspace_become_relative() {
    let dir = workspace_with(&["pkg/test_sample.py"]);
    let mut resolver = PathResolver::new(dir.path(), default_exclude_sources(), false);
    let absolute = resolver.workspace().join("pkg/test_sample.py");
    assert_eq!(
        resolver.resolve(&absolute.to_string_lossy()),
        "pkg/test_sample.py"
    );
}

#[test]
fn lookups_are_cached_per_candidate() {
    let dir = workspace_with(&["src/FooTest.java"]);
    let mut resolver = PathResolver::new(dir.path(), default_exclude_sources(), false);
    assert_eq!(resolver.resolve("FooTest"), "src/FooTest.java");
    assert_eq!(resolver.cached_len(), 1);

    std::fs::remove_file(dir.path().join("src/FooTest.java")).unwrap();
    assert_eq!(resolver.resolve("FooTest"), "src/FooTest.java");
    assert_eq!(resolver.cached_len(), 1);

    let mut fresh = PathResolver::new(dir.path(), default_exclude_sources(), false);
    assert_eq!(fresh.resolve("FooTest"), "FooTest");
}

#[test]
fn strip_workspace_removes_the_root_prefix() {
    let dir = workspace_with(&[]);
    let resolver = PathResolver::new(dir.path(), vec![], false);
    let inside = format!("{}/x/y.rs", path_slash::PathExt::to_slash_lossy(resolver.workspace()));
    assert_eq!(resolver.strip_workspace(&inside), "x/y.rs");
    assert_eq!(resolver.strip_workspace("other/y.rs"), "other/y.rs");
}
