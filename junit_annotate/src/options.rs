use std::path::PathBuf;

use crate::path_resolver::default_exclude_sources;
use crate::transformer::Transformer;

/// Everything the parsing core consults while turning reports into results.
#[derive(Debug, Clone)]
pub struct ParseOptions {
    pub include_passed: bool,
    pub annotate_notice: bool,
    pub check_retries: bool,
    pub exclude_sources: Vec<String>,
    pub check_title_template: Option<String>,
    pub bread_crumb_delimiter: String,
    pub test_files_prefix: String,
    pub transformers: Vec<Transformer>,
    pub follow_symlink: bool,
    /// `None` means unbounded.
    pub annotations_limit: Option<usize>,
    pub truncate_stack_traces: bool,
    pub fail_on_parse_error: bool,
    pub resolve_ignore_classname: bool,
    /// Root for source path lookups; resolved paths are made relative to it.
    pub workspace: PathBuf,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            include_passed: false,
            annotate_notice: false,
            check_retries: false,
            exclude_sources: default_exclude_sources(),
            check_title_template: None,
            bread_crumb_delimiter: "/".to_string(),
            test_files_prefix: String::new(),
            transformers: vec![],
            follow_symlink: false,
            annotations_limit: None,
            truncate_stack_traces: true,
            fail_on_parse_error: false,
            resolve_ignore_classname: false,
            workspace: PathBuf::from("."),
        }
    }
}

/// Maps the configuration convention (`-1` = unbounded) onto an optional limit.
pub fn annotations_limit_from(raw: i64) -> Option<usize> {
    usize::try_from(raw).ok()
}
