use std::path::{Path, PathBuf};

use clap::Parser;

use crate::config::{AnnotateConfig, PerCheck, TransformersConfig, retrieve};
use crate::options::{ParseOptions, annotations_limit_from};
use crate::path_resolver::default_exclude_sources;
use crate::transformer::{compile_transformers, read_transformers};

#[derive(Debug, Clone, Parser, Default)]
#[command(name = "junit-annotate", version, about = "Turns JUnit XML reports into CI annotations and summaries")]
pub struct AnnotateCli {
    /// Report glob; repeat for several checks. Newlines separate patterns, `!` excludes.
    #[arg(long = "report-paths", alias = "reportPaths")]
    pub report_paths: Vec<String>,

    #[arg(long = "check-name", alias = "checkName")]
    pub check_name: Vec<String>,

    #[arg(long = "summary")]
    pub summary: Vec<String>,

    /// Directory the source paths are resolved against (defaults to the repository root).
    #[arg(long = "workspace")]
    pub workspace: Option<PathBuf>,

    #[arg(long = "config")]
    pub config: Option<PathBuf>,

    #[arg(long = "include-passed", num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub include_passed: Option<bool>,

    #[arg(long = "include-skipped", num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub include_skipped: Option<bool>,

    #[arg(long = "annotate-notice", num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub annotate_notice: Option<bool>,

    #[arg(long = "check-retries", num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub check_retries: Option<bool>,

    #[arg(long = "exclude-sources", value_delimiter = ',')]
    pub exclude_sources: Vec<String>,

    #[arg(long = "check-title-template")]
    pub check_title_template: Option<String>,

    #[arg(long = "bread-crumb-delimiter")]
    pub bread_crumb_delimiter: Option<String>,

    #[arg(long = "test-files-prefix")]
    pub test_files_prefix: Option<String>,

    /// JSON list of `{"searchValue": .., "replaceValue": ..}` rules.
    #[arg(long = "transformers")]
    pub transformers: Option<String>,

    #[arg(long = "follow-symlink", num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub follow_symlink: Option<bool>,

    /// `-1` disables the limit.
    #[arg(long = "annotations-limit", allow_hyphen_values = true)]
    pub annotations_limit: Option<i64>,

    #[arg(long = "truncate-stack-traces", num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub truncate_stack_traces: Option<bool>,

    #[arg(long = "fail-on-parse-error", num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub fail_on_parse_error: Option<bool>,

    #[arg(long = "resolve-ignore-classname", num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub resolve_ignore_classname: Option<bool>,

    #[arg(long = "annotate-only", num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub annotate_only: Option<bool>,

    #[arg(long = "fail-on-failure", num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub fail_on_failure: Option<bool>,

    #[arg(long = "require-tests", num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub require_tests: Option<bool>,

    #[arg(long = "require-passed-tests", num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub require_passed_tests: Option<bool>,

    #[arg(long = "detailed-summary", num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub detailed_summary: Option<bool>,

    #[arg(long = "flaky-summary", num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub flaky_summary: Option<bool>,

    #[arg(long = "group-suite", num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub group_suite: Option<bool>,

    #[arg(long = "include-time-in-summary", num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub include_time_in_summary: Option<bool>,

    #[arg(long = "skip-success-summary", num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub skip_success_summary: Option<bool>,

    /// Write the check results as JSON to stdout instead of workflow commands.
    #[arg(long = "json", default_value_t = false)]
    pub json: bool,

    #[arg(long = "verbose", num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub verbose: Option<bool>,
}

/// Layers command line values over the configuration file.
pub fn merge_cli_into_config(cfg: &AnnotateConfig, cli: &AnnotateCli) -> AnnotateConfig {
    let per_check = |values: &[String], fallback: &Option<PerCheck>| match values {
        [] => fallback.clone(),
        values => Some(PerCheck::Many(values.to_vec())),
    };
    AnnotateConfig {
        report_paths: per_check(&cli.report_paths, &cfg.report_paths),
        check_name: per_check(&cli.check_name, &cfg.check_name),
        summary: per_check(&cli.summary, &cfg.summary),
        include_passed: cli.include_passed.or(cfg.include_passed),
        include_skipped: cli.include_skipped.or(cfg.include_skipped),
        annotate_notice: cli.annotate_notice.or(cfg.annotate_notice),
        check_retries: cli.check_retries.or(cfg.check_retries),
        exclude_sources: Some(cli.exclude_sources.clone())
            .filter(|v| !v.is_empty())
            .or_else(|| cfg.exclude_sources.clone()),
        check_title_template: cli
            .check_title_template
            .clone()
            .or_else(|| cfg.check_title_template.clone()),
        bread_crumb_delimiter: cli
            .bread_crumb_delimiter
            .clone()
            .or_else(|| cfg.bread_crumb_delimiter.clone()),
        test_files_prefix: cli
            .test_files_prefix
            .clone()
            .or_else(|| cfg.test_files_prefix.clone()),
        transformers: cli
            .transformers
            .clone()
            .map(|raw| TransformersConfig::Rules(read_transformers(&raw)))
            .or_else(|| cfg.transformers.clone()),
        follow_symlink: cli.follow_symlink.or(cfg.follow_symlink),
        annotations_limit: cli.annotations_limit.or(cfg.annotations_limit),
        truncate_stack_traces: cli.truncate_stack_traces.or(cfg.truncate_stack_traces),
        fail_on_parse_error: cli.fail_on_parse_error.or(cfg.fail_on_parse_error),
        resolve_ignore_classname: cli.resolve_ignore_classname.or(cfg.resolve_ignore_classname),
        annotate_only: cli.annotate_only.or(cfg.annotate_only),
        fail_on_failure: cli.fail_on_failure.or(cfg.fail_on_failure),
        require_tests: cli.require_tests.or(cfg.require_tests),
        require_passed_tests: cli.require_passed_tests.or(cfg.require_passed_tests),
        detailed_summary: cli.detailed_summary.or(cfg.detailed_summary),
        flaky_summary: cli.flaky_summary.or(cfg.flaky_summary),
        group_suite: cli.group_suite.or(cfg.group_suite),
        include_time_in_summary: cli.include_time_in_summary.or(cfg.include_time_in_summary),
        skip_success_summary: cli.skip_success_summary.or(cfg.skip_success_summary),
        verbose: cli.verbose.or(cfg.verbose),
    }
}

/// One check to run: its report patterns and how it is labelled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckSpec {
    pub check_name: String,
    pub summary: String,
    pub report_paths: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SummaryOptions {
    pub detailed_summary: bool,
    pub flaky_summary: bool,
    pub group_suite: bool,
    pub include_time_in_summary: bool,
    pub skip_success_summary: bool,
    /// Lists skipped annotations in the detail tables even without `include_passed`.
    pub include_skipped: bool,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub checks: Vec<CheckSpec>,
    pub parse: ParseOptions,
    pub summary: SummaryOptions,
    pub annotate_only: bool,
    pub fail_on_failure: bool,
    pub require_tests: bool,
    pub require_passed_tests: bool,
    pub json: bool,
}

const DEFAULT_REPORT_PATHS: &str = "**/junit-reports/TEST-*.xml";
const DEFAULT_CHECK_NAME: &str = "JUnit Test Report";

/// Resolves the merged configuration into concrete settings with defaults filled in.
pub fn derive_settings(cfg: &AnnotateConfig, workspace: &Path, json: bool) -> Settings {
    let report_paths = cfg
        .report_paths
        .as_ref()
        .map(PerCheck::items)
        .unwrap_or_else(|| vec![DEFAULT_REPORT_PATHS.to_string()]);
    let check_names = cfg.check_name.as_ref().map(PerCheck::items).unwrap_or_default();
    let summaries = cfg.summary.as_ref().map(PerCheck::items).unwrap_or_default();

    let total = report_paths.len();
    let checks = report_paths
        .iter()
        .enumerate()
        .map(|(index, paths)| {
            let check_name = retrieve("checkName", &check_names, index, total);
            CheckSpec {
                check_name: if check_name.is_empty() {
                    DEFAULT_CHECK_NAME.to_string()
                } else {
                    check_name
                },
                summary: retrieve("summary", &summaries, index, total),
                report_paths: paths.clone(),
            }
        })
        .collect();

    let parse = ParseOptions {
        include_passed: cfg.include_passed.unwrap_or(false),
        annotate_notice: cfg.annotate_notice.unwrap_or(false),
        check_retries: cfg.check_retries.unwrap_or(false),
        exclude_sources: cfg
            .exclude_sources
            .clone()
            .unwrap_or_else(default_exclude_sources),
        check_title_template: cfg.check_title_template.clone().filter(|t| !t.is_empty()),
        bread_crumb_delimiter: cfg.bread_crumb_delimiter.clone().unwrap_or_else(|| "/".to_string()),
        test_files_prefix: cfg.test_files_prefix.clone().unwrap_or_default(),
        transformers: cfg
            .transformers
            .as_ref()
            .map(|t| compile_transformers(&t.specs()))
            .unwrap_or_default(),
        follow_symlink: cfg.follow_symlink.unwrap_or(false),
        annotations_limit: annotations_limit_from(cfg.annotations_limit.unwrap_or(-1)),
        truncate_stack_traces: cfg.truncate_stack_traces.unwrap_or(true),
        fail_on_parse_error: cfg.fail_on_parse_error.unwrap_or(false),
        resolve_ignore_classname: cfg.resolve_ignore_classname.unwrap_or(false),
        workspace: workspace.to_path_buf(),
    };

    Settings {
        checks,
        parse,
        summary: SummaryOptions {
            detailed_summary: cfg.detailed_summary.unwrap_or(false),
            flaky_summary: cfg.flaky_summary.unwrap_or(false),
            group_suite: cfg.group_suite.unwrap_or(false),
            include_time_in_summary: cfg.include_time_in_summary.unwrap_or(false),
            skip_success_summary: cfg.skip_success_summary.unwrap_or(false),
            include_skipped: cfg.include_skipped.unwrap_or(false),
        },
        annotate_only: cfg.annotate_only.unwrap_or(false),
        fail_on_failure: cfg.fail_on_failure.unwrap_or(false),
        require_tests: cfg.require_tests.unwrap_or(false),
        require_passed_tests: cfg.require_passed_tests.unwrap_or(false),
        json,
    }
}
