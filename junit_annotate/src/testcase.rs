use std::path::Path;
use std::time::Duration;

use once_cell::sync::Lazy;
use path_slash::PathExt;
use regex::Regex;
use tracing::info;

use crate::flaky::ReconciledCase;
use crate::model::{Annotation, AnnotationLevel, TestStatus};
use crate::options::ParseOptions;
use crate::path_resolver::PathResolver;
use crate::position::{Position, resolve_file_and_line};
use crate::report_xml::{RawFailure, RawTestCase};
use crate::transformer::apply_transformers;

static EMOJI_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"[\x{1f300}-\x{1f5ff}\x{1f900}-\x{1f9ff}\x{1f600}-\x{1f64f}\x{1f680}-\x{1f6ff}",
        r"\x{2600}-\x{26ff}\x{2700}-\x{27bf}\x{1f1e6}-\x{1f1ff}\x{1f191}-\x{1f251}",
        r"\x{1f004}\x{1f0cf}\x{1f170}-\x{1f171}\x{1f17e}-\x{1f17f}\x{1f18e}\x{3030}",
        r"\x{2b50}\x{2b55}\x{2934}-\x{2935}\x{2b05}-\x{2b07}\x{2b1b}-\x{2b1c}\x{3297}",
        r"\x{3299}\x{303d}\x{00a9}\x{00ae}\x{2122}\x{23f3}\x{24c2}\x{23e9}-\x{23ef}",
        r"\x{25b6}\x{23f8}-\x{23fa}]"
    ))
    .unwrap()
});

pub const FILE_NAME_VAR: &str = "{{FILE_NAME}}";
pub const SUITE_NAME_VAR: &str = "{{SUITE_NAME}}";
pub const TEST_NAME_VAR: &str = "{{TEST_NAME}}";
pub const CLASS_NAME_VAR: &str = "{{CLASS_NAME}}";
pub const BREAD_CRUMB_VAR: &str = "{{BREAD_CRUMB}}";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Passed,
    Failed,
    Skipped,
}

impl Outcome {
    pub fn of(case: &RawTestCase) -> Self {
        if case.is_skipped() {
            Outcome::Skipped
        } else if case.has_failures() {
            Outcome::Failed
        } else {
            Outcome::Passed
        }
    }

    fn status(self) -> TestStatus {
        match self {
            Outcome::Passed => TestStatus::Success,
            Outcome::Failed => TestStatus::Failure,
            Outcome::Skipped => TestStatus::Skipped,
        }
    }

    fn level(self) -> AnnotationLevel {
        match self {
            Outcome::Failed => AnnotationLevel::Failure,
            Outcome::Passed | Outcome::Skipped => AnnotationLevel::Notice,
        }
    }
}

/// Where a test case sits: its suite and the ancestors above that suite.
#[derive(Debug, Clone, Copy)]
pub struct SuiteContext<'a> {
    pub suite_name: &'a str,
    pub suite_file: Option<&'a str>,
    pub suite_line: Option<&'a str>,
    /// Ancestor suite names, each followed by the delimiter.
    pub breadcrumb: &'a str,
}

impl SuiteContext<'_> {
    /// The breadcrumb extended by this suite, as handed to nested suites.
    pub fn child_breadcrumb(&self, delimiter: &str) -> String {
        if self.suite_name.is_empty() {
            self.breadcrumb.to_string()
        } else {
            format!("{}{}{delimiter}", self.breadcrumb, self.suite_name)
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedCase {
    pub outcome: Outcome,
    pub retries: usize,
    pub time: Duration,
    pub annotations: Vec<Annotation>,
}

pub struct TestCaseNormalizer<'a> {
    options: &'a ParseOptions,
    resolver: &'a mut PathResolver,
}

impl<'a> TestCaseNormalizer<'a> {
    pub fn new(options: &'a ParseOptions, resolver: &'a mut PathResolver) -> Self {
        Self { options, resolver }
    }

    pub fn normalize(&mut self, ctx: &SuiteContext<'_>, reconciled: &ReconciledCase) -> NormalizedCase {
        let case = &reconciled.case;
        let outcome = Outcome::of(case);
        let retries = reconciled.retries + case.retry_records.len();
        let mut normalized = NormalizedCase {
            outcome,
            retries,
            time: case.time,
            annotations: vec![],
        };
        if !self.should_emit(outcome, retries) {
            return normalized;
        }

        let records: Vec<Option<&RawFailure>> = match outcome {
            Outcome::Failed => case.failures.iter().map(Some).collect(),
            Outcome::Passed | Outcome::Skipped => vec![case.failures.first()],
        };
        let total = records.len();
        normalized.annotations = records
            .into_iter()
            .enumerate()
            .map(|(index, record)| {
                let mut annotation = self.build_annotation(ctx, case, record, outcome, retries);
                if total > 1 {
                    annotation.title = format!("{} (failure {}/{total})", annotation.title, index + 1);
                }
                annotation
            })
            .collect();
        normalized
    }

    /// Failures are always reported. Passed and skipped cases only with `include_passed`,
    /// unless they were retried: the retry count is worth reporting by itself.
    fn should_emit(&self, outcome: Outcome, retries: usize) -> bool {
        let requested = match outcome {
            Outcome::Failed => true,
            Outcome::Passed => self.options.include_passed,
            Outcome::Skipped => self.options.include_passed,
        };
        requested || retries > 0
    }

    fn build_annotation(
        &mut self,
        ctx: &SuiteContext<'_>,
        case: &RawTestCase,
        record: Option<&RawFailure>,
        outcome: Outcome,
        retries: usize,
    ) -> Annotation {
        let stack_trace = record
            .map(|r| strip_ansi(&r.text).trim().to_string())
            .unwrap_or_default();
        let message = self.message_for(case, record, &stack_trace);

        let identifier = if self.options.resolve_ignore_classname {
            case.name.as_str()
        } else {
            case.classname.as_deref().unwrap_or(&case.name)
        };
        let position = resolve_file_and_line(
            case.file
                .as_deref()
                .or(record.and_then(|r| r.file.as_deref()))
                .or(ctx.suite_file),
            case.line
                .as_deref()
                .or(record.and_then(|r| r.line.as_deref()))
                .or(ctx.suite_line),
            identifier,
            &stack_trace,
        );

        let path = self.resolve_path(&position, outcome);
        let title = self.build_title(ctx, case, &position);
        info!(
            "{path}:{} | {}",
            position.line,
            message.lines().next().unwrap_or_default()
        );

        Annotation {
            path,
            start_line: position.line,
            end_line: position.line,
            start_column: 0,
            end_column: 0,
            retries,
            annotation_level: outcome.level(),
            status: outcome.status(),
            title: escape_emoji(&title),
            message: escape_emoji(&message).trim().to_string(),
            raw_details: escape_emoji(&stack_trace),
            time: case.time,
        }
    }

    fn message_for(&self, case: &RawTestCase, record: Option<&RawFailure>, stack_trace: &str) -> String {
        let explicit = record
            .and_then(|r| r.message.as_deref())
            .map(strip_ansi)
            .filter(|m| !m.trim().is_empty());
        let from_trace = || {
            let excerpt = if self.options.truncate_stack_traces {
                stack_trace.lines().take(2).collect::<Vec<_>>().join("\n")
            } else {
                stack_trace.to_string()
            };
            Some(excerpt).filter(|m| !m.trim().is_empty())
        };
        explicit
            .or_else(from_trace)
            .unwrap_or_else(|| case.name.clone())
            .trim()
            .to_string()
    }

    fn resolve_path(&mut self, position: &Position, outcome: Outcome) -> String {
        let transformed = apply_transformers(&self.options.transformers, &position.file_name);
        let needs_lookup = outcome == Outcome::Failed
            || (self.options.annotate_notice && outcome == Outcome::Passed);
        let resolved = if needs_lookup {
            self.resolver.resolve(&transformed)
        } else {
            transformed
        };
        let relative = self.resolver.strip_workspace(&resolved);

        if self.options.test_files_prefix.is_empty() {
            relative
        } else {
            Path::new(&self.options.test_files_prefix)
                .join(&relative)
                .to_slash_lossy()
                .to_string()
        }
    }

    fn build_title(&self, ctx: &SuiteContext<'_>, case: &RawTestCase, position: &Position) -> String {
        let differs_from_test = position.file_name != case.name;
        if let Some(template) = &self.options.check_title_template {
            let file_name = if differs_from_test { position.file_name.as_str() } else { "" };
            let class_name = case
                .classname
                .as_deref()
                .unwrap_or(&case.name)
                .rsplit('.')
                .next()
                .unwrap_or_default();
            return template
                .replace(FILE_NAME_VAR, file_name)
                .replace(SUITE_NAME_VAR, ctx.suite_name)
                .replace(TEST_NAME_VAR, &case.name)
                .replace(CLASS_NAME_VAR, class_name)
                .replace(BREAD_CRUMB_VAR, ctx.breadcrumb);
        }

        if differs_from_test {
            let base = match (&case.classname, self.options.resolve_ignore_classname) {
                (Some(classname), true) => classname.as_str(),
                _ => position.file_name.as_str(),
            };
            format!("{base}.{}", case.name)
        } else {
            format!(
                "{}{}",
                ctx.child_breadcrumb(&self.options.bread_crumb_delimiter),
                case.name
            )
        }
    }
}

fn strip_ansi(text: &str) -> String {
    if !text.contains('\u{1b}') {
        return text.to_string();
    }
    String::from_utf8_lossy(&strip_ansi_escapes::strip(text.as_bytes())).to_string()
}

pub fn escape_emoji(input: &str) -> String {
    EMOJI_RE.replace_all(input, "").into_owned()
}
