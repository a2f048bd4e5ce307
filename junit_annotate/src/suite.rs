use tracing::debug;

use crate::flaky::{reconcile_retries, without_reconciliation};
use crate::model::{Annotation, SuiteResult};
use crate::options::ParseOptions;
use crate::path_resolver::PathResolver;
use crate::report_xml::RawSuite;
use crate::testcase::{Outcome, SuiteContext, TestCaseNormalizer};

/// Annotations collected across every suite and file of one check, bounded by
/// an optional limit.
#[derive(Debug, Clone, Default)]
pub struct AnnotationBudget {
    limit: Option<usize>,
    collected: Vec<Annotation>,
}

impl AnnotationBudget {
    pub fn new(limit: Option<usize>) -> Self {
        Self {
            limit,
            collected: vec![],
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.limit
            .is_some_and(|limit| self.collected.len() >= limit)
    }

    pub fn remaining(&self) -> Option<usize> {
        self.limit
            .map(|limit| limit.saturating_sub(self.collected.len()))
    }

    pub fn len(&self) -> usize {
        self.collected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collected.is_empty()
    }

    /// Keeps as many of `annotations` as the limit allows and returns them.
    pub fn admit(&mut self, mut annotations: Vec<Annotation>) -> Vec<Annotation> {
        if let Some(remaining) = self.remaining() {
            annotations.truncate(remaining);
        }
        self.collected.extend(annotations.iter().cloned());
        annotations
    }

    pub fn into_annotations(self) -> Vec<Annotation> {
        self.collected
    }
}

/// Recursive walk over one decoded report.
pub struct SuiteWalker<'a> {
    options: &'a ParseOptions,
    resolver: &'a mut PathResolver,
}

impl<'a> SuiteWalker<'a> {
    pub fn new(options: &'a ParseOptions, resolver: &'a mut PathResolver) -> Self {
        Self { options, resolver }
    }

    /// Walks `suite` and its descendants. Whatever has been counted when the
    /// budget runs out is returned as is.
    pub fn walk(&mut self, suite: &RawSuite, breadcrumb: &str, budget: &mut AnnotationBudget) -> SuiteResult {
        let mut result = SuiteResult::named(suite.name.trim());
        if suite.is_empty() {
            return result;
        }
        let ctx = SuiteContext {
            suite_name: suite.name.trim(),
            suite_file: suite.file.as_deref(),
            suite_line: suite.line.as_deref(),
            breadcrumb,
        };

        let cases = if self.options.check_retries {
            reconcile_retries(&suite.test_cases)
        } else {
            without_reconciliation(&suite.test_cases)
        };

        let mut normalizer = TestCaseNormalizer::new(self.options, self.resolver);
        for reconciled in &cases {
            if budget.is_exhausted() {
                debug!("Annotation limit reached inside suite {}", ctx.suite_name);
                return result;
            }
            let normalized = normalizer.normalize(&ctx, reconciled);
            result.total_count += 1;
            match normalized.outcome {
                Outcome::Passed => result.passed_count += 1,
                Outcome::Failed => result.failed_count += 1,
                Outcome::Skipped => result.skipped_count += 1,
            }
            if normalized.retries > 0 {
                result.retried_count += 1;
            }
            result.time += normalized.time;
            result.annotations.extend(budget.admit(normalized.annotations));
        }

        let child_breadcrumb = ctx.child_breadcrumb(&self.options.bread_crumb_delimiter);
        for child in &suite.suites {
            if budget.is_exhausted() {
                break;
            }
            let child_result = self.walk(child, &child_breadcrumb, budget);
            result.add_child(child_result);
        }
        result
    }
}
