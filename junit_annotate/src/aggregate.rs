use std::path::{Path, PathBuf};

use tracing::{debug, error, info};

use crate::error::ReportError;
use crate::model::{CheckResult, SuiteResult};
use crate::options::ParseOptions;
use crate::path_resolver::PathResolver;
use crate::report_glob::ReportGlob;
use crate::report_xml::{decode_report_at, read_report_file};
use crate::suite::{AnnotationBudget, SuiteWalker};

/// One parsing run: the options plus the path cache shared by every report
/// parsed through it.
#[derive(Debug)]
pub struct ReportParser {
    options: ParseOptions,
    resolver: PathResolver,
}

impl ReportParser {
    pub fn new(options: ParseOptions) -> Self {
        let resolver = PathResolver::new(
            &options.workspace,
            options.exclude_sources.clone(),
            options.follow_symlink,
        );
        Self { options, resolver }
    }

    pub fn parse_file(&mut self, path: &Path, budget: &mut AnnotationBudget) -> Result<SuiteResult, ReportError> {
        debug!("Parsing file {}", path.display());
        let root = read_report_file(path)?;
        Ok(SuiteWalker::new(&self.options, &mut self.resolver).walk(&root, "", budget))
    }

    /// Parses an in-memory report; `source` only names it in errors.
    pub fn parse_str(
        &mut self,
        xml: &str,
        source: &Path,
        budget: &mut AnnotationBudget,
    ) -> Result<SuiteResult, ReportError> {
        let root = decode_report_at(xml, source)?;
        Ok(SuiteWalker::new(&self.options, &mut self.resolver).walk(&root, "", budget))
    }

    /// Parses every report matched by `patterns` into one check.
    ///
    /// Unreadable or malformed reports are logged and skipped, unless
    /// `fail_on_parse_error` is set.
    pub fn parse_check(&mut self, check_name: &str, summary: &str, patterns: &str) -> Result<CheckResult, ReportError> {
        let glob = ReportGlob::parse(patterns, &self.options.workspace);
        let files = glob.resolve(self.options.follow_symlink);
        self.parse_files(check_name, summary, &files)
    }

    pub fn parse_files(&mut self, check_name: &str, summary: &str, files: &[PathBuf]) -> Result<CheckResult, ReportError> {
        let mut check = CheckResult::new(check_name, summary);
        let mut budget = AnnotationBudget::new(self.options.annotations_limit);
        check.found_files = files.len();

        for file in files {
            match self.parse_file(file, &mut budget) {
                Ok(result) => check.add_file_result(result),
                Err(err) if self.options.fail_on_parse_error => {
                    error!("Failed to parse the report file {}: {err}", file.display());
                    return Err(err);
                }
                Err(err) => error!("Failed to parse the report file {}: {err}", err.path().display()),
            }
            if budget.is_exhausted() {
                info!("Annotation limit reached, skipping the remaining report files");
                break;
            }
        }

        check.global_annotations = budget.into_annotations();
        info!(
            "Check {check_name}: {} files, {} tests, {} failed, {} skipped, {} retried",
            check.found_files, check.total_count, check.failed, check.skipped, check.retried
        );
        Ok(check)
    }
}
