use std::io::Write;
use std::path::Path;

use thiserror::Error;
use tracing::{error, info};

use crate::aggregate::ReportParser;
use crate::annotate::annotate_check_result;
use crate::args::Settings;
use crate::error::ReportError;
use crate::model::CheckResult;
use crate::summary::{build_summary_tables, render_summary};

#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Report(#[from] ReportError),

    #[error("failed to write output: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize results: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    pub results: Vec<CheckResult>,
    pub exit_code: i32,
}

/// Parses every configured check.
pub fn collect_check_results(settings: &Settings) -> Result<Vec<CheckResult>, ReportError> {
    let mut parser = ReportParser::new(settings.parse.clone());
    settings
        .checks
        .iter()
        .map(|check| {
            info!("Preparing test report for {}: {}", check.check_name, check.report_paths);
            parser.parse_check(&check.check_name, &check.summary, &check.report_paths)
        })
        .collect()
}

/// The process exit code the failure policies ask for.
pub fn exit_code_for(settings: &Settings, results: &[CheckResult]) -> i32 {
    let mut code = 0;
    for check in results {
        if settings.require_tests && !check.found_results() {
            error!("No test results found for {}", check.check_name);
            code = 1;
        }
        if settings.require_passed_tests && check.passed == 0 {
            error!("No passed tests found for {}", check.check_name);
            code = 1;
        }
        if settings.fail_on_failure && check.failed > 0 {
            error!("{} tests failed in {}", check.failed, check.check_name);
            code = 1;
        }
    }
    code
}

/// Runs all checks and writes either JSON or workflow commands to `out`.
///
/// The markdown summary goes to `step_summary` when given, after the commands otherwise.
pub fn run(settings: &Settings, step_summary: Option<&Path>, out: &mut impl Write) -> Result<RunOutcome, RunError> {
    let results = collect_check_results(settings)?;

    if settings.json {
        serde_json::to_writer_pretty(&mut *out, &results)?;
        writeln!(out)?;
    } else {
        for check in &results {
            annotate_check_result(check, settings.parse.annotate_notice, out)?;
        }
        if !settings.annotate_only {
            let tables = build_summary_tables(&results, settings.parse.include_passed, &settings.summary);
            let markdown = render_summary(&tables);
            match step_summary {
                Some(path) => append_summary(path, &markdown)?,
                None => write!(out, "{markdown}")?,
            }
        }
    }

    let exit_code = exit_code_for(settings, &results);
    Ok(RunOutcome { results, exit_code })
}

fn append_summary(path: &Path, markdown: &str) -> std::io::Result<()> {
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    file.write_all(markdown.as_bytes())
}
