//! Markdown tables summarizing checks, their annotations and flaky tests.

use std::time::Duration;

use tracing::info;

use crate::args::SummaryOptions;
use crate::model::{Annotation, AnnotationLevel, CheckResult, SuiteResult, TestStatus};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Table {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    fn with_header(header: &[&str]) -> Self {
        Self {
            header: header.iter().map(|h| h.to_string()).collect(),
            rows: vec![],
        }
    }

    fn push(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    /// A row whose first cell labels the rows below it.
    fn push_heading(&mut self, label: &str, emphasis: &str) {
        let mut row = vec![format!("{emphasis}{}{emphasis}", escape_cell(label))];
        row.resize(self.header.len(), String::new());
        self.rows.push(row);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        out.push_str(&markdown_row(&self.header));
        out.push_str(&markdown_row(&vec!["---".to_string(); self.header.len()]));
        for row in &self.rows {
            out.push_str(&markdown_row(row));
        }
        out
    }
}

fn markdown_row(cells: &[String]) -> String {
    format!("|{}|\n", cells.iter().map(|c| format!(" {c} ")).collect::<Vec<_>>().join("|"))
}

fn escape_cell(raw: &str) -> String {
    raw.replace('|', "\\|").replace('\n', " ")
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SummaryTables {
    pub summary: Table,
    pub details: Table,
    pub flaky: Table,
}

pub fn format_duration(time: Duration) -> String {
    let millis = time.as_millis();
    if millis < 1000 {
        format!("{millis}ms")
    } else {
        format!("{:.2}s", time.as_secs_f64())
    }
}

fn annotation_result(annotation: &Annotation) -> String {
    match (annotation.status, annotation.annotation_level) {
        (TestStatus::Success, _) => "✅ pass".to_string(),
        (TestStatus::Skipped, _) => "⚠️ skipped".to_string(),
        (TestStatus::Failure, level) => format!("❌ {}", level.as_str()),
    }
}

fn is_reported(annotation: &Annotation, include_passed: bool, include_skipped: bool) -> bool {
    match annotation.status {
        TestStatus::Skipped => include_passed || include_skipped,
        _ => include_passed || annotation.annotation_level != AnnotationLevel::Notice,
    }
}

pub fn build_summary_tables(results: &[CheckResult], include_passed: bool, options: &SummaryOptions) -> SummaryTables {
    let with_time = options.include_time_in_summary;
    let has_tests = results.iter().any(|r| r.total_count > 0);
    let has_passed = results.iter().any(|r| r.passed > 0);
    let has_skipped = results.iter().any(|r| r.skipped > 0);
    let has_failed = results.iter().any(|r| r.failed > 0);
    let passed_header = match (has_tests, has_passed, has_failed) {
        (false, _, _) => "Passed ❌️",
        (true, true, true) => "Passed ☑️",
        (true, true, false) => "Passed ✅",
        (true, false, _) => "Passed",
    };
    let skipped_header = if has_skipped { "Skipped ⚠️" } else { "Skipped" };
    let failed_header = if has_failed { "Failed ❌️" } else { "Failed" };

    let mut summary_header = vec!["", "Tests", passed_header, skipped_header, failed_header];
    let mut details_header = vec!["Test", "Result"];
    if with_time {
        summary_header.push("Time ⏱");
        details_header.push("Time ⏱");
    }
    let mut tables = SummaryTables {
        summary: Table::with_header(&summary_header),
        details: Table::with_header(&details_header),
        flaky: Table::with_header(&["Test", "Retries"]),
    };

    for check in results {
        if options.skip_success_summary && check.failed == 0 {
            continue;
        }
        let mut row = vec![
            escape_cell(&check.check_name),
            format!("{} ran", check.total_count),
            format!("{} passed", check.passed),
            format!("{} skipped", check.skipped),
            format!("{} failed", check.failed),
        ];
        if with_time {
            row.push(format_duration(check.time));
        }
        tables.summary.push(row);

        let annotations: Vec<&Annotation> = check
            .global_annotations
            .iter()
            .filter(|a| is_reported(a, include_passed, options.include_skipped))
            .collect();
        if annotations.is_empty() {
            if !include_passed {
                info!(
                    "No annotations found for {}. If you want to include passed results in this table please configure 'include_passed' as 'true'",
                    check.check_name
                );
            }
            if options.detailed_summary {
                let mut row = vec!["-".to_string(), "No test annotations available".to_string()];
                if with_time {
                    row.push(String::new());
                }
                tables.details.push(row);
            }
            continue;
        }

        if options.detailed_summary {
            tables.details.push_heading(&check.check_name, "**");
            if options.group_suite {
                for suite in &check.test_results {
                    append_suite_details(&mut tables.details, suite, "", include_passed, options.include_skipped, with_time);
                }
            } else {
                for annotation in &annotations {
                    tables.details.push(detail_row(annotation, with_time));
                }
            }
        }

        if options.flaky_summary {
            let flaky: Vec<&&Annotation> = annotations.iter().filter(|a| a.retries > 0).collect();
            if !flaky.is_empty() {
                tables.flaky.push_heading(&check.check_name, "**");
                for annotation in flaky {
                    tables
                        .flaky
                        .push(vec![escape_cell(&annotation.title), annotation.retries.to_string()]);
                }
            }
        }
    }
    tables
}

fn detail_row(annotation: &Annotation, with_time: bool) -> Vec<String> {
    let mut row = vec![escape_cell(&annotation.title), annotation_result(annotation)];
    if with_time {
        row.push(format_duration(annotation.time));
    }
    row
}

fn append_suite_details(
    table: &mut Table,
    suite: &SuiteResult,
    parent: &str,
    include_passed: bool,
    include_skipped: bool,
    with_time: bool,
) {
    let label = match (parent.is_empty(), suite.name.is_empty()) {
        (_, true) => parent.to_string(),
        (true, false) => suite.name.clone(),
        (false, false) => format!("{parent}/{}", suite.name),
    };
    let annotations: Vec<&Annotation> = suite
        .annotations
        .iter()
        .filter(|a| is_reported(a, include_passed, include_skipped))
        .collect();
    if !annotations.is_empty() {
        table.push_heading(&label, "_");
        for annotation in annotations {
            table.push(detail_row(annotation, with_time));
        }
    }
    for child in &suite.test_results {
        append_suite_details(table, child, &label, include_passed, include_skipped, with_time);
    }
}

/// Renders the non-empty tables as one markdown document.
pub fn render_summary(tables: &SummaryTables) -> String {
    let mut out = String::new();
    if !tables.summary.is_empty() {
        out.push_str(&tables.summary.to_markdown());
    }
    if !tables.details.is_empty() {
        out.push('\n');
        out.push_str(&tables.details.to_markdown());
    }
    if !tables.flaky.is_empty() {
        out.push_str("\n### Flaky tests\n\n");
        out.push_str(&tables.flaky.to_markdown());
    }
    out
}
