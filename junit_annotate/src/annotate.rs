//! Emission of annotations as CI workflow commands.

use std::io::Write;

use tracing::info;

use crate::model::{Annotation, AnnotationLevel, CheckResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conclusion {
    Success,
    Failure,
}

impl Conclusion {
    pub fn as_str(self) -> &'static str {
        match self {
            Conclusion::Success => "success",
            Conclusion::Failure => "failure",
        }
    }
}

pub fn check_title(check: &CheckResult) -> String {
    if !check.found_results() {
        return "No test results found!".to_string();
    }
    format!(
        "{} tests run, {} passed, {} skipped, {} failed.",
        check.total_count, check.passed, check.skipped, check.failed
    )
}

pub fn conclusion(check: &CheckResult) -> Conclusion {
    if check.failed == 0 {
        Conclusion::Success
    } else {
        Conclusion::Failure
    }
}

/// The annotations worth publishing: notices only when `annotate_notice` is set.
pub fn publishable(check: &CheckResult, annotate_notice: bool) -> Vec<&Annotation> {
    check
        .global_annotations
        .iter()
        .filter(|a| annotate_notice || a.annotation_level != AnnotationLevel::Notice)
        .collect()
}

fn escape_data(raw: &str) -> String {
    raw.replace('%', "%25").replace('\r', "%0D").replace('\n', "%0A")
}

fn escape_property(raw: &str) -> String {
    escape_data(raw).replace(':', "%3A").replace(',', "%2C")
}

fn command_name(level: AnnotationLevel) -> &'static str {
    match level {
        AnnotationLevel::Failure => "error",
        AnnotationLevel::Warning => "warning",
        AnnotationLevel::Notice => "notice",
    }
}

/// `::error file=..,line=..,endLine=..,title=..::message`; zero columns are omitted.
pub fn workflow_command(annotation: &Annotation) -> String {
    let mut properties = vec![
        format!("file={}", escape_property(&annotation.path)),
        format!("line={}", annotation.start_line),
        format!("endLine={}", annotation.end_line),
    ];
    if annotation.start_column > 0 {
        properties.push(format!("col={}", annotation.start_column));
    }
    if annotation.end_column > 0 {
        properties.push(format!("endColumn={}", annotation.end_column));
    }
    properties.push(format!("title={}", escape_property(&annotation.title)));
    format!(
        "::{} {}::{}",
        command_name(annotation.annotation_level),
        properties.join(","),
        escape_data(&annotation.message)
    )
}

/// Writes one workflow command per publishable annotation and returns the check title.
pub fn annotate_check_result(
    check: &CheckResult,
    annotate_notice: bool,
    out: &mut impl Write,
) -> std::io::Result<String> {
    let title = check_title(check);
    info!("{} - {title}", check.check_name);
    let annotations = publishable(check, annotate_notice);
    for annotation in &annotations {
        info!(
            "   {} | {}",
            annotation.path,
            annotation.message.lines().next().unwrap_or_default()
        );
        writeln!(out, "{}", workflow_command(annotation))?;
    }
    info!(
        "{} - conclusion {} ({} annotations)",
        check.check_name,
        conclusion(check).as_str(),
        annotations.len()
    );
    Ok(title)
}
