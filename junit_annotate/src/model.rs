use std::time::Duration;

use serde::{Serialize, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationLevel {
    Notice,
    Warning,
    Failure,
}

impl AnnotationLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            AnnotationLevel::Notice => "notice",
            AnnotationLevel::Warning => "warning",
            AnnotationLevel::Failure => "failure",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    Success,
    Failure,
    Skipped,
}

/// A single reportable outcome: one passed/skipped test case, or one failure
/// record of a failed test case.
///
/// Lines are always a single-line span and columns are never resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Annotation {
    pub path: String,
    pub start_line: u32,
    pub end_line: u32,
    pub start_column: u32,
    pub end_column: u32,
    pub retries: usize,
    pub annotation_level: AnnotationLevel,
    pub status: TestStatus,
    pub title: String,
    pub message: String,
    pub raw_details: String,
    #[serde(serialize_with = "serialize_millis")]
    pub time: Duration,
}

/// Aggregate of one suite and everything nested below it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuiteResult {
    pub name: String,
    pub total_count: usize,
    pub skipped_count: usize,
    pub failed_count: usize,
    pub passed_count: usize,
    pub retried_count: usize,
    #[serde(serialize_with = "serialize_millis")]
    pub time: Duration,
    pub annotations: Vec<Annotation>,
    pub test_results: Vec<SuiteResult>,
}

impl SuiteResult {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Folds the counts of a nested suite into this one and keeps it as a child.
    pub fn add_child(&mut self, child: SuiteResult) {
        self.total_count += child.total_count;
        self.skipped_count += child.skipped_count;
        self.failed_count += child.failed_count;
        self.passed_count += child.passed_count;
        self.retried_count += child.retried_count;
        self.time += child.time;
        self.test_results.push(child);
    }

    /// All annotations of this suite and its descendants, depth first.
    pub fn all_annotations(&self) -> Vec<&Annotation> {
        let mut out: Vec<&Annotation> = self.annotations.iter().collect();
        for child in &self.test_results {
            out.extend(child.all_annotations());
        }
        out
    }
}

/// Merged result of every report file matched by one check's patterns.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckResult {
    pub check_name: String,
    pub summary: String,
    pub total_count: usize,
    pub skipped: usize,
    pub failed: usize,
    pub passed: usize,
    pub retried: usize,
    #[serde(serialize_with = "serialize_millis")]
    pub time: Duration,
    pub found_files: usize,
    pub global_annotations: Vec<Annotation>,
    pub test_results: Vec<SuiteResult>,
}

impl CheckResult {
    pub fn new(check_name: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            check_name: check_name.into(),
            summary: summary.into(),
            ..Self::default()
        }
    }

    pub fn add_file_result(&mut self, result: SuiteResult) {
        self.total_count += result.total_count;
        self.skipped += result.skipped_count;
        self.failed += result.failed_count;
        self.passed += result.passed_count;
        self.retried += result.retried_count;
        self.time += result.time;
        self.test_results.push(result);
    }

    pub fn found_results(&self) -> bool {
        self.total_count > 0 || self.skipped > 0
    }
}

fn serialize_millis<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration.as_secs_f64() * 1000.0)
}
