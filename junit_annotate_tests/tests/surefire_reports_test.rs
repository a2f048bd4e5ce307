use std::time::Duration;

use junit_annotate::aggregate::ReportParser;
use junit_annotate::model::{Annotation, AnnotationLevel, TestStatus};
use junit_annotate::options::ParseOptions;
use junit_annotate_tests::fixtures::copy_fixtures;

const CALC_TEST: &str = "tests/utils/src/test/java/action/surefire/report/calc/CalcUtilsTest.kt";
const EMAIL_TEST: &str = "tests/email/src/test/java/action/surefire/report/email/EmailAddressTest.java";

fn without_time(annotation: &Annotation) -> Annotation {
    Annotation {
        time: Duration::ZERO,
        ..annotation.clone()
    }
}

fn failure(path: &str, line: u32, title: &str, message: &str, raw_details: &str) -> Annotation {
    Annotation {
        path: path.to_string(),
        start_line: line,
        end_line: line,
        start_column: 0,
        end_column: 0,
        retries: 0,
        annotation_level: AnnotationLevel::Failure,
        status: TestStatus::Failure,
        title: title.to_string(),
        message: message.to_string(),
        raw_details: raw_details.to_string(),
        time: Duration::ZERO,
    }
}

#[test]
fn kotlin_failures_resolve_to_the_test_source() {
    let workspace = copy_fixtures();
    let mut parser = ReportParser::new(ParseOptions {
        workspace: workspace.path().to_path_buf(),
        ..ParseOptions::default()
    });
    let check = parser
        .parse_check("calc", "", "tests/utils/target/surefire-reports/TEST-*.xml")
        .unwrap();

    assert_eq!(check.found_files, 1);
    assert_eq!(check.total_count, 2);
    assert_eq!(check.skipped, 0);
    assert_eq!(check.failed, 2);

    let actual: Vec<Annotation> = check.global_annotations.iter().map(without_time).collect();
    similar_asserts::assert_eq!(
        actual,
        vec![
            failure(
                CALC_TEST,
                27,
                "CalcUtilsTest.test error handling",
                "unexpected exception type thrown; expected:<java.lang.IllegalStateException> but was:<java.lang.IllegalArgumentException>",
                "java.lang.AssertionError: unexpected exception type thrown; expected:<java.lang.IllegalStateException> but was:<java.lang.IllegalArgumentException>\n\tat action.surefire.report.calc.CalcUtilsTest.test error handling(CalcUtilsTest.kt:27)\nCaused by: java.lang.IllegalArgumentException: Amount must have max 2 non-zero decimal places\n\tat action.surefire.report.calc.CalcUtilsTest.scale(CalcUtilsTest.kt:31)\n\tat action.surefire.report.calc.CalcUtilsTest.access$scale(CalcUtilsTest.kt:9)\n\tat action.surefire.report.calc.CalcUtilsTest.test error handling(CalcUtilsTest.kt:27)",
            ),
            failure(
                CALC_TEST,
                15,
                "CalcUtilsTest.test scale",
                "Expected: <100.10>\n     but: was <100.11>",
                "java.lang.AssertionError: \n\nExpected: <100.10>\n     but: was <100.11>\n\tat action.surefire.report.calc.CalcUtilsTest.test scale(CalcUtilsTest.kt:15)",
            ),
        ]
    );
}

#[test]
fn java_report_with_passed_and_skipped_cases() {
    let workspace = copy_fixtures();
    let mut parser = ReportParser::new(ParseOptions {
        workspace: workspace.path().to_path_buf(),
        include_passed: true,
        ..ParseOptions::default()
    });
    let check = parser
        .parse_check("email", "", "tests/email/target/surefire-reports/*.xml")
        .unwrap();

    assert_eq!(check.total_count, 4);
    assert_eq!(check.passed, 2);
    assert_eq!(check.skipped, 1);
    assert_eq!(check.failed, 1);
    assert_eq!(check.global_annotations.len(), 4);

    let failed = &check.global_annotations[0];
    assert_eq!(failed.path, EMAIL_TEST);
    assert_eq!(failed.start_line, 39);
    assert_eq!(
        failed.title,
        "EmailAddressTest.shouldNotContainInternationalizedHostNames"
    );
    assert_eq!(
        failed.message,
        "Address user@ñandú.com.ar should have thrown InvalidEmailAddressException"
    );

    let statuses: Vec<TestStatus> = check.global_annotations.iter().map(|a| a.status).collect();
    assert_eq!(
        statuses,
        vec![
            TestStatus::Failure,
            TestStatus::Success,
            TestStatus::Success,
            TestStatus::Skipped
        ]
    );
    assert!(
        check.global_annotations[1..]
            .iter()
            .all(|a| a.annotation_level == AnnotationLevel::Notice)
    );
}

#[test]
fn passed_notices_resolve_paths_only_when_annotated() {
    let workspace = copy_fixtures();
    let options = ParseOptions {
        workspace: workspace.path().to_path_buf(),
        include_passed: true,
        ..ParseOptions::default()
    };

    let mut parser = ReportParser::new(options.clone());
    let check = parser
        .parse_check("email", "", "tests/email/target/surefire-reports/*.xml")
        .unwrap();
    assert_eq!(check.global_annotations[1].path, "EmailAddressTest");

    let mut parser = ReportParser::new(ParseOptions {
        annotate_notice: true,
        ..options
    });
    let check = parser
        .parse_check("email", "", "tests/email/target/surefire-reports/*.xml")
        .unwrap();
    assert_eq!(check.global_annotations[1].path, EMAIL_TEST);
}

#[test]
fn pytest_report_uses_explicit_file_and_line() {
    let workspace = copy_fixtures();
    let mut parser = ReportParser::new(ParseOptions {
        workspace: workspace.path().to_path_buf(),
        ..ParseOptions::default()
    });
    let check = parser.parse_check("pytest", "", "python/report.xml").unwrap();

    assert_eq!(check.total_count, 3);
    assert_eq!(check.failed, 2);
    let positions: Vec<(&str, u32)> = check
        .global_annotations
        .iter()
        .map(|a| (a.path.as_str(), a.start_line))
        .collect();
    assert_eq!(
        positions,
        vec![("python/test_sample.py", 10), ("python/test_sample.py", 14)]
    );
    assert_eq!(
        check.global_annotations[0].message,
        "AssertionError: assert 'test' == 'xyz'\n  - xyz\n  + test"
    );
    assert!(
        check.global_annotations[1]
            .raw_details
            .ends_with("python/test_sample.py:14: AttributeError")
    );
}

#[test]
fn source_lookups_skip_excluded_directories() {
    let workspace = copy_fixtures();
    let shadow = workspace
        .path()
        .join("build/generated/action/surefire/report/calc");
    std::fs::create_dir_all(&shadow).unwrap();
    std::fs::write(shadow.join("CalcUtilsTest.kt"), "class CalcUtilsTest\n").unwrap();

    let mut parser = ReportParser::new(ParseOptions {
        workspace: workspace.path().to_path_buf(),
        ..ParseOptions::default()
    });
    let check = parser
        .parse_check("calc", "", "tests/utils/target/surefire-reports/*.xml")
        .unwrap();
    assert!(check.global_annotations.iter().all(|a| a.path == CALC_TEST));
}
