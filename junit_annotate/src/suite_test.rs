use crate::model::{SuiteResult, TestStatus};
use crate::options::ParseOptions;
use crate::path_resolver::PathResolver;
use crate::report_xml::{RawSuite, decode_report};
use crate::suite::{AnnotationBudget, SuiteWalker};

const NESTED: &str = r#"<testsuites>
  <testsuite name="root">
    <testcase name="ok1" classname="a.RootTest"/>
    <testcase name="fails" classname="a.RootTest">
      <failure message="one"/>
      <failure message="two"/>
    </testcase>
    <testcase name="skipped" classname="a.RootTest"><skipped/></testcase>
    <testsuite name="child">
      <testcase name="ok2" classname="a.ChildTest"/>
      <testcase name="bad" classname="a.ChildTest"><error message="kaput"/></testcase>
      <testsuite name="grandchild">
        <testcase name="deep" classname="a.DeepTest"><failure message="deep"/></testcase>
      </testsuite>
    </testsuite>
  </testsuite>
</testsuites>"#;

fn walk_with(root: &RawSuite, options: &ParseOptions, budget: &mut AnnotationBudget) -> SuiteResult {
    let dir = tempfile::tempdir().unwrap();
    let mut resolver = PathResolver::new(dir.path(), vec![], false);
    SuiteWalker::new(options, &mut resolver).walk(root, "", budget)
}

fn assert_counts_add_up(result: &SuiteResult) {
    assert_eq!(
        result.total_count,
        result.passed_count + result.failed_count + result.skipped_count,
        "suite {}",
        result.name
    );
    for child in &result.test_results {
        assert_counts_add_up(child);
    }
}

#[test]
fn aggregates_counts_over_nested_suites() {
    let root = decode_report(NESTED).unwrap();
    let mut budget = AnnotationBudget::new(None);
    let result = walk_with(&root, &ParseOptions::default(), &mut budget);

    assert_eq!(result.total_count, 6);
    assert_eq!(result.passed_count, 2);
    assert_eq!(result.failed_count, 3);
    assert_eq!(result.skipped_count, 1);
    assert_counts_add_up(&result);

    // two failure records of one case, plus one each for the others
    assert_eq!(result.all_annotations().len(), 4);
    assert_eq!(budget.len(), 4);
}

#[test]
fn nested_titles_carry_the_breadcrumb() {
    let xml = r#"<testsuites>
  <testsuite name="outer">
    <testsuite name="inner">
      <testcase name="leaf"><failure message="x"/></testcase>
    </testsuite>
  </testsuite>
</testsuites>"#;
    let root = decode_report(xml).unwrap();
    let mut budget = AnnotationBudget::new(None);
    let options = ParseOptions {
        bread_crumb_delimiter: " > ".to_string(),
        ..ParseOptions::default()
    };
    let result = walk_with(&root, &options, &mut budget);
    let titles: Vec<String> = result.all_annotations().iter().map(|a| a.title.clone()).collect();
    assert_eq!(titles, vec!["outer > inner > leaf".to_string()]);
}

#[test]
fn limit_caps_annotations_and_stops_counting() {
    let root = decode_report(NESTED).unwrap();
    for limit in 0..=5 {
        let mut budget = AnnotationBudget::new(Some(limit));
        let result = walk_with(&root, &ParseOptions::default(), &mut budget);
        assert!(budget.len() <= limit, "limit {limit}");
        assert_eq!(result.all_annotations().len(), budget.len());
        assert_counts_add_up(&result);
    }

    let mut budget = AnnotationBudget::new(Some(0));
    let result = walk_with(&root, &ParseOptions::default(), &mut budget);
    assert_eq!(result.total_count, 0);

    // ok1 passes silently, fails fills the budget of one with its first record
    let mut budget = AnnotationBudget::new(Some(1));
    let result = walk_with(&root, &ParseOptions::default(), &mut budget);
    assert_eq!(result.total_count, 2);
    assert_eq!(result.failed_count, 1);
    assert_eq!(budget.len(), 1);
}

#[test]
fn empty_suite_is_a_zero_result() {
    let root = decode_report(r#"<testsuites name="nothing"/>"#).unwrap();
    let mut budget = AnnotationBudget::new(None);
    let result = walk_with(&root, &ParseOptions::default(), &mut budget);
    similar_asserts::assert_eq!(result, SuiteResult::named("nothing"));
}

#[test]
fn check_retries_folds_duplicates_before_counting() {
    let xml = r#"<testsuite name="py">
  <testcase name="foo" classname="TestFoo" file="test_foo.py"><failure message="first"/></testcase>
  <testcase name="foo" classname="TestFoo" file="test_foo.py"><error message="second"/></testcase>
  <testcase name="foo" classname="TestFoo" file="test_foo.py"/>
  <testcase name="bar" classname="TestFoo" file="test_foo.py"/>
</testsuite>"#;
    let root = decode_report(xml).unwrap();

    let mut budget = AnnotationBudget::new(None);
    let plain = walk_with(&root, &ParseOptions::default(), &mut budget);
    assert_eq!(plain.total_count, 4);
    assert_eq!(plain.failed_count, 2);

    let options = ParseOptions {
        check_retries: true,
        ..ParseOptions::default()
    };
    let mut budget = AnnotationBudget::new(None);
    let folded = walk_with(&root, &options, &mut budget);
    assert_eq!(folded.total_count, 2);
    assert_eq!(folded.passed_count, 2);
    assert_eq!(folded.failed_count, 0);
    assert_eq!(folded.retried_count, 1);
    assert_eq!(folded.annotations.len(), 1);
    assert_eq!(folded.annotations[0].retries, 2);
}

#[test]
fn skipped_cases_leave_the_budget_to_failures() {
    let xml = r#"<testsuite name="s">
  <testcase name="skip" classname="T"><skipped/></testcase>
  <testcase name="fail" classname="T"><failure message="boom"/></testcase>
</testsuite>"#;
    let root = decode_report(xml).unwrap();
    let mut budget = AnnotationBudget::new(Some(1));
    let result = walk_with(&root, &ParseOptions::default(), &mut budget);

    assert_eq!(result.total_count, 2);
    assert_eq!(result.skipped_count, 1);
    assert_eq!(result.failed_count, 1);
    let emitted = result.all_annotations();
    assert_eq!(emitted.len(), 1);
    assert_eq!(emitted[0].status, TestStatus::Failure);
    assert_eq!(budget.len(), 1);
}
