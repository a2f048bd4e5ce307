use crate::position::{LocationQuery, LocationStrategy, Position, resolve_file_and_line};

fn pos(file_name: &str, line: u32) -> Position {
    Position {
        file_name: file_name.to_string(),
        line,
    }
}

#[test]
fn defaults_to_line_one_when_output_has_no_location() {
    let resolved = resolve_file_and_line(None, None, "someClassName", "not a stacktrace");
    assert_eq!(resolved, pos("someClassName", 1));
}

#[test]
fn explicit_file_and_line_skip_the_scan() {
    let output = " at Other.run(Other.java:99)";
    let resolved = resolve_file_and_line(Some("src/lib/thing.js"), Some("12"), "Other", output);
    assert_eq!(resolved, pos("src/lib/thing.js", 12));
}

#[test]
fn explicit_line_is_the_fallback_when_scan_finds_nothing() {
    let resolved = resolve_file_and_line(None, Some("7"), "a.b.FooTest", "no frames here");
    assert_eq!(resolved, pos("FooTest", 7));
}

#[test]
fn unparseable_explicit_line_falls_back_to_one() {
    let resolved = resolve_file_and_line(Some("foo.py"), Some("n/a"), "foo", "");
    assert_eq!(resolved, pos("foo.py", 1));
}

#[test]
fn resolves_java_stack_trace_to_last_matching_frame() {
    let output = r"
action.surefire.report.email.InvalidEmailAddressException: Invalid email address 'user@ñandú.com.ar'
    at action.surefire.report.email.EmailAddressTest.expectException(EmailAddressTest.java:74)
    at action.surefire.report.email.EmailAddressTest.shouldNotContainInternationalizedHostNames(EmailAddressTest.java:39)
        ";
    let resolved = resolve_file_and_line(
        None,
        None,
        "action.surefire.report.email.EmailAddressTest",
        output,
    );
    assert_eq!(resolved, pos("EmailAddressTest", 39));
}

#[test]
fn resolves_kotlin_frames_with_spaces_in_method_names() {
    let output = r"
java.lang.AssertionError: unexpected exception type thrown; expected:<java.lang.IllegalStateException> but was:<java.lang.IllegalArgumentException>
    at action.surefire.report.calc.CalcUtilsTest.test error handling(CalcUtilsTest.kt:27)
Caused by: java.lang.IllegalArgumentException: Amount must have max 2 non-zero decimal places
    at action.surefire.report.calc.CalcUtilsTest.scale(CalcUtilsTest.kt:31)
    at action.surefire.report.calc.CalcUtilsTest.access$scale(CalcUtilsTest.kt:9)
    at action.surefire.report.calc.CalcUtilsTest.test error handling(CalcUtilsTest.kt:27)
        ";
    let resolved = resolve_file_and_line(None, None, "action.surefire.report.calc.CalcUtilsTest", output);
    assert_eq!(resolved, pos("CalcUtilsTest", 27));
}

#[test]
fn resolves_extended_java_stack_trace() {
    let output = "
java.lang.AssertionError:

Expected: (an instance of java.lang.IllegalArgumentException and exception with message a string containing \"This is unexpected\")
     but: exception with message a string containing \"This is unexpected\" message was \"Input='' didn't match condition.\"
Stacktrace was: java.lang.IllegalArgumentException: Input='' didn't match condition.
\tat action.surefire.report.calc.StringUtils.requireNotBlank(StringUtils.java:25)
\tat action.surefire.report.calc.StringUtils.requireNotBlank(StringUtils.java:18)
\tat action.surefire.report.calc.StringUtilsTest.require_fail(StringUtilsTest.java:26)
\tat sun.reflect.NativeMethodAccessorImpl.invoke0(Native Method)
\tat org.junit.runners.ParentRunner.run(ParentRunner.java:413)
\tat org.apache.maven.surefire.booter.ForkedBooter.main(ForkedBooter.java:418)
";
    let resolved = resolve_file_and_line(None, None, "action.surefire.report.calc.StringUtilsTest", output);
    assert_eq!(resolved, pos("StringUtilsTest", 26));
}

#[test]
fn resolves_pytest_location_line() {
    let output = "
def
test_with_error():
event = { 'attr': 'test'}
&gt; assert event.attr == 'test'
E AttributeError: 'dict' object has no attribute 'attr'

test.py:14: AttributeError
";
    let resolved = resolve_file_and_line(Some("test.py"), None, "anything", output);
    assert_eq!(resolved, pos("test.py", 14));
}

#[test]
fn recovers_rust_source_file_from_panic_message() {
    let output = "thread 'project::admission_webhook_tests::it_should_be_possible_to_update_projects' panicked at 'boom', tests/project/admission_webhook_tests.rs:48:38
note: run with `RUST_BACKTRACE=1` environment variable to display a backtrace
";
    let resolved = resolve_file_and_line(None, None, "project", output);
    assert_eq!(resolved, pos("tests/project/admission_webhook_tests.rs", 48));
}

#[test]
fn maps_rust_module_path_onto_source_path() {
    let output = "thread 'project::manifest_secrets::it_should_skip_annotated_manifests' panicked at 'assertion failed: `(left == right)`\\n\"
  left: `0`,
 right: `42`: all manifests should be skipped', tests/project/manifest_secrets.rs:305:5
";
    let resolved = resolve_file_and_line(None, None, "project::manifest_secrets", output);
    assert_eq!(resolved, pos("tests/project/manifest_secrets.rs", 305));
}

#[test]
fn regex_special_characters_in_the_candidate_are_matched_literally() {
    let output = " at Foo.run(Test++.cpp:17)";
    let resolved = resolve_file_and_line(None, None, "suite.Test++", output);
    assert_eq!(resolved, pos("Test++", 17));
}

#[test]
fn explicit_strategy_needs_both_file_and_line() {
    let query = LocationQuery {
        file: Some("a.rs"),
        line: None,
        identifier: "a",
        output: "",
    };
    assert_eq!(LocationStrategy::ExplicitAttributes.resolve(&query), None);
    assert_eq!(LocationStrategy::StackTraceScan.resolve(&query), None);
    assert_eq!(LocationStrategy::Fallback.resolve(&query), Some(pos("a.rs", 1)));
}
