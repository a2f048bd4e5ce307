//! Typed intermediate representation of a JUnit-style report.
//!
//! The many dialects in the wild only agree on the rough `testsuites` /
//! `testsuite` / `testcase` shape, so decoding is lenient: unknown elements
//! and attributes are ignored and every field the parser consumes is optional.

use std::path::Path;
use std::time::Duration;

use indexmap::IndexMap;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use thiserror::Error;

use crate::error::ReportError;

static TESTSUITES_TAG: &str = "testsuites";
static TESTSUITE_TAG: &str = "testsuite";
static TESTCASE_TAG: &str = "testcase";
static SKIPPED_TAG: &str = "skipped";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum XmlDecodeError {
    #[error("malformed xml at byte {position}: {message}")]
    Malformed { position: usize, message: String },

    #[error("root element is <{found}>, expected <testsuites> or <testsuite>")]
    UnexpectedRoot { found: String },

    #[error("document has no root element")]
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Failure,
    Error,
    FlakyFailure,
    FlakyError,
    RerunFailure,
    RerunError,
}

impl FailureKind {
    fn from_tag(tag: &str) -> Option<Self> {
        Some(match tag {
            "failure" => FailureKind::Failure,
            "error" => FailureKind::Error,
            "flakyFailure" => FailureKind::FlakyFailure,
            "flakyError" => FailureKind::FlakyError,
            "rerunFailure" => FailureKind::RerunFailure,
            "rerunError" => FailureKind::RerunError,
            _ => return None,
        })
    }

    /// Whether the record describes an earlier attempt rather than the final outcome.
    pub fn is_retry_record(self) -> bool {
        !matches!(self, FailureKind::Failure | FailureKind::Error)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawFailure {
    pub kind: FailureKind,
    pub message: Option<String>,
    pub failure_type: Option<String>,
    pub text: String,
    pub file: Option<String>,
    pub line: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawTestCase {
    pub name: String,
    pub classname: Option<String>,
    pub file: Option<String>,
    pub line: Option<String>,
    pub time: Duration,
    pub status: Option<String>,
    pub skipped: bool,
    /// Final-attempt `failure` and `error` records, in document order.
    pub failures: Vec<RawFailure>,
    /// `flakyFailure`/`flakyError`/`rerunFailure`/`rerunError` records.
    pub retry_records: Vec<RawFailure>,
}

impl RawTestCase {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    pub fn is_skipped(&self) -> bool {
        self.skipped
            || self.status.as_deref().is_some_and(|status| {
                matches!(
                    status.trim().to_ascii_lowercase().as_str(),
                    "disabled" | "ignored" | "skipped"
                )
            })
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawSuite {
    pub name: String,
    pub file: Option<String>,
    pub line: Option<String>,
    pub test_cases: Vec<RawTestCase>,
    pub suites: Vec<RawSuite>,
}

impl RawSuite {
    pub fn is_empty(&self) -> bool {
        self.test_cases.is_empty() && self.suites.is_empty()
    }
}

#[derive(Debug, Default)]
struct XmlElement {
    name: String,
    attributes: IndexMap<String, String>,
    text: String,
    children: Vec<XmlElement>,
}

impl XmlElement {
    fn from_start(start: &BytesStart<'_>) -> Self {
        let name = String::from_utf8_lossy(start.local_name().as_ref()).to_string();
        let mut attributes = IndexMap::new();
        let mut raw_attributes = start.attributes();
        raw_attributes.with_checks(false);
        for attr in raw_attributes.flatten() {
            let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).to_string();
            let value = attr
                .unescape_value()
                .map(|v| v.to_string())
                .unwrap_or_else(|_| String::from_utf8_lossy(&attr.value).to_string());
            attributes.insert(key, value);
        }
        Self {
            name,
            attributes,
            ..Self::default()
        }
    }

    fn attr(&self, key: &str) -> Option<String> {
        self.attributes.get(key).cloned()
    }

    fn children_named<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a XmlElement> + 'a {
        self.children.iter().filter(move |child| child.name == tag)
    }
}

fn read_element_tree(xml: &str) -> Result<XmlElement, XmlDecodeError> {
    let mut reader = Reader::from_str(xml.trim_start_matches('\u{feff}'));
    reader.trim_text(true);

    let mut stack: Vec<XmlElement> = vec![];
    let mut root: Option<XmlElement> = None;
    let malformed = |reader: &Reader<&[u8]>, message: String| XmlDecodeError::Malformed {
        position: reader.buffer_position(),
        message,
    };

    loop {
        match reader.read_event() {
            Ok(Event::Start(start)) => stack.push(XmlElement::from_start(&start)),
            Ok(Event::Empty(start)) => {
                let element = XmlElement::from_start(&start);
                match stack.last_mut() {
                    Some(parent) => parent.children.push(element),
                    None => {
                        root.get_or_insert(element);
                    }
                }
            }
            Ok(Event::End(_)) => {
                let Some(element) = stack.pop() else {
                    return Err(malformed(&reader, "unbalanced closing tag".to_string()));
                };
                match stack.last_mut() {
                    Some(parent) => parent.children.push(element),
                    None => {
                        root.get_or_insert(element);
                    }
                }
            }
            Ok(Event::Text(text)) => {
                if let Some(current) = stack.last_mut() {
                    let decoded = text
                        .unescape()
                        .map(|t| t.to_string())
                        .unwrap_or_else(|_| String::from_utf8_lossy(&text).to_string());
                    current.text.push_str(&decoded);
                }
            }
            Ok(Event::CData(cdata)) => {
                if let Some(current) = stack.last_mut() {
                    current
                        .text
                        .push_str(&String::from_utf8_lossy(&cdata.into_inner()));
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(err) => return Err(malformed(&reader, err.to_string())),
        }
    }

    if let Some(open) = stack.last() {
        return Err(malformed(
            &reader,
            format!("unexpected end of document inside <{}>", open.name),
        ));
    }
    root.ok_or(XmlDecodeError::Empty)
}

/// Decodes a report document into its root suite.
///
/// Both `<testsuites>` and a bare `<testsuite>` are accepted as the root; the
/// root itself is treated as a suite so its test cases are not lost.
pub fn decode_report(xml: &str) -> Result<RawSuite, XmlDecodeError> {
    let root = read_element_tree(xml)?;
    if root.name != TESTSUITES_TAG && root.name != TESTSUITE_TAG {
        return Err(XmlDecodeError::UnexpectedRoot { found: root.name });
    }
    Ok(decode_suite(&root))
}

pub fn read_report_file(path: &Path) -> Result<RawSuite, ReportError> {
    let bytes = std::fs::read(path).map_err(|source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    decode_report_at(&String::from_utf8_lossy(&bytes), path)
}

/// [`decode_report`] with errors attributed to `path`.
pub fn decode_report_at(xml: &str, path: &Path) -> Result<RawSuite, ReportError> {
    decode_report(xml).map_err(|err| match err {
        XmlDecodeError::UnexpectedRoot { .. } | XmlDecodeError::Empty => {
            ReportError::MissingRootSuite {
                path: path.to_path_buf(),
            }
        }
        XmlDecodeError::Malformed { .. } => ReportError::XmlParse {
            path: path.to_path_buf(),
            message: err.to_string(),
        },
    })
}

fn decode_suite(element: &XmlElement) -> RawSuite {
    RawSuite {
        name: element.attr("name").unwrap_or_default(),
        file: element.attr("file"),
        line: element.attr("line"),
        test_cases: element.children_named(TESTCASE_TAG).map(decode_test_case).collect(),
        suites: element
            .children
            .iter()
            .filter(|child| child.name == TESTSUITE_TAG || child.name == TESTSUITES_TAG)
            .map(decode_suite)
            .collect(),
    }
}

fn decode_test_case(element: &XmlElement) -> RawTestCase {
    let mut failures = vec![];
    let mut retry_records = vec![];
    for child in &element.children {
        let Some(kind) = FailureKind::from_tag(&child.name) else {
            continue;
        };
        let record = RawFailure {
            kind,
            message: child.attr("message"),
            failure_type: child.attr("type"),
            text: child.text.clone(),
            file: child.attr("file"),
            line: child.attr("line"),
        };
        if kind.is_retry_record() {
            retry_records.push(record);
        } else {
            failures.push(record);
        }
    }

    RawTestCase {
        name: element.attr("name").unwrap_or_default(),
        classname: element.attr("classname").filter(|c| !c.is_empty()),
        file: element.attr("file").filter(|f| !f.is_empty()),
        line: element.attr("line"),
        time: element.attr("time").map(|t| parse_seconds(&t)).unwrap_or_default(),
        status: element.attr("status"),
        skipped: element.children_named(SKIPPED_TAG).next().is_some(),
        failures,
        retry_records,
    }
}

fn parse_seconds(raw: &str) -> Duration {
    raw.trim()
        .replace(',', "")
        .parse::<f64>()
        .ok()
        .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
        .unwrap_or_default()
}
