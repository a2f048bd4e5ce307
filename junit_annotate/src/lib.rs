pub mod aggregate;
pub mod annotate;
pub mod args;
pub mod config;
pub mod error;
pub mod flaky;
pub mod logging;
pub mod model;
pub mod options;
pub mod path_resolver;
pub mod position;
pub mod report_glob;
pub mod report_xml;
pub mod run;
pub mod suite;
pub mod summary;
pub mod testcase;
pub mod transformer;

#[cfg(test)]
mod path_resolver_test;
#[cfg(test)]
mod position_test;
#[cfg(test)]
mod suite_test;
