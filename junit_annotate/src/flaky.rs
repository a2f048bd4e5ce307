use indexmap::IndexMap;
use tracing::debug;

use crate::report_xml::RawTestCase;

/// One logical test after duplicate executions were folded together.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconciledCase {
    pub case: RawTestCase,
    /// Extra executions of the same test found in the suite.
    pub retries: usize,
}

impl ReconciledCase {
    pub fn single(case: RawTestCase) -> Self {
        Self { case, retries: 0 }
    }
}

type ReconcileKey = (String, Option<String>, Option<String>);

fn reconcile_key(case: &RawTestCase) -> ReconcileKey {
    (case.name.clone(), case.classname.clone(), case.file.clone())
}

/// Passes every case through untouched.
pub fn without_reconciliation(cases: &[RawTestCase]) -> Vec<ReconciledCase> {
    cases.iter().cloned().map(ReconciledCase::single).collect()
}

/// Folds repeated executions of the same test within one suite.
///
/// Executions are grouped by name, classname and file, so equally named tests
/// of different classes stay apart. A group succeeds if any execution
/// succeeded; the surviving record is the last successful execution, or the
/// last execution when every one of them failed. Groups keep the position of
/// their first execution.
pub fn reconcile_retries(cases: &[RawTestCase]) -> Vec<ReconciledCase> {
    let mut groups: IndexMap<ReconcileKey, Vec<&RawTestCase>> = IndexMap::new();
    for case in cases {
        groups.entry(reconcile_key(case)).or_default().push(case);
    }

    groups
        .into_iter()
        .map(|((name, _, _), executions)| {
            let retries = executions.len() - 1;
            let survivor = executions
                .iter()
                .rev()
                .find(|execution| !execution.has_failures())
                .or_else(|| executions.last())
                .map(|execution| (*execution).clone())
                .unwrap_or_default();
            if retries > 0 {
                debug!(
                    "Reconciled {} executions of {name} (passed: {})",
                    executions.len(),
                    !survivor.has_failures()
                );
            }
            ReconciledCase {
                case: survivor,
                retries,
            }
        })
        .collect()
}
