// Copyright (c) The gpuconf Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Partitioning test outcomes by terminal result.

use crate::list::TestResult;
use indexmap::IndexMap;

/// Returns the entries of `statuses` whose value matches `status`,
/// preserving key identity and insertion order.
pub fn tests_with_status(
    statuses: &IndexMap<String, TestResult>,
    status: TestResult,
) -> IndexMap<String, TestResult> {
    statuses
        .iter()
        .filter(|(_, recorded)| **recorded == status)
        .map(|(name, recorded)| (name.clone(), *recorded))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn statuses() -> IndexMap<String, TestResult> {
        IndexMap::from([
            ("alpha".to_owned(), TestResult::Pass),
            ("beta".to_owned(), TestResult::Error),
            ("delta".to_owned(), TestResult::Pass),
            ("gamma".to_owned(), TestResult::Fail),
        ])
    }

    #[test]
    fn partition_preserves_insertion_order() {
        let passed = tests_with_status(&statuses(), TestResult::Pass);
        let names: Vec<_> = passed.keys().cloned().collect();
        assert_eq!(names, ["alpha", "delta"]);
    }

    #[test]
    fn empty_partitions_are_returned_not_omitted() {
        let skipped = tests_with_status(&statuses(), TestResult::Skip);
        assert!(skipped.is_empty());
    }

    #[test]
    fn partition_counts_sum_to_total() {
        let statuses = statuses();
        let total: usize = TestResult::ALL
            .iter()
            .map(|status| tests_with_status(&statuses, *status).len())
            .sum();
        assert_eq!(total, statuses.len());
    }
}
