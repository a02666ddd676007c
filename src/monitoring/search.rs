//! Local search over the current batch. Searching never goes back to the backend.

use crate::monitoring::aggregate::PartnerPeriodAggregate;

/// The records matching `query`, in their original order.
///
/// The query is trimmed and an empty query matches everything. Otherwise a
/// record matches when its name or external id contains the query, ignoring case.
pub fn filter<'a>(
    records: &'a [PartnerPeriodAggregate],
    query: &str,
) -> Vec<&'a PartnerPeriodAggregate> {
    let needle = query.trim().to_lowercase();

    records
        .iter()
        .filter(|record| matches(record, &needle))
        .collect()
}

/// Whether `record` matches an already trimmed and lowercased `needle`.
fn matches(record: &PartnerPeriodAggregate, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }

    record.full_name.to_lowercase().contains(needle)
        || record
            .external_id
            .as_deref()
            .is_some_and(|id| id.to_lowercase().contains(needle))
}

#[cfg(test)]
mod tests {
    use crate::monitoring::aggregate::PartnerPeriodAggregate;

    use super::filter;

    fn batch() -> Vec<PartnerPeriodAggregate> {
        vec![
            PartnerPeriodAggregate::new("1", "Siti Aminah").with_external_id("A1"),
            PartnerPeriodAggregate::new("2", "Budi Santoso").with_external_id("B2"),
            PartnerPeriodAggregate::new("3", "Rina Budiarti"),
        ]
    }

    #[test]
    fn empty_query_returns_everything_in_order() {
        let records = batch();

        for query in ["", "   "] {
            let result = filter(&records, query);

            assert_eq!(result, records.iter().collect::<Vec<_>>());
        }
    }

    #[test]
    fn matching_ignores_case() {
        let records = vec![PartnerPeriodAggregate::new("1", "Budi Santoso")];

        assert_eq!(filter(&records, "budi"), filter(&records, "BUDI"));
        assert_eq!(filter(&records, "budi").len(), 1);
    }

    #[test]
    fn matches_name_substrings_in_order() {
        let records = batch();

        let names: Vec<_> = filter(&records, " budi ")
            .into_iter()
            .map(|record| record.full_name.as_str())
            .collect();

        assert_eq!(names, ["Budi Santoso", "Rina Budiarti"]);
    }

    #[test]
    fn matches_external_id() {
        let records = batch();

        let result = filter(&records, "a1");

        assert_eq!(result, [&records[0]]);
    }

    #[test]
    fn no_match_is_empty() {
        assert!(filter(&batch(), "zzz").is_empty());
    }
}
