use std::collections::BTreeSet;

use super::model::{AggregateTable, YearCategory};

// ---------------------------------------------------------------------------
// Selection: year interval + allowed categories
// ---------------------------------------------------------------------------

/// What the sidebar currently selects.
///
/// A row passes when its year lies in `[start_year, end_year]` and its
/// category is in `categories`. An inverted interval or an empty category
/// set simply matches nothing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Selection {
    pub start_year: i32,
    pub end_year: i32,
    pub categories: BTreeSet<String>,
}

impl Selection {
    /// Select everything in the aggregate table (the initial UI state).
    pub fn all(table: &AggregateTable) -> Self {
        let (start_year, end_year) = table.year_range().unwrap_or((0, 0));
        Self {
            start_year,
            end_year,
            categories: table.categories().into_iter().collect(),
        }
    }

    pub fn matches(&self, year: i32, category: &str) -> bool {
        year >= self.start_year && year <= self.end_year && self.categories.contains(category)
    }
}

/// Return indices of rows that pass the selection, in input order.
pub fn filtered_indices<T: YearCategory>(rows: &[T], selection: &Selection) -> Vec<usize> {
    rows.iter()
        .enumerate()
        .filter(|(_, row)| selection.matches(row.year(), row.category()))
        .map(|(i, _)| i)
        .collect()
}

/// Borrowed view of the rows that pass the selection.
pub fn select<'a, T: YearCategory>(rows: &'a [T], selection: &Selection) -> Vec<&'a T> {
    rows.iter()
        .filter(|row| selection.matches(row.year(), row.category()))
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use proptest::prelude::*;

    use super::*;
    use crate::data::aggregate::aggregate;
    use crate::data::model::{AggregateRow, Observation};

    const NAMES: [&str; 3] = ["Black Bear", "Grizzly Bear", "Spirit Bear"];

    fn obs(year: i32, name: &str) -> Observation {
        Observation {
            observed_on: NaiveDate::from_ymd_opt(year, 5, 20).unwrap(),
            observation_year: year,
            scientific_name: "Ursus".to_string(),
            common_name: name.to_string(),
            latitude: 50.0,
            longitude: -122.0,
            image_url: String::new(),
        }
    }

    fn selection(start: i32, end: i32, names: &[&str]) -> Selection {
        Selection {
            start_year: start,
            end_year: end,
            categories: names.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn arb_rows() -> impl Strategy<Value = Vec<Observation>> {
        prop::collection::vec((2018i32..2025, 0usize..NAMES.len()), 0..60)
            .prop_map(|v| v.into_iter().map(|(y, n)| obs(y, NAMES[n])).collect())
    }

    fn arb_names() -> impl Strategy<Value = Vec<&'static str>> {
        prop::sample::subsequence(NAMES.to_vec(), 0..=NAMES.len())
    }

    #[test]
    fn all_selects_full_range_and_every_category() {
        let table = aggregate(&[obs(2019, "Grizzly Bear"), obs(2023, "Black Bear")]);
        let sel = Selection::all(&table);
        assert_eq!((sel.start_year, sel.end_year), (2019, 2023));
        assert_eq!(sel.categories.len(), 2);
        assert_eq!(filtered_indices(&table.rows, &sel), vec![0, 1]);
    }

    #[test]
    fn interval_is_closed() {
        let rows = vec![obs(2019, "Black Bear"), obs(2020, "Black Bear"), obs(2021, "Black Bear")];
        assert_eq!(
            filtered_indices(&rows, &selection(2019, 2020, &["Black Bear"])),
            vec![0, 1]
        );
    }

    #[test]
    fn inverted_interval_matches_nothing() {
        let rows = vec![obs(2019, "Black Bear"), obs(2020, "Grizzly Bear")];
        assert!(filtered_indices(&rows, &selection(2021, 2019, &NAMES)).is_empty());
    }

    #[test]
    fn empty_category_set_matches_nothing() {
        let rows = vec![obs(2019, "Black Bear")];
        assert!(select(&rows, &selection(2018, 2030, &[])).is_empty());
    }

    #[test]
    fn same_predicate_serves_aggregate_rows() {
        let rows = vec![
            AggregateRow { observation_year: 2019, common_name: "Black Bear".into(), count: 4 },
            AggregateRow { observation_year: 2020, common_name: "Grizzly Bear".into(), count: 1 },
        ];
        let picked = select(&rows, &selection(2018, 2030, &["Grizzly Bear"]));
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].count, 1);
    }

    proptest! {
        #[test]
        fn aggregate_counts_sum_to_matching_rows(
            rows in arb_rows(),
            a in 2017i32..2026,
            b in 2017i32..2026,
            names in arb_names(),
        ) {
            let sel = selection(a, b, &names);
            let table = aggregate(&rows);
            let summed: u64 = select(&table.rows, &sel).iter().map(|r| r.count).sum();
            prop_assert_eq!(summed as usize, filtered_indices(&rows, &sel).len());
        }

        #[test]
        fn widening_never_shrinks_the_result(
            rows in arb_rows(),
            start in 2018i32..2025,
            len in 0i32..4,
            widen_low in 0i32..3,
            widen_high in 0i32..3,
            names in arb_names(),
            extra in arb_names(),
        ) {
            let narrow = selection(start, start + len, &names);
            let mut wide_names = names.clone();
            wide_names.extend(extra);
            let wide = selection(start - widen_low, start + len + widen_high, &wide_names);

            prop_assert!(filtered_indices(&rows, &wide).len() >= filtered_indices(&rows, &narrow).len());
        }

        #[test]
        fn degenerate_interval_is_empty(rows in arb_rows(), start in 2019i32..2026, gap in 1i32..5) {
            let sel = selection(start, start - gap, &NAMES);
            prop_assert!(filtered_indices(&rows, &sel).is_empty());
        }
    }
}
