use std::collections::BTreeMap;

use super::model::{AggregateRow, AggregateTable, YearCategory};

/// Count rows per `(year, category)` pair.
///
/// Output is ordered by year, then category name.
pub fn aggregate<T: YearCategory>(rows: &[T]) -> AggregateTable {
    let mut counts: BTreeMap<(i32, &str), u64> = BTreeMap::new();
    for row in rows {
        *counts.entry((row.year(), row.category())).or_default() += 1;
    }

    AggregateTable {
        rows: counts
            .into_iter()
            .map(|((observation_year, name), count)| AggregateRow {
                observation_year,
                common_name: name.to_string(),
                count,
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::data::model::Observation;

    fn obs(year: i32, name: &str) -> Observation {
        Observation {
            observed_on: NaiveDate::from_ymd_opt(year, 7, 1).unwrap(),
            observation_year: year,
            scientific_name: "Ursus".to_string(),
            common_name: name.to_string(),
            latitude: 50.0,
            longitude: -122.0,
            image_url: String::new(),
        }
    }

    #[test]
    fn empty_input_gives_empty_table() {
        let rows: Vec<Observation> = Vec::new();
        assert!(aggregate(&rows).is_empty());
    }

    #[test]
    fn counts_are_grouped_and_sorted_by_year() {
        let rows = vec![
            obs(2021, "Grizzly Bear"),
            obs(2019, "Black Bear"),
            obs(2021, "Black Bear"),
            obs(2021, "Grizzly Bear"),
            obs(2019, "Black Bear"),
        ];
        let table = aggregate(&rows);
        let got: Vec<(i32, &str, u64)> = table
            .rows
            .iter()
            .map(|r| (r.observation_year, r.common_name.as_str(), r.count))
            .collect();
        assert_eq!(
            got,
            vec![
                (2019, "Black Bear", 2),
                (2021, "Black Bear", 1),
                (2021, "Grizzly Bear", 2),
            ]
        );
        let total: u64 = table.rows.iter().map(|r| r.count).sum();
        assert_eq!(total as usize, rows.len());
    }
}
