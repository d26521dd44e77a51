use super::model::AggregateRow;

/// Headline numbers for the current selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Summary {
    pub total_observations: u64,
    /// `floor(100 * highlighted / total)`; `None` when nothing is selected.
    pub black_bear_percentage: Option<u64>,
}

impl Summary {
    /// Compute from already-filtered aggregate rows. `highlight` is the
    /// category whose share is reported (the canonical "Black Bear").
    pub fn from_rows<'a, I>(rows: I, highlight: &str) -> Self
    where
        I: IntoIterator<Item = &'a AggregateRow>,
    {
        let (total, highlighted) = rows.into_iter().fold((0u64, 0u64), |(t, h), row| {
            let h = if row.common_name == highlight { h + row.count } else { h };
            (t + row.count, h)
        });

        Self {
            total_observations: total,
            black_bear_percentage: (total > 0).then(|| highlighted * 100 / total),
        }
    }

    /// Percentage as shown in the header.
    pub fn percentage_label(&self) -> String {
        match self.black_bear_percentage {
            Some(p) => format!("{p} %"),
            None => "n/a".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn agg(year: i32, name: &str, count: u64) -> AggregateRow {
        AggregateRow {
            observation_year: year,
            common_name: name.to_string(),
            count,
        }
    }

    #[test]
    fn empty_selection_degrades_to_zero_and_none() {
        let rows: Vec<AggregateRow> = Vec::new();
        let s = Summary::from_rows(&rows, "Black Bear");
        assert_eq!(s.total_observations, 0);
        assert_eq!(s.black_bear_percentage, None);
        assert_eq!(s.percentage_label(), "n/a");
    }

    #[test]
    fn percentage_is_floored() {
        let rows = vec![agg(2020, "Black Bear", 2), agg(2020, "Grizzly Bear", 1)];
        let s = Summary::from_rows(&rows, "Black Bear");
        assert_eq!(s.total_observations, 3);
        assert_eq!(s.black_bear_percentage, Some(66));
        assert_eq!(s.percentage_label(), "66 %");
    }

    proptest! {
        #[test]
        fn percentage_stays_within_bounds(
            counts in prop::collection::vec((0u64..1000, any::<bool>()), 1..20)
        ) {
            let rows: Vec<AggregateRow> = counts
                .iter()
                .map(|(c, black)| agg(2020, if *black { "Black Bear" } else { "Grizzly Bear" }, *c))
                .collect();
            let s = Summary::from_rows(&rows, "Black Bear");
            if s.total_observations > 0 {
                let p = s.black_bear_percentage.unwrap();
                prop_assert!(p <= 100);
            } else {
                prop_assert_eq!(s.black_bear_percentage, None);
            }
        }
    }
}
