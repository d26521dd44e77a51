use chrono::NaiveDate;

// ---------------------------------------------------------------------------
// RawObservation – one row of the source file, before normalization
// ---------------------------------------------------------------------------

/// A single sighting exactly as read from disk.
///
/// `observed_on` stays text here so date parsing (and its failure mode)
/// belongs to the normalizer, whatever file format the row came from.
#[derive(Debug, Clone, PartialEq)]
pub struct RawObservation {
    pub observed_on: String,
    pub scientific_name: String,
    pub common_name: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Opaque, may be empty.
    pub image_url: String,
}

// ---------------------------------------------------------------------------
// Observation – one row of the cleaned table
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub observed_on: NaiveDate,
    /// Derived from `observed_on`.
    pub observation_year: i32,
    pub scientific_name: String,
    /// Canonicalized display name ("Black Bear", "Grizzly Bear", …).
    pub common_name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub image_url: String,
}

/// The normalized observation set. Produced once per source by the
/// normalizer and shared read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct CleanedTable {
    pub rows: Vec<Observation>,
}

impl CleanedTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// ---------------------------------------------------------------------------
// AggregateRow – (year, common name) → count
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateRow {
    pub observation_year: i32,
    pub common_name: String,
    pub count: u64,
}

/// Counts grouped by year and common name, ordered by year then name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregateTable {
    pub rows: Vec<AggregateRow>,
}

impl AggregateTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// `(min, max)` observation year, or `None` for an empty table.
    pub fn year_range(&self) -> Option<(i32, i32)> {
        let min = self.rows.iter().map(|r| r.observation_year).min()?;
        let max = self.rows.iter().map(|r| r.observation_year).max()?;
        Some((min, max))
    }

    /// Distinct common names in first-encounter order.
    pub fn categories(&self) -> Vec<String> {
        let mut seen: Vec<String> = Vec::new();
        for row in &self.rows {
            if !seen.iter().any(|c| c == &row.common_name) {
                seen.push(row.common_name.clone());
            }
        }
        seen
    }
}

// ---------------------------------------------------------------------------
// YearCategory – the shape the filter and aggregator need
// ---------------------------------------------------------------------------

/// Anything that has an observation year and a category label.
///
/// Both the cleaned and the aggregate table implement this so a single
/// filter predicate serves both.
pub trait YearCategory {
    fn year(&self) -> i32;
    fn category(&self) -> &str;
}

impl YearCategory for Observation {
    fn year(&self) -> i32 {
        self.observation_year
    }

    fn category(&self) -> &str {
        &self.common_name
    }
}

impl YearCategory for AggregateRow {
    fn year(&self) -> i32 {
        self.observation_year
    }

    fn category(&self) -> &str {
        &self.common_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agg(year: i32, name: &str, count: u64) -> AggregateRow {
        AggregateRow {
            observation_year: year,
            common_name: name.to_string(),
            count,
        }
    }

    #[test]
    fn year_range_of_empty_table_is_none() {
        assert_eq!(AggregateTable::default().year_range(), None);
    }

    #[test]
    fn year_range_and_categories() {
        let table = AggregateTable {
            rows: vec![
                agg(2019, "Grizzly Bear", 3),
                agg(2019, "Black Bear", 1),
                agg(2022, "Grizzly Bear", 2),
                agg(2021, "Spirit Bear", 1),
            ],
        };
        assert_eq!(table.year_range(), Some((2019, 2022)));
        assert_eq!(
            table.categories(),
            vec!["Grizzly Bear", "Black Bear", "Spirit Bear"]
        );
    }
}
