use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::error::LoadError;
use super::model::{CleanedTable, Observation, RawObservation};

// ---------------------------------------------------------------------------
// Normalization rules
// ---------------------------------------------------------------------------

/// Parameters of the cleaning pass. The defaults describe the BC dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizeRules {
    /// Rows observed before this year are dropped.
    pub min_year: i32,
    /// Family-level placeholders that would double-count real subspecies.
    pub excluded_taxa: Vec<String>,
    /// Any common name containing this substring is merged…
    pub canonical_match: String,
    /// …into this label.
    pub canonical_label: String,
}

impl Default for NormalizeRules {
    fn default() -> Self {
        Self {
            min_year: 2018,
            excluded_taxa: vec!["Ursinae".to_string(), "Ursidae".to_string()],
            canonical_match: "Black".to_string(),
            canonical_label: "Black Bear".to_string(),
        }
    }
}

impl NormalizeRules {
    /// Merge every name containing `canonical_match` into `canonical_label`.
    ///
    /// Lossy: "American Black Bear" and "Black Bear" become indistinguishable.
    pub fn canonicalize_name(&self, name: &str) -> String {
        if name.contains(&self.canonical_match) {
            self.canonical_label.clone()
        } else {
            name.to_string()
        }
    }

    pub fn is_excluded(&self, scientific_name: &str) -> bool {
        self.excluded_taxa.iter().any(|t| t == scientific_name)
    }
}

// ---------------------------------------------------------------------------
// Date parsing
// ---------------------------------------------------------------------------

/// Parse an ISO-8601-ish date. Time-of-day, if present, is discarded.
pub fn parse_observed_on(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if let Ok(d) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(d);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.date_naive());
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S %z"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, fmt) {
            return Some(dt.date());
        }
        if let Ok(dt) = DateTime::parse_from_str(text, fmt) {
            return Some(dt.date_naive());
        }
    }
    NaiveDate::parse_from_str(text, "%Y/%m/%d").ok()
}

// ---------------------------------------------------------------------------
// Normalizer
// ---------------------------------------------------------------------------

/// Turn raw rows into the cleaned table.
///
/// Steps run in a fixed order: derive year, drop early years, drop
/// excluded taxa, canonicalize names, project. Dates are validated for
/// every row before anything is dropped, so a bad date anywhere in the
/// source fails the load.
pub fn normalize(raw: Vec<RawObservation>, rules: &NormalizeRules) -> Result<CleanedTable, LoadError> {
    let total = raw.len();

    let dated = raw
        .into_iter()
        .enumerate()
        .map(|(row, rec)| {
            let date = parse_observed_on(&rec.observed_on).ok_or_else(|| {
                LoadError::malformed(row, format!("unparseable date '{}'", rec.observed_on))
            })?;
            Ok((date, rec))
        })
        .collect::<Result<Vec<_>, LoadError>>()?;

    let rows: Vec<Observation> = dated
        .into_iter()
        .filter(|(date, _)| date.year() >= rules.min_year)
        .filter(|(_, rec)| !rules.is_excluded(&rec.scientific_name))
        .map(|(date, rec)| Observation {
            observed_on: date,
            observation_year: date.year(),
            common_name: rules.canonicalize_name(&rec.common_name),
            scientific_name: rec.scientific_name,
            latitude: rec.latitude,
            longitude: rec.longitude,
            image_url: rec.image_url,
        })
        .collect();

    log::debug!(
        "normalized {total} raw rows into {} observations ({} dropped)",
        rows.len(),
        total - rows.len()
    );

    Ok(CleanedTable { rows })
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn raw(date: &str, sci: &str, common: &str) -> RawObservation {
        RawObservation {
            observed_on: date.to_string(),
            scientific_name: sci.to_string(),
            common_name: common.to_string(),
            latitude: 50.0,
            longitude: -122.0,
            image_url: String::new(),
        }
    }

    #[test]
    fn date_forms() {
        let want = NaiveDate::from_ymd_opt(2019, 6, 14).unwrap();
        for text in [
            "2019-06-14",
            " 2019-06-14 ",
            "2019-06-14T08:30:00Z",
            "2019-06-14T08:30:00-07:00",
            "2019-06-14 08:30:00",
            "2019-06-14T08:30:00",
            "2019/06/14",
        ] {
            assert_eq!(parse_observed_on(text), Some(want), "{text}");
        }
        assert_eq!(parse_observed_on("14 June 2019"), None);
        assert_eq!(parse_observed_on(""), None);
    }

    #[test]
    fn drops_early_years_and_family_placeholders() {
        let table = normalize(
            vec![
                raw("2017-12-31", "Ursus americanus", "American Black Bear"),
                raw("2018-01-01", "Ursus americanus", "American Black Bear"),
                raw("2021-04-02", "Ursidae", "Bears"),
                raw("2021-04-03", "Ursinae", "Typical Bears"),
                raw("2021-04-04", "Ursus arctos", "Grizzly Bear"),
            ],
            &NormalizeRules::default(),
        )
        .unwrap();

        let years: Vec<i32> = table.rows.iter().map(|r| r.observation_year).collect();
        assert_eq!(years, vec![2018, 2021]);
        assert!(table.rows.iter().all(|r| !["Ursinae", "Ursidae"].contains(&r.scientific_name.as_str())));
    }

    #[test]
    fn canonicalizes_black_variants_only() {
        let rules = NormalizeRules::default();
        assert_eq!(rules.canonicalize_name("American Black Bear"), "Black Bear");
        assert_eq!(rules.canonicalize_name("Cinnamon Black Bear"), "Black Bear");
        assert_eq!(rules.canonicalize_name("Grizzly Bear"), "Grizzly Bear");
        // Case-sensitive.
        assert_eq!(rules.canonicalize_name("black bear"), "black bear");
    }

    #[test]
    fn bad_date_fails_fast_even_on_a_row_that_would_be_dropped() {
        let err = normalize(
            vec![
                raw("2019-06-14", "Ursus americanus", "Black Bear"),
                raw("sometime", "Ursidae", "Bears"),
            ],
            &NormalizeRules::default(),
        )
        .unwrap_err();
        match err {
            LoadError::MalformedRecord { row, reason } => {
                assert_eq!(row, 1);
                assert!(reason.contains("sometime"));
            }
            other => panic!("expected MalformedRecord, got {other:?}"),
        }
    }

    #[test]
    fn custom_rules_apply() {
        let rules = NormalizeRules {
            min_year: 2020,
            excluded_taxa: vec![],
            canonical_match: "Grizzly".to_string(),
            canonical_label: "Brown Bear".to_string(),
        };
        let table = normalize(
            vec![
                raw("2019-01-01", "Ursus arctos", "Grizzly Bear"),
                raw("2020-01-01", "Ursidae", "Grizzly Bear"),
            ],
            &rules,
        )
        .unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.rows[0].common_name, "Brown Bear");
    }

    proptest! {
        #[test]
        fn canonicalization_is_idempotent(name in "[A-Za-z ]{0,24}") {
            let rules = NormalizeRules::default();
            let once = rules.canonicalize_name(&name);
            prop_assert_eq!(rules.canonicalize_name(&once), once.clone());
            if once.contains("Black") {
                prop_assert_eq!(once, "Black Bear");
            }
        }

        #[test]
        fn cleaned_rows_satisfy_invariants(
            rows in prop::collection::vec(
                (
                    2010i32..2025,
                    1u32..=12,
                    1u32..=28,
                    prop::sample::select(vec!["Ursus americanus", "Ursus arctos", "Ursidae", "Ursinae"]),
                    prop::sample::select(vec!["American Black Bear", "Grizzly Bear", "Kermode Black Bear", "Bears"]),
                ),
                0..40,
            )
        ) {
            let raw_rows: Vec<RawObservation> = rows
                .iter()
                .map(|(y, m, d, sci, common)| raw(&format!("{y:04}-{m:02}-{d:02}"), sci, common))
                .collect();
            let table = normalize(raw_rows, &NormalizeRules::default()).unwrap();
            for row in &table.rows {
                prop_assert!(row.observation_year >= 2018);
                prop_assert!(row.scientific_name != "Ursidae" && row.scientific_name != "Ursinae");
                prop_assert!(!row.common_name.contains("Black") || row.common_name == "Black Bear");
            }
        }
    }
}
