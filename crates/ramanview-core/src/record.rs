//! Record normalization: raw table rows → the entities every view consumes.
//!
//! One pass over the two input tables produces the immutable session
//! collections: bucketed [`Patient`]s from the metadata table and grouped
//! [`Measurement`] series from the long-format spectral table. Rows missing
//! a required numeric field are skipped locally — a malformed row is never
//! fatal to the load — and the aggregate skip counts are kept on the output
//! for logging.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::table::{MetadataRow, SpectralRow};

// ---------------------------------------------------------------------------
// Bucket labels
// ---------------------------------------------------------------------------

pub const STAGE_HEALTHY: &str = "Healthy";
pub const STAGE_EARLY: &str = "Early Stage";
pub const STAGE_LATE: &str = "Late Stage";

pub const BMI_UNDERWEIGHT: &str = "Underweight";
pub const BMI_AVERAGE: &str = "Average Weight";
pub const BMI_OVERWEIGHT: &str = "Overweight";

pub const AGE_LOW_RISK: &str = "Below 50 (Low Risk)";
pub const AGE_HIGH_RISK: &str = "Above 50 (High Risk)";

pub const RACE_COLLAPSED: &str = "Unknown/Other";

// ---------------------------------------------------------------------------
// Bucketing rules
// ---------------------------------------------------------------------------

/// Binarize the raw gender label.
pub fn bucket_gender(raw: &str) -> &'static str {
    if raw.starts_with("Male") { "Male" } else { "Female" }
}

/// BMI bucket: underweight below 18.5, average below 24.9, overweight above.
pub fn bucket_bmi(bmi: f64) -> &'static str {
    if bmi < 18.5 {
        BMI_UNDERWEIGHT
    } else if bmi < 24.9 {
        BMI_AVERAGE
    } else {
        BMI_OVERWEIGHT
    }
}

/// Collapse the raw overall-staging label into three buckets.
///
/// Stage IV (any sub-stage) and III are late, I and II are early, and
/// anything else — missing, "NaN", or an unrecognized label — is healthy so
/// that bucketing stays total.
pub fn bucket_stage(raw: &str) -> &'static str {
    if raw.starts_with("IV") || raw == "III" {
        STAGE_LATE
    } else if raw == "I" || raw == "II" {
        STAGE_EARLY
    } else {
        STAGE_HEALTHY
    }
}

/// Age bracket at the 50-year risk threshold.
pub fn bucket_age(age: f64) -> &'static str {
    if age < 50.0 { AGE_LOW_RISK } else { AGE_HIGH_RISK }
}

/// Collapse "Unknown" and "Other" race labels; everything else unchanged.
pub fn bucket_race(raw: &str) -> String {
    if raw == "Unknown" || raw == "Other" {
        RACE_COLLAPSED.to_string()
    } else {
        raw.to_string()
    }
}

fn parse_spectral_flag(raw: &str) -> bool {
    raw.eq_ignore_ascii_case("pos") || raw.eq_ignore_ascii_case("yes")
}

// ---------------------------------------------------------------------------
// Normalized entities
// ---------------------------------------------------------------------------

/// One patient of the cohort, bucketed once at load and immutable after.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Patient {
    pub id: String,
    pub age: f64,
    pub bmi: f64,
    pub gender: String,
    pub race: String,
    pub ethnicity: String,
    /// Collapsed disease stage: Healthy / Early Stage / Late Stage.
    pub stage: String,
    pub age_bracket: String,
    pub bmi_bucket: String,
    pub has_spectra: bool,
}

/// One wavelength/intensity point of a spectrum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub wavelength: f64,
    pub intensity: f64,
}

/// The merged spectrum at one (patient, line, ring) grid position.
///
/// All spectral rows sharing the key are folded into one series in input
/// row order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Measurement {
    pub patient_id: String,
    pub line: u32,
    pub ring: u32,
    pub series: Vec<SeriesPoint>,
}

/// Output of one normalization pass. Read-only shared state for the rest of
/// the session.
#[derive(Debug, Clone, Default)]
pub struct NormalizedCohort {
    pub patients: Vec<Patient>,
    pub measurements: Vec<Measurement>,
    /// Metadata rows skipped for a missing numeric field or duplicate id.
    pub dropped_metadata_rows: usize,
    /// Spectral rows skipped for a missing numeric field.
    pub dropped_spectral_rows: usize,
}

impl NormalizedCohort {
    /// True when normalization produced nothing to show. The only
    /// user-visible failure mode: views render "no data" instead of
    /// crashing.
    pub fn is_empty(&self) -> bool {
        self.patients.is_empty() && self.measurements.is_empty()
    }

    pub fn patient(&self, id: &str) -> Option<&Patient> {
        self.patients.iter().find(|p| p.id == id)
    }

    /// All measurements belonging to one patient, in input order.
    pub fn measurements_for<'a>(
        &'a self,
        patient_id: &'a str,
    ) -> impl Iterator<Item = &'a Measurement> {
        self.measurements
            .iter()
            .filter(move |m| m.patient_id == patient_id)
    }
}

// ---------------------------------------------------------------------------
// Normalization pass
// ---------------------------------------------------------------------------

/// Convert raw rows into the normalized session collections.
///
/// Pure transform over the two inputs: metadata rows missing age or BMI and
/// spectral rows missing line, ring, wavelength or intensity are dropped
/// silently (counted on the output); spectral rows are grouped by
/// (patient, line, ring) with the series preserving row order.
pub fn normalize(metadata: &[MetadataRow], spectral: &[SpectralRow]) -> NormalizedCohort {
    let mut cohort = NormalizedCohort::default();
    let mut seen_ids: HashSet<String> = HashSet::new();

    for row in metadata {
        let (Some(age), Some(bmi)) = (row.age, row.bmi) else {
            cohort.dropped_metadata_rows += 1;
            continue;
        };
        if row.patient_id.is_empty() || !seen_ids.insert(row.patient_id.clone()) {
            cohort.dropped_metadata_rows += 1;
            continue;
        }
        cohort.patients.push(Patient {
            id: row.patient_id.clone(),
            age,
            bmi,
            gender: bucket_gender(&row.gender).to_string(),
            race: bucket_race(&row.race),
            ethnicity: row.ethnicity.clone(),
            stage: bucket_stage(&row.stage).to_string(),
            age_bracket: bucket_age(age).to_string(),
            bmi_bucket: bucket_bmi(bmi).to_string(),
            has_spectra: parse_spectral_flag(&row.spectral_data),
        });
    }

    // Group spectral rows by (patient, line, ring), preserving insertion
    // order for both the measurement list and each series.
    let mut index: HashMap<(String, u32, u32), usize> = HashMap::new();
    for row in spectral {
        let (Some(line), Some(ring), Some(wavelength), Some(intensity)) =
            (row.line, row.ring, row.wavelength, row.intensity)
        else {
            cohort.dropped_spectral_rows += 1;
            continue;
        };
        if row.patient_id.is_empty() {
            cohort.dropped_spectral_rows += 1;
            continue;
        }
        let key = (row.patient_id.clone(), line, ring);
        let point = SeriesPoint {
            wavelength,
            intensity,
        };
        match index.get(&key) {
            Some(&i) => cohort.measurements[i].series.push(point),
            None => {
                index.insert(key, cohort.measurements.len());
                cohort.measurements.push(Measurement {
                    patient_id: row.patient_id.clone(),
                    line,
                    ring,
                    series: vec![point],
                });
            }
        }
    }

    if cohort.dropped_metadata_rows > 0 || cohort.dropped_spectral_rows > 0 {
        log::warn!(
            "normalization skipped {} metadata and {} spectral rows",
            cohort.dropped_metadata_rows,
            cohort.dropped_spectral_rows
        );
    }

    cohort
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata_row(id: &str, age: Option<f64>, bmi: Option<f64>) -> MetadataRow {
        MetadataRow {
            patient_id: id.to_string(),
            gender: "Female Gender".to_string(),
            age,
            race: "White".to_string(),
            ethnicity: "Not Hispanic or Latino".to_string(),
            bmi,
            stage: "II".to_string(),
            spectral_data: "No".to_string(),
        }
    }

    fn spectral_row(id: &str, line: u32, ring: u32, w: f64, i: f64) -> SpectralRow {
        SpectralRow {
            patient_id: id.to_string(),
            line: Some(line),
            ring: Some(ring),
            wavelength: Some(w),
            intensity: Some(i),
        }
    }

    // -----------------------------------------------------------------------
    // Bucketing
    // -----------------------------------------------------------------------

    #[test]
    fn gender_binarizes_on_male_prefix() {
        assert_eq!(bucket_gender("Male Gender"), "Male");
        assert_eq!(bucket_gender("Female Gender"), "Female");
        assert_eq!(bucket_gender(""), "Female");
    }

    #[test]
    fn bmi_thresholds() {
        assert_eq!(bucket_bmi(18.4), BMI_UNDERWEIGHT);
        assert_eq!(bucket_bmi(18.5), BMI_AVERAGE);
        assert_eq!(bucket_bmi(24.8), BMI_AVERAGE);
        assert_eq!(bucket_bmi(24.9), BMI_OVERWEIGHT);
        assert_eq!(bucket_bmi(31.0), BMI_OVERWEIGHT);
    }

    #[test]
    fn stage_collapse() {
        assert_eq!(bucket_stage("IVA"), STAGE_LATE);
        assert_eq!(bucket_stage("IVB"), STAGE_LATE);
        assert_eq!(bucket_stage("III"), STAGE_LATE);
        assert_eq!(bucket_stage("I"), STAGE_EARLY);
        assert_eq!(bucket_stage("II"), STAGE_EARLY);
        assert_eq!(bucket_stage(""), STAGE_HEALTHY);
        assert_eq!(bucket_stage("NaN"), STAGE_HEALTHY);
    }

    #[test]
    fn age_threshold_at_fifty() {
        assert_eq!(bucket_age(49.9), AGE_LOW_RISK);
        assert_eq!(bucket_age(50.0), AGE_HIGH_RISK);
        assert_eq!(bucket_age(61.0), AGE_HIGH_RISK);
    }

    #[test]
    fn race_collapses_unknown_and_other() {
        assert_eq!(bucket_race("Unknown"), RACE_COLLAPSED);
        assert_eq!(bucket_race("Other"), RACE_COLLAPSED);
        assert_eq!(bucket_race("White"), "White");
    }

    #[test]
    fn bucketing_is_total_over_valid_rows() {
        // Every valid row maps to exactly one bucket per categorical field.
        for stage in ["", "I", "II", "III", "IVA", "IVB", "NaN", "junk"] {
            let bucket = bucket_stage(stage);
            assert!([STAGE_HEALTHY, STAGE_EARLY, STAGE_LATE].contains(&bucket));
        }
        for bmi in [0.0, 18.49, 18.5, 24.89, 24.9, 60.0] {
            let bucket = bucket_bmi(bmi);
            assert!([BMI_UNDERWEIGHT, BMI_AVERAGE, BMI_OVERWEIGHT].contains(&bucket));
        }
    }

    // -----------------------------------------------------------------------
    // Normalization pass
    // -----------------------------------------------------------------------

    #[test]
    fn scenario_metadata_row_normalizes_exactly() {
        let row = MetadataRow {
            patient_id: "P1".to_string(),
            gender: "Male Gender".to_string(),
            age: Some(61.0),
            race: "Other".to_string(),
            ethnicity: "Not Hispanic or Latino".to_string(),
            bmi: Some(27.3),
            stage: "III".to_string(),
            spectral_data: "pos".to_string(),
        };
        let cohort = normalize(&[row], &[]);
        let p = &cohort.patients[0];
        assert_eq!(p.stage, STAGE_LATE);
        assert_eq!(p.age_bracket, AGE_HIGH_RISK);
        assert_eq!(p.bmi_bucket, BMI_OVERWEIGHT);
        assert_eq!(p.gender, "Male");
        assert_eq!(p.race, RACE_COLLAPSED);
        assert!(p.has_spectra);
    }

    #[test]
    fn rows_missing_numerics_are_dropped_not_fatal() {
        let rows = vec![
            metadata_row("P1", Some(40.0), Some(21.0)),
            metadata_row("P2", None, Some(21.0)),
            metadata_row("P3", Some(40.0), None),
        ];
        let cohort = normalize(&rows, &[]);
        assert_eq!(cohort.patients.len(), 1);
        assert_eq!(cohort.dropped_metadata_rows, 2);
    }

    #[test]
    fn duplicate_patient_ids_first_wins() {
        let mut second = metadata_row("P1", Some(70.0), Some(30.0));
        second.gender = "Male Gender".to_string();
        let rows = vec![metadata_row("P1", Some(40.0), Some(21.0)), second];
        let cohort = normalize(&rows, &[]);
        assert_eq!(cohort.patients.len(), 1);
        assert_eq!(cohort.patients[0].age, 40.0);
        assert_eq!(cohort.dropped_metadata_rows, 1);
    }

    #[test]
    fn spectral_rows_group_by_patient_line_ring_in_order() {
        let rows = vec![
            spectral_row("P1", 3, 40, 800.05, 12.4),
            spectral_row("P1", 2, 5, 799.93, 4.2),
            spectral_row("P1", 3, 40, 800.17, 13.1),
        ];
        let cohort = normalize(&[], &rows);
        assert_eq!(cohort.measurements.len(), 2);
        let merged = &cohort.measurements[0];
        assert_eq!((merged.line, merged.ring), (3, 40));
        assert_eq!(merged.series.len(), 2);
        // Insertion-order union: later row appended after earlier one.
        assert_eq!(merged.series[0].wavelength, 800.05);
        assert_eq!(merged.series[1].wavelength, 800.17);
    }

    #[test]
    fn spectral_rows_missing_fields_are_dropped() {
        let mut bad = spectral_row("P1", 1, 1, 800.0, 1.0);
        bad.intensity = None;
        let cohort = normalize(&[], &[bad, spectral_row("P1", 1, 1, 800.1, 2.0)]);
        assert_eq!(cohort.measurements.len(), 1);
        assert_eq!(cohort.measurements[0].series.len(), 1);
        assert_eq!(cohort.dropped_spectral_rows, 1);
    }

    #[test]
    fn measurements_for_filters_by_patient() {
        let rows = vec![
            spectral_row("P1", 1, 1, 800.0, 1.0),
            spectral_row("P2", 1, 1, 800.0, 2.0),
            spectral_row("P1", 2, 1, 800.0, 3.0),
        ];
        let cohort = normalize(&[], &rows);
        assert_eq!(cohort.measurements_for("P1").count(), 2);
        assert_eq!(cohort.measurements_for("P2").count(), 1);
        assert_eq!(cohort.measurements_for("P3").count(), 0);
    }

    #[test]
    fn empty_inputs_yield_empty_cohort() {
        let cohort = normalize(&[], &[]);
        assert!(cohort.is_empty());
        assert_eq!(cohort.dropped_metadata_rows, 0);
    }
}
