//! Raw table rows and the CSV-splitting adapter.
//!
//! The engine consumes typed rows; turning file bytes into those rows is the
//! job of an external reader. This module carries the thin stand-in used by
//! the CLI and tests: a header-mapped splitter that never drops a row —
//! unparseable numeric fields become `None`, and the normalizer owns the
//! drop policy.

use std::collections::HashMap;
use std::io;
use std::path::Path;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// One row of the patient metadata table, fields as delivered by the reader.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataRow {
    pub patient_id: String,
    pub gender: String,
    /// `None` when the field was missing or not a finite number.
    pub age: Option<f64>,
    pub race: String,
    pub ethnicity: String,
    /// `None` when the field was missing or not a finite number.
    pub bmi: Option<f64>,
    /// Raw disease-stage label (e.g. "III", "IVA", empty).
    pub stage: String,
    /// Raw spectral-availability flag ("pos"/"Yes"/"No").
    pub spectral_data: String,
}

/// One long-format row of the spectral table: a single wavelength/intensity
/// pair at one grid position of one patient.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpectralRow {
    pub patient_id: String,
    pub line: Option<u32>,
    pub ring: Option<u32>,
    pub wavelength: Option<f64>,
    pub intensity: Option<f64>,
}

// ---------------------------------------------------------------------------
// Header-mapped CSV splitting
// ---------------------------------------------------------------------------

/// Case-insensitive column lookup built from the header line.
struct HeaderMap {
    columns: HashMap<String, usize>,
}

impl HeaderMap {
    fn parse(header: &str) -> Self {
        let columns = header
            .split(',')
            .enumerate()
            .map(|(i, name)| (name.trim().to_lowercase(), i))
            .collect();
        Self { columns }
    }

    /// Index of the first matching alias, if any.
    fn find(&self, aliases: &[&str]) -> Option<usize> {
        aliases
            .iter()
            .find_map(|name| self.columns.get(*name).copied())
    }

    fn text(&self, fields: &[&str], idx: Option<usize>) -> String {
        idx.and_then(|i| fields.get(i))
            .map(|s| s.trim().to_string())
            .unwrap_or_default()
    }

    fn number(&self, fields: &[&str], idx: Option<usize>) -> Option<f64> {
        idx.and_then(|i| fields.get(i))
            .and_then(|s| s.trim().parse::<f64>().ok())
            .filter(|v| v.is_finite())
    }

    fn integer(&self, fields: &[&str], idx: Option<usize>) -> Option<u32> {
        idx.and_then(|i| fields.get(i))
            .and_then(|s| s.trim().parse::<u32>().ok())
    }
}

/// Split CSV text into metadata rows. Blank lines are skipped; every
/// non-blank data line yields a row.
pub fn parse_metadata(text: &str) -> Vec<MetadataRow> {
    let mut lines = text.lines().filter(|l| !l.trim().is_empty());
    let Some(header) = lines.next() else {
        return Vec::new();
    };
    let map = HeaderMap::parse(header);
    let id = map.find(&["patient_id", "patient_od", "id"]);
    let gender = map.find(&["gender"]);
    let age = map.find(&["age"]);
    let race = map.find(&["race"]);
    let ethnicity = map.find(&["ethnicity"]);
    let bmi = map.find(&["bmi"]);
    let stage = map.find(&["staging_overall", "stage"]);
    let spectral = map.find(&["spectral_data", "has_spectra"]);

    lines
        .map(|line| {
            let fields: Vec<&str> = line.split(',').collect();
            MetadataRow {
                patient_id: map.text(&fields, id),
                gender: map.text(&fields, gender),
                age: map.number(&fields, age),
                race: map.text(&fields, race),
                ethnicity: map.text(&fields, ethnicity),
                bmi: map.number(&fields, bmi),
                stage: map.text(&fields, stage),
                spectral_data: map.text(&fields, spectral),
            }
        })
        .collect()
}

/// Split CSV text into long-format spectral rows.
pub fn parse_spectral(text: &str) -> Vec<SpectralRow> {
    let mut lines = text.lines().filter(|l| !l.trim().is_empty());
    let Some(header) = lines.next() else {
        return Vec::new();
    };
    let map = HeaderMap::parse(header);
    let id = map.find(&["patient_id", "id"]);
    let line_idx = map.find(&["line"]);
    let ring_idx = map.find(&["ring"]);
    let wavelength = map.find(&["wavelength"]);
    let intensity = map.find(&["intensity"]);

    lines
        .map(|line| {
            let fields: Vec<&str> = line.split(',').collect();
            SpectralRow {
                patient_id: map.text(&fields, id),
                line: map.integer(&fields, line_idx),
                ring: map.integer(&fields, ring_idx),
                wavelength: map.number(&fields, wavelength),
                intensity: map.number(&fields, intensity),
            }
        })
        .collect()
}

/// Read and split the metadata table from disk.
pub fn read_metadata_table(path: &Path) -> io::Result<Vec<MetadataRow>> {
    Ok(parse_metadata(&std::fs::read_to_string(path)?))
}

/// Read and split the spectral table from disk.
pub fn read_spectral_table(path: &Path) -> io::Result<Vec<SpectralRow>> {
    Ok(parse_spectral(&std::fs::read_to_string(path)?))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
