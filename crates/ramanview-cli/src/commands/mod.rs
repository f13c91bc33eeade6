pub mod flow;
pub mod heatmap;
pub mod monitor;
pub mod series;
pub mod server;
pub mod summary;

use std::path::Path;

use ramanview_core::{normalize, table, EngineConfig, FlowLevel, NormalizedCohort};

/// Load both tables and run one normalization pass. Table I/O failures are
/// the only fatal errors at this layer; malformed rows are skipped inside
/// the normalizer.
pub fn load_cohort(metadata: &str, spectra: &str) -> std::io::Result<NormalizedCohort> {
    let metadata_rows = table::read_metadata_table(Path::new(metadata))?;
    let spectral_rows = table::read_spectral_table(Path::new(spectra))?;
    Ok(normalize(&metadata_rows, &spectral_rows))
}

/// Like [`load_cohort`], but print-and-exit on I/O failure — the shape every
/// subcommand wants.
pub fn load_cohort_or_exit(metadata: &str, spectra: &str) -> NormalizedCohort {
    match load_cohort(metadata, spectra) {
        Ok(cohort) => {
            if cohort.is_empty() {
                eprintln!("Warning: no usable rows in {metadata} / {spectra}");
            }
            cohort
        }
        Err(e) => {
            eprintln!("Failed to load tables: {e}");
            std::process::exit(1);
        }
    }
}

/// Parse a comma-separated level ordering, falling back to the configured
/// default on unknown names.
pub fn parse_levels(spec: Option<&str>, config: &EngineConfig) -> Vec<FlowLevel> {
    match spec {
        Some(spec) => {
            let parsed: Option<Vec<FlowLevel>> =
                spec.split(',').map(|s| FlowLevel::parse(s.trim())).collect();
            match parsed {
                Some(levels) if levels.len() >= 2 => levels,
                _ => {
                    eprintln!("Unknown or insufficient levels '{spec}', using default order");
                    config.flow_levels.clone()
                }
            }
        }
        None => config.flow_levels.clone(),
    }
}

/// Write a JSON value to disk, pretty-printed.
pub fn write_json(path: &str, value: &serde_json::Value) {
    match serde_json::to_string_pretty(value) {
        Ok(contents) => {
            if let Err(e) = std::fs::write(path, contents) {
                eprintln!("Failed to write {path}: {e}");
            } else {
                println!("Wrote {path}");
            }
        }
        Err(e) => eprintln!("Failed to serialize output: {e}"),
    }
}
