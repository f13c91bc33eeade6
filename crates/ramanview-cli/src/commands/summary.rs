use std::collections::BTreeMap;

use ramanview_core::{derive_delta, record};

pub fn run(metadata: &str, spectra: &str, output_path: Option<&str>) {
    let cohort = super::load_cohort_or_exit(metadata, spectra);

    println!("Cohort Summary");
    println!("{:-<60}", "");
    println!(
        "  {} patients ({} metadata rows skipped)",
        cohort.patients.len(),
        cohort.dropped_metadata_rows
    );
    println!(
        "  {} grid measurements ({} spectral rows skipped)",
        cohort.measurements.len(),
        cohort.dropped_spectral_rows
    );

    let mut stages: BTreeMap<&str, usize> = BTreeMap::new();
    let mut genders: BTreeMap<&str, usize> = BTreeMap::new();
    let mut with_spectra = 0usize;
    for p in &cohort.patients {
        *stages.entry(p.stage.as_str()).or_insert(0) += 1;
        *genders.entry(p.gender.as_str()).or_insert(0) += 1;
        if p.has_spectra {
            with_spectra += 1;
        }
    }

    println!("\n  By stage:");
    for stage in [record::STAGE_HEALTHY, record::STAGE_EARLY, record::STAGE_LATE] {
        if let Some(n) = stages.get(stage) {
            println!("    {stage:<24} {n}");
        }
    }
    println!("\n  By gender:");
    for (gender, n) in &genders {
        println!("    {gender:<24} {n}");
    }
    println!("\n  {with_spectra} patients flagged with spectral data");

    let delta = derive_delta(&cohort.measurements);
    match delta {
        Some(delta) => println!("  Observed wavelength step: {delta:.4}"),
        None => println!("  Observed wavelength step: n/a (no multi-point series)"),
    }

    if let Some(path) = output_path {
        let json = serde_json::json!({
            "patients": cohort.patients.len(),
            "measurements": cohort.measurements.len(),
            "dropped_metadata_rows": cohort.dropped_metadata_rows,
            "dropped_spectral_rows": cohort.dropped_spectral_rows,
            "stages": stages,
            "genders": genders,
            "with_spectra": with_spectra,
            "observed_wavelength_step": delta,
        });
        super::write_json(path, &json);
    }
}
