use ramanview_core::{color_domain, derive_delta, resolve_intensity, EngineConfig};

pub fn run(
    metadata: &str,
    spectra: &str,
    patient: &str,
    wavelength: f64,
    use_derived_delta: bool,
    output_path: Option<&str>,
) {
    let cohort = super::load_cohort_or_exit(metadata, spectra);
    let config = EngineConfig::default();

    if cohort.patient(patient).is_none() && cohort.measurements_for(patient).next().is_none() {
        eprintln!("Unknown patient: {patient}");
        std::process::exit(1);
    }

    let delta = if use_derived_delta {
        match derive_delta(&cohort.measurements) {
            Some(delta) => {
                println!("Using data-derived wavelength step {delta:.4}");
                delta
            }
            None => {
                eprintln!("No derivable wavelength step, using {}", config.wavelength_step);
                config.wavelength_step
            }
        }
    } else {
        config.wavelength_step
    };

    let samples = resolve_intensity(
        &cohort.measurements,
        patient,
        wavelength,
        &config.mirror,
        delta,
    );
    let domain = color_domain(&samples, config.intensity_clip);

    println!(
        "{} cells resolved for {patient} at [{wavelength}, {:.4})",
        samples.len(),
        wavelength + delta
    );
    println!(
        "Color domain: [{:.3}, {:.3}] ({}th percentile clip)",
        domain.min,
        domain.max,
        (config.intensity_clip * 100.0) as u32
    );
    println!("\n  {:>4} {:>4}  {:>10}", "line", "ring", "intensity");
    for s in &samples {
        println!("  {:>4} {:>4}  {:>10.3}", s.line, s.ring, s.intensity);
    }

    if let Some(path) = output_path {
        let json = serde_json::json!({
            "patient": patient,
            "wavelength": wavelength,
            "delta": delta,
            "samples": samples,
            "domain": domain,
        });
        super::write_json(path, &json);
    }
}
