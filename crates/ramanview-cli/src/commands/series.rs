pub fn run(
    metadata: &str,
    spectra: &str,
    patient: &str,
    line: Option<u32>,
    ring: Option<u32>,
    output_path: Option<&str>,
) {
    let cohort = super::load_cohort_or_exit(metadata, spectra);

    let measurements: Vec<_> = cohort
        .measurements_for(patient)
        .filter(|m| line.is_none_or(|l| m.line == l))
        .filter(|m| ring.is_none_or(|r| m.ring == r))
        .collect();

    if measurements.is_empty() {
        println!("No series for {patient} with that filter.");
        return;
    }

    println!("{} series for {patient}", measurements.len());
    for m in &measurements {
        let lo = m.series.iter().map(|p| p.wavelength).fold(f64::MAX, f64::min);
        let hi = m.series.iter().map(|p| p.wavelength).fold(f64::MIN, f64::max);
        let peak = m.series.iter().map(|p| p.intensity).fold(f64::MIN, f64::max);
        println!(
            "  line {:>3} ring {:>3}  {:>5} points  wavelengths [{lo:.2}, {hi:.2}]  peak {peak:.3}",
            m.line,
            m.ring,
            m.series.len()
        );
    }

    if let Some(path) = output_path {
        let json = serde_json::json!({
            "patient": patient,
            "series": measurements,
        });
        super::write_json(path, &json);
    }
}
