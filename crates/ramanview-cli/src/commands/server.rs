use std::sync::Arc;

use ramanview_core::{EngineConfig, SelectionHub};

pub fn run(metadata: &str, spectra: &str, host: &str, port: u16) {
    let cohort = Arc::new(super::load_cohort_or_exit(metadata, spectra));
    let hub = Arc::new(SelectionHub::new());
    let config = EngineConfig::default();

    let base = format!("http://{host}:{port}");
    println!("Ramanview Server v{}", ramanview_core::VERSION);
    println!("   {base}");
    println!(
        "   {} patients, {} grid measurements loaded",
        cohort.patients.len(),
        cohort.measurements.len()
    );
    println!();
    println!("   Endpoints:");
    println!("     GET  /                      API index (try: curl {base})");
    println!("     GET  /patients              Normalized cohort");
    println!("     GET  /flow?levels=...       Categorical flow graph");
    println!("     GET  /heatmap?patient=&wavelength=   Folded grid samples");
    println!("     GET  /series?patient=       Spectral series");
    println!("     GET  /selection             Current selection state");
    println!("     POST /selection/patient     {{\"patient\": \"P1\"|null}}");
    println!("     POST /selection/wavelength  {{\"wavelength\": 800.0|null}}");
    println!("     POST /selection/cell        {{\"cell\": {{\"line\":2,\"ring\":5}}|null}}");
    println!("     GET  /health                Health check");
    println!();
    println!("   Examples:");
    println!("     curl {base}/heatmap?patient=P1&wavelength=800");
    println!("     curl -X POST {base}/selection/patient -H 'content-type: application/json' -d '{{\"patient\":\"P1\"}}'");
    println!();

    let rt = tokio::runtime::Runtime::new().unwrap();
    rt.block_on(ramanview_server::run_server(cohort, hub, config, host, port));
}
