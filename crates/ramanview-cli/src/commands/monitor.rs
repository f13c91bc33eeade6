use ramanview_core::EngineConfig;

pub fn run(metadata: &str, spectra: &str) {
    let cohort = super::load_cohort_or_exit(metadata, spectra);
    let mut app = crate::tui::app::App::new(cohort, EngineConfig::default());
    if let Err(e) = app.run() {
        eprintln!("TUI error: {e}");
        std::process::exit(1);
    }
}
