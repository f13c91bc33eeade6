//! CLI for ramanview — linked-view exploration of spatial Raman cohorts.

mod commands;
mod tui;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "ramanview")]
#[command(about = "ramanview — linked-view explorer for spatial Raman patient cohorts")]
#[command(version = ramanview_core::VERSION)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load both tables and print a cohort overview
    Summary {
        /// Path to the patient metadata table (CSV)
        #[arg(long, default_value = "data/metadata.csv")]
        metadata: String,

        /// Path to the long-format spectral table (CSV)
        #[arg(long, default_value = "data/spectra.csv")]
        spectra: String,

        /// Write the overview as JSON
        #[arg(long)]
        output: Option<String>,
    },

    /// Build and print the categorical flow graph
    Flow {
        /// Path to the patient metadata table (CSV)
        #[arg(long, default_value = "data/metadata.csv")]
        metadata: String,

        /// Path to the long-format spectral table (CSV)
        #[arg(long, default_value = "data/spectra.csv")]
        spectra: String,

        /// Comma-separated level ordering (bmi, stage, age, gender, race)
        #[arg(long)]
        levels: Option<String>,

        /// Write the graph as JSON
        #[arg(long)]
        output: Option<String>,
    },

    /// Resolve the folded heatmap grid for one patient at one wavelength
    Heatmap {
        /// Path to the patient metadata table (CSV)
        #[arg(long, default_value = "data/metadata.csv")]
        metadata: String,

        /// Path to the long-format spectral table (CSV)
        #[arg(long, default_value = "data/spectra.csv")]
        spectra: String,

        /// Patient id
        #[arg(long)]
        patient: String,

        /// Query wavelength
        #[arg(long)]
        wavelength: f64,

        /// Estimate the match tolerance from the data instead of the default
        #[arg(long)]
        derive_delta: bool,

        /// Write the samples as JSON
        #[arg(long)]
        output: Option<String>,
    },

    /// Print the spectral series of one patient
    Series {
        /// Path to the patient metadata table (CSV)
        #[arg(long, default_value = "data/metadata.csv")]
        metadata: String,

        /// Path to the long-format spectral table (CSV)
        #[arg(long, default_value = "data/spectra.csv")]
        spectra: String,

        /// Patient id
        #[arg(long)]
        patient: String,

        /// Only the series at this raw line index
        #[arg(long)]
        line: Option<u32>,

        /// Only the series at this raw ring index
        #[arg(long)]
        ring: Option<u32>,

        /// Write the series as JSON
        #[arg(long)]
        output: Option<String>,
    },

    /// Interactive linked-view dashboard (TUI)
    Monitor {
        /// Path to the patient metadata table (CSV)
        #[arg(long, default_value = "data/metadata.csv")]
        metadata: String,

        /// Path to the long-format spectral table (CSV)
        #[arg(long, default_value = "data/spectra.csv")]
        spectra: String,
    },

    /// Start the diagnostic HTTP server
    Server {
        /// Path to the patient metadata table (CSV)
        #[arg(long, default_value = "data/metadata.csv")]
        metadata: String,

        /// Path to the long-format spectral table (CSV)
        #[arg(long, default_value = "data/spectra.csv")]
        spectra: String,

        /// Port to listen on
        #[arg(long, default_value = "8090")]
        port: u16,

        /// Bind address
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Summary {
            metadata,
            spectra,
            output,
        } => commands::summary::run(&metadata, &spectra, output.as_deref()),
        Commands::Flow {
            metadata,
            spectra,
            levels,
            output,
        } => commands::flow::run(&metadata, &spectra, levels.as_deref(), output.as_deref()),
        Commands::Heatmap {
            metadata,
            spectra,
            patient,
            wavelength,
            derive_delta,
            output,
        } => commands::heatmap::run(
            &metadata,
            &spectra,
            &patient,
            wavelength,
            derive_delta,
            output.as_deref(),
        ),
        Commands::Series {
            metadata,
            spectra,
            patient,
            line,
            ring,
            output,
        } => commands::series::run(&metadata, &spectra, &patient, line, ring, output.as_deref()),
        Commands::Monitor { metadata, spectra } => commands::monitor::run(&metadata, &spectra),
        Commands::Server {
            metadata,
            spectra,
            port,
            host,
        } => commands::server::run(&metadata, &spectra, &host, port),
    }
}
