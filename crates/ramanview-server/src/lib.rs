//! Diagnostic HTTP server for the ramanview engine.
//!
//! Serves the derived structures — patients, flow graph, resolved heatmap
//! samples, spectral series — and the shared selection state as JSON, so
//! external tooling can observe (and drive) the same session a local
//! dashboard renders. Local, single-user surface; no auth, no persistence.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};

use ramanview_core::views::{SeriesTrace, TraceEmphasis};
use ramanview_core::{
    build_flow, color_domain, mirror_cell, resolve_intensity, ColorDomain, EngineConfig, FlowLevel,
    GridCell, GridCellSample, NormalizedCohort, Patient, SelectionHub, SelectionState,
};

/// Shared server state. The cohort is read-only after load; the hub carries
/// the only mutable session state.
pub struct AppState {
    cohort: Arc<NormalizedCohort>,
    hub: Arc<SelectionHub>,
    config: EngineConfig,
}

impl AppState {
    pub fn new(cohort: Arc<NormalizedCohort>, hub: Arc<SelectionHub>, config: EngineConfig) -> Self {
        Self { cohort, hub, config }
    }
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct PatientsResponse {
    patients: Vec<Patient>,
    total: usize,
}

#[derive(Serialize)]
struct HeatmapResponse {
    patient: Option<String>,
    wavelength: Option<f64>,
    samples: Vec<GridCellSample>,
    domain: ColorDomain,
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Serialize)]
struct SeriesResponse {
    patient: Option<String>,
    traces: Vec<SeriesTrace>,
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    patients: usize,
    measurements: usize,
}

// ---------------------------------------------------------------------------
// Query/body types
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct HeatmapParams {
    /// Patient to resolve; falls back to the current selection.
    patient: Option<String>,
    /// Query wavelength; falls back to the current selection.
    wavelength: Option<f64>,
}

#[derive(Deserialize)]
struct SeriesParams {
    patient: Option<String>,
}

#[derive(Deserialize)]
struct FlowParams {
    /// Comma-separated level ordering, e.g. `bmi,stage,gender`.
    levels: Option<String>,
}

#[derive(Deserialize)]
struct PatientSelection {
    patient: Option<String>,
}

#[derive(Deserialize)]
struct WavelengthSelection {
    wavelength: Option<f64>,
}

#[derive(Deserialize)]
struct CellSelection {
    cell: Option<GridCell>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn handle_index(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "name": "Ramanview Server",
        "version": ramanview_core::VERSION,
        "patients": state.cohort.patients.len(),
        "measurements": state.cohort.measurements.len(),
        "endpoints": {
            "/": "This API index",
            "/patients": "Normalized patient cohort",
            "/flow": {
                "method": "GET",
                "description": "Categorical flow graph",
                "params": { "levels": "Comma-separated level order (default: bmi,stage,age,gender,race)" },
            },
            "/heatmap": {
                "method": "GET",
                "description": "Folded grid samples at a wavelength",
                "params": {
                    "patient": "Patient id (default: current selection)",
                    "wavelength": "Query wavelength (default: current selection)",
                },
            },
            "/series": "Spectral series for a patient (default: current selection)",
            "/selection": "Current selection state",
            "/selection/patient": "POST {\"patient\": \"P1\"|null}",
            "/selection/wavelength": "POST {\"wavelength\": 800.0|null}",
            "/selection/cell": "POST {\"cell\": {\"line\": 2, \"ring\": 5}|null}",
            "/health": "Health check",
        },
    }))
}

async fn handle_patients(State(state): State<Arc<AppState>>) -> Json<PatientsResponse> {
    let patients = state.cohort.patients.clone();
    let total = patients.len();
    Json(PatientsResponse { patients, total })
}

async fn handle_flow(
    State(state): State<Arc<AppState>>,
    Query(params): Query<FlowParams>,
) -> (StatusCode, Json<serde_json::Value>) {
    let levels: Vec<FlowLevel> = match params.levels {
        Some(ref spec) => {
            let parsed: Option<Vec<FlowLevel>> =
                spec.split(',').map(|s| FlowLevel::parse(s.trim())).collect();
            match parsed {
                Some(levels) if levels.len() >= 2 => levels,
                _ => {
                    return (
                        StatusCode::BAD_REQUEST,
                        Json(serde_json::json!({
                            "success": false,
                            "error": format!("unknown or insufficient levels: {spec}"),
                        })),
                    );
                }
            }
        }
        None => state.config.flow_levels.clone(),
    };
    let graph = build_flow(&state.cohort.patients, &levels);
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "success": true,
            "levels": levels.iter().map(|l| l.label()).collect::<Vec<_>>(),
            "graph": graph,
        })),
    )
}

async fn handle_heatmap(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HeatmapParams>,
) -> (StatusCode, Json<HeatmapResponse>) {
    let selection = state.hub.snapshot();
    let patient = params.patient.or(selection.patient);
    let wavelength = params.wavelength.or(selection.wavelength);

    let (Some(patient_id), Some(wavelength)) = (patient.clone(), wavelength) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(HeatmapResponse {
                patient,
                wavelength,
                samples: Vec::new(),
                domain: ColorDomain { min: 0.0, max: 1.0 },
                success: false,
                error: Some("patient and wavelength required (query or selection)".to_string()),
            }),
        );
    };

    let samples = resolve_intensity(
        &state.cohort.measurements,
        &patient_id,
        wavelength,
        &state.config.mirror,
        state.config.wavelength_step,
    );
    let domain = color_domain(&samples, state.config.intensity_clip);
    (
        StatusCode::OK,
        Json(HeatmapResponse {
            patient: Some(patient_id),
            wavelength: Some(wavelength),
            samples,
            domain,
            success: true,
            error: None,
        }),
    )
}

async fn handle_series(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SeriesParams>,
) -> (StatusCode, Json<SeriesResponse>) {
    let selection = state.hub.snapshot();
    let Some(patient) = params.patient.or(selection.patient.clone()) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(SeriesResponse {
                patient: None,
                traces: Vec::new(),
                success: false,
                error: Some("patient required (query or selection)".to_string()),
            }),
        );
    };

    let traces = state
        .cohort
        .measurements_for(&patient)
        .map(|m| {
            let folded = mirror_cell(
                GridCell {
                    line: m.line,
                    ring: m.ring,
                },
                &state.config.mirror,
            );
            let emphasis = match selection.cell {
                Some(cell) if cell != folded => TraceEmphasis::Suppressed,
                _ => TraceEmphasis::Full,
            };
            SeriesTrace {
                line: m.line,
                ring: m.ring,
                points: m.series.clone(),
                emphasis,
            }
        })
        .collect();

    (
        StatusCode::OK,
        Json(SeriesResponse {
            patient: Some(patient),
            traces,
            success: true,
            error: None,
        }),
    )
}

async fn handle_selection(State(state): State<Arc<AppState>>) -> Json<SelectionState> {
    Json(state.hub.snapshot())
}

async fn handle_select_patient(
    State(state): State<Arc<AppState>>,
    Json(body): Json<PatientSelection>,
) -> Json<SelectionState> {
    state.hub.set_selected_patient(body.patient);
    Json(state.hub.snapshot())
}

async fn handle_select_wavelength(
    State(state): State<Arc<AppState>>,
    Json(body): Json<WavelengthSelection>,
) -> Json<SelectionState> {
    state.hub.set_selected_wavelength(body.wavelength);
    Json(state.hub.snapshot())
}

async fn handle_select_cell(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CellSelection>,
) -> Json<SelectionState> {
    state.hub.set_selected_cell(body.cell);
    Json(state.hub.snapshot())
}

async fn handle_health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: if state.cohort.is_empty() {
            "empty".to_string()
        } else {
            "ok".to_string()
        },
        patients: state.cohort.patients.len(),
        measurements: state.cohort.measurements.len(),
    })
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Build the axum router.
fn build_router(state: AppState) -> Router {
    let state = Arc::new(state);
    Router::new()
        .route("/", get(handle_index))
        .route("/patients", get(handle_patients))
        .route("/flow", get(handle_flow))
        .route("/heatmap", get(handle_heatmap))
        .route("/series", get(handle_series))
        .route("/selection", get(handle_selection))
        .route("/selection/patient", post(handle_select_patient))
        .route("/selection/wavelength", post(handle_select_wavelength))
        .route("/selection/cell", post(handle_select_cell))
        .route("/health", get(handle_health))
        .with_state(state)
}

/// Run the HTTP server until the process exits.
pub async fn run_server(
    cohort: Arc<NormalizedCohort>,
    hub: Arc<SelectionHub>,
    config: EngineConfig,
    host: &str,
    port: u16,
) {
    let app = build_router(AppState::new(cohort, hub, config));
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;
    use ramanview_core::normalize;
    use ramanview_core::table::{parse_metadata, parse_spectral};

    fn test_state() -> AppState {
        let metadata = parse_metadata(
            "Patient_ID,Gender,Age,Race,Ethnicity,BMI,Staging_Overall,Spectral_Data\n\
             P1,Male Gender,61,Other,Unknown,27.3,III,pos\n",
        );
        let spectral = parse_spectral(
            "Patient_ID,Line,Ring,Wavelength,Intensity\n\
             P1,3,40,800.05,12.4\n",
        );
        AppState::new(
            Arc::new(normalize(&metadata, &spectral)),
            Arc::new(SelectionHub::new()),
            EngineConfig::default(),
        )
    }

    #[test]
    fn heatmap_response_serializes_with_folded_cells() {
        let state = test_state();
        let samples = resolve_intensity(
            &state.cohort.measurements,
            "P1",
            800.0,
            &state.config.mirror,
            state.config.wavelength_step,
        );
        let response = HeatmapResponse {
            patient: Some("P1".to_string()),
            wavelength: Some(800.0),
            domain: color_domain(&samples, state.config.intensity_clip),
            samples,
            success: true,
            error: None,
        };
        let json = serde_json::to_value(&response).expect("serialize");
        assert_eq!(json["samples"][0]["line"], 7);
        assert_eq!(json["samples"][0]["ring"], 11);
        assert!(json.get("error").is_none(), "error omitted when None");
    }

    #[test]
    fn selection_body_deserializes_explicit_null() {
        let body: PatientSelection = serde_json::from_str(r#"{"patient": null}"#).expect("parse");
        assert_eq!(body.patient, None);
        let body: CellSelection =
            serde_json::from_str(r#"{"cell": {"line": 2, "ring": 5}}"#).expect("parse");
        assert_eq!(body.cell, Some(GridCell { line: 2, ring: 5 }));
    }

    #[test]
    fn router_builds() {
        let _router = build_router(test_state());
    }
}
