//! Categorical flow graph for the metadata overview.
//!
//! Each configured level is one categorical patient attribute; the graph has
//! one node per distinct (level, value) pair and one weighted edge per
//! observed transition between values at consecutive levels. Rebuilt fresh
//! from the patient set whenever the cohort changes; never persisted.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::record::Patient;

// ---------------------------------------------------------------------------
// Levels
// ---------------------------------------------------------------------------

/// One categorical attribute usable as a flow stage. The left-to-right
/// ordering of levels is a configuration input, not baked into the builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FlowLevel {
    Bmi,
    Stage,
    AgeBracket,
    Gender,
    Race,
}

impl FlowLevel {
    /// Default left-to-right ordering.
    pub const DEFAULT_ORDER: [FlowLevel; 5] = [
        FlowLevel::Bmi,
        FlowLevel::Stage,
        FlowLevel::AgeBracket,
        FlowLevel::Gender,
        FlowLevel::Race,
    ];

    /// Column heading shown above the level.
    pub fn label(self) -> &'static str {
        match self {
            Self::Bmi => "BMI",
            Self::Stage => "Stage",
            Self::AgeBracket => "Age Bracket",
            Self::Gender => "Gender",
            Self::Race => "Race",
        }
    }

    /// The patient's bucketed value at this level.
    pub fn value_of(self, patient: &Patient) -> &str {
        match self {
            Self::Bmi => &patient.bmi_bucket,
            Self::Stage => &patient.stage,
            Self::AgeBracket => &patient.age_bracket,
            Self::Gender => &patient.gender,
            Self::Race => &patient.race,
        }
    }

    /// Parse a level name as given on the command line.
    pub fn parse(s: &str) -> Option<FlowLevel> {
        match s.to_lowercase().as_str() {
            "bmi" => Some(Self::Bmi),
            "stage" => Some(Self::Stage),
            "age" | "agebracket" | "age_bracket" => Some(Self::AgeBracket),
            "gender" => Some(Self::Gender),
            "race" => Some(Self::Race),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Graph types
// ---------------------------------------------------------------------------

/// A distinct categorical value at one level. The (level, label) pair is the
/// identity; `level` is the stable stage index rendering relies on — never
/// inferred from coordinates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowNode {
    pub id: usize,
    pub label: String,
    pub level: usize,
}

/// Visual emphasis of an edge under the node-toggle interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum EdgeEmphasis {
    #[default]
    Neutral,
    /// Incident to the selected node: full-weight visual emphasis.
    Active,
    /// Not incident to the selected node while one is selected.
    Dimmed,
}

/// A patient-count transition between values at consecutive levels.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowEdge {
    pub source: usize,
    pub target: usize,
    pub weight: u32,
    pub emphasis: EdgeEmphasis,
}

/// The complete flow graph plus its toggle-selection state.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FlowGraph {
    pub nodes: Vec<FlowNode>,
    pub edges: Vec<FlowEdge>,
    /// Edges discarded by the endpoint check.
    pub dropped_edges: usize,
    selected: Option<usize>,
}

impl FlowGraph {
    /// Node id for a (level, label) pair.
    pub fn node_id(&self, level: usize, label: &str) -> Option<usize> {
        self.nodes
            .iter()
            .find(|n| n.level == level && n.label == label)
            .map(|n| n.id)
    }

    pub fn nodes_at(&self, level: usize) -> impl Iterator<Item = &FlowNode> {
        self.nodes.iter().filter(move |n| n.level == level)
    }

    pub fn selected_node(&self) -> Option<usize> {
        self.selected
    }

    /// Sum of outgoing edge weights from all nodes at one level.
    pub fn outgoing_weight(&self, level: usize) -> u64 {
        self.edges
            .iter()
            .filter(|e| {
                self.nodes
                    .get(e.source)
                    .is_some_and(|n| n.level == level)
            })
            .map(|e| e.weight as u64)
            .sum()
    }

    /// Toggle node selection: selecting flags every incident edge active and
    /// every other edge dimmed; selecting the same node again clears.
    pub fn toggle_node(&mut self, id: usize) {
        if id >= self.nodes.len() {
            return;
        }
        self.selected = if self.selected == Some(id) {
            None
        } else {
            Some(id)
        };
        self.apply_emphasis();
    }

    fn apply_emphasis(&mut self) {
        match self.selected {
            None => {
                for edge in &mut self.edges {
                    edge.emphasis = EdgeEmphasis::Neutral;
                }
            }
            Some(id) => {
                for edge in &mut self.edges {
                    edge.emphasis = if edge.source == id || edge.target == id {
                        EdgeEmphasis::Active
                    } else {
                        EdgeEmphasis::Dimmed
                    };
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Build the flow graph for the given patients and level ordering.
///
/// Nodes collapse duplicate (level, value) pairs; edges connect consecutive
/// levels only, weighted by the number of patients following the
/// transition. Zero-weight transitions never materialize. An edge whose
/// endpoint fails to resolve is dropped with a data-integrity warning
/// rather than aborting the build.
pub fn build_flow(patients: &[Patient], levels: &[FlowLevel]) -> FlowGraph {
    let mut graph = FlowGraph::default();
    let mut index: HashMap<(usize, String), usize> = HashMap::new();

    for patient in patients {
        for (level, attr) in levels.iter().enumerate() {
            let value = attr.value_of(patient);
            let key = (level, value.to_string());
            if !index.contains_key(&key) {
                let id = graph.nodes.len();
                index.insert(key, id);
                graph.nodes.push(FlowNode {
                    id,
                    label: value.to_string(),
                    level,
                });
            }
        }
    }

    for window in 0..levels.len().saturating_sub(1) {
        // BTreeMap keeps the edge list deterministic for export.
        let mut transitions: BTreeMap<(String, String), u32> = BTreeMap::new();
        for patient in patients {
            let src = levels[window].value_of(patient).to_string();
            let dst = levels[window + 1].value_of(patient).to_string();
            *transitions.entry((src, dst)).or_insert(0) += 1;
        }
        for ((src, dst), weight) in transitions {
            let source = index.get(&(window, src.clone())).copied();
            let target = index.get(&(window + 1, dst.clone())).copied();
            match (source, target) {
                (Some(source), Some(target)) => graph.edges.push(FlowEdge {
                    source,
                    target,
                    weight,
                    emphasis: EdgeEmphasis::Neutral,
                }),
                _ => {
                    graph.dropped_edges += 1;
                    log::warn!("flow edge {src:?} -> {dst:?} references a missing node, dropped");
                }
            }
        }
    }

    graph
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{normalize, Patient};
    use crate::table::MetadataRow;

    fn patient(id: &str, stage: &str, gender: &str, bmi: f64, age: f64) -> Patient {
        let row = MetadataRow {
            patient_id: id.to_string(),
            gender: gender.to_string(),
            age: Some(age),
            race: "White".to_string(),
            ethnicity: "Unknown".to_string(),
            bmi: Some(bmi),
            stage: stage.to_string(),
            spectral_data: "No".to_string(),
        };
        normalize(&[row], &[]).patients.remove(0)
    }

    fn sample_patients() -> Vec<Patient> {
        vec![
            patient("P1", "III", "Male Gender", 27.3, 61.0),
            patient("P2", "I", "Female Gender", 21.0, 44.0),
            patient("P3", "IVA", "Male Gender", 27.9, 66.0),
            patient("P4", "", "Female Gender", 17.0, 52.0),
        ]
    }

    #[test]
    fn nodes_collapse_duplicate_level_values() {
        let graph = build_flow(&sample_patients(), &FlowLevel::DEFAULT_ORDER);
        // Two late-stage patients produce one "Late Stage" node.
        let late: Vec<_> = graph
            .nodes
            .iter()
            .filter(|n| n.label == "Late Stage")
            .collect();
        assert_eq!(late.len(), 1);
        assert_eq!(late[0].level, 1);
    }

    #[test]
    fn same_label_under_two_levels_is_two_nodes() {
        // A label appearing at two different levels must not collapse into
        // one node: identity is (level, label).
        let patients = sample_patients();
        let graph = build_flow(&patients, &[FlowLevel::Gender, FlowLevel::Gender]);
        assert_eq!(graph.nodes.iter().filter(|n| n.label == "Male").count(), 2);
        let ids: Vec<_> = graph
            .nodes
            .iter()
            .filter(|n| n.label == "Male")
            .map(|n| n.id)
            .collect();
        assert_ne!(ids[0], ids[1]);
    }

    #[test]
    fn edges_connect_consecutive_levels_only() {
        let graph = build_flow(&sample_patients(), &FlowLevel::DEFAULT_ORDER);
        for edge in &graph.edges {
            let src_level = graph.nodes[edge.source].level;
            let dst_level = graph.nodes[edge.target].level;
            assert_eq!(dst_level, src_level + 1);
            assert!(edge.weight >= 1);
        }
        assert_eq!(graph.dropped_edges, 0);
    }

    #[test]
    fn flow_mass_is_conserved_per_transition() {
        let patients = sample_patients();
        let graph = build_flow(&patients, &FlowLevel::DEFAULT_ORDER);
        // Every patient has a defined value at every level after bucketing,
        // so each transition carries the full cohort.
        for level in 0..FlowLevel::DEFAULT_ORDER.len() - 1 {
            assert_eq!(graph.outgoing_weight(level), patients.len() as u64);
        }
    }

    #[test]
    fn toggle_marks_incident_edges_active_and_others_dimmed() {
        let mut graph = build_flow(&sample_patients(), &FlowLevel::DEFAULT_ORDER);
        let node = graph.node_id(1, "Late Stage").expect("node exists");
        graph.toggle_node(node);

        assert_eq!(graph.selected_node(), Some(node));
        for edge in &graph.edges {
            if edge.source == node || edge.target == node {
                assert_eq!(edge.emphasis, EdgeEmphasis::Active);
            } else {
                assert_eq!(edge.emphasis, EdgeEmphasis::Dimmed);
            }
        }
    }

    #[test]
    fn toggle_same_node_again_clears() {
        let mut graph = build_flow(&sample_patients(), &FlowLevel::DEFAULT_ORDER);
        let node = graph.node_id(3, "Male").expect("node exists");
        graph.toggle_node(node);
        graph.toggle_node(node);
        assert_eq!(graph.selected_node(), None);
        assert!(graph
            .edges
            .iter()
            .all(|e| e.emphasis == EdgeEmphasis::Neutral));
    }

    #[test]
    fn toggle_other_node_moves_selection() {
        let mut graph = build_flow(&sample_patients(), &FlowLevel::DEFAULT_ORDER);
        let a = graph.node_id(3, "Male").expect("node exists");
        let b = graph.node_id(3, "Female").expect("node exists");
        graph.toggle_node(a);
        graph.toggle_node(b);
        assert_eq!(graph.selected_node(), Some(b));
    }

    #[test]
    fn toggle_out_of_range_is_ignored() {
        let mut graph = build_flow(&sample_patients(), &FlowLevel::DEFAULT_ORDER);
        graph.toggle_node(usize::MAX);
        assert_eq!(graph.selected_node(), None);
    }

    #[test]
    fn empty_cohort_builds_empty_graph() {
        let graph = build_flow(&[], &FlowLevel::DEFAULT_ORDER);
        assert!(graph.nodes.is_empty());
        assert!(graph.edges.is_empty());
    }

    #[test]
    fn level_parse_accepts_cli_names() {
        assert_eq!(FlowLevel::parse("bmi"), Some(FlowLevel::Bmi));
        assert_eq!(FlowLevel::parse("age_bracket"), Some(FlowLevel::AgeBracket));
        assert_eq!(FlowLevel::parse("Race"), Some(FlowLevel::Race));
        assert_eq!(FlowLevel::parse("ethnicity"), None);
    }

    #[test]
    fn graph_serializes_for_export() {
        let graph = build_flow(&sample_patients(), &FlowLevel::DEFAULT_ORDER);
        let json = serde_json::to_value(&graph).expect("serialize");
        assert!(json["nodes"].as_array().is_some_and(|n| !n.is_empty()));
        assert!(json["edges"].as_array().is_some_and(|e| !e.is_empty()));
    }
}
