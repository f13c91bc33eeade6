use ramanview_core::{build_flow, EngineConfig};

pub fn run(metadata: &str, spectra: &str, levels: Option<&str>, output_path: Option<&str>) {
    let cohort = super::load_cohort_or_exit(metadata, spectra);
    let config = EngineConfig::default();
    let levels = super::parse_levels(levels, &config);

    let graph = build_flow(&cohort.patients, &levels);
    if graph.nodes.is_empty() {
        println!("No flow to show (empty cohort).");
        return;
    }

    println!(
        "Flow graph: {} nodes, {} edges across {} levels",
        graph.nodes.len(),
        graph.edges.len(),
        levels.len()
    );
    if graph.dropped_edges > 0 {
        println!("  ({} edges dropped by the endpoint check)", graph.dropped_edges);
    }

    for (i, level) in levels.iter().enumerate() {
        println!("\n  {}", level.label());
        for node in graph.nodes_at(i) {
            let outgoing: u64 = graph
                .edges
                .iter()
                .filter(|e| e.source == node.id)
                .map(|e| e.weight as u64)
                .sum();
            if i + 1 < levels.len() {
                println!("    {:<28} {} onward", node.label, outgoing);
            } else {
                let incoming: u64 = graph
                    .edges
                    .iter()
                    .filter(|e| e.target == node.id)
                    .map(|e| e.weight as u64)
                    .sum();
                println!("    {:<28} {} arriving", node.label, incoming);
            }
        }
    }

    if let Some(path) = output_path {
        let json = serde_json::json!({
            "levels": levels.iter().map(|l| l.label()).collect::<Vec<_>>(),
            "graph": graph,
        });
        super::write_json(path, &json);
    }
}
