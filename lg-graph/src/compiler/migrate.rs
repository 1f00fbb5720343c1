//! Legacy `graph-*` label detection.
//!
//! Early labs embedded layout hints directly in the YAML as node labels.
//! That data now lives in the annotation sidecar; this detector reports one
//! migration per node still carrying legacy labels so the host can persist
//! them. The YAML itself is never touched.

use lg_core::annotations::{
    GeoCoordinates,
    LabAnnotations,
    Position,
};
use tracing::{
    debug,
    instrument,
};

use crate::model::GraphLabelMigration;
use crate::topology::{
    TopologySection,
    scalar_to_string,
};

/// The legacy label keys promoted into the sidecar.
pub const LEGACY_GRAPH_LABELS: [&str; 8] = [
    "graph-posX",
    "graph-posY",
    "graph-icon",
    "graph-group",
    "graph-level",
    "graph-groupLabelPos",
    "graph-geoCoordinateLat",
    "graph-geoCoordinateLng",
];

/// Parse a YAML scalar as a float, falling back to zero. Legacy labs carry
/// hand-edited values; a bad one should not lose the whole position.
fn parse_f64(value: &serde_yaml::Value) -> f64 {
    match value {
        serde_yaml::Value::Number(n) => n.as_f64().unwrap_or(0.0),
        serde_yaml::Value::String(s) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

fn parse_i64(value: &serde_yaml::Value) -> Option<i64> {
    match value {
        serde_yaml::Value::Number(n) => n.as_i64(),
        serde_yaml::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Scan all declared nodes for legacy labels. Nodes that already have a
/// sidecar annotation are left alone: the annotation is authoritative.
#[instrument(skip_all)]
pub fn detect_graph_label_migrations(
    topology: &TopologySection,
    annotations: &LabAnnotations,
) -> Vec<GraphLabelMigration> {
    let mut migrations = Vec::new();

    for (name, def) in &topology.nodes {
        if annotations.node(name).is_some() {
            continue;
        }
        let labels = topology.resolve(def).labels;
        if !LEGACY_GRAPH_LABELS.iter().any(|key| labels.contains_key(*key)) {
            continue;
        }
        debug!(node = name, "found legacy graph-* labels");

        let pos_x = labels.get("graph-posX");
        let pos_y = labels.get("graph-posY");
        let position = (pos_x.is_some() || pos_y.is_some()).then(|| Position {
            x: pos_x.map(parse_f64).unwrap_or_default(),
            y: pos_y.map(parse_f64).unwrap_or_default(),
        });

        let lat = labels.get("graph-geoCoordinateLat");
        let lng = labels.get("graph-geoCoordinateLng");
        let geo_coordinates = (lat.is_some() || lng.is_some()).then(|| GeoCoordinates {
            lat: lat.map(parse_f64).unwrap_or_default(),
            lng: lng.map(parse_f64).unwrap_or_default(),
        });

        let text_label = |key: &str| {
            labels
                .get(key)
                .map(scalar_to_string)
                .filter(|s| !s.is_empty())
        };

        migrations.push(GraphLabelMigration {
            node_id: name.clone(),
            position,
            icon: text_label("graph-icon"),
            group: text_label("graph-group"),
            level: labels.get("graph-level").and_then(parse_i64),
            group_label_pos: text_label("graph-groupLabelPos"),
            geo_coordinates,
        });
    }

    migrations
}
