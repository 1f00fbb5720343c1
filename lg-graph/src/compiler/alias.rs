//! Alias node handling.
//!
//! An alias lets one YAML bridge appear as several independently-positioned
//! visual nodes. Applied after all base nodes and edges exist, in three
//! phases: materialize alias nodes, rewire matching edge endpoints, then
//! soft-hide base bridges that no edge references directly anymore.

use std::collections::{
    HashMap,
    HashSet,
};

use lg_core::annotations::{
    LabAnnotations,
    NodeAnnotation,
    Position,
};
use tracing::{
    debug,
    instrument,
    warn,
};

use crate::compiler::nodes::is_bridge_kind;
use crate::model::{
    GraphElement,
    NodeElement,
    NodeExtraData,
    NodeVisibility,
};
use crate::topology::TopologySection;

/// Apply all three alias phases to the element list.
#[instrument(skip_all)]
pub fn apply_aliases(elements: &mut Vec<GraphElement>, topology: &TopologySection, annotations: &LabAnnotations) {
    // (base node id, interface) -> alias node id
    let mut rewire_map: HashMap<(String, String), String> = HashMap::new();
    let mut materialized: HashSet<String> = HashSet::new();
    let mut aliased_bases: Vec<String> = Vec::new();
    let mut new_nodes: Vec<NodeElement> = Vec::new();

    // Phase 1: materialize alias nodes, in annotation-list order.
    for (entry, annotation) in annotations.alias_entries() {
        let base_is_bridge = topology
            .resolve_node(entry.yaml_node_id)
            .is_some_and(|config| is_bridge_kind(&config.kind));
        if !base_is_bridge {
            debug!(
                alias = entry.alias_id,
                base = entry.yaml_node_id,
                "alias references a non-bridge or undeclared node, ignoring"
            );
            continue;
        }
        // Chained aliasing (base is itself an alias placement) is
        // unsupported: ignore rather than guess a chain-resolution rule.
        if annotations
            .node(entry.yaml_node_id)
            .is_some_and(NodeAnnotation::is_alias_placement)
        {
            warn!(alias = entry.alias_id, base = entry.yaml_node_id, "chained aliasing is unsupported, ignoring");
            continue;
        }

        rewire_map
            .entry((entry.yaml_node_id.to_string(), entry.interface.to_string()))
            .or_insert_with(|| entry.alias_id.to_string());
        if !aliased_bases.contains(&entry.yaml_node_id.to_string()) {
            aliased_bases.push(entry.yaml_node_id.to_string());
        }

        if !materialized.insert(entry.alias_id.to_string()) {
            continue;
        }
        let base = elements
            .iter()
            .filter_map(GraphElement::as_node)
            .find(|n| n.id == entry.yaml_node_id);
        let position = annotation
            .position
            .or_else(|| base.map(|n| n.position))
            .unwrap_or_else(Position::origin);

        new_nodes.push(NodeElement {
            id: entry.alias_id.to_string(),
            name: annotation
                .label
                .clone()
                .unwrap_or_else(|| entry.alias_id.to_string()),
            role: base.map(|n| n.role).unwrap_or_default(),
            position,
            extra: NodeExtraData {
                kind: base.map(|n| n.extra.kind.clone()).unwrap_or_default(),
                yaml_node_id: Some(entry.yaml_node_id.to_string()),
                ..Default::default()
            },
            ..Default::default()
        });
    }
    elements.extend(new_nodes.into_iter().map(GraphElement::Node));

    // Phase 2: rewire edges whose (node, interface) endpoint matches an
    // alias entry, preserving the original node id for traceability.
    for edge in elements.iter_mut().filter_map(GraphElement::as_edge_mut) {
        let source_key = (edge.source.clone(), edge.source_endpoint.clone().unwrap_or_default());
        if let Some(alias_id) = rewire_map.get(&source_key) {
            edge.extra.yaml_source_node_id = Some(edge.source.clone());
            edge.source = alias_id.clone();
        }
        let target_key = (edge.target.clone(), edge.target_endpoint.clone().unwrap_or_default());
        if let Some(alias_id) = rewire_map.get(&target_key) {
            edge.extra.yaml_target_node_id = Some(edge.target.clone());
            edge.target = alias_id.clone();
        }
    }

    // Phase 3: soft-hide base bridges no edge references directly anymore.
    for base_id in aliased_bases {
        let still_referenced = elements
            .iter()
            .filter_map(GraphElement::as_edge)
            .any(|e| e.source == base_id || e.target == base_id);
        if still_referenced {
            // An alias mapping gap: some interface of the base bridge has no
            // alias entry, so the base must stay visible.
            warn!(base = base_id, "bridge has aliases but is still referenced by edges, keeping it visible");
            continue;
        }
        if let Some(node) = elements
            .iter_mut()
            .filter_map(GraphElement::as_node_mut)
            .find(|n| n.id == base_id)
        {
            node.visibility = NodeVisibility::AliasedBaseBridge;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        EdgeElement,
        NodeRole,
    };
    use crate::topology::TopologyFile;

    fn parse_topology(doc: &str) -> TopologySection {
        serde_yaml::from_str::<TopologyFile>(doc).unwrap().topology.unwrap()
    }

    fn bridge_node(id: &str) -> GraphElement {
        GraphElement::Node(NodeElement {
            id: id.into(),
            name: id.into(),
            role: NodeRole::Bridge,
            position: Position { x: 10.0, y: 20.0 },
            extra: NodeExtraData { kind: "bridge".into(), ..Default::default() },
            ..Default::default()
        })
    }

    fn edge(id: &str, source: &str, source_ep: &str, target: &str, target_ep: &str) -> GraphElement {
        GraphElement::Edge(EdgeElement {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            source_endpoint: (!source_ep.is_empty()).then(|| source_ep.to_string()),
            target_endpoint: (!target_ep.is_empty()).then(|| target_ep.to_string()),
            ..Default::default()
        })
    }

    fn alias_annotation(id: &str, base: &str, iface: &str) -> NodeAnnotation {
        NodeAnnotation {
            id: id.into(),
            yaml_node_id: Some(base.into()),
            yaml_interface: Some(iface.into()),
            ..Default::default()
        }
    }

    const BRIDGE_TOPOLOGY: &str = "topology:\n  nodes:\n    br1: {kind: bridge}\n    r1: {kind: linux}\n    r2: {kind: linux}\n";

    #[test]
    fn alias_round_trip_rewires_and_hides_the_base() {
        let topology = parse_topology(BRIDGE_TOPOLOGY);
        let mut elements = vec![
            bridge_node("br1"),
            edge("Clab-Link0", "r1", "eth1", "br1", "eth1"),
            edge("Clab-Link1", "r2", "eth1", "br1", "eth2"),
        ];
        let annotations = LabAnnotations {
            node_annotations: vec![
                alias_annotation("a1", "br1", "eth1"),
                alias_annotation("a2", "br1", "eth2"),
            ],
            ..Default::default()
        };

        apply_aliases(&mut elements, &topology, &annotations);

        let edges: Vec<_> = elements.iter().filter_map(GraphElement::as_edge).collect();
        assert_eq!(edges[0].target, "a1");
        assert_eq!(edges[0].extra.yaml_target_node_id.as_deref(), Some("br1"));
        assert_eq!(edges[1].target, "a2");

        // alias nodes inherit role/kind and the base position fallback
        let a1 = elements.iter().filter_map(GraphElement::as_node).find(|n| n.id == "a1").unwrap();
        assert_eq!(a1.role, NodeRole::Bridge);
        assert_eq!(a1.position, Position { x: 10.0, y: 20.0 });
        assert_eq!(a1.extra.yaml_node_id.as_deref(), Some("br1"));

        // no edge references br1 directly anymore -> soft-hidden
        let br1 = elements.iter().filter_map(GraphElement::as_node).find(|n| n.id == "br1").unwrap();
        assert_eq!(br1.visibility, NodeVisibility::AliasedBaseBridge);
    }

    #[test]
    fn mapping_gap_keeps_the_base_visible() {
        let topology = parse_topology(BRIDGE_TOPOLOGY);
        let mut elements = vec![
            bridge_node("br1"),
            edge("Clab-Link0", "r1", "eth1", "br1", "eth1"),
            edge("Clab-Link1", "r2", "eth1", "br1", "eth9"), // no alias for eth9
        ];
        let annotations = LabAnnotations {
            node_annotations: vec![alias_annotation("a1", "br1", "eth1")],
            ..Default::default()
        };

        apply_aliases(&mut elements, &topology, &annotations);

        let br1 = elements.iter().filter_map(GraphElement::as_node).find(|n| n.id == "br1").unwrap();
        assert_eq!(br1.visibility, NodeVisibility::Visible);
    }

    #[test]
    fn aliases_of_non_bridge_nodes_are_ignored() {
        let topology = parse_topology(BRIDGE_TOPOLOGY);
        let mut elements = vec![edge("Clab-Link0", "r1", "eth1", "r2", "eth1")];
        let annotations = LabAnnotations {
            node_annotations: vec![
                alias_annotation("a1", "r1", "eth1"),    // not a bridge
                alias_annotation("a2", "ghost", "eth1"), // undeclared
            ],
            ..Default::default()
        };

        apply_aliases(&mut elements, &topology, &annotations);

        assert!(elements.iter().filter_map(GraphElement::as_node).next().is_none());
        assert_eq!(elements.iter().filter_map(GraphElement::as_edge).next().unwrap().source, "r1");
    }

    #[test]
    fn duplicate_alias_ids_materialize_once() {
        let topology = parse_topology(BRIDGE_TOPOLOGY);
        let mut elements = vec![bridge_node("br1")];
        let annotations = LabAnnotations {
            node_annotations: vec![
                alias_annotation("a1", "br1", "eth1"),
                alias_annotation("a1", "br1", "eth2"),
            ],
            ..Default::default()
        };

        apply_aliases(&mut elements, &topology, &annotations);

        let count = elements.iter().filter_map(GraphElement::as_node).filter(|n| n.id == "a1").count();
        assert_eq!(count, 1);
    }

    #[test]
    fn chained_aliasing_is_rejected() {
        let topology = parse_topology("topology:\n  nodes:\n    br1: {kind: bridge}\n    br2: {kind: bridge}\n");
        // br2 is skipped by the node builder (it is an alias target itself)
        let mut elements = vec![bridge_node("br1")];
        let annotations = LabAnnotations {
            node_annotations: vec![
                // br2 is itself an alias placement of br1...
                alias_annotation("br2", "br1", "eth1"),
                // ...so aliasing through br2 must be ignored
                alias_annotation("a1", "br2", "eth2"),
            ],
            ..Default::default()
        };

        apply_aliases(&mut elements, &topology, &annotations);

        assert!(!elements.iter().filter_map(GraphElement::as_node).any(|n| n.id == "a1"));
    }
}
