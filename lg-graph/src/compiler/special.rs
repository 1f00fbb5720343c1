//! Special ("cloud") node collection.
//!
//! Single-endpoint links reference endpoints that have no entry in the
//! document's `nodes` map: host interfaces, the management network, macvlan
//! parents, VXLAN tunnels, dummies. One graph node is materialized per
//! distinct synthetic id, in link-scan order.

use indexmap::IndexMap;
use lg_core::annotations::{
    LabAnnotations,
    Position,
};
use tracing::{
    debug,
    instrument,
};

use crate::compiler::links::{
    LinkType,
    NormalizedLink,
};
use crate::compiler::nodes::icon_role;
use crate::model::{
    NodeElement,
    NodeExtraData,
    NodeRole,
};
use crate::topology::TopologySection;

/// Scan all normalized links and materialize one node per distinct special
/// endpoint. Ids colliding with a declared topology node are skipped: the
/// explicit declaration takes precedence.
#[instrument(skip_all, fields(links = links.len()))]
pub fn collect_special_nodes(
    links: &[NormalizedLink],
    topology: &TopologySection,
    annotations: &LabAnnotations,
) -> Vec<NodeElement> {
    let mut seen: IndexMap<String, LinkType> = IndexMap::new();
    for link in links {
        if link.has_special_target() {
            seen.entry(link.target.node.clone()).or_insert(link.link_type);
        }
    }

    seen.into_iter()
        .filter_map(|(id, link_type)| {
            if topology.nodes.contains_key(&id) {
                debug!(id, "special endpoint shadowed by a declared node");
                return None;
            }
            let annotation = annotations.node(&id);
            let name = annotation
                .and_then(|a| a.label.clone())
                .unwrap_or_else(|| id.clone());
            let position = annotation
                .and_then(|a| a.position)
                .unwrap_or_else(Position::origin);
            // an explicit icon overrides the cloud default
            let role = annotation
                .and_then(|a| a.icon.as_deref())
                .and_then(icon_role)
                .unwrap_or(NodeRole::Cloud);

            Some(NodeElement {
                id,
                name,
                role,
                position,
                extra: NodeExtraData {
                    kind: link_type.as_str().to_string(),
                    special_type: Some(link_type.as_str().to_string()),
                    ..Default::default()
                },
                ..Default::default()
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use lg_core::annotations::NodeAnnotation;

    use super::*;
    use crate::compiler::links::{
        LinkContext,
        normalize_link,
    };
    use crate::topology::{
        EndpointRef,
        LinkDefinition,
        NodeDefinition,
    };

    fn special(ty: &str, host_interface: Option<&str>) -> LinkDefinition {
        LinkDefinition {
            link_type: Some(ty.into()),
            endpoint: Some(EndpointRef::Short("r1:eth1".into())),
            host_interface: host_interface.map(Into::into),
            ..Default::default()
        }
    }

    fn normalize_all(defs: &[LinkDefinition]) -> Vec<NormalizedLink> {
        let mut ctx = LinkContext::new();
        defs.iter()
            .enumerate()
            .map(|(seq, def)| normalize_link(def, seq, seq, &mut ctx).unwrap())
            .collect()
    }

    #[test]
    fn one_node_per_distinct_id_in_scan_order() {
        let links = normalize_all(&[
            special("host", Some("eth0")),
            special("vxlan", None),
            special("host", Some("eth0")), // duplicate id
            special("mgmt-net", Some("br-mgmt")),
        ]);
        let nodes = collect_special_nodes(&links, &TopologySection::default(), &LabAnnotations::default());

        let ids: Vec<_> = nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["host:eth0", "vxlan:vxlan0", "mgmt-net:br-mgmt"]);
        assert!(nodes.iter().all(|n| n.role == NodeRole::Cloud));
        assert_eq!(nodes[1].extra.special_type.as_deref(), Some("vxlan"));
    }

    #[test]
    fn declared_nodes_shadow_special_ids() {
        let links = normalize_all(&[special("host", Some("eth0"))]);
        let mut topology = TopologySection::default();
        topology.nodes.insert("host:eth0".into(), NodeDefinition::default());

        let nodes = collect_special_nodes(&links, &topology, &LabAnnotations::default());
        assert!(nodes.is_empty());
    }

    #[test]
    fn annotation_metadata_applies_to_special_nodes() {
        let links = normalize_all(&[special("macvlan", Some("ens4"))]);
        let annotations = LabAnnotations {
            node_annotations: vec![NodeAnnotation {
                id: "macvlan:ens4".into(),
                label: Some("uplink".into()),
                position: Some(Position { x: 80.0, y: 40.0 }),
                ..Default::default()
            }],
            ..Default::default()
        };

        let nodes = collect_special_nodes(&links, &TopologySection::default(), &annotations);
        assert_eq!(nodes[0].name, "uplink");
        assert_eq!(nodes[0].position, Position { x: 80.0, y: 40.0 });
    }

    #[test]
    fn annotation_icon_overrides_the_cloud_role() {
        let links = normalize_all(&[special("host", Some("eth0")), special("mgmt-net", Some("br-mgmt"))]);
        let annotations = LabAnnotations {
            node_annotations: vec![NodeAnnotation {
                id: "host:eth0".into(),
                icon: Some("router".into()),
                ..Default::default()
            }],
            ..Default::default()
        };

        let nodes = collect_special_nodes(&links, &TopologySection::default(), &annotations);
        assert_eq!(nodes[0].role, NodeRole::Router);
        // unannotated (and unknown-icon) specials stay clouds
        assert_eq!(nodes[1].role, NodeRole::Cloud);
    }
}
