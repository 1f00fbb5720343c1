//! Node element construction.
//!
//! One graph node per declared topology node, in document order, merging the
//! resolved config with optional container-runtime enrichment and the
//! interface-pattern resolution of the annotation sidecar.

use lg_core::annotations::{
    LabAnnotations,
    Position,
};
use lg_core::runtime::RuntimeDataProvider;
use tracing::{
    debug,
    instrument,
};

use crate::compiler::distributed;
use crate::model::{
    InterfacePatternMigration,
    NodeElement,
    NodeExtraData,
    NodeRole,
};
use crate::topology::{
    TopologySection,
    container_name,
};

/// Kinds rendered as layer-2 bridges.
pub const BRIDGE_KINDS: &[&str] = &["bridge", "ovs-bridge"];

/// Built-in interface patterns per kind. An annotation-level pattern always
/// overrides these; resolving through this table flags a pending migration
/// so the pattern gets persisted into the sidecar.
const KIND_INTERFACE_PATTERNS: &[(&str, &str)] = &[
    ("nokia_srlinux", "e1-{n}"),
    ("nokia_sros", "1/1/{n}"),
    ("nokia_srsim", "1/1/{n}"),
    ("arista_ceos", "eth{n}"),
    ("cisco_xrd", "Gi0-0-0-{n}"),
    ("juniper_crpd", "eth{n}"),
];

#[must_use]
pub fn is_bridge_kind(kind: &str) -> bool {
    BRIDGE_KINDS.contains(&kind)
}

#[must_use]
pub fn kind_default_pattern(kind: &str) -> Option<&'static str> {
    KIND_INTERFACE_PATTERNS
        .iter()
        .find(|(k, _)| *k == kind)
        .map(|(_, pattern)| *pattern)
}

/// Role implied by an explicit annotation icon, when it names a known role.
#[must_use]
pub fn icon_role(icon: &str) -> Option<NodeRole> {
    match icon {
        "router" | "pe" | "p" => Some(NodeRole::Router),
        "client" | "server" | "host" => Some(NodeRole::Client),
        "bridge" | "switch" => Some(NodeRole::Bridge),
        "cloud" => Some(NodeRole::Cloud),
        _ => None,
    }
}

/// Derive the visual role from an explicit annotation icon (when it names a
/// known role) or from the kind.
#[must_use]
pub fn role_for(kind: &str, icon: Option<&str>) -> NodeRole {
    if let Some(role) = icon.and_then(icon_role) {
        return role;
    }

    if is_bridge_kind(kind) {
        NodeRole::Bridge
    } else if kind == "linux" || kind == "host" {
        NodeRole::Client
    } else if ["nokia_", "arista_", "cisco_", "juniper_", "sonic", "vr-"]
        .iter()
        .any(|p| kind.starts_with(p))
    {
        NodeRole::Router
    } else {
        NodeRole::Default
    }
}

/// Output of the node-building stage.
#[derive(Debug, Default)]
pub struct NodeBuildResult {
    pub nodes: Vec<NodeElement>,
    pub migrations: Vec<InterfacePatternMigration>,
    pub is_preset_layout: bool,
}

/// Build node elements for every declared node.
///
/// Bridge nodes annotated as alias placements of a *different* base id are
/// skipped: the alias handler renders them, and emitting both would
/// duplicate the node on the canvas.
#[instrument(skip_all, fields(nodes = topology.nodes.len()))]
pub fn build_node_elements(
    topology: &TopologySection,
    lab_name: &str,
    prefix: Option<&str>,
    annotations: &LabAnnotations,
    provider: Option<&dyn RuntimeDataProvider>,
) -> NodeBuildResult {
    let mut result = NodeBuildResult { is_preset_layout: true, ..Default::default() };

    for (name, def) in &topology.nodes {
        let annotation = annotations.node(name);
        result.is_preset_layout &= annotation.is_some_and(|a| a.position.is_some());

        let config = topology.resolve(def);
        let bridge = is_bridge_kind(&config.kind);
        if bridge && annotation.is_some_and(lg_core::annotations::NodeAnnotation::is_alias_placement) {
            debug!(name, "skipping alias-target bridge node");
            continue;
        }

        let cname = container_name(prefix, lab_name, name);
        let container = provider.and_then(|p| distributed::resolve_container(p, &cname, &config, lab_name));

        let interface_pattern = annotation.and_then(|a| a.interface_pattern.clone()).or_else(|| {
            kind_default_pattern(&config.kind).map(|pattern| {
                result.migrations.push(InterfacePatternMigration {
                    node_id: name.clone(),
                    pattern: pattern.to_string(),
                });
                pattern.to_string()
            })
        });

        let role = role_for(&config.kind, annotation.and_then(|a| a.icon.as_deref()));
        let display_name = if bridge {
            annotation
                .and_then(|a| a.label.clone())
                .unwrap_or_else(|| name.clone())
        } else {
            name.clone()
        };
        let position = annotation.and_then(|a| a.position).unwrap_or_else(Position::origin);

        let image = container
            .as_ref()
            .filter(|c| !c.image.is_empty())
            .map_or_else(|| config.image.clone().unwrap_or_default(), |c| c.image.clone());

        result.nodes.push(NodeElement {
            id: name.clone(),
            name: display_name,
            role,
            position,
            extra: NodeExtraData {
                kind: config.kind.clone(),
                image,
                group: config.group.clone().unwrap_or_default(),
                state: container.as_ref().map(|c| c.state.clone()).unwrap_or_default(),
                mgmt_ipv4_address: container
                    .as_ref()
                    .map_or_else(|| config.mgmt_ipv4.clone().unwrap_or_default(), |c| c.ipv4_address.clone()),
                mgmt_ipv6_address: container
                    .as_ref()
                    .map_or_else(|| config.mgmt_ipv6.clone().unwrap_or_default(), |c| c.ipv6_address.clone()),
                interface_pattern,
                config: Some(config),
                ..Default::default()
            },
            ..Default::default()
        });
    }

    result
}
