//! Output data model: graph elements and migration records.
//!
//! Everything the compiler emits lives here. Elements are plain data for a
//! rendering layer; the compiler holds no references into them after a run.

use std::collections::BTreeMap;

use lg_core::annotations::{
    GeoCoordinates,
    Position,
};
use lg_core::runtime::{
    NetemState,
    TrafficStats,
};
use serde::{
    Deserialize,
    Serialize,
};

use crate::topology::ResolvedNodeConfig;

/// Visual role of a node, derived from its kind or an explicit annotation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeRole {
    Router,
    Client,
    Bridge,
    Cloud,
    #[default]
    Default,
}

/// Whether a renderer should draw a node. The compiler never removes
/// elements; a base bridge fully replaced by aliases is soft-hidden.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeVisibility {
    #[default]
    Visible,
    AliasedBaseBridge,
}

/// Visual state class of an edge.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinkStateClass {
    #[serde(rename = "link-up")]
    Up,
    #[serde(rename = "link-down")]
    Down,
    /// State unknown: no runtime data for at least one endpoint.
    #[default]
    #[serde(rename = "")]
    Unknown,
}

/// Named validation defects recorded on an edge when an extended-format link
/// is missing required fields. Never fatal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ValidationTag {
    MissingSourceNode,
    MissingSourceInterface,
    MissingTargetNode,
    MissingTargetInterface,
    MissingHostInterface,
    MissingRemote,
    MissingVni,
    MissingDstPort,
}

/// Raw extended-link properties carried through to the edge output so the
/// editor can round-trip them.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ExtendedLinkProps {
    #[serde(rename = "type")]
    pub link_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host_interface: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vni: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dst_port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub src_port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mtu: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vars: Option<serde_yaml::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<BTreeMap<String, serde_yaml::Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_mac: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_mac: Option<String>,
}

/// Computed per-node payload handed to renderers and editors.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeExtraData {
    pub kind: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub image: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub group: String,
    /// Container runtime state; empty in editor mode.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub state: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub mgmt_ipv4_address: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub mgmt_ipv6_address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interface_pattern: Option<String>,
    /// Link type that materialized this special node (`host`, `vxlan`, ...).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub special_type: Option<String>,
    /// Base YAML node id, set on alias nodes only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yaml_node_id: Option<String>,
    /// Full merged configuration, absent on special and alias nodes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<ResolvedNodeConfig>,
}

/// One graph node.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeElement {
    pub id: String,
    /// Display name; usually the id, but bridge nodes may show an
    /// annotation-supplied label.
    pub name: String,
    pub role: NodeRole,
    pub position: Position,
    pub visibility: NodeVisibility,
    pub extra: NodeExtraData,
}

/// Computed per-edge payload.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeExtraData {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub source_mac: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub target_mac: String,
    #[serde(skip_serializing_if = "is_zero")]
    pub source_mtu: i64,
    #[serde(skip_serializing_if = "is_zero")]
    pub target_mtu: i64,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub source_state: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub target_state: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_stats: Option<TrafficStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_stats: Option<TrafficStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_netem: Option<NetemState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_netem: Option<NetemState>,
    /// Original YAML node id of a rewired endpoint, for traceability.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yaml_source_node_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yaml_target_node_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ext: Option<ExtendedLinkProps>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ext_validation_errors: Vec<ValidationTag>,
}

#[allow(clippy::trivially_copy_pass_by_ref)] // serde skip_serializing_if signature
fn is_zero(v: &i64) -> bool {
    *v == 0
}

/// One graph edge.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeElement {
    /// `Clab-Link<N>` where `N` is dense over successfully normalized links.
    pub id: String,
    pub source: String,
    pub target: String,
    /// Interface name on the source side; absent for endpoint kinds with no
    /// interface concept (dummy).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_endpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_endpoint: Option<String>,
    pub state_class: LinkStateClass,
    pub extra: EdgeExtraData,
}

/// A single renderable element.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "element", rename_all = "lowercase")]
pub enum GraphElement {
    Node(NodeElement),
    Edge(EdgeElement),
}

impl GraphElement {
    #[must_use]
    pub const fn as_node(&self) -> Option<&NodeElement> {
        match self {
            Self::Node(n) => Some(n),
            Self::Edge(_) => None,
        }
    }

    pub fn as_node_mut(&mut self) -> Option<&mut NodeElement> {
        match self {
            Self::Node(n) => Some(n),
            Self::Edge(_) => None,
        }
    }

    #[must_use]
    pub const fn as_edge(&self) -> Option<&EdgeElement> {
        match self {
            Self::Node(_) => None,
            Self::Edge(e) => Some(e),
        }
    }

    pub fn as_edge_mut(&mut self) -> Option<&mut EdgeElement> {
        match self {
            Self::Node(_) => None,
            Self::Edge(e) => Some(e),
        }
    }
}

/// Reported (not applied) promotion of a kind-default interface pattern into
/// the annotation sidecar.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InterfacePatternMigration {
    pub node_id: String,
    pub pattern: String,
}

/// Reported promotion of legacy `graph-*` labels into the sidecar.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphLabelMigration {
    pub node_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_label_pos: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geo_coordinates: Option<GeoCoordinates>,
}

/// The complete result of one compile call.
#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompiledGraph {
    pub elements: Vec<GraphElement>,
    pub lab_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    /// True iff every declared node has an annotation-supplied position.
    pub is_preset_layout: bool,
    pub pending_migrations: Vec<InterfacePatternMigration>,
    pub graph_label_migrations: Vec<GraphLabelMigration>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_class_serializes_to_css_like_strings() {
        assert_eq!(serde_json::to_value(LinkStateClass::Up).unwrap(), "link-up");
        assert_eq!(serde_json::to_value(LinkStateClass::Down).unwrap(), "link-down");
        assert_eq!(serde_json::to_value(LinkStateClass::Unknown).unwrap(), "");
    }

    #[test]
    fn validation_tags_serialize_kebab_case() {
        assert_eq!(serde_json::to_value(ValidationTag::MissingVni).unwrap(), "missing-vni");
        assert_eq!(serde_json::to_value(ValidationTag::MissingDstPort).unwrap(), "missing-dst-port");
    }

    #[test]
    fn elements_carry_an_element_tag() {
        let el = GraphElement::Node(NodeElement {
            id: "r1".into(),
            name: "r1".into(),
            ..Default::default()
        });
        let v = serde_json::to_value(&el).unwrap();
        assert_eq!(v["element"], "node");
        assert_eq!(v["id"], "r1");
    }
}
