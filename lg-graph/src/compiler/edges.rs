//! Edge element construction.
//!
//! One graph edge per normalized link, resolving each endpoint to its
//! backing container/interface and computing the visual state class.
//! Special endpoints (synthetic clouds and declared bridges) carry no
//! independent state; the class then follows the other side alone.

use lg_core::runtime::{
    NetemState,
    RuntimeDataProvider,
    TrafficStats,
};
use tracing::{
    debug,
    instrument,
};

use crate::compiler::distributed;
use crate::compiler::links::{
    Endpoint,
    LinkType,
    NormalizedLink,
};
use crate::compiler::nodes::is_bridge_kind;
use crate::model::{
    EdgeElement,
    EdgeExtraData,
    LinkStateClass,
    ValidationTag,
};
use crate::topology::{
    TopologySection,
    container_name,
};

/// Runtime view of one side of an edge.
#[derive(Debug, Default)]
struct SideState {
    /// None when no runtime data is available (state unknown).
    state: Option<String>,
    mac: String,
    mtu: i64,
    stats: Option<TrafficStats>,
    netem: Option<NetemState>,
    special: bool,
}

fn resolve_side(
    endpoint: &Endpoint,
    special: bool,
    topology: &TopologySection,
    lab_name: &str,
    prefix: Option<&str>,
    provider: Option<&dyn RuntimeDataProvider>,
) -> SideState {
    if special {
        return SideState { special: true, ..Default::default() };
    }

    let Some(config) = topology.resolve_node(&endpoint.node) else {
        debug!(node = endpoint.node, "edge endpoint references an undeclared node");
        return SideState::default();
    };
    let Some(provider) = provider else {
        return SideState::default();
    };

    let cname = container_name(prefix, lab_name, &endpoint.node);
    match distributed::resolve_interface(provider, &cname, &config, &endpoint.interface, lab_name) {
        Some((_, info)) => SideState {
            state: (!info.state.is_empty()).then(|| info.state.clone()),
            mac: info.mac,
            mtu: info.mtu,
            stats: info.stats,
            netem: info.netem,
            special: false,
        },
        None => SideState::default(),
    }
}

fn class_from_one(state: Option<&str>) -> LinkStateClass {
    match state {
        Some("up") => LinkStateClass::Up,
        Some(_) => LinkStateClass::Down,
        None => LinkStateClass::Unknown,
    }
}

fn state_class(source: &SideState, target: &SideState) -> LinkStateClass {
    match (source.special, target.special) {
        (true, true) => LinkStateClass::Unknown,
        (true, false) => class_from_one(target.state.as_deref()),
        (false, true) => class_from_one(source.state.as_deref()),
        (false, false) => match (source.state.as_deref(), target.state.as_deref()) {
            (Some(a), Some(b)) => {
                if a == "up" && b == "up" {
                    LinkStateClass::Up
                } else {
                    LinkStateClass::Down
                }
            },
            _ => LinkStateClass::Unknown,
        },
    }
}

/// Field checks for extended-format links. Applied only when the raw spec
/// declared a `type`; defects are data on the edge, never fatal.
fn validate_extended(link: &NormalizedLink) -> Vec<ValidationTag> {
    let Some(ext) = &link.ext else {
        return Vec::new();
    };
    let mut tags = Vec::new();

    match link.link_type {
        LinkType::Veth => {
            if link.source.node.is_empty() {
                tags.push(ValidationTag::MissingSourceNode);
            }
            if link.source.interface.is_empty() {
                tags.push(ValidationTag::MissingSourceInterface);
            }
            if link.target.node.is_empty() {
                tags.push(ValidationTag::MissingTargetNode);
            }
            if link.target.interface.is_empty() {
                tags.push(ValidationTag::MissingTargetInterface);
            }
        },
        LinkType::Host | LinkType::MgmtNet | LinkType::Macvlan => {
            if ext.host_interface.as_deref().map_or(true, str::is_empty) {
                tags.push(ValidationTag::MissingHostInterface);
            }
        },
        LinkType::Vxlan | LinkType::VxlanStitch => {
            if ext.remote.as_deref().map_or(true, str::is_empty) {
                tags.push(ValidationTag::MissingRemote);
            }
            if ext.vni.is_none() {
                tags.push(ValidationTag::MissingVni);
            }
            if ext.dst_port.is_none() {
                tags.push(ValidationTag::MissingDstPort);
            }
        },
        LinkType::Dummy => {},
    }

    tags
}

fn is_special_endpoint(endpoint: &Endpoint, synthesized: bool, topology: &TopologySection) -> bool {
    synthesized
        || topology
            .resolve_node(&endpoint.node)
            .is_some_and(|config| is_bridge_kind(&config.kind))
}

/// Build edge elements for all normalized links, in link order.
#[instrument(skip_all, fields(links = links.len()))]
pub fn build_edge_elements(
    links: &[NormalizedLink],
    topology: &TopologySection,
    lab_name: &str,
    prefix: Option<&str>,
    provider: Option<&dyn RuntimeDataProvider>,
) -> Vec<EdgeElement> {
    links
        .iter()
        .map(|link| {
            let source_special = is_special_endpoint(&link.source, false, topology);
            let target_special = is_special_endpoint(&link.target, link.has_special_target(), topology);

            let source = resolve_side(&link.source, source_special, topology, lab_name, prefix, provider);
            let target = resolve_side(&link.target, target_special, topology, lab_name, prefix, provider);

            EdgeElement {
                id: format!("Clab-Link{}", link.index),
                source: link.source.node.clone(),
                target: link.target.node.clone(),
                source_endpoint: (!link.source.interface.is_empty()).then(|| link.source.interface.clone()),
                target_endpoint: (!link.target.interface.is_empty()).then(|| link.target.interface.clone()),
                state_class: state_class(&source, &target),
                extra: EdgeExtraData {
                    source_mac: source.mac,
                    target_mac: target.mac,
                    source_mtu: source.mtu,
                    target_mtu: target.mtu,
                    source_state: source.state.unwrap_or_default(),
                    target_state: target.state.unwrap_or_default(),
                    source_stats: source.stats,
                    target_stats: target.stats,
                    source_netem: source.netem,
                    target_netem: target.netem,
                    ext: link.ext.clone(),
                    ext_validation_errors: validate_extended(link),
                    ..Default::default()
                },
            }
        })
        .collect()
}
