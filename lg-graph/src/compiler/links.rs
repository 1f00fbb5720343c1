//! Link normalization: reduce every raw link spec to a canonical
//! two-endpoint form, synthesizing stable ids for implicit endpoints.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::model::ExtendedLinkProps;
use crate::topology::{
    EndpointRef,
    LinkDefinition,
};

/// Canonical link type after classification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum LinkType {
    Veth,
    Host,
    MgmtNet,
    Macvlan,
    Vxlan,
    VxlanStitch,
    Dummy,
}

impl LinkType {
    /// Parse an extended-format `type` value.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "veth" => Some(Self::Veth),
            "host" => Some(Self::Host),
            "mgmt-net" => Some(Self::MgmtNet),
            "macvlan" => Some(Self::Macvlan),
            "vxlan" => Some(Self::Vxlan),
            "vxlan-stitch" => Some(Self::VxlanStitch),
            "dummy" => Some(Self::Dummy),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Veth => "veth",
            Self::Host => "host",
            Self::MgmtNet => "mgmt-net",
            Self::Macvlan => "macvlan",
            Self::Vxlan => "vxlan",
            Self::VxlanStitch => "vxlan-stitch",
            Self::Dummy => "dummy",
        }
    }

    /// Whether the raw spec declares only one endpoint, the other being
    /// synthesized by the normalizer.
    #[must_use]
    pub const fn is_single_endpoint(self) -> bool {
        !matches!(self, Self::Veth)
    }

    /// Dummy endpoints have no interface concept.
    #[must_use]
    pub const fn has_interface(self) -> bool {
        !matches!(self, Self::Dummy)
    }
}

impl fmt::Display for LinkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed endpoint: node name plus (possibly empty) interface name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Endpoint {
    pub node: String,
    pub interface: String,
    pub mac: Option<String>,
}

impl Endpoint {
    fn from_ref(r: &EndpointRef) -> Result<Self, LinkError> {
        let ep = match r {
            // `"node"` (no colon) is a valid node-only endpoint.
            EndpointRef::Short(s) => {
                let (node, interface) = s
                    .split_once(':')
                    .map_or_else(|| (s.clone(), String::new()), |(n, i)| (n.to_string(), i.to_string()));
                Self { node, interface, mac: None }
            },
            EndpointRef::Full { node, interface, mac } => Self {
                node: node.clone(),
                interface: interface.clone().unwrap_or_default(),
                mac: mac.clone(),
            },
        };
        if ep.node.is_empty() {
            return Err(LinkError::MissingNode);
        }
        Ok(ep)
    }
}

/// A link reduced to canonical two-endpoint form.
#[derive(Clone, Debug, PartialEq)]
pub struct NormalizedLink {
    /// Dense index among successfully normalized links; skipped links do
    /// not consume one. Edge ids derive from this.
    pub index: usize,
    pub link_type: LinkType,
    pub source: Endpoint,
    /// For single-endpoint types this is the synthesized special endpoint.
    pub target: Endpoint,
    /// Raw extended-format properties, present iff the spec declared `type`.
    pub ext: Option<ExtendedLinkProps>,
}

impl NormalizedLink {
    /// Whether the target endpoint is a synthesized special node.
    #[must_use]
    pub const fn has_special_target(&self) -> bool {
        self.link_type.is_single_endpoint()
    }
}

/// Why a raw link spec could not be normalized. Reported and skipped,
/// never fatal.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum LinkError {
    #[error("unknown link type `{0}`")]
    UnknownType(String),
    #[error("veth link requires exactly two endpoints, found {0}")]
    EndpointCount(usize),
    #[error("link endpoint is missing a node name")]
    MissingNode,
    #[error("`{0}` link is missing its endpoint")]
    MissingEndpoint(LinkType),
}

/// Per-run allocator for synthetic special-node ids.
///
/// Counter-derived ids (vxlan, vxlan-stitch, dummy) are stable across runs
/// only because links are processed in document order; within one run the
/// cache keyed by raw link sequence guarantees the same link always resolves
/// to the same id.
#[derive(Debug, Default)]
pub struct LinkContext {
    vxlan: usize,
    vxlan_stitch: usize,
    dummy: usize,
    ids: HashMap<usize, String>,
}

impl LinkContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn synthetic_id(&mut self, seq: usize, link_type: LinkType, host_interface: &str) -> String {
        if let Some(id) = self.ids.get(&seq) {
            return id.clone();
        }
        let id = match link_type {
            LinkType::Host => format!("host:{host_interface}"),
            LinkType::MgmtNet => format!("mgmt-net:{host_interface}"),
            LinkType::Macvlan => format!("macvlan:{host_interface}"),
            LinkType::Vxlan => {
                let n = self.vxlan;
                self.vxlan += 1;
                format!("vxlan:vxlan{n}")
            },
            LinkType::VxlanStitch => {
                let n = self.vxlan_stitch;
                self.vxlan_stitch += 1;
                format!("vxlan-stitch:vxlan{n}")
            },
            LinkType::Dummy => {
                let n = self.dummy;
                self.dummy += 1;
                format!("dummy{n}")
            },
            LinkType::Veth => unreachable!("veth links have two explicit endpoints"),
        };
        self.ids.insert(seq, id.clone());
        id
    }
}

fn extended_props(def: &LinkDefinition, source: &Endpoint, target: &Endpoint) -> ExtendedLinkProps {
    ExtendedLinkProps {
        link_type: def.link_type.clone().unwrap_or_default(),
        host_interface: def.host_interface.clone(),
        mode: def.mode.clone(),
        remote: def.remote.clone(),
        vni: def.vni,
        dst_port: def.dst_port,
        src_port: def.src_port,
        mtu: def.mtu,
        vars: def.vars.clone(),
        labels: def.labels.clone(),
        source_mac: source.mac.clone(),
        target_mac: target.mac.clone(),
    }
}

/// Normalize one raw link spec.
///
/// `seq` is the link's position in the document (cache key for synthetic
/// ids); `index` is the dense index this link will occupy if normalization
/// succeeds.
pub fn normalize_link(
    def: &LinkDefinition,
    seq: usize,
    index: usize,
    ctx: &mut LinkContext,
) -> Result<NormalizedLink, LinkError> {
    let link_type = match &def.link_type {
        None => LinkType::Veth,
        Some(s) => LinkType::parse(s).ok_or_else(|| LinkError::UnknownType(s.clone()))?,
    };

    let (source, target) = if link_type.is_single_endpoint() {
        let declared = def
            .endpoint
            .as_ref()
            .or_else(|| def.endpoints.first())
            .ok_or(LinkError::MissingEndpoint(link_type))?;
        let source = Endpoint::from_ref(declared)?;

        let host_interface = def.host_interface.clone().unwrap_or_default();
        let id = ctx.synthetic_id(seq, link_type, &host_interface);
        let interface = if link_type.has_interface() {
            match link_type {
                // vxlan:vxlan<N> -> the tunnel interface is the part after `:`
                LinkType::Vxlan | LinkType::VxlanStitch => id.split(':').nth(1).unwrap_or_default().to_string(),
                _ => host_interface,
            }
        } else {
            String::new()
        };
        (source, Endpoint { node: id, interface, mac: None })
    } else {
        if def.endpoints.len() != 2 {
            return Err(LinkError::EndpointCount(def.endpoints.len()));
        }
        (Endpoint::from_ref(&def.endpoints[0])?, Endpoint::from_ref(&def.endpoints[1])?)
    };

    let ext = def.link_type.as_ref().map(|_| extended_props(def, &source, &target));

    Ok(NormalizedLink { index, link_type, source, target, ext })
}
