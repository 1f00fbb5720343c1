//! Topology document model and config resolution.
//!
//! Mirrors the containerlab file layout: a top-level `name`/`prefix` plus a
//! `topology` object holding `nodes`, `links`, and the `kinds`/`groups`/
//! `defaults` inheritance tables. The document is read-only input; the
//! compiler never mutates it.

use std::collections::BTreeMap;

use indexmap::IndexMap;
use serde::{
    Deserialize,
    Serialize,
};

/// Top-level lab description file.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TopologyFile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Container-name prefix override. `None` means the default `clab`
    /// prefix; an empty string means bare node names.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topology: Option<TopologySection>,
}

/// The `topology` object of the document.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TopologySection {
    /// Declared nodes, in document order. Order is load-bearing: node
    /// elements are emitted in this order.
    #[serde(default)]
    pub nodes: IndexMap<String, NodeDefinition>,
    #[serde(default)]
    pub links: Vec<LinkDefinition>,
    #[serde(default)]
    pub kinds: BTreeMap<String, NodeDefinition>,
    #[serde(default)]
    pub groups: BTreeMap<String, NodeDefinition>,
    #[serde(default)]
    pub defaults: NodeDefinition,
}

/// One declared node, or a kind/group/defaults fragment (same shape).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct NodeDefinition {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub node_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mgmt_ipv4: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mgmt_ipv6: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub startup_config: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, serde_yaml::Value>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
    /// Backing components of a distributed chassis node.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<ComponentDefinition>,
    /// Any keys the compiler has no typed field for.
    #[serde(flatten)]
    pub passthrough: BTreeMap<String, serde_yaml::Value>,
}

/// One backing component (line card / CPM) of a distributed node.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ComponentDefinition {
    pub slot: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub component_type: Option<String>,
    #[serde(flatten)]
    pub passthrough: BTreeMap<String, serde_yaml::Value>,
}

/// One raw link spec, covering both the brief form (`endpoints: [a:e1, b:e1]`)
/// and the extended form (`type: ...` with per-type fields).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct LinkDefinition {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub link_type: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub endpoints: Vec<EndpointRef>,
    /// The single declared endpoint of host/mgmt-net/macvlan/vxlan/dummy
    /// links in the extended form.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<EndpointRef>,
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
}

/// A link endpoint, either `"node:iface"` or `{node, interface}`.
/// Both forms must parse to the same result.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EndpointRef {
    Short(String),
    Full {
        node: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        interface: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        mac: Option<String>,
    },
}

/// Which inheritance level supplied a resolved field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigLevel {
    Defaults,
    Kind,
    Group,
    Node,
}

/// Fully merged per-node configuration.
///
/// Scalar precedence is `node > group > kind > defaults`; `labels` and `env`
/// merge key-by-key across all four levels with node-level entries winning.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedNodeConfig {
    /// Resolved kind; empty when no level declares one.
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mgmt_ipv4: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mgmt_ipv6: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub startup_config: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, serde_yaml::Value>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<ComponentDefinition>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub passthrough: BTreeMap<String, serde_yaml::Value>,
    /// Which level supplied each scalar field.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub provenance: BTreeMap<String, ConfigLevel>,
}

impl ResolvedNodeConfig {
    fn apply(&mut self, frag: &NodeDefinition, level: ConfigLevel) {
        macro_rules! take_scalar {
            ($field:ident, $name:literal) => {
                if let Some(v) = &frag.$field {
                    self.$field = Some(v.clone());
                    self.provenance.insert($name.to_string(), level);
                }
            };
        }
        take_scalar!(image, "image");
        take_scalar!(node_type, "type");
        take_scalar!(mgmt_ipv4, "mgmt-ipv4");
        take_scalar!(mgmt_ipv6, "mgmt-ipv6");
        take_scalar!(startup_config, "startup-config");
        take_scalar!(license, "license");

        for (k, v) in &frag.labels {
            self.labels.insert(k.clone(), v.clone());
        }
        for (k, v) in &frag.env {
            self.env.insert(k.clone(), v.clone());
        }
        for (k, v) in &frag.passthrough {
            self.passthrough.insert(k.clone(), v.clone());
        }
        if !frag.components.is_empty() {
            self.components = frag.components.clone();
            self.provenance.insert("components".to_string(), level);
        }
    }
}

impl TopologySection {
    /// Resolve the effective kind of a node: the node's own kind, falling
    /// back to its group fragment's kind and then to `defaults`. The result
    /// is what the `kinds` table is consulted with, so kind resolution is
    /// not circular.
    #[must_use]
    pub fn resolve_kind(&self, node: &NodeDefinition) -> String {
        if let Some(kind) = &node.kind {
            return kind.clone();
        }
        let group_kind = node
            .group
            .as_ref()
            .and_then(|g| self.groups.get(g))
            .and_then(|frag| frag.kind.clone());
        group_kind.or_else(|| self.defaults.kind.clone()).unwrap_or_default()
    }

    /// Merge one node's declared config through the full inheritance chain.
    #[must_use]
    pub fn resolve(&self, node: &NodeDefinition) -> ResolvedNodeConfig {
        let kind = self.resolve_kind(node);
        let group = node.group.clone().or_else(|| self.defaults.group.clone());

        let mut resolved = ResolvedNodeConfig {
            kind: kind.clone(),
            group: group.clone(),
            ..Default::default()
        };

        resolved.apply(&self.defaults, ConfigLevel::Defaults);
        if let Some(frag) = self.kinds.get(&kind) {
            resolved.apply(frag, ConfigLevel::Kind);
        }
        if let Some(frag) = group.as_ref().and_then(|g| self.groups.get(g)) {
            resolved.apply(frag, ConfigLevel::Group);
        }
        resolved.apply(node, ConfigLevel::Node);

        resolved
    }

    /// Resolve a node by name. `None` only when the name is undeclared.
    #[must_use]
    pub fn resolve_node(&self, name: &str) -> Option<ResolvedNodeConfig> {
        self.nodes.get(name).map(|node| self.resolve(node))
    }
}

impl TopologyFile {
    /// Lab name, empty when the document omits one.
    #[must_use]
    pub fn lab_name(&self) -> String {
        self.name.clone().unwrap_or_default()
    }
}

/// Full container name for a declared node, following the containerlab
/// naming rule: `clab-<lab>-<node>` by default, `<prefix>-<lab>-<node>` with
/// an explicit prefix, and the bare node name when the prefix is empty.
#[must_use]
pub fn container_name(prefix: Option<&str>, lab_name: &str, node_name: &str) -> String {
    match prefix {
        None => format!("clab-{lab_name}-{node_name}"),
        Some("") => node_name.to_string(),
        Some(p) => format!("{p}-{lab_name}-{node_name}"),
    }
}

/// Render a YAML scalar as a plain string (labels may be typed in YAML even
/// though the compiler treats them as text).
#[must_use]
pub fn scalar_to_string(value: &serde_yaml::Value) -> String {
    match value {
        serde_yaml::Value::String(s) => s.clone(),
        serde_yaml::Value::Number(n) => n.to_string(),
        serde_yaml::Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}
