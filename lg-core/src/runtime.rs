//! Container-runtime data provider boundary.
//!
//! The compiler never talks to a container runtime directly; it queries this
//! trait for per-container and per-interface state and treats every miss as
//! "no data" rather than an error. Hosts with an asynchronous runtime client
//! resolve their queries up front and hand the compiler a synchronous view
//! (for example a [`SnapshotProvider`] built from a captured inspect dump).

use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::Context;
use serde::{
    Deserialize,
    Serialize,
};
use tracing::debug;

/// Interface traffic counters reported by the runtime.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrafficStats {
    pub rx_bytes: u64,
    pub tx_bytes: u64,
    pub rx_packets: u64,
    pub tx_packets: u64,
}

/// Netem impairment state attached to an interface, if any.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetemState {
    pub delay_ms: f64,
    pub jitter_ms: f64,
    pub loss_pct: f64,
    pub rate_kbit: u64,
}

/// One network interface of a running container.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterfaceInfo {
    pub name: String,
    /// Alternate name (altname/alias); lab interfaces are often looked up by
    /// their alias rather than the kernel name.
    #[serde(default)]
    pub alias: String,
    #[serde(default)]
    pub mac: String,
    #[serde(default)]
    pub mtu: i64,
    /// Operational state as reported by the runtime (`up`, `down`, ...).
    #[serde(default)]
    pub state: String,
    #[serde(default, rename = "type")]
    pub if_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<TrafficStats>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub netem: Option<NetemState>,
}

/// One running (or exited) lab container.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerInfo {
    pub name: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub ipv4_address: String,
    #[serde(default)]
    pub ipv6_address: String,
    #[serde(default)]
    pub interfaces: Vec<InterfaceInfo>,
}

/// Synchronous, side-effect-free view of the container runtime.
///
/// The component-scoped queries exist for distributed chassis nodes whose
/// interfaces live on sibling containers; the defaults simply delegate to
/// the flat queries, which is correct for providers that index every
/// container uniformly.
#[cfg_attr(feature = "testutils", mockall::automock)]
pub trait RuntimeDataProvider {
    /// Look up a container by its full name within a lab.
    fn find_container(&self, container_name: &str, lab_name: &str) -> Option<ContainerInfo>;

    /// Look up one interface of a container by name (or alias).
    fn find_interface(&self, container_name: &str, iface_name: &str, lab_name: &str) -> Option<InterfaceInfo>;

    /// Look up a backing component container of a distributed node.
    fn find_component_container(&self, container_name: &str, lab_name: &str) -> Option<ContainerInfo> {
        self.find_container(container_name, lab_name)
    }

    /// Look up an interface on a backing component container.
    fn find_component_interface(
        &self,
        container_name: &str,
        iface_name: &str,
        lab_name: &str,
    ) -> Option<InterfaceInfo> {
        self.find_interface(container_name, iface_name, lab_name)
    }
}

/// File-backed provider over a captured JSON list of [`ContainerInfo`].
///
/// The snapshot carries no lab scoping of its own, so the `lab_name`
/// argument is ignored; snapshots are captured per lab.
#[derive(Clone, Debug, Default)]
pub struct SnapshotProvider {
    containers: Vec<ContainerInfo>,
}

impl SnapshotProvider {
    #[must_use]
    pub fn new(containers: Vec<ContainerInfo>) -> Self {
        Self { containers }
    }

    /// Load a snapshot from a JSON file.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let mut raw = String::new();
        File::open(path)
            .and_then(|mut f| f.read_to_string(&mut raw))
            .with_context(|| format!("reading runtime snapshot {}", path.display()))?;
        let containers: Vec<ContainerInfo> =
            serde_json::from_str(&raw).with_context(|| format!("parsing runtime snapshot {}", path.display()))?;
        debug!(count = containers.len(), "loaded runtime snapshot");
        Ok(Self { containers })
    }
}

impl RuntimeDataProvider for SnapshotProvider {
    fn find_container(&self, container_name: &str, _lab_name: &str) -> Option<ContainerInfo> {
        self.containers.iter().find(|c| c.name == container_name).cloned()
    }

    fn find_interface(&self, container_name: &str, iface_name: &str, _lab_name: &str) -> Option<InterfaceInfo> {
        self.containers
            .iter()
            .find(|c| c.name == container_name)?
            .interfaces
            .iter()
            .find(|i| i.name == iface_name || i.alias == iface_name)
            .cloned()
    }
}
