//! Distributed-chassis node resolution.
//!
//! A distributed node is one logical router backed by several containers,
//! one per chassis component. Interfaces are declared against the logical
//! node in hierarchical chassis notation (`card[/xN][/mda][/cC]/port`) and
//! must be resolved to a flat interface alias on one of the backing
//! containers.

use itertools::Itertools;
use lazy_static::lazy_static;
use lg_core::runtime::{
    ContainerInfo,
    InterfaceInfo,
    RuntimeDataProvider,
};
use regex::Regex;
use tracing::debug;

use crate::topology::ResolvedNodeConfig;

/// The only kind simulated as a multi-container chassis.
pub const DISTRIBUTED_KIND: &str = "nokia_srsim";

lazy_static! {
    static ref CHASSIS_PORT: Regex = Regex::new(r"^(\d+)(?:/x(\d+))?(?:/(\d+))?(?:/c(\d+))?/(\d+)$").unwrap();
}

/// Whether a node is a distributed chassis (specific kind plus a non-empty
/// `components` list).
#[must_use]
pub fn is_distributed(config: &ResolvedNodeConfig) -> bool {
    config.kind == DISTRIBUTED_KIND && !config.components.is_empty()
}

/// Map chassis port notation to the flat interface alias exposed by the
/// backing container (`1/1/c2/3` -> `e1-1-2-3`). Names that do not match
/// the notation (already-flat `eth*`/`e*` aliases in particular) pass
/// through unchanged.
#[must_use]
pub fn flatten_interface(name: &str) -> String {
    let Some(caps) = CHASSIS_PORT.captures(name) else {
        return name.to_string();
    };
    let segments = caps.iter().skip(1).flatten().map(|m| m.as_str()).join("-");
    format!("e{segments}")
}

/// Ordering key for component slots: slot `a` first, then `b`, then the
/// rest alphabetically.
fn slot_rank(slot: &str) -> (u8, String) {
    let lower = slot.to_ascii_lowercase();
    match lower.as_str() {
        "a" => (0, lower),
        "b" => (1, lower),
        _ => (2, lower),
    }
}

/// Candidate backing-container names, in resolution priority order.
#[must_use]
pub fn component_candidates(base_container: &str, config: &ResolvedNodeConfig) -> Vec<String> {
    let mut slots: Vec<&str> = config.components.iter().map(|c| c.slot.as_str()).collect();
    slots.sort_by_key(|s| slot_rank(s));
    slots
        .into_iter()
        .map(|slot| format!("{base_container}-{}", slot.to_ascii_lowercase()))
        .collect()
}

/// Resolve the container backing a node: direct lookup first, then the
/// distributed candidates in slot order.
pub fn resolve_container(
    provider: &dyn RuntimeDataProvider,
    base_container: &str,
    config: &ResolvedNodeConfig,
    lab_name: &str,
) -> Option<ContainerInfo> {
    if let Some(found) = provider.find_container(base_container, lab_name) {
        return Some(found);
    }
    if !is_distributed(config) {
        return None;
    }
    component_candidates(base_container, config)
        .into_iter()
        .find_map(|candidate| provider.find_component_container(&candidate, lab_name))
}

/// Resolve one interface of a node to its backing container and runtime
/// state. Returns the container name actually holding the interface so the
/// caller can attribute stats correctly. First match wins.
pub fn resolve_interface(
    provider: &dyn RuntimeDataProvider,
    base_container: &str,
    config: &ResolvedNodeConfig,
    iface_name: &str,
    lab_name: &str,
) -> Option<(String, InterfaceInfo)> {
    if let Some(found) = provider.find_interface(base_container, iface_name, lab_name) {
        return Some((base_container.to_string(), found));
    }
    if !is_distributed(config) {
        return None;
    }

    let flat = flatten_interface(iface_name);
    for candidate in component_candidates(base_container, config) {
        if let Some(found) = provider.find_component_interface(&candidate, &flat, lab_name) {
            debug!(candidate, iface = flat, "resolved distributed interface");
            return Some((candidate, found));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use lg_core::runtime::MockRuntimeDataProvider;
    use rstest::rstest;

    use super::*;
    use crate::topology::ComponentDefinition;

    fn chassis_config(slots: &[&str]) -> ResolvedNodeConfig {
        ResolvedNodeConfig {
            kind: DISTRIBUTED_KIND.to_string(),
            components: slots
                .iter()
                .map(|s| ComponentDefinition { slot: (*s).to_string(), ..Default::default() })
                .collect(),
            ..Default::default()
        }
    }

    #[rstest]
    #[case("1/1/1", "e1-1-1")]
    #[case("1/2", "e1-2")]
    #[case("1/1/c2/3", "e1-1-2-3")]
    #[case("2/x1/1/c4/6", "e2-1-1-4-6")]
    #[case("eth3", "eth3")]
    #[case("e1-1", "e1-1")]
    #[case("mgmt0", "mgmt0")]
    fn chassis_notation_flattens(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(flatten_interface(input), expected);
    }

    #[test]
    fn candidates_are_ordered_a_b_then_alphabetical() {
        let config = chassis_config(&["X", "B", "c", "A"]);
        assert_eq!(
            component_candidates("clab-demo-r1", &config),
            vec!["clab-demo-r1-a", "clab-demo-r1-b", "clab-demo-r1-c", "clab-demo-r1-x"]
        );
    }

    #[test]
    fn non_distributed_kinds_never_probe_components() {
        let config = ResolvedNodeConfig { kind: "nokia_srlinux".into(), ..Default::default() };
        let mut provider = MockRuntimeDataProvider::new();
        provider.expect_find_interface().returning(|_, _, _| None);

        assert!(resolve_interface(&provider, "clab-demo-r1", &config, "e1-1", "demo").is_none());
    }

    #[test]
    fn direct_interface_lookup_wins_over_components() {
        let config = chassis_config(&["A", "B"]);
        let mut provider = MockRuntimeDataProvider::new();
        provider.expect_find_interface().returning(|_, iface, _| {
            Some(InterfaceInfo { name: iface.to_string(), ..Default::default() })
        });

        let (container, _) = resolve_interface(&provider, "clab-demo-r1", &config, "1/1/1", "demo").unwrap();
        assert_eq!(container, "clab-demo-r1");
    }

    #[test]
    fn first_component_with_the_interface_wins() {
        let config = chassis_config(&["B", "A"]);
        let mut provider = MockRuntimeDataProvider::new();
        provider.expect_find_interface().returning(|_, _, _| None);
        provider.expect_find_component_interface().returning(|container, iface, _| {
            (container == "clab-demo-r1-b" && iface == "e1-1-1")
                .then(|| InterfaceInfo { name: iface.to_string(), state: "up".into(), ..Default::default() })
        });

        let (container, info) = resolve_interface(&provider, "clab-demo-r1", &config, "1/1/1", "demo").unwrap();
        assert_eq!(container, "clab-demo-r1-b");
        assert_eq!(info.state, "up");
    }

    #[test]
    fn container_resolution_falls_back_to_components() {
        let config = chassis_config(&["A"]);
        let mut provider = MockRuntimeDataProvider::new();
        provider.expect_find_container().returning(|_, _| None);
        provider.expect_find_component_container().returning(|container, _| {
            Some(ContainerInfo { name: container.to_string(), state: "running".into(), ..Default::default() })
        });

        let found = resolve_container(&provider, "clab-demo-r1", &config, "demo").unwrap();
        assert_eq!(found.name, "clab-demo-r1-a");
    }
}
