//! Annotation sidecar data model.
//!
//! Annotations are persisted by the host (editor) next to the topology file
//! and supplied to the compiler read-only. They carry everything the YAML
//! document itself does not: canvas positions, icons, grouping, interface
//! patterns, and alias placements of bridge nodes. The compiler consumes
//! `nodeAnnotations`; other annotation classes round-trip untouched through
//! the `other` passthrough map.

use serde::{
    Deserialize,
    Serialize,
};

/// Canvas position of a node element.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
}

impl Position {
    /// Fallback position used when no annotation supplies one.
    #[must_use]
    pub const fn origin() -> Self {
        Self { x: 0.0, y: 0.0 }
    }
}

/// Geographic placement of a node (map layouts).
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoCoordinates {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
}

/// Per-node sidecar annotation.
///
/// `yaml_node_id`/`yaml_interface` turn an annotation into an alias
/// placement: the annotated id becomes an additional visual instance of the
/// referenced bridge node, owning the edges attached to that interface.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeAnnotation {
    /// Graph-node id this annotation applies to.
    pub id: String,
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
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interface_pattern: Option<String>,
    /// Base YAML node this annotation aliases, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yaml_node_id: Option<String>,
    /// Interface of the base node whose edges move to the alias.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yaml_interface: Option<String>,
    /// Display label overriding the raw node id (bridge nodes).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl NodeAnnotation {
    /// Whether this annotation places an alias of a different base node.
    #[must_use]
    pub fn is_alias_placement(&self) -> bool {
        matches!(&self.yaml_node_id, Some(base) if *base != self.id) && self.yaml_interface.is_some()
    }
}

/// One alias placement extracted from the annotation list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AliasEntry<'a> {
    /// Id of the alias graph node to materialize.
    pub alias_id: &'a str,
    /// Base YAML node (must be bridge-kind) being aliased.
    pub yaml_node_id: &'a str,
    /// Interface of the base node owned by this alias.
    pub interface: &'a str,
}

/// The full annotation sidecar for one lab.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabAnnotations {
    #[serde(default)]
    pub node_annotations: Vec<NodeAnnotation>,
    /// Annotation classes not consumed by the compiler (free text, shapes,
    /// cloud-node metadata). Preserved verbatim for round-tripping.
    #[serde(flatten)]
    pub other: serde_json::Map<String, serde_json::Value>,
}

impl LabAnnotations {
    /// Look up the annotation for a node id, if any.
    #[must_use]
    pub fn node(&self, id: &str) -> Option<&NodeAnnotation> {
        self.node_annotations.iter().find(|a| a.id == id)
    }

    /// Alias placements in annotation-list order.
    pub fn alias_entries(&self) -> impl Iterator<Item = (AliasEntry<'_>, &NodeAnnotation)> {
        self.node_annotations.iter().filter_map(|a| {
            if !a.is_alias_placement() {
                return None;
            }
            let entry = AliasEntry {
                alias_id: &a.id,
                yaml_node_id: a.yaml_node_id.as_deref()?,
                interface: a.yaml_interface.as_deref()?,
            };
            Some((entry, a))
        })
    }
}

#[cfg(test)]
mod tests {
    use assertables::assert_contains;
    use rstest::rstest;

    use super::*;

    fn alias(id: &str, base: &str, iface: &str) -> NodeAnnotation {
        NodeAnnotation {
            id: id.into(),
            yaml_node_id: Some(base.into()),
            yaml_interface: Some(iface.into()),
            ..Default::default()
        }
    }

    #[test]
    fn alias_entries_keep_annotation_order() {
        let annotations = LabAnnotations {
            node_annotations: vec![
                alias("a2", "br1", "eth2"),
                NodeAnnotation { id: "r1".into(), ..Default::default() },
                alias("a1", "br1", "eth1"),
            ],
            ..Default::default()
        };

        let ids: Vec<_> = annotations.alias_entries().map(|(e, _)| e.alias_id).collect();
        assert_eq!(ids, vec!["a2", "a1"]);
    }

    // An annotation may record its own yaml source without becoming an
    // alias placement; both a distinct base and an interface are required.
    #[rstest]
    #[case("sw1", Some("br1"), Some("eth1"), true)]
    #[case("br1", Some("br1"), Some("eth1"), false)]
    #[case("sw1", Some("br1"), None, false)]
    #[case("sw1", None, Some("eth1"), false)]
    fn alias_placement_requires_a_distinct_base_and_interface(
        #[case] id: &str,
        #[case] base: Option<&str>,
        #[case] iface: Option<&str>,
        #[case] expected: bool,
    ) {
        let a = NodeAnnotation {
            id: id.into(),
            yaml_node_id: base.map(Into::into),
            yaml_interface: iface.map(Into::into),
            ..Default::default()
        };
        assert_eq!(a.is_alias_placement(), expected);
    }

    #[test]
    fn unknown_annotation_classes_round_trip() {
        let raw = r#"{"nodeAnnotations":[{"id":"r1"}],"freeTextAnnotations":[{"id":"t1","text":"hi"}]}"#;
        let parsed: LabAnnotations = serde_json::from_str(raw).unwrap();
        assert!(parsed.other.contains_key("freeTextAnnotations"));

        let out = serde_json::to_string(&parsed).unwrap();
        assert_contains!(out, "freeTextAnnotations");
        assert_contains!(out, r#""text":"hi""#);
    }
}
