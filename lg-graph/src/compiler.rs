//! The compile pipeline.
//!
//! One compile call is one deterministic, synchronous pass:
//! 1. Resolve lab identity (name, container prefix).
//! 2. Detect legacy `graph-*` label migrations.
//! 3. Build node elements in document order (collecting interface-pattern
//!    migrations along the way).
//! 4. Normalize links and materialize special "cloud" nodes.
//! 5. Build edge elements with dense `Clab-Link<N>` ids.
//! 6. Materialize alias nodes, rewire edges to them, and soft-hide fully
//!    aliased base bridges.
//!
//! Every stage only appends to or mutates the shared element list; no stage
//! re-reads the YAML. All per-run state (synthetic-id counters, caches)
//! lives in objects scoped to the call, so concurrent compiles need no
//! coordination.

pub mod alias;
pub mod distributed;
pub mod edges;
pub mod links;
pub mod migrate;
pub mod nodes;
pub mod special;

use lg_core::annotations::LabAnnotations;
use lg_core::runtime::RuntimeDataProvider;
use tracing::{
    info,
    instrument,
    warn,
};

use crate::model::{
    CompiledGraph,
    GraphElement,
};
use crate::topology::TopologyFile;

/// Optional inputs of a compile call. With no provider the compiler runs in
/// "editor mode": structurally complete output, empty runtime fields.
#[derive(Clone, Copy, Default)]
pub struct CompileOptions<'a> {
    pub annotations: Option<&'a LabAnnotations>,
    pub provider: Option<&'a dyn RuntimeDataProvider>,
}

/// Compile a topology document into a renderable graph.
///
/// Never fails: structural defects are skipped and logged, semantic defects
/// surface as data on the affected elements.
#[instrument(skip_all, fields(lab = doc.name.as_deref().unwrap_or("")))]
pub fn compile(doc: &TopologyFile, opts: CompileOptions<'_>) -> CompiledGraph {
    let default_annotations = LabAnnotations::default();
    let annotations = opts.annotations.unwrap_or(&default_annotations);
    let lab_name = doc.lab_name();
    let prefix = doc.prefix.as_deref();

    let Some(topology) = &doc.topology else {
        warn!("document has no topology section, producing an empty graph");
        return CompiledGraph {
            lab_name,
            prefix: doc.prefix.clone(),
            is_preset_layout: true,
            ..Default::default()
        };
    };

    let graph_label_migrations = migrate::detect_graph_label_migrations(topology, annotations);

    let node_build = nodes::build_node_elements(topology, &lab_name, prefix, annotations, opts.provider);

    // Links are iterated in document order; a link that fails normalization
    // is reported and skipped without consuming an edge index.
    let mut link_ctx = links::LinkContext::new();
    let mut normalized = Vec::with_capacity(topology.links.len());
    for (seq, def) in topology.links.iter().enumerate() {
        match links::normalize_link(def, seq, normalized.len(), &mut link_ctx) {
            Ok(link) => normalized.push(link),
            Err(err) => warn!(seq, %err, "skipping malformed link"),
        }
    }

    let special_nodes = special::collect_special_nodes(&normalized, topology, annotations);
    let edge_elements = edges::build_edge_elements(&normalized, topology, &lab_name, prefix, opts.provider);

    let mut elements: Vec<GraphElement> = node_build
        .nodes
        .into_iter()
        .chain(special_nodes)
        .map(GraphElement::Node)
        .chain(edge_elements.into_iter().map(GraphElement::Edge))
        .collect();

    alias::apply_aliases(&mut elements, topology, annotations);

    info!(
        elements = elements.len(),
        pending_migrations = node_build.migrations.len(),
        "compiled topology"
    );

    CompiledGraph {
        elements,
        lab_name,
        prefix: doc.prefix.clone(),
        is_preset_layout: node_build.is_preset_layout,
        pending_migrations: node_build.migrations,
        graph_label_migrations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ValidationTag;

    fn parse(doc: &str) -> TopologyFile {
        serde_yaml::from_str(doc).unwrap()
    }

    #[test]
    fn missing_topology_key_yields_an_empty_graph() {
        let doc = parse("name: hollow\n");
        let graph = compile(&doc, CompileOptions::default());

        assert_eq!(graph.lab_name, "hollow");
        assert!(graph.elements.is_empty());
    }

    #[tracing_test::traced_test]
    #[test]
    fn edge_indices_are_dense_over_valid_links() {
        let doc = parse(
            r#"
name: demo
topology:
  nodes:
    r1: {kind: linux}
    r2: {kind: linux}
  links:
    - endpoints: ["r1:eth1", "r2:eth1"]
    - endpoints: ["r1:eth2"]            # malformed: one endpoint
    - type: wormhole                    # malformed: unknown type
      endpoint: "r1:eth3"
    - endpoints: ["r1:eth4", "r2:eth4"]
"#,
        );
        let graph = compile(&doc, CompileOptions::default());

        let ids: Vec<_> = graph
            .elements
            .iter()
            .filter_map(GraphElement::as_edge)
            .map(|e| e.id.as_str())
            .collect();
        assert_eq!(ids, vec!["Clab-Link0", "Clab-Link1"]);
        assert!(logs_contain("skipping malformed link"));
    }

    #[test]
    fn compiling_twice_reproduces_synthetic_ids() {
        let yaml = r#"
name: demo
topology:
  nodes:
    r1: {kind: linux}
  links:
    - type: vxlan
      endpoint: "r1:eth1"
      remote: 10.0.0.1
      vni: 100
      dst-port: 4789
    - type: dummy
      endpoint: "r1:eth2"
"#;
        let targets = |graph: &CompiledGraph| -> Vec<String> {
            graph
                .elements
                .iter()
                .filter_map(GraphElement::as_edge)
                .map(|e| e.target.clone())
                .collect()
        };

        let first = compile(&parse(yaml), CompileOptions::default());
        let second = compile(&parse(yaml), CompileOptions::default());
        assert_eq!(targets(&first), targets(&second));
        assert_eq!(targets(&first), vec!["vxlan:vxlan0", "dummy0"]);
    }

    #[test]
    fn group_supplied_kind_and_vxlan_validation_scenario() {
        let doc = parse(
            r#"
name: demo
topology:
  kinds:
    y_kind: {image: y-image}
  groups:
    G: {kind: y_kind}
  nodes:
    r1: {kind: x_kind}
    r2: {group: G}
  links:
    - type: vxlan
      endpoint: {node: r1, interface: eth1}
      remote: "1.2.3.4"
"#,
        );
        let graph = compile(&doc, CompileOptions::default());

        let r2 = graph
            .elements
            .iter()
            .filter_map(GraphElement::as_node)
            .find(|n| n.id == "r2")
            .unwrap();
        assert_eq!(r2.extra.kind, "y_kind");

        let edge = graph.elements.iter().filter_map(GraphElement::as_edge).next().unwrap();
        assert_eq!(edge.target, "vxlan:vxlan0");
        assert_eq!(
            edge.extra.ext_validation_errors,
            vec![ValidationTag::MissingVni, ValidationTag::MissingDstPort]
        );
    }
}
