//! # lg-graph – LabGraph topology compiler
//!
//! lg-graph turns a containerlab-style lab description into a normalized
//! graph model: a flat list of node and edge elements ready for visual
//! rendering and round-trip editing.
//!
//! ## Pipeline overview
//! 1. Config resolution ([`topology`]) – merge per-node configuration
//!    through the `node > group > kind > defaults` inheritance chain.
//! 2. Link normalization ([`compiler::links`]) – reduce every link shape to
//!    a canonical two-endpoint form, synthesizing stable ids for implicit
//!    host/mgmt-net/macvlan/vxlan/dummy endpoints.
//! 3. Element construction ([`compiler::nodes`], [`compiler::special`],
//!    [`compiler::edges`]) – one graph node per declared or special
//!    endpoint, one edge per normalized link, optionally enriched with
//!    container-runtime state through an injected
//!    [`RuntimeDataProvider`](lg_core::runtime::RuntimeDataProvider).
//! 4. Alias handling ([`compiler::alias`]) – let one YAML bridge appear as
//!    several independently placed visual nodes.
//!
//! The entry point [`compiler::compile`] orchestrates these stages in one
//! deterministic pass and also reports legacy-data migrations
//! ([`compiler::migrate`]) without ever mutating the source document.
//!
//! Pipeline stages are annotated with [`tracing`] spans so hosts can
//! observe progress and diagnostics.

pub mod compiler;
pub mod model;
pub mod topology;

pub use compiler::{
    CompileOptions,
    compile,
};
pub use model::{
    CompiledGraph,
    EdgeElement,
    GraphElement,
    NodeElement,
};
pub use topology::TopologyFile;
