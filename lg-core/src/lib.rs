//! # lg-core – LabGraph core libraries
//!
//! Shared foundation for the LabGraph topology compiler:
//!
//! - [`annotations`] – the annotation sidecar data model (node positions,
//!   icons, interface patterns, alias placements) persisted alongside a lab.
//! - [`runtime`] – the container-runtime data provider boundary: the trait
//!   the compiler queries for live container/interface state, plus a
//!   JSON-snapshot implementation for offline use.
//! - [`logging`] – crate-standard [`tracing`] subscriber setup.

pub mod annotations;
pub mod logging;
pub mod runtime;

pub use annotations::{
    AliasEntry,
    GeoCoordinates,
    LabAnnotations,
    NodeAnnotation,
    Position,
};
pub use runtime::{
    ContainerInfo,
    InterfaceInfo,
    NetemState,
    RuntimeDataProvider,
    SnapshotProvider,
    TrafficStats,
};
