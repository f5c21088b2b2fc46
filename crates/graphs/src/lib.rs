//! The graph modality (`SPEC_FULL.md` §4.4): directed/undirected
//! multigraphs over integer vertex identifiers, each vertex stored as one
//! adjacency blob in the underlying engine.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adjacency;
pub mod store;

pub use adjacency::{Incidence, VertexRecord};
pub use store::{Edge, GraphStore, VertexEdges};
