//! Dependency graph core: topology, sidebar exclusion, highlighting and layout.
//!
//! Everything here is plain owned data driven through [`GraphModel`]; the view
//! layer only reads node state and forwards gestures back as calls on the
//! model, [`HighlightEngine`] or [`LayoutEngine`].
//!
//! # Example
//!
//! ```
//! use dep_explorer::graph::{GraphModel, GraphPayload, HighlightEngine, LayoutEngine};
//!
//! let payload = GraphPayload::from_json(r#"{
//!     "vertices": [{"id": 1, "name": "core"}, {"id": 2, "name": "app"}],
//!     "edges": [{"id": 1, "from": 2, "to": 1}]
//! }"#).unwrap();
//! let mut graph = GraphModel::build(&payload).unwrap();
//!
//! let mut layout = LayoutEngine::for_graph(&graph);
//! layout.run_initial(&mut graph).unwrap();
//!
//! let app = graph.resolve("vertex-2").unwrap();
//! HighlightEngine::new().toggle(&mut graph, app).unwrap();
//! assert!(graph.vertices()[0].node.highlight.provided);
//! ```

mod error;
mod highlight;
mod layout;
mod loader;
mod model;
mod node;
mod sidebar;
mod types;

pub use error::{GraphError, GraphResult};
pub use highlight::HighlightEngine;
pub use layout::{LayoutConfig, LayoutEngine};
pub use loader::{Loader, canvas_size};
pub use model::GraphModel;
pub use node::{
	Coordinates, Edge, EdgeIdx, FloatingPoint, GraphNode, Group, GroupIdx, HighlightFlags,
	NodeKind, NodeRef, NodeState, Size, Vertex, VertexIdx,
};
pub use sidebar::{
	NoopSidebar, SidebarAdapter, SidebarEntry, SidebarList, SidebarLists, SortKey, SortOrder,
};
pub use types::{
	EdgeData, GraphPayload, GroupData, PassThrough, Position, SideBarEntry, VertexData,
};
