//! Vertices, groups, edges and the shared node capability trait.
//!
//! Entities live in arenas inside [`GraphModel`](super::GraphModel) and refer to
//! each other by index. Nothing is ever removed from an arena, so an index
//! handed out during construction stays valid for the whole session.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;

use super::sidebar::SidebarList;

/// Approximate width of one name character in the vertex box.
const CHAR_WIDTH: f64 = 8.3;
const VERTEX_MIN_WIDTH: f64 = 200.0;
const VERTEX_HEIGHT: f64 = 30.0;
const GROUP_SIZE: f64 = 70.0;

/// Arena index of a vertex.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VertexIdx(pub usize);

/// Arena index of a group.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GroupIdx(pub usize);

/// Arena index of an edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EdgeIdx(pub usize);

/// Tagged reference to a top-level node of either variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NodeRef {
	Vertex(VertexIdx),
	Group(GroupIdx),
}

impl From<VertexIdx> for NodeRef {
	fn from(idx: VertexIdx) -> Self {
		NodeRef::Vertex(idx)
	}
}

impl From<GroupIdx> for NodeRef {
	fn from(idx: GroupIdx) -> Self {
		NodeRef::Group(idx)
	}
}

/// Discriminant of a [`NodeRef`], also the prefix of `"<type>-<id>"` keys.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
	Vertex,
	Group,
}

impl NodeKind {
	pub fn prefix(self) -> &'static str {
		match self {
			NodeKind::Vertex => "vertex",
			NodeKind::Group => "group",
		}
	}
}

impl fmt::Display for NodeKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.prefix())
	}
}

/// Immutable 2D coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Coordinates {
	pub x: f64,
	pub y: f64,
}

impl Coordinates {
	pub const fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}

	/// Euclidean distance to `other`.
	pub fn distance(self, other: Coordinates) -> f64 {
		let (dx, dy) = (self.x - other.x, self.y - other.y);
		(dx * dx + dy * dy).sqrt()
	}
}

/// Box size of a node in canvas units.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Size {
	pub width: f64,
	pub height: f64,
}

/// Highlight state of a node.
///
/// `required_neighbours`/`provided_neighbours` record which neighbour sets the
/// node itself is currently showing; `required`/`provided` mark the node as a
/// neighbour of some other highlighted node.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HighlightFlags {
	pub highlighted: bool,
	pub required: bool,
	pub provided: bool,
	pub required_neighbours: bool,
	pub provided_neighbours: bool,
}

impl HighlightFlags {
	pub fn is_neutral(&self) -> bool {
		*self == Self::default()
	}
}

/// State shared by vertices and groups.
#[derive(Clone, Debug, Default)]
pub struct NodeState {
	pub id: i64,
	pub name: String,
	pub position: Coordinates,
	pub size: Size,
	pub excluded: bool,
	pub highlight: HighlightFlags,
	pub dimmed: bool,
	pub found: bool,
	pub in_edges: Vec<EdgeIdx>,
	pub out_edges: Vec<EdgeIdx>,
	/// Sidebar list currently holding this node, if excluded through one.
	pub sidebar: Option<SidebarList>,
}

impl NodeState {
	/// Centre of the node box, where edges attach.
	pub fn center(&self) -> Coordinates {
		Coordinates::new(
			self.position.x + self.size.width / 2.0,
			self.position.y + self.size.height / 2.0,
		)
	}
}

/// Capability interface shared by both node variants.
pub trait GraphNode {
	fn state(&self) -> &NodeState;
	fn state_mut(&mut self) -> &mut NodeState;
	fn kind(&self) -> NodeKind;

	fn id(&self) -> i64 {
		self.state().id
	}

	fn name(&self) -> &str {
		&self.state().name
	}

	fn position(&self) -> Coordinates {
		self.state().position
	}

	fn is_excluded(&self) -> bool {
		self.state().excluded
	}

	fn highlight(&self) -> HighlightFlags {
		self.state().highlight
	}

	fn in_edges(&self) -> &[EdgeIdx] {
		&self.state().in_edges
	}

	fn out_edges(&self) -> &[EdgeIdx] {
		&self.state().out_edges
	}

	fn edge_count(&self) -> usize {
		self.in_edges().len() + self.out_edges().len()
	}

	/// `"<type>-<id>"` key used by payloads and the sidebar.
	fn key(&self) -> String {
		format!("{}-{}", self.kind().prefix(), self.id())
	}
}

/// Surrogate anchor for an excluded, group-less vertex.
///
/// Keeps the vertex's edges addressable so the view can draw connectors from
/// the sidebar entry back into the viewport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FloatingPoint {
	pub vertex: VertexIdx,
	pub in_edges: Vec<EdgeIdx>,
	pub out_edges: Vec<EdgeIdx>,
}

/// One software component.
#[derive(Clone, Debug)]
pub struct Vertex {
	pub node: NodeState,
	pub symbolic_name: String,
	pub exported_packages: Vec<Value>,
	pub imported_packages: Vec<Value>,
	pub archetype: Option<usize>,
	/// Number of relations to vertices of each archetype.
	pub related_archetypes: BTreeMap<usize, u32>,
	pub group: Option<GroupIdx>,
	pub floater: Option<FloatingPoint>,
}

impl Vertex {
	pub fn new(id: i64, name: impl Into<String>) -> Self {
		let name = name.into();
		let width = (30.0 + name.chars().count() as f64 * CHAR_WIDTH).max(VERTEX_MIN_WIDTH);
		Self {
			node: NodeState {
				id,
				name,
				size: Size {
					width,
					height: VERTEX_HEIGHT,
				},
				..NodeState::default()
			},
			symbolic_name: String::new(),
			exported_packages: Vec::new(),
			imported_packages: Vec::new(),
			archetype: None,
			related_archetypes: BTreeMap::new(),
			group: None,
			floater: None,
		}
	}

	pub fn is_unconnected(&self) -> bool {
		self.node.in_edges.is_empty() && self.node.out_edges.is_empty()
	}

	pub fn increment_related_archetype(&mut self, archetype: Option<usize>) {
		if let Some(a) = archetype {
			*self.related_archetypes.entry(a).or_insert(0) += 1;
		}
	}
}

impl GraphNode for Vertex {
	fn state(&self) -> &NodeState {
		&self.node
	}

	fn state_mut(&mut self) -> &mut NodeState {
		&mut self.node
	}

	fn kind(&self) -> NodeKind {
		NodeKind::Vertex
	}
}

/// A cluster of vertices shown as one node.
#[derive(Clone, Debug)]
pub struct Group {
	pub node: NodeState,
	pub vertices: Vec<VertexIdx>,
}

impl Group {
	pub fn new(id: i64, name: impl Into<String>) -> Self {
		Self {
			node: NodeState {
				id,
				name: name.into(),
				size: Size {
					width: GROUP_SIZE,
					height: GROUP_SIZE,
				},
				..NodeState::default()
			},
			vertices: Vec::new(),
		}
	}
}

impl GraphNode for Group {
	fn state(&self) -> &NodeState {
		&self.node
	}

	fn state_mut(&mut self) -> &mut NodeState {
		&mut self.node
	}

	fn kind(&self) -> NodeKind {
		NodeKind::Group
	}
}

/// A directed dependency. Either end may be unattached when the payload
/// referenced an unknown vertex id.
#[derive(Clone, Debug, Default)]
pub struct Edge {
	pub id: i64,
	pub from: Option<VertexIdx>,
	pub to: Option<VertexIdx>,
	pub hidden: bool,
	pub dimmed: bool,
	pub highlighted: bool,
	pub highlighted_required: bool,
	pub highlighted_provided: bool,
}

impl Edge {
	pub fn new(id: i64) -> Self {
		Self {
			id,
			..Self::default()
		}
	}

	pub fn clear_highlight(&mut self) {
		self.highlighted = false;
		self.highlighted_required = false;
		self.highlighted_provided = false;
	}
}
