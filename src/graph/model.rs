//! Graph topology and per-node view state.
//!
//! [`GraphModel`] owns every vertex, group and edge of a loaded graph and keeps
//! the visibility invariants intact across include/exclude and regrouping:
//!
//! - an edge is hidden iff one of its attached ends is excluded, where a
//!   grouped vertex also counts as excluded while its group is;
//! - only an excluded vertex without a group owns a [`FloatingPoint`];
//! - required/provided marks on a grouped vertex are mirrored on its group.
//!
//! Highlight traversals may temporarily show hidden edges. Include/exclude of
//! an endpoint only touches edges whose far end is in the viewport, so such an
//! override survives a neighbour leaving and coming back; a highlight reset
//! restores the invariant.

use log::debug;

use super::error::{GraphError, GraphResult};
use super::node::{
	Coordinates, Edge, EdgeIdx, FloatingPoint, GraphNode, Group, GroupIdx, NodeKind, NodeRef,
	NodeState, Vertex, VertexIdx,
};
use super::sidebar::{NoopSidebar, SidebarAdapter, SidebarList, SidebarLists};
use super::types::PassThrough;

/// Loaded graph plus its sidebar bookkeeping.
pub struct GraphModel {
	pub(super) vertices: Vec<Vertex>,
	pub(super) groups: Vec<Group>,
	pub(super) edges: Vec<Edge>,
	pub(super) sidebar_lists: SidebarLists,
	pub(super) metadata: PassThrough,
	pub(super) selected: Option<NodeRef>,
	sidebar: Box<dyn SidebarAdapter>,
	canvas_size: f64,
}

impl std::fmt::Debug for GraphModel {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("GraphModel")
			.field("vertices", &self.vertices.len())
			.field("groups", &self.groups.len())
			.field("edges", &self.edges.len())
			.field("canvas_size", &self.canvas_size)
			.finish()
	}
}

impl GraphModel {
	/// Empty model over a canvas of the given extent.
	pub fn new(canvas_size: f64) -> Self {
		Self {
			vertices: Vec::new(),
			groups: Vec::new(),
			edges: Vec::new(),
			sidebar_lists: SidebarLists::default(),
			metadata: PassThrough::default(),
			selected: None,
			sidebar: Box::new(NoopSidebar),
			canvas_size,
		}
	}

	/// Replaces the sidebar adapter notified on exclusion changes.
	pub fn set_sidebar(&mut self, sidebar: Box<dyn SidebarAdapter>) {
		self.sidebar = sidebar;
	}

	pub fn canvas_size(&self) -> f64 {
		self.canvas_size
	}

	/// Opaque classification metadata from the payload.
	pub fn metadata(&self) -> &PassThrough {
		&self.metadata
	}

	/// Node selected by the payload, if any.
	pub fn selected(&self) -> Option<NodeRef> {
		self.selected
	}

	pub fn vertices(&self) -> &[Vertex] {
		&self.vertices
	}

	pub fn groups(&self) -> &[Group] {
		&self.groups
	}

	pub fn edges(&self) -> &[Edge] {
		&self.edges
	}

	pub fn vertex(&self, idx: VertexIdx) -> GraphResult<&Vertex> {
		self.vertices
			.get(idx.0)
			.ok_or_else(|| GraphError::unknown("vertex", idx.0))
	}

	pub fn vertex_mut(&mut self, idx: VertexIdx) -> GraphResult<&mut Vertex> {
		self.vertices
			.get_mut(idx.0)
			.ok_or_else(|| GraphError::unknown("vertex", idx.0))
	}

	pub fn group(&self, idx: GroupIdx) -> GraphResult<&Group> {
		self.groups
			.get(idx.0)
			.ok_or_else(|| GraphError::unknown("group", idx.0))
	}

	pub fn group_mut(&mut self, idx: GroupIdx) -> GraphResult<&mut Group> {
		self.groups
			.get_mut(idx.0)
			.ok_or_else(|| GraphError::unknown("group", idx.0))
	}

	pub fn edge(&self, idx: EdgeIdx) -> GraphResult<&Edge> {
		self.edges
			.get(idx.0)
			.ok_or_else(|| GraphError::unknown("edge", idx.0))
	}

	pub fn edge_mut(&mut self, idx: EdgeIdx) -> GraphResult<&mut Edge> {
		self.edges
			.get_mut(idx.0)
			.ok_or_else(|| GraphError::unknown("edge", idx.0))
	}

	pub fn node(&self, node: NodeRef) -> GraphResult<&dyn GraphNode> {
		match node {
			NodeRef::Vertex(v) => self.vertex(v).map(|v| v as &dyn GraphNode),
			NodeRef::Group(g) => self.group(g).map(|g| g as &dyn GraphNode),
		}
	}

	pub fn node_mut(&mut self, node: NodeRef) -> GraphResult<&mut dyn GraphNode> {
		match node {
			NodeRef::Vertex(v) => self.vertex_mut(v).map(|v| v as &mut dyn GraphNode),
			NodeRef::Group(g) => self.group_mut(g).map(|g| g as &mut dyn GraphNode),
		}
	}

	pub fn state(&self, node: NodeRef) -> GraphResult<&NodeState> {
		self.node(node).map(|n| n.state())
	}

	pub fn state_mut(&mut self, node: NodeRef) -> GraphResult<&mut NodeState> {
		self.node_mut(node).map(|n| n.state_mut())
	}

	/// Every node of both variants, vertices first.
	pub fn nodes(&self) -> impl Iterator<Item = NodeRef> + '_ {
		(0..self.vertices.len())
			.map(|i| NodeRef::Vertex(VertexIdx(i)))
			.chain((0..self.groups.len()).map(|i| NodeRef::Group(GroupIdx(i))))
	}

	/// Nodes drawn in the viewport: included group-less vertices, then included
	/// groups, both in insertion order.
	pub fn visible_nodes(&self) -> Vec<NodeRef> {
		let vertices = self
			.vertices
			.iter()
			.enumerate()
			.filter(|(_, v)| v.group.is_none() && !v.node.excluded)
			.map(|(i, _)| NodeRef::Vertex(VertexIdx(i)));
		let groups = self
			.groups
			.iter()
			.enumerate()
			.filter(|(_, g)| !g.node.excluded)
			.map(|(i, _)| NodeRef::Group(GroupIdx(i)));
		vertices.chain(groups).collect()
	}

	pub fn vertex_by_id(&self, id: i64) -> Option<VertexIdx> {
		self.vertices
			.iter()
			.position(|v| v.node.id == id)
			.map(VertexIdx)
	}

	pub fn group_by_id(&self, id: i64) -> Option<GroupIdx> {
		self.groups
			.iter()
			.position(|g| g.node.id == id)
			.map(GroupIdx)
	}

	/// Resolves a `"<type>-<id>"` key such as `vertex-12` or `group-3`.
	pub fn resolve(&self, key: &str) -> GraphResult<NodeRef> {
		let (prefix, id) = key
			.split_once('-')
			.filter(|(_, id)| !id.contains('-'))
			.ok_or_else(|| GraphError::invalid_input(format!("malformed node key {key:?}")))?;
		let id: i64 = id
			.trim()
			.parse()
			.map_err(|_| GraphError::invalid_input(format!("malformed node id in {key:?}")))?;

		let kind = match prefix {
			"vertex" => NodeKind::Vertex,
			"group" => NodeKind::Group,
			_ => return Err(GraphError::TypeMismatch(key.to_string())),
		};

		match kind {
			NodeKind::Vertex => self
				.vertex_by_id(id)
				.map(NodeRef::Vertex)
				.ok_or_else(|| GraphError::unknown("vertex", id)),
			NodeKind::Group => self
				.group_by_id(id)
				.map(NodeRef::Group)
				.ok_or_else(|| GraphError::unknown("group", id)),
		}
	}

	/// Node an edge end visually attaches to: the vertex's group if it has one.
	pub fn attachment(&self, vertex: VertexIdx) -> NodeRef {
		match self.vertices.get(vertex.0).and_then(|v| v.group) {
			Some(g) => NodeRef::Group(g),
			None => NodeRef::Vertex(vertex),
		}
	}

	/// Whether an edge end at `vertex` counts as excluded.
	pub fn endpoint_excluded(&self, vertex: VertexIdx) -> bool {
		let Some(v) = self.vertices.get(vertex.0) else {
			return false;
		};
		v.node.excluded
			|| v
				.group
				.and_then(|g| self.groups.get(g.0))
				.is_some_and(|g| g.node.excluded)
	}

	/// `hidden` value the visibility invariant prescribes for `edge`.
	pub fn edge_should_hide(&self, edge: &Edge) -> bool {
		edge.from.is_some_and(|v| self.endpoint_excluded(v))
			|| edge.to.is_some_and(|v| self.endpoint_excluded(v))
	}

	/// Recomputes `hidden` on one edge from its endpoints.
	pub fn refresh_edge(&mut self, idx: EdgeIdx) -> GraphResult<()> {
		let hide = self.edge_should_hide(self.edge(idx)?);
		self.edge_mut(idx)?.hidden = hide;
		Ok(())
	}

	/// In- and out-edges of `node`; for a group, those of all its members.
	pub fn incident_edges(&self, node: NodeRef) -> GraphResult<Vec<EdgeIdx>> {
		let state = self.state(node)?;
		Ok(state
			.in_edges
			.iter()
			.chain(state.out_edges.iter())
			.copied()
			.collect())
	}

	/// Recomputes `hidden` on the edges of `node`, leaving alone those whose
	/// far end sits in another excluded node. Their visibility belongs to that
	/// node and may be overridden by its sidebar highlight.
	fn refresh_incident_edges(&mut self, node: NodeRef) -> GraphResult<()> {
		let state = self.state(node)?;
		let ends: Vec<(EdgeIdx, bool)> = state
			.in_edges
			.iter()
			.map(|&e| (e, true))
			.chain(state.out_edges.iter().map(|&e| (e, false)))
			.collect();
		for (idx, incoming) in ends {
			let edge = self.edge(idx)?;
			let far = if incoming { edge.from } else { edge.to };
			if far.is_some_and(|v| self.attachment(v) != node && self.endpoint_excluded(v)) {
				continue;
			}
			self.refresh_edge(idx)?;
		}
		Ok(())
	}

	/// Moves `node` out of the viewport into the excluded list.
	pub fn exclude(&mut self, node: NodeRef) -> GraphResult<()> {
		self.exclude_into(node, SidebarList::Excluded)
	}

	/// Moves `node` out of the viewport into `list`.
	pub fn exclude_into(&mut self, node: NodeRef, list: SidebarList) -> GraphResult<()> {
		if self.node(node)?.is_excluded() {
			return Ok(());
		}
		debug!("excluding {:?} into {:?}", node, list);

		self.set_excluded(node, true)?;
		self.state_mut(node)?.sidebar = Some(list);
		self.sidebar_lists.push(list, node);
		self.sidebar.add_node(list, node);
		self.refresh_incident_edges(node)
	}

	/// Files `node` under `list`, excluding it first if it is in the viewport.
	/// A node already held by another list moves over.
	pub fn exclude_to_list(&mut self, node: NodeRef, list: SidebarList) -> GraphResult<()> {
		if !self.node(node)?.is_excluded() {
			return self.exclude_into(node, list);
		}
		let current = self.state(node)?.sidebar;
		if current == Some(list) {
			return Ok(());
		}
		if let Some(from) = current {
			debug!("moving {:?} from {:?} to {:?}", node, from, list);
			self.sidebar_lists.remove(from, node);
			self.sidebar.remove_node(from, node);
		}
		self.state_mut(node)?.sidebar = Some(list);
		self.sidebar_lists.push(list, node);
		self.sidebar.add_node(list, node);
		Ok(())
	}

	/// Returns an excluded `node` to the viewport.
	pub fn include(&mut self, node: NodeRef) -> GraphResult<()> {
		if !self.node(node)?.is_excluded() {
			return Ok(());
		}
		debug!("including {:?}", node);

		if let Some(list) = self.state_mut(node)?.sidebar.take() {
			self.sidebar_lists.remove(list, node);
			self.sidebar.remove_node(list, node);
		}
		self.set_excluded(node, false)?;
		self.refresh_incident_edges(node)
	}

	/// Flips the exclusion flag, creating or dropping the floater of a
	/// group-less vertex.
	fn set_excluded(&mut self, node: NodeRef, excluded: bool) -> GraphResult<()> {
		self.state_mut(node)?.excluded = excluded;

		let NodeRef::Vertex(idx) = node else {
			return Ok(());
		};
		let vertex = self
			.vertices
			.get_mut(idx.0)
			.ok_or_else(|| GraphError::unknown("vertex", idx.0))?;
		if vertex.group.is_some() {
			return Ok(());
		}

		if excluded {
			vertex.floater = Some(FloatingPoint {
				vertex: idx,
				in_edges: vertex.node.in_edges.clone(),
				out_edges: vertex.node.out_edges.clone(),
			});
			self.sidebar.add_floater(idx);
		} else if vertex.floater.take().is_some() {
			self.sidebar.remove_floater(idx);
		}
		Ok(())
	}

	/// Makes `group` the owner of `vertex`.
	///
	/// The vertex's edges join the group's aggregate edge lists and any floater
	/// the vertex held is dropped; from now on the group carries its exclusion.
	pub fn add_to_group(&mut self, vertex: VertexIdx, group: GroupIdx) -> GraphResult<()> {
		self.group(group)?;
		let v = self.vertex_mut(vertex)?;
		match v.group {
			Some(current) if current == group => return Ok(()),
			Some(current) => {
				return Err(GraphError::invalid_input(format!(
					"vertex {} already belongs to group {}",
					v.node.id, current.0
				)));
			}
			None => {}
		}

		v.group = Some(group);
		let (in_edges, out_edges) = (v.node.in_edges.clone(), v.node.out_edges.clone());
		if v.floater.take().is_some() {
			self.sidebar.remove_floater(vertex);
		}

		let g = self.group_mut(group)?;
		g.vertices.push(vertex);
		g.node.in_edges.extend(in_edges);
		g.node.out_edges.extend(out_edges);

		self.refresh_incident_edges(NodeRef::Vertex(vertex))
	}

	/// Stores a new position, e.g. at the end of a drag.
	pub fn set_position(&mut self, node: NodeRef, position: Coordinates) -> GraphResult<()> {
		self.state_mut(node)?.position = position;
		Ok(())
	}

	/// Marks `node` as required by a highlighted node, mirroring onto its group.
	pub fn set_highlighted_required(&mut self, node: NodeRef, value: bool) -> GraphResult<()> {
		self.state_mut(node)?.highlight.required = value;
		if let Some(g) = self.owning_group(node) {
			self.group_mut(g)?.node.highlight.required = value;
		}
		Ok(())
	}

	/// Marks `node` as provided to a highlighted node, mirroring onto its group.
	pub fn set_highlighted_provided(&mut self, node: NodeRef, value: bool) -> GraphResult<()> {
		self.state_mut(node)?.highlight.provided = value;
		if let Some(g) = self.owning_group(node) {
			self.group_mut(g)?.node.highlight.provided = value;
		}
		Ok(())
	}

	fn owning_group(&self, node: NodeRef) -> Option<GroupIdx> {
		match node {
			NodeRef::Vertex(v) => self.vertices.get(v.0).and_then(|v| v.group),
			NodeRef::Group(_) => None,
		}
	}

	/// Flags vertices whose name contains `term` (case-insensitive) as found.
	///
	/// Returns the number of matches. An empty term clears every mark.
	pub fn search(&mut self, term: &str) -> usize {
		let needle = term.trim().to_lowercase();
		let mut matches = 0;
		for vertex in &mut self.vertices {
			let found = !needle.is_empty() && vertex.node.name.to_lowercase().contains(&needle);
			vertex.node.found = found;
			matches += usize::from(found);
		}
		debug!("search {:?} matched {} vertices", term, matches);
		matches
	}

	pub(super) fn push_vertex(&mut self, vertex: Vertex) -> VertexIdx {
		self.vertices.push(vertex);
		VertexIdx(self.vertices.len() - 1)
	}

	pub(super) fn push_group(&mut self, group: Group) -> GroupIdx {
		self.groups.push(group);
		GroupIdx(self.groups.len() - 1)
	}

	/// Adds an edge, attaching whichever ends are given.
	pub(super) fn push_edge(
		&mut self,
		mut edge: Edge,
		from: Option<VertexIdx>,
		to: Option<VertexIdx>,
	) -> EdgeIdx {
		let idx = EdgeIdx(self.edges.len());
		edge.from = from;
		edge.to = to;
		self.edges.push(edge);

		if let Some(v) = from.and_then(|f| self.vertices.get_mut(f.0)) {
			v.node.out_edges.push(idx);
		}
		if let Some(v) = to.and_then(|t| self.vertices.get_mut(t.0)) {
			v.node.in_edges.push(idx);
		}
		if let (Some(f), Some(t)) = (from, to) {
			let from_archetype = self.vertices.get(f.0).and_then(|v| v.archetype);
			let to_archetype = self.vertices.get(t.0).and_then(|v| v.archetype);
			if let Some(v) = self.vertices.get_mut(f.0) {
				v.increment_related_archetype(to_archetype);
			}
			if let Some(v) = self.vertices.get_mut(t.0) {
				v.increment_related_archetype(from_archetype);
			}
		}
		idx
	}
}
