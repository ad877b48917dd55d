//! Builds a [`GraphModel`] from a load payload and exports it back.
//!
//! Construction order matters: vertices, then edges, then automatic exclusion
//! of unconnected vertices, then groups (which may take over such vertices and
//! drop their floaters), then sidebar exclusions and finally the payload's
//! selection.

use log::{debug, info, warn};
use rand::Rng;
use serde_json::Value;

use super::error::{GraphError, GraphResult};
use super::highlight::HighlightEngine;
use super::model::GraphModel;
use super::node::{Coordinates, Edge, EdgeIdx, Group, NodeRef, Vertex, VertexIdx};
use super::sidebar::SidebarList;
use super::types::{
	EdgeData, GraphPayload, GroupData, PassThrough, Position, SideBarEntry, VertexData,
};

/// Side of the square canvas for `vertex_count` vertices.
///
/// Area grows sub-linearly so the average spacing between nodes stays
/// roughly constant as graphs get bigger.
pub fn canvas_size(vertex_count: usize) -> f64 {
	if vertex_count == 0 {
		return 1000.0;
	}
	let n = vertex_count as f64;
	(n * 75.0) / n.sqrt().round() + 1000.0
}

/// Entry point for turning payload text into a model.
#[derive(Clone, Copy, Debug, Default)]
pub struct Loader;

impl Loader {
	/// Parses `text` and builds the model with thread-local randomness.
	pub fn from_json(text: &str) -> GraphResult<GraphModel> {
		let payload = GraphPayload::from_json(text)?;
		GraphModel::build(&payload)
	}
}

impl GraphModel {
	/// Builds a model, randomising missing positions with the thread RNG.
	pub fn build(payload: &GraphPayload) -> GraphResult<Self> {
		Self::build_with_rng(payload, &mut rand::thread_rng())
	}

	/// Builds a model drawing random positions from `rng`.
	pub fn build_with_rng<R: Rng + ?Sized>(payload: &GraphPayload, rng: &mut R) -> GraphResult<Self> {
		let vertices = payload
			.vertices
			.as_ref()
			.ok_or_else(|| GraphError::invalid_input("payload has no vertices"))?;
		let edges = payload
			.edges
			.as_ref()
			.ok_or_else(|| GraphError::invalid_input("payload has no edges"))?;

		let canvas = canvas_size(vertices.len());
		let mut graph = GraphModel::new(canvas);
		graph.metadata = PassThrough {
			vertex_archetypes: payload.vertex_archetypes.clone(),
			edge_archetypes: payload.edge_archetypes.clone(),
			attribute_types: payload.attribute_types.clone(),
			possible_enum_values: payload.possible_enum_values.clone(),
		};

		for data in vertices {
			let mut vertex = Vertex::new(data.id, data.name.clone());
			vertex.symbolic_name = data.symbolic_name.clone();
			vertex.exported_packages = data.exported_packages.clone();
			vertex.imported_packages = data.imported_packages.clone();
			vertex.archetype = data.archetype;
			vertex.node.position = initial_position(data.position, canvas, rng);
			graph.push_vertex(vertex);
		}

		for data in edges {
			let from = graph.vertex_by_id(data.from);
			let to = graph.vertex_by_id(data.to);
			if from.is_none() || to.is_none() {
				warn!(
					"edge {} references unknown vertex ({} -> {}), leaving it unattached",
					data.id, data.from, data.to
				);
			}
			graph.push_edge(Edge::new(data.id), from, to);
		}

		let unconnected: Vec<_> = graph
			.nodes()
			.filter(|n| matches!(n, NodeRef::Vertex(v) if graph.vertices[v.0].is_unconnected()))
			.collect();
		for node in &unconnected {
			graph.exclude_into(*node, SidebarList::Unconnected)?;
		}

		for data in &payload.groups {
			let name = data
				.name
				.clone()
				.unwrap_or_else(|| format!("Group {}", data.id));
			let mut group = Group::new(data.id, name);
			group.node.position = initial_position(data.position, canvas, rng);
			let idx = graph.push_group(group);

			// Vertices are claimed in vertex order, not list order.
			let members: Vec<_> = graph
				.vertices
				.iter()
				.enumerate()
				.filter(|(_, v)| data.vertices_id.contains(&v.node.id))
				.map(|(i, _)| VertexIdx(i))
				.collect();
			for vertex in members {
				if let Err(err) = graph.add_to_group(vertex, idx) {
					warn!("group {}: {}", data.id, err);
				}
			}
		}

		let mut highlight = HighlightEngine::new();
		for entry in &payload.side_bar {
			let Some(node) = resolve_side_bar_entry(&graph, entry) else {
				continue;
			};
			graph.exclude_to_list(node, SidebarList::Excluded)?;
			if entry.is_highlighted {
				highlight.highlight_sidebar_node(&mut graph, node)?;
			}
		}

		if let Some(edge) = payload
			.selected_edge_id()
			.and_then(|id| graph.edges.iter().position(|e| e.id == id))
		{
			highlight.highlight_edge(&mut graph, EdgeIdx(edge))?;
		}

		if let Some(key) = payload.selected_vertex.as_deref() {
			match graph.resolve(key) {
				Ok(node) => {
					highlight.set_highlighted_with_neighbours(&mut graph, node, true)?;
					graph.selected = Some(node);
				}
				Err(err) => debug!("ignoring selection {:?}: {}", key, err),
			}
		}

		info!(
			"loaded {} vertices, {} edges, {} groups ({} unconnected) on a {} canvas",
			graph.vertices.len(),
			graph.edges.len(),
			graph.groups.len(),
			unconnected.len(),
			canvas
		);
		Ok(graph)
	}

	/// Current state as a payload, suitable for saving and reloading.
	pub fn to_payload(&self) -> GraphPayload {
		let vertices = self
			.vertices
			.iter()
			.map(|v| VertexData {
				id: v.node.id,
				name: v.node.name.clone(),
				symbolic_name: v.symbolic_name.clone(),
				exported_packages: v.exported_packages.clone(),
				imported_packages: v.imported_packages.clone(),
				archetype: v.archetype,
				position: Some(to_position(v.node.position)),
			})
			.collect();

		let edges = self
			.edges
			.iter()
			.filter_map(|e| {
				let from = self.vertices.get(e.from?.0)?.node.id;
				let to = self.vertices.get(e.to?.0)?.node.id;
				Some(EdgeData { id: e.id, from, to })
			})
			.collect();

		let groups = self
			.groups
			.iter()
			.map(|g| GroupData {
				id: g.node.id,
				name: Some(g.node.name.clone()),
				vertices_id: g
					.vertices
					.iter()
					.filter_map(|v| self.vertices.get(v.0))
					.map(|v| v.node.id)
					.collect(),
				position: Some(to_position(g.node.position)),
			})
			.collect();

		let side_bar = self
			.sidebar_nodes(SidebarList::Excluded)
			.iter()
			.filter_map(|&n| self.node(n).ok())
			.map(|n| SideBarEntry {
				id: Value::String(n.key()),
				is_highlighted: n.highlight().highlighted,
			})
			.collect();

		GraphPayload {
			vertices: Some(vertices),
			edges: Some(edges),
			groups,
			vertex_archetypes: self.metadata.vertex_archetypes.clone(),
			edge_archetypes: self.metadata.edge_archetypes.clone(),
			attribute_types: self.metadata.attribute_types.clone(),
			possible_enum_values: self.metadata.possible_enum_values.clone(),
			selected_vertex: None,
			selected_edge: None,
			side_bar,
		}
	}
}

fn initial_position<R: Rng + ?Sized>(stored: Option<Position>, canvas: f64, rng: &mut R) -> Coordinates {
	match stored {
		Some(p) => Coordinates::new(p.x, p.y),
		None => Coordinates::new(
			(rng.r#gen::<f64>() * canvas).floor(),
			(rng.r#gen::<f64>() * canvas).floor(),
		),
	}
}

fn to_position(c: Coordinates) -> Position {
	Position { x: c.x, y: c.y }
}

/// Resolves a sidebar entry, skipping anything malformed or unknown.
fn resolve_side_bar_entry(graph: &GraphModel, entry: &SideBarEntry) -> Option<NodeRef> {
	let Value::String(key) = &entry.id else {
		debug!("skipping sidebar entry with non-string id {}", entry.id);
		return None;
	};
	match graph.resolve(key) {
		Ok(node) => Some(node),
		Err(err) => {
			debug!("skipping sidebar entry {:?}: {}", key, err);
			None
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use pretty_assertions::assert_eq;
	use proptest::prelude::*;
	use rand::SeedableRng;
	use rand::rngs::StdRng;
	use serde_json::json;

	fn rng() -> StdRng {
		StdRng::seed_from_u64(42)
	}

	fn payload(value: Value) -> GraphPayload {
		serde_json::from_value(value).unwrap()
	}

	fn build(value: Value) -> GraphModel {
		GraphModel::build_with_rng(&payload(value), &mut rng()).unwrap()
	}

	#[test]
	fn canvas_grows_sub_linearly() {
		assert_eq!(canvas_size(16), 1300.0);
		assert_eq!(canvas_size(0), 1000.0);
		assert_eq!(canvas_size(1), 1075.0);
		assert_eq!(canvas_size(3), 1112.5);
	}

	#[test]
	fn missing_collections_are_invalid_input() {
		for value in [json!({"edges": []}), json!({"vertices": []})] {
			let result = GraphModel::build_with_rng(&payload(value), &mut rng());
			assert!(matches!(result, Err(GraphError::InvalidInput(_))));
		}
		assert!(matches!(Loader::from_json("{"), Err(GraphError::Json(_))));
	}

	#[test]
	fn unconnected_vertices_are_filed_separately() {
		let g = build(json!({
			"vertices": [
				{"id": 1, "name": "a"},
				{"id": 2, "name": "b"},
				{"id": 3, "name": "lonely"}
			],
			"edges": [{"id": 1, "from": 1, "to": 2}]
		}));
		let lonely = NodeRef::Vertex(VertexIdx(2));
		assert!(g.vertices()[2].node.excluded);
		assert!(g.vertices()[2].floater.is_some());
		assert_eq!(g.sidebar_nodes(SidebarList::Unconnected), &[lonely]);
		assert!(g.sidebar_nodes(SidebarList::Excluded).is_empty());
		assert!(!g.vertices()[0].node.excluded);
	}

	#[test]
	fn saved_side_bar_moves_unconnected_vertex_to_excluded() {
		let g = build(json!({
			"vertices": [
				{"id": 1, "name": "a"},
				{"id": 2, "name": "b"},
				{"id": 3, "name": "lonely"}
			],
			"edges": [{"id": 1, "from": 1, "to": 2}],
			"sideBar": [{"id": "vertex-3"}]
		}));
		let lonely = NodeRef::Vertex(VertexIdx(2));
		assert!(g.sidebar_nodes(SidebarList::Unconnected).is_empty());
		assert_eq!(g.sidebar_nodes(SidebarList::Excluded), &[lonely]);
		assert_eq!(g.vertices()[2].node.sidebar, Some(SidebarList::Excluded));
		assert!(g.vertices()[2].floater.is_some());
	}

	#[test]
	fn unresolved_edge_ends_are_kept_unattached() {
		let g = build(json!({
			"vertices": [{"id": 1, "name": "a"}],
			"edges": [{"id": 7, "from": 1, "to": 99}]
		}));
		let edge = &g.edges()[0];
		assert_eq!(edge.from, Some(VertexIdx(0)));
		assert_eq!(edge.to, None);
		assert!(!g.vertices()[0].node.excluded);
	}

	#[test]
	fn positions_are_kept_or_randomised_inside_canvas() {
		let g = build(json!({
			"vertices": [
				{"id": 1, "name": "a", "position": {"x": 12.5, "y": -4}},
				{"id": 2, "name": "b"}
			],
			"edges": [{"id": 1, "from": 1, "to": 2}]
		}));
		assert_eq!(g.vertices()[0].node.position, Coordinates::new(12.5, -4.0));
		let p = g.vertices()[1].node.position;
		assert!((0.0..g.canvas_size()).contains(&p.x));
		assert!((0.0..g.canvas_size()).contains(&p.y));
		assert_eq!(p.x, p.x.floor());
	}

	#[test]
	fn archetype_relations_count_both_ends() {
		let g = build(json!({
			"vertices": [
				{"id": 1, "name": "a", "archetype": 0},
				{"id": 2, "name": "b", "archetype": 1},
				{"id": 3, "name": "c", "archetype": 1}
			],
			"edges": [
				{"id": 1, "from": 1, "to": 2},
				{"id": 2, "from": 1, "to": 3},
				{"id": 3, "from": 1, "to": 404}
			]
		}));
		assert_eq!(g.vertices()[0].related_archetypes.get(&1), Some(&2));
		assert_eq!(g.vertices()[1].related_archetypes.get(&0), Some(&1));
	}

	#[test]
	fn grouping_an_unconnected_vertex_drops_its_floater() {
		let g = build(json!({
			"vertices": [
				{"id": 1, "name": "a"},
				{"id": 2, "name": "b"},
				{"id": 3, "name": "lonely"}
			],
			"edges": [{"id": 1, "from": 1, "to": 2}],
			"groups": [{"id": 1, "verticesId": [3, 1]}]
		}));
		let lonely = &g.vertices()[2];
		assert!(lonely.floater.is_none());
		assert_eq!(lonely.group.map(|gr| gr.0), Some(0));
		assert_eq!(g.groups()[0].vertices, vec![VertexIdx(0), VertexIdx(2)]);
		assert_eq!(g.groups()[0].node.name, "Group 1");
	}

	#[test]
	fn side_bar_entries_exclude_and_skip_malformed() {
		let g = build(json!({
			"vertices": [
				{"id": 1, "name": "a"},
				{"id": 2, "name": "b"},
				{"id": 3, "name": "c"}
			],
			"edges": [
				{"id": 1, "from": 1, "to": 2},
				{"id": 2, "from": 3, "to": 1}
			],
			"groups": [{"id": 8, "verticesId": [3]}],
			"sideBar": [
				{"id": "vertex-2", "isHighlighted": false},
				{"id": "group-8", "isHighlighted": true},
				{"id": 5},
				{"id": "vertex"},
				{"id": "edge-1"},
				{"id": "vertex-77"}
			]
		}));
		let b = NodeRef::Vertex(VertexIdx(1));
		let group = g.resolve("group-8").unwrap();
		assert_eq!(g.sidebar_nodes(SidebarList::Excluded), &[b, group]);

		let flags = g.state(group).unwrap().highlight;
		assert!(flags.highlighted);
		assert!(flags.required_neighbours && flags.provided_neighbours);
		// The group's out-edge to "a" is shown despite the group being excluded.
		assert!(!g.edges()[1].hidden);
		assert!(g.edges()[0].hidden);
	}

	#[test]
	fn selection_highlights_neighbourhood() {
		let g = build(json!({
			"vertices": [
				{"id": 1, "name": "a"},
				{"id": 2, "name": "b"},
				{"id": 3, "name": "c"},
				{"id": 4, "name": "d"},
				{"id": 5, "name": "e"}
			],
			"edges": [
				{"id": 1, "from": 1, "to": 2},
				{"id": 2, "from": 2, "to": 3},
				{"id": 3, "from": 4, "to": 5}
			],
			"selectedVertex": "vertex-2",
			"selectedEdge": 3
		}));
		assert_eq!(g.selected(), Some(NodeRef::Vertex(VertexIdx(1))));
		assert!(g.vertices()[0].node.highlight.required);
		assert!(g.vertices()[2].node.highlight.provided);
		assert!(g.vertices()[3].node.dimmed);
		// The global pass after the edge selection clears the edge highlight.
		assert!(!g.edges()[2].highlighted);
	}

	#[test]
	fn selected_edge_alone_marks_both_ends() {
		let g = build(json!({
			"vertices": [{"id": 1, "name": "a"}, {"id": 2, "name": "b"}],
			"edges": [{"id": 9, "from": 1, "to": 2}],
			"selectedEdge": "9"
		}));
		assert!(g.edges()[0].highlighted);
		assert!(g.vertices()[0].node.highlight.highlighted);
		assert!(g.vertices()[1].node.highlight.highlighted);
		assert_eq!(g.selected(), None);
	}

	#[test]
	fn export_preserves_layout_and_exclusions() {
		let mut g = build(json!({
			"vertices": [
				{"id": 1, "name": "a", "position": {"x": 1, "y": 2}},
				{"id": 2, "name": "b", "position": {"x": 3, "y": 4}},
				{"id": 3, "name": "c", "position": {"x": 5, "y": 6}}
			],
			"edges": [
				{"id": 1, "from": 1, "to": 2},
				{"id": 2, "from": 2, "to": 3},
				{"id": 3, "from": 2, "to": 404}
			],
			"vertexArchetypes": [{"name": "bundle"}]
		}));
		g.exclude(NodeRef::Vertex(VertexIdx(2))).unwrap();
		g.set_position(NodeRef::Vertex(VertexIdx(0)), Coordinates::new(40.0, 50.0))
			.unwrap();

		let exported = g.to_payload();
		assert_eq!(exported.edges.as_ref().map(Vec::len), Some(2));
		assert_eq!(exported.vertex_archetypes, json!([{"name": "bundle"}]));

		let reloaded = GraphModel::build_with_rng(&exported, &mut rng()).unwrap();
		assert_eq!(
			reloaded.vertices()[0].node.position,
			Coordinates::new(40.0, 50.0)
		);
		assert!(reloaded.vertices()[2].node.excluded);
		assert_eq!(
			reloaded.sidebar_nodes(SidebarList::Excluded),
			&[NodeRef::Vertex(VertexIdx(2))]
		);
	}

	proptest! {
		#[test]
		fn canvas_size_matches_formula(n in 1usize..5000) {
			let expected = (n as f64 * 75.0) / (n as f64).sqrt().round() + 1000.0;
			prop_assert_eq!(canvas_size(n), expected);
			prop_assert!(canvas_size(n) >= 1000.0);
		}
	}
}
