//! Load payload structures consumed by the loader and produced on export.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A stored 2D position.
#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct Position {
	pub x: f64,
	pub y: f64,
}

/// One software component.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VertexData {
	/// Unique vertex id. Edges reference vertices by this id.
	pub id: i64,
	pub name: String,
	#[serde(default)]
	pub symbolic_name: String,
	/// Opaque package descriptors; only their count is shown.
	#[serde(default)]
	pub exported_packages: Vec<Value>,
	#[serde(default)]
	pub imported_packages: Vec<Value>,
	/// Index into `vertexArchetypes`.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub archetype: Option<usize>,
	/// Stored position. Missing positions are randomised on load.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub position: Option<Position>,
}

/// A directed dependency between two vertices.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct EdgeData {
	pub id: i64,
	/// Source vertex id.
	pub from: i64,
	/// Target vertex id.
	pub to: i64,
}

/// A cluster of vertices rendered as a single node.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupData {
	pub id: i64,
	#[serde(default)]
	pub name: Option<String>,
	#[serde(default)]
	pub vertices_id: Vec<i64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub position: Option<Position>,
}

/// A node pre-excluded into the sidebar.
///
/// `id` is kept as raw JSON: entries whose id is not a `"<type>-<id>"` string
/// are skipped rather than rejected.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SideBarEntry {
	pub id: Value,
	#[serde(default)]
	pub is_highlighted: bool,
}

/// Complete load payload.
///
/// `vertices` and `edges` are optional at the serde level so that their
/// absence surfaces as [`GraphError::InvalidInput`](super::GraphError) from
/// the builder instead of a generic parse error.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphPayload {
	pub vertices: Option<Vec<VertexData>>,
	pub edges: Option<Vec<EdgeData>>,
	#[serde(default)]
	pub groups: Vec<GroupData>,
	#[serde(default)]
	pub vertex_archetypes: Value,
	#[serde(default)]
	pub edge_archetypes: Value,
	#[serde(default)]
	pub attribute_types: Value,
	#[serde(default)]
	pub possible_enum_values: Value,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub selected_vertex: Option<String>,
	/// Numeric id, sometimes delivered as a numeric string.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub selected_edge: Option<Value>,
	#[serde(default)]
	pub side_bar: Vec<SideBarEntry>,
}

impl GraphPayload {
	/// Parse a payload from JSON text.
	pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
		serde_json::from_str(text)
	}

	/// Selected edge id, accepting both numbers and numeric strings.
	pub fn selected_edge_id(&self) -> Option<i64> {
		match self.selected_edge.as_ref()? {
			Value::Number(n) => n.as_i64(),
			Value::String(s) => s.trim().parse().ok(),
			_ => None,
		}
	}
}

/// Classification metadata carried through the model untouched.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PassThrough {
	pub vertex_archetypes: Value,
	pub edge_archetypes: Value,
	pub attribute_types: Value,
	pub possible_enum_values: Value,
}

#[cfg(test)]
mod tests {
	use super::*;
	use pretty_assertions::assert_eq;

	#[test]
	fn parses_camel_case_payload() {
		let payload = GraphPayload::from_json(
			r#"{
				"vertices": [{"id": 1, "name": "core", "symbolicName": "org.core",
					"exportedPackages": ["a"], "importedPackages": [],
					"position": {"x": 10, "y": 20}}],
				"edges": [],
				"groups": [{"id": 4, "verticesId": [1]}],
				"sideBar": [{"id": "vertex-1", "isHighlighted": true}, {"id": 5}],
				"selectedVertex": "group-4",
				"selectedEdge": "12"
			}"#,
		)
		.unwrap();

		let vertices = payload.vertices.as_ref().unwrap();
		assert_eq!(vertices[0].symbolic_name, "org.core");
		assert_eq!(vertices[0].position, Some(Position { x: 10.0, y: 20.0 }));
		assert_eq!(payload.groups[0].vertices_id, vec![1]);
		assert_eq!(payload.side_bar.len(), 2);
		assert!(payload.side_bar[0].is_highlighted);
		assert_eq!(payload.selected_vertex.as_deref(), Some("group-4"));
		assert_eq!(payload.selected_edge_id(), Some(12));
	}

	#[test]
	fn absent_collections_stay_absent() {
		let payload = GraphPayload::from_json(r#"{"edges": []}"#).unwrap();
		assert!(payload.vertices.is_none());
		assert!(payload.groups.is_empty());
		assert_eq!(payload.selected_edge_id(), None);
	}
}
