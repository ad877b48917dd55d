//! Force-directed layout over the visible node set.
//!
//! Each step accumulates three influences per node and moves it once:
//! inverse-distance repulsion from every other visible node, attraction
//! towards each edge neighbour that grows with distance, and containment
//! inside a circle around the canvas centre. There is no convergence test;
//! callers choose the number of steps.

use std::collections::HashMap;
use std::f64::consts::SQRT_2;

use log::debug;
use serde::Deserialize;

use super::error::{GraphError, GraphResult};
use super::model::GraphModel;
use super::node::{Coordinates, NodeRef};

/// Tuning constants for the layout.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutConfig {
	/// Steps of the automatic layout after loading.
	pub iterations: usize,
	/// Steps of a user-triggered re-layout.
	pub relayout_iterations: usize,
	/// Scales repulsion (direct proportion).
	pub repulsive_strength: f64,
	/// Divides attraction (inverse proportion). Must be non-zero.
	pub attractive_strength: f64,
	/// Divides the accumulated force before moving. Must be non-zero.
	pub dampening: f64,
	/// Divides the canvas size to obtain the containment border. Must be non-zero.
	pub border_ratio: f64,
}

impl Default for LayoutConfig {
	fn default() -> Self {
		Self {
			iterations: 30,
			relayout_iterations: 20,
			repulsive_strength: 400.0,
			attractive_strength: 510.0,
			dampening: 1000.0,
			border_ratio: 1.0,
		}
	}
}

/// Force-directed position solver bound to one canvas extent.
#[derive(Clone, Debug)]
pub struct LayoutEngine {
	config: LayoutConfig,
	canvas_size: f64,
	force_field: HashMap<NodeRef, (f64, f64)>,
}

impl LayoutEngine {
	/// Rejects configurations whose divisors are zero.
	pub fn new(config: LayoutConfig, canvas_size: f64) -> GraphResult<Self> {
		for (name, value) in [
			("attractive_strength", config.attractive_strength),
			("dampening", config.dampening),
			("border_ratio", config.border_ratio),
		] {
			if value == 0.0 || !value.is_finite() {
				return Err(GraphError::invalid_input(format!(
					"layout {name} must be a non-zero finite number, got {value}"
				)));
			}
		}
		Ok(Self {
			config,
			canvas_size,
			force_field: HashMap::new(),
		})
	}

	/// Engine with default constants sized to `graph`'s canvas.
	pub fn for_graph(graph: &GraphModel) -> Self {
		Self {
			config: LayoutConfig::default(),
			canvas_size: graph.canvas_size(),
			force_field: HashMap::new(),
		}
	}

	pub fn config(&self) -> &LayoutConfig {
		&self.config
	}

	/// Centre of the canvas the layout is contained around.
	pub fn center(&self) -> Coordinates {
		let half = self.canvas_size / 2.0;
		Coordinates::new(half, half)
	}

	/// Largest distance from [`center`](Self::center) a node may end a step at.
	pub fn max_radius(&self) -> f64 {
		SQRT_2 * (self.canvas_size / self.config.border_ratio)
	}

	/// Automatic layout after loading.
	pub fn run_initial(&mut self, graph: &mut GraphModel) -> GraphResult<()> {
		self.run(graph, self.config.iterations)
	}

	/// User-triggered re-layout.
	pub fn run_relayout(&mut self, graph: &mut GraphModel) -> GraphResult<()> {
		self.run(graph, self.config.relayout_iterations)
	}

	/// Runs `iterations` steps back to back.
	pub fn run(&mut self, graph: &mut GraphModel, iterations: usize) -> GraphResult<()> {
		debug!(
			"layout: {} iterations over {} visible nodes",
			iterations,
			graph.visible_nodes().len()
		);
		for _ in 0..iterations {
			self.step(graph)?;
		}
		Ok(())
	}

	/// One layout iteration.
	pub fn step(&mut self, graph: &mut GraphModel) -> GraphResult<()> {
		let visible = graph.visible_nodes();
		let positions = visible
			.iter()
			.map(|&n| -> GraphResult<_> { Ok((n, graph.state(n)?.position)) })
			.collect::<GraphResult<Vec<_>>>()?;

		self.force_field.clear();
		for &(node, _) in &positions {
			self.force_field.insert(node, (0.0, 0.0));
		}

		self.apply_repulsion(&positions);
		self.apply_attraction(graph, &positions)?;

		for &(node, position) in &positions {
			let (fx, fy) = self.force_field.get(&node).copied().unwrap_or_default();
			let mut next = self.integrate(position, fx, fy);
			next = self.contain(next);
			if next != position {
				graph.set_position(node, next)?;
			}
		}
		Ok(())
	}

	fn apply_repulsion(&mut self, positions: &[(NodeRef, Coordinates)]) {
		let strength = self.config.repulsive_strength;
		for (i, &(node, current)) in positions.iter().enumerate() {
			let (mut fx, mut fy) = (0.0, 0.0);
			for (j, &(_, other)) in positions.iter().enumerate() {
				if i == j {
					continue;
				}
				let (dx, dy) = (current.x - other.x, current.y - other.y);
				let distance = (dx * dx + dy * dy).sqrt();
				if distance != 0.0 {
					fx += (dx * (strength / distance)).floor();
					fy += (dy * (strength / distance)).floor();
				}
			}
			self.add_force(node, fx, fy);
		}
	}

	fn apply_attraction(
		&mut self,
		graph: &GraphModel,
		positions: &[(NodeRef, Coordinates)],
	) -> GraphResult<()> {
		let strength = self.config.attractive_strength;
		for &(node, current) in positions {
			let state = graph.state(node)?;
			let sources = state
				.in_edges
				.iter()
				.map(|&e| graph.edge(e).map(|edge| edge.from));
			let targets = state
				.out_edges
				.iter()
				.map(|&e| graph.edge(e).map(|edge| edge.to));

			let (mut fx, mut fy) = (0.0, 0.0);
			for neighbour in sources.chain(targets) {
				let Some(vertex) = neighbour? else {
					continue;
				};
				let other = graph.state(graph.attachment(vertex))?.position;
				let (dx, dy) = (current.x - other.x, current.y - other.y);
				let distance = (dx * dx + dy * dy).sqrt();
				// Grows with distance on purpose; keep the empirically tuned shape.
				fx += round_half_up(-dx * (distance / strength));
				fy += round_half_up(-dy * (distance / strength));
			}
			self.add_force(node, fx, fy);
		}
		Ok(())
	}

	fn add_force(&mut self, node: NodeRef, fx: f64, fy: f64) {
		let force = self.force_field.entry(node).or_insert((0.0, 0.0));
		force.0 += fx;
		force.1 += fy;
	}

	/// Applies the dampened force, ignoring sub-unit jitter.
	fn integrate(&self, position: Coordinates, fx: f64, fy: f64) -> Coordinates {
		let (fx, fy) = (
			(fx / self.config.dampening).trunc(),
			(fy / self.config.dampening).trunc(),
		);
		if fx.abs() > 1.0 || fy.abs() > 1.0 {
			Coordinates::new(position.x + fx, position.y + fy)
		} else {
			position
		}
	}

	/// Pulls a position back onto the containment circle if it lies outside.
	fn contain(&self, position: Coordinates) -> Coordinates {
		let center = self.center();
		let (dx, dy) = (position.x - center.x, position.y - center.y);
		let distance = (dx * dx + dy * dy).sqrt();
		let max = self.max_radius();
		if distance > max {
			let ratio = max / distance;
			Coordinates::new(center.x + dx * ratio, center.y + dy * ratio)
		} else {
			position
		}
	}
}

/// Rounds halves towards positive infinity, so -2.5 becomes -2.
fn round_half_up(value: f64) -> f64 {
	(value + 0.5).floor()
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::graph::node::{Edge, Vertex, VertexIdx};
	use proptest::prelude::*;

	fn engine(canvas: f64) -> LayoutEngine {
		LayoutEngine::new(LayoutConfig::default(), canvas).unwrap()
	}

	fn place(g: &mut GraphModel, id: i64, x: f64, y: f64) -> VertexIdx {
		let idx = g.push_vertex(Vertex::new(id, format!("v{id}")));
		g.set_position(idx.into(), Coordinates::new(x, y)).unwrap();
		idx
	}

	fn position(g: &GraphModel, v: VertexIdx) -> Coordinates {
		g.vertex(v).unwrap().node.position
	}

	#[test]
	fn rejects_zero_divisors() {
		for config in [
			LayoutConfig {
				attractive_strength: 0.0,
				..LayoutConfig::default()
			},
			LayoutConfig {
				dampening: 0.0,
				..LayoutConfig::default()
			},
			LayoutConfig {
				border_ratio: 0.0,
				..LayoutConfig::default()
			},
		] {
			assert!(matches!(
				LayoutEngine::new(config, 1000.0),
				Err(GraphError::InvalidInput(_))
			));
		}
	}

	#[test]
	fn config_deserialises_partial_overrides() {
		let config: LayoutConfig =
			serde_json::from_str(r#"{"iterations": 5, "repulsiveStrength": 100}"#).unwrap();
		assert_eq!(config.iterations, 5);
		assert_eq!(config.repulsive_strength, 100.0);
		assert_eq!(config.dampening, 1000.0);
	}

	#[test]
	fn close_unconnected_nodes_push_apart() {
		let mut g = GraphModel::new(1000.0);
		let a = place(&mut g, 1, 500.0, 500.0);
		let b = place(&mut g, 2, 505.0, 500.0);
		let mut layout = LayoutEngine::new(
			LayoutConfig {
				repulsive_strength: 4000.0,
				..LayoutConfig::default()
			},
			1000.0,
		)
		.unwrap();

		layout.step(&mut g).unwrap();

		// floor(-5 * 4000 / 5) / 1000 = -4 and floor(5 * 4000 / 5) / 1000 = 4.
		assert_eq!(position(&g, a), Coordinates::new(496.0, 500.0));
		assert_eq!(position(&g, b), Coordinates::new(509.0, 500.0));
	}

	#[test]
	fn small_forces_do_not_move_nodes() {
		let mut g = GraphModel::new(1000.0);
		let a = place(&mut g, 1, 100.0, 100.0);
		let b = place(&mut g, 2, 900.0, 900.0);
		engine(1000.0).step(&mut g).unwrap();
		assert_eq!(position(&g, a), Coordinates::new(100.0, 100.0));
		assert_eq!(position(&g, b), Coordinates::new(900.0, 900.0));
	}

	#[test]
	fn distant_neighbours_attract() {
		let mut g = GraphModel::new(4000.0);
		let a = place(&mut g, 1, 1000.0, 2000.0);
		let b = place(&mut g, 2, 3000.0, 2000.0);
		g.push_edge(Edge::new(1), Some(a), Some(b));

		let before = position(&g, b).x - position(&g, a).x;
		engine(4000.0).run(&mut g, 3).unwrap();
		let after = position(&g, b).x - position(&g, a).x;

		assert!(after < before, "{after} should be below {before}");
		assert_eq!(position(&g, a).y, 2000.0);
	}

	#[test]
	fn excluded_nodes_are_left_alone() {
		let mut g = GraphModel::new(1000.0);
		let a = place(&mut g, 1, 500.0, 500.0);
		let b = place(&mut g, 2, 501.0, 500.0);
		g.exclude(b.into()).unwrap();
		let mut layout = LayoutEngine::new(
			LayoutConfig {
				repulsive_strength: 100_000.0,
				..LayoutConfig::default()
			},
			1000.0,
		)
		.unwrap();
		layout.run(&mut g, 5).unwrap();
		assert_eq!(position(&g, a), Coordinates::new(500.0, 500.0));
		assert_eq!(position(&g, b), Coordinates::new(501.0, 500.0));
	}

	#[test]
	fn runs_are_deterministic() {
		let build = || {
			let mut g = GraphModel::new(1200.0);
			let vs: Vec<_> = (0..6)
				.map(|i| place(&mut g, i, 100.0 + 37.0 * i as f64, 900.0 - 53.0 * i as f64))
				.collect();
			for w in vs.windows(2) {
				g.push_edge(Edge::new(0), Some(w[0]), Some(w[1]));
			}
			g
		};
		let (mut first, mut second) = (build(), build());
		engine(1200.0).run(&mut first, 10).unwrap();
		engine(1200.0).run(&mut second, 10).unwrap();
		let positions = |g: &GraphModel| {
			g.vertices()
				.iter()
				.map(|v| v.node.position)
				.collect::<Vec<_>>()
		};
		assert_eq!(positions(&first), positions(&second));
	}

	#[test]
	fn half_rounding_matches_expected_direction() {
		assert_eq!(round_half_up(2.5), 3.0);
		assert_eq!(round_half_up(-2.5), -2.0);
		assert_eq!(round_half_up(-2.6), -3.0);
	}

	proptest! {
		#[test]
		fn visible_nodes_end_inside_the_containment_circle(
			points in prop::collection::vec((-5000.0f64..5000.0, -5000.0f64..5000.0), 1..12),
			border_ratio in 1.0f64..4.0,
			iterations in 1usize..4,
		) {
			let mut g = GraphModel::new(1000.0);
			let vs: Vec<_> = points
				.iter()
				.enumerate()
				.map(|(i, &(x, y))| place(&mut g, i as i64, x, y))
				.collect();
			for w in vs.windows(2) {
				g.push_edge(Edge::new(0), Some(w[0]), Some(w[1]));
			}
			let mut layout = LayoutEngine::new(
				LayoutConfig { border_ratio, ..LayoutConfig::default() },
				1000.0,
			).unwrap();

			layout.run(&mut g, iterations).unwrap();

			let center = layout.center();
			for v in &vs {
				let d = position(&g, *v).distance(center);
				prop_assert!(d <= layout.max_radius() + 1e-6, "distance {} > {}", d, layout.max_radius());
			}
		}
	}
}
