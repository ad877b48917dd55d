//! Viewport state and gesture handling.
//!
//! Everything here is independent of the DOM: the component converts browser
//! events into calls on [`ViewContext`], which turns them into model,
//! highlight and layout operations.

use log::{debug, warn};

use crate::graph::{
	Coordinates, Edge, GraphModel, GraphResult, HighlightEngine, LayoutConfig, LayoutEngine,
	NodeRef, SidebarList, Size, SortKey, SortOrder, VertexIdx,
};

/// Screen distance a press must travel before it counts as a drag.
const DRAG_THRESHOLD: f64 = 3.0;
/// Screen x of the floater anchors along the viewport's left edge.
const FLOATER_X: f64 = 14.0;
const FLOATER_TOP: f64 = 40.0;
const FLOATER_SPACING: f64 = 30.0;

/// Pan and zoom transform applied to the entire graph view.
#[derive(Clone, Debug, PartialEq)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	/// Zoom factor (1.0 = 100%, clamped to 0.1..10.0).
	pub k: f64,
}

impl Default for ViewTransform {
	fn default() -> Self {
		Self {
			x: 0.0,
			y: 0.0,
			k: 1.0,
		}
	}
}

/// Tracks an in-progress node drag operation.
#[derive(Clone, Debug, Default)]
pub struct DragState {
	pub node: Option<NodeRef>,
	pub start_x: f64,
	pub start_y: f64,
	pub node_start: Coordinates,
	/// Set once the pointer leaves the click threshold.
	pub moved: bool,
}

/// Tracks an in-progress canvas pan operation.
#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub transform_start_x: f64,
	pub transform_start_y: f64,
}

/// Screen-side state of the viewport.
#[derive(Clone, Debug, Default)]
pub struct ViewState {
	pub transform: ViewTransform,
	pub drag: DragState,
	pub pan: PanState,
	pub width: f64,
	pub height: f64,
	/// Layout steps still to animate, one per frame.
	pub pending_layout: usize,
}

impl ViewState {
	/// View of a `width` x `height` surface that shows the whole layout canvas.
	pub fn fit(width: f64, height: f64, canvas_size: f64) -> Self {
		let k = (width.min(height) / canvas_size).clamp(0.1, 10.0);
		Self {
			transform: ViewTransform {
				x: (width - canvas_size * k) / 2.0,
				y: (height - canvas_size * k) / 2.0,
				k,
			},
			width,
			height,
			..Self::default()
		}
	}

	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> Coordinates {
		Coordinates::new(
			(sx - self.transform.x) / self.transform.k,
			(sy - self.transform.y) / self.transform.k,
		)
	}

	pub fn graph_to_screen(&self, p: Coordinates) -> (f64, f64) {
		(
			p.x * self.transform.k + self.transform.x,
			p.y * self.transform.k + self.transform.y,
		)
	}

	/// Zooms around the screen point (`sx`, `sy`), which stays fixed.
	pub fn zoom_at(&mut self, sx: f64, sy: f64, delta_y: f64) {
		let factor = if delta_y > 0.0 { 0.9 } else { 1.1 };
		let new_k = (self.transform.k * factor).clamp(0.1, 10.0);
		let ratio = new_k / self.transform.k;
		self.transform.x = sx - (sx - self.transform.x) * ratio;
		self.transform.y = sy - (sy - self.transform.y) * ratio;
		self.transform.k = new_k;
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
	}

	/// Anchor of the `slot`-th floater, in world coordinates.
	pub fn floater_anchor(&self, slot: usize) -> Coordinates {
		self.screen_to_graph(FLOATER_X, FLOATER_TOP + slot as f64 * FLOATER_SPACING)
	}
}

/// Vertices that currently own a floater, in slot order.
pub fn floater_slots(graph: &GraphModel) -> Vec<VertexIdx> {
	graph
		.vertices()
		.iter()
		.enumerate()
		.filter(|(_, v)| v.floater.is_some())
		.map(|(i, _)| VertexIdx(i))
		.collect()
}

/// Topmost visible node whose rectangle contains `p`.
pub fn node_at(graph: &GraphModel, p: Coordinates) -> Option<NodeRef> {
	graph.visible_nodes().into_iter().rev().find(|&n| {
		graph.state(n).is_ok_and(|s| {
			p.x >= s.position.x
				&& p.x <= s.position.x + s.size.width
				&& p.y >= s.position.y
				&& p.y <= s.position.y + s.size.height
		})
	})
}

/// Where a rendered edge starts and ends.
#[derive(Clone, Debug, PartialEq)]
pub struct EdgeRoute {
	pub from: Coordinates,
	pub to: Coordinates,
	/// Target rectangle the arrow head is clipped to, absent for anchors.
	pub target: Option<(Coordinates, Size)>,
}

/// Route of `edge` between the nodes its ends attach to.
///
/// An excluded end is drawn to its floater anchor if it has one. Edges that
/// are hidden, dangling, internal to one group or ending at an excluded node
/// without a floater are not drawn.
pub fn edge_route(graph: &GraphModel, view: &ViewState, edge: &Edge) -> Option<EdgeRoute> {
	if edge.hidden {
		return None;
	}
	let (from, to) = (edge.from?, edge.to?);
	let (a, b) = (graph.attachment(from), graph.attachment(to));
	if a == b {
		return None;
	}
	let slots = floater_slots(graph);
	let end = |vertex: VertexIdx, node: NodeRef| -> Option<(Coordinates, Option<(Coordinates, Size)>)> {
		let state = graph.state(node).ok()?;
		if !state.excluded {
			return Some((state.center(), Some((state.position, state.size))));
		}
		let slot = slots.iter().position(|v| *v == vertex)?;
		Some((view.floater_anchor(slot), None))
	};
	let (from, _) = end(from, a)?;
	let (to, target) = end(to, b)?;
	Some(EdgeRoute { from, to, target })
}

/// Point where the segment from `outside` to the centre of the rectangle
/// crosses its border.
pub fn rect_boundary_point(outside: Coordinates, position: Coordinates, size: Size) -> Coordinates {
	let center = Coordinates::new(
		position.x + size.width / 2.0,
		position.y + size.height / 2.0,
	);
	let (dx, dy) = (outside.x - center.x, outside.y - center.y);
	if dx == 0.0 && dy == 0.0 {
		return center;
	}
	let tx = if dx == 0.0 {
		f64::INFINITY
	} else {
		(size.width / 2.0) / dx.abs()
	};
	let ty = if dy == 0.0 {
		f64::INFINITY
	} else {
		(size.height / 2.0) / dy.abs()
	};
	let t = tx.min(ty).min(1.0);
	Coordinates::new(center.x + dx * t, center.y + dy * t)
}

/// User actions coming from controls outside the canvas.
#[derive(Clone, Debug, PartialEq)]
pub enum ViewAction {
	Include(NodeRef),
	IncludeAll(SidebarList),
	Sort(SidebarList, SortKey, SortOrder),
	/// Click on a sidebar entry's name: the same neighbourhood highlight as a
	/// click on the canvas.
	Toggle(NodeRef),
	ToggleRequired(NodeRef),
	ToggleProvided(NodeRef),
	ClearHighlight,
	Relayout,
	Search(String),
	Export,
}

/// Model plus engines and view state, owned by the canvas component.
#[derive(Debug)]
pub struct ViewContext {
	pub graph: GraphModel,
	pub highlight: HighlightEngine,
	pub layout: LayoutEngine,
	pub view: ViewState,
}

impl ViewContext {
	/// Fits the view to the graph and queues the initial layout.
	pub fn new(graph: GraphModel, layout: Option<LayoutConfig>, width: f64, height: f64) -> Self {
		let layout = match layout {
			Some(config) => LayoutEngine::new(config, graph.canvas_size()).unwrap_or_else(|e| {
				warn!("ignoring layout config: {}", e);
				LayoutEngine::for_graph(&graph)
			}),
			None => LayoutEngine::for_graph(&graph),
		};
		let mut view = ViewState::fit(width, height, graph.canvas_size());
		view.pending_layout = layout.config().iterations;
		Self {
			highlight: HighlightEngine::with_focus(graph.selected()),
			graph,
			layout,
			view,
		}
	}

	/// Advances a queued layout by one step.
	pub fn tick(&mut self) -> GraphResult<()> {
		if self.view.pending_layout == 0 {
			return Ok(());
		}
		self.view.pending_layout -= 1;
		if let Err(e) = self.layout.step(&mut self.graph) {
			self.view.pending_layout = 0;
			return Err(e);
		}
		Ok(())
	}

	/// Pointer down: grabs the node under the pointer or starts panning.
	pub fn press(&mut self, sx: f64, sy: f64) -> GraphResult<()> {
		let p = self.view.screen_to_graph(sx, sy);
		match node_at(&self.graph, p) {
			Some(node) => {
				self.view.drag = DragState {
					node: Some(node),
					start_x: sx,
					start_y: sy,
					node_start: self.graph.state(node)?.position,
					moved: false,
				};
			}
			None => {
				self.view.pan = PanState {
					active: true,
					start_x: sx,
					start_y: sy,
					transform_start_x: self.view.transform.x,
					transform_start_y: self.view.transform.y,
				};
			}
		}
		Ok(())
	}

	/// Pointer move: drags the grabbed node or pans the view.
	pub fn drag_to(&mut self, sx: f64, sy: f64) -> GraphResult<()> {
		let drag = &mut self.view.drag;
		if let Some(node) = drag.node {
			let (dx, dy) = (sx - drag.start_x, sy - drag.start_y);
			if !drag.moved && dx.abs() + dy.abs() <= DRAG_THRESHOLD {
				return Ok(());
			}
			drag.moved = true;
			let k = self.view.transform.k;
			let target = Coordinates::new(drag.node_start.x + dx / k, drag.node_start.y + dy / k);
			self.graph.set_position(node, target)?;
		} else if self.view.pan.active {
			let pan = &self.view.pan;
			self.view.transform.x = pan.transform_start_x + (sx - pan.start_x);
			self.view.transform.y = pan.transform_start_y + (sy - pan.start_y);
		}
		Ok(())
	}

	/// Pointer up: a press that never moved is a click and toggles the
	/// neighbourhood highlight.
	pub fn release(&mut self) -> GraphResult<()> {
		let drag = std::mem::take(&mut self.view.drag);
		self.view.pan.active = false;
		match drag.node {
			Some(node) if !drag.moved => self.highlight.toggle(&mut self.graph, node),
			Some(node) => {
				debug!("moved {:?}", node);
				Ok(())
			}
			None => Ok(()),
		}
	}

	/// Pointer left the canvas: drops any gesture without clicking.
	pub fn cancel(&mut self) {
		self.view.drag = DragState::default();
		self.view.pan.active = false;
	}

	/// Context-menu gesture: moves the node under the pointer to the sidebar.
	pub fn exclude_at(&mut self, sx: f64, sy: f64) -> GraphResult<bool> {
		let p = self.view.screen_to_graph(sx, sy);
		let Some(node) = node_at(&self.graph, p) else {
			return Ok(false);
		};
		self.graph.exclude(node)?;
		Ok(true)
	}

	/// Runs a control action. Returns the payload JSON for [`ViewAction::Export`].
	pub fn apply(&mut self, action: ViewAction) -> GraphResult<Option<String>> {
		debug!("view action {:?}", action);
		let done = match action {
			ViewAction::Include(node) => self.graph.include(node),
			ViewAction::IncludeAll(list) => self.graph.include_all(list),
			ViewAction::Sort(list, key, order) => self.graph.sort_sidebar(list, key, order),
			ViewAction::Toggle(node) => self.highlight.toggle(&mut self.graph, node),
			ViewAction::ToggleRequired(node) => self.highlight.toggle_required(&mut self.graph, node),
			ViewAction::ToggleProvided(node) => self.highlight.toggle_provided(&mut self.graph, node),
			ViewAction::ClearHighlight => self.highlight.reset(&mut self.graph),
			ViewAction::Relayout => {
				self.view.pending_layout = self.layout.config().relayout_iterations;
				Ok(())
			}
			ViewAction::Search(term) => {
				self.graph.search(&term);
				Ok(())
			}
			ViewAction::Export => return self.export_json().map(Some),
		};
		done.map(|()| None)
	}

	/// Current graph as pretty-printed payload JSON.
	pub fn export_json(&self) -> GraphResult<String> {
		Ok(serde_json::to_string_pretty(&self.graph.to_payload())?)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::graph::GraphPayload;
	use pretty_assertions::assert_eq;
	use serde_json::json;

	/// Two connected vertices at fixed positions plus an unconnected one.
	fn context() -> ViewContext {
		let payload: GraphPayload = serde_json::from_value(json!({
			"vertices": [
				{"id": 1, "name": "app", "position": {"x": 0, "y": 0}},
				{"id": 2, "name": "lib", "position": {"x": 400, "y": 0}},
				{"id": 3, "name": "orphan", "position": {"x": 0, "y": 400}}
			],
			"edges": [{"id": 1, "from": 1, "to": 2}]
		}))
		.unwrap();
		let graph = GraphModel::build(&payload).unwrap();
		let mut ctx = ViewContext::new(graph, None, 1000.0, 1000.0);
		// Identity transform keeps screen and world coordinates equal.
		ctx.view.transform = ViewTransform::default();
		ctx.view.pending_layout = 0;
		ctx
	}

	fn app() -> NodeRef {
		NodeRef::Vertex(VertexIdx(0))
	}

	#[test]
	fn fit_centres_the_canvas() {
		let view = ViewState::fit(1000.0, 500.0, 1000.0);
		assert_eq!(view.transform.k, 0.5);
		assert_eq!(view.transform.x, 250.0);
		assert_eq!(view.transform.y, 0.0);
		let (sx, sy) = view.graph_to_screen(Coordinates::new(500.0, 500.0));
		assert_eq!((sx, sy), (500.0, 250.0));
		assert_eq!(view.screen_to_graph(sx, sy), Coordinates::new(500.0, 500.0));
	}

	#[test]
	fn zoom_keeps_the_pointer_fixed() {
		let mut view = ViewState::fit(1000.0, 1000.0, 1000.0);
		let before = view.screen_to_graph(300.0, 700.0);
		view.zoom_at(300.0, 700.0, -1.0);
		assert!(view.transform.k > 1.0);
		let after = view.screen_to_graph(300.0, 700.0);
		assert!(before.distance(after) < 1e-9);
	}

	#[test]
	fn hit_test_covers_rectangles_of_visible_nodes() {
		let ctx = context();
		assert_eq!(node_at(&ctx.graph, Coordinates::new(10.0, 10.0)), Some(app()));
		assert_eq!(node_at(&ctx.graph, Coordinates::new(10.0, 31.0)), None);
		// The orphan is excluded into the unconnected list.
		assert_eq!(node_at(&ctx.graph, Coordinates::new(10.0, 410.0)), None);
	}

	#[test]
	fn click_toggles_highlight_and_drag_moves() {
		let mut ctx = context();
		ctx.press(10.0, 10.0).unwrap();
		ctx.drag_to(11.0, 11.0).unwrap();
		ctx.release().unwrap();
		assert!(ctx.graph.vertices()[0].node.highlight.highlighted);
		assert_eq!(ctx.highlight.focus(), Some(app()));

		ctx.press(10.0, 10.0).unwrap();
		ctx.drag_to(60.0, 110.0).unwrap();
		ctx.release().unwrap();
		assert_eq!(
			ctx.graph.vertices()[0].node.position,
			Coordinates::new(50.0, 100.0)
		);
		// A drag is not a click.
		assert!(ctx.graph.vertices()[0].node.highlight.highlighted);
	}

	#[test]
	fn background_press_pans() {
		let mut ctx = context();
		ctx.press(900.0, 900.0).unwrap();
		ctx.drag_to(920.0, 880.0).unwrap();
		ctx.release().unwrap();
		assert_eq!(ctx.view.transform.x, 20.0);
		assert_eq!(ctx.view.transform.y, -20.0);
		assert!(!ctx.view.pan.active);
	}

	#[test]
	fn context_menu_excludes_and_routes_to_the_floater() {
		let mut ctx = context();
		assert!(ctx.exclude_at(410.0, 10.0).unwrap());
		assert!(!ctx.exclude_at(900.0, 900.0).unwrap());

		let edge = ctx.graph.edges()[0].clone();
		assert!(edge.hidden);
		assert_eq!(edge_route(&ctx.graph, &ctx.view, &edge), None);

		// Showing the required side of the excluded lib draws to its anchor.
		let lib = NodeRef::Vertex(VertexIdx(1));
		ctx.apply(ViewAction::ToggleRequired(lib)).unwrap();
		let edge = ctx.graph.edges()[0].clone();
		let route = edge_route(&ctx.graph, &ctx.view, &edge).unwrap();
		assert_eq!(route.from, ctx.graph.vertices()[0].node.center());
		// Slots follow vertex order: lib first, then the orphan.
		assert_eq!(route.to, Coordinates::new(FLOATER_X, FLOATER_TOP));
		assert_eq!(
			ctx.view.floater_anchor(1),
			Coordinates::new(FLOATER_X, FLOATER_TOP + FLOATER_SPACING)
		);
		assert_eq!(route.target, None);
	}

	#[test]
	fn arrow_tip_sits_on_the_rectangle_border() {
		let size = Size {
			width: 200.0,
			height: 30.0,
		};
		let tip = rect_boundary_point(Coordinates::new(-400.0, 15.0), Coordinates::new(0.0, 0.0), size);
		assert_eq!(tip, Coordinates::new(0.0, 15.0));
		let above = rect_boundary_point(Coordinates::new(100.0, -45.0), Coordinates::new(0.0, 0.0), size);
		assert_eq!(above, Coordinates::new(100.0, 0.0));
	}

	#[test]
	fn sidebar_actions_reach_the_model() {
		let mut ctx = context();
		assert_eq!(ctx.graph.sidebar_nodes(SidebarList::Unconnected).len(), 1);
		ctx.apply(ViewAction::IncludeAll(SidebarList::Unconnected)).unwrap();
		assert!(ctx.graph.sidebar_nodes(SidebarList::Unconnected).is_empty());

		ctx.apply(ViewAction::Search("LI".into())).unwrap();
		assert!(ctx.graph.vertices()[1].node.found);

		ctx.apply(ViewAction::Relayout).unwrap();
		assert_eq!(ctx.view.pending_layout, 20);
		ctx.tick().unwrap();
		assert_eq!(ctx.view.pending_layout, 19);

		let text = ctx.apply(ViewAction::Export).unwrap().unwrap();
		assert!(text.contains("\"name\": \"orphan\""));
		assert_eq!(ctx.apply(ViewAction::ClearHighlight).unwrap(), None);
	}

	#[test]
	fn clicking_an_excluded_name_highlights_its_neighbourhood() {
		let mut ctx = context();
		let (app, lib) = (NodeRef::Vertex(VertexIdx(0)), NodeRef::Vertex(VertexIdx(1)));
		ctx.graph.exclude(app).unwrap();

		ctx.apply(ViewAction::Toggle(app)).unwrap();
		assert_eq!(ctx.highlight.focus(), Some(app));
		assert!(ctx.graph.state(app).unwrap().highlight.highlighted);
		assert!(ctx.graph.state(lib).unwrap().highlight.provided);
		assert!(!ctx.graph.edges()[0].hidden);

		ctx.apply(ViewAction::Toggle(app)).unwrap();
		assert_eq!(ctx.highlight.focus(), None);
		assert!(ctx.graph.edges()[0].hidden);
	}
}
