//! Neighbourhood highlighting.
//!
//! Selecting a node runs a global pass: everything else is dimmed and its
//! in-edge sources ("required") and out-edge targets ("provided") are brought
//! back up together with the connecting edges, even when those edges would
//! otherwise be hidden by an exclusion. Deselecting runs the same pass without
//! re-highlighting.
//!
//! The directional toggles used from sidebar entries touch only one neighbour
//! set and leave the rest of the graph alone.

use log::debug;

use super::error::GraphResult;
use super::model::GraphModel;
use super::node::{EdgeIdx, NodeRef};

/// Drives highlight flags on a [`GraphModel`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HighlightEngine {
	focus: Option<NodeRef>,
}

impl HighlightEngine {
	pub fn new() -> Self {
		Self::default()
	}

	/// Engine that already considers `focus` selected, e.g. the payload's
	/// pre-selected node.
	pub fn with_focus(focus: Option<NodeRef>) -> Self {
		Self { focus }
	}

	/// Node whose neighbourhood is currently shown by the global pass.
	pub fn focus(&self) -> Option<NodeRef> {
		self.focus
	}

	/// Click on a node: flips its highlight and shows or clears its
	/// neighbourhood.
	pub fn toggle(&mut self, graph: &mut GraphModel, node: NodeRef) -> GraphResult<()> {
		let on = !graph.state(node)?.highlight.highlighted;
		self.set_highlighted_with_neighbours(graph, node, on)
	}

	/// Explicitly turns the neighbourhood highlight of `node` on or off.
	pub fn set_highlighted_with_neighbours(
		&mut self,
		graph: &mut GraphModel,
		node: NodeRef,
		on: bool,
	) -> GraphResult<()> {
		let highlight = &mut graph.state_mut(node)?.highlight;
		highlight.highlighted = on;
		highlight.required_neighbours = on;
		highlight.provided_neighbours = on;

		self.highlight_neighbours(graph, node)
	}

	/// Returns every node and edge to the neutral state.
	pub fn reset(&mut self, graph: &mut GraphModel) -> GraphResult<()> {
		self.focus = None;
		let nodes: Vec<NodeRef> = graph.nodes().collect();
		for n in nodes {
			clear_node(graph, n, false)?;
		}
		reset_edges(graph, false)
	}

	fn highlight_neighbours(&mut self, graph: &mut GraphModel, node: NodeRef) -> GraphResult<()> {
		graph.state_mut(node)?.dimmed = false;
		graph.set_highlighted_required(node, false)?;
		graph.set_highlighted_provided(node, false)?;

		let on = graph.state(node)?.highlight.highlighted;
		if !on {
			debug!("clearing highlight of {:?}", node);
			return self.reset(graph);
		}
		debug!("highlighting neighbourhood of {:?}", node);
		self.focus = Some(node);

		let others: Vec<NodeRef> = graph.nodes().filter(|n| *n != node).collect();
		for n in others {
			clear_node(graph, n, true)?;
		}
		reset_edges(graph, true)?;

		let (in_edges, out_edges) = {
			let state = graph.state(node)?;
			(state.in_edges.clone(), state.out_edges.clone())
		};

		for idx in in_edges {
			let edge = graph.edge_mut(idx)?;
			edge.hidden = false;
			edge.dimmed = false;
			edge.highlighted_required = true;
			if let Some(from) = edge.from {
				graph.state_mut(NodeRef::Vertex(from))?.dimmed = false;
				let source = graph.attachment(from);
				graph.state_mut(source)?.dimmed = false;
				graph.set_highlighted_required(NodeRef::Vertex(from), true)?;
			}
		}

		for idx in out_edges {
			let edge = graph.edge_mut(idx)?;
			edge.hidden = false;
			edge.dimmed = false;
			edge.highlighted_provided = true;
			if let Some(to) = edge.to {
				graph.state_mut(NodeRef::Vertex(to))?.dimmed = false;
				let target = graph.attachment(to);
				graph.state_mut(target)?.dimmed = false;
				graph.set_highlighted_provided(NodeRef::Vertex(to), true)?;
			}
		}
		Ok(())
	}

	/// Sidebar "required" control: flips the highlight and shows or hides only
	/// the in-edges and their sources.
	pub fn toggle_required(&mut self, graph: &mut GraphModel, node: NodeRef) -> GraphResult<()> {
		let highlight = &mut graph.state_mut(node)?.highlight;
		highlight.highlighted = !highlight.highlighted;
		highlight.required_neighbours = highlight.highlighted;
		highlight.provided_neighbours = false;
		let on = highlight.highlighted;
		show_required(graph, node, on)
	}

	/// Sidebar "provided" control: flips the highlight and shows or hides only
	/// the out-edges whose target is still in the viewport.
	pub fn toggle_provided(&mut self, graph: &mut GraphModel, node: NodeRef) -> GraphResult<()> {
		let highlight = &mut graph.state_mut(node)?.highlight;
		highlight.highlighted = !highlight.highlighted;
		highlight.required_neighbours = false;
		highlight.provided_neighbours = highlight.highlighted;
		let on = highlight.highlighted;
		show_provided(graph, node, on)
	}

	/// Highlights both neighbour sets of a sidebar node without the global
	/// dimming pass. Used when restoring a saved sidebar.
	pub fn highlight_sidebar_node(&mut self, graph: &mut GraphModel, node: NodeRef) -> GraphResult<()> {
		let highlight = &mut graph.state_mut(node)?.highlight;
		highlight.highlighted = true;
		highlight.required_neighbours = true;
		highlight.provided_neighbours = true;
		show_required(graph, node, true)?;
		show_provided(graph, node, true)
	}

	/// Marks a single edge and both of its ends as highlighted.
	pub fn highlight_edge(&mut self, graph: &mut GraphModel, idx: EdgeIdx) -> GraphResult<()> {
		let edge = graph.edge_mut(idx)?;
		edge.highlighted = true;
		let (from, to) = (edge.from, edge.to);
		for end in [from, to].into_iter().flatten() {
			graph.state_mut(NodeRef::Vertex(end))?.highlight.highlighted = true;
		}
		Ok(())
	}
}

/// Shows or hides the in-edges of `node` and marks their sources.
fn show_required(graph: &mut GraphModel, node: NodeRef, on: bool) -> GraphResult<()> {
	let in_edges = graph.state(node)?.in_edges.clone();
	for idx in in_edges {
		let edge = graph.edge_mut(idx)?;
		edge.hidden = !on;
		edge.highlighted_required = on;
		if let Some(from) = edge.from {
			graph.set_highlighted_required(NodeRef::Vertex(from), on)?;
		}
	}
	Ok(())
}

/// Shows or hides the out-edges of `node` whose target is in the viewport.
fn show_provided(graph: &mut GraphModel, node: NodeRef, on: bool) -> GraphResult<()> {
	let out_edges = graph.state(node)?.out_edges.clone();
	for idx in out_edges {
		let Some(to) = graph.edge(idx)?.to else {
			continue;
		};
		if graph.endpoint_excluded(to) {
			continue;
		}
		let edge = graph.edge_mut(idx)?;
		edge.hidden = !on;
		edge.highlighted_provided = on;
		graph.set_highlighted_provided(NodeRef::Vertex(to), on)?;
	}
	Ok(())
}

/// Clears every highlight flag of `node` and sets its dim state.
fn clear_node(graph: &mut GraphModel, node: NodeRef, dimmed: bool) -> GraphResult<()> {
	let state = graph.state_mut(node)?;
	state.dimmed = dimmed;
	state.highlight = Default::default();
	Ok(())
}

/// Clears edge highlights, sets their dim state and recomputes `hidden`.
fn reset_edges(graph: &mut GraphModel, dimmed: bool) -> GraphResult<()> {
	for i in 0..graph.edges().len() {
		let idx = EdgeIdx(i);
		graph.refresh_edge(idx)?;
		let edge = graph.edge_mut(idx)?;
		edge.dimmed = dimmed;
		edge.clear_highlight();
	}
	Ok(())
}
