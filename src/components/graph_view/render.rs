//! Canvas rendering for the dependency viewport.
//!
//! Drawing runs in passes for correct z-ordering:
//! 1. Background (screen space)
//! 2. Edges, dimmed ones first (world space)
//! 3. Groups, then top-level vertices (world space)
//! 4. Floater anchors along the left edge (screen space)

use std::f64::consts::PI;

use web_sys::CanvasRenderingContext2d;

use super::scale::{ScaleConfig, ScaledValues};
use super::state::{ViewContext, edge_route, floater_slots, rect_boundary_point};
use super::theme::{Color, Theme};
use crate::graph::{Edge, GraphModel, NodeRef, NodeState};

/// Renders the complete graph to the canvas.
pub fn render(scene: &ViewContext, ctx: &CanvasRenderingContext2d, config: &ScaleConfig, theme: &Theme) {
	let view = &scene.view;
	let graph = &scene.graph;
	let scale = ScaledValues::new(config, view.transform.k);

	ctx.set_fill_style_str(&theme.background.to_css());
	ctx.fill_rect(0.0, 0.0, view.width, view.height);

	ctx.save();
	let _ = ctx.translate(view.transform.x, view.transform.y);
	let _ = ctx.scale(view.transform.k, view.transform.k);

	for dimmed in [true, false] {
		for edge in graph.edges().iter().filter(|e| e.dimmed == dimmed) {
			draw_edge(scene, ctx, &scale, theme, edge);
		}
	}

	let visible = graph.visible_nodes();
	let (groups, vertices): (Vec<NodeRef>, Vec<NodeRef>) = visible
		.into_iter()
		.partition(|n| matches!(n, NodeRef::Group(_)));
	for node in groups.into_iter().chain(vertices) {
		draw_node(graph, ctx, &scale, theme, node);
	}

	ctx.restore();

	draw_floaters(scene, ctx, theme);
}

fn edge_color(edge: &Edge, theme: &Theme) -> Color {
	let color = if edge.highlighted {
		theme.highlight.focus
	} else if edge.highlighted_required {
		theme.highlight.required
	} else if edge.highlighted_provided {
		theme.highlight.provided
	} else {
		theme.edge
	};
	if edge.dimmed {
		color.with_alpha(color.a * theme.highlight.dim_alpha)
	} else {
		color
	}
}

fn draw_edge(
	scene: &ViewContext,
	ctx: &CanvasRenderingContext2d,
	scale: &ScaledValues,
	theme: &Theme,
	edge: &Edge,
) {
	let Some(route) = edge_route(&scene.graph, &scene.view, edge) else {
		return;
	};
	let tip = match route.target {
		Some((position, size)) => rect_boundary_point(route.from, position, size),
		None => route.to,
	};
	let (dx, dy) = (tip.x - route.from.x, tip.y - route.from.y);
	let dist = (dx * dx + dy * dy).sqrt();
	if dist < 0.001 {
		return;
	}
	let (ux, uy) = (dx / dist, dy / dist);
	let color = edge_color(edge, theme).to_css();

	ctx.set_stroke_style_str(&color);
	ctx.set_line_width(if edge.highlighted_required || edge.highlighted_provided {
		scale.edge_width * 2.0
	} else {
		scale.edge_width
	});
	ctx.begin_path();
	ctx.move_to(route.from.x, route.from.y);
	ctx.line_to(tip.x - ux * scale.arrow_size, tip.y - uy * scale.arrow_size);
	ctx.stroke();

	let (back_x, back_y) = (tip.x - ux * scale.arrow_size, tip.y - uy * scale.arrow_size);
	let (px, py) = (-uy * scale.arrow_size * 0.5, ux * scale.arrow_size * 0.5);
	ctx.set_fill_style_str(&color);
	ctx.begin_path();
	ctx.move_to(tip.x, tip.y);
	ctx.line_to(back_x + px, back_y + py);
	ctx.line_to(back_x - px, back_y - py);
	ctx.close_path();
	ctx.fill();
}

/// Border colour for a node's highlight flags, if any applies.
fn highlight_border(state: &NodeState, theme: &Theme) -> Option<Color> {
	let flags = &state.highlight;
	if flags.highlighted {
		Some(theme.highlight.focus)
	} else if flags.required {
		Some(theme.highlight.required)
	} else if flags.provided {
		Some(theme.highlight.provided)
	} else {
		None
	}
}

fn draw_node(
	graph: &GraphModel,
	ctx: &CanvasRenderingContext2d,
	scale: &ScaledValues,
	theme: &Theme,
	node: NodeRef,
) {
	let Ok(state) = graph.state(node) else {
		return;
	};
	let fill = match node {
		NodeRef::Vertex(v) => theme
			.palette
			.get(graph.vertex(v).ok().and_then(|v| v.archetype)),
		NodeRef::Group(_) => theme.group_fill,
	};
	let (x, y, w, h) = (
		state.position.x,
		state.position.y,
		state.size.width,
		state.size.height,
	);

	ctx.set_global_alpha(if state.dimmed {
		theme.highlight.dim_alpha
	} else {
		1.0
	});

	ctx.set_fill_style_str(&fill.to_css());
	ctx.fill_rect(x, y, w, h);

	let (border, width) = match highlight_border(state, theme) {
		Some(color) => (color, scale.border_width * 3.0),
		None => (theme.border, scale.border_width),
	};
	ctx.set_stroke_style_str(&border.to_css());
	ctx.set_line_width(width);
	ctx.stroke_rect(x, y, w, h);

	if state.found {
		let pad = scale.border_width * 4.0;
		ctx.set_stroke_style_str(&theme.highlight.found.to_css());
		ctx.set_line_width(scale.border_width * 2.0);
		ctx.stroke_rect(x - pad, y - pad, w + 2.0 * pad, h + 2.0 * pad);
	}

	ctx.set_fill_style_str(&theme.label.to_css());
	ctx.set_font(&scale.label_font);
	let _ = ctx.fill_text(&state.name, x + 6.0, y + h / 2.0 + 4.0);

	ctx.set_global_alpha(1.0);
}

/// Small markers for excluded top-level vertices, in screen space.
fn draw_floaters(scene: &ViewContext, ctx: &CanvasRenderingContext2d, theme: &Theme) {
	let graph = &scene.graph;
	let view = &scene.view;
	ctx.set_fill_style_str(&theme.floater.to_css());
	for (slot, vertex) in floater_slots(graph).into_iter().enumerate() {
		let (sx, sy) = view.graph_to_screen(view.floater_anchor(slot));
		ctx.begin_path();
		let _ = ctx.arc(sx, sy, 4.0, 0.0, 2.0 * PI);
		ctx.fill();
		if let Ok(v) = graph.vertex(vertex) {
			ctx.set_font("10px sans-serif");
			let _ = ctx.fill_text(&v.node.name, sx + 8.0, sy + 3.0);
		}
	}
}
