//! Leptos component wrapping the dependency viewport.
//!
//! The component builds the model from the payload signal, creates an HTML
//! canvas and wires mouse/wheel events to [`ViewContext`] gestures. An
//! animation loop runs via `requestAnimationFrame`, advancing any queued layout
//! by one step and redrawing each frame. The sidebar panel talks back through
//! an action signal.

use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use log::{info, warn};
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, WheelEvent, Window};

use super::panel::{SidebarPanel, SignalSidebar, notify};
use super::render;
use super::scale::ScaleConfig;
use super::state::{ViewAction, ViewContext};
use super::theme::Theme;
use crate::graph::{GraphModel, GraphPayload, LayoutConfig, SidebarEntry};

const SIDEBAR_WIDTH: f64 = 260.0;

fn window_size() -> Option<(f64, f64)> {
	let window: Window = web_sys::window()?;
	Some((
		window.inner_width().ok()?.as_f64()?,
		window.inner_height().ok()?.as_f64()?,
	))
}

fn measure(
	canvas: &HtmlCanvasElement,
	fullscreen: bool,
	width: Option<f64>,
	height: Option<f64>,
) -> (f64, f64) {
	if fullscreen {
		let (w, h) = window_size().unwrap_or((800.0 + SIDEBAR_WIDTH, 600.0));
		return ((w - SIDEBAR_WIDTH).max(200.0), h);
	}
	let parent = canvas.parent_element();
	(
		width.unwrap_or_else(|| {
			parent
				.as_ref()
				.map(|p| p.client_width() as f64 - SIDEBAR_WIDTH)
				.unwrap_or(800.0)
		}),
		height.unwrap_or_else(|| {
			parent
				.as_ref()
				.map(|p| p.client_height() as f64)
				.unwrap_or(600.0)
		}),
	)
}

/// Pointer position relative to the canvas, if it is mounted.
fn canvas_point(canvas_ref: NodeRef<leptos::html::Canvas>, ev: &MouseEvent) -> Option<(f64, f64)> {
	let canvas: HtmlCanvasElement = canvas_ref.get()?.into();
	let rect = canvas.get_bounding_client_rect();
	Some((
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	))
}

/// Renders an explorable dependency graph next to its sidebar.
///
/// The model is built once from `payload` when the canvas mounts; unresolved
/// references in the payload are logged and skipped. `layout` overrides the
/// default layout constants. Set `fullscreen = true` to fill the viewport and
/// follow window resizes; explicit `width`/`height` override automatic sizing.
#[component]
pub fn DependencyGraph(
	#[prop(into)] payload: Signal<GraphPayload>,
	#[prop(default = None)] layout: Option<LayoutConfig>,
	#[prop(optional)] theme: Option<Theme>,
	#[prop(default = false)] fullscreen: bool,
	#[prop(default = None)] width: Option<f64>,
	#[prop(default = None)] height: Option<f64>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let context: Rc<RefCell<Option<ViewContext>>> = Rc::new(RefCell::new(None));
	let animate: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let resize_cb: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let (context_init, animate_init, resize_cb_init) =
		(context.clone(), animate.clone(), resize_cb.clone());

	let revision = RwSignal::new(0u32);
	let entries = RwSignal::new(Vec::<SidebarEntry>::new());
	let actions = RwSignal::new(None::<ViewAction>);
	let exported = RwSignal::new(None::<String>);
	let theme = theme.unwrap_or_default();

	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		if animate_init.borrow().is_some() {
			return;
		}
		let canvas: HtmlCanvasElement = canvas.into();
		let Some(window) = web_sys::window() else {
			return;
		};

		let (w, h) = measure(&canvas, fullscreen, width, height);
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);

		let Some(ctx) = canvas
			.get_context("2d")
			.ok()
			.flatten()
			.and_then(|c| c.dyn_into::<CanvasRenderingContext2d>().ok())
		else {
			warn!("dep-explorer: canvas has no 2d context");
			return;
		};

		let mut graph = match GraphModel::build(&payload.get()) {
			Ok(graph) => graph,
			Err(e) => {
				warn!("dep-explorer: cannot build graph: {}", e);
				return;
			}
		};
		graph.set_sidebar(Box::new(SignalSidebar(revision)));
		info!(
			"dep-explorer: viewport {}x{} over a {} canvas",
			w,
			h,
			graph.canvas_size()
		);
		*context_init.borrow_mut() = Some(ViewContext::new(graph, layout.clone(), w, h));
		notify(revision);

		if fullscreen {
			let (context_resize, canvas_resize) = (context_init.clone(), canvas.clone());
			*resize_cb_init.borrow_mut() = Some(Closure::new(move || {
				let (nw, nh) = measure(&canvas_resize, true, None, None);
				canvas_resize.set_width(nw as u32);
				canvas_resize.set_height(nh as u32);
				if let Some(ref mut c) = *context_resize.borrow_mut() {
					c.view.resize(nw, nh);
				}
			}));
			if let Some(ref cb) = *resize_cb_init.borrow() {
				let _ =
					window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
			}
		}

		let (context_anim, animate_inner) = (context_init.clone(), animate_init.clone());
		let (scale, theme) = (ScaleConfig::default(), theme.clone());
		*animate_init.borrow_mut() = Some(Closure::new(move || {
			if let Some(ref mut c) = *context_anim.borrow_mut() {
				if let Err(e) = c.tick() {
					warn!("dep-explorer: layout stopped: {}", e);
				}
				render::render(c, &ctx, &scale, &theme);
			}
			if let (Some(cb), Some(win)) = (&*animate_inner.borrow(), web_sys::window()) {
				let _ = win.request_animation_frame(cb.as_ref().unchecked_ref());
			}
		}));
		if let Some(ref cb) = *animate_init.borrow() {
			let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
		}
	});

	let context_sidebar = context.clone();
	Effect::new(move |_| {
		revision.track();
		if let Ok(guard) = context_sidebar.try_borrow() {
			if let Some(c) = guard.as_ref() {
				entries.set(c.graph.sidebar_entries());
			}
		}
	});

	let context_action = context.clone();
	Effect::new(move |_| {
		let Some(action) = actions.get() else {
			return;
		};
		let result = match context_action.try_borrow_mut() {
			Ok(mut guard) => match guard.as_mut() {
				Some(c) => c.apply(action),
				None => return,
			},
			Err(_) => return,
		};
		match result {
			Ok(Some(text)) => exported.set(Some(text)),
			Ok(None) => {}
			Err(e) => warn!("dep-explorer: action failed: {}", e),
		}
		notify(revision);
		actions.set(None);
	});

	let context_md = context.clone();
	let on_mousedown = move |ev: MouseEvent| {
		let Some((x, y)) = canvas_point(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut c) = *context_md.borrow_mut() {
			if let Err(e) = c.press(x, y) {
				warn!("dep-explorer: {}", e);
			}
		}
	};

	let context_mm = context.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let Some((x, y)) = canvas_point(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut c) = *context_mm.borrow_mut() {
			if let Err(e) = c.drag_to(x, y) {
				warn!("dep-explorer: {}", e);
			}
		}
	};

	let context_mu = context.clone();
	let on_mouseup = move |_: MouseEvent| {
		if let Some(ref mut c) = *context_mu.borrow_mut() {
			if let Err(e) = c.release() {
				warn!("dep-explorer: {}", e);
			}
		}
		notify(revision);
	};

	let context_ml = context.clone();
	let on_mouseleave = move |_: MouseEvent| {
		if let Some(ref mut c) = *context_ml.borrow_mut() {
			c.cancel();
		}
	};

	let context_cm = context.clone();

	let context_wh = context.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some((x, y)) = canvas_point(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut c) = *context_wh.borrow_mut() {
			c.view.zoom_at(x, y, ev.delta_y());
		}
	};

	view! {
		<div class="dependency-graph" style="display: flex; width: 100%; height: 100%;">
			<SidebarPanel entries=entries actions=actions exported=exported width=SIDEBAR_WIDTH />
			<canvas
				node_ref=canvas_ref
				class="dependency-graph-canvas"
				on:mousedown=on_mousedown
				on:mousemove=on_mousemove
				on:mouseup=on_mouseup
				on:mouseleave=on_mouseleave
				on:contextmenu=move |ev| {
					ev.prevent_default();
					let Some((x, y)) = canvas_point(canvas_ref, &ev) else {
						return;
					};
					if let Some(ref mut c) = *context_cm.borrow_mut() {
						if let Err(e) = c.exclude_at(x, y) {
							warn!("dep-explorer: {}", e);
						}
					}
				}
				on:wheel=on_wheel
				style="display: block; cursor: grab;"
			/>
		</div>
	}
}
