//! dep-explorer: interactive explorer for component dependency graphs.
//!
//! The [`graph`] module holds the model, highlight and layout engines and has
//! no browser dependencies. [`components`] provides the WASM canvas viewport
//! that renders a model and forwards gestures back to it.

use leptos::prelude::*;
use leptos_meta::*;
use log::{Level, info, warn};
use wasm_bindgen::JsCast;
use web_sys::{HtmlScriptElement, Window};

// Needed for its `js` feature so `rand` can seed itself in the browser.
use getrandom as _;

pub mod components;
pub mod graph;

pub use components::graph_view::{DependencyGraph, Theme};
pub use graph::{GraphError, GraphModel, GraphPayload, GraphResult, LayoutConfig};

/// Initialize logging and panic hooks for the WASM target.
pub fn init_logging() {
	let _ = console_log::init_with_level(Level::Debug);
	console_error_panic_hook::set_once();
	info!("dep-explorer: logging initialized");
}

/// Text content of the `<script>` element with the given id.
fn script_text(id: &str) -> Option<String> {
	let window: Window = web_sys::window()?;
	let document = window.document()?;
	let element = document.get_element_by_id(id)?;
	let script: HtmlScriptElement = element.dyn_into().ok()?;
	script.text().ok()
}

/// Load the graph payload from a script element with id="graph-data".
fn load_graph_data() -> Option<GraphPayload> {
	let json_text = script_text("graph-data")?;

	match GraphPayload::from_json(&json_text) {
		Ok(data) => {
			info!(
				"dep-explorer: payload has {} vertices, {} edges, {} groups",
				data.vertices.as_ref().map_or(0, Vec::len),
				data.edges.as_ref().map_or(0, Vec::len),
				data.groups.len()
			);
			Some(data)
		}
		Err(e) => {
			warn!("dep-explorer: failed to parse graph data: {}", e);
			None
		}
	}
}

/// Optional layout overrides from a script element with id="layout-config".
fn load_layout_config() -> Option<LayoutConfig> {
	let json_text = script_text("layout-config")?;
	serde_json::from_str(&json_text)
		.inspect_err(|e| warn!("dep-explorer: ignoring layout config: {}", e))
		.ok()
}

fn preferred_theme() -> Theme {
	let light = web_sys::window()
		.and_then(|w| w.match_media("(prefers-color-scheme: light)").ok().flatten())
		.is_some_and(|m| m.matches());
	if light { Theme::light() } else { Theme::dark() }
}

/// Main application component.
/// Loads the payload from the DOM and renders the explorer.
#[component]
pub fn App() -> impl IntoView {
	provide_meta_context();

	let payload = load_graph_data().unwrap_or_else(|| GraphPayload {
		vertices: Some(Vec::new()),
		edges: Some(Vec::new()),
		..GraphPayload::default()
	});
	let payload_signal = Signal::derive(move || payload.clone());
	let theme = preferred_theme();
	let theme_name = theme.name;

	view! {
		<Html attr:lang="en" attr:dir="ltr" attr:data-theme=theme_name />
		<Title text="Dependency Explorer" />
		<Meta charset="UTF-8" />
		<Meta name="viewport" content="width=device-width, initial-scale=1.0" />

		<div class="fullscreen-graph">
			<DependencyGraph
				payload=payload_signal
				layout=load_layout_config()
				theme=theme
				fullscreen=true
			/>
			<div class="graph-overlay">
				<h1>"Dependencies"</h1>
				<p class="subtitle">
					"Click a module to trace its dependencies. Right-click to move it to the sidebar. Scroll to zoom."
				</p>
			</div>
		</div>
	}
}
