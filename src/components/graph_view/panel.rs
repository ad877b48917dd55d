//! Sidebar panel listing excluded and unconnected nodes.
//!
//! The panel never touches the model. It renders [`SidebarEntry`] snapshots and
//! posts [`ViewAction`]s, which the canvas component applies.

use leptos::prelude::*;

use super::state::ViewAction;
use crate::graph::{
	NodeKind, NodeRef, SidebarAdapter, SidebarEntry, SidebarList, SortKey, SortOrder, VertexIdx,
};

/// Bumps a revision counter for every sidebar change the model reports.
///
/// The canvas component re-reads [`SidebarEntry`] snapshots whenever the
/// counter moves.
#[derive(Clone, Copy, Debug)]
pub struct SignalSidebar(pub RwSignal<u32>);

impl SidebarAdapter for SignalSidebar {
	fn add_node(&mut self, _list: SidebarList, _node: NodeRef) {
		notify(self.0);
	}

	fn remove_node(&mut self, _list: SidebarList, _node: NodeRef) {
		notify(self.0);
	}

	fn add_floater(&mut self, _vertex: VertexIdx) {
		notify(self.0);
	}

	fn remove_floater(&mut self, _vertex: VertexIdx) {
		notify(self.0);
	}
}

/// Marks the sidebar snapshot stale.
pub fn notify(revision: RwSignal<u32>) {
	let _ = revision.try_update(|r| *r = r.wrapping_add(1));
}

/// Search box, global controls and both sidebar lists.
#[component]
pub fn SidebarPanel(
	entries: RwSignal<Vec<SidebarEntry>>,
	actions: RwSignal<Option<ViewAction>>,
	exported: RwSignal<Option<String>>,
	#[prop(default = 260.0)] width: f64,
) -> impl IntoView {
	let send = move |action: ViewAction| actions.set(Some(action));

	view! {
		<aside
			class="graph-sidebar"
			style=format!("width: {width}px; flex: none; overflow-y: auto; padding: 8px; box-sizing: border-box;")
		>
			<input
				type="search"
				placeholder="Search modules"
				style="width: 100%;"
				on:input=move |ev| send(ViewAction::Search(event_target_value(&ev)))
			/>
			<div class="sidebar-controls">
				<button on:click=move |_| send(ViewAction::Relayout)>"Layout"</button>
				<button on:click=move |_| send(ViewAction::ClearHighlight)>"Clear"</button>
				<button on:click=move |_| send(ViewAction::Export)>"Export"</button>
			</div>
			<SidebarSection title="Excluded" list=SidebarList::Excluded entries=entries actions=actions />
			<SidebarSection title="Unconnected" list=SidebarList::Unconnected entries=entries actions=actions />
			{move || {
				exported
					.get()
					.map(|text| {
						view! {
							<div class="sidebar-export">
								<textarea readonly rows="12" style="width: 100%;" prop:value=text />
								<button on:click=move |_| exported.set(None)>"Close"</button>
							</div>
						}
					})
			}}
		</aside>
	}
}

#[component]
fn SidebarSection(
	title: &'static str,
	list: SidebarList,
	entries: RwSignal<Vec<SidebarEntry>>,
	actions: RwSignal<Option<ViewAction>>,
) -> impl IntoView {
	let rows = move || {
		entries
			.get()
			.into_iter()
			.filter(|e| e.list == list)
			.collect::<Vec<_>>()
	};
	let send = move |action: ViewAction| actions.set(Some(action));

	view! {
		<section class="sidebar-section">
			<h2>{title} " (" {move || rows().len()} ")"</h2>
			<div class="sidebar-sort">
				<button on:click=move |_| send(ViewAction::Sort(list, SortKey::Name, SortOrder::Ascending))>
					"A-Z"
				</button>
				<button on:click=move |_| send(ViewAction::Sort(list, SortKey::Count, SortOrder::Descending))>
					"Size"
				</button>
				<button on:click=move |_| send(ViewAction::IncludeAll(list))>"Include all"</button>
			</div>
			<ul>
				<For
					each=rows
					key=|e| (e.key.clone(), e.highlighted)
					children=move |entry| view! { <SidebarRow entry=entry actions=actions /> }
				/>
			</ul>
		</section>
	}
}

#[component]
fn SidebarRow(entry: SidebarEntry, actions: RwSignal<Option<ViewAction>>) -> impl IntoView {
	let node = entry.node;
	let send = move |action: ViewAction| actions.set(Some(action));
	let detail = match entry.kind {
		NodeKind::Group => format!("{} members", entry.count),
		NodeKind::Vertex => format!(
			"{} imports, {} exports",
			entry.required_count, entry.provided_count
		),
	};
	let class = if entry.highlighted {
		"sidebar-entry highlighted"
	} else {
		"sidebar-entry"
	};

	view! {
		<li class=class title=entry.key>
			<button
				class="sidebar-name"
				title="Highlight neighbourhood"
				on:click=move |_| send(ViewAction::Toggle(node))
			>
				{entry.name}
			</button>
			<small class="sidebar-detail">{detail}</small>
			<button title="Show required" on:click=move |_| send(ViewAction::ToggleRequired(node))>
				"in"
			</button>
			<button title="Show provided" on:click=move |_| send(ViewAction::ToggleProvided(node))>
				"out"
			</button>
			<button on:click=move |_| send(ViewAction::Include(node))>"Include"</button>
		</li>
	}
}
