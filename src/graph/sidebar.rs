//! Sidebar bookkeeping for excluded nodes.
//!
//! The model records which list holds each excluded node and reports every
//! transition to a [`SidebarAdapter`]. The adapter is the view's hook; the
//! default implementation ignores everything.

use log::debug;

use super::error::GraphResult;
use super::model::GraphModel;
use super::node::{NodeKind, NodeRef, VertexIdx};

/// The two sidebar lists an excluded node can be filed into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SidebarList {
	/// Nodes the user (or the payload) moved out of the viewport.
	Excluded,
	/// Vertices with no edges at all, excluded automatically on load.
	Unconnected,
}

/// Receives sidebar transitions from the model.
///
/// Every method has a no-op default so adapters only implement what they draw.
pub trait SidebarAdapter {
	fn add_node(&mut self, _list: SidebarList, _node: NodeRef) {}
	fn remove_node(&mut self, _list: SidebarList, _node: NodeRef) {}
	fn add_floater(&mut self, _vertex: VertexIdx) {}
	fn remove_floater(&mut self, _vertex: VertexIdx) {}
}

/// Adapter that ignores all notifications.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSidebar;

impl SidebarAdapter for NoopSidebar {}

/// Ordered contents of both sidebar lists.
#[derive(Clone, Debug, Default)]
pub struct SidebarLists {
	excluded: Vec<NodeRef>,
	unconnected: Vec<NodeRef>,
}

impl SidebarLists {
	pub fn get(&self, list: SidebarList) -> &[NodeRef] {
		match list {
			SidebarList::Excluded => &self.excluded,
			SidebarList::Unconnected => &self.unconnected,
		}
	}

	fn get_mut(&mut self, list: SidebarList) -> &mut Vec<NodeRef> {
		match list {
			SidebarList::Excluded => &mut self.excluded,
			SidebarList::Unconnected => &mut self.unconnected,
		}
	}

	pub(super) fn push(&mut self, list: SidebarList, node: NodeRef) {
		let nodes = self.get_mut(list);
		if !nodes.contains(&node) {
			nodes.push(node);
		}
	}

	pub(super) fn remove(&mut self, list: SidebarList, node: NodeRef) {
		self.get_mut(list).retain(|n| *n != node);
	}
}

/// Sort criterion for a sidebar list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortKey {
	Name,
	/// Member count for groups, 1 for vertices.
	Count,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortOrder {
	Ascending,
	Descending,
}

/// Display snapshot of one sidebar row.
#[derive(Clone, Debug, PartialEq)]
pub struct SidebarEntry {
	pub list: SidebarList,
	pub node: NodeRef,
	pub key: String,
	pub name: String,
	pub kind: NodeKind,
	pub count: usize,
	pub highlighted: bool,
	/// Number of imported/exported packages; zero for groups.
	pub required_count: usize,
	pub provided_count: usize,
}

impl GraphModel {
	/// Nodes currently filed in `list`, in display order.
	pub fn sidebar_nodes(&self, list: SidebarList) -> &[NodeRef] {
		self.sidebar_lists.get(list)
	}

	/// Includes every node of `list` back into the viewport.
	pub fn include_all(&mut self, list: SidebarList) -> GraphResult<()> {
		let nodes = self.sidebar_lists.get(list).to_vec();
		debug!("including {} nodes from {:?}", nodes.len(), list);
		for node in nodes {
			self.include(node)?;
		}
		Ok(())
	}

	/// Reorders `list` by name or member count.
	pub fn sort_sidebar(
		&mut self,
		list: SidebarList,
		key: SortKey,
		order: SortOrder,
	) -> GraphResult<()> {
		let mut nodes = self.sidebar_lists.get(list).to_vec();
		let mut keyed = Vec::with_capacity(nodes.len());
		for node in nodes.drain(..) {
			let name = self.node(node)?.name().to_lowercase();
			keyed.push((node, name, self.member_count(node)));
		}

		keyed.sort_by(|a, b| {
			let ord = match key {
				SortKey::Name => a.1.cmp(&b.1),
				SortKey::Count => a.2.cmp(&b.2),
			};
			match order {
				SortOrder::Ascending => ord,
				SortOrder::Descending => ord.reverse(),
			}
		});

		*self.sidebar_lists.get_mut(list) = keyed.into_iter().map(|(n, _, _)| n).collect();
		Ok(())
	}

	/// Rows of both lists, excluded list first.
	pub fn sidebar_entries(&self) -> Vec<SidebarEntry> {
		[SidebarList::Excluded, SidebarList::Unconnected]
			.into_iter()
			.flat_map(|list| {
				self.sidebar_lists
					.get(list)
					.iter()
					.filter_map(move |&node| self.sidebar_entry(list, node))
			})
			.collect()
	}

	fn sidebar_entry(&self, list: SidebarList, node: NodeRef) -> Option<SidebarEntry> {
		let n = self.node(node).ok()?;
		let (required_count, provided_count) = match node {
			NodeRef::Vertex(v) => self
				.vertex(v)
				.map(|v| (v.imported_packages.len(), v.exported_packages.len()))
				.unwrap_or_default(),
			NodeRef::Group(_) => (0, 0),
		};
		Some(SidebarEntry {
			list,
			node,
			key: n.key(),
			name: n.name().to_string(),
			kind: n.kind(),
			count: self.member_count(node),
			highlighted: n.highlight().highlighted,
			required_count,
			provided_count,
		})
	}

	fn member_count(&self, node: NodeRef) -> usize {
		match node {
			NodeRef::Vertex(_) => 1,
			NodeRef::Group(g) => self.group(g).map(|g| g.vertices.len()).unwrap_or(0),
		}
	}
}
