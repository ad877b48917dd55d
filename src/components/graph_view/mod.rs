//! Dependency graph viewport component.
//!
//! Renders a [`GraphModel`](crate::graph::GraphModel) on an HTML canvas next to
//! a sidebar of excluded nodes:
//! - Click a node to highlight its required and provided neighbours
//! - Drag nodes to reposition, drag the background to pan, scroll to zoom
//! - Right-click a node to move it into the sidebar
//! - Layout steps are animated one per frame
//!
//! # Example
//!
//! ```ignore
//! use dep_explorer::{DependencyGraph, GraphPayload};
//!
//! let payload = GraphPayload::from_json(text)?;
//! view! { <DependencyGraph payload=payload fullscreen=true /> }
//! ```

mod component;
mod panel;
mod render;
pub mod scale;
pub mod state;
pub mod theme;

pub use component::DependencyGraph;
pub use panel::{SidebarPanel, SignalSidebar};
pub use state::{ViewAction, ViewContext};
pub use theme::Theme;
