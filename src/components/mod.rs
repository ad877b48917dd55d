//! Browser-side view components.

pub mod graph_view;
