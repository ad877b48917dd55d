//! Zoom-dependent sizes for strokes, arrows and labels.
//!
//! Node rectangles live in world space and scale with the view; the values
//! here decide how the decorations around them react to the zoom level `k`.

/// Defines how a visual property scales with zoom level.
#[derive(Clone, Debug, PartialEq)]
pub enum ScaleBehavior {
	/// Constant screen-space size (pixels). Unaffected by zoom.
	Screen,
	/// World-space scaling, clamped to min/max screen-space bounds.
	Clamped { min_screen: f64, max_screen: f64 },
}

impl ScaleBehavior {
	/// World-space value for `base` at zoom `k`.
	pub fn apply(&self, base: f64, k: f64) -> f64 {
		match self {
			ScaleBehavior::Screen => base / k,
			ScaleBehavior::Clamped {
				min_screen,
				max_screen,
			} => base.clamp(min_screen / k, max_screen / k),
		}
	}
}

/// Base sizes and their zoom behaviour.
#[derive(Clone, Debug)]
pub struct ScaleConfig {
	pub edge_width: f64,
	pub edge_behavior: ScaleBehavior,
	pub border_width: f64,
	pub border_behavior: ScaleBehavior,
	pub arrow_size: f64,
	pub arrow_behavior: ScaleBehavior,
	/// Label font size in screen pixels.
	pub label_size: f64,
	/// Below this zoom labels shrink on screen along with the view.
	pub label_min_k: f64,
}

impl Default for ScaleConfig {
	fn default() -> Self {
		Self {
			edge_width: 1.5,
			edge_behavior: ScaleBehavior::Screen,
			border_width: 1.0,
			border_behavior: ScaleBehavior::Clamped {
				min_screen: 1.0,
				max_screen: 3.0,
			},
			arrow_size: 8.0,
			arrow_behavior: ScaleBehavior::Clamped {
				min_screen: 4.0,
				max_screen: 14.0,
			},
			label_size: 12.0,
			label_min_k: 0.5,
		}
	}
}

/// Sizes resolved for one zoom level. Built once per frame.
#[derive(Clone, Debug)]
pub struct ScaledValues {
	pub edge_width: f64,
	pub border_width: f64,
	pub arrow_size: f64,
	/// CSS font shorthand for labels.
	pub label_font: String,
}

impl ScaledValues {
	pub fn new(config: &ScaleConfig, k: f64) -> Self {
		let label_size = config.label_size / k.max(config.label_min_k);
		Self {
			edge_width: config.edge_behavior.apply(config.edge_width, k),
			border_width: config.border_behavior.apply(config.border_width, k),
			arrow_size: config.arrow_behavior.apply(config.arrow_size, k),
			label_font: format!("{:.1}px sans-serif", label_size),
		}
	}
}
