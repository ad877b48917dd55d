//! Colours for the dependency viewport.
//!
//! Node fill comes from the archetype palette; borders and edge strokes encode
//! highlight state.

/// RGBA color representation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
	pub r: u8,
	pub g: u8,
	pub b: u8,
	pub a: f64,
}

impl Color {
	pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
		Self { r, g, b, a: 1.0 }
	}

	pub const fn rgba(r: u8, g: u8, b: u8, a: f64) -> Self {
		Self { r, g, b, a }
	}

	pub fn with_alpha(self, a: f64) -> Self {
		Self { a, ..self }
	}

	pub fn to_css(self) -> String {
		if (self.a - 1.0).abs() < 0.001 {
			format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
		} else {
			format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
		}
	}
}

/// Fill colours cycled by vertex archetype.
#[derive(Clone, Debug)]
pub struct ArchetypePalette {
	pub colors: Vec<Color>,
}

impl ArchetypePalette {
	/// Muted slate blues and teals.
	pub fn slate() -> Self {
		Self {
			colors: vec![
				Color::rgb(94, 129, 172),
				Color::rgb(100, 148, 160),
				Color::rgb(136, 160, 175),
				Color::rgb(108, 142, 173),
				Color::rgb(119, 158, 165),
				Color::rgb(122, 153, 168),
			],
		}
	}

	/// Soft pastels for light backgrounds.
	pub fn pastel() -> Self {
		Self {
			colors: vec![
				Color::rgb(200, 180, 190),
				Color::rgb(180, 195, 205),
				Color::rgb(190, 200, 180),
				Color::rgb(205, 195, 180),
				Color::rgb(185, 190, 200),
				Color::rgb(180, 200, 195),
			],
		}
	}

	/// Colour for `archetype`, or the first entry for untyped vertices.
	pub fn get(&self, archetype: Option<usize>) -> Color {
		let i = archetype.unwrap_or(0);
		self.colors
			.get(i % self.colors.len().max(1))
			.copied()
			.unwrap_or(Color::rgb(128, 128, 128))
	}
}

/// Stroke colours for the highlight states.
#[derive(Clone, Debug)]
pub struct HighlightStyle {
	/// The focused node and a selected edge.
	pub focus: Color,
	/// Sources of the focused node's in-edges.
	pub required: Color,
	/// Targets of the focused node's out-edges.
	pub provided: Color,
	/// Search matches.
	pub found: Color,
	/// Opacity multiplier for dimmed nodes and edges.
	pub dim_alpha: f64,
}

/// Complete visual theme.
#[derive(Clone, Debug)]
pub struct Theme {
	pub name: &'static str,
	pub background: Color,
	pub edge: Color,
	pub group_fill: Color,
	pub border: Color,
	pub label: Color,
	pub floater: Color,
	pub highlight: HighlightStyle,
	pub palette: ArchetypePalette,
}

impl Theme {
	/// Dark theme (default)
	pub fn dark() -> Self {
		Self {
			name: "dark",
			background: Color::rgb(22, 27, 34),
			edge: Color::rgba(140, 160, 180, 0.6),
			group_fill: Color::rgb(70, 80, 96),
			border: Color::rgba(255, 255, 255, 0.35),
			label: Color::rgba(255, 255, 255, 0.9),
			floater: Color::rgb(230, 180, 80),
			highlight: HighlightStyle {
				focus: Color::rgb(255, 255, 255),
				required: Color::rgb(239, 131, 84),
				provided: Color::rgb(102, 187, 106),
				found: Color::rgb(255, 213, 79),
				dim_alpha: 0.25,
			},
			palette: ArchetypePalette::slate(),
		}
	}

	pub fn light() -> Self {
		Self {
			name: "light",
			background: Color::rgb(248, 249, 251),
			edge: Color::rgba(90, 100, 115, 0.6),
			group_fill: Color::rgb(215, 220, 228),
			border: Color::rgba(40, 45, 55, 0.5),
			label: Color::rgb(30, 34, 40),
			floater: Color::rgb(200, 120, 20),
			highlight: HighlightStyle {
				focus: Color::rgb(20, 24, 30),
				required: Color::rgb(216, 67, 21),
				provided: Color::rgb(46, 125, 50),
				found: Color::rgb(245, 127, 23),
				dim_alpha: 0.3,
			},
			palette: ArchetypePalette::pastel(),
		}
	}
}

impl Default for Theme {
	fn default() -> Self {
		Self::dark()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn css_uses_hex_when_opaque() {
		assert_eq!(Color::rgb(255, 0, 16).to_css(), "#ff0010");
		assert_eq!(
			Color::rgb(1, 2, 3).with_alpha(0.5).to_css(),
			"rgba(1, 2, 3, 0.5)"
		);
	}

	#[test]
	fn palette_cycles_by_archetype() {
		let palette = ArchetypePalette::slate();
		let n = palette.colors.len();
		assert_eq!(palette.get(Some(n + 1)), palette.get(Some(1)));
		assert_eq!(palette.get(None), palette.colors[0]);
		let empty = ArchetypePalette { colors: Vec::new() };
		assert_eq!(empty.get(Some(3)), Color::rgb(128, 128, 128));
	}
}
