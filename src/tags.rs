//! The little bit of tag knowledge the renderer needs.

/// Elements that never have children materialized, even if their [`VNode`](`crate::VNode`) declares some.
pub const VOID_ELEMENTS: [&str; 14] = [
	"area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source", "track", "wbr",
];

#[must_use]
pub fn is_void(tag: &str) -> bool {
	VOID_ELEMENTS.iter().any(|void| void.eq_ignore_ascii_case(tag))
}

/// The namespace an element is created in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
	Html,
	Svg,
	MathMl,
}

impl Default for Namespace {
	fn default() -> Self {
		Self::Html
	}
}

impl Namespace {
	pub const HTML_URI: &'static str = "http://www.w3.org/1999/xhtml";
	pub const SVG_URI: &'static str = "http://www.w3.org/2000/svg";
	pub const MATHML_URI: &'static str = "http://www.w3.org/1998/Math/MathML";

	#[must_use]
	pub fn uri(self) -> &'static str {
		match self {
			Self::Html => Self::HTML_URI,
			Self::Svg => Self::SVG_URI,
			Self::MathMl => Self::MATHML_URI,
		}
	}

	/// Unknown namespaces are treated as HTML.
	#[must_use]
	pub fn from_uri(uri: Option<&str>) -> Self {
		match uri {
			Some(Self::SVG_URI) => Self::Svg,
			Some(Self::MATHML_URI) => Self::MathMl,
			_ => Self::Html,
		}
	}

	/// The namespace of an element named `tag` whose parent's children are in `self`.
	#[must_use]
	pub fn of_element(self, tag: &str) -> Self {
		match tag {
			"svg" => Self::Svg,
			"math" => Self::MathMl,
			_ => self,
		}
	}

	/// The namespace the children of an element named `tag` in `self` are created in.
	#[must_use]
	pub fn of_children(self, tag: &str) -> Self {
		match (self, tag) {
			(Self::Svg, "foreignObject") => Self::Html,
			_ => self,
		}
	}
}
