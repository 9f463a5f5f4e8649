//! The host DOM binding and the thin patch executor issuing operations through it.

use crate::{tags::Namespace, Handler, PropValue};
use core::fmt::Debug;
use tracing::{error, trace, trace_span};

/// The DOM operations the renderer consumes.
///
/// All methods take `&self`: Event handlers may re-enter [`Renderer::render`](`crate::Renderer::render`)
/// while the host is still borrowed, so implementations use interior mutability where they need state.
pub trait Dom {
	/// A handle to a live node. Equality is node identity.
	type Node: Clone + PartialEq + Debug + 'static;
	type Error: Debug;

	fn create_element(&self, namespace: Namespace, tag: &str) -> Result<Self::Node, Self::Error>;
	fn create_text_node(&self, data: &str) -> Self::Node;
	fn set_text_data(&self, text: &Self::Node, data: &str);

	/// Inserts (or moves) `node` into `parent` right before `anchor`, or at the end if `anchor` is [`None`].
	fn insert_before(&self, parent: &Self::Node, node: &Self::Node, anchor: Option<&Self::Node>) -> Result<(), Self::Error>;
	/// Detaches `node` from its parent, if any.
	fn remove(&self, node: &Self::Node);
	fn next_sibling(&self, node: &Self::Node) -> Option<Self::Node>;

	fn set_attribute(&self, element: &Self::Node, name: &str, value: &str) -> Result<(), Self::Error>;
	fn remove_attribute(&self, element: &Self::Node, name: &str) -> Result<(), Self::Error>;

	/// Whether `element` natively exposes a live property called `name`.
	fn has_property(&self, element: &Self::Node, name: &str) -> bool;
	fn set_property(&self, element: &Self::Node, name: &str, value: &PropValue) -> Result<(), Self::Error>;

	fn add_listener(&self, element: &Self::Node, event: &str, handler: &Handler) -> Result<(), Self::Error>;
	fn remove_listener(&self, element: &Self::Node, event: &str, handler: &Handler) -> Result<(), Self::Error>;

	/// The namespace the children of `node` are created in by default.
	fn namespace(&self, node: &Self::Node) -> Namespace {
		let _ = node;
		Namespace::Html
	}

	/// Called once at the end of each render pass.
	fn flush(&self) {}
}

/// Redacts page content from log records unless the `dangerous-logging` feature is enabled.
pub(crate) fn loggable(value: &str) -> &str {
	if cfg!(feature = "dangerous-logging") {
		value
	} else {
		"<redacted>"
	}
}

/// Issues DOM operations, logging and absorbing host errors.
///
/// Failures don't abort the render pass. The affected node or property is skipped instead.
pub(crate) struct Patcher<'a, D: Dom> {
	dom: &'a D,
}

impl<'a, D: Dom> Patcher<'a, D> {
	pub fn new(dom: &'a D) -> Self {
		Self { dom }
	}

	pub fn create_element(&self, namespace: Namespace, tag: &str) -> Option<D::Node> {
		let span = trace_span!("Creating element", tag, ?namespace);
		let _enter = span.enter();
		match self.dom.create_element(namespace, tag) {
			Ok(element) => Some(element),
			Err(error) => {
				error!("Failed to create element <{}>: {:?}", tag, error);
				None
			}
		}
	}

	pub fn create_text_node(&self, data: &str) -> D::Node {
		trace!(data = loggable(data), "Creating text node");
		self.dom.create_text_node(data)
	}

	pub fn set_text_data(&self, text: &D::Node, data: &str) {
		trace!(data = loggable(data), "Updating text node");
		self.dom.set_text_data(text, data)
	}

	/// Returns whether `node` is now in place.
	pub fn insert_before(&self, parent: &D::Node, node: &D::Node, anchor: Option<&D::Node>) -> bool {
		trace!(?node, ?anchor, "Inserting node");
		match self.dom.insert_before(parent, node, anchor) {
			Ok(()) => true,
			Err(error) => {
				error!("Failed to insert node: {:?}", error);
				false
			}
		}
	}

	pub fn remove(&self, node: &D::Node) {
		trace!(?node, "Removing node");
		self.dom.remove(node)
	}

	pub fn next_sibling(&self, node: &D::Node) -> Option<D::Node> {
		self.dom.next_sibling(node)
	}

	pub fn set_attribute(&self, element: &D::Node, name: &str, value: &str) {
		trace!(name, value = loggable(value), "Setting attribute");
		if let Err(error) = self.dom.set_attribute(element, name, value) {
			error!("Could not set attribute {:?}={:?}: {:?}", name, loggable(value), error)
		}
	}

	pub fn remove_attribute(&self, element: &D::Node, name: &str) {
		trace!(name, "Removing attribute");
		if let Err(error) = self.dom.remove_attribute(element, name) {
			error!("Could not remove attribute {:?}: {:?}", name, error)
		}
	}

	pub fn has_property(&self, element: &D::Node, name: &str) -> bool {
		self.dom.has_property(element, name)
	}

	pub fn set_property(&self, element: &D::Node, name: &str, value: &PropValue) {
		trace!(name, "Setting property");
		if let Err(error) = self.dom.set_property(element, name, value) {
			error!("Could not set property {:?}: {:?}", name, error)
		}
	}

	pub fn add_listener(&self, element: &D::Node, event: &str, handler: &Handler) {
		trace!(event, ?handler, "Adding event listener");
		if let Err(error) = self.dom.add_listener(element, event, handler) {
			error!("Failed to add event listener {:?}: {:?}", event, error)
		}
	}

	pub fn remove_listener(&self, element: &D::Node, event: &str, handler: &Handler) {
		trace!(event, ?handler, "Removing event listener");
		if let Err(error) = self.dom.remove_listener(element, event, handler) {
			error!("Failed to remove event listener {:?}: {:?}", event, error)
		}
	}
}
