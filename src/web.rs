//! The [`Dom`] host for browsers, over [`web_sys`].

use crate::{
	rc_hash_map::{CountSaturatedError, RcHashMap},
	tags::Namespace,
	Child, Dom, Handler, PropValue, Renderer,
};
use core::cell::RefCell;
use js_sys::Reflect;
use tracing::{info, instrument, trace, trace_span, warn};
use wasm_bindgen::{closure::Closure, JsCast, JsValue, UnwrapThrowExt};

/// Binds a [`web_sys::Document`].
///
/// # Event Listeners
///
/// Each distinct [`Handler`] is wrapped into one [`Closure`], which is shared by all elements it is bound to
/// and reference-counted per [`WebDom`] instance. Unreferenced closures are freed at the end of each render pass.
///
/// Listeners that are still attached start throwing errors into JavaScript if the instance is dropped.
#[allow(clippy::type_complexity)]
pub struct WebDom {
	document: web_sys::Document,
	listeners: RefCell<RcHashMap<usize, u16, Closure<dyn Fn(web_sys::Event)>>>,
}

impl WebDom {
	#[must_use]
	pub fn new(document: web_sys::Document) -> Self {
		Self {
			document,
			listeners: RefCell::default(),
		}
	}

	/// Binds the current window's document, if there is one.
	#[must_use]
	pub fn for_window() -> Option<Self> {
		web_sys::window().and_then(|window| window.document()).map(Self::new)
	}

	pub fn document(&self) -> &web_sys::Document {
		&self.document
	}
}

fn as_element(node: &web_sys::Node) -> Result<&web_sys::Element, JsValue> {
	node.dyn_ref::<web_sys::Element>().ok_or_else(|| JsValue::from_str("twig-dom: Expected an element."))
}

fn to_js(value: &PropValue) -> JsValue {
	match value {
		PropValue::Null => JsValue::NULL,
		PropValue::Bool(bool) => JsValue::from_bool(*bool),
		PropValue::Number(number) => JsValue::from_f64(*number),
		PropValue::Str(string) => JsValue::from_str(string),
		PropValue::Handler(_) | PropValue::Ref(_) => JsValue::UNDEFINED,
	}
}

impl Dom for WebDom {
	type Node = web_sys::Node;
	type Error = JsValue;

	fn create_element(&self, namespace: Namespace, tag: &str) -> Result<Self::Node, Self::Error> {
		match namespace {
			Namespace::Html => self.document.create_element(tag),
			Namespace::Svg | Namespace::MathMl => self.document.create_element_ns(Some(namespace.uri()), tag),
		}
		.map(Into::into)
	}

	fn create_text_node(&self, data: &str) -> Self::Node {
		self.document.create_text_node(data).into()
	}

	fn set_text_data(&self, text: &Self::Node, data: &str) {
		match text.dyn_ref::<web_sys::CharacterData>() {
			Some(character_data) => character_data.set_data(data),
			None => text.set_text_content(Some(data)),
		}
	}

	fn insert_before(&self, parent: &Self::Node, node: &Self::Node, anchor: Option<&Self::Node>) -> Result<(), Self::Error> {
		parent.insert_before(node, anchor).map(drop)
	}

	fn remove(&self, node: &Self::Node) {
		if let Some(element) = node.dyn_ref::<web_sys::Element>() {
			element.remove()
		} else if let Some(character_data) = node.dyn_ref::<web_sys::CharacterData>() {
			character_data.remove()
		} else if let Some(parent) = node.parent_node() {
			if let Err(error) = parent.remove_child(node) {
				warn!("Failed to remove node: {:?}", error)
			}
		}
	}

	fn next_sibling(&self, node: &Self::Node) -> Option<Self::Node> {
		node.next_sibling()
	}

	fn set_attribute(&self, element: &Self::Node, name: &str, value: &str) -> Result<(), Self::Error> {
		as_element(element)?.set_attribute(name, value)
	}

	fn remove_attribute(&self, element: &Self::Node, name: &str) -> Result<(), Self::Error> {
		as_element(element)?.remove_attribute(name)
	}

	fn has_property(&self, element: &Self::Node, name: &str) -> bool {
		Reflect::has(element, &JsValue::from_str(name)).unwrap_or(false)
	}

	fn set_property(&self, element: &Self::Node, name: &str, value: &PropValue) -> Result<(), Self::Error> {
		if Reflect::set(element, &JsValue::from_str(name), &to_js(value))? {
			Ok(())
		} else {
			Err(JsValue::from_str("twig-dom: Property assignment was rejected."))
		}
	}

	#[instrument(skip(self, handler))]
	fn add_listener(&self, element: &Self::Node, event: &str, handler: &Handler) -> Result<(), Self::Error> {
		let mut listeners = self.listeners.borrow_mut();
		let closure = listeners
			.increment_or_insert_with(handler.id(), || {
				let handler = handler.clone();
				Closure::wrap(Box::new(move |event: web_sys::Event| {
					let span = trace_span!("Calling event handler", event = %event.type_());
					let _enter = span.enter();
					handler.call(&event)
				}) as Box<dyn Fn(web_sys::Event)>)
			})
			.map_err(|CountSaturatedError| JsValue::from_str("twig-dom: Too many (more than 65k) active references to the same `Handler`."))?;
		element.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())
	}

	#[instrument(skip(self, handler))]
	fn remove_listener(&self, element: &Self::Node, event: &str, handler: &Handler) -> Result<(), Self::Error> {
		let mut listeners = self.listeners.borrow_mut();
		match listeners.weak_decrement(&handler.id()) {
			Ok(Some(closure)) => element.remove_event_listener_with_callback(event, closure.as_ref().unchecked_ref()),
			Ok(None) => Err(JsValue::from_str("twig-dom: Tried to remove an event listener that was never added.")),
			Err(CountSaturatedError) => Err(JsValue::from_str("twig-dom: Tried to remove an event listener more often than it was added.")),
		}
	}

	fn namespace(&self, node: &Self::Node) -> Namespace {
		Namespace::from_uri(node.dyn_ref::<web_sys::Element>().and_then(web_sys::Element::namespace_uri).as_deref())
	}

	fn flush(&self) {
		let mut listeners = self.listeners.borrow_mut();
		trace!("Freed {} event listener closure(s).", listeners.drain_weak());
		info!("Event listener closure count/cached capacity: {}/{}", listeners.len(), listeners.capacity());
	}
}

thread_local! {
	static RENDERER: Renderer<WebDom> = Renderer::new(WebDom::for_window().expect_throw("twig-dom: No window document found."));
}

/// Renders `vnode` into `container` through a thread-local [`Renderer`] for the window's document.
pub fn render(vnode: impl Into<Child>, container: &web_sys::Element) {
	let container: &web_sys::Node = container.as_ref();
	RENDERER.with(|renderer| renderer.render(vnode, container))
}

/// [`Renderer::unmount`] for [`render`]'s thread-local [`Renderer`].
pub fn unmount(container: &web_sys::Element) -> bool {
	let container: &web_sys::Node = container.as_ref();
	RENDERER.with(|renderer| renderer.unmount(container))
}
