//! An in-memory [`Dom`] host, a call-logging decorator for any host, and a deterministic serializer.
#![allow(dead_code)]

use std::{cell::RefCell, convert::Infallible, rc::Rc};
use twig_dom::{dom::Dom, tags::Namespace, Handler, PropValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// The event object [`MemoryDom::dispatch`] passes to handlers.
#[derive(Debug)]
pub struct MemoryEvent {
	pub kind: String,
}

#[derive(Debug)]
enum Data {
	Element {
		tag: String,
		namespace: Namespace,
		attributes: Vec<(String, String)>,
		properties: Vec<(String, PropValue)>,
		listeners: Vec<(String, Handler)>,
	},
	Text(String),
}

#[derive(Debug)]
struct NodeData {
	data: Data,
	parent: Option<NodeId>,
	children: Vec<NodeId>,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryDom {
	nodes: Rc<RefCell<Vec<NodeData>>>,
}

/// Elements with a native live `value` (and `checked`, for `input`) property.
fn has_native_property(tag: &str, name: &str) -> bool {
	match name {
		"checked" => tag == "input",
		"value" => matches!(tag, "input" | "textarea" | "select" | "option" | "button" | "output" | "data" | "li" | "meter" | "progress" | "param"),
		_ => false,
	}
}

impl MemoryDom {
	pub fn new() -> Self {
		Self::default()
	}

	fn push(&self, data: Data) -> NodeId {
		let mut nodes = self.nodes.borrow_mut();
		nodes.push(NodeData { data, parent: None, children: Vec::new() });
		NodeId(nodes.len() - 1)
	}

	/// A detached `<div>` to render into.
	pub fn container(&self) -> NodeId {
		self.create_element(Namespace::Html, "div").unwrap()
	}

	fn detach(nodes: &mut [NodeData], node: NodeId) {
		if let Some(parent) = nodes[node.0].parent.take() {
			nodes[parent.0].children.retain(|&child| child != node);
		}
	}

	pub fn children(&self, node: NodeId) -> Vec<NodeId> {
		self.nodes.borrow()[node.0].children.clone()
	}

	pub fn first_child(&self, node: NodeId) -> Option<NodeId> {
		self.children(node).first().copied()
	}

	pub fn last_child(&self, node: NodeId) -> Option<NodeId> {
		self.children(node).last().copied()
	}

	pub fn parent(&self, node: NodeId) -> Option<NodeId> {
		self.nodes.borrow()[node.0].parent
	}

	pub fn tag(&self, node: NodeId) -> Option<String> {
		match &self.nodes.borrow()[node.0].data {
			Data::Element { tag, .. } => Some(tag.clone()),
			Data::Text(_) => None,
		}
	}

	pub fn element_namespace(&self, node: NodeId) -> Option<Namespace> {
		match &self.nodes.borrow()[node.0].data {
			Data::Element { namespace, .. } => Some(*namespace),
			Data::Text(_) => None,
		}
	}

	pub fn attributes(&self, node: NodeId) -> Vec<(String, String)> {
		match &self.nodes.borrow()[node.0].data {
			Data::Element { attributes, .. } => attributes.clone(),
			Data::Text(_) => Vec::new(),
		}
	}

	pub fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
		self.attributes(node).into_iter().find(|(n, _)| n == name).map(|(_, value)| value)
	}

	pub fn property(&self, node: NodeId, name: &str) -> Option<PropValue> {
		match &self.nodes.borrow()[node.0].data {
			Data::Element { properties, .. } => properties.iter().find(|(n, _)| n == name).map(|(_, value)| value.clone()),
			Data::Text(_) => None,
		}
	}

	pub fn listener_count(&self, node: NodeId) -> usize {
		match &self.nodes.borrow()[node.0].data {
			Data::Element { listeners, .. } => listeners.len(),
			Data::Text(_) => 0,
		}
	}

	pub fn text_content(&self, node: NodeId) -> String {
		let nodes = self.nodes.borrow();
		let mut out = String::new();
		fn collect(nodes: &[NodeData], node: NodeId, out: &mut String) {
			match &nodes[node.0].data {
				Data::Text(text) => out.push_str(text),
				Data::Element { .. } => {
					for &child in &nodes[node.0].children {
						collect(nodes, child, out)
					}
				}
			}
		}
		collect(&nodes, node, &mut out);
		out
	}

	/// Calls the listeners for `kind` on `node`. Returns how many were called.
	///
	/// No borrow is held while handlers run, so they may render again.
	pub fn dispatch(&self, node: NodeId, kind: &str) -> usize {
		let handlers: Vec<Handler> = match &self.nodes.borrow()[node.0].data {
			Data::Element { listeners, .. } => listeners.iter().filter(|(event, _)| event == kind).map(|(_, handler)| handler.clone()).collect(),
			Data::Text(_) => Vec::new(),
		};
		let event = MemoryEvent { kind: kind.to_owned() };
		for handler in &handlers {
			handler.call(&event)
		}
		handlers.len()
	}

	pub fn click(&self, node: NodeId) -> usize {
		self.dispatch(node, "click")
	}

	/// The serialized children of `node`: Attributes sorted by name, empty `class` dropped,
	/// `&` encoded, SVG path data normalized, and no children for void elements and `textarea`.
	pub fn serialize_html(&self, node: NodeId) -> String {
		let nodes = self.nodes.borrow();
		let mut out = String::new();
		for &child in &nodes[node.0].children {
			serialize_node(&nodes, child, &mut out)
		}
		out
	}
}

const VOID_ELEMENTS: [&str; 14] = ["area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source", "track", "wbr"];

fn encode_entities(text: &str) -> String {
	text.replace('&', "&amp;")
}

/// Some browsers insert spaces around path commands, others don't.
fn normalize_path(path: &str) -> String {
	let chars: Vec<char> = path.chars().collect();
	let mut out = String::new();
	for (i, &c) in chars.iter().enumerate() {
		if c.is_ascii_alphabetic() {
			if i == 0 {
				out.push(c);
				out.push(' ');
			} else {
				if chars[i - 1] != ' ' {
					out.push(' ');
				}
				out.push(c);
				if i < chars.len() - 1 {
					out.push(' ');
				}
			}
		} else if c == '-' && (i == 0 || chars[i - 1] != ' ') {
			out.push(' ');
			out.push(c);
		} else {
			out.push(c);
		}
	}
	let mut collapsed = String::with_capacity(out.len());
	let mut pending = String::new();
	for c in out.chars() {
		if c.is_whitespace() {
			pending.push(c);
			continue;
		}
		flush_whitespace(&mut pending, &mut collapsed);
		collapsed.push(c);
	}
	flush_whitespace(&mut pending, &mut collapsed);
	collapsed.replace('z', "Z")
}

/// Collapses runs of two or more whitespace characters into one space.
fn flush_whitespace(pending: &mut String, out: &mut String) {
	if pending.chars().count() > 1 {
		out.push(' ');
	} else {
		out.push_str(pending);
	}
	pending.clear();
}

fn serialize_node(nodes: &[NodeData], node: NodeId, out: &mut String) {
	match &nodes[node.0].data {
		Data::Text(text) => out.push_str(&encode_entities(text)),
		Data::Element { tag, attributes, .. } => {
			out.push('<');
			out.push_str(tag);
			let mut attributes = attributes.clone();
			attributes.sort_by(|(a, _), (b, _)| a.cmp(b));
			for (name, value) in attributes {
				if value.is_empty() && name == "class" {
					continue;
				}
				let mut value = encode_entities(&value);
				if tag == "path" && name == "d" {
					value = normalize_path(&value);
				}
				out.push_str(&format!(" {}=\"{}\"", name, value));
			}
			out.push('>');

			if !VOID_ELEMENTS.contains(&tag.as_str()) {
				if tag != "textarea" {
					for &child in &nodes[node.0].children {
						serialize_node(nodes, child, out)
					}
				}
				out.push_str(&format!("</{}>", tag));
			}
		}
	}
}

impl Dom for MemoryDom {
	type Node = NodeId;
	type Error = Infallible;

	fn create_element(&self, namespace: Namespace, tag: &str) -> Result<NodeId, Infallible> {
		Ok(self.push(Data::Element {
			tag: tag.to_owned(),
			namespace,
			attributes: Vec::new(),
			properties: Vec::new(),
			listeners: Vec::new(),
		}))
	}

	fn create_text_node(&self, data: &str) -> NodeId {
		self.push(Data::Text(data.to_owned()))
	}

	fn set_text_data(&self, text: &NodeId, data: &str) {
		if let Data::Text(text) = &mut self.nodes.borrow_mut()[text.0].data {
			*text = data.to_owned();
		}
	}

	fn insert_before(&self, parent: &NodeId, node: &NodeId, anchor: Option<&NodeId>) -> Result<(), Infallible> {
		let mut nodes = self.nodes.borrow_mut();
		Self::detach(&mut nodes, *node);
		let siblings = &mut nodes[parent.0].children;
		let index = match anchor {
			Some(anchor) => siblings.iter().position(|child| child == anchor).expect("anchor is not a child of parent"),
			None => siblings.len(),
		};
		siblings.insert(index, *node);
		nodes[node.0].parent = Some(*parent);
		Ok(())
	}

	fn remove(&self, node: &NodeId) {
		Self::detach(&mut self.nodes.borrow_mut(), *node)
	}

	fn next_sibling(&self, node: &NodeId) -> Option<NodeId> {
		let nodes = self.nodes.borrow();
		let siblings = &nodes[nodes[node.0].parent?.0].children;
		let index = siblings.iter().position(|child| child == node)?;
		siblings.get(index + 1).copied()
	}

	fn set_attribute(&self, element: &NodeId, name: &str, value: &str) -> Result<(), Infallible> {
		if let Data::Element { attributes, .. } = &mut self.nodes.borrow_mut()[element.0].data {
			match attributes.iter_mut().find(|(n, _)| n == name) {
				Some((_, existing)) => *existing = value.to_owned(),
				None => attributes.push((name.to_owned(), value.to_owned())),
			}
		}
		Ok(())
	}

	fn remove_attribute(&self, element: &NodeId, name: &str) -> Result<(), Infallible> {
		if let Data::Element { attributes, .. } = &mut self.nodes.borrow_mut()[element.0].data {
			attributes.retain(|(n, _)| n != name);
		}
		Ok(())
	}

	fn has_property(&self, element: &NodeId, name: &str) -> bool {
		self.tag(*element).map_or(false, |tag| has_native_property(&tag, name))
	}

	fn set_property(&self, element: &NodeId, name: &str, value: &PropValue) -> Result<(), Infallible> {
		if let Data::Element { properties, .. } = &mut self.nodes.borrow_mut()[element.0].data {
			match properties.iter_mut().find(|(n, _)| n == name) {
				Some((_, existing)) => *existing = value.clone(),
				None => properties.push((name.to_owned(), value.clone())),
			}
		}
		Ok(())
	}

	fn add_listener(&self, element: &NodeId, event: &str, handler: &Handler) -> Result<(), Infallible> {
		if let Data::Element { listeners, .. } = &mut self.nodes.borrow_mut()[element.0].data {
			// Like `addEventListener`, identical registrations are ignored.
			if !listeners.iter().any(|(e, h)| e == event && h.ptr_eq(handler)) {
				listeners.push((event.to_owned(), handler.clone()));
			}
		}
		Ok(())
	}

	fn remove_listener(&self, element: &NodeId, event: &str, handler: &Handler) -> Result<(), Infallible> {
		if let Data::Element { listeners, .. } = &mut self.nodes.borrow_mut()[element.0].data {
			listeners.retain(|(e, h)| !(e == event && h.ptr_eq(handler)));
		}
		Ok(())
	}

	fn namespace(&self, node: &NodeId) -> Namespace {
		self.element_namespace(*node).unwrap_or_default()
	}
}

/// Describes nodes for [`LoggingDom`] records.
pub trait Describe: Dom {
	fn describe_node(&self, node: &Self::Node) -> String;
}

impl Describe for MemoryDom {
	/// `#text` for text nodes, `<tag>` followed by the text content for elements.
	fn describe_node(&self, node: &NodeId) -> String {
		match self.tag(*node) {
			Some(tag) => format!("<{}>{}", tag, self.text_content(*node)),
			None => "#text".to_owned(),
		}
	}
}

/// Records `insertBefore` and `remove` calls before forwarding them to the wrapped host.
///
/// Records look like `<ol>ab.insertBefore(<li>c, Null)` and `<li>d.remove()`.
#[derive(Debug, Clone, Default)]
pub struct LoggingDom<D> {
	inner: D,
	log: Rc<RefCell<Vec<String>>>,
}

impl<D: Describe> LoggingDom<D> {
	pub fn new(inner: D) -> Self {
		Self { inner, log: Rc::default() }
	}

	pub fn inner(&self) -> &D {
		&self.inner
	}

	pub fn take_log(&self) -> Vec<String> {
		self.log.borrow_mut().drain(..).collect()
	}

	pub fn clear_log(&self) {
		self.log.borrow_mut().clear()
	}
}

impl<D: Describe> Dom for LoggingDom<D> {
	type Node = D::Node;
	type Error = D::Error;

	fn create_element(&self, namespace: Namespace, tag: &str) -> Result<Self::Node, Self::Error> {
		self.inner.create_element(namespace, tag)
	}

	fn create_text_node(&self, data: &str) -> Self::Node {
		self.inner.create_text_node(data)
	}

	fn set_text_data(&self, text: &Self::Node, data: &str) {
		self.inner.set_text_data(text, data)
	}

	fn insert_before(&self, parent: &Self::Node, node: &Self::Node, anchor: Option<&Self::Node>) -> Result<(), Self::Error> {
		let record = format!(
			"{}.insertBefore({}, {})",
			self.inner.describe_node(parent),
			self.inner.describe_node(node),
			anchor.map_or_else(|| "Null".to_owned(), |anchor| self.inner.describe_node(anchor)),
		);
		self.log.borrow_mut().push(record);
		self.inner.insert_before(parent, node, anchor)
	}

	fn remove(&self, node: &Self::Node) {
		let record = format!("{}.remove()", self.inner.describe_node(node));
		self.log.borrow_mut().push(record);
		self.inner.remove(node)
	}

	fn next_sibling(&self, node: &Self::Node) -> Option<Self::Node> {
		self.inner.next_sibling(node)
	}

	fn set_attribute(&self, element: &Self::Node, name: &str, value: &str) -> Result<(), Self::Error> {
		self.inner.set_attribute(element, name, value)
	}

	fn remove_attribute(&self, element: &Self::Node, name: &str) -> Result<(), Self::Error> {
		self.inner.remove_attribute(element, name)
	}

	fn has_property(&self, element: &Self::Node, name: &str) -> bool {
		self.inner.has_property(element, name)
	}

	fn set_property(&self, element: &Self::Node, name: &str, value: &PropValue) -> Result<(), Self::Error> {
		self.inner.set_property(element, name, value)
	}

	fn add_listener(&self, element: &Self::Node, event: &str, handler: &Handler) -> Result<(), Self::Error> {
		self.inner.add_listener(element, event, handler)
	}

	fn remove_listener(&self, element: &Self::Node, event: &str, handler: &Handler) -> Result<(), Self::Error> {
		self.inner.remove_listener(element, event, handler)
	}

	fn namespace(&self, node: &Self::Node) -> Namespace {
		self.inner.namespace(node)
	}

	fn flush(&self) {
		self.inner.flush()
	}
}
