use crate::{
	dom::{loggable, Dom, Patcher},
	props::{self, PropKind, Target},
	tags::{self, Namespace},
	Element, Key, NodeRef, PropValue, Props, VNode,
};
use hashbrown::{hash_map::Entry, HashMap, HashSet};
use std::{borrow::Cow, collections::VecDeque};
use tracing::{instrument, trace, trace_span, warn};

/// The rendered counterpart of an element or text [`VNode`], attached to its live DOM node.
///
/// Fragments are spliced into their parent's child list, so they never have a [`Mounted`] of their own.
#[derive(Debug)]
pub(crate) struct Mounted<N> {
	pub node: N,
	pub kind: MountedKind<N>,
}

#[derive(Debug)]
pub(crate) enum MountedKind<N> {
	Text(String),
	Element(MountedElement<N>),
}

#[derive(Debug)]
pub(crate) struct MountedElement<N> {
	tag: Cow<'static, str>,
	namespace: Namespace,
	props: Props,
	children: Vec<Mounted<N>>,
}

impl<N> Mounted<N> {
	fn key(&self) -> Option<Key> {
		match &self.kind {
			MountedKind::Element(element) => element.props.key(),
			MountedKind::Text(_) => None,
		}
	}

	/// Whether the DOM node can be reused for `leaf` (same kind and, for elements, the same tag).
	fn matches(&self, leaf: &Leaf) -> bool {
		match (&self.kind, leaf) {
			(MountedKind::Text(_), Leaf::Text(_)) => true,
			(MountedKind::Element(mounted), Leaf::Element(element)) => mounted.tag == element.tag,
			_ => false,
		}
	}

	fn slot(&self) -> Slot {
		match &self.kind {
			MountedKind::Element(element) => Some(element.tag.clone()),
			MountedKind::Text(_) => None,
		}
	}
}

/// Groups nodes that can stand in for each other positionally: text (`None`) or elements of one tag.
type Slot = Option<Cow<'static, str>>;

/// A child list entry after fragment splicing.
enum Leaf {
	Element(Element),
	Text(String),
}

impl Leaf {
	fn key(&self) -> Option<Key> {
		match self {
			Self::Element(element) => element.key(),
			Self::Text(_) => None,
		}
	}

	fn slot(&self) -> Slot {
		match self {
			Self::Element(element) => Some(element.tag.clone()),
			Self::Text(_) => None,
		}
	}
}

fn flatten_into(nodes: Vec<VNode>, out: &mut Vec<Leaf>) {
	for node in nodes {
		match node {
			VNode::Element(element) => out.push(Leaf::Element(element)),
			VNode::Text(text) => out.push(Leaf::Text(text)),
			VNode::Fragment(children) => flatten_into(children, out),
		}
	}
}

/// Reconciles one parent's child list per render pass, recursing into reused and created elements.
pub(crate) struct Differ<'a, D: Dom> {
	patcher: Patcher<'a, D>,
}

impl<'a, D: Dom> Differ<'a, D> {
	pub fn new(dom: &'a D) -> Self {
		Self { patcher: Patcher::new(dom) }
	}

	/// Turns the DOM children of `parent` described by `old` into ones described by `new`.
	///
	/// This is a single pass over `new` that tracks an insertion anchor, the DOM node currently in the slot being filled.
	/// Reused nodes that already sit at the anchor stay where they are; every other placed node is moved or inserted before it.
	/// No cheaper global assignment is searched for, so reversing a keyed list of `n` items moves `n - 1` nodes.
	///
	/// Nodes from `old` that weren't reused are removed afterwards, in their original order.
	#[instrument(skip(self, old, new))]
	pub fn diff_children(&self, parent: &D::Node, namespace: Namespace, old: Vec<Mounted<D::Node>>, new: Vec<VNode>) -> Vec<Mounted<D::Node>> {
		let mut leaves = Vec::with_capacity(new.len());
		flatten_into(new, &mut leaves);

		let mut new_keys = HashSet::new();
		for key in leaves.iter().filter_map(Leaf::key) {
			if let Some(duplicate) = new_keys.replace(key) {
				if cfg!(debug_assertions) {
					warn!("Duplicate sibling key {:?}. The resulting DOM is unspecified.", duplicate.as_str());
				}
			}
		}

		let mut anchor = old.first().map(|first| first.node.clone());
		let mut old: Vec<Option<Mounted<D::Node>>> = old.into_iter().map(Some).collect();

		// Old children whose key is still in use can only be reused by key.
		// All others are matched by position, first come first served within each slot.
		let mut keyed = HashMap::new();
		let mut positional: HashMap<Slot, VecDeque<usize>> = HashMap::new();
		for (i, mounted) in old.iter().enumerate() {
			let mounted = match mounted {
				Some(mounted) => mounted,
				None => continue,
			};
			if let Some(key) = mounted.key().filter(|key| new_keys.contains(key)) {
				if let Entry::Vacant(vacant) = keyed.entry(key) {
					vacant.insert(i);
					continue;
				}
			}
			positional.entry(mounted.slot()).or_default().push_back(i);
		}

		let mut mounted = Vec::with_capacity(leaves.len());
		for leaf in leaves {
			let reusable = match leaf.key() {
				Some(key) => keyed.remove(&key).filter(|&i| {
					let candidate = old[i].as_ref();
					let matches = candidate.map_or(false, |candidate| candidate.matches(&leaf));
					if !matches {
						if let (Some(MountedKind::Element(mounted)), Leaf::Element(element)) = (candidate.map(|candidate| &candidate.kind), &leaf) {
							if mounted.tag.eq_ignore_ascii_case(&element.tag) {
								warn!(key = key.as_str(), "Element tag changed only in case, from <{}> to <{}>. Recreating it.", mounted.tag, element.tag);
							}
						}
						trace!(key = key.as_str(), "Keyed node changed kind or tag. Recreating it.");
					}
					matches
				}),
				None => positional.get_mut(&leaf.slot()).and_then(VecDeque::pop_front),
			};

			let (child, created) = match (reusable.and_then(|i| old[i].take()), leaf) {
				(Some(Mounted { node, kind: MountedKind::Text(previous) }), Leaf::Text(text)) => (self.patch_text(node, previous, text), false),
				(Some(Mounted { node, kind: MountedKind::Element(previous) }), Leaf::Element(element)) => (self.patch_element(node, previous, element), false),
				(_, leaf) => match self.create(leaf, namespace) {
					Some(child) => (child, true),
					None => continue,
				},
			};

			if !created && anchor.as_ref() == Some(&child.node) {
				anchor = self.patcher.next_sibling(&child.node);
			} else if !self.patcher.insert_before(parent, &child.node, anchor.as_ref()) && created {
				self.release(&child);
				continue;
			}
			mounted.push(child);
		}

		for leftover in old.into_iter().flatten() {
			self.unmount(leftover)
		}
		mounted
	}

	fn patch_text(&self, node: D::Node, previous: String, text: String) -> Mounted<D::Node> {
		if previous != text {
			let span = trace_span!("Diffing text node", previous = loggable(&previous), text = loggable(&text));
			let _enter = span.enter();
			self.patcher.set_text_data(&node, &text);
		}
		Mounted { node, kind: MountedKind::Text(text) }
	}

	fn patch_element(&self, node: D::Node, previous: MountedElement<D::Node>, element: Element) -> Mounted<D::Node> {
		let MountedElement {
			tag,
			namespace,
			props: previous_props,
			children: previous_children,
		} = previous;
		let Element { tag: _, props, children } = element;

		let span = trace_span!("Diffing element", tag = &*tag);
		let _enter = span.enter();

		props::patch_props(&self.patcher, &Target::<D>::new(&node, &tag, &props), &previous_props, &props);
		let children = self.diff_element_children(&node, &tag, namespace, previous_children, children);
		update_ref(previous_props.node_ref(), props.node_ref(), &node);

		Mounted {
			node,
			kind: MountedKind::Element(MountedElement { tag, namespace, props, children }),
		}
	}

	/// Creates a detached DOM subtree for `leaf`, so that it is attached with a single insertion.
	fn create(&self, leaf: Leaf, parent_namespace: Namespace) -> Option<Mounted<D::Node>> {
		match leaf {
			Leaf::Text(text) => {
				let node = self.patcher.create_text_node(&text);
				Some(Mounted { node, kind: MountedKind::Text(text) })
			}
			Leaf::Element(Element { tag, props, children }) => {
				let span = trace_span!("Creating element", tag = &*tag);
				let _enter = span.enter();

				let namespace = parent_namespace.of_element(&tag);
				let node = self.patcher.create_element(namespace, &tag)?;
				props::patch_props(&self.patcher, &Target::<D>::new(&node, &tag, &props), &Props::new(), &props);
				let children = self.diff_element_children(&node, &tag, namespace, Vec::new(), children);
				update_ref(None, props.node_ref(), &node);

				Some(Mounted {
					node,
					kind: MountedKind::Element(MountedElement { tag, namespace, props, children }),
				})
			}
		}
	}

	fn diff_element_children(&self, element: &D::Node, tag: &str, namespace: Namespace, old: Vec<Mounted<D::Node>>, new: Vec<VNode>) -> Vec<Mounted<D::Node>> {
		if tags::is_void(tag) {
			if !new.is_empty() {
				warn!("Void element <{}> declares {} child node(s), which are not rendered.", tag, new.len());
			}
			debug_assert!(old.is_empty());
			return Vec::new();
		}
		self.diff_children(element, namespace.of_children(tag), old, new)
	}

	/// Releases the bindings of `mounted`'s subtree and detaches it from the DOM.
	fn unmount(&self, mounted: Mounted<D::Node>) {
		let span = trace_span!("Unmounting", node = ?mounted.node);
		let _enter = span.enter();
		self.release(&mounted);
		self.patcher.remove(&mounted.node);
	}

	/// Clears refs and removes event listeners for a subtree, without removing it from the DOM.
	fn release(&self, mounted: &Mounted<D::Node>) {
		if let MountedKind::Element(element) = &mounted.kind {
			for (name, value) in element.props.iter() {
				if let (PropKind::Listener { event }, PropValue::Handler(handler)) = (props::classify(name, value), value) {
					self.patcher.remove_listener(&mounted.node, &event, handler)
				}
			}
			if let Some(node_ref) = element.props.node_ref() {
				node_ref.clear_if_current(&mounted.node)
			}
			for child in &element.children {
				self.release(child)
			}
		}
	}

	/// Releases `mounted` like [`Self::unmount`] would, for a whole child list.
	pub fn unmount_all(&self, mounted: Vec<Mounted<D::Node>>) {
		for child in mounted {
			self.unmount(child)
		}
	}
}

fn update_ref<N: Clone + PartialEq + 'static>(previous: Option<&NodeRef>, next: Option<&NodeRef>, node: &N) {
	if let Some(previous) = previous {
		if !next.map_or(false, |next| next.ptr_eq(previous)) {
			previous.clear_if_current(node)
		}
	}
	if let Some(next) = next {
		next.set(node.clone())
	}
}
