//! The declarative node tree that [`Renderer::render`](`crate::Renderer::render`) synchronizes the DOM with.

use core::{
	any::Any,
	cell::RefCell,
	fmt::{self, Debug, Formatter},
};
use hashbrown::HashMap;
use std::{borrow::Cow, rc::Rc};

/// An immutable description of a DOM element, a fragment or a text leaf.
#[derive(Debug, Clone, PartialEq)]
pub enum VNode {
	Element(Element),
	/// Contributes its children to the enclosing child list without a wrapper node.
	Fragment(Vec<VNode>),
	Text(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
	pub tag: Cow<'static, str>,
	pub props: Props,
	pub children: Vec<VNode>,
}

impl Element {
	/// The sibling identity declared via the `key` property, if any.
	#[must_use]
	pub fn key(&self) -> Option<Key> {
		self.props.key()
	}

	#[must_use]
	pub fn node_ref(&self) -> Option<&NodeRef> {
		self.props.node_ref()
	}
}

impl VNode {
	#[must_use]
	pub fn text(value: impl Into<Text>) -> Self {
		Self::Text(value.into().0)
	}

	#[must_use]
	pub fn key(&self) -> Option<Key> {
		match self {
			Self::Element(element) => element.key(),
			Self::Fragment(_) | Self::Text(_) => None,
		}
	}
}

/// Primitive text content, already coerced to its string form.
pub struct Text(String);
impl From<&str> for Text {
	fn from(value: &str) -> Self {
		Self(value.to_owned())
	}
}
impl From<String> for Text {
	fn from(value: String) -> Self {
		Self(value)
	}
}
macro_rules! text_from_number {
	($($number:ty),*$(,)?) => {$(
		impl From<$number> for Text {
			#[allow(clippy::cast_lossless, clippy::cast_precision_loss)]
			fn from(value: $number) -> Self {
				Self(format_number(value as f64))
			}
		}
	)*};
}
text_from_number!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64);

/// Formats `value` the way the host coerces numbers to strings.
#[must_use]
pub fn format_number(value: f64) -> String {
	if value.is_nan() {
		"NaN".to_owned()
	} else if value.is_infinite() {
		(if value > 0. { "Infinity" } else { "-Infinity" }).to_owned()
	} else if value == 0. {
		"0".to_owned()
	} else if value.abs() >= 1e21 || value.abs() < 1e-6 {
		// Shortest round-trip mantissa, with an explicitly signed exponent.
		let formatted = format!("{:e}", value);
		match formatted.split_once('e') {
			Some((mantissa, exponent)) if !exponent.starts_with('-') => format!("{}e+{}", mantissa, exponent),
			_ => formatted,
		}
	} else {
		value.to_string()
	}
}

/// A sibling identity. Numbers and strings with the same string form are the same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Key(Cow<'static, str>);
impl Key {
	#[must_use]
	pub fn as_str(&self) -> &str {
		&self.0
	}

	fn from_value(value: &PropValue) -> Option<Self> {
		match value {
			PropValue::Str(string) => Some(Self(string.clone())),
			PropValue::Number(number) => Some(Self(format_number(*number).into())),
			PropValue::Bool(bool) => Some(Self(bool.to_string().into())),
			PropValue::Null | PropValue::Handler(_) | PropValue::Ref(_) => None,
		}
	}
}

/// An event listener, compared by identity.
///
/// The host passes its native event object as argument,
/// so handlers downcast it to whatever event type their host produces.
#[derive(Clone)]
pub struct Handler(Rc<dyn Fn(&dyn Any)>);
impl Handler {
	pub fn new(handler: impl 'static + Fn(&dyn Any)) -> Self {
		Self(Rc::new(handler))
	}

	pub fn call(&self, event: &dyn Any) {
		(self.0)(event)
	}

	#[must_use]
	pub fn ptr_eq(&self, other: &Self) -> bool {
		self.id() == other.id()
	}

	/// Identity of the underlying closure, stable for as long as any clone of this [`Handler`] is alive.
	#[must_use]
	pub fn id(&self) -> usize {
		Rc::as_ptr(&self.0).cast::<()>() as usize
	}
}
impl Debug for Handler {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_tuple("Handler").field(&format_args!("{:#x}", self.id())).finish()
	}
}

/// A caller-owned cell the renderer writes the current DOM node of an element into.
///
/// It holds the node while the element is mounted and is cleared when the element is removed.
#[derive(Clone, Default)]
pub struct NodeRef(Rc<RefCell<Option<Box<dyn Any>>>>);
impl NodeRef {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Retrieves the current node, if it is set and of type `N`.
	#[must_use]
	pub fn get<N: Any + Clone>(&self) -> Option<N> {
		self.0.borrow().as_ref().and_then(|node| node.downcast_ref::<N>()).cloned()
	}

	#[must_use]
	pub fn is_set(&self) -> bool {
		self.0.borrow().is_some()
	}

	pub(crate) fn set<N: Any>(&self, node: N) {
		*self.0.borrow_mut() = Some(Box::new(node));
	}

	/// Clears the cell, but only if it still holds `node`.
	pub(crate) fn clear_if_current<N: Any + PartialEq>(&self, node: &N) {
		let mut current = self.0.borrow_mut();
		if current.as_ref().and_then(|current| current.downcast_ref::<N>()) == Some(node) {
			*current = None;
		}
	}

	#[must_use]
	pub fn ptr_eq(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.0, &other.0)
	}
}
impl Debug for NodeRef {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("NodeRef").field("is_set", &self.is_set()).finish()
	}
}

#[derive(Debug, Clone)]
pub enum PropValue {
	/// Removes the property, like `null` or `undefined` would.
	Null,
	Bool(bool),
	Number(f64),
	Str(Cow<'static, str>),
	Handler(Handler),
	Ref(NodeRef),
}

impl PropValue {
	/// Whether the host language would treat this value as false in a condition.
	#[must_use]
	pub fn is_falsy(&self) -> bool {
		match self {
			Self::Null | Self::Bool(false) => true,
			Self::Number(number) => *number == 0. || number.is_nan(),
			Self::Str(string) => string.is_empty(),
			Self::Bool(true) | Self::Handler(_) | Self::Ref(_) => false,
		}
	}

	/// The string form used for attributes. [`None`] where the attribute should be absent instead.
	#[must_use]
	pub fn to_attribute_value(&self) -> Option<Cow<'_, str>> {
		match self {
			Self::Null | Self::Handler(_) | Self::Ref(_) => None,
			Self::Bool(bool) => Some(if *bool { "true" } else { "false" }.into()),
			Self::Number(number) => Some(format_number(*number).into()),
			Self::Str(string) => Some(Cow::Borrowed(string)),
		}
	}
}

impl PartialEq for PropValue {
	fn eq(&self, other: &Self) -> bool {
		match (self, other) {
			(Self::Null, Self::Null) => true,
			(Self::Bool(a), Self::Bool(b)) => a == b,
			(Self::Number(a), Self::Number(b)) => a == b || (a.is_nan() && b.is_nan()),
			(Self::Str(a), Self::Str(b)) => a == b,
			(Self::Handler(a), Self::Handler(b)) => a.ptr_eq(b),
			(Self::Ref(a), Self::Ref(b)) => a.ptr_eq(b),
			_ => false,
		}
	}
}

impl From<&'static str> for PropValue {
	fn from(value: &'static str) -> Self {
		Self::Str(value.into())
	}
}
impl From<String> for PropValue {
	fn from(value: String) -> Self {
		Self::Str(value.into())
	}
}
impl From<bool> for PropValue {
	fn from(value: bool) -> Self {
		Self::Bool(value)
	}
}
macro_rules! prop_value_from_number {
	($($number:ty),*$(,)?) => {$(
		impl From<$number> for PropValue {
			#[allow(clippy::cast_lossless, clippy::cast_precision_loss)]
			fn from(value: $number) -> Self {
				Self::Number(value as f64)
			}
		}
	)*};
}
prop_value_from_number!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64);
impl From<Handler> for PropValue {
	fn from(value: Handler) -> Self {
		Self::Handler(value)
	}
}
impl From<NodeRef> for PropValue {
	fn from(value: NodeRef) -> Self {
		Self::Ref(value)
	}
}
impl<T: Into<PropValue>> From<Option<T>> for PropValue {
	fn from(value: Option<T>) -> Self {
		value.map_or(Self::Null, Into::into)
	}
}

/// An element's property bag. Insertion order is irrelevant.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Props(HashMap<Cow<'static, str>, PropValue>);
impl Props {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	#[must_use]
	pub fn with(mut self, name: impl Into<Cow<'static, str>>, value: impl Into<PropValue>) -> Self {
		self.insert(name, value);
		self
	}

	pub fn insert(&mut self, name: impl Into<Cow<'static, str>>, value: impl Into<PropValue>) -> Option<PropValue> {
		self.0.insert(name.into(), value.into())
	}

	pub fn remove(&mut self, name: &str) -> Option<PropValue> {
		self.0.remove(name)
	}

	#[must_use]
	pub fn get(&self, name: &str) -> Option<&PropValue> {
		self.0.get(name)
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &PropValue)> {
		self.0.iter().map(|(name, value)| (&**name, value))
	}

	#[must_use]
	pub fn key(&self) -> Option<Key> {
		self.get("key").and_then(Key::from_value)
	}

	#[must_use]
	pub fn node_ref(&self) -> Option<&NodeRef> {
		match self.get("ref") {
			Some(PropValue::Ref(node_ref)) => Some(node_ref),
			_ => None,
		}
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.0.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}

/// Builds [`Props`] from `name => value` pairs.
///
/// ```
/// use twig_dom::{props, PropValue};
///
/// let props = props! { "class" => "hi", "key" => 1 };
/// assert_eq!(props.get("class"), Some(&PropValue::Str("hi".into())));
/// ```
#[macro_export]
macro_rules! props {
	($($name:expr => $value:expr),*$(,)?) => {
		$crate::Props::new()$(.with($name, $value))*
	};
}

/// Un-normalized child input for [`h`].
#[derive(Debug, Clone)]
pub enum Child {
	Node(VNode),
	Text(String),
	List(Vec<Child>),
	/// `null`, `undefined` and booleans, which render nothing.
	Empty,
}

impl Child {
	/// Flattens this child into `out`, dropping [`Child::Empty`] and wrapping text.
	pub fn normalize_into(self, out: &mut Vec<VNode>) {
		match self {
			Self::Node(node) => out.push(node),
			Self::Text(text) => out.push(VNode::Text(text)),
			Self::List(children) => {
				for child in children {
					child.normalize_into(out)
				}
			}
			Self::Empty => (),
		}
	}

	#[must_use]
	pub fn normalize(self) -> Vec<VNode> {
		let mut out = Vec::new();
		self.normalize_into(&mut out);
		out
	}
}

impl From<VNode> for Child {
	fn from(node: VNode) -> Self {
		Self::Node(node)
	}
}
impl From<Element> for Child {
	fn from(element: Element) -> Self {
		Self::Node(VNode::Element(element))
	}
}
impl From<&str> for Child {
	fn from(text: &str) -> Self {
		Self::Text(text.to_owned())
	}
}
impl From<String> for Child {
	fn from(text: String) -> Self {
		Self::Text(text)
	}
}
impl From<bool> for Child {
	fn from(_: bool) -> Self {
		Self::Empty
	}
}
impl From<()> for Child {
	fn from((): ()) -> Self {
		Self::Empty
	}
}
macro_rules! child_from_number {
	($($number:ty),*$(,)?) => {$(
		impl From<$number> for Child {
			fn from(value: $number) -> Self {
				Self::Text(Text::from(value).0)
			}
		}
	)*};
}
child_from_number!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64);
impl<T: Into<Child>> From<Option<T>> for Child {
	fn from(child: Option<T>) -> Self {
		child.map_or(Self::Empty, Into::into)
	}
}
impl<T: Into<Child>> From<Vec<T>> for Child {
	fn from(children: Vec<T>) -> Self {
		Self::List(children.into_iter().map(Into::into).collect())
	}
}

/// Builds a `Vec<Child>` from heterogeneous children.
#[macro_export]
macro_rules! children {
	($($child:expr),*$(,)?) => {
		::std::vec![$($crate::Child::from($child)),*]
	};
}

/// Marker [`NodeType`] for fragments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fragment;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeType {
	Tag(Cow<'static, str>),
	Fragment,
}
impl From<&'static str> for NodeType {
	fn from(tag: &'static str) -> Self {
		Self::Tag(tag.into())
	}
}
impl From<String> for NodeType {
	fn from(tag: String) -> Self {
		Self::Tag(tag.into())
	}
}
impl From<Fragment> for NodeType {
	fn from(Fragment: Fragment) -> Self {
		Self::Fragment
	}
}

/// Constructs a [`VNode`] from a type, its properties and its children.
///
/// Children are flattened, [`Child::Empty`] is dropped and text is wrapped.
/// Key uniqueness is not checked here.
///
/// Fragments have no properties of their own, so `props` is ignored for them.
#[must_use]
pub fn h(r#type: impl Into<NodeType>, props: Props, children: Vec<Child>) -> VNode {
	let children = Child::List(children).normalize();
	match r#type.into() {
		NodeType::Tag(tag) => VNode::Element(Element { tag, props, children }),
		NodeType::Fragment => VNode::Fragment(children),
	}
}
