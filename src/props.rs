//! Classification and application of element properties.

use crate::{
	dom::{loggable, Dom, Patcher},
	PropValue, Props,
};
use std::borrow::Cow;
use tracing::{trace_span, warn};

/// How a property reaches the DOM.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropKind<'a> {
	/// `key`, `ref` and `children`, which are consumed by the renderer itself.
	Structural,
	/// An event listener for the lower-cased event name.
	Listener { event: Cow<'a, str> },
	/// `class`/`className`, which is removed rather than emptied when falsy.
	Class,
	/// `checked` and `value`, set as a live property where the element has one.
	Property,
	Attribute,
}

/// Decides how the property `name` with `value` is applied.
#[must_use]
pub fn classify<'a>(name: &'a str, value: &PropValue) -> PropKind<'a> {
	match name {
		"key" | "ref" | "children" => PropKind::Structural,
		"class" | "className" => PropKind::Class,
		"checked" | "value" => PropKind::Property,
		_ => match event_name(name) {
			Some(event) => PropKind::Listener { event },
			None if matches!(value, PropValue::Handler(_)) => PropKind::Listener {
				event: name.strip_prefix("on").unwrap_or(name).to_ascii_lowercase().into(),
			},
			None => PropKind::Attribute,
		},
	}
}

/// `onClick` → `click`. [`None`] unless `name` is `on` followed by an upper-case letter.
fn event_name(name: &str) -> Option<Cow<'_, str>> {
	let event = name.strip_prefix("on")?;
	if event.starts_with(|c: char| c.is_ascii_uppercase()) {
		Some(if event.bytes().any(|b| b.is_ascii_uppercase()) {
			event.to_ascii_lowercase().into()
		} else {
			event.into()
		})
	} else {
		None
	}
}

/// The element a set of properties is applied to.
pub(crate) struct Target<'a, D: Dom> {
	pub element: &'a D::Node,
	pub tag: &'a str,
	/// `<input type="password">` never reflects its value into an attribute.
	pub is_password: bool,
}

impl<'a, D: Dom> Target<'a, D> {
	pub fn new(element: &'a D::Node, tag: &'a str, props: &Props) -> Self {
		let is_password = tag.eq_ignore_ascii_case("input") && matches!(props.get("type"), Some(PropValue::Str(r#type)) if r#type.eq_ignore_ascii_case("password"));
		Self { element, tag, is_password }
	}
}

/// Applies the symmetric difference between `old` and `new` to the target element.
pub(crate) fn patch_props<D: Dom>(patcher: &Patcher<D>, target: &Target<D>, old: &Props, new: &Props) {
	for (name, old_value) in old.iter() {
		if new.get(name).is_none() {
			retract(patcher, target, name, old_value)
		}
	}

	for (name, new_value) in new.iter() {
		let old_value = old.get(name);
		if old_value == Some(new_value) {
			continue;
		}

		let span = trace_span!("Patching property", name, tag = target.tag);
		let _enter = span.enter();
		if let Some(old_value) = old_value {
			let old_kind = classify(name, old_value);
			if matches!(old_kind, PropKind::Listener { .. }) || old_kind != classify(name, new_value) {
				retract(patcher, target, name, old_value)
			}
		}
		apply(patcher, target, name, new_value)
	}
}

fn apply<D: Dom>(patcher: &Patcher<D>, target: &Target<D>, name: &str, value: &PropValue) {
	let element = target.element;
	match classify(name, value) {
		PropKind::Structural => (),
		PropKind::Listener { event } => match value {
			PropValue::Handler(handler) => patcher.add_listener(element, &event, handler),
			PropValue::Null => (),
			PropValue::Str(string) => warn!("Event listener property {:?} has string value {:?}. Nothing is bound.", name, loggable(string)),
			_ => warn!("Event listener property {:?} has a non-handler value. Nothing is bound.", name),
		},
		PropKind::Class => {
			if value.is_falsy() {
				patcher.remove_attribute(element, "class")
			} else if let Some(class) = value.to_attribute_value() {
				patcher.set_attribute(element, "class", &class)
			}
		}
		PropKind::Property => {
			if (name == "value" && target.is_password) || patcher.has_property(element, name) {
				patcher.set_property(element, name, value)
			} else {
				set_or_remove_attribute(patcher, element, name, value)
			}
		}
		PropKind::Attribute => set_or_remove_attribute(patcher, element, name, value),
	}
}

/// Undoes a property that is no longer present, or whose classification changed.
fn retract<D: Dom>(patcher: &Patcher<D>, target: &Target<D>, name: &str, old_value: &PropValue) {
	let element = target.element;
	match classify(name, old_value) {
		PropKind::Structural => (),
		PropKind::Listener { event } => {
			if let PropValue::Handler(handler) = old_value {
				patcher.remove_listener(element, &event, handler)
			}
		}
		PropKind::Class => patcher.remove_attribute(element, "class"),
		PropKind::Property => {
			if (name == "value" && target.is_password) || patcher.has_property(element, name) {
				patcher.set_property(element, name, &property_default(name))
			}
			if !target.is_password || name != "value" {
				patcher.remove_attribute(element, name)
			}
		}
		PropKind::Attribute => patcher.remove_attribute(element, name),
	}
}

fn set_or_remove_attribute<D: Dom>(patcher: &Patcher<D>, element: &D::Node, name: &str, value: &PropValue) {
	match value.to_attribute_value() {
		Some(string) => patcher.set_attribute(element, name, &string),
		None => patcher.remove_attribute(element, name),
	}
}

fn property_default(name: &str) -> PropValue {
	match name {
		"checked" => PropValue::Bool(false),
		_ => PropValue::Str("".into()),
	}
}
