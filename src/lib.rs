#![doc(html_root_url = "https://docs.rs/twig-dom/0.0.1")]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

#[cfg(doctest)]
pub mod readme {
	doc_comment::doctest!("../README.md");
}

mod diff;
pub mod dom;
pub mod props;
mod rc_hash_map;
mod render;
pub mod tags;
pub mod vnode;
pub mod web;

pub use crate::{
	dom::Dom,
	render::Renderer,
	vnode::{h, Child, Element, Fragment, Handler, Key, NodeRef, NodeType, PropValue, Props, VNode},
};
