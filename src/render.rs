use crate::{
	diff::{Differ, Mounted},
	Child, Dom,
};
use core::cell::RefCell;
use tracing::{info, instrument, trace};

/// What was last rendered into a container.
struct MountRecord<N> {
	container: N,
	children: Vec<Mounted<N>>,
}

/// Renders [`VNode`](`crate::VNode`) trees into containers of a [`Dom`] host.
///
/// Each container has a mount record, created by its first [`render`](`Renderer::render`),
/// replaced by each further one and discarded only through [`unmount`](`Renderer::unmount`)
/// (or by dropping the [`Renderer`]).
///
/// # Re-entrancy
///
/// The mount records are borrowed only briefly at the start and end of a render pass,
/// so event handlers may call [`render`](`Renderer::render`) again, including for the same container.
/// Overlapping passes over the *same* container leave it in an unspecified (but memory-safe) state.
pub struct Renderer<D: Dom> {
	dom: D,
	mounts: RefCell<Vec<MountRecord<D::Node>>>,
}

impl<D: Dom> Renderer<D> {
	#[must_use]
	pub fn new(dom: D) -> Self {
		Self {
			dom,
			mounts: RefCell::default(),
		}
	}

	pub fn dom(&self) -> &D {
		&self.dom
	}

	/// Synchronizes the children of `container` with `vnode`.
	///
	/// `vnode` may also be a primitive, which renders as a single text node, a list, or nothing at all.
	/// Once this returns, the DOM fully reflects `vnode`.
	///
	/// # Preconditions
	///
	/// Sibling keys must be unique. Duplicates lead to an unspecified (but consistent and memory-safe) DOM.
	/// Nodes in `container` that weren't rendered by this [`Renderer`] must not be placed between rendered ones.
	#[instrument(skip(self, vnode))]
	pub fn render(&self, vnode: impl Into<Child>, container: &D::Node) {
		let previous = self.take_record(container);
		if previous.is_none() {
			trace!("First render into this container.");
		}

		let namespace = self.dom.namespace(container);
		let children = Differ::new(&self.dom).diff_children(container, namespace, previous.unwrap_or_default(), vnode.into().normalize());

		{
			let mut mounts = self.mounts.borrow_mut();
			// A re-entrant pass may have stored a record in the meantime. The outer pass wins.
			mounts.retain(|record| &record.container != container);
			mounts.push(MountRecord {
				container: container.clone(),
				children,
			});
			info!("Mounted container count: {}", mounts.len());
		}

		self.dom.flush();
	}

	/// Removes everything rendered into `container` and discards its mount record.
	///
	/// Refs of removed elements are cleared and their event listeners are removed.
	/// Returns whether there was a mount record.
	#[instrument(skip(self))]
	pub fn unmount(&self, container: &D::Node) -> bool {
		match self.take_record(container) {
			Some(children) => {
				Differ::new(&self.dom).unmount_all(children);
				self.dom.flush();
				true
			}
			None => false,
		}
	}

	/// Discards the mount record of `container` without touching the DOM.
	///
	/// The next [`render`](`Renderer::render`) into `container` starts from scratch,
	/// so whatever was rendered before should be gone by then.
	/// Refs of the forgotten elements keep their nodes.
	///
	/// Returns whether there was a mount record.
	pub fn forget(&self, container: &D::Node) -> bool {
		let forgotten = self.take_record(container).is_some();
		trace!(forgotten, "Forgetting container.");
		forgotten
	}

	#[must_use]
	pub fn is_mounted(&self, container: &D::Node) -> bool {
		self.mounts.borrow().iter().any(|record| &record.container == container)
	}

	fn take_record(&self, container: &D::Node) -> Option<Vec<Mounted<D::Node>>> {
		let mut mounts = self.mounts.borrow_mut();
		let i = mounts.iter().position(|record| &record.container == container)?;
		Some(mounts.swap_remove(i).children)
	}
}
