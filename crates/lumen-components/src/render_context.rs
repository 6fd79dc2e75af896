//! RenderContext - The resource manager of the render in progress
//!
//! While an instance renders, its [`ResourceManager`] is the active render
//! context. Helpers called from deep inside `render` (reactive bindings in
//! particular) read it with [`get_render_context`] to register their cleanups
//! without threading the manager through every call.
//!
//! The context is a per-thread stack: rendering another instance synchronously
//! from inside a render pushes its manager and restores the outer one when the
//! inner render finishes.

use std::cell::RefCell;

use crate::resource_manager::ResourceManager;

thread_local! {
	static CONTEXT_STACK: RefCell<Vec<ResourceManager>> = const { RefCell::new(Vec::new()) };
}

/// Restores the previous render context when dropped.
#[must_use = "the render context is cleared as soon as the guard is dropped"]
pub struct RenderContextGuard {
	depth: usize,
}

impl Drop for RenderContextGuard {
	fn drop(&mut self) {
		CONTEXT_STACK.with(|stack| stack.borrow_mut().truncate(self.depth));
	}
}

/// Makes `manager` the active render context until the guard is dropped.
pub fn set_render_context(manager: &ResourceManager) -> RenderContextGuard {
	CONTEXT_STACK.with(|stack| {
		let mut stack = stack.borrow_mut();
		let depth = stack.len();
		stack.push(manager.clone());
		RenderContextGuard { depth }
	})
}

/// Returns the active render context, if a render is in progress.
pub fn get_render_context() -> Option<ResourceManager> {
	CONTEXT_STACK.with(|stack| stack.borrow().last().cloned())
}

/// Drops every active render context on this thread.
///
/// Outstanding guards become no-ops.
pub fn clear_render_context() {
	CONTEXT_STACK.with(|stack| stack.borrow_mut().clear());
}

/// Runs `f` with `manager` as the active render context.
pub fn with_render_context<R>(manager: &ResourceManager, f: impl FnOnce() -> R) -> R {
	let _guard = set_render_context(manager);
	f()
}
