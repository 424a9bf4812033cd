//! Scope Management
//!
//! Binds stub configuration to the lifetime of a test (or nested subtest)
//! and restores it automatically when that scope ends.
//!
//! ## Stack discipline
//!
//! [`bind`] snapshots a layer *at bind time* and defers the restoration to
//! the scope. Cleanups run in reverse registration order, so a change made
//! in a child scope reverts to whatever the enclosing scope had configured,
//! not to the pristine pre-test state.
//!
//! ## Example
//!
//! ```
//! use doppel::{Layer, TestScope};
//! use std::sync::Arc;
//!
//! let layer: Arc<Layer<(), i32>> = Arc::new(Layer::new());
//! let test = TestScope::new("outer");
//! test.run("inner", |sub| {
//!     doppel::bind(sub, &layer);
//!     layer.push_result(7);
//!     assert!(layer.is_active());
//! });
//! assert!(!layer.is_active());
//! ```

use crate::layer::{Layer, LayerSnapshot};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Deferred action run when a scope ends.
pub type Cleanup = Box<dyn FnOnce() + Send + 'static>;

/// A test lifetime that can run deferred cleanups.
///
/// [`TestScope`] is the bundled implementation; harnesses with their own
/// notion of a test lifetime implement this trait to drive restoration.
pub trait Scope {
    /// Name used in log output.
    fn name(&self) -> &str;

    /// Register `cleanup` to run when the scope ends.
    ///
    /// Cleanups run last-registered-first, whether the scope ends normally
    /// or by unwinding.
    fn defer(&self, cleanup: Cleanup);
}

/// RAII test scope; deferred cleanups run when it is dropped.
pub struct TestScope {
    name: String,
    depth: usize,
    cleanups: Mutex<Vec<Cleanup>>,
}

impl std::fmt::Debug for TestScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestScope")
            .field("name", &self.name)
            .field("depth", &self.depth)
            .field("pending", &self.pending())
            .finish()
    }
}

impl TestScope {
    /// Create a top-level scope.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            depth: 0,
            cleanups: Mutex::new(Vec::new()),
        }
    }

    /// Create a nested scope named `parent/name`.
    ///
    /// The child must end before its parent for restorations to compose;
    /// [`TestScope::run`] enforces that ordering.
    #[must_use]
    pub fn child(&self, name: &str) -> Self {
        Self {
            name: format!("{}/{name}", self.name),
            depth: self.depth + 1,
            cleanups: Mutex::new(Vec::new()),
        }
    }

    /// Run `f` inside a child scope that ends as soon as `f` returns.
    ///
    /// If `f` panics the child's cleanups still run while unwinding.
    pub fn run<T, F>(&self, name: &str, f: F) -> T
    where
        F: FnOnce(&Self) -> T,
    {
        let child = self.child(name);
        tracing::debug!(scope = %child.name, "enter scope");
        f(&child)
    }

    /// Nesting depth; top-level scopes are depth 0.
    #[must_use]
    pub const fn depth(&self) -> usize {
        self.depth
    }

    /// Number of cleanups waiting to run.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.lock().len()
    }

    /// End the scope now, running its cleanups.
    pub fn close(self) {}

    fn lock(&self) -> MutexGuard<'_, Vec<Cleanup>> {
        self.cleanups.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn finish(&self) {
        // Cleanups may defer more work onto this scope; keep draining.
        loop {
            let batch = std::mem::take(&mut *self.lock());
            if batch.is_empty() {
                break;
            }
            tracing::debug!(scope = %self.name, cleanups = batch.len(), "exit scope");
            for cleanup in batch.into_iter().rev() {
                cleanup();
            }
        }
    }
}

impl Scope for TestScope {
    fn name(&self) -> &str {
        &self.name
    }

    fn defer(&self, cleanup: Cleanup) {
        self.lock().push(cleanup);
    }
}

impl Drop for TestScope {
    fn drop(&mut self) {
        self.finish();
    }
}

/// A saved layer configuration waiting to be put back.
pub struct ScopeBinding<C, R> {
    layer: Arc<Layer<C, R>>,
    snapshot: LayerSnapshot<R>,
}

impl<C, R> std::fmt::Debug for ScopeBinding<C, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopeBinding")
            .field("layer", &self.layer)
            .field("active", &self.snapshot.active)
            .field("queued", &self.snapshot.queue.len())
            .finish()
    }
}

impl<C, R: Clone> ScopeBinding<C, R> {
    /// Snapshot `layer` as it is right now.
    #[must_use]
    pub fn capture(layer: &Arc<Layer<C, R>>) -> Self {
        Self {
            layer: Arc::clone(layer),
            snapshot: layer.snapshot(),
        }
    }

    /// The configuration that [`ScopeBinding::restore`] will put back.
    #[must_use]
    pub const fn snapshot(&self) -> &LayerSnapshot<R> {
        &self.snapshot
    }

    /// Put the layer back exactly as captured, deactivating it if it was
    /// inactive at capture time.
    pub fn restore(self) {
        self.layer.restore(self.snapshot);
    }
}

/// Snapshot `layer` now and restore it when `scope` ends.
pub fn bind<S, C, R>(scope: &S, layer: &Arc<Layer<C, R>>)
where
    S: Scope + ?Sized,
    C: Send + 'static,
    R: Clone + Send + 'static,
{
    let binding = ScopeBinding::capture(layer);
    tracing::debug!(
        scope = scope.name(),
        was_active = binding.snapshot.active,
        "bound layer to scope"
    );
    scope.defer(Box::new(move || binding.restore()));
}
