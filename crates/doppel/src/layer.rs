//! Stub Layers
//!
//! A [`Layer`] is one scope of stub state for a single method: the
//! stub-active flag, the FIFO queue of pending result tuples, the sticky
//! tuple returned once the queue drains, and the call log.
//!
//! Every generated method owns one instance layer; the all layer for the
//! same method lives in the process-wide [`registry`](crate::registry).
//!
//! ## Locking
//!
//! The whole state sits behind one mutex. [`Layer::intercept`] dequeues and
//! appends the call record under a single lock acquisition, so concurrent
//! callers never observe a torn queue/log pair.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Outcome of offering a call to a layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intercept<C, R> {
    /// The layer was stub-active and produced a result.
    Returned(R),
    /// The layer was inactive; the call record is handed back untouched.
    PassThrough(C),
}

/// Saved copy of a layer's configuration.
///
/// The call log is not part of a snapshot: restoring a layer never rewrites
/// history that a test may still want to assert on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerSnapshot<R> {
    /// Whether the layer was stub-active
    pub active: bool,
    /// Pending result tuples, oldest first
    pub queue: VecDeque<R>,
    /// Last dequeued tuple
    pub sticky: Option<R>,
}

impl<R> LayerSnapshot<R> {
    /// Snapshot of a layer that was never configured.
    #[must_use]
    pub const fn inactive() -> Self {
        Self {
            active: false,
            queue: VecDeque::new(),
            sticky: None,
        }
    }
}

struct LayerState<C, R> {
    active: bool,
    queue: VecDeque<R>,
    sticky: Option<R>,
    calls: Vec<C>,
}

/// Stub state for one method in one scope (instance or all).
pub struct Layer<C, R> {
    state: Mutex<LayerState<C, R>>,
}

impl<C, R> Default for Layer<C, R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C, R> std::fmt::Debug for Layer<C, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("Layer")
            .field("active", &state.active)
            .field("pending", &state.queue.len())
            .field("has_sticky", &state.sticky.is_some())
            .field("calls", &state.calls.len())
            .finish()
    }
}

impl<C, R> Layer<C, R> {
    /// Create an inactive layer (calls pass through).
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: Mutex::new(LayerState {
                active: false,
                queue: VecDeque::new(),
                sticky: None,
                calls: Vec::new(),
            }),
        }
    }

    /// Create a layer that is stub-active from the start.
    #[must_use]
    pub const fn new_active() -> Self {
        Self {
            state: Mutex::new(LayerState {
                active: true,
                queue: VecDeque::new(),
                sticky: None,
                calls: Vec::new(),
            }),
        }
    }

    // A test that panicked while holding the lock must not wedge every
    // other test sharing this layer.
    fn lock(&self) -> MutexGuard<'_, LayerState<C, R>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Check whether calls are currently intercepted.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.lock().active
    }

    /// Enter stub mode, discarding queued and sticky tuples.
    ///
    /// The next intercepted call returns the method's default result.
    pub fn stub(&self) {
        let mut state = self.lock();
        state.active = true;
        state.queue.clear();
        state.sticky = None;
    }

    /// Append a result tuple to the queue and enter stub mode.
    pub fn push_result(&self, result: R) {
        let mut state = self.lock();
        state.active = true;
        state.queue.push_back(result);
    }

    /// Leave stub mode; queued and sticky tuples are dropped.
    pub fn deactivate(&self) {
        let mut state = self.lock();
        state.active = false;
        state.queue.clear();
        state.sticky = None;
    }

    /// Number of tuples still waiting in the queue.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.lock().queue.len()
    }

    /// Number of recorded calls.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.lock().calls.len()
    }

    /// Clear the call log.
    pub fn reset_calls(&self) {
        self.lock().calls.clear();
    }

    /// Offer a call to this layer.
    ///
    /// When stub-active, the next queued tuple is returned (falling back to
    /// the sticky tuple, then to `default`) and the call is appended to the
    /// log, both under one lock. When inactive the call is handed back and
    /// nothing is recorded.
    pub fn intercept<F>(&self, call: C, default: F) -> Intercept<C, R>
    where
        R: Clone,
        F: FnOnce() -> R,
    {
        let mut state = self.lock();
        if !state.active {
            return Intercept::PassThrough(call);
        }
        let result = match state.queue.pop_front() {
            Some(next) => {
                state.sticky = Some(next.clone());
                next
            }
            None => state.sticky.clone().unwrap_or_else(default),
        };
        state.calls.push(call);
        Intercept::Returned(result)
    }

    /// Copy of the call log, oldest first.
    #[must_use]
    pub fn calls(&self) -> Vec<C>
    where
        C: Clone,
    {
        self.lock().calls.clone()
    }

    /// Capture the current configuration.
    #[must_use]
    pub fn snapshot(&self) -> LayerSnapshot<R>
    where
        R: Clone,
    {
        let state = self.lock();
        LayerSnapshot {
            active: state.active,
            queue: state.queue.clone(),
            sticky: state.sticky.clone(),
        }
    }

    /// Put the configuration back exactly as captured.
    pub fn restore(&self, snapshot: LayerSnapshot<R>) {
        let mut state = self.lock();
        state.active = snapshot.active;
        state.queue = snapshot.queue;
        state.sticky = snapshot.sticky;
    }
}
