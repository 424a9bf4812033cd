//! Per-Method Mock Control
//!
//! [`MethodMock`] is the runtime contract every generated method forwards
//! through. It owns the method's instance layer and knows the key of the
//! method's all layer in the [`registry`](crate::registry).
//!
//! ## Invocation order
//!
//! 1. Instance layer stub-active: intercept there.
//! 2. Otherwise all layer stub-active: intercept there.
//! 3. Otherwise call the real implementation; nothing is recorded.
//!
//! Methods whose type declares them directly have no real implementation to
//! fall back to. They are built with [`MethodMock::without_delegate`], which
//! keeps the instance layer stub-active for the whole life of the double.

use crate::layer::{Intercept, Layer};
use crate::registry::{self, MethodKey};
use crate::scope::{self, Scope};
use std::sync::Arc;

/// Stub controls and call dispatch for one method of one double.
///
/// `C` is the generated call-record type, `R` the method's result tuple.
pub struct MethodMock<C, R> {
    key: MethodKey,
    instance: Arc<Layer<C, R>>,
    default: fn() -> R,
    delegated: bool,
}

impl<C, R> std::fmt::Debug for MethodMock<C, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MethodMock")
            .field("key", &self.key)
            .field("instance", &self.instance)
            .field("delegated", &self.delegated)
            .finish()
    }
}

impl<C, R> MethodMock<C, R>
where
    C: Send + 'static,
    R: Clone + Send + 'static,
{
    /// Mock for a method with a real implementation to delegate to.
    ///
    /// `default` produces the zero-valued result returned by a stubbed call
    /// when nothing has been queued.
    #[must_use]
    pub fn new(key: MethodKey, default: fn() -> R) -> Self {
        Self {
            key,
            instance: Arc::new(Layer::new()),
            default,
            delegated: true,
        }
    }

    /// Mock for a method with no delegate: always intercepted.
    #[must_use]
    pub fn without_delegate(key: MethodKey, default: fn() -> R) -> Self {
        Self {
            key,
            instance: Arc::new(Layer::new_active()),
            default,
            delegated: false,
        }
    }

    /// Registry key of this method.
    #[must_use]
    pub const fn key(&self) -> &MethodKey {
        &self.key
    }

    /// Whether calls can fall through to a real implementation.
    #[must_use]
    pub const fn has_delegate(&self) -> bool {
        self.delegated
    }

    /// The instance layer, for binding to custom scopes.
    #[must_use]
    pub const fn instance_layer(&self) -> &Arc<Layer<C, R>> {
        &self.instance
    }

    // ---------------------------------------------------------------------
    // Instance layer
    // ---------------------------------------------------------------------

    /// Intercept calls on this instance, returning defaults.
    ///
    /// Discards anything queued earlier.
    pub fn stub(&self) {
        tracing::debug!(method = %self.key, "stub");
        self.instance.stub();
    }

    /// Queue a result for this instance; intercepts calls from now on.
    pub fn return_values(&self, result: R) {
        tracing::debug!(method = %self.key, "queue result");
        self.instance.push_result(result);
    }

    /// Stop intercepting on this instance.
    ///
    /// Without a delegate there is nothing to pass through to, so the layer
    /// is re-armed as a fresh stub instead.
    pub fn unstub(&self) {
        if self.delegated {
            self.instance.deactivate();
        } else {
            self.instance.stub();
        }
    }

    /// Calls intercepted by the instance layer, oldest first.
    #[must_use]
    pub fn calls(&self) -> Vec<C>
    where
        C: Clone,
    {
        self.instance.calls()
    }

    /// Clear the instance call log.
    pub fn reset_calls(&self) {
        self.instance.reset_calls();
    }

    /// Revert instance configuration when `scope` ends.
    pub fn bind_to<S: Scope + ?Sized>(&self, scope: &S) {
        scope::bind(scope, &self.instance);
    }

    // ---------------------------------------------------------------------
    // All layer
    // ---------------------------------------------------------------------

    /// Intercept calls on every instance of the type until `scope` ends.
    pub fn stub_all<S: Scope + ?Sized>(&self, scope: &S) {
        let all = self.all_layer(scope);
        tracing::debug!(method = %self.key, scope = scope.name(), "stub all");
        all.stub();
    }

    /// Queue a result for every instance of the type until `scope` ends.
    pub fn return_all<S: Scope + ?Sized>(&self, scope: &S, result: R) {
        self.do_all(scope, Some(result));
    }

    /// Queue `result` on the all layer, or with `None` switch the all layer
    /// back to pass-through, until `scope` ends.
    pub fn do_all<S: Scope + ?Sized>(&self, scope: &S, result: Option<R>) {
        let all = self.all_layer(scope);
        match result {
            Some(result) => {
                tracing::debug!(method = %self.key, scope = scope.name(), "queue result for all");
                all.push_result(result);
            }
            None => {
                tracing::debug!(method = %self.key, scope = scope.name(), "unstub all");
                all.deactivate();
            }
        }
    }

    /// Calls intercepted by the all layer across every instance.
    #[must_use]
    pub fn all_calls(&self) -> Vec<C>
    where
        C: Clone,
    {
        registry::find::<C, R>(&self.key)
            .map(|all| all.calls())
            .unwrap_or_default()
    }

    /// Clear the all-layer call log.
    pub fn reset_all_calls(&self) {
        if let Some(all) = registry::find::<C, R>(&self.key) {
            all.reset_calls();
        }
    }

    fn all_layer<S: Scope + ?Sized>(&self, scope: &S) -> Arc<Layer<C, R>> {
        let all = registry::get_or_create::<C, R>(&self.key);
        scope::bind(scope, &all);
        all
    }

    // ---------------------------------------------------------------------
    // Dispatch
    // ---------------------------------------------------------------------

    /// Dispatch one call.
    ///
    /// `call` is the record of this invocation; `delegate` receives it back
    /// when neither layer intercepts and performs the real call.
    pub fn invoke<F>(&self, call: C, delegate: F) -> R
    where
        F: FnOnce(C) -> R,
    {
        match self.intercept(call) {
            Intercept::Returned(result) => result,
            Intercept::PassThrough(call) => delegate(call),
        }
    }

    /// Dispatch a call for a method without a delegate.
    pub fn invoke_stubbed(&self, call: C) -> R {
        match self.intercept(call) {
            Intercept::Returned(result) => result,
            // Unreachable while the instance layer stays armed; a default is
            // the only value such a method can produce.
            Intercept::PassThrough(_) => (self.default)(),
        }
    }

    fn intercept(&self, call: C) -> Intercept<C, R> {
        let call = match self.instance.intercept(call, self.default) {
            Intercept::Returned(result) => {
                tracing::trace!(method = %self.key, layer = "instance", "intercepted");
                return Intercept::Returned(result);
            }
            Intercept::PassThrough(call) => call,
        };
        let Some(all) = registry::find::<C, R>(&self.key) else {
            return Intercept::PassThrough(call);
        };
        let outcome = all.intercept(call, self.default);
        if matches!(outcome, Intercept::Returned(_)) {
            tracing::trace!(method = %self.key, layer = "all", "intercepted");
        }
        outcome
    }
}
