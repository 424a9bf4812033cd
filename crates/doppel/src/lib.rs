//! Doppel: runtime for generated test doubles.
//!
//! A generated double wraps a real value and forwards every method through a
//! [`MethodMock`]. Each method can be configured at two levels:
//!
//! - **Instance layer**: affects one double only.
//! - **All layer**: affects every double of the same target type, kept in the
//!   process-wide [`registry`] and always tied to a [`Scope`].
//!
//! When a layer is stub-active, calls are recorded and answered from a FIFO
//! queue of result tuples. The last dequeued tuple is sticky. An empty queue
//! with no sticky tuple yields the method's default result.
//!
//! ```
//! use doppel::{MethodKey, MethodMock, TestScope};
//!
//! struct Clock;
//!
//! let now: MethodMock<(), u64> = MethodMock::new(MethodKey::of::<Clock>("now"), || 0);
//! let real = |()| 1_700_000_000;
//!
//! assert_eq!(now.invoke((), real), 1_700_000_000);
//!
//! let test = TestScope::new("frozen_clock");
//! now.return_all(&test, 5);
//! assert_eq!(now.invoke((), real), 5);
//! assert_eq!(now.all_calls().len(), 1);
//! drop(test);
//!
//! assert_eq!(now.invoke((), real), 1_700_000_000);
//! ```

#![warn(missing_docs)]

mod layer;
mod method;
pub mod registry;
mod scope;

pub use layer::{Intercept, Layer, LayerSnapshot};
pub use method::MethodMock;
pub use registry::MethodKey;
pub use scope::{bind, Cleanup, Scope, ScopeBinding, TestScope};
