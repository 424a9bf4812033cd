//! All-Layer Registry
//!
//! Process-wide table of all layers, keyed by `(type, method)`. An all layer
//! is created the first time it is configured and then lives until the
//! registry is reset; reading (call logs, invocation) never creates one.
//!
//! Tests that need a clean slate call [`reset`] (everything) or
//! [`reset_type`] (one target type) explicitly.

use crate::layer::Layer;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

/// Identity of one method of one target type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MethodKey {
    type_id: TypeId,
    type_name: &'static str,
    method: &'static str,
}

impl MethodKey {
    /// Key for `method` on the target type `T`.
    #[must_use]
    pub fn of<T: ?Sized + 'static>(method: &'static str) -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            method,
        }
    }

    /// Type identity of the target.
    #[must_use]
    pub const fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Fully qualified name of the target type.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Method name.
    #[must_use]
    pub const fn method(&self) -> &'static str {
        self.method
    }
}

impl std::fmt::Display for MethodKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}::{}", self.type_name, self.method)
    }
}

// The layer's own type is part of the slot so two mocks disagreeing about a
// method's record/result types can never alias each other's state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct Slot {
    key: MethodKey,
    layer: TypeId,
}

impl Slot {
    fn of<C: 'static, R: 'static>(key: MethodKey) -> Self {
        Self {
            key,
            layer: TypeId::of::<Layer<C, R>>(),
        }
    }
}

type Entry = Arc<dyn Any + Send + Sync>;

fn table() -> MutexGuard<'static, HashMap<Slot, Entry>> {
    static TABLE: OnceLock<Mutex<HashMap<Slot, Entry>>> = OnceLock::new();
    TABLE
        .get_or_init(|| Mutex::new(HashMap::new()))
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
}

/// Look up an existing all layer without creating it.
#[must_use]
pub fn find<C, R>(key: &MethodKey) -> Option<Arc<Layer<C, R>>>
where
    C: Send + 'static,
    R: Send + 'static,
{
    let entry = table().get(&Slot::of::<C, R>(*key)).cloned()?;
    entry.downcast::<Layer<C, R>>().ok()
}

/// Fetch the all layer for `key`, creating it on first use.
pub fn get_or_create<C, R>(key: &MethodKey) -> Arc<Layer<C, R>>
where
    C: Send + 'static,
    R: Send + 'static,
{
    let slot = Slot::of::<C, R>(*key);
    let mut table = table();
    if let Some(layer) = table
        .get(&slot)
        .and_then(|entry| Arc::clone(entry).downcast::<Layer<C, R>>().ok())
    {
        return layer;
    }
    let layer = Arc::new(Layer::new());
    let entry: Entry = layer.clone();
    table.insert(slot, entry);
    tracing::debug!(method = %key, "created all layer");
    layer
}

/// Check whether an all layer exists for `key`, whatever its types.
#[must_use]
pub fn contains(key: &MethodKey) -> bool {
    table().keys().any(|slot| slot.key == *key)
}

/// Number of all layers currently registered.
#[must_use]
pub fn len() -> usize {
    table().len()
}

/// Check whether no all layer is registered.
#[must_use]
pub fn is_empty() -> bool {
    table().is_empty()
}

/// Drop every all layer of the target type `T`.
///
/// Returns the number of layers removed.
pub fn reset_type<T: ?Sized + 'static>() -> usize {
    let type_id = TypeId::of::<T>();
    let mut table = table();
    let before = table.len();
    table.retain(|slot, _| slot.key.type_id != type_id);
    let removed = before - table.len();
    tracing::debug!(
        target_type = std::any::type_name::<T>(),
        removed,
        "reset all layers for type"
    );
    removed
}

/// Drop every all layer, returning the registry to empty.
pub fn reset() {
    let mut table = table();
    let removed = table.len();
    table.clear();
    tracing::debug!(removed, "reset all-layer registry");
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    // Each test keys on its own marker type so tests can run in parallel
    // against the shared table.
    struct FindMarker;
    struct CreateMarker;
    struct ResetTypeMarker;
    struct OtherTypeMarker;
    struct ShapeMarker;

    #[test]
    fn test_method_key_identity() {
        let a = MethodKey::of::<FindMarker>("simple");
        let b = MethodKey::of::<FindMarker>("simple");
        let c = MethodKey::of::<FindMarker>("other");
        let d = MethodKey::of::<CreateMarker>("simple");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
        assert_eq!(a.method(), "simple");
        assert!(a.type_name().ends_with("FindMarker"));
        assert!(a.to_string().ends_with("FindMarker::simple"));
    }

    #[test]
    fn test_find_does_not_create() {
        let key = MethodKey::of::<FindMarker>("read");
        assert!(find::<(), ()>(&key).is_none());
        assert!(!contains(&key));
    }

    #[test]
    fn test_get_or_create_returns_same_layer() {
        let key = MethodKey::of::<CreateMarker>("write");
        let first = get_or_create::<u8, i32>(&key);
        first.push_result(4);
        let second = get_or_create::<u8, i32>(&key);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.pending(), 1);
        assert!(find::<u8, i32>(&key).is_some());
        assert!(contains(&key));
    }

    #[test]
    fn test_layer_types_are_part_of_identity() {
        let key = MethodKey::of::<ShapeMarker>("value");
        let narrow = get_or_create::<u8, u8>(&key);
        let wide = get_or_create::<u64, u64>(&key);
        narrow.stub();
        assert!(!wide.is_active());
        assert!(find::<u8, u8>(&key).is_some());
        assert!(find::<u16, u16>(&key).is_none());
    }

    #[test]
    fn test_reset_type_only_touches_that_type() {
        let doomed = MethodKey::of::<ResetTypeMarker>("a");
        let doomed_too = MethodKey::of::<ResetTypeMarker>("b");
        let kept = MethodKey::of::<OtherTypeMarker>("a");
        let _ = get_or_create::<(), ()>(&doomed);
        let _ = get_or_create::<(), ()>(&doomed_too);
        let _ = get_or_create::<(), ()>(&kept);

        assert_eq!(reset_type::<ResetTypeMarker>(), 2);
        assert!(!contains(&doomed));
        assert!(!contains(&doomed_too));
        assert!(contains(&kept));
        assert!(!is_empty());
    }
}
