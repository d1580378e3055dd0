//! # IDs
//! Live surface objects need handles that survive reordering, and nothing else -
//! they are never serialized (snapshots address objects by list order). The
//! `UniqueId<T>` type hands out process-unique values namespaced by the type `T`.
//!
//! IDs from one execution are meaningless in another. Order of IDs is not guaranteed.

// One counter for every namespace. IDs are unique across namespaces too,
// which costs nothing and removes a class of mixups in logs.
static NEXT_ID: std::sync::atomic::AtomicU64 = std::sync::atomic::AtomicU64::new(1);

/// ID guaranteed unique within this execution of the program.
pub struct UniqueId<T: std::any::Any> {
    id: std::num::NonZeroU64,
    // Namespace marker
    _phantom: std::marker::PhantomData<T>,
}
impl<T: std::any::Any> Clone for UniqueId<T> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<T: std::any::Any> Copy for UniqueId<T> {}
impl<T: std::any::Any> std::cmp::PartialEq<UniqueId<T>> for UniqueId<T> {
    fn eq(&self, other: &UniqueId<T>) -> bool {
        // Namespace already checked at compile time.
        self.id == other.id
    }
}
impl<T: std::any::Any> std::cmp::Eq for UniqueId<T> {}

// Safety - it's just a u64. If T is !Send or !Sync that would be
// carried over to the ID even though no T is ever stored.
unsafe impl<T: std::any::Any> Send for UniqueId<T> {}
unsafe impl<T: std::any::Any> Sync for UniqueId<T> {}

impl<T: std::any::Any> std::hash::Hash for UniqueId<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<T: std::any::Any> UniqueId<T> {
    /// Get the raw numeric value of this ID.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id.get()
    }
    /// Allocate the next ID.
    #[must_use]
    pub fn next() -> Self {
        let id = NEXT_ID.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        let Some(id) = std::num::NonZeroU64::new(id) else {
            // Counter wrapped after u64::MAX allocations. Global state is
            // unfixably borked - uniqueness can no longer be promised.
            log::error!("{} ID overflow! Aborting!", std::any::type_name::<T>());
            log::logger().flush();
            std::process::abort();
        };
        Self {
            id,
            _phantom: std::marker::PhantomData,
        }
    }
}
impl<T: std::any::Any> Default for UniqueId<T> {
    fn default() -> Self {
        Self::next()
    }
}
impl<T: std::any::Any> std::fmt::Display for UniqueId<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Unwrap OK - rsplit always yields at least one element, even for empty strings.
        write!(
            f,
            "{}#{}",
            std::any::type_name::<T>().rsplit("::").next().unwrap(),
            self.id
        )
    }
}
impl<T: std::any::Any> std::fmt::Debug for UniqueId<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        <UniqueId<T> as std::fmt::Display>::fmt(self, f)
    }
}
