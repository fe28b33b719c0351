//! Feed types and the lazy, one-shot streaming-iterator contract.
//!
//! A [`FeedType`] is an opaque label: two feed types are either the same
//! shape of data or they are not, full stop. What actually flows through a
//! pipe at runtime is a [`FeedStream`] — a boxed, one-shot `Iterator` of
//! [`FeedItem`] trait objects. Concrete check/source/transform authors agree
//! out of band on which Rust type backs a given `FeedType` and downcast
//! accordingly; the planner itself never looks inside an item.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// An opaque label for the shape of a feed element (e.g. "a single version
/// entry", "all versions of a package"). Compared only by equality.
#[derive(Clone, Eq)]
pub struct FeedType(Arc<str>);

impl FeedType {
    /// Builds a new feed type from its label.
    pub fn new(label: impl Into<Arc<str>>) -> Self {
        FeedType(label.into())
    }

    /// The label this feed type was constructed with.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl PartialEq for FeedType {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl std::hash::Hash for FeedType {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl Ord for FeedType {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.cmp(&other.0)
    }
}

impl PartialOrd for FeedType {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Debug for FeedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FeedType({:?})", self.0)
    }
}

impl fmt::Display for FeedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FeedType {
    fn from(value: &str) -> Self {
        FeedType::new(value)
    }
}

impl From<String> for FeedType {
    fn from(value: String) -> Self {
        FeedType::new(value)
    }
}

/// An element flowing through a pipe.
///
/// This is deliberately a thin marker over [`Any`]: the planner only moves
/// these between sources, transforms and sinks, never inspects them. Check
/// and transform authors downcast via [`FeedItem::as_any`] to recover the
/// concrete type they know belongs to a given [`FeedType`].
pub trait FeedItem: Any + Send {
    /// Exposes the concrete element for downcasting.
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any + Send> FeedItem for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A lazy, finite, one-shot sequence of feed elements.
///
/// Restartability is not required and must not be relied on: once drained,
/// a `FeedStream` is exhausted, matching the "explicit iterator contract"
/// this crate uses in place of the generators the original implementation
/// streamed records through.
pub type FeedStream = Box<dyn Iterator<Item = Box<dyn FeedItem>> + Send>;

/// Downcasts a feed item, panicking with a descriptive message on mismatch.
///
/// A mismatch here means a transform or sink was wired to the wrong
/// `FeedType` for the Rust type it expects — a planner/wiring bug, not a
/// recoverable runtime condition.
pub fn downcast_feed_item<T: 'static>(item: &dyn FeedItem) -> &T {
    item.as_any().downcast_ref::<T>().unwrap_or_else(|| {
        panic!(
            "feed item type mismatch: expected {}",
            std::any::type_name::<T>()
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_is_by_label_only() {
        assert_eq!(FeedType::new("a"), FeedType::new("a"));
        assert_ne!(FeedType::new("a"), FeedType::new("b"));
    }

    #[test]
    fn downcast_recovers_concrete_type() {
        let item: Box<dyn FeedItem> = Box::new(42_i32);
        assert_eq!(*downcast_feed_item::<i32>(item.as_ref()), 42);
    }

    #[test]
    #[should_panic(expected = "feed item type mismatch")]
    fn downcast_mismatch_panics() {
        let item: Box<dyn FeedItem> = Box::new(42_i32);
        let _ = downcast_feed_item::<String>(item.as_ref());
    }
}
