//! The external contracts the planner consumes (`spec.md` §6).
//!
//! Sources, transforms and sinks are supplied by the caller already
//! constructed; the planner only ever reads their `feed_type`/`scope`/`cost`
//! attributes and, at instantiation time, calls their factory operations.

use std::collections::HashMap;
use std::sync::Arc;

use crate::feed::{FeedStream, FeedType};
use crate::reporter::Reporter;
use crate::scope::Scope;

/// Origin of a lazy element sequence.
pub trait Source: Send + Sync {
    /// The shape of the elements this source yields.
    fn feed_type(&self) -> FeedType;
    /// The generality level at which this source yields elements.
    fn scope(&self) -> Scope;
    /// Non-negative cost of driving a pipe from this source.
    fn cost(&self) -> u32;
    /// Produces the lazy, one-shot sequence of elements.
    fn feed(&self) -> FeedStream;
}

/// A single typed conversion a [`Transform`] can realize.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TransformEdge {
    /// The feed type consumed.
    pub src: FeedType,
    /// The feed type produced.
    pub dst: FeedType,
    /// The lowest scope at which this conversion is legal.
    pub min_scope: Scope,
    /// Non-negative cost of applying this conversion once.
    pub cost: u32,
}

impl TransformEdge {
    /// Convenience constructor.
    pub fn new(src: impl Into<FeedType>, dst: impl Into<FeedType>, min_scope: Scope, cost: u32) -> Self {
        TransformEdge {
            src: src.into(),
            dst: dst.into(),
            min_scope,
            cost,
        }
    }
}

/// A typed conversion from one feed type to another.
///
/// A single `Transform` may carry several edges (it is, for instance,
/// common for one conversion routine to handle more than one (src, dst)
/// pair); the planner treats each edge independently for costing purposes
/// but invokes the owning transform's [`Transform::apply`] exactly once per
/// edge actually used at runtime.
pub trait Transform: Send + Sync {
    /// All conversions this transform can realize.
    fn edges(&self) -> Vec<TransformEdge>;
    /// Maps a lazy sequence of `edge.src` elements to `edge.dst` elements.
    ///
    /// `edge` is always one of the edges returned by [`Transform::edges`].
    fn apply(&self, edge: &TransformEdge, tail: FeedStream) -> FeedStream;
}

/// A check: consumes a typed feed at a given scope and tees results to a
/// [`Reporter`] while passing every element through unchanged.
pub trait Sink: Send + Sync {
    /// The shape of elements this sink consumes.
    fn feed_type(&self) -> FeedType;
    /// The generality level at which this sink's logic makes sense.
    fn scope(&self) -> Scope;
    /// Tees the sequence: every element is reported and then re-yielded.
    ///
    /// Must never return without wrapping `tail` — an absent tail is a
    /// planner/sink bug (`spec.md` §4.5 "must never return a null/absent
    /// tail; this is asserted").
    fn feed(&self, tail: FeedStream, reporter: &Arc<dyn Reporter>) -> FeedStream;
}

/// Collaborators available to checks but opaque to the planner
/// (`spec.md` §6 "Feeder").
///
/// The planner never reads or writes this; it exists so that a [`Sink`]
/// implementation has somewhere to receive memoization state and other
/// per-pass collaborators via constructor injection, per the "demand-loaded
/// modules -> explicit dependency injection" design note.
pub struct Feeder {
    /// Per-pass memoized atom lookups, keyed by whatever a check chooses.
    pub query_cache: HashMap<String, Arc<dyn std::any::Any + Send + Sync>>,
}

impl Feeder {
    /// Builds an empty feeder.
    pub fn new() -> Self {
        Feeder {
            query_cache: HashMap::new(),
        }
    }
}

impl Default for Feeder {
    fn default() -> Self {
        Self::new()
    }
}
