//! Pipeline instantiator / runtime (`spec.md` §4.5).
//!
//! Binds one chosen [`Pipe`] to its source, the transform chains the matrix
//! already computed, and every sink whose `(feed_type, scope)` matches a
//! point along the pipe, producing a single drivable [`FeedStream`].

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::feed::{FeedStream, FeedType};
use crate::matrix::TransformMatrix;
use crate::model::Sink;
use crate::pipe::Pipe;
use crate::reporter::Reporter;
use crate::scope::Scope;

/// A chosen pipe bound to its concrete source and sinks, ready to be
/// drained by the caller. Draining is the only way to run a pass; the
/// planner never drives a pipeline itself (`spec.md` §5).
pub struct RunningPipe {
    /// The pipe this runtime object realizes.
    pub pipe: Pipe,
    /// The final, fully spliced lazy sequence.
    pub tail: FeedStream,
}

/// Instantiates `pipe`: obtains its source's feed, splices in every sink
/// bound to it, and walks the matrix-computed transform chains between
/// consecutive pipe types.
///
/// `sinks_by_key` is consumed: every sink actually spliced is removed, and
/// the caller is expected to assert the overall map empty once every chosen
/// pipe has been instantiated (`spec.md` §4.5 "All unbound sinks after the
/// walk indicate a planner bug").
#[tracing::instrument(skip_all, fields(scope = %pipe.scope, len = pipe.types.len()))]
pub fn instantiate(
    pipe: Pipe,
    source_feed: FeedStream,
    matrix: &TransformMatrix,
    sinks_by_key: &mut HashMap<(Scope, FeedType), Vec<Arc<dyn Sink>>>,
    reporter: &Arc<dyn Reporter>,
) -> RunningPipe {
    let scope = pipe.scope;
    let mut tail = source_feed;
    let mut current_type = pipe.types[0].clone();

    for (i, ty) in pipe.types.iter().enumerate() {
        debug_assert_eq!(*ty, current_type, "pipe types and chain walk must stay in lockstep");
        tail = splice_sinks(tail, scope, ty, sinks_by_key, reporter);

        if i + 1 == pipe.types.len() {
            break;
        }
        let next_type = &pipe.types[i + 1];
        let entry = matrix
            .get(scope, &current_type, next_type)
            .unwrap_or_else(|| panic!("planner chose a pipe step ({current_type} -> {next_type}) with no matrix entry"));
        for (transform, edge) in &entry.chain {
            assert_eq!(edge.src, current_type, "transform chain must run in order");
            assert!(edge.min_scope <= scope, "transform min_scope must not exceed the pipe's scope");
            debug!(from = %edge.src, to = %edge.dst, "splicing transform");
            tail = transform.apply(edge, tail);
            current_type = edge.dst.clone();
        }
        assert_eq!(current_type, *next_type, "transform chain must land on the next pipe type");
    }

    RunningPipe { pipe, tail }
}

fn splice_sinks(
    mut tail: FeedStream,
    scope: Scope,
    ty: &FeedType,
    sinks_by_key: &mut HashMap<(Scope, FeedType), Vec<Arc<dyn Sink>>>,
    reporter: &Arc<dyn Reporter>,
) -> FeedStream {
    // A sink is bound to this point in the pipe if its feed type matches
    // and its own scope is no more demanding than the pipe's.
    let matching_scopes: Vec<Scope> = sinks_by_key
        .keys()
        .filter(|(s, t)| t == ty && *s <= scope)
        .map(|(s, _)| *s)
        .collect();
    for sink_scope in matching_scopes {
        if let Some(sinks) = sinks_by_key.remove(&(sink_scope, ty.clone())) {
            for sink in sinks {
                debug!(feed_type = %ty, sink_scope = %sink_scope, "splicing sink");
                tail = sink.feed(tail, reporter);
            }
        }
    }
    tail
}
