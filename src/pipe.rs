//! Pipe enumerator (`spec.md` §4.3).
//!
//! Produces every pipe reachable from some source by chaining matrix
//! conversions, including pipes that never reach a sink type at all — a
//! pipe's prefix may still be a useful cover building block even if the
//! pipe itself doesn't terminate on a sink.

use std::collections::{BTreeSet, VecDeque};
use std::sync::Arc;

use tracing::trace;

use crate::feed::FeedType;
use crate::matrix::TransformMatrix;
use crate::model::Source;
use crate::scope::Scope;

/// An ordered sequence of feed types realizable at a given scope, with its
/// accumulated cost.
#[derive(Debug, Clone)]
pub struct Pipe {
    /// Total cost to realize this pipe, source cost included.
    pub cost: u32,
    /// The scope at which every type in this pipe is realized.
    pub scope: Scope,
    /// `(t0, t1, ..., tn)`; `t0` is produced directly by a source.
    pub types: Vec<FeedType>,
}

impl Pipe {
    /// Whether `ty` appears anywhere in this pipe.
    pub fn contains(&self, ty: &FeedType) -> bool {
        self.types.contains(ty)
    }

    /// Whether this pipe can drive a sink at `(sink_scope, sink_type)`:
    /// the pipe must be at least as general and must carry that type.
    pub fn covers(&self, sink_scope: Scope, sink_type: &FeedType) -> bool {
        self.scope >= sink_scope && self.contains(sink_type)
    }

    fn last_type(&self) -> &FeedType {
        self.types.last().expect("a pipe always has at least its source type")
    }
}

/// Picks, for every `(scope, feed_type)`, the cheapest available source.
pub fn cheapest_sources(sources: &[Arc<dyn Source>]) -> Vec<Arc<dyn Source>> {
    use std::collections::HashMap;
    let mut best: HashMap<(Scope, FeedType), Arc<dyn Source>> = HashMap::new();
    for source in sources {
        let key = (source.scope(), source.feed_type());
        match best.get(&key) {
            Some(existing) if existing.cost() <= source.cost() => {}
            _ => {
                best.insert(key, source.clone());
            }
        }
    }
    best.into_values().collect()
}

/// Enumerates every pipe reachable from `sources` (already deduplicated to
/// the cheapest per `(scope, feed_type)` via [`cheapest_sources`]) via
/// `matrix`, attempting to extend towards every key in `sink_keys`.
#[tracing::instrument(skip(sources, sink_keys, matrix))]
pub fn enumerate_pipes(
    sources: &[Arc<dyn Source>],
    sink_keys: &BTreeSet<(Scope, FeedType)>,
    matrix: &TransformMatrix,
) -> Vec<Pipe> {
    let mut queue: VecDeque<Pipe> = sources
        .iter()
        .map(|source| Pipe {
            cost: source.cost(),
            scope: source.scope(),
            types: vec![source.feed_type()],
        })
        .collect();

    let mut pipes = Vec::new();
    while let Some(pipe) = queue.pop_front() {
        for (sink_scope, sink_type) in sink_keys {
            if pipe.contains(sink_type) || *sink_scope > pipe.scope {
                continue;
            }
            if let Some(entry) = matrix.get(pipe.scope, pipe.last_type(), sink_type) {
                let mut extended_types = pipe.types.clone();
                extended_types.push(sink_type.clone());
                trace!(from = %pipe.last_type(), to = %sink_type, scope = %pipe.scope, "growing pipe");
                queue.push_back(Pipe {
                    cost: pipe.cost + entry.cost,
                    scope: pipe.scope,
                    types: extended_types,
                });
            }
        }
        pipes.push(pipe);
    }
    pipes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::FeedStream;
    use crate::model::{Transform, TransformEdge};
    use std::collections::BTreeSet;

    struct FixedSource {
        feed_type: FeedType,
        scope: Scope,
        cost: u32,
    }
    impl Source for FixedSource {
        fn feed_type(&self) -> FeedType {
            self.feed_type.clone()
        }
        fn scope(&self) -> Scope {
            self.scope
        }
        fn cost(&self) -> u32 {
            self.cost
        }
        fn feed(&self) -> FeedStream {
            Box::new(std::iter::empty())
        }
    }

    struct SingleEdge(TransformEdge);
    impl Transform for SingleEdge {
        fn edges(&self) -> Vec<TransformEdge> {
            vec![self.0.clone()]
        }
        fn apply(&self, _edge: &TransformEdge, tail: FeedStream) -> FeedStream {
            tail
        }
    }

    #[test]
    fn cheapest_sources_dedups_by_scope_and_type() {
        let sources: Vec<Arc<dyn Source>> = vec![
            Arc::new(FixedSource { feed_type: FeedType::new("A"), scope: Scope::Package, cost: 5 }),
            Arc::new(FixedSource { feed_type: FeedType::new("A"), scope: Scope::Package, cost: 1 }),
        ];
        let picked = cheapest_sources(&sources);
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].cost(), 1);
    }

    #[test]
    fn trivial_pipe_has_just_the_source_type() {
        let sources: Vec<Arc<dyn Source>> = vec![Arc::new(FixedSource {
            feed_type: FeedType::new("A"),
            scope: Scope::Package,
            cost: 1,
        })];
        let sink_keys: BTreeSet<(Scope, FeedType)> = [(Scope::Package, FeedType::new("A"))].into_iter().collect();
        let universe: BTreeSet<FeedType> = [FeedType::new("A")].into_iter().collect();
        let matrix = crate::matrix::build_matrix(&[], Scope::Package, Scope::Package, &universe);
        let pipes = enumerate_pipes(&sources, &sink_keys, &matrix);
        assert_eq!(pipes.len(), 1);
        assert_eq!(pipes[0].cost, 1);
        assert_eq!(pipes[0].types, vec![FeedType::new("A")]);
    }

    #[test]
    fn extends_through_a_transform_towards_a_sink() {
        let sources: Vec<Arc<dyn Source>> = vec![Arc::new(FixedSource {
            feed_type: FeedType::new("A"),
            scope: Scope::Package,
            cost: 1,
        })];
        let transforms: Vec<Arc<dyn Transform>> =
            vec![Arc::new(SingleEdge(TransformEdge::new("A", "B", Scope::Version, 2)))];
        let universe: BTreeSet<FeedType> = [FeedType::new("A"), FeedType::new("B")].into_iter().collect();
        let matrix = crate::matrix::build_matrix(&transforms, Scope::Package, Scope::Package, &universe);
        let sink_keys: BTreeSet<(Scope, FeedType)> = [(Scope::Package, FeedType::new("B"))].into_iter().collect();
        let pipes = enumerate_pipes(&sources, &sink_keys, &matrix);
        let extended = pipes.iter().find(|p| p.types.len() == 2).expect("an extended pipe exists");
        assert_eq!(extended.cost, 3);
        assert_eq!(extended.types, vec![FeedType::new("A"), FeedType::new("B")]);
    }
}
