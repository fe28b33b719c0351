//! Transform matrix builder (`spec.md` §4.2).
//!
//! Builds, for every `(scope, src_type, dst_type)`, the cheapest chain of
//! transforms that realizes the conversion at that scope, respecting every
//! transform's minimum scope and the downward-monotone-in-scope invariant
//! (`spec.md` §3 invariant 2): a conversion legal at scope `s` stays legal,
//! at cost no worse, at every scope `s' >= s`.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use tracing::trace;

use crate::feed::FeedType;
use crate::model::{Transform, TransformEdge};
use crate::scope::Scope;

/// One link in a realized transform chain: the transform to invoke and the
/// specific edge of it that applies.
pub type ChainLink = (Arc<dyn Transform>, TransformEdge);

/// A cheapest-known conversion: its total cost and the ordered chain of
/// transforms that realizes it.
#[derive(Clone)]
pub struct MatrixEntry {
    /// Sum of the cost of every link in `chain`.
    pub cost: u32,
    /// The transforms to apply, in order, to go from `src` to `dst`.
    pub chain: Vec<ChainLink>,
}

type Key = (Scope, FeedType, FeedType);

/// `(scope, src_type, dst_type) -> cheapest realized conversion`.
#[derive(Default)]
pub struct TransformMatrix {
    entries: HashMap<Key, MatrixEntry>,
}

impl TransformMatrix {
    fn new() -> Self {
        TransformMatrix {
            entries: HashMap::new(),
        }
    }

    /// Looks up the cheapest known conversion at `(scope, src, dst)`.
    pub fn get(&self, scope: Scope, src: &FeedType, dst: &FeedType) -> Option<&MatrixEntry> {
        self.entries.get(&(scope, src.clone(), dst.clone()))
    }

    fn cost_at(&self, scope: Scope, src: &FeedType, dst: &FeedType) -> Option<u32> {
        self.get(scope, src, dst).map(|e| e.cost)
    }

    /// Inserts `(cost, chain)` at `key` only if no entry exists or the
    /// existing one is strictly more expensive. Returns whether the insert
    /// happened.
    fn insert_if_better(&mut self, scope: Scope, src: &FeedType, dst: &FeedType, cost: u32, chain: Vec<ChainLink>) -> bool {
        let key = (scope, src.clone(), dst.clone());
        let better = match self.entries.get(&key) {
            None => true,
            Some(existing) => cost < existing.cost,
        };
        if better {
            self.entries.insert(key, MatrixEntry { cost, chain });
        }
        better
    }

    fn force_insert(&mut self, scope: Scope, src: &FeedType, dst: &FeedType, cost: u32, chain: Vec<ChainLink>) {
        self.entries
            .insert((scope, src.clone(), dst.clone()), MatrixEntry { cost, chain });
    }
}

/// Builds the transform matrix for the given edges, valid between
/// `lowest_sink_scope` and `best_source_scope` (inclusive).
///
/// `universe` is the set of every feed type in play (source types, sink
/// types, and both endpoints of every transform edge) — `spec.md` §4.2's
/// "type universe U".
#[tracing::instrument(skip(transforms, universe))]
pub fn build_matrix(
    transforms: &[Arc<dyn Transform>],
    best_source_scope: Scope,
    lowest_sink_scope: Scope,
    universe: &BTreeSet<FeedType>,
) -> TransformMatrix {
    let mut matrix = TransformMatrix::new();
    initialize(&mut matrix, transforms, best_source_scope, lowest_sink_scope);
    close(&mut matrix, best_source_scope, lowest_sink_scope, universe);
    matrix
}

fn initialize(
    matrix: &mut TransformMatrix,
    transforms: &[Arc<dyn Transform>],
    best_source_scope: Scope,
    lowest_sink_scope: Scope,
) {
    for transform in transforms {
        for edge in transform.edges() {
            if edge.min_scope > best_source_scope {
                continue;
            }
            let eff_scope = edge.min_scope.max(lowest_sink_scope);
            let chain = vec![(transform.clone(), edge.clone())];
            let inserted = matrix.insert_if_better(eff_scope, &edge.src, &edge.dst, edge.cost, chain.clone());
            if !inserted {
                continue;
            }
            trace!(%eff_scope, src = %edge.src, dst = %edge.dst, cost = edge.cost, "matrix init");
            for s in eff_scope.upward_through(best_source_scope).skip(1) {
                match matrix.cost_at(s, &edge.src, &edge.dst) {
                    Some(existing_cost) if existing_cost < edge.cost => break,
                    _ => matrix.force_insert(s, &edge.src, &edge.dst, edge.cost, chain.clone()),
                }
            }
        }
    }
}

fn close(matrix: &mut TransformMatrix, best_source_scope: Scope, lowest_sink_scope: Scope, universe: &BTreeSet<FeedType>) {
    let types: Vec<FeedType> = universe.iter().cloned().collect();
    let scopes: Vec<Scope> = lowest_sink_scope.upward_through(best_source_scope).collect();

    loop {
        let mut progress = false;
        for src in &types {
            for dst in &types {
                if src == dst {
                    continue;
                }
                let mut current: Option<MatrixEntry> = None;
                for &scope in &scopes {
                    if let Some(new_current) = matrix.get(scope, src, dst).cloned() {
                        match &current {
                            None => current = Some(new_current),
                            Some(cur) if cur.cost >= new_current.cost => current = Some(new_current),
                            Some(cur) => {
                                progress = true;
                                let cur = cur.clone();
                                matrix.force_insert(scope, src, dst, cur.cost, cur.chain.clone());
                            }
                        }
                    }
                    for halfway in &types {
                        let (Some(first), Some(second)) =
                            (matrix.get(scope, src, halfway).cloned(), matrix.get(scope, halfway, dst).cloned())
                        else {
                            continue;
                        };
                        let new_cost = first.cost + second.cost;
                        let beats_current = match &current {
                            None => true,
                            Some(cur) => new_cost < cur.cost,
                        };
                        if beats_current {
                            progress = true;
                            let mut chain = first.chain.clone();
                            chain.extend(second.chain.clone());
                            let combined = MatrixEntry { cost: new_cost, chain };
                            matrix.force_insert(scope, src, dst, combined.cost, combined.chain.clone());
                            current = Some(combined);
                        }
                        // keep scanning `halfway` for an even cheaper combination.
                    }
                }
            }
        }
        if !progress {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    struct SingleEdge(TransformEdge);
    impl Transform for SingleEdge {
        fn edges(&self) -> Vec<TransformEdge> {
            vec![self.0.clone()]
        }
        fn apply(&self, _edge: &TransformEdge, tail: crate::feed::FeedStream) -> crate::feed::FeedStream {
            tail
        }
    }

    fn edge(src: &str, dst: &str, min_scope: Scope, cost: u32) -> Arc<dyn Transform> {
        Arc::new(SingleEdge(TransformEdge::new(src, dst, min_scope, cost)))
    }

    #[test]
    fn s3_single_transform() {
        let transforms = vec![edge("A", "B", Scope::Version, 2)];
        let universe: BTreeSet<FeedType> = ["A", "B"].into_iter().map(FeedType::new).collect();
        let matrix = build_matrix(&transforms, Scope::Package, Scope::Package, &universe);
        let entry = matrix
            .get(Scope::Package, &FeedType::new("A"), &FeedType::new("B"))
            .expect("A->B should exist at Package scope");
        assert_eq!(entry.cost, 2);
    }

    #[test]
    fn s4_cheaper_indirect_chain_wins() {
        let transforms = vec![
            edge("A", "B", Scope::Version, 10),
            edge("A", "C", Scope::Version, 1),
            edge("C", "B", Scope::Version, 1),
        ];
        let universe: BTreeSet<FeedType> = ["A", "B", "C"].into_iter().map(FeedType::new).collect();
        let matrix = build_matrix(&transforms, Scope::Package, Scope::Package, &universe);
        let entry = matrix
            .get(Scope::Package, &FeedType::new("A"), &FeedType::new("B"))
            .unwrap();
        assert_eq!(entry.cost, 3);
        assert_eq!(entry.chain.len(), 2);
    }

    #[test]
    fn backfill_propagates_upward_through_best_source_scope() {
        let transforms = vec![edge("A", "B", Scope::Version, 5)];
        let universe: BTreeSet<FeedType> = ["A", "B"].into_iter().map(FeedType::new).collect();
        let matrix = build_matrix(&transforms, Scope::Repository, Scope::Version, &universe);
        for scope in Scope::Version.upward_through(Scope::Repository) {
            let entry = matrix.get(scope, &FeedType::new("A"), &FeedType::new("B"));
            assert!(entry.is_some(), "missing backfilled entry at {scope}");
            assert_eq!(entry.unwrap().cost, 5);
        }
    }

    #[test]
    fn min_scope_above_best_source_scope_is_skipped() {
        let transforms = vec![edge("A", "B", Scope::Repository, 1)];
        let universe: BTreeSet<FeedType> = ["A", "B"].into_iter().map(FeedType::new).collect();
        let matrix = build_matrix(&transforms, Scope::Package, Scope::Package, &universe);
        assert!(matrix.get(Scope::Package, &FeedType::new("A"), &FeedType::new("B")).is_none());
    }

    #[test]
    fn triangle_inequality_holds_after_closure() {
        let transforms = vec![
            edge("A", "B", Scope::Version, 4),
            edge("B", "C", Scope::Version, 4),
            edge("A", "C", Scope::Version, 100),
        ];
        let universe: BTreeSet<FeedType> = ["A", "B", "C"].into_iter().map(FeedType::new).collect();
        let matrix = build_matrix(&transforms, Scope::Package, Scope::Package, &universe);
        let ac = matrix.get(Scope::Package, &FeedType::new("A"), &FeedType::new("C")).unwrap();
        assert_eq!(ac.cost, 8);
    }
}
