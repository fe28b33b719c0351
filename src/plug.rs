//! Top-level planner entry point (`spec.md` §4.1-§4.5, §7).

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use tracing::info;

use crate::config::PlannerConfig;
use crate::cover::{reachable_keys, select_cover};
use crate::feed::FeedType;
use crate::matrix::build_matrix;
use crate::model::{Sink, Source, Transform};
use crate::pipe::{cheapest_sources, enumerate_pipes};
use crate::reporter::Reporter;
use crate::runtime::{instantiate, RunningPipe};
use crate::scope::Scope;

/// The full result of a `plug()` call: every input sink lands in exactly
/// one of `out_of_scope_sinks`, `unreachable_sinks` or `running_sinks`
/// (`spec.md` §8 property 4: disjoint partition), and `running_pipes` are
/// ready to be drained by the caller.
pub struct PlanOutcome {
    /// Sinks whose scope exceeds every available source's scope.
    pub out_of_scope_sinks: Vec<Arc<dyn Sink>>,
    /// Sinks in scope but with no transform path from any source.
    pub unreachable_sinks: Vec<Arc<dyn Sink>>,
    /// Sinks bound to a chosen pipe.
    pub running_sinks: Vec<Arc<dyn Sink>>,
    /// Instantiated, drivable pipelines realizing the chosen cover.
    pub running_pipes: Vec<RunningPipe>,
}

/// Selects sources, composes transforms, and binds sinks into one or more
/// concrete pipelines driving every satisfiable sink at minimum aggregate
/// cost.
///
/// The planner itself does not call `reporter.start()`/`finish()` — that
/// bracketing is the caller's responsibility once it starts draining
/// `running_pipes` (`spec.md` §4.5 "Observable side effects").
#[tracing::instrument(skip_all, fields(sources = sources.len(), transforms = transforms.len(), sinks = sinks.len()))]
pub fn plug(
    sources: Vec<Arc<dyn Source>>,
    transforms: Vec<Arc<dyn Transform>>,
    sinks: Vec<Arc<dyn Sink>>,
    reporter: Arc<dyn Reporter>,
    config: &PlannerConfig,
) -> PlanOutcome {
    // §4.1 scope pruning.
    let Some(best_source_scope) = sources.iter().map(|s| s.scope()).max() else {
        return PlanOutcome {
            out_of_scope_sinks: sinks,
            unreachable_sinks: Vec::new(),
            running_sinks: Vec::new(),
            running_pipes: Vec::new(),
        };
    };

    let (good, out_of_scope_sinks): (Vec<_>, Vec<_>) =
        sinks.into_iter().partition(|s| s.scope() <= best_source_scope);
    if good.is_empty() {
        return PlanOutcome {
            out_of_scope_sinks,
            unreachable_sinks: Vec::new(),
            running_sinks: Vec::new(),
            running_pipes: Vec::new(),
        };
    }

    let lowest_sink_scope = good.iter().map(|s| s.scope()).min().unwrap();
    let candidate_sources: Vec<Arc<dyn Source>> =
        sources.into_iter().filter(|s| s.scope() >= lowest_sink_scope).collect();
    if candidate_sources.is_empty() {
        return PlanOutcome {
            out_of_scope_sinks,
            unreachable_sinks: good,
            running_sinks: Vec::new(),
            running_pipes: Vec::new(),
        };
    }

    // §4.2 transform matrix.
    let universe = type_universe(&candidate_sources, &good, &transforms);
    let matrix = build_matrix(&transforms, best_source_scope, lowest_sink_scope, &universe);

    // §4.3 pipe enumeration.
    let sources_by_key = cheapest_sources(&candidate_sources);
    let sink_keys: BTreeSet<(Scope, FeedType)> = good.iter().map(|s| (s.scope(), s.feed_type())).collect();
    let pipes = enumerate_pipes(&sources_by_key, &sink_keys, &matrix);

    // §4.4 reachability and cover.
    let reachable = reachable_keys(&sink_keys, &pipes);
    let (running_candidates, unreachable_sinks): (Vec<_>, Vec<_>) = good
        .into_iter()
        .partition(|s| reachable.contains(&(s.scope(), s.feed_type())));
    if reachable.is_empty() {
        return PlanOutcome {
            out_of_scope_sinks,
            unreachable_sinks,
            running_sinks: Vec::new(),
            running_pipes: Vec::new(),
        };
    }
    let chosen_pipes = select_cover(&pipes, &reachable, config);

    // §4.5 instantiation.
    let running_sinks = running_candidates.clone();
    let mut sinks_by_key: HashMap<(Scope, FeedType), Vec<Arc<dyn Sink>>> = HashMap::new();
    for sink in running_candidates {
        sinks_by_key.entry((sink.scope(), sink.feed_type())).or_default().push(sink);
    }

    let source_by_start: HashMap<(Scope, FeedType), &Arc<dyn Source>> =
        sources_by_key.iter().map(|s| ((s.scope(), s.feed_type()), s)).collect();

    let mut running_pipes = Vec::with_capacity(chosen_pipes.len());
    for pipe in chosen_pipes {
        let start_key = (pipe.scope, pipe.types[0].clone());
        let source = source_by_start
            .get(&start_key)
            .unwrap_or_else(|| panic!("no source available to start pipe at {start_key:?}"));
        let feed = source.feed();
        running_pipes.push(instantiate(pipe, feed, &matrix, &mut sinks_by_key, &reporter));
    }
    assert!(
        sinks_by_key.is_empty(),
        "planner left {} sink group(s) unbound after instantiating every chosen pipe",
        sinks_by_key.len()
    );

    info!(
        running = running_sinks.len(),
        unreachable = unreachable_sinks.len(),
        out_of_scope = out_of_scope_sinks.len(),
        pipes = running_pipes.len(),
        "plug finished"
    );

    PlanOutcome {
        out_of_scope_sinks,
        unreachable_sinks,
        running_sinks,
        running_pipes,
    }
}

fn type_universe(sources: &[Arc<dyn Source>], sinks: &[Arc<dyn Sink>], transforms: &[Arc<dyn Transform>]) -> BTreeSet<FeedType> {
    let mut universe = BTreeSet::new();
    universe.extend(sources.iter().map(|s| s.feed_type()));
    universe.extend(sinks.iter().map(|s| s.feed_type()));
    for transform in transforms {
        for edge in transform.edges() {
            universe.insert(edge.src);
            universe.insert(edge.dst);
        }
    }
    universe
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::{FeedItem, FeedStream};
    use crate::model::TransformEdge;
    use crate::reporter::{ReportResult, TextResult};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingReporter(AtomicUsize);
    impl Reporter for CountingReporter {
        fn start(&self) {}
        fn add_report(&self, _result: &dyn ReportResult) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
        fn finish(&self) {}
    }

    struct VecSource {
        feed_type: FeedType,
        scope: Scope,
        cost: u32,
        items: Vec<i32>,
    }
    impl Source for VecSource {
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
            let items = self.items.clone();
            Box::new(items.into_iter().map(|v| Box::new(v) as Box<dyn FeedItem>))
        }
    }

    struct TeeSink {
        feed_type: FeedType,
        scope: Scope,
    }
    impl Sink for TeeSink {
        fn feed_type(&self) -> FeedType {
            self.feed_type.clone()
        }
        fn scope(&self) -> Scope {
            self.scope
        }
        fn feed(&self, tail: FeedStream, reporter: &Arc<dyn Reporter>) -> FeedStream {
            let reporter = reporter.clone();
            Box::new(tail.map(move |item| {
                reporter.add_report(&TextResult::new("hit"));
                item
            }))
        }
    }

    struct Identity(TransformEdge);
    impl Transform for Identity {
        fn edges(&self) -> Vec<TransformEdge> {
            vec![self.0.clone()]
        }
        fn apply(&self, _edge: &TransformEdge, tail: FeedStream) -> FeedStream {
            tail
        }
    }

    #[test]
    fn s1_trivial_single_source_single_sink() {
        let sources: Vec<Arc<dyn Source>> = vec![Arc::new(VecSource {
            feed_type: FeedType::new("A"),
            scope: Scope::Package,
            cost: 1,
            items: vec![1, 2, 3],
        })];
        let sinks: Vec<Arc<dyn Sink>> = vec![Arc::new(TeeSink { feed_type: FeedType::new("A"), scope: Scope::Package })];
        let reporter = Arc::new(CountingReporter(AtomicUsize::new(0)));
        let outcome = plug(sources, vec![], sinks, reporter.clone(), &PlannerConfig::default());

        assert!(outcome.out_of_scope_sinks.is_empty());
        assert!(outcome.unreachable_sinks.is_empty());
        assert_eq!(outcome.running_sinks.len(), 1);
        assert_eq!(outcome.running_pipes.len(), 1);
        assert_eq!(outcome.running_pipes[0].pipe.cost, 1);

        let drained: usize = outcome.running_pipes.into_iter().map(|p| p.tail.count()).sum();
        assert_eq!(drained, 3);
        assert_eq!(reporter.0.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn s2_sink_above_best_source_scope_is_out_of_scope() {
        let sources: Vec<Arc<dyn Source>> = vec![Arc::new(VecSource {
            feed_type: FeedType::new("A"),
            scope: Scope::Package,
            cost: 1,
            items: vec![],
        })];
        let sinks: Vec<Arc<dyn Sink>> = vec![Arc::new(TeeSink { feed_type: FeedType::new("A"), scope: Scope::Repository })];
        let reporter = Arc::new(CountingReporter(AtomicUsize::new(0)));
        let outcome = plug(sources, vec![], sinks, reporter, &PlannerConfig::default());
        assert_eq!(outcome.out_of_scope_sinks.len(), 1);
        assert!(outcome.running_sinks.is_empty());
    }

    #[test]
    fn s3_single_transform_chain_cost() {
        let sources: Vec<Arc<dyn Source>> = vec![Arc::new(VecSource {
            feed_type: FeedType::new("A"),
            scope: Scope::Package,
            cost: 1,
            items: vec![10],
        })];
        let transforms: Vec<Arc<dyn Transform>> =
            vec![Arc::new(Identity(TransformEdge::new("A", "B", Scope::Version, 2)))];
        let sinks: Vec<Arc<dyn Sink>> = vec![Arc::new(TeeSink { feed_type: FeedType::new("B"), scope: Scope::Package })];
        let reporter = Arc::new(CountingReporter(AtomicUsize::new(0)));
        let outcome = plug(sources, transforms, sinks, reporter, &PlannerConfig::default());
        assert_eq!(outcome.running_pipes.len(), 1);
        assert_eq!(outcome.running_pipes[0].pipe.cost, 3);
    }

    #[test]
    fn s6_no_path_to_sink_is_unreachable() {
        let sources: Vec<Arc<dyn Source>> = vec![Arc::new(VecSource {
            feed_type: FeedType::new("A"),
            scope: Scope::Package,
            cost: 1,
            items: vec![],
        })];
        let sinks: Vec<Arc<dyn Sink>> = vec![Arc::new(TeeSink { feed_type: FeedType::new("Z"), scope: Scope::Package })];
        let reporter = Arc::new(CountingReporter(AtomicUsize::new(0)));
        let outcome = plug(sources, vec![], sinks, reporter, &PlannerConfig::default());
        assert_eq!(outcome.unreachable_sinks.len(), 1);
        assert!(outcome.running_pipes.is_empty());
    }

    #[test]
    fn no_sources_pushes_everything_out_of_scope() {
        let sinks: Vec<Arc<dyn Sink>> = vec![Arc::new(TeeSink { feed_type: FeedType::new("A"), scope: Scope::Package })];
        let reporter = Arc::new(CountingReporter(AtomicUsize::new(0)));
        let outcome = plug(vec![], vec![], sinks, reporter, &PlannerConfig::default());
        assert_eq!(outcome.out_of_scope_sinks.len(), 1);
    }
}
