//! Reachability classification and cover selection (`spec.md` §4.4).

use std::collections::{BTreeSet, HashMap};

use itertools::Itertools;
use tracing::{debug, warn};

use crate::config::PlannerConfig;
use crate::feed::FeedType;
use crate::pipe::Pipe;
use crate::scope::Scope;

/// A sink is reachable iff some enumerated pipe is at least as general and
/// carries its feed type.
pub fn reachable_keys(sink_keys: &BTreeSet<(Scope, FeedType)>, pipes: &[Pipe]) -> BTreeSet<(Scope, FeedType)> {
    sink_keys
        .iter()
        .filter(|(scope, ty)| pipes.iter().any(|p| p.covers(*scope, ty)))
        .cloned()
        .collect()
}

/// Picks either one pipe covering every reachable sink key, or a
/// minimum-cost combination of pipes that jointly does.
///
/// Every reachable key is, by definition, covered by some pipe, so a
/// complete cover always exists; `multi_pipe_cover` is seeded with a greedy
/// complete cover before the bounded optimization search runs, so even a
/// `max_cover_search_nodes` cutoff can only return something suboptimal, not
/// nothing (`SPEC_FULL.md` §D).
pub fn select_cover(pipes: &[Pipe], reachable: &BTreeSet<(Scope, FeedType)>, config: &PlannerConfig) -> Vec<Pipe> {
    if reachable.is_empty() {
        return Vec::new();
    }
    if let Some(single) = cheapest_single_cover(pipes, reachable) {
        debug!(cost = single.cost, "single pipe covers every reachable sink");
        return vec![single];
    }
    let cover = multi_pipe_cover(pipes, reachable, config);
    assert!(
        !cover.is_empty(),
        "every reachable sink must be covered by some combination of pipes (planner invariant)"
    );
    cover
}

fn cheapest_single_cover(pipes: &[Pipe], reachable: &BTreeSet<(Scope, FeedType)>) -> Option<Pipe> {
    pipes
        .iter()
        .filter(|pipe| reachable.iter().all(|(scope, ty)| pipe.covers(*scope, ty)))
        .min_by_key(|pipe| pipe.cost)
        .cloned()
}

fn multi_pipe_cover(pipes: &[Pipe], reachable: &BTreeSet<(Scope, FeedType)>, config: &PlannerConfig) -> Vec<Pipe> {
    let mut by_key: HashMap<(Scope, FeedType), Vec<&Pipe>> = HashMap::new();
    for key in reachable {
        let covering: Vec<&Pipe> = pipes
            .iter()
            .filter(|p| p.covers(key.0, &key.1))
            .sorted_by_key(|p| p.cost)
            .collect();
        by_key.insert(key.clone(), covering);
    }

    // Seed with a greedy complete cover so a `max_cover_search_nodes`
    // cutoff degrades to "suboptimal" rather than "no cover at all".
    let mut best = Some(greedy_cover(reachable, &by_key));

    let mut nodes_visited = 0usize;
    search(reachable.clone(), &by_key, 0, Vec::new(), &mut best, &mut nodes_visited, config.max_cover_search_nodes);
    if nodes_visited > config.max_cover_search_nodes {
        warn!(
            nodes_visited,
            max_nodes = config.max_cover_search_nodes,
            "multi-pipe cover search hit its node budget; returning the best cover found so far, which may not be optimal"
        );
    } else {
        debug!(nodes_visited, "multi-pipe cover search finished");
    }

    best.map(|(_, cover)| cover).unwrap_or_default()
}

/// Greedily covers every reachable key by repeatedly picking the cheapest
/// pipe covering some still-uncovered key. Always produces a complete cover
/// in `O(|reachable|)` steps, since every key in `reachable` has at least
/// one covering pipe by construction.
fn greedy_cover(reachable: &BTreeSet<(Scope, FeedType)>, by_key: &HashMap<(Scope, FeedType), Vec<&Pipe>>) -> (u32, Vec<Pipe>) {
    let mut todo = reachable.clone();
    let mut cost = 0;
    let mut chosen = Vec::new();
    while let Some(key) = todo.iter().next().cloned() {
        let pipe = by_key[&key]
            .first()
            .expect("every reachable key has at least one covering pipe");
        todo.retain(|(scope, ty)| !pipe.covers(*scope, ty));
        cost += pipe.cost;
        chosen.push((*pipe).clone());
    }
    (cost, chosen)
}

/// Branch-and-bound search over the uncovered sink-key set: pick any
/// uncovered key, try every pipe covering it (cheapest first), remove
/// everything that pipe also covers, recurse. Pruned the moment a partial
/// cover's cost already meets or exceeds the best complete cover found so
/// far, and backstopped by `max_nodes` recursive calls.
fn search(
    todo: BTreeSet<(Scope, FeedType)>,
    by_key: &HashMap<(Scope, FeedType), Vec<&Pipe>>,
    cost_so_far: u32,
    chosen: Vec<Pipe>,
    best: &mut Option<(u32, Vec<Pipe>)>,
    nodes_visited: &mut usize,
    max_nodes: usize,
) {
    if let Some((best_cost, _)) = best {
        if cost_so_far >= *best_cost {
            return;
        }
    }
    if todo.is_empty() {
        *best = Some((cost_so_far, chosen));
        return;
    }
    *nodes_visited += 1;
    if *nodes_visited > max_nodes {
        return;
    }

    let key = todo.iter().next().cloned().expect("todo is non-empty");
    for pipe in &by_key[&key] {
        let mut new_todo = todo.clone();
        new_todo.retain(|(scope, ty)| !pipe.covers(*scope, ty));
        let mut new_chosen = chosen.clone();
        new_chosen.push((*pipe).clone());
        search(new_todo, by_key, cost_so_far + pipe.cost, new_chosen, best, nodes_visited, max_nodes);
    }
}
