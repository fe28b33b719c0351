//! In-process tuning knobs for the planner's own search (`SPEC_FULL.md` §D).
//!
//! This is not the file/CLI configuration `spec.md` §1 places out of scope
//! — it is the handful of numbers the cover search needs to stay bounded,
//! passed directly by the caller.

/// Tuning knobs for [`crate::plug::plug`].
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlannerConfig {
    /// Upper bound on the number of recursive calls the multi-pipe cover
    /// search will make before giving up and returning the best complete
    /// cover found so far (`spec.md` §4.3: "the search space is bounded...
    /// in practice... small").
    pub max_cover_search_nodes: usize,
}

impl PlannerConfig {
    /// A generous default, well above the sizes `spec.md` §4.3 anticipates
    /// ("tens of sink keys").
    pub const DEFAULT_MAX_COVER_SEARCH_NODES: usize = 100_000;
}

impl Default for PlannerConfig {
    fn default() -> Self {
        PlannerConfig {
            max_cover_search_nodes: Self::DEFAULT_MAX_COVER_SEARCH_NODES,
        }
    }
}
