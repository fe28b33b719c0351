//! The generality axis pipes and sinks are measured against.
//!
//! A [`Scope`] is a totally ordered enumeration: `Version < Package <
//! Category < Repository`. Higher (later) values are *more general*. A sink
//! at a given scope only makes sense when the data driving it is at least
//! that general, which is why the planner treats scope as the dimension
//! along which it must not cut corners.

use std::fmt;

/// A generality level for feeds, sources, transforms and sinks.
///
/// The ordering is the only property the planner relies on: `a >= b` means
/// `a` is at least as general as `b`. Internally this is backed by a plain
/// enum discriminant, but callers should not depend on the concrete integer
/// value, only on `Ord`/`PartialOrd`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Scope {
    /// A single package version.
    Version,
    /// All versions of a single package.
    Package,
    /// A whole category of packages.
    Category,
    /// The entire repository.
    Repository,
}

impl Scope {
    /// All scopes, from least to most general.
    pub const ALL: [Scope; 4] = [
        Scope::Version,
        Scope::Package,
        Scope::Category,
        Scope::Repository,
    ];

    /// Iterates the scopes from `self` up to and including `upper`,
    /// inclusive on both ends. Empty if `self > upper`.
    ///
    /// This is the "for s' in (eff_scope, best_source_scope]" / "for scope in
    /// [lowest_sink_scope, best_source_scope]" idiom used throughout the
    /// matrix builder.
    pub fn upward_through(self, upper: Scope) -> impl Iterator<Item = Scope> {
        Scope::ALL
            .into_iter()
            .filter(move |s| *s >= self && *s <= upper)
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Scope::Version => "version",
            Scope::Package => "package",
            Scope::Category => "category",
            Scope::Repository => "repository",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_matches_spec() {
        assert!(Scope::Version < Scope::Package);
        assert!(Scope::Package < Scope::Category);
        assert!(Scope::Category < Scope::Repository);
    }

    #[test]
    fn upward_through_is_inclusive_both_ends() {
        let got: Vec<_> = Scope::Package.upward_through(Scope::Repository).collect();
        assert_eq!(got, vec![Scope::Package, Scope::Category, Scope::Repository]);
    }

    #[test]
    fn upward_through_empty_when_above_upper() {
        let got: Vec<_> = Scope::Repository.upward_through(Scope::Package).collect();
        assert!(got.is_empty());
    }

    #[test]
    fn upward_through_single_when_equal() {
        let got: Vec<_> = Scope::Category.upward_through(Scope::Category).collect();
        assert_eq!(got, vec![Scope::Category]);
    }
}
