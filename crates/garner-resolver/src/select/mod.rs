//! Version selection and conflict mediation policy.
//!
//! Pure functions: given the candidate nodes discovered for one identity
//! key, pick the winner; given a range and the versions repositories offer,
//! pick the version a range pins to.

use garner_core::types::{Version, VersionSpec};

/// Conflict mediation rule applied per identity key.
///
/// The tie-break precedence between declaration depth and other signals is
/// policy, not a fixed rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mediation {
    /// Smallest first-discovery depth wins; equal depths fall back to the
    /// earliest BFS discovery order ("nearest, then first-declared")
    #[default]
    NearestWins,
    /// Highest version wins; equal versions fall back to nearest
    HighestVersion,
}

/// One candidate for an identity key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub version: Version,
    pub depth: usize,
    pub order: usize,
}

/// Select the winning candidate index under the given mediation rule.
/// Returns None only for an empty candidate set.
pub fn select(mediation: Mediation, candidates: &[Candidate]) -> Option<usize> {
    match mediation {
        Mediation::NearestWins => candidates
            .iter()
            .enumerate()
            .min_by_key(|(_, c)| (c.depth, c.order))
            .map(|(index, _)| index),
        Mediation::HighestVersion => candidates
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| {
                a.version
                    .cmp(&b.version)
                    // Inverted: for equal versions the smaller depth/order wins
                    .then(b.depth.cmp(&a.depth))
                    .then(b.order.cmp(&a.order))
            })
            .map(|(index, _)| index),
    }
}

/// Pin a version spec against the versions actually offered by reachable
/// repositories: an exact spec pins to itself, a range pins to the highest
/// offered version inside it.
pub fn pick_version(spec: &VersionSpec, offered: &[Version]) -> Option<Version> {
    match spec {
        VersionSpec::Exact(version) => Some(version.clone()),
        VersionSpec::Range(range) => offered
            .iter()
            .filter(|version| range.contains(version))
            .max()
            .cloned(),
    }
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;
    use std::str::FromStr;

    proptest! {
        // The winner under NearestWins is exactly the (depth, order) minimum
        #[test]
        fn nearest_wins_matches_reconstruction(
            raw in prop::collection::vec((1u64..20, 0usize..5, 0usize..50), 1..10)
        ) {
            let candidates: Vec<Candidate> = raw
                .iter()
                .map(|&(v, depth, order)| Candidate {
                    version: Version::new(vec![v]),
                    depth,
                    order,
                })
                .collect();

            let winner = select(Mediation::NearestWins, &candidates).unwrap();
            let expected = candidates
                .iter()
                .map(|c| (c.depth, c.order))
                .min()
                .unwrap();
            prop_assert_eq!(
                (candidates[winner].depth, candidates[winner].order),
                expected
            );
        }
    }

    proptest! {
        // A pinned range version always satisfies the range and dominates
        // every other satisfying offer
        #[test]
        fn picked_version_is_highest_satisfying(
            offered in prop::collection::vec(1u64..40, 1..15),
            lower in 1u64..20,
            span in 1u64..20,
        ) {
            let spec = VersionSpec::from_str(&format!("[{},{})", lower, lower + span)).unwrap();
            let offered: Vec<Version> =
                offered.into_iter().map(|v| Version::new(vec![v])).collect();

            match pick_version(&spec, &offered) {
                Some(picked) => {
                    prop_assert!(spec.matches(&picked));
                    for version in &offered {
                        if spec.matches(version) {
                            prop_assert!(version <= &picked);
                        }
                    }
                }
                None => {
                    for version in &offered {
                        prop_assert!(!spec.matches(version));
                    }
                }
            }
        }
    }
}
