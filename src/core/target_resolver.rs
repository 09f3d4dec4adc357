// src/core/target_resolver.rs

//! Typo correction for target names, based on normalized Levenshtein distance.

use crate::constants::TYPO_REJECTION_CEILING;
use strsim::levenshtein;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TargetError {
    #[error("Unknown action '{0}'.")]
    Unknown(String),
    #[error("Unknown action '{target}'. Did you mean '{suggestion}'?")]
    DidYouMean { target: String, suggestion: String },
    #[error("No action given and no default action is registered.")]
    NoDefault,
}

/// Outcome of matching a mistyped name against the known names.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Close enough to be used in place of the mistyped name.
    Substitute { name: String, distance: f64 },
    /// The best candidate, not close enough to be used silently.
    Suggest { name: String, distance: f64 },
    NoMatch,
}

impl Resolution {
    /// Turns the outcome into the name to dispatch to, or a user-facing error.
    pub fn into_target(self, target: &str) -> Result<String, TargetError> {
        match self {
            Self::Substitute { name, .. } => Ok(name),
            Self::Suggest { name, .. } => Err(TargetError::DidYouMean {
                target: target.to_string(),
                suggestion: name,
            }),
            Self::NoMatch => Err(TargetError::Unknown(target.to_string())),
        }
    }
}

/// Levenshtein distance divided by the length of the longer string, in characters.
/// Two empty strings are at distance 0.
pub fn normalized_distance(a: &str, b: &str) -> f64 {
    let longest = a.chars().count().max(b.chars().count());
    if longest == 0 {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let distance = levenshtein(a, b) as f64 / longest as f64;
    distance
}

/// Finds the closest candidate to `target`.
///
/// Candidates farther than the rejection ceiling are ignored. Ties go to the
/// lexicographically smallest name. The winner is substituted only when its
/// distance is strictly below `threshold`.
pub fn resolve<'a, I>(target: &str, candidates: I, threshold: f64) -> Resolution
where
    I: IntoIterator<Item = &'a str>,
{
    let best = candidates
        .into_iter()
        .map(|candidate| (candidate, normalized_distance(candidate, target)))
        .filter(|&(_, distance)| distance <= TYPO_REJECTION_CEILING)
        .min_by(|(left_name, left), (right_name, right)| {
            left.total_cmp(right).then_with(|| left_name.cmp(right_name))
        });

    match best {
        None => {
            log::debug!("No candidate close to '{}'", target);
            Resolution::NoMatch
        }
        Some((name, distance)) if distance < threshold => {
            log::debug!("'{}' resolves to '{}' (distance {:.3})", target, name, distance);
            Resolution::Substitute {
                name: name.to_string(),
                distance,
            }
        }
        Some((name, distance)) => Resolution::Suggest {
            name: name.to_string(),
            distance,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const NAMES: [&str; 3] = ["help", "read", "list"];

    #[test]
    fn test_transposition_distance() {
        assert_eq!(normalized_distance("lsit", "list"), 0.5);
        assert_eq!(normalized_distance("lsit", "help"), 1.0);
        assert_eq!(normalized_distance("", ""), 0.0);
        assert_eq!(normalized_distance("", "ab"), 1.0);
    }

    #[test]
    fn test_substitutes_below_threshold() {
        assert_eq!(
            resolve("lsit", NAMES, 0.6),
            Resolution::Substitute {
                name: "list".to_string(),
                distance: 0.5
            }
        );
    }

    #[test]
    fn test_suggests_at_or_above_threshold() {
        let resolution = resolve("lsit", NAMES, 0.4);
        assert_eq!(
            resolution,
            Resolution::Suggest {
                name: "list".to_string(),
                distance: 0.5
            }
        );
        assert_eq!(
            resolution.into_target("lsit"),
            Err(TargetError::DidYouMean {
                target: "lsit".to_string(),
                suggestion: "list".to_string()
            })
        );
        // Strictly below: equal to the threshold still only suggests.
        assert!(matches!(resolve("lsit", NAMES, 0.5), Resolution::Suggest { .. }));
    }

    #[test]
    fn test_rejection_ceiling() {
        assert_eq!(resolve("zzzz", NAMES, 0.9), Resolution::NoMatch);
        assert_eq!(resolve("lsit", [], 0.9), Resolution::NoMatch);
    }

    #[test]
    fn test_ties_prefer_smallest_name() {
        // "bat" is one edit away from both.
        let resolution = resolve("bat", ["cat", "bar"], 0.5);
        assert!(matches!(resolution, Resolution::Substitute { ref name, .. } if name == "bar"));
    }

    proptest! {
        #[test]
        fn property_distance_is_zero_on_identity(x in "\\PC{0,12}") {
            prop_assert_eq!(normalized_distance(&x, &x), 0.0);
        }

        #[test]
        fn property_distance_is_symmetric(a in "[a-z]{0,8}", b in "[a-z]{0,8}") {
            prop_assert_eq!(normalized_distance(&a, &b), normalized_distance(&b, &a));
            let d = normalized_distance(&a, &b);
            prop_assert!((0.0..=1.0).contains(&d));
        }
    }
}
