//! Brute-force descriptor matching.
//!
//! Every query descriptor is compared against every train descriptor and
//! keeps at most one match. Train descriptors may be claimed by several
//! queries. Ties resolve to the lowest train index.

use crate::features::Descriptor;
use crate::trace::{trace_event, trace_span};
#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Default SSD rejection threshold.
pub const DEFAULT_MAX_SSD: f32 = 100.0;
/// Default NCC acceptance threshold.
pub const DEFAULT_MIN_NCC: f32 = 0.8;
/// Default Lowe ratio.
pub const DEFAULT_RATIO: f32 = 0.75;
/// Output cap applied by the ratio test.
pub const RATIO_MATCH_CAP: usize = 100;

/// Matching policy.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MatchStrategy {
    /// Minimize the sum of squared differences; reject above `max_distance`.
    Ssd { max_distance: Option<f32> },
    /// Maximize the normalized dot product; reject below `min_score`.
    Ncc { min_score: Option<f32> },
    /// Euclidean nearest neighbour accepted when `best < ratio * second`.
    /// Output is capped at [`RATIO_MATCH_CAP`].
    Ratio { ratio: f32 },
}

impl MatchStrategy {
    /// SSD with the default threshold.
    pub fn ssd() -> Self {
        Self::Ssd {
            max_distance: Some(DEFAULT_MAX_SSD),
        }
    }

    /// NCC with the default threshold.
    pub fn ncc() -> Self {
        Self::Ncc {
            min_score: Some(DEFAULT_MIN_NCC),
        }
    }

    /// Ratio test with the default ratio.
    pub fn ratio() -> Self {
        Self::Ratio {
            ratio: DEFAULT_RATIO,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Ssd { .. } => "ssd",
            Self::Ncc { .. } => "ncc",
            Self::Ratio { .. } => "ratio",
        }
    }
}

impl Default for MatchStrategy {
    fn default() -> Self {
        Self::ssd()
    }
}

/// One accepted query/train pair.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DescriptorMatch {
    pub query_idx: usize,
    pub train_idx: usize,
    /// SSD, NCC score or Euclidean distance depending on the strategy.
    pub distance: f32,
}

/// Normalized dot product clamped to `[-1, 1]`; zero when either side has no energy.
fn ncc_score(a: &Descriptor, b: &Descriptor) -> f32 {
    let denom = a.norm() * b.norm();
    if denom <= f32::EPSILON {
        return 0.0;
    }
    (a.dot(b) / denom).clamp(-1.0, 1.0)
}

fn best_ssd(query: &Descriptor, train: &[Descriptor]) -> Option<(usize, f32)> {
    let mut best: Option<(usize, f32)> = None;
    for (idx, cand) in train.iter().enumerate() {
        let dist = query.ssd(cand);
        if best.map_or(true, |(_, d)| dist < d) {
            best = Some((idx, dist));
        }
    }
    best
}

fn best_ncc(query: &Descriptor, train: &[Descriptor]) -> Option<(usize, f32)> {
    let mut best: Option<(usize, f32)> = None;
    for (idx, cand) in train.iter().enumerate() {
        let score = ncc_score(query, cand);
        if best.map_or(true, |(_, s)| score > s) {
            best = Some((idx, score));
        }
    }
    best
}

/// Nearest and second-nearest Euclidean distances.
fn two_nearest(query: &Descriptor, train: &[Descriptor]) -> Option<(usize, f32, f32)> {
    if train.len() < 2 {
        return None;
    }
    let mut first = (usize::MAX, f32::INFINITY);
    let mut second = f32::INFINITY;
    for (idx, cand) in train.iter().enumerate() {
        let dist = query.ssd(cand).sqrt();
        if dist < first.1 {
            second = first.1;
            first = (idx, dist);
        } else if dist < second {
            second = dist;
        }
    }
    Some((first.0, first.1, second))
}

fn match_one(
    query_idx: usize,
    query: &Descriptor,
    train: &[Descriptor],
    strategy: MatchStrategy,
) -> Option<DescriptorMatch> {
    let (train_idx, distance) = match strategy {
        MatchStrategy::Ssd { max_distance } => {
            let (idx, dist) = best_ssd(query, train)?;
            if max_distance.is_some_and(|limit| dist > limit) {
                return None;
            }
            (idx, dist)
        }
        MatchStrategy::Ncc { min_score } => {
            let (idx, score) = best_ncc(query, train)?;
            if min_score.is_some_and(|limit| score < limit) {
                return None;
            }
            (idx, score)
        }
        MatchStrategy::Ratio { ratio } => {
            let (idx, best, second) = two_nearest(query, train)?;
            if best >= ratio * second {
                return None;
            }
            (idx, best)
        }
    };
    Some(DescriptorMatch {
        query_idx,
        train_idx,
        distance,
    })
}

/// Matches `query` against `train`, ordered by query index.
///
/// Either side being empty yields no matches.
pub fn match_descriptors(
    query: &[Descriptor],
    train: &[Descriptor],
    strategy: MatchStrategy,
) -> Vec<DescriptorMatch> {
    match_descriptors_with(query, train, strategy, false)
}

/// Like [`match_descriptors`], splitting queries across threads when
/// `parallel` is set and the `rayon` feature is enabled. Output order and
/// content do not depend on `parallel`.
pub(crate) fn match_descriptors_with(
    query: &[Descriptor],
    train: &[Descriptor],
    strategy: MatchStrategy,
    parallel: bool,
) -> Vec<DescriptorMatch> {
    let _span = trace_span!(
        "match_descriptors",
        strategy = strategy.name(),
        query = query.len(),
        train = train.len(),
        parallel = parallel
    )
    .entered();
    if query.is_empty() || train.is_empty() {
        return Vec::new();
    }

    let mut matches = if parallel {
        match_parallel(query, train, strategy)
    } else {
        match_sequential(query, train, strategy)
    };
    if matches!(strategy, MatchStrategy::Ratio { .. }) {
        matches.truncate(RATIO_MATCH_CAP);
    }
    trace_event!("descriptor_matches", count = matches.len());
    matches
}

fn match_sequential(
    query: &[Descriptor],
    train: &[Descriptor],
    strategy: MatchStrategy,
) -> Vec<DescriptorMatch> {
    query
        .iter()
        .enumerate()
        .filter_map(|(idx, q)| match_one(idx, q, train, strategy))
        .collect()
}

#[cfg(feature = "rayon")]
fn match_parallel(
    query: &[Descriptor],
    train: &[Descriptor],
    strategy: MatchStrategy,
) -> Vec<DescriptorMatch> {
    query
        .par_iter()
        .enumerate()
        .filter_map(|(idx, q)| match_one(idx, q, train, strategy))
        .collect()
}

#[cfg(not(feature = "rayon"))]
fn match_parallel(
    query: &[Descriptor],
    train: &[Descriptor],
    strategy: MatchStrategy,
) -> Vec<DescriptorMatch> {
    match_sequential(query, train, strategy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::DESCRIPTOR_LEN;

    fn unit(idx: usize) -> Descriptor {
        let mut values = [0.0f32; DESCRIPTOR_LEN];
        values[idx] = 1.0;
        Descriptor::from_array(values)
    }

    #[test]
    fn ssd_ties_resolve_to_first_train_index() {
        let query = [unit(0)];
        let train = [unit(1), unit(2)];
        let matches = match_descriptors(&query, &train, MatchStrategy::ssd());
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].train_idx, 0);
        assert_eq!(matches[0].distance, 2.0);
    }

    #[test]
    fn ssd_threshold_rejects_distant_pairs() {
        let query = [unit(0)];
        let train = [unit(1)];
        let strategy = MatchStrategy::Ssd {
            max_distance: Some(1.0),
        };
        assert!(match_descriptors(&query, &train, strategy).is_empty());
    }

    #[test]
    fn ncc_rejects_orthogonal_descriptors() {
        let query = [unit(0), unit(3)];
        let train = [unit(1), unit(3)];
        let matches = match_descriptors(&query, &train, MatchStrategy::ncc());
        assert_eq!(
            matches,
            vec![DescriptorMatch {
                query_idx: 1,
                train_idx: 1,
                distance: 1.0,
            }]
        );
    }

    #[test]
    fn ratio_needs_two_train_descriptors() {
        let query = [unit(0)];
        assert!(match_descriptors(&query, &[unit(0)], MatchStrategy::ratio()).is_empty());
        let matches = match_descriptors(&query, &[unit(0), unit(1)], MatchStrategy::ratio());
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].train_idx, 0);
    }

    #[test]
    fn empty_sides_yield_no_matches() {
        assert!(match_descriptors(&[], &[unit(0)], MatchStrategy::ssd()).is_empty());
        assert!(match_descriptors(&[unit(0)], &[], MatchStrategy::ncc()).is_empty());
    }

    #[test]
    fn parallel_flag_does_not_change_matches() {
        let query: Vec<Descriptor> = (0..40).map(|i| unit(i % 7)).collect();
        let train: Vec<Descriptor> = (0..12).map(|i| unit(i % 9)).collect();
        for strategy in [MatchStrategy::ssd(), MatchStrategy::ncc(), MatchStrategy::ratio()] {
            assert_eq!(
                match_descriptors_with(&query, &train, strategy, true),
                match_descriptors_with(&query, &train, strategy, false)
            );
        }
    }
}
