use std::collections::HashSet;

use super::{SequenceBuilder, pick_start};
use crate::scoring::Scorer;
use crate::track::TrackFeature;

/// Nearest-neighbour sequencing: start at the track closest to the ideal
/// BPM, then keep appending the best-scoring unused track. No backtracking.
#[derive(Debug, Clone, Copy)]
pub struct GreedyBuilder<'c> {
    scorer: Scorer<'c>,
}

impl<'c> GreedyBuilder<'c> {
    pub fn new(scorer: Scorer<'c>) -> Self {
        Self { scorer }
    }
}

impl SequenceBuilder for GreedyBuilder<'_> {
    fn build<'a>(&self, pool: &'a [TrackFeature], target_minutes: f64) -> Vec<&'a TrackFeature> {
        let Some(start) = pick_start(pool, &self.scorer.config().limits) else {
            return Vec::new();
        };

        let mut used: HashSet<&str> = HashSet::with_capacity(pool.len());
        used.insert(start.id.as_str());
        let mut seq = vec![start];
        let mut duration_sec = start.duration_sec;

        while duration_sec / 60.0 < target_minutes {
            let current = seq[seq.len() - 1];

            // Strictly-greater keeps the first-seen track on ties.
            let mut best: Option<(&TrackFeature, f64)> = None;
            for cand in pool.iter().filter(|t| !used.contains(t.id.as_str())) {
                let s = self.scorer.score(current, cand);
                if best.is_none_or(|(_, b)| s > b) {
                    best = Some((cand, s));
                }
            }

            let Some((next, s)) = best else {
                log::debug!(
                    "Pool exhausted at {:.1}/{:.1} min",
                    duration_sec / 60.0,
                    target_minutes
                );
                break;
            };
            log::trace!("{} -> {} ({:.3})", current.id, next.id, s);
            used.insert(next.id.as_str());
            seq.push(next);
            duration_sec += next.duration_sec;
        }

        log::debug!(
            "Greedy sequence: {} tracks, {:.1} min",
            seq.len(),
            duration_sec / 60.0
        );
        seq
    }

    fn name(&self) -> &'static str {
        "greedy"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MixConfig;
    use crate::sequence::test_support::{pool, track};
    use crate::sequence::total_minutes;

    fn ids(seq: &[&TrackFeature]) -> Vec<String> {
        seq.iter().map(|t| t.id.clone()).collect()
    }

    #[test]
    fn test_empty_pool() {
        let config = MixConfig::default();
        let b = GreedyBuilder::new(Scorer::new(&config));
        assert!(b.build(&[], 60.0).is_empty());
    }

    #[test]
    fn test_single_track() {
        let config = MixConfig::default();
        let b = GreedyBuilder::new(Scorer::new(&config));
        let pool = vec![track("only", 128.0, "8A", 300.0)];
        assert_eq!(ids(&b.build(&pool, 30.0)), vec!["only"]);
    }

    #[test]
    fn test_three_track_scenario() {
        let config = MixConfig::default();
        let b = GreedyBuilder::new(Scorer::new(&config));
        let pool = vec![
            track("A", 128.0, "8A", 300.0),
            track("B", 129.0, "8A", 300.0),
            track("C", 90.0, "3B", 300.0),
        ];
        let seq = b.build(&pool, 8.0);
        assert_eq!(ids(&seq), vec!["A", "B"]);
        assert_eq!(total_minutes(&seq) * 60.0, 600.0);

        // Longer target pulls in the leftover
        assert_eq!(ids(&b.build(&pool, 12.0)), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_pool_too_small_for_target() {
        let config = MixConfig::default();
        let b = GreedyBuilder::new(Scorer::new(&config));
        let pool = pool();
        let seq = b.build(&pool, 600.0);
        assert_eq!(seq.len(), pool.len());
    }

    #[test]
    fn test_zero_duration_tracks_terminate() {
        let config = MixConfig::default();
        let b = GreedyBuilder::new(Scorer::new(&config));
        let pool = vec![
            track("z1", 128.0, "8A", 0.0),
            track("z2", 128.0, "8A", 0.0),
            track("z3", 128.0, "9A", 0.0),
        ];
        let seq = b.build(&pool, 10.0);
        assert_eq!(seq.len(), 3);
    }

    #[test]
    fn test_no_duplicates() {
        let config = MixConfig::default();
        let b = GreedyBuilder::new(Scorer::new(&config));
        let pool = pool();
        for target in [0.0, 5.0, 12.0, 20.0, 45.0, 1000.0] {
            let seq = b.build(&pool, target);
            let unique: HashSet<&str> = seq.iter().map(|t| t.id.as_str()).collect();
            assert_eq!(unique.len(), seq.len());
        }
    }

    #[test]
    fn test_tie_goes_to_first_seen() {
        let config = MixConfig::default();
        let b = GreedyBuilder::new(Scorer::new(&config));
        let pool = vec![
            track("start", 128.0, "8A", 300.0),
            track("twin1", 128.0, "8A", 300.0),
            track("twin2", 128.0, "8A", 300.0),
        ];
        assert_eq!(ids(&b.build(&pool, 6.0)), vec!["start", "twin1"]);
    }
}
