//! Choosing which tracks go into the mix and in what order.

pub mod beam;
pub mod greedy;

pub use beam::BeamBuilder;
pub use greedy::GreedyBuilder;

use std::cmp::Ordering;
use std::collections::HashSet;

use crate::config::TempoLimits;
use crate::scoring::Scorer;
use crate::track::TrackFeature;

/// Default number of partial sequences kept between beam rounds.
pub const DEFAULT_BEAM_WIDTH: usize = 24;

/// Common contract of the sequencing strategies.
///
/// Output tracks are borrowed from `pool`, each included at most once.
/// An empty pool gives an empty sequence.
pub trait SequenceBuilder {
    fn build<'a>(&self, pool: &'a [TrackFeature], target_minutes: f64) -> Vec<&'a TrackFeature>;

    /// Name of this strategy (for logging)
    fn name(&self) -> &'static str;
}

/// Strategy selection, as chosen on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Greedy,
    Beam { width: usize },
}

impl Default for Strategy {
    fn default() -> Self {
        Strategy::Beam {
            width: DEFAULT_BEAM_WIDTH,
        }
    }
}

impl Strategy {
    pub fn build<'a>(
        self,
        scorer: Scorer<'_>,
        pool: &'a [TrackFeature],
        target_minutes: f64,
    ) -> Vec<&'a TrackFeature> {
        let builder: Box<dyn SequenceBuilder + '_> = match self {
            Strategy::Greedy => Box::new(GreedyBuilder::new(scorer)),
            Strategy::Beam { width } => Box::new(BeamBuilder::new(scorer, width)),
        };
        log::debug!(
            "Sequencing {} tracks with {} for {:.1} min",
            pool.len(),
            builder.name(),
            target_minutes
        );
        builder.build(pool, target_minutes)
    }
}

/// A partial sequence under construction, with the running sum of its
/// transition scores.
#[derive(Debug, Clone)]
pub struct Path<'a> {
    tracks: Vec<&'a TrackFeature>,
    score_sum: f64,
    duration_sec: f64,
}

impl<'a> Path<'a> {
    pub fn start(track: &'a TrackFeature) -> Self {
        Self {
            tracks: vec![track],
            score_sum: 0.0,
            duration_sec: track.duration_sec,
        }
    }

    /// A new path with `track` appended after a transition scored `score`.
    pub fn extend(&self, track: &'a TrackFeature, score: f64) -> Self {
        let mut tracks = Vec::with_capacity(self.tracks.len() + 1);
        tracks.extend_from_slice(&self.tracks);
        tracks.push(track);
        Self {
            tracks,
            score_sum: self.score_sum + score,
            duration_sec: self.duration_sec + track.duration_sec,
        }
    }

    pub fn tracks(&self) -> &[&'a TrackFeature] {
        &self.tracks
    }

    pub fn into_tracks(self) -> Vec<&'a TrackFeature> {
        self.tracks
    }

    pub fn last(&self) -> &'a TrackFeature {
        // A path is never empty: it is created from a start track.
        self.tracks[self.tracks.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn score_sum(&self) -> f64 {
        self.score_sum
    }

    /// Mean score per transition. A single-track path has no transitions
    /// and averages 0.0, so it never outranks a real multi-track path.
    pub fn avg_score(&self) -> f64 {
        if self.tracks.len() <= 1 {
            0.0
        } else {
            self.score_sum / (self.tracks.len() - 1) as f64
        }
    }

    pub fn minutes(&self) -> f64 {
        self.duration_sec / 60.0
    }

    pub fn used_ids(&self) -> HashSet<&'a str> {
        self.tracks.iter().map(|t| t.id.as_str()).collect()
    }
}

/// Descending by average score. NaN sorts as equal.
pub fn by_avg_score_desc(a: &Path<'_>, b: &Path<'_>) -> Ordering {
    b.avg_score()
        .partial_cmp(&a.avg_score())
        .unwrap_or(Ordering::Equal)
}

/// BPM used for start ranking; absent reads as 0.
fn ranking_bpm(track: &TrackFeature) -> f64 {
    track.bpm.filter(|b| b.is_finite()).unwrap_or(0.0)
}

/// The track closest to the ideal BPM; the first one wins ties.
pub fn pick_start<'a>(pool: &'a [TrackFeature], limits: &TempoLimits) -> Option<&'a TrackFeature> {
    pool.iter().min_by(|a, b| {
        limits
            .distance_to_ideal(ranking_bpm(a))
            .partial_cmp(&limits.distance_to_ideal(ranking_bpm(b)))
            .unwrap_or(Ordering::Equal)
    })
}

/// Up to `k` start tracks: those inside the soft BPM range (or the whole
/// pool if none are), closest to the ideal BPM first.
pub fn seed_candidates<'a>(
    pool: &'a [TrackFeature],
    limits: &TempoLimits,
    k: usize,
) -> Vec<&'a TrackFeature> {
    let mut seeds: Vec<&TrackFeature> = pool
        .iter()
        .filter(|t| limits.in_soft_range(ranking_bpm(t)))
        .collect();
    if seeds.is_empty() {
        seeds = pool.iter().collect();
    }
    seeds.sort_by(|a, b| {
        limits
            .distance_to_ideal(ranking_bpm(a))
            .partial_cmp(&limits.distance_to_ideal(ranking_bpm(b)))
            .unwrap_or(Ordering::Equal)
    });
    seeds.truncate(k);
    seeds
}

/// Unused tracks scored against `current`, best first. The sort is stable,
/// so equal scores keep pool order.
pub fn ranked_candidates<'a>(
    scorer: &Scorer<'_>,
    pool: &'a [TrackFeature],
    current: &TrackFeature,
    used: &HashSet<&str>,
) -> Vec<(&'a TrackFeature, f64)> {
    let mut cands: Vec<(&TrackFeature, f64)> = pool
        .iter()
        .filter(|t| !used.contains(t.id.as_str()))
        .map(|t| (t, scorer.score(current, t)))
        .collect();
    cands.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    cands
}

pub fn total_minutes(seq: &[&TrackFeature]) -> f64 {
    seq.iter().map(|t| t.duration_sec).sum::<f64>() / 60.0
}

/// Mean compatibility over consecutive pairs; 0.0 below two tracks.
pub fn sequence_avg_score(seq: &[&TrackFeature], scorer: &Scorer<'_>) -> f64 {
    if seq.len() < 2 {
        return 0.0;
    }
    let sum: f64 = seq.windows(2).map(|w| scorer.score(w[0], w[1])).sum();
    sum / (seq.len() - 1) as f64
}
