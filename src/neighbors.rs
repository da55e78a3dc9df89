use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::cmp::Ordering;
use thiserror::Error;

use crate::config::MixConfig;
use crate::scoring::Scorer;
use crate::track::TrackFeature;

/// Default number of follow-ups kept per track.
pub const TOP_K: usize = 10;

#[derive(Error, Debug)]
pub enum NeighborError {
    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
    #[error("No track with id \"{0}\"")]
    UnknownTrack(String),
}

/// Best next tracks for one track, highest score first.
#[derive(Debug, Clone, PartialEq)]
pub struct Followups {
    pub track_id: String,
    pub suggestions: Vec<(String, f64)>,
}

/// Rank every other track as a follow-up to `track`, keeping the top `k`.
fn rank_followups(scorer: &Scorer<'_>, pool: &[TrackFeature], index: usize, k: usize) -> Followups {
    let current = &pool[index];
    let mut scored: Vec<(usize, f64)> = pool
        .iter()
        .enumerate()
        .filter(|&(j, _)| j != index)
        .map(|(j, other)| (j, scorer.score(current, other)))
        .collect();

    // Stable: equal scores keep pool order
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    scored.truncate(k);

    Followups {
        track_id: current.id.clone(),
        suggestions: scored
            .into_iter()
            .map(|(j, s)| (pool[j].id.clone(), s))
            .collect(),
    }
}

/// Follow-up suggestions for a single track.
pub fn followups_for(
    pool: &[TrackFeature],
    config: &MixConfig,
    id: &str,
    k: usize,
) -> Result<Followups, NeighborError> {
    let index = pool
        .iter()
        .position(|t| t.id == id)
        .ok_or_else(|| NeighborError::UnknownTrack(id.to_string()))?;
    Ok(rank_followups(&Scorer::new(config), pool, index, k))
}

/// Top-`k` follow-ups for every track in the pool, scored in parallel on
/// `jobs` threads. Results come back in pool order.
pub fn suggest_followups(
    pool: &[TrackFeature],
    config: &MixConfig,
    k: usize,
    jobs: usize,
    show_progress: bool,
) -> Result<Vec<Followups>, NeighborError> {
    let n = pool.len();
    if n == 0 {
        return Ok(Vec::new());
    }

    log::info!("Scoring {} follow-up pairs on {} threads", n * (n - 1), jobs);

    let pb = if show_progress {
        ProgressBar::new(n as u64)
    } else {
        ProgressBar::hidden()
    };
    if let Ok(style) = ProgressStyle::with_template(
        "{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} tracks ({eta} remaining)",
    ) {
        pb.set_style(style.progress_chars("=>-"));
    }

    let threads = rayon::ThreadPoolBuilder::new().num_threads(jobs).build()?;
    let scorer = Scorer::new(config);

    let results: Vec<Followups> = threads.install(|| {
        (0..n)
            .into_par_iter()
            .map(|i| {
                let f = rank_followups(&scorer, pool, i, k);
                pb.inc(1);
                f
            })
            .collect()
    });

    pb.finish_and_clear();
    Ok(results)
}
