//! Transition compatibility scoring.
//!
//! `score(a, b)` rates how well `b` follows `a` on a 0..1 scale from five
//! parts: Camelot key relation, tempo ratio, energy continuity across the
//! seam, phrase information and a vocal penalty on the incoming track.
//! Missing data never errors; each part falls back to a neutral value.

use serde::Serialize;

use crate::config::{MixConfig, TempoLimits};
use crate::track::TrackFeature;

/// Key score when either side has no usable Camelot key.
pub const NEUTRAL_KEY: f64 = 0.5;
/// Energy score when either side has no energy curve.
pub const NEUTRAL_ENERGY: f64 = 0.6;
/// Phrase score when downbeats are missing on either side.
pub const NEUTRAL_PHRASE: f64 = 0.5;
/// Phrase score when both sides have phrase structure.
pub const KNOWN_PHRASE: f64 = 0.7;

/// Floor used in place of a zero, negative, absent or non-finite BPM.
const BPM_FLOOR: f64 = 1e-6;
/// Fraction of the curve averaged at each end for the energy seam.
const ENERGY_WINDOW: f64 = 0.25;
const MAX_VOCAL_PENALTY: f64 = 0.2;

/// The individual parts of one transition score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub key: f64,
    pub tempo: f64,
    pub energy: f64,
    pub phrase: f64,
    /// Zero or negative.
    pub vocal_penalty: f64,
    /// Weighted, clamped combination.
    pub total: f64,
}

/// Compatibility scorer bound to one run's configuration.
#[derive(Debug, Clone, Copy)]
pub struct Scorer<'c> {
    config: &'c MixConfig,
}

impl<'c> Scorer<'c> {
    pub fn new(config: &'c MixConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &'c MixConfig {
        self.config
    }

    /// How well `b` follows `a`, in [0, 1].
    pub fn score(&self, a: &TrackFeature, b: &TrackFeature) -> f64 {
        self.breakdown(a, b).total
    }

    pub fn breakdown(&self, a: &TrackFeature, b: &TrackFeature) -> ScoreBreakdown {
        let w = &self.config.weights;
        let key = key_score(a, b);
        let tempo = tempo_score(a.bpm, b.bpm, &self.config.limits);
        let energy = energy_score(a, b);
        let phrase = phrase_score(a, b);
        let vocal_penalty = vocal_penalty(b);

        let total = w.key * key
            + w.tempo * tempo
            + w.energy * energy
            + w.phrase * phrase
            + w.vocal * (1.0 + vocal_penalty);

        ScoreBreakdown {
            key,
            tempo,
            energy,
            phrase,
            vocal_penalty,
            total: clamp01(total),
        }
    }
}

fn clamp01(x: f64) -> f64 {
    if x.is_nan() { 0.0 } else { x.clamp(0.0, 1.0) }
}

// ── Key ───────────────────────────────────────────────────────────────
// Same key 1.0, relative major/minor 0.85, adjacent wheel slot 0.8 (0.6
// with a mode change). No clean relation: 0.4, +0.05 when heading major.
pub fn key_score(a: &TrackFeature, b: &TrackFeature) -> f64 {
    let (Some(ka), Some(kb)) = (a.key(), b.key()) else {
        return NEUTRAL_KEY;
    };

    let same_number = ka.number() == kb.number();
    let same_mode = ka.mode() == kb.mode();
    let neighbor = kb.is_neighbor_of(ka);

    match (same_number, neighbor, same_mode) {
        (true, _, true) => 1.0,
        (true, _, false) => 0.85,
        (false, true, true) => 0.8,
        (false, true, false) => 0.6,
        _ => {
            if kb.mode().is_major() {
                0.45
            } else {
                0.4
            }
        }
    }
}

// ── Tempo ─────────────────────────────────────────────────────────────

fn usable_bpm(bpm: Option<f64>) -> f64 {
    match bpm {
        Some(b) if b.is_finite() && b > 0.0 => b,
        _ => BPM_FLOOR,
    }
}

/// `b / a` folded once into the half/double-time band. Ratios of exactly
/// 2.0 or 0.5 fold to 1.0.
pub fn folded_ratio(a_bpm: Option<f64>, b_bpm: Option<f64>) -> f64 {
    let ratio = usable_bpm(b_bpm) / usable_bpm(a_bpm);
    if ratio <= 0.5 {
        ratio * 2.0
    } else if ratio >= 2.0 {
        ratio / 2.0
    } else {
        ratio
    }
}

/// Ratio part of the tempo score, before the soft-range and ideal-BPM
/// adjustments. Linear 1→0 inside the stretch tolerance, then a 4× wider
/// decay floored at 0.05.
pub fn tempo_ratio_score(a_bpm: Option<f64>, b_bpm: Option<f64>, limits: &TempoLimits) -> f64 {
    let max_stretch = (limits.max_stretch_pct / 100.0).max(BPM_FLOOR);
    let diff = (1.0 - folded_ratio(a_bpm, b_bpm)).abs();
    if diff <= max_stretch {
        1.0 - diff / max_stretch
    } else {
        (1.0 - diff / (max_stretch * 4.0)).max(0.05)
    }
}

pub fn tempo_score(a_bpm: Option<f64>, b_bpm: Option<f64>, limits: &TempoLimits) -> f64 {
    let base = tempo_ratio_score(a_bpm, b_bpm, limits);
    let b = usable_bpm(b_bpm);
    if !limits.in_soft_range(b) {
        base * 0.6
    } else if limits.distance_to_ideal(b) <= limits.bpm_tol {
        (base + 0.1).min(1.0)
    } else {
        base
    }
}

// ── Energy ────────────────────────────────────────────────────────────

fn window_len(len: usize) -> usize {
    ((len as f64 * ENERGY_WINDOW) as usize).max(1)
}

fn head_mean(curve: &[f64]) -> Option<f64> {
    if curve.is_empty() {
        return None;
    }
    let n = window_len(curve.len());
    Some(curve[..n].iter().sum::<f64>() / n as f64)
}

fn tail_mean(curve: &[f64]) -> Option<f64> {
    if curve.is_empty() {
        return None;
    }
    let n = window_len(curve.len());
    Some(curve[curve.len() - n..].iter().sum::<f64>() / n as f64)
}

/// Continuity between the last quarter of `a` and the first quarter of `b`.
pub fn energy_score(a: &TrackFeature, b: &TrackFeature) -> f64 {
    let tail = a.energy_curve.as_deref().and_then(tail_mean);
    let head = b.energy_curve.as_deref().and_then(head_mean);
    match (tail, head) {
        (Some(t), Some(h)) => {
            let diff = (t - h).abs();
            let s = 1.0 - (diff * 1.2).min(1.0);
            if s.is_nan() { NEUTRAL_ENERGY } else { s.max(0.0) }
        }
        _ => NEUTRAL_ENERGY,
    }
}

// ── Phrase ────────────────────────────────────────────────────────────

fn has_phrase_grid(t: &TrackFeature) -> bool {
    t.downbeats.as_ref().is_some_and(|d| d.len() > 1)
}

pub fn phrase_score(a: &TrackFeature, b: &TrackFeature) -> f64 {
    if has_phrase_grid(a) && has_phrase_grid(b) {
        KNOWN_PHRASE
    } else {
        NEUTRAL_PHRASE
    }
}

// ── Vocals ────────────────────────────────────────────────────────────

/// 0 to -0.2, proportional to the incoming track's vocality.
pub fn vocal_penalty(b: &TrackFeature) -> f64 {
    match b.vocality {
        Some(v) if v.is_finite() => -(v.clamp(0.0, 1.0) * MAX_VOCAL_PENALTY).min(MAX_VOCAL_PENALTY),
        _ => 0.0,
    }
}
