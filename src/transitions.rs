use serde::Serialize;

use crate::config::TransitionDefaults;
use crate::track::TrackFeature;

/// Low edge of the high-pass sweep applied to the outgoing track.
pub const HIPASS_FROM_HZ: f64 = 80.0;
/// High edge of the high-pass sweep.
pub const HIPASS_TO_HZ: f64 = 260.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterMode {
    HipassRamp,
}

/// One automation directive applied during a crossfade window.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Automation {
    Filter {
        mode: FilterMode,
        from_hz: f64,
        to_hz: f64,
        duration_beats: u32,
    },
}

impl Automation {
    pub fn hipass_ramp(duration_beats: u32) -> Self {
        Automation::Filter {
            mode: FilterMode::HipassRamp,
            from_hz: HIPASS_FROM_HZ,
            to_hz: HIPASS_TO_HZ,
            duration_beats,
        }
    }
}

/// A track's placement in the finished mix.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistItem<'a> {
    pub track: &'a TrackFeature,
    pub start_at: f64,
    pub end_at: f64,
    /// Time-stretch to apply, in percent. Left for the renderer.
    pub stretch_pct: f64,
    /// Pitch shift to apply, in semitones. Left for the renderer.
    pub transpose_semitone: f64,
    /// Beats blended into the next item; 0 on the last item.
    pub crossfade_beats: u32,
    pub automation: Vec<Automation>,
}

impl PlaylistItem<'_> {
    /// Playback length of the cued window, in seconds.
    pub fn effective_sec(&self) -> f64 {
        self.end_at - self.start_at
    }
}

/// The ordered mix with its timing, ready for the exporters.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionPlan<'a> {
    pub items: Vec<PlaylistItem<'a>>,
    pub total_sec: f64,
    /// Mean pairwise compatibility; 0 when fewer than two items.
    pub avg_score: f64,
}

impl<'a> TransitionPlan<'a> {
    /// Attach the average transition score computed by the sequencing step.
    pub fn with_avg_score(self, avg_score: f64) -> Self {
        let avg_score = if self.items.len() < 2 { 0.0 } else { avg_score };
        Self { avg_score, ..self }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn tracks(&self) -> impl Iterator<Item = &'a TrackFeature> + '_ {
        self.items.iter().map(|it| it.track)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanOptions {
    /// Use the longer techno crossfade between tracks.
    pub techno: bool,
    /// Butt-splice tracks: no crossfade and no automation anywhere.
    pub simple_head_tail: bool,
}

impl Default for PlanOptions {
    fn default() -> Self {
        Self {
            techno: true,
            simple_head_tail: false,
        }
    }
}

/// Lays out timing and crossfades for an already-ordered sequence.
#[derive(Debug, Clone, Copy)]
pub struct TransitionPlanner<'c> {
    defaults: &'c TransitionDefaults,
}

impl<'c> TransitionPlanner<'c> {
    pub fn new(defaults: &'c TransitionDefaults) -> Self {
        Self { defaults }
    }

    pub fn plan<'a>(&self, sequence: &[&'a TrackFeature], techno: bool) -> TransitionPlan<'a> {
        self.plan_with(
            sequence,
            PlanOptions {
                techno,
                ..Default::default()
            },
        )
    }

    pub fn plan_with<'a>(&self, sequence: &[&'a TrackFeature], options: PlanOptions) -> TransitionPlan<'a> {
        let crossfade = if options.simple_head_tail {
            0
        } else if options.techno {
            self.defaults.techno_crossfade_beats
        } else {
            self.defaults.default_crossfade_beats
        };

        let items: Vec<PlaylistItem<'a>> = sequence
            .iter()
            .enumerate()
            .map(|(i, &track)| {
                let has_next = i + 1 < sequence.len();
                let crossfade_beats = if has_next { crossfade } else { 0 };
                let automation = if has_next && !options.simple_head_tail {
                    vec![Automation::hipass_ramp(crossfade_beats)]
                } else {
                    Vec::new()
                };
                PlaylistItem {
                    track,
                    start_at: track.start_at(),
                    end_at: track.end_at(),
                    stretch_pct: 0.0,
                    transpose_semitone: 0.0,
                    crossfade_beats,
                    automation,
                }
            })
            .collect();

        let total_sec = items.iter().map(PlaylistItem::effective_sec).sum();
        log::debug!("Planned {} items, {:.0}s total", items.len(), total_sec);

        TransitionPlan {
            items,
            total_sec,
            avg_score: 0.0,
        }
    }
}
