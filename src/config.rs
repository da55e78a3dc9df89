use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::presets::PresetConfig;

/// Weights of the compatibility sub-scores. Not forced to sum to 1;
/// the combined score is clamped instead.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Weights {
    pub key: f64,
    pub tempo: f64,
    pub energy: f64,
    pub phrase: f64,
    pub vocal: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            key: 0.35,
            tempo: 0.30,
            energy: 0.20,
            phrase: 0.10,
            vocal: 0.05,
        }
    }
}

/// Tempo limits used by the tempo score and by start-track selection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TempoLimits {
    /// Largest time-stretch considered seamless, in percent.
    pub max_stretch_pct: f64,
    pub bpm_ideal: f64,
    pub bpm_tol: f64,
    /// Inclusive (low, high) band played without penalty.
    pub bpm_soft_range: (f64, f64),
}

impl TempoLimits {
    pub fn in_soft_range(&self, bpm: f64) -> bool {
        let (lo, hi) = self.bpm_soft_range;
        bpm >= lo && bpm <= hi
    }

    pub fn distance_to_ideal(&self, bpm: f64) -> f64 {
        (bpm - self.bpm_ideal).abs()
    }
}

impl Default for TempoLimits {
    fn default() -> Self {
        Self {
            max_stretch_pct: 6.0,
            bpm_ideal: 128.0,
            bpm_tol: 4.0,
            bpm_soft_range: (124.0, 136.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransitionDefaults {
    pub default_crossfade_beats: u32,
    pub techno_crossfade_beats: u32,
}

impl Default for TransitionDefaults {
    fn default() -> Self {
        Self {
            default_crossfade_beats: 16,
            techno_crossfade_beats: 24,
        }
    }
}

/// Everything the scorer, builders and planner read during one run.
///
/// Built once before sequencing and passed by reference; presets produce a
/// new value instead of mutating this one.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MixConfig {
    pub weights: Weights,
    pub limits: TempoLimits,
    pub transition: TransitionDefaults,
}

impl MixConfig {
    /// Shallow-merge `overrides` on top of `self`. Keys left `None` keep
    /// their current value.
    pub fn with_overrides(&self, overrides: &Overrides) -> MixConfig {
        let mut out = *self;

        let w = &overrides.weights;
        if let Some(v) = w.key {
            out.weights.key = v;
        }
        if let Some(v) = w.tempo {
            out.weights.tempo = v;
        }
        if let Some(v) = w.energy {
            out.weights.energy = v;
        }
        if let Some(v) = w.phrase {
            out.weights.phrase = v;
        }
        if let Some(v) = w.vocal {
            out.weights.vocal = v;
        }

        let l = &overrides.limits;
        if let Some(v) = l.max_stretch_pct {
            out.limits.max_stretch_pct = v;
        }
        if let Some(v) = l.bpm_ideal {
            out.limits.bpm_ideal = v;
        }
        if let Some(v) = l.bpm_tol {
            out.limits.bpm_tol = v;
        }
        if let Some(v) = l.bpm_soft_range {
            out.limits.bpm_soft_range = v;
        }

        let t = &overrides.transition;
        if let Some(v) = t.default_crossfade_beats {
            out.transition.default_crossfade_beats = v;
        }
        if let Some(v) = t.techno_crossfade_beats {
            out.transition.techno_crossfade_beats = v;
        }

        out
    }
}

/// Partial weight table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeightOverrides {
    pub key: Option<f64>,
    pub tempo: Option<f64>,
    pub energy: Option<f64>,
    pub phrase: Option<f64>,
    pub vocal: Option<f64>,
}

/// Partial tempo-limit table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitOverrides {
    pub max_stretch_pct: Option<f64>,
    pub bpm_ideal: Option<f64>,
    pub bpm_tol: Option<f64>,
    pub bpm_soft_range: Option<(f64, f64)>,
}

/// Partial transition table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransitionOverrides {
    pub default_crossfade_beats: Option<u32>,
    pub techno_crossfade_beats: Option<u32>,
}

/// A set of partial tables, as carried by a preset or the `[mix]` section
/// of the config file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Overrides {
    pub weights: WeightOverrides,
    pub limits: LimitOverrides,
    pub transition: TransitionOverrides,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {}: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse {}: {}", .path.display(), .source)]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Application configuration loaded from TOML config file.
/// All fields have sensible defaults; the config file is optional.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Base-table overrides applied before any preset.
    pub mix: Overrides,
    /// Default mix length in minutes.
    pub target_minutes: f64,
    /// Default beam width for the beam search builder.
    pub beam_width: usize,
    /// Preset applied when none is given on the command line.
    pub preset: String,
    /// Default output directory for playlist files.
    pub out_dir: Option<PathBuf>,
    /// Threads for the follow-up pass. 0 = auto-detect (cores / 2, min 1).
    pub workers: usize,
    /// User-defined presets (merged with the built-in ones).
    pub presets: Vec<PresetConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            mix: Overrides::default(),
            target_minutes: 60.0,
            beam_width: 24,
            preset: "classic".to_string(),
            out_dir: None,
            workers: 0,
            presets: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Load config from `~/.config/setmix/config.toml`.
    /// Returns default config if file doesn't exist.
    /// Logs a warning if the file exists but can't be read or parsed.
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) if path.exists() => match Self::read(&path) {
                Ok(config) => {
                    log::info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    log::warn!("{}. Using defaults.", e);
                    Self::default()
                }
            },
            _ => {
                log::debug!("No config file found, using defaults");
                Self::default()
            }
        }
    }

    /// Read an explicit config file. Unlike [`AppConfig::load`], failures
    /// are returned to the caller.
    pub fn read(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// Built-in defaults with the `[mix]` table merged in.
    pub fn base_mix(&self) -> MixConfig {
        MixConfig::default().with_overrides(&self.mix)
    }

    /// Resolve worker count: 0 → auto-detect (cores / 2, min 1).
    pub fn resolve_workers(&self) -> usize {
        if self.workers > 0 {
            self.workers
        } else {
            let cores = std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(2);
            (cores / 2).max(1)
        }
    }

    /// Resolve the output directory: config value, else `./mixes`.
    pub fn resolve_out_dir(&self) -> PathBuf {
        self.out_dir.clone().unwrap_or_else(|| PathBuf::from("mixes"))
    }

    /// Get the config file path.
    fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", crate::APP_NAME).map(|dirs| dirs.config_dir().join("config.toml"))
    }
}
