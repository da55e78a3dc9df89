use std::collections::HashMap;

use serde::Deserialize;
use thiserror::Error;

use crate::config::{LimitOverrides, MixConfig, Overrides, TransitionOverrides, WeightOverrides};

#[derive(Error, Debug, PartialEq)]
pub enum PresetError {
    #[error("Unknown preset \"{name}\" (available: {available})")]
    Unknown { name: String, available: String },
}

/// A named bundle of partial table overrides.
#[derive(Debug, Clone, PartialEq)]
pub struct Preset {
    pub name: String,
    pub notes: String,
    pub overrides: Overrides,
}

/// Config file preset definition (deserialized from TOML).
#[derive(Debug, Deserialize, Clone)]
pub struct PresetConfig {
    pub name: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub weights: WeightOverrides,
    #[serde(default)]
    pub limits: LimitOverrides,
    #[serde(default)]
    pub transition: TransitionOverrides,
}

/// Built-in techno presets plus any user-defined ones.
#[derive(Debug)]
pub struct PresetRegistry {
    presets: Vec<Preset>,
    /// Maps lowercase preset name → index in `presets`
    name_to_index: HashMap<String, usize>,
}

impl Default for PresetRegistry {
    fn default() -> Self {
        Self::new(&[])
    }
}

impl PresetRegistry {
    /// Build the registry. A custom preset whose name matches a built-in one
    /// replaces it; other custom presets are appended in file order.
    pub fn new(custom: &[PresetConfig]) -> Self {
        let mut presets = builtin_presets();

        for c in custom {
            let preset = Preset {
                name: c.name.to_lowercase(),
                notes: c.notes.clone().unwrap_or_default(),
                overrides: Overrides {
                    weights: c.weights.clone(),
                    limits: c.limits.clone(),
                    transition: c.transition.clone(),
                },
            };
            match presets.iter_mut().find(|p| p.name == preset.name) {
                Some(existing) => {
                    log::debug!("Custom preset \"{}\" replaces built-in", preset.name);
                    *existing = preset;
                }
                None => presets.push(preset),
            }
        }

        let name_to_index = presets
            .iter()
            .enumerate()
            .map(|(i, p)| (p.name.clone(), i))
            .collect();

        Self {
            presets,
            name_to_index,
        }
    }

    pub fn get(&self, name: &str) -> Option<&Preset> {
        self.name_to_index
            .get(&name.to_lowercase())
            .map(|&i| &self.presets[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Preset> {
        self.presets.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.presets.iter().map(|p| p.name.as_str()).collect()
    }

    /// Return a new config with the named preset merged over `base`.
    pub fn apply(&self, base: &MixConfig, name: &str) -> Result<MixConfig, PresetError> {
        let preset = self.get(name).ok_or_else(|| PresetError::Unknown {
            name: name.to_string(),
            available: self.names().join(", "),
        })?;
        log::debug!("Applying preset \"{}\"", preset.name);
        Ok(base.with_overrides(&preset.overrides))
    }
}

fn limits(lo: f64, hi: f64, ideal: f64, tol: f64, stretch: f64) -> LimitOverrides {
    LimitOverrides {
        max_stretch_pct: Some(stretch),
        bpm_ideal: Some(ideal),
        bpm_tol: Some(tol),
        bpm_soft_range: Some((lo, hi)),
    }
}

fn techno_beats(beats: u32) -> TransitionOverrides {
    TransitionOverrides {
        techno_crossfade_beats: Some(beats),
        ..Default::default()
    }
}

fn builtin_presets() -> Vec<Preset> {
    vec![
        Preset {
            name: "deep_minimal".into(),
            notes: "Long build-ups and filtered entries, low vocals, no sudden energy jumps".into(),
            overrides: Overrides {
                limits: limits(122.0, 126.0, 124.0, 3.0, 4.0),
                transition: techno_beats(32),
                weights: WeightOverrides {
                    vocal: Some(0.07),
                    energy: Some(0.18),
                    ..Default::default()
                },
            },
        },
        Preset {
            name: "classic".into(),
            notes: "Harmonic and energy smoothing, 24-beat crossfade, low-end handover".into(),
            overrides: Overrides {
                limits: limits(126.0, 130.0, 128.0, 4.0, 6.0),
                transition: techno_beats(24),
                weights: WeightOverrides::default(),
            },
        },
        Preset {
            name: "peak_warehouse".into(),
            notes: "Tighter, allows larger energy lifts, switch on phrase boundaries".into(),
            overrides: Overrides {
                limits: limits(128.0, 134.0, 130.0, 3.0, 5.0),
                transition: techno_beats(24),
                weights: WeightOverrides {
                    energy: Some(0.25),
                    vocal: Some(0.04),
                    ..Default::default()
                },
            },
        },
        Preset {
            name: "hard_techno".into(),
            notes: "Short decisive cuts, bass kill then swap".into(),
            overrides: Overrides {
                limits: limits(140.0, 150.0, 145.0, 4.0, 3.0),
                transition: techno_beats(12),
                weights: WeightOverrides {
                    tempo: Some(0.35),
                    energy: Some(0.25),
                    vocal: Some(0.03),
                    ..Default::default()
                },
            },
        },
        Preset {
            name: "hypnotic".into(),
            notes: "Very long layered blends, slow change, room for texture".into(),
            overrides: Overrides {
                limits: limits(130.0, 134.0, 132.0, 2.0, 5.0),
                transition: techno_beats(32),
                weights: WeightOverrides {
                    energy: Some(0.18),
                    phrase: Some(0.12),
                    ..Default::default()
                },
            },
        },
    ]
}
