use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::sync::LazyLock;

/// One audio item as supplied by the feature extractor.
///
/// Field names follow the camelCase layout of the feature JSON files.
/// Everything the scorer can live without is an `Option` (or an empty Vec)
/// so that absent data is a distinct, scoreable state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackFeature {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub artist: Option<String>,
    /// File path or URL written into the M3U output.
    #[serde(default)]
    pub path: String,

    #[serde(default)]
    pub duration_sec: f64,
    #[serde(default)]
    pub cue_in_sec: Option<f64>,
    #[serde(default)]
    pub cue_out_sec: Option<f64>,

    #[serde(default)]
    pub bpm: Option<f64>,
    /// Raw Camelot string as found in the source data ("8A", "12b", ...).
    /// Kept verbatim for display; see [`TrackFeature::key`] for the parsed form.
    #[serde(default)]
    pub key_camelot: Option<String>,

    /// 0..1 energy samples across the track.
    #[serde(default)]
    pub energy_curve: Option<Vec<f64>>,
    /// Phrase/bar start timestamps.
    #[serde(default)]
    pub downbeats: Option<Vec<f64>>,

    /// Vocal presence confidence, 0..1.
    #[serde(default)]
    pub vocality: Option<f64>,
    /// Free-form labels. An explicit `null` reads as no tags.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub tags: Vec<String>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

impl TrackFeature {
    /// Parsed Camelot key, `None` when absent or malformed.
    pub fn key(&self) -> Option<CamelotKey> {
        self.key_camelot.as_deref().and_then(CamelotKey::parse)
    }

    /// Start of the usable window (cue-in, or 0).
    pub fn start_at(&self) -> f64 {
        self.cue_in_sec.unwrap_or(0.0)
    }

    /// End of the usable window (cue-out, or the full duration).
    pub fn end_at(&self) -> f64 {
        self.cue_out_sec.unwrap_or(self.duration_sec)
    }

    pub fn minutes(&self) -> f64 {
        self.duration_sec / 60.0
    }

    /// Display label: "Artist - Title", falling back to the id for the title.
    pub fn label(&self) -> String {
        let title = self.title.as_deref().unwrap_or(&self.id);
        format!("{} - {}", self.artist.as_deref().unwrap_or("").trim(), title)
            .trim()
            .to_string()
    }
}

/// Camelot wheel mode: A = minor, B = major.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mode {
    A,
    B,
}

impl Mode {
    pub fn is_major(self) -> bool {
        self == Mode::B
    }
}

/// A position on the Camelot wheel (1-12) plus mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CamelotKey {
    number: u8,
    mode: Mode,
}

static CAMELOT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)([ABab])$").expect("valid camelot regex"));

impl CamelotKey {
    pub fn new(number: u8, mode: Mode) -> Option<Self> {
        (1..=12).contains(&number).then_some(Self { number, mode })
    }

    /// Parse "<1-12><A|B>" (mode letter case-insensitive). Surrounding
    /// whitespace is tolerated; anything else yields `None`.
    pub fn parse(s: &str) -> Option<Self> {
        let caps = CAMELOT_RE.captures(s.trim())?;
        let number: u8 = caps[1].parse().ok()?;
        let mode = match &caps[2] {
            "A" | "a" => Mode::A,
            _ => Mode::B,
        };
        Self::new(number, mode)
    }

    pub fn number(self) -> u8 {
        self.number
    }

    pub fn mode(self) -> Mode {
        self.mode
    }

    /// The two adjacent wheel positions, wrapping 12 → 1 and 1 → 12.
    pub fn neighbors(self) -> [u8; 2] {
        let n = self.number;
        [(n + 10) % 12 + 1, n % 12 + 1]
    }

    pub fn is_neighbor_of(self, other: CamelotKey) -> bool {
        other.neighbors().contains(&self.number)
    }
}

impl fmt::Display for CamelotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mode = match self.mode {
            Mode::A => 'A',
            Mode::B => 'B',
        };
        write!(f, "{}{}", self.number, mode)
    }
}
