use std::collections::HashSet;
use std::path::{Path, PathBuf};

use thiserror::Error;
use walkdir::WalkDir;

use crate::track::TrackFeature;

/// Feature file extensions we read.
pub const FEATURE_EXTENSIONS: &[&str] = &["json", "yaml", "yml"];

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("IO error reading {}: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid JSON in {}: {}", .path.display(), .source)]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Invalid YAML in {}: {}", .path.display(), .source)]
    Yaml {
        path: PathBuf,
        source: serde_yaml::Error,
    },
    #[error("Unsupported feature file {} (expected .json, .yaml or .yml)", .0.display())]
    UnsupportedFormat(PathBuf),
    #[error("Duplicate track id \"{0}\"")]
    DuplicateId(String),
    #[error("Track \"{id}\" has invalid duration {duration}")]
    InvalidDuration { id: String, duration: f64 },
    #[error("Track \"{id}\" has invalid cue window {cue_in}..{cue_out}")]
    InvalidCue { id: String, cue_in: f64, cue_out: f64 },
}

pub type Result<T> = std::result::Result<T, LoadError>;

/// Load a track pool from a feature file, or from every feature file
/// under a directory (sorted by path).
pub fn load_tracks(path: &Path) -> Result<Vec<TrackFeature>> {
    let files = if path.is_dir() {
        feature_files(path)
    } else {
        vec![path.to_path_buf()]
    };

    let mut tracks = Vec::new();
    for file in &files {
        let mut batch = load_file(file)?;
        log::debug!("{}: {} tracks", file.display(), batch.len());
        tracks.append(&mut batch);
    }

    validate(&tracks)?;
    log::info!("Loaded {} tracks from {} file(s)", tracks.len(), files.len());
    Ok(tracks)
}

fn feature_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| extension(p).is_some_and(|ext| FEATURE_EXTENSIONS.contains(&ext.as_str())))
        .collect();
    files.sort();
    files
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}

fn load_file(path: &Path) -> Result<Vec<TrackFeature>> {
    let contents = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    match extension(path).as_deref() {
        Some("json") => parse_json(&contents).map_err(|source| LoadError::Json {
            path: path.to_path_buf(),
            source,
        }),
        Some("yaml" | "yml") => parse_yaml(&contents).map_err(|source| LoadError::Yaml {
            path: path.to_path_buf(),
            source,
        }),
        _ => Err(LoadError::UnsupportedFormat(path.to_path_buf())),
    }
}

pub fn parse_json(contents: &str) -> serde_json::Result<Vec<TrackFeature>> {
    serde_json::from_str(contents)
}

pub fn parse_yaml(contents: &str) -> std::result::Result<Vec<TrackFeature>, serde_yaml::Error> {
    serde_yaml::from_str(contents)
}

/// Structural checks the sequencer relies on: unique ids, non-negative
/// durations and a cue window that does not run backwards. Keys and tempos are not checked; the scorer
/// copes with anything there.
pub fn validate(tracks: &[TrackFeature]) -> Result<()> {
    let mut seen: HashSet<&str> = HashSet::with_capacity(tracks.len());
    for t in tracks {
        if !seen.insert(t.id.as_str()) {
            return Err(LoadError::DuplicateId(t.id.clone()));
        }
        if !t.duration_sec.is_finite() || t.duration_sec < 0.0 {
            return Err(LoadError::InvalidDuration {
                id: t.id.clone(),
                duration: t.duration_sec,
            });
        }
        let (cue_in, cue_out) = (t.start_at(), t.end_at());
        if !cue_in.is_finite() || !cue_out.is_finite() || cue_in < 0.0 || cue_in > cue_out {
            return Err(LoadError::InvalidCue {
                id: t.id.clone(),
                cue_in,
                cue_out,
            });
        }
        if cue_out > t.duration_sec {
            log::warn!(
                "Track \"{}\": cue-out {:.1}s is past the end ({:.1}s)",
                t.id,
                cue_out,
                t.duration_sec
            );
        }
        if t.key_camelot.is_some() && t.key().is_none() {
            log::warn!(
                "Track \"{}\": unrecognised Camelot key {:?}, scoring it as neutral",
                t.id,
                t.key_camelot.as_deref().unwrap_or("")
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const JSON: &str = r#"[
        {"id": "a", "title": "Alpha", "durationSec": 300, "bpm": 128, "keyCamelot": "8A", "path": "/m/a.flac"},
        {"id": "b", "durationSec": 280.5, "keyCamelot": "??", "energyCurve": [0.4, 0.6]}
    ]"#;

    #[test]
    fn test_parse_json() {
        let tracks = parse_json(JSON).unwrap();
        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0].title.as_deref(), Some("Alpha"));
        assert_eq!(tracks[1].bpm, None);
        assert!(tracks[1].key().is_none());
        assert!(validate(&tracks).is_ok());
    }

    #[test]
    fn test_null_optional_fields() {
        let json = r#"[
            {"id": "a", "durationSec": 300, "bpm": 128, "keyCamelot": "8A", "path": "/a.flac", "tags": null},
            {"id": "b", "durationSec": 300, "energyCurve": null, "downbeats": null, "tags": ["peak"]}
        ]"#;
        let tracks = parse_json(json).unwrap();
        assert!(tracks[0].tags.is_empty());
        assert!(tracks[1].energy_curve.is_none());
        assert!(tracks[1].downbeats.is_none());
        assert_eq!(tracks[1].tags, vec!["peak".to_string()]);
        assert!(validate(&tracks).is_ok());
    }

    #[test]
    fn test_cue_window_checks() {
        let cued = |cue_in: Option<f64>, cue_out: Option<f64>| TrackFeature {
            id: "c".into(),
            duration_sec: 300.0,
            cue_in_sec: cue_in,
            cue_out_sec: cue_out,
            ..Default::default()
        };

        assert!(validate(&[cued(Some(10.0), Some(290.0))]).is_ok());
        // Past the end only warns
        assert!(validate(&[cued(None, Some(320.0))]).is_ok());

        let err = validate(&[cued(Some(200.0), Some(100.0))]).unwrap_err();
        assert!(matches!(err, LoadError::InvalidCue { cue_in, cue_out, .. } if cue_in == 200.0 && cue_out == 100.0));
        // Cue-in past the full duration with no cue-out
        assert!(validate(&[cued(Some(400.0), None)]).is_err());
        assert!(validate(&[cued(Some(-1.0), None)]).is_err());
        assert!(validate(&[cued(Some(f64::NAN), None)]).is_err());
    }

    #[test]
    fn test_parse_yaml() {
        let yaml = "
- id: y1
  durationSec: 310
  bpm: 130
  keyCamelot: 9B
  downbeats: [0.0, 1.85, 3.7]
";
        let tracks = parse_yaml(yaml).unwrap();
        assert_eq!(tracks[0].id, "y1");
        assert_eq!(tracks[0].key().unwrap().to_string(), "9B");
        assert_eq!(tracks[0].downbeats.as_ref().unwrap().len(), 3);
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let mut tracks = parse_json(JSON).unwrap();
        tracks[1].id = "a".into();
        assert!(matches!(validate(&tracks), Err(LoadError::DuplicateId(id)) if id == "a"));
    }

    #[test]
    fn test_negative_duration_rejected() {
        let mut tracks = parse_json(JSON).unwrap();
        tracks[0].duration_sec = -1.0;
        assert!(matches!(validate(&tracks), Err(LoadError::InvalidDuration { .. })));
        tracks[0].duration_sec = f64::NAN;
        assert!(matches!(validate(&tracks), Err(LoadError::InvalidDuration { .. })));
    }

    #[test]
    fn test_load_file_and_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.json"), JSON).unwrap();
        fs::create_dir(dir.path().join("more")).unwrap();
        fs::write(
            dir.path().join("more").join("c.yml"),
            "- id: c\n  durationSec: 200\n",
        )
        .unwrap();
        fs::write(dir.path().join("notes.txt"), "not features").unwrap();

        let single = load_tracks(&dir.path().join("b.json")).unwrap();
        assert_eq!(single.len(), 2);

        let all = load_tracks(dir.path()).unwrap();
        let ids: Vec<&str> = all.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_load_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        assert!(matches!(load_tracks(&missing), Err(LoadError::Io { .. })));

        let bad = dir.path().join("bad.json");
        fs::write(&bad, "{not json").unwrap();
        assert!(matches!(load_tracks(&bad), Err(LoadError::Json { .. })));

        let csv = dir.path().join("tracks.csv");
        fs::write(&csv, "id,bpm").unwrap();
        assert!(matches!(load_tracks(&csv), Err(LoadError::UnsupportedFormat(_))));
    }
}
