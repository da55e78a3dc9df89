pub mod m3u;
pub mod txt;

pub use m3u::to_m3u;
pub use txt::to_txt;

use chrono::{DateTime, Local, Utc};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::transitions::TransitionPlan;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("IO error writing {}: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("JSON serialisation failed: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ExportError>;

/// Paths of the files written for one plan.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportedFiles {
    pub m3u: PathBuf,
    pub txt: PathBuf,
    pub json: PathBuf,
}

/// Pretty-printed JSON of the full plan, tracks included.
pub fn to_json(plan: &TransitionPlan<'_>) -> Result<String> {
    Ok(serde_json::to_string_pretty(plan)?)
}

/// `auto_mix_YYYYmmdd_HHMMSS` in local time.
pub fn default_basename(now: DateTime<Local>) -> String {
    format!("auto_mix_{}", now.format("%Y%m%d_%H%M%S"))
}

/// Write `<basename>.m3u8`, `<basename>.txt` and `<basename>.json` into
/// `out_dir`, creating it if needed.
pub fn write_plan(plan: &TransitionPlan<'_>, out_dir: &Path, basename: &str) -> Result<ExportedFiles> {
    std::fs::create_dir_all(out_dir).map_err(|source| ExportError::Io {
        path: out_dir.to_path_buf(),
        source,
    })?;

    let files = ExportedFiles {
        m3u: out_dir.join(format!("{basename}.m3u8")),
        txt: out_dir.join(format!("{basename}.txt")),
        json: out_dir.join(format!("{basename}.json")),
    };

    write_file(&files.m3u, &to_m3u(plan))?;
    write_file(&files.txt, &to_txt(plan, Utc::now()))?;
    write_file(&files.json, &to_json(plan)?)?;

    log::info!("Wrote {} items to {}/{}.*", plan.len(), out_dir.display(), basename);
    Ok(files)
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    std::fs::write(path, contents).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })
}
