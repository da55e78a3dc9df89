use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use setmix::config::{AppConfig, MixConfig};
use setmix::neighbors::{self, Followups};
use setmix::presets::PresetRegistry;
use setmix::scoring::{ScoreBreakdown, Scorer};
use setmix::sequence::Strategy;
use setmix::transitions::{PlanOptions, TransitionPlan};
use setmix::{MixRequest, TrackFeature, export, library};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "setmix", version, about = "Harmonic DJ mix sequencer")]
struct Cli {
    /// Config file (defaults to ~/.config/setmix/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Preset to apply on top of the base tables
    #[arg(short, long, global = true)]
    preset: Option<String>,

    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a mix from a feature file and export it as M3U8, TXT and JSON
    Build {
        /// Feature file (.json/.yaml) or directory of feature files
        features: PathBuf,

        /// Output directory (defaults to config out_dir, then ./mixes)
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Target mix length in minutes
        #[arg(short, long)]
        minutes: Option<f64>,

        /// Beam width for the beam search builder
        #[arg(long)]
        beam: Option<usize>,

        /// Use the greedy builder instead of beam search
        #[arg(long, conflicts_with = "beam")]
        greedy: bool,

        /// Use the shorter default crossfade instead of the techno one
        #[arg(long)]
        no_techno: bool,

        /// Butt-splice tracks with no crossfade or automation
        #[arg(long)]
        simple_head_tail: bool,

        /// Output file basename (defaults to auto_mix_<timestamp>)
        #[arg(long)]
        name: Option<String>,

        /// Print the plan without writing any files
        #[arg(long)]
        dry_run: bool,
    },

    /// Show the score breakdown for playing one track after another
    Score {
        /// Feature file (.json/.yaml) or directory of feature files
        features: PathBuf,

        /// Id of the outgoing track
        from: String,

        /// Id of the incoming track
        to: String,
    },

    /// Suggest the best next tracks for one track, or for every track
    #[command(alias = "next")]
    Followups {
        /// Feature file (.json/.yaml) or directory of feature files
        features: PathBuf,

        /// Only suggest follow-ups for this track id
        #[arg(long)]
        id: Option<String>,

        /// Suggestions per track
        #[arg(short = 'n', long, default_value_t = neighbors::TOP_K)]
        limit: usize,

        /// Number of parallel workers (0 = auto-detect from config)
        #[arg(short = 'j', long, default_value = "0")]
        jobs: usize,
    },

    /// List the available presets
    Presets,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // Explicit config must load; the default one is optional
    let config = match &cli.config {
        Some(path) => AppConfig::read(path).context("Failed to load config")?,
        None => AppConfig::load(),
    };
    let registry = PresetRegistry::new(&config.presets);

    // Resolve preset: CLI > config. Applied only by commands that score.
    let preset = cli.preset.clone().unwrap_or_else(|| config.preset.clone());
    let mix_config = || -> Result<MixConfig> {
        let resolved = registry
            .apply(&config.base_mix(), &preset)
            .context("Failed to apply preset")?;
        log::info!("Preset: {}", preset);
        Ok(resolved)
    };

    match cli.command {
        Commands::Build {
            features,
            out,
            minutes,
            beam,
            greedy,
            no_techno,
            simple_head_tail,
            name,
            dry_run,
        } => {
            let mix_config = mix_config()?;
            let pool = load_pool(&features)?;

            let target_minutes = minutes.unwrap_or(config.target_minutes);
            if !target_minutes.is_finite() || target_minutes <= 0.0 {
                anyhow::bail!("Target length must be a positive number of minutes, got {target_minutes}");
            }
            let strategy = if greedy {
                Strategy::Greedy
            } else {
                Strategy::Beam {
                    width: beam.unwrap_or(config.beam_width),
                }
            };
            let request = MixRequest {
                target_minutes,
                strategy,
                plan: PlanOptions {
                    techno: !no_techno,
                    simple_head_tail,
                },
            };

            let plan = setmix::build_mix(&pool, &mix_config, &request);
            print_plan(&plan);

            if dry_run {
                println!("\nDRY RUN: no files written");
                return Ok(());
            }

            let out_dir = out.unwrap_or_else(|| config.resolve_out_dir());
            let basename = name.unwrap_or_else(|| export::default_basename(chrono::Local::now()));
            let files = export::write_plan(&plan, &out_dir, &basename)
                .context("Failed to write playlist")?;

            println!();
            println!("Saved:");
            println!("  {}", files.m3u.display());
            println!("  {}", files.txt.display());
            println!("  {}", files.json.display());
        }

        Commands::Score { features, from, to } => {
            let mix_config = mix_config()?;
            let pool = load_pool(&features)?;
            let a = find_track(&pool, &from)?;
            let b = find_track(&pool, &to)?;

            let breakdown = Scorer::new(&mix_config).breakdown(a, b);
            println!("{}  ->  {}", a.label(), b.label());
            println!();
            print_breakdown(&breakdown, &mix_config);
        }

        Commands::Followups {
            features,
            id,
            limit,
            jobs,
        } => {
            let mix_config = mix_config()?;
            let pool = load_pool(&features)?;

            let results = match id {
                Some(id) => vec![neighbors::followups_for(&pool, &mix_config, &id, limit)?],
                None => {
                    let workers = if jobs > 0 { jobs } else { config.resolve_workers() };
                    neighbors::suggest_followups(&pool, &mix_config, limit, workers, true)
                        .context("Follow-up scoring failed")?
                }
            };

            for f in &results {
                print_followups(f, &pool);
            }
        }

        Commands::Presets => {
            for line in preset_rows(&registry, &config.base_mix(), &preset) {
                println!("{line}");
            }
            println!();
            println!("BPM=ideal tempo  Range=soft BPM range  Str%=max stretch  XF=techno crossfade beats");
            if registry.get(&preset).is_some() {
                println!("* = active");
            } else {
                println!("Active preset \"{preset}\" is not defined; pick one of the above");
            }
        }
    }

    Ok(())
}

/// Preset table rows, header first. The active preset is marked with `*`.
fn preset_rows(registry: &PresetRegistry, base: &MixConfig, active: &str) -> Vec<String> {
    let mut rows = vec![
        format!(
            "{:<16} {:>5} {:>11} {:>5} {:>3}  {}",
            "Preset", "BPM", "Range", "Str%", "XF", "Notes"
        ),
        "-".repeat(90),
    ];
    for p in registry.iter() {
        let resolved = base.with_overrides(&p.overrides);
        let limits = &resolved.limits;
        let (lo, hi) = limits.bpm_soft_range;
        let marker = if p.name.eq_ignore_ascii_case(active) { "*" } else { " " };
        rows.push(format!(
            "{}{:<15} {:>5.0} {:>5.0}-{:<5.0} {:>5.1} {:>3}  {}",
            marker,
            p.name,
            limits.bpm_ideal,
            lo,
            hi,
            limits.max_stretch_pct,
            resolved.transition.techno_crossfade_beats,
            p.notes,
        ));
    }
    rows
}

fn load_pool(path: &Path) -> Result<Vec<TrackFeature>> {
    let pool = library::load_tracks(path)
        .with_context(|| format!("Failed to load features from {}", path.display()))?;
    log::info!("Loaded {} tracks from {}", pool.len(), path.display());
    Ok(pool)
}

fn find_track<'a>(pool: &'a [TrackFeature], id: &str) -> Result<&'a TrackFeature> {
    pool.iter()
        .find(|t| t.id == id)
        .with_context(|| format!("No track with id \"{id}\""))
}

/// Truncate long labels to fit a table column.
fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() > width {
        let head: String = s.chars().take(width.saturating_sub(3)).collect();
        format!("{head}...")
    } else {
        s.to_string()
    }
}

fn print_plan(plan: &TransitionPlan<'_>) {
    println!(
        "{:>3}  {:<40} {:>6} {:>4} {:>6}  {:>4}",
        "#", "Track", "BPM", "Key", "Min", "XF"
    );
    println!("{}", "-".repeat(72));

    for (i, item) in plan.items.iter().enumerate() {
        let t = item.track;
        let bpm = t.bpm.map(|b| format!("{b:.1}")).unwrap_or_else(|| "?".into());
        let key = t.key_camelot.as_deref().unwrap_or("?");
        println!(
            "{:>3}  {:<40} {:>6} {:>4} {:>6.1}  {:>4}",
            i + 1,
            truncate(&t.label(), 40),
            bpm,
            key,
            item.effective_sec() / 60.0,
            item.crossfade_beats,
        );
    }

    println!();
    println!(
        "{} tracks, {:.1} min, avg score {:.3}",
        plan.len(),
        plan.total_sec / 60.0,
        plan.avg_score
    );
}

fn print_breakdown(b: &ScoreBreakdown, config: &MixConfig) {
    let w = &config.weights;
    println!("{:<8} {:>6} {:>7}", "Part", "Score", "Weight");
    println!("{}", "-".repeat(23));
    println!("{:<8} {:>6.3} {:>7.2}", "key", b.key, w.key);
    println!("{:<8} {:>6.3} {:>7.2}", "tempo", b.tempo, w.tempo);
    println!("{:<8} {:>6.3} {:>7.2}", "energy", b.energy, w.energy);
    println!("{:<8} {:>6.3} {:>7.2}", "phrase", b.phrase, w.phrase);
    println!("{:<8} {:>6.3} {:>7.2}", "vocal", b.vocal_penalty, w.vocal);
    println!("{}", "-".repeat(23));
    println!("{:<8} {:>6.3}", "total", b.total);
}

fn print_followups(f: &Followups, pool: &[TrackFeature]) {
    let label = |id: &str| {
        pool.iter()
            .find(|t| t.id == id)
            .map(|t| t.label())
            .unwrap_or_else(|| id.to_string())
    };

    println!("{}", label(&f.track_id));
    if f.suggestions.is_empty() {
        println!("  (no other tracks)");
    }
    for (id, score) in &f.suggestions {
        println!("  {:.3}  {}", score, truncate(&label(id), 60));
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_rows_with_undefined_active_preset() {
        let registry = PresetRegistry::default();
        let rows = preset_rows(&registry, &MixConfig::default(), "gabber");

        assert_eq!(rows.len(), 2 + registry.iter().count());
        assert!(rows.iter().skip(2).all(|r| r.starts_with(' ')));
        assert!(rows.iter().any(|r| r.contains("hard_techno")));
        assert!(registry.apply(&MixConfig::default(), "gabber").is_err());
    }

    #[test]
    fn test_preset_rows_mark_active() {
        let registry = PresetRegistry::default();
        let rows = preset_rows(&registry, &MixConfig::default(), "Classic");
        let marked: Vec<&String> = rows.iter().filter(|r| r.starts_with('*')).collect();
        assert_eq!(marked.len(), 1);
        assert!(marked[0].starts_with("*classic"));
        assert!(marked[0].contains("126-130"));
    }
}
