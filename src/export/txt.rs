use chrono::{DateTime, SecondsFormat, Utc};

use crate::transitions::TransitionPlan;

/// Human-readable track list with a summary header.
pub fn to_txt(plan: &TransitionPlan<'_>, generated_at: DateTime<Utc>) -> String {
    let mut lines = Vec::with_capacity(plan.len() + 3);
    lines.push(format!(
        "# AutoMix Playlist {}",
        generated_at.to_rfc3339_opts(SecondsFormat::Secs, true)
    ));
    lines.push(format!(
        "# totalSec={} avgScore={:.3}",
        plan.total_sec.round() as i64,
        plan.avg_score
    ));
    lines.push(String::new());

    for (i, item) in plan.items.iter().enumerate() {
        let t = item.track;
        lines.push(format!(
            "{}. {} | {} | bpm={} | key={}",
            i + 1,
            t.title.as_deref().unwrap_or(&t.id),
            t.artist.as_deref().unwrap_or(""),
            t.bpm.map(|b| b.to_string()).unwrap_or_else(|| "?".into()),
            t.key_camelot.as_deref().unwrap_or("?"),
        ));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TransitionDefaults;
    use crate::track::TrackFeature;
    use crate::transitions::TransitionPlanner;
    use chrono::TimeZone;

    #[test]
    fn test_txt_layout() {
        let a = TrackFeature {
            id: "a".into(),
            title: Some("Minus".into()),
            artist: Some("Robert Hood".into()),
            duration_sec: 330.0,
            bpm: Some(130.5),
            key_camelot: Some("5A".into()),
            ..Default::default()
        };
        let b = TrackFeature {
            id: "b".into(),
            duration_sec: 290.0,
            ..Default::default()
        };
        let defaults = TransitionDefaults::default();
        let plan = TransitionPlanner::new(&defaults)
            .plan(&[&a, &b], true)
            .with_avg_score(0.71234);
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 22, 15, 0).unwrap();

        assert_eq!(
            to_txt(&plan, at),
            "# AutoMix Playlist 2024-03-09T22:15:00Z\n\
             # totalSec=620 avgScore=0.712\n\
             \n\
             1. Minus | Robert Hood | bpm=130.5 | key=5A\n\
             2. b |  | bpm=? | key=?"
        );
    }
}
