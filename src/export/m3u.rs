use crate::transitions::TransitionPlan;

/// Extended M3U: one `#EXTINF:<seconds>,<artist - title>` line plus the
/// path per item. Seconds are the cued window, rounded.
pub fn to_m3u(plan: &TransitionPlan<'_>) -> String {
    let mut lines = Vec::with_capacity(plan.len() * 2 + 1);
    lines.push("#EXTM3U".to_string());
    for item in &plan.items {
        let secs = item.effective_sec().round() as i64;
        lines.push(format!("#EXTINF:{},{}", secs, item.track.label()));
        lines.push(item.track.path.clone());
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TransitionDefaults;
    use crate::track::TrackFeature;
    use crate::transitions::TransitionPlanner;

    #[test]
    fn test_m3u_layout() {
        let a = TrackFeature {
            id: "a".into(),
            title: Some("Spastik".into()),
            artist: Some("Plastikman".into()),
            path: "/music/spastik.flac".into(),
            duration_sec: 300.4,
            ..Default::default()
        };
        let b = TrackFeature {
            id: "b".into(),
            path: "https://cdn.example/b.mp3".into(),
            duration_sec: 400.0,
            cue_in_sec: Some(10.0),
            cue_out_sec: Some(370.6),
            ..Default::default()
        };
        let defaults = TransitionDefaults::default();
        let plan = TransitionPlanner::new(&defaults).plan(&[&a, &b], true);

        assert_eq!(
            to_m3u(&plan),
            "#EXTM3U\n\
             #EXTINF:300,Plastikman - Spastik\n\
             /music/spastik.flac\n\
             #EXTINF:361,- b\n\
             https://cdn.example/b.mp3"
        );
    }

    #[test]
    fn test_m3u_empty_plan() {
        let defaults = TransitionDefaults::default();
        let plan = TransitionPlanner::new(&defaults).plan(&[], true);
        assert_eq!(to_m3u(&plan), "#EXTM3U");
    }
}
