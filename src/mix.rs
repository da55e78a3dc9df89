use crate::config::MixConfig;
use crate::scoring::Scorer;
use crate::sequence::{self, Strategy};
use crate::track::TrackFeature;
use crate::transitions::{PlanOptions, TransitionPlan, TransitionPlanner};

/// What to build for one run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MixRequest {
    pub target_minutes: f64,
    pub strategy: Strategy,
    pub plan: PlanOptions,
}

impl Default for MixRequest {
    fn default() -> Self {
        Self {
            target_minutes: 60.0,
            strategy: Strategy::default(),
            plan: PlanOptions::default(),
        }
    }
}

/// Sequence `pool` and lay out the transitions: pool → builder → planner.
/// The returned plan carries the mean pairwise score of its order.
pub fn build_mix<'a>(pool: &'a [TrackFeature], config: &MixConfig, request: &MixRequest) -> TransitionPlan<'a> {
    let scorer = Scorer::new(config);
    let seq = request.strategy.build(scorer, pool, request.target_minutes);
    let avg = sequence::sequence_avg_score(&seq, &scorer);

    let plan = TransitionPlanner::new(&config.transition)
        .plan_with(&seq, request.plan)
        .with_avg_score(avg);

    log::info!(
        "Mix: {} of {} tracks, {:.1} min, avg score {:.3}",
        plan.len(),
        pool.len(),
        plan.total_sec / 60.0,
        plan.avg_score
    );
    plan
}
