//! Per-stage gap, eligibility and volume impact.

use crate::classifier::Classifier;
use crate::stages::StageId;
use growth_core::error::{GrowthError, GrowthResult};
use growth_core::types::{DerivedMetrics, Direction, Status, Target};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Output gained at the end of a stage if its rate reached the target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactEstimate {
    /// Extra output volume per period, rounded to the nearest unit.
    pub additional_volume: i64,
    /// Output volume the stage would produce at the target rate.
    pub projected_output: i64,
    /// Short human string, e.g. "+3 contratos/mês".
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageImpact {
    pub stage: StageId,
    pub current_rate: Option<f64>,
    pub target_rate: f64,
    /// `current - target` in percentage points, whatever the direction.
    pub gap_pp: Option<f64>,
    pub status: Status,
    pub sample_size: Option<f64>,
    pub eligible: bool,
    pub eligibility_reason: Option<String>,
    pub impact: Option<ImpactEstimate>,
    pub is_bottleneck: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StageImpactCalculator {
    classifier: Classifier,
}

impl StageImpactCalculator {
    pub fn new(classifier: Classifier) -> Self {
        Self { classifier }
    }

    pub fn min_sample(&self) -> u64 {
        self.classifier.thresholds().min_sample
    }

    /// Compute the impact row for one stage. Fails only when the target is
    /// invalid or belongs to a different metric than the stage's rate.
    pub fn compute_impact(
        &self,
        stage: StageId,
        derived: &DerivedMetrics,
        target: &Target,
        sample_size: Option<f64>,
    ) -> GrowthResult<StageImpact> {
        target.validate()?;
        if target.key != stage.rate_key() {
            return Err(GrowthError::InvalidInput(format!(
                "target {} does not apply to stage {} (expects {})",
                target.key,
                stage,
                stage.rate_key()
            )));
        }

        let current = derived.get(stage.rate_key());
        let gap_pp = current.map(|c| c - target.value);
        // A stage with no recorded volume carries no verdict, even if a rate
        // was supplied directly.
        let status = match sample_size {
            None => Status::NoData,
            Some(_) => self.classifier.classify_with_sample(
                current,
                target.value,
                target.direction,
                sample_size,
            ),
        };

        let min_sample = self.min_sample();
        let (eligible, eligibility_reason) = match sample_size {
            None => (false, Some("Sem volume registrado neste estágio".to_string())),
            Some(n) if n <= 0.0 => (false, Some("Sem volume registrado neste estágio".to_string())),
            Some(n) if n < min_sample as f64 => (
                false,
                Some(format!(
                    "Amostra insuficiente: {} de no mínimo {}",
                    n.round() as i64,
                    min_sample
                )),
            ),
            Some(_) if current.is_none() => {
                (false, Some("Taxa indefinida para este estágio".to_string()))
            }
            Some(_) => (true, None),
        };

        let impact = match (eligible, status, target.direction, current, sample_size) {
            (true, Status::Attention | Status::Critical, Direction::HigherIsBetter, Some(c), Some(n)) => {
                estimate(stage, n, c, target.value)
            }
            _ => None,
        };

        debug!(
            stage = %stage,
            current = ?current,
            target = target.value,
            status = %status,
            eligible,
            "Stage impact computed"
        );

        Ok(StageImpact {
            stage,
            current_rate: current,
            target_rate: target.value,
            gap_pp,
            status,
            sample_size,
            eligible,
            eligibility_reason,
            impact,
            is_bottleneck: false,
        })
    }
}

fn estimate(stage: StageId, denominator: f64, current: f64, target: f64) -> Option<ImpactEstimate> {
    let additional = (denominator * (target - current) / 100.0).round() as i64;
    if additional <= 0 {
        return None;
    }
    Some(ImpactEstimate {
        additional_volume: additional,
        projected_output: (denominator * target / 100.0).round() as i64,
        description: format!("+{} {}/mês", additional, stage.output_unit()),
    })
}

/// The eligible critical stage with the largest absolute gap. Ties go to
/// the earliest stage in funnel order.
pub fn primary_bottleneck(impacts: &[StageImpact]) -> Option<StageId> {
    let mut candidates: Vec<&StageImpact> = impacts
        .iter()
        .filter(|i| i.eligible && i.status == Status::Critical && i.gap_pp.is_some())
        .collect();
    candidates.sort_by_key(|i| (i.stage.profile() as u8, i.stage.order()));

    let mut best: Option<(&StageImpact, f64)> = None;
    for candidate in candidates {
        let gap = candidate.gap_pp.map(f64::abs).unwrap_or(0.0);
        match best {
            Some((_, best_gap)) if gap <= best_gap => {}
            _ => best = Some((candidate, gap)),
        }
    }
    best.map(|(i, _)| i.stage)
}

#[cfg(test)]
mod tests {
    use super::*;
    use growth_core::types::MetricKey;
    use proptest::prelude::*;

    fn derived_with(key: MetricKey, value: Option<f64>) -> DerivedMetrics {
        let mut d = DerivedMetrics::default();
        d.insert(key, value);
        d
    }

    fn calc() -> StageImpactCalculator {
        StageImpactCalculator::default()
    }

    // 1. Gap and status ---------------------------------------------------------

    #[test]
    fn test_gap_is_current_minus_target() {
        let stage = StageId::MeetingToContract;
        let d = derived_with(MetricKey::MeetingToContract, Some(15.0));
        let row = calc()
            .compute_impact(stage, &d, &stage.default_target(), Some(40.0))
            .unwrap();
        assert_eq!(row.gap_pp, Some(-10.0));
        assert_eq!(row.status, Status::Critical);
        assert!(row.eligible);
        assert_eq!(row.eligibility_reason, None);
    }

    #[test]
    fn test_impact_estimate_description() {
        let stage = StageId::MeetingToContract;
        let d = derived_with(MetricKey::MeetingToContract, Some(15.0));
        let row = calc()
            .compute_impact(stage, &d, &stage.default_target(), Some(40.0))
            .unwrap();
        let impact = row.impact.unwrap();
        // 40 meetings * (25% - 15%) = 4 more contracts.
        assert_eq!(impact.additional_volume, 4);
        assert_eq!(impact.projected_output, 10);
        assert_eq!(impact.description, "+4 contratos/mês");
    }

    #[test]
    fn test_ok_stage_has_no_impact() {
        let stage = StageId::LeadToMql;
        let d = derived_with(MetricKey::LeadToMql, Some(45.0));
        let row = calc()
            .compute_impact(stage, &d, &stage.default_target(), Some(200.0))
            .unwrap();
        assert_eq!(row.status, Status::Ok);
        assert_eq!(row.impact, None);
        assert_eq!(row.gap_pp, Some(5.0));
    }

    // 2. Eligibility ------------------------------------------------------------

    #[test]
    fn test_low_sample_is_ineligible_without_impact() {
        let stage = StageId::SqlToMeeting;
        let d = derived_with(MetricKey::SqlToMeeting, Some(10.0));
        let row = calc()
            .compute_impact(stage, &d, &stage.default_target(), Some(12.0))
            .unwrap();
        assert_eq!(row.status, Status::LowSample);
        assert!(!row.eligible);
        assert!(row.eligibility_reason.unwrap().contains("12"));
        assert_eq!(row.impact, None);
        // The raw rate is still reported.
        assert_eq!(row.current_rate, Some(10.0));
    }

    #[test]
    fn test_zero_denominator_is_no_data() {
        let stage = StageId::MqlToSql;
        let d = derived_with(MetricKey::MqlToSql, None);
        let row = calc()
            .compute_impact(stage, &d, &stage.default_target(), Some(0.0))
            .unwrap();
        assert_eq!(row.status, Status::NoData);
        assert_eq!(row.gap_pp, None);
        assert!(!row.eligible);
    }

    #[test]
    fn test_missing_volume_with_defined_rate_is_no_data() {
        let stage = StageId::MeetingToContract;
        let d = derived_with(MetricKey::MeetingToContract, Some(5.0));
        let row = calc()
            .compute_impact(stage, &d, &stage.default_target(), None)
            .unwrap();
        assert_eq!(row.status, Status::NoData);
        assert!(!row.eligible);
        assert_eq!(row.impact, None);
        assert_eq!(row.current_rate, Some(5.0));
        assert!(crate::rules::match_stage(stage, row.status).is_empty());
    }

    // 3. Invalid configuration -------------------------------------------------

    #[test]
    fn test_mismatched_target_is_rejected() {
        let d = derived_with(MetricKey::LeadToMql, Some(30.0));
        let wrong = StageId::MqlToSql.default_target();
        assert!(calc()
            .compute_impact(StageId::LeadToMql, &d, &wrong, Some(100.0))
            .is_err());
    }

    #[test]
    fn test_non_positive_target_is_rejected() {
        let d = derived_with(MetricKey::LeadToMql, Some(30.0));
        let mut target = StageId::LeadToMql.default_target();
        target.value = 0.0;
        assert!(matches!(
            calc().compute_impact(StageId::LeadToMql, &d, &target, Some(100.0)),
            Err(GrowthError::InvalidTarget { .. })
        ));
    }

    // 4. Bottleneck ------------------------------------------------------------

    fn row(stage: StageId, gap: f64, status: Status, eligible: bool) -> StageImpact {
        StageImpact {
            stage,
            current_rate: Some(stage.default_benchmark() + gap),
            target_rate: stage.default_benchmark(),
            gap_pp: Some(gap),
            status,
            sample_size: Some(100.0),
            eligible,
            eligibility_reason: None,
            impact: None,
            is_bottleneck: false,
        }
    }

    #[test]
    fn test_bottleneck_is_largest_critical_gap() {
        let rows = vec![
            row(StageId::LeadToMql, -20.0, Status::Critical, true),
            row(StageId::MqlToSql, -5.0, Status::Attention, true),
            row(StageId::SqlToMeeting, -25.0, Status::Critical, true),
            row(StageId::MeetingToContract, -40.0, Status::Critical, false),
        ];
        assert_eq!(primary_bottleneck(&rows), Some(StageId::SqlToMeeting));
    }

    #[test]
    fn test_bottleneck_tie_goes_to_earliest_stage() {
        let rows = vec![
            row(StageId::SqlToMeeting, -20.0, Status::Critical, true),
            row(StageId::LeadToMql, -20.0, Status::Critical, true),
        ];
        assert_eq!(primary_bottleneck(&rows), Some(StageId::LeadToMql));
    }

    #[test]
    fn test_no_critical_stage_means_no_bottleneck() {
        let rows = vec![row(StageId::LeadToMql, -5.0, Status::Attention, true)];
        assert_eq!(primary_bottleneck(&rows), None);
    }

    // 5. Properties --------------------------------------------------------------

    proptest! {
        #[test]
        fn prop_gap_sign_convention(current in 0.0f64..100.0, target in 0.1f64..100.0, lower in any::<bool>()) {
            let direction = if lower { Direction::LowerIsBetter } else { Direction::HigherIsBetter };
            let t = Target { key: MetricKey::LeadToMql, value: target, direction, label: String::new() };
            let d = derived_with(MetricKey::LeadToMql, Some(current));
            let r = calc().compute_impact(StageId::LeadToMql, &d, &t, Some(500.0)).unwrap();
            prop_assert_eq!(r.gap_pp, Some(current - target));
        }

        #[test]
        fn prop_below_min_sample_is_always_low_sample(current in 0.0f64..100.0, n in 1u32..30) {
            let d = derived_with(MetricKey::LeadToMql, Some(current));
            let t = StageId::LeadToMql.default_target();
            let r = calc().compute_impact(StageId::LeadToMql, &d, &t, Some(n as f64)).unwrap();
            prop_assert_eq!(r.status, Status::LowSample);
            prop_assert!(!r.eligible);
            prop_assert!(r.impact.is_none());
        }

        #[test]
        fn prop_ineligible_rows_carry_no_verdict(
            current in proptest::option::of(0.0f64..100.0),
            n in proptest::option::of(0.0f64..60.0),
        ) {
            let d = derived_with(MetricKey::LeadToMql, current);
            let t = StageId::LeadToMql.default_target();
            let r = calc().compute_impact(StageId::LeadToMql, &d, &t, n).unwrap();
            if !r.eligible {
                prop_assert!(r.status.severity().is_none());
                prop_assert!(r.impact.is_none());
            }
        }
    }
}
