//! End-to-end funnel diagnosis for one snapshot.

use crate::classifier::Classifier;
use crate::derivation::derive;
use crate::impact::{primary_bottleneck, StageImpact, StageImpactCalculator};
use crate::rules::{match_stage, DiagnosticEntry};
use crate::stages::{stages_for, FunnelProfile, StageId};
use growth_core::config::{FunnelConfig, FunnelProfileConfig};
use growth_core::error::GrowthResult;
use growth_core::types::{DerivedMetrics, Direction, MetricKey, MetricSnapshot, Status, Target};
use serde::Serialize;
use tracing::{info, warn};

#[derive(Debug, Clone, Serialize)]
pub struct StageDiagnosis {
    #[serde(flatten)]
    pub impact: StageImpact,
    pub label: &'static str,
    pub diagnostics: Vec<&'static DiagnosticEntry>,
}

/// Status of a target that is not a funnel transition (CPL, CAC, ROAS, ...).
#[derive(Debug, Clone, Serialize)]
pub struct MetricStatus {
    pub key: MetricKey,
    pub label: String,
    pub current: Option<f64>,
    pub target: f64,
    pub direction: Direction,
    pub status: Status,
}

#[derive(Debug, Clone, Serialize)]
pub struct FunnelDiagnosis {
    pub profile: FunnelProfile,
    pub period: String,
    pub derived: DerivedMetrics,
    pub stages: Vec<StageDiagnosis>,
    pub metrics: Vec<MetricStatus>,
    pub bottleneck: Option<StageId>,
}

impl FunnelDiagnosis {
    pub fn stage(&self, stage: StageId) -> Option<&StageDiagnosis> {
        self.stages.iter().find(|s| s.impact.stage == stage)
    }
}

pub struct FunnelAnalyzer {
    config: FunnelConfig,
}

impl FunnelAnalyzer {
    pub fn new(config: FunnelConfig) -> Self {
        Self { config }
    }

    pub fn profile_config(&self, profile: FunnelProfile) -> &FunnelProfileConfig {
        match profile {
            FunnelProfile::InsideSales => &self.config.inside_sales,
            FunnelProfile::Ecommerce => &self.config.ecommerce,
        }
    }

    /// Diagnose every stage of `profile`. Stages without a matching entry in
    /// `targets` use their default benchmark; targets for non-stage metrics
    /// are classified without a sample size.
    pub fn analyze(
        &self,
        snapshot: &MetricSnapshot,
        profile: FunnelProfile,
        targets: &[Target],
    ) -> GrowthResult<FunnelDiagnosis> {
        let classifier = Classifier::new(*self.profile_config(profile));
        let calculator = StageImpactCalculator::new(classifier);
        let derived = derive(snapshot);

        let mut impacts = Vec::new();
        for &stage in stages_for(profile) {
            let target = targets
                .iter()
                .find(|t| t.key == stage.rate_key())
                .cloned()
                .unwrap_or_else(|| stage.default_target());
            let sample = stage.denominator(snapshot, &derived);
            if sample.is_none() {
                warn!(stage = %stage, "No volume recorded for stage");
            }
            impacts.push(calculator.compute_impact(stage, &derived, &target, sample)?);
        }

        let bottleneck = primary_bottleneck(&impacts);
        for impact in impacts.iter_mut() {
            impact.is_bottleneck = Some(impact.stage) == bottleneck;
        }

        let stage_keys: Vec<MetricKey> = stages_for(profile).iter().map(|s| s.rate_key()).collect();
        let mut metrics = Vec::new();
        for target in targets.iter().filter(|t| !stage_keys.contains(&t.key)) {
            target.validate()?;
            let current = derived.get(target.key);
            metrics.push(MetricStatus {
                key: target.key,
                label: target.label.clone(),
                current,
                target: target.value,
                direction: target.direction,
                status: classifier.classify(current, target.value, target.direction),
            });
        }

        let stages: Vec<StageDiagnosis> = impacts
            .into_iter()
            .map(|impact| StageDiagnosis {
                label: impact.stage.label(),
                diagnostics: if impact.eligible {
                    match_stage(impact.stage, impact.status)
                } else {
                    Vec::new()
                },
                impact,
            })
            .collect();

        info!(
            profile = ?profile,
            period = %snapshot.period,
            stages = stages.len(),
            critical = stages.iter().filter(|s| s.impact.status == Status::Critical).count(),
            bottleneck = ?bottleneck,
            "Funnel analyzed"
        );

        Ok(FunnelDiagnosis {
            profile,
            period: snapshot.period.clone(),
            derived,
            stages,
            metrics,
            bottleneck,
        })
    }
}

impl Default for FunnelAnalyzer {
    fn default() -> Self {
        Self::new(FunnelConfig::default())
    }
}
