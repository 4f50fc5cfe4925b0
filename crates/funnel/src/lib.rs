//! Funnel diagnostics: metric derivation, status classification, stage
//! impact estimates and rule-based guidance for underperforming stages.

pub mod analysis;
pub mod classifier;
pub mod derivation;
pub mod impact;
pub mod rules;
pub mod stages;

pub use analysis::{FunnelAnalyzer, FunnelDiagnosis};
pub use classifier::{classify, Classifier};
pub use derivation::derive;
pub use impact::{primary_bottleneck, StageImpact, StageImpactCalculator};
pub use rules::{match_rules, DiagnosticEntry};
pub use stages::{default_targets, FunnelProfile, StageId};
