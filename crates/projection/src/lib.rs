//! Financial projection: compounding month-by-month statements, threshold
//! alerts, summary insights and delimited export.

pub mod alerts;
pub mod engine;
pub mod export;
pub mod inputs;
pub mod insights;
pub mod labels;

pub use alerts::{AlertKind, AlertSeverity, ProjectionAlert};
pub use engine::{project, MonthProjection, Projection, ProjectionEngine, ProjectionTotals};
pub use export::{to_delimited, ExportOptions};
pub use inputs::{
    BaseSnapshot, CommissionScaling, CostScaling, CostScalingConfig, GrowthModel, GrowthRates,
    PeriodOverride, ProjectionInputs,
};
pub use insights::summarize;
