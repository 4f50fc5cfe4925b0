//! Projection inputs: base period, growth model, rates and cost scaling.

use growth_core::config::AlertThresholds;
use growth_core::error::{GrowthError, GrowthResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrowthModel {
    /// Investment compounds, ROAS decays, revenue = investment x ROAS.
    #[default]
    InvestmentToRevenue,
    /// Revenue and ticket compound directly.
    RevenueGrowth,
}

/// How a variable cost line follows volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostScaling {
    PerOrder,
    PerRevenue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommissionScaling {
    PerOrder,
    PerRevenue,
    /// Held at the base-period value.
    Fixed,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostScalingConfig {
    #[serde(default = "default_cogs_scaling")]
    pub cogs: CostScaling,
    #[serde(default = "default_freight_scaling")]
    pub freight: CostScaling,
    #[serde(default = "default_commission_scaling")]
    pub commission: CommissionScaling,
}

fn default_cogs_scaling() -> CostScaling {
    CostScaling::PerOrder
}
fn default_freight_scaling() -> CostScaling {
    CostScaling::PerOrder
}
fn default_commission_scaling() -> CommissionScaling {
    CommissionScaling::PerRevenue
}

impl Default for CostScalingConfig {
    fn default() -> Self {
        Self {
            cogs: default_cogs_scaling(),
            freight: default_freight_scaling(),
            commission: default_commission_scaling(),
        }
    }
}

/// The unmodified base period (month 0).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BaseSnapshot {
    pub revenue: f64,
    pub orders: f64,
    pub investment: f64,
    pub cogs: f64,
    pub freight: f64,
    pub commission: f64,
    pub fixed_costs: f64,
    /// Flat tax on gross revenue, in percent.
    pub tax_rate_pct: f64,
}

/// Per-period rates, all in percent.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GrowthRates {
    #[serde(alias = "g_mkt")]
    pub investment_growth_pct: f64,
    #[serde(alias = "d_roas")]
    pub roas_decay_pct: f64,
    #[serde(alias = "g_rev")]
    pub revenue_growth_pct: f64,
    #[serde(alias = "g_ticket")]
    pub ticket_growth_pct: f64,
    #[serde(alias = "g_fix")]
    pub fixed_cost_growth_pct: f64,
    /// Share of the previous period's revenue carried into the next one.
    pub retention_pct: f64,
}

/// Manual adjustment for one projected month.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PeriodOverride {
    /// Replaces the compounded investment for that month only.
    pub investment: Option<f64>,
    /// One-off revenue added to that month (e.g. a promotion). Carries into
    /// later months through retention.
    pub revenue_adjustment: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionInputs {
    pub base: BaseSnapshot,
    #[serde(default)]
    pub model: GrowthModel,
    #[serde(default)]
    pub rates: GrowthRates,
    #[serde(default)]
    pub cost_scaling: CostScalingConfig,
    #[serde(default = "default_horizon")]
    pub horizon_months: u32,
    #[serde(default)]
    pub alerts: AlertThresholds,
    /// Keyed by month index (1..=horizon).
    #[serde(default)]
    pub overrides: BTreeMap<u32, PeriodOverride>,
}

fn default_horizon() -> u32 {
    12
}

impl ProjectionInputs {
    pub fn new(base: BaseSnapshot, model: GrowthModel, rates: GrowthRates, horizon_months: u32) -> Self {
        Self {
            base,
            model,
            rates,
            cost_scaling: CostScalingConfig::default(),
            horizon_months,
            alerts: AlertThresholds::default(),
            overrides: BTreeMap::new(),
        }
    }

    /// Reject inputs that indicate a caller bug rather than unusual data.
    pub fn validate(&self, max_horizon_months: u32) -> GrowthResult<()> {
        if self.horizon_months > max_horizon_months {
            return Err(GrowthError::InvalidHorizon {
                horizon: self.horizon_months,
                max: max_horizon_months,
            });
        }

        let b = &self.base;
        let amounts = [
            ("base.revenue", b.revenue),
            ("base.orders", b.orders),
            ("base.investment", b.investment),
            ("base.cogs", b.cogs),
            ("base.freight", b.freight),
            ("base.commission", b.commission),
            ("base.fixed_costs", b.fixed_costs),
        ];
        for (name, value) in amounts {
            if !value.is_finite() || value < 0.0 {
                return Err(invalid(format!("{} must be a non-negative number, got {}", name, value)));
            }
        }
        if b.revenue <= 0.0 {
            return Err(invalid("base.revenue must be greater than zero".to_string()));
        }
        if !(0.0..=100.0).contains(&b.tax_rate_pct) {
            return Err(invalid(format!("base.tax_rate_pct must be within 0..=100, got {}", b.tax_rate_pct)));
        }

        let r = &self.rates;
        let growth = [
            ("rates.investment_growth_pct", r.investment_growth_pct),
            ("rates.revenue_growth_pct", r.revenue_growth_pct),
            ("rates.ticket_growth_pct", r.ticket_growth_pct),
            ("rates.fixed_cost_growth_pct", r.fixed_cost_growth_pct),
        ];
        for (name, value) in growth {
            if !value.is_finite() || value <= -100.0 {
                return Err(invalid(format!("{} must be greater than -100, got {}", name, value)));
            }
        }
        if !r.roas_decay_pct.is_finite() {
            return Err(invalid("rates.roas_decay_pct must be finite".to_string()));
        }
        if !(0.0..=100.0).contains(&r.retention_pct) {
            return Err(invalid(format!("rates.retention_pct must be within 0..=100, got {}", r.retention_pct)));
        }

        let per_order_lines = [
            ("cogs", self.cost_scaling.cogs == CostScaling::PerOrder, b.cogs),
            ("freight", self.cost_scaling.freight == CostScaling::PerOrder, b.freight),
            (
                "commission",
                self.cost_scaling.commission == CommissionScaling::PerOrder,
                b.commission,
            ),
        ];
        for (name, per_order, cost) in per_order_lines {
            if per_order && cost > 0.0 && b.orders <= 0.0 {
                return Err(invalid(format!(
                    "{} scales per order but base.orders is zero",
                    name
                )));
            }
        }

        for (&month, ov) in &self.overrides {
            if month == 0 || month > self.horizon_months {
                return Err(invalid(format!(
                    "override for month {} is outside 1..={}",
                    month, self.horizon_months
                )));
            }
            if ov.investment.is_some_and(|v| !v.is_finite() || v < 0.0) {
                return Err(invalid(format!("override investment for month {} must be non-negative", month)));
            }
            if ov.revenue_adjustment.is_some_and(|v| !v.is_finite()) {
                return Err(invalid(format!("override revenue for month {} must be finite", month)));
            }
        }
        Ok(())
    }
}

fn invalid(message: String) -> GrowthError {
    GrowthError::InvalidInput(message)
}
