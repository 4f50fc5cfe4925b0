//! Month-by-month financial projection under compounding growth.

use crate::alerts::{evaluate, AlertSeverity, ProjectionAlert};
use crate::inputs::{CommissionScaling, CostScaling, GrowthModel, ProjectionInputs};
use crate::labels::period_label;
use growth_core::config::ProjectionConfig;
use growth_core::error::GrowthResult;
use growth_core::math::{compound, safe_div, safe_pct};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// One row of the projection. Month 0 is the base period as supplied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthProjection {
    pub month: u32,
    pub label: String,
    pub revenue: f64,
    pub taxes: f64,
    pub net_revenue: f64,
    pub cogs: f64,
    pub freight: f64,
    pub commission: f64,
    pub contribution_margin: f64,
    pub contribution_margin_pct: Option<f64>,
    pub investment: f64,
    pub fixed_costs: f64,
    pub ebitda: f64,
    pub ebitda_pct: Option<f64>,
    pub orders: Option<f64>,
    pub avg_ticket: Option<f64>,
    pub roas: Option<f64>,
}

/// Sums over the projected months (the base period is excluded).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionTotals {
    pub revenue: f64,
    pub investment: f64,
    pub ebitda: f64,
    pub roas: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projection {
    pub model: GrowthModel,
    pub months: Vec<MonthProjection>,
    pub alerts: Vec<ProjectionAlert>,
    pub totals: ProjectionTotals,
}

/// Per-unit rate of a variable cost line, fixed from the base period.
#[derive(Debug, Clone, Copy)]
enum CostRate {
    PerOrder(f64),
    PerRevenue(f64),
    Constant(f64),
}

impl CostRate {
    fn new(scaling: CommissionScaling, base_cost: f64, base_orders: f64, base_revenue: f64) -> Self {
        match scaling {
            CommissionScaling::PerOrder => {
                CostRate::PerOrder(safe_div(Some(base_cost), Some(base_orders)).unwrap_or(0.0))
            }
            CommissionScaling::PerRevenue => {
                CostRate::PerRevenue(safe_div(Some(base_cost), Some(base_revenue)).unwrap_or(0.0))
            }
            CommissionScaling::Fixed => CostRate::Constant(base_cost),
        }
    }

    fn variable(scaling: CostScaling, base_cost: f64, base_orders: f64, base_revenue: f64) -> Self {
        let mode = match scaling {
            CostScaling::PerOrder => CommissionScaling::PerOrder,
            CostScaling::PerRevenue => CommissionScaling::PerRevenue,
        };
        Self::new(mode, base_cost, base_orders, base_revenue)
    }

    fn apply(&self, orders: Option<f64>, revenue: f64) -> f64 {
        match *self {
            CostRate::PerOrder(rate) => rate * orders.unwrap_or(0.0),
            CostRate::PerRevenue(rate) => rate * revenue,
            CostRate::Constant(value) => value,
        }
    }
}

/// Volume-driven figures of one month; the rest of the statement follows.
struct Drivers {
    revenue: f64,
    investment: f64,
    fixed_costs: f64,
    orders: Option<f64>,
    avg_ticket: Option<f64>,
    cogs: f64,
    freight: f64,
    commission: f64,
}

fn statement(month: u32, label: String, tax_rate_pct: f64, d: Drivers) -> MonthProjection {
    let taxes = d.revenue * tax_rate_pct / 100.0;
    let contribution_margin = d.revenue - taxes - d.cogs - d.freight - d.commission;
    let ebitda = contribution_margin - d.investment - d.fixed_costs;
    MonthProjection {
        month,
        label,
        revenue: d.revenue,
        taxes,
        net_revenue: d.revenue - taxes,
        cogs: d.cogs,
        freight: d.freight,
        commission: d.commission,
        contribution_margin,
        contribution_margin_pct: safe_pct(Some(contribution_margin), Some(d.revenue)),
        investment: d.investment,
        fixed_costs: d.fixed_costs,
        ebitda,
        ebitda_pct: safe_pct(Some(ebitda), Some(d.revenue)),
        orders: d.orders,
        avg_ticket: d.avg_ticket,
        roas: safe_div(Some(d.revenue), Some(d.investment)),
    }
}

pub struct ProjectionEngine {
    max_horizon_months: u32,
}

impl ProjectionEngine {
    pub fn new(config: &ProjectionConfig) -> Self {
        Self {
            max_horizon_months: config.max_horizon_months,
        }
    }

    /// Project `inputs.horizon_months` months after the base period.
    ///
    /// Months are computed strictly in order: each month's retention term
    /// carries the previous month's computed revenue.
    pub fn project(&self, inputs: &ProjectionInputs, base_label: &str) -> GrowthResult<Projection> {
        inputs.validate(self.max_horizon_months)?;

        let base = &inputs.base;
        let rates = &inputs.rates;
        let base_ticket = safe_div(Some(base.revenue), Some(base.orders));
        let base_roas = safe_div(Some(base.revenue), Some(base.investment));
        if inputs.model == GrowthModel::InvestmentToRevenue && base_roas.is_none() {
            warn!("Base investment is zero; investment-driven revenue will only carry retention");
        }

        let scaling = &inputs.cost_scaling;
        let cogs_rate = CostRate::variable(scaling.cogs, base.cogs, base.orders, base.revenue);
        let freight_rate = CostRate::variable(scaling.freight, base.freight, base.orders, base.revenue);
        let commission_rate =
            CostRate::new(scaling.commission, base.commission, base.orders, base.revenue);
        let roas_decay = (1.0 - rates.roas_decay_pct / 100.0).max(0.0);
        let retention = rates.retention_pct / 100.0;

        let mut months = Vec::with_capacity(inputs.horizon_months as usize + 1);
        months.push(statement(
            0,
            period_label(base_label, 0),
            base.tax_rate_pct,
            Drivers {
                revenue: base.revenue,
                investment: base.investment,
                fixed_costs: base.fixed_costs,
                orders: Some(base.orders),
                avg_ticket: base_ticket,
                cogs: base.cogs,
                freight: base.freight,
                commission: base.commission,
            },
        ));

        let mut alerts = Vec::new();
        let mut previous_revenue = base.revenue;

        for i in 1..=inputs.horizon_months {
            let period_override = inputs.overrides.get(&i);
            let investment = period_override
                .and_then(|o| o.investment)
                .unwrap_or_else(|| base.investment * compound(rates.investment_growth_pct, i));
            let carry_over = previous_revenue * retention;

            let (new_revenue, avg_ticket) = match inputs.model {
                GrowthModel::InvestmentToRevenue => {
                    let roas = base_roas.unwrap_or(0.0) * roas_decay.powi(i as i32);
                    (investment * roas, base_ticket)
                }
                GrowthModel::RevenueGrowth => (
                    base.revenue * compound(rates.revenue_growth_pct, i),
                    base_ticket.map(|t| t * compound(rates.ticket_growth_pct, i)),
                ),
            };
            let adjustment = period_override
                .and_then(|o| o.revenue_adjustment)
                .unwrap_or(0.0);
            let revenue = (new_revenue + carry_over + adjustment).max(0.0);
            let orders = safe_div(Some(revenue), avg_ticket);

            let month = statement(
                i,
                period_label(base_label, i),
                base.tax_rate_pct,
                Drivers {
                    revenue,
                    investment,
                    fixed_costs: base.fixed_costs * compound(rates.fixed_cost_growth_pct, i),
                    orders,
                    avg_ticket,
                    cogs: cogs_rate.apply(orders, revenue),
                    freight: freight_rate.apply(orders, revenue),
                    commission: commission_rate.apply(orders, revenue),
                },
            );
            debug!(
                month = i,
                label = %month.label,
                revenue = month.revenue,
                ebitda = month.ebitda,
                "Projected month"
            );

            alerts.extend(evaluate(&month, &inputs.alerts));
            previous_revenue = month.revenue;
            months.push(month);
        }

        let totals = totals(&months[1..]);
        info!(
            model = ?inputs.model,
            horizon = inputs.horizon_months,
            alerts = alerts.len(),
            errors = alerts.iter().filter(|a| a.severity == AlertSeverity::Error).count(),
            "Projection computed"
        );

        Ok(Projection {
            model: inputs.model,
            months,
            alerts,
            totals,
        })
    }
}

impl Default for ProjectionEngine {
    fn default() -> Self {
        Self::new(&ProjectionConfig::default())
    }
}

fn totals(projected: &[MonthProjection]) -> ProjectionTotals {
    let revenue: f64 = projected.iter().map(|m| m.revenue).sum();
    let investment: f64 = projected.iter().map(|m| m.investment).sum();
    ProjectionTotals {
        revenue,
        investment,
        ebitda: projected.iter().map(|m| m.ebitda).sum(),
        roas: safe_div(Some(revenue), Some(investment)),
    }
}

/// Project with the default engine limits.
pub fn project(inputs: &ProjectionInputs, base_label: &str) -> GrowthResult<Projection> {
    ProjectionEngine::default().project(inputs, base_label)
}
