//! Funnel transitions and their default benchmarks.

use growth_core::error::GrowthError;
use growth_core::types::{DerivedMetrics, MetricKey, MetricSnapshot, Target};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which calculator a stage belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FunnelProfile {
    InsideSales,
    Ecommerce,
}

impl FromStr for FunnelProfile {
    type Err = GrowthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "inside_sales" | "inside-sales" => Ok(FunnelProfile::InsideSales),
            "ecommerce" | "e-commerce" => Ok(FunnelProfile::Ecommerce),
            other => Err(GrowthError::InvalidInput(format!(
                "unknown funnel profile '{}'",
                other
            ))),
        }
    }
}

/// One transition of a funnel, e.g. lead -> MQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageId {
    ImpressionToClick,
    ClickToLead,
    LeadToMql,
    MqlToSql,
    SqlToMeeting,
    MeetingToContract,
    VisitToCart,
    CartToCheckout,
    CheckoutToOrder,
}

impl StageId {
    /// All stages, in funnel order within each profile.
    pub const ALL: [StageId; 9] = [
        StageId::ImpressionToClick,
        StageId::ClickToLead,
        StageId::LeadToMql,
        StageId::MqlToSql,
        StageId::SqlToMeeting,
        StageId::MeetingToContract,
        StageId::VisitToCart,
        StageId::CartToCheckout,
        StageId::CheckoutToOrder,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StageId::ImpressionToClick => "impression_to_click",
            StageId::ClickToLead => "click_to_lead",
            StageId::LeadToMql => "lead_to_mql",
            StageId::MqlToSql => "mql_to_sql",
            StageId::SqlToMeeting => "sql_to_meeting",
            StageId::MeetingToContract => "meeting_to_contract",
            StageId::VisitToCart => "visit_to_cart",
            StageId::CartToCheckout => "cart_to_checkout",
            StageId::CheckoutToOrder => "checkout_to_order",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StageId::ImpressionToClick => "Impressão → Clique",
            StageId::ClickToLead => "Clique → Lead",
            StageId::LeadToMql => "Lead → MQL",
            StageId::MqlToSql => "MQL → SQL",
            StageId::SqlToMeeting => "SQL → Reunião",
            StageId::MeetingToContract => "Reunião → Contrato",
            StageId::VisitToCart => "Visita → Carrinho",
            StageId::CartToCheckout => "Carrinho → Checkout",
            StageId::CheckoutToOrder => "Checkout → Pedido",
        }
    }

    pub fn profile(&self) -> FunnelProfile {
        match self {
            StageId::VisitToCart | StageId::CartToCheckout | StageId::CheckoutToOrder => {
                FunnelProfile::Ecommerce
            }
            _ => FunnelProfile::InsideSales,
        }
    }

    /// Position within the stage's own funnel, starting at 0.
    pub fn order(&self) -> usize {
        stages_for(self.profile())
            .iter()
            .position(|s| s == self)
            .unwrap_or(usize::MAX)
    }

    pub fn rate_key(&self) -> MetricKey {
        match self {
            StageId::ImpressionToClick => MetricKey::Ctr,
            StageId::ClickToLead => MetricKey::ClickToLead,
            StageId::LeadToMql => MetricKey::LeadToMql,
            StageId::MqlToSql => MetricKey::MqlToSql,
            StageId::SqlToMeeting => MetricKey::SqlToMeeting,
            StageId::MeetingToContract => MetricKey::MeetingToContract,
            StageId::VisitToCart => MetricKey::VisitToCart,
            StageId::CartToCheckout => MetricKey::CartToCheckout,
            StageId::CheckoutToOrder => MetricKey::CheckoutToOrder,
        }
    }

    /// Volume entering the stage (the denominator of its rate). Top-of-funnel
    /// counters come from the channel-aware aggregates.
    pub fn denominator(&self, snapshot: &MetricSnapshot, derived: &DerivedMetrics) -> Option<f64> {
        match self {
            StageId::ImpressionToClick => derived.get(MetricKey::TotalImpressions),
            StageId::ClickToLead => derived.get(MetricKey::TotalClicks),
            StageId::LeadToMql => snapshot.leads.or_else(|| {
                growth_core::math::sum_defined(snapshot.channels.iter().map(|c| c.leads))
            }),
            StageId::MqlToSql => snapshot.mqls,
            StageId::SqlToMeeting => snapshot.sqls,
            StageId::MeetingToContract => snapshot.meetings,
            StageId::VisitToCart => snapshot.visitors,
            StageId::CartToCheckout => snapshot.carts,
            StageId::CheckoutToOrder => snapshot.checkouts,
        }
    }

    /// Plural noun for the stage's output, used in impact descriptions.
    pub fn output_unit(&self) -> &'static str {
        match self {
            StageId::ImpressionToClick => "cliques",
            StageId::ClickToLead => "leads",
            StageId::LeadToMql => "MQLs",
            StageId::MqlToSql => "SQLs",
            StageId::SqlToMeeting => "reuniões",
            StageId::MeetingToContract => "contratos",
            StageId::VisitToCart => "carrinhos",
            StageId::CartToCheckout => "checkouts",
            StageId::CheckoutToOrder => "pedidos",
        }
    }

    /// Market benchmark used when the caller supplies no target (percent).
    pub fn default_benchmark(&self) -> f64 {
        match self {
            StageId::ImpressionToClick => 1.0,
            StageId::ClickToLead => 10.0,
            StageId::LeadToMql => 40.0,
            StageId::MqlToSql => 30.0,
            StageId::SqlToMeeting => 50.0,
            StageId::MeetingToContract => 25.0,
            StageId::VisitToCart => 10.0,
            StageId::CartToCheckout => 50.0,
            StageId::CheckoutToOrder => 60.0,
        }
    }

    pub fn default_target(&self) -> Target {
        Target {
            key: self.rate_key(),
            value: self.default_benchmark(),
            direction: self.rate_key().default_direction(),
            label: self.label().to_string(),
        }
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StageId {
    type Err = GrowthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StageId::ALL
            .iter()
            .copied()
            .find(|st| st.as_str() == s)
            .ok_or_else(|| GrowthError::InvalidInput(format!("unknown stage id '{}'", s)))
    }
}

/// Stages of a profile, in funnel order.
pub fn stages_for(profile: FunnelProfile) -> &'static [StageId] {
    match profile {
        FunnelProfile::InsideSales => &StageId::ALL[..6],
        FunnelProfile::Ecommerce => &StageId::ALL[6..],
    }
}

/// Benchmark targets for every stage of a profile.
pub fn default_targets(profile: FunnelProfile) -> Vec<Target> {
    stages_for(profile).iter().map(StageId::default_target).collect()
}
