use crate::error::{GrowthError, GrowthResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

// ─── Raw Inputs ─────────────────────────────────────────────────────────────

/// Raw counters for one analysis period, entered by a user or synced from an
/// integration. Every counter is optional: `None` means "not provided", which
/// is different from a recorded zero.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricSnapshot {
    pub period: String,
    // Paid media
    pub impressions: Option<f64>,
    pub clicks: Option<f64>,
    pub investment: Option<f64>,
    // Inside-sales funnel
    pub leads: Option<f64>,
    pub mqls: Option<f64>,
    pub sqls: Option<f64>,
    pub meetings: Option<f64>,
    pub contracts: Option<f64>,
    // E-commerce funnel
    pub visitors: Option<f64>,
    pub carts: Option<f64>,
    pub checkouts: Option<f64>,
    pub orders: Option<f64>,
    // Money
    pub revenue: Option<f64>,
    pub ticket_size: Option<f64>,
    pub cost_of_sales: Option<f64>,
    /// Per-channel breakdown (e.g. two ad platforms). Used to fill the
    /// aggregate counters above when those are not provided directly.
    pub channels: Vec<ChannelCounters>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelCounters {
    pub channel: String,
    pub impressions: Option<f64>,
    pub clicks: Option<f64>,
    pub leads: Option<f64>,
    pub investment: Option<f64>,
    pub revenue: Option<f64>,
}

// ─── Derived Metrics ────────────────────────────────────────────────────────

/// Every metric the derivation step knows how to compute. Rates are in
/// percent (0-100); costs and ROAS are plain ratios.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKey {
    TotalImpressions,
    TotalClicks,
    TotalInvestment,
    Ctr,
    Cpc,
    Cpm,
    Cpl,
    Cac,
    CostPerMql,
    CostPerSql,
    Roas,
    RoiPct,
    AvgTicket,
    MarginPct,
    ClickToLead,
    LeadToMql,
    MqlToSql,
    SqlToMeeting,
    MeetingToContract,
    LeadToContract,
    VisitToCart,
    CartToCheckout,
    CheckoutToOrder,
    VisitToOrder,
}

impl MetricKey {
    pub const ALL: [MetricKey; 24] = [
        MetricKey::TotalImpressions,
        MetricKey::TotalClicks,
        MetricKey::TotalInvestment,
        MetricKey::Ctr,
        MetricKey::Cpc,
        MetricKey::Cpm,
        MetricKey::Cpl,
        MetricKey::Cac,
        MetricKey::CostPerMql,
        MetricKey::CostPerSql,
        MetricKey::Roas,
        MetricKey::RoiPct,
        MetricKey::AvgTicket,
        MetricKey::MarginPct,
        MetricKey::ClickToLead,
        MetricKey::LeadToMql,
        MetricKey::MqlToSql,
        MetricKey::SqlToMeeting,
        MetricKey::MeetingToContract,
        MetricKey::LeadToContract,
        MetricKey::VisitToCart,
        MetricKey::CartToCheckout,
        MetricKey::CheckoutToOrder,
        MetricKey::VisitToOrder,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKey::TotalImpressions => "total_impressions",
            MetricKey::TotalClicks => "total_clicks",
            MetricKey::TotalInvestment => "total_investment",
            MetricKey::Ctr => "ctr",
            MetricKey::Cpc => "cpc",
            MetricKey::Cpm => "cpm",
            MetricKey::Cpl => "cpl",
            MetricKey::Cac => "cac",
            MetricKey::CostPerMql => "cost_per_mql",
            MetricKey::CostPerSql => "cost_per_sql",
            MetricKey::Roas => "roas",
            MetricKey::RoiPct => "roi_pct",
            MetricKey::AvgTicket => "avg_ticket",
            MetricKey::MarginPct => "margin_pct",
            MetricKey::ClickToLead => "click_to_lead",
            MetricKey::LeadToMql => "lead_to_mql",
            MetricKey::MqlToSql => "mql_to_sql",
            MetricKey::SqlToMeeting => "sql_to_meeting",
            MetricKey::MeetingToContract => "meeting_to_contract",
            MetricKey::LeadToContract => "lead_to_contract",
            MetricKey::VisitToCart => "visit_to_cart",
            MetricKey::CartToCheckout => "cart_to_checkout",
            MetricKey::CheckoutToOrder => "checkout_to_order",
            MetricKey::VisitToOrder => "visit_to_order",
        }
    }

    /// Cost metrics where a smaller value is the better outcome.
    pub fn default_direction(&self) -> Direction {
        match self {
            MetricKey::Cpc
            | MetricKey::Cpm
            | MetricKey::Cpl
            | MetricKey::Cac
            | MetricKey::CostPerMql
            | MetricKey::CostPerSql => Direction::LowerIsBetter,
            _ => Direction::HigherIsBetter,
        }
    }
}

impl fmt::Display for MetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricKey {
    type Err = GrowthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MetricKey::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| GrowthError::InvalidInput(format!("unknown metric key '{}'", s)))
    }
}

/// Metrics derived from one [`MetricSnapshot`]. A `None` value means the
/// metric is undefined for this snapshot, never zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DerivedMetrics {
    pub values: BTreeMap<MetricKey, Option<f64>>,
    #[serde(default)]
    pub channels: Vec<ChannelMetrics>,
}

impl DerivedMetrics {
    pub fn get(&self, key: MetricKey) -> Option<f64> {
        self.values.get(&key).copied().flatten()
    }

    pub fn insert(&mut self, key: MetricKey, value: Option<f64>) {
        self.values.insert(key, value);
    }
}

/// Derived metrics for a single channel of the breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelMetrics {
    pub channel: String,
    pub ctr: Option<f64>,
    pub cpc: Option<f64>,
    pub cpl: Option<f64>,
    pub roas: Option<f64>,
}

// ─── Targets & Status ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    HigherIsBetter,
    LowerIsBetter,
}

/// User-editable threshold for one metric. Deserialized values are
/// validated; `direction` and `label` may be omitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TargetEntry")]
pub struct Target {
    pub key: MetricKey,
    pub value: f64,
    pub direction: Direction,
    pub label: String,
}

#[derive(Deserialize)]
struct TargetEntry {
    key: MetricKey,
    value: f64,
    #[serde(default)]
    direction: Option<Direction>,
    #[serde(default)]
    label: Option<String>,
}

impl TryFrom<TargetEntry> for Target {
    type Error = GrowthError;

    fn try_from(entry: TargetEntry) -> GrowthResult<Self> {
        let direction = entry
            .direction
            .unwrap_or_else(|| entry.key.default_direction());
        let label = entry.label.unwrap_or_else(|| entry.key.to_string());
        Target::new(entry.key, entry.value, direction, label)
    }
}

impl Target {
    pub fn new(
        key: MetricKey,
        value: f64,
        direction: Direction,
        label: impl Into<String>,
    ) -> GrowthResult<Self> {
        let target = Self {
            key,
            value,
            direction,
            label: label.into(),
        };
        target.validate()?;
        Ok(target)
    }

    /// Ratio-based targets need a strictly positive value; cost ceilings
    /// may be zero but never negative.
    pub fn validate(&self) -> GrowthResult<()> {
        let invalid = |reason| GrowthError::InvalidTarget {
            key: self.key.to_string(),
            value: self.value,
            reason,
        };
        if !self.value.is_finite() {
            return Err(invalid("value must be finite"));
        }
        match self.direction {
            Direction::HigherIsBetter if self.value <= 0.0 => {
                Err(invalid("ratio-based target must be greater than zero"))
            }
            Direction::LowerIsBetter if self.value < 0.0 => {
                Err(invalid("ceiling target must not be negative"))
            }
            _ => Ok(()),
        }
    }
}

/// Classification of a metric against its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Ok,
    Attention,
    Critical,
    NoData,
    LowSample,
}

impl Status {
    /// Ordinal severity of the classified statuses (`Ok` < `Attention` <
    /// `Critical`). `None` for statuses that carry no verdict.
    pub fn severity(&self) -> Option<u8> {
        match self {
            Status::Ok => Some(0),
            Status::Attention => Some(1),
            Status::Critical => Some(2),
            Status::NoData | Status::LowSample => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Ok => "ok",
            Status::Attention => "attention",
            Status::Critical => "critical",
            Status::NoData => "no_data",
            Status::LowSample => "low_sample",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
