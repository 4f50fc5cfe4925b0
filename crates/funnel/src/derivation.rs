//! Raw counters -> derived rates, costs and ratios.

use growth_core::math::{safe_div, safe_pct, sum_defined};
use growth_core::types::{
    ChannelCounters, ChannelMetrics, DerivedMetrics, MetricKey, MetricSnapshot,
};
use tracing::debug;

/// Aggregate counters after filling in from the channel breakdown.
struct Totals {
    impressions: Option<f64>,
    clicks: Option<f64>,
    investment: Option<f64>,
    leads: Option<f64>,
    revenue: Option<f64>,
}

impl Totals {
    fn from_snapshot(snapshot: &MetricSnapshot) -> Self {
        let channels = &snapshot.channels;
        Self {
            impressions: fill(snapshot.impressions, channels, |c| c.impressions),
            clicks: fill(snapshot.clicks, channels, |c| c.clicks),
            investment: fill(snapshot.investment, channels, |c| c.investment),
            leads: fill(snapshot.leads, channels, |c| c.leads),
            revenue: fill(snapshot.revenue, channels, |c| c.revenue),
        }
    }
}

/// A directly provided counter wins; otherwise sum the defined channel values.
fn fill(
    direct: Option<f64>,
    channels: &[ChannelCounters],
    pick: impl Fn(&ChannelCounters) -> Option<f64>,
) -> Option<f64> {
    direct.or_else(|| sum_defined(channels.iter().map(pick)))
}

/// Compute every [`MetricKey`] for one snapshot. Pure; undefined inputs and
/// zero denominators yield `None`.
pub fn derive(snapshot: &MetricSnapshot) -> DerivedMetrics {
    let t = Totals::from_snapshot(snapshot);
    let s = snapshot;
    let mut m = DerivedMetrics::default();

    m.insert(MetricKey::TotalImpressions, t.impressions);
    m.insert(MetricKey::TotalClicks, t.clicks);
    m.insert(MetricKey::TotalInvestment, t.investment);

    // Paid media
    m.insert(MetricKey::Ctr, safe_pct(t.clicks, t.impressions));
    m.insert(MetricKey::Cpc, safe_div(t.investment, t.clicks));
    m.insert(
        MetricKey::Cpm,
        safe_div(t.investment, t.impressions).map(|v| v * 1000.0),
    );

    // Cost per action
    m.insert(MetricKey::Cpl, safe_div(t.investment, t.leads));
    m.insert(MetricKey::CostPerMql, safe_div(t.investment, s.mqls));
    m.insert(MetricKey::CostPerSql, safe_div(t.investment, s.sqls));
    m.insert(MetricKey::Cac, safe_div(t.investment, s.contracts));

    // Return
    m.insert(MetricKey::Roas, safe_div(t.revenue, t.investment));
    let profit = t.revenue.zip(t.investment).map(|(r, i)| r - i);
    m.insert(MetricKey::RoiPct, safe_pct(profit, t.investment));
    let closed = s.contracts.or(s.orders);
    m.insert(
        MetricKey::AvgTicket,
        safe_div(t.revenue, closed).or(s.ticket_size),
    );
    let gross = t.revenue.zip(s.cost_of_sales).map(|(r, c)| r - c);
    m.insert(MetricKey::MarginPct, safe_pct(gross, t.revenue));

    // Inside-sales funnel
    m.insert(MetricKey::ClickToLead, safe_pct(t.leads, t.clicks));
    m.insert(MetricKey::LeadToMql, safe_pct(s.mqls, t.leads));
    m.insert(MetricKey::MqlToSql, safe_pct(s.sqls, s.mqls));
    m.insert(MetricKey::SqlToMeeting, safe_pct(s.meetings, s.sqls));
    m.insert(MetricKey::MeetingToContract, safe_pct(s.contracts, s.meetings));
    m.insert(MetricKey::LeadToContract, safe_pct(s.contracts, t.leads));

    // E-commerce funnel
    m.insert(MetricKey::VisitToCart, safe_pct(s.carts, s.visitors));
    m.insert(MetricKey::CartToCheckout, safe_pct(s.checkouts, s.carts));
    m.insert(MetricKey::CheckoutToOrder, safe_pct(s.orders, s.checkouts));
    m.insert(MetricKey::VisitToOrder, safe_pct(s.orders, s.visitors));

    m.channels = s
        .channels
        .iter()
        .map(|c| ChannelMetrics {
            channel: c.channel.clone(),
            ctr: safe_pct(c.clicks, c.impressions),
            cpc: safe_div(c.investment, c.clicks),
            cpl: safe_div(c.investment, c.leads),
            roas: safe_div(c.revenue, c.investment),
        })
        .collect();

    let undefined = m.values.values().filter(|v| v.is_none()).count();
    debug!(
        period = %s.period,
        defined = m.values.len() - undefined,
        undefined,
        channels = m.channels.len(),
        "Derived metrics"
    );
    m
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn inside_sales_snapshot() -> MetricSnapshot {
        MetricSnapshot {
            period: "2024-05".to_string(),
            impressions: Some(100_000.0),
            clicks: Some(2_000.0),
            investment: Some(5_000.0),
            leads: Some(200.0),
            mqls: Some(80.0),
            sqls: Some(40.0),
            meetings: Some(20.0),
            contracts: Some(5.0),
            revenue: Some(25_000.0),
            cost_of_sales: Some(10_000.0),
            ..Default::default()
        }
    }

    fn approx(value: Option<f64>, expected: f64) {
        let v = value.expect("metric should be defined");
        assert!((v - expected).abs() < 1e-9, "expected {expected}, got {v}");
    }

    // 1. Basic ratios -------------------------------------------------------

    #[test]
    fn test_paid_media_metrics() {
        let m = derive(&inside_sales_snapshot());
        approx(m.get(MetricKey::Ctr), 2.0);
        approx(m.get(MetricKey::Cpc), 2.5);
        approx(m.get(MetricKey::Cpm), 50.0);
        approx(m.get(MetricKey::Cpl), 25.0);
        approx(m.get(MetricKey::Cac), 1_000.0);
        approx(m.get(MetricKey::CostPerMql), 62.5);
        approx(m.get(MetricKey::CostPerSql), 125.0);
    }

    #[test]
    fn test_return_metrics() {
        let m = derive(&inside_sales_snapshot());
        approx(m.get(MetricKey::Roas), 5.0);
        approx(m.get(MetricKey::RoiPct), 400.0);
        approx(m.get(MetricKey::AvgTicket), 5_000.0);
        approx(m.get(MetricKey::MarginPct), 60.0);
    }

    #[test]
    fn test_funnel_rates_in_percent() {
        let m = derive(&inside_sales_snapshot());
        approx(m.get(MetricKey::ClickToLead), 10.0);
        approx(m.get(MetricKey::LeadToMql), 40.0);
        approx(m.get(MetricKey::MqlToSql), 50.0);
        approx(m.get(MetricKey::SqlToMeeting), 50.0);
        approx(m.get(MetricKey::MeetingToContract), 25.0);
        approx(m.get(MetricKey::LeadToContract), 2.5);
    }

    #[test]
    fn test_ecommerce_visit_to_cart() {
        let snap = MetricSnapshot {
            visitors: Some(1_000.0),
            carts: Some(80.0),
            checkouts: Some(40.0),
            orders: Some(30.0),
            ..Default::default()
        };
        let m = derive(&snap);
        approx(m.get(MetricKey::VisitToCart), 8.0);
        approx(m.get(MetricKey::CartToCheckout), 50.0);
        approx(m.get(MetricKey::CheckoutToOrder), 75.0);
        approx(m.get(MetricKey::VisitToOrder), 3.0);
    }

    // 2. Null safety --------------------------------------------------------

    #[test]
    fn test_zero_denominators_are_undefined_not_zero() {
        let snap = MetricSnapshot {
            investment: Some(1_000.0),
            leads: Some(0.0),
            clicks: Some(0.0),
            contracts: Some(0.0),
            ..Default::default()
        };
        let m = derive(&snap);
        assert_eq!(m.get(MetricKey::Cpl), None);
        assert_eq!(m.get(MetricKey::Cpc), None);
        assert_eq!(m.get(MetricKey::Cac), None);
        assert_eq!(m.get(MetricKey::LeadToMql), None);
        assert!(m.values.contains_key(&MetricKey::Cpl));
    }

    #[test]
    fn test_empty_snapshot_has_every_key_undefined() {
        let m = derive(&MetricSnapshot::default());
        assert_eq!(m.values.len(), MetricKey::ALL.len());
        assert!(m.values.values().all(Option::is_none));
    }

    #[test]
    fn test_avg_ticket_falls_back_to_declared_ticket() {
        let snap = MetricSnapshot {
            revenue: Some(0.0),
            contracts: Some(0.0),
            ticket_size: Some(750.0),
            ..Default::default()
        };
        approx(derive(&snap).get(MetricKey::AvgTicket), 750.0);
    }

    // 3. Channel aggregation -------------------------------------------------

    #[test]
    fn test_aggregate_sums_only_defined_channels() {
        let snap = MetricSnapshot {
            channels: vec![
                ChannelCounters {
                    channel: "google_ads".to_string(),
                    clicks: Some(300.0),
                    impressions: Some(10_000.0),
                    investment: Some(900.0),
                    ..Default::default()
                },
                ChannelCounters {
                    channel: "meta_ads".to_string(),
                    clicks: None,
                    impressions: Some(20_000.0),
                    investment: Some(600.0),
                    ..Default::default()
                },
            ],
            ..Default::default()
        };
        let m = derive(&snap);
        approx(m.get(MetricKey::TotalClicks), 300.0);
        approx(m.get(MetricKey::TotalImpressions), 30_000.0);
        approx(m.get(MetricKey::TotalInvestment), 1_500.0);
        approx(m.get(MetricKey::Ctr), 1.0);
        assert_eq!(m.channels.len(), 2);
        approx(m.channels[0].cpc, 3.0);
        assert_eq!(m.channels[1].cpc, None);
    }

    #[test]
    fn test_aggregate_all_undefined_is_undefined() {
        let snap = MetricSnapshot {
            channels: vec![ChannelCounters {
                channel: "google_ads".to_string(),
                ..Default::default()
            }],
            ..Default::default()
        };
        assert_eq!(derive(&snap).get(MetricKey::TotalClicks), None);
    }

    #[test]
    fn test_direct_counter_wins_over_breakdown() {
        let snap = MetricSnapshot {
            clicks: Some(50.0),
            channels: vec![ChannelCounters {
                channel: "google_ads".to_string(),
                clicks: Some(300.0),
                ..Default::default()
            }],
            ..Default::default()
        };
        approx(derive(&snap).get(MetricKey::TotalClicks), 50.0);
    }

    // 4. Properties -----------------------------------------------------------

    fn counter() -> impl Strategy<Value = Option<f64>> {
        prop_oneof![Just(None), Just(Some(0.0)), (0.0f64..1e7).prop_map(Some)]
    }

    proptest! {
        #[test]
        fn prop_derived_values_are_finite_or_undefined(
            impressions in counter(),
            clicks in counter(),
            investment in counter(),
            leads in counter(),
            mqls in counter(),
            contracts in counter(),
            revenue in counter(),
        ) {
            let snap = MetricSnapshot {
                impressions, clicks, investment, leads, mqls, contracts, revenue,
                ..Default::default()
            };
            let m = derive(&snap);
            for value in m.values.values().flatten() {
                prop_assert!(value.is_finite());
            }
            if leads == Some(0.0) {
                prop_assert_eq!(m.get(MetricKey::Cpl), None);
                prop_assert_eq!(m.get(MetricKey::LeadToMql), None);
            }
            if clicks == Some(0.0) {
                prop_assert_eq!(m.get(MetricKey::Cpc), None);
                prop_assert_eq!(m.get(MetricKey::ClickToLead), None);
            }
            if investment == Some(0.0) {
                prop_assert_eq!(m.get(MetricKey::Roas), None);
            }
        }
    }
}
