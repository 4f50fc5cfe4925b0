//! Threshold alerts for projected months.

use crate::engine::MonthProjection;
use crate::export::{format_currency, format_number, format_percent};
use growth_core::config::{AlertThresholds, Locale};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    /// Contribution margin % below the configured floor.
    LowMargin,
    /// EBITDA below zero. Always checked.
    NegativeEbitda,
    /// EBITDA non-negative but below the configured floor.
    LowEbitda,
    /// ROAS below the configured floor.
    LowRoas,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionAlert {
    pub month: u32,
    pub label: String,
    pub kind: AlertKind,
    pub message: String,
    pub severity: AlertSeverity,
}

/// Alerts for one month, in a fixed order: margin, EBITDA, ROAS.
pub fn evaluate(month: &MonthProjection, thresholds: &AlertThresholds) -> Vec<ProjectionAlert> {
    let locale = Locale::PtBr;
    let mut alerts = Vec::new();
    let mut push = |kind, severity, message: String| {
        alerts.push(ProjectionAlert {
            month: month.month,
            label: month.label.clone(),
            kind,
            message,
            severity,
        });
    };

    if let (Some(floor), Some(margin)) = (thresholds.min_margin_pct, month.contribution_margin_pct) {
        if margin < floor {
            push(
                AlertKind::LowMargin,
                AlertSeverity::Warning,
                format!(
                    "{}: margem de contribuição de {} abaixo do mínimo de {}",
                    month.label,
                    format_percent(margin, locale),
                    format_percent(floor, locale)
                ),
            );
        }
    }

    if month.ebitda < 0.0 {
        push(
            AlertKind::NegativeEbitda,
            AlertSeverity::Error,
            format!(
                "{}: EBITDA negativo ({})",
                month.label,
                format_currency(month.ebitda, locale)
            ),
        );
    } else if let Some(floor) = thresholds.min_ebitda {
        if month.ebitda < floor {
            push(
                AlertKind::LowEbitda,
                AlertSeverity::Warning,
                format!(
                    "{}: EBITDA de {} abaixo do mínimo de {}",
                    month.label,
                    format_currency(month.ebitda, locale),
                    format_currency(floor, locale)
                ),
            );
        }
    }

    if let (Some(floor), Some(roas)) = (thresholds.min_roas, month.roas) {
        if roas < floor {
            push(
                AlertKind::LowRoas,
                AlertSeverity::Warning,
                format!(
                    "{}: ROAS de {} abaixo do mínimo de {}",
                    month.label,
                    format_number(roas, 2, locale),
                    format_number(floor, 2, locale)
                ),
            );
        }
    }

    alerts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn month(margin_pct: Option<f64>, ebitda: f64, roas: Option<f64>) -> MonthProjection {
        MonthProjection {
            month: 3,
            label: "2024-08".to_string(),
            revenue: 10_000.0,
            taxes: 1_000.0,
            net_revenue: 9_000.0,
            cogs: 0.0,
            freight: 0.0,
            commission: 0.0,
            contribution_margin: 0.0,
            contribution_margin_pct: margin_pct,
            investment: 2_000.0,
            fixed_costs: 0.0,
            ebitda,
            ebitda_pct: None,
            orders: Some(100.0),
            avg_ticket: Some(100.0),
            roas,
        }
    }

    fn thresholds() -> AlertThresholds {
        AlertThresholds {
            min_margin_pct: Some(25.0),
            min_ebitda: Some(1_000.0),
            min_roas: Some(3.0),
        }
    }

    #[test]
    fn test_healthy_month_has_no_alerts() {
        assert!(evaluate(&month(Some(30.0), 2_000.0, Some(4.0)), &thresholds()).is_empty());
    }

    #[test]
    fn test_negative_ebitda_is_error_without_threshold() {
        let none = AlertThresholds {
            min_margin_pct: None,
            min_ebitda: None,
            min_roas: None,
        };
        let alerts = evaluate(&month(Some(30.0), -10.0, Some(4.0)), &none);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].kind, AlertKind::NegativeEbitda);
        assert_eq!(alerts[0].severity, AlertSeverity::Error);
        assert!(alerts[0].message.contains("-R$ 10,00"));
    }

    #[test]
    fn test_low_ebitda_only_when_non_negative() {
        let alerts = evaluate(&month(Some(30.0), 500.0, Some(4.0)), &thresholds());
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].kind, AlertKind::LowEbitda);
        assert_eq!(alerts[0].severity, AlertSeverity::Warning);

        let alerts = evaluate(&month(Some(30.0), -500.0, Some(4.0)), &thresholds());
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].kind, AlertKind::NegativeEbitda);
    }

    #[test]
    fn test_multiple_alerts_in_fixed_order() {
        let alerts = evaluate(&month(Some(10.0), -1.0, Some(1.5)), &thresholds());
        let kinds: Vec<AlertKind> = alerts.iter().map(|a| a.kind).collect();
        assert_eq!(
            kinds,
            vec![AlertKind::LowMargin, AlertKind::NegativeEbitda, AlertKind::LowRoas]
        );
        assert!(alerts.iter().all(|a| a.month == 3 && a.label == "2024-08"));
    }

    #[test]
    fn test_undefined_values_do_not_alert() {
        let alerts = evaluate(&month(None, 2_000.0, None), &thresholds());
        assert!(alerts.is_empty());
    }
}
