//! Rule-ordered summary sentences for a projection.
//!
//! Lines are always emitted in the same order (revenue trend, EBITDA trend,
//! margin, ROAS, alert count) so the output stays diffable.

use crate::alerts::{AlertSeverity, ProjectionAlert};
use crate::engine::MonthProjection;
use crate::export::{format_currency, format_number, format_percent};
use growth_core::config::Locale;
use growth_core::math::safe_pct;

/// Growth above this (percent over the horizon) is called out as accelerated.
pub const STRONG_GROWTH_PCT: f64 = 50.0;
pub const LOW_MARGIN_PCT: f64 = 20.0;
pub const HEALTHY_MARGIN_PCT: f64 = 40.0;
pub const LOW_ROAS: f64 = 2.0;
pub const HIGH_ROAS: f64 = 5.0;

const LOCALE: Locale = Locale::PtBr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trend {
    Strong,
    Growth,
    Flat,
    Decline,
}

fn trend(change_pct: f64) -> Trend {
    if change_pct > STRONG_GROWTH_PCT {
        Trend::Strong
    } else if change_pct > 0.0 {
        Trend::Growth
    } else if change_pct < 0.0 {
        Trend::Decline
    } else {
        Trend::Flat
    }
}

fn revenue_line(first: &MonthProjection, last: &MonthProjection) -> Option<String> {
    let change = safe_pct(Some(last.revenue - first.revenue), Some(first.revenue))?;
    let pct = format_percent(change.abs(), LOCALE);
    let line = match trend(change) {
        Trend::Strong => format!(
            "Receita cresce {} até {}: crescimento acelerado, valide capacidade de atendimento e estoque.",
            pct, last.label
        ),
        Trend::Growth => format!("Receita cresce {} até {}.", pct, last.label),
        Trend::Flat => "Receita estável ao longo da projeção.".to_string(),
        Trend::Decline => format!(
            "Receita cai {} até {}: revise as premissas de investimento e retenção.",
            pct, last.label
        ),
    };
    Some(line)
}

fn ebitda_line(first: &MonthProjection, last: &MonthProjection) -> Option<String> {
    if first.ebitda >= 0.0 && last.ebitda < 0.0 {
        return Some(format!(
            "EBITDA passa a negativo em {} ({}).",
            last.label,
            format_currency(last.ebitda, LOCALE)
        ));
    }
    if first.ebitda < 0.0 && last.ebitda >= 0.0 {
        return Some(format!(
            "EBITDA sai do negativo e chega a {} em {}.",
            format_currency(last.ebitda, LOCALE),
            last.label
        ));
    }
    if first.ebitda == 0.0 {
        return Some(if last.ebitda > 0.0 {
            format!(
                "EBITDA sai do ponto de equilíbrio e chega a {} em {}.",
                format_currency(last.ebitda, LOCALE),
                last.label
            )
        } else {
            "EBITDA estável ao longo da projeção.".to_string()
        });
    }
    let change = safe_pct(Some(last.ebitda - first.ebitda), Some(first.ebitda.abs()))?;
    let pct = format_percent(change.abs(), LOCALE);
    let line = match trend(change) {
        Trend::Strong => format!("EBITDA cresce {}: operação ganha escala.", pct),
        Trend::Growth => format!("EBITDA cresce {}.", pct),
        Trend::Flat => "EBITDA estável ao longo da projeção.".to_string(),
        Trend::Decline => format!("EBITDA cai {}: custos crescem mais rápido que a receita.", pct),
    };
    Some(line)
}

fn margin_line(last: &MonthProjection) -> Option<String> {
    let margin = last.contribution_margin_pct?;
    if margin < LOW_MARGIN_PCT {
        Some(format!(
            "Margem de contribuição de {} está abaixo de {}: revise preço, CMV e frete.",
            format_percent(margin, LOCALE),
            format_percent(LOW_MARGIN_PCT, LOCALE)
        ))
    } else if margin > HEALTHY_MARGIN_PCT {
        Some(format!(
            "Margem de contribuição saudável de {}: há espaço para acelerar investimento.",
            format_percent(margin, LOCALE)
        ))
    } else {
        None
    }
}

fn roas_line(last: &MonthProjection) -> Option<String> {
    let roas = last.roas?;
    if roas < LOW_ROAS {
        Some(format!(
            "ROAS de {} abaixo de {}: a mídia não se paga com folga.",
            format_number(roas, 2, LOCALE),
            format_number(LOW_ROAS, 0, LOCALE)
        ))
    } else if roas > HIGH_ROAS {
        Some(format!(
            "ROAS de {} acima de {}: avalie escalar o investimento.",
            format_number(roas, 2, LOCALE),
            format_number(HIGH_ROAS, 0, LOCALE)
        ))
    } else {
        None
    }
}

fn alert_line(alerts: &[ProjectionAlert]) -> Option<String> {
    let errors = alerts
        .iter()
        .filter(|a| a.severity == AlertSeverity::Error)
        .count();
    match errors {
        0 => None,
        1 => Some("1 alerta crítico na projeção.".to_string()),
        n => Some(format!("{} alertas críticos na projeção.", n)),
    }
}

/// Summary sentences comparing the first and last months.
pub fn summarize(months: &[MonthProjection], alerts: &[ProjectionAlert]) -> Vec<String> {
    let (Some(first), Some(last)) = (months.first(), months.last()) else {
        return alert_line(alerts).into_iter().collect();
    };
    [
        revenue_line(first, last),
        ebitda_line(first, last),
        margin_line(last),
        roas_line(last),
        alert_line(alerts),
    ]
    .into_iter()
    .flatten()
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::AlertKind;

    fn month(index: u32, revenue: f64, ebitda: f64, margin: f64, roas: f64) -> MonthProjection {
        MonthProjection {
            month: index,
            label: format!("M+{}", index),
            revenue,
            taxes: 0.0,
            net_revenue: revenue,
            cogs: 0.0,
            freight: 0.0,
            commission: 0.0,
            contribution_margin: revenue * margin / 100.0,
            contribution_margin_pct: Some(margin),
            investment: revenue / roas,
            fixed_costs: 0.0,
            ebitda,
            ebitda_pct: None,
            orders: None,
            avg_ticket: None,
            roas: Some(roas),
        }
    }

    fn error_alert(month: u32) -> ProjectionAlert {
        ProjectionAlert {
            month,
            label: format!("M+{}", month),
            kind: AlertKind::NegativeEbitda,
            message: String::new(),
            severity: AlertSeverity::Error,
        }
    }

    #[test]
    fn test_strong_growth_line_differs_from_moderate() {
        let strong = summarize(
            &[month(0, 10_000.0, 1_000.0, 30.0, 3.0), month(6, 16_000.0, 1_100.0, 30.0, 3.0)],
            &[],
        );
        let moderate = summarize(
            &[month(0, 10_000.0, 1_000.0, 30.0, 3.0), month(6, 12_000.0, 1_100.0, 30.0, 3.0)],
            &[],
        );
        assert!(strong[0].contains("acelerado"));
        assert!(strong[0].contains("60,0%"));
        assert!(!moderate[0].contains("acelerado"));
        assert!(moderate[0].contains("20,0%"));
    }

    #[test]
    fn test_fixed_line_order() {
        let months = [
            month(0, 10_000.0, 2_000.0, 30.0, 3.0),
            month(3, 8_000.0, -500.0, 15.0, 1.5),
        ];
        let lines = summarize(&months, &[error_alert(2), error_alert(3)]);
        assert_eq!(lines.len(), 5);
        assert!(lines[0].starts_with("Receita cai 20,0%"));
        assert!(lines[1].starts_with("EBITDA passa a negativo"));
        assert!(lines[2].starts_with("Margem de contribuição de 15,0%"));
        assert!(lines[3].starts_with("ROAS de 1,50 abaixo de 2"));
        assert_eq!(lines[4], "2 alertas críticos na projeção.");
    }

    #[test]
    fn test_healthy_margin_and_high_roas() {
        let months = [
            month(0, 10_000.0, 2_000.0, 45.0, 6.0),
            month(1, 10_000.0, 2_000.0, 45.0, 6.0),
        ];
        let lines = summarize(&months, &[]);
        assert_eq!(lines[0], "Receita estável ao longo da projeção.");
        assert_eq!(lines[1], "EBITDA estável ao longo da projeção.");
        assert!(lines[2].contains("saudável"));
        assert!(lines[3].contains("escalar"));
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn test_mid_band_margin_and_roas_are_silent() {
        let months = [month(0, 10_000.0, 1_000.0, 30.0, 3.0)];
        let lines = summarize(&months, &[]);
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn test_ebitda_recovery() {
        let months = [
            month(0, 10_000.0, -1_000.0, 30.0, 3.0),
            month(1, 14_000.0, 500.0, 30.0, 3.0),
        ];
        let lines = summarize(&months, &[]);
        assert!(lines[1].starts_with("EBITDA sai do negativo"));
    }

    #[test]
    fn test_ebitda_leaving_breakeven_keeps_line_order() {
        let months = [
            month(0, 10_000.0, 0.0, 30.0, 3.0),
            month(2, 12_000.0, 800.0, 15.0, 1.5),
        ];
        let lines = summarize(&months, &[]);
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("Receita cresce"));
        assert_eq!(
            lines[1],
            "EBITDA sai do ponto de equilíbrio e chega a R$ 800,00 em M+2."
        );
        assert!(lines[2].starts_with("Margem"));
        assert!(lines[3].starts_with("ROAS"));

        let flat = summarize(
            &[month(0, 10_000.0, 0.0, 30.0, 3.0), month(1, 10_000.0, 0.0, 30.0, 3.0)],
            &[],
        );
        assert_eq!(flat[1], "EBITDA estável ao longo da projeção.");
    }

    #[test]
    fn test_warnings_do_not_count_as_errors() {
        let mut warning = error_alert(1);
        warning.severity = AlertSeverity::Warning;
        assert!(summarize(&[], &[warning]).is_empty());
        assert_eq!(summarize(&[], &[error_alert(1)]).len(), 1);
    }
}
