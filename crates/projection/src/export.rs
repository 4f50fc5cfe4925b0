//! Locale-aware number formatting and delimited-text export of a projection.

use crate::engine::MonthProjection;
use growth_core::config::{ExportConfig, Locale};
use growth_core::error::{GrowthError, GrowthResult};

const UNDEFINED: &str = "-";

#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub separator: char,
    pub locale: Locale,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self::from(&ExportConfig::default())
    }
}

impl From<&ExportConfig> for ExportOptions {
    fn from(config: &ExportConfig) -> Self {
        Self {
            separator: config.separator,
            locale: config.locale,
        }
    }
}

fn separators(locale: Locale) -> (char, char) {
    match locale {
        Locale::PtBr => ('.', ','),
        Locale::EnUs => (',', '.'),
    }
}

/// Fixed-decimal number with thousands grouping, e.g. `10.450,00` (pt-BR).
pub fn format_number(value: f64, decimals: usize, locale: Locale) -> String {
    let (thousands, decimal) = separators(locale);
    let rendered = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match rendered.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (rendered.as_str(), None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(thousands);
        }
        grouped.push(ch);
    }
    if let Some(frac) = frac_part {
        grouped.push(decimal);
        grouped.push_str(frac);
    }

    let is_zero = rendered.chars().all(|c| c == '0' || c == '.');
    if value.is_sign_negative() && !is_zero {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

/// `R$ 10.450,00` / `$10,450.00`; negatives get a leading minus.
pub fn format_currency(value: f64, locale: Locale) -> String {
    let digits = format_number(value.abs(), 2, locale);
    let sign = if value < 0.0 && digits.chars().any(|c| c.is_ascii_digit() && c != '0') {
        "-"
    } else {
        ""
    };
    match locale {
        Locale::PtBr => format!("{}R$ {}", sign, digits),
        Locale::EnUs => format!("{}${}", sign, digits),
    }
}

/// One decimal place, e.g. `12,5%`.
pub fn format_percent(value: f64, locale: Locale) -> String {
    format!("{}%", format_number(value, 1, locale))
}

fn optional(value: Option<f64>, render: impl Fn(f64) -> String) -> String {
    value.map(render).unwrap_or_else(|| UNDEFINED.to_string())
}

fn header(locale: Locale) -> [&'static str; 17] {
    match locale {
        Locale::PtBr => [
            "Mês",
            "Período",
            "Receita",
            "Impostos",
            "Receita líquida",
            "CMV",
            "Frete",
            "Comissão",
            "Margem de contribuição",
            "Margem %",
            "Investimento",
            "Custos fixos",
            "EBITDA",
            "EBITDA %",
            "Pedidos",
            "Ticket médio",
            "ROAS",
        ],
        Locale::EnUs => [
            "Month",
            "Period",
            "Revenue",
            "Taxes",
            "Net revenue",
            "COGS",
            "Freight",
            "Commission",
            "Contribution margin",
            "Margin %",
            "Investment",
            "Fixed costs",
            "EBITDA",
            "EBITDA %",
            "Orders",
            "Average ticket",
            "ROAS",
        ],
    }
}

fn export_error(err: impl std::fmt::Display) -> GrowthError {
    GrowthError::Export(err.to_string())
}

/// Header record plus one record per month, newline-terminated. Fields that
/// collide with the separator are quoted.
pub fn to_delimited(months: &[MonthProjection], options: &ExportOptions) -> GrowthResult<String> {
    let locale = options.locale;
    let delimiter = u8::try_from(options.separator)
        .ok()
        .filter(u8::is_ascii)
        .ok_or_else(|| {
            GrowthError::Config(format!(
                "export separator {:?} is not a single ASCII character",
                options.separator
            ))
        })?;
    let money = |v: f64| format_currency(v, locale);
    let pct = |v: f64| format_percent(v, locale);

    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(vec![]);
    writer.write_record(header(locale)).map_err(export_error)?;

    for m in months {
        writer
            .write_record([
                m.month.to_string(),
                m.label.clone(),
                money(m.revenue),
                money(m.taxes),
                money(m.net_revenue),
                money(m.cogs),
                money(m.freight),
                money(m.commission),
                money(m.contribution_margin),
                optional(m.contribution_margin_pct, pct),
                money(m.investment),
                money(m.fixed_costs),
                money(m.ebitda),
                optional(m.ebitda_pct, pct),
                optional(m.orders, |v| format_number(v, 0, locale)),
                optional(m.avg_ticket, money),
                optional(m.roas, |v| format_number(v, 2, locale)),
            ])
            .map_err(export_error)?;
    }

    let bytes = writer.into_inner().map_err(export_error)?;
    String::from_utf8(bytes).map_err(export_error)
}
