//! Period labels for projected months.

use chrono::{Months, NaiveDate};

/// Label for month `index` after `base`. A `YYYY-MM` base yields successive
/// calendar months; anything else yields `M+index`.
pub fn period_label(base: &str, index: u32) -> String {
    if index == 0 {
        return base.to_string();
    }
    NaiveDate::parse_from_str(&format!("{}-01", base.trim()), "%Y-%m-%d")
        .ok()
        .and_then(|d| d.checked_add_months(Months::new(index)))
        .map(|d| d.format("%Y-%m").to_string())
        .unwrap_or_else(|| format!("M+{}", index))
}
