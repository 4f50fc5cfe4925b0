use crate::error::{GrowthError, GrowthResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Root engine configuration. Loaded from an optional TOML file and
/// environment variables with the prefix `GROWTH_ENGINE__`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub funnel: FunnelConfig,
    #[serde(default)]
    pub projection: ProjectionConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

// ─── Funnel Config ──────────────────────────────────────────────────────────

/// Each funnel calculator carries its own thresholds; the inside-sales matrix
/// and the e-commerce funnel are tuned independently. Keys left unset in a
/// file or the environment keep the profile's defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct FunnelConfig {
    #[serde(default = "default_inside_sales_profile")]
    pub inside_sales: FunnelProfileConfig,
    #[serde(default = "default_ecommerce_profile")]
    pub ecommerce: FunnelProfileConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FunnelProfileConfig {
    /// Minimum denominator volume for a stage to be eligible for diagnosis.
    /// `AppConfig::load` seeds the per-profile value before reading sources.
    #[serde(default = "default_min_sample")]
    pub min_sample: u64,
    /// `current / target` at or above this is `ok` (higher-is-better).
    #[serde(default = "default_ok_ratio")]
    pub ok_ratio: f64,
    /// `current / target` at or above this (and below `ok_ratio`) is `attention`.
    #[serde(default = "default_attention_ratio")]
    pub attention_ratio: f64,
    /// `current <= target * lower_attention_ratio` is `attention` (lower-is-better).
    #[serde(default = "default_lower_attention_ratio")]
    pub lower_attention_ratio: f64,
}

pub const DEFAULT_OK_RATIO: f64 = 0.9;
pub const DEFAULT_ATTENTION_RATIO: f64 = 0.7;
pub const DEFAULT_LOWER_ATTENTION_RATIO: f64 = 1.3;
pub const INSIDE_SALES_MIN_SAMPLE: u64 = 30;
pub const ECOMMERCE_MIN_SAMPLE: u64 = 100;

fn default_min_sample() -> u64 {
    INSIDE_SALES_MIN_SAMPLE
}
fn default_ok_ratio() -> f64 {
    DEFAULT_OK_RATIO
}
fn default_attention_ratio() -> f64 {
    DEFAULT_ATTENTION_RATIO
}
fn default_lower_attention_ratio() -> f64 {
    DEFAULT_LOWER_ATTENTION_RATIO
}

fn default_inside_sales_profile() -> FunnelProfileConfig {
    FunnelProfileConfig {
        min_sample: INSIDE_SALES_MIN_SAMPLE,
        ..FunnelProfileConfig::default()
    }
}
fn default_ecommerce_profile() -> FunnelProfileConfig {
    FunnelProfileConfig {
        min_sample: ECOMMERCE_MIN_SAMPLE,
        ..FunnelProfileConfig::default()
    }
}

impl Default for FunnelProfileConfig {
    fn default() -> Self {
        Self {
            min_sample: INSIDE_SALES_MIN_SAMPLE,
            ok_ratio: DEFAULT_OK_RATIO,
            attention_ratio: DEFAULT_ATTENTION_RATIO,
            lower_attention_ratio: DEFAULT_LOWER_ATTENTION_RATIO,
        }
    }
}

impl Default for FunnelConfig {
    fn default() -> Self {
        Self {
            inside_sales: default_inside_sales_profile(),
            ecommerce: default_ecommerce_profile(),
        }
    }
}

impl FunnelProfileConfig {
    pub fn validate(&self) -> GrowthResult<()> {
        if !(self.attention_ratio > 0.0 && self.attention_ratio < self.ok_ratio) {
            return Err(GrowthError::Config(format!(
                "attention_ratio ({}) must be positive and below ok_ratio ({})",
                self.attention_ratio, self.ok_ratio
            )));
        }
        if self.lower_attention_ratio < 1.0 {
            return Err(GrowthError::Config(format!(
                "lower_attention_ratio ({}) must be at least 1.0",
                self.lower_attention_ratio
            )));
        }
        Ok(())
    }
}

// ─── Projection Config ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct ProjectionConfig {
    #[serde(default = "default_horizon_months")]
    pub horizon_months: u32,
    #[serde(default = "default_max_horizon_months")]
    pub max_horizon_months: u32,
    #[serde(default)]
    pub alerts: AlertThresholds,
}

/// Alert floors checked against every projected month. A `None` floor is
/// not checked; negative EBITDA is always an error regardless.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlertThresholds {
    #[serde(default)]
    pub min_margin_pct: Option<f64>,
    #[serde(default)]
    pub min_ebitda: Option<f64>,
    #[serde(default)]
    pub min_roas: Option<f64>,
}

fn default_horizon_months() -> u32 {
    12
}
fn default_max_horizon_months() -> u32 {
    120
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            min_margin_pct: Some(20.0),
            min_ebitda: None,
            min_roas: Some(2.0),
        }
    }
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            horizon_months: default_horizon_months(),
            max_horizon_months: default_max_horizon_months(),
            alerts: AlertThresholds::default(),
        }
    }
}

// ─── Export Config ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Locale {
    #[default]
    PtBr,
    EnUs,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExportConfig {
    /// Single ASCII field delimiter.
    #[serde(default = "default_separator")]
    pub separator: char,
    #[serde(default)]
    pub locale: Locale,
}

fn default_separator() -> char {
    ';'
}

impl ExportConfig {
    pub fn validate(&self) -> GrowthResult<()> {
        let sep = self.separator;
        if !sep.is_ascii() || sep.is_ascii_alphanumeric() || matches!(sep, '"' | '\n' | '\r') {
            return Err(GrowthError::Config(format!(
                "export separator {:?} must be a single ASCII punctuation or whitespace character",
                sep
            )));
        }
        Ok(())
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            separator: default_separator(),
            locale: Locale::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from an optional TOML file, then environment
    /// variables (`GROWTH_ENGINE__PROJECTION__HORIZON_MONTHS=24`, ...).
    pub fn load(path: Option<&Path>) -> GrowthResult<Self> {
        let mut builder = config::Config::builder();
        for (prefix, profile) in [
            ("funnel.inside_sales", default_inside_sales_profile()),
            ("funnel.ecommerce", default_ecommerce_profile()),
        ] {
            builder = builder
                .set_default(format!("{prefix}.min_sample"), profile.min_sample as i64)?
                .set_default(format!("{prefix}.ok_ratio"), profile.ok_ratio)?
                .set_default(format!("{prefix}.attention_ratio"), profile.attention_ratio)?
                .set_default(
                    format!("{prefix}.lower_attention_ratio"),
                    profile.lower_attention_ratio,
                )?;
        }
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        let builder = builder.add_source(
            config::Environment::with_prefix("GROWTH_ENGINE")
                .separator("__")
                .try_parsing(true),
        );

        let config: AppConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> GrowthResult<()> {
        self.funnel.inside_sales.validate()?;
        self.funnel.ecommerce.validate()?;
        self.export.validate()?;
        if self.projection.max_horizon_months == 0 {
            return Err(GrowthError::Config(
                "max_horizon_months must be positive".to_string(),
            ));
        }
        if self.projection.horizon_months > self.projection.max_horizon_months {
            return Err(GrowthError::InvalidHorizon {
                horizon: self.projection.horizon_months,
                max: self.projection.max_horizon_months,
            });
        }
        Ok(())
    }
}
