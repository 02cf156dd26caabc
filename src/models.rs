// src/models.rs
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One generated stress event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub event: String,
    pub description: String,
}

/// The structured object the LLM is asked to produce.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScenarioSet {
    pub scenarios: Vec<Scenario>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Indicator {
    UnemploymentRate,
    Gdp,
    OilPrice,
    Cpi,
}

impl Indicator {
    /// Slider vector order.
    pub const ALL: [Indicator; 4] = [
        Indicator::UnemploymentRate,
        Indicator::Gdp,
        Indicator::OilPrice,
        Indicator::Cpi,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Indicator::UnemploymentRate => "unemployment_rate",
            Indicator::Gdp => "gdp",
            Indicator::OilPrice => "oil_price",
            Indicator::Cpi => "cpi",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Indicator::UnemploymentRate => "Unemployment Rate",
            Indicator::Gdp => "GDP",
            Indicator::OilPrice => "Oil Price",
            Indicator::Cpi => "CPI",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            Indicator::OilPrice => "$",
            _ => "%",
        }
    }
}

impl fmt::Display for Indicator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for Indicator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "unemployment" | "unemployment_rate" | "unrate" => Ok(Indicator::UnemploymentRate),
            "gdp" => Ok(Indicator::Gdp),
            "oil" | "oil_price" => Ok(Indicator::OilPrice),
            "cpi" | "inflation" => Ok(Indicator::Cpi),
            other => Err(format!("unknown indicator '{}'", other)),
        }
    }
}

/// Offsets at which every indicator is sampled. `Now` is the anchor the
/// other values are measured against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Horizon {
    Now,
    Months6,
    Months12,
    Months18,
    Months24,
}

impl Horizon {
    pub const ALL: [Horizon; 5] = [
        Horizon::Now,
        Horizon::Months6,
        Horizon::Months12,
        Horizon::Months18,
        Horizon::Months24,
    ];

    /// Horizons that carry a stored value.
    pub const FORWARD: [Horizon; 4] = [
        Horizon::Months6,
        Horizon::Months12,
        Horizon::Months18,
        Horizon::Months24,
    ];

    pub fn months(&self) -> u32 {
        match self {
            Horizon::Now => 0,
            Horizon::Months6 => 6,
            Horizon::Months12 => 12,
            Horizon::Months18 => 18,
            Horizon::Months24 => 24,
        }
    }

    pub fn from_months(months: u32) -> Option<Self> {
        Horizon::ALL.into_iter().find(|h| h.months() == months)
    }
}

/// Derived parameters for one scenario, in the shape the analysis backend uses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Parameters {
    #[serde(default)]
    pub pdf_ratio: f64,
    #[serde(default)]
    pub pdf_value: f64,
    pub weighted_mean_unemployment_rate_6m: f64,
    pub weighted_mean_unemployment_rate_12m: f64,
    pub weighted_mean_unemployment_rate_18m: f64,
    pub weighted_mean_unemployment_rate_24m: f64,
    pub weighted_mean_gdp_6m: f64,
    pub weighted_mean_gdp_12m: f64,
    pub weighted_mean_gdp_18m: f64,
    pub weighted_mean_gdp_24m: f64,
    pub weighted_mean_oil_price_6m: f64,
    pub weighted_mean_oil_price_12m: f64,
    pub weighted_mean_oil_price_18m: f64,
    pub weighted_mean_oil_price_24m: f64,
    pub weighted_mean_cpi_6m: f64,
    pub weighted_mean_cpi_12m: f64,
    pub weighted_mean_cpi_18m: f64,
    pub weighted_mean_cpi_24m: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub likelihood: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub related_events: Vec<serde_json::Value>,
}

pub const SLIDER_LEN: usize = 16;

impl Parameters {
    /// Builds parameters from a bare slider vector.
    pub fn from_slider_values(values: &[f64]) -> Result<Self, String> {
        if values.len() != SLIDER_LEN {
            return Err(format!(
                "expected {} weighted means, got {}",
                SLIDER_LEN,
                values.len()
            ));
        }
        let mut params = Parameters::default();
        let mut iter = values.iter();
        for indicator in Indicator::ALL {
            for horizon in Horizon::FORWARD {
                if let (Some(slot), Some(v)) = (params.value_mut(indicator, horizon), iter.next()) {
                    *slot = *v;
                }
            }
        }
        Ok(params)
    }

    /// The 16 weighted means, unemployment/GDP/oil/CPI each at 6..24 months.
    pub fn slider_values(&self) -> Vec<f64> {
        Indicator::ALL
            .iter()
            .flat_map(|i| Horizon::FORWARD.iter().map(move |h| (*i, *h)))
            .map(|(i, h)| self.value(i, h))
            .collect()
    }

    /// Value at a horizon. The anchor is always 0.
    pub fn value(&self, indicator: Indicator, horizon: Horizon) -> f64 {
        self.field(indicator, horizon)
    }

    pub fn value_mut(&mut self, indicator: Indicator, horizon: Horizon) -> Option<&mut f64> {
        use Horizon::*;
        use Indicator::*;
        let slot = match (indicator, horizon) {
            (_, Now) => return None,
            (UnemploymentRate, Months6) => &mut self.weighted_mean_unemployment_rate_6m,
            (UnemploymentRate, Months12) => &mut self.weighted_mean_unemployment_rate_12m,
            (UnemploymentRate, Months18) => &mut self.weighted_mean_unemployment_rate_18m,
            (UnemploymentRate, Months24) => &mut self.weighted_mean_unemployment_rate_24m,
            (Gdp, Months6) => &mut self.weighted_mean_gdp_6m,
            (Gdp, Months12) => &mut self.weighted_mean_gdp_12m,
            (Gdp, Months18) => &mut self.weighted_mean_gdp_18m,
            (Gdp, Months24) => &mut self.weighted_mean_gdp_24m,
            (OilPrice, Months6) => &mut self.weighted_mean_oil_price_6m,
            (OilPrice, Months12) => &mut self.weighted_mean_oil_price_12m,
            (OilPrice, Months18) => &mut self.weighted_mean_oil_price_18m,
            (OilPrice, Months24) => &mut self.weighted_mean_oil_price_24m,
            (Cpi, Months6) => &mut self.weighted_mean_cpi_6m,
            (Cpi, Months12) => &mut self.weighted_mean_cpi_12m,
            (Cpi, Months18) => &mut self.weighted_mean_cpi_18m,
            (Cpi, Months24) => &mut self.weighted_mean_cpi_24m,
        };
        Some(slot)
    }

    fn field(&self, indicator: Indicator, horizon: Horizon) -> f64 {
        use Horizon::*;
        use Indicator::*;
        match (indicator, horizon) {
            (_, Now) => 0.0,
            (UnemploymentRate, Months6) => self.weighted_mean_unemployment_rate_6m,
            (UnemploymentRate, Months12) => self.weighted_mean_unemployment_rate_12m,
            (UnemploymentRate, Months18) => self.weighted_mean_unemployment_rate_18m,
            (UnemploymentRate, Months24) => self.weighted_mean_unemployment_rate_24m,
            (Gdp, Months6) => self.weighted_mean_gdp_6m,
            (Gdp, Months12) => self.weighted_mean_gdp_12m,
            (Gdp, Months18) => self.weighted_mean_gdp_18m,
            (Gdp, Months24) => self.weighted_mean_gdp_24m,
            (OilPrice, Months6) => self.weighted_mean_oil_price_6m,
            (OilPrice, Months12) => self.weighted_mean_oil_price_12m,
            (OilPrice, Months18) => self.weighted_mean_oil_price_18m,
            (OilPrice, Months24) => self.weighted_mean_oil_price_24m,
            (Cpi, Months6) => self.weighted_mean_cpi_6m,
            (Cpi, Months12) => self.weighted_mean_cpi_12m,
            (Cpi, Months18) => self.weighted_mean_cpi_18m,
            (Cpi, Months24) => self.weighted_mean_cpi_24m,
        }
    }

    /// Merge a fresh PDF estimate into these parameters.
    pub fn apply_pdf(&mut self, estimate: &PdfEstimate) {
        self.pdf_value = estimate.pdf_value;
        self.pdf_ratio = estimate.pdf_ratio;
        if estimate.likelihood.is_some() {
            self.likelihood = estimate.likelihood.clone();
        }
    }
}

/// Reply of the backend's `calculate_pdf` endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PdfEstimate {
    pub pdf_value: f64,
    pub pdf_ratio: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub likelihood: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Likelihood {
    ExtremelyUnlikely,
    VeryUnlikely,
    Unlikely,
    Neutral,
    Likely,
    Other(String),
}

impl Likelihood {
    /// Parses the label the backend sends.
    pub fn from_label(label: &str) -> Self {
        match label {
            "Extremely Unlikely" => Likelihood::ExtremelyUnlikely,
            "Very Unlikely" => Likelihood::VeryUnlikely,
            "Unlikely" => Likelihood::Unlikely,
            "Neutral" => Likelihood::Neutral,
            "Likely" => Likelihood::Likely,
            other => Likelihood::Other(other.to_string()),
        }
    }

    /// Buckets a density ratio (scenario pdf / pdf at the historical mean).
    pub fn from_pdf_ratio(ratio: f64) -> Self {
        if !ratio.is_finite() || ratio < 1e-4 {
            Likelihood::ExtremelyUnlikely
        } else if ratio < 1e-2 {
            Likelihood::VeryUnlikely
        } else if ratio < 0.1 {
            Likelihood::Unlikely
        } else if ratio < 0.5 {
            Likelihood::Neutral
        } else {
            Likelihood::Likely
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Likelihood::ExtremelyUnlikely => "Extremely Unlikely",
            Likelihood::VeryUnlikely => "Very Unlikely",
            Likelihood::Unlikely => "Unlikely",
            Likelihood::Neutral => "Neutral",
            Likelihood::Likely => "Likely",
            Likelihood::Other(label) => label,
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            Likelihood::ExtremelyUnlikely => "red-500",
            Likelihood::VeryUnlikely => "red-400",
            Likelihood::Unlikely => "yellow-500",
            Likelihood::Neutral => "yellow-400",
            Likelihood::Likely => "green-500",
            Likelihood::Other(_) => "gray-400",
        }
    }
}

impl fmt::Display for Likelihood {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}
