// src/view/mod.rs
//! Client-side view state: scenario cards, the selected card and the
//! parameters fetched for each card, with chart-style editing.
pub mod chat_client;
pub mod partial;
pub mod render;

use anyhow::{anyhow, bail, Context, Result};
use log::{info, warn};
use std::collections::HashMap;

use crate::models::{Horizon, Indicator, Likelihood, Parameters, Scenario, ScenarioSet};
use crate::services::analysis::AnalysisClient;
use chat_client::ChatClient;
use partial::parse_partial_scenarios;

/// Vertical bounds of one indicator chart. Dragged points stay inside.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartScale {
    min: f64,
    max: f64,
}

impl ChartScale {
    /// Bounds must be finite with `min < max`.
    pub fn new(min: f64, max: f64) -> Result<Self> {
        if !min.is_finite() || !max.is_finite() {
            bail!("chart bounds must be finite, got {} .. {}", min, max);
        }
        if min >= max {
            bail!("chart minimum {} must be below maximum {}", min, max);
        }
        Ok(Self { min, max })
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    /// Clamps to the scale and rounds to one decimal, half up like a chart drag.
    pub fn snap(&self, value: f64) -> f64 {
        (value.clamp(self.min, self.max) * 10.0 + 0.5).floor() / 10.0
    }
}

#[derive(Debug, Clone)]
pub struct ChartScales {
    scales: HashMap<Indicator, ChartScale>,
}

impl Default for ChartScales {
    fn default() -> Self {
        let mut scales = HashMap::new();
        scales.insert(Indicator::UnemploymentRate, ChartScale { min: -10.0, max: 10.0 });
        scales.insert(Indicator::Gdp, ChartScale { min: -10.0, max: 10.0 });
        scales.insert(Indicator::OilPrice, ChartScale { min: -100.0, max: 100.0 });
        scales.insert(Indicator::Cpi, ChartScale { min: -10.0, max: 10.0 });
        Self { scales }
    }
}

impl ChartScales {
    pub fn set(&mut self, indicator: Indicator, scale: ChartScale) {
        self.scales.insert(indicator, scale);
    }

    pub fn get(&self, indicator: Indicator) -> ChartScale {
        self.scales.get(&indicator).copied().unwrap_or(ChartScale {
            min: f64::MIN,
            max: f64::MAX,
        })
    }
}

#[derive(Debug, Default)]
pub struct ScenarioBoard {
    scenarios: Vec<Scenario>,
    selected: Option<usize>,
    parameters: HashMap<usize, Parameters>,
    generating: bool,
    scales: ChartScales,
}

impl ScenarioBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scales(scales: ChartScales) -> Self {
        Self {
            scales,
            ..Self::default()
        }
    }

    pub fn scenarios(&self) -> &[Scenario] {
        &self.scenarios
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn is_generating(&self) -> bool {
        self.generating
    }

    pub fn scales(&self) -> &ChartScales {
        &self.scales
    }

    pub fn parameters(&self, idx: usize) -> Option<&Parameters> {
        self.parameters.get(&idx)
    }

    /// Streams a fresh set of cards from the server, updating them as text arrives.
    /// Returns the number of cards generated.
    pub async fn generate(&mut self, chat: &ChatClient, instructions: &str) -> Result<usize> {
        self.generating = true;
        let Self {
            scenarios,
            selected,
            parameters,
            ..
        } = self;
        let outcome = chat
            .generate(instructions, |text| {
                if let Some(cards) = parse_partial_scenarios(text) {
                    // Parameters belong to the previous cards.
                    *selected = None;
                    parameters.clear();
                    *scenarios = cards;
                }
            })
            .await;
        self.generating = false;
        let text = outcome?;

        match serde_json::from_str::<ScenarioSet>(&text) {
            Ok(set) => self.scenarios = set.scenarios,
            Err(e) => warn!("Scenario stream ended with incomplete JSON, keeping partial cards: {}", e),
        }

        self.selected = None;
        self.parameters.clear();
        info!("Generated {} scenarios", self.scenarios.len());
        Ok(self.scenarios.len())
    }

    /// Selects a card, fetching its parameters on first selection.
    pub async fn select(&mut self, analysis: &AnalysisClient, idx: usize) -> Result<&Parameters> {
        let description = self
            .scenarios
            .get(idx)
            .map(|s| s.description.clone())
            .ok_or_else(|| anyhow!("no scenario at index {} ({} cards)", idx, self.scenarios.len()))?;
        self.selected = Some(idx);

        if !self.parameters.contains_key(&idx) {
            let params = analysis
                .process_query(&description)
                .await
                .with_context(|| format!("failed to fetch parameters for scenario {}", idx))?;
            self.parameters.insert(idx, params);
        }

        self.parameters
            .get(&idx)
            .ok_or_else(|| anyhow!("parameters for scenario {} missing", idx))
    }

    /// Moves one chart point and refreshes the density. Returns the stored value.
    pub async fn adjust(
        &mut self,
        analysis: &AnalysisClient,
        idx: usize,
        indicator: Indicator,
        horizon: Horizon,
        value: f64,
    ) -> Result<f64> {
        if !value.is_finite() {
            bail!("value must be a finite number");
        }
        let snapped = self.scales.get(indicator).snap(value);
        let params = self
            .parameters
            .get_mut(&idx)
            .ok_or_else(|| anyhow!("scenario {} has no parameters yet", idx))?;
        let slot = params
            .value_mut(indicator, horizon)
            .ok_or_else(|| anyhow!("the {}-month anchor of {} cannot be moved", horizon.months(), indicator))?;
        *slot = snapped;

        self.recalculate(analysis, idx).await?;
        Ok(snapped)
    }

    /// Replaces a whole chart (6/12/18/24 months) and refreshes the density once.
    pub async fn drag_series(
        &mut self,
        analysis: &AnalysisClient,
        idx: usize,
        indicator: Indicator,
        values: [f64; 4],
    ) -> Result<[f64; 4]> {
        if values.iter().any(|v| !v.is_finite()) {
            bail!("values must be finite numbers");
        }
        let scale = self.scales.get(indicator);
        let params = self
            .parameters
            .get_mut(&idx)
            .ok_or_else(|| anyhow!("scenario {} has no parameters yet", idx))?;

        let mut snapped = [0.0; 4];
        for (i, (horizon, value)) in Horizon::FORWARD.iter().zip(values).enumerate() {
            snapped[i] = scale.snap(value);
            if let Some(slot) = params.value_mut(indicator, *horizon) {
                *slot = snapped[i];
            }
        }

        self.recalculate(analysis, idx).await?;
        Ok(snapped)
    }

    async fn recalculate(&mut self, analysis: &AnalysisClient, idx: usize) -> Result<()> {
        let snapshot = self
            .parameters
            .get(&idx)
            .cloned()
            .ok_or_else(|| anyhow!("scenario {} has no parameters yet", idx))?;
        let estimate = analysis
            .calculate_pdf(&snapshot)
            .await
            .context("pdf recalculation failed")?;
        if let Some(params) = self.parameters.get_mut(&idx) {
            params.apply_pdf(&estimate);
        }
        Ok(())
    }

    /// The chart points of one indicator, the zero anchor first.
    pub fn trajectory(&self, idx: usize, indicator: Indicator) -> Option<Vec<(u32, f64)>> {
        let params = self.parameters.get(&idx)?;
        Some(
            Horizon::ALL
                .iter()
                .map(|h| (h.months(), params.value(indicator, *h)))
                .collect(),
        )
    }

    /// The backend's label when it sent one, otherwise derived from the ratio.
    pub fn likelihood(&self, idx: usize) -> Option<Likelihood> {
        let params = self.parameters.get(&idx)?;
        Some(match params.likelihood.as_deref() {
            Some(label) => Likelihood::from_label(label),
            None => Likelihood::from_pdf_ratio(params.pdf_ratio),
        })
    }

    #[cfg(test)]
    pub(crate) fn seed(&mut self, scenarios: Vec<Scenario>, parameters: Vec<(usize, Parameters)>) {
        self.scenarios = scenarios;
        self.parameters = parameters.into_iter().collect();
    }
}
