// src/services/analysis.rs
use anyhow::{anyhow, Context, Result};
use log::{debug, error, info};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use crate::models::{Parameters, PdfEstimate};

/// `process_query` answers either with a full parameter object or with the
/// bare weighted means in slider order.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ProcessQueryReply {
    Means { weighted_means: Vec<f64> },
    Full(Parameters),
}

/// REST client for the external analysis backend that owns the density model.
#[derive(Debug, Clone)]
pub struct AnalysisClient {
    client: Client,
    base_url: String,
}

impl AnalysisClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Self {
            client: Client::new(),
            base_url,
        }
    }

    /// Derives the economic parameters for a scenario description.
    pub async fn process_query(&self, query: &str) -> Result<Parameters> {
        let url = format!("{}process_query", self.base_url);
        info!("Fetching parameters from {}", url);

        let response = self
            .client
            .post(&url)
            .header("Accept", "application/json")
            .json(&json!({ "query": query }))
            .send()
            .await
            .context("analysis backend unreachable")?;

        if !response.status().is_success() {
            error!("process_query returned {}", response.status());
            return Err(anyhow!("Network response was not ok ({})", response.status()));
        }

        let reply: ProcessQueryReply = response
            .json()
            .await
            .context("failed to parse process_query reply")?;

        let params = match reply {
            ProcessQueryReply::Full(params) => params,
            ProcessQueryReply::Means { weighted_means } => {
                Parameters::from_slider_values(&weighted_means).map_err(|e| anyhow!(e))?
            }
        };
        debug!("Received parameters: {:?}", params);
        Ok(params)
    }

    /// Asks the backend for the density of the given parameter vector.
    pub async fn calculate_pdf(&self, params: &Parameters) -> Result<PdfEstimate> {
        let url = format!("{}calculate_pdf", self.base_url);
        let slider_values = params.slider_values();
        debug!("Recalculating pdf for {:?}", slider_values);

        let response = self
            .client
            .post(&url)
            .header("Accept", "application/json")
            .json(&json!({ "slider_values": slider_values }))
            .send()
            .await
            .context("analysis backend unreachable")?;

        if !response.status().is_success() {
            error!("calculate_pdf returned {}", response.status());
            return Err(anyhow!("Network response was not ok ({})", response.status()));
        }

        let estimate: PdfEstimate = response
            .json()
            .await
            .context("failed to parse calculate_pdf reply")?;
        info!("pdf value {} (ratio to mean {})", estimate.pdf_value, estimate.pdf_ratio);
        Ok(estimate)
    }
}
