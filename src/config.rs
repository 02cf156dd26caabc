// src/config.rs
use anyhow::{anyhow, Context, Result};
use log::warn;
use std::env;
use std::time::Duration;

use crate::models::Indicator;
use crate::view::{ChartScale, ChartScales};

pub const DEFAULT_PORT: u16 = 3030;
pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o";
pub const DEFAULT_ANALYSIS_URL: &str = "http://localhost:5000/";
pub const DEFAULT_SERVER_URL: &str = "http://localhost:3030/";

/// Streaming responses are allowed up to 30 seconds.
pub const DEFAULT_LLM_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_base: String,
    pub api_key: String,
    pub model: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub cache_responses: bool,
    pub llm: LlmConfig,
}

impl ServerConfig {
    /// Reads the server settings from the environment. Call `dotenv().ok()` first.
    pub fn from_env() -> Result<Self> {
        let port = match env::var("PORT") {
            Ok(raw) => raw
                .parse::<u16>()
                .with_context(|| format!("PORT must be a number, got {:?}", raw))?,
            Err(_) => {
                warn!("$PORT not set, defaulting to {}", DEFAULT_PORT);
                DEFAULT_PORT
            }
        };

        let api_key = env::var("OPENAI_API_KEY").context("OPENAI_API_KEY must be set")?;

        let timeout_secs = match env::var("LLM_TIMEOUT_SECS") {
            Ok(raw) => raw
                .parse::<u64>()
                .with_context(|| format!("LLM_TIMEOUT_SECS must be a number, got {:?}", raw))?,
            Err(_) => DEFAULT_LLM_TIMEOUT_SECS,
        };

        let cache_responses = env::var("CACHE_RESPONSES")
            .map(|v| parse_flag(&v))
            .unwrap_or(true);

        Ok(Self {
            port,
            cache_responses,
            llm: LlmConfig {
                api_base: env::var("OPENAI_API_BASE").unwrap_or_else(|_| DEFAULT_API_BASE.to_string()),
                api_key,
                model: env::var("OPENAI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
                timeout: Duration::from_secs(timeout_secs),
            },
        })
    }
}

/// Endpoints the client view talks to, plus its chart bounds.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub server_url: String,
    pub analysis_url: String,
    pub scales: ChartScales,
}

impl ClientConfig {
    pub fn from_env() -> Result<Self> {
        let scales = match env::var("CHART_SCALES") {
            Ok(raw) => parse_chart_scales(&raw).context("invalid CHART_SCALES")?,
            Err(_) => ChartScales::default(),
        };

        Ok(Self {
            server_url: env::var("SCENARIO_SERVER_URL").unwrap_or_else(|_| DEFAULT_SERVER_URL.to_string()),
            analysis_url: env::var("ANALYSIS_BACKEND_URL").unwrap_or_else(|_| DEFAULT_ANALYSIS_URL.to_string()),
            scales,
        })
    }
}

/// Parses `oil=-150:150,gdp=-5:5` on top of the default scales.
pub fn parse_chart_scales(raw: &str) -> Result<ChartScales> {
    let mut scales = ChartScales::default();
    for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let (name, bounds) = entry
            .split_once('=')
            .ok_or_else(|| anyhow!("expected <indicator>=<min>:<max>, got {:?}", entry))?;
        let indicator = name.parse::<Indicator>().map_err(|e| anyhow!(e))?;
        let (min, max) = bounds
            .split_once(':')
            .ok_or_else(|| anyhow!("expected <min>:<max> for {}, got {:?}", indicator, bounds))?;
        let min = min
            .trim()
            .parse::<f64>()
            .with_context(|| format!("bad minimum for {}: {:?}", indicator, min))?;
        let max = max
            .trim()
            .parse::<f64>()
            .with_context(|| format!("bad maximum for {}: {:?}", indicator, max))?;
        scales.set(indicator, ChartScale::new(min, max)?);
    }
    Ok(scales)
}

fn parse_flag(value: &str) -> bool {
    !matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "0" | "false" | "no" | "off"
    )
}
