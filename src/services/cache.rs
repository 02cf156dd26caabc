// src/services/cache.rs
use chrono::{DateTime, Utc};
use log::debug;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::models::ScenarioSet;

#[derive(Debug, Clone)]
pub struct CachedResponse {
    pub scenarios: ScenarioSet,
    pub cached_at: DateTime<Utc>,
}

/// Completed LLM responses keyed by the exact prompt text. Process lifetime only.
#[derive(Debug)]
pub struct ResponseCache {
    enabled: bool,
    entries: RwLock<HashMap<String, CachedResponse>>,
}

impl ResponseCache {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub async fn get(&self, prompt: &str) -> Option<CachedResponse> {
        if !self.enabled {
            return None;
        }
        self.entries.read().await.get(prompt).cloned()
    }

    pub async fn insert(&self, prompt: String, scenarios: ScenarioSet) {
        if !self.enabled {
            return;
        }
        debug!("Caching {} scenarios for prompt of {} bytes", scenarios.scenarios.len(), prompt.len());
        let entry = CachedResponse {
            scenarios,
            cached_at: Utc::now(),
        };
        self.entries.write().await.insert(prompt, entry);
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }
}
