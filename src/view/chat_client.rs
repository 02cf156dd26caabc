// src/view/chat_client.rs
use anyhow::{anyhow, Context, Result};
use futures::StreamExt;
use log::{debug, error, info};
use reqwest::Client;

/// Talks to the scenario server's `/api/chat` endpoint.
#[derive(Debug, Clone)]
pub struct ChatClient {
    client: Client,
    url: String,
}

impl ChatClient {
    pub fn new(server_url: &str) -> Self {
        Self {
            client: Client::new(),
            url: format!("{}/api/chat", server_url.trim_end_matches('/')),
        }
    }

    /// Submits the instructions and reports the accumulated response text
    /// after every received chunk. Returns the complete text.
    ///
    /// Only whole UTF-8 characters are ever reported.
    pub async fn generate<F>(&self, instructions: &str, mut on_progress: F) -> Result<String>
    where
        F: FnMut(&str),
    {
        info!("Submitting instructions to {}", self.url);
        let response = self
            .client
            .post(&self.url)
            .json(&instructions)
            .send()
            .await
            .context("scenario server unreachable")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("/api/chat returned {}: {}", status, body);
            return Err(anyhow!("scenario generation failed ({}): {}", status, body));
        }

        let mut body = response.bytes_stream();
        let mut bytes: Vec<u8> = Vec::new();
        let mut text = String::new();

        while let Some(chunk) = body.next().await {
            let chunk = chunk.context("scenario stream broke off")?;
            bytes.extend_from_slice(&chunk);

            let valid = match std::str::from_utf8(&bytes) {
                Ok(s) => s.len(),
                Err(e) => e.valid_up_to(),
            };
            if valid == 0 {
                continue;
            }
            let complete: Vec<u8> = bytes.drain(..valid).collect();
            text.push_str(&String::from_utf8_lossy(&complete));
            debug!("Received {} bytes so far", text.len());
            on_progress(&text);
        }

        if !bytes.is_empty() {
            text.push_str(&String::from_utf8_lossy(&bytes));
            on_progress(&text);
        }

        Ok(text)
    }
}
