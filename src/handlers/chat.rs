// src/handlers/chat.rs
use futures::StreamExt;
use log::{debug, error, info};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use warp::http::header::CONTENT_TYPE;
use warp::http::Response;
use warp::hyper::Body;
use warp::reply::Reply;
use warp::Rejection;

use super::error::ApiError;
use crate::models::ScenarioSet;
use crate::routes::AppState;
use crate::services::cache::ResponseCache;
use crate::services::llm::TextStream;
use crate::services::prompt::{build_prompt, context_from_body};

pub async fn post_chat(body: Value, state: Arc<AppState>) -> Result<warp::reply::Response, Rejection> {
    let context = context_from_body(&body);
    let prompt = build_prompt(context.as_deref());
    debug!("Built prompt:\n{}", prompt);

    if let Some(hit) = state.cache.get(&prompt).await {
        info!(
            "Serving {} cached scenarios (cached at {})",
            hit.scenarios.scenarios.len(),
            hit.cached_at
        );
        return Ok(warp::reply::json(&hit.scenarios).into_response());
    }

    info!("Generating scenarios (context: {:?})", context);
    let upstream = state.llm.stream_scenarios(&prompt).await.map_err(|e| {
        error!("Error in chat route: {}", e);
        warp::reject::custom(ApiError::generation_failed())
    })?;

    let forwarded = forward_and_cache(upstream, prompt, state.cache.clone());

    Response::builder()
        .header(CONTENT_TYPE, "text/plain; charset=utf-8")
        .body(Body::wrap_stream(forwarded))
        .map_err(|e| {
            error!("Failed to build streaming response: {}", e);
            warp::reject::custom(ApiError::generation_failed())
        })
}

/// Relays upstream fragments to the caller while collecting the full text.
/// Once the upstream ends, the text is cached before the relay closes, and
/// the upstream keeps being drained if the caller goes away.
fn forward_and_cache(mut upstream: TextStream, prompt: String, cache: Arc<ResponseCache>) -> TextStream {
    let (tx, rx) = mpsc::channel(32);

    tokio::spawn(async move {
        let mut full = String::new();
        let mut caller_gone = false;

        while let Some(item) = upstream.next().await {
            match item {
                Ok(text) => {
                    full.push_str(&text);
                    if !caller_gone && tx.send(Ok(text)).await.is_err() {
                        debug!("Caller disconnected, draining LLM stream for the cache");
                        caller_gone = true;
                    }
                }
                Err(e) => {
                    error!("LLM stream failed, response not cached: {}", e);
                    let _ = tx.send(Err(e)).await;
                    return;
                }
            }
        }

        match serde_json::from_str::<ScenarioSet>(&full) {
            Ok(scenarios) => cache.insert(prompt, scenarios).await,
            Err(e) => error!("Failed to cache response: {}", e),
        }
    });

    ReceiverStream::new(rx)
}
