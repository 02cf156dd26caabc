// src/routes.rs
use log::{error, info};
use std::convert::Infallible;
use std::sync::Arc;
use warp::filters::body::BodyDeserializeError;
use warp::http::StatusCode;
use warp::reject::Rejection;
use warp::{Filter, Reply};

use crate::handlers::chat::post_chat;
use crate::handlers::error::ApiError;
use crate::services::cache::ResponseCache;
use crate::services::llm::OpenAiClient;

const MAX_BODY_BYTES: u64 = 16 * 1024;

/// Shared by every request for the life of the process.
pub struct AppState {
    pub llm: OpenAiClient,
    pub cache: Arc<ResponseCache>,
}

impl AppState {
    pub fn new(llm: OpenAiClient, cache_responses: bool) -> Self {
        Self {
            llm,
            cache: Arc::new(ResponseCache::new(cache_responses)),
        }
    }
}

// Map rejections to a JSON error body
async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let code;
    let message: String;

    if err.is_not_found() {
        code = StatusCode::NOT_FOUND;
        message = "Not Found".to_string();
    } else if let Some(api_error) = err.find::<ApiError>() {
        code = api_error.status;
        message = api_error.message.clone();
    } else if let Some(e) = err.find::<BodyDeserializeError>() {
        code = StatusCode::BAD_REQUEST;
        message = format!("Invalid request body: {}", e);
    } else if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        code = StatusCode::PAYLOAD_TOO_LARGE;
        message = "Payload Too Large".to_string();
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        code = StatusCode::METHOD_NOT_ALLOWED;
        message = "Method Not Allowed".to_string();
    } else {
        error!("Unhandled rejection: {:?}", err);
        code = StatusCode::INTERNAL_SERVER_ERROR;
        message = "Internal Server Error".to_string();
    }

    Ok(warp::reply::with_status(
        warp::reply::json(&serde_json::json!({
            "error": message,
        })),
        code,
    ))
}

pub fn routes(state: Arc<AppState>) -> impl Filter<Extract = impl Reply, Error = Infallible> + Clone {
    info!("Configuring routes...");

    let state_filter = warp::any().map(move || state.clone());

    // POST /api/chat with a JSON body
    let chat_route = warp::path!("api" / "chat")
        .and(warp::post())
        .and(warp::body::content_length_limit(MAX_BODY_BYTES))
        .and(warp::body::json())
        .and(state_filter)
        .and_then(post_chat);

    info!("All routes configured successfully.");

    // Add recovery handling for our custom errors
    chat_route.recover(handle_rejection)
}
