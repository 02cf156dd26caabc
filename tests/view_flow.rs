mod common;

use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_json, body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use macro_scenarios::config::LlmConfig;
use macro_scenarios::models::{Horizon, Indicator, Likelihood};
use macro_scenarios::routes::{routes, AppState};
use macro_scenarios::services::analysis::AnalysisClient;
use macro_scenarios::services::llm::OpenAiClient;
use macro_scenarios::view::chat_client::ChatClient;
use macro_scenarios::view::ScenarioBoard;

const SCENARIOS_JSON: &str = r#"{"scenarios":[{"event":"Pandemic","description":"A virus spreads from Jakarta."},{"event":"Strait closure","description":"Tankers stop in Hormuz."}]}"#;

fn backend_parameters() -> Value {
    json!({
        "weighted_mean_unemployment_rate_6m": 1.2,
        "weighted_mean_unemployment_rate_12m": 2.4,
        "weighted_mean_unemployment_rate_18m": 2.0,
        "weighted_mean_unemployment_rate_24m": 1.1,
        "weighted_mean_gdp_6m": -2.0,
        "weighted_mean_gdp_12m": -3.1,
        "weighted_mean_gdp_18m": -1.0,
        "weighted_mean_gdp_24m": 0.5,
        "weighted_mean_oil_price_6m": -20.0,
        "weighted_mean_oil_price_12m": -12.5,
        "weighted_mean_oil_price_18m": -4.0,
        "weighted_mean_oil_price_24m": 3.0,
        "weighted_mean_cpi_6m": -0.4,
        "weighted_mean_cpi_12m": 0.1,
        "weighted_mean_cpi_18m": 0.6,
        "weighted_mean_cpi_24m": 0.9
    })
}

async fn mount_chat(server: &MockServer, body: &str) {
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body.to_string(), "text/plain; charset=utf-8"))
        .mount(server)
        .await;
}

async fn generated_board(server: &MockServer) -> ScenarioBoard {
    mount_chat(server, SCENARIOS_JSON).await;
    let chat = ChatClient::new(&server.uri());
    let mut board = ScenarioBoard::new();
    let count = board.generate(&chat, "pandemic").await.unwrap();
    assert_eq!(count, 2);
    board
}

#[tokio::test]
async fn chat_client_sends_instructions_and_reports_progress() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_json(json!("oil shock")))
        .respond_with(ResponseTemplate::new(200).set_body_raw(SCENARIOS_JSON, "text/plain"))
        .expect(1)
        .mount(&server)
        .await;

    let chat = ChatClient::new(&format!("{}/", server.uri()));
    let mut progress = Vec::new();
    let text = chat
        .generate("oil shock", |text| progress.push(text.len()))
        .await
        .unwrap();

    assert_eq!(text, SCENARIOS_JSON);
    assert_eq!(progress.last().copied(), Some(SCENARIOS_JSON.len()));
    assert!(progress.windows(2).all(|w| w[0] <= w[1]));
}

#[tokio::test]
async fn chat_failure_leaves_board_idle() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"error": "Failed to generate response"})))
        .mount(&server)
        .await;

    let chat = ChatClient::new(&server.uri());
    let mut board = ScenarioBoard::new();
    let err = board.generate(&chat, "pandemic").await.unwrap_err();
    assert!(err.to_string().contains("Failed to generate response"));
    assert!(!board.is_generating());
    assert!(board.scenarios().is_empty());
}

#[tokio::test]
async fn select_fetches_parameters_once_per_card() {
    let server = MockServer::start().await;
    let mut board = generated_board(&server).await;
    assert!(!board.is_generating());
    assert_eq!(board.scenarios()[1].event, "Strait closure");

    Mock::given(method("POST"))
        .and(path("/process_query"))
        .and(body_json(json!({"query": "A virus spreads from Jakarta."})))
        .respond_with(ResponseTemplate::new(200).set_body_json(backend_parameters()))
        .expect(1)
        .mount(&server)
        .await;

    let analysis = AnalysisClient::new(server.uri());
    let params = board.select(&analysis, 0).await.unwrap();
    assert_eq!(params.value(Indicator::UnemploymentRate, Horizon::Months12), 2.4);
    assert_eq!(board.selected(), Some(0));

    board.select(&analysis, 0).await.unwrap();
    assert_eq!(board.selected(), Some(0));
}

#[tokio::test]
async fn bare_weighted_means_reply_is_accepted() {
    let server = MockServer::start().await;
    let mut board = generated_board(&server).await;

    let means: Vec<f64> = (1..=16).map(|i| i as f64 / 10.0).collect();
    Mock::given(method("POST"))
        .and(path("/process_query"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"weighted_means": means})))
        .mount(&server)
        .await;

    let analysis = AnalysisClient::new(server.uri());
    let params = board.select(&analysis, 1).await.unwrap();
    assert_eq!(params.slider_values(), means);
    assert_eq!(params.value(Indicator::Cpi, Horizon::Months24), 1.6);
}

#[tokio::test]
async fn adjusting_a_point_snaps_it_and_merges_the_new_pdf() {
    let server = MockServer::start().await;
    let mut board = generated_board(&server).await;

    Mock::given(method("POST"))
        .and(path("/process_query"))
        .respond_with(ResponseTemplate::new(200).set_body_json(backend_parameters()))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/calculate_pdf"))
        .and(body_partial_json(json!({
            "slider_values": [1.2, 2.4, 2.0, 1.1, -2.0, -3.1, -1.0, 0.5, -100.0, -12.5, -4.0, 3.0, -0.4, 0.1, 0.6, 0.9]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"pdf_value": 3.2e-7, "pdf_ratio": 0.004})))
        .expect(1)
        .mount(&server)
        .await;

    let analysis = AnalysisClient::new(server.uri());
    board.select(&analysis, 0).await.unwrap();

    let stored = board
        .adjust(&analysis, 0, Indicator::OilPrice, Horizon::Months6, -250.0)
        .await
        .unwrap();
    assert_eq!(stored, -100.0);

    let params = board.parameters(0).unwrap();
    assert_eq!(params.weighted_mean_oil_price_6m, -100.0);
    assert_eq!(params.pdf_value, 3.2e-7);
    assert_eq!(params.pdf_ratio, 0.004);
    assert_eq!(board.likelihood(0), Some(Likelihood::VeryUnlikely));
    assert_eq!(
        board.trajectory(0, Indicator::OilPrice).unwrap(),
        vec![(0, 0.0), (6, -100.0), (12, -12.5), (18, -4.0), (24, 3.0)]
    );
}

#[tokio::test]
async fn dragging_a_series_recalculates_once_with_backend_label() {
    let server = MockServer::start().await;
    let mut board = generated_board(&server).await;

    Mock::given(method("POST"))
        .and(path("/process_query"))
        .respond_with(ResponseTemplate::new(200).set_body_json(backend_parameters()))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/calculate_pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            json!({"pdf_value": 0.8, "pdf_ratio": 0.9, "likelihood": "Likely"}),
        ))
        .expect(1)
        .mount(&server)
        .await;

    let analysis = AnalysisClient::new(server.uri());
    board.select(&analysis, 1).await.unwrap();

    let snapped = board
        .drag_series(&analysis, 1, Indicator::Cpi, [0.04, 1.26, 12.0, -0.56])
        .await
        .unwrap();
    assert_eq!(snapped, [0.0, 1.3, 10.0, -0.6]);
    assert_eq!(board.likelihood(1), Some(Likelihood::Likely));
    assert_eq!(board.parameters(1).unwrap().weighted_mean_cpi_18m, 10.0);
}

#[tokio::test]
async fn backend_errors_surface_and_leave_no_parameters() {
    let server = MockServer::start().await;
    let mut board = generated_board(&server).await;

    Mock::given(method("POST"))
        .and(path("/process_query"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let analysis = AnalysisClient::new(server.uri());
    let err = board.select(&analysis, 0).await.unwrap_err();
    assert!(format!("{:#}", err).contains("Network response was not ok"));
    assert!(board.parameters(0).is_none());
}

#[tokio::test]
async fn regenerating_clears_selection_and_parameters() {
    let server = MockServer::start().await;
    let mut board = generated_board(&server).await;

    Mock::given(method("POST"))
        .and(path("/process_query"))
        .respond_with(ResponseTemplate::new(200).set_body_json(backend_parameters()))
        .mount(&server)
        .await;
    let analysis = AnalysisClient::new(server.uri());
    board.select(&analysis, 0).await.unwrap();
    assert!(board.parameters(0).is_some());

    let chat = ChatClient::new(&server.uri());
    board.generate(&chat, "another run").await.unwrap();
    assert_eq!(board.selected(), None);
    assert!(board.parameters(0).is_none());
}

#[tokio::test]
async fn broken_regeneration_drops_stale_selection_and_parameters() {
    let server = MockServer::start().await;
    let mut board = generated_board(&server).await;

    Mock::given(method("POST"))
        .and(path("/process_query"))
        .respond_with(ResponseTemplate::new(200).set_body_json(backend_parameters()))
        .mount(&server)
        .await;
    let analysis = AnalysisClient::new(server.uri());
    board.select(&analysis, 0).await.unwrap();
    assert!(board.parameters(0).is_some());

    // One complete card arrives, then the server hangs up short of its Content-Length.
    let broken = common::serve_once(
        "HTTP/1.1 200 OK\r\nContent-Type: text/plain; charset=utf-8\r\nContent-Length: 500\r\n\r\n",
        vec![(
            Duration::ZERO,
            r#"{"scenarios":[{"event":"Flood","description":"The river breaks its banks."},"#.to_string(),
        )],
    )
    .await;
    let chat = ChatClient::new(&broken);
    let err = board.generate(&chat, "flood").await.unwrap_err();
    assert!(format!("{:#}", err).contains("scenario stream broke off"));

    let events: Vec<&str> = board.scenarios().iter().map(|s| s.event.as_str()).collect();
    assert_eq!(events, vec!["Flood"]);
    assert!(!board.is_generating());
    assert_eq!(board.selected(), None);
    assert!(board.parameters(0).is_none());
}

#[tokio::test]
async fn end_to_end_through_the_server() {
    let llm_server = MockServer::start().await;
    let sse = format!(
        "data: {}\n\ndata: {}\n\ndata: [DONE]\n\n",
        json!({"choices": [{"delta": {"content": &SCENARIOS_JSON[..50]}}]}),
        json!({"choices": [{"delta": {"content": &SCENARIOS_JSON[50..]}}]})
    );
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(sse, "text/event-stream"))
        .expect(1)
        .mount(&llm_server)
        .await;

    let llm = OpenAiClient::new(LlmConfig {
        api_base: llm_server.uri(),
        api_key: "test-key".to_string(),
        model: "gpt-4o".to_string(),
        timeout: Duration::from_secs(5),
    })
    .unwrap();
    let state = Arc::new(AppState::new(llm, true));
    let (addr, serving) = warp::serve(routes(state)).bind_ephemeral(([127, 0, 0, 1], 0));
    tokio::spawn(serving);

    let chat = ChatClient::new(&format!("http://{}", addr));
    let mut board = ScenarioBoard::new();

    assert_eq!(board.generate(&chat, "pandemic").await.unwrap(), 2);
    assert_eq!(board.scenarios()[0].event, "Pandemic");

    // Served from the cache this time, as a JSON object.
    assert_eq!(board.generate(&chat, "pandemic").await.unwrap(), 2);
    assert_eq!(board.scenarios()[1].description, "Tankers stop in Hormuz.");
}
