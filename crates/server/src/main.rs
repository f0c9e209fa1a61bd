use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use reqwest::Client as HttpClient;
use shared::{
    error::{ApiError, ErrorCode},
    protocol::{
        AssistantChatRequest, AssistantChatResponse, ChatCompletionRequest,
        ChatCompletionResponse, PromptMessage,
    },
};
use tracing::{error, info, warn};

mod config;

use config::{load_settings, Settings};

#[derive(Clone)]
struct AppState {
    http: HttpClient,
    upstream_url: String,
    upstream_api_key: String,
    upstream_model: String,
    system_prompt: String,
    http_referer: String,
    app_title: String,
}

impl AppState {
    fn from_settings(settings: Settings) -> anyhow::Result<Self> {
        let upstream_api_key = settings
            .upstream_api_key
            .context("upstream API key is not configured; set OPENROUTER_API_KEY on the relay host")?;
        Ok(Self {
            http: HttpClient::new(),
            upstream_url: settings.upstream_url,
            upstream_api_key,
            upstream_model: settings.upstream_model,
            system_prompt: settings.system_prompt,
            http_referer: settings.http_referer,
            app_title: settings.app_title,
        })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let settings = load_settings();
    let addr: SocketAddr = settings.server_bind.parse()?;
    let state = AppState::from_settings(settings)?;
    let app = build_router(Arc::new(state));

    info!(%addr, "assistant relay listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/chat", post(chat))
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

/// Forwards one user message to the upstream chat completion endpoint with
/// the fixed system prompt, in a single attempt. Upstream failures come back
/// as 502 with an error code the client maps onto its fallback copy.
async fn chat(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AssistantChatRequest>,
) -> Result<Json<AssistantChatResponse>, (StatusCode, Json<ApiError>)> {
    let message = req.message.trim();
    if message.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ApiError::new(ErrorCode::Validation, "message cannot be empty")),
        ));
    }

    let payload = ChatCompletionRequest {
        model: state.upstream_model.clone(),
        messages: vec![
            PromptMessage::system(&state.system_prompt),
            PromptMessage::user(message),
        ],
    };

    let response = state
        .http
        .post(format!("{}/chat/completions", state.upstream_url))
        .bearer_auth(&state.upstream_api_key)
        .header("HTTP-Referer", &state.http_referer)
        .header("X-Title", &state.app_title)
        .json(&payload)
        .send()
        .await
        .map_err(|err| {
            error!(%err, "upstream chat completion request failed");
            (
                StatusCode::BAD_GATEWAY,
                Json(ApiError::new(
                    ErrorCode::UpstreamUnavailable,
                    "chat completion endpoint unreachable",
                )),
            )
        })?;

    let status = response.status();
    if !status.is_success() {
        warn!(%status, "upstream chat completion returned an error status");
        return Err((
            StatusCode::BAD_GATEWAY,
            Json(ApiError::new(
                ErrorCode::UpstreamUnavailable,
                format!("upstream returned {status}"),
            )),
        ));
    }

    let completion: ChatCompletionResponse = response.json().await.map_err(|err| {
        warn!(%err, "upstream chat completion body did not parse");
        (
            StatusCode::BAD_GATEWAY,
            Json(ApiError::new(
                ErrorCode::UpstreamMalformed,
                "upstream response body was not valid JSON",
            )),
        )
    })?;

    let Some(reply) = completion.reply_text() else {
        warn!("upstream chat completion lacked choices[0].message.content");
        return Err((
            StatusCode::BAD_GATEWAY,
            Json(ApiError::new(
                ErrorCode::UpstreamMalformed,
                "upstream response missing reply content",
            )),
        ));
    };

    Ok(Json(AssistantChatResponse {
        reply: reply.to_string(),
    }))
}
