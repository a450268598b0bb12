use anyhow::{Context, Result};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse},
    routing::{get, post},
    serve, Json, Router,
};
use minijinja::Environment;
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, sync::Arc};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::catalog::{Catalog, Phone};
use crate::constants::QUICK_REPLIES;
use crate::envelope::{interpret, Envelope, Interpretation};
use crate::llm_interaction::GeminiClient;
use crate::prompt::{build_chat_request, HistoryTurn};
use crate::render::render_message;

// Page and assets are compiled in so the binary runs from any working directory.
const INDEX_TEMPLATE: &str = include_str!("../templates/index.html");
const APP_JS: &str = include_str!("../static/app.js");
const STYLE_CSS: &str = include_str!("../static/style.css");

// Shared application state. Everything in it is read-only after startup.
#[derive(Clone)]
pub struct AppState {
    templates: Arc<Environment<'static>>,
    catalog: Arc<Catalog>,
    llm: Arc<GeminiClient>,
}

impl AppState {
    pub fn new(catalog: Arc<Catalog>, llm: GeminiClient) -> Result<Self> {
        let templates = create_minijinja_env().context("Failed to initialize template engine")?;
        Ok(Self {
            templates: Arc::new(templates),
            catalog,
            llm: Arc::new(llm),
        })
    }
}

// Minijinja Environment setup
fn create_minijinja_env() -> Result<Environment<'static>> {
    let mut env = Environment::new();
    env.add_template("index.html", INDEX_TEMPLATE)?;
    Ok(env)
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub history: Option<Vec<HistoryTurn>>,
}

/// Either raw markdown or a chat envelope to be flattened first.
#[derive(Debug, Deserialize)]
pub struct RenderRequest {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub envelope: Option<Envelope>,
}

#[derive(Debug, Serialize)]
pub struct RenderResponse {
    pub markdown: String,
    pub html: String,
}

async fn index_handler(State(state): State<AppState>) -> Result<Html<String>, (StatusCode, Html<String>)> {
    state
        .templates
        .get_template("index.html")
        .and_then(|tmpl| {
            let context = minijinja::context! {
                title => "Mobile Guru AI",
                quick_replies => QUICK_REPLIES,
                phone_count => state.catalog.len(),
            };
            tmpl.render(context)
        })
        .map(Html)
        .map_err(|e| {
            error!("Failed to get or render template: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html("Internal Server Error".to_string()),
            )
        })
}

/// `POST /api/chat`: one Gemini round trip per request, no server-side session.
pub async fn chat_handler(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> (StatusCode, Json<Envelope>) {
    let Json(request) = match payload {
        Ok(p) => p,
        Err(rejection) => {
            error!(error = %rejection, "Unreadable chat request");
            return (StatusCode::INTERNAL_SERVER_ERROR, Json(Envelope::unavailable()));
        }
    };
    let history = request.history.unwrap_or_default();
    info!(history = history.len(), "Chat request received");

    let generate = build_chat_request(&state.catalog, &history, &request.message);
    let response = match state.llm.generate(&generate).await {
        Ok(r) => r,
        Err(e) => {
            error!(error = %e, "Gemini call failed");
            return (StatusCode::INTERNAL_SERVER_ERROR, Json(Envelope::unavailable()));
        }
    };

    let Some(raw) = response.first_text() else {
        error!("Gemini returned no candidate text");
        return (StatusCode::INTERNAL_SERVER_ERROR, Json(Envelope::unavailable()));
    };

    match interpret(raw) {
        Interpretation::Parsed(envelope) => (StatusCode::OK, Json(envelope)),
        Interpretation::Fallback { envelope, reason } => {
            warn!(%reason, "Replying with parse fallback");
            (StatusCode::OK, Json(envelope))
        }
    }
}

async fn render_handler(Json(request): Json<RenderRequest>) -> Json<RenderResponse> {
    let markdown = match (request.envelope, request.content) {
        (Some(envelope), _) => envelope.to_markdown(),
        (None, Some(content)) => content,
        (None, None) => String::new(),
    };
    let html = render_message(&markdown);
    Json(RenderResponse { markdown, html })
}

async fn app_js_handler() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/javascript; charset=utf-8")], APP_JS)
}

async fn style_css_handler() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/css; charset=utf-8")], STYLE_CSS)
}

async fn catalog_handler(State(state): State<AppState>) -> Json<Vec<Phone>> {
    Json(state.catalog.phones().to_vec())
}

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/api/chat", post(chat_handler))
        .route("/api/render", post(render_handler))
        .route("/api/catalog", get(catalog_handler))
        .route("/static/app.js", get(app_js_handler))
        .route("/static/style.css", get(style_css_handler))
        .fallback(|| async { (StatusCode::NOT_FOUND, "Not Found") })
        .with_state(state)
        .layer(TraceLayer::new_for_http()) // Add request logging
}

pub async fn start_web_server(port: u16, state: AppState) -> Result<()> {
    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Web server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context(format!("Failed to bind to address {}", addr))?;

    serve(listener, app.into_make_service())
        .await
        .context("Web server failed")?;

    Ok(())
}
