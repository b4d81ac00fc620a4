mod config;
mod error;
mod models;
mod routes;
mod services;
mod utils;

use axum::{
    Router,
    response::{Html, Json},
    routing::get,
};
use http::HeaderValue;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use config::Settings;
use routes::AppState;
use services::{
    images::FalImageClient, llm::LLMClient, orchestrator::StoryOrchestrator, storage::StoryStorage,
    store::StoryStore,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("dreamteller=info,tower_http=info")),
        )
        .init();

    let settings = Settings::from_env()?;
    if settings.fal_key.is_none() {
        warn!("FAL_KEY is not set; image requests will be sent without credentials");
    }

    let text = Arc::new(LLMClient::new(&settings)?);
    let images = Arc::new(FalImageClient::new(&settings)?);
    let embed_client = if settings.embed_images {
        Some(StoryStorage::image_client(Duration::from_secs(
            settings.image_fetch_timeout_secs,
        ))?)
    } else {
        None
    };

    let state = AppState {
        orchestrator: Arc::new(StoryOrchestrator::new(text, images)),
        store: Arc::new(StoryStore::new()),
        storage: Arc::new(StoryStorage::new(settings.stories_dir.clone(), embed_client).await?),
    };
    let stories_dir = state.storage.stories_dir().to_path_buf();

    let app = Router::new()
        .route("/", get(index))
        .route("/health", get(health_check))
        .merge(routes::api_router(state))
        .nest_service("/stories", ServeDir::new(stories_dir))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&settings));

    let listener = TcpListener::bind(settings.bind_addr()).await?;
    info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}

fn cors_layer(settings: &Settings) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if settings.allows_any_origin() {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = settings
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(origins))
}

async fn index() -> Html<&'static str> {
    Html(
        r#"
    <!DOCTYPE html>
    <html>
    <head>
        <title>DreamTeller API</title>
        <meta charset="utf-8">
        <style>
            body { font-family: Arial, sans-serif; margin: 40px; }
            .info-box { background-color: #f0f8ff; padding: 20px; border-radius: 8px; margin: 20px 0; }
            .endpoint { background-color: #f5f5f5; padding: 10px; margin: 10px 0; border-radius: 4px; font-family: monospace; }
        </style>
    </head>
    <body>
        <h1>DreamTeller API</h1>

        <div class="info-box">
            <h2>Service Information</h2>
            <p>Turns a short story idea into an illustrated, multi-scene story.</p>
            <p>Stories can be regenerated scene by scene and saved as <code>.story</code> archives.</p>
        </div>

        <h2>Available Endpoints:</h2>
        <div class="endpoint">GET /health - Health check</div>
        <div class="endpoint">POST /api/stories/generate - Generate a story from a prompt</div>
        <div class="endpoint">POST /api/stories/regenerate-text - Rewrite one scene</div>
        <div class="endpoint">POST /api/stories/regenerate-image - Redraw one scene</div>
        <div class="endpoint">GET /api/stories - Stories generated in this session</div>
        <div class="endpoint">GET /api/stories/current - The story currently open</div>
        <div class="endpoint">GET | DELETE /api/stories/{id} - Fetch or drop a story</div>
        <div class="endpoint">POST /api/stories/{id}/save - Save a story to disk</div>
        <div class="endpoint">GET /api/saved - Saved stories</div>
        <div class="endpoint">GET | DELETE /api/saved/{filename} - Open or delete a saved story</div>
        <div class="endpoint">GET /api/saved/{filename}/download - Download a .story file</div>
        <div class="endpoint">POST /api/saved/upload - Open an uploaded .story file</div>
        <div class="endpoint">POST /api/images/generate - Generate a single illustration</div>

        <h2>How to Use:</h2>
        <p>POST a JSON body like <code>{"idea": "a fox finds a key", "genre": "Fantasy", "tone": "Lighthearted", "numScenes": 3}</code> to /api/stories/generate.</p>
    </body>
    </html>
    "#,
    )
}

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "DreamTeller API"
    }))
}
