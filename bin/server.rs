// Catdle - Web Server
// JSON API over the game core plus static files from public/

use anyhow::{Context, Result};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use catdle::{
    format_countdown, Cat, Game, GameConfig, GameMode, GamePhase, GuessFeedback, GuessReport,
};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Shared application state: one game per mode, single player.
/// Every handler goes through `game`, which rolls the day over first.
#[derive(Clone)]
struct AppState {
    daily: Arc<Mutex<Game>>,
    infinite: Arc<Mutex<Game>>,
}

impl AppState {
    fn game(&self, mode: GameMode) -> MutexGuard<'_, Game> {
        let game = match mode {
            GameMode::Daily => &self.daily,
            GameMode::Infinite => &self.infinite,
        };
        // A panicked handler leaves the game itself consistent
        let mut guard = game.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if guard.refresh() {
            tracing::info!("Rolled over to game day {}", guard.day_key());
        }
        guard
    }
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            error: None,
        }
    }

    fn err(data: T, error: impl Into<String>) -> Self {
        Self {
            success: false,
            data,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ModeQuery {
    #[serde(default)]
    mode: Option<GameMode>,
}

impl ModeQuery {
    fn mode(&self) -> GameMode {
        self.mode.unwrap_or(GameMode::Daily)
    }
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    q: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GuessRequest {
    name: String,
    #[serde(default)]
    mode: Option<GameMode>,
}

/// Session state as the page renders it
#[derive(Serialize)]
struct StateResponse {
    mode: GameMode,
    day_key: String,
    phase: GamePhase,
    attempts: u32,
    max_guesses: u32,
    hint_available: bool,
    selected_names: Vec<String>,
    history: Vec<GuessFeedback>,

    /// Only once the round is over
    #[serde(skip_serializing_if = "Option::is_none")]
    answer: Option<Cat>,
}

impl From<&Game> for StateResponse {
    fn from(game: &Game) -> Self {
        Self {
            mode: game.mode(),
            day_key: game.day_key().to_string(),
            phase: game.phase(),
            attempts: game.attempts(),
            max_guesses: game.config().max_guesses,
            hint_available: game.hint_available(),
            selected_names: game.selected_names().to_vec(),
            history: game.history().to_vec(),
            answer: if game.is_over() {
                Some(game.current_secret().clone())
            } else {
                None
            },
        }
    }
}

#[derive(Serialize)]
struct GuessResponse {
    report: GuessReport,
    state: StateResponse,
}

#[derive(Serialize)]
struct CountdownResponse {
    day_key: String,
    remaining_seconds: i64,
    display: String,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/cats?q= - Whole catalog, or name matches excluding guessed cats
async fn get_cats(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> impl IntoResponse {
    let game = state.game(GameMode::Daily);

    let cats: Vec<Cat> = match query.q.as_deref().map(str::trim) {
        Some(q) if !q.is_empty() => game.search(q).into_iter().cloned().collect(),
        _ => game.all_entities().to_vec(),
    };

    Json(ApiResponse::ok(cats))
}

/// GET /api/cats/:name - One cat by exact (URL-encoded) name
async fn get_cat(State(state): State<AppState>, Path(name): Path<String>) -> impl IntoResponse {
    let decoded_name = urlencoding::decode(&name)
        .unwrap_or_else(|_| name.clone().into())
        .into_owned();

    let game = state.game(GameMode::Daily);
    match game.catalog().find_by_name(&decoded_name) {
        Some(cat) => (StatusCode::OK, Json(ApiResponse::ok(Some(cat.clone())))).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::<Option<Cat>>::err(None, format!("No cat named {}", decoded_name))),
        )
            .into_response(),
    }
}

/// GET /api/state?mode= - Current session
async fn get_state(
    State(state): State<AppState>,
    Query(query): Query<ModeQuery>,
) -> impl IntoResponse {
    let game = state.game(query.mode());
    Json(ApiResponse::ok(StateResponse::from(&*game)))
}

/// POST /api/guess - Submit a guess by name
async fn post_guess(
    State(state): State<AppState>,
    Json(request): Json<GuessRequest>,
) -> impl IntoResponse {
    let mut game = state.game(request.mode.unwrap_or(GameMode::Daily));

    match game.guess_by_name(&request.name) {
        Some(report) => {
            let response = GuessResponse {
                report,
                state: StateResponse::from(&*game),
            };
            (StatusCode::OK, Json(ApiResponse::ok(Some(response)))).into_response()
        }
        None => {
            tracing::debug!("Guess for unknown cat: {}", request.name);
            (
                StatusCode::NOT_FOUND,
                Json(ApiResponse::<Option<GuessResponse>>::err(
                    None,
                    format!("No cat named {}", request.name),
                )),
            )
                .into_response()
        }
    }
}

/// GET /api/hint?mode= - Hint payload once unlocked
async fn get_hint(
    State(state): State<AppState>,
    Query(query): Query<ModeQuery>,
) -> impl IntoResponse {
    let game = state.game(query.mode());
    match game.hint() {
        Some(hint) => (StatusCode::OK, Json(ApiResponse::ok(Some(hint)))).into_response(),
        None => (
            StatusCode::FORBIDDEN,
            Json(ApiResponse::<Option<String>>::err(
                None,
                format!("Hint unlocks after {} guesses", game.config().hint_threshold),
            )),
        )
            .into_response(),
    }
}

/// POST /api/reset?mode= - Clear progress
async fn post_reset(
    State(state): State<AppState>,
    Query(query): Query<ModeQuery>,
) -> impl IntoResponse {
    let mut game = state.game(query.mode());
    game.reset();
    Json(ApiResponse::ok(StateResponse::from(&*game)))
}

/// GET /api/countdown - Time until the next daily cat
async fn get_countdown(State(state): State<AppState>) -> impl IntoResponse {
    let game = state.game(GameMode::Daily);
    let remaining = game.time_until_reset();

    Json(ApiResponse::ok(CountdownResponse {
        day_key: game.day_clock().current_day_key().to_string(),
        remaining_seconds: remaining.num_seconds(),
        display: format_countdown(remaining),
    }))
}

/// GET /api/yesterday - Previous day's answer
async fn get_yesterday(State(state): State<AppState>) -> impl IntoResponse {
    let game = state.game(GameMode::Daily);
    Json(ApiResponse::ok(game.yesterdays_answer()))
}

/// POST /api/round - Start a new infinite round
async fn post_round(State(state): State<AppState>) -> impl IntoResponse {
    let mut game = state.game(GameMode::Infinite);
    game.new_round();
    Json(ApiResponse::ok(StateResponse::from(&*game)))
}

// ============================================================================
// Main Server
// ============================================================================

fn init_logging() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "catdle=info,catdle_server=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let config_path = std::env::var("CATDLE_CONFIG").unwrap_or_else(|_| "catdle.toml".into());
    let config = GameConfig::load_or_default(std::path::Path::new(&config_path));

    let daily = Game::open(config.clone(), GameMode::Daily).context("opening daily game")?;
    let infinite = Game::open(config, GameMode::Infinite).context("opening infinite game")?;
    tracing::info!(
        "Loaded {} cats, game day {}",
        daily.all_entities().len(),
        daily.day_key()
    );

    // Create shared state
    let state = AppState {
        daily: Arc::new(Mutex::new(daily)),
        infinite: Arc::new(Mutex::new(infinite)),
    };

    // Build API routes
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/cats", get(get_cats))
        .route("/cats/:name", get(get_cat))
        .route("/state", get(get_state))
        .route("/guess", post(post_guess))
        .route("/hint", get(get_hint))
        .route("/reset", post(post_reset))
        .route("/countdown", get(get_countdown))
        .route("/yesterday", get(get_yesterday))
        .route("/round", post(post_round))
        .with_state(state);

    // Build main router
    let app = Router::new()
        .nest("/api", api_routes)
        .fallback_service(ServeDir::new("public"))
        .layer(ServiceBuilder::new().layer(CorsLayer::permissive()));

    // Start server
    let addr = std::env::var("CATDLE_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {}", addr))?;

    tracing::info!("🚀 Server running on http://{}", addr);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
