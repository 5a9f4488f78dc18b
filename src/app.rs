use crate::filters::{parse_field, parse_rating, FilterEdit};
use crate::session::{Session, ViewState};
use crate::tmdb::{TmdbApi, TmdbClient};
use crate::view;
use anyhow::{Context, Result};
use axum::{
    extract::{Path, State},
    response::{Html, Redirect},
    routing::{get, post},
    Form, Json, Router,
};
use serde::Deserialize;
use std::{env, net::SocketAddr, sync::Arc};
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing::{debug, info};

const MAX_BODY_BYTES: usize = 16 * 1024;
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3146";

#[derive(Clone)]
pub struct AppState {
    pub session: Session,
}

// Only the fields present in the form are applied.
#[derive(Debug, Default, Deserialize)]
pub struct FilterForm {
    pub year_start: Option<String>,
    pub year_end: Option<String>,
    pub min_rating: Option<String>,
    pub max_runtime: Option<String>,
}

impl FilterForm {
    pub fn edits(&self) -> Vec<FilterEdit> {
        let mut edits = Vec::new();
        if let Some(raw) = &self.year_start {
            edits.push(FilterEdit::YearStart(parse_field(raw)));
        }
        if let Some(raw) = &self.year_end {
            edits.push(FilterEdit::YearEnd(parse_field(raw)));
        }
        if let Some(raw) = &self.min_rating {
            edits.push(FilterEdit::MinRating(parse_rating(raw)));
        }
        if let Some(raw) = &self.max_runtime {
            edits.push(FilterEdit::MaxRuntime(parse_field(raw)));
        }
        edits
    }
}

fn bind_addr() -> Result<SocketAddr> {
    let raw = env::var("BIND_ADDR")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
    raw.trim()
        .parse()
        .with_context(|| format!("BIND_ADDR '{}' is not a socket address", raw))
}

pub async fn run_server() -> Result<()> {
    let tmdb: Arc<dyn TmdbApi> = Arc::new(TmdbClient::from_env()?);
    let session = Session::open(tmdb);

    let loader = session.clone();
    tokio::spawn(async move { loader.load_genres().await });

    let app = build_router(AppState {
        session: session.clone(),
    });

    let addr = bind_addr()?;
    info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr} failed"))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    session.close().await;
    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/state", get(api_state))
        .route("/suggest", post(suggest))
        .route("/genres/:id/toggle", post(toggle_genre))
        .route("/filters", post(edit_filters))
        .route("/reset", post(reset))
        .route("/health", get(health))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}

async fn index(State(state): State<AppState>) -> Html<String> {
    Html(view::render(&state.session.snapshot().await))
}

async fn api_state(State(state): State<AppState>) -> Json<ViewState> {
    Json(state.session.snapshot().await)
}

async fn suggest(State(state): State<AppState>) -> Redirect {
    let session = state.session.clone();
    tokio::spawn(async move {
        session.suggest_movie().await;
    });
    Redirect::to("/")
}

async fn toggle_genre(State(state): State<AppState>, Path(id): Path<i64>) -> Redirect {
    debug!("Toggling genre {}", id);
    state.session.toggle_genre(id).await;
    Redirect::to("/")
}

async fn edit_filters(State(state): State<AppState>, Form(form): Form<FilterForm>) -> Redirect {
    for edit in form.edits() {
        debug!(?edit, "Applying filter edit");
        state.session.edit_filter(edit).await;
    }
    Redirect::to("/")
}

async fn reset(State(state): State<AppState>) -> Redirect {
    state.session.reset().await;
    Redirect::to("/")
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        let mut term = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        term.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Shutdown signal received (Ctrl+C)");
        }
        _ = terminate => {
            info!("Shutdown signal received (SIGTERM)");
        }
    }
}
