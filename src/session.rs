use crate::filters::{FilterEdit, FilterSelection};
use crate::suggest::{self, Suggestion};
use crate::tmdb::{Credits, Genre, Movie, TmdbApi};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RequestOutcome {
    #[default]
    Idle,
    Loading,
    Success {
        movie: Movie,
        credits: Credits,
    },
    Failure {
        message: String,
    },
}

impl RequestOutcome {
    pub fn is_loading(&self) -> bool {
        matches!(self, RequestOutcome::Loading)
    }

    pub fn movie(&self) -> Option<&Movie> {
        match self {
            RequestOutcome::Success { movie, .. } => Some(movie),
            _ => None,
        }
    }

    pub fn credits(&self) -> Option<&Credits> {
        match self {
            RequestOutcome::Success { credits, .. } => Some(credits),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            RequestOutcome::Failure { message } => Some(message),
            _ => None,
        }
    }
}

impl From<Result<Suggestion, suggest::SuggestError>> for RequestOutcome {
    fn from(result: Result<Suggestion, suggest::SuggestError>) -> Self {
        match result {
            Ok(s) => RequestOutcome::Success {
                movie: s.movie,
                credits: s.credits,
            },
            Err(e) => RequestOutcome::Failure {
                message: e.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ViewState {
    pub genres: Vec<Genre>,
    pub filters: FilterSelection,
    pub outcome: RequestOutcome,
}

#[derive(Clone)]
pub struct Session {
    api: Arc<dyn TmdbApi>,
    inner: Arc<Inner>,
}

struct Inner {
    open: AtomicBool,
    state: Mutex<ViewState>,
}

impl Session {
    pub fn open(api: Arc<dyn TmdbApi>) -> Self {
        Self {
            api,
            inner: Arc::new(Inner {
                open: AtomicBool::new(true),
                state: Mutex::new(ViewState::default()),
            }),
        }
    }

    pub fn is_open(&self) -> bool {
        self.inner.open.load(Ordering::SeqCst)
    }

    pub async fn close(&self) {
        // Taking the lock orders close after any commit already in progress.
        let _state = self.inner.state.lock().await;
        if self.inner.open.swap(false, Ordering::SeqCst) {
            info!("Session closed");
        }
    }

    pub async fn snapshot(&self) -> ViewState {
        self.inner.state.lock().await.clone()
    }

    // Writes after close are discarded.
    async fn commit<F>(&self, f: F) -> bool
    where
        F: FnOnce(&mut ViewState),
    {
        let mut state = self.inner.state.lock().await;
        if !self.is_open() {
            debug!("Discarding state write after close");
            return false;
        }
        f(&mut state);
        true
    }

    pub async fn load_genres(&self) {
        match self.api.genres().await {
            Ok(genres) => {
                let count = genres.len();
                if self.commit(|s| s.genres = genres).await {
                    info!("Loaded {} genres", count);
                }
            }
            Err(e) => warn!("Failed to load genre catalog: {:#}", e),
        }
    }

    /// Concurrent calls are not serialized; whichever finishes last wins.
    pub async fn suggest_movie(&self) -> RequestOutcome {
        let mut filters = None;
        self.commit(|s| {
            s.outcome = RequestOutcome::Loading;
            filters = Some(s.filters.clone());
        })
        .await;
        let filters = match filters {
            Some(f) => f,
            None => self.snapshot().await.filters,
        };

        let outcome = RequestOutcome::from(suggest::suggest(self.api.as_ref(), &filters).await);
        match &outcome {
            RequestOutcome::Success { movie, .. } => {
                info!("Suggested '{}'", movie.title.as_deref().unwrap_or("untitled"))
            }
            RequestOutcome::Failure { message } => warn!("Suggestion failed: {}", message),
            _ => {}
        }

        let committed = outcome.clone();
        self.commit(move |s| s.outcome = committed).await;
        outcome
    }

    pub async fn toggle_genre(&self, genre_id: i64) {
        self.commit(|s| s.filters.toggle_genre(genre_id)).await;
    }

    pub async fn edit_filter(&self, edit: FilterEdit) {
        self.commit(|s| s.filters.apply(edit)).await;
    }

    // An in-flight request keeps its loading indicator.
    pub async fn reset(&self) {
        self.commit(|s| {
            s.filters.reset();
            if !s.outcome.is_loading() {
                s.outcome = RequestOutcome::Idle;
            }
        })
        .await;
    }
}
