use crate::filters::{discover_params, FilterSelection};
use crate::tmdb::{Credits, Movie, TmdbApi};
use rand::seq::IndexedRandom;
use rand::Rng;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

// TMDB pages hold 20 results.
pub const MAX_PAGE: u32 = 10;

/// The `Display` text is what the page shows.
#[derive(Debug, Error)]
pub enum SuggestError {
    #[error("Failed to fetch data from TMDb.")]
    Network { detail: String },

    #[error("No movie found with selected filters.")]
    NoResults,

    #[error("Invalid movie data.")]
    InvalidData,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Suggestion {
    pub movie: Movie,
    pub credits: Credits,
    pub degraded: bool,
}

pub async fn suggest(api: &dyn TmdbApi, filters: &FilterSelection) -> Result<Suggestion, SuggestError> {
    let page = random_page();
    let candidates = discover(api, filters, page).await?;
    let candidate = pick_candidate(&candidates)?.clone();
    let id = candidate_id(&candidate)?;
    info!("Picked movie {} from page {} ({} candidates)", id, page, candidates.len());

    let (movie, details_ok) = details_or_candidate(api, id, candidate).await;
    let (credits, credits_ok) = credits_or_empty(api, id).await;

    Ok(Suggestion {
        movie,
        credits,
        degraded: !(details_ok && credits_ok),
    })
}

fn random_page() -> u32 {
    rand::rng().random_range(1..=MAX_PAGE)
}

async fn discover(
    api: &dyn TmdbApi,
    filters: &FilterSelection,
    page: u32,
) -> Result<Vec<Movie>, SuggestError> {
    let params = discover_params(filters, page);
    debug!(?params, "Discovery query");
    let results = api.discover(&params).await.map_err(|e| {
        warn!("Discovery request failed: {:#}", e);
        SuggestError::Network {
            detail: format!("{e:#}"),
        }
    })?;
    if results.is_empty() {
        return Err(SuggestError::NoResults);
    }
    Ok(results)
}

fn pick_candidate(candidates: &[Movie]) -> Result<&Movie, SuggestError> {
    candidates
        .choose(&mut rand::rng())
        .ok_or(SuggestError::NoResults)
}

fn candidate_id(candidate: &Movie) -> Result<i64, SuggestError> {
    match candidate.id {
        Some(id) if id != 0 => Ok(id),
        _ => Err(SuggestError::InvalidData),
    }
}

async fn details_or_candidate(api: &dyn TmdbApi, id: i64, candidate: Movie) -> (Movie, bool) {
    match api.movie(id).await {
        Ok(details) => (details, true),
        Err(e) => {
            warn!("Details for movie {} unavailable, using discovery data: {:#}", id, e);
            (candidate, false)
        }
    }
}

async fn credits_or_empty(api: &dyn TmdbApi, id: i64) -> (Credits, bool) {
    match api.credits(id).await {
        Ok(credits) => (credits, true),
        Err(e) => {
            warn!("Credits for movie {} unavailable: {:#}", id, e);
            (Credits::default(), false)
        }
    }
}
