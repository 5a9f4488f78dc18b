use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::env;

const TMDB_BASE: &str = "https://api.themoviedb.org/3";
const POSTER_BASE: &str = "https://image.tmdb.org/t/p/w500";
const LANGUAGE: &str = "en-US";

#[derive(Debug, Clone)]
pub struct TmdbClient {
    client: Client,
    base_url: String,
    api_key: String,
}

#[async_trait]
pub trait TmdbApi: Send + Sync {
    async fn genres(&self) -> Result<Vec<Genre>>;
    async fn discover(&self, params: &[(&'static str, String)]) -> Result<Vec<Movie>>;
    async fn movie(&self, id: i64) -> Result<Movie>;
    async fn credits(&self, id: i64) -> Result<Credits>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Genre {
    pub id: i64,
    pub name: String,
}

// Discovery summaries and `/movie/{id}` share this shape; summaries leave `genres` unset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub id: Option<i64>,
    pub title: Option<String>,
    pub release_date: Option<String>,
    pub overview: Option<String>,
    pub poster_path: Option<String>,
    pub vote_average: Option<f64>,
    pub vote_count: Option<u64>,
    pub genres: Option<Vec<Genre>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    #[serde(default)]
    pub name: String,
    pub character: Option<String>,
    pub job: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Credits {
    #[serde(default)]
    pub cast: Vec<Person>,
    #[serde(default)]
    pub crew: Vec<Person>,
}

impl Movie {
    pub fn year(&self) -> Option<&str> {
        self.release_date
            .as_deref()
            .and_then(|d| d.get(..4))
            .filter(|y| !y.is_empty())
    }

    pub fn poster(&self) -> Option<String> {
        self.poster_path
            .as_deref()
            .filter(|p| !p.is_empty())
            .map(poster_url)
    }
}

impl Credits {
    pub fn director(&self) -> Option<&Person> {
        self.crew
            .iter()
            .find(|p| p.job.as_deref() == Some("Director"))
    }

    pub fn top_cast(&self) -> &[Person] {
        &self.cast[..self.cast.len().min(5)]
    }
}

pub fn poster_url(path: &str) -> String {
    format!("{POSTER_BASE}{path}")
}

impl TmdbClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    pub fn from_env() -> Result<Self> {
        let api_key = env::var("TMDB_API_KEY").context("TMDB_API_KEY not set")?;
        let base_url = env::var("TMDB_BASE_URL")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| TMDB_BASE.to_string());
        Ok(Self::new(base_url, api_key))
    }

    fn url(&self, path: &str, params: &[(&'static str, String)]) -> String {
        let mut url = format!(
            "{}{path}?api_key={}&language={LANGUAGE}",
            self.base_url,
            urlencoding::encode(&self.api_key)
        );
        for (key, value) in params {
            url.push('&');
            url.push_str(key);
            url.push('=');
            url.push_str(&urlencoding::encode(value));
        }
        url
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, path: &str, url: &str) -> Result<T> {
        let res = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("request to {path} failed"))?;
        let status = res.status();
        let text = res.text().await.context("reading body failed")?;
        if !status.is_success() {
            return Err(anyhow!("{} -> {} {}", path, status, text));
        }
        let parsed: T = serde_json::from_str(&text).context("JSON parse failed")?;
        Ok(parsed)
    }
}

#[async_trait]
impl TmdbApi for TmdbClient {
    async fn genres(&self) -> Result<Vec<Genre>> {
        #[derive(Deserialize)]
        struct GenreResponse {
            #[serde(default)]
            genres: Vec<Genre>,
        }

        let path = "/genre/movie/list";
        let data: GenreResponse = self.get_json(path, &self.url(path, &[])).await?;
        Ok(data.genres)
    }

    async fn discover(&self, params: &[(&'static str, String)]) -> Result<Vec<Movie>> {
        let path = "/discover/movie";
        let data: Value = self.get_json(path, &self.url(path, params)).await?;
        Ok(discover_results(data))
    }

    async fn movie(&self, id: i64) -> Result<Movie> {
        let path = format!("/movie/{id}");
        self.get_json(&path, &self.url(&path, &[])).await
    }

    async fn credits(&self, id: i64) -> Result<Credits> {
        let path = format!("/movie/{id}/credits");
        self.get_json(&path, &self.url(&path, &[])).await
    }
}

/// A missing or non-array `results` counts as no results. Every entry is kept,
/// so a malformed one surfaces as an id-less candidate.
fn discover_results(body: serde_json::Value) -> Vec<Movie> {
    match body.get("results") {
        Some(Value::Array(items)) => items.iter().map(lenient_movie).collect(),
        _ => Vec::new(),
    }
}

fn lenient_movie(item: &Value) -> Movie {
    if let Ok(movie) = serde_json::from_value::<Movie>(item.clone()) {
        return movie;
    }
    let text = |key: &str| item.get(key).and_then(Value::as_str).map(str::to_string);
    Movie {
        id: item.get("id").and_then(Value::as_i64),
        title: text("title"),
        release_date: text("release_date"),
        overview: text("overview"),
        poster_path: text("poster_path"),
        vote_average: item.get("vote_average").and_then(Value::as_f64),
        vote_count: item.get("vote_count").and_then(Value::as_u64),
        genres: item
            .get("genres")
            .and_then(|g| serde_json::from_value(g.clone()).ok()),
    }
}
