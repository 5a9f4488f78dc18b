//! Run one movie suggestion against TMDB and print the result as JSON.
//! Usage:
//!   cargo run --bin suggest_props -- [genre_ids] [year_start] [year_end] [min_rating] [max_runtime]
//!   cargo run --bin suggest_props -- 28,12 2010 2015 7 120
//! Pass "-" to leave a filter unset. Requires TMDB_API_KEY in the environment (.env supported).

use anyhow::{Context, Result};
use dotenvy::dotenv;
use movie_roulette::filters::{discover_params, parse_field, parse_rating, FilterEdit, FilterSelection};
use movie_roulette::suggest::suggest;
use movie_roulette::tmdb::TmdbClient;
use serde_json::json;
use std::env;

fn arg(args: &[String], idx: usize) -> &str {
    match args.get(idx).map(String::as_str) {
        Some("-") | None => "",
        Some(v) => v,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenv();
    let args: Vec<String> = env::args().skip(1).collect();

    let mut filters = FilterSelection::default();
    for id in arg(&args, 0).split(',').filter(|s| !s.trim().is_empty()) {
        let id: i64 = id
            .trim()
            .parse()
            .with_context(|| format!("genre id '{}' is not a number", id))?;
        filters.toggle_genre(id);
    }
    filters.apply(FilterEdit::YearStart(parse_field(arg(&args, 1))));
    filters.apply(FilterEdit::YearEnd(parse_field(arg(&args, 2))));
    filters.apply(FilterEdit::MinRating(parse_rating(arg(&args, 3))));
    filters.apply(FilterEdit::MaxRuntime(parse_field(arg(&args, 4))));

    let client = TmdbClient::from_env()?;
    let query = discover_params(&filters, 1)
        .into_iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    let output = match suggest(&client, &filters).await {
        Ok(s) => json!({
            "query_page_1": query,
            "degraded": s.degraded,
            "movie": s.movie,
            "poster": s.movie.poster(),
            "director": s.credits.director().map(|p| p.name.clone()),
            "top_cast": s.credits.top_cast().iter().map(|p| p.name.clone()).collect::<Vec<_>>(),
        }),
        Err(e) => json!({
            "query_page_1": query,
            "error": e.to_string(),
        }),
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
