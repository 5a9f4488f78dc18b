use crate::session::ViewState;
use crate::tmdb::{Credits, Movie};
use std::fmt::Write;

const NO_VALUE: &str = "—";

pub fn render(state: &ViewState) -> String {
    let loading = state.outcome.is_loading();
    let mut page = String::with_capacity(4096);

    page.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    if loading {
        page.push_str("<meta http-equiv=\"refresh\" content=\"1\">\n");
    }
    page.push_str("<title>Suggest A Movie</title>\n</head>\n<body>\n<main>\n<section>\n");
    page.push_str("<h1>Suggest A Movie</h1>\n");
    page.push_str("<p>Filter by multiple genres, year range, rating, or runtime.</p>\n");

    render_filters(&mut page, state);
    render_actions(&mut page, loading);

    if let Some(message) = state.outcome.error() {
        let _ = writeln!(page, "<div class=\"error\">Error: {}</div>", escape_html(message));
    }

    match (state.outcome.movie(), state.outcome.credits()) {
        (Some(movie), Some(credits)) => render_movie(&mut page, movie, credits),
        _ => page.push_str(
            "<div class=\"empty\">No movie selected yet. Choose filters and click the button!</div>\n",
        ),
    }
    page.push_str("</section>\n");

    render_aside(&mut page, state.outcome.movie());
    page.push_str("</main>\n</body>\n</html>\n");
    page
}

fn render_filters(page: &mut String, state: &ViewState) {
    page.push_str("<div class=\"genres\">\n");
    for genre in &state.genres {
        let class = if state.filters.is_genre_selected(genre.id) {
            "genre selected"
        } else {
            "genre"
        };
        let _ = writeln!(
            page,
            "<form method=\"post\" action=\"/genres/{}/toggle\"><button class=\"{}\">{}</button></form>",
            genre.id,
            class,
            escape_html(&genre.name)
        );
    }
    page.push_str("</div>\n");

    let f = &state.filters;
    page.push_str("<form method=\"post\" action=\"/filters\" class=\"numbers\">\n");
    number_input(page, "year_start", "Start Year", f.year_start.map(|v| v.to_string()));
    number_input(page, "year_end", "End Year", f.year_end.map(|v| v.to_string()));
    number_input(page, "min_rating", "Min Rating (0-10)", f.min_rating.map(|v| v.to_string()));
    number_input(
        page,
        "max_runtime",
        "Max Runtime (min)",
        f.max_runtime_minutes.map(|v| v.to_string()),
    );
    page.push_str("<button>Apply</button>\n</form>\n");
}

fn number_input(page: &mut String, name: &str, placeholder: &str, value: Option<String>) {
    let _ = writeln!(
        page,
        "<input type=\"number\" step=\"any\" name=\"{}\" placeholder=\"{}\" value=\"{}\">",
        name,
        placeholder,
        escape_html(value.as_deref().unwrap_or_default())
    );
}

fn render_actions(page: &mut String, loading: bool) {
    page.push_str("<div class=\"actions\">\n");
    if loading {
        page.push_str(
            "<form method=\"post\" action=\"/suggest\"><button disabled>Loading...</button></form>\n",
        );
    } else {
        page.push_str(
            "<form method=\"post\" action=\"/suggest\"><button>🎬 Suggest A Movie</button></form>\n",
        );
    }
    page.push_str("<form method=\"post\" action=\"/reset\"><button>Clear</button></form>\n");
    page.push_str("</div>\n");
}

fn render_movie(page: &mut String, movie: &Movie, credits: &Credits) {
    page.push_str("<article class=\"movie\">\n");
    let title = escape_html(movie.title.as_deref().unwrap_or_default());
    match movie.year() {
        Some(year) => {
            let _ = writeln!(page, "<h2>{} ({})</h2>", title, escape_html(year));
        }
        None => {
            let _ = writeln!(page, "<h2>{}</h2>", title);
        }
    }

    let _ = writeln!(page, "<div>Genres: {}</div>", escape_html(&genre_line(movie)));
    if let Some(director) = credits.director() {
        let _ = writeln!(page, "<div>Director: {}</div>", escape_html(&director.name));
    }
    let cast = credits.top_cast();
    if !cast.is_empty() {
        let names = cast
            .iter()
            .map(|p| p.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        let _ = writeln!(page, "<div>Cast: {}</div>", escape_html(&names));
    }

    let overview = movie
        .overview
        .as_deref()
        .filter(|o| !o.is_empty())
        .unwrap_or("No description available.");
    let _ = writeln!(page, "<p>{}</p>", escape_html(overview));

    let rating = movie
        .vote_average
        .map(|v| v.to_string())
        .unwrap_or_else(|| NO_VALUE.to_string());
    let _ = writeln!(
        page,
        "<div>TMDb Rating: {} ({} votes)</div>",
        rating,
        movie.vote_count.unwrap_or(0)
    );
    page.push_str(
        "<form method=\"post\" action=\"/suggest\"><button>Show Another Movie</button></form>\n",
    );
    page.push_str("</article>\n");
}

fn render_aside(page: &mut String, movie: Option<&Movie>) {
    page.push_str("<aside>\n");
    match movie.and_then(|m| m.poster().map(|url| (m, url))) {
        Some((m, url)) => {
            let _ = writeln!(
                page,
                "<img src=\"{}\" alt=\"{}\">",
                escape_html(&url),
                escape_html(m.title.as_deref().unwrap_or_default())
            );
        }
        None => page.push_str("<div class=\"no-poster\">No Poster</div>\n"),
    }
    page.push_str(
        "<div class=\"attribution\">This product uses the TMDb API but is not endorsed or certified by TMDb.</div>\n",
    );
    page.push_str("</aside>\n");
}

fn genre_line(movie: &Movie) -> String {
    match &movie.genres {
        Some(genres) => genres
            .iter()
            .map(|g| g.name.as_str())
            .collect::<Vec<_>>()
            .join(", "),
        None => NO_VALUE.to_string(),
    }
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::RequestOutcome;
    use crate::tmdb::{Genre, Person};

    fn success(movie: Movie, credits: Credits) -> ViewState {
        ViewState {
            outcome: RequestOutcome::Success { movie, credits },
            ..ViewState::default()
        }
    }

    #[test]
    fn idle_page_shows_placeholder_and_no_poster() {
        let html = render(&ViewState::default());
        assert!(html.contains("No movie selected yet. Choose filters and click the button!"));
        assert!(html.contains("No Poster"));
        assert!(html.contains("🎬 Suggest A Movie"));
        assert!(!html.contains("http-equiv=\"refresh\""));
        assert!(!html.contains("Error:"));
    }

    #[test]
    fn loading_disables_trigger_and_refreshes() {
        let state = ViewState {
            outcome: RequestOutcome::Loading,
            ..ViewState::default()
        };
        let html = render(&state);
        assert!(html.contains("<button disabled>Loading...</button>"));
        assert!(html.contains("http-equiv=\"refresh\""));
    }

    #[test]
    fn failure_shows_message() {
        let state = ViewState {
            outcome: RequestOutcome::Failure {
                message: "No movie found with selected filters.".to_string(),
            },
            ..ViewState::default()
        };
        let html = render(&state);
        assert!(html.contains("Error: No movie found with selected filters."));
        assert!(html.contains("No movie selected yet."));
    }

    #[test]
    fn success_shows_details_director_and_top_cast() {
        let movie = Movie {
            id: Some(42),
            title: Some("Heat & Dust".to_string()),
            release_date: Some("2013-07-01".to_string()),
            overview: Some("A heist.".to_string()),
            poster_path: Some("/heat.jpg".to_string()),
            vote_average: Some(7.8),
            vote_count: Some(1200),
            genres: Some(vec![
                Genre {
                    id: 28,
                    name: "Action".to_string(),
                },
                Genre {
                    id: 80,
                    name: "Crime".to_string(),
                },
            ]),
        };
        let person = |name: &str, job: Option<&str>| Person {
            name: name.to_string(),
            character: None,
            job: job.map(str::to_string),
        };
        let credits = Credits {
            cast: (1..=6).map(|i| person(&format!("Actor {i}"), None)).collect(),
            crew: vec![person("Michael M", Some("Director"))],
        };
        let html = render(&success(movie, credits));

        assert!(html.contains("<h2>Heat &amp; Dust (2013)</h2>"));
        assert!(html.contains("Genres: Action, Crime"));
        assert!(html.contains("Director: Michael M"));
        assert!(html.contains("Cast: Actor 1, Actor 2, Actor 3, Actor 4, Actor 5</div>"));
        assert!(!html.contains("Actor 6"));
        assert!(html.contains("TMDb Rating: 7.8 (1200 votes)"));
        assert!(html.contains("https://image.tmdb.org/t/p/w500/heat.jpg"));
        assert!(html.contains("Show Another Movie"));
        assert!(!html.contains("No Poster"));
    }

    #[test]
    fn degraded_movie_uses_fallback_text() {
        let movie = Movie {
            id: Some(7),
            title: Some("Bare".to_string()),
            ..Movie::default()
        };
        let html = render(&success(movie, Credits::default()));
        assert!(html.contains("<h2>Bare</h2>"));
        assert!(html.contains("Genres: —"));
        assert!(html.contains("No description available."));
        assert!(html.contains("TMDb Rating: — (0 votes)"));
        assert!(!html.contains("Director:"));
        assert!(!html.contains("Cast:"));
        assert!(html.contains("No Poster"));
    }

    #[test]
    fn genre_buttons_mark_selection_and_escape_names() {
        let mut state = ViewState {
            genres: vec![
                Genre {
                    id: 28,
                    name: "Action".to_string(),
                },
                Genre {
                    id: 99,
                    name: "<Docs>".to_string(),
                },
            ],
            ..ViewState::default()
        };
        state.filters.toggle_genre(28);
        state.filters.year_start = Some(1999);
        let html = render(&state);
        assert!(html.contains("action=\"/genres/28/toggle\"><button class=\"genre selected\">Action"));
        assert!(html.contains("<button class=\"genre\">&lt;Docs&gt;</button>"));
        assert!(html.contains("name=\"year_start\" placeholder=\"Start Year\" value=\"1999\""));
    }
}
