use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

const DISCOVER_FIXED: [(&str, &str); 3] = [
    ("sort_by", "popularity.desc"),
    ("include_adult", "false"),
    ("include_video", "false"),
];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterSelection {
    pub genre_ids: BTreeSet<i64>,
    pub year_start: Option<i32>,
    pub year_end: Option<i32>,
    pub min_rating: Option<f64>,
    pub max_runtime_minutes: Option<u32>,
}

// `None` clears the field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FilterEdit {
    YearStart(Option<i32>),
    YearEnd(Option<i32>),
    MinRating(Option<f64>),
    MaxRuntime(Option<u32>),
}

impl FilterSelection {
    pub fn toggle_genre(&mut self, genre_id: i64) {
        if !self.genre_ids.remove(&genre_id) {
            self.genre_ids.insert(genre_id);
        }
    }

    pub fn is_genre_selected(&self, genre_id: i64) -> bool {
        self.genre_ids.contains(&genre_id)
    }

    pub fn apply(&mut self, edit: FilterEdit) {
        match edit {
            FilterEdit::YearStart(v) => self.year_start = v,
            FilterEdit::YearEnd(v) => self.year_end = v,
            FilterEdit::MinRating(v) => self.min_rating = v,
            FilterEdit::MaxRuntime(v) => self.max_runtime_minutes = v,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Each filter clause is present only when its field is set.
pub fn discover_params(filters: &FilterSelection, page: u32) -> Vec<(&'static str, String)> {
    let mut params: Vec<(&'static str, String)> = DISCOVER_FIXED
        .iter()
        .map(|(k, v)| (*k, v.to_string()))
        .collect();

    if !filters.genre_ids.is_empty() {
        let joined = filters
            .genre_ids
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(",");
        params.push(("with_genres", joined));
    }
    if let Some(start) = filters.year_start {
        params.push(("primary_release_date.gte", format!("{start}-01-01")));
    }
    if let Some(end) = filters.year_end {
        params.push(("primary_release_date.lte", format!("{end}-12-31")));
    }
    if let Some(rating) = filters.min_rating {
        params.push(("vote_average.gte", rating.to_string()));
    }
    if let Some(runtime) = filters.max_runtime_minutes {
        params.push(("with_runtime.lte", runtime.to_string()));
    }
    params.push(("page", page.to_string()));
    params
}

pub fn parse_field<T: std::str::FromStr>(raw: &str) -> Option<T> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse().ok()
}

/// Like [`parse_field`], but NaN and infinities are rejected.
pub fn parse_rating(raw: &str) -> Option<f64> {
    parse_field::<f64>(raw).filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value<'a>(params: &'a [(&'static str, String)], key: &str) -> Option<&'a str> {
        params
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn empty_selection_only_has_fixed_params_and_page() {
        let params = discover_params(&FilterSelection::default(), 4);
        let keys: Vec<_> = params.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, ["sort_by", "include_adult", "include_video", "page"]);
        assert_eq!(value(&params, "sort_by"), Some("popularity.desc"));
        assert_eq!(value(&params, "page"), Some("4"));
    }

    #[test]
    fn each_clause_present_iff_field_set() {
        let fields: [(&str, FilterEdit, &str); 4] = [
            (
                "primary_release_date.gte",
                FilterEdit::YearStart(Some(2010)),
                "2010-01-01",
            ),
            (
                "primary_release_date.lte",
                FilterEdit::YearEnd(Some(2015)),
                "2015-12-31",
            ),
            ("vote_average.gte", FilterEdit::MinRating(Some(7.5)), "7.5"),
            ("with_runtime.lte", FilterEdit::MaxRuntime(Some(120)), "120"),
        ];

        for (key, edit, expected) in fields {
            let mut filters = FilterSelection::default();
            assert_eq!(value(&discover_params(&filters, 1), key), None);
            filters.apply(edit);
            let params = discover_params(&filters, 1);
            assert_eq!(value(&params, key), Some(expected), "clause {key}");
            // Only the edited clause is added.
            assert_eq!(params.len(), 5, "clause {key}");
        }
    }

    #[test]
    fn genres_are_comma_joined_only_when_selected() {
        let mut filters = FilterSelection::default();
        filters.toggle_genre(28);
        filters.toggle_genre(12);
        let params = discover_params(&filters, 1);
        assert_eq!(value(&params, "with_genres"), Some("12,28"));

        filters.toggle_genre(28);
        filters.toggle_genre(12);
        assert_eq!(value(&discover_params(&filters, 1), "with_genres"), None);
    }

    #[test]
    fn whole_number_rating_has_no_fraction() {
        let mut filters = FilterSelection::default();
        filters.apply(FilterEdit::MinRating(Some(7.0)));
        assert_eq!(value(&discover_params(&filters, 1), "vote_average.gte"), Some("7"));
    }

    #[test]
    fn toggle_twice_restores_selection() {
        let mut filters = FilterSelection::default();
        filters.toggle_genre(35);
        let before = filters.clone();

        filters.toggle_genre(18);
        assert!(filters.is_genre_selected(18));
        filters.toggle_genre(18);
        assert_eq!(filters, before);

        filters.toggle_genre(35);
        filters.toggle_genre(35);
        assert_eq!(filters, before);
    }

    #[test]
    fn scalar_edit_leaves_other_fields_untouched() {
        let mut filters = FilterSelection::default();
        filters.toggle_genre(28);
        filters.apply(FilterEdit::YearStart(Some(2000)));
        filters.apply(FilterEdit::MaxRuntime(Some(90)));

        filters.apply(FilterEdit::YearStart(Some(1999)));
        assert_eq!(filters.year_start, Some(1999));
        assert_eq!(filters.max_runtime_minutes, Some(90));
        assert!(filters.is_genre_selected(28));

        filters.apply(FilterEdit::MaxRuntime(None));
        assert_eq!(filters.max_runtime_minutes, None);
        assert_eq!(filters.year_start, Some(1999));

        filters.reset();
        assert_eq!(filters, FilterSelection::default());
    }

    #[test]
    fn parse_field_treats_blank_and_garbage_as_unset() {
        assert_eq!(parse_field::<i32>(" 2012 "), Some(2012));
        assert_eq!(parse_field::<i32>(""), None);
        assert_eq!(parse_field::<i32>("   "), None);
        assert_eq!(parse_field::<u32>("abc"), None);
        assert_eq!(parse_field::<f64>("6.5"), Some(6.5));
    }

    #[test]
    fn parse_rating_rejects_non_finite_values() {
        assert_eq!(parse_rating("7.5"), Some(7.5));
        assert_eq!(parse_rating("NaN"), None);
        assert_eq!(parse_rating("inf"), None);
        assert_eq!(parse_rating("-infinity"), None);
        assert_eq!(parse_rating(""), None);
    }
}
