//! Public link explorer: search, sort, optimistic visit counts.
//!
//! Ordering is applied before the search filter and is stable, so links
//! that compare equal keep the order the backend sent them in. A link with
//! no `created_at` sorts as the oldest.

#[cfg(test)]
#[path = "explore_test.rs"]
mod tests;

use std::cmp::Ordering;

use crate::net::types::{ApiError, ShortenedUrl};

pub const LOAD_FAILED: &str = "Failed to fetch public URLs";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortField {
    VisitCount,
    #[default]
    CreatedAt,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }

    #[must_use]
    pub fn arrow(self) -> &'static str {
        match self {
            Self::Asc => "↑",
            Self::Desc => "↓",
        }
    }
}

#[derive(Clone, Debug)]
pub struct ExploreState {
    pub urls: Vec<ShortenedUrl>,
    pub loading: bool,
    pub error: Option<String>,
    pub search: String,
    sort_field: SortField,
    sort_direction: SortDirection,
}

impl Default for ExploreState {
    fn default() -> Self {
        Self {
            urls: Vec::new(),
            loading: true,
            error: None,
            search: String::new(),
            sort_field: SortField::default(),
            sort_direction: SortDirection::default(),
        }
    }
}

impl ExploreState {
    pub fn loaded(&mut self, urls: Vec<ShortenedUrl>) {
        self.urls = urls;
        self.loading = false;
        self.error = None;
    }

    pub fn failed(&mut self, err: &ApiError) {
        self.loading = false;
        self.error = Some(err.user_message(LOAD_FAILED));
    }

    #[must_use]
    pub fn sort_field(&self) -> SortField {
        self.sort_field
    }

    #[must_use]
    pub fn sort_direction(&self) -> SortDirection {
        self.sort_direction
    }

    /// Select a sort column. Re-selecting the active column flips direction;
    /// a different column starts descending.
    pub fn sort_by(&mut self, field: SortField) {
        if self.sort_field == field {
            self.sort_direction = self.sort_direction.toggled();
        } else {
            self.sort_field = field;
            self.sort_direction = SortDirection::Desc;
        }
    }

    pub fn set_search(&mut self, term: impl Into<String>) {
        self.search = term.into();
    }

    /// Links to display: sorted, then filtered by the search term.
    #[must_use]
    pub fn visible(&self) -> Vec<&ShortenedUrl> {
        let mut rows: Vec<&ShortenedUrl> = self.urls.iter().collect();
        rows.sort_by(|a, b| {
            let ascending = compare(self.sort_field, a, b);
            match self.sort_direction {
                SortDirection::Asc => ascending,
                SortDirection::Desc => ascending.reverse(),
            }
        });

        let needle = self.search.to_lowercase();
        rows.retain(|u| {
            u.original_url.to_lowercase().contains(&needle) || u.short_code.to_lowercase().contains(&needle)
        });
        rows
    }

    /// Bump the local visit count once the short link has been opened.
    pub fn record_visit(&mut self, url_id: i64) -> bool {
        match self.urls.iter_mut().find(|u| u.id == url_id) {
            Some(url) => {
                url.visit_count = url.visit_count.saturating_add(1);
                true
            }
            None => false,
        }
    }
}

fn compare(field: SortField, a: &ShortenedUrl, b: &ShortenedUrl) -> Ordering {
    match field {
        SortField::VisitCount => a.visit_count.cmp(&b.visit_count),
        SortField::CreatedAt => a.created_at.cmp(&b.created_at),
    }
}
