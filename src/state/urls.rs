//! The signed-in user's own links.

#[cfg(test)]
#[path = "urls_test.rs"]
mod tests;

use crate::net::types::{ApiError, ShortenedUrl};

pub const LOAD_FAILED: &str = "Failed to fetch your URLs";
pub const CREATE_FAILED: &str = "Failed to create shortened URL";
pub const UPDATE_FAILED: &str = "Failed to update shortened URL";
pub const DELETE_FAILED: &str = "Failed to delete URL";

/// Link table for the "My URLs" page, newest first after local creates.
#[derive(Clone, Debug)]
pub struct MyUrlsState {
    pub urls: Vec<ShortenedUrl>,
    pub loading: bool,
    pub error: Option<String>,
}

impl Default for MyUrlsState {
    fn default() -> Self {
        Self { urls: Vec::new(), loading: true, error: None }
    }
}

impl MyUrlsState {
    pub fn loaded(&mut self, urls: Vec<ShortenedUrl>) {
        self.urls = urls;
        self.loading = false;
        self.error = None;
    }

    pub fn failed(&mut self, err: &ApiError, fallback: &str) {
        self.loading = false;
        self.error = Some(err.user_message(fallback));
    }

    #[must_use]
    pub fn get(&self, url_id: i64) -> Option<&ShortenedUrl> {
        self.urls.iter().find(|u| u.id == url_id)
    }

    /// A freshly created link goes to the top of the table.
    pub fn insert_created(&mut self, url: ShortenedUrl) {
        self.urls.insert(0, url);
        self.error = None;
    }

    /// Swap in the backend's copy of an edited link. Returns false if it is not listed.
    pub fn replace_updated(&mut self, url: ShortenedUrl) -> bool {
        match self.urls.iter_mut().find(|u| u.id == url.id) {
            Some(slot) => {
                *slot = url;
                self.error = None;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, url_id: i64) -> Option<ShortenedUrl> {
        let index = self.urls.iter().position(|u| u.id == url_id)?;
        Some(self.urls.remove(index))
    }
}
