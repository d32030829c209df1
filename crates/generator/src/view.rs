//! Incremental list view.
//!
//! Holds the posts loaded so far and the cursor of the next page. Loading
//! more is split into [`PostListView::begin_load`] and
//! [`PostListView::complete_load`] so that a caller can release the view
//! while the request is outstanding; a second activation in that window is
//! refused instead of appending the same page twice.

use blog_kit_client::PageSource;
use blog_kit_core::{Post, PostPagination, Result, SearchResponse};
use thiserror::Error;
use tracing::{debug, warn};

/// Pagination cursor state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cursor {
    HasMore(String),
    /// Terminal: no further pages
    Exhausted,
}

impl Cursor {
    fn from_next_page(next_page: Option<String>) -> Self {
        match next_page {
            Some(url) if !url.trim().is_empty() => Cursor::HasMore(url),
            _ => Cursor::Exhausted,
        }
    }
}

/// A failed load-more, kept in the view for display
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Failed to load more posts: {message}")]
pub struct LoadMoreError {
    /// Cursor that was being followed; still current after the failure
    pub cursor: String,
    pub message: String,
}

/// Proof that a load was started. Not `Clone`, so each one completes once.
#[derive(Debug, PartialEq, Eq)]
pub struct LoadTicket {
    url: String,
}

impl LoadTicket {
    pub fn url(&self) -> &str {
        &self.url
    }
}

/// Result of a single load-more activation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Page fetched; this many posts were appended
    Appended(usize),
    /// Nothing left to load
    Exhausted,
    /// Another load is still in flight
    Busy,
    Failed(LoadMoreError),
}

#[derive(Debug, Clone)]
pub struct PostListView {
    posts: Vec<Post>,
    cursor: Cursor,
    in_flight: bool,
    last_error: Option<LoadMoreError>,
}

impl PostListView {
    pub fn new(initial: PostPagination) -> Self {
        PostListView {
            posts: initial.results,
            cursor: Cursor::from_next_page(initial.next_page),
            in_flight: false,
            last_error: None,
        }
    }

    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    pub fn next_page(&self) -> Option<&str> {
        match &self.cursor {
            Cursor::HasMore(url) => Some(url),
            Cursor::Exhausted => None,
        }
    }

    /// Whether the load-more control is rendered at all
    pub fn show_load_more(&self) -> bool {
        matches!(self.cursor, Cursor::HasMore(_))
    }

    /// Whether a load is outstanding (the control renders disabled)
    pub fn is_loading(&self) -> bool {
        self.in_flight
    }

    pub fn last_error(&self) -> Option<&LoadMoreError> {
        self.last_error.as_ref()
    }

    /// Snapshot of the current state in the wire shape
    pub fn to_pagination(&self) -> PostPagination {
        PostPagination {
            next_page: self.next_page().map(str::to_string),
            results: self.posts.clone(),
        }
    }

    /// Start a load if there is a cursor and nothing is in flight
    pub fn begin_load(&mut self) -> Option<LoadTicket> {
        if self.in_flight {
            debug!("Load more ignored, request already in flight");
            return None;
        }

        let url = self.next_page()?.to_string();
        self.in_flight = true;
        debug!(url = %url, "Loading more posts");
        Some(LoadTicket { url })
    }

    /// Apply the outcome of a started load.
    ///
    /// On success the new posts are appended after the existing ones and the
    /// cursor is replaced. On failure posts and cursor are left exactly as
    /// they were and the error is kept for display.
    pub fn complete_load(
        &mut self,
        ticket: LoadTicket,
        result: Result<SearchResponse>,
    ) -> std::result::Result<usize, LoadMoreError> {
        self.in_flight = false;

        match result {
            Ok(response) => {
                let page = response.into_pagination();
                let appended = page.results.len();
                self.posts.extend(page.results);
                self.cursor = Cursor::from_next_page(page.next_page);
                self.last_error = None;
                debug!(appended, exhausted = !self.show_load_more(), "Appended page");
                Ok(appended)
            }
            Err(e) => {
                warn!(url = %ticket.url, error = %e, "Load more failed");
                let error = LoadMoreError {
                    cursor: ticket.url,
                    message: e.to_string(),
                };
                self.last_error = Some(error.clone());
                Err(error)
            }
        }
    }

    /// Fetch the next page from `source` and apply it
    pub async fn load_more(&mut self, source: &dyn PageSource) -> LoadOutcome {
        if self.in_flight {
            return LoadOutcome::Busy;
        }
        let Some(ticket) = self.begin_load() else {
            return LoadOutcome::Exhausted;
        };

        let result = source.next_page(ticket.url()).await;
        match self.complete_load(ticket, result) {
            Ok(n) => LoadOutcome::Appended(n),
            Err(e) => LoadOutcome::Failed(e),
        }
    }
}
