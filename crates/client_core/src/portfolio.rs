use std::sync::Arc;

use shared::{
    domain::{PortfolioId, PortfolioWithArtist},
    service::PortfolioCatalog,
};
use tokio::sync::Mutex;
use tracing::{error, info};

pub const EMPTY_TITLE: &str = "No portfolios found";
pub const EMPTY_SEARCH_HINT: &str = "Try a different search term";
pub const EMPTY_CATALOG_HINT: &str = "Check back soon for new artist portfolios";

/// Keeps a portfolio when the query is a case-insensitive substring of its
/// name, its artist's full name or its description.
pub fn filter_portfolios<'a>(
    portfolios: &'a [PortfolioWithArtist],
    query: &str,
) -> Vec<&'a PortfolioWithArtist> {
    let needle = query.to_lowercase();
    portfolios
        .iter()
        .filter(|entry| {
            let artist_name = entry
                .artist
                .as_ref()
                .and_then(|artist| artist.full_name.as_deref());
            [
                Some(entry.portfolio.name.as_str()),
                artist_name,
                entry.portfolio.description.as_deref(),
            ]
            .into_iter()
            .flatten()
            .any(|field| field.to_lowercase().contains(&needle))
        })
        .collect()
}

pub fn portfolio_link(id: &PortfolioId) -> String {
    format!("/portfolio/{id}")
}

#[derive(Debug)]
struct GalleryState {
    portfolios: Vec<PortfolioWithArtist>,
    loading: bool,
    search_query: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GallerySnapshot {
    pub rows: Vec<PortfolioWithArtist>,
    pub loading: bool,
    pub search_query: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmptyState {
    pub title: &'static str,
    pub hint: &'static str,
}

impl GallerySnapshot {
    pub fn empty_state(&self) -> Option<EmptyState> {
        if self.loading || !self.rows.is_empty() {
            return None;
        }
        let hint = if self.search_query.is_empty() {
            EMPTY_CATALOG_HINT
        } else {
            EMPTY_SEARCH_HINT
        };
        Some(EmptyState {
            title: EMPTY_TITLE,
            hint,
        })
    }
}

/// Public, searchable list of artist portfolios.
pub struct PortfolioGallery {
    catalog: Arc<dyn PortfolioCatalog>,
    inner: Mutex<GalleryState>,
}

impl PortfolioGallery {
    pub fn new(catalog: Arc<dyn PortfolioCatalog>) -> Self {
        Self {
            catalog,
            inner: Mutex::new(GalleryState {
                portfolios: Vec::new(),
                loading: true,
                search_query: String::new(),
            }),
        }
    }

    /// Fetches the public portfolios. A failure is logged and the previous
    /// set is kept; the loading flag is cleared either way.
    pub async fn load(&self) {
        self.inner.lock().await.loading = true;
        let fetched = self.catalog.list_public_portfolios().await;

        let mut state = self.inner.lock().await;
        match fetched {
            Ok(portfolios) => {
                info!(count = portfolios.len(), "loaded public portfolios");
                state.portfolios = portfolios;
            }
            Err(err) => error!(error = %err, "error fetching portfolios"),
        }
        state.loading = false;
    }

    pub async fn set_search_query(&self, query: impl Into<String>) {
        self.inner.lock().await.search_query = query.into();
    }

    pub async fn snapshot(&self) -> GallerySnapshot {
        let state = self.inner.lock().await;
        GallerySnapshot {
            rows: filter_portfolios(&state.portfolios, &state.search_query)
                .into_iter()
                .cloned()
                .collect(),
            loading: state.loading,
            search_query: state.search_query.clone(),
        }
    }
}

#[cfg(test)]
#[path = "tests/portfolio_tests.rs"]
mod tests;
