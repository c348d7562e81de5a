use super::*;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Utc;
use shared::domain::{ArtistProfile, Portfolio, UserId};
use std::sync::atomic::{AtomicBool, Ordering};

struct FakeCatalog {
    portfolios: Vec<PortfolioWithArtist>,
    fail: AtomicBool,
}

impl FakeCatalog {
    fn new(portfolios: Vec<PortfolioWithArtist>) -> Self {
        Self {
            portfolios,
            fail: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl PortfolioCatalog for FakeCatalog {
    async fn list_public_portfolios(&self) -> Result<Vec<PortfolioWithArtist>> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(anyhow!("catalog offline"));
        }
        Ok(self.portfolios.clone())
    }
}

fn entry(id: &str, name: &str, artist: Option<&str>, description: Option<&str>) -> PortfolioWithArtist {
    PortfolioWithArtist {
        portfolio: Portfolio {
            id: PortfolioId::new(id),
            user_id: UserId::new("artist"),
            name: name.to_string(),
            description: description.map(str::to_string),
            is_public: true,
            created_at: Utc::now(),
        },
        artist: artist.map(|full_name| ArtistProfile {
            full_name: Some(full_name.to_string()),
            ..ArtistProfile::default()
        }),
    }
}

fn sample() -> Vec<PortfolioWithArtist> {
    vec![
        entry("p1", "Blackwork", Some("Ink Artist"), None),
        entry("p2", "Florals", None, Some("Fine line botanicals")),
        entry("p3", "Flash sheet", Some("Jo Marsh"), Some("Walk-in designs")),
    ]
}

#[test]
fn filter_checks_name_artist_and_description() {
    let portfolios = sample();
    let ids = |query: &str| -> Vec<String> {
        filter_portfolios(&portfolios, query)
            .iter()
            .map(|p| p.portfolio.id.to_string())
            .collect()
    };

    assert_eq!(ids(""), vec!["p1", "p2", "p3"]);
    assert_eq!(ids("BLACK"), vec!["p1"]);
    assert_eq!(ids("ink artist"), vec!["p1"]);
    assert_eq!(ids("botanical"), vec!["p2"]);
    assert_eq!(ids("fl"), vec!["p2", "p3"]);
    assert!(ids("realism").is_empty());
}

#[test]
fn link_points_at_portfolio_page() {
    assert_eq!(portfolio_link(&PortfolioId::new("p1")), "/portfolio/p1");
}

#[tokio::test]
async fn gallery_starts_loading_and_clears_flag_after_load() {
    let gallery = PortfolioGallery::new(Arc::new(FakeCatalog::new(sample())));
    assert!(gallery.snapshot().await.loading);
    assert_eq!(gallery.snapshot().await.empty_state(), None);

    gallery.load().await;
    let snapshot = gallery.snapshot().await;
    assert!(!snapshot.loading);
    assert_eq!(snapshot.rows.len(), 3);
}

#[tokio::test]
async fn failed_load_keeps_previous_set() {
    let catalog = Arc::new(FakeCatalog::new(sample()));
    let gallery = PortfolioGallery::new(catalog.clone());
    gallery.load().await;

    catalog.fail.store(true, Ordering::SeqCst);
    gallery.load().await;
    let snapshot = gallery.snapshot().await;
    assert!(!snapshot.loading);
    assert_eq!(snapshot.rows.len(), 3);
}

#[tokio::test]
async fn empty_state_depends_on_search() {
    let gallery = PortfolioGallery::new(Arc::new(FakeCatalog::new(Vec::new())));
    gallery.load().await;
    assert_eq!(
        gallery.snapshot().await.empty_state().map(|e| e.hint),
        Some("Check back soon for new artist portfolios")
    );

    gallery.set_search_query("anything").await;
    let empty = gallery.snapshot().await.empty_state().expect("empty");
    assert_eq!(empty.title, "No portfolios found");
    assert_eq!(empty.hint, "Try a different search term");
}
