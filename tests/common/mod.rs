use axum_test::TestServer;
use std::{collections::HashMap, sync::Arc, time::Duration};

use nextup_api::{
    db::{ContentRepository, LibrarySource, MemoryStore, ResultCache},
    error::{AppError, AppResult},
    models::{ContentAttributes, ContentId, ContentItem, Domain, OwnedIds},
    routes::{create_router, AppState},
    services::{Recommender, RecommenderSettings, VectorIndex, VectorMatch, VectorSimilarity},
};

pub const USER: &str = "user-1";

/// In-memory catalog
pub struct FakeCatalog {
    items: Vec<ContentItem>,
}

impl FakeCatalog {
    pub fn new(items: Vec<ContentItem>) -> Self {
        Self { items }
    }
}

#[async_trait::async_trait]
impl ContentRepository for FakeCatalog {
    async fn find_by_ids(&self, domain: Domain, ids: &[ContentId]) -> AppResult<Vec<ContentItem>> {
        Ok(ids
            .iter()
            .filter_map(|id| {
                self.items
                    .iter()
                    .find(|item| item.domain == domain && &item.id == id)
                    .cloned()
            })
            .collect())
    }

    async fn find_by_title_substring(
        &self,
        domain: Domain,
        pattern: &str,
        exclude_id: &ContentId,
        limit: usize,
    ) -> AppResult<Vec<ContentItem>> {
        let needle = pattern.to_lowercase();
        Ok(self
            .items
            .iter()
            .filter(|item| item.domain == domain && &item.id != exclude_id)
            .filter(|item| {
                [
                    Some(item.title.as_str()),
                    item.title_en.as_deref(),
                    item.title_original.as_deref(),
                ]
                .into_iter()
                .flatten()
                .any(|title| title.to_lowercase().contains(&needle))
            })
            .take(limit)
            .cloned()
            .collect())
    }
}

/// Library source with fixed contents, or one that always fails
pub struct FakeLibrary {
    owned: Option<OwnedIds>,
}

impl FakeLibrary {
    pub fn with(owned: OwnedIds) -> Self {
        Self { owned: Some(owned) }
    }

    pub fn failing() -> Self {
        Self { owned: None }
    }
}

#[async_trait::async_trait]
impl LibrarySource for FakeLibrary {
    async fn owned_ids_by_domain(&self, _user_id: &str) -> AppResult<OwnedIds> {
        self.owned
            .clone()
            .ok_or_else(|| AppError::Internal("list store unreachable".to_string()))
    }

    async fn not_interested_ids(&self, _user_id: &str) -> AppResult<Vec<ContentId>> {
        Ok(vec![ContentId::from("m-dismissed")])
    }
}

/// Vector index answering from a fixed neighbor table, or always failing
pub struct FakeIndex {
    neighbors: Option<HashMap<String, Vec<(String, f64)>>>,
}

impl FakeIndex {
    pub fn with(neighbors: Vec<(&str, Vec<(&str, f64)>)>) -> Self {
        Self {
            neighbors: Some(
                neighbors
                    .into_iter()
                    .map(|(seed, hits)| {
                        (
                            seed.to_string(),
                            hits.into_iter()
                                .map(|(id, score)| (id.to_string(), score))
                                .collect(),
                        )
                    })
                    .collect(),
            ),
        }
    }

    pub fn failing() -> Self {
        Self { neighbors: None }
    }
}

#[async_trait::async_trait]
impl VectorIndex for FakeIndex {
    async fn query_by_item_id(
        &self,
        id: &ContentId,
        top_k: usize,
        _filter: &HashMap<String, String>,
    ) -> AppResult<Vec<VectorMatch>> {
        let neighbors = self
            .neighbors
            .as_ref()
            .ok_or_else(|| AppError::ExternalApi("index unavailable".to_string()))?;

        Ok(neighbors
            .get(id.as_str())
            .map(|hits| {
                hits.iter()
                    .take(top_k)
                    .map(|(hit, score)| VectorMatch {
                        id: ContentId::from(hit.as_str()),
                        score: *score,
                        metadata: HashMap::new(),
                    })
                    .collect()
            })
            .unwrap_or_default())
    }
}

fn item(id: &str, domain: Domain, title: &str, genres: &[&str]) -> ContentItem {
    ContentItem {
        attributes: ContentAttributes {
            genres: genres.iter().map(|g| g.to_string()).collect(),
            ..ContentAttributes::default()
        },
        ..ContentItem::new(id, domain, title)
    }
}

pub fn catalog() -> FakeCatalog {
    FakeCatalog::new(vec![
        item("m1", Domain::Movie, "The Matrix", &["scifi"]),
        item("m2", Domain::Movie, "The Matrix Reloaded", &["scifi", "action"]),
        item("m3", Domain::Movie, "The Matrix Revolutions", &["scifi"]),
        item("m-dismissed", Domain::Movie, "The Matrix Resurrections", &["scifi"]),
        item("m5", Domain::Movie, "Heat", &["crime"]),
        item("m6", Domain::Movie, "Collateral", &["crime"]),
        item("t1", Domain::Tv, "Breaking Bad", &["drama"]),
        item("t2", Domain::Tv, "Better Call Saul", &["drama"]),
        item("a1", Domain::Anime, "Attack on Titan Season 2", &["action"]),
        item("a2", Domain::Anime, "Attack on Titan Season 3", &["action"]),
        item("g1", Domain::Game, "Dark Souls", &["rpg"]),
        item("g2", Domain::Game, "Dark Souls II", &["rpg"]),
        item("g3", Domain::Game, "Elden Ring", &["rpg"]),
    ])
}

pub fn owned() -> OwnedIds {
    let ids = |values: &[&str]| -> Vec<ContentId> {
        values.iter().map(|v| ContentId::from(*v)).collect()
    };
    OwnedIds {
        movie: ids(&["m1", "m5"]),
        tv: ids(&["t1"]),
        anime: ids(&["a1"]),
        game: ids(&["g1"]),
    }
}

pub fn index() -> FakeIndex {
    FakeIndex::with(vec![
        ("m1", vec![("m1", 1.0), ("m6", 0.82), ("m2", 0.8)]),
        ("m5", vec![("m6", 0.91)]),
        ("t1", vec![("t2", 0.93)]),
        ("g1", vec![("g3", 0.88), ("g2", 0.86)]),
    ])
}

pub fn test_server(
    catalog: FakeCatalog,
    library: FakeLibrary,
    index: FakeIndex,
    min_library_size: usize,
) -> TestServer {
    let call_timeout = Duration::from_secs(2);
    let cache = ResultCache::new(Arc::new(MemoryStore::new(1_000)), 60, 60, call_timeout);
    let similarity = VectorSimilarity::new(Arc::new(index), cache.clone(), call_timeout);
    let recommender = Recommender::new(
        Arc::new(catalog),
        Arc::new(library),
        similarity,
        cache,
        RecommenderSettings {
            call_timeout,
            min_library_size,
        },
    );

    TestServer::new(create_router(AppState::new(recommender, 10))).unwrap()
}

pub fn default_server() -> TestServer {
    test_server(catalog(), FakeLibrary::with(owned()), index(), 1)
}
