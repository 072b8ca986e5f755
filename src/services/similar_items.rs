use futures::future::join_all;
use std::{collections::HashMap, sync::Arc, time::Duration};

use super::{
    vector::{VectorIndex, VectorMatch, TYPE_FILTER_KEY},
    with_timeout, SeenIds,
};
use crate::{
    cached,
    db::{CacheKey, ResultCache},
    error::AppResult,
    models::{sort_by_score_desc, Candidate, CandidateSource, ContentId, Domain},
};

/// Owned items used to seed vector queries per domain
pub const MAX_SEEDS: usize = 3;

/// Each seed asks for this many times its share of the open slots
const OVERFETCH_FACTOR: usize = 2;

/// Outcome of the vector step for one domain
#[derive(Debug, Default)]
pub struct VectorSearch {
    pub candidates: Vec<Candidate>,
    /// True when at least one seed query failed
    pub degraded: bool,
}

/// Nearest-neighbor lookups with result caching
#[derive(Clone)]
pub struct VectorSimilarity {
    index: Arc<dyn VectorIndex>,
    cache: ResultCache,
    call_timeout: Duration,
}

impl VectorSimilarity {
    pub fn new(index: Arc<dyn VectorIndex>, cache: ResultCache, call_timeout: Duration) -> Self {
        Self {
            index,
            cache,
            call_timeout,
        }
    }

    /// Items similar to `item_id` within `domain`, best first
    pub async fn find_similar(
        &self,
        item_id: &ContentId,
        domain: Domain,
        count: usize,
    ) -> AppResult<Vec<Candidate>> {
        let matches = self.query_cached(item_id, domain, count).await?;

        Ok(matches
            .into_iter()
            .filter(|m| &m.id != item_id)
            .map(|m| Candidate {
                id: m.id,
                domain,
                score: m.score,
                source: CandidateSource::Vector,
                item: None,
            })
            .collect())
    }

    async fn query_cached(
        &self,
        item_id: &ContentId,
        domain: Domain,
        count: usize,
    ) -> AppResult<Vec<VectorMatch>> {
        let key = CacheKey::VectorQuery {
            item_id: item_id.clone(),
            domain,
            count,
        };
        let ttl = self.cache.ttl_for(&key);
        let filter = HashMap::from([(
            TYPE_FILTER_KEY.to_string(),
            domain.index_type().to_string(),
        )]);

        cached!(
            self.cache,
            key,
            ttl,
            with_timeout(
                self.call_timeout,
                "vector index query",
                self.index.query_by_item_id(item_id, count, &filter),
            )
        )
    }

    /// Fills up to `remaining` slots from items similar to the first owned items
    ///
    /// Seeds are the first three of `owned` in library order. Each requests
    /// twice its share of the open slots to absorb duplicates. Seed results
    /// are consumed in seed order; a failed seed contributes nothing.
    pub async fn fill_remaining(
        &self,
        owned: &[ContentId],
        domain: Domain,
        remaining: usize,
        seen: &mut SeenIds<'_>,
    ) -> VectorSearch {
        let mut search = VectorSearch::default();
        let seeds = &owned[..owned.len().min(MAX_SEEDS)];
        if remaining == 0 || seeds.is_empty() {
            return search;
        }

        let per_seed = remaining.div_ceil(seeds.len()) * OVERFETCH_FACTOR;
        let results = join_all(
            seeds
                .iter()
                .map(|seed| self.find_similar(seed, domain, per_seed)),
        )
        .await;

        'seeds: for (seed, result) in seeds.iter().zip(results) {
            let candidates = match result {
                Ok(candidates) => candidates,
                Err(e) => {
                    tracing::warn!(
                        domain = %domain,
                        item_id = %seed,
                        error = %e,
                        "Vector query failed, skipping seed"
                    );
                    search.degraded = true;
                    continue;
                }
            };

            for candidate in candidates {
                if search.candidates.len() >= remaining {
                    break 'seeds;
                }
                if seen.accept(&candidate.id) {
                    search.candidates.push(candidate);
                }
            }
        }

        sort_by_score_desc(&mut search.candidates);
        search
    }
}
