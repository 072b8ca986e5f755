use futures::{stream, StreamExt};
use std::{collections::HashMap, sync::Arc, time::Duration};

use super::{
    library::{build_owned_sets, ensure_min_size},
    sequels::find_sequels,
    with_timeout, SeenIds, VectorSimilarity,
};
use crate::{
    db::{CacheKey, ContentRepository, LibrarySource, ResultCache},
    error::AppResult,
    models::{Candidate, Domain, DomainRecommendations, RecommendationResult, UserLibrary},
};

/// Domain pipelines in flight per request
const MAX_CONCURRENT_DOMAINS: usize = 4;

#[derive(Debug, Clone)]
pub struct RecommenderSettings {
    /// Deadline for every repository, library and index call
    pub call_timeout: Duration,
    /// Total list entries required before recommending
    pub min_library_size: usize,
}

/// Hybrid recommendation engine
///
/// Combines franchise matches from the catalog with nearest neighbors from
/// the vector index, per domain. Constructed once at startup and shared.
#[derive(Clone)]
pub struct Recommender {
    content: Arc<dyn ContentRepository>,
    library: Arc<dyn LibrarySource>,
    similarity: VectorSimilarity,
    cache: ResultCache,
    settings: RecommenderSettings,
}

impl Recommender {
    pub fn new(
        content: Arc<dyn ContentRepository>,
        library: Arc<dyn LibrarySource>,
        similarity: VectorSimilarity,
        cache: ResultCache,
        settings: RecommenderSettings,
    ) -> Self {
        Self {
            content,
            library,
            similarity,
            cache,
            settings,
        }
    }

    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    /// Recommendations for every domain, at most `per_domain_target` each
    ///
    /// Fails only when the user's library cannot be loaded or is too small.
    /// Results are cached per user and target unless a domain was degraded.
    #[tracing::instrument(
        skip_all,
        fields(user_id = %user_id, per_domain_target = per_domain_target)
    )]
    pub async fn recommend(
        &self,
        user_id: &str,
        per_domain_target: usize,
    ) -> AppResult<RecommendationResult> {
        let key = CacheKey::UserRecommendations {
            user_id: user_id.to_string(),
            per_domain: per_domain_target,
        };

        match self.cache.get_from_cache::<RecommendationResult>(&key).await {
            Ok(Some(cached)) => return Ok(cached),
            Ok(None) => {}
            Err(e) => tracing::warn!(key = %key, error = %e, "Cache read failed, recomputing"),
        }

        let library = self.load_library(user_id).await?;

        let library = &library;
        let per_domain: Vec<(Domain, DomainRecommendations)> = stream::iter(Domain::ALL)
            .map(|domain| async move {
                let recs = self.pipeline_for_domain(library, domain, per_domain_target).await;
                (domain, recs)
            })
            .buffered(MAX_CONCURRENT_DOMAINS)
            .collect()
            .await;

        let result = RecommendationResult::assemble(per_domain);

        if result.is_degraded() {
            tracing::info!(
                total = result.all.len(),
                "Returning degraded recommendations without caching"
            );
        } else {
            self.cache
                .set_in_cache(&key, &result, self.cache.ttl_for(&key))
                .await;
            tracing::info!(total = result.all.len(), "Recommendations generated");
        }

        Ok(result)
    }

    /// Recommendations for a single domain; never cached
    #[tracing::instrument(skip_all, fields(user_id = %user_id, domain = %domain, target = target))]
    pub async fn recommend_domain(
        &self,
        user_id: &str,
        domain: Domain,
        target: usize,
    ) -> AppResult<DomainRecommendations> {
        let library = self.load_library(user_id).await?;
        Ok(self.pipeline_for_domain(&library, domain, target).await)
    }

    async fn load_library(&self, user_id: &str) -> AppResult<UserLibrary> {
        let library =
            build_owned_sets(self.library.as_ref(), user_id, self.settings.call_timeout).await?;
        ensure_min_size(&library, self.settings.min_library_size)?;
        Ok(library)
    }

    /// Sequel candidates first, then vector candidates for the open slots
    ///
    /// Every failure inside marks the result degraded and shrinks it; none
    /// is returned as an error.
    async fn pipeline_for_domain(
        &self,
        library: &UserLibrary,
        domain: Domain,
        target: usize,
    ) -> DomainRecommendations {
        let owned_ids = library.owned_ids(domain);
        if owned_ids.is_empty() || target == 0 {
            return DomainRecommendations::default();
        }

        let mut degraded = false;
        let mut seen = SeenIds::new(library, domain);

        let owned_items = match with_timeout(
            self.settings.call_timeout,
            "owned item fetch",
            self.content.find_by_ids(domain, owned_ids),
        )
        .await
        {
            Ok(items) => items,
            Err(e) => {
                tracing::warn!(
                    domain = %domain,
                    owned = owned_ids.len(),
                    error = %e,
                    "Failed to load owned items, skipping sequel search"
                );
                degraded = true;
                Vec::new()
            }
        };

        let sequels = find_sequels(
            self.content.as_ref(),
            &owned_items,
            domain,
            &mut seen,
            target,
            self.settings.call_timeout,
        )
        .await;
        degraded |= sequels.degraded;

        let remaining = target.saturating_sub(sequels.candidates.len());
        let mut vector = self
            .similarity
            .fill_remaining(owned_ids, domain, remaining, &mut seen)
            .await;
        degraded |= vector.degraded;
        degraded |= !self.attach_items(domain, &mut vector.candidates).await;

        tracing::debug!(
            domain = %domain,
            sequels = sequels.candidates.len(),
            vector = vector.candidates.len(),
            degraded,
            "Domain pipeline complete"
        );

        let mut candidates = sequels.candidates;
        candidates.extend(vector.candidates);

        DomainRecommendations {
            candidates,
            degraded,
        }
    }

    /// Loads catalog records for index hits; false when the lookup failed
    async fn attach_items(&self, domain: Domain, candidates: &mut [Candidate]) -> bool {
        if candidates.is_empty() {
            return true;
        }

        let ids: Vec<_> = candidates.iter().map(|c| c.id.clone()).collect();
        match with_timeout(
            self.settings.call_timeout,
            "candidate detail fetch",
            self.content.find_by_ids(domain, &ids),
        )
        .await
        {
            Ok(items) => {
                let mut by_id: HashMap<_, _> =
                    items.into_iter().map(|item| (item.id.clone(), item)).collect();
                for candidate in candidates.iter_mut() {
                    candidate.item = by_id.remove(&candidate.id);
                }
                true
            }
            Err(e) => {
                tracing::warn!(
                    domain = %domain,
                    candidates = ids.len(),
                    error = %e,
                    "Failed to load candidate details"
                );
                false
            }
        }
    }
}
