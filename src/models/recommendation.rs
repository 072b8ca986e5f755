use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{cmp::Ordering, collections::HashSet};

use super::{ContentId, ContentItem, Domain};

/// Franchise information derived from a title
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesInfo {
    /// Empty when no series could be detected
    pub series_name: String,
    /// Informational only; never used for matching
    pub series_number: Option<String>,
}

impl SeriesInfo {
    pub fn is_detected(&self) -> bool {
        !self.series_name.is_empty()
    }
}

/// How a candidate was discovered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CandidateSource {
    Sequel,
    Vector,
}

/// A recommended item with its score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: ContentId,
    pub domain: Domain,
    /// Metadata similarity for sequels, index similarity for vector matches
    pub score: f64,
    pub source: CandidateSource,
    /// Catalog record; absent when it could not be loaded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item: Option<ContentItem>,
}

/// Sorts candidates by descending score, keeping discovery order for ties
pub fn sort_by_score_desc(candidates: &mut [Candidate]) {
    candidates.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
}

/// Recommendations for a single domain
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DomainRecommendations {
    /// Sequel candidates first, then vector candidates
    pub candidates: Vec<Candidate>,
    /// True when any step of this domain failed or timed out
    pub degraded: bool,
}

/// Recommendations across all domains
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationResult {
    pub movie: DomainRecommendations,
    pub tv: DomainRecommendations,
    pub anime: DomainRecommendations,
    pub game: DomainRecommendations,
    /// Concatenation of the domain lists in movie, tv, anime, game order
    pub all: Vec<Candidate>,
    pub generated_at: DateTime<Utc>,
}

impl RecommendationResult {
    /// Assembles the combined list from per-domain results
    ///
    /// Domains are concatenated without re-ranking since their score scales
    /// differ. An identifier already present earlier in the combined list is
    /// skipped.
    pub fn assemble(mut per_domain: Vec<(Domain, DomainRecommendations)>) -> Self {
        per_domain.sort_by_key(|(domain, _)| *domain);

        let mut result = Self {
            movie: DomainRecommendations::default(),
            tv: DomainRecommendations::default(),
            anime: DomainRecommendations::default(),
            game: DomainRecommendations::default(),
            all: Vec::new(),
            generated_at: Utc::now(),
        };

        let mut seen: HashSet<ContentId> = HashSet::new();
        for (domain, recs) in per_domain {
            result.all.extend(
                recs.candidates
                    .iter()
                    .filter(|c| seen.insert(c.id.clone()))
                    .cloned(),
            );
            *result.domain_mut(domain) = recs;
        }

        result
    }

    pub fn domain(&self, domain: Domain) -> &DomainRecommendations {
        match domain {
            Domain::Movie => &self.movie,
            Domain::Tv => &self.tv,
            Domain::Anime => &self.anime,
            Domain::Game => &self.game,
        }
    }

    fn domain_mut(&mut self, domain: Domain) -> &mut DomainRecommendations {
        match domain {
            Domain::Movie => &mut self.movie,
            Domain::Tv => &mut self.tv,
            Domain::Anime => &mut self.anime,
            Domain::Game => &mut self.game,
        }
    }

    pub fn is_degraded(&self) -> bool {
        Domain::ALL.iter().any(|d| self.domain(*d).degraded)
    }
}
