use std::time::Duration;

use super::{franchise, similarity::metadata_similarity, with_timeout, SeenIds};
use crate::{
    db::ContentRepository,
    models::{sort_by_score_desc, Candidate, CandidateSource, ContentItem, Domain},
};

/// Title matches requested per owned item
pub const MATCHES_PER_TITLE: usize = 5;

/// Sequel candidates accepted per owned item
pub const MAX_PER_SOURCE: usize = 3;

/// Sequel candidates accepted per domain
pub const MAX_SEQUELS: usize = 10;

/// Outcome of the sequel step for one domain
#[derive(Debug, Default)]
pub struct SequelSearch {
    pub candidates: Vec<Candidate>,
    /// True when at least one title lookup failed
    pub degraded: bool,
}

/// Finds other entries of the franchises the user already owns
///
/// Owned items are processed in order. Each one's franchise name is looked
/// up as a title substring; survivors are scored against the owned item and
/// the best three accepted. Accepting stops once `limit` (never more than
/// ten) candidates were found. A failed lookup only skips its own item.
pub async fn find_sequels(
    content: &dyn ContentRepository,
    owned: &[ContentItem],
    domain: Domain,
    seen: &mut SeenIds<'_>,
    limit: usize,
    call_timeout: Duration,
) -> SequelSearch {
    let limit = limit.min(MAX_SEQUELS);
    let mut search = SequelSearch::default();

    for source in owned {
        if search.candidates.len() >= limit {
            break;
        }

        let series = franchise::detect(source.primary_title());
        if !series.is_detected() {
            continue;
        }

        let matches = match with_timeout(
            call_timeout,
            "title substring search",
            content.find_by_title_substring(
                domain,
                &series.series_name,
                &source.id,
                MATCHES_PER_TITLE,
            ),
        )
        .await
        {
            Ok(matches) => matches,
            Err(e) => {
                tracing::warn!(
                    domain = %domain,
                    item_id = %source.id,
                    series = %series.series_name,
                    error = %e,
                    "Sequel lookup failed, skipping item"
                );
                search.degraded = true;
                continue;
            }
        };

        let mut scored: Vec<Candidate> = matches
            .into_iter()
            .filter(|item| item.id != source.id && !seen.contains(&item.id))
            .map(|item| Candidate {
                id: item.id.clone(),
                domain,
                score: metadata_similarity(source, &item, domain),
                source: CandidateSource::Sequel,
                item: Some(item),
            })
            .collect();
        sort_by_score_desc(&mut scored);

        let mut accepted_here = 0;
        for candidate in scored {
            if accepted_here >= MAX_PER_SOURCE || search.candidates.len() >= limit {
                break;
            }
            if seen.accept(&candidate.id) {
                accepted_here += 1;
                search.candidates.push(candidate);
            }
        }

        tracing::debug!(
            domain = %domain,
            item_id = %source.id,
            series = %series.series_name,
            accepted = accepted_here,
            "Sequel lookup complete"
        );
    }

    sort_by_score_desc(&mut search.candidates);
    search
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::content::MockContentRepository,
        error::AppError,
        models::{ContentAttributes, ContentId, OwnedIds, UserLibrary},
    };

    const TIMEOUT: Duration = Duration::from_secs(1);

    fn item(id: &str, title: &str, genres: &[&str]) -> ContentItem {
        ContentItem {
            attributes: ContentAttributes {
                genres: genres.iter().map(|g| g.to_string()).collect(),
                ..ContentAttributes::default()
            },
            ..ContentItem::new(id, Domain::Movie, title)
        }
    }

    fn library(owned: &[&str]) -> UserLibrary {
        UserLibrary::new(
            OwnedIds {
                movie: owned.iter().map(|id| ContentId::from(*id)).collect(),
                ..OwnedIds::default()
            },
            Vec::new(),
        )
    }

    #[tokio::test]
    async fn test_sequels_scored_and_owned_dropped() {
        let mut content = MockContentRepository::new();
        content
            .expect_find_by_title_substring()
            .withf(|_, pattern, exclude, limit| {
                pattern == "The Matrix" && exclude.as_str() == "m1" && *limit == MATCHES_PER_TITLE
            })
            .returning(|_, _, _, _| {
                Ok(vec![
                    item("m2", "The Matrix Reloaded", &["drama"]),
                    item("m3", "The Matrix Revolutions", &["scifi"]),
                    item("m4", "The Matrix Resurrections", &["scifi"]),
                ])
            });

        let owned = vec![item("m1", "The Matrix 2", &["scifi"])];
        let library = library(&["m1", "m4"]);
        let mut seen = SeenIds::new(&library, Domain::Movie);

        let search = find_sequels(&content, &owned, Domain::Movie, &mut seen, 10, TIMEOUT).await;

        let ids: Vec<&str> = search.candidates.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["m3", "m2"]);
        assert!(search.candidates.iter().all(|c| c.source == CandidateSource::Sequel));
        assert!(search.candidates[0].score > search.candidates[1].score);
        assert!(!search.degraded);
        assert!(seen.contains(&ContentId::from("m3")));
    }

    #[tokio::test]
    async fn test_at_most_three_per_source_item() {
        let mut content = MockContentRepository::new();
        content.expect_find_by_title_substring().returning(|_, _, _, _| {
            Ok((2..=6)
                .map(|n| item(&format!("r{}", n), &format!("Rocky {}", n), &[]))
                .collect())
        });

        let owned = vec![item("r1", "Rocky II", &[])];
        let library = library(&["r1"]);
        let mut seen = SeenIds::new(&library, Domain::Movie);

        let search = find_sequels(&content, &owned, Domain::Movie, &mut seen, 10, TIMEOUT).await;

        let ids: Vec<&str> = search.candidates.iter().map(|c| c.id.as_str()).collect();
        // Equal scores keep discovery order
        assert_eq!(ids, vec!["r2", "r3", "r4"]);
    }

    #[tokio::test]
    async fn test_stops_at_ten_per_domain() {
        let mut content = MockContentRepository::new();
        content
            .expect_find_by_title_substring()
            .returning(|_, pattern: &str, _, _| {
                Ok((1..=5)
                    .map(|n| {
                        item(&format!("{}-{}", pattern, n), &format!("{} {}", pattern, n), &[])
                    })
                    .collect())
            });

        let owned: Vec<ContentItem> = (0..6)
            .map(|n| item(&format!("own{}", n), &format!("Franchise{} 1", n), &[]))
            .collect();
        let library = library(&[]);
        let mut seen = SeenIds::new(&library, Domain::Movie);

        let search = find_sequels(&content, &owned, Domain::Movie, &mut seen, 50, TIMEOUT).await;
        assert_eq!(search.candidates.len(), MAX_SEQUELS);
    }

    #[tokio::test]
    async fn test_limit_below_ten_is_respected() {
        let mut content = MockContentRepository::new();
        content.expect_find_by_title_substring().returning(|_, _, _, _| {
            Ok(vec![item("b2", "Blade 2", &[]), item("b3", "Blade 3", &[])])
        });

        let owned = vec![item("b1", "Blade", &[])];
        let library = library(&[]);
        let mut seen = SeenIds::new(&library, Domain::Movie);

        let search = find_sequels(&content, &owned, Domain::Movie, &mut seen, 1, TIMEOUT).await;
        assert_eq!(search.candidates.len(), 1);
    }

    #[tokio::test]
    async fn test_undetected_titles_are_skipped() {
        let mut content = MockContentRepository::new();
        content.expect_find_by_title_substring().never();

        let owned = vec![item("u1", "Up", &[])];
        let library = library(&["u1"]);
        let mut seen = SeenIds::new(&library, Domain::Movie);

        let search = find_sequels(&content, &owned, Domain::Movie, &mut seen, 10, TIMEOUT).await;
        assert!(search.candidates.is_empty());
    }

    #[tokio::test]
    async fn test_failed_lookup_degrades_but_continues() {
        let mut content = MockContentRepository::new();
        content
            .expect_find_by_title_substring()
            .withf(|_, pattern, _, _| pattern == "Alien")
            .returning(|_, _, _, _| Err(AppError::Internal("db down".to_string())));
        content
            .expect_find_by_title_substring()
            .withf(|_, pattern, _, _| pattern == "Predator")
            .returning(|_, _, _, _| Ok(vec![item("p2", "Predator 2", &[])]));

        let owned = vec![item("a1", "Alien 3", &[]), item("p1", "Predator", &[])];
        let library = library(&["a1", "p1"]);
        let mut seen = SeenIds::new(&library, Domain::Movie);

        let search = find_sequels(&content, &owned, Domain::Movie, &mut seen, 10, TIMEOUT).await;
        assert!(search.degraded);
        assert_eq!(search.candidates.len(), 1);
        assert_eq!(search.candidates[0].id.as_str(), "p2");
    }

    #[tokio::test]
    async fn test_candidate_found_twice_is_kept_once() {
        let mut content = MockContentRepository::new();
        content
            .expect_find_by_title_substring()
            .returning(|_, _, _, _| Ok(vec![item("s3", "Scream 3", &[])]));

        let owned = vec![item("s1", "Scream 1", &[]), item("s2", "Scream 2", &[])];
        let library = library(&["s1", "s2"]);
        let mut seen = SeenIds::new(&library, Domain::Movie);

        let search = find_sequels(&content, &owned, Domain::Movie, &mut seen, 10, TIMEOUT).await;
        assert_eq!(search.candidates.len(), 1);
    }
}
