use std::collections::HashSet;

use crate::models::{ContentAttributes, ContentItem, Domain};

/// Score every same-franchise pair starts from
const BASE_SCORE: f64 = 0.5;

/// Keeps metadata scores distinguishable from an exact match
const MAX_SCORE: f64 = 0.99;

/// Only the leading cast is compared
const TOP_ACTORS: usize = 3;

type AttributeFn = fn(&ContentAttributes) -> &[String];

fn genres(a: &ContentAttributes) -> &[String] {
    &a.genres
}
fn studios(a: &ContentAttributes) -> &[String] {
    &a.studios
}
fn production_companies(a: &ContentAttributes) -> &[String] {
    &a.production_companies
}
fn top_actors(a: &ContentAttributes) -> &[String] {
    &a.actors[..a.actors.len().min(TOP_ACTORS)]
}
fn platforms(a: &ContentAttributes) -> &[String] {
    &a.platforms
}
fn developers(a: &ContentAttributes) -> &[String] {
    &a.developers
}
fn networks(a: &ContentAttributes) -> &[String] {
    &a.networks
}
fn demographics(a: &ContentAttributes) -> &[String] {
    &a.demographics
}
fn themes(a: &ContentAttributes) -> &[String] {
    &a.themes
}

const ANIME_WEIGHTS: &[(AttributeFn, f64)] = &[
    (genres, 0.15),
    (demographics, 0.15),
    (themes, 0.10),
    (studios, 0.10),
];
const MOVIE_WEIGHTS: &[(AttributeFn, f64)] = &[
    (genres, 0.20),
    (production_companies, 0.10),
    (top_actors, 0.20),
];
const TV_WEIGHTS: &[(AttributeFn, f64)] = &[(genres, 0.20), (networks, 0.15)];
const GAME_WEIGHTS: &[(AttributeFn, f64)] = &[
    (genres, 0.20),
    (platforms, 0.15),
    (developers, 0.10),
];

fn weights(domain: Domain) -> &'static [(AttributeFn, f64)] {
    match domain {
        Domain::Anime => ANIME_WEIGHTS,
        Domain::Movie => MOVIE_WEIGHTS,
        Domain::Tv => TV_WEIGHTS,
        Domain::Game => GAME_WEIGHTS,
    }
}

/// Intersection over union of two string sets
///
/// Returns 0 when either side is empty: missing data is no evidence of
/// similarity. Duplicates within one side are ignored.
pub fn jaccard(a: &[String], b: &[String]) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let a: HashSet<&str> = a.iter().map(String::as_str).collect();
    let b: HashSet<&str> = b.iter().map(String::as_str).collect();

    let intersection = a.intersection(&b).count();
    let union = a.union(&b).count();

    intersection as f64 / union as f64
}

/// Weighted attribute overlap between two items of `domain`, in [0.5, 0.99]
pub fn metadata_similarity(a: &ContentItem, b: &ContentItem, domain: Domain) -> f64 {
    let score = weights(domain)
        .iter()
        .fold(BASE_SCORE, |score, (attribute, weight)| {
            score + weight * jaccard(attribute(&a.attributes), attribute(&b.attributes))
        });

    score.min(MAX_SCORE)
}
