use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};

use crate::error::AppError;

/// One of the four content categories a user can track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    Movie,
    Tv,
    Anime,
    Game,
}

impl Domain {
    /// All domains in the fixed order used for combined results
    pub const ALL: [Domain; 4] = [Domain::Movie, Domain::Tv, Domain::Anime, Domain::Game];

    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Movie => "movie",
            Domain::Tv => "tv",
            Domain::Anime => "anime",
            Domain::Game => "game",
        }
    }

    /// Value of the `type` metadata field in the vector index
    pub fn index_type(&self) -> &'static str {
        match self {
            Domain::Movie => "movie",
            Domain::Tv => "tvseries",
            Domain::Anime => "anime",
            Domain::Game => "game",
        }
    }
}

impl Display for Domain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Domain {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "movie" | "movies" => Ok(Domain::Movie),
            "tv" | "tvseries" | "tv-series" => Ok(Domain::Tv),
            "anime" | "animes" => Ok(Domain::Anime),
            "game" | "games" => Ok(Domain::Game),
            "" => Err(AppError::InvalidInput("Domain cannot be empty".to_string())),
            other => Err(AppError::InvalidInput(format!(
                "Unknown domain '{}'. Must be one of: movie, tv, anime, game",
                other
            ))),
        }
    }
}

/// Domain-scoped opaque content identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentId(pub String);

impl ContentId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ContentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ContentId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ContentId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Attribute lists used for similarity scoring
///
/// Each domain only populates the lists it has; the rest stay empty.
/// `actors` keeps billing order so the leading cast can be compared.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentAttributes {
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub studios: Vec<String>,
    #[serde(default)]
    pub production_companies: Vec<String>,
    #[serde(default)]
    pub actors: Vec<String>,
    #[serde(default)]
    pub platforms: Vec<String>,
    #[serde(default)]
    pub developers: Vec<String>,
    #[serde(default)]
    pub networks: Vec<String>,
    #[serde(default)]
    pub demographics: Vec<String>,
    #[serde(default)]
    pub themes: Vec<String>,
}

/// A content record as read from the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: ContentId,
    pub domain: Domain,
    pub title: String,
    #[serde(default)]
    pub title_en: Option<String>,
    #[serde(default)]
    pub title_original: Option<String>,
    #[serde(default)]
    pub attributes: ContentAttributes,
}

impl ContentItem {
    pub fn new(id: impl Into<ContentId>, domain: Domain, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            domain,
            title: title.into(),
            title_en: None,
            title_original: None,
            attributes: ContentAttributes::default(),
        }
    }

    /// Title used for franchise detection: original, then English, then display title
    pub fn primary_title(&self) -> &str {
        [self.title_original.as_deref(), self.title_en.as_deref()]
            .into_iter()
            .flatten()
            .find(|t| !t.trim().is_empty())
            .unwrap_or(&self.title)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_from_str() {
        assert_eq!("movie".parse::<Domain>().unwrap(), Domain::Movie);
        assert_eq!("TV".parse::<Domain>().unwrap(), Domain::Tv);
        assert_eq!("tvseries".parse::<Domain>().unwrap(), Domain::Tv);
        assert_eq!("games".parse::<Domain>().unwrap(), Domain::Game);
    }

    #[test]
    fn test_domain_from_str_rejects_unknown_and_empty() {
        assert!(matches!(
            "book".parse::<Domain>(),
            Err(AppError::InvalidInput(_))
        ));
        assert!(matches!("  ".parse::<Domain>(), Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn test_domain_index_type() {
        assert_eq!(Domain::Tv.index_type(), "tvseries");
        assert_eq!(Domain::Anime.index_type(), "anime");
    }

    #[test]
    fn test_domain_serialization() {
        assert_eq!(serde_json::to_string(&Domain::Tv).unwrap(), "\"tv\"");
        assert_eq!(serde_json::to_string(&Domain::Game).unwrap(), "\"game\"");
    }

    #[test]
    fn test_content_id_is_transparent() {
        let id = ContentId::from("tt0133093");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"tt0133093\"");
    }

    #[test]
    fn test_primary_title_prefers_original() {
        let mut item = ContentItem::new("a1", Domain::Anime, "Attack on Titan");
        item.title_en = Some("Attack on Titan".to_string());
        item.title_original = Some("Shingeki no Kyojin".to_string());
        assert_eq!(item.primary_title(), "Shingeki no Kyojin");

        item.title_original = Some("   ".to_string());
        assert_eq!(item.primary_title(), "Attack on Titan");

        let plain = ContentItem::new("m1", Domain::Movie, "Heat");
        assert_eq!(plain.primary_title(), "Heat");
    }
}
