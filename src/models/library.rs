use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::{ContentId, Domain};

/// Owned content identifiers per domain, in list order, as returned by the library source
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OwnedIds {
    #[serde(default)]
    pub movie: Vec<ContentId>,
    #[serde(default)]
    pub tv: Vec<ContentId>,
    #[serde(default)]
    pub anime: Vec<ContentId>,
    #[serde(default)]
    pub game: Vec<ContentId>,
}

impl OwnedIds {
    pub fn for_domain(&self, domain: Domain) -> &[ContentId] {
        match domain {
            Domain::Movie => &self.movie,
            Domain::Tv => &self.tv,
            Domain::Anime => &self.anime,
            Domain::Game => &self.game,
        }
    }

    pub fn for_domain_mut(&mut self, domain: Domain) -> &mut Vec<ContentId> {
        match domain {
            Domain::Movie => &mut self.movie,
            Domain::Tv => &mut self.tv,
            Domain::Anime => &mut self.anime,
            Domain::Game => &mut self.game,
        }
    }
}

/// Everything a user already has or dismissed, used to exclude candidates
#[derive(Debug, Clone, Default)]
pub struct UserLibrary {
    ordered: OwnedIds,
    movie: HashSet<ContentId>,
    tv: HashSet<ContentId>,
    anime: HashSet<ContentId>,
    game: HashSet<ContentId>,
    not_interested: HashSet<ContentId>,
}

impl UserLibrary {
    /// Builds the lookup sets, dropping blank and repeated identifiers while keeping list order
    pub fn new(owned: OwnedIds, not_interested: impl IntoIterator<Item = ContentId>) -> Self {
        let mut library = Self {
            not_interested: not_interested
                .into_iter()
                .filter(|id| !id.as_str().is_empty())
                .collect(),
            ..Self::default()
        };

        for domain in Domain::ALL {
            for id in owned.for_domain(domain) {
                if id.as_str().is_empty() {
                    continue;
                }
                if library.set_mut(domain).insert(id.clone()) {
                    library.ordered.for_domain_mut(domain).push(id.clone());
                }
            }
        }

        library
    }

    fn set_mut(&mut self, domain: Domain) -> &mut HashSet<ContentId> {
        match domain {
            Domain::Movie => &mut self.movie,
            Domain::Tv => &mut self.tv,
            Domain::Anime => &mut self.anime,
            Domain::Game => &mut self.game,
        }
    }

    pub fn owned_set(&self, domain: Domain) -> &HashSet<ContentId> {
        match domain {
            Domain::Movie => &self.movie,
            Domain::Tv => &self.tv,
            Domain::Anime => &self.anime,
            Domain::Game => &self.game,
        }
    }

    /// Owned identifiers in list order
    pub fn owned_ids(&self, domain: Domain) -> &[ContentId] {
        self.ordered.for_domain(domain)
    }

    pub fn owns(&self, domain: Domain, id: &ContentId) -> bool {
        self.owned_set(domain).contains(id)
    }

    /// True when the user owns or dismissed the item
    pub fn excludes(&self, domain: Domain, id: &ContentId) -> bool {
        self.owns(domain, id) || self.not_interested.contains(id)
    }

    /// Total number of owned items across domains
    pub fn total_owned(&self) -> usize {
        Domain::ALL.iter().map(|d| self.owned_set(*d).len()).sum()
    }
}
