use std::collections::HashSet;

use crate::models::{ContentId, Domain, UserLibrary};

/// Identifiers a domain pipeline may no longer recommend
///
/// Starts from the user's owned and dismissed items and grows as candidates
/// are accepted, so the sequel and vector steps never pick the same item twice.
#[derive(Debug)]
pub struct SeenIds<'a> {
    library: &'a UserLibrary,
    domain: Domain,
    selected: HashSet<ContentId>,
}

impl<'a> SeenIds<'a> {
    pub fn new(library: &'a UserLibrary, domain: Domain) -> Self {
        Self {
            library,
            domain,
            selected: HashSet::new(),
        }
    }

    pub fn contains(&self, id: &ContentId) -> bool {
        self.library.excludes(self.domain, id) || self.selected.contains(id)
    }

    /// Marks `id` as selected; false when it was already excluded or selected
    pub fn accept(&mut self, id: &ContentId) -> bool {
        if self.library.excludes(self.domain, id) {
            return false;
        }
        self.selected.insert(id.clone())
    }

    pub fn selected_count(&self) -> usize {
        self.selected.len()
    }
}
