pub mod content;
pub mod library;
pub mod recommendation;

pub use content::{ContentAttributes, ContentId, ContentItem, Domain};
pub use library::{OwnedIds, UserLibrary};
pub use recommendation::{
    sort_by_score_desc, Candidate, CandidateSource, DomainRecommendations, RecommendationResult,
    SeriesInfo,
};
