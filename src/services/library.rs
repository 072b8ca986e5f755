use std::time::Duration;

use super::with_timeout;
use crate::{
    db::LibrarySource,
    error::{AppError, AppResult},
    models::UserLibrary,
};

/// Builds the user's owned and dismissed sets for every domain
///
/// Both lookups run concurrently. Any failure is returned to the caller:
/// without the library, owned content could leak into the results.
pub async fn build_owned_sets(
    source: &dyn LibrarySource,
    user_id: &str,
    call_timeout: Duration,
) -> AppResult<UserLibrary> {
    let (owned, not_interested) = tokio::try_join!(
        with_timeout(call_timeout, "owned list fetch", source.owned_ids_by_domain(user_id)),
        with_timeout(
            call_timeout,
            "not-interested fetch",
            source.not_interested_ids(user_id)
        ),
    )
    .inspect_err(|e| {
        tracing::error!(user_id = %user_id, error = %e, "Failed to build user library")
    })?;

    Ok(UserLibrary::new(owned, not_interested))
}

/// Rejects libraries too small to recommend from
pub fn ensure_min_size(library: &UserLibrary, min_library_size: usize) -> AppResult<()> {
    let total = library.total_owned();
    if total < min_library_size {
        return Err(AppError::InvalidInput(format!(
            "Add at least {} items to your lists to get recommendations ({} so far)",
            min_library_size, total
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::library::MockLibrarySource,
        models::{ContentId, Domain, OwnedIds},
    };

    fn owned() -> OwnedIds {
        OwnedIds {
            movie: vec![ContentId::from("m1"), ContentId::from("m1"), ContentId::from("m2")],
            anime: vec![ContentId::from("a1")],
            ..OwnedIds::default()
        }
    }

    #[tokio::test]
    async fn test_build_owned_sets_combines_sources() {
        let mut source = MockLibrarySource::new();
        source
            .expect_owned_ids_by_domain()
            .times(1)
            .returning(|_| Ok(owned()));
        source
            .expect_not_interested_ids()
            .returning(|_| Ok(vec![ContentId::from("t9")]));

        let library = build_owned_sets(&source, "u1", Duration::from_secs(1))
            .await
            .unwrap();

        assert_eq!(library.owned_ids(Domain::Movie).len(), 2);
        assert!(library.owns(Domain::Anime, &ContentId::from("a1")));
        assert!(library.excludes(Domain::Tv, &ContentId::from("t9")));
        assert_eq!(library.total_owned(), 3);
    }

    #[tokio::test]
    async fn test_build_owned_sets_fails_when_owned_fetch_fails() {
        let mut source = MockLibrarySource::new();
        source
            .expect_owned_ids_by_domain()
            .returning(|_| Err(AppError::Internal("connection reset".to_string())));
        source.expect_not_interested_ids().returning(|_| Ok(Vec::new()));

        let result = build_owned_sets(&source, "u1", Duration::from_secs(1)).await;
        assert!(matches!(result, Err(AppError::Internal(_))));
    }

    #[tokio::test]
    async fn test_build_owned_sets_fails_when_dismissed_fetch_fails() {
        let mut source = MockLibrarySource::new();
        source.expect_owned_ids_by_domain().returning(|_| Ok(owned()));
        source
            .expect_not_interested_ids()
            .returning(|_| Err(AppError::Internal("connection reset".to_string())));

        assert!(build_owned_sets(&source, "u1", Duration::from_secs(1))
            .await
            .is_err());
    }

    #[test]
    fn test_ensure_min_size() {
        let library = UserLibrary::new(owned(), Vec::new());
        assert!(ensure_min_size(&library, 3).is_ok());
        assert!(matches!(
            ensure_min_size(&library, 4),
            Err(AppError::InvalidInput(_))
        ));
    }
}
