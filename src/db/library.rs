use sqlx::PgPool;

use crate::{
    error::AppResult,
    models::{ContentId, Domain, OwnedIds},
};

/// Source of a user's list memberships
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait LibrarySource: Send + Sync {
    /// Identifiers in any of the user's lists, per domain, oldest entry first
    async fn owned_ids_by_domain(&self, user_id: &str) -> AppResult<OwnedIds>;

    /// Identifiers the user marked as not interested
    async fn not_interested_ids(&self, user_id: &str) -> AppResult<Vec<ContentId>>;
}

/// Postgres-backed user lists
#[derive(Clone)]
pub struct PgLibrarySource {
    pool: PgPool,
}

impl PgLibrarySource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl LibrarySource for PgLibrarySource {
    async fn owned_ids_by_domain(&self, user_id: &str) -> AppResult<OwnedIds> {
        let rows: Vec<(String, String)> = sqlx::query_as(
            r#"
            SELECT domain, content_id
            FROM user_list_entries
            WHERE user_id = $1
            ORDER BY created_at, content_id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let mut owned = OwnedIds::default();
        for (domain, content_id) in rows {
            match domain.parse::<Domain>() {
                Ok(domain) => owned.for_domain_mut(domain).push(ContentId(content_id)),
                Err(_) => {
                    tracing::warn!(
                        user_id = %user_id,
                        domain = %domain,
                        content_id = %content_id,
                        "Skipping list entry with unknown domain"
                    );
                }
            }
        }

        Ok(owned)
    }

    async fn not_interested_ids(&self, user_id: &str) -> AppResult<Vec<ContentId>> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT content_id FROM not_interested WHERE user_id = $1")
                .bind(user_id)
                .fetch_all(&self.pool)
                .await?;

        Ok(rows.into_iter().map(|(id,)| ContentId(id)).collect())
    }
}
