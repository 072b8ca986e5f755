use sqlx::PgPool;
use std::collections::HashMap;

use crate::{
    error::{AppError, AppResult},
    models::{ContentAttributes, ContentId, ContentItem, Domain},
};

/// Read access to the content catalog, scoped per domain
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ContentRepository: Send + Sync {
    /// Fetches the items with the given identifiers, in the order the identifiers were given
    ///
    /// Unknown identifiers are silently absent from the result.
    async fn find_by_ids(&self, domain: Domain, ids: &[ContentId]) -> AppResult<Vec<ContentItem>>;

    /// Finds up to `limit` items whose title, English title or original title
    /// contains `pattern` case-insensitively, excluding `exclude_id`
    ///
    /// `pattern` is a literal substring, never a matching expression.
    async fn find_by_title_substring(
        &self,
        domain: Domain,
        pattern: &str,
        exclude_id: &ContentId,
        limit: usize,
    ) -> AppResult<Vec<ContentItem>>;
}

/// Escapes `\`, `%` and `_` so the text matches literally inside `LIKE ... ESCAPE '\'`
pub fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// Restores the requested order and drops repeated rows
fn order_by_request(ids: &[ContentId], items: Vec<ContentItem>) -> Vec<ContentItem> {
    let mut by_id: HashMap<ContentId, ContentItem> =
        items.into_iter().map(|item| (item.id.clone(), item)).collect();
    ids.iter().filter_map(|id| by_id.remove(id)).collect()
}

#[derive(Debug, sqlx::FromRow)]
struct ContentRow {
    id: String,
    domain: String,
    title: String,
    title_en: Option<String>,
    title_original: Option<String>,
    genres: Vec<String>,
    studios: Vec<String>,
    production_companies: Vec<String>,
    actors: Vec<String>,
    platforms: Vec<String>,
    developers: Vec<String>,
    networks: Vec<String>,
    demographics: Vec<String>,
    themes: Vec<String>,
}

impl TryFrom<ContentRow> for ContentItem {
    type Error = AppError;

    fn try_from(row: ContentRow) -> Result<Self, Self::Error> {
        let domain = row.domain.parse::<Domain>().map_err(|_| {
            AppError::Internal(format!(
                "Content {} has unknown domain '{}'",
                row.id, row.domain
            ))
        })?;

        Ok(ContentItem {
            id: ContentId(row.id),
            domain,
            title: row.title,
            title_en: row.title_en,
            title_original: row.title_original,
            attributes: ContentAttributes {
                genres: row.genres,
                studios: row.studios,
                production_companies: row.production_companies,
                actors: row.actors,
                platforms: row.platforms,
                developers: row.developers,
                networks: row.networks,
                demographics: row.demographics,
                themes: row.themes,
            },
        })
    }
}

const CONTENT_COLUMNS: &str = "id, domain, title, title_en, title_original, genres, studios, \
     production_companies, actors, platforms, developers, networks, demographics, themes";

/// Postgres-backed content catalog
#[derive(Clone)]
pub struct PgContentRepository {
    pool: PgPool,
}

impl PgContentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl ContentRepository for PgContentRepository {
    async fn find_by_ids(&self, domain: Domain, ids: &[ContentId]) -> AppResult<Vec<ContentItem>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let raw_ids: Vec<String> = ids.iter().map(|id| id.0.clone()).collect();
        let query = format!(
            "SELECT {} FROM content_items WHERE domain = $1 AND id = ANY($2)",
            CONTENT_COLUMNS
        );

        let rows: Vec<ContentRow> = sqlx::query_as(&query)
            .bind(domain.as_str())
            .bind(&raw_ids)
            .fetch_all(&self.pool)
            .await?;

        let items = rows
            .into_iter()
            .map(ContentItem::try_from)
            .collect::<AppResult<Vec<_>>>()?;

        tracing::debug!(
            domain = %domain,
            requested = ids.len(),
            found = items.len(),
            "Fetched content details"
        );

        Ok(order_by_request(ids, items))
    }

    async fn find_by_title_substring(
        &self,
        domain: Domain,
        pattern: &str,
        exclude_id: &ContentId,
        limit: usize,
    ) -> AppResult<Vec<ContentItem>> {
        if pattern.trim().is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        let like = format!("%{}%", escape_like(pattern));
        let query = format!(
            r#"
            SELECT {}
            FROM content_items
            WHERE domain = $1
              AND id <> $2
              AND (title ILIKE $3 ESCAPE '\'
                   OR title_en ILIKE $3 ESCAPE '\'
                   OR title_original ILIKE $3 ESCAPE '\')
            ORDER BY title, id
            LIMIT $4
            "#,
            CONTENT_COLUMNS
        );

        let rows: Vec<ContentRow> = sqlx::query_as(&query)
            .bind(domain.as_str())
            .bind(exclude_id.as_str())
            .bind(like)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(ContentItem::try_from).collect()
    }
}
