use std::marker::PhantomData;

use async_trait::async_trait;
use chrono::Utc;
use common::{ArticleId, UserId};
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::Query;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

use crate::{Record, Result, SoftDeleteStore, StoreError};

/// A query under construction against PostgreSQL.
pub type PgQuery<'q> = Query<'q, Postgres, PgArguments>;

/// Columns shared by every soft-deletable table, in insert order.
const BASE_COLUMNS: [&str; 6] = [
    "id",
    "user_id",
    "article_id",
    "created_at",
    "updated_at",
    "deleted_at",
];

/// Table mapping for a record stored in PostgreSQL.
///
/// Every table carries the base columns. `EXTRA_COLUMNS` lists the
/// record-specific ones; they are inserted after the base columns and are the
/// only columns `update` rewrites.
pub trait PgRecord: Record {
    const TABLE: &'static str;

    const EXTRA_COLUMNS: &'static [&'static str];

    /// Builds a record from a row selected with all base and extra columns.
    fn from_row(row: &PgRow) -> std::result::Result<Self, sqlx::Error>;

    /// Binds the values of `EXTRA_COLUMNS`, in order.
    fn bind_extra<'q>(&self, query: PgQuery<'q>) -> PgQuery<'q>;
}

/// PostgreSQL-backed soft-delete store.
///
/// The deletion marker is the nullable `deleted_at` column. Uniqueness per
/// `(user_id, article_id)` is left to a partial unique index on the table;
/// violations surface as `Conflict`.
pub struct PostgresStore<R> {
    pool: PgPool,
    _record: PhantomData<fn() -> R>,
}

impl<R> Clone for PostgresStore<R> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            _record: PhantomData,
        }
    }
}

impl<R: PgRecord> PostgresStore<R>
where
    R::Id: Into<Uuid>,
{
    /// Creates a new PostgreSQL store.
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            _record: PhantomData,
        }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn columns() -> String {
        BASE_COLUMNS
            .iter()
            .chain(R::EXTRA_COLUMNS)
            .copied()
            .collect::<Vec<_>>()
            .join(", ")
    }

    async fn select_one(&self, sql: &str, binds: (Uuid, Option<Uuid>)) -> Result<Option<R>> {
        let mut query = sqlx::query(sql).bind(binds.0);
        if let Some(second) = binds.1 {
            query = query.bind(second);
        }

        match query.fetch_optional(&self.pool).await? {
            Some(row) => Ok(Some(R::from_row(&row)?)),
            None => Ok(None),
        }
    }

    async fn select_active_by(&self, column: &str, key: Uuid) -> Result<Vec<R>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE {column} = $1 AND deleted_at IS NULL ORDER BY created_at ASC, id ASC",
            Self::columns(),
            R::TABLE,
        );

        let rows = sqlx::query(&sql).bind(key).fetch_all(&self.pool).await?;
        Ok(rows
            .iter()
            .map(R::from_row)
            .collect::<std::result::Result<Vec<_>, _>>()?)
    }

    async fn soft_delete_by(&self, column: &str, key: Uuid) -> Result<u64> {
        let sql = format!(
            "UPDATE {} SET deleted_at = $2 WHERE {column} = $1 AND deleted_at IS NULL",
            R::TABLE,
        );

        let result = sqlx::query(&sql)
            .bind(key)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        tracing::debug!(table = R::TABLE, column, %key, affected = result.rows_affected(), "soft deleted rows");
        Ok(result.rows_affected())
    }

    async fn restore_by(&self, column: &str, key: Uuid) -> Result<u64> {
        let sql = format!(
            "UPDATE {} SET deleted_at = NULL, updated_at = $2 WHERE {column} = $1 AND deleted_at IS NOT NULL",
            R::TABLE,
        );

        let result = sqlx::query(&sql)
            .bind(key)
            .bind(Utc::now())
            .execute(&self.pool)
            .await
            .map_err(map_write_error::<R>)?;

        tracing::debug!(table = R::TABLE, column, %key, affected = result.rows_affected(), "restored rows");
        Ok(result.rows_affected())
    }
}

/// Maps a write error, turning unique violations into `Conflict`.
fn map_write_error<R: Record>(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(ref db_err) = err
        && db_err.is_unique_violation()
    {
        return StoreError::conflict::<R>(db_err.message().to_string());
    }
    StoreError::Database(err)
}

#[async_trait]
impl<R> SoftDeleteStore<R> for PostgresStore<R>
where
    R: PgRecord,
    R::Id: Into<Uuid>,
{
    async fn create(&self, record: R) -> Result<R> {
        let column_count = BASE_COLUMNS.len() + R::EXTRA_COLUMNS.len();
        let placeholders = (1..=column_count)
            .map(|n| format!("${n}"))
            .collect::<Vec<_>>()
            .join(", ");
        let columns = Self::columns();
        let sql = format!(
            "INSERT INTO {} ({columns}) VALUES ({placeholders}) RETURNING {columns}",
            R::TABLE,
        );

        let id: Uuid = record.id().into();
        let query = sqlx::query(&sql)
            .bind(id)
            .bind(record.user_id().as_uuid())
            .bind(record.article_id().as_uuid())
            .bind(record.created_at())
            .bind(record.updated_at())
            .bind(record.deleted_at());
        let query = record.bind_extra(query);

        let row = query
            .fetch_one(&self.pool)
            .await
            .map_err(map_write_error::<R>)?;
        Ok(R::from_row(&row)?)
    }

    async fn get_by_id(&self, id: R::Id) -> Result<R> {
        let sql = format!(
            "SELECT {} FROM {} WHERE id = $1 AND deleted_at IS NULL",
            Self::columns(),
            R::TABLE,
        );

        self.select_one(&sql, (id.into(), None))
            .await?
            .ok_or_else(|| StoreError::not_found::<R>(id))
    }

    async fn get_by_keys_unscoped(
        &self,
        user_id: UserId,
        article_id: ArticleId,
    ) -> Result<Option<R>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE user_id = $1 AND article_id = $2 ORDER BY created_at ASC, id ASC LIMIT 1",
            Self::columns(),
            R::TABLE,
        );

        self.select_one(&sql, (user_id.as_uuid(), Some(article_id.as_uuid())))
            .await
    }

    async fn find_by_user_id(&self, user_id: UserId) -> Result<Vec<R>> {
        self.select_active_by("user_id", user_id.as_uuid()).await
    }

    async fn find_by_article_id(&self, article_id: ArticleId) -> Result<Vec<R>> {
        self.select_active_by("article_id", article_id.as_uuid())
            .await
    }

    async fn update(&self, record: R) -> Result<R> {
        let mut assignments: Vec<String> = R::EXTRA_COLUMNS
            .iter()
            .enumerate()
            .map(|(i, column)| format!("{column} = ${}", i + 2))
            .collect();
        assignments.push(format!("updated_at = ${}", R::EXTRA_COLUMNS.len() + 2));

        let sql = format!(
            "UPDATE {} SET {} WHERE id = $1 AND deleted_at IS NULL RETURNING {}",
            R::TABLE,
            assignments.join(", "),
            Self::columns(),
        );

        let id: Uuid = record.id().into();
        let query = record.bind_extra(sqlx::query(&sql).bind(id));
        let row = query
            .bind(Utc::now())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_write_error::<R>)?
            .ok_or_else(|| StoreError::not_found::<R>(record.id()))?;

        Ok(R::from_row(&row)?)
    }

    async fn restore(&self, id: R::Id) -> Result<R> {
        let sql = format!(
            "UPDATE {} SET deleted_at = NULL, updated_at = $2 WHERE id = $1 RETURNING {}",
            R::TABLE,
            Self::columns(),
        );

        let row = sqlx::query(&sql)
            .bind(Into::<Uuid>::into(id))
            .bind(Utc::now())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_write_error::<R>)?
            .ok_or_else(|| StoreError::not_found::<R>(id))?;

        Ok(R::from_row(&row)?)
    }

    async fn delete_by_id(&self, id: R::Id) -> Result<()> {
        match self.soft_delete_by("id", id.into()).await? {
            0 => Err(StoreError::not_found::<R>(id)),
            _ => Ok(()),
        }
    }

    async fn delete_by_keys(&self, user_id: UserId, article_id: ArticleId) -> Result<u64> {
        let sql = format!(
            "UPDATE {} SET deleted_at = $3 WHERE user_id = $1 AND article_id = $2 AND deleted_at IS NULL",
            R::TABLE,
        );

        let result = sqlx::query(&sql)
            .bind(user_id.as_uuid())
            .bind(article_id.as_uuid())
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn delete_by_user_id(&self, user_id: UserId) -> Result<u64> {
        self.soft_delete_by("user_id", user_id.as_uuid()).await
    }

    async fn delete_by_article_id(&self, article_id: ArticleId) -> Result<u64> {
        self.soft_delete_by("article_id", article_id.as_uuid())
            .await
    }

    async fn restore_by_user_id(&self, user_id: UserId) -> Result<u64> {
        self.restore_by("user_id", user_id.as_uuid()).await
    }

    async fn restore_by_article_id(&self, article_id: ArticleId) -> Result<u64> {
        self.restore_by("article_id", article_id.as_uuid()).await
    }
}
