/*
 * Responsibility
 * - smeta CRUD, search and status updates
 * - Every query is scoped by user_id: rows owned by someone else behave as missing
 */
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::PgPool;

use crate::repos::error::RepoError;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SmetaRow {
    pub id: i64,
    pub user_id: i64,
    pub customer_data: Value,
    pub production_data: Value,
    pub installation_data: Value,
    pub additional_options: Value,
    pub geolocation_data: Value,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The five JSON blocks of an estimate, written together.
#[derive(Debug, Clone, Copy)]
pub struct SmetaData<'a> {
    pub customer: &'a Value,
    pub production: &'a Value,
    pub installation: &'a Value,
    pub additional_options: &'a Value,
    pub geolocation: &'a Value,
}

pub async fn create(db: &PgPool, user_id: i64, data: SmetaData<'_>) -> Result<i64, RepoError> {
    let id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO smeta (
            user_id, customer_data, production_data, installation_data,
            additional_options, geolocation_data, status
        )
        VALUES ($1, $2, $3, $4, $5, $6, 'draft')
        RETURNING id
        "#,
    )
    .bind(user_id)
    .bind(data.customer)
    .bind(data.production)
    .bind(data.installation)
    .bind(data.additional_options)
    .bind(data.geolocation)
    .fetch_one(db)
    .await?;

    Ok(id)
}

pub async fn list(
    db: &PgPool,
    user_id: i64,
    limit: i64,
    offset: i64,
) -> Result<Vec<SmetaRow>, RepoError> {
    let rows = sqlx::query_as::<_, SmetaRow>(
        r#"
        SELECT
            id, user_id, customer_data, production_data, installation_data,
            additional_options, geolocation_data, status, created_at, updated_at
        FROM smeta
        WHERE user_id = $1
        ORDER BY created_at DESC, id DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(user_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await?;

    Ok(rows)
}

/// Case-insensitive substring match on `customer.company`.
pub async fn search_by_company(
    db: &PgPool,
    user_id: i64,
    term: &str,
) -> Result<Vec<SmetaRow>, RepoError> {
    // strpos avoids LIKE wildcards in user input
    let rows = sqlx::query_as::<_, SmetaRow>(
        r#"
        SELECT
            id, user_id, customer_data, production_data, installation_data,
            additional_options, geolocation_data, status, created_at, updated_at
        FROM smeta
        WHERE user_id = $1
          AND strpos(lower(COALESCE(customer_data ->> 'company', '')), lower($2)) > 0
        ORDER BY created_at DESC, id DESC
        "#,
    )
    .bind(user_id)
    .bind(term)
    .fetch_all(db)
    .await?;

    Ok(rows)
}

pub async fn get(db: &PgPool, user_id: i64, id: i64) -> Result<Option<SmetaRow>, RepoError> {
    let row = sqlx::query_as::<_, SmetaRow>(
        r#"
        SELECT
            id, user_id, customer_data, production_data, installation_data,
            additional_options, geolocation_data, status, created_at, updated_at
        FROM smeta
        WHERE id = $1 AND user_id = $2
        "#,
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(db)
    .await?;

    Ok(row)
}

pub async fn update(
    db: &PgPool,
    user_id: i64,
    id: i64,
    data: SmetaData<'_>,
    status: Option<&str>,
) -> Result<bool, RepoError> {
    // status: None -> keep the current status
    let result = sqlx::query(
        r#"
        UPDATE smeta
        SET
            customer_data = $3,
            production_data = $4,
            installation_data = $5,
            additional_options = $6,
            geolocation_data = $7,
            status = COALESCE($8, status),
            updated_at = now()
        WHERE id = $1 AND user_id = $2
        "#,
    )
    .bind(id)
    .bind(user_id)
    .bind(data.customer)
    .bind(data.production)
    .bind(data.installation)
    .bind(data.additional_options)
    .bind(data.geolocation)
    .bind(status)
    .execute(db)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn update_status(
    db: &PgPool,
    user_id: i64,
    id: i64,
    status: &str,
) -> Result<bool, RepoError> {
    let result = sqlx::query(
        r#"
        UPDATE smeta
        SET status = $3, updated_at = now()
        WHERE id = $1 AND user_id = $2
        "#,
    )
    .bind(id)
    .bind(user_id)
    .bind(status)
    .execute(db)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn delete(db: &PgPool, user_id: i64, id: i64) -> Result<bool, RepoError> {
    let result = sqlx::query(
        r#"
        DELETE FROM smeta
        WHERE id = $1 AND user_id = $2
        "#,
    )
    .bind(id)
    .bind(user_id)
    .execute(db)
    .await?;

    Ok(result.rows_affected() > 0)
}
