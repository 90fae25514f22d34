/*
 * Responsibility
 * - /smetas CRUD, search and status
 * - Always scoped to the caller: another user's smeta is indistinguishable from a missing one
 * - Path ids are public (sqids) ids, decoded by the PublicSmetaId extractor
 */
use axum::{
    Json,
    extract::State,
    http::StatusCode,
};
use serde_json::Value;
use tracing::{debug, info};

use crate::{
    api::v1::{
        dto::smetas::{
            CreatedResponse, ListQuery, SearchQuery, SmetaCard, SmetaDetails, SmetaPayload,
            StatusRequest,
        },
        extractors::{CurrentUser, JsonBody, PublicSmetaId, QueryParams},
    },
    error::AppError,
    repos::smeta_repo::{self, SmetaRow},
    services::pricing,
    state::AppState,
};

const UNKNOWN_COMPANY: &str = "Не указано";

fn company(customer: &Value) -> String {
    customer
        .get("company")
        .and_then(Value::as_str)
        .filter(|c| !c.trim().is_empty())
        .unwrap_or(UNKNOWN_COMPANY)
        .to_string()
}

fn to_card(state: &AppState, row: SmetaRow) -> Result<SmetaCard, AppError> {
    Ok(SmetaCard {
        id: state.id_codec.encode(row.id)?,
        company: company(&row.customer_data),
        parameters: pricing::parameters(&row.production_data),
        price: pricing::estimate(&row.production_data),
        status: row.status,
        created_at: row.created_at,
    })
}

fn to_cards(state: &AppState, rows: Vec<SmetaRow>) -> Result<Vec<SmetaCard>, AppError> {
    rows.into_iter().map(|row| to_card(state, row)).collect()
}

pub async fn create_smeta(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    JsonBody(req): JsonBody<SmetaPayload>,
) -> Result<(StatusCode, Json<CreatedResponse>), AppError> {
    req.validate_new().map_err(AppError::validation)?;

    let id = smeta_repo::create(&state.db, user.id, req.data()).await?;

    info!(
        user_id = user.id,
        smeta_id = id,
        company = %company(&req.customer),
        "smeta created"
    );

    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            id: state.id_codec.encode(id)?,
        }),
    ))
}

pub async fn list_smetas(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    QueryParams(q): QueryParams<ListQuery>,
) -> Result<Json<Vec<SmetaCard>>, AppError> {
    let rows = smeta_repo::list(&state.db, user.id, q.limit(), q.offset()).await?;
    debug!(user_id = user.id, count = rows.len(), "smetas listed");

    Ok(Json(to_cards(&state, rows)?))
}

pub async fn search_smetas(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    QueryParams(q): QueryParams<SearchQuery>,
) -> Result<Json<Vec<SmetaCard>>, AppError> {
    let term = q.term().map_err(AppError::validation)?;

    let rows = smeta_repo::search_by_company(&state.db, user.id, term).await?;
    debug!(user_id = user.id, count = rows.len(), "smeta search");

    Ok(Json(to_cards(&state, rows)?))
}

pub async fn get_smeta(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    smeta_id: PublicSmetaId,
) -> Result<Json<SmetaDetails>, AppError> {
    let row = smeta_repo::get(&state.db, user.id, smeta_id.id)
        .await?
        .ok_or(AppError::not_found("smeta"))?;

    let calculated_prices = pricing::detailed(&row.production_data);

    Ok(Json(SmetaDetails {
        id: state.id_codec.encode(row.id)?,
        customer: row.customer_data,
        production: row.production_data,
        installation: row.installation_data,
        additional_options: row.additional_options,
        geolocation: row.geolocation_data,
        status: row.status,
        created_at: row.created_at,
        updated_at: row.updated_at,
        calculated_prices,
    }))
}

pub async fn update_smeta(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    smeta_id: PublicSmetaId,
    JsonBody(req): JsonBody<SmetaPayload>,
) -> Result<StatusCode, AppError> {
    req.validate_shape().map_err(AppError::validation)?;

    let updated = smeta_repo::update(
        &state.db,
        user.id,
        smeta_id.id,
        req.data(),
        req.status.as_deref(),
    )
    .await?;
    if !updated {
        return Err(AppError::not_found("smeta"));
    }

    info!(user_id = user.id, smeta_id = smeta_id.id, "smeta updated");

    Ok(StatusCode::NO_CONTENT)
}

pub async fn update_smeta_status(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    smeta_id: PublicSmetaId,
    JsonBody(req): JsonBody<StatusRequest>,
) -> Result<StatusCode, AppError> {
    req.validate().map_err(AppError::validation)?;

    if !smeta_repo::update_status(&state.db, user.id, smeta_id.id, &req.status).await? {
        return Err(AppError::not_found("smeta"));
    }

    info!(
        user_id = user.id,
        smeta_id = smeta_id.id,
        status = %req.status,
        "smeta status updated"
    );

    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_smeta(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    smeta_id: PublicSmetaId,
) -> Result<StatusCode, AppError> {
    if !smeta_repo::delete(&state.db, user.id, smeta_id.id).await? {
        return Err(AppError::not_found("smeta"));
    }

    info!(user_id = user.id, smeta_id = smeta_id.id, "smeta deleted");

    Ok(StatusCode::NO_CONTENT)
}
