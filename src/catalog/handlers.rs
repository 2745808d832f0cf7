use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use super::{
    dto::{ItemRequest, ItemResponse, ListFilter},
    repo, CatalogKind,
};
use crate::{
    auth::CurrentUser,
    error::{AppError, AppResult},
    extract::{AppJson, AppPath, AppQuery},
    pagination::{Page, PageParams},
    permissions::{ensure_owner_or_privileged, is_owner_or_privileged},
    state::AppState,
};

pub fn routes<K: CatalogKind>() -> Router<AppState> {
    Router::new()
        .route(&format!("/{}", K::PATH), get(list::<K>).post(create::<K>))
        .route(
            &format!("/{}/:id", K::PATH),
            get(detail::<K>).put(update::<K>).delete(remove::<K>),
        )
}

#[instrument(skip(state, user), fields(kind = K::LABEL, user_id = %user.id))]
pub async fn list<K: CatalogKind>(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppQuery(params): AppQuery<PageParams>,
    AppQuery(filter): AppQuery<ListFilter>,
) -> AppResult<Json<Page<ItemResponse>>> {
    let owner = filter.mine.then_some(user.id);
    let count = repo::count::<K>(&state.db, owner).await?;
    let (limit, offset) = params.resolve(count)?;
    let rows = repo::list::<K>(&state.db, owner, limit, offset).await?;
    let page = Page::new(rows, count, &params).map(|item| {
        let can_edit = is_owner_or_privileged(&user, &item);
        ItemResponse::new(item, can_edit)
    });
    Ok(Json(page))
}

#[instrument(skip(state, user, payload), fields(kind = K::LABEL, user_id = %user.id))]
pub async fn create<K: CatalogKind>(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppJson(payload): AppJson<ItemRequest>,
) -> AppResult<impl IntoResponse> {
    let name = payload.validated_name()?;
    let item = repo::insert::<K>(&state.db, user.id, &name).await?;
    info!(id = %item.id, name = %item.name, "{} created", K::LABEL);

    let location = format!("/api/v1/{}/{}", K::PATH, item.id);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(ItemResponse::new(item, true)),
    ))
}

#[instrument(skip(state, user), fields(kind = K::LABEL, user_id = %user.id))]
pub async fn detail<K: CatalogKind>(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<Json<ItemResponse>> {
    let item = repo::find::<K>(&state.db, id)
        .await?
        .ok_or(AppError::NotFound(K::LABEL))?;
    let can_edit = is_owner_or_privileged(&user, &item);
    Ok(Json(ItemResponse::new(item, can_edit)))
}

#[instrument(skip(state, user, payload), fields(kind = K::LABEL, user_id = %user.id))]
pub async fn update<K: CatalogKind>(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<ItemRequest>,
) -> AppResult<Json<ItemResponse>> {
    let item = repo::find::<K>(&state.db, id)
        .await?
        .ok_or(AppError::NotFound(K::LABEL))?;
    ensure_owner_or_privileged(&user, &item)?;

    let name = payload.validated_name()?;
    let item = repo::rename::<K>(&state.db, id, &name)
        .await?
        .ok_or(AppError::NotFound(K::LABEL))?;
    info!(%id, name = %item.name, "{} updated", K::LABEL);
    Ok(Json(ItemResponse::new(item, true)))
}

#[instrument(skip(state, user), fields(kind = K::LABEL, user_id = %user.id))]
pub async fn remove<K: CatalogKind>(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<StatusCode> {
    let item = repo::find::<K>(&state.db, id)
        .await?
        .ok_or(AppError::NotFound(K::LABEL))?;
    ensure_owner_or_privileged(&user, &item)?;

    if !repo::delete::<K>(&state.db, id).await? {
        return Err(AppError::NotFound(K::LABEL));
    }
    info!(%id, "{} deleted", K::LABEL);
    Ok(StatusCode::NO_CONTENT)
}
