use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{
    dto::{RecipeDetails, RecipeListItem, RecipeRequest},
    repo,
    services::{create_recipe, recipe_details, update_recipe},
};
use crate::{
    auth::CurrentUser,
    catalog::dto::ListFilter,
    error::{AppError, AppResult},
    extract::{AppJson, AppPath, AppQuery},
    images::services::{discard_image, store_recipe_image, UploadItem},
    pagination::{Page, PageParams},
    permissions::{ensure_owner_or_privileged, is_owner_or_privileged},
    state::AppState,
};

pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/recipes", get(list_recipes))
        .route("/recipes/:id", get(get_recipe))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/recipes", post(create))
        .route("/recipes/:id", axum::routing::put(update).delete(remove))
        .route(
            "/recipes/:id/image",
            post(upload_image).layer(DefaultBodyLimit::max(MAX_IMAGE_BYTES)),
        )
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn list_recipes(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppQuery(params): AppQuery<PageParams>,
    AppQuery(filter): AppQuery<ListFilter>,
) -> AppResult<Json<Page<RecipeListItem>>> {
    let owner = filter.mine.then_some(user.id);
    let count = repo::count(&state.db, owner).await?;
    let (limit, offset) = params.resolve(count)?;
    let rows = repo::list(&state.db, owner, limit, offset).await?;
    let page = Page::new(rows, count, &params).map(|r| {
        let can_edit = is_owner_or_privileged(&user, &r);
        RecipeListItem::new(r, can_edit)
    });
    Ok(Json(page))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn get_recipe(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<Json<RecipeDetails>> {
    let recipe = repo::find(&state.db, id)
        .await?
        .ok_or(AppError::NotFound("Recipe"))?;
    let can_edit = is_owner_or_privileged(&user, &recipe);
    Ok(Json(recipe_details(&state, recipe, can_edit).await?))
}

#[instrument(skip(state, user, payload), fields(user_id = %user.id))]
pub async fn create(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppJson(payload): AppJson<RecipeRequest>,
) -> AppResult<impl IntoResponse> {
    let fields = payload.validate()?;
    let recipe = create_recipe(&state, user.id, fields).await?;
    info!(recipe_id = %recipe.id, title = %recipe.title, "recipe created");

    let location = format!("/api/v1/recipes/{}", recipe.id);
    let details = recipe_details(&state, recipe, true).await?;
    Ok((StatusCode::CREATED, [(header::LOCATION, location)], Json(details)))
}

#[instrument(skip(state, user, payload), fields(user_id = %user.id))]
pub async fn update(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<RecipeRequest>,
) -> AppResult<Json<RecipeDetails>> {
    let existing = repo::find(&state.db, id)
        .await?
        .ok_or(AppError::NotFound("Recipe"))?;
    ensure_owner_or_privileged(&user, &existing)?;

    let fields = payload.validate()?;
    let recipe = update_recipe(&state, id, fields).await?;
    info!(recipe_id = %recipe.id, "recipe updated");
    Ok(Json(recipe_details(&state, recipe, true).await?))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn remove(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<StatusCode> {
    let existing = repo::find(&state.db, id)
        .await?
        .ok_or(AppError::NotFound("Recipe"))?;
    ensure_owner_or_privileged(&user, &existing)?;

    let deleted = repo::delete(&state.db, id)
        .await?
        .ok_or(AppError::NotFound("Recipe"))?;
    if let Some(key) = deleted.image.as_deref() {
        discard_image(&state, key).await;
    }
    info!(recipe_id = %id, "recipe deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /recipes/:id/image (multipart, field `image`)
#[instrument(skip(state, user, mp), fields(user_id = %user.id))]
pub async fn upload_image(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppPath(id): AppPath<Uuid>,
    mut mp: Multipart,
) -> AppResult<Json<RecipeDetails>> {
    let existing = repo::find(&state.db, id)
        .await?
        .ok_or(AppError::NotFound("Recipe"))?;
    ensure_owner_or_privileged(&user, &existing)?;

    let mut upload = None;
    while let Some(field) = mp
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
    {
        if field.name() != Some("image") {
            continue;
        }
        let filename = field
            .file_name()
            .map(|s| s.to_string())
            .ok_or_else(|| AppError::Validation("image must be sent as a file".into()))?;
        let content_type = field.content_type().map(|s| s.to_string());
        let body = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        upload = Some(UploadItem {
            filename,
            body,
            content_type,
        });
        break;
    }
    let upload = upload.ok_or_else(|| AppError::Validation("image is required".into()))?;

    let key = store_recipe_image(&state, upload).await?;
    let recipe = match repo::replace_image(&state.db, id, &key).await {
        Ok(Some((recipe, previous))) => {
            if let Some(old) = previous.as_deref() {
                discard_image(&state, old).await;
            }
            recipe
        }
        Ok(None) => {
            discard_image(&state, &key).await;
            return Err(AppError::NotFound("Recipe"));
        }
        Err(e) => {
            warn!(error = %e, %key, "failed to attach image");
            discard_image(&state, &key).await;
            return Err(e.into());
        }
    };
    info!(recipe_id = %id, %key, "recipe image replaced");

    let can_edit = is_owner_or_privileged(&user, &recipe);
    Ok(Json(recipe_details(&state, recipe, can_edit).await?))
}
