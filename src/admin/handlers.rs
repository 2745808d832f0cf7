use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{
    dto::{AdminUser, CreateUserRequest, UpdateUserRequest},
    services::{build_changes, check_create, check_target},
};
use crate::{
    auth::{
        repo_types::User,
        services::{create_user, UserExtra},
        CurrentUser,
    },
    error::{AppError, AppResult},
    extract::{AppJson, AppPath, AppQuery},
    pagination::{Page, PageParams},
    permissions::require_staff,
    state::AppState,
};

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/users", get(list_users).post(add_user))
        .route("/admin/users/:id", get(get_user).patch(change_user))
}

#[instrument(skip(state, actor), fields(actor_id = %actor.id))]
pub async fn list_users(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    AppQuery(params): AppQuery<PageParams>,
) -> AppResult<Json<Page<AdminUser>>> {
    require_staff(&actor)?;
    let count = User::count(&state.db).await?;
    let (limit, offset) = params.resolve(count)?;
    let users = User::list(&state.db, limit, offset).await?;
    Ok(Json(Page::new(users, count, &params).map(AdminUser::from)))
}

#[instrument(skip(state, actor, payload), fields(actor_id = %actor.id))]
pub async fn add_user(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    AppJson(payload): AppJson<CreateUserRequest>,
) -> AppResult<impl IntoResponse> {
    require_staff(&actor)?;
    check_create(&actor, &payload)?;

    let extra = UserExtra {
        first_name: payload.first_name,
        last_name: payload.last_name,
        is_active: payload.is_active,
        is_staff: payload.is_staff,
        is_superuser: payload.is_superuser,
    };
    let user = create_user(&state.db, &payload.email, &payload.password, extra).await?;
    info!(user_id = %user.id, email = %user.email, "user added by admin");

    let location = format!("/api/v1/admin/users/{}", user.id);
    Ok((StatusCode::CREATED, [(header::LOCATION, location)], Json(AdminUser::from(user))))
}

#[instrument(skip(state, actor), fields(actor_id = %actor.id))]
pub async fn get_user(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<Json<AdminUser>> {
    require_staff(&actor)?;
    let user = User::find_by_id(&state.db, id)
        .await?
        .ok_or(AppError::NotFound("User"))?;
    Ok(Json(user.into()))
}

#[instrument(skip(state, actor, payload), fields(actor_id = %actor.id))]
pub async fn change_user(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<UpdateUserRequest>,
) -> AppResult<Json<AdminUser>> {
    require_staff(&actor)?;
    let target = User::find_by_id(&state.db, id)
        .await?
        .ok_or(AppError::NotFound("User"))?;
    if let Err(e) = check_target(&actor, &target) {
        warn!(%id, "staff edit of a superuser refused");
        return Err(e);
    }
    let changes = build_changes(&actor, payload)?;

    let user = match User::update(&state.db, id, &changes).await {
        Ok(Some(u)) => u,
        Ok(None) => return Err(AppError::NotFound("User")),
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            warn!(%id, "email already registered");
            return Err(AppError::Conflict("Email already registered".into()));
        }
        Err(e) => return Err(e.into()),
    };
    info!(user_id = %user.id, is_active = user.is_active, is_staff = user.is_staff,
          is_superuser = user.is_superuser, "user changed by admin");
    Ok(Json(user.into()))
}
