use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use super::{
    dto::{AuthResponse, LoginRequest, PublicUser, RefreshRequest, RegisterRequest, UpdateProfileRequest},
    extractors::CurrentUser,
    jwt::JwtKeys,
    repo_types::{User, UserChanges},
    services::{authenticate, create_user, UserExtra},
};
use crate::{
    error::{AppError, AppResult},
    extract::AppJson,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me).patch(update_me))
}

fn issue_tokens(state: &AppState, user: User) -> AppResult<AuthResponse> {
    let keys = JwtKeys::from_ref(state);
    let access_token = keys.sign_access(user.id)?;
    let refresh_token = keys.sign_refresh(user.id)?;
    Ok(AuthResponse {
        access_token,
        refresh_token,
        user: user.into(),
    })
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    let extra = UserExtra {
        first_name: payload.first_name,
        last_name: payload.last_name,
        ..UserExtra::default()
    };
    let user = create_user(&state.db, &payload.email, &payload.password, extra).await?;
    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((StatusCode::CREATED, Json(issue_tokens(&state, user)?)))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let user = authenticate(&state.db, &payload.email, &payload.password).await?;
    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(Json(issue_tokens(&state, user)?))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RefreshRequest>,
) -> AppResult<Json<AuthResponse>> {
    let keys = JwtKeys::from_ref(&state);
    let claims = keys.verify_refresh(&payload.refresh_token).map_err(|e| {
        warn!(error = %e, "refresh rejected");
        AppError::Unauthorized("Invalid or expired refresh token".into())
    })?;

    let user = match User::find_by_id(&state.db, claims.sub).await? {
        Some(u) if u.is_active => u,
        _ => return Err(AppError::Unauthorized("User not found".into())),
    };
    Ok(Json(issue_tokens(&state, user)?))
}

#[instrument(skip(user), fields(user_id = %user.id))]
pub async fn get_me(CurrentUser(user): CurrentUser) -> Json<PublicUser> {
    Json(user.into())
}

#[instrument(skip(state, user, payload), fields(user_id = %user.id))]
pub async fn update_me(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppJson(payload): AppJson<UpdateProfileRequest>,
) -> AppResult<Json<PublicUser>> {
    let changes = UserChanges {
        first_name: payload.first_name.map(|s| s.trim().to_string()),
        last_name: payload.last_name.map(|s| s.trim().to_string()),
        ..UserChanges::default()
    };
    let updated = User::update(&state.db, user.id, &changes)
        .await?
        .ok_or(AppError::NotFound("User"))?;
    info!(user_id = %updated.id, "profile updated");
    Ok(Json(updated.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permissions::tests::user;

    #[tokio::test]
    async fn issued_tokens_belong_to_user() {
        let state = AppState::fake();
        let u = user(false, false);
        let id = u.id;
        let resp = issue_tokens(&state, u).unwrap();
        let keys = JwtKeys::from_ref(&state);
        assert_eq!(keys.verify_access(&resp.access_token).unwrap().sub, id);
        assert_eq!(keys.verify_refresh(&resp.refresh_token).unwrap().sub, id);
        assert_eq!(resp.user.id, id);
    }

    #[test]
    fn public_user_hides_password_hash() {
        let mut u = user(true, false);
        u.password_hash = "$argon2id$secret".into();
        let json = serde_json::to_string(&PublicUser::from(u)).unwrap();
        assert!(json.contains("test@domain.com"));
        assert!(json.contains("\"is_staff\":true"));
        assert!(!json.contains("argon2"));
    }

    #[test]
    fn profile_update_rejects_flag_fields() {
        let err = serde_json::from_str::<UpdateProfileRequest>(r#"{"is_staff": true}"#);
        assert!(err.is_err());
        let ok: UpdateProfileRequest = serde_json::from_str(r#"{"first_name": "Ada"}"#).unwrap();
        assert_eq!(ok.first_name.as_deref(), Some("Ada"));
        assert!(ok.last_name.is_none());
    }
}
