use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};

use crate::{
    auth::{
        dto::{AdminRegisterRequest, AuthResponse, LoginRequest, MeResponse, RegisterRequest},
        extractors::AuthUser,
        jwt::JwtKeys,
        repo_types::User,
        services::{self, Credentials, Registration},
    },
    error::{AppError, AppResult},
    extract::AppJson,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/admin/register", post(admin_register))
        .route("/auth/admin/login", post(admin_login))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/auth/me", get(get_me))
}

fn respond(
    state: &AppState,
    user: User,
    admin_session: bool,
    message: &'static str,
) -> AppResult<Json<AuthResponse>> {
    let token = JwtKeys::from_ref(state).sign(&user, admin_session)?;
    Ok(Json(AuthResponse {
        message,
        user: user.into(),
        token,
    }))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    let reg = Registration::try_from(payload)?;
    let user = services::register(&state.db, reg, false).await?;
    let body = respond(&state, user, false, "User registered successfully")?;
    Ok((StatusCode::CREATED, body))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let creds = Credentials::try_from(payload)?;
    let user = services::authenticate(&state.db, &creds).await?;
    info!(user_id = %user.id, email = %user.email, "user logged in");
    respond(&state, user, false, "Login successful")
}

#[instrument(skip(state, payload))]
pub async fn admin_register(
    State(state): State<AppState>,
    AppJson(payload): AppJson<AdminRegisterRequest>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    let key = state.config.admin_registration_key.as_deref();
    let user = services::register_admin(&state.db, key, payload).await?;
    let body = respond(&state, user, true, "Admin registered successfully")?;
    Ok((StatusCode::CREATED, body))
}

#[instrument(skip(state, payload))]
pub async fn admin_login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let creds = Credentials::try_from(payload)?;
    let user = services::authenticate_admin(&state.db, &creds).await?;
    info!(user_id = %user.id, email = %user.email, "admin logged in");
    respond(&state, user, true, "Admin login successful")
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<MeResponse>> {
    let user = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or(AppError::Unauthorized("Invalid token. User not found."))?;
    Ok(Json(MeResponse { user: user.into() }))
}
