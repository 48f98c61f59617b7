use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    typed_header::TypedHeaderRejection,
    TypedHeader,
};
use serde_json::{json, Value};

use crate::error::{AppError, Result};
use crate::middleware::auth::{authenticate, AuthUser};
use crate::models::{CreateUser, LoginCredentials, PublicUser};
use crate::repositories::{RevokedTokenRepository, UserRepository};
use crate::token::TokenService;

#[derive(Clone)]
pub struct AuthState {
    pub user_repo: UserRepository,
    pub token_repo: RevokedTokenRepository,
    pub tokens: TokenService,
}

pub async fn welcome() -> Json<Value> {
    Json(json!({ "message": "Welcome to the Workout API!" }))
}

pub async fn register(
    State(state): State<AuthState>,
    payload: std::result::Result<Json<CreateUser>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>)> {
    let Json(form) = payload?;
    form.validate()?;

    let user = state
        .user_repo
        .create(&form.username, &form.email, &form.password)
        .await?;
    let token = state.tokens.issue(user.id)?;

    tracing::info!(user_id = user.id, username = %user.username, "Registered user");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "User registered successfully",
            "token": token,
        })),
    ))
}

pub async fn login(
    State(state): State<AuthState>,
    payload: std::result::Result<Json<LoginCredentials>, JsonRejection>,
) -> Result<Json<Value>> {
    let Json(credentials) = payload?;
    credentials.validate()?;

    let user = state
        .user_repo
        .verify_password(&credentials.username, &credentials.password)
        .await?
        .ok_or(AppError::InvalidCredentials)?;
    let token = state.tokens.issue(user.id)?;

    tracing::info!(user_id = user.id, "User logged in");

    Ok(Json(json!({
        "message": "Logged in successfully",
        "token": token,
    })))
}

/// Revoke the token used for this request until it would have expired.
pub async fn logout(State(state): State<AuthState>, auth_user: AuthUser) -> Result<Json<Value>> {
    state
        .token_repo
        .revoke(
            &auth_user.claims.jti.to_string(),
            auth_user.claims.expires_at(),
        )
        .await?;

    tracing::info!(user_id = auth_user.id, "User logged out");

    Ok(Json(json!({ "message": "Logged out successfully" })))
}

/// Optional authentication: a request without a token is simply not
/// authenticated, while a malformed or invalid token is rejected.
pub async fn check_session(
    State(state): State<AuthState>,
    bearer: std::result::Result<
        Option<TypedHeader<Authorization<Bearer>>>,
        TypedHeaderRejection,
    >,
) -> Result<Json<Value>> {
    let Some(TypedHeader(Authorization(bearer))) = bearer.map_err(|_| AppError::Unauthorized)?
    else {
        return Ok(Json(json!({ "isAuthenticated": false })));
    };

    let auth_user = authenticate(&state, bearer.token()).await?;

    match state.user_repo.find_by_id(auth_user.id).await? {
        Some(user) => Ok(Json(json!({
            "isAuthenticated": true,
            "token": state.tokens.issue(user.id)?,
            "user": PublicUser::from(&user),
        }))),
        None => Ok(Json(json!({ "isAuthenticated": false }))),
    }
}
