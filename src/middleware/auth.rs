use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    typed_header::TypedHeaderRejection,
    TypedHeader,
};

use crate::error::{AppError, Result};
use crate::handlers::auth::AuthState;
use crate::models::Owner;
use crate::token::Claims;

/// The authenticated caller, placed in request extensions by [`require_auth`].
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub id: i64,
    pub claims: Claims,
}

impl AuthUser {
    pub fn owner(&self) -> Owner {
        Owner::user(self.id)
    }
}

/// Validate a bearer token: signature, expiry, and the revocation list.
pub async fn authenticate(state: &AuthState, token: &str) -> Result<AuthUser> {
    let claims = state.tokens.validate(token)?;

    if state.token_repo.is_revoked(&claims.jti.to_string()).await? {
        tracing::debug!(user_id = claims.sub, "Rejected revoked token");
        return Err(AppError::Unauthorized);
    }

    Ok(AuthUser {
        id: claims.sub,
        claims,
    })
}

/// Guards every route it wraps: a missing, malformed, expired or revoked
/// token ends the request with 401.
pub async fn require_auth(
    State(state): State<AuthState>,
    bearer: std::result::Result<TypedHeader<Authorization<Bearer>>, TypedHeaderRejection>,
    mut req: Request,
    next: Next,
) -> Result<Response> {
    let TypedHeader(Authorization(bearer)) = bearer.map_err(|_| AppError::Unauthorized)?;

    let auth_user = authenticate(&state, bearer.token()).await?;
    req.extensions_mut().insert(auth_user);

    Ok(next.run(req).await)
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(AppError::Unauthorized)
    }
}
