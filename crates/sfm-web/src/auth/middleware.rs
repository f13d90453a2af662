use std::convert::Infallible;

use axum::extract::{FromRequestParts, OptionalFromRequestParts};
use axum::http::request::Parts;

use super::cookie::{self, SESSION_COOKIE};
use crate::error::AppError;
use crate::state::AppState;

/// A request carrying a valid, unrevoked session cookie.
///
/// As a plain extractor it rejects with a redirect to `/auth`; as
/// `Option<AuthUser>` it never rejects.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub sub: String,
    pub jti: String,
    pub exp: u64,
}

impl AuthUser {
    fn authenticate(parts: &Parts, state: &AppState) -> Option<Self> {
        let token = cookie::read(&parts.headers, SESSION_COOKIE)?;

        let claims = match super::jwt::verify_token(&state.config.auth.cookie_secret, token) {
            Ok(claims) => claims,
            Err(e) => {
                tracing::debug!("Rejected session cookie: {e}");
                return None;
            }
        };

        if state.revoked_tokens.contains_key(&claims.jti) {
            tracing::debug!("Rejected revoked session {}", claims.jti);
            return None;
        }

        Some(AuthUser {
            sub: claims.sub,
            jti: claims.jti,
            exp: claims.exp,
        })
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Self::authenticate(parts, state).ok_or(AppError::Unauthorized)
    }
}

impl OptionalFromRequestParts<AppState> for AuthUser {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(Self::authenticate(parts, state))
    }
}
