use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::CookieJar;

use crate::error::AppError;
use crate::state::AppState;
use crate::utils::{csrf, jwt};

/// Cookie holding the signed session token.
pub const SESSION_COOKIE: &str = "session";

/// Logged-in administrator, taken from the `session` cookie or an
/// `Authorization: Bearer <token>` header.
///
/// Add this as a handler parameter to require a login. State-changing
/// handlers must also call [`AdminSession::verify_csrf`].
pub struct AdminSession {
    pub user_id: i32,
    pub username: String,
    /// CSRF token bound to this session.
    pub csrf_token: String,
    header_csrf: Option<String>,
}

impl AdminSession {
    /// Accept the form-field token, falling back to the `X-CSRF-Token` header.
    pub fn verify_csrf(&self, form_token: Option<&str>) -> Result<(), AppError> {
        let presented = form_token
            .or(self.header_csrf.as_deref())
            .ok_or(AppError::CsrfInvalid)?;
        if csrf::matches(&self.csrf_token, presented) {
            Ok(())
        } else {
            Err(AppError::CsrfInvalid)
        }
    }
}

impl FromRequestParts<AppState> for AdminSession {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);

        let token = match jar.get(SESSION_COOKIE) {
            Some(cookie) => cookie.value().to_string(),
            None => parts
                .headers
                .get("Authorization")
                .and_then(|v| v.to_str().ok())
                .ok_or(AppError::TokenMissing)?
                .strip_prefix("Bearer ")
                .ok_or(AppError::TokenInvalid)?
                .to_string(),
        };

        let secret = &state.config.auth.jwt_secret;
        let claims = jwt::verify(&token, secret).map_err(|_| AppError::TokenInvalid)?;

        let header_csrf = parts
            .headers
            .get(csrf::HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        Ok(AdminSession {
            user_id: claims.uid,
            username: claims.sub,
            csrf_token: csrf::token_for(secret, &claims.sid),
            header_csrf,
        })
    }
}
