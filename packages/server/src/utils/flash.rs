//! One-shot messages carried to the next request in a cookie.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};

pub const COOKIE_NAME: &str = "flash";

/// Most messages kept pending; older ones are dropped first.
pub const MAX_PENDING: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Flash {
    pub level: FlashLevel,
    pub message: String,
}

impl Flash {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Success,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Error,
            message: message.into(),
        }
    }
}

/// Body of `GET /flash`.
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct FlashResponse {
    pub messages: Vec<Flash>,
}

/// Messages waiting in `jar`. A tampered or garbled cookie reads as empty.
pub fn pending(jar: &CookieJar) -> Vec<Flash> {
    jar.get(COOKIE_NAME)
        .and_then(|c| hex::decode(c.value()).ok())
        .and_then(|raw| serde_json::from_slice(&raw).ok())
        .unwrap_or_default()
}

/// Queue `messages` after any already pending, keeping the newest
/// [`MAX_PENDING`].
pub fn push(jar: CookieJar, messages: impl IntoIterator<Item = Flash>) -> CookieJar {
    let mut all = pending(&jar);
    all.extend(messages);
    if all.len() > MAX_PENDING {
        all.drain(..all.len() - MAX_PENDING);
    }
    let Ok(encoded) = serde_json::to_vec(&all) else {
        return jar;
    };
    jar.add(
        Cookie::build((COOKIE_NAME, hex::encode(encoded)))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax),
    )
}

/// Drain pending messages.
pub fn take(jar: CookieJar) -> (CookieJar, Vec<Flash>) {
    let messages = pending(&jar);
    (jar.remove(Cookie::build(COOKIE_NAME).path("/")), messages)
}
