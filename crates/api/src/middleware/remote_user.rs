//! Caller identity supplied by a trusted reverse proxy.
//!
//! The proxy authenticates the user and forwards the username in the
//! configured header (default `x-remote-user`) and the site-admin flag in
//! `x-remote-site-admin`.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use nidb_core::error::CoreError;

use crate::error::AppError;
use crate::state::AppState;

/// Header carrying the site-admin flag (`1` or `true`).
pub const SITE_ADMIN_HEADER: &str = "x-remote-site-admin";

/// The authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteUser {
    pub username: String,
    pub site_admin: bool,
}

impl RemoteUser {
    /// Reject with 403 unless the caller is a site admin.
    pub fn require_site_admin(&self) -> Result<(), AppError> {
        if self.site_admin {
            Ok(())
        } else {
            Err(CoreError::SiteAdminRequired.into())
        }
    }
}

impl FromRequestParts<AppState> for RemoteUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let username = parts
            .headers
            .get(state.config.user_header.as_str())
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .ok_or_else(|| CoreError::MissingUser {
                header: state.config.user_header.clone(),
            })?;

        let site_admin = parts
            .headers
            .get(SITE_ADMIN_HEADER)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true"));

        Ok(RemoteUser {
            username: username.to_string(),
            site_admin,
        })
    }
}
