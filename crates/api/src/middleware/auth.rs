//! Admin authentication middleware.
//!
//! Admin routes require `Authorization: Bearer <token>`. Token verification
//! sits behind [`AdminAuthenticator`] so the scheme can be swapped without
//! touching the routes.

use axum::{
    body::Body,
    extract::State,
    http::{header::AUTHORIZATION, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use shared::jwt::{JwtConfig, JwtError, Role};

use crate::app::AppState;

/// Identity of an authenticated admin, stored in request extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminIdentity {
    pub subject: String,
}

/// Why a credential was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthFailure {
    /// Missing, malformed, expired or forged credential.
    Unauthenticated(&'static str),
    /// Valid credential without admin rights.
    NotAdmin,
}

pub trait AdminAuthenticator: Send + Sync {
    fn authenticate(&self, token: &str) -> Result<AdminIdentity, AuthFailure>;
}

/// HS256 token verification with the configured secret and issuer.
#[derive(Debug, Clone)]
pub struct JwtAdminAuthenticator {
    jwt: JwtConfig,
}

impl JwtAdminAuthenticator {
    pub fn new(jwt: JwtConfig) -> Self {
        Self { jwt }
    }
}

impl AdminAuthenticator for JwtAdminAuthenticator {
    fn authenticate(&self, token: &str) -> Result<AdminIdentity, AuthFailure> {
        let claims = self.jwt.validate_token(token).map_err(|err| match err {
            JwtError::TokenExpired => AuthFailure::Unauthenticated("Token has expired"),
            _ => AuthFailure::Unauthenticated("Invalid token"),
        })?;

        if claims.role != Role::Admin {
            return Err(AuthFailure::NotAdmin);
        }

        Ok(AdminIdentity { subject: claims.sub })
    }
}

/// Extracts the token from an `Authorization: Bearer` header value.
fn bearer_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Middleware for admin-only routes.
///
/// On success the [`AdminIdentity`] is inserted into request extensions.
pub async fn require_admin(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let token = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(bearer_token)
        .map(str::to_string);

    let Some(token) = token else {
        return unauthorized_response("Invalid or missing bearer token");
    };

    match state.authenticator.authenticate(&token) {
        Ok(identity) => {
            tracing::debug!(subject = %identity.subject, "Admin request authenticated");
            req.extensions_mut().insert(identity);
            next.run(req).await
        }
        Err(AuthFailure::Unauthenticated(message)) => unauthorized_response(message),
        Err(AuthFailure::NotAdmin) => forbidden_response("Admin access required"),
    }
}

fn unauthorized_response(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({
            "error": "unauthorized",
            "message": message
        })),
    )
        .into_response()
}

fn forbidden_response(message: &str) -> Response {
    (
        StatusCode::FORBIDDEN,
        Json(json!({
            "error": "forbidden",
            "message": message
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-that-is-long-enough-for-hs256";

    fn authenticator() -> (JwtConfig, JwtAdminAuthenticator) {
        let jwt = JwtConfig::new(SECRET, "ofb-catalog", 3600).unwrap();
        (jwt.clone(), JwtAdminAuthenticator::new(jwt))
    }

    #[test]
    fn test_bearer_token() {
        assert_eq!(bearer_token("Bearer abc.def"), Some("abc.def"));
        assert_eq!(bearer_token("bearer abc"), Some("abc"));
        assert_eq!(bearer_token("Basic abc"), None);
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token("abc"), None);
    }

    #[test]
    fn test_admin_token_accepted() {
        let (jwt, auth) = authenticator();
        let token = jwt.generate_token("ops", Role::Admin).unwrap();

        let identity = auth.authenticate(&token).unwrap();
        assert_eq!(identity.subject, "ops");
    }

    #[test]
    fn test_viewer_token_forbidden() {
        let (jwt, auth) = authenticator();
        let token = jwt.generate_token("someone", Role::Viewer).unwrap();

        assert_eq!(auth.authenticate(&token), Err(AuthFailure::NotAdmin));
    }

    #[test]
    fn test_token_from_other_secret_rejected() {
        let (_, auth) = authenticator();
        let other = JwtConfig::new("another-secret-that-is-also-long-enough", "ofb-catalog", 3600)
            .unwrap();
        let token = other.generate_token("ops", Role::Admin).unwrap();

        assert!(matches!(
            auth.authenticate(&token),
            Err(AuthFailure::Unauthenticated(_))
        ));
    }

    #[test]
    fn test_garbage_token_rejected() {
        let (_, auth) = authenticator();
        assert!(matches!(
            auth.authenticate("not-a-token"),
            Err(AuthFailure::Unauthenticated(_))
        ));
    }

    #[test]
    fn test_forbidden_response() {
        let response = forbidden_response("Admin access required");
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_unauthorized_response() {
        let response = unauthorized_response("Invalid or missing bearer token");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
