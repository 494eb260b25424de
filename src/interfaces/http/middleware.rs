//! Authentication middleware for Axum
//!
//! Resolves the bearer token to an [`AuthenticatedUser`] request
//! extension. Handlers turn that into an explicit [`Caller`] value for
//! the services; no core operation ever reads ambient session state.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::domain::{Caller, Role, Storage};
use crate::infrastructure::crypto::jwt::{verify_token, JwtConfig};

/// Authentication error types
#[derive(Debug)]
pub enum AuthError {
    MissingToken,
    InvalidToken,
    ExpiredToken,
    UserNotFound,
    Banned,
}

/// Authentication state shared with the middleware
#[derive(Clone)]
pub struct AuthState {
    pub jwt_config: JwtConfig,
    pub storage: Arc<dyn Storage>,
}

/// Authenticated user information resolved from the token and the
/// stored account (role and ban state come from storage, not the token).
#[derive(Clone, Debug)]
pub struct AuthenticatedUser {
    pub user_id: String,
    pub username: String,
    pub role: Role,
}

impl AuthenticatedUser {
    pub fn caller(&self) -> Caller {
        match self.role {
            Role::Admin => Caller::admin(self.user_id.clone(), self.username.clone()),
            Role::User => Caller::user(self.user_id.clone(), self.username.clone()),
        }
    }
}

fn extract_token(auth_header: &str) -> Option<&str> {
    auth_header.strip_prefix("Bearer ")
}

/// JWT authentication middleware
pub async fn auth_middleware(
    State(auth_state): State<AuthState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .map(String::from);
    let Some(auth_header) = auth_header else {
        return auth_error_response(AuthError::MissingToken);
    };

    let Some(token) = extract_token(&auth_header) else {
        return auth_error_response(AuthError::InvalidToken);
    };

    let claims = match verify_token(token, &auth_state.jwt_config) {
        Ok(claims) => claims,
        Err(_) => return auth_error_response(AuthError::InvalidToken),
    };
    if claims.is_expired() {
        return auth_error_response(AuthError::ExpiredToken);
    }

    // a ban cuts off existing sessions, so the account is re-checked on
    // every request
    let user = match auth_state.storage.get_user(&claims.sub).await {
        Ok(Some(user)) => user,
        Ok(None) => return auth_error_response(AuthError::UserNotFound),
        Err(_) => return auth_error_response(AuthError::InvalidToken),
    };
    if user.banned {
        return auth_error_response(AuthError::Banned);
    }

    request.extensions_mut().insert(AuthenticatedUser {
        user_id: user.id,
        username: user.username,
        role: user.role,
    });
    next.run(request).await
}

fn auth_error_response(error: AuthError) -> Response {
    let (status, message) = match error {
        AuthError::MissingToken => (StatusCode::UNAUTHORIZED, "Missing authentication token"),
        AuthError::InvalidToken => (StatusCode::UNAUTHORIZED, "Invalid authentication token"),
        AuthError::ExpiredToken => (StatusCode::UNAUTHORIZED, "Token has expired"),
        AuthError::UserNotFound => (StatusCode::UNAUTHORIZED, "Unknown account"),
        AuthError::Banned => (StatusCode::FORBIDDEN, "Account is banned"),
    };

    let body = Json(json!({
        "success": false,
        "error": message
    }));

    (status, body).into_response()
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::User;
    use crate::infrastructure::crypto::jwt::create_token;
    use crate::infrastructure::storage::InMemoryStorage;
    use axum::routing::get;
    use axum::{middleware, Extension, Router};
    use tower::ServiceExt;

    async fn whoami(Extension(user): Extension<AuthenticatedUser>) -> String {
        format!("{}:{}", user.username, user.role)
    }

    async fn fixture() -> (Router, JwtConfig, User) {
        let storage = Arc::new(InMemoryStorage::new());
        let user = storage
            .insert_user(User::new("alice", "alice@example.com", "h", Role::User))
            .await
            .unwrap();
        let jwt_config = JwtConfig {
            secret: "test-secret".into(),
            expiration_hours: 1,
            issuer: "parkhub".into(),
        };
        let state = AuthState {
            jwt_config: jwt_config.clone(),
            storage,
        };
        let app = Router::new()
            .route("/whoami", get(whoami))
            .layer(middleware::from_fn_with_state(state, auth_middleware));
        (app, jwt_config, user)
    }

    fn get_with_token(token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method("GET").uri("/whoami");
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn missing_token_is_401() {
        let (app, _, _) = fixture().await;
        let resp = app.oneshot(get_with_token(None)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn valid_token_passes_through() {
        let (app, jwt_config, user) = fixture().await;
        let token = create_token(&user.id, &user.username, "user", &jwt_config).unwrap();
        let resp = app.oneshot(get_with_token(Some(&token))).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn garbage_token_is_401() {
        let (app, _, _) = fixture().await;
        let resp = app
            .oneshot(get_with_token(Some("not-a-token")))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn banned_user_is_403_even_with_valid_token() {
        let storage = Arc::new(InMemoryStorage::new());
        let mut user = User::new("bob", "bob@example.com", "h", Role::User);
        user.banned = true;
        let user = storage.insert_user(user).await.unwrap();

        let jwt_config = JwtConfig {
            secret: "test-secret".into(),
            expiration_hours: 1,
            issuer: "parkhub".into(),
        };
        let token = create_token(&user.id, &user.username, "user", &jwt_config).unwrap();
        let state = AuthState {
            jwt_config,
            storage,
        };
        let app = Router::new()
            .route("/whoami", get(whoami))
            .layer(middleware::from_fn_with_state(state, auth_middleware));

        let resp = app.oneshot(get_with_token(Some(&token))).await.unwrap();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }
}
