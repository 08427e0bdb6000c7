//! Authentication middleware.

use dealer_store::{DealerStore, StoreError};
use entities::{User, UserRole};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use identity::Claims;

use crate::error::ServerError;
use crate::state::SharedState;

/// The resolved caller, injected into request extensions.
///
/// Workflow operations receive this explicitly; nothing below the HTTP layer
/// reads ambient authentication state.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    /// Internal user ID.
    pub id: uuid::Uuid,
    /// Identity-provider subject.
    pub external_id: String,
    /// Email address.
    pub email: String,
    /// Role.
    pub role: UserRole,
}

impl AuthenticatedUser {
    /// Returns true if the caller is an administrator.
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

impl From<&User> for AuthenticatedUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            external_id: user.external_id.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }
}

/// Extracts the bearer token from the Authorization header.
///
/// Returns an owned string: the request body is not `Sync`, so a request
/// borrow must not be held across the store awaits below.
fn extract_token(request: &Request) -> Option<String> {
    request
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::to_owned)
}

/// Resolves identity-provider claims to an internal user record, creating it
/// on first authenticated access. The admin allow-list in the configuration
/// decides the initial role.
pub async fn resolve_user<S: DealerStore>(
    state: &SharedState<S>,
    claims: &Claims,
) -> Result<AuthenticatedUser, ServerError> {
    if let Some(user) = state.store.get_user_by_external_id(&claims.sub).await? {
        return Ok(AuthenticatedUser::from(&user));
    }

    let role = if state.config.is_admin_email(&claims.email) {
        UserRole::Admin
    } else {
        UserRole::User
    };

    let mut user = User::new(claims.sub.clone(), claims.email.clone()).with_role(role);
    user.name = claims.name.clone();
    user.image_url = claims.picture.clone();

    match state.store.create_user(user).await {
        Ok(user) => {
            tracing::info!(user_id = %user.id, role = ?user.role, "User created on first access");
            Ok(AuthenticatedUser::from(&user))
        }
        // Two first requests can race the insert; the loser reads the winner.
        Err(StoreError::AlreadyExists { .. }) => {
            let user = state
                .store
                .get_user_by_external_id(&claims.sub)
                .await?
                .ok_or_else(|| ServerError::Internal("User vanished after insert race".into()))?;
            Ok(AuthenticatedUser::from(&user))
        }
        Err(e) => Err(e.into()),
    }
}

async fn authenticate<S: DealerStore>(
    state: &SharedState<S>,
    token: Option<String>,
) -> Result<AuthenticatedUser, ServerError> {
    let token = token.ok_or(ServerError::AuthenticationRequired)?;
    let claims = state
        .verifier
        .validate_token(&token)
        .map_err(|_| ServerError::AuthenticationRequired)?;
    resolve_user(state, &claims).await
}

/// Authentication middleware.
///
/// Validates the bearer token, resolves the internal user (creating it on
/// first access), and stores the authenticated user in request extensions.
pub async fn auth_middleware<S: DealerStore + 'static>(
    State(state): State<SharedState<S>>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = extract_token(&request);
    match authenticate(&state, token).await {
        Ok(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}

/// Optional authentication middleware.
///
/// Works like [`auth_middleware`] but lets anonymous requests through.
/// Used by catalog endpoints that only need the caller for wishlist flags.
pub async fn optional_auth_middleware<S: DealerStore + 'static>(
    State(state): State<SharedState<S>>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = extract_token(&request);
    if let Ok(user) = authenticate(&state, token).await {
        request.extensions_mut().insert(user);
    }
    next.run(request).await
}

/// Admin guard, layered after [`auth_middleware`].
pub async fn require_admin(request: Request, next: Next) -> Response {
    let is_admin = request
        .extensions()
        .get::<AuthenticatedUser>()
        .is_some_and(AuthenticatedUser::is_admin);

    if !is_admin {
        return ServerError::PermissionDenied("Admin access required".to_string())
            .into_response();
    }
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use dealer_store::MemoryDealerStore;
    use identity::{IdentityConfig, TokenVerifier};

    use super::*;
    use crate::config::Config;
    use crate::state::create_shared_state;

    fn test_state() -> SharedState<MemoryDealerStore> {
        let config = Config {
            host: "127.0.0.1".to_string(),
            port: 0,
            database_url: "sqlite::memory:".to_string(),
            jwt_secret: "test-secret-long-enough-for-hs256".to_string(),
            admin_emails: vec!["admin@example.com".to_string()],
            gemini_api_key: None,
            gemini_model: None,
            log_level: "info".to_string(),
        };
        let verifier = TokenVerifier::new(IdentityConfig::new(config.jwt_secret.clone()));
        create_shared_state(config, MemoryDealerStore::new(), verifier, None)
    }

    #[tokio::test]
    async fn test_first_access_creates_user() {
        let state = test_state();
        let claims = Claims::new("provider|1", "someone@example.com", None, 24);

        let user = resolve_user(&state, &claims).await.unwrap();
        assert_eq!(user.role, UserRole::User);

        let stored = state
            .store
            .get_user_by_external_id("provider|1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.id, user.id);

        // Second access resolves to the same record.
        let again = resolve_user(&state, &claims).await.unwrap();
        assert_eq!(again.id, user.id);
    }

    #[tokio::test]
    async fn test_admin_allow_list_grants_admin() {
        let state = test_state();
        let claims = Claims::new("provider|2", "admin@example.com", None, 24);

        let user = resolve_user(&state, &claims).await.unwrap();
        assert!(user.is_admin());
    }
}
