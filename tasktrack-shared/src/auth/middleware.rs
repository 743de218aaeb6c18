/// Request authentication primitives for Axum
///
/// The API's authentication layer parses the bearer token with
/// [`extract_bearer_token`], verifies it, resolves the acting user and stores
/// an [`AuthContext`] in the request extensions. Handlers read it back with
/// Axum's `Extension` extractor.
///
/// # Example
///
/// ```
/// use axum::Extension;
/// use tasktrack_shared::auth::middleware::AuthContext;
///
/// async fn handler(Extension(auth): Extension<AuthContext>) -> String {
///     format!("Hello, {}!", auth.user.name)
/// }
/// ```

use axum::http::{header, HeaderMap};

use crate::models::User;

/// Authenticated request context
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// The acting user, freshly loaded for this request
    pub user: User,
}

impl AuthContext {
    pub fn new(user: User) -> Self {
        Self { user }
    }
}

/// Authentication failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// Missing authorization header
    #[error("Missing credentials")]
    MissingCredentials,

    /// Authorization header is not a bearer token
    #[error("{0}")]
    InvalidFormat(String),

    /// Token failed verification
    #[error("{0}")]
    InvalidToken(String),

    /// Token subject does not match any user
    #[error("Unknown principal")]
    UnknownPrincipal,
}

/// Extracts the token from an `Authorization: Bearer <token>` header
///
/// # Errors
///
/// Returns `MissingCredentials` when the header is absent or not valid
/// UTF-8, and `InvalidFormat` when it does not use the bearer scheme or the
/// token is empty.
pub fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingCredentials)?;

    let token = value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .ok_or_else(|| AuthError::InvalidFormat("Expected Bearer token".to_string()))?;

    if token.is_empty() {
        return Err(AuthError::InvalidFormat("Empty bearer token".to_string()));
    }

    Ok(token)
}
