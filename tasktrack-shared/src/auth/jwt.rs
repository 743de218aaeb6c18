/// JWT token issuance and validation
///
/// Tokens identify a user by email: the `sub` claim is the email the user
/// logged in with, and the API resolves it back to a user record on every
/// request. A token therefore stops working once its user changes email.
///
/// # Security
///
/// - **Algorithm**: HS256 (HMAC with SHA-256)
/// - **Expiration**: configurable, 24 hours by default
/// - **Validation**: signature, `exp`, `nbf` and issuer
/// - **Secret**: at least 32 bytes
///
/// # Example
///
/// ```
/// use tasktrack_shared::auth::jwt::{JwtTokenService, TokenService};
/// use chrono::Duration;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let tokens = JwtTokenService::new("your-secret-key-at-least-32-bytes", Duration::hours(24));
///
/// let token = tokens.issue("alice@example.com")?;
/// assert_eq!(tokens.verify(&token)?, "alice@example.com");
/// # Ok(())
/// # }
/// ```

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Issuer claim stamped on and required of every token
pub const ISSUER: &str = "tasktrack";

/// Error type for JWT operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to create token
    #[error("Failed to create token: {0}")]
    CreateError(String),

    /// Failed to validate token
    #[error("Failed to validate token: {0}")]
    ValidationError(String),

    /// Token has expired
    #[error("Token has expired")]
    Expired,

    /// Token was issued by someone else
    #[error("Invalid issuer")]
    InvalidIssuer,
}

/// Issues and verifies bearer tokens for a subject email
pub trait TokenService: Send + Sync {
    /// Issues a token for `subject`
    fn issue(&self, subject: &str) -> Result<String, JwtError>;

    /// Verifies a token and returns its subject
    fn verify(&self, token: &str) -> Result<String, JwtError>;
}

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - user email
    pub sub: String,

    /// Issuer - always [`ISSUER`]
    pub iss: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Not before (Unix timestamp)
    pub nbf: i64,

    /// Unique token id
    pub jti: Uuid,
}

impl Claims {
    /// Creates claims for `subject` expiring after `expires_in`
    pub fn new(subject: impl Into<String>, expires_in: Duration) -> Self {
        let now = Utc::now();

        Self {
            sub: subject.into(),
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            exp: (now + expires_in).timestamp(),
            nbf: now.timestamp(),
            jti: Uuid::new_v4(),
        }
    }

    /// Checks if the claims have expired
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }
}

/// Signs claims with HS256
///
/// # Errors
///
/// Returns `JwtError::CreateError` if encoding fails.
pub fn create_token(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    let header = Header::new(Algorithm::HS256);
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&header, claims, &key)
        .map_err(|e| JwtError::CreateError(format!("Token encoding failed: {}", e)))
}

/// Validates a token and extracts its claims
///
/// # Errors
///
/// Returns an error if the signature is wrong, the token has expired or is
/// not yet valid, or the issuer is not [`ISSUER`].
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);
    validation.validate_exp = true;
    validation.validate_nbf = true;

    let token_data = decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
        jsonwebtoken::errors::ErrorKind::InvalidIssuer => JwtError::InvalidIssuer,
        _ => JwtError::ValidationError(format!("Token validation failed: {}", e)),
    })?;

    Ok(token_data.claims)
}

/// HS256 [`TokenService`]
#[derive(Clone)]
pub struct JwtTokenService {
    secret: String,
    expires_in: Duration,
}

impl JwtTokenService {
    pub fn new(secret: impl Into<String>, expires_in: Duration) -> Self {
        Self {
            secret: secret.into(),
            expires_in,
        }
    }
}

impl std::fmt::Debug for JwtTokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtTokenService")
            .field("secret", &"<redacted>")
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

impl TokenService for JwtTokenService {
    fn issue(&self, subject: &str) -> Result<String, JwtError> {
        create_token(&Claims::new(subject, self.expires_in), &self.secret)
    }

    fn verify(&self, token: &str) -> Result<String, JwtError> {
        validate_token(token, &self.secret).map(|claims| claims.sub)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    #[test]
    fn test_claims_creation() {
        let claims = Claims::new("alice@example.com", Duration::hours(1));

        assert_eq!(claims.sub, "alice@example.com");
        assert_eq!(claims.iss, ISSUER);
        assert_eq!(claims.exp - claims.iat, 3600);
        assert!(!claims.is_expired());
    }

    #[test]
    fn test_create_and_validate_token() {
        let claims = Claims::new("alice@example.com", Duration::hours(24));
        let token = create_token(&claims, SECRET).expect("Should create token");

        let validated = validate_token(&token, SECRET).expect("Should validate token");
        assert_eq!(validated.sub, "alice@example.com");
        assert_eq!(validated.jti, claims.jti);
    }

    #[test]
    fn test_validate_with_wrong_secret() {
        let token = create_token(&Claims::new("a@b.c", Duration::hours(1)), SECRET).unwrap();

        let result = validate_token(&token, "another-secret-key-at-least-32-bytes");
        assert!(matches!(result, Err(JwtError::ValidationError(_))));
    }

    #[test]
    fn test_validate_expired_token() {
        let claims = Claims::new("a@b.c", Duration::seconds(-3600));
        assert!(claims.is_expired());

        let token = create_token(&claims, SECRET).unwrap();
        assert!(matches!(validate_token(&token, SECRET), Err(JwtError::Expired)));
    }

    #[test]
    fn test_validate_foreign_issuer() {
        let mut claims = Claims::new("a@b.c", Duration::hours(1));
        claims.iss = "someone-else".to_string();

        let token = create_token(&claims, SECRET).unwrap();
        assert!(matches!(
            validate_token(&token, SECRET),
            Err(JwtError::InvalidIssuer)
        ));
    }

    #[test]
    fn test_token_service_roundtrip() {
        let tokens = JwtTokenService::new(SECRET, Duration::hours(24));

        let token = tokens.issue("bob@example.com").unwrap();
        assert_eq!(tokens.verify(&token).unwrap(), "bob@example.com");
        assert!(tokens.verify("not-a-jwt").is_err());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let tokens = JwtTokenService::new(SECRET, Duration::hours(24));
        assert!(!format!("{:?}", tokens).contains(SECRET));
    }
}
