/// Authentication utilities
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing behind the `PasswordHasher` trait
/// - [`jwt`]: HS256 bearer tokens behind the `TokenService` trait
/// - [`middleware`]: bearer header parsing and the per-request `AuthContext`
///
/// # Example
///
/// ```
/// use tasktrack_shared::auth::jwt::{JwtTokenService, TokenService};
/// use tasktrack_shared::auth::password::{Argon2Hasher, PasswordHasher};
/// use chrono::Duration;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = Argon2Hasher::default().hash("user_password")?;
/// assert!(Argon2Hasher::default().verify("user_password", &hash)?);
///
/// let tokens = JwtTokenService::new("secret-key-at-least-32-bytes-long", Duration::hours(1));
/// let token = tokens.issue("user@example.com")?;
/// # let _ = token;
/// # Ok(())
/// # }
/// ```

pub mod jwt;
pub mod middleware;
pub mod password;
