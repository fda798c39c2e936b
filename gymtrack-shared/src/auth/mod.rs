/// Authentication and authorization utilities
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and strength checks
/// - [`jwt`]: HS256 access/refresh tokens carrying the admin flag
/// - [`middleware`]: Bearer token extraction and the admin guard
///
/// # Example
///
/// ```no_run
/// use gymtrack_shared::auth::password::{hash_password, verify_password};
/// use gymtrack_shared::auth::jwt::{create_token, Claims, TokenType};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("leg-press-2025")?;
/// assert!(verify_password("leg-press-2025", &hash)?);
///
/// let claims = Claims::new(Uuid::new_v4(), false, TokenType::Access);
/// let token = create_token(&claims, "a-signing-secret-of-at-least-32-bytes")?;
/// # Ok(())
/// # }
/// ```

pub mod jwt;
pub mod middleware;
pub mod password;
