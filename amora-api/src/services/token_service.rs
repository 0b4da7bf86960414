use jsonwebtoken::{encode, EncodingKey, Header};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use amora_shared::errors::AppError;
use amora_shared::types::auth::{AccessToken, Claims, UserRole};

pub fn create_access_token(
    user_id: Uuid,
    role: UserRole,
    secret: &str,
    ttl_secs: i64,
) -> Result<AccessToken, AppError> {
    let claims = Claims::new(user_id, role, ttl_secs);
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::internal(format!("JWT encoding failed: {e}")))?;

    Ok(AccessToken::new(token, ttl_secs))
}

/// One-time codes are stored hashed so a Redis dump never exposes them.
pub fn hash_code(code: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(code.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use amora_shared::middleware::decode_token;

    #[test]
    fn minted_token_decodes_to_the_same_subject() {
        let user_id = Uuid::new_v4();
        let token = create_access_token(
            user_id,
            UserRole::User,
            "development-secret-change-in-production",
            900,
        )
        .unwrap();

        let claims = decode_token(&token.access_token).unwrap();
        assert_eq!(claims.sub, user_id);
        assert!(!claims.is_expired());
    }

    #[test]
    fn code_hashing_is_stable_and_hex() {
        let a = hash_code("123456");
        let b = hash_code("123456");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert_ne!(a, hash_code("654321"));
    }
}
