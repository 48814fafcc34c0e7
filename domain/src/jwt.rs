//! Bearer-token verification for the REST surface.
//!
//! Token issuance belongs to the auth service; this module only decodes and
//! validates what arrives in the Authorization header. `generate_token`
//! exists for tests and local tooling.

use crate::error::Error;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// The authenticated user's id
    pub sub: i64,
    /// "rider", "driver" or "admin"
    pub role: String,
    /// Expiry as a unix timestamp
    pub exp: usize,
}

impl Claims {
    pub fn is_admin(&self) -> bool {
        self.role == "admin"
    }
}

pub fn verify_token(secret: &str, token: &str) -> Result<Claims, Error> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )?;
    Ok(data.claims)
}

pub fn generate_token(secret: &str, user_id: i64, role: &str, ttl_secs: u64) -> Result<String, Error> {
    let exp = chrono::Utc::now().timestamp() as usize + ttl_secs as usize;
    let claims = Claims {
        sub: user_id,
        role: role.to_string(),
        exp,
    };
    Ok(encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn generated_tokens_round_trip() {
        let token = generate_token(SECRET, 7, "driver", 60).unwrap();
        let claims = verify_token(SECRET, &token).unwrap();
        assert_eq!(claims.sub, 7);
        assert_eq!(claims.role, "driver");
        assert!(!claims.is_admin());
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = generate_token(SECRET, 7, "admin", 60).unwrap();
        assert!(verify_token("other-secret", &token).is_err());
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let exp = chrono::Utc::now().timestamp() as usize - 120;
        let claims = Claims {
            sub: 7,
            role: "rider".to_string(),
            exp,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();
        assert!(verify_token(SECRET, &token).is_err());
    }
}
