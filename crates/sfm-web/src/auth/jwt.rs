use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Payload of the `current_user` session cookie.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: u64,
    /// Token id; revocation and per-login workspaces are keyed by it.
    pub jti: String,
}

pub struct IssuedToken {
    pub token: String,
    pub claims: Claims,
}

pub fn create_token(secret: &str, ttl_hours: u64, username: &str) -> anyhow::Result<IssuedToken> {
    let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();

    let claims = Claims {
        sub: username.to_string(),
        exp: now + ttl_hours * 3600,
        jti: uuid::Uuid::new_v4().to_string(),
    };

    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(IssuedToken { token, claims })
}

pub fn verify_token(secret: &str, token: &str) -> anyhow::Result<Claims> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )?;

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    #[test]
    fn round_trip_keeps_subject_and_id() {
        let issued = create_token(SECRET, 1, "admin").unwrap();
        let claims = verify_token(SECRET, &issued.token).unwrap();

        assert_eq!(claims.sub, "admin");
        assert_eq!(claims.jti, issued.claims.jti);
        assert_eq!(claims.exp, issued.claims.exp);
    }

    #[test]
    fn token_ids_are_unique() {
        let a = create_token(SECRET, 1, "admin").unwrap();
        let b = create_token(SECRET, 1, "admin").unwrap();
        assert_ne!(a.claims.jti, b.claims.jti);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let issued = create_token(SECRET, 1, "admin").unwrap();
        assert!(verify_token("another-secret-another-secret-xx", &issued.token).is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs();
        let claims = Claims {
            sub: "admin".into(),
            exp: now - 3600,
            jti: "old".into(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        assert!(verify_token(SECRET, &token).is_err());
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(verify_token(SECRET, "not.a.jwt").is_err());
    }
}
