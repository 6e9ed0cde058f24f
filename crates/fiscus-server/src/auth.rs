//! Credential validation.
//!
//! Token issuance lives in the account service; this module only validates
//! HS256 bearer tokens whose `sub` claim is the owner ID. Validation
//! failures carry no detail to the client — the session closes with one
//! fixed policy code.

use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;

use fiscus_core::OwnerId;

/// JWT claims the account service mints.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Owner ID.
    pub sub: String,
    /// Expiry (seconds since epoch).
    pub exp: usize,
}

/// Validate a token and extract its owner.
///
/// Returns `None` on any failure: bad signature, expired, malformed, or an
/// empty subject.
pub fn verify_token(secret: &str, token: &str) -> Option<OwnerId> {
    let key = DecodingKey::from_secret(secret.as_bytes());
    match decode::<Claims>(token, &key, &Validation::default()) {
        Ok(data) if !data.claims.sub.is_empty() => Some(OwnerId::from_string(data.claims.sub)),
        Ok(_) => None,
        Err(e) => {
            debug!(error = %e, "token validation failed");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    const SECRET: &str = "test-secret";

    fn mint(sub: &str, exp_offset_secs: i64) -> String {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let exp = (chrono::Utc::now().timestamp() + exp_offset_secs) as usize;
        encode(
            &Header::default(),
            &Claims {
                sub: sub.to_string(),
                exp,
            },
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn valid_token_yields_owner() {
        let token = mint("u1", 3600);
        assert_eq!(verify_token(SECRET, &token).unwrap().as_str(), "u1");
    }

    #[test]
    fn wrong_secret_rejected() {
        let token = mint("u1", 3600);
        assert!(verify_token("other-secret", &token).is_none());
    }

    #[test]
    fn expired_token_rejected() {
        let token = mint("u1", -3600);
        assert!(verify_token(SECRET, &token).is_none());
    }

    #[test]
    fn garbage_token_rejected() {
        assert!(verify_token(SECRET, "not.a.token").is_none());
        assert!(verify_token(SECRET, "").is_none());
    }

    #[test]
    fn empty_subject_rejected() {
        let token = mint("", 3600);
        assert!(verify_token(SECRET, &token).is_none());
    }
}
