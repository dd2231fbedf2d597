//! Credential decoding.
//! The service issues a signed JWT whose claims carry the account role. The
//! client decodes the claims structurally without verifying the signature;
//! the derived role only drives what the UI shows, and the service remains
//! the authorization boundary for every privileged call.

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};

/// Capability tier encoded in the credential. Unknown role strings are a
/// decode failure, which keeps the set closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = ApiError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            other => Err(ApiError::input(format!(
                "unknown role '{other}' (expected 'user' or 'admin')"
            ))),
        }
    }
}

/// Claims the service embeds in an issued credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: Role,
    pub exp: i64,
}

/// Decode the claims out of a credential. No network call and no signature
/// check; expiry is still validated so a stale persisted credential reads as
/// invalid rather than resurrecting a dead session.
pub fn decode_claims(credential: &str) -> ApiResult<Claims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    let data = decode::<Claims>(credential, &DecodingKey::from_secret(&[]), &validation)
        .map_err(|e| ApiError::decode(e.to_string()))?;
    Ok(data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn forge(claims: &impl serde::Serialize) -> String {
        encode(&Header::default(), claims, &EncodingKey::from_secret(b"test-secret")).unwrap()
    }

    fn fresh_exp() -> i64 {
        chrono::Utc::now().timestamp() + 3600
    }

    #[test]
    fn decodes_role_claim_without_knowing_the_secret() {
        let token = forge(&Claims { sub: "alice".into(), role: Role::User, exp: fresh_exp() });
        let claims = decode_claims(&token).unwrap();
        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.role, Role::User);

        let token = forge(&Claims { sub: "root".into(), role: Role::Admin, exp: fresh_exp() });
        assert_eq!(decode_claims(&token).unwrap().role, Role::Admin);
    }

    #[test]
    fn expired_credential_is_a_decode_failure() {
        // well past the default leeway
        let token = forge(&Claims { sub: "alice".into(), role: Role::User, exp: chrono::Utc::now().timestamp() - 3600 });
        let err = decode_claims(&token).unwrap_err();
        assert_eq!(err.kind(), "decode");
    }

    #[test]
    fn garbage_is_a_decode_failure() {
        assert_eq!(decode_claims("not-a-token").unwrap_err().kind(), "decode");
        assert_eq!(decode_claims("").unwrap_err().kind(), "decode");
    }

    #[test]
    fn tampered_payload_segment_is_a_decode_failure() {
        use base64::Engine;
        let token = forge(&Claims { sub: "alice".into(), role: Role::User, exp: fresh_exp() });
        let parts: Vec<&str> = token.split('.').collect();
        // structurally valid base64url, but the payload is not claims JSON
        let bogus = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(b"not claims json");
        let tampered = format!("{}.{}.{}", parts[0], bogus, parts[2]);
        assert_eq!(decode_claims(&tampered).unwrap_err().kind(), "decode");
    }

    #[test]
    fn unknown_role_is_rejected() {
        let token = forge(&serde_json::json!({
            "sub": "eve",
            "role": "superuser",
            "exp": fresh_exp(),
        }));
        assert_eq!(decode_claims(&token).unwrap_err().kind(), "decode");
    }

    #[test]
    fn missing_role_is_rejected() {
        let token = forge(&serde_json::json!({ "sub": "eve", "exp": fresh_exp() }));
        assert_eq!(decode_claims(&token).unwrap_err().kind(), "decode");
    }

    #[test]
    fn role_parses_from_cli_text() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("User".parse::<Role>().unwrap(), Role::User);
        assert!("root".parse::<Role>().is_err());
    }
}
