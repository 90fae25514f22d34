/*
 * Responsibility
 * - Build and parse `<header>.<payload>.<signature>` bearer tokens (HS256, fixed header)
 * - Signature is checked before the payload is decoded
 * - Shape/expiry of the payload is ClaimsValidator's job (see claims.rs)
 */
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::services::auth::{
    base64url,
    claims::{Claims, RawClaims},
    signer,
};

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("malformed token")]
    Malformed,
    #[error("token signature mismatch")]
    BadSignature,
    #[error("token lifetime out of range")]
    Lifetime,
    #[error("failed to serialize token segment: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Field order is part of the wire format: `{"typ":"JWT","alg":"HS256"}`.
#[derive(Serialize)]
struct Header {
    typ: &'static str,
    alg: &'static str,
}

const HEADER: Header = Header {
    typ: "JWT",
    alg: "HS256",
};

/// Shared-secret token codec.
///
/// Built once from `Config` and shared behind an `Arc`; immutable afterwards.
#[derive(Clone)]
pub struct TokenCodec {
    secret: Vec<u8>,
    ttl_seconds: u64,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Do not print key material
        f.debug_struct("TokenCodec")
            .field("secret", &"<redacted>")
            .field("ttl_seconds", &self.ttl_seconds)
            .finish()
    }
}

impl TokenCodec {
    pub fn new(secret: impl Into<Vec<u8>>, ttl_seconds: u64) -> Self {
        Self {
            secret: secret.into(),
            ttl_seconds,
        }
    }

    pub fn ttl_seconds(&self) -> u64 {
        self.ttl_seconds
    }

    pub fn generate(&self, claims: &Claims) -> Result<String, TokenError> {
        let header = base64url::encode(serde_json::to_vec(&HEADER)?);
        let payload = base64url::encode(serde_json::to_vec(claims)?);

        let signing_input = format!("{header}.{payload}");
        let signature = signer::sign(signing_input.as_bytes(), &self.secret);

        Ok(format!("{signing_input}.{}", base64url::encode(signature)))
    }

    /// Issue a login token that expires `ttl_seconds` from now.
    pub fn issue(&self, user_id: i64, username: &str, role: &str) -> Result<String, TokenError> {
        let exp = i64::try_from(self.ttl_seconds)
            .ok()
            .and_then(|ttl| chrono::Utc::now().timestamp().checked_add(ttl))
            .ok_or(TokenError::Lifetime)?;

        self.generate(&Claims {
            user_id,
            username: username.to_string(),
            role: role.to_string(),
            exp: Some(exp),
        })
    }

    pub fn parse(&self, token: &str) -> Result<RawClaims, TokenError> {
        let mut parts = token.split('.');
        let (Some(header), Some(payload), Some(signature), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(TokenError::Malformed);
        };

        if header.is_empty() || payload.is_empty() || signature.is_empty() {
            return Err(TokenError::Malformed);
        }

        // The MAC covers the segments exactly as received, not their decoded form.
        let signing_input = &token[..header.len() + 1 + payload.len()];
        let candidate = base64url::decode(signature).map_err(|_| TokenError::BadSignature)?;
        if !signer::verify(signing_input.as_bytes(), &self.secret, &candidate) {
            return Err(TokenError::BadSignature);
        }

        let bytes = base64url::decode(payload).map_err(|_| TokenError::Malformed)?;
        match serde_json::from_slice::<Value>(&bytes) {
            Ok(Value::Object(map)) => Ok(map),
            _ => Err(TokenError::Malformed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::auth::claims::{self, ClaimsError};
    use serde_json::json;

    fn codec(secret: &str) -> TokenCodec {
        TokenCodec::new(secret, 3600)
    }

    fn future() -> i64 {
        chrono::Utc::now().timestamp() + 3600
    }

    fn segment_json(segment: &str) -> Value {
        serde_json::from_slice(&base64url::decode(segment).unwrap()).unwrap()
    }

    #[test]
    fn header_segment_is_fixed() {
        let token = codec("k")
            .generate(&Claims {
                user_id: 1,
                username: "alice".into(),
                role: "admin".into(),
                exp: None,
            })
            .unwrap();
        let header = token.split('.').next().unwrap();

        assert_eq!(
            base64url::decode(header).unwrap(),
            br#"{"typ":"JWT","alg":"HS256"}"#
        );
        assert_eq!(header, "eyJ0eXAiOiJKV1QiLCJhbGciOiJIUzI1NiJ9");
    }

    #[test]
    fn round_trip_preserves_claims() {
        let codec = codec("s3cr3t");
        for exp in [None, Some(future())] {
            let claims = Claims {
                user_id: 7,
                username: "Иван".into(),
                role: "user".into(),
                exp,
            };
            let token = codec.generate(&claims).unwrap();
            let raw = codec.parse(&token).unwrap();
            assert_eq!(claims::check_now(&raw).unwrap(), claims);
        }
    }

    #[test]
    fn bob_scenario() {
        let exp = future();
        let signing = codec("s3cr3t");
        let token = signing
            .generate(&Claims {
                user_id: 42,
                username: "bob".into(),
                role: "user".into(),
                exp: Some(exp),
            })
            .unwrap();

        let expected = json!({"user_id": 42, "username": "bob", "role": "user", "exp": exp});
        let middle = token.split('.').nth(1).unwrap();
        assert_eq!(segment_json(middle), expected);

        let parsed = signing.parse(&token).unwrap();
        assert_eq!(Value::Object(parsed), expected);

        assert!(matches!(
            codec("wrong").parse(&token),
            Err(TokenError::BadSignature)
        ));
    }

    #[test]
    fn flipping_any_signature_character_breaks_verification() {
        let codec = codec("s3cr3t");
        let token = codec
            .generate(&Claims {
                user_id: 1,
                username: "alice".into(),
                role: "admin".into(),
                exp: None,
            })
            .unwrap();
        let sig_start = token.rfind('.').unwrap() + 1;

        for i in sig_start..token.len() {
            let mut bytes = token.clone().into_bytes();
            bytes[i] = if bytes[i] == b'A' { b'B' } else { b'A' };
            let tampered = String::from_utf8(bytes).unwrap();

            assert!(
                matches!(codec.parse(&tampered), Err(TokenError::BadSignature)),
                "flip at {i} was accepted"
            );
        }
    }

    #[test]
    fn tampered_payload_is_rejected() {
        let codec = codec("s3cr3t");
        let token = codec
            .generate(&Claims {
                user_id: 2,
                username: "eve".into(),
                role: "user".into(),
                exp: None,
            })
            .unwrap();
        let parts: Vec<&str> = token.split('.').collect();
        let forged = base64url::encode(br#"{"user_id":1,"username":"eve","role":"admin"}"#);
        let tampered = format!("{}.{}.{}", parts[0], forged, parts[2]);

        assert!(matches!(
            codec.parse(&tampered),
            Err(TokenError::BadSignature)
        ));
    }

    #[test]
    fn wrong_segment_count_is_malformed() {
        let codec = codec("k");
        for token in ["", "abc", "a.b", "a.b.c.d", "a..c", ".b.c", "a.b."] {
            assert!(
                matches!(codec.parse(token), Err(TokenError::Malformed)),
                "{token:?} was not malformed"
            );
        }
    }

    #[test]
    fn signed_non_json_payload_is_malformed() {
        let codec = codec("k");
        let header = base64url::encode(br#"{"typ":"JWT","alg":"HS256"}"#);

        for payload in [
            base64url::encode(b"not json"),
            base64url::encode(b"[1,2,3]"),
            base64url::encode([0xff, 0xfe]),
            "***".to_string(),
        ] {
            let input = format!("{header}.{payload}");
            let sig = base64url::encode(signer::sign(input.as_bytes(), b"k"));
            assert!(matches!(
                codec.parse(&format!("{input}.{sig}")),
                Err(TokenError::Malformed)
            ));
        }
    }

    #[test]
    fn expired_token_parses_but_fails_validation() {
        let codec = codec("k");
        let now = chrono::Utc::now().timestamp();
        let token = codec
            .generate(&Claims {
                user_id: 3,
                username: "carol".into(),
                role: "user".into(),
                exp: Some(now - 1),
            })
            .unwrap();

        let raw = codec.parse(&token).unwrap();
        assert_eq!(claims::check(&raw, now), Err(ClaimsError::Expired));
    }

    #[test]
    fn issue_sets_expiry_from_ttl() {
        let codec = TokenCodec::new("k", 120);
        let before = chrono::Utc::now().timestamp();
        let token = codec.issue(9, "dave", "user").unwrap();
        let claims = claims::check_now(&codec.parse(&token).unwrap()).unwrap();

        let exp = claims.exp.unwrap();
        assert!(exp >= before + 120 && exp <= before + 121);
        assert_eq!(claims.user_id, 9);
    }

    #[test]
    fn oversized_ttl_is_an_error_not_a_past_expiry() {
        for ttl in [i64::MAX as u64 + 1, i64::MAX as u64, u64::MAX] {
            let codec = TokenCodec::new("k", ttl);
            assert!(matches!(
                codec.issue(1, "eve", "user"),
                Err(TokenError::Lifetime)
            ));
        }
    }

    #[test]
    fn debug_does_not_leak_secret() {
        let out = format!("{:?}", codec("super-secret-value"));
        assert!(!out.contains("super-secret-value"));
    }

    #[test]
    fn standard_hs256_verifier_accepts_tokens() {
        use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, decode_header};

        let exp = future();
        let token = codec("s3cr3t")
            .generate(&Claims {
                user_id: 42,
                username: "bob".into(),
                role: "user".into(),
                exp: Some(exp),
            })
            .unwrap();

        let header = decode_header(&token).unwrap();
        assert_eq!(header.alg, Algorithm::HS256);
        assert_eq!(header.typ.as_deref(), Some("JWT"));

        let data = decode::<Claims>(
            &token,
            &DecodingKey::from_secret(b"s3cr3t"),
            &Validation::new(Algorithm::HS256),
        )
        .unwrap();
        assert_eq!(data.claims.user_id, 42);
        assert_eq!(data.claims.exp, Some(exp));
    }
}
