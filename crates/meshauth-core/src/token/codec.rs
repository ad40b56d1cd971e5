//! RS256 signing and verification of normalized tokens

use std::sync::Arc;
use std::time::Duration;

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde_json::Value;

use super::error::{KeyKind, Result, TokenError};
use super::keys::KeyMaterial;
use super::{NormalizedToken, VerifiedPayload, unix_now};

const SIGNING_ALGORITHM: Algorithm = Algorithm::RS256;

/// Verifies a signed token string into a payload
///
/// Consumers of verified tokens depend on this trait rather than on
/// [`TokenCodec`] directly.
pub trait TokenVerifier: Send + Sync {
    fn verify(&self, token: &str) -> Result<VerifiedPayload>;
}

/// Signs and verifies normalized tokens with the local key pair
pub struct TokenCodec {
    keys: Arc<dyn KeyMaterial>,
    leeway: Duration,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("algorithm", &SIGNING_ALGORITHM)
            .field("leeway", &self.leeway)
            .finish_non_exhaustive()
    }
}

impl TokenCodec {
    pub fn new(keys: Arc<dyn KeyMaterial>) -> Self {
        Self {
            keys,
            leeway: Duration::ZERO,
        }
    }

    /// Clock skew tolerated when checking `exp`
    #[must_use]
    pub const fn with_leeway(mut self, leeway: Duration) -> Self {
        self.leeway = leeway;
        self
    }

    pub fn sign(&self, record: &NormalizedToken) -> Result<String> {
        let pem = self.keys.private_key()?;
        let key = EncodingKey::from_rsa_pem(&pem)
            .map_err(|_| TokenError::KeyUnavailable(KeyKind::Private))?;

        if record.is_expired_at(unix_now()) {
            return Err(TokenError::ExpiredRecord);
        }

        let token = jsonwebtoken::encode(&Header::new(SIGNING_ALGORITHM), record, &key)
            .map_err(|e| TokenError::Encode(e.to_string()))?;

        tracing::debug!(
            subject = %record.subject_id,
            claims = record.claims.len(),
            "Signed normalized token"
        );

        Ok(token)
    }

    pub fn verify(&self, token: &str) -> Result<VerifiedPayload> {
        let pem = self.keys.public_key()?;
        let key = DecodingKey::from_rsa_pem(&pem)
            .map_err(|_| TokenError::KeyUnavailable(KeyKind::Public))?;

        let mut validation = Validation::new(SIGNING_ALGORITHM);
        validation.validate_aud = false;
        validation.leeway = self.leeway.as_secs();

        let data = jsonwebtoken::decode::<Value>(token, &key, &validation).map_err(|e| {
            let err = TokenError::from(e);
            tracing::debug!(error = %err, "Token verification failed");
            err
        })?;

        match data.claims {
            Value::String(text) => Ok(VerifiedPayload::Malformed(text)),
            payload => serde_json::from_value(payload)
                .map(VerifiedPayload::Valid)
                .map_err(|e| TokenError::Unauthorized(e.to_string())),
        }
    }
}

impl TokenVerifier for TokenCodec {
    fn verify(&self, token: &str) -> Result<VerifiedPayload> {
        Self::verify(self, token)
    }
}

#[cfg(test)]
mod tests {
    use jsonwebtoken::{EncodingKey, Header, encode};

    use super::*;
    use crate::test_support::{OTHER_PRIVATE_KEY, PRIVATE_KEY, PUBLIC_KEY, codec, sample_token};
    use crate::token::StaticKeyMaterial;

    #[test]
    fn test_round_trip_preserves_every_field() {
        let codec = codec();
        let record = sample_token()
            .with_claims(["POST_V1_EVALUATE", "default-roles", "POST_V1_EVALUATE"]);

        let signed = codec.sign(&record).unwrap();
        assert_eq!(signed.split('.').count(), 3);

        let verified = codec.verify(&signed).unwrap();
        assert_eq!(verified, VerifiedPayload::Valid(record));
    }

    #[test]
    fn test_signed_header_uses_rs256() {
        let signed = codec().sign(&sample_token()).unwrap();
        let header = jsonwebtoken::decode_header(&signed).unwrap();
        assert_eq!(header.alg, Algorithm::RS256);
    }

    #[test]
    fn test_sign_without_private_key() {
        let codec = TokenCodec::new(Arc::new(StaticKeyMaterial::public_only(PUBLIC_KEY)));
        let err = codec.sign(&sample_token()).unwrap_err();
        assert_eq!(err.to_string(), "Missing or Corrupted Private Key");
    }

    #[test]
    fn test_sign_with_corrupted_private_key() {
        let codec = TokenCodec::new(Arc::new(StaticKeyMaterial::new(
            b"not a pem".to_vec(),
            PUBLIC_KEY,
        )));
        assert!(matches!(
            codec.sign(&sample_token()),
            Err(TokenError::KeyUnavailable(KeyKind::Private))
        ));
    }

    #[test]
    fn test_sign_rejects_expired_record() {
        let record = NormalizedToken::new("user-1", "issuer", unix_now() - 10);
        assert!(matches!(
            codec().sign(&record),
            Err(TokenError::ExpiredRecord)
        ));
    }

    #[test]
    fn test_verify_without_public_key() {
        let codec = TokenCodec::new(Arc::new(StaticKeyMaterial::default()));
        let err = codec.verify("a.b.c").unwrap_err();
        assert_eq!(err.to_string(), "Missing or Corrupted Public Key");
    }

    #[test]
    fn test_verify_expired_token() {
        let record = NormalizedToken::new("user-1", "issuer", unix_now() - 3600);
        let signed = encode(
            &Header::new(Algorithm::RS256),
            &record,
            &EncodingKey::from_rsa_pem(PRIVATE_KEY).unwrap(),
        )
        .unwrap();

        let err = codec().verify(&signed).unwrap_err();
        assert_eq!(err.to_string(), "401 Unauthorized - token expired");
    }

    #[test]
    fn test_verify_expired_token_within_leeway() {
        let record = NormalizedToken::new("user-1", "issuer", unix_now() - 5);
        let signed = encode(
            &Header::new(Algorithm::RS256),
            &record,
            &EncodingKey::from_rsa_pem(PRIVATE_KEY).unwrap(),
        )
        .unwrap();

        let codec = codec().with_leeway(Duration::from_secs(60));
        assert!(codec.verify(&signed).is_ok());
    }

    #[test]
    fn test_verify_foreign_signature() {
        let foreign = TokenCodec::new(Arc::new(StaticKeyMaterial::new(
            OTHER_PRIVATE_KEY,
            PUBLIC_KEY,
        )));
        let signed = foreign.sign(&sample_token()).unwrap();

        let err = codec().verify(&signed).unwrap_err();
        assert!(err.is_unauthorized());
        assert_ne!(err.reason(), Some("token expired"));
    }

    #[test]
    fn test_verify_structurally_malformed() {
        let err = codec().verify("not-a-token").unwrap_err();
        assert!(err.to_string().starts_with("401 Unauthorized - "));
    }

    #[test]
    fn test_verify_empty_string() {
        assert!(codec().verify("").unwrap_err().is_unauthorized());
    }

    #[test]
    fn test_verify_object_not_shaped_like_record() {
        let payload = serde_json::json!({ "exp": unix_now() + 600, "iss": "issuer" });
        let signed = encode(
            &Header::new(Algorithm::RS256),
            &payload,
            &EncodingKey::from_rsa_pem(PRIVATE_KEY).unwrap(),
        )
        .unwrap();

        let err = codec().verify(&signed).unwrap_err();
        assert!(err.is_unauthorized());
        assert!(err.to_string().contains("clientId"));
    }

    #[test]
    fn test_codec_debug_hides_keys() {
        let debug_str = format!("{:?}", codec());
        assert!(debug_str.contains("RS256"));
        assert!(!debug_str.contains("PRIVATE KEY"));
    }
}
