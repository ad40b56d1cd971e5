//! Claim membership checks against verified tokens

use std::collections::BTreeMap;

use crate::token::{Result, TokenVerifier};

/// Requested claim name mapped to whether the token carries it
pub type ClaimValidationResult = BTreeMap<String, bool>;

/// Verify `token` and report which of `requested` it carries.
///
/// Cryptographic failures propagate unchanged. A verified payload that is not
/// a token record maps every requested claim to `false`.
pub fn validate_token_and_claims<V, S>(
    verifier: &V,
    token: &str,
    requested: &[S],
) -> Result<ClaimValidationResult>
where
    V: TokenVerifier + ?Sized,
    S: AsRef<str>,
{
    let payload = verifier.verify(token)?;

    let Some(record) = payload.token() else {
        tracing::debug!("Verified payload is not a token record, denying all claims");
        return Ok(requested
            .iter()
            .map(|claim| (claim.as_ref().to_string(), false))
            .collect());
    };

    Ok(requested
        .iter()
        .map(|claim| {
            let claim = claim.as_ref();
            (claim.to_string(), record.has_claim(claim))
        })
        .collect())
}
