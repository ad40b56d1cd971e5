//! Tenant resolution from bearer tokens
//!
//! Two entry points with different strictness coexist:
//!
//! - [`extract_tenant`] - legacy lookup, trusts whatever the verified record says
//! - [`validate_and_extract_tenant`] - hardened lookup returning a
//!   [`TenantValidationResult`] whose `status_code` maps directly to HTTP
//!
//! Both resolve the tenant through [`resolve_tenant_id`], which accepts the
//! legacy `TENANT_ID` field when `tenantId` is absent.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use serde::Serialize;

use crate::token::{DEFAULT_TENANT_ID, NormalizedToken, Result, TokenVerifier, VerifiedPayload};

const BEARER_PREFIX: &str = "Bearer ";

const STATUS_UNAUTHORIZED: u16 = 401;
const STATUS_FORBIDDEN: u16 = 403;
const STATUS_INTERNAL: u16 = 500;

/// Result of the legacy tenant lookup
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TenantLookup {
    pub success: bool,
    pub tenant_id: Option<String>,
}

impl TenantLookup {
    fn found(tenant_id: Option<String>) -> Self {
        Self {
            success: true,
            tenant_id,
        }
    }

    const fn failed() -> Self {
        Self {
            success: false,
            tenant_id: None,
        }
    }
}

/// Uniform decision object for tenant validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantValidationResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
}

impl TenantValidationResult {
    pub fn ok(tenant_id: impl Into<String>) -> Self {
        Self {
            success: true,
            tenant_id: Some(tenant_id.into()),
            error: None,
            status_code: None,
        }
    }

    pub fn fail(error: impl Into<String>, status_code: u16) -> Self {
        Self {
            success: false,
            tenant_id: None,
            error: Some(error.into()),
            status_code: Some(status_code),
        }
    }
}

/// Options for [`validate_and_extract_tenant`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantOptions {
    pub authenticated: bool,
    pub default_tenant_id: String,
    pub tenant_id_header: Option<String>,
}

impl Default for TenantOptions {
    fn default() -> Self {
        Self {
            authenticated: false,
            default_tenant_id: DEFAULT_TENANT_ID.to_string(),
            tenant_id_header: None,
        }
    }
}

impl TenantOptions {
    #[must_use]
    pub fn authenticated() -> Self {
        Self {
            authenticated: true,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn unauthenticated() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_default_tenant_id(mut self, tenant_id: impl Into<String>) -> Self {
        self.default_tenant_id = tenant_id.into();
        self
    }

    #[must_use]
    pub fn with_tenant_id_header(mut self, header: impl Into<String>) -> Self {
        self.tenant_id_header = Some(header.into());
        self
    }
}

/// Tenant id carried by a verified record, `tenantId` first then `TENANT_ID`.
///
/// Same emptiness rule as issuance, see [`crate::token::pick_tenant_id`].
pub fn resolve_tenant_id(record: &NormalizedToken) -> Option<&str> {
    record.resolved_tenant_id()
}

/// Legacy tenant lookup.
///
/// Unauthenticated callers always land on the default tenant. Authenticated
/// callers need a header; its second space-separated segment is verified and
/// the record's tenant is returned untrimmed. Verification failures propagate.
pub fn extract_tenant<V>(
    verifier: &V,
    authenticated: bool,
    authorization_header: Option<&str>,
) -> Result<TenantLookup>
where
    V: TokenVerifier + ?Sized,
{
    if !authenticated {
        return Ok(TenantLookup::found(Some(DEFAULT_TENANT_ID.to_string())));
    }

    let Some(header) = authorization_header.filter(|h| !h.is_empty()) else {
        return Ok(TenantLookup::failed());
    };

    let token = header.split(' ').nth(1).unwrap_or_default();

    match verifier.verify(token)? {
        VerifiedPayload::Valid(record) => Ok(TenantLookup::found(
            resolve_tenant_id(&record).map(str::to_string),
        )),
        VerifiedPayload::Malformed(_) => {
            tracing::debug!("Legacy tenant lookup got a non-record payload");
            Ok(TenantLookup::failed())
        }
    }
}

/// Hardened tenant validation for a raw `Authorization` header.
///
/// Never fails: every outcome, including unexpected panics inside the
/// verifier, is folded into the returned result. The process panic hook still
/// runs first, so a panicking verifier prints its message to stderr unless the
/// caller has installed a quieter hook with [`std::panic::set_hook`].
pub fn validate_and_extract_tenant<V>(
    verifier: &V,
    authorization_header: Option<&str>,
    options: &TenantOptions,
) -> TenantValidationResult
where
    V: TokenVerifier + ?Sized,
{
    guarded(|| {
        if options.authenticated {
            tenant_from_header(verifier, authorization_header)
        } else {
            tenant_for_anonymous(options)
        }
    })
}

/// Hardened tenant validation for a bare token string
pub fn validate_token_and_extract_tenant<V>(verifier: &V, token: &str) -> TenantValidationResult
where
    V: TokenVerifier + ?Sized,
{
    guarded(|| match verifier.verify(token) {
        Ok(payload) => tenant_from_payload(payload),
        Err(e) => TenantValidationResult::fail(
            format!("Failed to validate token and extract tenant: {e}"),
            STATUS_UNAUTHORIZED,
        ),
    })
}

fn tenant_from_header<V>(verifier: &V, header: Option<&str>) -> TenantValidationResult
where
    V: TokenVerifier + ?Sized,
{
    let Some(token) = header.and_then(|h| h.strip_prefix(BEARER_PREFIX)) else {
        return TenantValidationResult::fail(
            "Missing or invalid authorization header",
            STATUS_UNAUTHORIZED,
        );
    };

    match verifier.verify(token) {
        Ok(payload) => tenant_from_payload(payload),
        Err(e) => TenantValidationResult::fail(
            format!("Failed to decode JWT token: {e}"),
            STATUS_UNAUTHORIZED,
        ),
    }
}

fn tenant_for_anonymous(options: &TenantOptions) -> TenantValidationResult {
    match options
        .tenant_id_header
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
    {
        Some(tenant_id) => TenantValidationResult::ok(tenant_id),
        None => TenantValidationResult::ok(options.default_tenant_id.clone()),
    }
}

fn tenant_from_payload(payload: VerifiedPayload) -> TenantValidationResult {
    let VerifiedPayload::Valid(record) = payload else {
        return TenantValidationResult::fail("Invalid JWT token", STATUS_UNAUTHORIZED);
    };

    match resolve_tenant_id(&record)
        .map(str::trim)
        .filter(|t| !t.is_empty())
    {
        Some(tenant_id) => TenantValidationResult::ok(tenant_id),
        None => {
            tracing::debug!(subject = %record.subject_id, "Token carries no tenant");
            TenantValidationResult::fail(
                "TENANT_ID attribute is required and cannot be blank",
                STATUS_FORBIDDEN,
            )
        }
    }
}

fn guarded<F>(f: F) -> TenantValidationResult
where
    F: FnOnce() -> TenantValidationResult,
{
    panic::catch_unwind(AssertUnwindSafe(f)).unwrap_or_else(|payload| {
        let message = panic_message(payload.as_ref());
        tracing::error!(error = %message, "Unexpected failure during tenant validation");
        TenantValidationResult::fail(
            format!("Error in tenant validation: {message}"),
            STATUS_INTERNAL,
        )
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown error".to_string()
    }
}
