//! Keycloak role structures to flat claim lists

use meshauth_core::{AdapterError, RolePolicy};
use serde_json::Value;

use crate::decode::UpstreamClaims;

/// Collect resource roles (every client, in payload order) followed by realm
/// roles. Duplicates are kept.
pub fn map_roles(claims: &UpstreamClaims, policy: RolePolicy) -> Result<Vec<String>, AdapterError> {
    let mut roles = Vec::new();

    if let Some(Value::Object(resources)) = claims.get("resource_access") {
        for group in resources.values() {
            roles.extend(group_roles(group));
        }
    }

    match claims.get("realm_access") {
        Some(group) if group.is_object() => roles.extend(group_roles(group)),
        _ if policy == RolePolicy::Strict => return Err(AdapterError::NoRolesConfigured),
        _ => {}
    }

    Ok(roles)
}

fn group_roles(group: &Value) -> impl Iterator<Item = String> + '_ {
    group
        .get("roles")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
        .map(str::to_string)
}
