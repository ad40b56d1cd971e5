//! Provider discovery from a dependency manifest

use std::path::Path;

/// Dependency names from a TOML manifest's `[dependencies]` table that
/// contain `filter` (lower-cased). Unparseable input yields nothing.
pub fn enumerate_candidates(manifest: &[u8], filter: &str) -> Vec<String> {
    let Ok(text) = std::str::from_utf8(manifest) else {
        return Vec::new();
    };
    let Ok(table) = toml::from_str::<toml::Table>(text) else {
        return Vec::new();
    };

    let needle = filter.to_lowercase();
    table
        .get("dependencies")
        .and_then(toml::Value::as_table)
        .map(|deps| {
            deps.keys()
                .filter(|name| name.contains(&needle))
                .cloned()
                .collect()
        })
        .unwrap_or_default()
}

/// [`enumerate_candidates`] over a manifest on disk; unreadable file yields nothing
pub fn list_available_providers(manifest_path: &Path, filter: &str) -> Vec<String> {
    match std::fs::read(manifest_path) {
        Ok(bytes) => enumerate_candidates(&bytes, filter),
        Err(e) => {
            tracing::debug!(
                path = %manifest_path.display(),
                error = %e,
                "Manifest not readable, no provider candidates"
            );
            Vec::new()
        }
    }
}
