use crate::sbom_generation::domain::PackageUrl;

/// Namespace and name of a package as reported by an engine.
///
/// The engine's own purl is authoritative when it parses; otherwise the
/// reported name is split on the ecosystem's separator.
pub fn identity(purl: Option<&str>, reported_name: &str) -> (Option<String>, String) {
    if let Some(parsed) = purl.filter(|p| !p.is_empty()).and_then(PackageUrl::parse) {
        return (
            parsed.namespace().map(str::to_string),
            parsed.name().to_string(),
        );
    }
    split_name(reported_name)
}

/// Splits `group:artifact`, `@scope/name`, and `a/b/c` coordinates.
pub fn split_name(reported_name: &str) -> (Option<String>, String) {
    if let Some((group, artifact)) = reported_name.split_once(':') {
        if !group.is_empty() && !artifact.is_empty() {
            return (Some(group.to_string()), artifact.to_string());
        }
    }

    if let Some((namespace, name)) = reported_name.rsplit_once('/') {
        if !namespace.is_empty() && !name.is_empty() {
            return (Some(namespace.to_string()), name.to_string());
        }
    }

    (None, reported_name.to_string())
}
