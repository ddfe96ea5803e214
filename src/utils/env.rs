//! Environment variable helpers.

/// Look up an environment variable with the `PAWGATE_` prefix, falling back
/// to the unprefixed name.
///
/// `get_env_with_prefix("PORT")` checks `PAWGATE_PORT`, then `PORT` (the
/// fallback keeps common platform-provided variables working).
pub fn get_env_with_prefix(name: &str) -> Option<String> {
    std::env::var(format!("PAWGATE_{}", name))
        .or_else(|_| std::env::var(name))
        .ok()
}
