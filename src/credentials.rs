//! # Credential Resolver
//!
//! Resolves the API key for a named external API from the process
//! environment. The variable is the uppercased alias with an `_API_KEY`
//! suffix (`WEATHER_API_KEY`, `NEWS_API_KEY`).
//!
//! Resolution never fails; an unset or empty variable yields `None` and the
//! caller decides how fatal that is. Keys are re-read on every call so a
//! rotated credential takes effect without a restart.

use crate::api::ApiAlias;

/// Environment variable name for an API alias
pub fn env_key(alias: ApiAlias) -> String {
    format!("{}_API_KEY", alias.as_str().to_uppercase())
}

/// Look up the API key for `alias`, treating empty values as absent
pub fn resolve(alias: ApiAlias) -> Option<String> {
    let key = env_key(alias);
    match std::env::var(&key) {
        Ok(value) if !value.trim().is_empty() => Some(value),
        _ => {
            tracing::warn!(api_alias = %alias, env_key = %key, "API key not found in environment");
            None
        }
    }
}
