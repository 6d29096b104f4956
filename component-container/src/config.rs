//! Configuration loading: the named `ConfigLoader` collaborator, a
//! filesystem-backed implementation, and `${NAME}` environment
//! substitution applied to every loaded JSON string before it is parsed.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

/// Named interface the container loads configuration text through.
/// `source` in the original spec is an opaque host-supplied pointer
/// (typically a directory or an in-memory store); here that's just
/// whatever state the concrete loader closes over.
pub trait ConfigLoader: Send + Sync {
    /// Returns the raw (already environment-substituted) JSON text for
    /// `name`, or `None` if no configuration exists under that name.
    fn load(&self, name: &str) -> Option<String>;
}

/// Reads `<base_dir>/<name>.json` and applies `${NAME}` substitution.
#[derive(Debug, Clone)]
pub struct FsConfigLoader {
    base_dir: PathBuf,
}

impl FsConfigLoader {
    pub fn new(base_dir: impl Into<PathBuf>) -> FsConfigLoader {
        FsConfigLoader {
            base_dir: base_dir.into(),
        }
    }
}

impl ConfigLoader for FsConfigLoader {
    fn load(&self, name: &str) -> Option<String> {
        let path = self.base_dir.join(format!("{name}.json"));
        let raw = fs::read_to_string(path).ok()?;
        Some(substitute_env(&raw))
    }
}

/// An in-memory loader for tests and embedded deployments that don't
/// want to touch the filesystem: a name-to-JSON-text map, still run
/// through `${NAME}` substitution so it behaves identically to
/// [`FsConfigLoader`].
#[derive(Debug, Clone, Default)]
pub struct MapConfigLoader {
    entries: HashMap<String, String>,
}

impl MapConfigLoader {
    pub fn new() -> MapConfigLoader {
        MapConfigLoader::default()
    }

    pub fn with(mut self, name: impl Into<String>, json: impl Into<String>) -> MapConfigLoader {
        self.entries.insert(name.into(), json.into());
        self
    }
}

impl ConfigLoader for MapConfigLoader {
    fn load(&self, name: &str) -> Option<String> {
        self.entries.get(name).map(|raw| substitute_env(raw))
    }
}

/// Replaces every `${NAME}` token with the value of the environment
/// variable `NAME`, or the empty string if it is unset. A bare `$` not
/// followed by `{` is passed through unchanged, as is an unterminated
/// `${...` with no closing brace (copied verbatim rather than swallowed,
/// since it's more useful for a malformed config to surface unchanged
/// than to vanish silently).
pub fn substitute_env(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(close) => {
                let name = &after[..close];
                out.push_str(&std::env::var(name).unwrap_or_default());
                rest = &after[close + 1..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
                break;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Parses a container-level configuration document: a JSON object
/// mapping `component_name -> component_type`.
pub fn parse_container_config(
    raw: &str,
) -> Result<HashMap<String, String>, serde_json::Error> {
    serde_json::from_str(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitutes_known_variable() {
        std::env::set_var("CONTAINER_TEST_VAR", "hello");
        let out = substitute_env(r#"{"greeting": "${CONTAINER_TEST_VAR}"}"#);
        assert_eq!(out, r#"{"greeting": "hello"}"#);
    }

    #[test]
    fn unset_variable_substitutes_to_empty() {
        std::env::remove_var("CONTAINER_TEST_UNSET");
        let out = substitute_env(r#"{"x": "${CONTAINER_TEST_UNSET}"}"#);
        assert_eq!(out, r#"{"x": ""}"#);
    }

    #[test]
    fn bare_dollar_passes_through() {
        let out = substitute_env("cost: $5");
        assert_eq!(out, "cost: $5");
    }

    #[test]
    fn unterminated_token_passes_through() {
        let out = substitute_env("${UNCLOSED");
        assert_eq!(out, "${UNCLOSED");
    }

    #[test]
    fn map_loader_applies_substitution_too() {
        std::env::set_var("CONTAINER_TEST_VAR", "world");
        let loader = MapConfigLoader::new().with("foo", r#"{"v": "${CONTAINER_TEST_VAR}"}"#);
        assert_eq!(loader.load("foo").unwrap(), r#"{"v": "world"}"#);
        assert!(loader.load("missing").is_none());
    }

    #[test]
    fn parses_container_level_config() {
        let map = parse_container_config(r#"{"clock": "Scheduler", "logger": "Logger"}"#).unwrap();
        assert_eq!(map.get("clock").unwrap(), "Scheduler");
        assert_eq!(map.get("logger").unwrap(), "Logger");
    }
}
