//! Configuration loading: file, then environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::ProxyConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value '{value}' for {var}")]
    Env { var: &'static str, value: String },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration.
///
/// Layering order: defaults, then the TOML file at `path` (if any), then
/// environment variables.
pub fn load_config(path: Option<&Path>) -> Result<ProxyConfig, ConfigError> {
    let mut config = match path {
        Some(path) => load_file(path)?,
        None => ProxyConfig::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Parse a TOML file without validating it.
pub fn load_file(path: &Path) -> Result<ProxyConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Overlay environment variables onto `config`.
///
/// `lookup` abstracts `std::env::var` so tests can supply a fixed map.
/// Blank values are ignored.
pub fn apply_env_overrides<F>(config: &mut ProxyConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(v) = get("SCRIPT_URL") {
        config.upstream.url = Some(v);
    }
    if let Some(v) = get("GITHUB_TOKEN") {
        config.assets.token = Some(v);
    }
    if let Some(v) = get("GITHUB_OWNER") {
        config.assets.owner = Some(v);
    }
    if let Some(v) = get("GITHUB_REPO") {
        config.assets.repo = Some(v);
    }
    if let Some(v) = get("GITHUB_BRANCH") {
        config.assets.branch = Some(v);
    }
    if let Some(v) = get("GITHUB_API_URL") {
        config.assets.api_base = v;
    }
    if let Some(v) = get("HOST") {
        config.listener.host = v;
    }
    if let Some(v) = get("PORT") {
        config.listener.port = v
            .trim()
            .parse()
            .map_err(|_| ConfigError::Env { var: "PORT", value: v })?;
    }
    if let Some(v) = get("STATIC_ROOT") {
        config.static_files.root = v;
    }
    if let Some(v) = get("RESOLVE_MEDIA") {
        config.media.resolve_api_responses =
            parse_flag(&v).ok_or(ConfigError::Env { var: "RESOLVE_MEDIA", value: v })?;
    }
    if let Some(v) = get("MEDIA_CONCURRENCY") {
        config.media.concurrency = v.trim().parse().map_err(|_| ConfigError::Env {
            var: "MEDIA_CONCURRENCY",
            value: v,
        })?;
    }
    if let Some(v) = get("LOG_FORMAT") {
        config.observability.log_format = v;
    }

    Ok(())
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_env_overrides() {
        let mut config = ProxyConfig::default();
        apply_env_overrides(
            &mut config,
            env(&[
                ("SCRIPT_URL", "https://script.example.com/exec"),
                ("GITHUB_TOKEN", "ghp_x"),
                ("GITHUB_OWNER", "acme"),
                ("GITHUB_REPO", "assets"),
                ("PORT", "8080"),
                ("RESOLVE_MEDIA", "off"),
                ("MEDIA_CONCURRENCY", "4"),
            ]),
        )
        .unwrap();

        assert_eq!(config.upstream.url.as_deref(), Some("https://script.example.com/exec"));
        assert_eq!(config.assets.token.as_deref(), Some("ghp_x"));
        assert_eq!(config.assets.owner.as_deref(), Some("acme"));
        assert_eq!(config.assets.repo.as_deref(), Some("assets"));
        assert_eq!(config.listener.port, 8080);
        assert!(!config.media.resolve_api_responses);
        assert_eq!(config.media.concurrency, 4);
    }

    #[test]
    fn test_blank_env_values_are_ignored() {
        let mut config = ProxyConfig::default();
        apply_env_overrides(&mut config, env(&[("SCRIPT_URL", "  "), ("PORT", "")])).unwrap();
        assert!(config.upstream.url.is_none());
        assert_eq!(config.listener.port, 3000);
    }

    #[test]
    fn test_bad_port_is_reported() {
        let mut config = ProxyConfig::default();
        let err = apply_env_overrides(&mut config, env(&[("PORT", "eighty")])).unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }

    #[test]
    fn test_load_file_then_env() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[upstream]\nurl = \"https://from-file.example.com/exec\"\n\n[listener]\nport = 4000"
        )
        .unwrap();

        let mut config = load_file(file.path()).unwrap();
        assert_eq!(config.listener.port, 4000);

        apply_env_overrides(&mut config, env(&[("SCRIPT_URL", "https://from-env.example.com/exec")]))
            .unwrap();
        assert_eq!(config.upstream.url.as_deref(), Some("https://from-env.example.com/exec"));
        assert_eq!(config.listener.port, 4000);
    }

    #[test]
    fn test_validation_error_display() {
        let err = ConfigError::Validation(vec![
            ValidationError::MissingUpstreamUrl,
            ValidationError::ZeroPort,
        ]);
        let msg = err.to_string();
        assert!(msg.starts_with("Validation failed: "));
        assert!(msg.contains("SCRIPT_URL"));
        assert!(msg.contains(", listener port"));
    }
}
