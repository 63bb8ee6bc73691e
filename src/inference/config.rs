//! Client configuration loading and validation.
//!
//! Reads `localchat.yaml` and resolves environment variables. The defaults
//! cover the common localhost Ollama setup, so the file is optional; when
//! present it is discovered by walking upward from the working directory.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::errors::InferenceError;
use super::types::GenerationOptions;

/// Default inference server base URL.
pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Default model identifier.
pub const DEFAULT_MODEL: &str = "deepseek-r1:8b";

/// Config file name searched for when no path is given.
pub const CONFIG_FILE_NAME: &str = "localchat.yaml";

/// Upper bound accepted for `num_predict`.
const MAX_NUM_PREDICT: u32 = 32_768;

/// Top-level client configuration (mirrors `localchat.yaml`).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the inference server.
    pub base_url: String,
    /// Model identifier sent with every chat request.
    pub model: String,
    /// Sampling options sent with every chat request.
    pub options: GenerationOptions,
    /// Whether reasoning blocks are rendered by default.
    pub show_reasoning: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            options: GenerationOptions {
                temperature: Some(0.3),
                num_predict: Some(4000),
                top_p: Some(0.8),
                extra: Default::default(),
            },
            show_reasoning: true,
        }
    }
}

impl ClientConfig {
    /// Validate recognized option ranges.
    ///
    /// Fields in `options.extra` are not checked; the server owns their
    /// semantics.
    pub fn validate(&self) -> Result<(), InferenceError> {
        if self.base_url.trim().is_empty() {
            return Err(InferenceError::Config {
                reason: "base_url must not be empty".into(),
            });
        }
        if self.model.trim().is_empty() {
            return Err(InferenceError::Config {
                reason: "model must not be empty".into(),
            });
        }
        if let Some(t) = self.options.temperature {
            if !(0.0..=1.0).contains(&t) {
                return Err(InferenceError::Config {
                    reason: format!("temperature {t} outside 0.0..=1.0"),
                });
            }
        }
        if let Some(p) = self.options.top_p {
            if !(0.0..=1.0).contains(&p) {
                return Err(InferenceError::Config {
                    reason: format!("top_p {p} outside 0.0..=1.0"),
                });
            }
        }
        if let Some(n) = self.options.num_predict {
            if n == 0 || n > MAX_NUM_PREDICT {
                return Err(InferenceError::Config {
                    reason: format!("num_predict {n} outside 1..={MAX_NUM_PREDICT}"),
                });
            }
        }
        Ok(())
    }
}

// ─── Loading ─────────────────────────────────────────────────────────────────

/// Search upward from `start` for a `localchat.yaml`.
pub fn find_config_path(start: &Path) -> Option<PathBuf> {
    let mut dir = start.to_path_buf();
    loop {
        let candidate = dir.join(CONFIG_FILE_NAME);
        if candidate.exists() {
            return Some(candidate);
        }
        if !dir.pop() {
            return None;
        }
    }
}

/// Load and parse a configuration file.
///
/// Performs environment-variable interpolation on string values matching
/// `${VAR_NAME}` or `${VAR_NAME:-default}` before parsing, then validates
/// recognized option ranges.
pub fn load_config(path: &Path) -> Result<ClientConfig, InferenceError> {
    let raw = std::fs::read_to_string(path).map_err(|e| InferenceError::Config {
        reason: format!("failed to read {}: {e}", path.display()),
    })?;

    let interpolated = interpolate_env_vars(&raw);

    let config: ClientConfig =
        serde_yaml::from_str(&interpolated).map_err(|e| InferenceError::Config {
            reason: format!("failed to parse {}: {e}", path.display()),
        })?;

    config.validate()?;
    Ok(config)
}

// ─── Env-var interpolation ───────────────────────────────────────────────────

/// Replace `${VAR}` and `${VAR:-default}` in a string.
fn interpolate_env_vars(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && chars.peek() == Some(&'{') {
            chars.next(); // consume '{'
            let mut var_expr = String::new();
            for c in chars.by_ref() {
                if c == '}' {
                    break;
                }
                var_expr.push(c);
            }
            result.push_str(&resolve_var_expr(&var_expr));
        } else {
            result.push(ch);
        }
    }

    result
}

/// Resolve a variable expression like `VAR` or `VAR:-default`.
fn resolve_var_expr(expr: &str) -> String {
    if let Some(idx) = expr.find(":-") {
        let var_name = &expr[..idx];
        let default = &expr[idx + 2..];
        std::env::var(var_name).unwrap_or_else(|_| expand_tilde(default))
    } else {
        std::env::var(expr).unwrap_or_default()
    }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &str) -> String {
    if let Some(rest) = path.strip_prefix('~') {
        if let Some(home) = dirs::home_dir() {
            return format!("{}{rest}", home.display());
        }
    }
    path.to_string()
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_target_local_ollama() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.options.temperature, Some(0.3));
        assert_eq!(config.options.num_predict, Some(4000));
        assert!(config.show_reasoning);
        config.validate().unwrap();
    }

    #[test]
    fn test_validate_rejects_out_of_range_temperature() {
        let mut config = ClientConfig::default();
        config.options.temperature = Some(1.5);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_out_of_range_top_p() {
        let mut config = ClientConfig::default();
        config.options.top_p = Some(-0.1);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_num_predict() {
        let mut config = ClientConfig::default();
        config.options.num_predict = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_model() {
        let mut config = ClientConfig::default();
        config.model = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_interpolate_env_vars_with_default() {
        std::env::remove_var("__TEST_NONEXISTENT_VAR__");
        let input = "${__TEST_NONEXISTENT_VAR__:-http://fallback:11434}";
        assert_eq!(interpolate_env_vars(input), "http://fallback:11434");
    }

    #[test]
    fn test_interpolate_env_vars_with_value() {
        std::env::set_var("__TEST_LOCALCHAT_VAR__", "http://custom:9999");
        let input = "${__TEST_LOCALCHAT_VAR__:-http://fallback:11434}";
        assert_eq!(interpolate_env_vars(input), "http://custom:9999");
        std::env::remove_var("__TEST_LOCALCHAT_VAR__");
    }

    #[test]
    fn test_interpolate_no_vars() {
        let input = "plain text with no variables";
        assert_eq!(interpolate_env_vars(input), input);
    }

    #[test]
    fn test_expand_tilde() {
        let result = expand_tilde("~/models");
        assert!(!result.starts_with('~'), "tilde should be expanded");
        assert!(result.ends_with("/models"));
    }

    #[test]
    fn test_load_config_from_file() {
        let yaml = "\
base_url: \"http://localhost:8080\"
model: \"qwen3:4b\"
options:
  temperature: 0.7
  seed: 42
show_reasoning: false
";
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), yaml).unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.base_url, "http://localhost:8080");
        assert_eq!(config.model, "qwen3:4b");
        assert_eq!(config.options.temperature, Some(0.7));
        assert_eq!(config.options.extra.get("seed"), Some(&serde_json::json!(42)));
        assert!(!config.show_reasoning);
    }

    #[test]
    fn test_load_config_rejects_invalid_ranges() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "options:\n  temperature: 2.0").unwrap();
        assert!(load_config(file.path()).is_err());
    }

    #[test]
    fn test_find_config_path_missing_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(find_config_path(dir.path()).is_none());
    }

    #[test]
    fn test_find_config_path_walks_upward() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "model: test:1b").unwrap();
        let nested = dir.path().join("a/b");
        std::fs::create_dir_all(&nested).unwrap();

        let found = find_config_path(&nested).unwrap();
        assert_eq!(found, dir.path().join(CONFIG_FILE_NAME));
    }
}
