//! Configuration loading from environment variables.

use crate::constants::{
    ADMIN_TOKEN_ENV, DEFAULT_GITHUB_API_URL, DEFAULT_GITHUB_BRANCH, DEFAULT_MAX_BODY_SIZE,
    DEFAULT_PORT, GITHUB_API_URL_ENV, GITHUB_BRANCH_ENV, GITHUB_REPO_ENV, GITHUB_TOKEN_ENV,
    HOSTED_ENV_FLAG,
};
use crate::text::normalize_optional_nonempty;
use std::env;
use std::path::PathBuf;

/// Runtime configuration for LiveEdit.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory that document paths are resolved against.
    pub project_root: PathBuf,
    pub port: u16,
    pub max_body_size: usize,
    /// `true` when running on the hosting platform; selects the GitHub backend.
    pub hosted: bool,
    pub github: GitHubConfig,
    /// Bearer token required by action endpoints, when set.
    pub admin_token: Option<String>,
}

/// Credentials and endpoint for the GitHub persistence backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitHubConfig {
    pub repo: Option<String>,
    pub token: Option<String>,
    pub branch: String,
    pub api_url: String,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            repo: None,
            token: None,
            branch: DEFAULT_GITHUB_BRANCH.to_string(),
            api_url: DEFAULT_GITHUB_API_URL.to_string(),
        }
    }
}

impl GitHubConfig {
    /// Names of required GitHub variables that are not configured.
    ///
    /// # Returns
    /// An empty list when both the repository and the token are present.
    pub fn missing(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.token.is_none() {
            missing.push(GITHUB_TOKEN_ENV);
        }
        if self.repo.is_none() {
            missing.push(GITHUB_REPO_ENV);
        }
        missing
    }
}

/// Parse a boolean-like environment flag value.
///
/// # Supported Values
/// - Truthy: `1`, `true`, `yes`, `on`
/// - Falsy: `0`, `false`, `no`, `off`, empty string
///
/// Matching is case-insensitive and ignores surrounding whitespace.
///
/// # Returns
/// `Some(bool)` when the value is recognized, otherwise `None`.
pub fn parse_env_flag(value: &str) -> Option<bool> {
    let normalized = value.trim().to_ascii_lowercase();
    match normalized.as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "" | "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Read a boolean flag from the environment.
///
/// Missing or unrecognized values are treated as `false`.
///
/// # Arguments
/// - `name`: Environment variable name.
///
/// # Returns
/// `true` when the value is a recognized truthy value.
pub fn env_flag_enabled(name: &str) -> bool {
    env::var(name)
        .ok()
        .and_then(|value| parse_env_flag(&value))
        .unwrap_or(false)
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Returns
    /// A populated [`Config`] with defaults applied when env vars are missing.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// The hosted flag only checks for presence: any non-empty value (the
    /// platform sets `VERCEL=1`) selects remote persistence.
    ///
    /// # Arguments
    /// - `lookup`: Returns the raw value for a variable name, if set.
    ///
    /// # Returns
    /// A populated [`Config`].
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let project_root = lookup("PROJECT_ROOT")
            .and_then(|raw| normalize_optional_nonempty(Some(raw)))
            .map(PathBuf::from)
            .or_else(|| env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."));

        let github = GitHubConfig {
            repo: normalize_optional_nonempty(lookup(GITHUB_REPO_ENV)),
            token: normalize_optional_nonempty(lookup(GITHUB_TOKEN_ENV)),
            branch: normalize_optional_nonempty(lookup(GITHUB_BRANCH_ENV))
                .unwrap_or_else(|| DEFAULT_GITHUB_BRANCH.to_string()),
            api_url: normalize_optional_nonempty(lookup(GITHUB_API_URL_ENV))
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_GITHUB_API_URL.to_string()),
        };

        Self {
            project_root,
            port: lookup("PORT")
                .and_then(|p| p.trim().parse().ok())
                .unwrap_or(DEFAULT_PORT),
            max_body_size: lookup("MAX_BODY_SIZE")
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(DEFAULT_MAX_BODY_SIZE),
            hosted: lookup(HOSTED_ENV_FLAG).is_some_and(|value| !value.trim().is_empty()),
            github,
            admin_token: normalize_optional_nonempty(lookup(ADMIN_TOKEN_ENV)),
        }
    }

    /// Local-development configuration rooted at `project_root`.
    ///
    /// # Returns
    /// A [`Config`] using the local backend and no admin token.
    pub fn local(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            port: DEFAULT_PORT,
            max_body_size: DEFAULT_MAX_BODY_SIZE,
            hosted: false,
            github: GitHubConfig::default(),
            admin_token: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_env_flag, Config};
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn parse_env_flag_accepts_truthy_values() {
        for value in ["1", "true", "TRUE", " yes ", "on"] {
            assert_eq!(parse_env_flag(value), Some(true), "value: {}", value);
        }
    }

    #[test]
    fn parse_env_flag_rejects_unknown_values() {
        assert_eq!(parse_env_flag("maybe"), None);
        assert_eq!(parse_env_flag(" off "), Some(false));
    }

    #[test]
    fn hosted_flag_is_presence_based() {
        let unset = Config::from_lookup(lookup_from(&[]));
        assert!(!unset.hosted);

        let empty = Config::from_lookup(lookup_from(&[("VERCEL", "  ")]));
        assert!(!empty.hosted);

        let set = Config::from_lookup(lookup_from(&[("VERCEL", "1")]));
        assert!(set.hosted);
    }

    #[test]
    fn github_settings_apply_defaults_and_report_missing() {
        let config = Config::from_lookup(lookup_from(&[
            ("GITHUB_REPO", " helivex/storefront "),
            ("GITHUB_API_URL", "http://127.0.0.1:9000/"),
        ]));
        assert_eq!(config.github.repo.as_deref(), Some("helivex/storefront"));
        assert_eq!(config.github.branch, "main");
        assert_eq!(config.github.api_url, "http://127.0.0.1:9000");
        assert_eq!(config.github.missing(), vec!["GITHUB_TOKEN"]);
    }

    #[test]
    fn numeric_settings_fall_back_on_garbage() {
        let config = Config::from_lookup(lookup_from(&[
            ("PORT", "not-a-port"),
            ("MAX_BODY_SIZE", "2048"),
            ("PROJECT_ROOT", "/srv/storefront"),
            ("ADMIN_TOKEN", ""),
        ]));
        assert_eq!(config.port, crate::constants::DEFAULT_PORT);
        assert_eq!(config.max_body_size, 2048);
        assert_eq!(config.project_root, std::path::PathBuf::from("/srv/storefront"));
        assert!(config.admin_token.is_none());
    }
}
