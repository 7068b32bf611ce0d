use crate::adapters::html::image_selector;
use crate::adapters::http::{default_params, DEFAULT_ENDPOINT, DEFAULT_USER_AGENT};
use crate::core::resolver::ResolverSettings;
use crate::utils::error::{EnrichError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_positive_number, validate_range, validate_url, Validate,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

/// Optional tuning file. Every key falls back to the built-in defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EnricherConfig {
    pub search: SearchConfig,
    pub retry: RetryConfig,
    pub batch: BatchConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub endpoint: String,
    pub user_agent: String,
    pub timeout_seconds: u64,
    pub image_class: String,
    /// Sent with every request besides `q`.
    pub params: BTreeMap<String, String>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_seconds: 30,
            image_class: "mimg".to_string(),
            params: default_params().into_iter().collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_tries: usize,
    pub initial_backoff_secs: f64,
    pub retry_on_empty: bool,
    pub query_suffixes: Vec<String>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_tries: 3,
            initial_backoff_secs: 1.0,
            retry_on_empty: false,
            query_suffixes: vec!["product".to_string(), "image".to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Wait between rows.
    pub pace_secs: f64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self { pace_secs: 1.0 }
    }
}

impl EnricherConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(EnrichError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| EnrichError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the environment value; unknown variables stay as written.
    fn substitute_env_vars(content: &str) -> String {
        use regex::Regex;
        use std::sync::OnceLock;

        static ENV_VAR: OnceLock<Regex> = OnceLock::new();
        let re = ENV_VAR.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("valid regex"));

        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .into_owned()
    }

    pub fn resolver_settings(&self) -> ResolverSettings {
        ResolverSettings {
            max_tries: self.retry.max_tries as u32,
            initial_backoff: Duration::from_secs_f64(self.retry.initial_backoff_secs),
            query_suffixes: self.retry.query_suffixes.clone(),
            image_class: self.search.image_class.clone(),
            retry_on_empty: self.retry.retry_on_empty,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.search.timeout_seconds)
    }

    pub fn pace(&self) -> Duration {
        Duration::from_secs_f64(self.batch.pace_secs)
    }

    pub fn search_params(&self) -> Vec<(String, String)> {
        self.search
            .params
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

impl Validate for EnricherConfig {
    fn validate(&self) -> Result<()> {
        validate_url("search.endpoint", &self.search.endpoint)?;
        validate_non_empty_string("search.user_agent", &self.search.user_agent)?;
        validate_positive_number("search.timeout_seconds", self.search.timeout_seconds as usize, 1)?;

        // used verbatim as a CSS class in `img.<class>`
        validate_non_empty_string("search.image_class", &self.search.image_class)?;
        if self.search.image_class.contains(char::is_whitespace) {
            return Err(EnrichError::InvalidConfigValueError {
                field: "search.image_class".to_string(),
                value: self.search.image_class.clone(),
                reason: "Class name cannot contain whitespace".to_string(),
            });
        }
        image_selector(&self.search.image_class)?;

        if self.search.params.contains_key("q") {
            return Err(EnrichError::InvalidConfigValueError {
                field: "search.params".to_string(),
                value: "q".to_string(),
                reason: "'q' is set from the row query".to_string(),
            });
        }

        validate_range("retry.max_tries", self.retry.max_tries, 1, 10)?;
        validate_range("retry.initial_backoff_secs", self.retry.initial_backoff_secs, 0.0, 60.0)?;
        validate_range("batch.pace_secs", self.batch.pace_secs, 0.0, 60.0)?;

        for suffix in &self.retry.query_suffixes {
            validate_non_empty_string("retry.query_suffixes", suffix)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = EnricherConfig::from_toml_str("").unwrap();

        assert_eq!(config.search.endpoint, "https://www.bing.com/images/search");
        assert_eq!(config.search.params.get("form").map(String::as_str), Some("HDRSC2"));
        assert_eq!(config.retry.max_tries, 3);
        assert_eq!(config.pace(), Duration::from_secs(1));
        assert!(config.validate().is_ok());

        let settings = config.resolver_settings();
        assert_eq!(settings.initial_backoff, Duration::from_secs(1));
        assert_eq!(settings.query_suffixes, vec!["product", "image"]);
        assert!(!settings.retry_on_empty);
    }

    #[test]
    fn test_partial_config_overrides_only_given_keys() {
        let toml_content = r#"
[retry]
retry_on_empty = true
initial_backoff_secs = 0.5

[batch]
pace_secs = 2.5
"#;

        let config = EnricherConfig::from_toml_str(toml_content).unwrap();

        assert!(config.retry.retry_on_empty);
        assert_eq!(config.retry.max_tries, 3);
        assert_eq!(config.resolver_settings().initial_backoff, Duration::from_millis(500));
        assert_eq!(config.pace(), Duration::from_millis(2500));
        assert_eq!(config.search.image_class, "mimg");
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("IMAGE_ETL_TEST_ENDPOINT", "https://images.test/search");

        let toml_content = r#"
[search]
endpoint = "${IMAGE_ETL_TEST_ENDPOINT}"
"#;

        let config = EnricherConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.search.endpoint, "https://images.test/search");

        std::env::remove_var("IMAGE_ETL_TEST_ENDPOINT");
    }

    #[test]
    fn test_config_validation() {
        let bad_endpoint = EnricherConfig::from_toml_str("[search]\nendpoint = \"not-a-url\"\n").unwrap();
        assert!(bad_endpoint.validate().is_err());

        let zero_tries = EnricherConfig::from_toml_str("[retry]\nmax_tries = 0\n").unwrap();
        assert!(zero_tries.validate().is_err());

        let query_param = EnricherConfig::from_toml_str("[search.params]\nq = \"fixed\"\n").unwrap();
        assert!(query_param.validate().is_err());
    }

    #[test]
    fn test_image_class_must_form_a_selector() {
        let config = EnricherConfig::from_toml_str("[search]\nimage_class = \"9thumb\"\n").unwrap();

        let err = config.validate().unwrap_err();
        assert!(matches!(
            err,
            EnrichError::InvalidConfigValueError { ref field, .. } if field == "search.image_class"
        ));
    }

    #[test]
    fn test_malformed_toml_is_a_config_error() {
        assert!(matches!(
            EnricherConfig::from_toml_str("[retry\nmax_tries = 3"),
            Err(EnrichError::ConfigValidationError { .. })
        ));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[search]\nimage_class = \"thumb\"\ntimeout_seconds = 10\n")
            .unwrap();

        let config = EnricherConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.search.image_class, "thumb");
        assert_eq!(config.timeout(), Duration::from_secs(10));
    }
}
