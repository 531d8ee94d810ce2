/// Config loader with environment overrides and validation.
///
/// Reads an optional YAML file, layers deployment environment variables on
/// top (the hosting platform injects credentials that way), and validates the
/// result before anything starts.
use std::path::Path;

use url::Url;

use crate::config::*;
use crate::errors::BotError;

/// Loads and validates [`BotConfig`].
///
/// Expected file layout (every key optional):
/// ```yaml
/// server:
///   port: 5000
/// whatsapp:
///   api_version: v18.0
/// llm:
///   primary:
///     kind: groq
///     model: llama-3.1-8b-instant
///   max_tokens: 200
/// catalog:
///   seed_file: config/catalog.yaml
/// ```
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from `path` (if given), apply process environment
    /// overrides, and validate.
    pub fn load(path: Option<&Path>) -> Result<BotConfig, BotError> {
        let mut config = match path {
            Some(path) => Self::load_file(path)?,
            None => BotConfig::default(),
        };
        Self::apply_env(&mut config, |key| std::env::var(key).ok())?;
        Self::validate(&config)?;
        Ok(config)
    }

    /// Parse a YAML config file.
    pub fn load_file(path: &Path) -> Result<BotConfig, BotError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| BotError::Config(format!("failed to read {}: {e}", path.display())))?;
        if content.trim().is_empty() {
            return Ok(BotConfig::default());
        }
        serde_yaml::from_str(&content)
            .map_err(|e| BotError::Config(format!("failed to parse {}: {e}", path.display())))
    }

    /// Apply environment overrides using `lookup` to read variables.
    ///
    /// Empty values count as unset.
    pub fn apply_env<F>(config: &mut BotConfig, lookup: F) -> Result<(), BotError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = var("WHATSAPP_TOKEN") {
            config.whatsapp.access_token = Some(v);
        }
        if let Some(v) = var("PHONE_NUMBER_ID") {
            config.whatsapp.phone_number_id = Some(v);
        }
        if let Some(v) = var("VERIFY_TOKEN") {
            config.whatsapp.verify_token = Some(v);
        }
        if let Some(v) = var("APP_SECRET") {
            config.whatsapp.app_secret = Some(v);
        }
        if let Some(v) = var("API_VERSION") {
            config.whatsapp.api_version = v;
        }

        if let Some(v) = var("LLM_PROVIDER") {
            config.llm.primary.kind = v.parse()?;
        }
        if let Some(v) = var("LLM_MODEL") {
            config.llm.primary.model = v;
        }
        if let Some(v) = var("GROQ_API_KEY") {
            config.llm.primary.api_key = Some(v);
        }
        if let Some(v) = var("OLLAMA_BASE_URL") {
            if config.llm.primary.kind == LlmProviderKind::Ollama {
                config.llm.primary.base_url = Some(v);
            }
        }

        if let Some(v) = var("DATABASE_URL") {
            config.database.url = Some(v);
        }
        if let Some(v) = var("DB_HOST") {
            config.database.host = v;
        }
        if let Some(v) = var("DB_PORT") {
            config.database.port = parse_port("DB_PORT", &v)?;
        }
        if let Some(v) = var("DB_USER") {
            config.database.user = v;
        }
        if let Some(v) = var("DB_PASSWORD") {
            config.database.password = v;
        }
        if let Some(v) = var("DB_NAME") {
            config.database.name = v;
        }

        if let Some(v) = var("PORT") {
            config.server.port = parse_port("PORT", &v)?;
        }
        if let Some(v) = var("APP_VERSION") {
            config.app.version = v;
        }
        if let Some(v) = var("RAILWAY_GIT_COMMIT_SHA").or_else(|| var("GIT_SHA")) {
            config.app.commit = v;
        }

        Ok(())
    }

    /// Validate the aggregate config for internal consistency.
    ///
    /// Checks:
    /// - Server port is non-zero
    /// - Graph API version has the `vN.N` shape
    /// - LLM bounds (max_tokens, temperature, timeout) are sane
    /// - Database URL, when given, parses and uses a MySQL scheme
    pub fn validate(config: &BotConfig) -> Result<(), BotError> {
        if config.server.port == 0 {
            return Err(BotError::Config("server port must be positive".to_string()));
        }
        validate_api_version(&config.whatsapp.api_version)?;
        Self::validate_llm(&config.llm)?;
        if let Some(url) = &config.database.url {
            validate_database_url(url)?;
        }
        Ok(())
    }

    /// Validate LLM settings.
    fn validate_llm(config: &LlmConfig) -> Result<(), BotError> {
        if config.max_tokens == 0 {
            return Err(BotError::Config("llm.max_tokens must be positive".to_string()));
        }
        if !(0.0..=2.0).contains(&config.temperature) {
            return Err(BotError::Config(format!(
                "llm.temperature must be between 0 and 2 (got {})",
                config.temperature
            )));
        }
        if config.timeout_secs == 0 {
            return Err(BotError::Config("llm.timeout_secs must be positive".to_string()));
        }
        for provider in std::iter::once(&config.primary).chain(&config.fallbacks) {
            if provider.model.trim().is_empty() {
                return Err(BotError::Config(format!(
                    "llm provider {:?} has an empty model name",
                    provider.kind
                )));
            }
        }
        Ok(())
    }
}

/// Parse a TCP port from an environment variable.
fn parse_port(key: &str, value: &str) -> Result<u16, BotError> {
    value
        .trim()
        .parse()
        .map_err(|_| BotError::Config(format!("{key} '{value}' is not a valid port")))
}

/// Validate a Graph API version string: "vN.N".
fn validate_api_version(version: &str) -> Result<(), BotError> {
    let invalid = || {
        BotError::Config(format!(
            "invalid API version '{version}': expected 'vN.N' (e.g., 'v18.0')"
        ))
    };

    let rest = version.strip_prefix('v').ok_or_else(invalid)?;
    let (major, minor) = rest.split_once('.').ok_or_else(invalid)?;
    if major.is_empty()
        || minor.is_empty()
        || !major.chars().all(|c| c.is_ascii_digit())
        || !minor.chars().all(|c| c.is_ascii_digit())
    {
        return Err(invalid());
    }
    Ok(())
}

/// Validate that a database URL parses and targets MySQL.
fn validate_database_url(raw: &str) -> Result<(), BotError> {
    let url = Url::parse(raw)
        .map_err(|e| BotError::Config(format!("invalid DATABASE_URL: {e}")))?;
    if !url.scheme().starts_with("mysql") {
        return Err(BotError::Config(format!(
            "unsupported DATABASE_URL scheme '{}': only MySQL is supported",
            url.scheme()
        )));
    }
    if url.host_str().is_none() {
        return Err(BotError::Config("DATABASE_URL has no host".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::fs;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    // ============================
    // File parsing tests
    // ============================

    #[test]
    fn test_load_file_with_partial_sections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("edubot.yaml");
        fs::write(
            &path,
            r#"
server:
  port: 8080
llm:
  primary:
    kind: ollama
    model: llama3
    base_url: http://localhost:11434
  max_tokens: 150
catalog:
  refresh_interval_secs: 0
"#,
        )
        .unwrap();

        let config = ConfigLoader::load_file(&path).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.llm.primary.kind, LlmProviderKind::Ollama);
        assert_eq!(config.llm.primary.model, "llama3");
        assert_eq!(config.llm.max_tokens, 150);
        assert_eq!(config.llm.temperature, 0.7);
        assert_eq!(config.catalog.refresh_interval_secs, 0);
        assert_eq!(config.whatsapp.api_version, "v18.0");
    }

    #[test]
    fn test_load_empty_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("edubot.yaml");
        fs::write(&path, "\n").unwrap();

        let config = ConfigLoader::load_file(&path).unwrap();
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.database.name, "edtech_bot");
    }

    #[test]
    fn test_load_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = ConfigLoader::load_file(&dir.path().join("nope.yaml")).unwrap_err();
        match err {
            BotError::Config(msg) => assert!(msg.contains("failed to read"), "{msg}"),
            other => panic!("Expected Config error, got: {other:?}"),
        }
    }

    #[test]
    fn test_load_malformed_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("edubot.yaml");
        fs::write(&path, "server: [unclosed").unwrap();

        let err = ConfigLoader::load_file(&path).unwrap_err();
        match err {
            BotError::Config(msg) => assert!(msg.contains("failed to parse"), "{msg}"),
            other => panic!("Expected Config error, got: {other:?}"),
        }
    }

    // ============================
    // Environment override tests
    // ============================

    #[test]
    fn test_env_overrides() {
        let mut config = BotConfig::default();
        ConfigLoader::apply_env(
            &mut config,
            env(&[
                ("WHATSAPP_TOKEN", "tok"),
                ("PHONE_NUMBER_ID", "12345"),
                ("VERIFY_TOKEN", "verify"),
                ("APP_SECRET", "secret"),
                ("API_VERSION", "v19.0"),
                ("GROQ_API_KEY", "gsk_test"),
                ("PORT", "8000"),
                ("DB_HOST", "db.internal"),
                ("DB_PORT", "3307"),
                ("APP_VERSION", "v1.2.3"),
                ("GIT_SHA", "abcdef0123"),
            ]),
        )
        .unwrap();

        assert_eq!(config.whatsapp.access_token.as_deref(), Some("tok"));
        assert_eq!(config.whatsapp.phone_number_id.as_deref(), Some("12345"));
        assert_eq!(config.whatsapp.verify_token.as_deref(), Some("verify"));
        assert_eq!(config.whatsapp.app_secret.as_deref(), Some("secret"));
        assert_eq!(config.whatsapp.api_version, "v19.0");
        assert_eq!(config.llm.primary.api_key.as_deref(), Some("gsk_test"));
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.database.host, "db.internal");
        assert_eq!(config.database.port, 3307);
        assert_eq!(config.app.version, "v1.2.3");
        assert_eq!(config.app.commit, "abcdef0123");
    }

    #[test]
    fn test_railway_commit_takes_precedence() {
        let mut config = BotConfig::default();
        ConfigLoader::apply_env(
            &mut config,
            env(&[("RAILWAY_GIT_COMMIT_SHA", "rail"), ("GIT_SHA", "git")]),
        )
        .unwrap();
        assert_eq!(config.app.commit, "rail");
    }

    #[test]
    fn test_empty_env_values_are_ignored() {
        let mut config = BotConfig::default();
        ConfigLoader::apply_env(&mut config, env(&[("WHATSAPP_TOKEN", "  "), ("PORT", "")]))
            .unwrap();
        assert!(config.whatsapp.access_token.is_none());
        assert_eq!(config.server.port, 5000);
    }

    #[test]
    fn test_invalid_port_env_rejected() {
        let mut config = BotConfig::default();
        let err = ConfigLoader::apply_env(&mut config, env(&[("PORT", "eighty")])).unwrap_err();
        match err {
            BotError::Config(msg) => assert!(msg.contains("PORT"), "{msg}"),
            other => panic!("Expected Config error, got: {other:?}"),
        }
    }

    #[test]
    fn test_provider_env_override() {
        let mut config = BotConfig::default();
        ConfigLoader::apply_env(
            &mut config,
            env(&[
                ("LLM_PROVIDER", "ollama"),
                ("LLM_MODEL", "llama3"),
                ("OLLAMA_BASE_URL", "http://gpu:11434"),
            ]),
        )
        .unwrap();
        assert_eq!(config.llm.primary.kind, LlmProviderKind::Ollama);
        assert_eq!(config.llm.primary.model, "llama3");
        assert_eq!(config.llm.primary.base_url.as_deref(), Some("http://gpu:11434"));
    }

    // ============================
    // Validation tests
    // ============================

    #[test]
    fn test_default_config_is_valid() {
        assert!(ConfigLoader::validate(&BotConfig::default()).is_ok());
    }

    #[test]
    fn test_validate_api_version() {
        assert!(validate_api_version("v18.0").is_ok());
        assert!(validate_api_version("v21.10").is_ok());
        assert!(validate_api_version("18.0").is_err());
        assert!(validate_api_version("v18").is_err());
        assert!(validate_api_version("vX.0").is_err());
        assert!(validate_api_version("v.0").is_err());
    }

    #[test]
    fn test_validate_llm_bounds() {
        let mut config = BotConfig::default();
        config.llm.max_tokens = 0;
        assert!(ConfigLoader::validate(&config).is_err());

        let mut config = BotConfig::default();
        config.llm.temperature = 2.5;
        assert!(ConfigLoader::validate(&config).is_err());

        let mut config = BotConfig::default();
        config.llm.timeout_secs = 0;
        assert!(ConfigLoader::validate(&config).is_err());

        let mut config = BotConfig::default();
        config.llm.fallbacks.push(ProviderConfig {
            kind: LlmProviderKind::Ollama,
            model: " ".to_string(),
            base_url: None,
            api_key: None,
        });
        assert!(ConfigLoader::validate(&config).is_err());
    }

    #[test]
    fn test_validate_database_url() {
        assert!(validate_database_url("mysql://root:pw@localhost:3306/edtech_bot").is_ok());
        assert!(validate_database_url("mysql+pymysql://root@db/edtech_bot").is_ok());

        match validate_database_url("postgres://localhost/db").unwrap_err() {
            BotError::Config(msg) => assert!(msg.contains("only MySQL"), "{msg}"),
            other => panic!("Expected Config error, got: {other:?}"),
        }
        assert!(validate_database_url("not a url").is_err());
    }

    #[test]
    fn test_validate_rejects_zero_port() {
        let mut config = BotConfig::default();
        config.server.port = 0;
        assert!(ConfigLoader::validate(&config).is_err());
    }
}
