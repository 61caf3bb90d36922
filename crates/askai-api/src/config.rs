use askai_llm::OpenAIConfig;
use config::{Config as ConfigLoader, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub cors: CorsConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub validation: ValidationConfig,
    #[serde(default)]
    pub logging: LoggingConfig,

    // Secrets (from ENV only)
    #[serde(default)]
    pub openai_api_key: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            request_timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    pub enabled: bool,
    pub origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            origins: vec!["*".to_string()],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "conversations.db".to_string(),
            max_connections: 5,
        }
    }
}

/// Completion parameters, sent to the upstream API unmodified
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout_secs: f64,
    pub top_p: f32,
    pub frequency_penalty: f32,
    pub presence_penalty: f32,
    /// Overrides the public OpenAI endpoint (proxies, mock servers)
    pub base_url: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "gpt-3.5-turbo".to_string(),
            max_tokens: 1000,
            temperature: 0.7,
            timeout_secs: 30.0,
            top_p: 1.0,
            frequency_penalty: 0.0,
            presence_penalty: 0.0,
            base_url: None,
        }
    }
}

impl LlmConfig {
    pub fn timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.timeout_secs).unwrap_or(Duration::from_secs(30))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    pub max_prompt_length: usize,
    pub min_meaningful_chars: usize,
    pub max_char_run: usize,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            max_prompt_length: 4000,
            min_meaningful_chars: 2,
            max_char_run: 50,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from TOML files and environment variables
    ///
    /// Hierarchy (weakest to strongest):
    /// 1. config/default.toml
    /// 2. config/{ENV}.toml (if ENV is set)
    /// 3. `ASKAI_` variables, `__` between section and key (`ASKAI_LLM__MODEL`)
    /// 4. Flat variables such as `OPENAI_MODEL`, `PORT` or `DB_PATH`
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("ENV").unwrap_or_else(|_| "dev".to_string());

        let builder = ConfigLoader::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(
                Environment::with_prefix("ASKAI")
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("cors.origins")
                    .try_parsing(true),
            );

        let mut cfg: Config = builder.build()?.try_deserialize()?;
        cfg.apply_env_overrides(|key| std::env::var(key).ok())?;
        cfg.validate()?;

        Ok(cfg)
    }

    /// Load config from a specific path (useful for testing)
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let builder = ConfigLoader::builder().add_source(File::from(path.as_ref()));

        builder.build()?.try_deserialize()
    }

    /// Apply the flat variable names deployments already use
    pub fn apply_env_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(key) = lookup("OPENAI_API_KEY") {
            self.openai_api_key = key.trim().to_string();
        }
        if let Some(model) = lookup("OPENAI_MODEL") {
            self.llm.model = model;
        }
        if let Some(raw) = lookup("OPENAI_MAX_TOKENS") {
            self.llm.max_tokens = parse_var("OPENAI_MAX_TOKENS", &raw)?;
        }
        if let Some(raw) = lookup("OPENAI_TEMPERATURE") {
            self.llm.temperature = parse_var("OPENAI_TEMPERATURE", &raw)?;
        }
        if let Some(raw) = lookup("OPENAI_TIMEOUT") {
            self.llm.timeout_secs = parse_var("OPENAI_TIMEOUT", &raw)?;
        }
        if let Some(raw) = lookup("OPENAI_TOP_P") {
            self.llm.top_p = parse_var("OPENAI_TOP_P", &raw)?;
        }
        if let Some(raw) = lookup("OPENAI_FREQUENCY_PENALTY") {
            self.llm.frequency_penalty = parse_var("OPENAI_FREQUENCY_PENALTY", &raw)?;
        }
        if let Some(raw) = lookup("OPENAI_PRESENCE_PENALTY") {
            self.llm.presence_penalty = parse_var("OPENAI_PRESENCE_PENALTY", &raw)?;
        }
        if let Some(url) = lookup("OPENAI_BASE_URL") {
            self.llm.base_url = Some(url);
        }
        if let Some(host) = lookup("HOST") {
            self.server.host = host;
        }
        if let Some(raw) = lookup("PORT") {
            self.server.port = parse_var("PORT", &raw)?;
        }
        if let Some(path) = lookup("DB_PATH") {
            self.database.path = path;
        }
        if let Some(raw) = lookup("CORS_ORIGINS") {
            self.cors.origins = raw
                .split(',')
                .map(str::trim)
                .filter(|origin| !origin.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(level) = lookup("LOG_LEVEL") {
            self.logging.level = level.to_lowercase();
        }

        Ok(())
    }

    /// Reject parameters the upstream API would refuse anyway
    pub fn validate(&self) -> Result<(), ConfigError> {
        let llm = &self.llm;

        if llm.model.trim().is_empty() {
            return Err(invalid("llm.model must not be empty"));
        }
        if llm.max_tokens == 0 {
            return Err(invalid("llm.max_tokens must be greater than 0"));
        }
        if !(0.0..=2.0).contains(&llm.temperature) {
            return Err(invalid("llm.temperature must be between 0 and 2"));
        }
        if !(0.0..=1.0).contains(&llm.top_p) {
            return Err(invalid("llm.top_p must be between 0 and 1"));
        }
        if !(-2.0..=2.0).contains(&llm.frequency_penalty) {
            return Err(invalid("llm.frequency_penalty must be between -2 and 2"));
        }
        if !(-2.0..=2.0).contains(&llm.presence_penalty) {
            return Err(invalid("llm.presence_penalty must be between -2 and 2"));
        }
        if !llm.timeout_secs.is_finite() || llm.timeout_secs <= 0.0 {
            return Err(invalid("llm.timeout_secs must be greater than 0"));
        }
        if self.server.request_timeout_secs == 0 {
            return Err(invalid("server.request_timeout_secs must be greater than 0"));
        }
        if self.server.request_timeout_secs as f64 <= llm.timeout_secs {
            return Err(invalid(
                "server.request_timeout_secs must be longer than llm.timeout_secs",
            ));
        }
        if self.database.path.trim().is_empty() {
            return Err(invalid("database.path must not be empty"));
        }
        if self.database.max_connections == 0 {
            return Err(invalid("database.max_connections must be greater than 0"));
        }

        let validation = &self.validation;
        if validation.max_prompt_length == 0 || validation.max_char_run == 0 {
            return Err(invalid("validation limits must be greater than 0"));
        }

        Ok(())
    }

    pub fn is_api_key_configured(&self) -> bool {
        self.openai().is_configured()
    }

    /// Provider settings for building the chat client
    pub fn openai(&self) -> OpenAIConfig {
        let openai = OpenAIConfig::new(self.openai_api_key.clone());
        match &self.llm.base_url {
            Some(url) => openai.with_base_url(url.clone()),
            None => openai,
        }
    }
}

fn parse_var<T: FromStr>(name: &str, raw: &str) -> Result<T, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::Message(format!("{} has an invalid value: {:?}", name, raw)))
}

fn invalid(message: &str) -> ConfigError {
    ConfigError::Message(message.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_config_structure() {
        let toml = r#"
            [server]
            host = "127.0.0.1"
            port = 3000
            request_timeout_secs = 45

            [cors]
            enabled = true
            origins = ["http://localhost:3000"]

            [database]
            path = "/tmp/askai.db"
            max_connections = 2

            [llm]
            model = "gpt-4"
            temperature = 0.5
            max_tokens = 500
            timeout_secs = 12.5

            [validation]
            max_prompt_length = 2000

            [logging]
            level = "debug"
            format = "json"
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.database.path, "/tmp/askai.db");
        assert_eq!(config.llm.model, "gpt-4");
        assert_eq!(config.llm.top_p, 1.0);
        assert_eq!(config.llm.timeout(), Duration::from_millis(12_500));
        assert_eq!(config.validation.max_prompt_length, 2000);
        assert_eq!(config.validation.max_char_run, 50);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.database.path, "conversations.db");
        assert_eq!(config.llm.model, "gpt-3.5-turbo");
        assert_eq!(config.llm.max_tokens, 1000);
        assert_eq!(config.llm.temperature, 0.7);
        assert_eq!(config.llm.timeout(), Duration::from_secs(30));
        assert_eq!(config.cors.origins, vec!["*"]);
        assert_eq!(config.logging.level, "info");
        assert!(!config.is_api_key_configured());
        assert!(config.validate().is_ok());
        assert_eq!(config.openai().endpoint(), "https://api.openai.com/v1");
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config
            .apply_env_overrides(lookup_from(&[
                ("OPENAI_API_KEY", " sk-test "),
                ("OPENAI_MODEL", "gpt-4o-mini"),
                ("OPENAI_MAX_TOKENS", "256"),
                ("OPENAI_TEMPERATURE", "0.2"),
                ("OPENAI_TIMEOUT", "5"),
                ("PORT", "9000"),
                ("DB_PATH", "/data/log.db"),
                ("CORS_ORIGINS", "http://a.test, http://b.test,"),
                ("LOG_LEVEL", "DEBUG"),
            ]))
            .unwrap();

        assert_eq!(config.openai_api_key, "sk-test");
        assert!(config.openai().has_valid_key_format());
        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert_eq!(config.llm.max_tokens, 256);
        assert_eq!(config.llm.temperature, 0.2);
        assert_eq!(config.llm.timeout(), Duration::from_secs(5));
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.database.path, "/data/log.db");
        assert_eq!(config.cors.origins, vec!["http://a.test", "http://b.test"]);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_unparseable_override_is_an_error() {
        let mut config = Config::default();
        let result = config.apply_env_overrides(lookup_from(&[("OPENAI_MAX_TOKENS", "lots")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let mut config = Config::default();
        config.llm.temperature = 2.5;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.llm.top_p = 1.5;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.llm.presence_penalty = -3.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.llm.max_tokens = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.llm.timeout_secs = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_requires_request_deadline_past_upstream_timeout() {
        let mut config = Config::default();
        config.llm.timeout_secs = 3.0;
        config.server.request_timeout_secs = 1;
        assert!(config.validate().is_err());

        config.server.request_timeout_secs = 3;
        assert!(config.validate().is_err());

        config.server.request_timeout_secs = 4;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_blank_key_is_not_configured() {
        let mut config = Config::default();
        config.openai_api_key = "   ".to_string();
        assert!(!config.is_api_key_configured());
        assert_eq!(config.is_api_key_configured(), config.openai().is_configured());

        config.openai_api_key = "sk-live".to_string();
        assert!(config.is_api_key_configured());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "[llm]\nmodel = \"gpt-4\"\n").unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.llm.model, "gpt-4");
        assert_eq!(config.server.port, 8000);
    }
}
