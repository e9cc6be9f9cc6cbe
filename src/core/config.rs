//! Configuration management for toolchat
//!
//! Supports `.env` files, environment variables, config files, and runtime
//! overrides.
//!
//! Config file location: ~/.config/toolchat/config.toml

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::error::{ChatError, Result};

/// Persona used when no system prompt file is available
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant running in a terminal. \
Use the available functions when they help answer the user's question, and answer concisely.";

/// Main configuration for toolchat
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Assistant persona
    #[serde(default)]
    pub assistant: AssistantConfig,
    /// Completion endpoint
    #[serde(default)]
    pub provider: ProviderConfig,
    /// Orchestration loop limits
    #[serde(default)]
    pub agent: AgentConfig,
    /// Elasticsearch-backed search tool (disabled when absent)
    #[serde(default = "SearchConfig::from_env")]
    pub search: Option<SearchConfig>,
    /// Audit trail
    #[serde(default)]
    pub audit: AuditConfig,
}

/// Assistant persona configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    /// Display name used when printing replies
    pub name: String,
    /// Inline system prompt, takes precedence over the file
    pub system_prompt: Option<String>,
    /// File holding the system prompt
    pub system_prompt_file: Option<PathBuf>,
}

/// Which chat-completions flavour to talk to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// api.openai.com or a compatible base URL
    OpenAi,
    /// Azure OpenAI deployment
    Azure,
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderKind::OpenAi => write!(f, "openai"),
            ProviderKind::Azure => write!(f, "azure"),
        }
    }
}

/// Completion endpoint configuration
///
/// For Azure, `base_url` is the resource endpoint and `model` the
/// deployment name.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: Option<String>,
    /// Required for Azure (e.g. "2024-02-01")
    pub api_version: Option<String>,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

/// Orchestration loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Maximum sequential tool calls in one user turn
    /// Default: 10
    pub max_tool_calls: usize,
    /// Upper bound on a single tool invocation
    /// Default: 30
    pub tool_timeout_secs: u64,
    /// Where the remembered user name is stored
    pub memory_file: PathBuf,
}

/// Elasticsearch search tool configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    pub host: String,
    pub api_key: Option<String>,
    pub index: String,
    /// Document fields copied into the result
    pub context_fields: Vec<String>,
    /// Text describing the corpus, appended to the tool description
    pub corpus_description_file: Option<PathBuf>,
    /// JSON query template containing a `{query}` placeholder
    pub query_template_file: Option<PathBuf>,
}

/// Audit trail configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Append one JSON line per completed turn to this file
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            assistant: AssistantConfig::default(),
            provider: ProviderConfig::default(),
            agent: AgentConfig::default(),
            search: SearchConfig::from_env(),
            audit: AuditConfig::default(),
        }
    }
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            name: env_opt("ASSISTANT_NAME").unwrap_or_else(|| "Assistant".to_string()),
            system_prompt: None,
            system_prompt_file: Some(
                env_opt("SYSTEM_PROMPT_FILE")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("config/system_prompt.txt")),
            ),
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        // OpenAI wins whenever its key is present
        if let Some(api_key) = env_opt("OPENAI_API_KEY") {
            Self {
                kind: ProviderKind::OpenAi,
                api_key: Some(api_key),
                model: env_opt("OPENAI_MODEL").unwrap_or_else(|| "gpt-4o-mini".to_string()),
                base_url: env_opt("OPENAI_BASE_URL"),
                api_version: None,
                timeout_secs: 120,
            }
        } else {
            Self {
                kind: ProviderKind::Azure,
                api_key: env_opt("AZURE_OPENAI_API_KEY"),
                model: env_opt("AZURE_OPENAI_DEPLOYMENT_NAME").unwrap_or_default(),
                base_url: env_opt("AZURE_OPENAI_ENDPOINT"),
                api_version: env_opt("AZURE_OPENAI_API_VERSION"),
                timeout_secs: 120,
            }
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_tool_calls: env_opt("TOOLCHAT_MAX_TOOL_CALLS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
            tool_timeout_secs: 30,
            memory_file: PathBuf::from("memory.json"),
        }
    }
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            log_file: env_opt("TOOLCHAT_AUDIT_LOG").map(PathBuf::from),
        }
    }
}

impl SearchConfig {
    /// Search settings from the environment, if a host is configured
    pub fn from_env() -> Option<Self> {
        let host = env_opt("ELASTICSEARCH_HOST")?;
        Some(Self {
            host,
            api_key: env_opt("ELASTICSEARCH_API_KEY"),
            index: env_opt("ELASTICSEARCH_INDEX").unwrap_or_default(),
            context_fields: env_opt("CONTEXT_FIELDS")
                .map(|v| parse_field_list(&v))
                .unwrap_or_else(|| vec!["content".to_string()]),
            corpus_description_file: Some(
                env_opt("CORPUS_DESCRIPTION_FILE")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("config/corpus_description.txt")),
            ),
            query_template_file: Some(
                env_opt("QUERY_TEMPLATE_FILE")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("config/query_template.json")),
            ),
        })
    }
}

/// Split a comma-separated field list, dropping blanks
pub fn parse_field_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .map(str::to_string)
        .collect()
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("toolchat")
    }

    /// Get the config file path
    pub fn config_file() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Load `.env` files from the working directory into the process
    /// environment
    pub fn load_dotenv() {
        Self::load_dotenv_from(Path::new("."));
    }

    /// Load `dir/config/.env`, then `dir/.env`
    pub fn load_dotenv_from(dir: &Path) {
        // The project-local file overrides anything already set
        let _ = dotenvy::from_path_override(dir.join("config").join(".env"));
        let _ = dotenvy::from_path(dir.join(".env"));
    }

    /// Load configuration from an explicit file, the default file, or
    /// environment-backed defaults, in that order.
    ///
    /// Environment defaults are read as-is; call [`Config::load_dotenv`]
    /// first to pick up `.env` files.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load_from_file(path);
        }

        let default_path = Self::config_file();
        if default_path.exists() {
            return Self::load_from_file(&default_path);
        }

        Ok(Self::default())
    }

    /// Load configuration from a TOML file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            ChatError::config(format!("Failed to read config {}: {}", path.display(), e))
        })?;

        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| ChatError::config(format!("Failed to parse config: {}", e)))
    }

    /// Check that every value the selected provider needs is present
    pub fn validate(&self) -> Result<()> {
        let provider = &self.provider;
        let missing = |what: &str| {
            Err(ChatError::config(format!(
                "{} provider requires {}",
                provider.kind, what
            )))
        };

        if provider.api_key.as_deref().map_or(true, str::is_empty) {
            return missing("an API key");
        }
        if provider.model.trim().is_empty() {
            return missing(match provider.kind {
                ProviderKind::OpenAi => "a model name",
                ProviderKind::Azure => "a deployment name",
            });
        }
        if provider.kind == ProviderKind::Azure {
            if provider.base_url.is_none() {
                return missing("an endpoint");
            }
            if provider.api_version.is_none() {
                return missing("an API version");
            }
        }

        if self.agent.max_tool_calls == 0 {
            return Err(ChatError::config("agent.max_tool_calls must be at least 1"));
        }

        if let Some(ref search) = self.search {
            if search.index.trim().is_empty() {
                return Err(ChatError::config(
                    "search requires an index name (ELASTICSEARCH_INDEX)",
                ));
            }
        }

        Ok(())
    }

    /// Resolve the system prompt text
    pub fn system_prompt(&self) -> Result<String> {
        if let Some(ref prompt) = self.assistant.system_prompt {
            return Ok(prompt.trim().to_string());
        }

        match self.assistant.system_prompt_file {
            Some(ref path) if path.exists() => {
                let prompt = fs::read_to_string(path).map_err(|e| {
                    ChatError::config(format!(
                        "Failed to read system prompt {}: {}",
                        path.display(),
                        e
                    ))
                })?;
                Ok(prompt.trim().to_string())
            }
            _ => Ok(DEFAULT_SYSTEM_PROMPT.to_string()),
        }
    }

    /// Generate a default config file content for display
    pub fn default_config_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config)
            .unwrap_or_else(|_| String::from("# Error generating config"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn openai_config() -> Config {
        Config::from_toml(
            r#"
            [assistant]
            name = "Jarvis"
            system_prompt = "  Be brief.  "

            [provider]
            kind = "openai"
            api_key = "sk-test"
            model = "gpt-4o-mini"
            timeout_secs = 30

            [agent]
            max_tool_calls = 4
            tool_timeout_secs = 5
            memory_file = "memory.json"
            "#,
        )
        .map(|mut config| {
            config.search = None;
            config
        })
        .unwrap()
    }

    #[test]
    fn test_load_from_toml() {
        let config = openai_config();
        assert_eq!(config.assistant.name, "Jarvis");
        assert_eq!(config.provider.kind, ProviderKind::OpenAi);
        assert_eq!(config.agent.max_tool_calls, 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_inline_system_prompt_is_trimmed() {
        assert_eq!(openai_config().system_prompt().unwrap(), "Be brief.");
    }

    #[test]
    fn test_system_prompt_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prompt.txt");
        fs::write(&path, "You are Jarvis.\n").unwrap();

        let mut config = openai_config();
        config.assistant.system_prompt = None;
        config.assistant.system_prompt_file = Some(path);
        assert_eq!(config.system_prompt().unwrap(), "You are Jarvis.");

        config.assistant.system_prompt_file = Some(dir.path().join("missing.txt"));
        assert_eq!(config.system_prompt().unwrap(), DEFAULT_SYSTEM_PROMPT);
    }

    #[test]
    fn test_validate_missing_api_key() {
        let mut config = openai_config();
        config.provider.api_key = None;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ChatError::Config(_)));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_validate_azure_requires_endpoint_and_version() {
        let mut config = openai_config();
        config.provider.kind = ProviderKind::Azure;
        config.provider.model = "gpt4-deployment".to_string();
        assert!(config.validate().unwrap_err().to_string().contains("endpoint"));

        config.provider.base_url = Some("https://example.openai.azure.com".to_string());
        assert!(config.validate().unwrap_err().to_string().contains("API version"));

        config.provider.api_version = Some("2024-02-01".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_zero_tool_calls() {
        let mut config = openai_config();
        config.agent.max_tool_calls = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_sections_fall_back_to_defaults() {
        let config = Config::from_toml(
            r#"
            [agent]
            max_tool_calls = 4

            [provider]
            kind = "openai"
            api_key = "sk-test"
            "#,
        )
        .unwrap();

        assert_eq!(config.agent.max_tool_calls, 4);
        assert_eq!(config.agent.tool_timeout_secs, 30);
        assert_eq!(config.agent.memory_file, PathBuf::from("memory.json"));
        assert_eq!(config.provider.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.provider.timeout_secs, 120);
        assert!(!config.assistant.name.is_empty());
    }

    #[test]
    fn test_audit_log_from_env() {
        env::set_var("TOOLCHAT_AUDIT_LOG", "/tmp/toolchat-audit.jsonl");
        let from_env = AuditConfig::default();
        let from_toml = Config::from_toml("[audit]\nlog_file = \"audit.jsonl\"\n").unwrap();
        env::remove_var("TOOLCHAT_AUDIT_LOG");

        assert_eq!(
            from_env.log_file,
            Some(PathBuf::from("/tmp/toolchat-audit.jsonl"))
        );
        assert_eq!(from_toml.audit.log_file, Some(PathBuf::from("audit.jsonl")));
        assert_eq!(AuditConfig::default().log_file, None);
    }

    #[test]
    fn test_load_dotenv_from() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("config")).unwrap();
        fs::write(
            dir.path().join("config").join(".env"),
            "TOOLCHAT_TEST_DOTENV=project\n",
        )
        .unwrap();
        fs::write(
            dir.path().join(".env"),
            "TOOLCHAT_TEST_DOTENV=root\nTOOLCHAT_TEST_DOTENV_ROOT=yes\n",
        )
        .unwrap();

        Config::load_dotenv_from(dir.path());

        assert_eq!(env::var("TOOLCHAT_TEST_DOTENV").unwrap(), "project");
        assert_eq!(env::var("TOOLCHAT_TEST_DOTENV_ROOT").unwrap(), "yes");
    }

    #[test]
    fn test_parse_field_list() {
        assert_eq!(
            parse_field_list("title, content,,body "),
            vec!["title", "content", "body"]
        );
    }

    #[test]
    fn test_config_dir() {
        let dir = Config::config_dir();
        assert!(dir.to_string_lossy().contains("toolchat"));
    }
}
