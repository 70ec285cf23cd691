use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{GalleriaError, Result};
use crate::types::Tenant;

/// Top-level configuration for the Galleria backend.
///
/// Loaded from `galleria.toml` by default (`GALLERIA_CONFIG` overrides the
/// path). Each section corresponds to one concern; API keys can additionally
/// be supplied via environment variables at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GalleriaConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub tenant: TenantConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub completion: CompletionConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
}

impl Default for GalleriaConfig {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            server: ServerConfig::default(),
            tenant: TenantConfig::default(),
            chat: ChatConfig::default(),
            completion: CompletionConfig::default(),
            retrieval: RetrievalConfig::default(),
        }
    }
}

impl GalleriaConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: GalleriaConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| GalleriaError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Data directory for the SQLite database.
    pub data_dir: String,
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: "data".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address.
    pub host: String,
    /// Listen port.
    pub port: u16,
    /// Origins allowed to make credentialed cross-site requests.
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            allowed_origins: vec!["http://localhost:5000".to_string()],
        }
    }
}

/// The commercial-center tenant this deployment serves.
///
/// Provisioned idempotently at startup; immutable thereafter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TenantConfig {
    pub id: String,
    pub name: String,
    pub location: String,
    pub website: String,
}

impl Default for TenantConfig {
    fn default() -> Self {
        Self {
            id: "default".to_string(),
            name: "Galleria".to_string(),
            location: String::new(),
            website: String::new(),
        }
    }
}

impl TenantConfig {
    pub fn to_tenant(&self) -> Tenant {
        Tenant {
            id: self.id.clone(),
            name: self.name.clone(),
            location: self.location.clone(),
            website: self.website.clone(),
        }
    }
}

/// Chat behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// System prompt prepended to every collaborator payload.
    pub system_prompt: String,
    /// How many stored turns to retrieve for prompt assembly.
    pub prompt_history_turns: u32,
    /// Maximum accepted user message length in characters.
    pub max_message_length: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            system_prompt: "You are an AI assistant who helps visitors of the shopping center \
                            find information. You cannot include references. If the requested \
                            information is not available in the retrieved data, direct the \
                            visitor to the center's contact form so that someone can assist them."
                .to_string(),
            prompt_history_turns: 20,
            max_message_length: 2000,
        }
    }
}

/// Hosted completion deployment settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionConfig {
    /// Base endpoint of the hosted completion service.
    pub endpoint: String,
    /// Deployment (model) name.
    pub deployment: String,
    /// API key; `GALLERIA_COMPLETION_KEY` overrides at startup.
    pub api_key: String,
    pub api_version: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            deployment: "gpt-4o".to_string(),
            api_key: String::new(),
            api_version: "2024-05-01-preview".to_string(),
            max_tokens: 800,
            temperature: 0.7,
            top_p: 0.95,
        }
    }
}

/// Managed retrieval index attached to every completion request.
///
/// `query_type` and the embedding deployment are opaque collaborator
/// configuration; they are serialized verbatim, never interpreted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub endpoint: String,
    pub index_name: String,
    /// API key; `GALLERIA_SEARCH_KEY` overrides at startup.
    pub api_key: String,
    pub semantic_configuration: String,
    pub query_type: String,
    pub strictness: u32,
    pub top_n_documents: u32,
    pub embedding_deployment: String,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            index_name: String::new(),
            api_key: String::new(),
            semantic_configuration: "default".to_string(),
            query_type: "vector_simple_hybrid".to_string(),
            strictness: 3,
            top_n_documents: 5,
            embedding_deployment: "text-embedding-ada-002".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GalleriaConfig::default();
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.chat.prompt_history_turns, 20);
        assert_eq!(config.completion.max_tokens, 800);
        assert_eq!(config.retrieval.strictness, 3);
        assert_eq!(config.retrieval.top_n_documents, 5);
        assert_eq!(config.tenant.id, "default");
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("galleria.toml");

        let mut config = GalleriaConfig::default();
        config.server.port = 8080;
        config.tenant.id = "riviera-center".to_string();
        config.tenant.website = "https://example.com".to_string();
        config.save(&path).unwrap();

        let loaded = GalleriaConfig::load(&path).unwrap();
        assert_eq!(loaded.server.port, 8080);
        assert_eq!(loaded.tenant.id, "riviera-center");
        assert_eq!(loaded.tenant.website, "https://example.com");
    }

    #[test]
    fn test_load_or_default_on_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = GalleriaConfig::load_or_default(&dir.path().join("missing.toml"));
        assert_eq!(config.server.port, 5000);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: GalleriaConfig = toml::from_str(
            r#"
            [server]
            port = 9000

            [tenant]
            id = "north-mall"
            name = "North Mall"
            "#,
        )
        .unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.tenant.name, "North Mall");
        assert_eq!(config.chat.max_message_length, 2000);
    }
}
