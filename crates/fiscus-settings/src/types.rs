//! Settings type definitions.
//!
//! All types use `#[serde(rename_all = "camelCase")]` for the JSON file
//! format. Each type implements [`Default`] with production default values.
//! Types are marked `#[serde(default)]` so partial JSON is allowed — missing
//! fields get their default value during deserialization.

use serde::{Deserialize, Serialize};

/// Root settings type for the fiscus backend.
///
/// Loaded from `~/.fiscus/settings.json` with defaults applied for missing
/// fields. `FISCUS_*` environment variables override specific values.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FiscusSettings {
    /// Settings schema version.
    pub version: String,
    /// Server network settings.
    pub server: ServerSettings,
    /// Database location and pool sizing.
    pub database: DatabaseSettings,
    /// Credential validation settings.
    pub auth: AuthSettings,
    /// Generation (chat) provider settings.
    pub generation: GenerationSettings,
    /// Embedding provider settings.
    pub embedding: EmbeddingSettings,
    /// Background job queue settings.
    pub queue: QueueSettings,
    /// Conversational pipeline settings.
    pub chat: ChatSettings,
}

impl Default for FiscusSettings {
    fn default() -> Self {
        Self {
            version: "0.1.0".to_string(),
            server: ServerSettings::default(),
            database: DatabaseSettings::default(),
            auth: AuthSettings::default(),
            generation: GenerationSettings::default(),
            embedding: EmbeddingSettings::default(),
            queue: QueueSettings::default(),
            chat: ChatSettings::default(),
        }
    }
}

/// Server network settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerSettings {
    /// Host to bind.
    pub host: String,
    /// Port to bind (0 for auto-assign).
    pub port: u16,
    /// Maximum concurrent WebSocket sessions.
    pub max_sessions: usize,
    /// Per-session outbound frame channel capacity.
    pub send_buffer: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8765,
            max_sessions: 100,
            send_buffer: 1024,
        }
    }
}

/// Database location and pool sizing.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DatabaseSettings {
    /// Path to the `SQLite` database file (may contain `~`).
    pub path: String,
    /// Maximum pool size.
    pub pool_size: u32,
    /// Busy timeout in milliseconds.
    pub busy_timeout_ms: u32,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: "~/.fiscus/fiscus.db".into(),
            pool_size: 16,
            busy_timeout_ms: 30_000,
        }
    }
}

impl DatabaseSettings {
    /// Resolve the database path, expanding `~/` to the home directory.
    #[must_use]
    pub fn resolved_path(&self) -> String {
        if self.path.starts_with("~/") {
            if let Ok(home) = std::env::var("HOME") {
                return format!("{}{}", home, &self.path[1..]);
            }
        }
        self.path.clone()
    }
}

/// Credential validation settings.
///
/// Token issuance is out of scope; the server only validates HS256 tokens
/// minted by the account service.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AuthSettings {
    /// Shared HS256 signing secret.
    pub secret: String,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            secret: "change-me".into(),
        }
    }
}

/// Generation (chat) provider settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GenerationSettings {
    /// Base URL of the Ollama-compatible generation API.
    pub base_url: String,
    /// Chat model identifier.
    pub model: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".into(),
            model: "llama3.2".into(),
            timeout_secs: 60,
        }
    }
}

/// Embedding provider settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EmbeddingSettings {
    /// Base URL of the embedding API.
    pub base_url: String,
    /// Embedding model identifier.
    pub model: String,
    /// Vector dimensions stored and searched.
    pub dimensions: usize,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".into(),
            model: "nomic-embed-text".into(),
            dimensions: 768,
            timeout_secs: 30,
        }
    }
}

/// Background job queue settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QueueSettings {
    /// Number of worker tasks.
    pub workers: usize,
    /// Idle poll interval in milliseconds.
    pub poll_interval_ms: u64,
    /// Seconds before a claimed job is considered lost and redelivered.
    pub visibility_timeout_secs: i64,
}

impl Default for QueueSettings {
    fn default() -> Self {
        Self {
            workers: 2,
            poll_interval_ms: 500,
            visibility_timeout_secs: 120,
        }
    }
}

/// Conversational pipeline settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChatSettings {
    /// Retrieval depth for the semantic retriever.
    pub top_k: usize,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self { top_k: 7 }
    }
}
