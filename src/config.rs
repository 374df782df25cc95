use serde::{Deserialize, Deserializer, Serialize};
use serenity::model::id::{ChannelId, GuildId};
use std::{collections::HashSet, time::Duration};

use crate::{
    error::{Error, Result},
    sources::Platform,
};

pub const DEFAULT_PORT: u16 = 2333;
pub const DEFAULT_RETRY_AMOUNT: u32 = 5;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(30);
pub const DEFAULT_POOL_MAX_IDLE: usize = 10;
pub const DEFAULT_VOLUME: u16 = 90;
pub const DEFAULT_CLIENT_NAME: &str = "discord bot";
pub const DEFAULT_THUMBNAIL: &str =
    "https://cdn.discordapp.com/attachments/1052561733405925476/1116716637627424899/thumbnail.png";

/// Conexión a un nodo
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NodeOptions {
    pub host: String,
    pub password: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub secure: bool,
    #[serde(default = "default_retry_amount")]
    pub retry_amount: u32,
    #[serde(
        default = "default_retry_delay",
        deserialize_with = "deserialize_duration",
        serialize_with = "serialize_duration"
    )]
    pub retry_delay: Duration,
    #[serde(default = "default_pool_max_idle")]
    pub pool_max_idle: usize,
}

impl NodeOptions {
    /// Puerto 2333, sin TLS, nombre = host, 5 reintentos cada 30 s
    pub fn new(host: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            password: password.into(),
            port: DEFAULT_PORT,
            name: None,
            secure: false,
            retry_amount: DEFAULT_RETRY_AMOUNT,
            retry_delay: DEFAULT_RETRY_DELAY,
            pool_max_idle: DEFAULT_POOL_MAX_IDLE,
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    pub fn with_retry(mut self, amount: u32, delay: Duration) -> Self {
        self.retry_amount = amount;
        self.retry_delay = delay;
        self
    }

    /// Nombre del nodo (el host si no se configuró uno)
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.host)
    }

    pub fn ws_url(&self) -> String {
        let scheme = if self.secure { "wss" } else { "ws" };
        format!("{}://{}:{}", scheme, self.host, self.port)
    }

    pub fn http_url(&self) -> String {
        let scheme = if self.secure { "https" } else { "http" };
        format!("{}://{}:{}", scheme, self.host, self.port)
    }
}

/// Opciones del registro de nodos y players
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ManagerOptions {
    pub nodes: Vec<NodeOptions>,
    #[serde(default = "default_shards")]
    pub shards: u32,
    #[serde(default = "default_client_name")]
    pub client_name: String,
    #[serde(default)]
    pub default_platform: Platform,
    #[serde(default = "default_thumbnail")]
    pub fallback_thumbnail: Option<String>,
}

impl ManagerOptions {
    pub fn new(nodes: Vec<NodeOptions>) -> Self {
        Self {
            nodes,
            shards: 1,
            client_name: DEFAULT_CLIENT_NAME.to_string(),
            default_platform: Platform::default(),
            fallback_thumbnail: default_thumbnail(),
        }
    }

    pub fn with_shards(mut self, shards: u32) -> Self {
        self.shards = shards;
        self
    }

    pub fn with_client_name(mut self, client_name: impl Into<String>) -> Self {
        self.client_name = client_name.into();
        self
    }

    pub fn with_default_platform(mut self, platform: Platform) -> Self {
        self.default_platform = platform;
        self
    }

    pub fn with_fallback_thumbnail(mut self, thumbnail: Option<String>) -> Self {
        self.fallback_thumbnail = thumbnail;
        self
    }

    /// Carga la configuración desde `OPEN_LINK_CONFIG` o, si no existe, desde `LAVALINK_*`
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let options = match std::env::var("OPEN_LINK_CONFIG") {
            Ok(path) if !path.trim().is_empty() => Self::from_file(&path)?,
            _ => Self::from_env()?,
        };

        options.validate()?;
        Ok(options)
    }

    fn from_file(path: &str) -> Result<Self> {
        config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(config::Environment::with_prefix("OPEN_LINK").separator("__"))
            .build()
            .and_then(|c| c.try_deserialize::<Self>())
            .map_err(|e| Error::Config(format!("{}: {}", path, e)))
    }

    fn from_env() -> Result<Self> {
        let host = env_or("LAVALINK_HOST", "localhost");
        let password = env_or("LAVALINK_PASSWORD", "youshallnotpass");

        let mut node = NodeOptions::new(host, password)
            .with_port(env_parse("LAVALINK_PORT", DEFAULT_PORT)?)
            .with_secure(env_parse("LAVALINK_SECURE", false)?);

        if let Ok(name) = std::env::var("LAVALINK_NAME") {
            node = node.with_name(name);
        }

        node.retry_amount = env_parse("LAVALINK_RETRY_AMOUNT", DEFAULT_RETRY_AMOUNT)?;
        if let Ok(delay) = std::env::var("LAVALINK_RETRY_DELAY") {
            node.retry_delay = humantime::parse_duration(&delay)
                .map_err(|e| Error::Config(format!("LAVALINK_RETRY_DELAY: {}", e)))?;
        }

        let mut options = Self::new(vec![node])
            .with_shards(env_parse("SHARD_COUNT", 1)?)
            .with_client_name(env_or("CLIENT_NAME", DEFAULT_CLIENT_NAME));

        if let Ok(platform) = std::env::var("DEFAULT_PLATFORM") {
            options.default_platform = platform
                .parse()
                .map_err(|_| Error::Config(format!("DEFAULT_PLATFORM: '{}'", platform)))?;
        }

        Ok(options)
    }

    /// Valida nodos, hosts, contraseñas, nombres duplicados y shards
    pub fn validate(&self) -> Result<()> {
        if self.nodes.is_empty() {
            return Err(Error::Config("at least one node is required".into()));
        }

        if self.shards == 0 {
            return Err(Error::Config("shards must be at least 1".into()));
        }

        let mut hosts = HashSet::new();
        let mut names = HashSet::new();

        for node in &self.nodes {
            if node.host.trim().is_empty() {
                return Err(Error::Config("node host must not be empty".into()));
            }
            if node.password.is_empty() {
                return Err(Error::Config(format!("node '{}' has no password", node.name())));
            }
            if node.port == 0 {
                return Err(Error::Config(format!("node '{}' has port 0", node.name())));
            }
            if node.retry_amount == 0 {
                return Err(Error::Config(format!(
                    "node '{}' must allow at least one retry",
                    node.name()
                )));
            }
            if !hosts.insert(node.host.as_str()) {
                return Err(Error::Config(format!("duplicate node host '{}'", node.host)));
            }
            if !names.insert(node.name()) {
                return Err(Error::Config(format!("duplicate node name '{}'", node.name())));
            }
        }

        Ok(())
    }

    /// Resumen para logs (sin contraseñas)
    pub fn summary(&self) -> String {
        let nodes = self
            .nodes
            .iter()
            .map(|n| {
                format!(
                    "{} ({}:{}, tls={}, {} reintentos cada {})",
                    n.name(),
                    n.host,
                    n.port,
                    n.secure,
                    n.retry_amount,
                    humantime::format_duration(n.retry_delay)
                )
            })
            .collect::<Vec<_>>()
            .join(", ");

        format!(
            "Config Summary:\n  \
            Nodes: {}\n  \
            Client: '{}' ({} shards)\n  \
            Search: {}",
            nodes, self.client_name, self.shards, self.default_platform
        )
    }
}

/// Opciones de creación de un player
#[derive(Debug, Clone)]
pub struct PlayerOptions {
    pub guild_id: GuildId,
    pub text_channel_id: ChannelId,
    pub voice_channel_id: Option<ChannelId>,
    /// Nombre del nodo; el primero registrado si es `None` o no existe
    pub node: Option<String>,
    pub volume: u16,
    pub mute: bool,
    pub deafen: bool,
}

impl PlayerOptions {
    pub fn new(guild_id: GuildId, text_channel_id: ChannelId, voice_channel_id: ChannelId) -> Self {
        Self {
            guild_id,
            text_channel_id,
            voice_channel_id: Some(voice_channel_id),
            node: None,
            volume: DEFAULT_VOLUME,
            mute: false,
            deafen: true,
        }
    }

    pub fn with_node(mut self, node: impl Into<String>) -> Self {
        self.node = Some(node.into());
        self
    }

    pub fn with_volume(mut self, volume: u16) -> Self {
        self.volume = volume;
        self
    }

    pub fn with_mute(mut self, mute: bool) -> Self {
        self.mute = mute;
        self
    }

    pub fn with_deafen(mut self, deafen: bool) -> Self {
        self.deafen = deafen;
        self
    }
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_retry_amount() -> u32 {
    DEFAULT_RETRY_AMOUNT
}

fn default_retry_delay() -> Duration {
    DEFAULT_RETRY_DELAY
}

fn default_pool_max_idle() -> usize {
    DEFAULT_POOL_MAX_IDLE
}

fn default_shards() -> u32 {
    1
}

fn default_client_name() -> String {
    DEFAULT_CLIENT_NAME.to_string()
}

fn default_thumbnail() -> Option<String> {
    Some(DEFAULT_THUMBNAIL.to_string())
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(value) if !value.trim().is_empty() => value
            .trim()
            .parse()
            .map_err(|e| Error::Config(format!("{}: {}", key, e))),
        _ => Ok(default),
    }
}

/// Milisegundos (número) o texto humantime ("30s", "1m 30s")
fn deserialize_duration<'de, D>(deserializer: D) -> std::result::Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Millis(u64),
        Text(String),
    }

    match Repr::deserialize(deserializer)? {
        Repr::Millis(ms) => Ok(Duration::from_millis(ms)),
        Repr::Text(text) => match text.trim().parse::<u64>() {
            Ok(ms) => Ok(Duration::from_millis(ms)),
            Err(_) => humantime::parse_duration(&text).map_err(serde::de::Error::custom),
        },
    }
}

fn serialize_duration<S>(duration: &Duration, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_u64(duration.as_millis() as u64)
}
