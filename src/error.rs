use thiserror::Error;

/// Errores del cliente de nodos
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("node '{0}' is not connected")]
    NotConnected(String),

    #[error("payload must serialize to a JSON object")]
    InvalidPayload,

    #[error("no available nodes")]
    NoNodes,

    #[error("node '{0}' not found")]
    NodeNotFound(String),

    #[error("invalid header value for '{name}'")]
    InvalidHeader { name: &'static str },

    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("timed out waiting for response headers from '{0}'")]
    HeadersTimeout(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("unexpected op \"{op}\" with data: {payload}")]
    UnexpectedOp { op: String, payload: String },

    #[error("unknown player event '{0}'")]
    UnknownEvent(String),

    #[error("unable to connect after {0} attempts")]
    ReconnectExhausted(u32),

    #[error("volume must be a number")]
    InvalidVolume,

    #[error("invalid loop type '{0}'")]
    InvalidLoopMode(String),

    #[error("amount must be between 1 and {len}, got {amount}")]
    InvalidSkip { amount: usize, len: usize },

    #[error("no voice channel has been set")]
    NoVoiceChannel,

    #[error("no current track")]
    NoCurrentTrack,

    #[error("invalid track: token and title must be non-empty")]
    InvalidTrack,

    #[error("offset must be between 0 and {len}, got {offset}")]
    InvalidOffset { offset: usize, len: usize },

    #[error("invalid range {start}..{end} for queue of {len}")]
    InvalidRange { start: usize, end: usize, len: usize },

    #[error("invalid equalizer band {band} with gain {gain}")]
    InvalidEqualizer { band: usize, gain: f64 },

    #[error("cannot seek: {0}")]
    InvalidSeek(String),
}

pub type Result<T> = std::result::Result<T, Error>;
