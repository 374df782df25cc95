use serde::{Deserialize, Serialize};
use serde_json::Value;
use serenity::model::id::{ChannelId, GuildId, UserId};
use std::sync::Arc;

/// Fragmento `VOICE_SERVER_UPDATE` del gateway
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VoiceServerUpdate {
    pub token: String,
    pub guild_id: GuildId,
    #[serde(default)]
    pub endpoint: Option<String>,
}

/// Fragmento `VOICE_STATE_UPDATE` del gateway
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VoiceStateUpdate {
    pub guild_id: GuildId,
    pub user_id: UserId,
    pub session_id: String,
    #[serde(default)]
    pub channel_id: Option<ChannelId>,
}

/// Fragmento de voz entrante, ya clasificado
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoiceFragment {
    Server(VoiceServerUpdate),
    State(VoiceStateUpdate),
}

impl VoiceFragment {
    /// Clasifica un paquete del gateway, ya sea el dispatch completo o solo `d`
    pub fn from_gateway(packet: &Value) -> Option<Self> {
        if let Some(kind) = packet.get("t").and_then(Value::as_str) {
            if !matches!(kind, "VOICE_STATE_UPDATE" | "VOICE_SERVER_UPDATE") {
                return None;
            }
        }

        let body = packet.get("d").unwrap_or(packet);
        if body.get("token").is_some() {
            serde_json::from_value(body.clone()).ok().map(Self::Server)
        } else if body.get("session_id").is_some() {
            serde_json::from_value(body.clone()).ok().map(Self::State)
        } else {
            None
        }
    }

    pub fn guild_id(&self) -> GuildId {
        match self {
            Self::Server(update) => update.guild_id,
            Self::State(update) => update.guild_id,
        }
    }
}

/// Evento de servidor reenviado tal cual dentro de `voiceUpdate`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VoiceServerEvent {
    pub token: String,
    pub guild_id: String,
    pub endpoint: Option<String>,
}

/// Ensambla la sesión de voz a partir de fragmentos que llegan en cualquier orden
#[derive(Debug)]
pub struct VoiceSession {
    guild_id: GuildId,
    session_id: Option<String>,
    event: Option<VoiceServerEvent>,
    forwarded: Option<(String, VoiceServerEvent)>,
}

impl VoiceSession {
    pub fn new(guild_id: GuildId) -> Self {
        Self {
            guild_id,
            session_id: None,
            event: None,
            forwarded: None,
        }
    }

    pub fn set_server(&mut self, update: VoiceServerUpdate) {
        self.event = Some(VoiceServerEvent {
            token: update.token,
            guild_id: update.guild_id.to_string(),
            endpoint: update.endpoint,
        });
    }

    pub fn set_session_id(&mut self, session_id: impl Into<String>) {
        self.session_id = Some(session_id.into());
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn is_complete(&self) -> bool {
        self.session_id.is_some() && self.event.is_some()
    }

    /// Olvida sesión y evento (desconexión de voz)
    pub fn reset(&mut self) {
        self.session_id = None;
        self.event = None;
        self.forwarded = None;
    }

    /// Devuelve `(session_id, event)` si hay un conjunto completo aún no reenviado
    pub fn take_ready(&mut self) -> Option<(String, VoiceServerEvent)> {
        let ready = (self.session_id.clone()?, self.event.clone()?);
        if self.forwarded.as_ref() == Some(&ready) {
            return None;
        }

        self.forwarded = Some(ready.clone());
        Some(ready)
    }

    /// El último envío falló; el próximo fragmento debe reintentarlo
    pub fn forget_forwarded(&mut self) {
        self.forwarded = None;
    }

    pub fn guild_id(&self) -> GuildId {
        self.guild_id
    }
}

/// Cuerpo `d` del comando de voz (op 4) que se envía por el gateway
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VoiceStateCommand {
    pub guild_id: String,
    pub channel_id: Option<String>,
    pub self_mute: bool,
    pub self_deaf: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GatewayCommand {
    pub op: u8,
    pub d: VoiceStateCommand,
}

impl GatewayCommand {
    pub fn voice_state(
        guild_id: GuildId,
        channel_id: Option<ChannelId>,
        self_mute: bool,
        self_deaf: bool,
    ) -> Self {
        Self {
            op: 4,
            d: VoiceStateCommand {
                guild_id: guild_id.to_string(),
                channel_id: channel_id.map(|id| id.to_string()),
                self_mute,
                self_deaf,
            },
        }
    }
}

/// Canal por el que se envían comandos al gateway de Discord
#[cfg_attr(test, mockall::automock)]
pub trait GatewaySender: Send + Sync {
    fn send(&self, guild_id: GuildId, payload: Value);
}

impl<F> GatewaySender for F
where
    F: Fn(GuildId, Value) + Send + Sync,
{
    fn send(&self, guild_id: GuildId, payload: Value) {
        self(guild_id, payload)
    }
}

pub(crate) type SharedGateway = Arc<dyn GatewaySender>;
