//! Frames JSON intercambiados con el nodo por el websocket.

use serde::{Deserialize, Serialize};
use serenity::model::id::GuildId;

use crate::audio::{filters::FilterPayload, voice::VoiceServerEvent};

/// Snapshot de estadísticas enviado periódicamente por el nodo (`op: stats`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NodeStats {
    pub players: u32,
    pub playing_players: u32,
    pub uptime: u64,
    pub memory: MemoryStats,
    pub cpu: CpuStats,
    pub frame_stats: Option<FrameStats>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryStats {
    pub free: u64,
    pub used: u64,
    pub allocated: u64,
    pub reservable: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CpuStats {
    pub cores: u32,
    pub system_load: f64,
    pub lavalink_load: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameStats {
    pub sent: i64,
    pub nulled: i64,
    pub deficit: i64,
}

/// `op: playerUpdate`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerUpdateFrame {
    pub guild_id: GuildId,
    #[serde(default)]
    pub state: PlayerUpdateState,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PlayerUpdateState {
    pub position: Option<u64>,
    pub time: Option<i64>,
    pub connected: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrackEndReason {
    Finished,
    LoadFailed,
    Stopped,
    Replaced,
    #[serde(alias = "CLEAN_UP")]
    Cleanup,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    #[default]
    Common,
    Suspicious,
    Fault,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackException {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default)]
    pub cause: Option<String>,
}

/// Nombres de eventos que entiende [`LifecycleEvent`]
pub const LIFECYCLE_EVENTS: [&str; 5] = [
    "TrackStartEvent",
    "TrackEndEvent",
    "TrackExceptionEvent",
    "TrackStuckEvent",
    "WebSocketClosedEvent",
];

/// Cuerpo de un frame `op: event`, etiquetado por `type`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all_fields = "camelCase")]
pub enum LifecycleEvent {
    TrackStartEvent {
        #[serde(default)]
        track: Option<String>,
    },
    TrackEndEvent {
        #[serde(default)]
        track: Option<String>,
        reason: TrackEndReason,
    },
    TrackExceptionEvent {
        #[serde(default)]
        exception: Option<TrackException>,
        #[serde(default)]
        error: Option<String>,
    },
    TrackStuckEvent {
        #[serde(default)]
        threshold_ms: u64,
    },
    WebSocketClosedEvent {
        code: u16,
        #[serde(default)]
        by_remote: bool,
        #[serde(default)]
        reason: String,
    },
}

/// Comandos que el cliente envía al nodo
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "op", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum OutgoingFrame {
    VoiceUpdate {
        guild_id: String,
        session_id: String,
        event: VoiceServerEvent,
    },
    Play {
        guild_id: String,
        track: String,
    },
    Stop {
        guild_id: String,
        amount: usize,
    },
    Pause {
        guild_id: String,
        pause: bool,
    },
    Seek {
        guild_id: String,
        position: u64,
    },
    Volume {
        guild_id: String,
        volume: u16,
    },
    Filters {
        guild_id: String,
        #[serde(flatten)]
        filters: FilterPayload,
    },
    Destroy {
        guild_id: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::filters::{EqualizerBand, Timescale};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_track_end_reasons() {
        let parse = |s: &str| serde_json::from_value::<TrackEndReason>(json!(s)).unwrap();
        assert_eq!(parse("FINISHED"), TrackEndReason::Finished);
        assert_eq!(parse("LOAD_FAILED"), TrackEndReason::LoadFailed);
        assert_eq!(parse("CLEANUP"), TrackEndReason::Cleanup);
        assert_eq!(parse("CLEAN_UP"), TrackEndReason::Cleanup);
        assert_eq!(parse("SOMETHING_NEW"), TrackEndReason::Unknown);
    }

    #[test]
    fn test_lifecycle_event_parsing() {
        let event: LifecycleEvent = serde_json::from_value(json!({
            "op": "event",
            "type": "TrackStuckEvent",
            "guildId": "1",
            "thresholdMs": 10000
        }))
        .unwrap();
        assert_eq!(event, LifecycleEvent::TrackStuckEvent { threshold_ms: 10_000 });

        let event: LifecycleEvent = serde_json::from_value(json!({
            "op": "event",
            "type": "WebSocketClosedEvent",
            "guildId": "1",
            "code": 4006,
            "byRemote": true,
            "reason": "Session is no longer valid."
        }))
        .unwrap();
        assert_eq!(
            event,
            LifecycleEvent::WebSocketClosedEvent {
                code: 4006,
                by_remote: true,
                reason: "Session is no longer valid.".to_string(),
            }
        );
    }

    #[test]
    fn test_stats_ignore_unknown_fields() {
        let stats: NodeStats = serde_json::from_value(json!({
            "players": 3,
            "playingPlayers": 1,
            "uptime": 1000,
            "memory": { "free": 1, "used": 2, "allocated": 3, "reservable": 4 },
            "cpu": { "cores": 8, "systemLoad": 0.5, "lavalinkLoad": 0.1 },
            "somethingElse": true
        }))
        .unwrap();

        assert_eq!(stats.players, 3);
        assert_eq!(stats.playing_players, 1);
        assert_eq!(stats.cpu.cores, 8);
        assert_eq!(stats.frame_stats, None);
    }

    #[test]
    fn test_outgoing_frames() {
        let frame = OutgoingFrame::Play {
            guild_id: "1".to_string(),
            track: "abc".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&frame).unwrap(),
            json!({ "op": "play", "guildId": "1", "track": "abc" })
        );

        let frame = OutgoingFrame::Filters {
            guild_id: "1".to_string(),
            filters: FilterPayload {
                equalizer: Some(vec![EqualizerBand { band: 0, gain: 0.25 }]),
                timescale: Some(Timescale {
                    speed: 1.0,
                    pitch: 1.0,
                    rate: 1.0,
                }),
                ..Default::default()
            },
        };
        assert_eq!(
            serde_json::to_value(&frame).unwrap(),
            json!({
                "op": "filters",
                "guildId": "1",
                "equalizer": [{ "band": 0, "gain": 0.25 }],
                "timescale": { "speed": 1.0, "pitch": 1.0, "rate": 1.0 }
            })
        );

        let frame = OutgoingFrame::VoiceUpdate {
            guild_id: "1".to_string(),
            session_id: "sess".to_string(),
            event: VoiceServerEvent {
                token: "tok".to_string(),
                guild_id: "1".to_string(),
                endpoint: Some("eu.discord.media".to_string()),
            },
        };
        assert_eq!(
            serde_json::to_value(&frame).unwrap(),
            json!({
                "op": "voiceUpdate",
                "guildId": "1",
                "sessionId": "sess",
                "event": { "token": "tok", "guild_id": "1", "endpoint": "eu.discord.media" }
            })
        );
    }
}
