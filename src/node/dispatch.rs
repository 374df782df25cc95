use serde_json::Value;
use serenity::model::id::GuildId;
use std::sync::Arc;
use tracing::{debug, trace};

use super::{
    protocol::{LifecycleEvent, NodeStats, PlayerUpdateFrame, LIFECYCLE_EVENTS},
    Node,
};
use crate::{audio::player::Player, error::Error, events::Event};

impl Node {
    /// Procesa un frame entrante del websocket
    pub(super) async fn handle_frame(&self, text: &str) {
        let mut frame: Value = match serde_json::from_str(text) {
            Ok(frame) => frame,
            Err(e) => {
                self.emit_error(Error::Json(e));
                return;
            }
        };

        let Some(op) = frame.get("op").and_then(Value::as_str).map(str::to_owned) else {
            trace!("Frame sin op ignorado en {}", self.name());
            return;
        };

        self.events.emit(Event::Raw(frame.clone()));

        match op.as_str() {
            "stats" => {
                if let Some(object) = frame.as_object_mut() {
                    object.remove("op");
                }
                match serde_json::from_value::<NodeStats>(frame) {
                    Ok(stats) => *self.stats.write() = stats,
                    Err(e) => self.emit_error(Error::Json(e)),
                }
            }
            "playerUpdate" => match serde_json::from_value::<PlayerUpdateFrame>(frame) {
                Ok(update) => {
                    if let Some(player) = self.player(update.guild_id) {
                        player.set_position(update.state.position.unwrap_or(0));
                    }
                }
                Err(e) => self.emit_error(Error::Json(e)),
            },
            "event" => self.handle_event(frame).await,
            _ => self.emit_error(Error::UnexpectedOp {
                payload: frame.to_string(),
                op,
            }),
        }
    }

    async fn handle_event(&self, frame: Value) {
        let Some(guild_id) = frame
            .get("guildId")
            .and_then(|id| serde_json::from_value::<GuildId>(id.clone()).ok())
        else {
            debug!("Evento sin guildId válido ignorado");
            return;
        };

        let Some(player) = self.player(guild_id) else {
            trace!("Evento para guild {} sin player", guild_id);
            return;
        };

        let kind = frame.get("type").and_then(Value::as_str).unwrap_or_default();
        if !LIFECYCLE_EVENTS.contains(&kind) {
            self.emit_error(Error::UnknownEvent(kind.to_string()));
            return;
        }

        match serde_json::from_value::<LifecycleEvent>(frame) {
            Ok(event) => player.handle_event(event).await,
            Err(e) => self.emit_error(Error::Json(e)),
        }
    }

    fn player(&self, guild_id: GuildId) -> Option<Arc<Player>> {
        self.link()?.player(guild_id)
    }
}
