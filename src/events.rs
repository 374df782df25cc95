//! # Events
//!
//! Everything that happens on a node or player is reported to the host as an
//! [`Event`]. Events are delivered in arrival order through one unbounded
//! channel owned by the [`crate::LinkManager`]; see
//! [`crate::LinkManager::events`].
//!
//! Events are grouped by category:
//!
//! - [`NodeEvent`]: transport lifecycle of a node (connect, disconnect,
//!   reconnect, destroy, errors).
//! - [`PlayerEvent`]: session lifecycle of a player (create, voice move,
//!   voice disconnect, destroy).
//! - [`TrackEvent`]: playback lifecycle pushed by the node (start, end,
//!   stuck, exception, queue end, voice socket closed).
//! - [`Event::Raw`]: every inbound frame carrying an `op`, untouched.

use serde_json::Value;
use serenity::model::id::{ChannelId, GuildId};
use std::sync::Arc;
use tracing::trace;

use crate::{
    audio::track::Track,
    error::Error,
    node::protocol::{TrackEndReason, TrackException},
};

#[derive(Debug, Clone)]
pub enum Event {
    Node(NodeEvent),
    Player(PlayerEvent),
    Track(TrackEvent),
    Raw(Value),
}

#[derive(Debug, Clone)]
pub enum NodeEvent {
    Add { node: String },
    Connect { node: String },
    Disconnect { node: String, code: u16, reason: String },
    Reconnect { node: String },
    Destroy { node: String },
    Error { node: String, error: Arc<Error> },
}

#[derive(Debug, Clone)]
pub enum PlayerEvent {
    Create {
        guild_id: GuildId,
    },
    Move {
        guild_id: GuildId,
        old_channel: Option<ChannelId>,
        new_channel: ChannelId,
    },
    Disconnect {
        guild_id: GuildId,
        channel_id: Option<ChannelId>,
    },
    Destroy {
        guild_id: GuildId,
    },
}

#[derive(Debug, Clone)]
pub enum TrackEvent {
    Start {
        guild_id: GuildId,
        track: Option<Track>,
    },
    End {
        guild_id: GuildId,
        track: Option<Track>,
        reason: TrackEndReason,
    },
    Stuck {
        guild_id: GuildId,
        track: Option<Track>,
        threshold_ms: u64,
    },
    Error {
        guild_id: GuildId,
        track: Option<Track>,
        exception: Option<TrackException>,
        error: Option<String>,
    },
    QueueEnd {
        guild_id: GuildId,
        track: Option<Track>,
    },
    SocketClosed {
        guild_id: GuildId,
        code: u16,
        reason: String,
        by_remote: bool,
    },
}

impl From<NodeEvent> for Event {
    fn from(event: NodeEvent) -> Self {
        Event::Node(event)
    }
}

impl From<PlayerEvent> for Event {
    fn from(event: PlayerEvent) -> Self {
        Event::Player(event)
    }
}

impl From<TrackEvent> for Event {
    fn from(event: TrackEvent) -> Self {
        Event::Track(event)
    }
}

/// Extremo emisor compartido por nodos y players
#[derive(Debug, Clone)]
pub(crate) struct EventSender(flume::Sender<Event>);

impl EventSender {
    pub(crate) fn channel() -> (Self, flume::Receiver<Event>) {
        let (tx, rx) = flume::unbounded();
        (Self(tx), rx)
    }

    pub(crate) fn emit(&self, event: impl Into<Event>) {
        if let Err(flume::SendError(event)) = self.0.send(event.into()) {
            trace!("Evento descartado, sin receptores: {:?}", event);
        }
    }
}
