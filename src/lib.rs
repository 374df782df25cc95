//! # open-link
//!
//! Client for Lavalink-protocol audio nodes, meant to sit inside a Discord
//! music bot.
//!
//! The host opens managed connections to one or more nodes, creates one
//! [`Player`] per guild, drives playback (play, pause, skip, seek, volume,
//! filters) and forwards raw voice gateway dispatches so the library can
//! assemble the join payload for the node.
//!
//! ## Architecture
//!
//! - [`manager`]: the [`LinkManager`] registry, owner of nodes and players
//! - [`node`]: WebSocket transport with bounded reconnection, frame
//!   dispatch and REST calls
//! - [`audio`]: players, queues, tracks, filter presets and voice-session
//!   assembly
//! - [`sources`]: search routing and the [`SearchProvider`] extension point
//! - [`events`]: everything observable is delivered as an [`Event`]
//!
//! ## Example
//!
//! ```rust,no_run
//! use open_link::{LinkManager, ManagerOptions, NodeOptions, PlayerOptions};
//! use serenity::model::id::{ChannelId, GuildId, UserId};
//!
//! # async fn run() -> open_link::Result<()> {
//! let options = ManagerOptions::new(vec![NodeOptions::new("localhost", "youshallnotpass")]);
//! let manager = LinkManager::new(options, |_guild_id: GuildId, _payload: serde_json::Value| {
//!     // enviar `payload` por el shard de `guild_id`
//! })?;
//! manager.init(UserId::new(1));
//!
//! let player = manager
//!     .create_player(PlayerOptions::new(GuildId::new(1), ChannelId::new(2), ChannelId::new(3)))
//!     .await?;
//! player.connect()?;
//!
//! let result = player.search("never gonna give you up", None, None).await?;
//! if let Some(track) = result.tracks.into_iter().next() {
//!     player.queue().add(track, None)?;
//!     player.play().await?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod audio;
pub mod config;
pub mod error;
pub mod events;
pub mod manager;
pub mod node;
pub mod sources;

pub use audio::{
    filters::Filter,
    player::{LoopMode, Player, PlayerState},
    queue::Queue,
    track::{format_duration, Requester, Track, TrackAuthor},
    voice::GatewaySender,
};
pub use config::{ManagerOptions, NodeOptions, PlayerOptions};
pub use error::{Error, Result};
pub use events::Event;
pub use manager::LinkManager;
pub use node::{Node, NodeStats};
pub use sources::{Platform, SearchProvider, SearchResult};
