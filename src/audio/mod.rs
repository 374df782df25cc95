//! # Audio Module
//!
//! Per-guild playback sessions driven on a remote node.
//!
//! ## Architecture
//!
//! ### [`player`] - Player
//! - Connection state machine (connect, disconnect, destroy)
//! - Playback controls sent to the node (play, pause, skip, seek, volume)
//! - Equalizer, timescale and filter presets
//!
//! ### [`queue`] - Queue Management
//! - Pending tracks, detached current track and history
//! - Repeat policy applied when a track ends (`lifecycle.rs`)
//!
//! ### [`voice`] - Voice Session
//! - Assembles the two gateway fragments into one `voiceUpdate`
//! - [`voice::GatewaySender`]: the host's gateway, used for op 4 commands
//!
//! ### [`filters`] - Filter Presets
//! - Fourteen named presets plus `None`, as literal parameter blocks

pub mod filters;
mod lifecycle;
pub mod player;
pub mod queue;
pub mod track;
pub mod voice;
