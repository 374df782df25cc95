use parking_lot::{MappedMutexGuard, Mutex, MutexGuard};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use serenity::model::id::{ChannelId, GuildId};
use std::{
    collections::HashMap,
    fmt,
    str::FromStr,
    sync::{Arc, Weak},
};
use tracing::{debug, info, warn};

use crate::{
    audio::{
        filters::{EqualizerBand, Filter, FilterPayload, Timescale, EQ_BANDS, EQ_GAIN_RANGE},
        queue::Queue,
        track::Requester,
        voice::{GatewayCommand, SharedGateway, VoiceServerUpdate, VoiceSession, VoiceStateUpdate},
    },
    config::PlayerOptions,
    error::{Error, Result},
    events::{EventSender, PlayerEvent},
    manager::Shared,
    node::{protocol::OutgoingFrame, Node},
    sources::{self, Platform, SearchResult},
};

/// Política de repetición al terminar un track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopMode {
    #[default]
    Disabled,
    Track,
    Queue,
}

impl FromStr for LoopMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "disabled" => Ok(LoopMode::Disabled),
            "track" => Ok(LoopMode::Track),
            "queue" => Ok(LoopMode::Queue),
            _ => Err(Error::InvalidLoopMode(s.to_string())),
        }
    }
}

impl fmt::Display for LoopMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LoopMode::Disabled => "disabled",
            LoopMode::Track => "track",
            LoopMode::Queue => "queue",
        };
        f.write_str(name)
    }
}

/// Estado de la conexión de voz del player
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    Disconnected,
    Connecting,
    Connected,
    Disconnecting,
    Destroying,
}

pub(crate) struct PlayerInner {
    pub(crate) state: PlayerState,
    pub(crate) voice_channel_id: Option<ChannelId>,
    pub(crate) text_channel_id: ChannelId,
    pub(crate) queue: Queue,
    pub(crate) voice: VoiceSession,
    pub(crate) volume: u16,
    pub(crate) loop_mode: LoopMode,
    pub(crate) playing: bool,
    pub(crate) paused: bool,
    pub(crate) position: u64,
    pub(crate) filter: Filter,
    pub(crate) timescale: Timescale,
    pub(crate) bands: [f64; EQ_BANDS],
    pub(crate) last_band: Option<EqualizerBand>,
    pub(crate) props: HashMap<String, Value>,
}

/// Sesión de reproducción de un guild (el estado nunca se bloquea a través de un `.await`)
pub struct Player {
    guild_id: GuildId,
    mute: bool,
    deafen: bool,
    node: Weak<Node>,
    node_name: String,
    pub(crate) inner: Mutex<PlayerInner>,
    pub(crate) events: EventSender,
    gateway: SharedGateway,
    link: Weak<Shared>,
}

impl Player {
    pub(crate) fn new(
        options: &PlayerOptions,
        node: &Arc<Node>,
        link: Weak<Shared>,
        events: EventSender,
        gateway: SharedGateway,
    ) -> Self {
        Self {
            guild_id: options.guild_id,
            mute: options.mute,
            deafen: options.deafen,
            node: Arc::downgrade(node),
            node_name: node.name().to_string(),
            inner: Mutex::new(PlayerInner {
                state: PlayerState::Disconnected,
                voice_channel_id: options.voice_channel_id,
                text_channel_id: options.text_channel_id,
                queue: Queue::new(),
                voice: VoiceSession::new(options.guild_id),
                volume: options.volume,
                loop_mode: LoopMode::default(),
                playing: false,
                paused: false,
                position: 0,
                filter: Filter::None,
                timescale: Timescale {
                    speed: 1.0,
                    pitch: 1.0,
                    rate: 1.0,
                },
                bands: [0.0; EQ_BANDS],
                last_band: None,
                props: HashMap::new(),
            }),
            events,
            gateway,
            link,
        }
    }

    pub fn guild_id(&self) -> GuildId {
        self.guild_id
    }

    /// Nodo asignado, si sigue registrado
    pub fn node(&self) -> Option<Arc<Node>> {
        self.node.upgrade()
    }

    pub fn node_name(&self) -> &str {
        &self.node_name
    }

    pub fn state(&self) -> PlayerState {
        self.inner.lock().state
    }

    pub fn voice_channel_id(&self) -> Option<ChannelId> {
        self.inner.lock().voice_channel_id
    }

    pub fn set_voice_channel(&self, channel_id: ChannelId) {
        self.inner.lock().voice_channel_id = Some(channel_id);
    }

    pub fn text_channel_id(&self) -> ChannelId {
        self.inner.lock().text_channel_id
    }

    pub fn set_text_channel(&self, channel_id: ChannelId) {
        self.inner.lock().text_channel_id = channel_id;
    }

    pub fn volume(&self) -> u16 {
        self.inner.lock().volume
    }

    pub fn loop_mode(&self) -> LoopMode {
        self.inner.lock().loop_mode
    }

    pub fn is_playing(&self) -> bool {
        self.inner.lock().playing
    }

    pub fn is_paused(&self) -> bool {
        self.inner.lock().paused
    }

    /// Última posición informada por el nodo (ms)
    pub fn position(&self) -> u64 {
        self.inner.lock().position
    }

    pub(crate) fn set_position(&self, position: u64) {
        self.inner.lock().position = position;
    }

    pub fn filter(&self) -> Filter {
        self.inner.lock().filter
    }

    pub fn timescale(&self) -> Timescale {
        self.inner.lock().timescale
    }

    pub fn bands(&self) -> [f64; EQ_BANDS] {
        self.inner.lock().bands
    }

    /// Última banda ajustada con [`Player::set_eq`]
    pub fn last_band(&self) -> Option<EqualizerBand> {
        self.inner.lock().last_band
    }

    /// Acceso exclusivo a la cola. No mantener el guard a través de un `.await`.
    pub fn queue(&self) -> MappedMutexGuard<'_, Queue> {
        MutexGuard::map(self.inner.lock(), |inner| &mut inner.queue)
    }

    pub fn get_prop<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.inner.lock().props.get(key).cloned()?;
        serde_json::from_value(value).ok()
    }

    pub fn set_prop<T: Serialize>(&self, key: impl Into<String>, value: T) -> Result<()> {
        let value = serde_json::to_value(value)?;
        self.inner.lock().props.insert(key.into(), value);
        Ok(())
    }

    /// Envía un comando al nodo asignado
    pub(crate) async fn send(&self, frame: &OutgoingFrame) -> Result<()> {
        let node = self
            .node
            .upgrade()
            .ok_or_else(|| Error::NodeNotFound(self.node_name.clone()))?;
        node.send(frame).await
    }

    fn guild(&self) -> String {
        self.guild_id.to_string()
    }

    /// Pide al gateway unirse al canal de voz configurado
    pub fn connect(&self) -> Result<()> {
        let channel_id = {
            let mut inner = self.inner.lock();
            let channel_id = inner.voice_channel_id.ok_or(Error::NoVoiceChannel)?;
            inner.state = PlayerState::Connecting;
            channel_id
        };

        let command = GatewayCommand::voice_state(self.guild_id, Some(channel_id), self.mute, self.deafen);
        self.gateway.send(self.guild_id, serde_json::to_value(&command)?);

        self.inner.lock().state = PlayerState::Connected;
        info!("🔊 Conectando a voz en {} (canal {})", self.guild_id, channel_id);
        Ok(())
    }

    /// Sale del canal de voz (pausando antes). Sin canal no hace nada.
    pub async fn disconnect(&self) -> Result<()> {
        {
            let mut inner = self.inner.lock();
            if inner.voice_channel_id.is_none() {
                return Ok(());
            }
            inner.state = PlayerState::Disconnecting;
        }

        if let Err(e) = self.pause(Some(true)).await {
            warn!("No se pudo pausar antes de desconectar {}: {}", self.guild_id, e);
        }

        let command = GatewayCommand::voice_state(self.guild_id, None, false, false);
        self.gateway.send(self.guild_id, serde_json::to_value(&command)?);

        let mut inner = self.inner.lock();
        inner.voice_channel_id = None;
        inner.state = PlayerState::Disconnected;
        info!("👋 Desconectado de voz en {}", self.guild_id);
        Ok(())
    }

    /// Destruye el player en el nodo y lo quita del registro
    pub async fn destroy(&self, disconnect: bool) -> Result<()> {
        self.inner.lock().state = PlayerState::Destroying;

        if disconnect {
            self.disconnect().await?;
            self.inner.lock().state = PlayerState::Destroying;
        }

        if let Err(e) = self.send(&OutgoingFrame::Destroy { guild_id: self.guild() }).await {
            warn!("No se pudo enviar destroy para {}: {}", self.guild_id, e);
        }

        if let Some(link) = self.link.upgrade() {
            link.remove_player(self.guild_id);
        }

        info!("🗑️ Player de {} destruido", self.guild_id);
        self.events.emit(PlayerEvent::Destroy {
            guild_id: self.guild_id,
        });

        Ok(())
    }

    /// Reproduce el track actual de la cola
    pub async fn play(&self) -> Result<()> {
        let track = {
            let inner = self.inner.lock();
            let current = inner.queue.current().ok_or(Error::NoCurrentTrack)?;
            debug!("▶️ {} en {}", current.title(), self.guild_id);
            current.token().to_string()
        };

        self.send(&OutgoingFrame::Play {
            guild_id: self.guild(),
            track,
        })
        .await
    }

    /// Volumen 0-1000 (se limita y redondea)
    pub async fn set_volume(&self, volume: f64) -> Result<()> {
        if !volume.is_finite() {
            return Err(Error::InvalidVolume);
        }

        let volume = volume.clamp(0.0, 1000.0).round() as u16;
        self.inner.lock().volume = volume;

        self.send(&OutgoingFrame::Volume {
            guild_id: self.guild(),
            volume,
        })
        .await
    }

    pub fn set_loop_mode(&self, mode: LoopMode) {
        debug!("🔁 Loop {} en {}", mode, self.guild_id);
        self.inner.lock().loop_mode = mode;
    }

    /// Igual que [`Player::set_loop_mode`] pero desde texto ("disabled", "track", "queue")
    pub fn set_loop_type(&self, mode: &str) -> Result<()> {
        let mode = mode.parse()?;
        self.set_loop_mode(mode);
        Ok(())
    }

    /// Salta `amount` tracks; los `amount - 1` primeros pendientes pasan al historial
    pub async fn skip(&self, amount: usize) -> Result<()> {
        {
            let mut inner = self.inner.lock();
            let len = inner.queue.len();
            if amount < 1 || amount > len {
                return Err(Error::InvalidSkip { amount, len });
            }
            inner.queue.drop_front_into_previous(amount - 1);
        }

        debug!("⏭️ Saltando {} en {}", amount, self.guild_id);
        self.send(&OutgoingFrame::Stop {
            guild_id: self.guild(),
            amount,
        })
        .await
    }

    /// Pausa, reanuda o alterna (`None`). No hace nada sin tracks o si ya está en ese estado.
    pub async fn pause(&self, state: Option<bool>) -> Result<()> {
        let pause = {
            let mut inner = self.inner.lock();
            let pause = state.unwrap_or(!inner.paused);
            if inner.paused == pause || inner.queue.total_length() == 0 {
                return Ok(());
            }
            inner.playing = !pause;
            inner.paused = pause;
            pause
        };

        debug!("{} {}", if pause { "⏸️ Pausa" } else { "▶️ Reanuda" }, self.guild_id);
        self.send(&OutgoingFrame::Pause {
            guild_id: self.guild(),
            pause,
        })
        .await
    }

    /// Salta a `position` ms dentro del track actual
    pub async fn seek(&self, position: u64) -> Result<()> {
        {
            let mut inner = self.inner.lock();
            let current = inner.queue.current().ok_or(Error::NoCurrentTrack)?;
            if !current.is_seekable() {
                return Err(Error::InvalidSeek(format!("'{}' is not seekable", current.title())));
            }
            if position > current.duration() {
                return Err(Error::InvalidSeek(format!(
                    "position {} is past the end ({})",
                    position,
                    current.duration()
                )));
            }
            inner.position = position;
        }

        self.send(&OutgoingFrame::Seek {
            guild_id: self.guild(),
            position,
        })
        .await
    }

    /// Ajusta una banda del ecualizador (0-14, ganancia -0.25..=1.0)
    pub async fn set_eq(&self, band: usize, gain: f64) -> Result<()> {
        if band >= EQ_BANDS || !EQ_GAIN_RANGE.contains(&gain) {
            return Err(Error::InvalidEqualizer { band, gain });
        }

        let bands = {
            let mut inner = self.inner.lock();
            inner.bands[band] = gain;
            inner.last_band = Some(EqualizerBand { band, gain });
            inner.bands
        };

        self.send_equalizer(bands).await
    }

    /// Todas las bandas a 0
    pub async fn clear_eq(&self) -> Result<()> {
        let bands = {
            let mut inner = self.inner.lock();
            inner.bands = [0.0; EQ_BANDS];
            inner.last_band = None;
            inner.bands
        };

        self.send_equalizer(bands).await
    }

    async fn send_equalizer(&self, bands: [f64; EQ_BANDS]) -> Result<()> {
        let equalizer = bands
            .iter()
            .enumerate()
            .map(|(band, &gain)| EqualizerBand { band, gain })
            .collect();

        self.send(&OutgoingFrame::Filters {
            guild_id: self.guild(),
            filters: FilterPayload {
                equalizer: Some(equalizer),
                ..Default::default()
            },
        })
        .await
    }

    /// Velocidad, tono y ritmo; `None` conserva el valor anterior
    pub async fn set_timescale(
        &self,
        speed: Option<f64>,
        pitch: Option<f64>,
        rate: Option<f64>,
    ) -> Result<()> {
        let timescale = {
            let mut inner = self.inner.lock();
            let current = inner.timescale;
            inner.timescale = Timescale {
                speed: speed.unwrap_or(current.speed),
                pitch: pitch.unwrap_or(current.pitch),
                rate: rate.unwrap_or(current.rate),
            };
            inner.timescale
        };

        self.send(&OutgoingFrame::Filters {
            guild_id: self.guild(),
            filters: FilterPayload {
                timescale: Some(timescale),
                ..Default::default()
            },
        })
        .await
    }

    /// Aplica un preset por nombre; `false` si no existe o ya está activo
    pub async fn set_filter(&self, name: &str) -> Result<bool> {
        let Ok(filter) = name.parse::<Filter>() else {
            debug!("Preset '{}' no encontrado", name);
            return Ok(false);
        };

        {
            let mut inner = self.inner.lock();
            if inner.filter == filter {
                return Ok(false);
            }
            inner.filter = filter;
        }

        info!("🎛️ Preset {} en {}", filter, self.guild_id);
        self.send(&OutgoingFrame::Filters {
            guild_id: self.guild(),
            filters: filter.payload(),
        })
        .await?;

        Ok(true)
    }

    /// Busca tracks en el nodo o en un proveedor externo registrado
    pub async fn search(
        &self,
        query: &str,
        requester: Option<Requester>,
        platform: Option<Platform>,
    ) -> Result<SearchResult> {
        let node = self
            .node()
            .filter(|node| node.is_connected())
            .ok_or(Error::NoNodes)?;
        let link = self
            .link
            .upgrade()
            .ok_or_else(|| Error::Config("link manager is gone".into()))?;

        sources::search(self, &node, &link, query, requester, platform).await
    }

    /// Fragmento de servidor de voz
    pub(crate) async fn voice_server_update(&self, update: VoiceServerUpdate) {
        self.inner.lock().voice.set_server(update);
        self.forward_voice_session().await;
    }

    /// Fragmento de estado de voz del propio bot
    pub(crate) async fn voice_state_update(&self, update: VoiceStateUpdate) {
        let left = {
            let mut inner = self.inner.lock();
            match update.channel_id {
                Some(channel_id) => {
                    if inner.voice_channel_id != Some(channel_id) {
                        info!("🔀 Player de {} movido a {}", self.guild_id, channel_id);
                        self.events.emit(PlayerEvent::Move {
                            guild_id: self.guild_id,
                            old_channel: inner.voice_channel_id,
                            new_channel: channel_id,
                        });
                    }
                    inner.voice_channel_id = Some(channel_id);
                    inner.voice.set_session_id(update.session_id);
                    false
                }
                None => {
                    info!("🔇 Player de {} sacado de voz", self.guild_id);
                    self.events.emit(PlayerEvent::Disconnect {
                        guild_id: self.guild_id,
                        channel_id: inner.voice_channel_id,
                    });
                    inner.voice_channel_id = None;
                    inner.voice.reset();
                    true
                }
            }
        };

        if left {
            if let Err(e) = self.pause(Some(true)).await {
                debug!("No se pudo pausar {}: {}", self.guild_id, e);
            }
        }

        self.forward_voice_session().await;
    }

    async fn forward_voice_session(&self) {
        let Some((session_id, event)) = self.inner.lock().voice.take_ready() else {
            return;
        };

        debug!("🎙️ voiceUpdate para {}", self.guild_id);
        let frame = OutgoingFrame::VoiceUpdate {
            guild_id: self.guild(),
            session_id,
            event,
        };

        if let Err(e) = self.send(&frame).await {
            warn!("No se pudo enviar voiceUpdate de {}: {}", self.guild_id, e);
            self.inner.lock().voice.forget_forwarded();
        }
    }
}

impl fmt::Debug for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("Player")
            .field("guild_id", &self.guild_id)
            .field("node", &self.node_name)
            .field("state", &inner.state)
            .field("voice_channel_id", &inner.voice_channel_id)
            .field("queue", &inner.queue.total_length())
            .field("playing", &inner.playing)
            .field("paused", &inner.paused)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        audio::{track::Track, voice::MockGatewaySender},
        config::{ManagerOptions, NodeOptions},
        manager::LinkManager,
    };
    use mockall::predicate::eq;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn options() -> ManagerOptions {
        ManagerOptions::new(vec![NodeOptions::new("127.0.0.1", "pass").with_port(1)])
    }

    fn player_options() -> PlayerOptions {
        PlayerOptions::new(GuildId::new(1), ChannelId::new(2), ChannelId::new(3))
    }

    fn track(title: &str) -> Track {
        Track::new(format!("tok-{}", title), title, title).with_duration(10_000)
    }

    #[test]
    fn test_loop_mode_parsing() {
        assert_eq!("track".parse::<LoopMode>().unwrap(), LoopMode::Track);
        assert_eq!("queue".parse::<LoopMode>().unwrap(), LoopMode::Queue);
        assert_eq!("disabled".parse::<LoopMode>().unwrap(), LoopMode::Disabled);

        // solo los nombres exactos
        for name in ["forever", "off", "none", "TRACK", "QUEUE", " track"] {
            assert!(
                matches!(name.parse::<LoopMode>(), Err(Error::InvalidLoopMode(ref n)) if n == name),
                "{name:?}"
            );
        }
    }

    #[tokio::test]
    async fn test_connect_sends_gateway_command() {
        let mut gateway = MockGatewaySender::new();
        gateway
            .expect_send()
            .with(
                eq(GuildId::new(1)),
                eq(json!({
                    "op": 4,
                    "d": { "guild_id": "1", "channel_id": "3", "self_mute": false, "self_deaf": true }
                })),
            )
            .times(1)
            .return_const(());

        let manager = LinkManager::new(options(), gateway).unwrap();
        let player = manager.create_player(player_options()).await.unwrap();

        player.connect().unwrap();
        assert_eq!(player.state(), PlayerState::Connected);
    }

    #[tokio::test]
    async fn test_connect_requires_voice_channel() {
        let mut gateway = MockGatewaySender::new();
        gateway.expect_send().never();

        let manager = LinkManager::new(options(), gateway).unwrap();
        let mut opts = player_options();
        opts.voice_channel_id = None;
        let player = manager.create_player(opts).await.unwrap();

        assert!(matches!(player.connect(), Err(Error::NoVoiceChannel)));
        assert_eq!(player.state(), PlayerState::Disconnected);
    }

    #[tokio::test]
    async fn test_disconnect_leaves_voice() {
        let mut gateway = MockGatewaySender::new();
        gateway
            .expect_send()
            .withf(|_, payload| payload["d"]["channel_id"] == json!("3"))
            .times(1)
            .return_const(());
        gateway
            .expect_send()
            .withf(|_, payload| payload["d"]["channel_id"].is_null())
            .times(1)
            .return_const(());

        let manager = LinkManager::new(options(), gateway).unwrap();
        let player = manager.create_player(player_options()).await.unwrap();

        player.connect().unwrap();
        player.disconnect().await.unwrap();

        assert_eq!(player.voice_channel_id(), None);
        assert_eq!(player.state(), PlayerState::Disconnected);

        // sin canal no hace nada
        player.disconnect().await.unwrap();
    }

    #[tokio::test]
    async fn test_controls_validate_before_sending() {
        let manager = LinkManager::new(options(), |_: GuildId, _: Value| {}).unwrap();
        let player = manager.create_player(player_options()).await.unwrap();

        assert!(matches!(player.play().await, Err(Error::NoCurrentTrack)));
        assert!(matches!(player.set_volume(f64::NAN).await, Err(Error::InvalidVolume)));
        assert!(matches!(
            player.set_volume(f64::INFINITY).await,
            Err(Error::InvalidVolume)
        ));
        assert_eq!(player.volume(), 90);
        assert!(matches!(
            player.skip(1).await,
            Err(Error::InvalidSkip { amount: 1, len: 0 })
        ));
        assert!(matches!(
            player.set_eq(15, 0.0).await,
            Err(Error::InvalidEqualizer { band: 15, .. })
        ));
        assert!(matches!(
            player.set_eq(0, 1.5).await,
            Err(Error::InvalidEqualizer { .. })
        ));
        assert!(matches!(player.seek(0).await, Err(Error::NoCurrentTrack)));
        assert!(player.set_loop_type("sometimes").is_err());
        player.set_loop_mode(LoopMode::Queue);
        assert!(matches!(player.set_loop_type("off"), Err(Error::InvalidLoopMode(_))));
        assert_eq!(player.loop_mode(), LoopMode::Queue);
    }

    #[tokio::test]
    async fn test_volume_is_clamped_and_stored() {
        let manager = LinkManager::new(options(), |_: GuildId, _: Value| {}).unwrap();
        let player = manager.create_player(player_options()).await.unwrap();
        assert_eq!(player.volume(), 90);

        // el nodo no está conectado: el valor se guarda igual
        assert!(matches!(
            player.set_volume(5000.0).await,
            Err(Error::NotConnected(_))
        ));
        assert_eq!(player.volume(), 1000);

        let _ = player.set_volume(-3.0).await;
        assert_eq!(player.volume(), 0);

        let _ = player.set_volume(41.6).await;
        assert_eq!(player.volume(), 42);
    }

    #[tokio::test]
    async fn test_skip_moves_tracks_into_previous() {
        let manager = LinkManager::new(options(), |_: GuildId, _: Value| {}).unwrap();
        let player = manager.create_player(player_options()).await.unwrap();
        player
            .queue()
            .add_many(vec![track("a"), track("b"), track("c"), track("d")], None)
            .unwrap();

        assert!(matches!(
            player.skip(4).await,
            Err(Error::InvalidSkip { amount: 4, len: 3 })
        ));

        let _ = player.skip(2).await;
        let queue = player.queue();
        assert_eq!(queue.previous().len(), 1);
        assert_eq!(queue.previous()[0].title(), "b");
        assert_eq!(queue.get(0).map(Track::title), Some("c"));
    }

    #[tokio::test]
    async fn test_pause_is_noop_on_empty_queue() {
        let manager = LinkManager::new(options(), |_: GuildId, _: Value| {}).unwrap();
        let player = manager.create_player(player_options()).await.unwrap();

        player.pause(Some(true)).await.unwrap();
        assert!(!player.is_paused());
    }

    #[tokio::test]
    async fn test_seek_checks_track() {
        let manager = LinkManager::new(options(), |_: GuildId, _: Value| {}).unwrap();
        let player = manager.create_player(player_options()).await.unwrap();
        player.queue().add(track("a").with_seekable(false), None).unwrap();

        assert!(matches!(player.seek(10).await, Err(Error::InvalidSeek(_))));

        player.queue().set_current(Some(track("b")));
        assert!(matches!(player.seek(20_000).await, Err(Error::InvalidSeek(_))));
    }

    #[tokio::test]
    async fn test_unknown_or_active_filter_returns_false() {
        let manager = LinkManager::new(options(), |_: GuildId, _: Value| {}).unwrap();
        let player = manager.create_player(player_options()).await.unwrap();

        assert!(!player.set_filter("dubstep").await.unwrap());
        assert!(!player.set_filter("none").await.unwrap());
        assert_eq!(player.filter(), Filter::None);
    }

    #[tokio::test]
    async fn test_props_round_trip() {
        let manager = LinkManager::new(options(), |_: GuildId, _: Value| {}).unwrap();
        let player = manager.create_player(player_options()).await.unwrap();

        player.set_prop("message_id", 1234_u64).unwrap();
        assert_eq!(player.get_prop::<u64>("message_id"), Some(1234));
        assert_eq!(player.get_prop::<String>("message_id"), None);
        assert_eq!(player.get_prop::<u64>("missing"), None);
    }
}
