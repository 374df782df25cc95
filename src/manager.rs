use chrono::{DateTime, Utc};
use dashmap::{mapref::entry::Entry, DashMap};
use parking_lot::RwLock;
use serde_json::Value;
use serenity::model::id::{GuildId, UserId};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::{
    audio::{
        player::Player,
        voice::{GatewaySender, SharedGateway, VoiceFragment},
    },
    config::{ManagerOptions, NodeOptions, PlayerOptions},
    error::{Error, Result},
    events::{Event, EventSender, NodeEvent, PlayerEvent},
    node::Node,
    sources::{Platform, SearchProvider, SharedProvider},
};

/// Estado compartido entre el registro, sus nodos y sus players
pub(crate) struct Shared {
    pub(crate) options: ManagerOptions,
    client_id: RwLock<Option<UserId>>,
    started_at: RwLock<Option<DateTime<Utc>>>,
    nodes: RwLock<Vec<Arc<Node>>>,
    players: DashMap<GuildId, Arc<Player>>,
    providers: DashMap<Platform, SharedProvider>,
    events: EventSender,
    gateway: SharedGateway,
}

impl Shared {
    pub(crate) fn client_id(&self) -> Option<UserId> {
        *self.client_id.read()
    }

    pub(crate) fn player(&self, guild_id: GuildId) -> Option<Arc<Player>> {
        self.players.get(&guild_id).map(|p| Arc::clone(p.value()))
    }

    pub(crate) fn remove_player(&self, guild_id: GuildId) {
        if self.players.remove(&guild_id).is_some() {
            debug!("Player de {} eliminado del registro", guild_id);
        }
    }

    pub(crate) fn remove_node(&self, name: &str) {
        self.nodes.write().retain(|node| node.name() != name);
    }

    pub(crate) fn provider(&self, platform: Platform) -> Option<SharedProvider> {
        self.providers.get(&platform).map(|p| Arc::clone(p.value()))
    }
}

/// Registro de nodos y players: punto de entrada de la librería
pub struct LinkManager {
    shared: Arc<Shared>,
    events: flume::Receiver<Event>,
}

impl LinkManager {
    /// Valida la configuración y registra los nodos (sin conectar)
    pub fn new(options: ManagerOptions, gateway: impl GatewaySender + 'static) -> Result<Self> {
        options.validate()?;

        let (sender, events) = EventSender::channel();
        let node_options = options.nodes.clone();

        let shared = Arc::new(Shared {
            options,
            client_id: RwLock::new(None),
            started_at: RwLock::new(None),
            nodes: RwLock::new(Vec::with_capacity(node_options.len())),
            players: DashMap::new(),
            providers: DashMap::new(),
            events: sender,
            gateway: Arc::new(gateway),
        });

        let manager = Self { shared, events };
        for node in node_options {
            manager.register_node(node)?;
        }

        Ok(manager)
    }

    fn register_node(&self, options: NodeOptions) -> Result<Arc<Node>> {
        let node = Node::new(
            options,
            Arc::downgrade(&self.shared),
            self.shared.events.clone(),
        )?;

        info!("➕ Nodo {} registrado", node.name());
        self.shared.nodes.write().push(Arc::clone(&node));
        self.shared.events.emit(NodeEvent::Add {
            node: node.name().to_string(),
        });

        Ok(node)
    }

    /// Agrega un nodo en caliente; no puede repetir host ni nombre
    pub fn add_node(&self, options: NodeOptions) -> Result<Arc<Node>> {
        let duplicate = self
            .nodes()
            .iter()
            .any(|n| n.options().host == options.host || n.name() == options.name());
        if duplicate {
            return Err(Error::Config(format!("duplicate node '{}'", options.name())));
        }

        let node = self.register_node(options)?;
        if self.client_id().is_some() {
            if let Err(e) = node.connect() {
                node.emit_error(e);
            }
        }
        Ok(node)
    }

    /// Guarda el id del bot y conecta todos los nodos
    pub fn init(&self, client_id: UserId) {
        *self.shared.client_id.write() = Some(client_id);
        *self.shared.started_at.write() = Some(Utc::now());

        info!("🚀 Iniciando {} nodos como {}", self.nodes().len(), client_id);
        for node in self.nodes() {
            if let Err(e) = node.connect() {
                node.emit_error(e);
            }
        }
    }

    /// Receptor de eventos. Todos los clones comparten la misma cola.
    pub fn events(&self) -> flume::Receiver<Event> {
        self.events.clone()
    }

    pub fn options(&self) -> &ManagerOptions {
        &self.shared.options
    }

    pub fn client_id(&self) -> Option<UserId> {
        self.shared.client_id()
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        *self.shared.started_at.read()
    }

    /// Nodos registrados, en orden de registro
    pub fn nodes(&self) -> Vec<Arc<Node>> {
        self.shared.nodes.read().clone()
    }

    pub fn get_node(&self, name: &str) -> Option<Arc<Node>> {
        self.shared
            .nodes
            .read()
            .iter()
            .find(|node| node.name() == name)
            .cloned()
    }

    pub fn get_player(&self, guild_id: GuildId) -> Option<Arc<Player>> {
        self.shared.player(guild_id)
    }

    pub fn players(&self) -> Vec<Arc<Player>> {
        self.shared
            .players
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect()
    }

    /// Devuelve el player del guild, creándolo en el nodo pedido o en el primero
    pub async fn create_player(&self, options: PlayerOptions) -> Result<Arc<Player>> {
        if let Some(player) = self.get_player(options.guild_id) {
            return Ok(player);
        }

        let node = options
            .node
            .as_deref()
            .and_then(|name| self.get_node(name))
            .or_else(|| self.nodes().into_iter().next())
            .ok_or(Error::NoNodes)?;

        let player = Arc::new(Player::new(
            &options,
            &node,
            Arc::downgrade(&self.shared),
            self.shared.events.clone(),
            Arc::clone(&self.shared.gateway),
        ));

        let player = match self.shared.players.entry(options.guild_id) {
            Entry::Occupied(entry) => return Ok(Arc::clone(entry.get())),
            Entry::Vacant(entry) => {
                entry.insert(Arc::clone(&player));
                player
            }
        };

        info!("🎧 Player creado para {} en {}", options.guild_id, node.name());
        self.shared.events.emit(PlayerEvent::Create {
            guild_id: options.guild_id,
        });

        if let Err(e) = player.set_volume(f64::from(options.volume)).await {
            warn!("No se pudo fijar el volumen inicial de {}: {}", options.guild_id, e);
        }

        Ok(player)
    }

    /// Registra un proveedor externo para una plataforma (reemplaza al anterior)
    pub fn register_provider(&self, platform: Platform, provider: impl SearchProvider + 'static) {
        info!("🔌 Proveedor registrado para {}", platform);
        self.shared.providers.insert(platform, Arc::new(provider));
    }

    /// Entrada de los paquetes de voz del gateway (`VOICE_SERVER_UPDATE` / `VOICE_STATE_UPDATE`)
    pub async fn update_voice_state(&self, packet: &Value) {
        let Some(fragment) = VoiceFragment::from_gateway(packet) else {
            return;
        };

        let Some(player) = self.get_player(fragment.guild_id()) else {
            return;
        };

        match fragment {
            VoiceFragment::Server(update) => player.voice_server_update(update).await,
            VoiceFragment::State(update) => {
                if self.client_id() != Some(update.user_id) {
                    return;
                }
                player.voice_state_update(update).await;
            }
        }
    }

    /// Destruye todos los players y nodos
    pub async fn shutdown(&self) {
        for player in self.players() {
            if let Err(e) = player.destroy(false).await {
                warn!("Error destruyendo player {}: {}", player.guild_id(), e);
            }
        }

        for node in self.nodes() {
            node.destroy().await;
        }
    }
}

impl Drop for LinkManager {
    fn drop(&mut self) {
        for node in self.shared.nodes.read().iter() {
            node.abort_tasks();
        }
    }
}
