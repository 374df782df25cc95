//! # Node
//!
//! One [`Node`] per configured audio server. A node owns:
//!
//! - the WebSocket transport (opened by a spawned connection task, see
//!   `connection.rs`), with bounded reconnection;
//! - the dispatch of inbound frames to players (`dispatch.rs`);
//! - a pooled HTTP client for the REST API (`rest.rs`).
//!
//! Nodes are owned by the [`crate::LinkManager`] registry. Players only hold
//! a weak reference, so a node removed from the registry disappears once its
//! tasks finish.

mod connection;
mod dispatch;
pub mod protocol;
pub mod rest;

use futures::{stream::SplitSink, SinkExt};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::{
    fmt,
    sync::{
        atomic::{AtomicU32, Ordering},
        Arc, Weak,
    },
};
use tokio::{net::TcpStream, task::JoinHandle};
use tokio_tungstenite::{
    tungstenite::{
        protocol::{frame::coding::CloseCode, CloseFrame},
        Message,
    },
    MaybeTlsStream, WebSocketStream,
};
use tracing::{debug, info, warn};

use crate::{
    config::NodeOptions,
    error::{Error, Result},
    events::{EventSender, NodeEvent},
    manager::Shared,
};

pub use protocol::NodeStats;
pub use rest::{LoadTracksResponse, RequestOptions};

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;

/// Razón de cierre que suprime la reconexión
pub(crate) const DESTROY_REASON: &str = "destroy";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    Disconnected,
    Connecting,
    Connected,
}

pub struct Node {
    options: NodeOptions,
    http: reqwest::Client,
    state: Mutex<NodeState>,
    sink: tokio::sync::Mutex<Option<WsSink>>,
    connection: Mutex<Option<JoinHandle<()>>>,
    reconnect: Mutex<Option<JoinHandle<()>>>,
    attempts: AtomicU32,
    stats: RwLock<NodeStats>,
    link: Weak<Shared>,
    events: EventSender,
}

impl Node {
    pub(crate) fn new(
        options: NodeOptions,
        link: Weak<Shared>,
        events: EventSender,
    ) -> Result<Arc<Self>> {
        let http = reqwest::Client::builder()
            .pool_max_idle_per_host(options.pool_max_idle)
            .build()?;

        Ok(Arc::new(Self {
            options,
            http,
            state: Mutex::new(NodeState::Disconnected),
            sink: tokio::sync::Mutex::new(None),
            connection: Mutex::new(None),
            reconnect: Mutex::new(None),
            attempts: AtomicU32::new(1),
            stats: RwLock::new(NodeStats::default()),
            link,
            events,
        }))
    }

    pub fn name(&self) -> &str {
        self.options.name()
    }

    pub fn options(&self) -> &NodeOptions {
        &self.options
    }

    pub fn state(&self) -> NodeState {
        *self.state.lock()
    }

    pub fn is_connected(&self) -> bool {
        self.state() == NodeState::Connected
    }

    /// Último snapshot de estadísticas recibido
    pub fn stats(&self) -> NodeStats {
        self.stats.read().clone()
    }

    /// Intento de reconexión en curso (empieza en 1)
    pub fn reconnect_attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub(crate) fn http_base(&self) -> String {
        self.options.http_url()
    }

    pub(crate) fn link(&self) -> Option<Arc<Shared>> {
        self.link.upgrade()
    }

    /// Abre el websocket en una tarea aparte; no hace nada si ya está conectando
    pub fn connect(self: &Arc<Self>) -> Result<()> {
        let request = self.handshake_request()?;

        {
            let mut state = self.state.lock();
            if *state != NodeState::Disconnected {
                debug!("🔌 Nodo {} ya conectado o conectando", self.name());
                return Ok(());
            }
            *state = NodeState::Connecting;
        }

        info!("🔌 Conectando al nodo {} ({})", self.name(), self.options.ws_url());

        let node = Arc::clone(self);
        let handle = tokio::spawn(async move { node.run(request).await });

        if let Some(old) = self.connection.lock().replace(handle) {
            old.abort();
        }

        Ok(())
    }

    /// Envía un frame JSON al nodo; falla sin transmitir si no está conectado
    pub async fn send<T: Serialize + ?Sized>(&self, payload: &T) -> Result<()> {
        if !self.is_connected() {
            return Err(Error::NotConnected(self.name().to_string()));
        }

        let value = serde_json::to_value(payload)?;
        if !value.is_object() {
            return Err(Error::InvalidPayload);
        }

        let mut sink = self.sink.lock().await;
        let sink = sink
            .as_mut()
            .ok_or_else(|| Error::NotConnected(self.name().to_string()))?;

        sink.send(Message::Text(value.to_string())).await?;
        Ok(())
    }

    /// Cierra el nodo para siempre (sin reconexión) y lo saca del registro
    pub async fn destroy(&self) {
        if !self.is_connected() {
            debug!("Nodo {} no conectado, nada que destruir", self.name());
            return;
        }

        self.shutdown().await;
    }

    pub(crate) async fn shutdown(&self) {
        if let Some(timer) = self.reconnect.lock().take() {
            timer.abort();
        }

        // la tarea de conexión se corta antes del cierre para que no reprograme nada
        if let Some(task) = self.connection.lock().take() {
            task.abort();
        }

        if let Some(mut sink) = self.sink.lock().await.take() {
            let frame = CloseFrame {
                code: CloseCode::Normal,
                reason: DESTROY_REASON.into(),
            };
            if let Err(e) = sink.send(Message::Close(Some(frame))).await {
                debug!("Error enviando cierre a {}: {}", self.name(), e);
            }
        }

        *self.state.lock() = NodeState::Disconnected;
        self.attempts.store(1, Ordering::SeqCst);

        match self.link() {
            Some(link) => link.remove_node(self.name()),
            None => warn!("Registro no disponible al destruir {}", self.name()),
        }

        info!("💥 Nodo {} destruido", self.name());
        self.events.emit(NodeEvent::Destroy {
            node: self.name().to_string(),
        });
    }

    /// Corta las tareas en segundo plano sin cerrar con handshake
    pub(crate) fn abort_tasks(&self) {
        if let Some(timer) = self.reconnect.lock().take() {
            timer.abort();
        }
        if let Some(task) = self.connection.lock().take() {
            task.abort();
        }
    }

    pub(crate) fn emit_error(&self, error: Error) {
        warn!("⚠️ Nodo {}: {}", self.name(), error);
        self.events.emit(NodeEvent::Error {
            node: self.name().to_string(),
            error: Arc::new(error),
        });
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("name", &self.name())
            .field("url", &self.options.ws_url())
            .field("state", &self.state())
            .field("attempts", &self.reconnect_attempts())
            .finish()
    }
}
