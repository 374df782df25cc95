use futures::{stream::SplitStream, StreamExt};
use std::sync::{atomic::Ordering, Arc};
use tokio::net::TcpStream;
use tokio_tungstenite::{
    connect_async,
    tungstenite::{
        client::IntoClientRequest,
        handshake::client::Request,
        http::HeaderValue,
        Message,
    },
    MaybeTlsStream, WebSocketStream,
};
use tracing::{debug, info, warn};

use super::{Node, NodeState, DESTROY_REASON};
use crate::{
    error::{Error, Result},
    events::NodeEvent,
};

type WsStream = SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;

/// Código usado cuando el transporte muere sin frame de cierre
const ABNORMAL_CLOSURE: u16 = 1006;
const NORMAL_CLOSURE: u16 = 1000;
const NO_STATUS: u16 = 1005;

impl Node {
    /// Petición de handshake con las cabeceras de identificación
    pub(super) fn handshake_request(&self) -> Result<Request> {
        let link = self
            .link()
            .ok_or_else(|| Error::Config("link manager is gone".into()))?;
        let client_id = link
            .client_id()
            .ok_or_else(|| Error::Config("client id is not set, call init() first".into()))?;

        let mut request = self.options.ws_url().into_client_request()?;
        let headers = request.headers_mut();

        headers.insert("Authorization", header_value(&self.options.password, "Authorization")?);
        headers.insert("Num-Shards", HeaderValue::from(link.options.shards));
        headers.insert("User-Id", HeaderValue::from(client_id.get()));
        headers.insert("Client-Name", header_value(&link.options.client_name, "Client-Name")?);

        Ok(request)
    }

    /// Tarea de conexión: handshake, lectura secuencial de frames y cierre
    pub(super) async fn run(self: Arc<Self>, request: Request) {
        let (code, reason) = match connect_async(request).await {
            Ok((stream, _response)) => {
                let (sink, mut stream) = stream.split();
                *self.sink.lock().await = Some(sink);
                self.on_open();

                let close = self.read_loop(&mut stream).await;
                self.sink.lock().await.take();
                close
            }
            Err(e) => {
                self.emit_error(Error::WebSocket(e));
                (ABNORMAL_CLOSURE, String::new())
            }
        };

        *self.state.lock() = NodeState::Disconnected;
        self.on_close(code, reason);
    }

    async fn read_loop(&self, stream: &mut WsStream) -> (u16, String) {
        while let Some(message) = stream.next().await {
            match message {
                Ok(Message::Text(text)) => self.handle_frame(&text).await,
                Ok(Message::Binary(bytes)) => match std::str::from_utf8(&bytes) {
                    Ok(text) => self.handle_frame(text).await,
                    Err(_) => debug!("Frame binario no UTF-8 ignorado ({} bytes)", bytes.len()),
                },
                Ok(Message::Close(frame)) => {
                    return frame
                        .map(|f| (u16::from(f.code), f.reason.into_owned()))
                        .unwrap_or((NO_STATUS, String::new()));
                }
                Ok(_) => {}
                Err(e) => {
                    self.emit_error(Error::WebSocket(e));
                    return (ABNORMAL_CLOSURE, String::new());
                }
            }
        }

        (ABNORMAL_CLOSURE, String::new())
    }

    fn on_open(&self) {
        if let Some(timer) = self.reconnect.lock().take() {
            timer.abort();
        }

        *self.state.lock() = NodeState::Connected;
        info!("✅ Nodo {} conectado", self.name());
        self.events.emit(NodeEvent::Connect {
            node: self.name().to_string(),
        });
    }

    fn on_close(self: &Arc<Self>, code: u16, reason: String) {
        warn!("🔌 Nodo {} desconectado ({} {})", self.name(), code, reason);
        self.events.emit(NodeEvent::Disconnect {
            node: self.name().to_string(),
            code,
            reason: reason.clone(),
        });

        if code == NORMAL_CLOSURE && reason == DESTROY_REASON {
            return;
        }

        self.schedule_reconnect();
    }

    fn schedule_reconnect(self: &Arc<Self>) {
        let node = Arc::clone(self);
        let delay = self.options.retry_delay;

        debug!(
            "⏳ Reconexión de {} en {}",
            self.name(),
            humantime::format_duration(delay)
        );

        let timer = tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            // el timer ya disparó: soltar el handle propio sin abortarlo
            node.reconnect.lock().take();

            let attempts = node.attempts.load(Ordering::SeqCst);
            if attempts >= node.options.retry_amount {
                node.emit_error(Error::ReconnectExhausted(node.options.retry_amount));
                node.shutdown().await;
                return;
            }

            node.sink.lock().await.take();

            info!("🔄 Reconectando nodo {} (intento {})", node.name(), attempts);
            node.events.emit(NodeEvent::Reconnect {
                node: node.name().to_string(),
            });

            if let Err(e) = node.connect() {
                node.emit_error(e);
            }
            node.attempts.fetch_add(1, Ordering::SeqCst);
        });

        if let Some(old) = self.reconnect.lock().replace(timer) {
            old.abort();
        }
    }
}

fn header_value(value: &str, name: &'static str) -> Result<HeaderValue> {
    HeaderValue::from_str(value).map_err(|_| Error::InvalidHeader { name })
}
