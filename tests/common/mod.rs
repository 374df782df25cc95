//! Nodo falso en memoria para los tests de integración.
#![allow(dead_code)]

use futures::{SinkExt, StreamExt};
use open_link::{
    events::{Event, NodeEvent},
    LinkManager, ManagerOptions, NodeOptions,
};
use serde_json::Value;
use serenity::model::id::{GuildId, UserId};
use std::{collections::HashMap, net::SocketAddr, time::Duration};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpListener,
};
use tokio_tungstenite::{
    accept_hdr_async,
    tungstenite::{
        handshake::server::{ErrorResponse, Request, Response},
        protocol::{frame::coding::CloseCode, CloseFrame},
        Message,
    },
};

pub const TIMEOUT: Duration = Duration::from_secs(5);
pub const CLIENT_ID: u64 = 42;

/// Lo que el nodo falso recibió del cliente
#[derive(Debug, Clone, PartialEq)]
pub enum Received {
    Frame(Value),
    Closed { code: u16, reason: String },
}

enum Command {
    Text(String),
    Close(u16, String),
}

/// Servidor websocket que acepta conexiones de a una, registra cabeceras y
/// frames, y puede empujar frames o cerrar la conexión actual.
pub struct FakeNode {
    pub addr: SocketAddr,
    handshakes: flume::Receiver<HashMap<String, String>>,
    received: flume::Receiver<Received>,
    commands: flume::Sender<Command>,
}

impl FakeNode {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (handshake_tx, handshakes) = flume::unbounded();
        let (received_tx, received) = flume::unbounded();
        let (commands, command_rx) = flume::unbounded::<Command>();

        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let handshake_tx = handshake_tx.clone();
                let callback = move |request: &Request, response: Response| -> Result<Response, ErrorResponse> {
                    let headers = request
                        .headers()
                        .iter()
                        .map(|(name, value)| {
                            (
                                name.as_str().to_lowercase(),
                                value.to_str().unwrap_or_default().to_string(),
                            )
                        })
                        .collect();
                    let _ = handshake_tx.send(headers);
                    Ok(response)
                };

                let Ok(ws) = accept_hdr_async(stream, callback).await else {
                    continue;
                };
                let (mut write, mut read) = ws.split();

                let received_tx = received_tx.clone();
                let mut reader = tokio::spawn(async move {
                    while let Some(Ok(message)) = read.next().await {
                        match message {
                            Message::Text(text) => {
                                let _ = received_tx.send(Received::Frame(serde_json::from_str(&text).unwrap()));
                            }
                            Message::Close(frame) => {
                                let (code, reason) = frame
                                    .map(|f| (u16::from(f.code), f.reason.into_owned()))
                                    .unwrap_or((1005, String::new()));
                                let _ = received_tx.send(Received::Closed { code, reason });
                                break;
                            }
                            _ => {}
                        }
                    }
                });

                loop {
                    tokio::select! {
                        command = command_rx.recv_async() => match command {
                            Ok(Command::Text(text)) => {
                                if write.send(Message::Text(text)).await.is_err() {
                                    break;
                                }
                            }
                            Ok(Command::Close(code, reason)) => {
                                let frame = CloseFrame { code: CloseCode::from(code), reason: reason.into() };
                                let _ = write.send(Message::Close(Some(frame))).await;
                                break;
                            }
                            Err(_) => return,
                        },
                        _ = &mut reader => break,
                    }
                }
            }
        });

        Self {
            addr,
            handshakes,
            received,
            commands,
        }
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Cabeceras (en minúsculas) del siguiente handshake
    pub async fn handshake(&self) -> HashMap<String, String> {
        tokio::time::timeout(TIMEOUT, self.handshakes.recv_async())
            .await
            .expect("no handshake")
            .unwrap()
    }

    pub async fn next_received(&self) -> Received {
        tokio::time::timeout(TIMEOUT, self.received.recv_async())
            .await
            .expect("nothing received")
            .unwrap()
    }

    /// Siguiente frame JSON enviado por el cliente
    pub async fn next_frame(&self) -> Value {
        match self.next_received().await {
            Received::Frame(frame) => frame,
            other => panic!("expected a frame, got {:?}", other),
        }
    }

    pub fn push(&self, frame: Value) {
        self.commands.send(Command::Text(frame.to_string())).unwrap();
    }

    pub fn close(&self, code: u16, reason: &str) {
        self.commands
            .send(Command::Close(code, reason.to_string()))
            .unwrap();
    }
}

/// Puerto en el que nadie escucha
pub async fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().port()
}

pub fn manager(port: u16, retry_amount: u32, retry_delay: Duration) -> LinkManager {
    let node = NodeOptions::new("127.0.0.1", "secret")
        .with_port(port)
        .with_name("fake")
        .with_retry(retry_amount, retry_delay);
    let options = ManagerOptions::new(vec![node])
        .with_shards(2)
        .with_client_name("test-bot");

    LinkManager::new(options, |_: GuildId, _: Value| {}).unwrap()
}

/// Registro conectado al nodo falso
pub async fn connected(fake: &FakeNode) -> (LinkManager, flume::Receiver<Event>) {
    let manager = manager(fake.port(), 3, Duration::from_millis(50));
    let events = manager.events();
    manager.init(UserId::new(CLIENT_ID));

    wait_for(&events, |e| matches!(e, Event::Node(NodeEvent::Connect { .. }))).await;
    (manager, events)
}

/// Consume eventos hasta encontrar uno que cumpla `predicate`
pub async fn wait_for<F>(events: &flume::Receiver<Event>, predicate: F) -> Event
where
    F: Fn(&Event) -> bool,
{
    tokio::time::timeout(TIMEOUT, async {
        loop {
            let event = events.recv_async().await.unwrap();
            if predicate(&event) {
                return event;
            }
        }
    })
    .await
    .expect("event not received")
}

/// `true` si llega un evento que cumple `predicate` antes de `within`
pub async fn sees<F>(events: &flume::Receiver<Event>, within: Duration, predicate: F) -> bool
where
    F: Fn(&Event) -> bool,
{
    tokio::time::timeout(within, async {
        loop {
            match events.recv_async().await {
                Ok(event) if predicate(&event) => return,
                Ok(_) => {}
                Err(_) => std::future::pending::<()>().await,
            }
        }
    })
    .await
    .is_ok()
}

/// Frame de error de op desconocida: sirve de barrera, el nodo procesa en orden
pub async fn barrier(fake: &FakeNode, events: &flume::Receiver<Event>) {
    fake.push(serde_json::json!({ "op": "barrier" }));
    wait_for(events, |e| {
        matches!(e, Event::Node(NodeEvent::Error { error, .. })
            if matches!(error.as_ref(), open_link::Error::UnexpectedOp { op, .. } if op == "barrier"))
    })
    .await;
}

/// Petición HTTP capturada por [`http_once`]
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub request_line: String,
    pub headers: HashMap<String, String>,
}

/// Responde una sola petición HTTP con `body` (JSON) y devuelve lo recibido
pub async fn http_once(body: Value) -> (u16, tokio::task::JoinHandle<HttpRequest>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let handle = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();

        let mut buffer = Vec::new();
        let mut chunk = [0_u8; 1024];
        while !buffer.windows(4).any(|w| w == b"\r\n\r\n") {
            let read = stream.read(&mut chunk).await.unwrap();
            if read == 0 {
                break;
            }
            buffer.extend_from_slice(&chunk[..read]);
        }

        let head = String::from_utf8_lossy(&buffer).to_string();
        let mut lines = head.split("\r\n");
        let request_line = lines.next().unwrap_or_default().to_string();
        let headers = lines
            .filter_map(|line| line.split_once(": "))
            .map(|(name, value)| (name.to_lowercase(), value.to_string()))
            .collect();

        let body = body.to_string();
        let response = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            body.len(),
            body
        );
        stream.write_all(response.as_bytes()).await.unwrap();
        stream.shutdown().await.unwrap();

        HttpRequest {
            request_line,
            headers,
        }
    });

    (port, handle)
}
